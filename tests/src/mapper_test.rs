use crate::EventLog;
use sqlmap::{Builder, Configuration, Result};
use tracing::subscriber::DefaultGuard;
use tracing_subscriber::{layer::SubscriberExt, EnvFilter, Layer, Registry};

/// Loads mapping resources into one configuration while recording the
/// events the loader emits.
pub struct MapperTest {
    pub config: Configuration,
    pub log: EventLog,
    _guard: DefaultGuard,
}

impl MapperTest {
    pub fn new(mut builder: Builder) -> MapperTest {
        let log = EventLog::new();
        let subscriber = Registry::default()
            .with(log.clone())
            .with(
                tracing_subscriber::fmt::layer()
                    .with_test_writer()
                    .with_filter(EnvFilter::from_default_env()),
            );
        let guard = tracing::subscriber::set_default(subscriber);

        let config = match builder.build() {
            Ok(config) => config,
            Err(err) => panic!("failed to build configuration; error={err}"),
        };

        MapperTest {
            config,
            log,
            _guard: guard,
        }
    }

    pub fn load(&mut self, resource: &str, text: &str) -> Result<()> {
        self.config.load(resource, text)
    }

    /// Loads every resource in order, stopping at the first failure.
    pub fn load_all(&mut self, resources: &[(&str, &str)]) -> Result<()> {
        for (resource, text) in resources {
            self.load(resource, text)?;
        }
        Ok(())
    }

    pub fn finish(&mut self) -> Result<()> {
        self.config.finish()
    }
}
