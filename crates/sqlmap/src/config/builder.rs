use super::{Configuration, Settings};
use indexmap::IndexMap;
use sqlmap_core::{
    reflect::ClassDef,
    ty::TypeName,
    types::{Converter, JdbcType, TypeSystem},
    Result,
};
use sqlmap_sql::{DefaultEvaluator, ExpressionEvaluator};

use std::{mem, sync::Arc};

#[derive(Default)]
pub struct Builder {
    settings: Settings,

    /// Values for `${}` substitution in mapping documents
    variables: IndexMap<String, String>,

    /// Class declarations, registered when the configuration is built
    classes: Vec<ClassDef>,

    aliases: Vec<(String, TypeName)>,
    types: TypeSystem,
    evaluator: Option<Arc<dyn ExpressionEvaluator>>,
}

impl Builder {
    pub fn settings(&mut self, settings: Settings) -> &mut Self {
        self.settings = settings;
        self
    }

    pub fn variable(&mut self, key: impl Into<String>, value: impl Into<String>) -> &mut Self {
        self.variables.insert(key.into(), value.into());
        self
    }

    pub fn variables<K, V>(&mut self, variables: impl IntoIterator<Item = (K, V)>) -> &mut Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        for (key, value) in variables {
            self.variable(key, value);
        }
        self
    }

    /// Declares a type that parameter and result objects can have.
    pub fn register(&mut self, class: ClassDef) -> &mut Self {
        self.classes.push(class);
        self
    }

    pub fn alias(&mut self, alias: &str, ty: impl Into<TypeName>) -> &mut Self {
        self.aliases.push((alias.to_string(), ty.into()));
        self
    }

    /// Registers a converter for values of `ty`, optionally only for one
    /// storage type.
    pub fn converter(
        &mut self,
        ty: impl Into<TypeName>,
        jdbc_type: Option<JdbcType>,
        converter: Arc<dyn Converter>,
    ) -> &mut Self {
        self.types.converters.register(ty, jdbc_type, converter);
        self
    }

    /// Registers a converter that mappings select with `typeHandler`.
    pub fn named_converter(&mut self, converter: Arc<dyn Converter>) -> &mut Self {
        self.types.converters.register_named(converter);
        self
    }

    /// Replaces the evaluator used for `test`, `bind` and `collection`
    /// expressions.
    pub fn evaluator(&mut self, evaluator: Arc<dyn ExpressionEvaluator>) -> &mut Self {
        self.evaluator = Some(evaluator);
        self
    }

    pub fn build(&mut self) -> Result<Configuration> {
        let mut types = mem::take(&mut self.types);

        for class in self.classes.drain(..) {
            types.registry.register(class)?;
        }

        for (alias, ty) in self.aliases.drain(..) {
            types.aliases.register(&alias, ty)?;
        }

        let settings = mem::take(&mut self.settings);
        types
            .registry
            .set_reflector_cache_enabled(settings.reflector_cache_enabled);

        let evaluator = self
            .evaluator
            .take()
            .unwrap_or_else(|| Arc::new(DefaultEvaluator::new()));

        Ok(Configuration::new(
            settings,
            mem::take(&mut self.variables),
            types,
            evaluator,
        ))
    }
}
