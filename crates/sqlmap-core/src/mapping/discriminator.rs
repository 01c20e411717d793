use super::ResultMapping;
use indexmap::IndexMap;

/// Picks one of several result maps by the value of a control column.
#[derive(Debug, Clone)]
pub struct Discriminator {
    /// Mapping that reads the control column.
    pub result_mapping: ResultMapping,

    /// Column value to fully qualified result map id.
    pub discriminator_map: IndexMap<String, String>,
}

impl Discriminator {
    pub fn map_id_for(&self, value: &str) -> Option<&str> {
        self.discriminator_map.get(value).map(String::as_str)
    }
}
