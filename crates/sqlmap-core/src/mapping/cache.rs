use indexmap::IndexMap;

/// Cache declared by a namespace. Describes the cache only; building the
/// actual cache and its decorators is up to the execution layer.
#[derive(Debug, Clone, PartialEq)]
pub struct CacheConfig {
    /// Namespace that declared the cache.
    pub id: String,
    pub implementation: String,
    pub eviction: String,
    pub flush_interval: Option<u64>,
    pub size: Option<usize>,
    pub read_write: bool,
    pub blocking: bool,
    pub properties: IndexMap<String, String>,
}

impl CacheConfig {
    pub fn new(id: impl Into<String>) -> CacheConfig {
        CacheConfig {
            id: id.into(),
            implementation: "PERPETUAL".to_string(),
            eviction: "LRU".to_string(),
            flush_interval: None,
            size: None,
            read_write: true,
            blocking: false,
            properties: IndexMap::new(),
        }
    }
}
