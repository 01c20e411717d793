use indexmap::IndexMap;
use sqlmap_core::{Error, Result};
use std::collections::HashMap;

/// One symbol-table collection, keyed by fully qualified id.
///
/// An entry is also reachable by the last dotted segment of its id, as long
/// as no other namespace registered the same short name.
#[derive(Debug)]
pub struct Symbols<V> {
    name: &'static str,
    entries: IndexMap<String, V>,
    short_names: HashMap<String, ShortName>,
}

#[derive(Debug)]
enum ShortName {
    Unique(String),
    Ambiguous,
}

impl<V> Symbols<V> {
    pub(crate) fn new(name: &'static str) -> Symbols<V> {
        Symbols {
            name,
            entries: IndexMap::new(),
            short_names: HashMap::new(),
        }
    }

    pub(crate) fn insert(&mut self, id: String, value: V) -> Result<()> {
        if self.entries.contains_key(&id) {
            return Err(Error::redefinition(self.name, id));
        }

        index_short_name(&mut self.short_names, &id);
        self.entries.insert(id, value);
        Ok(())
    }

    /// Drops every entry registered after the first `len`.
    pub(crate) fn truncate(&mut self, len: usize) {
        if len >= self.entries.len() {
            return;
        }

        self.entries.truncate(len);
        self.short_names.clear();
        for id in self.entries.keys() {
            index_short_name(&mut self.short_names, id);
        }
    }

    /// Looks up a fully qualified id or an unambiguous short name.
    pub fn lookup(&self, id: &str) -> Result<&V> {
        if let Some(value) = self.entries.get(id) {
            return Ok(value);
        }

        match self.short_names.get(id) {
            Some(ShortName::Unique(full)) => self.entries.get(full).ok_or_else(|| self.missing(id)),
            Some(ShortName::Ambiguous) => Err(Error::ambiguity(format!(
                "{id} is ambiguous in {} collection (try using the full name including the namespace, or rename one of the entries)",
                self.name
            ))),
            None => Err(self.missing(id)),
        }
    }

    pub fn get(&self, id: &str) -> Option<&V> {
        self.lookup(id).ok()
    }

    /// Looks up a fully qualified id only.
    pub fn get_exact(&self, id: &str) -> Option<&V> {
        self.entries.get(id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.get(id).is_some()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Fully qualified ids in registration order.
    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &V)> {
        self.entries.iter().map(|(id, value)| (id.as_str(), value))
    }

    fn missing(&self, id: &str) -> Error {
        Error::unresolved_reference(format!(
            "{} collection does not contain value for {id}",
            self.name
        ))
    }
}

fn index_short_name(short_names: &mut HashMap<String, ShortName>, id: &str) {
    if let Some((_, short)) = id.rsplit_once('.') {
        short_names
            .entry(short.to_string())
            .and_modify(|entry| *entry = ShortName::Ambiguous)
            .or_insert_with(|| ShortName::Unique(id.to_string()));
    }
}
