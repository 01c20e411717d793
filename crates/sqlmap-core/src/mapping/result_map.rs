use super::{Discriminator, ResultMapping};
use crate::{reflect::TypeRegistry, ty::TypeName, Error, Result};
use indexmap::IndexSet;
use std::sync::atomic::{AtomicBool, Ordering};

/// Compiled description of how rows become instances of one type.
#[derive(Debug)]
pub struct ResultMap {
    pub id: String,
    pub ty: TypeName,
    pub mappings: Vec<ResultMapping>,

    /// Mappings flagged as row identity, or every mapping when none is.
    pub id_mappings: Vec<ResultMapping>,

    /// Constructor arguments, in the matched constructor's parameter order.
    pub constructor_mappings: Vec<ResultMapping>,

    pub property_mappings: Vec<ResultMapping>,

    /// Upper-cased column names, including composite sub-columns.
    pub mapped_columns: IndexSet<String>,

    pub mapped_properties: IndexSet<String>,
    pub discriminator: Option<Discriminator>,
    pub has_nested_queries: bool,
    pub auto_mapping: Option<bool>,

    // Can be raised after build when a discriminated map turns out to nest.
    has_nested_result_maps: AtomicBool,
}

#[derive(Debug)]
pub struct ResultMapBuilder {
    id: String,
    ty: TypeName,
    mappings: Vec<ResultMapping>,
    discriminator: Option<Discriminator>,
    auto_mapping: Option<bool>,
}

impl ResultMap {
    pub fn builder(
        id: impl Into<String>,
        ty: TypeName,
        mappings: Vec<ResultMapping>,
    ) -> ResultMapBuilder {
        ResultMapBuilder {
            id: id.into(),
            ty,
            mappings,
            discriminator: None,
            auto_mapping: None,
        }
    }

    pub fn has_nested_result_maps(&self) -> bool {
        self.has_nested_result_maps.load(Ordering::Acquire)
    }

    pub fn force_nested_result_maps(&self) {
        self.has_nested_result_maps.store(true, Ordering::Release);
    }
}

impl ResultMapBuilder {
    pub fn discriminator(mut self, discriminator: Option<Discriminator>) -> Self {
        self.discriminator = discriminator;
        self
    }

    pub fn auto_mapping(mut self, auto_mapping: Option<bool>) -> Self {
        self.auto_mapping = auto_mapping;
        self
    }

    pub fn build(self, registry: &TypeRegistry) -> Result<ResultMap> {
        if self.id.is_empty() {
            return Err(Error::invalid_mapping("result maps must have an id"));
        }

        let mut has_nested_queries = false;
        let mut has_nested_result_maps = false;
        let mut mapped_columns = IndexSet::new();
        let mut mapped_properties = IndexSet::new();
        let mut id_mappings = vec![];
        let mut constructor_mappings = vec![];
        let mut property_mappings = vec![];
        let mut constructor_arg_names = vec![];

        for mapping in &self.mappings {
            has_nested_queries |= mapping.nested_query_id.is_some();
            has_nested_result_maps |=
                mapping.nested_result_map_id.is_some() && mapping.result_set.is_none();

            if let Some(column) = &mapping.column {
                mapped_columns.insert(column.to_uppercase());
            } else {
                for composite in &mapping.composites {
                    if let Some(column) = &composite.column {
                        mapped_columns.insert(column.to_uppercase());
                    }
                }
            }

            if let Some(property) = &mapping.property {
                mapped_properties.insert(property.clone());
            }

            if mapping.is_constructor() {
                constructor_mappings.push(mapping.clone());
                if let Some(property) = &mapping.property {
                    constructor_arg_names.push(property.clone());
                }
            } else {
                property_mappings.push(mapping.clone());
            }

            if mapping.is_id() {
                id_mappings.push(mapping.clone());
            }
        }

        if id_mappings.is_empty() {
            id_mappings = self.mappings.clone();
        }

        if !constructor_arg_names.is_empty() {
            let Some(actual) =
                matching_constructor(registry, &self.ty, &constructor_arg_names, &constructor_mappings)
            else {
                return Err(Error::ambiguity(format!(
                    "error in result map '{}': failed to find a constructor in '{}' with arg names {:?}; \
                     a java type is required when there is no writable property with the same name",
                    self.id, self.ty, constructor_arg_names
                )));
            };

            constructor_mappings.sort_by_key(|mapping| {
                mapping
                    .property
                    .as_ref()
                    .and_then(|property| actual.iter().position(|name| name == property))
            });
        }

        Ok(ResultMap {
            id: self.id,
            ty: self.ty,
            mappings: self.mappings,
            id_mappings,
            constructor_mappings,
            property_mappings,
            mapped_columns,
            mapped_properties,
            discriminator: self.discriminator,
            has_nested_queries,
            auto_mapping: self.auto_mapping,
            has_nested_result_maps: AtomicBool::new(has_nested_result_maps),
        })
    }
}

/// Finds a constructor whose parameter names are exactly `arg_names` (in any
/// order) and whose parameter types equal the mappings' declared types.
/// Returns the constructor's parameter names in declaration order.
fn matching_constructor(
    registry: &TypeRegistry,
    ty: &TypeName,
    arg_names: &[String],
    mappings: &[ResultMapping],
) -> Option<Vec<String>> {
    let class = registry.get(ty)?;

    class.constructors.iter().find_map(|ctor| {
        if ctor.params.len() != arg_names.len() {
            return None;
        }

        let param_names: Vec<String> = ctor.params.iter().map(|p| p.name.clone()).collect();
        if !param_names.iter().all(|name| arg_names.contains(name)) {
            return None;
        }

        let types_match = arg_names.iter().zip(mappings).all(|(arg, mapping)| {
            param_names
                .iter()
                .position(|name| name == arg)
                .is_some_and(|i| ctor.params[i].ty == mapping.java_type)
        });

        types_match.then_some(param_names)
    })
}
