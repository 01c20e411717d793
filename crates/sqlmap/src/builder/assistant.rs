use sqlmap_core::{Error, Result};

/// Namespace bookkeeping for the document being compiled.
#[derive(Debug, Clone)]
pub(crate) struct Assistant {
    namespace: String,
    resource: String,
}

impl Assistant {
    pub(crate) fn new(namespace: impl Into<String>, resource: impl Into<String>) -> Assistant {
        Assistant {
            namespace: namespace.into(),
            resource: resource.into(),
        }
    }

    pub(crate) fn namespace(&self) -> &str {
        &self.namespace
    }

    pub(crate) fn resource(&self) -> &str {
        &self.resource
    }

    /// Qualifies `base` with the current namespace.
    ///
    /// A reference containing a dot is already qualified. A definition may
    /// only contain dots when it starts with the current namespace.
    pub(crate) fn apply(&self, base: &str, is_reference: bool) -> Result<String> {
        if is_reference {
            if base.contains('.') {
                return Ok(base.to_string());
            }
        } else {
            if base
                .strip_prefix(self.namespace.as_str())
                .is_some_and(|rest| rest.starts_with('.'))
            {
                return Ok(base.to_string());
            }
            if base.contains('.') {
                return Err(Error::invalid_mapping(format!(
                    "dots are not allowed in element names, please remove it from {base}"
                )));
            }
        }

        Ok(format!("{}.{base}", self.namespace))
    }
}
