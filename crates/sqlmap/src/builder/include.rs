//! Splices `<include refid>` fragments into statement bodies.

use super::{defer_missing, Assistant};
use crate::{
    xml::{XContent, XNode},
    Configuration,
};
use indexmap::IndexMap;
use sqlmap_core::{parsing::substitute_variables, Error, Result};

/// Returns a copy of `node` with every include replaced by the fragment's
/// content. A fragment that is not registered yet defers the statement.
pub(crate) fn expand(config: &Configuration, assistant: &Assistant, node: &XNode) -> Result<XNode> {
    let mut expander = Expander {
        config,
        assistant,
        stack: vec![],
    };
    let children = expander.children(node, &config.variables, false)?;
    Ok(node.with_children(children))
}

struct Expander<'a> {
    config: &'a Configuration,
    assistant: &'a Assistant,

    /// Fragments being expanded, outermost first.
    stack: Vec<String>,
}

impl Expander<'_> {
    fn children(
        &mut self,
        node: &XNode,
        context: &IndexMap<String, String>,
        included: bool,
    ) -> Result<Vec<XContent>> {
        let mut children = vec![];

        for child in node.children() {
            match child {
                XContent::Element(element) if element.name() == "include" => {
                    children.extend(self.include(element, context)?);
                }
                XContent::Element(element) => {
                    let nested = self.children(element, context, included)?;
                    children.push(XContent::Element(element.with_children(nested)));
                }
                XContent::Text(text) if included && !context.is_empty() => {
                    children.push(XContent::Text(self.substitute(text, context)));
                }
                XContent::Text(_) => children.push(child.clone()),
            }
        }

        Ok(children)
    }

    fn include(
        &mut self,
        node: &XNode,
        context: &IndexMap<String, String>,
    ) -> Result<Vec<XContent>> {
        let refid = self.substitute(node.required("refid")?, context);
        let id = self.assistant.apply(&refid, true)?;

        let config = self.config;
        let fragment = config.fragments.lookup(&id).map_err(|err| {
            defer_missing(err, || {
                format!("could not find SQL statement to include with refid '{refid}'")
            })
        })?;

        if self.stack.contains(&id) {
            return Err(Error::invalid_mapping(format!(
                "circular include of SQL fragment '{id}' (include chain: {} -> {id})",
                self.stack.join(" -> ")
            )));
        }

        let context = self.fragment_context(node, context)?;

        self.stack.push(id);
        let children = self.children(fragment, &context, true);
        self.stack.pop();
        children
    }

    /// Variables visible inside the fragment: the including context plus
    /// the include's `<property>` children.
    fn fragment_context(
        &self,
        node: &XNode,
        inherited: &IndexMap<String, String>,
    ) -> Result<IndexMap<String, String>> {
        let mut declared = IndexMap::new();

        for property in node.elements_named("property") {
            let name = property.required("name")?;
            let value = self.substitute(property.required("value")?, inherited);

            if declared.insert(name.to_string(), value).is_some() {
                return Err(Error::invalid_mapping(format!(
                    "variable '{name}' defined twice in the same include definition"
                )));
            }
        }

        if declared.is_empty() {
            return Ok(inherited.clone());
        }

        let mut context = inherited.clone();
        context.extend(declared);
        Ok(context)
    }

    fn substitute(&self, text: &str, context: &IndexMap<String, String>) -> String {
        substitute_variables(text, context, &self.config.settings.default_value())
    }
}
