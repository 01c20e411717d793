//! Markup to [`SqlNode`] trees.

use crate::xml::{XContent, XNode};
use sqlmap_core::{Error, Result};
use sqlmap_sql::{
    node::{ForEach, Trim},
    SqlNode,
};

/// Compiles the children of a statement element. Includes must already be
/// expanded.
pub(crate) fn compile(node: &XNode) -> Result<SqlNode> {
    mixed(node)
}

fn mixed(node: &XNode) -> Result<SqlNode> {
    node.children()
        .iter()
        .map(|child| match child {
            XContent::Text(text) => Ok(SqlNode::text(text.as_str())),
            XContent::Element(element) => element_node(element),
        })
        .collect::<Result<_>>()
        .map(SqlNode::Mixed)
}

fn element_node(node: &XNode) -> Result<SqlNode> {
    match node.name() {
        "trim" => Ok(SqlNode::Trim(
            Trim::new(mixed(node)?)
                .prefix(node.attr("prefix").map(str::to_string))
                .suffix(node.attr("suffix").map(str::to_string))
                .prefix_overrides(node.attr("prefixOverrides"))
                .suffix_overrides(node.attr("suffixOverrides")),
        )),
        "where" => Ok(SqlNode::Trim(Trim::where_(mixed(node)?))),
        "set" => Ok(SqlNode::Trim(Trim::set(mixed(node)?))),
        "foreach" => {
            let mut foreach = ForEach::new(node.required("collection")?, mixed(node)?);
            foreach.item = node.attr("item").map(str::to_string);
            foreach.index = node.attr("index").map(str::to_string);
            foreach.open = node.attr("open").map(str::to_string);
            foreach.close = node.attr("close").map(str::to_string);
            foreach.separator = node.attr("separator").map(str::to_string);
            foreach.nullable = node.bool_attr("nullable")?.unwrap_or(false);
            Ok(SqlNode::ForEach(foreach))
        }
        "if" => Ok(SqlNode::if_(node.required("test")?, mixed(node)?)),
        "choose" => choose(node),
        "bind" => Ok(SqlNode::bind(node.required("name")?, node.required("value")?)),
        name => Err(Error::invalid_mapping(format!(
            "unknown element <{name}> in SQL statement"
        ))),
    }
}

fn choose(node: &XNode) -> Result<SqlNode> {
    let mut whens = vec![];
    let mut otherwise = None;

    for child in node.elements() {
        match child.name() {
            "when" => whens.push((child.required("test")?.to_string(), mixed(child)?)),
            "otherwise" if otherwise.is_some() => {
                return Err(Error::invalid_mapping(
                    "too many default (otherwise) elements in choose statement",
                ))
            }
            "otherwise" => otherwise = Some(Box::new(mixed(child)?)),
            name => {
                return Err(Error::invalid_mapping(format!(
                    "unknown element <{name}> in <choose>"
                )))
            }
        }
    }

    Ok(SqlNode::Choose { whens, otherwise })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::xml::Variables;
    use indexmap::IndexMap;
    use sqlmap_core::parsing::DefaultValue;

    fn parse(text: &str) -> XNode {
        let values = IndexMap::new();
        let variables = Variables {
            values: &values,
            default_value: DefaultValue::default(),
        };
        XNode::parse(text, &variables).unwrap()
    }

    #[test]
    fn static_text_stays_static() {
        let root = compile(&parse("<select>select * from users</select>")).unwrap();
        assert!(!root.is_dynamic());

        let root = compile(&parse("<select>select * from ${table}</select>")).unwrap();
        assert!(root.is_dynamic());
    }

    #[test]
    fn elements_make_the_tree_dynamic() {
        let root = compile(&parse(
            r#"<select>select * from users <where><if test="id != null">and id = #{id}</if></where></select>"#,
        ))
        .unwrap();

        let SqlNode::Mixed(children) = &root else {
            panic!("expected a mixed root, got {root:?}");
        };
        assert_eq!(children.len(), 2);
        assert!(matches!(&children[1], SqlNode::Trim(trim) if trim.prefix.as_deref() == Some("WHERE")));
        assert!(root.is_dynamic());
    }

    #[test]
    fn choose_with_two_defaults_fails() {
        let err = compile(&parse(
            "<select><choose><otherwise>a</otherwise><otherwise>b</otherwise></choose></select>",
        ))
        .unwrap_err();
        assert!(err.is_invalid_mapping());
    }

    #[test]
    fn unknown_elements_fail() {
        let err = compile(&parse("<select><loop/></select>")).unwrap_err();
        assert!(err.is_invalid_mapping());
    }

    #[test]
    fn foreach_attributes() {
        let root = compile(&parse(
            r#"<select><foreach collection="ids" item="id" open="(" close=")" separator="," nullable="true">#{id}</foreach></select>"#,
        ))
        .unwrap();

        let SqlNode::Mixed(children) = root else {
            panic!("expected a mixed root");
        };
        let SqlNode::ForEach(foreach) = &children[0] else {
            panic!("expected foreach, got {:?}", children[0]);
        };
        assert_eq!(foreach.collection, "ids");
        assert_eq!(foreach.item.as_deref(), Some("id"));
        assert_eq!(foreach.separator.as_deref(), Some(","));
        assert!(foreach.nullable);
    }
}
