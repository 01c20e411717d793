use super::SqlNode;
use crate::DynamicContext;
use sqlmap_core::{parsing::TokenScanner, Result};

/// Renders its contents once per element of a collection.
///
/// Each repetition binds `item` and `index`, plus a uniquely named copy of
/// each (`__frch_<name>_<n>`). Placeholders in the body that refer to the
/// item or index are rewritten to those unique names, so every repetition
/// binds its own value.
#[derive(Debug, Clone, PartialEq)]
pub struct ForEach {
    pub collection: String,
    pub contents: Box<SqlNode>,
    pub item: Option<String>,
    pub index: Option<String>,
    pub open: Option<String>,
    pub close: Option<String>,
    pub separator: Option<String>,

    /// Treat a null collection as empty instead of failing.
    pub nullable: bool,
}

const ITEM_PREFIX: &str = "__frch_";

impl ForEach {
    pub fn new(collection: impl Into<String>, contents: SqlNode) -> ForEach {
        ForEach {
            collection: collection.into(),
            contents: Box::new(contents),
            item: None,
            index: None,
            open: None,
            close: None,
            separator: None,
            nullable: false,
        }
    }

    pub(super) fn apply(&self, cx: &mut DynamicContext<'_>) -> Result<bool> {
        if self.nullable && cx.evaluate(&self.collection)?.is_null() {
            return Ok(true);
        }

        let entries = cx.evaluate_iterable(&self.collection)?;
        if entries.is_empty() {
            return Ok(true);
        }

        if let Some(open) = &self.open {
            cx.append_sql(open);
        }

        let mut first = true;
        for (index, item) in entries {
            let unique = cx.next_unique();

            if let Some(name) = &self.index {
                cx.bind(name.clone(), index.clone());
                cx.bind(itemize(name, unique), index);
            }
            if let Some(name) = &self.item {
                cx.bind(name.clone(), item.clone());
                cx.bind(itemize(name, unique), item);
            }

            let (_, body) = cx.capture(true, |cx| self.contents.apply(cx))?;
            let body = self.rewrite(&body, unique)?;

            if body.trim().is_empty() {
                cx.append_sql(&body);
                continue;
            }

            if !first {
                if let Some(separator) = &self.separator {
                    cx.append_sql(separator);
                }
            }
            cx.append_sql(&body);
            first = false;
        }

        if let Some(close) = &self.close {
            cx.append_sql(close);
        }

        if let Some(name) = &self.item {
            cx.unbind(name);
        }
        if let Some(name) = &self.index {
            cx.unbind(name);
        }

        Ok(true)
    }

    /// Points `#{item...}` and `#{index...}` at this repetition's bindings.
    fn rewrite(&self, body: &str, unique: usize) -> Result<String> {
        TokenScanner::parameters().parse(body, |content| {
            let rewritten = self
                .item
                .as_deref()
                .and_then(|item| rename_root(content, item, unique))
                .or_else(|| {
                    self.index
                        .as_deref()
                        .and_then(|index| rename_root(content, index, unique))
                })
                .unwrap_or_else(|| content.to_string());
            Ok(format!("#{{{rewritten}}}"))
        })
    }
}

fn itemize(name: &str, unique: usize) -> String {
    format!("{ITEM_PREFIX}{name}_{unique}")
}

/// Renames `name` when it is the root of the placeholder's property, i.e.
/// followed by the end, `.`, `,`, `:` or whitespace.
fn rename_root(content: &str, name: &str, unique: usize) -> Option<String> {
    let rest = content.trim_start().strip_prefix(name)?;
    match rest.chars().next() {
        None => {}
        Some(c) if c == '.' || c == ',' || c == ':' || c.is_whitespace() => {}
        Some(_) => return None,
    }
    Some(format!("{}{rest}", itemize(name, unique)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renames_only_whole_roots() {
        assert_eq!(
            rename_root("item.name, jdbcType=VARCHAR", "item", 2).as_deref(),
            Some("__frch_item_2.name, jdbcType=VARCHAR")
        );
        assert_eq!(rename_root(" item", "item", 0).as_deref(), Some("__frch_item_0"));
        assert_eq!(rename_root("items", "item", 0), None);
        assert_eq!(rename_root("other.item", "item", 0), None);
    }
}
