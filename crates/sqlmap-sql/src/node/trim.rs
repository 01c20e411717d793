use super::SqlNode;
use crate::DynamicContext;
use sqlmap_core::Result;

const WHERE_PREFIX_OVERRIDES: &[&str] = &[
    "AND ", "OR ", "AND\n", "OR\n", "AND\r", "OR\r", "AND\t", "OR\t",
];

/// Wraps its contents with a prefix and suffix, first stripping one leading
/// and one trailing override token. Renders nothing when the contents are
/// empty after stripping.
#[derive(Debug, Clone, PartialEq)]
pub struct Trim {
    pub contents: Box<SqlNode>,
    pub prefix: Option<String>,
    pub suffix: Option<String>,
    pub prefix_overrides: Vec<String>,
    pub suffix_overrides: Vec<String>,
}

impl Trim {
    pub fn new(contents: SqlNode) -> Trim {
        Trim {
            contents: Box::new(contents),
            prefix: None,
            suffix: None,
            prefix_overrides: vec![],
            suffix_overrides: vec![],
        }
    }

    /// `WHERE`, swallowing a leading `AND` or `OR`.
    pub fn where_(contents: SqlNode) -> Trim {
        Trim {
            prefix: Some("WHERE".to_string()),
            prefix_overrides: WHERE_PREFIX_OVERRIDES
                .iter()
                .map(|token| token.to_string())
                .collect(),
            ..Trim::new(contents)
        }
    }

    /// `SET`, swallowing a leading or trailing comma.
    pub fn set(contents: SqlNode) -> Trim {
        Trim {
            prefix: Some("SET".to_string()),
            prefix_overrides: vec![",".to_string()],
            suffix_overrides: vec![",".to_string()],
            ..Trim::new(contents)
        }
    }

    pub fn prefix(mut self, prefix: Option<String>) -> Trim {
        self.prefix = prefix;
        self
    }

    pub fn suffix(mut self, suffix: Option<String>) -> Trim {
        self.suffix = suffix;
        self
    }

    /// Sets prefix overrides from a `|` separated list such as `AND |OR `.
    /// Tokens are matched as written, including trailing whitespace.
    pub fn prefix_overrides(mut self, overrides: Option<&str>) -> Trim {
        self.prefix_overrides = parse_overrides(overrides);
        self
    }

    pub fn suffix_overrides(mut self, overrides: Option<&str>) -> Trim {
        self.suffix_overrides = parse_overrides(overrides);
        self
    }

    pub(super) fn apply(&self, cx: &mut DynamicContext<'_>) -> Result<bool> {
        let (rendered, sql) = cx.capture(false, |cx| self.contents.apply(cx))?;
        let sql = self.trim(&sql);
        if !sql.is_empty() {
            cx.append_sql(&sql);
        }
        Ok(rendered)
    }

    fn trim(&self, sql: &str) -> String {
        let mut body = sql.trim();

        if body.is_empty() {
            return String::new();
        }

        if let Some(token) = self
            .prefix_overrides
            .iter()
            .find(|token| starts_with_ignore_case(body, token))
        {
            body = &body[token.trim_end().len()..];
        }

        if let Some(token) = self
            .suffix_overrides
            .iter()
            .find(|token| ends_with_ignore_case(body, token))
        {
            body = &body[..body.len() - token.trim_start().len()];
        }

        let body = body.trim();
        if body.is_empty() {
            return String::new();
        }

        let mut out = String::with_capacity(body.len() + 16);
        if let Some(prefix) = &self.prefix {
            out.push_str(prefix);
            out.push(' ');
        }
        out.push_str(body);
        if let Some(suffix) = &self.suffix {
            out.push(' ');
            out.push_str(suffix);
        }
        out
    }
}

fn parse_overrides(overrides: Option<&str>) -> Vec<String> {
    overrides
        .map(|overrides| {
            overrides
                .split('|')
                .filter(|token| !token.is_empty())
                .map(str::to_uppercase)
                .collect()
        })
        .unwrap_or_default()
}

fn starts_with_ignore_case(sql: &str, token: &str) -> bool {
    sql.get(..token.len())
        .is_some_and(|head| head.eq_ignore_ascii_case(token))
}

fn ends_with_ignore_case(sql: &str, token: &str) -> bool {
    sql.len() >= token.len()
        && sql
            .get(sql.len() - token.len()..)
            .is_some_and(|tail| tail.eq_ignore_ascii_case(token))
}
