use indexmap::IndexMap;
use sqlmap_core::{Error, Result};

/// Attribute names accepted after the property in `#{prop, name=value}`.
const OPTIONS: &[&str] = &[
    "javaType",
    "jdbcType",
    "mode",
    "numericScale",
    "resultMap",
    "typeHandler",
    "jdbcTypeName",
];

/// The parsed content of one `#{...}` placeholder.
///
/// Either a bare property path (`property`) or a parenthesized expression
/// (`expression`), followed by an optional legacy `:JDBCTYPE` tag and any
/// number of `name=value` options.
///
/// ```
/// # use sqlmap_sql::ParameterExpression;
/// let expr = ParameterExpression::parse("id, javaType=int, jdbcType=INTEGER").unwrap();
/// assert_eq!(expr.property(), Some("id"));
/// assert_eq!(expr.get("javaType"), Some("int"));
/// assert_eq!(expr.get("jdbcType"), Some("INTEGER"));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParameterExpression {
    attributes: IndexMap<String, String>,
}

impl ParameterExpression {
    pub fn parse(content: &str) -> Result<ParameterExpression> {
        let mut parser = Parser {
            src: content,
            bytes: content.as_bytes(),
            expr: ParameterExpression::default(),
        };
        parser.parse()?;
        Ok(parser.expr)
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).map(String::as_str)
    }

    pub fn property(&self) -> Option<&str> {
        self.get("property")
    }

    pub fn expression(&self) -> Option<&str> {
        self.get("expression")
    }

    /// Every attribute in the order it was written, including `property` or
    /// `expression`.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.attributes
            .iter()
            .map(|(name, value)| (name.as_str(), value.as_str()))
    }

    pub fn len(&self) -> usize {
        self.attributes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.attributes.is_empty()
    }
}

struct Parser<'a> {
    src: &'a str,
    bytes: &'a [u8],
    expr: ParameterExpression,
}

impl Parser<'_> {
    fn parse(&mut self) -> Result<()> {
        let p = self.skip_ws(0);
        if self.bytes.get(p) == Some(&b'(') {
            self.expression(p + 1)
        } else {
            self.property(p)
        }
    }

    fn expression(&mut self, left: usize) -> Result<()> {
        let mut depth = 1;
        let mut right = left;

        while depth > 0 {
            match self.bytes.get(right) {
                Some(b')') => depth -= 1,
                Some(b'(') => depth += 1,
                Some(_) => {}
                None => return Err(self.error(right)),
            }
            right += 1;
        }

        self.put("expression", &self.src[left..right - 1]);
        self.jdbc_type_opt(right)
    }

    fn property(&mut self, left: usize) -> Result<()> {
        if left < self.bytes.len() {
            let right = self.skip_until(left, b",:");
            self.put("property", self.src[left..right].trim());
            self.jdbc_type_opt(right)?;
        }
        Ok(())
    }

    fn jdbc_type_opt(&mut self, p: usize) -> Result<()> {
        let p = self.skip_ws(p);
        match self.bytes.get(p) {
            None => Ok(()),
            Some(b':') => self.jdbc_type(p + 1),
            Some(b',') => self.option(p + 1),
            Some(_) => Err(self.error(p)),
        }
    }

    fn jdbc_type(&mut self, p: usize) -> Result<()> {
        let left = self.skip_ws(p);
        let right = self.skip_until(left, b",");
        if right <= left {
            return Err(self.error(p));
        }
        self.put("jdbcType", self.src[left..right].trim());
        self.option(right + 1)
    }

    fn option(&mut self, mut p: usize) -> Result<()> {
        loop {
            let left = self.skip_ws(p);
            if left >= self.bytes.len() {
                return Ok(());
            }

            let eq = self.skip_until(left, b"=");
            let name = self.src[left..eq].trim();
            let value_start = (eq + 1).min(self.bytes.len());
            let right = self.skip_until(value_start, b",");
            let value = self.src[value_start..right].trim();

            if !OPTIONS.contains(&name) {
                return Err(Error::parse(format!(
                    "an invalid property '{}' was found in mapping #{{{}}}; valid properties are {}",
                    name,
                    self.src,
                    OPTIONS.join(", ")
                )));
            }

            self.put(name, value);
            p = right + 1;
        }
    }

    fn put(&mut self, name: &str, value: &str) {
        self.expr
            .attributes
            .insert(name.to_string(), value.to_string());
    }

    fn skip_ws(&self, p: usize) -> usize {
        (p..self.bytes.len())
            .find(|&i| self.bytes[i] > 0x20)
            .unwrap_or(self.bytes.len())
    }

    fn skip_until(&self, p: usize, end: &[u8]) -> usize {
        (p..self.bytes.len())
            .find(|&i| end.contains(&self.bytes[i]))
            .unwrap_or(self.bytes.len())
    }

    fn error(&self, p: usize) -> Error {
        Error::parse(format!("Parsing error in {{{}}} in position {}", self.src, p))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_content_has_no_attributes() {
        assert!(ParameterExpression::parse("").unwrap().is_empty());
        assert!(ParameterExpression::parse("   ").unwrap().is_empty());
    }

    #[test]
    fn unbalanced_expression_reports_position() {
        let err = ParameterExpression::parse("(id.toString()").unwrap_err();
        assert_eq!(
            err.to_string(),
            "parse error: Parsing error in {(id.toString()} in position 14"
        );
    }
}
