use crate::Result;
use indexmap::IndexMap;

/// Finds `open ... close` spans in text and replaces each with the output of
/// a handler.
///
/// A delimiter preceded by a backslash is literal; the backslash is dropped.
/// A span that is never closed is copied through unchanged. Handler output is
/// never scanned again.
#[derive(Debug, Clone, Copy)]
pub struct TokenScanner<'a> {
    open: &'a str,
    close: &'a str,
}

impl<'a> TokenScanner<'a> {
    pub const fn new(open: &'a str, close: &'a str) -> TokenScanner<'a> {
        TokenScanner { open, close }
    }

    /// Scanner for `#{...}` parameter placeholders.
    pub const fn parameters() -> TokenScanner<'static> {
        TokenScanner::new("#{", "}")
    }

    /// Scanner for `${...}` variables.
    pub const fn variables() -> TokenScanner<'static> {
        TokenScanner::new("${", "}")
    }

    pub fn parse(&self, text: &str, mut handler: impl FnMut(&str) -> Result<String>) -> Result<String> {
        let Some(mut start) = text.find(self.open) else {
            return Ok(text.to_string());
        };

        let bytes = text.as_bytes();
        let mut offset = 0;
        let mut out = String::with_capacity(text.len());
        let mut expression = String::new();

        loop {
            if start > 0 && bytes[start - 1] == b'\\' {
                // Escaped open delimiter
                out.push_str(&text[offset..(start - 1).max(offset)]);
                out.push_str(self.open);
                offset = start + self.open.len();
            } else {
                expression.clear();
                out.push_str(&text[offset..start]);
                offset = start + self.open.len();

                let mut end = find_from(text, self.close, offset);
                while let Some(found) = end {
                    if found > offset && bytes[found - 1] == b'\\' {
                        // Escaped close delimiter inside the expression
                        expression.push_str(&text[offset..found - 1]);
                        expression.push_str(self.close);
                        offset = found + self.close.len();
                        end = find_from(text, self.close, offset);
                    } else {
                        expression.push_str(&text[offset..found]);
                        break;
                    }
                }

                match end {
                    None => {
                        out.push_str(&text[start..]);
                        offset = text.len();
                    }
                    Some(found) => {
                        out.push_str(&handler(&expression)?);
                        offset = found + self.close.len();
                    }
                }
            }

            match find_from(text, self.open, offset) {
                Some(next) => start = next,
                None => break,
            }
        }

        if offset < text.len() {
            out.push_str(&text[offset..]);
        }

        Ok(out)
    }

    /// Returns `true` if `text` contains at least one unescaped span.
    pub fn has_token(&self, text: &str) -> bool {
        let mut found = false;
        let _ = self.parse(text, |_| {
            found = true;
            Ok(String::new())
        });
        found
    }
}

fn find_from(text: &str, needle: &str, from: usize) -> Option<usize> {
    text.get(from..)?.find(needle).map(|i| i + from)
}

/// Controls `${key:default}` handling in [`substitute_variables`].
#[derive(Debug, Clone, Default)]
pub struct DefaultValue<'a> {
    pub enabled: bool,
    pub separator: &'a str,
}

/// Replaces `${key}` with the variable's value. Unknown keys are left in
/// place so they can be resolved later against invocation bindings.
pub fn substitute_variables(
    text: &str,
    variables: &IndexMap<String, String>,
    default_value: &DefaultValue<'_>,
) -> String {
    let substituted = TokenScanner::variables().parse(text, |content| {
        if default_value.enabled && !default_value.separator.is_empty() {
            if let Some((key, default)) = content.split_once(default_value.separator) {
                return Ok(variables
                    .get(key)
                    .cloned()
                    .unwrap_or_else(|| default.to_string()));
            }
        }

        Ok(match variables.get(content) {
            Some(value) => value.clone(),
            None => format!("${{{content}}}"),
        })
    });

    // The handler never fails.
    substituted.unwrap_or_else(|_| text.to_string())
}
