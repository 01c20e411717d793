use serde::Deserialize;

/// How bind markers are written into the final SQL.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlaceholderStyle {
    /// `?`
    #[default]
    Question,

    /// `$1`, `$2`, ...
    Dollar,

    /// `?1`, `?2`, ...
    Numbered,
}

/// The 1-based position of a bind value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Placeholder(pub usize);

impl Placeholder {
    pub fn render(self, style: PlaceholderStyle) -> String {
        match style {
            PlaceholderStyle::Question => "?".to_string(),
            PlaceholderStyle::Dollar => format!("${}", self.0),
            PlaceholderStyle::Numbered => format!("?{}", self.0),
        }
    }
}
