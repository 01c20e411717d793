/// Collapses every run of whitespace into a single space and trims both ends.
pub fn squash(sql: &str) -> String {
    sql.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Compares two SQL strings ignoring whitespace layout.
#[macro_export]
macro_rules! assert_sql_eq {
    ($actual:expr, $expected:expr $(,)?) => {
        assert_eq!(
            $crate::str::squash(&$actual),
            $crate::str::squash(&$expected)
        )
    };
}
