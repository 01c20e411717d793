use crate::{Error, Result};
use std::{fmt, str::FromStr};

/// What a statement does. Taken from the element name that declared it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CommandKind {
    Select,
    Insert,
    Update,
    Delete,
}

impl CommandKind {
    pub fn is_select(self) -> bool {
        matches!(self, CommandKind::Select)
    }

    pub fn is_insert(self) -> bool {
        matches!(self, CommandKind::Insert)
    }
}

impl FromStr for CommandKind {
    type Err = Error;

    fn from_str(src: &str) -> Result<CommandKind> {
        match src.to_ascii_lowercase().as_str() {
            "select" => Ok(CommandKind::Select),
            "insert" => Ok(CommandKind::Insert),
            "update" => Ok(CommandKind::Update),
            "delete" => Ok(CommandKind::Delete),
            _ => Err(Error::invalid_mapping(format!("unknown statement kind '{src}'"))),
        }
    }
}

impl fmt::Display for CommandKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            CommandKind::Select => "select",
            CommandKind::Insert => "insert",
            CommandKind::Update => "update",
            CommandKind::Delete => "delete",
        })
    }
}

/// How the execution layer should prepare the statement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StatementType {
    Statement,
    #[default]
    Prepared,
    Callable,
}

impl FromStr for StatementType {
    type Err = Error;

    fn from_str(src: &str) -> Result<StatementType> {
        match src {
            "STATEMENT" => Ok(StatementType::Statement),
            "PREPARED" => Ok(StatementType::Prepared),
            "CALLABLE" => Ok(StatementType::Callable),
            _ => Err(Error::invalid_mapping(format!("unknown statement type '{src}'"))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ResultSetType {
    #[default]
    Default,
    ForwardOnly,
    ScrollInsensitive,
    ScrollSensitive,
}

impl FromStr for ResultSetType {
    type Err = Error;

    fn from_str(src: &str) -> Result<ResultSetType> {
        match src {
            "DEFAULT" => Ok(ResultSetType::Default),
            "FORWARD_ONLY" => Ok(ResultSetType::ForwardOnly),
            "SCROLL_INSENSITIVE" => Ok(ResultSetType::ScrollInsensitive),
            "SCROLL_SENSITIVE" => Ok(ResultSetType::ScrollSensitive),
            _ => Err(Error::invalid_mapping(format!("unknown result set type '{src}'"))),
        }
    }
}

/// How generated keys are obtained after (or before) an insert.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum KeyGenerator {
    #[default]
    None,

    /// Keys reported by the driver for the executed statement.
    Generated,

    /// Keys fetched by running another statement.
    SelectKey {
        statement_id: String,
        execute_before: bool,
    },
}
