use crate::{Error, Result};
use std::{fmt, str::FromStr};

macro_rules! jdbc_types {
    ( $( $variant:ident => $name:literal, )+ ) => {
        /// Storage-side type tag attached to parameters and result columns.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum JdbcType {
            $( $variant, )+
        }

        impl JdbcType {
            pub fn as_str(self) -> &'static str {
                match self {
                    $( JdbcType::$variant => $name, )+
                }
            }
        }

        impl FromStr for JdbcType {
            type Err = Error;

            fn from_str(src: &str) -> Result<JdbcType> {
                match src {
                    $( $name => Ok(JdbcType::$variant), )+
                    _ => Err(Error::invalid_mapping(format!(
                        "error resolving storage type '{src}'; no such jdbc type"
                    ))),
                }
            }
        }
    };
}

jdbc_types! {
    Array => "ARRAY",
    Bit => "BIT",
    TinyInt => "TINYINT",
    SmallInt => "SMALLINT",
    Integer => "INTEGER",
    BigInt => "BIGINT",
    Float => "FLOAT",
    Real => "REAL",
    Double => "DOUBLE",
    Numeric => "NUMERIC",
    Decimal => "DECIMAL",
    Char => "CHAR",
    Varchar => "VARCHAR",
    LongVarchar => "LONGVARCHAR",
    Date => "DATE",
    Time => "TIME",
    Timestamp => "TIMESTAMP",
    Binary => "BINARY",
    VarBinary => "VARBINARY",
    LongVarBinary => "LONGVARBINARY",
    Null => "NULL",
    Other => "OTHER",
    Blob => "BLOB",
    Clob => "CLOB",
    Boolean => "BOOLEAN",
    Cursor => "CURSOR",
    Undefined => "UNDEFINED",
    NVarchar => "NVARCHAR",
    NChar => "NCHAR",
    NClob => "NCLOB",
    Struct => "STRUCT",
    JavaObject => "JAVA_OBJECT",
    Distinct => "DISTINCT",
    Ref => "REF",
    DataLink => "DATALINK",
    RowId => "ROWID",
    LongNVarchar => "LONGNVARCHAR",
    SqlXml => "SQLXML",
    DateTimeOffset => "DATETIMEOFFSET",
    TimeWithTimezone => "TIME_WITH_TIMEZONE",
    TimestampWithTimezone => "TIMESTAMP_WITH_TIMEZONE",
}

impl fmt::Display for JdbcType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
