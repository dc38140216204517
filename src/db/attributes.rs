//! Connection attributes readable and settable through the facade.

use crate::error_handling::DatabaseError;

/// Case folding applied to column names of fetched rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ColumnCase {
    /// Keep names as the driver reports them
    #[default]
    Natural,
    /// Lower-case every column name
    Lower,
    /// Upper-case every column name
    Upper,
}

impl ColumnCase {
    pub(crate) fn apply(&self, name: &str) -> String {
        match self {
            ColumnCase::Natural => name.to_string(),
            ColumnCase::Lower => name.to_lowercase(),
            ColumnCase::Upper => name.to_uppercase(),
        }
    }
}

/// Attributes known to the facade.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Attribute {
    /// Driver of the configured DSN (`mysql`, `pgsql`, `sqlite`); read-only
    DriverName,
    /// Column name case folding for fetched rows
    ColumnCase,
    /// Whether a transaction is open; read-only
    InTransaction,
}

impl Attribute {
    pub fn name(&self) -> &'static str {
        match self {
            Attribute::DriverName => "DriverName",
            Attribute::ColumnCase => "ColumnCase",
            Attribute::InTransaction => "InTransaction",
        }
    }

    pub fn is_read_only(&self) -> bool {
        !matches!(self, Attribute::ColumnCase)
    }
}

/// Value of an [`Attribute`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttributeValue {
    Text(String),
    Bool(bool),
    Case(ColumnCase),
}

impl AttributeValue {
    pub(crate) fn into_case(self, attribute: Attribute) -> Result<ColumnCase, DatabaseError> {
        match self {
            AttributeValue::Case(case) => Ok(case),
            _ => Err(DatabaseError::InvalidAttributeValue(attribute.name())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_column_case_apply() {
        assert_eq!(ColumnCase::Natural.apply("UserId"), "UserId");
        assert_eq!(ColumnCase::Lower.apply("UserId"), "userid");
        assert_eq!(ColumnCase::Upper.apply("UserId"), "USERID");
    }

    #[test]
    fn test_only_column_case_is_writable() {
        assert!(Attribute::DriverName.is_read_only());
        assert!(Attribute::InTransaction.is_read_only());
        assert!(!Attribute::ColumnCase.is_read_only());
    }

    #[test]
    fn test_into_case_rejects_other_kinds() {
        let err = AttributeValue::Bool(true)
            .into_case(Attribute::ColumnCase)
            .unwrap_err();
        assert!(matches!(err, DatabaseError::InvalidAttributeValue("ColumnCase")));
    }
}
