use thiserror::Error;

/// Errors raised while tailoring a tree. Every one of them aborts the
/// translation of the whole statement.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum TailorError {
    /// A node the rule needs is absent.
    #[error("missing {0}")]
    InvalidReference(String),

    /// The traversal context disagrees with the tree shape.
    #[error("structural mismatch: {0}")]
    StructuralMismatch(String),

    /// The target dialect cannot express the construct.
    #[error("{construct} is not supported by {dialect}")]
    Unsupported {
        construct: String,
        dialect: &'static str,
    },

    /// A row limit that is not a representable integer.
    #[error("row limit {value} is not a valid TOP argument")]
    NumericRange { value: String },

    #[error("{function}: {detail}")]
    ArgumentCount { function: String, detail: String },
}

impl TailorError {
    pub(crate) fn unsupported(construct: impl Into<String>, dialect: &'static str) -> Self {
        TailorError::Unsupported {
            construct: construct.into(),
            dialect,
        }
    }

    pub(crate) fn argument_count(function: impl Into<String>, detail: impl Into<String>) -> Self {
        TailorError::ArgumentCount {
            function: function.into(),
            detail: detail.into(),
        }
    }
}

pub type Result<T, E = TailorError> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages_name_the_construct() {
        let err = TailorError::unsupported("SWITCH", "MS SQL Server");
        assert_eq!(err.to_string(), "SWITCH is not supported by MS SQL Server");

        let err = TailorError::argument_count("SUBSTRING", "too many parameters");
        assert_eq!(err.to_string(), "SUBSTRING: too many parameters");

        let err = TailorError::NumericRange {
            value: "2.5".into(),
        };
        assert!(err.to_string().contains("2.5"));
    }
}
