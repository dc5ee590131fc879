use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{DocchatError, Result};

/// A validated user question
///
/// Always non-empty after trimming. Construct with [`Query::parse`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Query(String);

impl Query {
    /// Parse raw caller input, trimming surrounding whitespace
    pub fn parse(raw: &str) -> Result<Self> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(DocchatError::invalid_input("query must not be empty"));
        }
        Ok(Self(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for Query {
    type Error = DocchatError;

    fn try_from(value: String) -> Result<Self> {
        Self::parse(&value)
    }
}

impl From<Query> for String {
    fn from(query: Query) -> Self {
        query.0
    }
}

impl fmt::Display for Query {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    #[test]
    fn test_parse_trims_whitespace() {
        let query = Query::parse("  What is the refund policy?\n").unwrap();
        assert_eq!(query.as_str(), "What is the refund policy?");
    }

    #[test]
    fn test_parse_rejects_blank() {
        for raw in ["", "   ", "\n\t "] {
            let err = Query::parse(raw).unwrap_err();
            assert_eq!(err.kind(), ErrorKind::InvalidInput);
        }
    }

    #[test]
    fn test_deserialize_validates() {
        let ok: Query = serde_json::from_str("\" hello \"").unwrap();
        assert_eq!(ok.as_str(), "hello");
        assert!(serde_json::from_str::<Query>("\"  \"").is_err());
    }
}
