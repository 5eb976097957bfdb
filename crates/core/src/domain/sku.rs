use std::fmt;

use serde::{Deserialize, Serialize};

use crate::errors::DomainError;

/// Stock-keeping unit identifier. Canonical form lives in the warehouse;
/// this type only guarantees the value is non-blank.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Sku(pub String);

impl Sku {
    pub fn parse(value: &str) -> Result<Self, DomainError> {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            return Err(DomainError::InvalidRequest("sku must not be empty".to_string()));
        }
        Ok(Self(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Sku {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::Sku;

    #[test]
    fn parse_trims_surrounding_whitespace() {
        let sku = Sku::parse("  SKU123 ").expect("valid sku");
        assert_eq!(sku.as_str(), "SKU123");
    }

    #[test]
    fn parse_rejects_blank_identifiers() {
        assert!(Sku::parse("").is_err());
        assert!(Sku::parse("   ").is_err());
    }
}
