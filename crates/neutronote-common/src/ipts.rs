//! IPTS (Integrated Proposal Tracking System) identifiers and the
//! notebook storage layout inside an IPTS share.

use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{NeutronoteError, Result};

/// A normalised IPTS identifier, always `IPTS-<digits>`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Ipts(String);

impl Ipts {
    /// Accepts `IPTS-12345`, `ipts-12345` or `12345`.
    pub fn parse(input: &str) -> Result<Self> {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            return Err(NeutronoteError::Validation(
                "Please enter an IPTS number.".to_string(),
            ));
        }
        let upper = trimmed.to_uppercase();
        let digits = upper.strip_prefix("IPTS-").unwrap_or(&upper).trim();
        if digits.is_empty() || !digits.chars().all(|c| c.is_ascii_digit()) {
            return Err(NeutronoteError::Validation(
                "Invalid IPTS format. Use 'IPTS-12345' or '12345'.".to_string(),
            ));
        }
        Ok(Self(format!("IPTS-{}", digits)))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The numeric part, e.g. `33219`.
    pub fn number(&self) -> &str {
        &self.0["IPTS-".len()..]
    }
}

impl fmt::Display for Ipts {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for Ipts {
    type Error = NeutronoteError;

    fn try_from(value: String) -> Result<Self> {
        Ipts::parse(&value)
    }
}

impl From<Ipts> for String {
    fn from(value: Ipts) -> Self {
        value.0
    }
}

/// Notebook folder for an IPTS: `<data_root>/IPTS-<n>/shared/neutronote`.
pub fn notebook_dir(data_root: &Path, ipts: &Ipts) -> PathBuf {
    data_root.join(ipts.as_str()).join("shared").join("neutronote")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_accepts_prefixed_and_bare() {
        assert_eq!(Ipts::parse("IPTS-33219").unwrap().as_str(), "IPTS-33219");
        assert_eq!(Ipts::parse(" ipts-33219 ").unwrap().as_str(), "IPTS-33219");
        assert_eq!(Ipts::parse("33219").unwrap().number(), "33219");
    }

    #[test]
    fn test_parse_rejects_garbage() {
        let err = Ipts::parse("IPTS-abc").unwrap_err();
        assert!(err.to_string().contains("Invalid IPTS format"));
        assert!(Ipts::parse("IPTS-").is_err());
        let err = Ipts::parse("   ").unwrap_err();
        assert_eq!(err.to_string(), "Please enter an IPTS number.");
    }

    #[test]
    fn test_notebook_dir_layout() {
        let ipts = Ipts::parse("33219").unwrap();
        let dir = notebook_dir(Path::new("/SNS/SNAP"), &ipts);
        assert_eq!(dir, PathBuf::from("/SNS/SNAP/IPTS-33219/shared/neutronote"));
    }

    #[test]
    fn test_serde_round_trip_normalises() {
        let ipts: Ipts = serde_json::from_str("\"12345\"").unwrap();
        assert_eq!(serde_json::to_string(&ipts).unwrap(), "\"IPTS-12345\"");
    }
}
