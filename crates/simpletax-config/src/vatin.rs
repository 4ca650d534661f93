//! VAT identification numbers.

use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

use regex_lite::Regex;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// National number formats, keyed by VAT prefix (Greece uses `EL`,
/// Northern Ireland `XI`).
const NATIONAL_FORMATS: &[(&str, &str)] = &[
    ("AT", r"U\d{8}"),
    ("BE", r"[01]\d{9}"),
    ("BG", r"\d{9,10}"),
    ("CY", r"\d{8}[A-Z]"),
    ("CZ", r"\d{8,10}"),
    ("DE", r"\d{9}"),
    ("DK", r"\d{8}"),
    ("EE", r"\d{9}"),
    ("EL", r"\d{9}"),
    ("ES", r"[A-Z0-9]\d{7}[A-Z0-9]"),
    ("FI", r"\d{8}"),
    ("FR", r"[A-HJ-NP-Z0-9]{2}\d{9}"),
    ("GB", r"\d{9}|\d{12}|GD\d{3}|HA\d{3}"),
    ("HR", r"\d{11}"),
    ("HU", r"\d{8}"),
    ("IE", r"\d{7}[A-W][A-I]?|\d[A-Z+*]\d{5}[A-W]"),
    ("IT", r"\d{11}"),
    ("LT", r"\d{9}|\d{12}"),
    ("LU", r"\d{8}"),
    ("LV", r"\d{11}"),
    ("MT", r"\d{8}"),
    ("NL", r"\d{9}B\d{2}"),
    ("PL", r"\d{10}"),
    ("PT", r"\d{9}"),
    ("RO", r"[1-9]\d{1,9}"),
    ("SE", r"\d{10}01"),
    ("SI", r"\d{8}"),
    ("SK", r"\d{10}"),
    ("XI", r"\d{9}|\d{12}|GD\d{3}|HA\d{3}"),
];

static FORMATS: LazyLock<Vec<(&'static str, Regex)>> = LazyLock::new(|| {
    NATIONAL_FORMATS
        .iter()
        .map(|(prefix, pattern)| {
            let regex = Regex::new(&format!("^(?:{pattern})$"))
                .expect("national VATIN formats are valid patterns");
            (*prefix, regex)
        })
        .collect()
});

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InvalidVatin {
    #[error("VAT identification number is empty")]
    Empty,

    #[error("unsupported VAT country prefix in [{0}]")]
    UnknownPrefix(String),

    #[error("malformed VAT identification number [{0}]")]
    Malformed(String),
}

/// A VAT identification number, normalized to upper case without separators.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Vatin(String);

impl Vatin {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

fn normalize(s: &str) -> String {
    s.trim()
        .chars()
        .filter(|c| !matches!(c, ' ' | '.' | '-'))
        .map(|c| c.to_ascii_uppercase())
        .collect()
}

impl FromStr for Vatin {
    type Err = InvalidVatin;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = normalize(s);
        if normalized.is_empty() {
            return Err(InvalidVatin::Empty);
        }
        let Some(prefix) = normalized.get(..2) else {
            return Err(InvalidVatin::UnknownPrefix(s.to_string()));
        };
        let (_, format) = FORMATS
            .iter()
            .find(|(p, _)| *p == prefix)
            .ok_or_else(|| InvalidVatin::UnknownPrefix(s.to_string()))?;

        if format.is_match(&normalized[2..]) {
            Ok(Self(normalized))
        } else {
            Err(InvalidVatin::Malformed(s.to_string()))
        }
    }
}

impl TryFrom<String> for Vatin {
    type Error = InvalidVatin;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Vatin> for String {
    fn from(vatin: Vatin) -> Self {
        vatin.0
    }
}

impl fmt::Display for Vatin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_all_formats_compile() {
        assert_eq!(FORMATS.len(), NATIONAL_FORMATS.len());
    }

    #[test]
    fn test_valid_numbers() {
        for vatin in [
            "FR12345678901",
            "DE123456789",
            "ATU12345678",
            "BE0123456789",
            "EL123456789",
            "NL123456789B01",
            "ESX1234567X",
            "IE1234567WA",
            "GBGD123",
            "SE123456789001",
        ] {
            assert!(vatin.parse::<Vatin>().is_ok(), "{vatin} should be valid");
        }
    }

    #[test]
    fn test_normalization() {
        let vatin: Vatin = " fr 12.345-678 901 ".parse().unwrap();
        assert_eq!(vatin.as_str(), "FR12345678901");
    }

    #[test]
    fn test_invalid_numbers() {
        assert_eq!("".parse::<Vatin>(), Err(InvalidVatin::Empty));
        assert_eq!(
            "F".parse::<Vatin>(),
            Err(InvalidVatin::UnknownPrefix("F".to_string()))
        );
        assert_eq!(
            "US123456789".parse::<Vatin>(),
            Err(InvalidVatin::UnknownPrefix("US123456789".to_string()))
        );
        assert_eq!(
            "FR1234".parse::<Vatin>(),
            Err(InvalidVatin::Malformed("FR1234".to_string()))
        );
        // Greece uses EL, not its ISO code.
        assert!("GR123456789".parse::<Vatin>().is_err());
        assert!("DE1234567890".parse::<Vatin>().is_err());
        assert!("FRIO345678901".parse::<Vatin>().is_err());
    }

    #[test]
    fn test_non_ascii_prefix_does_not_panic() {
        assert!("é12345".parse::<Vatin>().is_err());
    }

    #[test]
    fn test_serde_rejects_invalid() {
        let vatin: Vatin = serde_json::from_str("\"DE123456789\"").unwrap();
        assert_eq!(serde_json::to_string(&vatin).unwrap(), "\"DE123456789\"");
        assert!(serde_json::from_str::<Vatin>("\"DE12\"").is_err());
    }
}
