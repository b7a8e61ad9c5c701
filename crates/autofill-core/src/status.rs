//! Criterion status codec.
//!
//! Status fields hold one of four states. Ordinals are chosen so that a
//! single-bit error cannot turn `Unknown` (0b00) into `Met` (0b11).
//!
//! | Ordinal | Canonical | Accepted spellings (case-insensitive) |
//! |---------|-----------|---------------------------------------|
//! | 0       | `?`       | `?`, `unknown`                        |
//! | 1       | `Unmet`   | `unmet`                               |
//! | 2       | `N/A`     | `n/a`, `na`                           |
//! | 3       | `Met`     | `met`                                 |

use std::fmt;
use std::str::FromStr;

use thiserror::Error;

/// Errors produced while decoding a status value.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StatusError {
    #[error("status value is empty")]
    Empty,

    #[error("unrecognised status value: {value:?}")]
    Unrecognized { value: String },

    /// `?`/`unknown` carry no information and are never proposed.
    #[error("status value {value:?} is not a usable proposal")]
    UnknownNotAllowed { value: String },

    #[error("status ordinal {ordinal} out of range 0..=3")]
    OrdinalOutOfRange { ordinal: u8 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(u8)]
pub enum CriterionStatus {
    Unknown = 0,
    Unmet = 1,
    NotApplicable = 2,
    Met = 3,
}

impl CriterionStatus {
    pub const ALL: [CriterionStatus; 4] = [
        CriterionStatus::Unknown,
        CriterionStatus::Unmet,
        CriterionStatus::NotApplicable,
        CriterionStatus::Met,
    ];

    pub fn ordinal(self) -> u8 {
        self as u8
    }

    pub fn from_ordinal(ordinal: u8) -> Result<Self, StatusError> {
        Self::ALL
            .get(usize::from(ordinal))
            .copied()
            .ok_or(StatusError::OrdinalOutOfRange { ordinal })
    }

    /// Canonical display form.
    pub fn as_str(self) -> &'static str {
        match self {
            CriterionStatus::Unknown => "?",
            CriterionStatus::Unmet => "Unmet",
            CriterionStatus::NotApplicable => "N/A",
            CriterionStatus::Met => "Met",
        }
    }

    /// Parse a stored or user-supplied value. Accepts the unknown sentinel.
    pub fn parse(value: &str) -> Result<Self, StatusError> {
        let normalized = value.trim().to_ascii_lowercase();
        match normalized.as_str() {
            "" => Err(StatusError::Empty),
            "?" | "unknown" => Ok(CriterionStatus::Unknown),
            "unmet" => Ok(CriterionStatus::Unmet),
            "n/a" | "na" => Ok(CriterionStatus::NotApplicable),
            "met" => Ok(CriterionStatus::Met),
            _ => Err(StatusError::Unrecognized {
                value: value.to_string(),
            }),
        }
    }

    /// Parse a value proposed by automation; the unknown sentinel is rejected.
    pub fn parse_for_automation(value: &str) -> Result<Self, StatusError> {
        match Self::parse(value)? {
            CriterionStatus::Unknown => Err(StatusError::UnknownNotAllowed {
                value: value.to_string(),
            }),
            status => Ok(status),
        }
    }

    pub fn is_unknown(self) -> bool {
        self == CriterionStatus::Unknown
    }
}

impl fmt::Display for CriterionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CriterionStatus {
    type Err = StatusError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

/// Canonical string for an ordinal.
pub fn render(ordinal: u8) -> Result<&'static str, StatusError> {
    CriterionStatus::from_ordinal(ordinal).map(CriterionStatus::as_str)
}

/// Canonical spelling of a stored value, if it is a status at all.
pub fn canonicalize(value: &str) -> Option<&'static str> {
    CriterionStatus::parse(value).ok().map(CriterionStatus::as_str)
}

/// Canonical spelling of a proposed value; `None` for unknown or garbage.
pub fn canonicalize_for_automation(value: &str) -> Option<&'static str> {
    CriterionStatus::parse_for_automation(value)
        .ok()
        .map(CriterionStatus::as_str)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_parse_fixed_point() {
        for canonical in ["?", "Met", "Unmet", "N/A"] {
            let status = CriterionStatus::parse(canonical).unwrap();
            assert_eq!(render(status.ordinal()).unwrap(), canonical);
            let shouted = canonical.to_ascii_uppercase();
            assert_eq!(CriterionStatus::parse(&shouted).unwrap(), status);
        }
    }

    #[test]
    fn test_aliases_and_whitespace() {
        assert_eq!(
            CriterionStatus::parse(" na ").unwrap(),
            CriterionStatus::NotApplicable
        );
        assert_eq!(
            CriterionStatus::parse("UNKNOWN").unwrap(),
            CriterionStatus::Unknown
        );
        assert_eq!(canonicalize("mEt"), Some("Met"));
    }

    #[test]
    fn test_automation_rejects_unknown_sentinel() {
        for value in ["?", "unknown", " Unknown "] {
            assert!(matches!(
                CriterionStatus::parse_for_automation(value),
                Err(StatusError::UnknownNotAllowed { .. })
            ));
            assert_eq!(canonicalize_for_automation(value), None);
        }
        assert_eq!(canonicalize_for_automation("n/a"), Some("N/A"));
    }

    #[test]
    fn test_garbage_and_empty() {
        assert_eq!(CriterionStatus::parse("  "), Err(StatusError::Empty));
        assert!(matches!(
            CriterionStatus::parse("maybe"),
            Err(StatusError::Unrecognized { .. })
        ));
        assert_eq!(canonicalize("yes"), None);
    }

    #[test]
    fn test_ordinals_keep_unknown_and_met_two_bits_apart() {
        let unknown = CriterionStatus::Unknown.ordinal();
        let met = CriterionStatus::Met.ordinal();
        assert_eq!((unknown ^ met).count_ones(), 2);
        assert!(matches!(
            CriterionStatus::from_ordinal(4),
            Err(StatusError::OrdinalOutOfRange { ordinal: 4 })
        ));
    }
}
