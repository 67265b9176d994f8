//! Validated personal identifier types.
//!
//! A personal identifier is the 6-character anonymous handle a visitor
//! uses in place of an account: a 4-character prefix the user picks plus
//! a 2-character suffix the system picks. Identifiers are uppercase
//! alphanumeric, normalized at construction and at every comparison.
//!
//! ## Validation Rules
//!
//! - Prefix: exactly 4 ASCII alphanumeric characters, case-insensitive
//! - Suffix: exactly 2 characters from `[A-Z0-9]`
//! - Whole identifier: exactly 6 ASCII alphanumeric characters

use serde::{Deserialize, Serialize};

use crate::{IdentityError, Result};

/// Length of the user-chosen prefix.
pub const PREFIX_LEN: usize = 4;

/// Length of the system-chosen suffix.
pub const SUFFIX_LEN: usize = 2;

/// Total identifier length.
pub const ID_LEN: usize = PREFIX_LEN + SUFFIX_LEN;

/// Alphabet the system draws suffix characters from.
pub const SUFFIX_ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

/// Identifiers reserved for privileged application use.
///
/// These values mark official story authors elsewhere in the product.
/// The allocator refuses to mint them for ordinary visitors, and
/// verification reports them as not found so they cannot be probed.
pub const RESERVED_IDENTIFIERS: &[&str] = &["000000", "0000FF"];

/// A validated, normalized 4-character identifier prefix.
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ValidPrefix(String);

impl ValidPrefix {
    /// Validate and normalize a raw prefix.
    ///
    /// # Errors
    ///
    /// Returns `IdentityError::InvalidPrefix` unless the input is
    /// exactly 4 ASCII alphanumeric characters.
    ///
    /// # Examples
    ///
    /// ```
    /// use storyguard_identity::ValidPrefix;
    ///
    /// let prefix = ValidPrefix::new("kids").unwrap();
    /// assert_eq!(prefix.as_str(), "KIDS");
    ///
    /// assert!(ValidPrefix::new("abc").is_err());
    /// assert!(ValidPrefix::new("ab!d").is_err());
    /// ```
    pub fn new(raw: &str) -> Result<Self> {
        let len = raw.chars().count();
        if len != PREFIX_LEN {
            return Err(IdentityError::InvalidPrefix {
                reason: format!("expected exactly {} characters, got {}", PREFIX_LEN, len),
            });
        }
        for (i, c) in raw.chars().enumerate() {
            if !c.is_ascii_alphanumeric() {
                return Err(IdentityError::InvalidPrefix {
                    reason: format!("invalid character '{}' at position {}", c, i),
                });
            }
        }
        Ok(Self(raw.to_ascii_uppercase()))
    }

    /// Get the normalized prefix.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Debug for ValidPrefix {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "ValidPrefix(\"{}\")", self.0)
    }
}

impl std::fmt::Display for ValidPrefix {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A validated, normalized 6-character personal identifier.
///
/// Always stored uppercase, so equality and hashing are effectively
/// case-insensitive against any user input that went through `new`.
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PersonalId(String);

impl PersonalId {
    /// Validate and normalize a raw identifier.
    ///
    /// # Errors
    ///
    /// Returns `IdentityError::MalformedIdentifier` unless the input is
    /// exactly 6 ASCII alphanumeric characters.
    pub fn new(raw: &str) -> Result<Self> {
        let len = raw.chars().count();
        if len != ID_LEN {
            return Err(IdentityError::MalformedIdentifier {
                reason: format!("expected exactly {} characters, got {}", ID_LEN, len),
            });
        }
        for (i, c) in raw.chars().enumerate() {
            if !c.is_ascii_alphanumeric() {
                return Err(IdentityError::MalformedIdentifier {
                    reason: format!("invalid character '{}' at position {}", c, i),
                });
            }
        }
        Ok(Self(raw.to_ascii_uppercase()))
    }

    /// Build an identifier from a validated prefix and a suffix drawn
    /// from [`SUFFIX_ALPHABET`].
    pub(crate) fn from_parts(prefix: &ValidPrefix, suffix: &str) -> Self {
        debug_assert_eq!(suffix.len(), SUFFIX_LEN);
        Self(format!("{}{}", prefix.as_str(), suffix))
    }

    /// Get the normalized identifier.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The 4-character prefix portion.
    pub fn prefix(&self) -> &str {
        &self.0[..PREFIX_LEN]
    }

    /// The 2-character suffix portion.
    pub fn suffix(&self) -> &str {
        &self.0[PREFIX_LEN..]
    }

    /// Whether this identifier is in the reserved set.
    pub fn is_reserved(&self) -> bool {
        RESERVED_IDENTIFIERS.contains(&self.0.as_str())
    }
}

impl std::fmt::Debug for PersonalId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "PersonalId(\"{}\")", self.0)
    }
}

impl std::fmt::Display for PersonalId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl AsRef<str> for PersonalId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_prefixes() {
        assert!(ValidPrefix::new("KIDS").is_ok());
        assert!(ValidPrefix::new("kids").is_ok());
        assert!(ValidPrefix::new("a1B2").is_ok());
        assert!(ValidPrefix::new("0000").is_ok());
    }

    #[test]
    fn test_prefix_normalized_uppercase() {
        let prefix = ValidPrefix::new("taLe").unwrap();
        assert_eq!(prefix.as_str(), "TALE");
    }

    #[test]
    fn test_prefix_wrong_length() {
        assert!(ValidPrefix::new("").is_err());
        assert!(ValidPrefix::new("abc").is_err());
        assert!(ValidPrefix::new("abcde").is_err());

        let err = ValidPrefix::new("abc").unwrap_err();
        match err {
            IdentityError::InvalidPrefix { reason } => {
                assert!(reason.contains("exactly 4"));
            }
            _ => panic!("expected InvalidPrefix"),
        }
    }

    #[test]
    fn test_prefix_invalid_characters() {
        assert!(ValidPrefix::new("ab d").is_err());
        assert!(ValidPrefix::new("ab-d").is_err());
        assert!(ValidPrefix::new("ab\u{00e9}d").is_err());
    }

    #[test]
    fn test_personal_id_shape() {
        let id = PersonalId::new("kidsx7").unwrap();
        assert_eq!(id.as_str(), "KIDSX7");
        assert_eq!(id.prefix(), "KIDS");
        assert_eq!(id.suffix(), "X7");
    }

    #[test]
    fn test_personal_id_wrong_length() {
        assert!(PersonalId::new("KIDS").is_err());
        assert!(PersonalId::new("KIDSX77").is_err());
    }

    #[test]
    fn test_personal_id_invalid_characters() {
        assert!(PersonalId::new("KIDS-7").is_err());
        assert!(PersonalId::new("KIDS 7").is_err());
    }

    #[test]
    fn test_case_insensitive_equality() {
        let a = PersonalId::new("kidsx7").unwrap();
        let b = PersonalId::new("KIDSX7").unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_reserved_identifiers() {
        assert!(PersonalId::new("000000").unwrap().is_reserved());
        assert!(PersonalId::new("0000FF").unwrap().is_reserved());
        assert!(PersonalId::new("0000ff").unwrap().is_reserved());
        assert!(!PersonalId::new("KIDSX7").unwrap().is_reserved());
    }

    #[test]
    fn test_from_parts() {
        let prefix = ValidPrefix::new("KIDS").unwrap();
        let id = PersonalId::from_parts(&prefix, "A9");
        assert_eq!(id.as_str(), "KIDSA9");
    }

    mod properties {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn prop_valid_prefixes_accepted(s in "[a-zA-Z0-9]{4}") {
                let prefix = ValidPrefix::new(&s).unwrap();
                prop_assert_eq!(prefix.as_str(), s.to_ascii_uppercase());
            }

            #[test]
            fn prop_valid_ids_accepted(s in "[a-zA-Z0-9]{6}") {
                let id = PersonalId::new(&s).unwrap();
                prop_assert_eq!(id.as_str(), s.to_ascii_uppercase());
                prop_assert_eq!(id.prefix().len(), PREFIX_LEN);
                prop_assert_eq!(id.suffix().len(), SUFFIX_LEN);
            }

            #[test]
            fn prop_prefix_validation_never_panics(s in "\\PC{0,16}") {
                let _ = ValidPrefix::new(&s);
            }

            #[test]
            fn prop_id_validation_never_panics(s in "\\PC{0,16}") {
                let _ = PersonalId::new(&s);
            }
        }
    }
}
