use std::{cmp::Ordering, fmt, ops::Deref, str::FromStr};

use non_empty_string::NonEmptyString;
use serde::{Deserialize, Serialize};

/// The prefix shared by every item of a document (e.g. `SYS` or `L1-SRD`).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Prefix(NonEmptyString);

impl Prefix {
    /// Creates a new `Prefix`.
    ///
    /// # Errors
    ///
    /// Returns [`InvalidIdError`] if the string is empty or contains
    /// whitespace.
    pub fn new(s: String) -> Result<Self, InvalidIdError> {
        validate(s).map(Self)
    }

    /// Returns the string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

/// A unique item identifier, such as `REQ001` or `L1-SYS-UI-004`.
///
/// The identifier is the document prefix, an optional separator and a
/// number. Identifiers compare by prefix first and then numerically, so
/// `REQ2` sorts before `REQ10`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Uid(NonEmptyString);

impl Uid {
    /// Creates a new `Uid`.
    ///
    /// # Errors
    ///
    /// Returns [`InvalidIdError`] if the string is empty or contains
    /// whitespace.
    pub fn new(s: String) -> Result<Self, InvalidIdError> {
        validate(s).map(Self)
    }

    /// Returns the string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }

    /// The identifier without its trailing number and separator.
    #[must_use]
    pub fn prefix(&self) -> &str {
        let s = self.as_str();
        let without_number = s.trim_end_matches(|c: char| c.is_ascii_digit());
        let prefix = without_number.trim_end_matches(['-', '_', '.']);
        if prefix.is_empty() { s } else { prefix }
    }

    /// The trailing number, if there is one.
    #[must_use]
    pub fn number(&self) -> Option<usize> {
        let s = self.as_str();
        let digits = s.len() - s.trim_end_matches(|c: char| c.is_ascii_digit()).len();
        s[s.len() - digits..].parse().ok()
    }

    /// The `-` separated parts of the identifier.
    pub fn segments(&self) -> impl Iterator<Item = &str> {
        self.as_str().split('-')
    }
}

impl Ord for Uid {
    fn cmp(&self, other: &Self) -> Ordering {
        self.prefix()
            .cmp(other.prefix())
            .then_with(|| self.number().cmp(&other.number()))
            .then_with(|| self.as_str().cmp(other.as_str()))
    }
}

impl PartialOrd for Uid {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

fn validate(s: String) -> Result<NonEmptyString, InvalidIdError> {
    if s.chars().any(char::is_whitespace) {
        return Err(InvalidIdError(s));
    }
    NonEmptyString::new(s).map_err(InvalidIdError)
}

/// Error returned when a string is not a valid prefix or identifier.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
#[error("invalid identifier '{0}': must be non-empty and contain no whitespace")]
pub struct InvalidIdError(String);

macro_rules! string_newtype {
    ($name:ident) => {
        impl TryFrom<String> for $name {
            type Error = InvalidIdError;

            fn try_from(value: String) -> Result<Self, Self::Error> {
                Self::new(value)
            }
        }

        impl TryFrom<&str> for $name {
            type Error = InvalidIdError;

            fn try_from(value: &str) -> Result<Self, Self::Error> {
                Self::new(value.to_string())
            }
        }

        impl FromStr for $name {
            type Err = InvalidIdError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Self::new(s.to_string())
            }
        }

        impl From<$name> for String {
            fn from(value: $name) -> Self {
                value.0.into_inner()
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                self.as_str()
            }
        }

        impl Deref for $name {
            type Target = str;

            fn deref(&self) -> &Self::Target {
                self.as_str()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

string_newtype!(Prefix);
string_newtype!(Uid);

#[cfg(test)]
mod tests {
    use test_case::test_case;

    use super::*;

    #[test_case("REQ001", "REQ", Some(1); "no separator")]
    #[test_case("SYS-042", "SYS", Some(42); "dash separator")]
    #[test_case("L1-SRD-UI-004", "L1-SRD-UI", Some(4); "compound prefix")]
    #[test_case("TUT_7", "TUT", Some(7); "underscore separator")]
    #[test_case("README", "README", None; "no number")]
    #[test_case("123", "123", Some(123); "number only")]
    fn parts(uid: &str, prefix: &str, number: Option<usize>) {
        let uid = Uid::try_from(uid).unwrap();
        assert_eq!(uid.prefix(), prefix);
        assert_eq!(uid.number(), number);
    }

    #[test_case(""; "empty")]
    #[test_case("REQ 001"; "inner whitespace")]
    fn rejects(s: &str) {
        assert!(Uid::try_from(s).is_err());
        assert!(Prefix::try_from(s).is_err());
    }

    #[test]
    fn numbers_sort_numerically() {
        let mut uids: Vec<Uid> = ["REQ10", "REQ2", "ABC9", "REQ1"]
            .into_iter()
            .map(|s| s.parse().unwrap())
            .collect();
        uids.sort();
        let sorted: Vec<&str> = uids.iter().map(Uid::as_str).collect();
        assert_eq!(sorted, ["ABC9", "REQ1", "REQ2", "REQ10"]);
    }

    #[test]
    fn deserializes_from_yaml_string() {
        let uid: Uid = serde_yaml::from_str("SYS-001").unwrap();
        assert_eq!(uid.as_str(), "SYS-001");
        assert!(serde_yaml::from_str::<Uid>("''").is_err());
    }

    #[test]
    fn segments_split_on_dashes() {
        let uid = Uid::try_from("L1-SRD-UI-004").unwrap();
        assert_eq!(uid.segments().collect::<Vec<_>>(), ["L1", "SRD", "UI", "004"]);
    }
}
