use std::{fmt, num::ParseIntError, str::FromStr};

/// The position of an item in a document's outline, such as `1.2.3`.
///
/// A trailing `.0` marks a heading: `1.2.0` is the heading of section `1.2`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Level {
    parts: Vec<u32>,
    heading: bool,
}

impl Level {
    /// Creates a level from its parts.
    ///
    /// Trailing zeros are folded into the heading flag, so `[1, 2, 0]` is the
    /// same level as `[1, 2]` with `heading` set.
    #[must_use]
    pub fn new(mut parts: Vec<u32>, mut heading: bool) -> Self {
        while parts.len() > 1 && parts.last() == Some(&0) {
            parts.pop();
            heading = true;
        }
        if parts.is_empty() {
            parts.push(1);
        }
        Self { parts, heading }
    }

    /// The outline depth (`1.2.3` and `1.2.3.0` both have depth 3).
    #[must_use]
    pub fn depth(&self) -> usize {
        self.parts.len()
    }

    /// Whether this level marks a heading.
    #[must_use]
    pub const fn is_heading(&self) -> bool {
        self.heading
    }

    /// The numeric parts, without the heading marker.
    #[must_use]
    pub fn parts(&self) -> &[u32] {
        &self.parts
    }

    /// Formats the level for publishing.
    ///
    /// The heading marker is kept only for top-level headings, so `1.0` stays
    /// as it is while `1.2.0` is published as `1.2`.
    #[must_use]
    pub fn format(&self) -> String {
        if self.heading && self.parts.len() > 1 {
            join(&self.parts)
        } else {
            self.to_string()
        }
    }
}

impl Default for Level {
    fn default() -> Self {
        Self::new(vec![1], false)
    }
}

fn join(parts: &[u32]) -> String {
    parts
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(".")
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&join(&self.parts))?;
        if self.heading {
            f.write_str(".0")?;
        }
        Ok(())
    }
}

impl FromStr for Level {
    type Err = InvalidLevelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts = s
            .trim()
            .trim_end_matches('.')
            .split('.')
            .map(str::parse)
            .collect::<Result<Vec<u32>, ParseIntError>>()
            .map_err(|source| InvalidLevelError {
                level: s.to_string(),
                source,
            })?;
        Ok(Self::new(parts, false))
    }
}

/// Error returned when a level is not a dotted list of numbers.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
#[error("invalid level '{level}'")]
pub struct InvalidLevelError {
    level: String,
    source: ParseIntError,
}
