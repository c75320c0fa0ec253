use std::fmt::{self, Formatter};

use serde::{Deserialize, Serialize};

/// Prefix of every material property that is derived from a node label.
pub const PROPERTY_PREFIX: char = '_';

/// Name of a material property, e.g. `_baseColor`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PropertyName(String);

impl PropertyName {
    /// Derives the property name from the label that the user gave a node. The first character is
    /// lower-cased, all spaces are removed and the [`PROPERTY_PREFIX`] is prepended. Returns `None`
    /// for an empty label.
    ///
    /// # Example
    ///
    /// ```rust
    /// use shade_content::PropertyName;
    /// assert_eq!(PropertyName::from_label("Base Color").unwrap().as_str(), "_baseColor");
    /// assert_eq!(PropertyName::from_label(""), None);
    /// ```
    pub fn from_label(label: &str) -> Option<Self> {
        let mut chars = label.chars();
        let first = chars.next()?;
        let name = std::iter::once(PROPERTY_PREFIX)
            .chain(first.to_lowercase())
            .chain(chars)
            .filter(|c| *c != ' ')
            .collect();
        Some(Self(name))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PropertyName {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
