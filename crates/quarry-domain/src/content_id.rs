//! Content identifiers and composite-file identifier derivation

use std::fmt;

/// Separator placed between a base content id and a sub-resource suffix
pub const SUFFIX_SEPARATOR: char = '/';

/// Stable identifier for a file's content
///
/// The base id names the *physical* file. Logical sub-resources inside a
/// composite file (emails in an mbox, tracks on a disc image) are named by
/// [`ContentId::derive`], which appends a caller-chosen suffix.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ContentId(String);

impl ContentId {
    /// Create a content id
    ///
    /// # Errors
    /// Returns error if the value is empty
    ///
    /// # Examples
    ///
    /// ```
    /// use quarry_domain::ContentId;
    ///
    /// let id = ContentId::new("h:deadbeef").unwrap();
    /// assert_eq!(id.as_str(), "h:deadbeef");
    /// assert!(ContentId::new("").is_err());
    /// ```
    pub fn new(value: impl Into<String>) -> Result<Self, String> {
        let value = value.into();
        if value.is_empty() {
            return Err("content id cannot be empty".to_string());
        }
        Ok(Self(value))
    }

    /// Get the id as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Derive the identifier of a sub-resource
    ///
    /// `None` yields a copy of the base id. `Some(suffix)` yields
    /// `base + "/" + suffix`. The suffix is used verbatim: callers pick
    /// suffixes that are unique and stable within the file (an email index,
    /// a track number).
    ///
    /// # Examples
    ///
    /// ```
    /// use quarry_domain::ContentId;
    ///
    /// let id = ContentId::new("abc123").unwrap();
    /// assert_eq!(id.derive(None), "abc123");
    /// assert_eq!(id.derive(Some("3")), "abc123/3");
    /// ```
    pub fn derive(&self, suffix: Option<&str>) -> String {
        match suffix {
            Some(suffix) => {
                let mut derived = String::with_capacity(self.0.len() + 1 + suffix.len());
                derived.push_str(&self.0);
                derived.push(SUFFIX_SEPARATOR);
                derived.push_str(suffix);
                derived
            }
            None => self.0.clone(),
        }
    }

    /// Common prefix of every id derived from this one (`base + "/"`)
    pub fn derived_prefix(&self) -> String {
        let mut prefix = String::with_capacity(self.0.len() + 1);
        prefix.push_str(&self.0);
        prefix.push(SUFFIX_SEPARATOR);
        prefix
    }

    /// Check whether `candidate` was derived from this id with some suffix
    pub fn is_derived_from(&self, candidate: &str) -> bool {
        candidate
            .strip_prefix(self.0.as_str())
            .is_some_and(|rest| rest.starts_with(SUFFIX_SEPARATOR))
    }
}

impl fmt::Display for ContentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for ContentId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        /// Property: derivation is deterministic
        #[test]
        fn test_derive_deterministic(base in ".{1,32}", suffix in ".{0,16}") {
            let id = ContentId::new(base).unwrap();
            prop_assert_eq!(id.derive(Some(&suffix)), id.derive(Some(&suffix)));
        }

        /// Property: different suffixes never collide for the same base
        #[test]
        fn test_derive_disjoint(base in ".{1,32}", a in ".{0,16}", b in ".{0,16}") {
            prop_assume!(a != b);
            let id = ContentId::new(base).unwrap();
            prop_assert_ne!(id.derive(Some(&a)), id.derive(Some(&b)));
        }

        /// Property: every derived id is recognised as derived from its base
        #[test]
        fn test_derived_ids_recognised(base in ".{1,32}", suffix in ".{0,16}") {
            let id = ContentId::new(base).unwrap();
            let derived = id.derive(Some(&suffix));
            prop_assert!(id.is_derived_from(&derived));
            prop_assert!(derived.starts_with(&id.derived_prefix()));
            prop_assert!(!id.is_derived_from(id.as_str()));
        }
    }
}
