//! Source locations of tokens and entries.

use std::fmt;
use std::sync::Arc;

/// The origin of a token or an entry: the resource it was read from and the line in that resource.
///
/// Locators are used for diagnostics only and never influence execution,
///     except through [LocalLocator](super::Kind::LocalLocator) tokens.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Locator {
    resource: Arc<str>,
    line: u32,
}

impl Locator {
    pub fn new<T: Into<Arc<str>>>(resource: T, line: u32) -> Locator {
        Locator {
            resource: resource.into(),
            line,
        }
    }

    /// Name of the resource, usually a file name.
    pub fn resource(&self) -> &str {
        &self.resource
    }

    /// Line number within the resource, starting at 1.
    pub fn line(&self) -> u32 {
        self.line
    }
}

impl fmt::Display for Locator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.resource, self.line)
    }
}

/// The piece of an entry's locator read by a [LocalLocator](super::Kind::LocalLocator) token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum LocatorField {
    Resource,
    Line,
}

impl LocatorField {
    /// Reads the field from a locator.
    ///
    /// An absent locator reads as the empty string.
    pub fn read(&self, locator: Option<&Locator>) -> String {
        match (self, locator) {
            (_, None) => String::new(),
            (LocatorField::Resource, Some(locator)) => locator.resource().to_string(),
            (LocatorField::Line, Some(locator)) => locator.line().to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display() {
        assert_eq!(Locator::new("plain.bst", 12).to_string(), "plain.bst:12");
    }

    #[test]
    fn read_fields() {
        let locator = Locator::new("refs.bib", 7);
        assert_eq!(LocatorField::Resource.read(Some(&locator)), "refs.bib");
        assert_eq!(LocatorField::Line.read(Some(&locator)), "7");
        assert_eq!(LocatorField::Line.read(None), "");
    }
}
