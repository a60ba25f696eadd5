//! Asset schema versions
//!
//! Totally ordered `major.minor.patch[.revision]` versions. The authoring
//! tool stamps four-part versions (`2.1.0.1`); a missing revision reads as 0.

use std::fmt::{self, Display, Formatter};
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::VersionError;

/// Schema version
///
/// Field order drives the derived ordering: major, minor, patch, revision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Version {
    major: u32,
    minor: u32,
    patch: u32,
    revision: u32,
}

impl Version {
    /// Three-part version with revision 0
    #[inline]
    #[must_use]
    pub const fn new(major: u32, minor: u32, patch: u32) -> Self {
        Self::with_revision(major, minor, patch, 0)
    }

    /// Four-part version
    #[inline]
    #[must_use]
    pub const fn with_revision(major: u32, minor: u32, patch: u32, revision: u32) -> Self {
        Self {
            major,
            minor,
            patch,
            revision,
        }
    }

    #[inline]
    #[must_use]
    pub const fn major(&self) -> u32 {
        self.major
    }

    #[inline]
    #[must_use]
    pub const fn minor(&self) -> u32 {
        self.minor
    }

    #[inline]
    #[must_use]
    pub const fn patch(&self) -> u32 {
        self.patch
    }

    #[inline]
    #[must_use]
    pub const fn revision(&self) -> u32 {
        self.revision
    }

    /// Strictly-less comparison usable in const contexts
    #[must_use]
    pub const fn precedes(&self, other: &Self) -> bool {
        let a = [self.major, self.minor, self.patch, self.revision];
        let b = [other.major, other.minor, other.patch, other.revision];
        let mut i = 0;
        while i < a.len() {
            if a[i] != b[i] {
                return a[i] < b[i];
            }
            i += 1;
        }
        false
    }
}

impl Display for Version {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)?;
        if self.revision != 0 {
            write!(f, ".{}", self.revision)?;
        }
        Ok(())
    }
}

impl FromStr for Version {
    type Err = VersionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || VersionError::Invalid(s.to_string());

        let parts = s
            .trim()
            .split('.')
            .map(|part| part.parse::<u32>().map_err(|_| invalid()))
            .collect::<Result<Vec<_>, _>>()?;

        match parts.as_slice() {
            [major, minor] => Ok(Self::new(*major, *minor, 0)),
            [major, minor, patch] => Ok(Self::new(*major, *minor, *patch)),
            [major, minor, patch, revision] => {
                Ok(Self::with_revision(*major, *minor, *patch, *revision))
            }
            _ => Err(invalid()),
        }
    }
}

impl Serialize for Version {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Version {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        text.parse().map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_three_and_four_parts() {
        assert_eq!("3.1.0".parse::<Version>().unwrap(), Version::new(3, 1, 0));
        assert_eq!(
            "2.1.0.1".parse::<Version>().unwrap(),
            Version::with_revision(2, 1, 0, 1)
        );
        assert_eq!("1.10".parse::<Version>().unwrap(), Version::new(1, 10, 0));
    }

    #[test]
    fn parse_rejects_garbage() {
        assert!("".parse::<Version>().is_err());
        assert!("3".parse::<Version>().is_err());
        assert!("1.2.3.4.5".parse::<Version>().is_err());
        assert!("1.2.x".parse::<Version>().is_err());
        assert!("1.10.0-beta01".parse::<Version>().is_err());
    }

    #[test]
    fn display_omits_zero_revision() {
        assert_eq!(Version::new(3, 0, 0).to_string(), "3.0.0");
        assert_eq!(Version::with_revision(2, 1, 0, 1).to_string(), "2.1.0.1");
    }

    #[test]
    fn ordering_is_numeric_not_lexical() {
        assert!(Version::new(1, 9, 0) < Version::new(1, 10, 0));
        assert!(Version::new(2, 1, 0) < Version::with_revision(2, 1, 0, 1));
    }

    #[test]
    fn precedes_matches_ord() {
        let a = Version::with_revision(2, 1, 0, 1);
        let b = Version::new(3, 0, 0);
        assert!(a.precedes(&b));
        assert!(!b.precedes(&a));
        assert!(!a.precedes(&a));
    }
}
