//! Build configuration and output platforms.

use std::fmt;
use std::str::FromStr;

use crate::stream::Endian;
use crate::{Error, Result};

/// Leaf threshold used by the shipped tool.
pub const DEFAULT_MAX_LEAF_TRIANGLES: usize = 5;

/// Depth cap used by the shipped tool. Recursion depths run from 0 to `MAX_BSP_DEPTH - 1`.
pub const MAX_BSP_DEPTH: u32 = 32;

/// Stopping thresholds for the partitioner.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BuildConfig {
    /// A side with this many triangles or fewer becomes a leaf run.
    pub max_leaf_triangles: usize,
    /// Absolute depth cap. Both sides of a branch at depth `max_depth - 1` become leaves.
    pub max_depth: u32,
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            max_leaf_triangles: DEFAULT_MAX_LEAF_TRIANGLES,
            max_depth: MAX_BSP_DEPTH,
        }
    }
}

impl BuildConfig {
    /// Rejects thresholds the partitioner or the file format cannot honour.
    pub fn validate(&self) -> Result<()> {
        if self.max_leaf_triangles == 0 {
            return Err(Error::InvalidConfig("max_leaf_triangles must be at least 1"));
        }
        if self.max_depth == 0 || self.max_depth > MAX_BSP_DEPTH {
            return Err(Error::InvalidConfig("max_depth must be within 1..=32"));
        }
        Ok(())
    }
}

/// Target platform of the written file.
///
/// Platforms differ only in stream byte order and in whether the strip
/// vector chunk is emitted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Platform {
    GameCube,
    Ps2,
    Xbox,
}

impl Platform {
    /// Byte order of payload fields on this platform.
    pub fn endian(self) -> Endian {
        match self {
            Platform::GameCube => Endian::Big,
            Platform::Ps2 | Platform::Xbox => Endian::Little,
        }
    }

    /// GameCube loads pre-expanded strip geometry instead of resolving indices at load time.
    pub fn writes_strip_vectors(self) -> bool {
        matches!(self, Platform::GameCube)
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Platform::GameCube => "gc",
            Platform::Ps2 => "ps2",
            Platform::Xbox => "xbox",
        })
    }
}

/// Error returned when parsing an unknown platform name.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown platform {0:?} (expected gc, ps2 or xbox)")]
pub struct UnknownPlatform(pub String);

impl FromStr for Platform {
    type Err = UnknownPlatform;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "gc" => Ok(Platform::GameCube),
            "ps2" => Ok(Platform::Ps2),
            "xbox" => Ok(Platform::Xbox),
            other => Err(UnknownPlatform(other.to_owned())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        let config = BuildConfig::default();
        assert_eq!(config.max_leaf_triangles, 5);
        assert_eq!(config.max_depth, 32);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn rejects_unencodable_thresholds() {
        let zero_leaf = BuildConfig {
            max_leaf_triangles: 0,
            ..BuildConfig::default()
        };
        assert!(matches!(zero_leaf.validate(), Err(Error::InvalidConfig(_))));

        let too_deep = BuildConfig {
            max_depth: 33,
            ..BuildConfig::default()
        };
        assert!(too_deep.validate().is_err());
    }

    #[test]
    fn platform_knobs() {
        assert_eq!(Platform::GameCube.endian(), Endian::Big);
        assert!(Platform::GameCube.writes_strip_vectors());

        for platform in [Platform::Ps2, Platform::Xbox] {
            assert_eq!(platform.endian(), Endian::Little);
            assert!(!platform.writes_strip_vectors());
        }
    }

    #[test]
    fn platform_names_round_trip() {
        for platform in [Platform::GameCube, Platform::Ps2, Platform::Xbox] {
            assert_eq!(platform.to_string().parse::<Platform>(), Ok(platform));
        }
        assert!("dreamcast".parse::<Platform>().is_err());
    }
}
