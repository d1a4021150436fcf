use serde::{Deserialize, Serialize};
use std::fmt;

use crate::CoreError;

/// The three tag vocabularies a catalog defines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TagKind {
    Location,
    PriceBucket,
    Status,
}

impl TagKind {
    pub const ALL: [TagKind; 3] = [Self::Location, Self::PriceBucket, Self::Status];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Location => "location",
            Self::PriceBucket => "price_bucket",
            Self::Status => "status",
        }
    }
}

impl fmt::Display for TagKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Capture attributes that can hold a sticky browse-mode value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LockField {
    Parallel,
    Grade,
    Location,
    PriceBucket,
    Status,
}

impl LockField {
    pub const ALL: [LockField; 5] = [
        Self::Parallel,
        Self::Grade,
        Self::Location,
        Self::PriceBucket,
        Self::Status,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Parallel => "parallel",
            Self::Grade => "grade",
            Self::Location => "location",
            Self::PriceBucket => "price_bucket",
            Self::Status => "status",
        }
    }

    pub fn parse(s: &str) -> Result<Self, CoreError> {
        match s {
            "parallel" => Ok(Self::Parallel),
            "grade" => Ok(Self::Grade),
            "location" => Ok(Self::Location),
            "price_bucket" => Ok(Self::PriceBucket),
            "status" => Ok(Self::Status),
            _ => Err(CoreError::Serialization(format!("unknown lock field: {s}"))),
        }
    }

    /// The tag vocabulary backing this field, if it is a tag field.
    pub fn tag_kind(&self) -> Option<TagKind> {
        match self {
            Self::Location => Some(TagKind::Location),
            Self::PriceBucket => Some(TagKind::PriceBucket),
            Self::Status => Some(TagKind::Status),
            Self::Parallel | Self::Grade => None,
        }
    }
}

impl fmt::Display for LockField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
