//! Closed code sets used by vehicle and demand tables.

use crate::FleetError;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Vehicle size class (payload category).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum SizeClass {
    S1,
    S2,
    S3,
    S4,
}

impl SizeClass {
    pub fn all() -> [SizeClass; 4] {
        [SizeClass::S1, SizeClass::S2, SizeClass::S3, SizeClass::S4]
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SizeClass::S1 => "S1",
            SizeClass::S2 => "S2",
            SizeClass::S3 => "S3",
            SizeClass::S4 => "S4",
        }
    }

    /// Nominal gross weight label of the class.
    pub fn label(&self) -> &'static str {
        match self {
            SizeClass::S1 => "17 tons",
            SizeClass::S2 => "44 tons",
            SizeClass::S3 => "50 tons",
            SizeClass::S4 => "64 tons",
        }
    }
}

impl std::fmt::Display for SizeClass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SizeClass {
    type Err = FleetError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "S1" => Ok(SizeClass::S1),
            "S2" => Ok(SizeClass::S2),
            "S3" => Ok(SizeClass::S3),
            "S4" => Ok(SizeClass::S4),
            _ => Err(FleetError::UnknownSizeClass(s.to_string())),
        }
    }
}

/// Trip-distance category.
///
/// A vehicle carries the bucket it is rated for; a demand segment carries the
/// bucket of the trips to be served. Which demand buckets a rated bucket may
/// serve is an explicit table (see `fleet_algo::plan::coverage`), never derived
/// from [`DistanceBucket::max_km`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum DistanceBucket {
    D1,
    D2,
    D3,
    D4,
}

impl DistanceBucket {
    pub fn all() -> [DistanceBucket; 4] {
        [
            DistanceBucket::D1,
            DistanceBucket::D2,
            DistanceBucket::D3,
            DistanceBucket::D4,
        ]
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            DistanceBucket::D1 => "D1",
            DistanceBucket::D2 => "D2",
            DistanceBucket::D3 => "D3",
            DistanceBucket::D4 => "D4",
        }
    }

    /// Nominal trip distance of the bucket in km (informational only).
    pub fn max_km(&self) -> u32 {
        match self {
            DistanceBucket::D1 => 300,
            DistanceBucket::D2 => 400,
            DistanceBucket::D3 => 500,
            DistanceBucket::D4 => 600,
        }
    }
}

impl std::fmt::Display for DistanceBucket {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DistanceBucket {
    type Err = FleetError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "D1" => Ok(DistanceBucket::D1),
            "D2" => Ok(DistanceBucket::D2),
            "D3" => Ok(DistanceBucket::D3),
            "D4" => Ok(DistanceBucket::D4),
            _ => Err(FleetError::UnknownDistanceBucket(s.to_string())),
        }
    }
}
