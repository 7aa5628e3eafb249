//! Planning horizon: a contiguous, ordered range of years.

use crate::{FleetError, FleetResult, Year};
use serde::{Deserialize, Serialize};

/// Default first planning year.
pub const DEFAULT_START_YEAR: Year = 2023;
/// Default last planning year (inclusive).
pub const DEFAULT_END_YEAR: Year = 2038;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "HorizonBounds")]
pub struct PlanningHorizon {
    start: Year,
    end: Year,
}

/// Unchecked bounds; deserialization goes through [`PlanningHorizon::new`].
#[derive(Deserialize)]
struct HorizonBounds {
    start: Year,
    end: Year,
}

impl TryFrom<HorizonBounds> for PlanningHorizon {
    type Error = FleetError;

    fn try_from(bounds: HorizonBounds) -> FleetResult<Self> {
        Self::new(bounds.start, bounds.end)
    }
}

impl PlanningHorizon {
    /// Create a horizon covering `start..=end`.
    pub fn new(start: Year, end: Year) -> FleetResult<Self> {
        if end < start {
            return Err(FleetError::InvalidHorizon(format!(
                "end year {} precedes start year {}",
                end, start
            )));
        }
        Ok(Self { start, end })
    }

    /// Single-year horizon.
    pub fn single(year: Year) -> Self {
        Self {
            start: year,
            end: year,
        }
    }

    pub fn start(&self) -> Year {
        self.start
    }

    pub fn end(&self) -> Year {
        self.end
    }

    pub fn len(&self) -> usize {
        usize::from(self.end - self.start) + 1
    }

    pub fn is_empty(&self) -> bool {
        false
    }

    pub fn contains(&self, year: Year) -> bool {
        (self.start..=self.end).contains(&year)
    }

    pub fn years(&self) -> impl Iterator<Item = Year> + Clone {
        self.start..=self.end
    }

    /// Years from `from` (clamped to the horizon) through the horizon end.
    pub fn years_from(&self, from: Year) -> impl Iterator<Item = Year> {
        from.max(self.start)..=self.end
    }

    pub fn is_last(&self, year: Year) -> bool {
        year == self.end
    }

    /// Build an [`FleetError::OutsideHorizon`] for `entity` at `year`.
    pub fn outside(&self, entity: &str, year: Year) -> FleetError {
        FleetError::OutsideHorizon {
            entity: entity.to_string(),
            year,
            start: self.start,
            end: self.end,
        }
    }
}

impl Default for PlanningHorizon {
    fn default() -> Self {
        Self {
            start: DEFAULT_START_YEAR,
            end: DEFAULT_END_YEAR,
        }
    }
}
