//! Demand coverage eligibility
//!
//! Which demand segments a vehicle model may serve. The distance relation is an
//! explicit, asymmetric table and is never inferred from bucket distances.

use super::schedule::ScheduleTable;
use fleet_core::{DemandSegment, DistanceBucket, PlanningHorizon, SizeClass, VehicleModel};

use DistanceBucket::{D1, D2, D3, D4};

/// Demand buckets served by vehicles rated for `rated`.
pub fn served_buckets(rated: DistanceBucket) -> &'static [DistanceBucket] {
    match rated {
        D1 => &[D1, D2, D3, D4],
        D2 => &[D2, D3, D4],
        D3 => &[D3, D4],
        D4 => &[D4],
    }
}

/// Eligibility of a (size, rated bucket) vehicle for a (size, demand bucket) segment.
pub fn is_eligible(
    vehicle_size: SizeClass,
    rated: DistanceBucket,
    segment_size: SizeClass,
    demand: DistanceBucket,
) -> bool {
    vehicle_size == segment_size && served_buckets(rated).contains(&demand)
}

pub fn vehicle_serves(vehicle: &VehicleModel, segment: &DemandSegment) -> bool {
    is_eligible(
        vehicle.size,
        vehicle.distance_bucket,
        segment.size,
        segment.distance,
    )
}

/// Demand segments with positive volume that no eligible vehicle can be active in.
///
/// A vehicle can be active in year `y` when some purchase vintage of it has
/// `y` in its active window. Segments returned here make the MILP infeasible.
/// Zero-volume segments are always satisfied and never reported.
pub fn uncovered_segments<'a>(
    vehicles: &[VehicleModel],
    demand: &'a [DemandSegment],
    schedules: &ScheduleTable,
    horizon: &PlanningHorizon,
) -> Vec<&'a DemandSegment> {
    demand
        .iter()
        .filter(|segment| horizon.contains(segment.year))
        .filter(|segment| segment.volume.value() > 0.0)
        .filter(|segment| {
            !vehicles.iter().any(|vehicle| {
                vehicle_serves(vehicle, segment)
                    && schedules.get(&vehicle.id).is_some_and(|schedule| {
                        schedule
                            .purchase_years(horizon)
                            .into_iter()
                            .filter(|vintage| *vintage <= segment.year)
                            .any(|vintage| {
                                schedule
                                    .active_years(vintage, horizon)
                                    .contains(&segment.year)
                            })
                    })
            })
        })
        .collect()
}
