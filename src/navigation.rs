//! Ahead/behind partitioning of POI groups relative to a moving observer.
//!
//! Direction semantics (easy to invert by accident):
//!
//! | Direction  | "ahead" when              | "behind" when             |
//! |------------|---------------------------|---------------------------|
//! | `Forward`  | group distance > reference | group distance < reference |
//! | `Backward` | group distance < reference | group distance > reference |
//!
//! A group sitting exactly at the reference distance is in neither list, which keeps
//! `forward.ahead == backward.behind` exact.

use std::cmp::Ordering;

use log::debug;
#[cfg(feature = "parallel")]
use rayon::prelude::*;

use crate::grouping::{closest_member_to, PoiGroup};
use crate::projection::{project, ProjectionMode};
use crate::{GpsPoint, LocomotionMode, Poi, TrailPoint, TravelDirection};

/// Configuration for partitioning.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct NavConfig {
    /// Travel mode used for ETAs.
    /// Default: walking (1.4 m/s)
    pub mode: LocomotionMode,

    /// How positions are projected onto the trail.
    /// Default: nearest vertex
    pub projection: ProjectionMode,
}

/// A POI group placed relative to the reference position.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct NavGroup {
    pub name: String,
    pub members: Vec<Poi>,
    /// Index of the member closest to the reference along the trail
    pub closest_member: usize,
    /// Along-trail distance of the closest member
    pub distance_along_trail: f64,
    /// Along-trail meters between the reference and the closest member
    pub distance_meters: f64,
    /// `distance_meters / mode.base_speed()`
    pub eta_seconds: f64,
}

impl NavGroup {
    pub fn closest_poi(&self) -> Option<&Poi> {
        self.members.get(self.closest_member)
    }
}

/// Groups split by travel direction.
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Partition {
    /// Furthest first, counting down towards the reference
    pub ahead: Vec<NavGroup>,
    /// Nearest first
    pub behind: Vec<NavGroup>,
}

impl Partition {
    pub fn is_empty(&self) -> bool {
        self.ahead.is_empty() && self.behind.is_empty()
    }

    /// The nearest group ahead, i.e. what the user is heading towards.
    pub fn next_destination(&self) -> Option<&NavGroup> {
        self.ahead.last()
    }
}

/// Seconds to cover `distance_meters` at the mode's base speed.
///
/// # Example
/// ```
/// use trail_nav::{eta_seconds, LocomotionMode};
///
/// assert_eq!(eta_seconds(350.0, LocomotionMode::Walking), 250.0);
/// assert!(eta_seconds(100.0, LocomotionMode::Biking) < eta_seconds(100.0, LocomotionMode::Walking));
/// ```
#[inline]
pub fn eta_seconds(distance_meters: f64, mode: LocomotionMode) -> f64 {
    distance_meters / mode.base_speed()
}

/// Split groups into ahead/behind lists relative to `reference`.
///
/// Each group is represented by its member closest to the reference along the trail.
/// Returns an empty partition when the trail is empty.
pub fn partition(
    groups: &[PoiGroup],
    trail_points: &[TrailPoint],
    reference: GpsPoint,
    direction: TravelDirection,
    config: &NavConfig,
) -> Partition {
    let Some(reference_distance) = project_reference(trail_points, reference, config.projection) else {
        return Partition::default();
    };

    let measured: Vec<NavGroup> = groups
        .iter()
        .filter_map(|g| measure_group(g, trail_points, reference_distance, config))
        .collect();

    classify(measured, reference_distance, direction)
}

/// Parallel version of [`partition`]; output is identical.
#[cfg(feature = "parallel")]
pub fn partition_parallel(
    groups: &[PoiGroup],
    trail_points: &[TrailPoint],
    reference: GpsPoint,
    direction: TravelDirection,
    config: &NavConfig,
) -> Partition {
    let Some(reference_distance) = project_reference(trail_points, reference, config.projection) else {
        return Partition::default();
    };

    let measured: Vec<NavGroup> = groups
        .par_iter()
        .filter_map(|g| measure_group(g, trail_points, reference_distance, config))
        .collect();

    classify(measured, reference_distance, direction)
}

fn project_reference(trail_points: &[TrailPoint], reference: GpsPoint, mode: ProjectionMode) -> Option<f64> {
    let projection = project(reference, trail_points, mode);
    if projection.is_none() {
        debug!("[Navigation] No trail points, nothing to partition");
    }
    projection.map(|p| p.distance_along_trail())
}

fn measure_group(
    group: &PoiGroup,
    trail_points: &[TrailPoint],
    reference_distance: f64,
    config: &NavConfig,
) -> Option<NavGroup> {
    let closest = closest_member_to(group, trail_points, reference_distance, config.projection)?;

    Some(NavGroup {
        name: group.name.clone(),
        members: group.members.clone(),
        closest_member: closest.member_index,
        distance_along_trail: closest.distance_along_trail,
        distance_meters: closest.distance_meters,
        eta_seconds: eta_seconds(closest.distance_meters, config.mode),
    })
}

fn classify(measured: Vec<NavGroup>, reference_distance: f64, direction: TravelDirection) -> Partition {
    let mut result = Partition::default();

    for group in measured {
        let d = group.distance_along_trail;
        let (is_ahead, is_behind) = match direction {
            TravelDirection::Forward => (d > reference_distance, d < reference_distance),
            TravelDirection::Backward => (d < reference_distance, d > reference_distance),
        };

        if is_ahead {
            result.ahead.push(group);
        } else if is_behind {
            result.behind.push(group);
        }
    }

    result.ahead.sort_by(|a, b| by_distance(b, a).then_with(|| a.name.cmp(&b.name)));
    result.behind.sort_by(|a, b| by_distance(a, b).then_with(|| a.name.cmp(&b.name)));

    debug!(
        "[Navigation] {} ahead, {} behind of {:.0}m ({:?})",
        result.ahead.len(),
        result.behind.len(),
        reference_distance,
        direction
    );

    result
}

#[inline]
fn by_distance(a: &NavGroup, b: &NavGroup) -> Ordering {
    a.distance_meters.total_cmp(&b.distance_meters)
}

// ============================================================================
// Tests
// ============================================================================
