//! # Trail Junctions
//!
//! Finds where trails meet, either because their polylines pass within a few meters
//! of each other or because a spur trail declares its attachment point.
//!
//! Candidate point pairs come from an R-tree over the second trail of each pair,
//! then Haversine confirms the distance.

use log::{debug, info};
use rstar::{PointDistance, RTree, RTreeObject, AABB};

use crate::geo_utils::{bounds_overlap, haversine_distance, meters_to_degrees};
use crate::{Bounds, GpsPoint, Trail, TrailKind};

/// A point where two or more trails meet.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Junction {
    pub location: GpsPoint,
    /// Ids of the trails meeting here, in discovery order
    pub trail_ids: Vec<String>,
}

impl Junction {
    fn add_trail(&mut self, id: &str) {
        if !self.trail_ids.iter().any(|t| t == id) {
            self.trail_ids.push(id.to_string());
        }
    }
}

/// Configuration for junction detection.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct JunctionConfig {
    /// Points of two trails closer than this form a junction (meters)
    pub threshold_meters: f64,
    /// Search radius for [`find_nearest_junction`] (meters)
    pub nearest_max_distance_meters: f64,
}

impl Default for JunctionConfig {
    fn default() -> Self {
        Self {
            threshold_meters: 10.0,
            nearest_max_distance_meters: 100.0,
        }
    }
}

// =============================================================================
// Spatial Index
// =============================================================================

#[derive(Debug, Clone, Copy)]
struct IndexedPoint {
    lat: f64,
    lng: f64,
}

impl RTreeObject for IndexedPoint {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        AABB::from_point([self.lat, self.lng])
    }
}

impl PointDistance for IndexedPoint {
    fn distance_2(&self, point: &[f64; 2]) -> f64 {
        let dlat = self.lat - point[0];
        let dlng = self.lng - point[1];
        dlat * dlat + dlng * dlng
    }
}

fn build_rtree(trail: &Trail) -> RTree<IndexedPoint> {
    let indexed: Vec<IndexedPoint> = trail
        .points
        .iter()
        .map(|p| IndexedPoint { lat: p.latitude, lng: p.longitude })
        .collect();
    RTree::bulk_load(indexed)
}

// =============================================================================
// Detection
// =============================================================================

/// Find points where pairs of trails pass within `threshold_meters` of each other.
///
/// A match within `threshold_meters` of an existing junction joins it instead of
/// creating a new one.
pub fn find_junctions(trails: &[Trail], threshold_meters: f64) -> Vec<Junction> {
    let mut junctions: Vec<Junction> = Vec::new();

    for (i, first) in trails.iter().enumerate() {
        for second in &trails[i + 1..] {
            let (Some(first_bounds), Some(second_bounds)) =
                (Bounds::from_points(&first.positions()), Bounds::from_points(&second.positions()))
            else {
                continue;
            };
            if !bounds_overlap(&first_bounds, &second_bounds, threshold_meters, first_bounds.min_lat) {
                continue;
            }

            let tree = build_rtree(second);

            for point in &first.points {
                let location = point.position();
                let threshold_deg = meters_to_degrees(threshold_meters, point.latitude);
                let touches = tree
                    .locate_within_distance([point.latitude, point.longitude], threshold_deg * threshold_deg)
                    .any(|c| haversine_distance(&location, &GpsPoint::new(c.lat, c.lng)) <= threshold_meters);

                if !touches {
                    continue;
                }

                match junctions
                    .iter()
                    .position(|j| haversine_distance(&j.location, &location) <= threshold_meters)
                {
                    Some(idx) => {
                        junctions[idx].add_trail(&first.id);
                        junctions[idx].add_trail(&second.id);
                    }
                    None => junctions.push(Junction {
                        location,
                        trail_ids: vec![first.id.clone(), second.id.clone()],
                    }),
                }
            }
        }
    }

    debug!("[Junctions] {} overlap junctions across {} trails", junctions.len(), trails.len());
    junctions
}

/// Merge junctions lying within `threshold_meters` of an earlier one.
///
/// A merged junction moves to the first of `endpoints` close to either side, or else
/// to the midpoint of the two locations.
pub fn consolidate_junctions(junctions: Vec<Junction>, threshold_meters: f64, endpoints: &[GpsPoint]) -> Vec<Junction> {
    let mut consolidated: Vec<Junction> = Vec::new();

    for junction in junctions {
        let Some(idx) = consolidated
            .iter()
            .position(|existing| haversine_distance(&existing.location, &junction.location) <= threshold_meters)
        else {
            consolidated.push(junction);
            continue;
        };
        let nearby = &mut consolidated[idx];

        for id in &junction.trail_ids {
            nearby.add_trail(id);
        }

        let close_endpoint = endpoints.iter().find(|e| {
            haversine_distance(e, &junction.location) <= threshold_meters
                || haversine_distance(e, &nearby.location) <= threshold_meters
        });

        nearby.location = match close_endpoint {
            Some(endpoint) => *endpoint,
            None => GpsPoint::new(
                (nearby.location.latitude + junction.location.latitude) / 2.0,
                (nearby.location.longitude + junction.location.longitude) / 2.0,
            ),
        };
    }

    consolidated
}

/// All junctions of a trail network: spur attachment points plus overlaps.
///
/// Spur `endpoint1`s are listed first so consolidation snaps nearby overlaps onto them.
/// Fewer than 2 trails have no junctions.
pub fn trail_junctions(trails: &[Trail], config: &JunctionConfig) -> Vec<Junction> {
    if trails.len() < 2 {
        return Vec::new();
    }

    let spur_junctions: Vec<Junction> = trails
        .iter()
        .filter(|t| t.kind == TrailKind::Spur)
        .filter_map(|t| {
            t.endpoint1.map(|location| Junction { location, trail_ids: vec![t.id.clone()] })
        })
        .collect();
    let endpoints: Vec<GpsPoint> = spur_junctions.iter().map(|j| j.location).collect();

    let mut all = spur_junctions;
    all.extend(find_junctions(trails, config.threshold_meters));

    let junctions = consolidate_junctions(all, config.threshold_meters, &endpoints);
    info!(
        "[Junctions] {} junctions ({} spur endpoints) across {} trails",
        junctions.len(),
        endpoints.len(),
        trails.len()
    );
    junctions
}

/// The junction closest to `point`, if one lies within `max_distance_meters`.
pub fn find_nearest_junction<'a>(
    point: &GpsPoint,
    junctions: &'a [Junction],
    max_distance_meters: f64,
) -> Option<&'a Junction> {
    let mut nearest: Option<(&Junction, f64)> = None;

    for junction in junctions {
        let d = haversine_distance(point, &junction.location);
        if d <= max_distance_meters && nearest.map_or(true, |(_, best)| d < best) {
            nearest = Some((junction, d));
        }
    }

    nearest.map(|(j, _)| j)
}

// =============================================================================
// Tests
// =============================================================================
