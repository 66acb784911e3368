//! # Trail Projection
//!
//! Maps an arbitrary GPS position onto a trail, yielding the 1-D along-trail
//! coordinate that every ahead/behind and ETA computation is built on.
//!
//! Two strategies are available:
//!
//! - [`find_nearest_trail_point`]: nearest vertex. O(n), no spatial index. This is the
//!   default; trail point counts are in the low thousands and projections happen once
//!   per location update, not per frame.
//! - [`project_onto_segments`]: nearest point on any segment, with the along-trail
//!   distance interpolated. Better on sparse polylines where vertices are far apart.
//!
//! Both resolve ties to the lowest index, which decides which side of a junction a
//! tie lands on.

use log::debug;
use crate::geo_utils::{haversine_distance, project_onto_segment};
use crate::{GpsPoint, Trail, TrailPoint};

/// Which projection strategy to use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum ProjectionMode {
    /// Closest trail vertex
    #[default]
    NearestVertex,
    /// Closest point on any trail segment
    NearestSegment,
}

/// Result of projecting a location onto a trail.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ProjectionResult {
    /// The trail point (or interpolated point, for segment projection) nearest the location
    pub nearest_point: TrailPoint,
    /// Meters from the location to `nearest_point`
    pub distance_to_trail: f64,
    /// Index of the nearest trail vertex
    pub index_on_trail: usize,
}

impl ProjectionResult {
    /// Along-trail distance of the projected point, in meters.
    #[inline]
    pub fn distance_along_trail(&self) -> f64 {
        self.nearest_point.distance_along_trail
    }
}

/// Which of several trails a location snaps to.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TrailSnap {
    pub trail_id: String,
    pub projection: ProjectionResult,
}

/// Find the trail vertex nearest to `location`.
///
/// Returns `None` for an empty trail. Ties go to the lowest index.
///
/// # Example
/// ```
/// use trail_nav::{find_nearest_trail_point, GpsPoint, TrailPoint};
///
/// let trail = vec![
///     TrailPoint::new(0.0, 0.0, 0.0),
///     TrailPoint::new(0.0, 1.0, 111_195.0),
///     TrailPoint::new(0.0, 2.0, 222_390.0),
/// ];
/// let result = find_nearest_trail_point(GpsPoint::new(0.0, 1.0001), &trail).unwrap();
/// assert_eq!(result.index_on_trail, 1);
/// assert!(result.distance_to_trail < 20.0);
/// ```
pub fn find_nearest_trail_point(location: GpsPoint, trail_points: &[TrailPoint]) -> Option<ProjectionResult> {
    let first = trail_points.first()?;

    let mut nearest_index = 0;
    let mut min_distance = haversine_distance(&location, &first.position());

    for (i, point) in trail_points.iter().enumerate().skip(1) {
        let distance = haversine_distance(&location, &point.position());
        if distance < min_distance {
            min_distance = distance;
            nearest_index = i;
        }
    }

    Some(ProjectionResult {
        nearest_point: trail_points[nearest_index],
        distance_to_trail: min_distance,
        index_on_trail: nearest_index,
    })
}

/// Project `location` onto the nearest trail segment.
///
/// The returned point is interpolated between the segment's endpoints, including its
/// along-trail distance and (when both ends have one) its elevation. `index_on_trail`
/// is whichever segment endpoint is closer to the projected point. Trails with a
/// single point fall back to [`find_nearest_trail_point`].
pub fn project_onto_segments(location: GpsPoint, trail_points: &[TrailPoint]) -> Option<ProjectionResult> {
    if trail_points.len() < 2 {
        return find_nearest_trail_point(location, trail_points);
    }

    let mut best: Option<ProjectionResult> = None;

    for (i, pair) in trail_points.windows(2).enumerate() {
        let (start, end) = (&pair[0], &pair[1]);
        let (projected, t) = project_onto_segment(&location, &start.position(), &end.position());
        let distance = haversine_distance(&location, &projected);

        let improves = best.as_ref().map_or(true, |b| distance < b.distance_to_trail);
        if !improves {
            continue;
        }

        let elevation = match (start.elevation, end.elevation) {
            (Some(a), Some(b)) => Some(a + t * (b - a)),
            _ => None,
        };
        let nearest_point = TrailPoint {
            latitude: projected.latitude,
            longitude: projected.longitude,
            distance_along_trail: start.distance_along_trail
                + t * (end.distance_along_trail - start.distance_along_trail),
            elevation,
        };

        best = Some(ProjectionResult {
            nearest_point,
            distance_to_trail: distance,
            index_on_trail: if t <= 0.5 { i } else { i + 1 },
        });
    }

    best
}

/// Project with the given strategy.
#[inline]
pub fn project(location: GpsPoint, trail_points: &[TrailPoint], mode: ProjectionMode) -> Option<ProjectionResult> {
    match mode {
        ProjectionMode::NearestVertex => find_nearest_trail_point(location, trail_points),
        ProjectionMode::NearestSegment => project_onto_segments(location, trail_points),
    }
}

/// Snap a location to whichever of several trails passes closest to it.
///
/// Empty trails are ignored; returns `None` if no trail has points. Ties go to the
/// earlier trail.
pub fn snap_to_trails(location: GpsPoint, trails: &[Trail], mode: ProjectionMode) -> Option<TrailSnap> {
    let mut best: Option<TrailSnap> = None;

    for trail in trails {
        let Some(projection) = project(location, &trail.points, mode) else {
            continue;
        };
        let closer = best
            .as_ref()
            .map_or(true, |b| projection.distance_to_trail < b.projection.distance_to_trail);
        if closer {
            best = Some(TrailSnap { trail_id: trail.id.clone(), projection });
        }
    }

    if let Some(snap) = &best {
        debug!(
            "[Projector] Snapped to trail {} at index {} ({:.1}m off trail)",
            snap.trail_id, snap.projection.index_on_trail, snap.projection.distance_to_trail
        );
    }

    best
}

/// Along-trail meters between where the user entered the trail and where they are now.
///
/// Returns `None` for an empty trail.
pub fn distance_from_entry(
    entry: GpsPoint,
    current: GpsPoint,
    trail_points: &[TrailPoint],
    mode: ProjectionMode,
) -> Option<f64> {
    let entry_projection = project(entry, trail_points, mode)?;
    let current_projection = project(current, trail_points, mode)?;
    Some((current_projection.distance_along_trail() - entry_projection.distance_along_trail()).abs())
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::build_trail_points;

    fn approx_eq(a: f64, b: f64, epsilon: f64) -> bool {
        (a - b).abs() < epsilon
    }

    fn toy_trail() -> Vec<TrailPoint> {
        build_trail_points(&[
            GpsPoint::new(0.0, 0.0),
            GpsPoint::new(0.0, 1.0),
            GpsPoint::new(0.0, 2.0),
        ])
    }

    fn sparse_trail() -> Vec<TrailPoint> {
        build_trail_points(&[
            GpsPoint::new(34.850, -82.400),
            GpsPoint::new(34.860, -82.400),
        ])
    }

    #[test]
    fn test_empty_trail_has_no_projection() {
        let here = GpsPoint::new(0.0, 0.0);
        assert!(find_nearest_trail_point(here, &[]).is_none());
        assert!(project_onto_segments(here, &[]).is_none());
        assert!(distance_from_entry(here, here, &[], ProjectionMode::NearestVertex).is_none());
    }

    #[test]
    fn test_nearest_vertex_picks_middle_point() {
        let trail = toy_trail();
        let result = find_nearest_trail_point(GpsPoint::new(0.0, 1.0001), &trail).unwrap();
        assert_eq!(result.index_on_trail, 1);
        assert_eq!(result.nearest_point.longitude, 1.0);
        assert!(result.distance_to_trail < 20.0);
    }

    #[test]
    fn test_nearest_vertex_tie_goes_to_lowest_index() {
        let trail = vec![
            TrailPoint::new(0.0, 0.0, 0.0),
            TrailPoint::new(0.0, 2.0, 100.0),
            TrailPoint::new(0.0, 0.0, 200.0), // same place as index 0, e.g. a loop
        ];
        let result = find_nearest_trail_point(GpsPoint::new(0.0, 0.0), &trail).unwrap();
        assert_eq!(result.index_on_trail, 0);
        assert_eq!(result.distance_along_trail(), 0.0);
    }

    #[test]
    fn test_nan_location_propagates() {
        let trail = toy_trail();
        let result = find_nearest_trail_point(GpsPoint::new(f64::NAN, 0.0), &trail).unwrap();
        assert!(result.distance_to_trail.is_nan());
    }

    #[test]
    fn test_segment_projection_interpolates_distance() {
        let trail = sparse_trail();
        let total = trail[1].distance_along_trail;
        let midway = GpsPoint::new(34.855, -82.3995);

        let vertex = find_nearest_trail_point(midway, &trail).unwrap();
        let segment = project_onto_segments(midway, &trail).unwrap();

        assert!(approx_eq(segment.distance_along_trail(), total / 2.0, 1.0));
        assert!(segment.distance_to_trail < vertex.distance_to_trail);
        assert!(approx_eq(segment.nearest_point.latitude, 34.855, 1e-9));
    }

    #[test]
    fn test_segment_projection_interpolates_elevation() {
        let trail = vec![
            TrailPoint::new(34.850, -82.400, 0.0).with_elevation(300.0),
            TrailPoint::new(34.860, -82.400, 1112.0).with_elevation(320.0),
        ];
        let result = project_onto_segments(GpsPoint::new(34.8525, -82.400), &trail).unwrap();
        assert_eq!(result.index_on_trail, 0);
        assert!(approx_eq(result.nearest_point.elevation.unwrap(), 305.0, 1e-6));
    }

    #[test]
    fn test_segment_projection_single_point_falls_back() {
        let trail = vec![TrailPoint::new(34.85, -82.40, 0.0)];
        let result = project_onto_segments(GpsPoint::new(34.851, -82.40), &trail).unwrap();
        assert_eq!(result.index_on_trail, 0);
        assert!(approx_eq(result.distance_to_trail, 111.2, 1.0));
    }

    #[test]
    fn test_project_dispatch() {
        let trail = sparse_trail();
        let near_start = GpsPoint::new(34.851, -82.400);
        let v = project(near_start, &trail, ProjectionMode::NearestVertex).unwrap();
        let s = project(near_start, &trail, ProjectionMode::NearestSegment).unwrap();
        assert_eq!(v.distance_along_trail(), 0.0);
        assert!(s.distance_along_trail() > 100.0);
        assert_eq!(s.index_on_trail, 0);
    }

    #[test]
    fn test_snap_to_trails_picks_closest_trail() {
        let main = Trail::new("main", sparse_trail());
        let spur = Trail::new(
            "spur",
            build_trail_points(&[GpsPoint::new(34.850, -82.390), GpsPoint::new(34.860, -82.390)]),
        );
        let empty = Trail::new("empty", vec![]);

        let snap = snap_to_trails(
            GpsPoint::new(34.855, -82.391),
            &[empty, main, spur],
            ProjectionMode::NearestSegment,
        )
        .unwrap();
        assert_eq!(snap.trail_id, "spur");
        assert!(snap_to_trails(GpsPoint::new(0.0, 0.0), &[], ProjectionMode::NearestVertex).is_none());
    }

    #[test]
    fn test_distance_from_entry_is_symmetric() {
        let trail = build_trail_points(&[
            GpsPoint::new(34.850, -82.40),
            GpsPoint::new(34.851, -82.40),
            GpsPoint::new(34.852, -82.40),
            GpsPoint::new(34.853, -82.40),
        ]);
        let entry = trail[3].position();
        let now = trail[1].position();
        let forward = distance_from_entry(entry, now, &trail, ProjectionMode::NearestVertex).unwrap();
        let backward = distance_from_entry(now, entry, &trail, ProjectionMode::NearestVertex).unwrap();
        assert!(approx_eq(forward, trail[3].distance_along_trail - trail[1].distance_along_trail, 1e-9));
        assert_eq!(forward, backward);
    }
}
