//! # Geographic Utilities
//!
//! Pure geometry used by the projector, hull and junction code.
//!
//! | Function | Description |
//! |----------|-------------|
//! | [`haversine_distance`] | Great-circle distance between two GPS points |
//! | [`point_to_segment_distance`] | Distance from a point to a clamped segment |
//! | [`convex_hull`] | Andrew's monotone chain hull (lon = x, lat = y) |
//! | [`expand_hull_from_centroid`] | Push hull vertices radially outward |
//! | [`expand_hull_along_bisectors`] | Push hull vertices along exterior bisectors |
//! | [`point_in_polygon`] | Ray-casting containment test |
//! | [`compute_bounds`] / [`bounds_overlap`] | Bounding boxes |
//! | [`compute_center`] | Arithmetic-mean centroid |
//!
//! ## Coordinate System
//!
//! All functions take WGS84 degrees. Hull, polygon and segment arithmetic treats
//! longitude/latitude as a flat plane. At trail scale (a few km) the error is small.

use geo::{Distance, Haversine, Point};
use crate::{Bounds, GpsPoint};

const METERS_PER_MILE_INV: f64 = 0.000621371;

// =============================================================================
// Distance Functions
// =============================================================================

/// Calculate the great-circle distance between two GPS points using the Haversine formula.
///
/// Returns meters along a spherical Earth (radius 6,371 km).
///
/// # Example
///
/// ```rust
/// use trail_nav::{GpsPoint, geo_utils};
///
/// let downtown = GpsPoint::new(34.8526, -82.3940);
/// let furman = GpsPoint::new(34.9266, -82.4432);
///
/// let distance = geo_utils::haversine_distance(&downtown, &furman);
/// assert!((distance - 9_400.0).abs() < 300.0);
/// ```
#[inline]
pub fn haversine_distance(p1: &GpsPoint, p2: &GpsPoint) -> f64 {
    let point1 = Point::new(p1.longitude, p1.latitude);
    let point2 = Point::new(p2.longitude, p2.latitude);
    Haversine::distance(point1, point2)
}

/// Haversine distance for raw coordinates, in meters.
#[inline]
pub fn haversine(lat_a: f64, lon_a: f64, lat_b: f64, lon_b: f64) -> f64 {
    haversine_distance(&GpsPoint::new(lat_a, lon_a), &GpsPoint::new(lat_b, lon_b))
}

/// Calculate the total length of a polyline in meters.
///
/// Empty or single-point polylines return 0.0.
pub fn polyline_length(points: &[GpsPoint]) -> f64 {
    if points.len() < 2 {
        return 0.0;
    }

    points
        .windows(2)
        .map(|w| haversine_distance(&w[0], &w[1]))
        .sum()
}

/// Project a point onto a segment in degree space.
///
/// Returns the projected point and its parameter `t` in `[0, 1]`. A zero-length
/// segment projects onto its start.
pub fn project_onto_segment(point: &GpsPoint, seg_start: &GpsPoint, seg_end: &GpsPoint) -> (GpsPoint, f64) {
    let dx = seg_end.longitude - seg_start.longitude;
    let dy = seg_end.latitude - seg_start.latitude;
    let len_sq = dx * dx + dy * dy;

    if len_sq < 1e-20 {
        return (*seg_start, 0.0);
    }

    let t = ((point.longitude - seg_start.longitude) * dx + (point.latitude - seg_start.latitude) * dy) / len_sq;
    let t = t.clamp(0.0, 1.0);

    (
        GpsPoint::new(seg_start.latitude + t * dy, seg_start.longitude + t * dx),
        t,
    )
}

/// Distance in meters from a point to the nearest point of a segment.
///
/// The foot of the perpendicular is found in degree space, then measured with Haversine.
pub fn point_to_segment_distance(point: &GpsPoint, seg_start: &GpsPoint, seg_end: &GpsPoint) -> f64 {
    let (projected, _) = project_onto_segment(point, seg_start, seg_end);
    haversine_distance(point, &projected)
}

/// Convert meters to approximate degrees at a given latitude.
///
/// Conservative (larger) value based on the longitude scale, suitable for
/// square search windows.
#[inline]
pub fn meters_to_degrees(meters: f64, latitude: f64) -> f64 {
    let lat_rad = latitude.to_radians();
    let meters_per_degree = 111_320.0 * lat_rad.cos().max(0.1);
    meters / meters_per_degree
}

/// Convert meters to statute miles.
#[inline]
pub fn meters_to_miles(meters: f64) -> f64 {
    meters * METERS_PER_MILE_INV
}

// =============================================================================
// Bounding Box Functions
// =============================================================================

/// Compute the bounding box of a point set.
///
/// For empty input, returns MIN/MAX sentinels that fail any overlap check.
pub fn compute_bounds(points: &[GpsPoint]) -> Bounds {
    let mut min_lat = f64::MAX;
    let mut max_lat = f64::MIN;
    let mut min_lng = f64::MAX;
    let mut max_lng = f64::MIN;

    for p in points {
        min_lat = min_lat.min(p.latitude);
        max_lat = max_lat.max(p.latitude);
        min_lng = min_lng.min(p.longitude);
        max_lng = max_lng.max(p.longitude);
    }

    Bounds { min_lat, max_lat, min_lng, max_lng }
}

/// Check if two bounding boxes overlap, with a buffer in meters.
pub fn bounds_overlap(a: &Bounds, b: &Bounds, buffer_meters: f64, reference_lat: f64) -> bool {
    let buffer_deg = meters_to_degrees(buffer_meters, reference_lat);

    !(a.max_lat + buffer_deg < b.min_lat ||
      b.max_lat + buffer_deg < a.min_lat ||
      a.max_lng + buffer_deg < b.min_lng ||
      b.max_lng + buffer_deg < a.min_lng)
}

/// Arithmetic mean of the points. Returns (0, 0) for empty input.
///
/// This is the vertex mean, not the area centroid of a polygon.
pub fn compute_center(points: &[GpsPoint]) -> GpsPoint {
    if points.is_empty() {
        return GpsPoint::new(0.0, 0.0);
    }

    let sum_lat: f64 = points.iter().map(|p| p.latitude).sum();
    let sum_lng: f64 = points.iter().map(|p| p.longitude).sum();
    let n = points.len() as f64;

    GpsPoint::new(sum_lat / n, sum_lng / n)
}

// =============================================================================
// Polygon Functions
// =============================================================================

/// Compute the convex hull using Andrew's monotone chain.
///
/// Longitude is x, latitude is y. Inputs with fewer than 4 points are returned
/// unchanged. Points are sorted by (x, y) and exact duplicates dropped; colinear
/// points are excluded. The hull is counter-clockwise, starting at the lowest x.
///
/// # Example
///
/// ```rust
/// use trail_nav::{GpsPoint, geo_utils};
///
/// let points = vec![
///     GpsPoint::new(0.0, 0.0),
///     GpsPoint::new(0.0, 4.0),
///     GpsPoint::new(4.0, 2.0),
///     GpsPoint::new(1.0, 2.0), // interior
/// ];
/// assert_eq!(geo_utils::convex_hull(&points).len(), 3);
/// ```
pub fn convex_hull(points: &[GpsPoint]) -> Vec<GpsPoint> {
    if points.len() < 4 {
        return points.to_vec();
    }

    let mut sorted: Vec<GpsPoint> = points.to_vec();
    sorted.sort_by(|a, b| {
        a.longitude
            .total_cmp(&b.longitude)
            .then_with(|| a.latitude.total_cmp(&b.latitude))
    });
    sorted.dedup();

    if sorted.len() < 3 {
        return sorted;
    }

    let mut hull: Vec<GpsPoint> = Vec::with_capacity(2 * sorted.len());

    // Lower hull
    for point in &sorted {
        while hull.len() >= 2 && cross(&hull[hull.len() - 2], &hull[hull.len() - 1], point) <= 0.0 {
            hull.pop();
        }
        hull.push(*point);
    }

    // Upper hull
    let lower_len = hull.len() + 1;
    for point in sorted.iter().rev().skip(1) {
        while hull.len() >= lower_len
            && cross(&hull[hull.len() - 2], &hull[hull.len() - 1], point) <= 0.0
        {
            hull.pop();
        }
        hull.push(*point);
    }

    // Last point repeats the first
    hull.pop();
    hull
}

/// Cross product of OA x OB in (lon, lat) space.
#[inline]
fn cross(o: &GpsPoint, a: &GpsPoint, b: &GpsPoint) -> f64 {
    (a.longitude - o.longitude) * (b.latitude - o.latitude)
        - (a.latitude - o.latitude) * (b.longitude - o.longitude)
}

/// Move every hull vertex radially away from the vertex-mean centroid by `buffer_degrees`.
///
/// Hulls with fewer than 3 vertices are returned unchanged, as are vertices
/// that coincide with the centroid.
pub fn expand_hull_from_centroid(hull: &[GpsPoint], buffer_degrees: f64) -> Vec<GpsPoint> {
    if hull.len() < 3 {
        return hull.to_vec();
    }

    let centroid = compute_center(hull);

    hull.iter()
        .map(|p| {
            let dx = p.longitude - centroid.longitude;
            let dy = p.latitude - centroid.latitude;
            let len = dx.hypot(dy);
            if len == 0.0 {
                return *p;
            }
            GpsPoint::new(
                p.latitude + dy / len * buffer_degrees,
                p.longitude + dx / len * buffer_degrees,
            )
        })
        .collect()
}

/// Move every vertex of a convex hull outward along its exterior angle bisector.
///
/// The bisector of the two edge vectors at a convex vertex points into the polygon,
/// so vertices move against it. Straight (180°) vertices have no bisector and stay put.
pub fn expand_hull_along_bisectors(hull: &[GpsPoint], buffer_degrees: f64) -> Vec<GpsPoint> {
    if hull.len() < 3 {
        return hull.to_vec();
    }

    let n = hull.len();
    (0..n)
        .map(|i| {
            let prev = &hull[(i + n - 1) % n];
            let curr = &hull[i];
            let next = &hull[(i + 1) % n];

            let (v1x, v1y) = (prev.longitude - curr.longitude, prev.latitude - curr.latitude);
            let (v2x, v2y) = (next.longitude - curr.longitude, next.latitude - curr.latitude);
            let len1 = v1x.hypot(v1y);
            let len2 = v2x.hypot(v2y);
            if len1 == 0.0 || len2 == 0.0 {
                return *curr;
            }

            let bx = v1x / len1 + v2x / len2;
            let by = v1y / len1 + v2y / len2;
            let blen = bx.hypot(by);
            if blen < 1e-12 {
                return *curr;
            }

            GpsPoint::new(
                curr.latitude - by / blen * buffer_degrees,
                curr.longitude - bx / blen * buffer_degrees,
            )
        })
        .collect()
}

/// Ray-casting point-in-polygon test (edge-crossing parity).
///
/// Polygons with fewer than 3 vertices contain nothing.
pub fn point_in_polygon(point: &GpsPoint, polygon: &[GpsPoint]) -> bool {
    let mut inside = false;
    if polygon.len() < 3 {
        return inside;
    }

    let (px, py) = (point.longitude, point.latitude);
    let mut j = polygon.len() - 1;
    for i in 0..polygon.len() {
        let (xi, yi) = (polygon[i].longitude, polygon[i].latitude);
        let (xj, yj) = (polygon[j].longitude, polygon[j].latitude);
        let crosses = (yi > py) != (yj > py)
            && px < (xj - xi) * (py - yi) / (yj - yi) + xi;
        if crosses {
            inside = !inside;
        }
        j = i;
    }
    inside
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn approx_eq(a: f64, b: f64, epsilon: f64) -> bool {
        (a - b).abs() < epsilon
    }

    fn contains(hull: &[GpsPoint], p: GpsPoint) -> bool {
        hull.iter().any(|h| *h == p)
    }

    #[test]
    fn test_haversine_distance_same_point() {
        let p = GpsPoint::new(34.8526, -82.3940);
        assert_eq!(haversine_distance(&p, &p), 0.0);
    }

    #[test]
    fn test_haversine_one_degree_latitude() {
        let d = haversine(0.0, 0.0, 1.0, 0.0);
        assert!(approx_eq(d, 111_195.0, 100.0));
    }

    #[test]
    fn test_polyline_length() {
        assert_eq!(polyline_length(&[]), 0.0);
        assert_eq!(polyline_length(&[GpsPoint::new(34.85, -82.40)]), 0.0);
        let track = vec![GpsPoint::new(34.850, -82.40), GpsPoint::new(34.851, -82.40)];
        assert!(approx_eq(polyline_length(&track), 111.2, 1.0));
    }

    #[test]
    fn test_point_to_segment_perpendicular() {
        let start = GpsPoint::new(0.0, 0.0);
        let end = GpsPoint::new(0.0, 0.002);
        let p = GpsPoint::new(0.001, 0.001);
        let d = point_to_segment_distance(&p, &start, &end);
        // Foot of the perpendicular is (0, 0.001), one millidegree of latitude away
        assert!(approx_eq(d, 111.2, 1.0));
    }

    #[test]
    fn test_point_to_segment_clamps_to_endpoint() {
        let start = GpsPoint::new(0.0, 0.0);
        let end = GpsPoint::new(0.0, 0.001);
        let beyond = GpsPoint::new(0.0, 0.003);
        let (projected, t) = project_onto_segment(&beyond, &start, &end);
        assert_eq!(t, 1.0);
        assert_eq!(projected, end);
        assert!(approx_eq(point_to_segment_distance(&beyond, &start, &end), 222.4, 1.0));
    }

    #[test]
    fn test_point_to_degenerate_segment() {
        let a = GpsPoint::new(0.0, 0.0);
        let p = GpsPoint::new(0.001, 0.0);
        assert!(approx_eq(point_to_segment_distance(&p, &a, &a), haversine_distance(&p, &a), 1e-9));
    }

    #[test]
    fn test_convex_hull_small_input_unchanged() {
        let pts = vec![GpsPoint::new(0.0, 0.0), GpsPoint::new(1.0, 1.0), GpsPoint::new(0.0, 1.0)];
        assert_eq!(convex_hull(&pts), pts);
        assert!(convex_hull(&[]).is_empty());
    }

    #[test]
    fn test_convex_hull_excludes_interior_points() {
        let a = GpsPoint::new(0.0, 0.0);
        let b = GpsPoint::new(0.0, 10.0);
        let c = GpsPoint::new(10.0, 5.0);
        let pts = vec![
            GpsPoint::new(2.0, 5.0),
            a,
            GpsPoint::new(3.0, 4.0),
            b,
            GpsPoint::new(1.0, 2.0),
            c,
        ];
        let hull = convex_hull(&pts);
        assert_eq!(hull.len(), 3);
        assert!(contains(&hull, a) && contains(&hull, b) && contains(&hull, c));
    }

    #[test]
    fn test_convex_hull_square_with_colinear_edge_point() {
        let pts = vec![
            GpsPoint::new(0.0, 0.0),
            GpsPoint::new(0.0, 1.0),
            GpsPoint::new(1.0, 1.0),
            GpsPoint::new(1.0, 0.0),
            GpsPoint::new(0.0, 0.5), // on the southern edge
            GpsPoint::new(0.5, 0.5), // interior
        ];
        let hull = convex_hull(&pts);
        assert_eq!(hull.len(), 4);
        assert!(!contains(&hull, GpsPoint::new(0.0, 0.5)));
        // Starts at the lowest (lon, lat)
        assert_eq!(hull[0], GpsPoint::new(0.0, 0.0));
    }

    #[test]
    fn test_convex_hull_is_counter_clockwise() {
        let pts = vec![
            GpsPoint::new(0.0, 0.0),
            GpsPoint::new(0.0, 1.0),
            GpsPoint::new(1.0, 1.0),
            GpsPoint::new(1.0, 0.0),
        ];
        let hull = convex_hull(&pts);
        let n = hull.len();
        let signed_area: f64 = (0..n)
            .map(|i| {
                let (p, q) = (&hull[i], &hull[(i + 1) % n]);
                p.longitude * q.latitude - q.longitude * p.latitude
            })
            .sum();
        assert!(signed_area > 0.0);
    }

    #[test]
    fn test_convex_hull_duplicates_collapse() {
        let p = GpsPoint::new(1.0, 1.0);
        let q = GpsPoint::new(2.0, 2.0);
        let hull = convex_hull(&[p, p, q, q]);
        assert_eq!(hull, vec![p, q]);
    }

    #[test]
    fn test_expand_hull_from_centroid_moves_outward() {
        let hull = vec![
            GpsPoint::new(0.0, 0.0),
            GpsPoint::new(0.0, 2.0),
            GpsPoint::new(2.0, 2.0),
            GpsPoint::new(2.0, 0.0),
        ];
        let expanded = expand_hull_from_centroid(&hull, 0.5);
        let center = compute_center(&hull);
        for (before, after) in hull.iter().zip(&expanded) {
            let d_before = (before.latitude - center.latitude).hypot(before.longitude - center.longitude);
            let d_after = (after.latitude - center.latitude).hypot(after.longitude - center.longitude);
            assert!(approx_eq(d_after - d_before, 0.5, 1e-9));
        }
    }

    #[test]
    fn test_expand_hull_from_centroid_small_hull_unchanged() {
        let hull = vec![GpsPoint::new(0.0, 0.0), GpsPoint::new(1.0, 1.0)];
        assert_eq!(expand_hull_from_centroid(&hull, 1.0), hull);
    }

    #[test]
    fn test_expand_hull_along_bisectors_grows_polygon() {
        let hull = convex_hull(&[
            GpsPoint::new(0.0, 0.0),
            GpsPoint::new(0.0, 1.0),
            GpsPoint::new(1.0, 1.0),
            GpsPoint::new(1.0, 0.0),
        ]);
        let expanded = expand_hull_along_bisectors(&hull, 0.1);
        for original in &hull {
            assert!(point_in_polygon(original, &expanded));
        }
        assert!(!point_in_polygon(&GpsPoint::new(1.2, 1.2), &expanded));
    }

    #[test]
    fn test_point_in_polygon() {
        let square = vec![
            GpsPoint::new(0.0, 0.0),
            GpsPoint::new(0.0, 1.0),
            GpsPoint::new(1.0, 1.0),
            GpsPoint::new(1.0, 0.0),
        ];
        assert!(point_in_polygon(&GpsPoint::new(0.5, 0.5), &square));
        assert!(!point_in_polygon(&GpsPoint::new(1.5, 0.5), &square));
        assert!(!point_in_polygon(&GpsPoint::new(0.5, 0.5), &square[..2]));
    }

    #[test]
    fn test_compute_bounds_and_overlap() {
        let a = compute_bounds(&[GpsPoint::new(34.850, -82.40), GpsPoint::new(34.860, -82.39)]);
        assert_eq!(a.min_lat, 34.850);
        assert_eq!(a.max_lng, -82.39);

        let b = compute_bounds(&[GpsPoint::new(34.870, -82.38), GpsPoint::new(34.880, -82.37)]);
        assert!(!bounds_overlap(&a, &b, 0.0, 34.85));
        assert!(bounds_overlap(&a, &b, 5000.0, 34.85));
    }

    #[test]
    fn test_compute_center() {
        let center = compute_center(&[GpsPoint::new(34.0, -82.0), GpsPoint::new(36.0, -84.0)]);
        assert!(approx_eq(center.latitude, 35.0, 1e-9));
        assert!(approx_eq(center.longitude, -83.0, 1e-9));
        assert_eq!(compute_center(&[]), GpsPoint::new(0.0, 0.0));
    }

    #[test]
    fn test_unit_conversions() {
        assert!(approx_eq(meters_to_miles(1609.344), 1.0, 1e-3));
        assert!(approx_eq(meters_to_degrees(111_320.0, 0.0), 1.0, 0.01));
        assert!(meters_to_degrees(111_320.0, 45.0) > 1.0);
    }
}
