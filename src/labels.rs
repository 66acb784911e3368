//! Best-effort label placement in screen space.
//!
//! Hull polygons are computed in degrees; once the map has projected them to pixels,
//! [`place_label`] nudges a group's label away from hull vertices and trail points.
//! There is no guarantee that labels end up non-overlapping.

use log::debug;

use crate::GpsPoint;

const CHAR_WIDTH_PX: f64 = 8.0;
const LABEL_HEIGHT_PX: f64 = 20.0;

/// Unit nudge directions, clockwise from north (screen y grows downward).
const DIRECTIONS: [(f64, f64); 8] = [
    (0.0, -1.0),
    (1.0, -1.0),
    (1.0, 0.0),
    (1.0, 1.0),
    (0.0, 1.0),
    (-1.0, 1.0),
    (-1.0, 0.0),
    (-1.0, -1.0),
];

/// A point in screen pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ScreenPoint {
    pub x: f64,
    pub y: f64,
}

impl ScreenPoint {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Estimated rendered label size in pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct LabelSize {
    pub width: f64,
    pub height: f64,
}

/// An axis-aligned box in screen pixels, `(x, y)` being the top-left corner.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ScreenBox {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl ScreenBox {
    /// Box of `size` centred on `center`.
    pub fn centered(center: ScreenPoint, size: LabelSize) -> Self {
        Self {
            x: center.x - size.width / 2.0,
            y: center.y - size.height / 2.0,
            width: size.width,
            height: size.height,
        }
    }

    pub fn right(&self) -> f64 {
        self.x + self.width
    }

    pub fn bottom(&self) -> f64 {
        self.y + self.height
    }

    /// Inclusive on every edge.
    pub fn contains(&self, p: &ScreenPoint) -> bool {
        p.x >= self.x && p.x <= self.right() && p.y >= self.y && p.y <= self.bottom()
    }

    /// True if any hull or trail point falls inside the box.
    pub fn overlaps_any(&self, hull_points: &[ScreenPoint], trail_points: &[ScreenPoint]) -> bool {
        hull_points.iter().chain(trail_points).any(|p| self.contains(p))
    }

    fn offset(&self, dx: f64, dy: f64) -> Self {
        Self { x: self.x + dx, y: self.y + dy, ..*self }
    }
}

/// Configuration for label nudging.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct LabelConfig {
    /// Distance moved per nudge step, in pixels
    pub step_px: f64,
    /// Steps tried in each direction before giving up
    pub max_steps: u32,
}

impl Default for LabelConfig {
    fn default() -> Self {
        Self {
            step_px: 10.0,
            max_steps: 5,
        }
    }
}

/// Rough label size: 8 px per character, 20 px tall.
///
/// # Example
/// ```
/// use trail_nav::estimate_label_size;
///
/// let size = estimate_label_size("Food");
/// assert_eq!((size.width, size.height), (32.0, 20.0));
/// ```
pub fn estimate_label_size(text: &str) -> LabelSize {
    LabelSize {
        width: text.chars().count() as f64 * CHAR_WIDTH_PX,
        height: LABEL_HEIGHT_PX,
    }
}

/// Place a label box near `anchor`, avoiding hull and trail points when possible.
///
/// Tries the centred box first, then the 8 compass directions at increasing
/// multiples of `config.step_px`. The first clear box wins; if none is clear the
/// centred box is returned.
pub fn place_label(
    anchor: ScreenPoint,
    text: &str,
    hull_points: &[ScreenPoint],
    trail_points: &[ScreenPoint],
    config: &LabelConfig,
) -> ScreenBox {
    let centered = ScreenBox::centered(anchor, estimate_label_size(text));
    if !centered.overlaps_any(hull_points, trail_points) {
        return centered;
    }

    for step in 1..=config.max_steps {
        let distance = step as f64 * config.step_px;
        for (dx, dy) in DIRECTIONS {
            let candidate = centered.offset(dx * distance, dy * distance);
            if !candidate.overlaps_any(hull_points, trail_points) {
                return candidate;
            }
        }
    }

    debug!("[Hulls] No clear spot for label '{}', keeping it centred", text);
    centered
}

/// Hull vertex farthest from `centroid` (degree-space Euclidean). Ties keep the first.
pub fn farthest_hull_point(hull: &[GpsPoint], centroid: &GpsPoint) -> Option<GpsPoint> {
    let mut iter = hull.iter();
    let mut best = *iter.next()?;
    let mut best_d = planar_distance(&best, centroid);

    for p in iter {
        let d = planar_distance(p, centroid);
        if d > best_d {
            best = *p;
            best_d = d;
        }
    }

    Some(best)
}

/// Hull vertex nearest to `point` (degree-space Euclidean). Ties keep the first.
pub fn nearest_hull_point(hull: &[GpsPoint], point: &GpsPoint) -> Option<GpsPoint> {
    let mut iter = hull.iter();
    let mut best = *iter.next()?;
    let mut best_d = planar_distance(&best, point);

    for p in iter {
        let d = planar_distance(p, point);
        if d < best_d {
            best = *p;
            best_d = d;
        }
    }

    Some(best)
}

#[inline]
fn planar_distance(a: &GpsPoint, b: &GpsPoint) -> f64 {
    (a.longitude - b.longitude).hypot(a.latitude - b.latitude)
}
