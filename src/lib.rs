//! # Trail Nav
//!
//! Trail-relative positioning and geometry for trail navigation apps.
//!
//! This library provides:
//! - Projection of arbitrary GPS points onto a trail polyline ("where am I on this trail")
//! - POI grouping by primary tag and ahead/behind partitioning with ETAs
//! - Convex hulls and label anchors for POI clusters
//! - Trail junction detection using R-tree spatial indexing
//! - A deterministic motion simulator for demoing navigation without GPS
//!
//! ## Features
//!
//! - **`serde`** - Parse route / POI payloads, derive serde traits (default)
//! - **`driver`** - Tokio task that drives the simulator in real time (default)
//! - **`parallel`** - Enable parallel processing with rayon
//! - **`full`** - Enable all features
//!
//! ## Quick Start
//!
//! ```rust
//! use trail_nav::{
//!     build_trail_points, group_by_primary_tag, partition, GpsPoint, NavConfig, Poi,
//!     TravelDirection,
//! };
//!
//! let trail = build_trail_points(&[
//!     GpsPoint::new(34.8500, -82.4000),
//!     GpsPoint::new(34.8510, -82.4000),
//!     GpsPoint::new(34.8520, -82.4000),
//!     GpsPoint::new(34.8530, -82.4000),
//! ]);
//!
//! let pois = vec![
//!     Poi::new("1", "Cafe", [-82.4000, 34.8530]).with_tag("Food"),
//!     Poi::new("2", "Park", [-82.4000, 34.8500]).with_tag("Parks"),
//! ];
//!
//! let groups = group_by_primary_tag(&pois);
//! let here = GpsPoint::new(34.8510, -82.4000);
//! let result = partition(&groups, &trail, here, TravelDirection::Forward, &NavConfig::default());
//!
//! assert_eq!(result.ahead[0].name, "Food");
//! assert_eq!(result.behind[0].name, "Parks");
//! ```

pub mod geo_utils;

pub mod projection;
pub use projection::{
    ProjectionMode, ProjectionResult, TrailSnap,
    find_nearest_trail_point, project, project_onto_segments, snap_to_trails, distance_from_entry,
};

pub mod grouping;
pub use grouping::{
    ClosestMember, PoiGroup,
    group_by_primary_tag, closest_member_distance, cluster_by_proximity,
    unique_tags, unique_categories, filter_by_tag,
};

pub mod navigation;
pub use navigation::{NavConfig, NavGroup, Partition, eta_seconds, partition};

#[cfg(feature = "parallel")]
pub use navigation::partition_parallel;

pub mod hulls;
pub use hulls::{GroupHull, HullConfig, HullExpansion, hulls_for_groups};

pub mod labels;
pub use labels::{
    LabelConfig, LabelSize, ScreenBox, ScreenPoint,
    estimate_label_size, place_label, farthest_hull_point, nearest_hull_point,
};

pub mod junctions;
pub use junctions::{
    Junction, JunctionConfig,
    find_junctions, consolidate_junctions, trail_junctions, find_nearest_junction,
};

pub mod simulation;
pub use simulation::{
    MotionSimulator, PlaybackState, SimulationConfig, SimulationEvent, SimulationState,
    SpeedMultiplier, SubscriptionId,
};

#[cfg(feature = "driver")]
pub mod driver;

#[cfg(feature = "driver")]
pub use driver::SimulationDriver;

#[cfg(feature = "serde")]
pub mod sources;

#[cfg(feature = "serde")]
pub use sources::{RouteData, SourceError, parse_pois, parse_route, parse_trail_configs};

/// Group name used for POIs that carry no tags.
pub const UNGROUPED: &str = "Ungrouped";

// ============================================================================
// Core Types
// ============================================================================

/// A GPS coordinate with latitude and longitude.
///
/// # Example
/// ```
/// use trail_nav::GpsPoint;
/// let point = GpsPoint::new(34.8526, -82.3940); // Greenville, SC
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct GpsPoint {
    pub latitude: f64,
    pub longitude: f64,
}

impl GpsPoint {
    /// Create a new GPS point.
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self { latitude, longitude }
    }

    /// Check if the point has valid coordinates.
    pub fn is_valid(&self) -> bool {
        self.latitude.is_finite()
            && self.longitude.is_finite()
            && self.latitude >= -90.0
            && self.latitude <= 90.0
            && self.longitude >= -180.0
            && self.longitude <= 180.0
    }
}

/// Bounding box for a trail or point set.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Bounds {
    pub min_lat: f64,
    pub max_lat: f64,
    pub min_lng: f64,
    pub max_lng: f64,
}

impl Bounds {
    /// Create bounds from GPS points.
    pub fn from_points(points: &[GpsPoint]) -> Option<Self> {
        if points.is_empty() {
            return None;
        }
        Some(geo_utils::compute_bounds(points))
    }
}

/// A point on a trail, annotated with its cumulative distance from the trail start.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TrailPoint {
    pub latitude: f64,
    pub longitude: f64,
    /// Meters from the start of the trail (non-decreasing along the trail)
    pub distance_along_trail: f64,
    /// Elevation in meters, when the route source provides it
    pub elevation: Option<f64>,
}

impl TrailPoint {
    pub fn new(latitude: f64, longitude: f64, distance_along_trail: f64) -> Self {
        Self { latitude, longitude, distance_along_trail, elevation: None }
    }

    pub fn with_elevation(mut self, elevation: f64) -> Self {
        self.elevation = Some(elevation);
        self
    }

    pub fn position(&self) -> GpsPoint {
        GpsPoint::new(self.latitude, self.longitude)
    }
}

/// Build trail points from a raw polyline, assigning cumulative Haversine distances.
///
/// # Example
/// ```
/// use trail_nav::{build_trail_points, GpsPoint};
///
/// let points = build_trail_points(&[
///     GpsPoint::new(34.8500, -82.4000),
///     GpsPoint::new(34.8510, -82.4000),
/// ]);
/// assert_eq!(points[0].distance_along_trail, 0.0);
/// assert!((points[1].distance_along_trail - 111.2).abs() < 1.0);
/// ```
pub fn build_trail_points(polyline: &[GpsPoint]) -> Vec<TrailPoint> {
    let mut accumulated = 0.0;
    let mut result = Vec::with_capacity(polyline.len());

    for (i, p) in polyline.iter().enumerate() {
        if i > 0 {
            accumulated += geo_utils::haversine_distance(&polyline[i - 1], p);
        }
        result.push(TrailPoint::new(p.latitude, p.longitude, accumulated));
    }

    result
}

/// Whether a trail is a main line or a spur branching off another trail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum TrailKind {
    #[default]
    Main,
    Spur,
}

/// Static description of a named trail, before its route points are known.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
pub struct TrailConfig {
    pub id: String,
    /// Upstream route identifier used to fetch the polyline
    pub route_id: String,
    pub name: String,
    /// Display color, e.g. "#4CAF50"
    pub color: String,
    #[cfg_attr(feature = "serde", serde(rename = "type", default))]
    pub kind: TrailKind,
    #[cfg_attr(feature = "serde", serde(default))]
    pub endpoint1: Option<GpsPoint>,
    #[cfg_attr(feature = "serde", serde(default))]
    pub endpoint2: Option<GpsPoint>,
}

/// A named trail polyline.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Trail {
    pub id: String,
    pub route_id: String,
    pub name: String,
    pub color: String,
    pub kind: TrailKind,
    /// Ordered start → end
    pub points: Vec<TrailPoint>,
    pub endpoint1: Option<GpsPoint>,
    pub endpoint2: Option<GpsPoint>,
}

impl Trail {
    /// Create a main trail from already-measured points.
    pub fn new(id: &str, points: Vec<TrailPoint>) -> Self {
        Self {
            id: id.to_string(),
            route_id: String::new(),
            name: id.to_string(),
            color: String::new(),
            kind: TrailKind::Main,
            points,
            endpoint1: None,
            endpoint2: None,
        }
    }

    /// Combine a trail configuration with its fetched route points.
    pub fn from_config(config: &TrailConfig, points: Vec<TrailPoint>) -> Self {
        Self {
            id: config.id.clone(),
            route_id: config.route_id.clone(),
            name: config.name.clone(),
            color: config.color.clone(),
            kind: config.kind,
            points,
            endpoint1: config.endpoint1,
            endpoint2: config.endpoint2,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Along-trail distance of the final point, in meters.
    pub fn total_distance(&self) -> f64 {
        self.points.last().map_or(0.0, |p| p.distance_along_trail)
    }

    pub fn positions(&self) -> Vec<GpsPoint> {
        self.points.iter().map(TrailPoint::position).collect()
    }
}

/// A POI tag (the first tag is the POI's group).
#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Tag {
    pub id: u64,
    pub name: String,
    #[cfg_attr(feature = "serde", serde(default))]
    pub slug: String,
}

/// A POI category.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Category {
    pub id: u64,
    pub name: String,
    #[cfg_attr(feature = "serde", serde(default))]
    pub slug: String,
}

/// A point of interest near a trail.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Poi {
    pub id: String,
    pub title: String,
    pub description: String,
    /// `[longitude, latitude]`; use [`Poi::position`] to read it
    pub coordinates: [f64; 2],
    pub tags: Vec<Tag>,
    pub categories: Vec<Category>,
}

impl Poi {
    /// Create an untagged POI. `coordinates` is `[longitude, latitude]`.
    pub fn new(id: &str, title: &str, coordinates: [f64; 2]) -> Self {
        Self {
            id: id.to_string(),
            title: title.to_string(),
            description: String::new(),
            coordinates,
            tags: Vec::new(),
            categories: Vec::new(),
        }
    }

    /// Append a tag with the given name.
    pub fn with_tag(mut self, name: &str) -> Self {
        let id = self.tags.len() as u64 + 1;
        self.tags.push(Tag { id, name: name.to_string(), slug: name.to_lowercase() });
        self
    }

    /// Append a category with the given name.
    pub fn with_category(mut self, name: &str) -> Self {
        let id = self.categories.len() as u64 + 1;
        self.categories.push(Category { id, name: name.to_string(), slug: name.to_lowercase() });
        self
    }

    /// The POI location as latitude/longitude.
    #[inline]
    pub fn position(&self) -> GpsPoint {
        GpsPoint::new(self.coordinates[1], self.coordinates[0])
    }

    /// Name of the first tag, or [`UNGROUPED`].
    pub fn primary_tag(&self) -> &str {
        self.tags.first().map_or(UNGROUPED, |t| t.name.as_str())
    }
}

/// How the user is moving along the trail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum LocomotionMode {
    #[default]
    Walking,
    Running,
    Biking,
    Accessible,
}

impl LocomotionMode {
    pub const ALL: [LocomotionMode; 4] = [
        LocomotionMode::Walking,
        LocomotionMode::Running,
        LocomotionMode::Biking,
        LocomotionMode::Accessible,
    ];

    /// Base travel speed in meters per second.
    pub fn base_speed(self) -> f64 {
        match self {
            LocomotionMode::Walking => 1.4,
            LocomotionMode::Running => 3.0,
            LocomotionMode::Biking => 4.5,
            LocomotionMode::Accessible => 1.0,
        }
    }
}

/// Direction of travel relative to the trail's start → end order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum TravelDirection {
    /// Towards increasing along-trail distance
    #[default]
    Forward,
    /// Towards the trail start
    Backward,
}

impl TravelDirection {
    pub fn reversed(self) -> Self {
        match self {
            TravelDirection::Forward => TravelDirection::Backward,
            TravelDirection::Backward => TravelDirection::Forward,
        }
    }

    /// Index step when walking the trail point sequence.
    pub(crate) fn step(self) -> isize {
        match self {
            TravelDirection::Forward => 1,
            TravelDirection::Backward => -1,
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
