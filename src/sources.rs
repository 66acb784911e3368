//! # Data Sources
//!
//! Parsers for the upstream payloads the app consumes:
//!
//! - RideWithGPS routes: `{ "route": { "distance": .., "track_points": [{ "x": lon, "y": lat, "d": .., "e": .. }] } }`
//! - WordPress places: arrays of POIs with `title.rendered`, `post_tags`, and either
//!   `coordinates: [lon, lat]` or `latitude`/`longitude`
//! - Trail configuration lists
//!
//! Coordinates are validated here and nowhere else; invalid entries are dropped with a
//! warning rather than failing the whole payload.

use log::{info, warn};
use serde::Deserialize;
use thiserror::Error;

use crate::geo_utils::haversine_distance;
use crate::{Category, GpsPoint, Poi, Tag, TrailConfig, TrailPoint};

#[derive(Debug, Error)]
pub enum SourceError {
    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("route payload has no track points")]
    MissingTrackPoints,
}

/// A parsed route polyline.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RouteData {
    pub points: Vec<TrailPoint>,
    /// Reported route length, or the last point's distance when absent
    pub total_distance_meters: f64,
}

// =============================================================================
// Raw payloads
// =============================================================================

#[derive(Debug, Deserialize)]
struct RoutePayload {
    route: Option<RawRoute>,
}

#[derive(Debug, Deserialize)]
struct RawRoute {
    distance: Option<f64>,
    track_points: Option<Vec<RawTrackPoint>>,
}

#[derive(Debug, Deserialize)]
struct RawTrackPoint {
    x: Option<f64>,
    y: Option<f64>,
    d: Option<f64>,
    e: Option<f64>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum Rendered {
    Object { rendered: String },
    Plain(String),
}

impl Rendered {
    fn into_text(self) -> String {
        match self {
            Rendered::Object { rendered } => rendered,
            Rendered::Plain(text) => text,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum Coordinate {
    Number(f64),
    Text(String),
}

impl Coordinate {
    fn value(&self) -> Option<f64> {
        match self {
            Coordinate::Number(v) => Some(*v),
            Coordinate::Text(s) => s.trim().parse().ok(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct RawPoi {
    #[serde(default)]
    id: serde_json::Value,
    title: Option<Rendered>,
    content: Option<Rendered>,
    description: Option<String>,
    /// `[lon, lat]`; NaN upstream arrives as `null`
    coordinates: Option<Vec<Option<Coordinate>>>,
    latitude: Option<Coordinate>,
    longitude: Option<Coordinate>,
    post_tags: Option<Vec<Tag>>,
    post_category: Option<Vec<Category>>,
}

impl RawPoi {
    /// `coordinates` wins when valid, else `latitude`/`longitude`.
    fn position(&self) -> Option<GpsPoint> {
        let from_pair = match self.coordinates.as_deref() {
            Some([Some(lon), Some(lat)]) => lat
                .value()
                .zip(lon.value())
                .map(|(lat, lon)| GpsPoint::new(lat, lon))
                .filter(GpsPoint::is_valid),
            _ => None,
        };

        from_pair.or_else(|| {
            let lat = self.latitude.as_ref()?.value()?;
            let lon = self.longitude.as_ref()?.value()?;
            Some(GpsPoint::new(lat, lon)).filter(GpsPoint::is_valid)
        })
    }
}

fn id_string(id: &serde_json::Value) -> String {
    match id {
        serde_json::Value::String(s) => s.clone(),
        serde_json::Value::Null => String::new(),
        other => other.to_string(),
    }
}

// =============================================================================
// Parsers
// =============================================================================

/// Parse a RideWithGPS route payload.
///
/// Missing `d` values are filled from the previous point plus the Haversine gap,
/// and decreasing ones are clamped so distances never go backwards.
///
/// # Example
/// ```
/// use trail_nav::parse_route;
///
/// let json = r#"{"route": {"distance": 111.2, "track_points": [
///     {"x": -82.40, "y": 34.850, "d": 0.0},
///     {"x": -82.40, "y": 34.851, "d": 111.2}
/// ]}}"#;
/// let route = parse_route(json).unwrap();
/// assert_eq!(route.points.len(), 2);
/// assert_eq!(route.total_distance_meters, 111.2);
/// ```
pub fn parse_route(json: &str) -> Result<RouteData, SourceError> {
    let payload: RoutePayload = serde_json::from_str(json)?;
    let route = payload.route.ok_or(SourceError::MissingTrackPoints)?;
    let raw_points = route.track_points.ok_or(SourceError::MissingTrackPoints)?;

    let mut points: Vec<TrailPoint> = Vec::with_capacity(raw_points.len());
    let mut dropped = 0usize;

    for (i, raw) in raw_points.iter().enumerate() {
        let position = match (raw.y, raw.x) {
            (Some(lat), Some(lon)) => GpsPoint::new(lat, lon),
            _ => {
                warn!("[Sources] Track point {} has no coordinates, skipping", i);
                dropped += 1;
                continue;
            }
        };
        if !position.is_valid() {
            warn!(
                "[Sources] Track point {} has invalid coordinates ({}, {}), skipping",
                i, position.latitude, position.longitude
            );
            dropped += 1;
            continue;
        }

        let measured = points.last().map_or(0.0, |prev| {
            prev.distance_along_trail + haversine_distance(&prev.position(), &position)
        });
        let floor = points.last().map_or(0.0, |prev| prev.distance_along_trail);
        let distance = match raw.d {
            Some(d) if d.is_finite() => d.max(floor),
            _ => measured,
        };

        let mut point = TrailPoint::new(position.latitude, position.longitude, distance);
        if let Some(e) = raw.e.filter(|e| e.is_finite()) {
            point = point.with_elevation(e);
        }
        points.push(point);
    }

    let total_distance_meters = route
        .distance
        .filter(|d| d.is_finite())
        .unwrap_or_else(|| points.last().map_or(0.0, |p| p.distance_along_trail));

    info!(
        "[Sources] Parsed route: {} points ({} dropped), {:.0}m",
        points.len(),
        dropped,
        total_distance_meters
    );

    Ok(RouteData { points, total_distance_meters })
}

/// Parse a WordPress places listing into POIs.
///
/// POIs without usable coordinates are dropped. Duplicates are kept.
pub fn parse_pois(json: &str) -> Result<Vec<Poi>, SourceError> {
    let raw: Vec<RawPoi> = serde_json::from_str(json)?;
    let total = raw.len();

    let pois: Vec<Poi> = raw
        .into_iter()
        .filter_map(|r| {
            let Some(position) = r.position() else {
                warn!("[Sources] POI {} has no valid coordinates, skipping", id_string(&r.id));
                return None;
            };
            let content = r.content.map(Rendered::into_text);

            Some(Poi {
                id: id_string(&r.id),
                title: r.title.map(Rendered::into_text).unwrap_or_default(),
                description: r.description.or(content).unwrap_or_default(),
                coordinates: [position.longitude, position.latitude],
                tags: r.post_tags.unwrap_or_default(),
                categories: r.post_category.unwrap_or_default(),
            })
        })
        .collect();

    info!("[Sources] Parsed {} of {} POIs", pois.len(), total);
    Ok(pois)
}

/// Parse a JSON list of trail configurations.
pub fn parse_trail_configs(json: &str) -> Result<Vec<TrailConfig>, SourceError> {
    Ok(serde_json::from_str(json)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::TrailKind;

    fn approx_eq(a: f64, b: f64, epsilon: f64) -> bool {
        (a - b).abs() < epsilon
    }

    #[test]
    fn test_parse_route_fills_and_clamps_distances() {
        let json = r#"{"route": {"track_points": [
            {"x": -82.40, "y": 34.850, "d": 0.0, "e": 290.5},
            {"x": -82.40, "y": 34.851},
            {"x": -82.40, "y": 34.852, "d": 50.0},
            {"x": -82.40, "y": 34.853, "d": 400.0}
        ]}}"#;
        let route = parse_route(json).unwrap();

        assert_eq!(route.points.len(), 4);
        assert_eq!(route.points[0].elevation, Some(290.5));
        assert!(approx_eq(route.points[1].distance_along_trail, 111.2, 0.5));
        // 50 < previous, clamped up
        assert_eq!(route.points[2].distance_along_trail, route.points[1].distance_along_trail);
        assert_eq!(route.points[3].distance_along_trail, 400.0);
        assert_eq!(route.total_distance_meters, 400.0);
    }

    #[test]
    fn test_parse_route_drops_invalid_points() {
        let json = r#"{"route": {"distance": 1000.0, "track_points": [
            {"x": -82.40, "y": 34.850, "d": 0.0},
            {"x": -82.40, "y": 95.0, "d": 10.0},
            {"y": 34.851},
            {"x": -82.40, "y": 34.851, "d": 111.0}
        ]}}"#;
        let route = parse_route(json).unwrap();

        assert_eq!(route.points.len(), 2);
        assert_eq!(route.total_distance_meters, 1000.0);
    }

    #[test]
    fn test_parse_route_missing_track_points() {
        assert!(matches!(parse_route(r#"{}"#), Err(SourceError::MissingTrackPoints)));
        assert!(matches!(parse_route(r#"{"route": {}}"#), Err(SourceError::MissingTrackPoints)));
        assert!(matches!(parse_route("not json"), Err(SourceError::Json(_))));
    }

    #[test]
    fn test_parse_pois_shapes() {
        let json = r#"[
            {
                "id": 12,
                "title": {"rendered": "Swamp Rabbit Cafe"},
                "content": {"rendered": "<p>Coffee</p>"},
                "coordinates": [-82.4070, 34.8610],
                "post_tags": [{"id": 3, "name": "Food", "slug": "food"}],
                "post_category": [{"id": 7, "name": "Trail - Food", "slug": "trail-food"}]
            },
            {
                "id": "bench-1",
                "title": "Bench",
                "latitude": "34.8600",
                "longitude": "-82.4000"
            },
            {
                "id": 13,
                "title": {"rendered": "Nowhere"},
                "latitude": "abc",
                "longitude": 0
            }
        ]"#;
        let pois = parse_pois(json).unwrap();

        assert_eq!(pois.len(), 2);
        assert_eq!(pois[0].id, "12");
        assert_eq!(pois[0].title, "Swamp Rabbit Cafe");
        assert_eq!(pois[0].description, "<p>Coffee</p>");
        assert_eq!(pois[0].primary_tag(), "Food");
        assert_eq!(pois[0].position(), GpsPoint::new(34.8610, -82.4070));

        assert_eq!(pois[1].id, "bench-1");
        assert_eq!(pois[1].coordinates, [-82.4000, 34.8600]);
        assert!(pois[1].tags.is_empty());
    }

    #[test]
    fn test_parse_pois_skips_null_coordinates() {
        let json = r#"[
            {"id": 1, "title": {"rendered": "Cafe"}, "coordinates": [-82.40, 34.85]},
            {"id": 2, "title": {"rendered": "Unplaced"}, "coordinates": [null, null]},
            {"id": 3, "title": {"rendered": "Fallback"}, "coordinates": [null, null],
             "latitude": "34.86", "longitude": "-82.41"},
            {"id": 4, "title": {"rendered": "Short"}, "coordinates": [-82.40]}
        ]"#;
        let pois = parse_pois(json).unwrap();

        assert_eq!(pois.len(), 2);
        assert_eq!(pois[0].id, "1");
        assert_eq!(pois[0].position(), GpsPoint::new(34.85, -82.40));
        assert_eq!(pois[1].id, "3");
        assert_eq!(pois[1].position(), GpsPoint::new(34.86, -82.41));
    }

    #[test]
    fn test_parse_trail_configs() {
        let json = r##"[
            {"id": "main-trail", "routeId": "50608713", "name": "Swamp Rabbit Trail", "color": "#4CAF50", "type": "main"},
            {"id": "spur", "routeId": "1", "name": "Spur", "color": "#FF9800", "type": "spur",
             "endpoint1": {"latitude": 34.86, "longitude": -82.40}}
        ]"##;
        let configs = parse_trail_configs(json).unwrap();

        assert_eq!(configs.len(), 2);
        assert_eq!(configs[0].route_id, "50608713");
        assert_eq!(configs[0].kind, TrailKind::Main);
        assert_eq!(configs[1].kind, TrailKind::Spur);
        assert_eq!(configs[1].endpoint1, Some(GpsPoint::new(34.86, -82.40)));
    }
}
