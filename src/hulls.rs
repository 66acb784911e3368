//! Convex hull polygons and label anchors for POI groups.

use log::debug;

use crate::geo_utils::{compute_center, convex_hull, expand_hull_along_bisectors, expand_hull_from_centroid};
use crate::grouping::PoiGroup;
use crate::GpsPoint;

/// How hull vertices are pushed outward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum HullExpansion {
    /// Radially away from the vertex-mean centroid
    #[default]
    FromCentroid,
    /// Along each vertex's exterior angle bisector
    AlongBisectors,
}

/// Configuration for hull generation.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct HullConfig {
    /// Groups with fewer members get no hull
    pub min_members: usize,
    /// Outward buffer in degrees
    pub buffer_degrees: f64,
    pub expansion: HullExpansion,
}

impl Default for HullConfig {
    fn default() -> Self {
        Self {
            min_members: 3,        // a triangle at least
            buffer_degrees: 0.001, // ~100m of latitude
            expansion: HullExpansion::FromCentroid,
        }
    }
}

/// A group's map polygon.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct GroupHull {
    pub group_name: String,
    /// Expanded hull, counter-clockwise
    pub hull_polygon: Vec<GpsPoint>,
    /// Vertex mean of `hull_polygon`
    pub label_anchor: GpsPoint,
}

/// Build hull polygons for every group with at least `config.min_members` POIs.
///
/// Output order follows `groups`. Labels of different hulls may overlap.
///
/// # Example
/// ```
/// use trail_nav::{group_by_primary_tag, hulls_for_groups, HullConfig, Poi};
///
/// let pois = vec![
///     Poi::new("1", "A", [-82.400, 34.850]).with_tag("Food"),
///     Poi::new("2", "B", [-82.398, 34.850]).with_tag("Food"),
///     Poi::new("3", "C", [-82.399, 34.852]).with_tag("Food"),
/// ];
/// let hulls = hulls_for_groups(&group_by_primary_tag(&pois), &HullConfig::default());
/// assert_eq!(hulls.len(), 1);
/// assert_eq!(hulls[0].hull_polygon.len(), 3);
/// ```
pub fn hulls_for_groups(groups: &[PoiGroup], config: &HullConfig) -> Vec<GroupHull> {
    let hulls: Vec<GroupHull> = groups
        .iter()
        .filter(|g| g.len() >= config.min_members)
        .map(|g| group_hull(g, config))
        .collect();

    debug!(
        "[Hulls] {} of {} groups have hulls (min {} members)",
        hulls.len(),
        groups.len(),
        config.min_members
    );

    hulls
}

fn group_hull(group: &PoiGroup, config: &HullConfig) -> GroupHull {
    let hull = convex_hull(&group.positions());
    let hull_polygon = match config.expansion {
        HullExpansion::FromCentroid => expand_hull_from_centroid(&hull, config.buffer_degrees),
        HullExpansion::AlongBisectors => expand_hull_along_bisectors(&hull, config.buffer_degrees),
    };
    let label_anchor = compute_center(&hull_polygon);

    GroupHull {
        group_name: group.name.clone(),
        hull_polygon,
        label_anchor,
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geo_utils::point_in_polygon;
    use crate::{group_by_primary_tag, Poi};

    fn approx_eq(a: f64, b: f64, epsilon: f64) -> bool {
        (a - b).abs() < epsilon
    }

    fn food_pois() -> Vec<Poi> {
        vec![
            Poi::new("1", "A", [-82.400, 34.850]).with_tag("Food"),
            Poi::new("2", "B", [-82.396, 34.850]).with_tag("Food"),
            Poi::new("3", "C", [-82.396, 34.854]).with_tag("Food"),
            Poi::new("4", "D", [-82.400, 34.854]).with_tag("Food"),
            Poi::new("5", "E", [-82.398, 34.852]).with_tag("Food"),
        ]
    }

    #[test]
    fn test_skips_small_groups() {
        let mut pois = food_pois();
        pois.push(Poi::new("6", "F", [-82.39, 34.86]).with_tag("Parks"));
        pois.push(Poi::new("7", "G", [-82.38, 34.86]).with_tag("Parks"));
        let groups = group_by_primary_tag(&pois);

        let hulls = hulls_for_groups(&groups, &HullConfig::default());
        assert_eq!(hulls.len(), 1);
        assert_eq!(hulls[0].group_name, "Food");

        let lenient = HullConfig { min_members: 2, ..HullConfig::default() };
        assert_eq!(hulls_for_groups(&groups, &lenient).len(), 2);
    }

    #[test]
    fn test_hull_excludes_interior_member_and_contains_all() {
        let pois = food_pois();
        let groups = group_by_primary_tag(&pois);
        let hull = &hulls_for_groups(&groups, &HullConfig::default())[0];

        // Square corners only; the centre POI is interior
        assert_eq!(hull.hull_polygon.len(), 4);
        for poi in &pois {
            assert!(point_in_polygon(&poi.position(), &hull.hull_polygon));
        }
    }

    #[test]
    fn test_label_anchor_is_vertex_mean() {
        let groups = group_by_primary_tag(&food_pois());
        let hull = &hulls_for_groups(&groups, &HullConfig::default())[0];

        assert!(approx_eq(hull.label_anchor.latitude, 34.852, 1e-9));
        assert!(approx_eq(hull.label_anchor.longitude, -82.398, 1e-9));
    }

    #[test]
    fn test_bisector_expansion_contains_members() {
        let pois = food_pois();
        let groups = group_by_primary_tag(&pois);
        let config = HullConfig { expansion: HullExpansion::AlongBisectors, ..HullConfig::default() };
        let hull = &hulls_for_groups(&groups, &config)[0];

        assert_eq!(hull.hull_polygon.len(), 4);
        for poi in &pois {
            assert!(point_in_polygon(&poi.position(), &hull.hull_polygon));
        }
    }

    #[test]
    fn test_is_deterministic() {
        let groups = group_by_primary_tag(&food_pois());
        let config = HullConfig::default();
        assert_eq!(hulls_for_groups(&groups, &config), hulls_for_groups(&groups, &config));
    }

    #[test]
    fn test_empty_groups() {
        assert!(hulls_for_groups(&[], &HullConfig::default()).is_empty());
    }
}
