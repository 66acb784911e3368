//! POI grouping by primary tag, plus the tag/category catalogues used by list views.
//!
//! A POI's group is its first tag (or [`UNGROUPED`](crate::UNGROUPED)). Groups keep
//! first-appearance order and members keep their original relative order, so the
//! output is a pure function of the input slice.

use std::collections::{BTreeSet, HashMap, HashSet};

use crate::geo_utils::haversine_distance;
use crate::projection::{project, ProjectionMode};
use crate::{GpsPoint, Poi, TrailPoint};

/// Default radius for [`cluster_by_proximity`].
pub const DEFAULT_CLUSTER_DISTANCE_METERS: f64 = 50.0;

/// POIs sharing a primary tag.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PoiGroup {
    pub name: String,
    pub members: Vec<Poi>,
}

impl PoiGroup {
    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    pub fn positions(&self) -> Vec<GpsPoint> {
        self.members.iter().map(Poi::position).collect()
    }
}

/// The group member closest (along the trail) to a reference position.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClosestMember {
    /// Index into the group's `members`
    pub member_index: usize,
    /// Along-trail distance of that member's projection
    pub distance_along_trail: f64,
    /// `|member - reference|` along the trail, in meters
    pub distance_meters: f64,
}

/// Group POIs by primary tag.
///
/// # Example
/// ```
/// use trail_nav::{group_by_primary_tag, Poi};
///
/// let pois = vec![
///     Poi::new("1", "Cafe", [-82.40, 34.85]).with_tag("Food"),
///     Poi::new("2", "Bench", [-82.40, 34.86]),
///     Poi::new("3", "Deli", [-82.40, 34.87]).with_tag("Food"),
/// ];
/// let groups = group_by_primary_tag(&pois);
/// assert_eq!(groups[0].name, "Food");
/// assert_eq!(groups[0].members.len(), 2);
/// assert_eq!(groups[1].name, "Ungrouped");
/// ```
pub fn group_by_primary_tag(pois: &[Poi]) -> Vec<PoiGroup> {
    let mut slots: HashMap<&str, usize> = HashMap::new();
    let mut groups: Vec<PoiGroup> = Vec::new();

    for poi in pois {
        let name = poi.primary_tag();
        let slot = *slots.entry(name).or_insert_with(|| {
            groups.push(PoiGroup { name: name.to_string(), members: Vec::new() });
            groups.len() - 1
        });
        groups[slot].members.push(poi.clone());
    }

    groups
}

/// Find the member of `group` whose along-trail position is closest to `reference`'s.
///
/// Uses the closest member rather than the first-listed one, so a single outlier
/// listed first does not skew the group's distance. Returns `None` when the trail or
/// the group is empty.
pub fn closest_member_distance(
    group: &PoiGroup,
    trail_points: &[TrailPoint],
    reference: GpsPoint,
    mode: ProjectionMode,
) -> Option<ClosestMember> {
    let reference_projection = project(reference, trail_points, mode)?;
    closest_member_to(group, trail_points, reference_projection.distance_along_trail(), mode)
}

/// Same as [`closest_member_distance`] with the reference already projected.
pub(crate) fn closest_member_to(
    group: &PoiGroup,
    trail_points: &[TrailPoint],
    reference_distance: f64,
    mode: ProjectionMode,
) -> Option<ClosestMember> {
    let mut best: Option<ClosestMember> = None;

    for (i, poi) in group.members.iter().enumerate() {
        let Some(projection) = project(poi.position(), trail_points, mode) else {
            return None;
        };
        let along = projection.distance_along_trail();
        let distance_meters = (along - reference_distance).abs();

        if best.map_or(true, |b| distance_meters < b.distance_meters) {
            best = Some(ClosestMember {
                member_index: i,
                distance_along_trail: along,
                distance_meters,
            });
        }
    }

    best
}

/// All tag names, in order of first appearance.
pub fn unique_tags(pois: &[Poi]) -> Vec<String> {
    let mut seen: HashSet<&str> = HashSet::new();
    let mut tags = Vec::new();

    for tag in pois.iter().flat_map(|p| &p.tags) {
        if seen.insert(tag.name.as_str()) {
            tags.push(tag.name.clone());
        }
    }

    tags
}

/// Cleaned, deduplicated, sorted category names.
///
/// Upstream categories are often prefixed ("Trail - Food"); only the text after the
/// last dash is kept.
pub fn unique_categories(pois: &[Poi]) -> Vec<String> {
    let mut categories: BTreeSet<String> = BTreeSet::new();

    for category in pois.iter().flat_map(|p| &p.categories) {
        if category.name.is_empty() {
            continue;
        }
        let cleaned = category.name.rsplit('-').next().map(str::trim).unwrap_or("");
        let name = if cleaned.is_empty() { category.name.as_str() } else { cleaned };
        categories.insert(name.to_string());
    }

    categories.into_iter().collect()
}

/// POIs that carry `tag` anywhere in their tag list.
pub fn filter_by_tag<'a>(pois: &'a [Poi], tag: &str) -> Vec<&'a Poi> {
    pois.iter()
        .filter(|p| p.tags.iter().any(|t| t.name == tag))
        .collect()
}

/// Greedy proximity clustering.
///
/// Each unvisited POI seeds a cluster and absorbs every other unvisited POI within
/// `max_distance_meters` of the seed. Clusters are seed-centred, not transitive.
pub fn cluster_by_proximity(pois: &[Poi], max_distance_meters: f64) -> Vec<Vec<Poi>> {
    let mut visited = vec![false; pois.len()];
    let mut clusters = Vec::new();

    for (i, seed) in pois.iter().enumerate() {
        if visited[i] {
            continue;
        }
        visited[i] = true;

        let seed_position = seed.position();
        let mut cluster = vec![seed.clone()];

        for (j, other) in pois.iter().enumerate().skip(i + 1) {
            if visited[j] {
                continue;
            }
            if haversine_distance(&seed_position, &other.position()) <= max_distance_meters {
                visited[j] = true;
                cluster.push(other.clone());
            }
        }

        clusters.push(cluster);
    }

    clusters
}

// ============================================================================
// Tests
// ============================================================================
