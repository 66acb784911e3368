//! Walk a short stretch of trail and print what is ahead and behind.
//!
//! Run with: RUST_LOG=debug cargo run --example trail_walkthrough

use trail_nav::{
    find_nearest_trail_point, group_by_primary_tag, hulls_for_groups, parse_pois, parse_route,
    partition, GpsPoint, HullConfig, MotionSimulator, NavConfig, SimulationConfig,
    SimulationEvent, TravelDirection,
};

const ROUTE: &str = r#"{"route": {"distance": 1112.0, "track_points": [
    {"x": -82.4000, "y": 34.8500, "d": 0.0},
    {"x": -82.4000, "y": 34.8520},
    {"x": -82.4000, "y": 34.8540},
    {"x": -82.4000, "y": 34.8560},
    {"x": -82.4000, "y": 34.8580},
    {"x": -82.4000, "y": 34.8600}
]}}"#;

const POIS: &str = r#"[
    {"id": 1, "title": {"rendered": "Swamp Rabbit Cafe"}, "coordinates": [-82.4005, 34.8515],
     "post_tags": [{"id": 1, "name": "Food"}]},
    {"id": 2, "title": {"rendered": "Grocery Deli"}, "coordinates": [-82.3995, 34.8525],
     "post_tags": [{"id": 1, "name": "Food"}]},
    {"id": 3, "title": {"rendered": "Bakery"}, "coordinates": [-82.4002, 34.8535],
     "post_tags": [{"id": 1, "name": "Food"}]},
    {"id": 4, "title": {"rendered": "Brewery"}, "latitude": "34.8590", "longitude": "-82.4003",
     "post_tags": [{"id": 2, "name": "Drink"}]},
    {"id": 5, "title": "Bench", "coordinates": [-82.4001, 34.8550]}
]"#;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    let route = parse_route(ROUTE)?;
    let pois = parse_pois(POIS)?;
    let groups = group_by_primary_tag(&pois);

    println!("Trail Walkthrough\n");
    println!("Route: {} points, {:.0}m", route.points.len(), route.total_distance_meters);
    println!("POIs: {} in {} groups\n", pois.len(), groups.len());

    // Where are we?
    let here = GpsPoint::new(34.8541, -82.4001);
    if let Some(projection) = find_nearest_trail_point(here, &route.points) {
        println!("1. Projected position:");
        println!("   Index: {}", projection.index_on_trail);
        println!("   Off trail: {:.1}m", projection.distance_to_trail);
        println!("   Along trail: {:.0}m\n", projection.distance_along_trail());
    }

    // Ahead and behind, both directions
    let config = NavConfig::default();
    for direction in [TravelDirection::Forward, TravelDirection::Backward] {
        let result = partition(&groups, &route.points, here, direction, &config);
        println!("2. Heading {:?}:", direction);
        for group in &result.ahead {
            println!("   ahead  {:<10} {:>5.0}m  {:>4.0}s", group.name, group.distance_meters, group.eta_seconds);
        }
        for group in &result.behind {
            println!("   behind {:<10} {:>5.0}m  {:>4.0}s", group.name, group.distance_meters, group.eta_seconds);
        }
        if let Some(next) = result.next_destination() {
            println!("   Next up: {}", next.name);
        }
        println!();
    }

    // Map polygons
    println!("3. Hulls:");
    for hull in hulls_for_groups(&groups, &HullConfig::default()) {
        println!(
            "   {}: {} vertices, label at ({:.5}, {:.5})",
            hull.group_name,
            hull.hull_polygon.len(),
            hull.label_anchor.latitude,
            hull.label_anchor.longitude
        );
    }
    println!();

    // Simulated walk, 5 seconds per frame
    println!("4. Simulation:");
    let mut sim = MotionSimulator::new(route.points.clone(), SimulationConfig::default())
        .ok_or("route has no points")?;
    sim.subscribe(|event| {
        if let SimulationEvent::Finished { index } = event {
            println!("   Finished at index {}", index);
        }
    });

    sim.play();
    let mut frames = 0;
    while let Some(position) = sim.advance(5.0) {
        frames += 1;
        if frames % 5 == 0 {
            println!("   t={:>3}s  ({:.5}, {:.5})", frames * 5, position.latitude, position.longitude);
        }
        if !sim.state().is_playing {
            break;
        }
    }

    Ok(())
}
