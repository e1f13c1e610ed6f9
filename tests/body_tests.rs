mod common;

use common::{glyphs, params_with_a};
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use squishy::{
    nearby, place, Body, Container, Neighbor, ObstacleGeometry, ObstacleParams, ObstacleShape,
    ShapeCache, ShapeDescriptor, SimulationParams, StepParams, Vec2, VectorSurface,
};

/// Run `ticks` steps over the whole set, checking `check` after every body update.
fn run<F>(
    bodies: &mut Vec<Body<f32>>,
    params: &SimulationParams,
    obstacle: Option<&ObstacleGeometry>,
    ticks: usize,
    mut check: F,
) where
    F: FnMut(&Body<f32>),
{
    let step = StepParams::from_params(params, 1.0);
    let container = Container::from_params(params);
    for _ in 0..ticks {
        for i in 0..bodies.len() {
            let neighbors: Vec<Neighbor<f32>> =
                nearby(&bodies[i], bodies.as_slice()).into_iter().map(Neighbor::of).collect();
            bodies[i].update(&neighbors, &step, &container, obstacle);
            check(&bodies[i]);
        }
    }
}

fn crowded(params: &SimulationParams, seed: u64) -> Vec<Body<f32>> {
    place(params.body_count, params, None, &mut SmallRng::seed_from_u64(seed))
}

fn resolve(params: &SimulationParams) -> std::rc::Rc<ObstacleGeometry> {
    let mut cache = ShapeCache::new();
    let mut surface = VectorSurface::new(glyphs());
    cache.resolve(&ShapeDescriptor::from_params(params), Some(&mut surface))
}

fn assert_within_limit(body: &Body<f32>, limit: f32) {
    let c = body.centroid();
    for p in body.points() {
        let d = p.pos.distance(c);
        assert!(d <= limit + 1e-3, "body {} point at {} > {}", body.id(), d, limit);
    }
}

fn assert_clear_of(body: &Body<f32>, geometry: &ObstacleGeometry) {
    for p in body.points() {
        assert!(
            !geometry.contains(p.pos.x, p.pos.y),
            "body {} point ({}, {}) inside obstacle",
            body.id(),
            p.pos.x,
            p.pos.y
        );
    }
}

fn lively() -> SimulationParams {
    SimulationParams::default()
        .with_body_count(30)
        .with_min_body_size(20.0)
        .with_repel_distance(10.0)
        .with_interaction_strength(1.0)
        .with_gravity(0.3)
}

#[test]
fn points_stay_within_expansion_limit() {
    let params = lively();
    let mut bodies = crowded(&params, 11);
    let limit = params.min_body_size * params.max_expansion;
    run(&mut bodies, &params, None, 300, |body| assert_within_limit(body, limit));
}

#[test]
fn large_obstacle_keeps_expansion_limit() {
    let params = params_with_a(300.0)
        .with_body_count(40)
        .with_min_body_size(20.0)
        .with_interaction_strength(2.0)
        .with_gravity(0.5);
    let geometry = resolve(&params);
    assert!(!geometry.is_empty());

    let limit = params.min_body_size * params.max_expansion;
    let mut rng = SmallRng::seed_from_u64(21);
    let mut bodies = place(params.body_count, &params, Some(&*geometry), &mut rng);
    run(&mut bodies, &params, Some(&*geometry), 600, |body| {
        assert_within_limit(body, limit);
        assert_clear_of(body, &geometry);
    });
}

#[test]
fn obstacle_on_container_floor_is_never_entered() {
    // 600 x 40 strip centred 236 px below the canvas centre: it covers the
    // bottom 20 px of the container and overhangs both side walls.
    let strip = ObstacleParams {
        shape: ObstacleShape::Path { data: "M0 0 H600 V40 H0 Z".into() },
        size: 600.0,
        offset_y: 236.0,
        ..ObstacleParams::default()
    };
    let params = SimulationParams::default()
        .with_body_count(20)
        .with_gravity(0.5)
        .with_obstacle(strip);
    let geometry = resolve(&params);
    assert!(geometry.contains(256.0, 485.0));

    let container = Container::from_params(&params);
    let limit = params.min_body_size * params.max_expansion;
    let mut rng = SmallRng::seed_from_u64(8);
    let mut bodies = place(params.body_count, &params, Some(&*geometry), &mut rng);
    assert!(!bodies.is_empty());
    run(&mut bodies, &params, Some(&*geometry), 600, |body| {
        assert_clear_of(body, &geometry);
        assert_within_limit(body, limit);
        for p in body.points() {
            assert!(container.contains(p.pos, 1e-3), "point {:?} left the container", p.pos);
        }
    });
}

#[test]
fn points_stay_inside_rectangle() {
    let params = lively();
    let mut bodies = crowded(&params, 12);
    run(&mut bodies, &params, None, 300, |body| {
        for p in body.points() {
            assert!(p.pos.x >= 20.0 - 1e-3 && p.pos.x <= 492.0 + 1e-3, "x = {}", p.pos.x);
            assert!(p.pos.y >= 20.0 - 1e-3 && p.pos.y <= 492.0 + 1e-3, "y = {}", p.pos.y);
        }
    });
}

#[test]
fn points_stay_inside_circle() {
    let params = lively().with_container(30.0, true);
    let mut bodies = crowded(&params, 13);
    let centre = Vec2::new(256.0f32, 256.0);
    run(&mut bodies, &params, None, 300, |body| {
        for p in body.points() {
            let d = p.pos.distance(centre);
            assert!(d <= 226.0 + 1e-2, "point {} from centre", d);
        }
    });
}

#[test]
fn points_never_end_inside_obstacle() {
    let params = params_with_a(160.0).with_body_count(25).with_gravity(0.2);
    let geometry = resolve(&params);
    assert!(!geometry.is_empty());

    let mut rng = SmallRng::seed_from_u64(5);
    let mut bodies = place(params.body_count, &params, Some(&*geometry), &mut rng);
    run(&mut bodies, &params, Some(&*geometry), 200, |body| assert_clear_of(body, &geometry));
}

#[test]
fn excluded_neighbours_are_out_of_reach() {
    let mut rng = SmallRng::seed_from_u64(99);
    let bodies: Vec<Body<f32>> = (0..60)
        .map(|i| {
            let c = Vec2::new(rng.gen_range(0.0..512.0), rng.gen_range(0.0..512.0));
            Body::new(i, c, rng.gen_range(4.0..30.0), 8, rng.gen_range(0.0..20.0))
        })
        .collect();

    for a in &bodies {
        let near = nearby(a, &bodies);
        let range = squishy::interaction_range(a);
        for b in &bodies {
            if std::ptr::eq(a, b) {
                assert!(!near.iter().any(|n| std::ptr::eq(*n, b)));
                continue;
            }
            let included = near.iter().any(|n| std::ptr::eq(*n, b));
            let reach = range + b.max_radius();
            let dist = a.centroid().distance(b.centroid());
            if included {
                assert!(dist <= reach + 1e-3);
            } else {
                assert!(dist > reach - 1e-3);
                // Nothing physically significant was dropped.
                assert!(dist >= a.repel_distance + a.max_radius() + b.max_radius());
            }
        }
    }
}
