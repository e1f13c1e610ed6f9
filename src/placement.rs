//! Initial body layout by rejection sampling.

use alloc::vec::Vec as AllocVec;
use rand::Rng;

use crate::body::{Body, BodyId};
use crate::container::Container;
use crate::float::Float;
use crate::params::SimulationParams;
use crate::shape::ObstacleGeometry;
use crate::vec::Vec2;

/// Samples tried per body before it is dropped.
pub const MAX_ATTEMPTS: usize = 50;

/// Place up to `count` bodies.
///
/// The count is split by the obstacle's area ratio into an inside and an
/// outside bucket; each body is sampled uniformly where its rest ring fits
/// inside the container until it lands in its bucket's region and clear of
/// every placed centroid by `min_body_size + repel_distance`. A body that fails
/// [`MAX_ATTEMPTS`] times is skipped. A last pass drops every body whose
/// centroid is inside the obstacle, so with an obstacle the result holds
/// roughly `count * (1 - area_ratio)` bodies spread at uniform density.
///
/// Samples are inset by `min_body_size` from the container edge, so every
/// rest ring starts fully inside the container.
///
/// `obstacle` should be `Some` only when the obstacle is enabled.
pub fn place<F: Float, R: Rng + ?Sized>(
    count: usize,
    params: &SimulationParams,
    obstacle: Option<&ObstacleGeometry>,
    rng: &mut R,
) -> AllocVec<Body<F>> {
    let container = Container::<F>::from_params(params);
    let inside = match obstacle {
        Some(o) => libm::roundf(count as f32 * o.area_ratio()) as usize,
        None => 0,
    }
    .min(count);
    let outside = count - inside;

    let separation = params.min_body_size + params.repel_distance;
    let mut centers: AllocVec<Vec2<f32>> = AllocVec::with_capacity(count);

    for (target, want_inside) in [(inside, true), (outside, false)] {
        for _ in 0..target {
            let sample = (0..MAX_ATTEMPTS).find_map(|_| {
                let p = sample_point(&container, params.min_body_size, rng)?;
                let in_obstacle = obstacle.map_or(false, |o| o.contains(p.x, p.y));
                let clear = centers.iter().all(|c| c.distance_sq(p) >= separation * separation);
                (in_obstacle == want_inside && clear).then_some(p)
            });
            if let Some(p) = sample {
                centers.push(p);
            }
        }
    }

    let placed = centers.len();
    let bodies: AllocVec<Body<F>> = centers
        .into_iter()
        .enumerate()
        .filter(|(_, c)| !obstacle.map_or(false, |o| o.contains(c.x, c.y)))
        .map(|(i, c)| {
            Body::new(
                i as BodyId,
                Vec2::new(F::from_f32(c.x), F::from_f32(c.y)),
                F::from_f32(params.min_body_size),
                params.edge_points,
                F::from_f32(params.repel_distance),
            )
        })
        .collect();

    if bodies.len() < count {
        log::debug!(
            "placed {} of {} bodies ({} sampled, {} inside obstacle)",
            bodies.len(),
            count,
            placed,
            placed - bodies.len()
        );
    }
    bodies
}

/// Uniform point where a body of radius `inset` fits inside the margin
/// bounds. In a rounded container a sample outside the circle is a miss.
fn sample_point<F: Float, R: Rng + ?Sized>(container: &Container<F>, inset: f32, rng: &mut R) -> Option<Vec2<f32>> {
    let (min, max) = container.bounds();
    let x = sample_axis(min.x.to_f32(), max.x.to_f32(), inset, rng);
    let y = sample_axis(min.y.to_f32(), max.y.to_f32(), inset, rng);
    let slack = -inset.min(container.radius().to_f32());
    container
        .contains(Vec2::new(F::from_f32(x), F::from_f32(y)), F::from_f32(slack))
        .then_some(Vec2::new(x, y))
}

fn sample_axis<R: Rng + ?Sized>(lo: f32, hi: f32, inset: f32, rng: &mut R) -> f32 {
    let (lo, hi) = (lo + inset, hi - inset);
    if lo < hi {
        rng.gen_range(lo..=hi)
    } else {
        (lo + hi) * 0.5
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::raster::Raster;
    use crate::path::Outline;
    use crate::params::Rgba;
    use rand::rngs::SmallRng;
    use rand::SeedableRng;

    fn params() -> SimulationParams {
        SimulationParams::default().with_min_body_size(10.0).with_repel_distance(5.0)
    }

    fn centre_square(size: f32) -> ObstacleGeometry {
        let outline = Outline::from_polygon(&[(0.0, 0.0), (1.0, 0.0), (1.0, 1.0), (0.0, 1.0)])
            .fitted(size, Vec2::new(256.0, 256.0))
            .unwrap();
        let mut raster = Raster::new(512, 512);
        raster.fill_outline(&outline, Rgba::BLACK);
        ObstacleGeometry::from_raster(&raster)
    }

    #[test]
    fn bodies_are_separated_and_inside_bounds() {
        let params = params();
        let mut rng = SmallRng::seed_from_u64(7);
        let bodies: AllocVec<Body<f32>> = place(20, &params, None, &mut rng);
        assert_eq!(bodies.len(), 20);
        for (i, a) in bodies.iter().enumerate() {
            let c = a.centroid();
            assert!(c.x >= 20.0 && c.x <= 492.0 && c.y >= 20.0 && c.y <= 492.0);
            for b in &bodies[i + 1..] {
                assert!(c.distance(b.centroid()) >= 15.0 - 1e-3);
            }
        }
    }

    #[test]
    fn same_seed_same_layout() {
        let params = params();
        let a: AllocVec<Body<f32>> = place(8, &params, None, &mut SmallRng::seed_from_u64(42));
        let b: AllocVec<Body<f32>> = place(8, &params, None, &mut SmallRng::seed_from_u64(42));
        let ca: AllocVec<_> = a.iter().map(|x| x.centroid()).collect();
        let cb: AllocVec<_> = b.iter().map(|x| x.centroid()).collect();
        assert_eq!(ca, cb);
    }

    #[test]
    fn crowded_container_places_fewer() {
        let params = SimulationParams::default()
            .with_min_body_size(100.0)
            .with_repel_distance(50.0);
        let bodies: AllocVec<Body<f32>> = place(50, &params, None, &mut SmallRng::seed_from_u64(1));
        assert!(!bodies.is_empty());
        assert!(bodies.len() < 50);
    }

    #[test]
    fn rounded_container_keeps_centroids_in_circle() {
        let params = params().with_container(20.0, true);
        let bodies: AllocVec<Body<f32>> = place(30, &params, None, &mut SmallRng::seed_from_u64(3));
        assert!(!bodies.is_empty());
        for b in &bodies {
            assert!(b.centroid().distance(Vec2::new(256.0, 256.0)) <= 236.0 + 1e-3);
        }
    }

    #[test]
    fn no_centroid_inside_obstacle() {
        let obstacle = centre_square(200.0);
        let params = params();
        let bodies: AllocVec<Body<f32>> = place(40, &params, Some(&obstacle), &mut SmallRng::seed_from_u64(9));
        assert!(!bodies.is_empty());
        for b in &bodies {
            let c = b.centroid();
            assert!(!obstacle.contains(c.x, c.y));
        }
    }

    #[test]
    fn zero_count_is_empty() {
        let bodies: AllocVec<Body<f32>> = place(0, &params(), None, &mut SmallRng::seed_from_u64(0));
        assert!(bodies.is_empty());
    }
}
