//! Deformable blobs: a ring of edge points held in shape by springs.

use alloc::vec::Vec as AllocVec;

use crate::container::Container;
use crate::float::Float;
use crate::params::SimulationParams;
use crate::point::EdgePoint;
use crate::shape::ObstacleGeometry;
use crate::vec::Vec2;

/// Stable identity of a body within one body set.
pub type BodyId = u32;

/// Re-clamp passes after the centroid moves.
const SETTLE_PASSES: usize = 24;

/// Slack on the expansion limit before a point counts as outside it.
const SETTLE_TOLERANCE: f32 = 5e-4;

/// Compass directions tried when the straight way out of the obstacle
/// leaves the container.
const ESCAPE_DIRECTIONS: usize = 16;

/// What a body needs to know about another body to be repelled by it.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Neighbor<F: Float> {
    pub id: BodyId,
    pub centroid: Vec2<F>,
    pub max_radius: F,
}

impl<F: Float> Neighbor<F> {
    pub fn of(body: &Body<F>) -> Self {
        Neighbor { id: body.id, centroid: body.centroid, max_radius: body.max_radius }
    }
}

/// Per-step force constants. `tension` is already scaled by the frame's
/// time factor.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct StepParams<F: Float> {
    pub tension: F,
    pub interaction_strength: F,
    pub max_expansion: F,
    pub gravity: F,
    pub damping: F,
}

impl<F: Float> StepParams<F> {
    /// Constants for one substep; `time_scale` is elapsed / ideal frame time.
    pub fn from_params(params: &SimulationParams, time_scale: F) -> Self {
        StepParams {
            tension: F::from_f32(params.spring_tension) * time_scale,
            interaction_strength: F::from_f32(params.interaction_strength),
            max_expansion: F::from_f32(params.max_expansion),
            gravity: F::from_f32(params.gravity),
            damping: F::from_f32(params.damping),
        }
    }
}

/// A soft blob: centroid plus a ring of edge points in angular order.
#[derive(Clone, Debug)]
pub struct Body<F: Float> {
    id: BodyId,
    centroid: Vec2<F>,
    points: AllocVec<EdgePoint<F>>,
    base_radius: F,
    /// Hot-patchable; see `Scheduler::apply`.
    pub repel_distance: F,
    max_radius: F,
}

impl<F: Float> Body<F> {
    /// An undeformed ring of `edge_points` points at `radius` around `center`.
    pub fn new(id: BodyId, center: Vec2<F>, radius: F, edge_points: usize, repel_distance: F) -> Self {
        let n = edge_points.max(3);
        let step = F::tau() / F::from_usize(n);
        let points = (0..n)
            .map(|i| EdgePoint::at_rest(center, step * F::from_usize(i), radius))
            .collect();
        Body {
            id,
            centroid: center,
            points,
            base_radius: radius,
            repel_distance,
            max_radius: radius,
        }
    }

    pub fn id(&self) -> BodyId { self.id }
    pub fn centroid(&self) -> Vec2<F> { self.centroid }
    /// Furthest edge point from the centroid as of the last step.
    pub fn max_radius(&self) -> F { self.max_radius }
    pub fn base_radius(&self) -> F { self.base_radius }
    pub fn points(&self) -> &[EdgePoint<F>] { &self.points }
    pub fn point_count(&self) -> usize { self.points.len() }

    /// Edge point positions in ring order, for drawing.
    pub fn outline(&self) -> AllocVec<Vec2<F>> {
        self.points.iter().map(|p| p.pos).collect()
    }

    /// Advance one physics step.
    ///
    /// Springs pull each point toward its rest pose around the current
    /// centroid, neighbours push the body away along the centroid axis,
    /// then gravity and damping apply and positions integrate. After that
    /// the expansion limit, the container and the obstacle are enforced as
    /// hard positional constraints, in that order. A point leaving the
    /// obstacle is only ever placed inside the container.
    ///
    /// A neighbour carrying this body's own id is ignored.
    pub fn update(
        &mut self,
        neighbors: &[Neighbor<F>],
        step: &StepParams<F>,
        container: &Container<F>,
        obstacle: Option<&ObstacleGeometry>,
    ) {
        let center = self.centroid;
        let limit = self.base_radius * step.max_expansion;
        let push = self.repulsion(neighbors, step.interaction_strength);

        // Springs are internal: removing their mean keeps them from
        // translating the body.
        let n = F::from_usize(self.points.len());
        let mut mean_pull = Vec2::zero();
        for p in &self.points {
            mean_pull += p.rest_position(center) - p.pos;
        }
        mean_pull = mean_pull.scale(F::one() / n);

        for p in self.points.iter_mut() {
            let pull = p.rest_position(center) - p.pos - mean_pull;
            p.apply_impulse(pull.scale(step.tension) + push);
            p.vel.y = p.vel.y + step.gravity;
            p.integrate(step.damping);

            limit_expansion(p, center, limit);
            container.confine(&mut p.pos, &mut p.vel);
            if let Some(obstacle) = obstacle {
                escape_obstacle(p, obstacle, container);
            }
        }

        self.settle(limit, container, obstacle);
    }

    /// Summed repulsion from every neighbour closer than
    /// `repel_distance + both max radii`.
    fn repulsion(&self, neighbors: &[Neighbor<F>], strength: F) -> Vec2<F> {
        let mut push = Vec2::zero();
        for other in neighbors {
            if other.id == self.id {
                continue;
            }
            let range = self.repel_distance + self.max_radius + other.max_radius;
            if range <= F::zero() {
                continue;
            }
            let offset = self.centroid - other.centroid;
            let dist_sq = offset.length_sq();
            if dist_sq >= range * range {
                continue;
            }
            let dist = dist_sq.sqrt();
            let axis = if dist.is_near_zero(F::from_f32(1e-6)) {
                // Coincident centroids: split the pair along x by id.
                if self.id < other.id { Vec2::new(-F::one(), F::zero()) } else { Vec2::new(F::one(), F::zero()) }
            } else {
                offset.scale(F::one() / dist)
            };
            push += axis.scale(strength * (F::one() - dist / range));
        }
        push
    }

    /// Recompute the centroid, re-apply the expansion limit around it, and
    /// publish `max_radius`. A point whose clamped spot is covered by the
    /// obstacle goes to the nearest free spot inside the limit instead.
    fn settle(&mut self, limit: F, container: &Container<F>, obstacle: Option<&ObstacleGeometry>) {
        let tolerance = F::from_f32(SETTLE_TOLERANCE);
        for _ in 0..SETTLE_PASSES {
            self.centroid = self.mean_position();
            let center = self.centroid;
            let mut moved = false;
            for p in self.points.iter_mut() {
                let offset = p.pos - center;
                if offset.length() <= limit + tolerance {
                    continue;
                }
                let clamped = center + offset.clamp_length(limit);
                p.pos = match obstacle {
                    // Whole disc covered: the limit wins.
                    Some(o) => free_within(center, clamped, limit, container, o).unwrap_or(clamped),
                    None => clamped,
                };
                moved = true;
            }
            if !moved {
                break;
            }
        }
        self.centroid = self.mean_position();
        let center = self.centroid;
        self.max_radius = self
            .points
            .iter()
            .map(|p| p.pos.distance(center))
            .fold(F::zero(), |a, b| a.max(b));
    }

    fn mean_position(&self) -> Vec2<F> {
        if self.points.is_empty() {
            return self.centroid;
        }
        let mut sum = Vec2::zero();
        for p in &self.points {
            sum += p.pos;
        }
        sum.scale(F::one() / F::from_usize(self.points.len()))
    }

    /// Area enclosed by the ring (shoelace formula).
    pub fn area(&self) -> F {
        let n = self.points.len();
        if n < 3 {
            return F::zero();
        }
        let mut sum = F::zero();
        for i in 0..n {
            let a = self.points[i].pos;
            let b = self.points[(i + 1) % n].pos;
            sum = sum + (a.x * b.y - b.x * a.y);
        }
        (sum * F::half()).abs()
    }

    /// Whether `point` is inside the ring (ray casting).
    pub fn contains(&self, point: Vec2<F>) -> bool {
        let n = self.points.len();
        if n < 3 {
            return false;
        }
        let mut inside = false;
        let mut j = n - 1;
        for i in 0..n {
            let pi = self.points[i].pos;
            let pj = self.points[j].pos;
            let dy = pj.y - pi.y;
            if !dy.is_near_zero(F::from_f32(1e-10))
                && ((pi.y > point.y) != (pj.y > point.y))
                && (point.x < (pj.x - pi.x) * (point.y - pi.y) / dy + pi.x)
            {
                inside = !inside;
            }
            j = i;
        }
        inside
    }

    /// False once any coordinate has become NaN or infinite.
    pub fn is_finite(&self) -> bool {
        self.centroid.is_finite() && self.points.iter().all(EdgePoint::is_finite)
    }
}

/// Pull `p` back to `limit` from `center`, dropping outward velocity.
fn limit_expansion<F: Float>(p: &mut EdgePoint<F>, center: Vec2<F>, limit: F) {
    let offset = p.pos - center;
    let dist_sq = offset.length_sq();
    if dist_sq <= limit * limit {
        return;
    }
    let normal = offset.normalize();
    p.pos = center + normal.scale(limit);
    let outward = p.vel.dot(normal);
    if outward > F::zero() {
        p.vel -= normal.scale(outward);
    }
}

fn blocked<F: Float>(obstacle: &ObstacleGeometry, q: Vec2<F>) -> bool {
    obstacle.contains(q.x.to_f32(), q.y.to_f32())
}

/// Move `p` out of the obstacle to a spot inside the container, stopping
/// its motion. Marches away from the obstacle centre first; if that runs
/// out of the container, takes the shortest way out among
/// [`ESCAPE_DIRECTIONS`] compass directions. Returns true if the point moved.
fn escape_obstacle<F: Float>(p: &mut EdgePoint<F>, obstacle: &ObstacleGeometry, container: &Container<F>) -> bool {
    if !blocked(obstacle, p.pos) {
        return false;
    }
    let max_steps = obstacle.width() + obstacle.height();
    let center = obstacle.center();
    let radial = (p.pos - Vec2::new(F::from_f32(center.x), F::from_f32(center.y))).normalize();
    let radial = if radial == Vec2::zero() { Vec2::new(F::one(), F::zero()) } else { radial };

    let mut best = march_out(p.pos, radial, max_steps, obstacle, container);
    if best.is_none() {
        let turn = F::tau() / F::from_usize(ESCAPE_DIRECTIONS);
        for i in 0..ESCAPE_DIRECTIONS {
            let dir = Vec2::from_angle(turn * F::from_usize(i));
            if let Some((steps, pos)) = march_out(p.pos, dir, max_steps, obstacle, container) {
                if best.map_or(true, |(fewest, _)| steps < fewest) {
                    best = Some((steps, pos));
                }
            }
        }
    }
    match best {
        Some((_, pos)) => {
            p.pos = pos;
            p.vel = Vec2::zero();
            true
        }
        None => false,
    }
}

/// Step 1 px at a time along `dir` until clear of the obstacle. `None` if
/// the container is left first.
fn march_out<F: Float>(
    start: Vec2<F>,
    dir: Vec2<F>,
    max_steps: usize,
    obstacle: &ObstacleGeometry,
    container: &Container<F>,
) -> Option<(usize, Vec2<F>)> {
    for step in 1..=max_steps {
        let pos = start + dir.scale(F::from_usize(step));
        if !container.contains(pos, F::zero()) {
            return None;
        }
        if !blocked(obstacle, pos) {
            return Some((step, pos));
        }
    }
    None
}

/// Closest unobstructed spot to `target` (which sits on the limit circle)
/// that is within `limit` of `center` and inside the container. Walks from
/// `target` toward `center`, then around the circle in both directions.
fn free_within<F: Float>(
    center: Vec2<F>,
    target: Vec2<F>,
    limit: F,
    container: &Container<F>,
    obstacle: &ObstacleGeometry,
) -> Option<Vec2<F>> {
    if !blocked(obstacle, target) {
        return Some(target);
    }
    let inward = center - target;
    let span = inward.length();
    let dir = inward.normalize();
    let mut step = 1;
    while F::from_usize(step) < span {
        let q = target + dir.scale(F::from_usize(step));
        if !blocked(obstacle, q) {
            return Some(q);
        }
        step += 1;
    }

    let radial = -dir;
    let turn = F::tau() / F::from_usize(ESCAPE_DIRECTIONS * 4);
    for i in 1..=ESCAPE_DIRECTIONS * 2 {
        for sign in [F::one(), -F::one()] {
            let angle = turn * F::from_usize(i) * sign;
            let (sin, cos) = (angle.sin(), angle.cos());
            let rotated = Vec2::new(radial.x * cos - radial.y * sin, radial.x * sin + radial.y * cos);
            let q = center + rotated.scale(limit);
            if container.contains(q, F::zero()) && !blocked(obstacle, q) {
                return Some(q);
            }
        }
    }
    None
}
