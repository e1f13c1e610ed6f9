//! Edge points: the vertices of a blob's ring.

use crate::float::Float;
use crate::vec::Vec2;

/// One vertex of a body's outline, with explicit velocity and a rest pose
/// relative to the body's centroid.
#[derive(Clone, Debug, PartialEq)]
pub struct EdgePoint<F: Float> {
    pub pos: Vec2<F>,
    pub vel: Vec2<F>,
    /// Angle of the undeformed position around the centroid.
    pub rest_angle: F,
    /// Distance of the undeformed position from the centroid.
    pub rest_radius: F,
}

impl<F: Float> EdgePoint<F> {
    /// A point sitting at rest on a circle around `center`.
    pub fn at_rest(center: Vec2<F>, rest_angle: F, rest_radius: F) -> Self {
        EdgePoint {
            pos: center + Vec2::from_angle(rest_angle).scale(rest_radius),
            vel: Vec2::zero(),
            rest_angle,
            rest_radius,
        }
    }

    /// Where the point would sit if the body were undeformed around `center`.
    pub fn rest_position(&self, center: Vec2<F>) -> Vec2<F> {
        center + Vec2::from_angle(self.rest_angle).scale(self.rest_radius)
    }

    pub fn apply_impulse(&mut self, impulse: Vec2<F>) {
        self.vel += impulse;
    }

    /// Damp, then advance position by velocity.
    pub fn integrate(&mut self, damping: F) {
        self.vel = self.vel.scale(damping);
        self.pos += self.vel;
    }

    pub fn is_finite(&self) -> bool {
        self.pos.is_finite() && self.vel.is_finite()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rest_pose_matches_initial_position() {
        let center = Vec2::new(10.0f32, 20.0);
        let p = EdgePoint::at_rest(center, 0.0, 5.0);
        assert_eq!(p.pos, Vec2::new(15.0, 20.0));
        assert_eq!(p.rest_position(center), p.pos);
        assert_eq!(p.vel, Vec2::zero());
    }

    #[test]
    fn integrate_applies_damping_first() {
        let mut p = EdgePoint::at_rest(Vec2::new(0.0f32, 0.0), 0.0, 1.0);
        p.apply_impulse(Vec2::new(2.0, 0.0));
        p.integrate(0.5);
        assert_eq!(p.vel, Vec2::new(1.0, 0.0));
        assert_eq!(p.pos, Vec2::new(2.0, 0.0));
    }
}
