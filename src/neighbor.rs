//! Broad-phase culling: which bodies are close enough to interact.

use alloc::vec::Vec as AllocVec;

use crate::body::Body;
use crate::float::Float;

/// Search radius around `body`, before adding the other body's radius.
///
/// Three times the current radius leaves headroom for deformation during
/// the step, so fast-growing bodies are not missed.
pub fn interaction_range<F: Float>(body: &Body<F>) -> F {
    body.max_radius() * F::from_f32(3.0) + body.repel_distance
}

/// Bodies in `all` that may interact with `body`, excluding `body` itself.
///
/// `other` is included iff the squared centroid distance is at most
/// `(interaction_range(body) + other.max_radius())²`. Self-exclusion is by
/// address, so a distinct body at the same position is still returned.
pub fn nearby<'a, F: Float>(body: &Body<F>, all: &'a [Body<F>]) -> AllocVec<&'a Body<F>> {
    let range = interaction_range(body);
    let center = body.centroid();
    all.iter()
        .filter(|other| !core::ptr::eq(*other, body))
        .filter(|other| {
            let reach = range + other.max_radius();
            other.centroid().distance_sq(center) <= reach * reach
        })
        .collect()
}
