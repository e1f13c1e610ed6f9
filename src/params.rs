//! Simulation parameters, validation and live patches.

use alloc::string::String;
use serde::{Deserialize, Serialize};

use crate::error::ParamError;

/// Canonical canvas edge length in pixels.
pub const CANVAS_SIZE: f32 = 512.0;

/// Straight-alpha RGBA colour.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Rgba {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Rgba {
    pub const WHITE: Rgba = Rgba::new(255, 255, 255, 255);
    pub const BLACK: Rgba = Rgba::new(0, 0, 0, 255);

    pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Rgba { r, g, b, a }
    }
}

impl Default for Rgba {
    fn default() -> Self {
        Rgba::WHITE
    }
}

/// What the obstacle looks like.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ObstacleShape {
    /// A single character rendered in `font_family`.
    Glyph { letter: char, font_family: String },
    /// SVG path data (`M`, `L`, `H`, `V`, `C`, `S`, `Q`, `T`, `Z`).
    Path { data: String },
}

impl Default for ObstacleShape {
    fn default() -> Self {
        ObstacleShape::Glyph { letter: 'A', font_family: String::from("sans-serif") }
    }
}

/// Obstacle placement and appearance.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ObstacleParams {
    pub shape: ObstacleShape,
    /// Larger side of the shape's bounding box, in pixels.
    pub size: f32,
    /// Offset of the shape centre from the canvas centre.
    pub offset_x: f32,
    pub offset_y: f32,
    /// Theme-dependent fill colour. Part of the cache key.
    pub color: Rgba,
}

impl Default for ObstacleParams {
    fn default() -> Self {
        ObstacleParams {
            shape: ObstacleShape::default(),
            size: 100.0,
            offset_x: 0.0,
            offset_y: 0.0,
            color: Rgba::WHITE,
        }
    }
}

/// Complete parameter snapshot handed to the core at start/restart.
///
/// # Builder Pattern
/// ```
/// use squishy::params::SimulationParams;
///
/// let params = SimulationParams::new()
///     .with_body_count(20)
///     .with_edge_points(24)
///     .with_gravity(0.05)
///     .with_speed(2.0);
/// assert!(params.validate().is_ok());
/// ```
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationParams {
    pub body_count: usize,
    /// Points on each body's ring. Must be at least 3.
    pub edge_points: usize,
    /// Rest radius every body is created with.
    pub min_body_size: f32,
    /// Extra separation added to the two radii before bodies repel.
    pub repel_distance: f32,
    /// Spring constant per ideal frame.
    pub spring_tension: f32,
    pub interaction_strength: f32,
    /// Added to y velocity each ideal frame (+y is down).
    pub gravity: f32,
    /// Velocity multiplier in (0, 1]. 1.0 = no damping.
    pub damping: f32,
    /// A point may not stray further than `min_body_size * max_expansion`.
    pub max_expansion: f32,
    /// Speed multiplier. Values of 2 and 3 run extra substeps per frame.
    pub speed: f32,
    pub canvas_width: f32,
    pub canvas_height: f32,
    pub container_margin: f32,
    /// Circle container instead of a rectangle.
    pub rounded: bool,
    pub obstacle_enabled: bool,
    pub obstacle: ObstacleParams,
    /// Seed for body placement.
    pub seed: u64,
}

impl SimulationParams {
    pub fn new() -> Self {
        SimulationParams {
            body_count: 12,
            edge_points: 16,
            min_body_size: 24.0,
            repel_distance: 12.0,
            spring_tension: 0.1,
            interaction_strength: 0.8,
            gravity: 0.0,
            damping: 0.9,
            max_expansion: 1.5,
            speed: 1.0,
            canvas_width: CANVAS_SIZE,
            canvas_height: CANVAS_SIZE,
            container_margin: 20.0,
            rounded: false,
            obstacle_enabled: false,
            obstacle: ObstacleParams::default(),
            seed: 0x5EED,
        }
    }

    pub fn with_body_count(mut self, count: usize) -> Self {
        self.body_count = count;
        self
    }

    pub fn with_edge_points(mut self, count: usize) -> Self {
        self.edge_points = count;
        self
    }

    pub fn with_min_body_size(mut self, size: f32) -> Self {
        self.min_body_size = size;
        self
    }

    pub fn with_repel_distance(mut self, distance: f32) -> Self {
        self.repel_distance = distance;
        self
    }

    pub fn with_spring_tension(mut self, tension: f32) -> Self {
        self.spring_tension = tension;
        self
    }

    pub fn with_interaction_strength(mut self, strength: f32) -> Self {
        self.interaction_strength = strength;
        self
    }

    pub fn with_gravity(mut self, gravity: f32) -> Self {
        self.gravity = gravity;
        self
    }

    pub fn with_damping(mut self, damping: f32) -> Self {
        self.damping = damping;
        self
    }

    pub fn with_max_expansion(mut self, factor: f32) -> Self {
        self.max_expansion = factor;
        self
    }

    pub fn with_speed(mut self, speed: f32) -> Self {
        self.speed = speed;
        self
    }

    pub fn with_container(mut self, margin: f32, rounded: bool) -> Self {
        self.container_margin = margin;
        self.rounded = rounded;
        self
    }

    pub fn with_obstacle(mut self, obstacle: ObstacleParams) -> Self {
        self.obstacle_enabled = true;
        self.obstacle = obstacle;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Reject parameters the physics core cannot run with.
    pub fn validate(&self) -> Result<(), ParamError> {
        let floats = [
            ("min_body_size", self.min_body_size),
            ("repel_distance", self.repel_distance),
            ("spring_tension", self.spring_tension),
            ("interaction_strength", self.interaction_strength),
            ("gravity", self.gravity),
            ("damping", self.damping),
            ("max_expansion", self.max_expansion),
            ("speed", self.speed),
            ("canvas_width", self.canvas_width),
            ("canvas_height", self.canvas_height),
            ("container_margin", self.container_margin),
            ("obstacle.size", self.obstacle.size),
            ("obstacle.offset_x", self.obstacle.offset_x),
            ("obstacle.offset_y", self.obstacle.offset_y),
        ];
        if let Some(&(field, _)) = floats.iter().find(|(_, v)| !v.is_finite()) {
            return Err(ParamError::NotFinite { field });
        }
        if self.edge_points < 3 {
            return Err(ParamError::InsufficientEdgePoints { count: self.edge_points });
        }
        if self.min_body_size <= 0.0 {
            return Err(ParamError::InvalidBodySize);
        }
        if self.speed <= 0.0 {
            return Err(ParamError::InvalidSpeed);
        }
        if self.damping <= 0.0 || self.damping > 1.0 {
            return Err(ParamError::InvalidDamping);
        }
        if self.max_expansion < 1.0 {
            return Err(ParamError::InvalidExpansion);
        }
        let half_min = self.canvas_width.min(self.canvas_height) * 0.5;
        if self.container_margin < 0.0 || self.container_margin >= half_min {
            return Err(ParamError::InvalidMargin);
        }
        Ok(())
    }

    /// Clamp out-of-range values instead of rejecting them.
    ///
    /// Non-finite floats fall back to the defaults.
    pub fn sanitized(mut self) -> Self {
        let defaults = SimulationParams::new();
        let fix = |v: f32, d: f32| if v.is_finite() { v } else { d };

        self.edge_points = self.edge_points.max(3);
        self.canvas_width = fix(self.canvas_width, defaults.canvas_width).max(1.0);
        self.canvas_height = fix(self.canvas_height, defaults.canvas_height).max(1.0);
        self.min_body_size = fix(self.min_body_size, defaults.min_body_size).max(0.5);
        self.repel_distance = fix(self.repel_distance, defaults.repel_distance).max(0.0);
        self.spring_tension = fix(self.spring_tension, defaults.spring_tension).max(0.0);
        self.interaction_strength =
            fix(self.interaction_strength, defaults.interaction_strength).max(0.0);
        self.gravity = fix(self.gravity, defaults.gravity);
        self.damping = fix(self.damping, defaults.damping).clamp(0.01, 1.0);
        self.max_expansion = fix(self.max_expansion, defaults.max_expansion).max(1.0);
        self.speed = fix(self.speed, defaults.speed).max(0.1);
        let half_min = self.canvas_width.min(self.canvas_height) * 0.5;
        self.container_margin = fix(self.container_margin, defaults.container_margin)
            .clamp(0.0, (half_min - 1.0).max(0.0));
        self.obstacle.size = fix(self.obstacle.size, defaults.obstacle.size).max(0.0);
        self.obstacle.offset_x = fix(self.obstacle.offset_x, 0.0);
        self.obstacle.offset_y = fix(self.obstacle.offset_y, 0.0);
        self
    }

    /// Write a patch into this snapshot.
    pub fn apply_patch(&mut self, patch: &ParamPatch) {
        match patch {
            ParamPatch::RepelDistance(v) => self.repel_distance = *v,
            ParamPatch::SpringTension(v) => self.spring_tension = *v,
            ParamPatch::InteractionStrength(v) => self.interaction_strength = *v,
            ParamPatch::Gravity(v) => self.gravity = *v,
            ParamPatch::Damping(v) => self.damping = *v,
            ParamPatch::MaxExpansion(v) => self.max_expansion = *v,
            ParamPatch::Speed(v) => self.speed = *v,
            ParamPatch::ContainerMargin(v) => self.container_margin = *v,
            ParamPatch::Rounded(v) => self.rounded = *v,
            ParamPatch::ObstacleEnabled(v) => self.obstacle_enabled = *v,
            ParamPatch::ObstacleColor(c) => self.obstacle.color = *c,
            ParamPatch::BodyCount(v) => self.body_count = *v,
            ParamPatch::EdgePoints(v) => self.edge_points = *v,
            ParamPatch::MinBodySize(v) => self.min_body_size = *v,
            ParamPatch::Obstacle(o) => self.obstacle = o.clone(),
        }
    }
}

impl Default for SimulationParams {
    fn default() -> Self {
        Self::new()
    }
}

/// A single key/value edit arriving while the simulation runs.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "key", content = "value", rename_all = "snake_case")]
pub enum ParamPatch {
    RepelDistance(f32),
    SpringTension(f32),
    InteractionStrength(f32),
    Gravity(f32),
    Damping(f32),
    MaxExpansion(f32),
    Speed(f32),
    ContainerMargin(f32),
    Rounded(bool),
    ObstacleEnabled(bool),
    ObstacleColor(Rgba),
    BodyCount(usize),
    EdgePoints(usize),
    MinBodySize(f32),
    Obstacle(ObstacleParams),
}

impl ParamPatch {
    /// Keys that only take effect after the body set is rebuilt.
    pub fn is_structural(&self) -> bool {
        matches!(
            self,
            ParamPatch::BodyCount(_)
                | ParamPatch::EdgePoints(_)
                | ParamPatch::MinBodySize(_)
                | ParamPatch::Obstacle(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        assert_eq!(SimulationParams::default().validate(), Ok(()));
    }

    #[test]
    fn rejects_too_few_edge_points() {
        let params = SimulationParams::new().with_edge_points(2);
        assert_eq!(
            params.validate(),
            Err(ParamError::InsufficientEdgePoints { count: 2 })
        );
    }

    #[test]
    fn rejects_non_positive_speed_and_nan() {
        assert_eq!(
            SimulationParams::new().with_speed(0.0).validate(),
            Err(ParamError::InvalidSpeed)
        );
        assert_eq!(
            SimulationParams::new().with_gravity(f32::NAN).validate(),
            Err(ParamError::NotFinite { field: "gravity" })
        );
    }

    #[test]
    fn sanitized_clamps_into_valid_range() {
        let params = SimulationParams::new()
            .with_edge_points(0)
            .with_speed(-3.0)
            .with_damping(4.0)
            .with_min_body_size(f32::INFINITY)
            .sanitized();
        assert_eq!(params.validate(), Ok(()));
        assert_eq!(params.edge_points, 3);
        assert_eq!(params.damping, 1.0);
        assert_eq!(params.min_body_size, 24.0);
    }

    #[test]
    fn structural_patches_are_flagged() {
        assert!(ParamPatch::BodyCount(3).is_structural());
        assert!(!ParamPatch::RepelDistance(3.0).is_structural());
        assert!(!ParamPatch::ObstacleColor(Rgba::BLACK).is_structural());
    }
}
