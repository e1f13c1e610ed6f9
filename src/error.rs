//! Error types for parameter validation, shape resolution and ticking.

use alloc::string::String;
use core::fmt;

/// Rejected simulation parameters.
#[derive(Debug, Clone, PartialEq)]
pub enum ParamError {
    /// A float field is NaN or infinite.
    NotFinite { field: &'static str },
    /// Body rings need at least 3 edge points.
    InsufficientEdgePoints { count: usize },
    /// Minimum body size must be positive.
    InvalidBodySize,
    /// Speed multiplier must be positive.
    InvalidSpeed,
    /// Damping must be in (0, 1].
    InvalidDamping,
    /// Max expansion must be at least 1.
    InvalidExpansion,
    /// Margin must be non-negative and leave room inside the canvas.
    InvalidMargin,
}

impl fmt::Display for ParamError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParamError::NotFinite { field } => write!(f, "parameter `{}` must be finite", field),
            ParamError::InsufficientEdgePoints { count } => {
                write!(f, "bodies need at least 3 edge points (got {})", count)
            }
            ParamError::InvalidBodySize => write!(f, "minimum body size must be positive"),
            ParamError::InvalidSpeed => write!(f, "speed multiplier must be positive"),
            ParamError::InvalidDamping => write!(f, "damping must be in (0, 1]"),
            ParamError::InvalidExpansion => write!(f, "max expansion must be at least 1"),
            ParamError::InvalidMargin => write!(f, "container margin must be non-negative and smaller than half the canvas"),
        }
    }
}

/// Failures while turning an obstacle descriptor into a raster.
///
/// These never reach the caller of `ShapeCache::resolve`; they are logged
/// and replaced with empty geometry.
#[derive(Debug, Clone, PartialEq)]
pub enum ShapeError {
    /// No render surface is available.
    SurfaceUnavailable,
    /// Canvas has zero width or height.
    EmptyCanvas,
    /// The glyph provider has no outline for this character.
    MissingGlyph { letter: char },
    /// Path data could not be parsed.
    MalformedPath { offset: usize, reason: &'static str },
    /// The outline has no area.
    DegenerateOutline,
}

impl fmt::Display for ShapeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ShapeError::SurfaceUnavailable => write!(f, "render surface unavailable"),
            ShapeError::EmptyCanvas => write!(f, "canvas has zero size"),
            ShapeError::MissingGlyph { letter } => write!(f, "no outline for glyph {:?}", letter),
            ShapeError::MalformedPath { offset, reason } => {
                write!(f, "malformed path data at byte {}: {}", offset, reason)
            }
            ShapeError::DegenerateOutline => write!(f, "outline has no area"),
        }
    }
}

/// Error returned by a host draw callback.
#[derive(Debug, Clone, PartialEq)]
pub struct DrawError(pub String);

impl fmt::Display for DrawError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "draw failed: {}", self.0)
    }
}

/// What stopped the scheduler.
#[derive(Debug, Clone, PartialEq)]
pub enum SimError {
    /// Parameters failed validation before reaching the physics core.
    InvalidParams(ParamError),
    /// The draw callback failed during a tick.
    Draw(DrawError),
    /// A body produced a NaN or infinite position.
    NonFinite { body: u32 },
}

impl fmt::Display for SimError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SimError::InvalidParams(e) => write!(f, "invalid parameters: {}", e),
            SimError::Draw(e) => write!(f, "{}", e),
            SimError::NonFinite { body } => write!(f, "body {} diverged to a non-finite position", body),
        }
    }
}

impl From<ParamError> for SimError {
    fn from(e: ParamError) -> Self {
        SimError::InvalidParams(e)
    }
}

impl From<DrawError> for SimError {
    fn from(e: DrawError) -> Self {
        SimError::Draw(e)
    }
}
