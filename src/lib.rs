//! Soft-body blobs that squish against each other, a container and an
//! obstacle shape.
//!
//! `squishy` simulates a set of deformable bodies, each a ring of edge
//! points held in shape by springs. Bodies repel their neighbours, stay
//! inside a rectangular or circular container and are pushed out of an
//! obstacle rasterized from a glyph or SVG path. A [`Scheduler`] drives the
//! set from a host's display frames with adaptive pacing and live edits.
//!
//! # Features
//!
//! - **Blob physics**: springs, pairwise repulsion, gravity and damping
//!   with hard expansion, container and obstacle constraints
//! - **Neighbour culling**: cheap radius check before pairwise work
//! - **Obstacles**: glyph or path shapes rasterized once and cached
//! - **Placement**: seeded rejection sampling with separation
//! - **Scheduling**: start/stop, 30-60 fps pacing, speed substeps, faults
//! - **Observable**: monitor ticks via the `TickObserver` trait
//! - **`no_std` compatible**: works in embedded and WASM environments

#![no_std]

extern crate alloc;

pub mod float;
pub mod vec;
pub mod point;
pub mod body;
pub mod container;
pub mod neighbor;
pub mod path;
pub mod raster;
pub mod shape;
pub mod placement;
pub mod scheduler;
pub mod observer;
pub mod params;
pub mod error;

// Re-export primary API
pub use float::Float;
pub use vec::Vec2;
pub use point::EdgePoint;
pub use body::{Body, BodyId, Neighbor, StepParams};
pub use container::Container;
pub use neighbor::{interaction_range, nearby};
pub use path::Outline;
pub use raster::Raster;
pub use shape::{GlyphOutlines, GlyphTable, NoGlyphs, ObstacleGeometry, RenderSurface, ShapeCache, ShapeDescriptor, VectorSurface};
pub use placement::place;
pub use scheduler::{FrameHandle, FrameHost, PatchEffect, RunState, Scheduler, TickOutcome};
pub use observer::{NoOpTickObserver, TickCounter, TickObserver};
pub use params::{ObstacleParams, ObstacleShape, ParamPatch, Rgba, SimulationParams};
pub use error::{DrawError, ParamError, ShapeError, SimError};
