#![allow(dead_code)]

use std::cell::Cell;
use std::rc::Rc;

use squishy::{
    FrameHandle, FrameHost, GlyphTable, ObstacleParams, ObstacleShape, Outline, Raster,
    RenderSurface, ShapeDescriptor, ShapeError, SimulationParams, VectorSurface,
};

/// Block capital "A" on a 100 unit em square, counter wound the other way.
pub const GLYPH_A: &str =
    "M0 100 L40 0 L60 0 L100 100 L80 100 L70 75 L30 75 L20 100 Z M35 60 L65 60 L50 22 Z";

pub fn glyphs() -> GlyphTable {
    GlyphTable::new().with_glyph('A', Outline::parse(GLYPH_A).unwrap())
}

pub fn glyph_a(size: f32) -> ObstacleParams {
    ObstacleParams {
        shape: ObstacleShape::Glyph { letter: 'A', font_family: "sans-serif".into() },
        size,
        ..ObstacleParams::default()
    }
}

/// Default params with the "A" obstacle enabled.
pub fn params_with_a(size: f32) -> SimulationParams {
    SimulationParams::default().with_obstacle(glyph_a(size))
}

/// Vector surface that counts how often it is asked to rasterize.
pub struct CountingSurface {
    inner: VectorSurface<GlyphTable>,
    pub calls: Rc<Cell<usize>>,
}

impl CountingSurface {
    pub fn new() -> Self {
        CountingSurface { inner: VectorSurface::new(glyphs()), calls: Rc::new(Cell::new(0)) }
    }
}

impl RenderSurface for CountingSurface {
    fn rasterize(&mut self, descriptor: &ShapeDescriptor) -> Result<Raster, ShapeError> {
        self.calls.set(self.calls.get() + 1);
        self.inner.rasterize(descriptor)
    }
}

/// Frame host double: hands out increasing handles and tracks which are live.
#[derive(Default)]
pub struct TestHost {
    next: u64,
    pub live: Vec<FrameHandle>,
    pub requested: usize,
    pub cancelled: usize,
    pub surface_lost: bool,
}

impl FrameHost for TestHost {
    fn request_frame(&mut self) -> FrameHandle {
        self.next += 1;
        self.requested += 1;
        let handle = FrameHandle(self.next);
        self.live.push(handle);
        handle
    }

    fn cancel_frame(&mut self, handle: FrameHandle) {
        self.live.retain(|h| *h != handle);
        self.cancelled += 1;
    }

    fn surface_ready(&self) -> bool {
        !self.surface_lost
    }
}
