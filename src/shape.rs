//! Obstacle occupancy: rasterize a glyph or path once, then answer
//! point-in-shape queries from the cached mask.

use alloc::rc::Rc;
use alloc::vec;
use alloc::vec::Vec as AllocVec;

use crate::error::ShapeError;
use crate::params::{ObstacleShape, Rgba, SimulationParams};
use crate::path::Outline;
use crate::raster::Raster;
use crate::vec::Vec2;

/// Everything that determines an obstacle's pixels. Doubles as the cache key.
#[derive(Clone, Debug, PartialEq)]
pub struct ShapeDescriptor {
    pub shape: ObstacleShape,
    pub size: f32,
    pub offset: Vec2<f32>,
    pub color: Rgba,
    pub canvas_width: usize,
    pub canvas_height: usize,
}

impl ShapeDescriptor {
    pub fn from_params(params: &SimulationParams) -> Self {
        let o = &params.obstacle;
        ShapeDescriptor {
            shape: o.shape.clone(),
            size: o.size,
            offset: Vec2::new(o.offset_x, o.offset_y),
            color: o.color,
            canvas_width: params.canvas_width.max(0.0) as usize,
            canvas_height: params.canvas_height.max(0.0) as usize,
        }
    }

    /// Where the shape's bounding box is centred on the canvas.
    pub fn center(&self) -> Vec2<f32> {
        Vec2::new(
            self.canvas_width as f32 * 0.5 + self.offset.x,
            self.canvas_height as f32 * 0.5 + self.offset.y,
        )
    }

    /// Nothing to draw: blank glyph, empty path or zero size.
    pub fn is_degenerate(&self) -> bool {
        let blank = match &self.shape {
            ObstacleShape::Glyph { letter, .. } => letter.is_whitespace() || letter.is_control(),
            ObstacleShape::Path { data } => data.trim().is_empty(),
        };
        blank || !(self.size > 0.0)
    }
}

/// Resolved occupancy mask for one obstacle.
#[derive(Clone, Debug, PartialEq)]
pub struct ObstacleGeometry {
    width: usize,
    height: usize,
    bits: AllocVec<u64>,
    occupied: usize,
    center: Vec2<f32>,
}

impl ObstacleGeometry {
    /// Geometry that contains nothing.
    pub fn empty(width: usize, height: usize) -> Self {
        ObstacleGeometry {
            width,
            height,
            bits: AllocVec::new(),
            occupied: 0,
            center: Vec2::new(width as f32 * 0.5, height as f32 * 0.5),
        }
    }

    /// Sample every pixel: occupied iff any channel is non-zero.
    pub fn from_raster(raster: &Raster) -> Self {
        let (width, height) = (raster.width(), raster.height());
        let mut bits = vec![0u64; (width * height + 63) / 64];
        let mut occupied = 0;
        let (mut min_x, mut min_y) = (usize::MAX, usize::MAX);
        let (mut max_x, mut max_y) = (0usize, 0usize);

        for (idx, px) in raster.pixels().chunks_exact(4).enumerate() {
            if px.iter().all(|&c| c == 0) {
                continue;
            }
            bits[idx >> 6] |= 1u64 << (idx & 63);
            occupied += 1;
            let (x, y) = (idx % width, idx / width);
            min_x = min_x.min(x);
            min_y = min_y.min(y);
            max_x = max_x.max(x);
            max_y = max_y.max(y);
        }

        if occupied == 0 {
            return Self::empty(width, height);
        }
        let center = Vec2::new(
            (min_x + max_x + 1) as f32 * 0.5,
            (min_y + max_y + 1) as f32 * 0.5,
        );
        ObstacleGeometry { width, height, bits, occupied, center }
    }

    /// Point-in-shape test. Anything off the canvas is unoccupied.
    pub fn contains(&self, x: f32, y: f32) -> bool {
        if self.occupied == 0 || !(x >= 0.0) || !(y >= 0.0) {
            return false;
        }
        let (px, py) = (x as usize, y as usize);
        if px >= self.width || py >= self.height {
            return false;
        }
        let idx = py * self.width + px;
        (self.bits[idx >> 6] & (1u64 << (idx & 63))) != 0
    }

    /// Centre of the occupied bounding box.
    pub fn center(&self) -> Vec2<f32> { self.center }

    /// Occupied pixels over total pixels.
    pub fn area_ratio(&self) -> f32 {
        let total = self.width * self.height;
        if total == 0 {
            0.0
        } else {
            self.occupied as f32 / total as f32
        }
    }

    pub fn occupied_pixels(&self) -> usize { self.occupied }
    pub fn is_empty(&self) -> bool { self.occupied == 0 }
    pub fn width(&self) -> usize { self.width }
    pub fn height(&self) -> usize { self.height }
}

/// Something that can paint an obstacle into an offscreen buffer.
pub trait RenderSurface {
    fn rasterize(&mut self, descriptor: &ShapeDescriptor) -> Result<Raster, ShapeError>;
}

/// Source of glyph outlines, typically backed by the host's font loader.
///
/// Outlines may be in any unit; they are refit to the descriptor's size.
pub trait GlyphOutlines {
    fn glyph(&self, letter: char, font_family: &str) -> Option<Outline>;
}

/// Provides no glyphs; glyph obstacles resolve to empty geometry.
pub struct NoGlyphs;

impl GlyphOutlines for NoGlyphs {
    fn glyph(&self, _letter: char, _font_family: &str) -> Option<Outline> {
        None
    }
}

/// Glyph outlines registered up front, regardless of font family.
#[derive(Clone, Debug, Default)]
pub struct GlyphTable {
    glyphs: AllocVec<(char, Outline)>,
}

impl GlyphTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_glyph(mut self, letter: char, outline: Outline) -> Self {
        self.glyphs.retain(|(c, _)| *c != letter);
        self.glyphs.push((letter, outline));
        self
    }
}

impl GlyphOutlines for GlyphTable {
    fn glyph(&self, letter: char, _font_family: &str) -> Option<Outline> {
        self.glyphs.iter().find(|(c, _)| *c == letter).map(|(_, o)| o.clone())
    }
}

/// Software surface: paths are parsed and filled directly, glyphs go through
/// a [`GlyphOutlines`] provider first.
pub struct VectorSurface<G: GlyphOutlines> {
    glyphs: G,
}

impl<G: GlyphOutlines> VectorSurface<G> {
    pub fn new(glyphs: G) -> Self {
        VectorSurface { glyphs }
    }
}

impl<G: GlyphOutlines> RenderSurface for VectorSurface<G> {
    fn rasterize(&mut self, descriptor: &ShapeDescriptor) -> Result<Raster, ShapeError> {
        if descriptor.canvas_width == 0 || descriptor.canvas_height == 0 {
            return Err(ShapeError::EmptyCanvas);
        }
        let outline = match &descriptor.shape {
            ObstacleShape::Glyph { letter, font_family } => self
                .glyphs
                .glyph(*letter, font_family)
                .ok_or(ShapeError::MissingGlyph { letter: *letter })?,
            ObstacleShape::Path { data } => Outline::parse(data)?,
        };
        if outline.is_empty() {
            return Err(ShapeError::DegenerateOutline);
        }
        let fitted = outline.fitted(descriptor.size, descriptor.center())?;
        let mut raster = Raster::new(descriptor.canvas_width, descriptor.canvas_height);
        raster.fill_outline(&fitted, descriptor.color);
        Ok(raster)
    }
}

/// Memoizes resolved obstacles by exact descriptor equality.
///
/// There is no eviction: entries live until [`ShapeCache::invalidate`] or
/// [`ShapeCache::clear`]. A colour change must invalidate, since colour
/// affects edge coverage.
#[derive(Default)]
pub struct ShapeCache {
    entries: AllocVec<(ShapeDescriptor, Rc<ObstacleGeometry>)>,
    rasterizations: usize,
}

impl ShapeCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cached geometry for `descriptor`, rasterizing on a miss.
    ///
    /// Never fails: degenerate descriptors, a missing surface and rasterizer
    /// errors all yield empty geometry, which is not cached.
    pub fn resolve(
        &mut self,
        descriptor: &ShapeDescriptor,
        surface: Option<&mut dyn RenderSurface>,
    ) -> Rc<ObstacleGeometry> {
        if let Some(hit) = self.get(descriptor) {
            log::debug!("shape cache hit for {:?}", descriptor.shape);
            return hit;
        }
        let empty = || Rc::new(ObstacleGeometry::empty(descriptor.canvas_width, descriptor.canvas_height));
        if descriptor.is_degenerate() {
            return empty();
        }
        let Some(surface) = surface else {
            log::warn!("obstacle disabled: {}", ShapeError::SurfaceUnavailable);
            return empty();
        };

        self.rasterizations += 1;
        match surface.rasterize(descriptor) {
            Ok(raster) => {
                let geometry = Rc::new(ObstacleGeometry::from_raster(&raster));
                log::debug!(
                    "rasterized obstacle {:?}: {} px, area ratio {:.4}",
                    descriptor.shape,
                    geometry.occupied_pixels(),
                    geometry.area_ratio()
                );
                self.entries.push((descriptor.clone(), geometry.clone()));
                geometry
            }
            Err(e) => {
                log::warn!("obstacle disabled: {}", e);
                empty()
            }
        }
    }

    pub fn get(&self, descriptor: &ShapeDescriptor) -> Option<Rc<ObstacleGeometry>> {
        self.entries
            .iter()
            .find(|(key, _)| key == descriptor)
            .map(|(_, g)| g.clone())
    }

    /// Drop the entry for `descriptor`. Returns whether one existed.
    pub fn invalidate(&mut self, descriptor: &ShapeDescriptor) -> bool {
        let before = self.entries.len();
        self.entries.retain(|(key, _)| key != descriptor);
        before != self.entries.len()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize { self.entries.len() }
    pub fn is_empty(&self) -> bool { self.entries.is_empty() }

    /// How many times a surface has been asked to rasterize.
    pub fn rasterizations(&self) -> usize { self.rasterizations }
}
