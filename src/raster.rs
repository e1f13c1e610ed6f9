//! Offscreen RGBA buffer with an anti-aliased polygon filler.

use alloc::vec;
use alloc::vec::Vec as AllocVec;
use core::cmp::Ordering;

use crate::params::Rgba;
use crate::path::Outline;

/// Sub-scanlines per pixel row.
const SUBSAMPLES: usize = 4;

/// Premultiplied RGBA pixels, row-major, top-left origin.
#[derive(Clone, Debug, PartialEq)]
pub struct Raster {
    width: usize,
    height: usize,
    pixels: AllocVec<u8>,
}

impl Raster {
    /// A fully transparent raster.
    pub fn new(width: usize, height: usize) -> Self {
        Raster { width, height, pixels: vec![0; width * height * 4] }
    }

    pub fn width(&self) -> usize { self.width }
    pub fn height(&self) -> usize { self.height }
    pub fn pixels(&self) -> &[u8] { &self.pixels }

    pub fn pixel(&self, x: usize, y: usize) -> [u8; 4] {
        let i = (y * self.width + x) * 4;
        [self.pixels[i], self.pixels[i + 1], self.pixels[i + 2], self.pixels[i + 3]]
    }

    /// A pixel counts as painted if any channel is non-zero.
    pub fn is_painted(&self, x: usize, y: usize) -> bool {
        self.pixel(x, y).iter().any(|&c| c != 0)
    }

    /// Fill `outline` with `color` using the non-zero winding rule.
    ///
    /// Edge pixels get fractional coverage, so the written channels depend on
    /// both coverage and colour.
    pub fn fill_outline(&mut self, outline: &Outline, color: Rgba) {
        if self.width == 0 || self.height == 0 {
            return;
        }
        let mut coverage = vec![0.0f32; self.width];
        let mut crossings: AllocVec<(f32, i32)> = AllocVec::new();
        let weight = 1.0 / SUBSAMPLES as f32;

        for row in 0..self.height {
            coverage.iter_mut().for_each(|c| *c = 0.0);
            for s in 0..SUBSAMPLES {
                let sy = row as f32 + (s as f32 + 0.5) * weight;
                crossings.clear();
                collect_crossings(outline, sy, &mut crossings);
                crossings.sort_unstable_by(|a, b| a.0.partial_cmp(&b.0).unwrap_or(Ordering::Equal));

                let mut winding = 0;
                let mut span_start = 0.0;
                for &(x, dir) in crossings.iter() {
                    let was_inside = winding != 0;
                    winding += dir;
                    if !was_inside && winding != 0 {
                        span_start = x;
                    } else if was_inside && winding == 0 {
                        add_span(&mut coverage, span_start, x, weight);
                    }
                }
            }
            for (col, &cov) in coverage.iter().enumerate() {
                if cov > 0.0 {
                    self.blend(col, row, color, cov.min(1.0));
                }
            }
        }
    }

    /// Source-over onto whatever is already there.
    fn blend(&mut self, x: usize, y: usize, color: Rgba, coverage: f32) {
        let i = (y * self.width + x) * 4;
        let alpha = coverage * color.a as f32 / 255.0;
        let keep = 1.0 - alpha;
        let src = [color.r, color.g, color.b, 255];
        for (k, &s) in src.iter().enumerate() {
            let dst = self.pixels[i + k] as f32;
            let value = s as f32 * alpha + dst * keep;
            self.pixels[i + k] = (value + 0.5).min(255.0) as u8;
        }
    }
}

fn collect_crossings(outline: &Outline, y: f32, out: &mut AllocVec<(f32, i32)>) {
    for contour in &outline.contours {
        let n = contour.len();
        if n < 3 {
            continue;
        }
        let mut j = n - 1;
        for i in 0..n {
            let a = contour[j];
            let b = contour[i];
            j = i;
            let dir = if a.y <= y && b.y > y {
                1
            } else if b.y <= y && a.y > y {
                -1
            } else {
                continue;
            };
            let t = (y - a.y) / (b.y - a.y);
            out.push((a.x + t * (b.x - a.x), dir));
        }
    }
}

/// Add horizontal coverage for [x0, x1) to the row accumulator.
fn add_span(coverage: &mut [f32], x0: f32, x1: f32, weight: f32) {
    let width = coverage.len() as f32;
    let x0 = x0.max(0.0);
    let x1 = x1.min(width);
    if x1 <= x0 {
        return;
    }
    let first = libm::floorf(x0) as usize;
    let last = (libm::ceilf(x1) as usize).min(coverage.len());
    for (px, cov) in coverage.iter_mut().enumerate().take(last).skip(first) {
        let left = x0.max(px as f32);
        let right = x1.min(px as f32 + 1.0);
        if right > left {
            *cov += (right - left) * weight;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square(x0: f32, y0: f32, x1: f32, y1: f32) -> Outline {
        Outline::from_polygon(&[(x0, y0), (x1, y0), (x1, y1), (x0, y1)])
    }

    #[test]
    fn pixel_aligned_square_is_solid() {
        let mut raster = Raster::new(16, 16);
        raster.fill_outline(&square(4.0, 4.0, 8.0, 8.0), Rgba::WHITE);
        assert_eq!(raster.pixel(5, 5), [255, 255, 255, 255]);
        assert!(!raster.is_painted(3, 5));
        assert!(!raster.is_painted(8, 5));
        let painted = (0..16)
            .flat_map(|y| (0..16).map(move |x| (x, y)))
            .filter(|&(x, y)| raster.is_painted(x, y))
            .count();
        assert_eq!(painted, 16);
    }

    #[test]
    fn half_covered_pixel_is_partial() {
        let mut raster = Raster::new(4, 4);
        raster.fill_outline(&square(0.0, 0.0, 1.5, 4.0), Rgba::WHITE);
        let [r, _, _, a] = raster.pixel(1, 1);
        assert!(a > 100 && a < 155, "alpha = {}", a);
        assert_eq!(r, a);
    }

    #[test]
    fn black_fill_still_paints_alpha() {
        let mut raster = Raster::new(8, 8);
        raster.fill_outline(&square(2.0, 2.0, 6.0, 6.0), Rgba::BLACK);
        assert_eq!(raster.pixel(3, 3), [0, 0, 0, 255]);
        assert!(raster.is_painted(3, 3));
    }

    #[test]
    fn shape_outside_canvas_is_clipped() {
        let mut raster = Raster::new(8, 8);
        raster.fill_outline(&square(-10.0, -10.0, 2.0, 2.0), Rgba::WHITE);
        assert!(raster.is_painted(0, 0));
        assert!(raster.is_painted(1, 1));
        assert!(!raster.is_painted(2, 2));
    }
}
