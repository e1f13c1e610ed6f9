//! Path data parsing and polygon outlines for obstacles.
//!
//! Accepts the SVG path subset used for obstacle shapes: `M L H V C S Q T Z`
//! in absolute and relative form. Curves are flattened into line segments,
//! so an [`Outline`] is always a set of closed polygons.

use alloc::vec::Vec as AllocVec;

use crate::error::ShapeError;
use crate::vec::Vec2;

/// Line segments per flattened curve.
const CURVE_SEGMENTS: usize = 16;

/// Closed polygons, filled with the non-zero winding rule.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Outline {
    pub contours: AllocVec<AllocVec<Vec2<f32>>>,
}

impl Outline {
    /// Parse SVG path data.
    pub fn parse(data: &str) -> Result<Self, ShapeError> {
        Parser::new(data).run()
    }

    pub fn from_polygon(points: &[(f32, f32)]) -> Self {
        Outline {
            contours: alloc::vec![points.iter().map(|&(x, y)| Vec2::new(x, y)).collect()],
        }
    }

    pub fn is_empty(&self) -> bool {
        self.contours.iter().all(|c| c.len() < 3)
    }

    /// `(min, max)` corners, or `None` for an empty outline.
    pub fn bounds(&self) -> Option<(Vec2<f32>, Vec2<f32>)> {
        let mut points = self.contours.iter().flatten();
        let first = *points.next()?;
        let (mut min, mut max) = (first, first);
        for p in points {
            min.x = min.x.min(p.x);
            min.y = min.y.min(p.y);
            max.x = max.x.max(p.x);
            max.y = max.y.max(p.y);
        }
        Some((min, max))
    }

    /// Scale uniformly so the larger bounding-box side equals `size`, then
    /// centre the box on `center`.
    pub fn fitted(&self, size: f32, center: Vec2<f32>) -> Result<Self, ShapeError> {
        let (min, max) = self.bounds().ok_or(ShapeError::DegenerateOutline)?;
        let extent = (max.x - min.x).max(max.y - min.y);
        if !(extent > 0.0) || !(size > 0.0) {
            return Err(ShapeError::DegenerateOutline);
        }
        let s = size / extent;
        let mid = Vec2::new((min.x + max.x) * 0.5, (min.y + max.y) * 0.5);
        let contours = self
            .contours
            .iter()
            .map(|c| c.iter().map(|&p| (p - mid).scale(s) + center).collect())
            .collect();
        Ok(Outline { contours })
    }

    /// Non-zero winding test.
    pub fn contains(&self, p: Vec2<f32>) -> bool {
        let mut winding = 0i32;
        for contour in &self.contours {
            let n = contour.len();
            if n < 3 {
                continue;
            }
            let mut j = n - 1;
            for i in 0..n {
                let a = contour[j];
                let b = contour[i];
                if a.y <= p.y {
                    if b.y > p.y && cross(a, b, p) > 0.0 {
                        winding += 1;
                    }
                } else if b.y <= p.y && cross(a, b, p) < 0.0 {
                    winding -= 1;
                }
                j = i;
            }
        }
        winding != 0
    }
}

/// Which side of segment a→b the point p lies on.
fn cross(a: Vec2<f32>, b: Vec2<f32>, p: Vec2<f32>) -> f32 {
    (b.x - a.x) * (p.y - a.y) - (p.x - a.x) * (b.y - a.y)
}

struct Parser<'a> {
    bytes: &'a [u8],
    pos: usize,
    contours: AllocVec<AllocVec<Vec2<f32>>>,
    current: AllocVec<Vec2<f32>>,
    cursor: Vec2<f32>,
    start: Vec2<f32>,
    /// Reflected control point for `S` / `T`.
    last_control: Option<Vec2<f32>>,
}

impl<'a> Parser<'a> {
    fn new(data: &'a str) -> Self {
        Parser {
            bytes: data.as_bytes(),
            pos: 0,
            contours: AllocVec::new(),
            current: AllocVec::new(),
            cursor: Vec2::zero(),
            start: Vec2::zero(),
            last_control: None,
        }
    }

    fn run(mut self) -> Result<Outline, ShapeError> {
        let mut command: Option<u8> = None;
        loop {
            self.skip_separators();
            let Some(&b) = self.bytes.get(self.pos) else { break };
            if b.is_ascii_alphabetic() {
                self.pos += 1;
                command = Some(b);
                if b == b'Z' || b == b'z' {
                    self.close();
                    continue;
                }
            } else if command.is_none() {
                return Err(self.error("path must start with a command"));
            }
            let cmd = command.ok_or_else(|| self.error("missing command"))?;
            self.segment(cmd)?;
            // Coordinates after a moveto are implicit linetos.
            command = match cmd {
                b'M' => Some(b'L'),
                b'm' => Some(b'l'),
                other => Some(other),
            };
        }
        self.finish_contour();
        Ok(Outline { contours: self.contours })
    }

    fn segment(&mut self, cmd: u8) -> Result<(), ShapeError> {
        let relative = cmd.is_ascii_lowercase();
        let base = if relative { self.cursor } else { Vec2::zero() };
        match cmd.to_ascii_uppercase() {
            b'M' => {
                let p = base + self.point()?;
                self.finish_contour();
                self.current.push(p);
                self.cursor = p;
                self.start = p;
                self.last_control = None;
            }
            b'L' => {
                let p = base + self.point()?;
                self.line_to(p);
                self.last_control = None;
            }
            b'H' => {
                let x = self.number()? + if relative { self.cursor.x } else { 0.0 };
                self.line_to(Vec2::new(x, self.cursor.y));
                self.last_control = None;
            }
            b'V' => {
                let y = self.number()? + if relative { self.cursor.y } else { 0.0 };
                self.line_to(Vec2::new(self.cursor.x, y));
                self.last_control = None;
            }
            b'C' => {
                let c1 = base + self.point()?;
                let c2 = base + self.point()?;
                let end = base + self.point()?;
                self.cubic_to(c1, c2, end);
            }
            b'S' => {
                let c1 = self.reflected_control();
                let c2 = base + self.point()?;
                let end = base + self.point()?;
                self.cubic_to(c1, c2, end);
            }
            b'Q' => {
                let c = base + self.point()?;
                let end = base + self.point()?;
                self.quad_to(c, end);
            }
            b'T' => {
                let c = self.reflected_control();
                let end = base + self.point()?;
                self.quad_to(c, end);
            }
            _ => return Err(self.error("unsupported command")),
        }
        Ok(())
    }

    fn reflected_control(&self) -> Vec2<f32> {
        match self.last_control {
            Some(c) => self.cursor.scale(2.0) - c,
            None => self.cursor,
        }
    }

    fn line_to(&mut self, p: Vec2<f32>) {
        if self.current.is_empty() {
            self.current.push(self.cursor);
        }
        self.current.push(p);
        self.cursor = p;
    }

    fn cubic_to(&mut self, c1: Vec2<f32>, c2: Vec2<f32>, end: Vec2<f32>) {
        let p0 = self.cursor;
        for i in 1..=CURVE_SEGMENTS {
            let t = i as f32 / CURVE_SEGMENTS as f32;
            let u = 1.0 - t;
            let p = p0.scale(u * u * u)
                + c1.scale(3.0 * u * u * t)
                + c2.scale(3.0 * u * t * t)
                + end.scale(t * t * t);
            self.line_to(p);
        }
        self.last_control = Some(c2);
    }

    fn quad_to(&mut self, c: Vec2<f32>, end: Vec2<f32>) {
        let p0 = self.cursor;
        for i in 1..=CURVE_SEGMENTS {
            let t = i as f32 / CURVE_SEGMENTS as f32;
            let u = 1.0 - t;
            let p = p0.scale(u * u) + c.scale(2.0 * u * t) + end.scale(t * t);
            self.line_to(p);
        }
        self.last_control = Some(c);
    }

    fn close(&mut self) {
        self.finish_contour();
        self.cursor = self.start;
        self.last_control = None;
    }

    fn finish_contour(&mut self) {
        let contour = core::mem::take(&mut self.current);
        if contour.len() >= 3 {
            self.contours.push(contour);
        }
    }

    fn point(&mut self) -> Result<Vec2<f32>, ShapeError> {
        let x = self.number()?;
        let y = self.number()?;
        Ok(Vec2::new(x, y))
    }

    fn skip_separators(&mut self) {
        while let Some(&b) = self.bytes.get(self.pos) {
            if b.is_ascii_whitespace() || b == b',' {
                self.pos += 1;
            } else {
                break;
            }
        }
    }

    fn number(&mut self) -> Result<f32, ShapeError> {
        self.skip_separators();
        let start = self.pos;
        let mut end = self.pos;
        let bytes = self.bytes;
        if matches!(bytes.get(end), Some(b'+') | Some(b'-')) {
            end += 1;
        }
        let mut seen_dot = false;
        let mut seen_digit = false;
        while let Some(&b) = bytes.get(end) {
            match b {
                b'0'..=b'9' => seen_digit = true,
                b'.' if !seen_dot => seen_dot = true,
                _ => break,
            }
            end += 1;
        }
        if seen_digit && matches!(bytes.get(end), Some(b'e') | Some(b'E')) {
            let mut exp_end = end + 1;
            if matches!(bytes.get(exp_end), Some(b'+') | Some(b'-')) {
                exp_end += 1;
            }
            if matches!(bytes.get(exp_end), Some(b'0'..=b'9')) {
                while matches!(bytes.get(exp_end), Some(b'0'..=b'9')) {
                    exp_end += 1;
                }
                end = exp_end;
            }
        }
        if !seen_digit {
            return Err(self.error("expected a number"));
        }
        let text = core::str::from_utf8(&bytes[start..end])
            .map_err(|_| self.error("invalid utf-8 in number"))?;
        let value: f32 = text.parse().map_err(|_| self.error("invalid number"))?;
        self.pos = end;
        Ok(value)
    }

    fn error(&self, reason: &'static str) -> ShapeError {
        ShapeError::MalformedPath { offset: self.pos, reason }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_closed_square() {
        let outline = Outline::parse("M0 0 L10 0 L10 10 L0 10 Z").unwrap();
        assert_eq!(outline.contours.len(), 1);
        assert!(outline.contains(Vec2::new(5.0, 5.0)));
        assert!(!outline.contains(Vec2::new(15.0, 5.0)));
    }

    #[test]
    fn relative_and_implicit_linetos() {
        let outline = Outline::parse("m 0,0 10,0 0,10 h -10 z").unwrap();
        let (min, max) = outline.bounds().unwrap();
        assert_eq!(min, Vec2::new(0.0, 0.0));
        assert_eq!(max, Vec2::new(10.0, 10.0));
    }

    #[test]
    fn compact_numbers() {
        let outline = Outline::parse("M0-1L2.5.5L-1e1,3z").unwrap();
        let c = &outline.contours[0];
        assert_eq!(c[0], Vec2::new(0.0, -1.0));
        assert_eq!(c[1], Vec2::new(2.5, 0.5));
        assert_eq!(c[2], Vec2::new(-10.0, 3.0));
    }

    #[test]
    fn hole_with_opposite_winding() {
        let outline = Outline::parse("M0 0H30V30H0Z M10 10V20H20V10Z").unwrap();
        assert!(outline.contains(Vec2::new(5.0, 5.0)));
        assert!(!outline.contains(Vec2::new(15.0, 15.0)));
    }

    #[test]
    fn curves_are_flattened() {
        let outline = Outline::parse("M0 0 Q10 20 20 0 Z").unwrap();
        assert_eq!(outline.contours[0].len(), CURVE_SEGMENTS + 1);
        assert!(outline.contains(Vec2::new(10.0, 5.0)));
    }

    #[test]
    fn rejects_garbage() {
        assert!(matches!(
            Outline::parse("10 10"),
            Err(ShapeError::MalformedPath { .. })
        ));
        assert!(matches!(
            Outline::parse("M0 0 A5 5 0 0 1 10 10"),
            Err(ShapeError::MalformedPath { .. })
        ));
    }

    #[test]
    fn fitted_scales_to_size() {
        let outline = Outline::parse("M0 0H2V1H0Z").unwrap();
        let fitted = outline.fitted(100.0, Vec2::new(256.0, 256.0)).unwrap();
        let (min, max) = fitted.bounds().unwrap();
        assert!((max.x - min.x - 100.0).abs() < 1e-3);
        assert!((max.y - min.y - 50.0).abs() < 1e-3);
        assert!((min.x + max.x - 512.0).abs() < 1e-3);
    }
}
