use squishy::{
    Body, FrameHandle, FrameHost, GlyphTable, Outline, ParamPatch, PatchEffect, Scheduler,
    SimulationParams, VectorSurface,
};
use wasm_bindgen::prelude::*;

/// The JS side owns `requestAnimationFrame`; this just remembers whether
/// the scheduler wants another frame.
#[derive(Default)]
struct JsFrames {
    next: u64,
    pending: Option<FrameHandle>,
}

impl FrameHost for JsFrames {
    fn request_frame(&mut self) -> FrameHandle {
        self.next += 1;
        let handle = FrameHandle(self.next);
        self.pending = Some(handle);
        handle
    }

    fn cancel_frame(&mut self, handle: FrameHandle) {
        if self.pending == Some(handle) {
            self.pending = None;
        }
    }
}

fn js_err<E: core::fmt::Display>(e: E) -> JsValue {
    JsValue::from_str(&e.to_string())
}

// ---- Blobs Demo ----

#[wasm_bindgen]
pub struct BlobsDemo {
    sim: Scheduler<f32>,
    frames: JsFrames,
    glyphs: GlyphTable,
    /// Flat `[x0, y0, x1, y1, ...]` per body, captured at draw time.
    outlines: Vec<Vec<f32>>,
}

#[wasm_bindgen]
impl BlobsDemo {
    /// `params_json` is a (possibly partial) `SimulationParams` object.
    #[wasm_bindgen(constructor)]
    pub fn new(params_json: &str) -> Result<BlobsDemo, JsValue> {
        let params: SimulationParams = if params_json.trim().is_empty() {
            SimulationParams::default()
        } else {
            serde_json::from_str(params_json).map_err(js_err)?
        };
        let glyphs = GlyphTable::new();
        let sim = Scheduler::with_surface(params, Box::new(VectorSurface::new(glyphs.clone())))
            .map_err(js_err)?;
        Ok(BlobsDemo { sim, frames: JsFrames::default(), glyphs, outlines: Vec::new() })
    }

    /// Register a glyph outline (from the page's font loader) as SVG path
    /// data, then rebuild the bodies around it.
    pub fn add_glyph(&mut self, letter: char, path_data: &str) -> Result<(), JsValue> {
        let outline = Outline::parse(path_data).map_err(js_err)?;
        self.glyphs = std::mem::take(&mut self.glyphs).with_glyph(letter, outline);
        self.sim.set_surface(Some(Box::new(VectorSurface::new(self.glyphs.clone()))));
        self.sim.restart();
        Ok(())
    }

    pub fn start(&mut self) {
        self.sim.start(&mut self.frames);
    }

    pub fn stop(&mut self) {
        self.sim.stop(&mut self.frames);
    }

    pub fn teardown(&mut self) {
        self.sim.teardown(&mut self.frames);
    }

    pub fn restart(&mut self) {
        self.sim.restart();
    }

    pub fn is_running(&self) -> bool {
        self.sim.is_running()
    }

    /// Call from the animation frame callback with its timestamp. Returns
    /// whether to request another frame.
    pub fn tick(&mut self, now_ms: f64) -> Result<bool, JsValue> {
        self.frames.pending = None;
        let outlines = &mut self.outlines;
        self.sim
            .tick(now_ms, &mut self.frames, |bodies: &[Body<f32>]| {
                outlines.clear();
                outlines.extend(bodies.iter().map(|b| {
                    let mut flat = Vec::with_capacity(b.point_count() * 2);
                    for p in b.points() {
                        flat.push(p.pos.x);
                        flat.push(p.pos.y);
                    }
                    flat
                }));
                Ok(())
            })
            .map_err(js_err)?;
        Ok(self.frames.pending.is_some())
    }

    pub fn set_repel_distance(&mut self, value: f32, now_ms: f64) -> Result<(), JsValue> {
        self.sim.apply(ParamPatch::RepelDistance(value), now_ms).map_err(js_err)?;
        Ok(())
    }

    /// Apply a `{"key": ..., "value": ...}` patch. Returns true when the
    /// change only shows after `restart`.
    pub fn set_param(&mut self, patch_json: &str, now_ms: f64) -> Result<bool, JsValue> {
        let patch: ParamPatch = serde_json::from_str(patch_json).map_err(js_err)?;
        let effect = self.sim.apply(patch, now_ms).map_err(js_err)?;
        Ok(effect == PatchEffect::RestartRequired)
    }

    pub fn params_json(&self) -> Result<String, JsValue> {
        serde_json::to_string(self.sim.params()).map_err(js_err)
    }

    pub fn is_live_editing(&self, now_ms: f64) -> bool {
        self.sim.is_live_editing(now_ms)
    }

    /// Bodies in the last drawn frame.
    pub fn body_count(&self) -> usize {
        self.outlines.len()
    }

    /// Outline of body at index as flat [x0, y0, x1, y1, ...]
    pub fn body_outline(&self, index: usize) -> Vec<f32> {
        self.outlines.get(index).cloned().unwrap_or_default()
    }

    pub fn obstacle_area_ratio(&self) -> f32 {
        self.sim.obstacle().map_or(0.0, |o| o.area_ratio())
    }
}
