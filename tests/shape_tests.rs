mod common;

use common::{glyph_a, glyphs, CountingSurface};
use squishy::{
    ObstacleShape, RenderSurface, Rgba, ShapeCache, ShapeDescriptor, SimulationParams, VectorSurface,
};

fn descriptor_a(size: f32) -> ShapeDescriptor {
    ShapeDescriptor::from_params(&SimulationParams::default().with_obstacle(glyph_a(size)))
}

#[test]
fn resolve_is_memoized() {
    let mut cache = ShapeCache::new();
    let mut surface = CountingSurface::new();
    let calls = surface.calls.clone();
    let desc = descriptor_a(100.0);

    let first = cache.resolve(&desc, Some(&mut surface));
    let second = cache.resolve(&desc, Some(&mut surface));

    assert_eq!(calls.get(), 1);
    assert_eq!(cache.rasterizations(), 1);
    assert_eq!(*first, *second);
    assert!(!first.is_empty());
}

#[test]
fn glyph_a_occupancy() {
    let mut cache = ShapeCache::new();
    let mut surface = VectorSurface::new(glyphs());
    let geometry = cache.resolve(&descriptor_a(100.0), Some(&mut surface));

    // Crossbar and left leg are solid, the counter is open.
    assert!(geometry.contains(256.0, 274.0));
    assert!(geometry.contains(220.0, 296.0));
    assert!(!geometry.contains(256.0, 246.0));
    assert!(!geometry.contains(100.0, 100.0));

    let ratio = geometry.area_ratio();
    assert!(ratio > 0.005 && ratio < 0.03, "area ratio {}", ratio);
    assert_eq!(ratio, geometry.occupied_pixels() as f32 / (512.0 * 512.0));
}

#[test]
fn colour_change_needs_invalidation() {
    let mut cache = ShapeCache::new();
    let mut surface = CountingSurface::new();
    let calls = surface.calls.clone();
    let white = descriptor_a(100.0);
    let mut red = white.clone();
    red.color = Rgba::new(255, 0, 0, 255);

    cache.resolve(&white, Some(&mut surface));
    // A different colour is a different key.
    cache.resolve(&red, Some(&mut surface));
    assert_eq!(calls.get(), 2);

    assert!(cache.invalidate(&white));
    assert!(!cache.invalidate(&white));
    cache.resolve(&white, Some(&mut surface));
    assert_eq!(calls.get(), 3);
    assert_eq!(cache.len(), 2);
}

#[test]
fn size_and_offset_are_part_of_the_key() {
    let mut cache = ShapeCache::new();
    let mut surface = CountingSurface::new();
    let calls = surface.calls.clone();
    let small = descriptor_a(50.0);
    let big = descriptor_a(150.0);
    let mut shifted = small.clone();
    shifted.offset.x = 40.0;

    let a = cache.resolve(&small, Some(&mut surface));
    let b = cache.resolve(&big, Some(&mut surface));
    let c = cache.resolve(&shifted, Some(&mut surface));
    assert_eq!(calls.get(), 3);
    assert!(a.occupied_pixels() < b.occupied_pixels());
    assert!(c.center().x > a.center().x);
}

#[test]
fn failures_fall_back_to_empty_geometry() {
    let mut cache = ShapeCache::new();
    let mut surface = CountingSurface::new();

    let mut unknown = descriptor_a(100.0);
    unknown.shape = ObstacleShape::Glyph { letter: 'Z', font_family: "serif".into() };
    let geometry = cache.resolve(&unknown, Some(&mut surface));
    assert!(geometry.is_empty());
    assert_eq!(geometry.area_ratio(), 0.0);

    let mut broken = descriptor_a(100.0);
    broken.shape = ObstacleShape::Path { data: "M0 0 X 10".into() };
    assert!(cache.resolve(&broken, Some(&mut surface)).is_empty());

    let mut blank = descriptor_a(100.0);
    blank.shape = ObstacleShape::Path { data: String::new() };
    assert!(cache.resolve(&blank, Some(&mut surface)).is_empty());

    assert!(cache.resolve(&descriptor_a(100.0), None).is_empty());
    assert!(cache.is_empty());
}

#[test]
fn path_obstacle_uses_vector_data() {
    let mut surface = VectorSurface::new(glyphs());
    let mut desc = descriptor_a(100.0);
    desc.shape = ObstacleShape::Path { data: "M0 0 L10 0 L5 10 Z".into() };
    let raster = surface.rasterize(&desc).unwrap();
    // Apex points down: wide at the top, narrow near the bottom.
    assert!(raster.is_painted(256, 210));
    assert!(!raster.is_painted(215, 300));
}
