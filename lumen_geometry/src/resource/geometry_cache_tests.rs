/// Tests for GeometryState cache bookkeeping and LRU eviction

use super::*;
use std::sync::{Arc, Mutex};
use crate::graphics_device::mock_graphics_device::MockGraphicsDevice;
use crate::graphics_device::{GraphicsDevice, PrimitiveTopology};
use crate::memory::MemoryCoordinator;
use crate::resource::{EngineEvent, GeometryBuffers, GeometryDesc};

// ============================================================================
// Helper Functions
// ============================================================================

fn triangle() -> GeometryDesc {
    GeometryDesc::new(
        "triangles",
        vec![0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0, 0.0],
        vec![0, 1, 2],
    )
}

/// Register a surface backed by a fresh mock device and activate it
fn add_surface(state: &mut GeometryState, name: &str) -> (SurfaceKey, Arc<Mutex<MockGraphicsDevice>>) {
    let mock = MockGraphicsDevice::shared();
    let key = state.surfaces.create_surface(name, mock.clone());
    state.apply_event(EngineEvent::SurfaceActivated(key)).unwrap();
    (key, mock)
}

/// Build and commit a triangle record stamped with `tick`
fn add_record(state: &mut GeometryState, surface: SurfaceKey, type_id: &str, tick: u64) {
    let memory = MemoryCoordinator::new();
    let device: Arc<Mutex<dyn GraphicsDevice>> = state.surfaces.graphics_device(surface).unwrap();
    let buffers = GeometryBuffers::allocate(&memory, &device, &triangle()).unwrap();
    let serial = state.take_use_serial();
    let record = GeometryRecord::new(
        type_id.to_string(), PrimitiveTopology::TriangleList, buffers, surface, tick, serial,
    );
    state.commit(record).unwrap();
}

fn contains(state: &GeometryState, surface: SurfaceKey, type_id: &str) -> bool {
    state.caches.get(&surface).is_some_and(|cache| cache.contains_key(type_id))
}

// ============================================================================
// Tests: Commit / Destroy
// ============================================================================

#[test]
fn test_commit_stores_record() {
    let mut state = GeometryState::new();
    let (s1, mock) = add_surface(&mut state, "s1");

    add_record(&mut state, s1, "tri", 0);

    assert!(state.active_record("tri").is_some());
    assert_eq!(state.stats.created, 1);
    assert_eq!(mock.lock().unwrap().live_buffer_count(), 2);
}

#[test]
fn test_commit_replaces_and_destroys_previous() {
    let mut state = GeometryState::new();
    let (s1, mock) = add_surface(&mut state, "s1");

    add_record(&mut state, s1, "tri", 0);
    state.bound_type = Some("tri".to_string());
    add_record(&mut state, s1, "tri", 1);

    assert_eq!(state.caches[&s1].len(), 1);
    assert_eq!(state.active_record("tri").unwrap().last_used(), 1);
    assert_eq!(state.bound_type, None);
    assert_eq!(state.stats.created, 2);
    assert_eq!(state.stats.destroyed, 1);
    assert_eq!(mock.lock().unwrap().live_buffer_count(), 2);
}

#[test]
fn test_commit_without_cache_releases_record() {
    let mut state = GeometryState::new();
    let (s1, mock) = add_surface(&mut state, "s1");

    let memory = MemoryCoordinator::new();
    let device: Arc<Mutex<dyn GraphicsDevice>> = mock.clone();
    let buffers = GeometryBuffers::allocate(&memory, &device, &triangle()).unwrap();
    let record = GeometryRecord::new(
        "tri".to_string(), PrimitiveTopology::TriangleList, buffers, s1, 0, 0,
    );

    state.caches.clear();
    assert!(matches!(state.commit(record), Err(Error::InvalidResource(_))));
    assert_eq!(mock.lock().unwrap().live_buffer_count(), 0);
}

#[test]
fn test_destroy_record_clears_bound_type() {
    let mut state = GeometryState::new();
    let (s1, mock) = add_surface(&mut state, "s1");
    add_record(&mut state, s1, "tri", 0);
    state.bound_type = Some("tri".to_string());

    assert!(state.destroy_record(s1, "tri"));
    assert!(!state.destroy_record(s1, "tri"));

    assert_eq!(state.bound_type, None);
    assert!(!contains(&state, s1, "tri"));
    assert_eq!(mock.lock().unwrap().live_buffer_count(), 0);
}

#[test]
fn test_destroy_record_keeps_unrelated_bound_type() {
    let mut state = GeometryState::new();
    let (s1, _mock) = add_surface(&mut state, "s1");
    add_record(&mut state, s1, "a", 0);
    add_record(&mut state, s1, "b", 0);
    state.bound_type = Some("a".to_string());

    state.destroy_record(s1, "b");
    assert_eq!(state.bound_type.as_deref(), Some("a"));
}

#[test]
fn test_destroy_record_of_dead_surface_skips_release() {
    let mut state = GeometryState::new();
    let (s1, mock) = add_surface(&mut state, "s1");
    add_record(&mut state, s1, "tri", 0);

    state.surfaces.destroy_surface(s1);
    assert!(state.destroy_record(s1, "tri"));

    let mock = mock.lock().unwrap();
    // Buffers are considered released with the surface
    assert_eq!(mock.live_buffer_count(), 2);
    assert_eq!(mock.count_commands("destroy_buffer"), 0);
}

#[test]
fn test_generate_type_id_skips_taken_ids() {
    let mut state = GeometryState::new();
    let (s1, _mock) = add_surface(&mut state, "s1");
    add_record(&mut state, s1, "geometry_0", 0);

    assert_eq!(state.generate_type_id(s1, "geometry_"), "geometry_1");
    assert_eq!(state.generate_type_id(s1, "geometry_"), "geometry_2");
}

// ============================================================================
// Tests: Eviction
// ============================================================================

#[test]
fn test_evict_picks_oldest_across_surfaces() {
    let mut state = GeometryState::new();
    let (s1, mock1) = add_surface(&mut state, "s1");
    let (s2, mock2) = add_surface(&mut state, "s2");

    add_record(&mut state, s1, "A", 1);
    add_record(&mut state, s1, "B", 2);
    add_record(&mut state, s2, "C", 0);

    assert!(state.evict_least_recently_used());

    assert!(contains(&state, s1, "A"));
    assert!(contains(&state, s1, "B"));
    assert!(!contains(&state, s2, "C"));
    assert_eq!(state.stats.evicted, 1);
    assert_eq!(mock1.lock().unwrap().live_buffer_count(), 4);
    assert_eq!(mock2.lock().unwrap().live_buffer_count(), 0);
}

#[test]
fn test_evict_ignores_dead_surfaces() {
    let mut state = GeometryState::new();
    let (s1, _mock1) = add_surface(&mut state, "s1");
    let (s2, _mock2) = add_surface(&mut state, "s2");

    add_record(&mut state, s1, "A", 5);
    add_record(&mut state, s2, "C", 0);
    state.surfaces.destroy_surface(s2);

    assert!(state.evict_least_recently_used());
    assert!(!contains(&state, s1, "A"));
    assert!(contains(&state, s2, "C"));

    // Only the dead surface's record remains
    assert!(!state.evict_least_recently_used());
}

#[test]
fn test_evict_empty_reports_failure() {
    let mut state = GeometryState::new();
    assert!(!state.evict_least_recently_used());

    add_surface(&mut state, "s1");
    assert!(!state.evict_least_recently_used());
    assert_eq!(state.stats.evicted, 0);
}

#[test]
fn test_evict_breaks_ties_by_use_order() {
    let mut state = GeometryState::new();
    let (s1, _mock) = add_surface(&mut state, "s1");

    add_record(&mut state, s1, "first", 3);
    add_record(&mut state, s1, "second", 3);

    assert!(state.evict_least_recently_used());
    assert!(!contains(&state, s1, "first"));
    assert!(contains(&state, s1, "second"));
}

#[test]
fn test_evicting_bound_record_clears_bound_type() {
    let mut state = GeometryState::new();
    let (s1, _mock) = add_surface(&mut state, "s1");
    add_record(&mut state, s1, "only", 0);
    state.bound_type = Some("only".to_string());

    assert!(state.evict_least_recently_used());
    assert_eq!(state.bound_type, None);
}

// ============================================================================
// Tests: Reset
// ============================================================================

#[test]
fn test_reset_destroys_every_cache() {
    let mut state = GeometryState::new();
    let (s1, mock1) = add_surface(&mut state, "s1");
    let (s2, mock2) = add_surface(&mut state, "s2");
    add_record(&mut state, s1, "A", 0);
    add_record(&mut state, s1, "B", 0);
    add_record(&mut state, s2, "C", 0);
    state.bound_type = Some("C".to_string());

    state.reset();

    assert!(state.caches.is_empty());
    assert_eq!(state.active_surface, None);
    assert_eq!(state.bound_type, None);
    assert_eq!(state.stats.destroyed, 3);
    assert_eq!(mock1.lock().unwrap().live_buffer_count(), 0);
    assert_eq!(mock2.lock().unwrap().live_buffer_count(), 0);
}
