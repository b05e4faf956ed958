//! Unit tests for selector.rs
//!
//! Pure comparisons use hand-built AcceleratorInfo values; enumeration goes
//! through the mock backend.

use crate::accelerator::{
    compare_accelerators, select_best_accelerator, select_from_candidates,
    AcceleratorInfo, Comparison, QueueFamilyIndices,
};
use crate::device::mock_backend::{MockAccelerator, MockBackend, GIB};
use crate::device::{DeviceClass, MemoryHeap, PhysicalDeviceHandle, QueueFamilyProperties, SurfaceHandle};
use crate::error::Error;

const SURFACE: SurfaceHandle = SurfaceHandle::from_raw(7);

fn info(name: &str, class: DeviceClass, heap: Option<u64>, dimension: u32) -> AcceleratorInfo {
    AcceleratorInfo {
        handle: PhysicalDeviceHandle::from_raw(1),
        name: name.to_string(),
        class,
        geometry_shader: true,
        max_image_dimension_2d: dimension,
        device_local_heap_size: heap,
        queue_family_indices: QueueFamilyIndices { graphics: Some(0), presentation: Some(0) },
    }
}

// ============================================================================
// COMPARISON
// ============================================================================

#[test]
fn test_discrete_beats_integrated_with_smaller_stats() {
    let discrete = info("d", DeviceClass::Discrete, Some(2 * GIB), 8192);
    let integrated = info("i", DeviceClass::Integrated, Some(8 * GIB), 16384);

    // 2 points vs 2 points
    assert_eq!(compare_accelerators(&discrete, &integrated), Comparison::Equal);

    let integrated_smaller_heap = info("i", DeviceClass::Integrated, Some(8 * GIB), 8192);
    assert_eq!(compare_accelerators(&discrete, &integrated_smaller_heap), Comparison::Greater);
    assert_eq!(compare_accelerators(&integrated_smaller_heap, &discrete), Comparison::Less);
}

#[test]
fn test_class_ranking() {
    let integrated = info("i", DeviceClass::Integrated, Some(GIB), 4096);
    let other = info("o", DeviceClass::Other, Some(GIB), 4096);
    assert_eq!(compare_accelerators(&integrated, &other), Comparison::Greater);
    assert_eq!(compare_accelerators(&other, &integrated), Comparison::Less);
}

#[test]
fn test_heap_and_dimension_break_ties() {
    let a = info("a", DeviceClass::Discrete, Some(8 * GIB), 16384);
    let b = info("b", DeviceClass::Discrete, Some(4 * GIB), 16384);
    assert_eq!(compare_accelerators(&a, &b), Comparison::Greater);

    let c = info("c", DeviceClass::Discrete, Some(4 * GIB), 32768);
    assert_eq!(compare_accelerators(&c, &b), Comparison::Greater);

    // One point each
    assert_eq!(compare_accelerators(&a, &c), Comparison::Equal);
}

#[test]
fn test_identical_devices_are_equal() {
    let a = info("a", DeviceClass::Discrete, Some(8 * GIB), 16384);
    assert_eq!(compare_accelerators(&a, &a.clone()), Comparison::Equal);
}

#[test]
fn test_missing_device_local_heap_fails() {
    let with_heap = info("a", DeviceClass::Discrete, Some(8 * GIB), 16384);
    let without_heap = info("b", DeviceClass::Discrete, None, 16384);
    assert_eq!(compare_accelerators(&with_heap, &without_heap), Comparison::Fail);
    assert_eq!(compare_accelerators(&without_heap, &with_heap), Comparison::Fail);
}

// ============================================================================
// SELECTION SCAN
// ============================================================================

#[test]
fn test_first_qualifying_kept_on_equal() {
    let first = info("first", DeviceClass::Discrete, Some(8 * GIB), 16384);
    let second = info("second", DeviceClass::Discrete, Some(8 * GIB), 16384);

    let selection = select_from_candidates(&[first, second]).unwrap();
    assert_eq!(selection.chosen.name, "first");
}

#[test]
fn test_later_device_replaces_only_when_greater() {
    let candidates = vec![
        info("weak", DeviceClass::Integrated, Some(GIB), 4096),
        info("strong", DeviceClass::Discrete, Some(8 * GIB), 16384),
        info("middle", DeviceClass::Discrete, Some(4 * GIB), 16384),
    ];

    let selection = select_from_candidates(&candidates).unwrap();
    assert_eq!(selection.chosen.name, "strong");
    assert!(selection.comparison_failures.is_empty());
}

#[test]
fn test_non_qualifying_devices_never_selected() {
    let mut no_geometry = info("no-geometry", DeviceClass::Discrete, Some(64 * GIB), 32768);
    no_geometry.geometry_shader = false;
    let mut no_present = info("no-present", DeviceClass::Discrete, Some(64 * GIB), 32768);
    no_present.queue_family_indices.presentation = None;
    let modest = info("modest", DeviceClass::Other, Some(GIB), 1024);

    let selection = select_from_candidates(&[no_geometry, no_present, modest]).unwrap();
    assert_eq!(selection.chosen.name, "modest");
}

#[test]
fn test_no_qualifying_device_is_unrecoverable() {
    let mut no_geometry = info("no-geometry", DeviceClass::Discrete, Some(GIB), 4096);
    no_geometry.geometry_shader = false;

    let err = select_from_candidates(&[no_geometry]).unwrap_err();
    assert!(matches!(err, Error::InitializationFailed(_)));
    assert!(err.is_unrecoverable());
}

#[test]
fn test_comparison_failure_keeps_current_best() {
    let first = info("first", DeviceClass::Integrated, Some(GIB), 4096);
    let unrankable = info("unrankable", DeviceClass::Discrete, None, 32768);

    let selection = select_from_candidates(&[first, unrankable]).unwrap();
    assert_eq!(selection.chosen.name, "first");
    assert_eq!(selection.comparison_failures, vec!["unrankable".to_string()]);
}

#[test]
fn test_unrankable_first_device_can_still_win_alone() {
    let only = info("only", DeviceClass::Discrete, None, 16384);
    let selection = select_from_candidates(&[only]).unwrap();
    assert_eq!(selection.chosen.name, "only");
}

// ============================================================================
// BACKEND ENUMERATION
// ============================================================================

#[test]
fn test_zero_accelerators_is_unrecoverable() {
    let backend = MockBackend::new(vec![]);
    let err = select_best_accelerator(&backend, SURFACE).unwrap_err();
    assert!(matches!(err, Error::InitializationFailed(msg) if msg.contains("No accelerator")));
}

#[test]
fn test_enumeration_failure_is_unrecoverable() {
    let backend = MockBackend::single();
    backend.fail_on("enumerate_accelerators");
    assert!(select_best_accelerator(&backend, SURFACE).unwrap_err().is_unrecoverable());
}

#[test]
fn test_select_from_backend_prefers_discrete() {
    let backend = MockBackend::new(vec![
        MockAccelerator::integrated("iGPU"),
        MockAccelerator::discrete("dGPU"),
    ]);

    let selection = select_best_accelerator(&backend, SURFACE).unwrap();
    assert_eq!(selection.chosen.name, "dGPU");
    assert_eq!(selection.chosen.handle, PhysicalDeviceHandle::from_raw(2));
}

#[test]
fn test_query_uses_first_device_local_heap() {
    let backend = MockBackend::new(vec![MockAccelerator::discrete("gpu").with_heaps(vec![
        MemoryHeap { size: 32 * GIB, device_local: false },
        MemoryHeap { size: 6 * GIB, device_local: true },
        MemoryHeap { size: 12 * GIB, device_local: true },
    ])]);

    let info = AcceleratorInfo::query(&backend, PhysicalDeviceHandle::from_raw(1), SURFACE).unwrap();
    assert_eq!(info.device_local_heap_size, Some(6 * GIB));
}

#[test]
fn test_device_without_presentation_skipped() {
    let backend = MockBackend::new(vec![
        MockAccelerator::discrete("headless")
            .with_queue_families(vec![QueueFamilyProperties { graphics: true, presentation: false }]),
        MockAccelerator::integrated("laptop"),
    ]);

    let selection = select_best_accelerator(&backend, SURFACE).unwrap();
    assert_eq!(selection.chosen.name, "laptop");
}

#[test]
fn test_all_devices_without_geometry_shader() {
    let backend = MockBackend::new(vec![
        MockAccelerator::discrete("a").with_geometry_shader(false),
        MockAccelerator::integrated("b").with_geometry_shader(false),
    ]);

    assert!(matches!(
        select_best_accelerator(&backend, SURFACE),
        Err(Error::InitializationFailed(_))
    ));
}
