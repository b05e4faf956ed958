/// Accelerator selection
///
/// Devices that lack geometry shaders or a complete queue mapping are
/// skipped. The remaining ones are ranked pairwise with a point system:
///
/// | Criterion                    | Points |
/// |------------------------------|--------|
/// | Device class (discrete > integrated > other) | 2 |
/// | Larger device-local heap     | 1      |
/// | Larger max 2D image dimension | 1     |
///
/// A single scan keeps the current best and replaces it only when a later
/// device compares strictly greater.

use crate::device::{GraphicsBackend, SurfaceHandle};
use crate::error::Result;
use crate::{engine_diagnostic, engine_error, engine_info, engine_init_err};
use super::accelerator_info::AcceleratorInfo;

/// Outcome of ranking two accelerators
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Comparison {
    Greater,
    Equal,
    Less,
    /// The devices could not be ranked (a device-local heap is missing)
    Fail,
}

/// Rank `a` against `b`
pub fn compare_accelerators(a: &AcceleratorInfo, b: &AcceleratorInfo) -> Comparison {
    let mut a_points = 0u32;
    let mut b_points = 0u32;

    let (a_class, b_class) = (a.class.rating(), b.class.rating());
    if a_class > b_class {
        a_points += 2;
    } else if b_class > a_class {
        b_points += 2;
    }

    let (Some(a_heap), Some(b_heap)) = (a.device_local_heap_size, b.device_local_heap_size) else {
        return Comparison::Fail;
    };
    if a_heap > b_heap {
        a_points += 1;
    } else if b_heap > a_heap {
        b_points += 1;
    }

    if a.max_image_dimension_2d > b.max_image_dimension_2d {
        a_points += 1;
    } else if b.max_image_dimension_2d > a.max_image_dimension_2d {
        b_points += 1;
    }

    match a_points.cmp(&b_points) {
        std::cmp::Ordering::Greater => Comparison::Greater,
        std::cmp::Ordering::Equal => Comparison::Equal,
        std::cmp::Ordering::Less => Comparison::Less,
    }
}

/// Chosen accelerator plus the candidates that could not be ranked
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AcceleratorSelection {
    pub chosen: AcceleratorInfo,
    /// Names of qualifying devices whose comparison against the best failed
    pub comparison_failures: Vec<String>,
}

/// Pick the best qualifying accelerator among already-queried candidates
pub fn select_from_candidates(candidates: &[AcceleratorInfo]) -> Result<AcceleratorSelection> {
    let mut best: Option<&AcceleratorInfo> = None;
    let mut comparison_failures = Vec::new();

    for candidate in candidates {
        if !candidate.meets_requirements() {
            engine_diagnostic!(
                "mcvk::accelerator",
                "Skipping '{}' (geometry shader: {}, queue families complete: {})",
                candidate.name,
                candidate.geometry_shader,
                candidate.queue_family_indices.is_complete()
            );
            continue;
        }

        let Some(current) = best else {
            engine_diagnostic!("mcvk::accelerator", "'{}' is the first qualifying device", candidate.name);
            best = Some(candidate);
            continue;
        };

        match compare_accelerators(candidate, current) {
            Comparison::Greater => {
                engine_diagnostic!(
                    "mcvk::accelerator",
                    "'{}' ranks above '{}'",
                    candidate.name,
                    current.name
                );
                best = Some(candidate);
            }
            Comparison::Equal | Comparison::Less => {
                engine_diagnostic!(
                    "mcvk::accelerator",
                    "'{}' does not rank above '{}'",
                    candidate.name,
                    current.name
                );
            }
            Comparison::Fail => {
                engine_error!(
                    "mcvk::accelerator",
                    "Could not compare '{}' against '{}': device-local heap not found",
                    candidate.name,
                    current.name
                );
                comparison_failures.push(candidate.name.clone());
            }
        }
    }

    let chosen = best.cloned().ok_or_else(|| {
        engine_init_err!(
            "mcvk::accelerator",
            "No accelerator supports geometry shaders with graphics and presentation queues"
        )
    })?;

    engine_info!("mcvk::accelerator", "Selected accelerator '{}' ({:?})", chosen.name, chosen.class);

    Ok(AcceleratorSelection { chosen, comparison_failures })
}

/// Enumerate the accelerators of `backend` and pick the best one for `surface`
///
/// Devices whose queue families cannot be queried are skipped.
pub fn select_best_accelerator(
    backend: &dyn GraphicsBackend,
    surface: SurfaceHandle,
) -> Result<AcceleratorSelection> {
    let handles = backend.enumerate_accelerators().map_err(|e| {
        engine_init_err!("mcvk::accelerator", "Failed to enumerate accelerators: {}", e)
    })?;

    if handles.is_empty() {
        return Err(engine_init_err!("mcvk::accelerator", "No accelerator found"));
    }

    engine_diagnostic!("mcvk::accelerator", "{} accelerator(s) found", handles.len());

    let mut candidates = Vec::with_capacity(handles.len());
    for handle in handles {
        match AcceleratorInfo::query(backend, handle, surface) {
            Ok(info) => candidates.push(info),
            Err(e) => engine_error!(
                "mcvk::accelerator",
                "Failed to query accelerator {:?}: {}",
                handle,
                e
            ),
        }
    }

    select_from_candidates(&candidates)
}

#[cfg(test)]
#[path = "selector_tests.rs"]
mod tests;
