/// Accelerator discovery and selection

mod accelerator_info;
mod queue_family;
mod selector;

pub use accelerator_info::AcceleratorInfo;
pub use queue_family::{QueueFamilyIndices, QueueRole};
pub use selector::{
    compare_accelerators, select_best_accelerator, select_from_candidates,
    AcceleratorSelection, Comparison,
};
