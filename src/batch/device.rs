//! Accelerator memory release
//!
//! Entities ask the device layer to drop cached accelerator memory between
//! runs. Hosts without an accelerator plug in [`NoDevice`], which makes the
//! request a no-op instead of an error.

use std::fmt;

/// Capability to release memory held by an accelerator runtime
pub trait DeviceMemory: fmt::Debug {
    /// Human-readable device name
    fn name(&self) -> &str;

    /// Release cached memory. Best effort: returns whether anything was freed.
    fn release_memory(&self) -> bool;
}

/// Device layer for hosts without an accelerator
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NoDevice;

impl DeviceMemory for NoDevice {
    fn name(&self) -> &str {
        "cpu"
    }

    fn release_memory(&self) -> bool {
        false
    }
}
