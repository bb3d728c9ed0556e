//! Guest heap - object allocation for a managed-language runtime
//!
//! Every guest object is created through `GuestAllocator`: instances, static
//! storage, primitive / reference / multi-dimensional arrays, wrapped host
//! buffers, shallow copies, class mirrors and foreign wrappers. Requests are
//! validated up front with `AllocationChecks`, and each object is handed to an
//! `AllocationTracker` before it is published.

pub mod allocator;
pub mod config;
pub mod error;
pub mod interop;
pub mod logging;
pub mod objects;
pub mod tracker;

// Re-export commonly used items
pub use allocator::{AllocationChecks, GuestAllocator, Specialization};
pub use config::AllocatorConfig;
pub use error::{AllocationError, ConfigError, GuestException};
pub use interop::{BasicInterop, ForeignValue, InteropCapability};
pub use objects::{
    ClassBuilder, ClassDescriptor, HostArray, Meta, ObjectHandle, PrimitiveKind, ShapeDescriptor, SlotSpec,
    SlotValue,
};
pub use tracker::{AllocationTracker, CountingTracker, TrackerStats};

/// Initialize logging from the environment (idempotent)
pub fn init() {
    logging::init();
    logging::log_runtime_init();
}
