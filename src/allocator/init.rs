//! Field initialization strategies
//!
//! Design: Two loops with identical results:
//! 1. Unrolled: the shape is known up front, so walk the reference cells its
//!    link-time plan lists, with no per-slot tests
//! 2. Generic: scan every slot and filter on its tags
//!
//! The choice is a performance hint only.

use crate::config::AllocatorConfig;
use crate::objects::{FieldStorage, ObjectHandle, ShapeDescriptor, SlotValue, StorageClass};

/// Which form of an initialization loop to run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Specialization {
    /// Count known up front (precomputed plan, fixed trip count)
    Unrolled,
    /// Count only known at run time
    Generic,
}

impl Specialization {
    /// Shapes within the configured limit take the precomputed plan
    #[inline]
    pub fn for_shape(shape: &ShapeDescriptor, config: &AllocatorConfig) -> Self {
        Self::for_count(shape.len(), config)
    }

    #[inline]
    pub fn for_count(count: usize, config: &AllocatorConfig) -> Self {
        if config.unroll_limit > 0 && count <= config.unroll_limit {
            Self::Unrolled
        } else {
            Self::Generic
        }
    }
}

/// Store the guest null in every reference cell `shape` requires
pub(crate) fn init_fields(storage: &FieldStorage, shape: &ShapeDescriptor, how: Specialization) {
    match how {
        Specialization::Unrolled => init_unrolled(storage, shape),
        Specialization::Generic => init_generic(storage, shape),
    }
}

#[inline]
fn init_unrolled(storage: &FieldStorage, shape: &ShapeDescriptor) {
    let mut cells = storage.references_mut();
    for &cell in shape.null_plan() {
        cells[cell as usize] = SlotValue::Guest(ObjectHandle::null());
    }
}

fn init_generic(storage: &FieldStorage, shape: &ShapeDescriptor) {
    let statics = shape.storage() == StorageClass::Static;
    let mut cells = storage.references_mut();
    for slot in shape.slots() {
        debug_assert_eq!(slot.is_static(), statics);
        if !slot.is_reference() || slot.is_removed() {
            continue;
        }
        // Static storage also nulls hidden (runtime-injected) slots
        if statics || !slot.is_hidden() {
            cells[slot.offset()] = SlotValue::Guest(ObjectHandle::null());
        }
    }
}
