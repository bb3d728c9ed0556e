//! Multi-dimensional arrays
//!
//! Design: `component` is the element class of the outermost array, so
//! `[2, 3]` of `int` is requested with the `int[]` class. Each level is built
//! recursively and tracked on its own; the innermost level is a plain
//! primitive or reference array.

use super::{checked_length, wrapped, AllocationChecks, GuestAllocator, Specialization};
use crate::logging::perf;
use crate::objects::{ClassDescriptor, HostArray, ObjectHandle};
use std::sync::Arc;

impl GuestAllocator {
    /// Nested array with `dimensions[i]` elements at depth `i`.
    ///
    /// `component` must already have at least `dimensions.len() - 1` array
    /// levels (`int[]` for `[2, 3]`, `int[][]` for `[2, 3, 4]`).
    /// `AllocationChecks::check_multi_array` does not verify this, so
    /// reflective callers must derive the component from the requested array
    /// class. A shallower component is a programming fault and panics.
    pub fn create_multi_array(&self, component: &Arc<ClassDescriptor>, dimensions: &[i32]) -> ObjectHandle {
        debug_assert!(
            AllocationChecks::can_allocate_multi_array(component, dimensions),
            "invalid multi-array request for {}",
            component.name()
        );
        debug_assert!(
            dimensions.len() <= component.dimensions() + 1,
            "{} cannot hold {} dimensions",
            component.name(),
            dimensions.len()
        );
        let _guard = perf::track("create_multi_array");
        self.multi_array_level(component, dimensions)
    }

    fn multi_array_level(&self, component: &Arc<ClassDescriptor>, dimensions: &[i32]) -> ObjectHandle {
        let (&length, rest) = match dimensions.split_first() {
            Some(split) => split,
            None => panic!("multi-array request without dimensions"),
        };
        if rest.is_empty() {
            return match component.primitive_kind() {
                Some(kind) => self.create_primitive_array(kind, length),
                None => self.create_reference_array(component, length),
            };
        }

        let Some(inner) = component.component() else {
            panic!("{} has fewer dimensions than requested", component.name());
        };
        let len = checked_length(length);
        let elements = match Specialization::for_count(len, &self.config) {
            Specialization::Unrolled => self.fill_unrolled(inner, rest, len),
            Specialization::Generic => self.fill_generic(inner, rest, len),
        };
        let array = wrapped(component.array_class(), HostArray::from(elements));
        self.track(array, "multi-array")
    }

    #[inline]
    fn fill_unrolled(&self, inner: &Arc<ClassDescriptor>, rest: &[i32], len: usize) -> Vec<ObjectHandle> {
        (0..len).map(|_| self.multi_array_level(inner, rest)).collect()
    }

    fn fill_generic(&self, inner: &Arc<ClassDescriptor>, rest: &[i32], len: usize) -> Vec<ObjectHandle> {
        let mut elements = Vec::with_capacity(len);
        for _ in 0..len {
            elements.push(self.multi_array_level(inner, rest));
        }
        elements
    }
}
