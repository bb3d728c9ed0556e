//! Allocation preconditions - pure predicates plus their throwing counterparts
//!
//! The allocator never re-validates: validated call sites (or sites that
//! profile the checks themselves) call it directly, generic and reflective
//! paths go through `check_*` first.

use crate::error::AllocationError;
use crate::logging::log_validation_failure;
use crate::objects::ClassDescriptor;

/// Validation entry points for allocation requests
#[derive(Debug, Clone, Copy)]
pub struct AllocationChecks;

impl AllocationChecks {
    /// Guest limit on `multianewarray` dimensions
    pub const MAX_DIMENSIONS: usize = 255;

    /// Plain, concrete object class
    #[inline]
    pub fn can_allocate_instance(class: &ClassDescriptor) -> bool {
        class.is_object_class() && !class.is_abstract() && !class.is_interface()
    }

    #[inline]
    pub fn can_allocate_array(length: i32) -> bool {
        length >= 0
    }

    pub fn can_allocate_multi_array(component: &ClassDescriptor, dimensions: &[i32]) -> bool {
        !invalid_component(component)
            && !invalid_dimensions_count(dimensions)
            && !invalid_dimensions(dimensions)
    }

    pub fn check_instance(class: &ClassDescriptor) -> Result<(), AllocationError> {
        if Self::can_allocate_instance(class) {
            return Ok(());
        }
        fail(AllocationError::InstantiationNotPermitted { class: class.name().to_string() })
    }

    pub fn check_array(length: i32) -> Result<(), AllocationError> {
        if Self::can_allocate_array(length) {
            return Ok(());
        }
        fail(AllocationError::NegativeArrayLength { length })
    }

    /// Reports the first failure in order: component, dimension count, negative dimension
    pub fn check_multi_array(component: &ClassDescriptor, dimensions: &[i32]) -> Result<(), AllocationError> {
        if invalid_component(component) {
            return fail(AllocationError::InvalidMultiArrayComponent {
                class: component.name().to_string(),
            });
        }
        if invalid_dimensions_count(dimensions) {
            return fail(AllocationError::InvalidMultiArrayDimensionsCount { count: dimensions.len() });
        }
        if let Some(&length) = dimensions.iter().find(|&&dim| !Self::can_allocate_array(dim)) {
            return fail(AllocationError::NegativeArrayLength { length });
        }
        Ok(())
    }
}

#[inline]
fn invalid_component(component: &ClassDescriptor) -> bool {
    component.is_void()
}

#[inline]
fn invalid_dimensions_count(dimensions: &[i32]) -> bool {
    dimensions.is_empty() || dimensions.len() > AllocationChecks::MAX_DIMENSIONS
}

#[inline]
fn invalid_dimensions(dimensions: &[i32]) -> bool {
    dimensions.iter().any(|&dim| !AllocationChecks::can_allocate_array(dim))
}

#[cold]
fn fail(error: AllocationError) -> Result<(), AllocationError> {
    log_validation_failure(&error);
    Err(error)
}
