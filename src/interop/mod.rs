//! Interoperability - values produced outside the guest object model
//!
//! Design: A foreign value is opaque to the allocator. Everything the allocator
//! needs to know about it is asked through an `InteropCapability`:
//! - `is_null`: the value stands for "no object" in its own language
//! - `is_exception`: the value is a foreign exception
//!
//! The capability travels with the wrapper so later guest operations can keep
//! asking the same library.

use std::any::Any;
use std::fmt;
use std::sync::Arc;

#[cfg(test)]
mod tests;

/// Opaque host-native value
#[derive(Clone)]
pub struct ForeignValue(Arc<dyn Any + Send + Sync>);

impl ForeignValue {
    pub fn new<T: Any + Send + Sync>(value: T) -> Self {
        Self(Arc::new(value))
    }

    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.0.downcast_ref::<T>()
    }

    #[inline]
    pub fn is<T: Any>(&self) -> bool {
        self.0.is::<T>()
    }

    /// Same underlying host value
    #[inline]
    pub fn ptr_eq(&self, other: &ForeignValue) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl fmt::Debug for ForeignValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ForeignValue {{ ... }}")
    }
}

/// Queries the allocator asks about foreign values
pub trait InteropCapability: Send + Sync {
    fn is_null(&self, value: &ForeignValue) -> bool;

    fn is_exception(&self, value: &ForeignValue) -> bool;
}

/// Body of a foreign wrapper
#[derive(Clone)]
pub struct ForeignObject {
    value: ForeignValue,
    interop: Arc<dyn InteropCapability>,
}

impl ForeignObject {
    pub(crate) fn new(value: ForeignValue, interop: Arc<dyn InteropCapability>) -> Self {
        Self { value, interop }
    }

    #[inline]
    pub fn value(&self) -> &ForeignValue {
        &self.value
    }

    #[inline]
    pub fn interop(&self) -> &Arc<dyn InteropCapability> {
        &self.interop
    }

    pub fn is_null(&self) -> bool {
        self.interop.is_null(&self.value)
    }

    pub fn is_exception(&self) -> bool {
        self.interop.is_exception(&self.value)
    }
}

impl fmt::Debug for ForeignObject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ForeignObject").field("value", &self.value).finish_non_exhaustive()
    }
}

/// Host-side null understood by `BasicInterop`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ForeignNull;

/// Host-side exception understood by `BasicInterop`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ForeignError(pub String);

/// Capability for host values built from the marker types above
#[derive(Debug, Clone, Copy, Default)]
pub struct BasicInterop;

impl InteropCapability for BasicInterop {
    fn is_null(&self, value: &ForeignValue) -> bool {
        value.is::<ForeignNull>() || value.is::<()>()
    }

    fn is_exception(&self, value: &ForeignValue) -> bool {
        value.is::<ForeignError>()
    }
}
