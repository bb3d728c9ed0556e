//! Guest allocator - the single entry point for creating guest objects
//!
//! Design: Every object the runtime hands to guest code comes from here, so
//! that objects are initialized before they are published and every one of
//! them goes through the allocation tracker exactly once:
//! 1. Instances and static storage: raw storage from the class shape, then
//!    reference slots nulled per visibility rules
//! 2. Arrays: primitive, reference, multi-dimensional, or wrapped host buffers
//! 3. Class mirrors with module fix-ups (see `mirror`)
//! 4. Foreign wrappers (see `foreign`)
//!
//! Preconditions are checked by `AllocationChecks` before calling in. The
//! allocator only asserts them.

mod checks;
mod foreign;
mod init;
mod mirror;
mod multi;


pub use checks::AllocationChecks;
pub use init::Specialization;

use crate::config::AllocatorConfig;
use crate::error::AllocationError;
use crate::logging::{log_allocation, log_validation_failure};
use crate::objects::{
    ClassDescriptor, FieldStorage, HeapObject, HostArray, Meta, ObjectBody, ObjectHandle, ObjectHeader,
    PrimitiveKind, ShapeDescriptor,
};
use crate::tracker::{self, AllocationTracker};
use mirror::ModuleFixups;
use std::fmt;
use std::sync::Arc;

/// Creates every guest object of one runtime instance
pub struct GuestAllocator {
    meta: Arc<Meta>,
    tracker: Arc<dyn AllocationTracker>,
    config: AllocatorConfig,
    modules: ModuleFixups,
}

impl GuestAllocator {
    pub fn new(meta: Arc<Meta>, tracker: Arc<dyn AllocationTracker>, config: AllocatorConfig) -> Self {
        Self {
            meta,
            tracker,
            config,
            modules: ModuleFixups::default(),
        }
    }

    /// Allocator reporting to the process-wide counting tracker
    pub fn with_global_tracker(meta: Arc<Meta>, config: AllocatorConfig) -> Self {
        let tracker: Arc<dyn AllocationTracker> = tracker::global();
        Self::new(meta, tracker, config)
    }

    #[inline]
    pub fn meta(&self) -> &Arc<Meta> {
        &self.meta
    }

    #[inline]
    pub fn config(&self) -> &AllocatorConfig {
        &self.config
    }

    /// New instance of a concrete object class.
    ///
    /// Runs class initialization first. Visible reference fields read as the
    /// guest null, primitives as zero.
    pub fn create_instance(&self, class: &Arc<ClassDescriptor>) -> ObjectHandle {
        let how = Specialization::for_shape(class.instance_shape(), &self.config);
        self.create_instance_specialized(class, how)
    }

    /// `create_instance` with the initialization strategy chosen by the caller
    pub fn create_instance_specialized(&self, class: &Arc<ClassDescriptor>, how: Specialization) -> ObjectHandle {
        debug_assert!(
            AllocationChecks::can_allocate_instance(class),
            "{} cannot be instantiated",
            class.name()
        );
        class.ensure_initialized();
        let object = self.shaped(class, class.instance_shape(), how);
        self.track(object, "instance")
    }

    /// Static-field storage of `class`; hidden reference slots are nulled too
    pub fn create_statics(&self, class: &Arc<ClassDescriptor>) -> ObjectHandle {
        debug_assert!(class.is_object_class(), "{} has no static storage", class.name());
        let shape = class.static_shape();
        let object = self.shaped(class, shape, Specialization::for_shape(shape, &self.config));
        self.track(object, "statics")
    }

    /// Zero-filled array of a primitive kind (`boolean` is byte-backed)
    pub fn create_primitive_array(&self, kind: PrimitiveKind, length: i32) -> ObjectHandle {
        let len = checked_length(length);
        let class = self.meta.primitive(kind).array_class();
        let array = wrapped(class, HostArray::zeroed(kind, len));
        self.track(array, "array")
    }

    /// Zero-filled array whose component is the primitive class `component`
    pub fn create_primitive_array_of(&self, component: &ClassDescriptor, length: i32) -> ObjectHandle {
        let Some(kind) = component.primitive_kind() else {
            panic!("{} is not a primitive array component", component.name());
        };
        self.create_primitive_array(kind, length)
    }

    /// Array of `length` guest nulls
    pub fn create_reference_array(&self, component: &Arc<ClassDescriptor>, length: i32) -> ObjectHandle {
        debug_assert!(!component.is_primitive(), "{} is not a reference component", component.name());
        let len = checked_length(length);
        let array = wrapped(component.array_class(), HostArray::nulls(len));
        self.track(array, "array")
    }

    /// Present an existing host buffer as a guest array without copying it
    pub fn wrap_array(&self, array_class: &Arc<ClassDescriptor>, storage: HostArray) -> ObjectHandle {
        let Some(component) = array_class.component() else {
            panic!("{} is not an array class", array_class.name());
        };
        match component.primitive_kind() {
            Some(kind) => assert!(storage.can_back(kind), "{:?} buffer cannot back {}", storage.storage_kind(), array_class.name()),
            None => assert!(storage.is_reference(), "primitive buffer cannot back {}", array_class.name()),
        }
        let array = wrapped(Arc::clone(array_class), storage);
        self.track(array, "array")
    }

    /// Shallow copy: same class, same field values or a fresh copy of the
    /// array buffer, and a new identity. Copying the guest null yields null.
    pub fn copy(&self, object: &ObjectHandle) -> Result<ObjectHandle, AllocationError> {
        let Some(source) = object.get() else {
            return Ok(ObjectHandle::null());
        };
        let body = match source.body() {
            ObjectBody::Fields(fields) => ObjectBody::Fields(fields.duplicate()),
            ObjectBody::Array(array) => ObjectBody::Array(array.duplicate()),
            ObjectBody::Foreign(_) => {
                let error = AllocationError::CloneUnsupported;
                log_validation_failure(&error);
                return Err(error);
            }
        };
        let header = ObjectHeader::new(source.header().class().cloned(), source.header().flags());
        let copy = ObjectHandle::from_object(HeapObject::new(header, body));
        Ok(self.track(copy, "copy"))
    }

    /// Object of `class` with raw storage for `shape`, fields initialized but
    /// not yet tracked
    fn shaped(&self, class: &Arc<ClassDescriptor>, shape: &ShapeDescriptor, how: Specialization) -> ObjectHandle {
        let storage = FieldStorage::for_shape(shape);
        init::init_fields(&storage, shape, how);
        ObjectHandle::from_object(HeapObject::new(
            ObjectHeader::new(Some(Arc::clone(class)), 0),
            ObjectBody::Fields(storage),
        ))
    }

    fn track(&self, object: ObjectHandle, what: &'static str) -> ObjectHandle {
        log_allocation(object.class().map_or("<foreign null>", |class| class.name()), what);
        self.tracker.record(object)
    }
}

impl fmt::Debug for GuestAllocator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GuestAllocator")
            .field("config", &self.config)
            .field("modules", &self.modules)
            .finish_non_exhaustive()
    }
}

/// Untracked array object of `class` over `storage`
fn wrapped(class: Arc<ClassDescriptor>, storage: HostArray) -> ObjectHandle {
    ObjectHandle::from_object(HeapObject::new(
        ObjectHeader::new(Some(class), ObjectHeader::FLAG_ARRAY),
        ObjectBody::Array(storage),
    ))
}

#[inline]
fn checked_length(length: i32) -> usize {
    assert!(AllocationChecks::can_allocate_array(length), "negative array length {length}");
    length as usize
}
