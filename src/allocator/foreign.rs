//! Foreign wrappers - guest objects around values from another language

use super::GuestAllocator;
use crate::interop::{ForeignObject, ForeignValue, InteropCapability};
use crate::objects::{ClassDescriptor, HeapObject, ObjectBody, ObjectHandle, ObjectHeader};
use std::sync::Arc;

impl GuestAllocator {
    /// Wrap `value` as an instance of `class`.
    ///
    /// A value the capability reports as null becomes a foreign-null wrapper
    /// and `class` is ignored; otherwise `class` is initialized first.
    pub fn wrap_foreign(
        &self,
        class: &Arc<ClassDescriptor>,
        value: ForeignValue,
        interop: &Arc<dyn InteropCapability>,
    ) -> ObjectHandle {
        if interop.is_null(&value) {
            return self.create_foreign_null(value, interop);
        }
        class.ensure_initialized();
        self.foreign(Some(Arc::clone(class)), value, interop)
    }

    /// Classless wrapper standing for a foreign null
    pub fn create_foreign_null(&self, value: ForeignValue, interop: &Arc<dyn InteropCapability>) -> ObjectHandle {
        debug_assert!(interop.is_null(&value), "value is not a foreign null");
        self.foreign(None, value, interop)
    }

    /// Wrap a foreign exception as an instance of the foreign-exception class
    pub fn create_foreign_exception(&self, value: ForeignValue, interop: &Arc<dyn InteropCapability>) -> ObjectHandle {
        debug_assert!(interop.is_exception(&value), "value is not a foreign exception");
        let class = Arc::clone(&self.meta.foreign_exception);
        self.wrap_foreign(&class, value, interop)
    }

    fn foreign(
        &self,
        class: Option<Arc<ClassDescriptor>>,
        value: ForeignValue,
        interop: &Arc<dyn InteropCapability>,
    ) -> ObjectHandle {
        let object = ObjectHandle::from_object(HeapObject::new(
            ObjectHeader::new(class, ObjectHeader::FLAG_FOREIGN),
            ObjectBody::Foreign(ForeignObject::new(value, Arc::clone(interop))),
        ));
        self.track(object, "foreign")
    }
}
