//! Class mirrors - the guest-visible object standing for a class
//!
//! Design: A mirror is an instance of the metaclass with its reflective slots
//! filled from the class descriptor. The owning module may not exist yet while
//! the core library boots; such mirrors wait in a fix-up list keyed by class
//! and are patched when the core module is defined.

use super::{GuestAllocator, Specialization};
use crate::logging::{log_fixup_deferred, log_fixups_resolved, perf};
use crate::objects::{ClassDescriptor, ClassId, FieldStorage, HeapObject, ObjectBody, ObjectHandle, ObjectHeader, SlotValue};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Core module plus the mirrors still waiting for it
#[derive(Default)]
pub(crate) struct ModuleFixups {
    state: Mutex<FixupState>,
}

#[derive(Default)]
struct FixupState {
    core_module: ObjectHandle,
    /// Every mirror created for a class before the core module existed
    pending: HashMap<ClassId, Vec<ObjectHandle>>,
}

impl fmt::Debug for ModuleFixups {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.state.lock();
        f.debug_struct("ModuleFixups")
            .field("core_module_defined", &!state.core_module.is_null())
            .field("pending", &state.pending.values().map(Vec::len).sum::<usize>())
            .finish()
    }
}

impl GuestAllocator {
    /// New mirror of `class`, tracked like any other object.
    ///
    /// Prefer `mirror_of`, which creates the mirror once per class.
    pub fn create_class_mirror(&self, class: &Arc<ClassDescriptor>) -> ObjectHandle {
        let meta = &self.meta;
        let shape = meta.class.instance_shape();
        let storage = FieldStorage::for_shape(shape);
        super::init::init_fields(&storage, shape, Specialization::for_shape(shape, &self.config));

        storage.set_object(meta.class_loader_slot(), class.defining_loader().clone());
        if let (Some(slot), Some(component)) = (meta.component_type_slot(), class.component()) {
            storage.set_object(slot, self.mirror_of(component));
        }
        storage.set_reference(meta.protection_domain_slot(), SlotValue::Guest(ObjectHandle::null()));
        storage.set_reference(meta.mirror_class_slot(), SlotValue::Class(Arc::clone(class)));

        let mirror = ObjectHandle::from_object(HeapObject::new(
            ObjectHeader::new(Some(Arc::clone(&meta.class)), 0),
            ObjectBody::Fields(storage),
        ));
        if self.config.modules_enabled {
            self.assign_module(class, &mirror);
        }
        self.track(mirror, "mirror")
    }

    /// The mirror of `class`, created on first request
    pub fn mirror_of(&self, class: &Arc<ClassDescriptor>) -> ObjectHandle {
        class.mirror.get_or_init(|| self.create_class_mirror(class)).clone()
    }

    /// Record the core module and patch every mirror deferred so far.
    ///
    /// Returns how many mirrors were patched.
    pub fn define_core_module(&self, module: ObjectHandle) -> usize {
        assert!(!module.is_null(), "core module must be a guest object");
        let _guard = perf::track("define_core_module");
        let pending = {
            let mut state = self.modules.state.lock();
            state.core_module = module.clone();
            std::mem::take(&mut state.pending)
        };

        let mirrors: Vec<ObjectHandle> = pending.into_values().flatten().collect();
        if let Some(slot) = self.meta.module_slot() {
            for mirror in &mirrors {
                if let Some(fields) = mirror.fields() {
                    fields.set_object(slot, module.clone());
                }
            }
        }
        log_fixups_resolved(mirrors.len());
        mirrors.len()
    }

    pub fn is_core_module_defined(&self) -> bool {
        !self.modules.state.lock().core_module.is_null()
    }

    /// Mirrors still waiting for the core module
    pub fn pending_fixups(&self) -> usize {
        self.modules.state.lock().pending.values().map(Vec::len).sum()
    }

    fn assign_module(&self, class: &ClassDescriptor, mirror: &ObjectHandle) {
        let (Some(slot), Some(fields)) = (self.meta.module_slot(), mirror.fields()) else {
            return;
        };
        if !class.module().is_null() {
            fields.set_object(slot, class.module().clone());
            return;
        }

        // Checking and deferring under one lock so a concurrent definition
        // either sees this mirror in the list or is seen here
        let mut state = self.modules.state.lock();
        if state.core_module.is_null() {
            state.pending.entry(class.id()).or_default().push(mirror.clone());
            drop(state);
            log_fixup_deferred(class.name());
        } else {
            fields.set_object(slot, state.core_module.clone());
        }
    }
}
