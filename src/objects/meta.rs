//! Well-known classes the allocator needs by identity
//!
//! Built once per runtime; in a full VM these come out of the boot class path.

use super::class::{ClassBuilder, ClassDescriptor};
use super::kind::PrimitiveKind;
use super::shape::{Slot, SlotSpec};
use std::sync::Arc;

pub const OBJECT_CLASS: &str = "java/lang/Object";
pub const CLASS_CLASS: &str = "java/lang/Class";
pub const FOREIGN_EXCEPTION_CLASS: &str = "polyglot/ForeignException";

const CLASS_LOADER_FIELD: &str = "classLoader";
const MODULE_FIELD: &str = "module";
const COMPONENT_TYPE_FIELD: &str = "componentType";
const PROTECTION_DOMAIN_FIELD: &str = "0protection_domain";
const MIRROR_CLASS_FIELD: &str = "0mirror_klass";

/// Well-known classes plus resolved metaclass slots
#[derive(Debug)]
pub struct Meta {
    pub object: Arc<ClassDescriptor>,
    /// Metaclass: shape of every class mirror
    pub class: Arc<ClassDescriptor>,
    pub void: Arc<ClassDescriptor>,
    pub foreign_exception: Arc<ClassDescriptor>,
    primitives: [Arc<ClassDescriptor>; 8],
    mirror_slots: MirrorSlots,
}

/// Positions of the reflective slots inside the metaclass instance shape
#[derive(Debug, Clone, Copy)]
struct MirrorSlots {
    class_loader: usize,
    module: Option<usize>,
    component_type: Option<usize>,
    protection_domain: usize,
    mirror_class: usize,
}

impl Meta {
    /// Minimal class universe for a runtime with module support
    pub fn bootstrap() -> Arc<Self> {
        Self::with_metaclass(
            ClassBuilder::new(CLASS_CLASS)
                .field(SlotSpec::reference(CLASS_LOADER_FIELD))
                .field(SlotSpec::reference(MODULE_FIELD))
                .field(SlotSpec::reference(COMPONENT_TYPE_FIELD))
                .field(SlotSpec::reference("name"))
                .field(SlotSpec::primitive("classRedefinedCount", PrimitiveKind::Int))
                .field(SlotSpec::reference(PROTECTION_DOMAIN_FIELD).hidden())
                .field(SlotSpec::reference(MIRROR_CLASS_FIELD).hidden()),
        )
    }

    /// Class universe for a runtime predating modules: the metaclass has no
    /// `module` or `componentType` slot
    pub fn bootstrap_legacy() -> Arc<Self> {
        Self::with_metaclass(
            ClassBuilder::new(CLASS_CLASS)
                .field(SlotSpec::reference(CLASS_LOADER_FIELD))
                .field(SlotSpec::reference("name"))
                .field(SlotSpec::reference(PROTECTION_DOMAIN_FIELD).hidden())
                .field(SlotSpec::reference(MIRROR_CLASS_FIELD).hidden()),
        )
    }

    fn with_metaclass(metaclass: ClassBuilder) -> Arc<Self> {
        let object = ClassBuilder::new(OBJECT_CLASS).build();
        let class = metaclass.superclass(Arc::clone(&object)).build();
        let foreign_exception = ClassBuilder::new(FOREIGN_EXCEPTION_CLASS)
            .superclass(Arc::clone(&object))
            .build();
        let primitives = PrimitiveKind::ALL.map(ClassDescriptor::primitive);

        let index_of = |name: &str| {
            class
                .instance_shape()
                .slots()
                .iter()
                .position(|slot| slot.name() == name)
        };
        let mirror_slots = MirrorSlots {
            class_loader: index_of(CLASS_LOADER_FIELD).unwrap_or_else(|| missing(CLASS_LOADER_FIELD)),
            module: index_of(MODULE_FIELD),
            component_type: index_of(COMPONENT_TYPE_FIELD),
            protection_domain: index_of(PROTECTION_DOMAIN_FIELD)
                .unwrap_or_else(|| missing(PROTECTION_DOMAIN_FIELD)),
            mirror_class: index_of(MIRROR_CLASS_FIELD).unwrap_or_else(|| missing(MIRROR_CLASS_FIELD)),
        };

        Arc::new(Self {
            object,
            class,
            void: ClassDescriptor::void(),
            foreign_exception,
            primitives,
            mirror_slots,
        })
    }

    #[inline]
    pub fn primitive(&self, kind: PrimitiveKind) -> &Arc<ClassDescriptor> {
        &self.primitives[kind.index()]
    }

    fn mirror_slot(&self, index: usize) -> &Slot {
        &self.class.instance_shape().slots()[index]
    }

    pub fn class_loader_slot(&self) -> &Slot {
        self.mirror_slot(self.mirror_slots.class_loader)
    }

    pub fn module_slot(&self) -> Option<&Slot> {
        self.mirror_slots.module.map(|index| self.mirror_slot(index))
    }

    pub fn component_type_slot(&self) -> Option<&Slot> {
        self.mirror_slots.component_type.map(|index| self.mirror_slot(index))
    }

    pub fn protection_domain_slot(&self) -> &Slot {
        self.mirror_slot(self.mirror_slots.protection_domain)
    }

    pub fn mirror_class_slot(&self) -> &Slot {
        self.mirror_slot(self.mirror_slots.mirror_class)
    }
}

fn missing(field: &str) -> usize {
    panic!("metaclass {CLASS_CLASS} lacks required field {field}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn primitives_indexed_by_kind() {
        let meta = Meta::bootstrap();
        for kind in PrimitiveKind::ALL {
            assert_eq!(meta.primitive(kind).primitive_kind(), Some(kind));
        }
    }

    #[test]
    fn metaclass_slots_resolved() {
        let meta = Meta::bootstrap();
        assert_eq!(meta.class_loader_slot().name(), CLASS_LOADER_FIELD);
        assert!(meta.module_slot().is_some());
        assert!(meta.component_type_slot().is_some());
        assert!(meta.protection_domain_slot().is_hidden());
        assert!(meta.mirror_class_slot().is_hidden());
    }

    #[test]
    fn legacy_metaclass_has_no_module_slot() {
        let meta = Meta::bootstrap_legacy();
        assert!(meta.module_slot().is_none());
        assert!(meta.component_type_slot().is_none());
    }

    #[test]
    fn void_is_not_an_object_class() {
        let meta = Meta::bootstrap();
        assert!(meta.void.is_void());
        assert!(meta.void.is_primitive());
        assert!(!meta.void.is_object_class());
    }
}
