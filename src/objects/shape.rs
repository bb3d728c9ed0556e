//! Shape descriptors - immutable field layout of a class
//!
//! Design: Two storage areas per object, mirroring how the host keeps guest fields:
//! 1. Reference area: one cell per reference slot, indexed by slot offset
//! 2. Primitive area: packed bytes, each slot aligned to its own width
//!
//! Slots carry their attributes as tags (kind, visibility, storage class, removed)
//! so initialization filters on tags instead of dispatching on slot types.

use super::kind::{PrimitiveKind, SlotKind};
use smallvec::SmallVec;

/// Whether guest code can see a slot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Visibility {
    Visible,
    /// Runtime-internal slot (injected by the VM, invisible to guest reflection)
    Hidden,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StorageClass {
    Instance,
    Static,
}

/// Slot declaration handed over by class linking
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SlotSpec {
    pub name: String,
    pub kind: SlotKind,
    pub visibility: Visibility,
    pub removed: bool,
}

impl SlotSpec {
    pub fn reference(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: SlotKind::Reference,
            visibility: Visibility::Visible,
            removed: false,
        }
    }

    pub fn primitive(name: impl Into<String>, kind: PrimitiveKind) -> Self {
        Self {
            name: name.into(),
            kind: SlotKind::Primitive(kind),
            visibility: Visibility::Visible,
            removed: false,
        }
    }

    pub fn hidden(mut self) -> Self {
        self.visibility = Visibility::Hidden;
        self
    }

    /// Slot dropped by a class redefinition; keeps its storage but is never touched
    pub fn removed(mut self) -> Self {
        self.removed = true;
        self
    }
}

/// One laid-out field position
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Slot {
    name: Box<str>,
    kind: SlotKind,
    visibility: Visibility,
    storage: StorageClass,
    removed: bool,
    /// Cell index for references, byte offset for primitives
    offset: u32,
}

impl Slot {
    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    pub fn kind(&self) -> SlotKind {
        self.kind
    }

    #[inline]
    pub fn is_reference(&self) -> bool {
        self.kind.is_reference()
    }

    #[inline]
    pub fn is_hidden(&self) -> bool {
        self.visibility == Visibility::Hidden
    }

    #[inline]
    pub fn is_static(&self) -> bool {
        self.storage == StorageClass::Static
    }

    #[inline]
    pub fn is_removed(&self) -> bool {
        self.removed
    }

    #[inline]
    pub(crate) fn offset(&self) -> usize {
        self.offset as usize
    }

    /// Whether allocation must store the guest null in this slot.
    ///
    /// Instance storage nulls visible references only; hidden instance slots stay
    /// unset until the runtime writes them. Static storage nulls hidden
    /// references too.
    #[inline]
    pub fn needs_null_init(&self) -> bool {
        self.is_reference()
            && !self.removed
            && (self.storage == StorageClass::Static || self.visibility == Visibility::Visible)
    }
}

/// Immutable layout of either the instance or the static fields of a class
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShapeDescriptor {
    storage: StorageClass,
    slots: Box<[Slot]>,
    reference_count: usize,
    primitive_bytes: usize,
    /// Reference cells to null, precomputed at link time
    null_plan: SmallVec<[u32; 8]>,
}

impl ShapeDescriptor {
    pub fn new(storage: StorageClass, specs: impl IntoIterator<Item = SlotSpec>) -> Self {
        let mut slots = Vec::new();
        let mut reference_count = 0usize;
        let mut primitive_bytes = 0usize;

        for spec in specs {
            let offset = match spec.kind {
                SlotKind::Reference => {
                    reference_count += 1;
                    reference_count - 1
                }
                SlotKind::Primitive(kind) => {
                    let at = align_up(primitive_bytes, kind.align());
                    primitive_bytes = at + kind.size();
                    at
                }
            };
            slots.push(Slot {
                name: spec.name.into_boxed_str(),
                kind: spec.kind,
                visibility: spec.visibility,
                storage,
                removed: spec.removed,
                offset: offset as u32,
            });
        }

        let null_plan = slots
            .iter()
            .filter(|slot| slot.needs_null_init())
            .map(|slot| slot.offset)
            .collect();

        Self {
            storage,
            slots: slots.into_boxed_slice(),
            reference_count,
            primitive_bytes,
            null_plan,
        }
    }

    pub fn empty(storage: StorageClass) -> Self {
        Self::new(storage, Vec::new())
    }

    #[inline]
    pub fn storage(&self) -> StorageClass {
        self.storage
    }

    #[inline]
    pub fn slots(&self) -> &[Slot] {
        &self.slots
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Find a slot by name (first match; removed slots are skipped)
    pub fn slot(&self, name: &str) -> Option<&Slot> {
        self.slots.iter().find(|slot| !slot.removed && slot.name() == name)
    }

    #[inline]
    pub fn reference_count(&self) -> usize {
        self.reference_count
    }

    #[inline]
    pub fn primitive_bytes(&self) -> usize {
        self.primitive_bytes
    }

    #[inline]
    pub(crate) fn null_plan(&self) -> &[u32] {
        &self.null_plan
    }
}

/// Round `offset` up to a multiple of `align` (power of two)
#[inline(always)]
const fn align_up(offset: usize, align: usize) -> usize {
    (offset + align - 1) & !(align - 1)
}
