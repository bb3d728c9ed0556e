//! Object handles - the guest view of heap objects
//!
//! Design: A handle is a host reference-counted pointer, or the distinguished
//! guest null. Objects are a tagged union over their body:
//! - `Fields`: guest-shaped storage laid out by a `ShapeDescriptor`
//! - `Array`: a wrapped host-native buffer
//! - `Foreign`: an opaque value produced outside the guest object model
//!
//! Storage is behind `RwLock`s because published objects are shared across
//! guest threads; the allocator writes them before the handle is published.

use super::array::HostArray;
use super::class::ClassDescriptor;
use super::header::ObjectHeader;
use super::shape::{ShapeDescriptor, Slot};
use crate::interop::ForeignObject;
use parking_lot::{RwLock, RwLockWriteGuard};
use std::fmt;
use std::sync::Arc;

/// Reference to a guest object, or the guest null
#[derive(Clone, Default)]
pub struct ObjectHandle(Option<Arc<HeapObject>>);

impl ObjectHandle {
    /// The guest null
    #[inline]
    pub const fn null() -> Self {
        Self(None)
    }

    #[inline]
    pub(crate) fn from_object(object: HeapObject) -> Self {
        Self(Some(Arc::new(object)))
    }

    #[inline]
    pub fn is_null(&self) -> bool {
        self.0.is_none()
    }

    #[inline]
    pub fn get(&self) -> Option<&HeapObject> {
        self.0.as_deref()
    }

    /// Identity comparison (two nulls are identical)
    #[inline]
    pub fn ptr_eq(&self, other: &ObjectHandle) -> bool {
        match (&self.0, &other.0) {
            (Some(a), Some(b)) => Arc::ptr_eq(a, b),
            (None, None) => true,
            _ => false,
        }
    }

    pub fn class(&self) -> Option<&Arc<ClassDescriptor>> {
        self.get().and_then(|obj| obj.header.class())
    }

    pub fn identity_hash(&self) -> u32 {
        self.get().map_or(0, |obj| obj.header.identity_hash())
    }

    pub fn is_array(&self) -> bool {
        self.get().is_some_and(|obj| obj.header.is_array())
    }

    pub fn is_foreign(&self) -> bool {
        self.get().is_some_and(|obj| obj.header.is_foreign())
    }

    /// Foreign wrapper standing for a foreign null (carries no class)
    pub fn is_foreign_null(&self) -> bool {
        self.get()
            .is_some_and(|obj| obj.header.is_foreign() && obj.header.class().is_none())
    }

    pub fn fields(&self) -> Option<&FieldStorage> {
        match &self.get()?.body {
            ObjectBody::Fields(fields) => Some(fields),
            _ => None,
        }
    }

    pub fn array(&self) -> Option<&HostArray> {
        match &self.get()?.body {
            ObjectBody::Array(array) => Some(array),
            _ => None,
        }
    }

    pub fn array_length(&self) -> Option<usize> {
        self.array().map(HostArray::len)
    }

    pub fn foreign(&self) -> Option<&ForeignObject> {
        match &self.get()?.body {
            ObjectBody::Foreign(foreign) => Some(foreign),
            _ => None,
        }
    }
}

impl PartialEq for ObjectHandle {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other)
    }
}

impl Eq for ObjectHandle {}

impl fmt::Debug for ObjectHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.get() {
            None => f.write_str("null"),
            Some(obj) => {
                let name = obj.header.class().map_or("<foreign>", |class| class.name());
                write!(f, "{}@{:08x}", name, obj.header.identity_hash())
            }
        }
    }
}

/// Heap-resident guest object
#[derive(Debug)]
pub struct HeapObject {
    header: ObjectHeader,
    body: ObjectBody,
}

impl HeapObject {
    pub(crate) fn new(header: ObjectHeader, body: ObjectBody) -> Self {
        Self { header, body }
    }

    #[inline]
    pub fn header(&self) -> &ObjectHeader {
        &self.header
    }

    #[inline]
    pub fn body(&self) -> &ObjectBody {
        &self.body
    }
}

#[derive(Debug)]
pub enum ObjectBody {
    Fields(FieldStorage),
    Array(HostArray),
    Foreign(ForeignObject),
}

/// Content of a reference cell
#[derive(Debug, Clone, Default)]
pub enum SlotValue {
    /// Never written: a hidden slot the runtime has not filled yet
    #[default]
    Unset,
    Guest(ObjectHandle),
    /// Host pointer kept in a hidden slot (e.g. a mirror's class back-pointer)
    Class(Arc<ClassDescriptor>),
}

impl SlotValue {
    #[inline]
    pub fn is_guest_null(&self) -> bool {
        matches!(self, Self::Guest(handle) if handle.is_null())
    }

    pub fn as_guest(&self) -> Option<&ObjectHandle> {
        match self {
            Self::Guest(handle) => Some(handle),
            _ => None,
        }
    }

    pub fn as_class(&self) -> Option<&Arc<ClassDescriptor>> {
        match self {
            Self::Class(class) => Some(class),
            _ => None,
        }
    }
}

/// Storage of a guest-shaped object: reference cells plus packed primitive bytes
#[derive(Debug)]
pub struct FieldStorage {
    references: RwLock<Box<[SlotValue]>>,
    primitives: RwLock<Box<[u8]>>,
}

impl FieldStorage {
    /// Raw storage for `shape`: primitives zeroed, reference cells unset
    pub(crate) fn for_shape(shape: &ShapeDescriptor) -> Self {
        Self {
            references: RwLock::new(vec![SlotValue::Unset; shape.reference_count()].into_boxed_slice()),
            primitives: RwLock::new(vec![0u8; shape.primitive_bytes()].into_boxed_slice()),
        }
    }

    /// Shallow field-for-field copy
    pub(crate) fn duplicate(&self) -> Self {
        Self {
            references: RwLock::new(self.references.read().clone()),
            primitives: RwLock::new(self.primitives.read().clone()),
        }
    }

    #[inline]
    pub(crate) fn references_mut(&self) -> RwLockWriteGuard<'_, Box<[SlotValue]>> {
        self.references.write()
    }

    pub fn reference(&self, slot: &Slot) -> SlotValue {
        debug_assert!(slot.is_reference(), "{} is not a reference slot", slot.name());
        self.references.read()[slot.offset()].clone()
    }

    /// Guest value of a reference slot (`None` while unset or holding a host pointer)
    pub fn object(&self, slot: &Slot) -> Option<ObjectHandle> {
        match self.reference(slot) {
            SlotValue::Guest(handle) => Some(handle),
            _ => None,
        }
    }

    pub fn set_object(&self, slot: &Slot, value: ObjectHandle) {
        self.set_reference(slot, SlotValue::Guest(value));
    }

    pub fn set_reference(&self, slot: &Slot, value: SlotValue) {
        debug_assert!(slot.is_reference(), "{} is not a reference slot", slot.name());
        debug_assert!(
            slot.is_hidden() || !matches!(value, SlotValue::Class(_) | SlotValue::Unset),
            "visible slot {} must hold a guest value",
            slot.name()
        );
        self.references.write()[slot.offset()] = value;
    }

    /// Read a primitive slot as its zero-extended bit pattern
    pub fn read_primitive(&self, slot: &Slot) -> u64 {
        let size = primitive_size(slot);
        let bytes = self.primitives.read();
        let mut word = [0u8; 8];
        word[..size].copy_from_slice(&bytes[slot.offset()..slot.offset() + size]);
        u64::from_le_bytes(word)
    }

    /// Write the low bytes of `bits` into a primitive slot
    pub fn write_primitive(&self, slot: &Slot, bits: u64) {
        let size = primitive_size(slot);
        let mut bytes = self.primitives.write();
        bytes[slot.offset()..slot.offset() + size].copy_from_slice(&bits.to_le_bytes()[..size]);
    }

    pub fn reference_cells(&self) -> usize {
        self.references.read().len()
    }

    pub fn primitive_bytes(&self) -> usize {
        self.primitives.read().len()
    }
}

fn primitive_size(slot: &Slot) -> usize {
    match slot.kind() {
        super::kind::SlotKind::Primitive(kind) => kind.size(),
        super::kind::SlotKind::Reference => {
            panic!("{} is a reference slot, not a primitive one", slot.name())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::objects::kind::PrimitiveKind;
    use crate::objects::shape::{SlotSpec, StorageClass};

    fn shape() -> ShapeDescriptor {
        ShapeDescriptor::new(
            StorageClass::Instance,
            vec![
                SlotSpec::reference("next"),
                SlotSpec::primitive("count", PrimitiveKind::Int),
                SlotSpec::primitive("total", PrimitiveKind::Long),
                SlotSpec::reference("meta").hidden(),
            ],
        )
    }

    #[test]
    fn raw_storage_starts_unset_and_zeroed() {
        let shape = shape();
        let storage = FieldStorage::for_shape(&shape);
        assert_eq!(storage.reference_cells(), 2);
        assert!(matches!(storage.reference(shape.slot("next").unwrap()), SlotValue::Unset));
        assert_eq!(storage.read_primitive(shape.slot("total").unwrap()), 0);
    }

    #[test]
    fn primitive_round_trip_keeps_neighbours() {
        let shape = shape();
        let storage = FieldStorage::for_shape(&shape);
        let count = shape.slot("count").unwrap();
        let total = shape.slot("total").unwrap();

        storage.write_primitive(count, (-1i32) as u32 as u64);
        storage.write_primitive(total, u64::MAX);
        assert_eq!(storage.read_primitive(count) as u32 as i32, -1);
        assert_eq!(storage.read_primitive(total), u64::MAX);
    }

    #[test]
    fn duplicate_is_independent() {
        let shape = shape();
        let storage = FieldStorage::for_shape(&shape);
        let count = shape.slot("count").unwrap();
        storage.write_primitive(count, 5);

        let copy = storage.duplicate();
        copy.write_primitive(count, 6);
        assert_eq!(storage.read_primitive(count), 5);
        assert_eq!(copy.read_primitive(count), 6);
    }

    #[test]
    fn null_handles() {
        let null = ObjectHandle::null();
        assert!(null.is_null());
        assert!(null.ptr_eq(&ObjectHandle::default()));
        assert!(null.class().is_none());
        assert_eq!(null.array_length(), None);
        assert_eq!(format!("{null:?}"), "null");
    }
}
