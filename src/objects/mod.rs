//! Guest object model - classes, shapes, handles and array storage
//!
//! Design: Layout metadata (`ClassDescriptor`, `ShapeDescriptor`) is immutable
//! and shared; objects (`HeapObject`) are host reference-counted and carry a
//! common header plus a tagged body.

mod array;
mod class;
mod handle;
mod header;
mod kind;
mod meta;
mod shape;

pub use array::{HostArray, SharedArray};
pub use class::{AccessFlags, ClassBuilder, ClassDescriptor, ClassId, ClassKind, InitHook};
pub use handle::{FieldStorage, HeapObject, ObjectBody, ObjectHandle, SlotValue};
pub use header::ObjectHeader;
pub use kind::{PrimitiveKind, SlotKind};
pub use meta::{Meta, CLASS_CLASS, FOREIGN_EXCEPTION_CLASS, OBJECT_CLASS};
pub use shape::{ShapeDescriptor, Slot, SlotSpec, StorageClass, Visibility};
