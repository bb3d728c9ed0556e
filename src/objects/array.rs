//! Host-native array storage backing guest arrays
//!
//! Buffers are shared (`Arc`) so a wrapped host array and the guest array see the
//! same elements. Guest `boolean[]` is stored as a byte buffer.

use super::handle::ObjectHandle;
use super::kind::PrimitiveKind;
use parking_lot::RwLock;
use std::sync::Arc;

pub type SharedArray<T> = Arc<RwLock<Vec<T>>>;

#[derive(Debug, Clone)]
pub enum HostArray {
    Byte(SharedArray<i8>),
    Char(SharedArray<u16>),
    Short(SharedArray<i16>),
    Int(SharedArray<i32>),
    Long(SharedArray<i64>),
    Float(SharedArray<f32>),
    Double(SharedArray<f64>),
    Reference(SharedArray<ObjectHandle>),
}

fn shared<T>(values: Vec<T>) -> SharedArray<T> {
    Arc::new(RwLock::new(values))
}

impl HostArray {
    /// Zero-filled primitive buffer (`boolean` maps to bytes)
    pub fn zeroed(kind: PrimitiveKind, len: usize) -> Self {
        match kind {
            PrimitiveKind::Boolean | PrimitiveKind::Byte => Self::Byte(shared(vec![0; len])),
            PrimitiveKind::Char => Self::Char(shared(vec![0; len])),
            PrimitiveKind::Short => Self::Short(shared(vec![0; len])),
            PrimitiveKind::Int => Self::Int(shared(vec![0; len])),
            PrimitiveKind::Long => Self::Long(shared(vec![0; len])),
            PrimitiveKind::Float => Self::Float(shared(vec![0.0; len])),
            PrimitiveKind::Double => Self::Double(shared(vec![0.0; len])),
        }
    }

    /// Reference buffer filled with the guest null
    pub fn nulls(len: usize) -> Self {
        Self::Reference(shared(vec![ObjectHandle::null(); len]))
    }

    pub fn len(&self) -> usize {
        match self {
            Self::Byte(buf) => buf.read().len(),
            Self::Char(buf) => buf.read().len(),
            Self::Short(buf) => buf.read().len(),
            Self::Int(buf) => buf.read().len(),
            Self::Long(buf) => buf.read().len(),
            Self::Float(buf) => buf.read().len(),
            Self::Double(buf) => buf.read().len(),
            Self::Reference(buf) => buf.read().len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    #[inline]
    pub fn is_reference(&self) -> bool {
        matches!(self, Self::Reference(_))
    }

    /// Storage kind of a primitive buffer (`Byte` also covers `boolean[]`)
    pub fn storage_kind(&self) -> Option<PrimitiveKind> {
        match self {
            Self::Byte(_) => Some(PrimitiveKind::Byte),
            Self::Char(_) => Some(PrimitiveKind::Char),
            Self::Short(_) => Some(PrimitiveKind::Short),
            Self::Int(_) => Some(PrimitiveKind::Int),
            Self::Long(_) => Some(PrimitiveKind::Long),
            Self::Float(_) => Some(PrimitiveKind::Float),
            Self::Double(_) => Some(PrimitiveKind::Double),
            Self::Reference(_) => None,
        }
    }

    /// Whether this buffer can back an array whose component is `kind`
    pub fn can_back(&self, kind: PrimitiveKind) -> bool {
        match kind {
            PrimitiveKind::Boolean => matches!(self, Self::Byte(_)),
            other => self.storage_kind() == Some(other),
        }
    }

    /// Copy into a fresh buffer: values for primitives, handles (not referents) for references
    pub fn duplicate(&self) -> Self {
        match self {
            Self::Byte(buf) => Self::Byte(shared(buf.read().clone())),
            Self::Char(buf) => Self::Char(shared(buf.read().clone())),
            Self::Short(buf) => Self::Short(shared(buf.read().clone())),
            Self::Int(buf) => Self::Int(shared(buf.read().clone())),
            Self::Long(buf) => Self::Long(shared(buf.read().clone())),
            Self::Float(buf) => Self::Float(shared(buf.read().clone())),
            Self::Double(buf) => Self::Double(shared(buf.read().clone())),
            Self::Reference(buf) => Self::Reference(shared(buf.read().clone())),
        }
    }

    /// True if both wrap the very same host buffer
    pub fn shares_buffer(&self, other: &HostArray) -> bool {
        match (self, other) {
            (Self::Byte(a), Self::Byte(b)) => Arc::ptr_eq(a, b),
            (Self::Char(a), Self::Char(b)) => Arc::ptr_eq(a, b),
            (Self::Short(a), Self::Short(b)) => Arc::ptr_eq(a, b),
            (Self::Int(a), Self::Int(b)) => Arc::ptr_eq(a, b),
            (Self::Long(a), Self::Long(b)) => Arc::ptr_eq(a, b),
            (Self::Float(a), Self::Float(b)) => Arc::ptr_eq(a, b),
            (Self::Double(a), Self::Double(b)) => Arc::ptr_eq(a, b),
            (Self::Reference(a), Self::Reference(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }

    /// Raw bit pattern of a primitive element, zero-extended
    pub fn primitive_bits(&self, index: usize) -> Option<u64> {
        match self {
            Self::Byte(buf) => buf.read().get(index).map(|v| *v as u8 as u64),
            Self::Char(buf) => buf.read().get(index).map(|v| *v as u64),
            Self::Short(buf) => buf.read().get(index).map(|v| *v as u16 as u64),
            Self::Int(buf) => buf.read().get(index).map(|v| *v as u32 as u64),
            Self::Long(buf) => buf.read().get(index).map(|v| *v as u64),
            Self::Float(buf) => buf.read().get(index).map(|v| v.to_bits() as u64),
            Self::Double(buf) => buf.read().get(index).map(|v| v.to_bits()),
            Self::Reference(_) => None,
        }
    }

    pub fn reference(&self, index: usize) -> Option<ObjectHandle> {
        match self {
            Self::Reference(buf) => buf.read().get(index).cloned(),
            _ => None,
        }
    }

    /// Store into a reference buffer; returns false when out of bounds or primitive
    pub fn set_reference(&self, index: usize, value: ObjectHandle) -> bool {
        match self {
            Self::Reference(buf) => match buf.write().get_mut(index) {
                Some(cell) => {
                    *cell = value;
                    true
                }
                None => false,
            },
            _ => false,
        }
    }
}

macro_rules! host_array_from {
    ($($ty:ty => $variant:ident),* $(,)?) => {
        $(
            impl From<Vec<$ty>> for HostArray {
                fn from(values: Vec<$ty>) -> Self {
                    Self::$variant(shared(values))
                }
            }

            impl From<SharedArray<$ty>> for HostArray {
                fn from(buffer: SharedArray<$ty>) -> Self {
                    Self::$variant(buffer)
                }
            }
        )*
    };
}

host_array_from! {
    i8 => Byte,
    u16 => Char,
    i16 => Short,
    i32 => Int,
    i64 => Long,
    f32 => Float,
    f64 => Double,
    ObjectHandle => Reference,
}
