//! Primitive kinds - element and slot types of the guest object model

/// Guest primitive type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum PrimitiveKind {
    Boolean,
    Char,
    Float,
    Double,
    Byte,
    Short,
    Int,
    Long,
}

impl PrimitiveKind {
    pub const ALL: [PrimitiveKind; 8] = [
        Self::Boolean,
        Self::Char,
        Self::Float,
        Self::Double,
        Self::Byte,
        Self::Short,
        Self::Int,
        Self::Long,
    ];

    /// Decode a `newarray` element type code (4 = boolean ... 11 = long)
    #[inline]
    pub const fn from_type_code(code: u8) -> Option<Self> {
        match code {
            4 => Some(Self::Boolean),
            5 => Some(Self::Char),
            6 => Some(Self::Float),
            7 => Some(Self::Double),
            8 => Some(Self::Byte),
            9 => Some(Self::Short),
            10 => Some(Self::Int),
            11 => Some(Self::Long),
            _ => None,
        }
    }

    /// Inverse of [`PrimitiveKind::from_type_code`]
    #[inline]
    pub const fn type_code(self) -> u8 {
        match self {
            Self::Boolean => 4,
            Self::Char => 5,
            Self::Float => 6,
            Self::Double => 7,
            Self::Byte => 8,
            Self::Short => 9,
            Self::Int => 10,
            Self::Long => 11,
        }
    }

    /// Storage size in bytes
    #[inline]
    pub const fn size(self) -> usize {
        match self {
            Self::Boolean | Self::Byte => 1,
            Self::Char | Self::Short => 2,
            Self::Int | Self::Float => 4,
            Self::Long | Self::Double => 8,
        }
    }

    #[inline]
    pub const fn align(self) -> usize {
        self.size()
    }

    #[inline]
    pub const fn is_integral(self) -> bool {
        matches!(self, Self::Byte | Self::Short | Self::Char | Self::Int | Self::Long)
    }

    #[inline]
    pub const fn is_float(self) -> bool {
        matches!(self, Self::Float | Self::Double)
    }

    /// Guest-visible type name
    pub const fn name(self) -> &'static str {
        match self {
            Self::Boolean => "boolean",
            Self::Char => "char",
            Self::Float => "float",
            Self::Double => "double",
            Self::Byte => "byte",
            Self::Short => "short",
            Self::Int => "int",
            Self::Long => "long",
        }
    }

    #[inline]
    pub(crate) const fn index(self) -> usize {
        self as usize
    }
}

/// What a shape slot stores
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SlotKind {
    Reference,
    Primitive(PrimitiveKind),
}

impl SlotKind {
    #[inline]
    pub const fn is_reference(self) -> bool {
        matches!(self, Self::Reference)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn type_codes_round_trip() {
        for kind in PrimitiveKind::ALL {
            assert_eq!(PrimitiveKind::from_type_code(kind.type_code()), Some(kind));
        }
        assert_eq!(PrimitiveKind::from_type_code(3), None);
        assert_eq!(PrimitiveKind::from_type_code(12), None);
    }

    #[test]
    fn sizes_match_guest_widths() {
        assert_eq!(PrimitiveKind::Boolean.size(), 1);
        assert_eq!(PrimitiveKind::Char.size(), 2);
        assert_eq!(PrimitiveKind::Int.size(), 4);
        assert_eq!(PrimitiveKind::Double.size(), 8);
        assert_eq!(PrimitiveKind::Long.align(), 8);
    }

    #[test]
    fn classification() {
        assert!(PrimitiveKind::Char.is_integral());
        assert!(!PrimitiveKind::Boolean.is_integral());
        assert!(PrimitiveKind::Float.is_float());
        assert!(SlotKind::Reference.is_reference());
        assert!(!SlotKind::Primitive(PrimitiveKind::Int).is_reference());
    }
}
