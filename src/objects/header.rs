//! Object header - identity and class back-reference shared by every guest object
//!
//! Design: Guest-shaped and foreign objects share this header and differ only in
//! their body, so identity checks and class lookups never inspect the body.

use super::class::ClassDescriptor;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

static NEXT_IDENTITY: AtomicU32 = AtomicU32::new(1);

/// Header prefixed to every heap object
#[derive(Debug)]
pub struct ObjectHeader {
    /// Absent only for the foreign null wrapper
    class: Option<Arc<ClassDescriptor>>,
    identity_hash: u32,
    flags: u32,
}

impl ObjectHeader {
    pub const FLAG_ARRAY: u32 = 0b01;
    pub const FLAG_FOREIGN: u32 = 0b10;

    /// Create header for new object
    #[inline]
    pub fn new(class: Option<Arc<ClassDescriptor>>, flags: u32) -> Self {
        Self {
            class,
            identity_hash: next_identity_hash(),
            flags,
        }
    }

    #[inline]
    pub fn class(&self) -> Option<&Arc<ClassDescriptor>> {
        self.class.as_ref()
    }

    #[inline]
    pub fn identity_hash(&self) -> u32 {
        self.identity_hash
    }

    #[inline]
    pub fn flags(&self) -> u32 {
        self.flags
    }

    #[inline]
    pub fn is_array(&self) -> bool {
        self.flags & Self::FLAG_ARRAY != 0
    }

    #[inline]
    pub fn is_foreign(&self) -> bool {
        self.flags & Self::FLAG_FOREIGN != 0
    }
}

/// Fibonacci-scrambled sequence: distinct, well spread, never zero
fn next_identity_hash() -> u32 {
    let seq = NEXT_IDENTITY.fetch_add(1, Ordering::Relaxed);
    let hash = seq.wrapping_mul(0x9E37_79B9) >> 1;
    if hash == 0 {
        1
    } else {
        hash
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn header_flags() {
        let header = ObjectHeader::new(None, ObjectHeader::FLAG_FOREIGN);
        assert!(header.is_foreign());
        assert!(!header.is_array());
        assert!(header.class().is_none());
    }

    #[test]
    fn identity_hashes_are_distinct_and_nonzero() {
        let a = ObjectHeader::new(None, 0);
        let b = ObjectHeader::new(None, 0);
        assert_ne!(a.identity_hash(), b.identity_hash());
        assert_ne!(a.identity_hash(), 0);
    }
}
