//! Error taxonomy for allocation validation and configuration loading

use std::fmt;
use std::io;

/// Guest exception a failed validation must raise
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuestException {
    InstantiationException,
    NegativeArraySizeException,
    IllegalArgumentException,
    CloneNotSupportedException,
}

impl GuestException {
    /// Internal name of the guest exception class
    pub const fn class_name(self) -> &'static str {
        match self {
            Self::InstantiationException => "java/lang/InstantiationException",
            Self::NegativeArraySizeException => "java/lang/NegativeArraySizeException",
            Self::IllegalArgumentException => "java/lang/IllegalArgumentException",
            Self::CloneNotSupportedException => "java/lang/CloneNotSupportedException",
        }
    }
}

/// Precondition failure reported to the guest
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AllocationError {
    /// Abstract, interface, array or primitive class used with `new`
    InstantiationNotPermitted { class: String },
    NegativeArrayLength { length: i32 },
    /// Empty or over-limit dimensions vector
    InvalidMultiArrayDimensionsCount { count: usize },
    /// `void` used as a multi-array component
    InvalidMultiArrayComponent { class: String },
    /// Foreign wrappers have no guest-shaped storage to copy
    CloneUnsupported,
}

impl AllocationError {
    /// The guest exception the caller throws for this failure
    pub const fn guest_exception(&self) -> GuestException {
        match self {
            Self::InstantiationNotPermitted { .. } => GuestException::InstantiationException,
            Self::NegativeArrayLength { .. } => GuestException::NegativeArraySizeException,
            Self::InvalidMultiArrayDimensionsCount { .. }
            | Self::InvalidMultiArrayComponent { .. } => GuestException::IllegalArgumentException,
            Self::CloneUnsupported => GuestException::CloneNotSupportedException,
        }
    }
}

impl fmt::Display for AllocationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InstantiationNotPermitted { class } => {
                write!(f, "Cannot instantiate {}", class)
            }
            Self::NegativeArrayLength { length } => {
                write!(f, "Negative array length: {}", length)
            }
            Self::InvalidMultiArrayDimensionsCount { count } => {
                write!(f, "Invalid multi-array dimension count: {} (expected 1..=255)", count)
            }
            Self::InvalidMultiArrayComponent { class } => {
                write!(f, "Invalid multi-array component type: {}", class)
            }
            Self::CloneUnsupported => {
                write!(f, "Foreign objects cannot be cloned")
            }
        }
    }
}

impl std::error::Error for AllocationError {}

/// Failure loading an `AllocatorConfig`
#[derive(Debug)]
pub enum ConfigError {
    Io(io::Error),
    Parse(toml::de::Error),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io(err) => write!(f, "Failed to read config: {}", err),
            Self::Parse(err) => write!(f, "Failed to parse config: {}", err),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(err) => Some(err),
            Self::Parse(err) => Some(err),
        }
    }
}

impl From<io::Error> for ConfigError {
    fn from(err: io::Error) -> Self {
        Self::Io(err)
    }
}

impl From<toml::de::Error> for ConfigError {
    fn from(err: toml::de::Error) -> Self {
        Self::Parse(err)
    }
}
