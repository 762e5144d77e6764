//! Error types for the `vtobj` runtime.
//!
//! This module defines the single error type used throughout the runtime:
//! heap exhaustion, class definition mistakes caught at definition time,
//! stale object handles, construction argument mismatches and iterator misuse.
//! A map miss is *not* an error; `Map::at` reports it as `Ok(None)`.

use crate::runtime::{ObjRef, Slot};
use std::fmt;

/// Errors that can occur in the `vtobj` runtime.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// The heap reached its configured object limit, or vector storage
    /// could not be reserved.
    OutOfMemory {
        /// The object limit, or the element capacity that was requested.
        limit: usize,
    },

    /// Class name already exists in the registry.
    ClassAlreadyExists {
        /// The rejected name.
        name: String,
    },

    /// The new class name already appears in the superclass chain.
    InheritanceCycle {
        /// The rejected name.
        name: String,
    },

    /// A derived class declared fewer fields than its superclass.
    InstanceSizeShrinks {
        /// The class being defined.
        class: String,
        /// The requested instance size.
        size: usize,
        /// The superclass's instance size.
        inherited: usize,
    },

    /// A slot family was added on top of a class that already has one.
    KindMismatch {
        /// The class being defined.
        class: String,
        /// The superclass it was extended from.
        super_class: String,
    },

    /// A slot was overridden or invoked on a class whose hierarchy lacks it.
    SlotNotInHierarchy {
        /// The class that lacks the slot.
        class: String,
        /// The slot.
        slot: Slot,
    },

    /// An abstract slot (introduced but never implemented) was invoked.
    AbstractSlot {
        /// The receiver's class.
        class: String,
        /// The slot.
        slot: Slot,
    },

    /// The handle names an object that was already deleted.
    StaleObject {
        /// The stale handle.
        obj: ObjRef,
    },

    /// A constructor asked for more arguments than were supplied.
    MissingArgument {
        /// Zero-based position of the missing argument.
        index: usize,
    },

    /// A construction argument had the wrong type.
    ArgumentTypeMismatch {
        /// The expected value kind.
        expected: &'static str,
        /// The kind actually supplied.
        got: &'static str,
        /// Zero-based argument position.
        index: usize,
    },

    /// A field index past the instance's size.
    FieldOutOfBounds {
        /// The object's class.
        class: String,
        /// The requested field.
        index: usize,
        /// The instance size.
        size: usize,
    },

    /// A field did not hold the expected kind of value.
    FieldTypeMismatch {
        /// The object's class.
        class: String,
        /// The field.
        index: usize,
        /// The expected value kind.
        expected: &'static str,
    },

    /// An operation for one class was applied to an instance of another.
    UnexpectedClass {
        /// The class the operation requires.
        expected: String,
        /// The receiver's class.
        found: String,
    },

    /// A super call was made outside the matching dispatched call.
    SuperOutsideDispatch {
        /// The slot the super call was made for.
        slot: Slot,
    },

    /// A super call was made from the class that introduced the slot.
    NoSuperclass {
        /// The class whose implementation made the call.
        class: String,
        /// The slot.
        slot: Slot,
    },

    /// An iterator positioned at its end was dereferenced.
    IteratorExhausted {
        /// The iterator's class.
        class: String,
    },

    /// An autorelease pool was popped with none pushed.
    PoolUnderflow,

    /// A writer refused output while printing.
    Format,
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::OutOfMemory { limit } => {
                write!(f, "Out of memory: limit of {limit} reached")
            }
            Error::ClassAlreadyExists { name } => {
                write!(f, "Class {name} already exists in registry")
            }
            Error::InheritanceCycle { name } => {
                write!(f, "Inheritance cycle detected: {name} is its own ancestor")
            }
            Error::InstanceSizeShrinks {
                class,
                size,
                inherited,
            } => write!(
                f,
                "Class {class} declares {size} fields but inherits {inherited}"
            ),
            Error::KindMismatch { class, super_class } => write!(
                f,
                "Class {class} cannot add a slot family to {super_class}"
            ),
            Error::SlotNotInHierarchy { class, slot } => {
                write!(f, "Class {class} has no {slot} slot")
            }
            Error::AbstractSlot { class, slot } => {
                write!(f, "Class {class} does not implement {slot}")
            }
            Error::StaleObject { obj } => {
                write!(f, "Stale object handle {obj}")
            }
            Error::MissingArgument { index } => {
                write!(f, "Missing construction argument {index}")
            }
            Error::ArgumentTypeMismatch {
                expected,
                got,
                index,
            } => write!(
                f,
                "Construction argument {index}: expected {expected}, got {got}"
            ),
            Error::FieldOutOfBounds { class, index, size } => write!(
                f,
                "Field {index} out of bounds for {class} (size {size})"
            ),
            Error::FieldTypeMismatch {
                class,
                index,
                expected,
            } => write!(f, "Field {index} of {class} is not {expected}"),
            Error::UnexpectedClass { expected, found } => {
                write!(f, "Expected an instance of {expected}, found {found}")
            }
            Error::SuperOutsideDispatch { slot } => {
                write!(f, "Super {slot} called outside a dispatched {slot}")
            }
            Error::NoSuperclass { class, slot } => {
                write!(f, "Class {class} has no superclass {slot} to call")
            }
            Error::IteratorExhausted { class } => {
                write!(f, "Dereferenced {class} at end of range")
            }
            Error::PoolUnderflow => {
                write!(f, "Autorelease pool popped with none pushed")
            }
            Error::Format => write!(f, "Formatter error while printing"),
        }
    }
}

impl std::error::Error for Error {}

impl From<fmt::Error> for Error {
    fn from(_: fmt::Error) -> Self {
        Error::Format
    }
}

/// Result type for `vtobj` runtime operations.
pub type Result<T> = std::result::Result<T, Error>;
