//! # vtobj
//!
//! A small class-based object runtime: every object carries a reference to a
//! class descriptor, and operations are resolved through the descriptor's
//! table of function pointers.
//!
//! ## Features
//!
//! - **Classes**: single inheritance by copying and overriding operation
//!   tables, with a metaclass and a global registry
//! - **Objects**: a generational heap where deleted handles are detected, not
//!   dereferenced
//! - **Super calls**: frame-tracked, so multi-level chains run each level once
//! - **Iterators**: a begin/end/increment/deref/not-equal protocol shared by
//!   containers and lazy views
//! - **Containers**: `List`, `Vector`, `Map` and `Pair` over type-erased
//!   elements
//! - **Views**: `IotaView` (integers on demand) and `ZipView` (pairs from two
//!   ranges)
//!
//! ## Quick Start
//!
//! ```rust
//! use vtobj::{Integer, List, Runtime, range_find};
//!
//! let mut rt = Runtime::new();
//! let list = List::new(&mut rt).unwrap();
//! for n in [3, 1, 2] {
//!     let item = Integer::new(&mut rt, n).unwrap();
//!     List::push_back(&mut rt, list, item).unwrap();
//! }
//!
//! assert_eq!(rt.describe(list).unwrap(), "[3, 1, 2]");
//!
//! let needle = Integer::new(&mut rt, 2).unwrap();
//! assert_eq!(range_find(&mut rt, list, needle).unwrap(), Some(2));
//! ```
//!
//! ## Ownership
//!
//! Objects are owned by whoever created them and are destroyed with
//! [`Runtime::delete`]. Containers hold references to their elements and do
//! not delete them. Short-lived objects produced by views are autoreleased:
//! see [`Runtime::push_pool`] and [`Runtime::with_pool`].
//!
//! ## Logging
//!
//! The runtime logs through `vtobj-log`. Set `VTOBJ_LOG` (`error`, `warn`,
//! `info`, `debug`, `trace`) and call [`vtobj_log::init_from_env`] to see
//! class definitions, allocation and container growth on stderr.

#![allow(clippy::missing_errors_doc)]

pub mod collections;
pub mod error;
pub mod runtime;

pub use collections::{
    ContainerBase, IotaIterator, IotaView, IteratorBase, List, ListIterator,
    Map, Pair, Vector, VectorIterator, Walk, ZipIterator, ZipView,
    range_find, range_for_each, range_print, range_print_to,
};
pub use error::{Error, Result};
pub use runtime::boxed::{Float, Integer, Str};
pub use runtime::{
    Args, Class, ClassKind, HeapStats, Imp, ObjRef, Runtime, RuntimeConfig,
    Slot, VTable, Value,
};
