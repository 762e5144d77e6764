//! `vtobj` runtime module.
//!
//! This module provides the core object model:
//!
//! - [`class`]: class descriptors, typed operation tables and the registry
//! - [`object`]: the object heap, field access and autorelease pools
//! - [`dispatch`]: table dispatch, super calls and the iterator protocol
//! - [`value`]: field values and construction arguments
//! - [`boxed`]: `Integer`, `Float` and `String` leaf classes
//!
//! # Architecture
//!
//! Class descriptors are global and live for the whole program. Objects live
//! in a [`Runtime`]: each runtime owns a heap of instances addressed by
//! generational [`ObjRef`] handles. A handle to a deleted object never
//! resolves again, so use after delete is reported as
//! [`Error::StaleObject`](crate::Error::StaleObject) instead of reading freed
//! memory.
//!
//! # Example
//!
//! ```rust
//! use vtobj::{Integer, Runtime};
//!
//! let mut rt = Runtime::new();
//! let n = Integer::new(&mut rt, 42).unwrap();
//!
//! assert_eq!(rt.describe(n).unwrap(), "42");
//! rt.delete(n).unwrap();
//! assert!(!rt.is_live(n));
//! ```

pub mod boxed;
pub mod class;
pub mod dispatch;
pub mod object;
pub mod value;

pub use class::{
    Class, ClassKind, CompareFn, ConstructFn, DerefFn, DestructFn, Imp,
    IncrementFn, IterTable, NotEqualFn, PrintFn, RangeFn, RangeTable, Slot,
    VTable,
};
pub use object::ObjRef;
pub use value::{Args, Value};

use dispatch::Frame;
use object::Instance;
use std::fmt;
use vtobj_mem::slots::SlotArena;

/// Runtime tuning knobs.
///
/// # Example
///
/// ```rust
/// use vtobj::{Runtime, RuntimeConfig};
///
/// let config = RuntimeConfig::default()
///     .with_max_objects(64)
///     .with_vector_capacity(2);
/// let rt = Runtime::with_config(config);
///
/// assert_eq!(rt.config().max_objects, Some(64));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuntimeConfig {
    /// Heap slots reserved up front.
    pub heap_capacity: usize,
    /// Live object limit; `None` means unbounded.
    pub max_objects: Option<usize>,
    /// Initial capacity of vectors created without an explicit one.
    pub vector_capacity: usize,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        RuntimeConfig {
            heap_capacity: 256,
            max_objects: None,
            vector_capacity: 8,
        }
    }
}

impl RuntimeConfig {
    /// Sets how many heap slots are reserved up front.
    #[must_use]
    pub fn with_heap_capacity(mut self, capacity: usize) -> Self {
        self.heap_capacity = capacity;
        self
    }

    /// Caps the number of live objects.
    #[must_use]
    pub fn with_max_objects(mut self, limit: usize) -> Self {
        self.max_objects = Some(limit);
        self
    }

    /// Sets the default vector capacity. Zero is raised to one so that
    /// doubling always makes room.
    #[must_use]
    pub fn with_vector_capacity(mut self, capacity: usize) -> Self {
        self.vector_capacity = capacity.max(1);
        self
    }
}

/// Heap statistics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HeapStats {
    /// Live objects.
    pub live: usize,
    /// Freed slots waiting for reuse.
    pub free_slots: usize,
    /// Autorelease pools currently pushed.
    pub pool_depth: usize,
}

/// An object heap plus the dispatch state that runs against it.
///
/// A `Runtime` is single-threaded: every operation takes `&mut self` (or
/// `&self` for reads), and objects from one runtime mean nothing in another.
pub struct Runtime {
    pub(crate) heap: SlotArena<Instance>,
    pub(crate) pools: Vec<Vec<ObjRef>>,
    pub(crate) frames: Vec<Frame>,
    config: RuntimeConfig,
}

impl Runtime {
    /// Creates a runtime with the default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(RuntimeConfig::default())
    }

    /// Creates a runtime with an explicit configuration.
    #[must_use]
    pub fn with_config(config: RuntimeConfig) -> Self {
        Runtime {
            heap: SlotArena::with_capacity(config.heap_capacity),
            pools: Vec::new(),
            frames: Vec::new(),
            config,
        }
    }

    /// Returns the configuration this runtime was built with.
    #[must_use]
    pub fn config(&self) -> &RuntimeConfig {
        &self.config
    }

    /// Returns heap statistics.
    #[must_use]
    pub fn stats(&self) -> HeapStats {
        let slots = self.heap.stats();
        HeapStats {
            live: slots.live,
            free_slots: slots.free,
            pool_depth: self.pools.len(),
        }
    }
}

impl Default for Runtime {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Runtime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Runtime")
            .field("heap", &self.heap)
            .field("pools", &self.pools.len())
            .field("frames", &self.frames.len())
            .field("config", &self.config)
            .finish()
    }
}
