//! Program-lifetime arena for runtime metadata.
//!
//! Class descriptors are created once and referenced by every instance for as
//! long as the program runs. The arena hands out `&'static` references and
//! never frees what it stores, so descriptor handles can be plain shared
//! references instead of counted pointers.
//!
//! # Example
//!
//! ```
//! use vtobj_mem::arena::global_arena;
//!
//! let arena = global_arena();
//! let name: &'static String = arena.alloc(String::from("Object"));
//!
//! assert_eq!(name, "Object");
//! assert!(arena.stats().allocations >= 1);
//! ```

use std::sync::atomic::{AtomicUsize, Ordering};

/// Arena allocation statistics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ArenaStats {
    /// Number of values stored in the arena.
    pub allocations: usize,
    /// Bytes occupied by the stored values themselves (heap data they own is
    /// not counted).
    pub bytes: usize,
}

/// Arena whose allocations live for the rest of the program.
///
/// # Thread Safety
///
/// The counters are atomic, so one arena can serve every thread.
#[derive(Debug, Default)]
pub struct StaticArena {
    allocations: AtomicUsize,
    bytes: AtomicUsize,
}

impl StaticArena {
    /// Creates an empty arena.
    #[must_use]
    pub const fn new() -> Self {
        StaticArena {
            allocations: AtomicUsize::new(0),
            bytes: AtomicUsize::new(0),
        }
    }

    /// Moves `value` into the arena and returns a reference valid for the
    /// rest of the program.
    pub fn alloc<T: Send + Sync + 'static>(&self, value: T) -> &'static T {
        self.allocations.fetch_add(1, Ordering::Relaxed);
        self.bytes
            .fetch_add(std::mem::size_of::<T>(), Ordering::Relaxed);
        Box::leak(Box::new(value))
    }

    /// Returns allocation statistics for this arena.
    #[must_use]
    pub fn stats(&self) -> ArenaStats {
        ArenaStats {
            allocations: self.allocations.load(Ordering::Relaxed),
            bytes: self.bytes.load(Ordering::Relaxed),
        }
    }
}

/// Global arena singleton for runtime metadata.
#[must_use]
pub fn global_arena() -> &'static StaticArena {
    static ARENA: StaticArena = StaticArena::new();
    &ARENA
}
