//! Containers, views and range algorithms.
//!
//! Every collection here is a class in the runtime, built on one of two
//! abstract bases:
//!
//! - [`ContainerBase`] (`Container`): adds `begin` and `end`, and prints
//!   itself as `[a, b, c]` by walking its own range
//! - [`IteratorBase`] (`Iterator`): adds `increment`, `deref` and
//!   `not_equal`
//!
//! | Class      | Elements                         | Iterator         |
//! |------------|----------------------------------|------------------|
//! | `List`     | doubly linked, stored            | `ListIterator`   |
//! | `Vector`   | contiguous, stored               | `VectorIterator` |
//! | `Map`      | `Pair`s in an inner `Vector`     | `VectorIterator` |
//! | `IotaView` | `Integer`s made on demand        | `IotaIterator`   |
//! | `ZipView`  | `Pair`s made on demand           | `ZipIterator`    |
//!
//! Stored containers hand out their elements by reference; views produce
//! fresh objects and autorelease them. [`range_for_each`] runs each step in
//! its own pool, so walking a view leaves nothing behind.

pub mod iota;
pub mod list;
pub mod map;
pub mod pair;
pub mod range;
pub mod vector;
pub mod zip;

pub use iota::{IotaIterator, IotaView};
pub use list::{List, ListIterator};
pub use map::Map;
pub use pair::Pair;
pub use range::{
    ContainerBase, IteratorBase, Walk, range_find, range_for_each,
    range_print, range_print_to,
};
pub use vector::{Vector, VectorIterator};
pub use zip::{ZipIterator, ZipView};
