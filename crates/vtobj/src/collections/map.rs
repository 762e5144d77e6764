//! `Map`: an association list of `Pair`s.
//!
//! Entries are kept in insertion order in an inner `Vector` that the map owns.
//! Lookup is a linear scan comparing each entry's key with the probe through
//! the key's compare operation; inserting an existing key appends a second
//! entry that lookups never reach.

use crate::args;
use crate::collections::range::ContainerBase;
use crate::collections::{Pair, Vector};
use crate::error::Result;
use crate::runtime::{Args, Class, ClassKind, Imp, ObjRef, Runtime};
use std::sync::OnceLock;

/// The `Map` class and its operations.
///
/// ```rust
/// use vtobj::{Integer, Map, Pair, Runtime, Str};
///
/// let mut rt = Runtime::new();
/// let map = Map::new(&mut rt).unwrap();
/// let key = Integer::new(&mut rt, 1).unwrap();
/// let value = Str::new(&mut rt, "one").unwrap();
/// let entry = Pair::new(&mut rt, key, value).unwrap();
/// Map::insert(&mut rt, map, entry).unwrap();
///
/// let probe = Integer::new(&mut rt, 1).unwrap();
/// assert_eq!(Map::at(&mut rt, map, probe).unwrap(), Some(value));
/// assert_eq!(rt.describe(map).unwrap(), "[(1, one)]");
/// ```
pub struct Map;

impl Map {
    /// Field holding the inner entry vector.
    pub const ENTRIES: usize = 0;

    /// Returns the `Map` class.
    #[must_use]
    pub fn class() -> Class {
        static CLASS: OnceLock<Class> = OnceLock::new();
        *CLASS.get_or_init(|| {
            Class::builtin(
                "Map",
                ContainerBase::class(),
                ClassKind::Container,
                1,
                [
                    Imp::Construct(map_construct),
                    Imp::Destruct(map_destruct),
                    Imp::Begin(map_begin),
                    Imp::End(map_end),
                ],
            )
        })
    }

    /// Creates an empty map. The caller owns it; entries stay owned by whoever
    /// created them.
    pub fn new(rt: &mut Runtime) -> Result<ObjRef> {
        rt.new_instance(Self::class(), args![])
    }

    /// Returns the inner vector of entries. It belongs to the map.
    pub(crate) fn entries(rt: &Runtime, map: ObjRef) -> Result<ObjRef> {
        rt.expect_instance(map, Self::class())?;
        rt.obj_field(map, Self::ENTRIES)
    }

    /// Appends `pair` as an entry.
    pub fn insert(rt: &mut Runtime, map: ObjRef, pair: ObjRef) -> Result<()> {
        rt.expect_instance(pair, Pair::class())?;
        let entries = Self::entries(rt, map)?;
        Vector::push_back(rt, entries, pair)
    }

    /// Returns the value of the first entry whose key equals `key`, or `None`.
    pub fn at(rt: &mut Runtime, map: ObjRef, key: ObjRef) -> Result<Option<ObjRef>> {
        let entries = Self::entries(rt, map)?;
        for index in 0..Vector::len(rt, entries)? {
            let Some(entry) = Vector::at(rt, entries, index)? else {
                break;
            };
            let first = Pair::first(rt, entry)?;
            if rt.equals(first, key)? {
                return Pair::second(rt, entry).map(Some);
            }
        }
        Ok(None)
    }

    /// Number of entries.
    pub fn len(rt: &Runtime, map: ObjRef) -> Result<usize> {
        Vector::len(rt, Self::entries(rt, map)?)
    }

    /// Returns `true` if the map has no entries.
    pub fn is_empty(rt: &Runtime, map: ObjRef) -> Result<bool> {
        Ok(Self::len(rt, map)? == 0)
    }
}

fn map_construct(rt: &mut Runtime, obj: ObjRef, args: &mut Args) -> Result<()> {
    rt.super_construct(obj, args)?;
    let entries = Vector::new(rt)?;
    rt.set_field(obj, Map::ENTRIES, entries)
}

// ENTRIES is Nil when construction failed before the vector was made.
fn map_destruct(rt: &mut Runtime, obj: ObjRef) -> Result<()> {
    if let Some(entries) = rt.take_field(obj, Map::ENTRIES)?.as_obj() {
        if rt.is_live(entries) {
            rt.delete(entries)?;
        }
    }
    rt.super_destruct(obj)
}

fn map_begin(rt: &mut Runtime, map: ObjRef) -> Result<ObjRef> {
    let entries = Map::entries(rt, map)?;
    rt.begin(entries)
}

fn map_end(rt: &mut Runtime, map: ObjRef) -> Result<ObjRef> {
    let entries = Map::entries(rt, map)?;
    rt.end(entries)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Error, Integer, Str, range_find};

    fn entry(rt: &mut Runtime, key: i64, value: &str) -> ObjRef {
        let key = Integer::new(rt, key).unwrap();
        let value = Str::new(rt, value).unwrap();
        Pair::new(rt, key, value).unwrap()
    }

    #[test]
    fn test_insert_and_lookup() {
        let mut rt = Runtime::new();
        let map = Map::new(&mut rt).unwrap();
        assert!(Map::is_empty(&rt, map).unwrap());

        for (key, value) in [(1, "one"), (2, "two"), (3, "three")] {
            let pair = entry(&mut rt, key, value);
            Map::insert(&mut rt, map, pair).unwrap();
        }
        assert_eq!(Map::len(&rt, map).unwrap(), 3);

        let two = Integer::new(&mut rt, 2).unwrap();
        let found = Map::at(&mut rt, map, two).unwrap().unwrap();
        assert_eq!(Str::value(&rt, found).unwrap(), "two");

        let missing = Integer::new(&mut rt, 4).unwrap();
        assert_eq!(Map::at(&mut rt, map, missing).unwrap(), None);
    }

    #[test]
    fn test_first_entry_wins() {
        let mut rt = Runtime::new();
        let map = Map::new(&mut rt).unwrap();
        let old = entry(&mut rt, 1, "old");
        let new = entry(&mut rt, 1, "new");
        Map::insert(&mut rt, map, old).unwrap();
        Map::insert(&mut rt, map, new).unwrap();

        let key = Integer::new(&mut rt, 1).unwrap();
        let found = Map::at(&mut rt, map, key).unwrap().unwrap();
        assert_eq!(Str::value(&rt, found).unwrap(), "old");
        assert_eq!(Map::len(&rt, map).unwrap(), 2);
    }

    #[test]
    fn test_iteration_yields_pairs() {
        let mut rt = Runtime::new();
        let map = Map::new(&mut rt).unwrap();
        let a = entry(&mut rt, 1, "a");
        let b = entry(&mut rt, 2, "b");
        Map::insert(&mut rt, map, a).unwrap();
        Map::insert(&mut rt, map, b).unwrap();

        assert_eq!(rt.describe(map).unwrap(), "[(1, a), (2, b)]");
        assert_eq!(range_find(&mut rt, map, b).unwrap(), Some(1));
    }

    #[test]
    fn test_insert_requires_pair() {
        let mut rt = Runtime::new();
        let map = Map::new(&mut rt).unwrap();
        let not_a_pair = Integer::new(&mut rt, 1).unwrap();

        assert!(matches!(
            Map::insert(&mut rt, map, not_a_pair),
            Err(Error::UnexpectedClass { .. })
        ));
    }

    #[test]
    fn test_delete_releases_entry_vector() {
        let mut rt = Runtime::new();
        let map = Map::new(&mut rt).unwrap();
        let pair = entry(&mut rt, 1, "x");
        Map::insert(&mut rt, map, pair).unwrap();
        let entries = Map::entries(&rt, map).unwrap();

        rt.delete(map).unwrap();
        assert!(!rt.is_live(entries));
        assert!(rt.is_live(pair));
    }

    #[test]
    fn test_delete_tolerates_missing_entry_vector() {
        let mut rt = Runtime::new();
        let map = Map::new(&mut rt).unwrap();
        let entries = Map::entries(&rt, map).unwrap();
        rt.delete(entries).unwrap();

        rt.delete(map).unwrap();
        assert!(!rt.is_live(map));
        assert_eq!(rt.live_objects(), 0);
    }

    fn failing_construct(rt: &mut Runtime, obj: ObjRef, args: &mut Args) -> Result<()> {
        rt.super_construct(obj, args)?;
        args.next_int()?;
        Ok(())
    }

    #[test]
    fn test_failed_subclass_construct_releases_entry_vector() {
        let counted = Class::derive(
            "MapTestCountedMap",
            Map::class(),
            Map::class().instance_size() + 1,
            [Imp::Construct(failing_construct)],
        )
        .unwrap();
        let mut rt = Runtime::new();

        assert_eq!(
            rt.new_instance(counted, args![]),
            Err(Error::MissingArgument { index: 0 })
        );
        assert_eq!(rt.live_objects(), 0);
    }
}
