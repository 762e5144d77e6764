//! The container and iterator bases, and algorithms over any range.
//!
//! A range is any object whose class has `begin` and `end`. Walking it means
//! taking both iterators, then dereferencing and incrementing the first until
//! `not_equal` says it has met the second:
//!
//! ```rust
//! use std::ops::ControlFlow;
//! use vtobj::{IotaView, Integer, Runtime, range_for_each};
//!
//! let mut rt = Runtime::new();
//! let view = IotaView::new(&mut rt, 4).unwrap();
//!
//! let mut sum = 0;
//! let visited = range_for_each(&mut rt, view, |rt, _, item| {
//!     sum += Integer::value(rt, item)?;
//!     Ok(ControlFlow::Continue(()))
//! })
//! .unwrap();
//!
//! assert_eq!((visited, sum), (4, 6));
//! assert_eq!(rt.live_objects(), 1);
//! ```

use crate::error::{Error, Result};
use crate::runtime::{Class, ClassKind, Imp, ObjRef, Runtime};
use std::fmt;
use std::ops::ControlFlow;
use std::sync::OnceLock;

/// The abstract `Container` class.
pub struct ContainerBase;

impl ContainerBase {
    /// Returns the `Container` class. Its `begin` and `end` are abstract.
    #[must_use]
    pub fn class() -> Class {
        static CLASS: OnceLock<Class> = OnceLock::new();
        *CLASS.get_or_init(|| {
            Class::builtin(
                "Container",
                Class::root(),
                ClassKind::Container,
                0,
                [Imp::Print(container_print)],
            )
        })
    }
}

fn container_print(rt: &mut Runtime, obj: ObjRef, out: &mut dyn fmt::Write) -> Result<()> {
    range_print_to(rt, obj, out)?;
    Ok(())
}

/// The abstract `Iterator` class.
pub struct IteratorBase;

impl IteratorBase {
    /// Returns the `Iterator` class. Its `increment`, `deref` and
    /// `not_equal` are abstract.
    #[must_use]
    pub fn class() -> Class {
        static CLASS: OnceLock<Class> = OnceLock::new();
        *CLASS.get_or_init(|| {
            Class::builtin("Iterator", Class::root(), ClassKind::Iterator, 0, [])
        })
    }
}

/// The error for dereferencing `it` at the end of its range.
pub(crate) fn exhausted(rt: &Runtime, it: ObjRef) -> Error {
    match rt.class_of(it) {
        Ok(class) => Error::IteratorExhausted {
            class: class.name().to_string(),
        },
        Err(err) => err,
    }
}

/// A walk over one range: the running iterator and the end iterator.
///
/// Both iterators belong to the walk; [`Walk::finish`] deletes them.
#[derive(Debug)]
pub struct Walk {
    it: ObjRef,
    end: ObjRef,
}

impl Walk {
    /// Starts walking `range`.
    pub fn begin(rt: &mut Runtime, range: ObjRef) -> Result<Self> {
        let it = rt.begin(range)?;
        match rt.end(range) {
            Ok(end) => Ok(Walk { it, end }),
            Err(err) => {
                rt.delete(it)?;
                Err(err)
            }
        }
    }

    /// Returns the current element and advances, or `None` at the end.
    #[allow(clippy::should_implement_trait)]
    pub fn next(&mut self, rt: &mut Runtime) -> Result<Option<ObjRef>> {
        if !rt.not_equal(self.it, self.end)? {
            return Ok(None);
        }
        let item = rt.deref(self.it)?;
        rt.increment(self.it)?;
        Ok(Some(item))
    }

    /// Deletes both iterators.
    pub fn finish(self, rt: &mut Runtime) -> Result<()> {
        let it = rt.delete(self.it);
        let end = rt.delete(self.end);
        it.and(end)
    }
}

/// Calls `f` with the index and element of each step of `range`, until the
/// range ends or `f` breaks. Returns the number of elements visited.
///
/// Each step runs in its own autorelease pool, and the walk's iterators are
/// deleted whether or not `f` fails.
pub fn range_for_each<F>(rt: &mut Runtime, range: ObjRef, mut f: F) -> Result<usize>
where
    F: FnMut(&mut Runtime, usize, ObjRef) -> Result<ControlFlow<()>>,
{
    let mut walk = Walk::begin(rt, range)?;
    let visited = drive(rt, &mut walk, &mut f);
    let finished = walk.finish(rt);
    let visited = visited?;
    finished?;
    Ok(visited)
}

fn drive<F>(rt: &mut Runtime, walk: &mut Walk, f: &mut F) -> Result<usize>
where
    F: FnMut(&mut Runtime, usize, ObjRef) -> Result<ControlFlow<()>>,
{
    let mut index = 0;
    loop {
        let step = rt.with_pool(|rt| match walk.next(rt)? {
            Some(item) => f(rt, index, item).map(Some),
            None => Ok(None),
        })?;

        match step {
            None => return Ok(index),
            Some(ControlFlow::Break(())) => return Ok(index + 1),
            Some(ControlFlow::Continue(())) => index += 1,
        }
    }
}

/// Prints every element of `range` into `out` as `[a, b, c]`, or `[]` when
/// empty. Returns the element count.
pub fn range_print_to(rt: &mut Runtime, range: ObjRef, out: &mut dyn fmt::Write) -> Result<usize> {
    out.write_char('[')?;
    let count = range_for_each(rt, range, |rt, index, item| {
        if index > 0 {
            out.write_str(", ")?;
        }
        rt.print_to(item, &mut *out)?;
        Ok(ControlFlow::Continue(()))
    })?;
    out.write_char(']')?;
    Ok(count)
}

/// Prints every element of `range` to stdout on one line. Returns the element
/// count.
pub fn range_print(rt: &mut Runtime, range: ObjRef) -> Result<usize> {
    let mut text = String::new();
    let count = range_print_to(rt, range, &mut text)?;
    println!("{text}");
    Ok(count)
}

/// Returns the position of the first element of `range` that compares equal
/// to `value`, using each element's compare operation.
pub fn range_find(rt: &mut Runtime, range: ObjRef, value: ObjRef) -> Result<Option<usize>> {
    let mut found = None;
    range_for_each(rt, range, |rt, index, item| {
        if rt.equals(item, value)? {
            found = Some(index);
            return Ok(ControlFlow::Break(()));
        }
        Ok(ControlFlow::Continue(()))
    })?;
    Ok(found)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Integer, List, Slot, args};

    #[test]
    fn test_bases_are_abstract() {
        let container = ContainerBase::class();
        let iterator = IteratorBase::class();
        assert_eq!(container.kind(), ClassKind::Container);
        assert_eq!(iterator.kind(), ClassKind::Iterator);

        let mut rt = Runtime::new();
        let range = rt.new_instance(container, args![]).unwrap();
        assert_eq!(
            rt.begin(range),
            Err(Error::AbstractSlot {
                class: "Container".into(),
                slot: Slot::Begin
            })
        );

        let it = rt.new_instance(iterator, args![]).unwrap();
        assert!(matches!(rt.deref(it), Err(Error::AbstractSlot { .. })));
        assert!(matches!(rt.describe(range), Err(Error::AbstractSlot { .. })));
    }

    #[test]
    fn test_walk_visits_in_order() {
        let mut rt = Runtime::new();
        let list = List::new(&mut rt).unwrap();
        let items: Vec<_> = (0..3).map(|n| Integer::new(&mut rt, n).unwrap()).collect();
        for item in &items {
            List::push_back(&mut rt, list, *item).unwrap();
        }

        let mut walk = Walk::begin(&mut rt, list).unwrap();
        let mut seen = Vec::new();
        while let Some(item) = walk.next(&mut rt).unwrap() {
            seen.push(item);
        }
        walk.finish(&mut rt).unwrap();

        assert_eq!(seen, items);
        assert_eq!(rt.live_objects(), 4);
    }

    #[test]
    fn test_for_each_break_and_error() {
        let mut rt = Runtime::new();
        let list = List::new(&mut rt).unwrap();
        for n in 0..5 {
            let item = Integer::new(&mut rt, n).unwrap();
            List::push_back(&mut rt, list, item).unwrap();
        }
        let live = rt.live_objects();

        let visited = range_for_each(&mut rt, list, |_, index, _| {
            Ok(if index == 1 {
                ControlFlow::Break(())
            } else {
                ControlFlow::Continue(())
            })
        })
        .unwrap();
        assert_eq!(visited, 2);

        let result = range_for_each(&mut rt, list, |_, _, _| Err(Error::PoolUnderflow));
        assert_eq!(result, Err(Error::PoolUnderflow));
        assert_eq!(rt.live_objects(), live);
    }

    #[test]
    fn test_print_and_find() {
        let mut rt = Runtime::new();
        let list = List::new(&mut rt).unwrap();
        assert_eq!(rt.describe(list).unwrap(), "[]");

        for n in [4, 8] {
            let item = Integer::new(&mut rt, n).unwrap();
            List::push_back(&mut rt, list, item).unwrap();
        }

        let mut text = String::new();
        assert_eq!(range_print_to(&mut rt, list, &mut text).unwrap(), 2);
        assert_eq!(text, "[4, 8]");

        let eight = Integer::new(&mut rt, 8).unwrap();
        let nine = Integer::new(&mut rt, 9).unwrap();
        assert_eq!(range_find(&mut rt, list, eight).unwrap(), Some(1));
        assert_eq!(range_find(&mut rt, list, nine).unwrap(), None);
    }
}
