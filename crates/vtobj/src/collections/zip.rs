//! `ZipView`: pairs drawn from two ranges in lockstep.
//!
//! A zip iterator owns a `Pair` of sub-iterators, one per side. It advances
//! both together and stays unequal to the end only while *both* sides are
//! unequal to theirs, so iteration stops as soon as the shorter side runs
//! out. Each `deref` builds a fresh, autoreleased `Pair` of the two current
//! elements.

use crate::args;
use crate::collections::Pair;
use crate::collections::range::{ContainerBase, IteratorBase};
use crate::error::{Error, Result};
use crate::runtime::{Args, Class, ClassKind, Imp, ObjRef, Runtime};
use std::sync::OnceLock;
use vtobj_log::warn;

/// The `ZipView` class.
///
/// ```rust
/// use vtobj::{Integer, IotaView, Runtime, Vector, ZipView};
///
/// let mut rt = Runtime::new();
/// let letters = Vector::new(&mut rt).unwrap();
/// for n in [10, 20, 30] {
///     let item = Integer::new(&mut rt, n).unwrap();
///     Vector::push_back(&mut rt, letters, item).unwrap();
/// }
/// let indices = IotaView::new(&mut rt, 2).unwrap();
/// let zip = ZipView::new(&mut rt, letters, indices).unwrap();
///
/// rt.push_pool();
/// assert_eq!(rt.describe(zip).unwrap(), "[(10, 0), (20, 1)]");
/// rt.pop_pool().unwrap();
/// ```
pub struct ZipView;

impl ZipView {
    /// Field holding the left range.
    pub const LEFT: usize = 0;
    /// Field holding the right range.
    pub const RIGHT: usize = 1;

    /// Returns the `ZipView` class.
    #[must_use]
    pub fn class() -> Class {
        static CLASS: OnceLock<Class> = OnceLock::new();
        *CLASS.get_or_init(|| {
            Class::builtin(
                "ZipView",
                ContainerBase::class(),
                ClassKind::Container,
                2,
                [
                    Imp::Construct(zip_construct),
                    Imp::Begin(zip_begin),
                    Imp::End(zip_end),
                ],
            )
        })
    }

    /// Creates a view zipping `left` with `right`. The caller owns it; the
    /// ranges stay owned by whoever created them.
    pub fn new(rt: &mut Runtime, left: ObjRef, right: ObjRef) -> Result<ObjRef> {
        rt.new_instance(Self::class(), args![left, right])
    }

    fn sides(rt: &Runtime, view: ObjRef) -> Result<(ObjRef, ObjRef)> {
        rt.expect_instance(view, Self::class())?;
        Ok((rt.obj_field(view, Self::LEFT)?, rt.obj_field(view, Self::RIGHT)?))
    }
}

fn zip_construct(rt: &mut Runtime, obj: ObjRef, args: &mut Args) -> Result<()> {
    rt.super_construct(obj, args)?;
    let left = args.next_obj()?;
    let right = args.next_obj()?;
    rt.set_field(obj, ZipView::LEFT, left)?;
    rt.set_field(obj, ZipView::RIGHT, right)
}

/// Deletes every object in `objs`, then fails with `err`. A failed delete is
/// logged and does not stop the rest.
fn abandon<T>(rt: &mut Runtime, objs: &[ObjRef], err: Error) -> Result<T> {
    for &obj in objs {
        if let Err(cleanup) = rt.delete(obj) {
            warn!("zip cleanup could not delete {}: {}", obj, cleanup);
        }
    }
    Err(err)
}

/// Wraps one iterator per side in a zip iterator, deleting them if that
/// fails.
fn zip_iterators(rt: &mut Runtime, left: ObjRef, right: ObjRef) -> Result<ObjRef> {
    let state = match Pair::new(rt, left, right) {
        Ok(state) => state,
        Err(err) => return abandon(rt, &[left, right], err),
    };
    match ZipIterator::new(rt, state) {
        Ok(it) => Ok(it),
        Err(err) => abandon(rt, &[state, left, right], err),
    }
}

fn zip_begin(rt: &mut Runtime, view: ObjRef) -> Result<ObjRef> {
    let (left, right) = ZipView::sides(rt, view)?;
    let left = rt.begin(left)?;
    let right = match rt.begin(right) {
        Ok(right) => right,
        Err(err) => return abandon(rt, &[left], err),
    };
    zip_iterators(rt, left, right)
}

fn zip_end(rt: &mut Runtime, view: ObjRef) -> Result<ObjRef> {
    let (left, right) = ZipView::sides(rt, view)?;
    let left = rt.end(left)?;
    let right = match rt.end(right) {
        Ok(right) => right,
        Err(err) => return abandon(rt, &[left], err),
    };
    zip_iterators(rt, left, right)
}

/// Position in a `ZipView`.
pub struct ZipIterator;

impl ZipIterator {
    /// Field holding the `Pair` of sub-iterators.
    pub const STATE: usize = 0;

    /// Returns the `ZipIterator` class.
    #[must_use]
    pub fn class() -> Class {
        static CLASS: OnceLock<Class> = OnceLock::new();
        *CLASS.get_or_init(|| {
            Class::builtin(
                "ZipIterator",
                IteratorBase::class(),
                ClassKind::Iterator,
                1,
                [
                    Imp::Construct(zip_iter_construct),
                    Imp::Destruct(zip_iter_destruct),
                    Imp::Increment(zip_iter_increment),
                    Imp::Deref(zip_iter_deref),
                    Imp::NotEqual(zip_iter_not_equal),
                ],
            )
        })
    }

    fn new(rt: &mut Runtime, state: ObjRef) -> Result<ObjRef> {
        rt.new_instance(Self::class(), args![state])
    }

    fn sides(rt: &Runtime, it: ObjRef) -> Result<(ObjRef, ObjRef)> {
        rt.expect_instance(it, Self::class())?;
        let state = rt.obj_field(it, Self::STATE)?;
        Ok((Pair::first(rt, state)?, Pair::second(rt, state)?))
    }
}

fn zip_iter_construct(rt: &mut Runtime, obj: ObjRef, args: &mut Args) -> Result<()> {
    rt.super_construct(obj, args)?;
    let state = args.next_obj()?;
    rt.expect_instance(state, Pair::class())?;
    rt.set_field(obj, ZipIterator::STATE, state)
}

// STATE is Nil when construction failed before it was set.
fn zip_iter_destruct(rt: &mut Runtime, it: ObjRef) -> Result<()> {
    if rt.field(it, ZipIterator::STATE)?.as_obj().is_some() {
        let state = rt.obj_field(it, ZipIterator::STATE)?;
        let (left, right) = ZipIterator::sides(rt, it)?;
        rt.delete(left)?;
        rt.delete(right)?;
        rt.delete(state)?;
    }
    rt.super_destruct(it)
}

fn zip_iter_increment(rt: &mut Runtime, it: ObjRef) -> Result<()> {
    let (left, right) = ZipIterator::sides(rt, it)?;
    rt.increment(left)?;
    rt.increment(right)
}

fn zip_iter_deref(rt: &mut Runtime, it: ObjRef) -> Result<ObjRef> {
    let (left, right) = ZipIterator::sides(rt, it)?;
    let first = rt.deref(left)?;
    let second = rt.deref(right)?;
    let pair = Pair::new(rt, first, second)?;
    Ok(rt.autorelease(pair))
}

fn zip_iter_not_equal(rt: &mut Runtime, a: ObjRef, b: ObjRef) -> Result<bool> {
    let (a_left, a_right) = ZipIterator::sides(rt, a)?;
    let (b_left, b_right) = ZipIterator::sides(rt, b)?;
    Ok(rt.not_equal(a_left, b_left)? && rt.not_equal(a_right, b_right)?)
}
