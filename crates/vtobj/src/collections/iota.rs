//! `IotaView`: the integers `0..size`, produced on demand.
//!
//! The view stores only its size and the iterator only its cursor. Each
//! `deref` creates a fresh `Integer` and autoreleases it.

use crate::args;
use crate::collections::range::{ContainerBase, IteratorBase};
use crate::error::Result;
use crate::runtime::{Args, Class, ClassKind, Imp, ObjRef, Runtime};
use crate::runtime::boxed::Integer;
use std::sync::OnceLock;

/// The `IotaView` class.
///
/// A negative size is an empty view.
///
/// ```rust
/// use vtobj::{IotaView, Runtime};
///
/// let mut rt = Runtime::new();
/// let view = IotaView::new(&mut rt, 3).unwrap();
///
/// rt.push_pool();
/// assert_eq!(rt.describe(view).unwrap(), "[0, 1, 2]");
/// rt.pop_pool().unwrap();
/// assert_eq!(rt.live_objects(), 1);
/// ```
pub struct IotaView;

impl IotaView {
    /// Field holding the size.
    pub const SIZE: usize = 0;

    /// Returns the `IotaView` class.
    #[must_use]
    pub fn class() -> Class {
        static CLASS: OnceLock<Class> = OnceLock::new();
        *CLASS.get_or_init(|| {
            Class::builtin(
                "IotaView",
                ContainerBase::class(),
                ClassKind::Container,
                1,
                [
                    Imp::Construct(iota_construct),
                    Imp::Begin(iota_begin),
                    Imp::End(iota_end),
                ],
            )
        })
    }

    /// Creates a view of `0..size`. The caller owns it.
    pub fn new(rt: &mut Runtime, size: i64) -> Result<ObjRef> {
        rt.new_instance(Self::class(), args![size])
    }

    /// Returns the size the view was created with.
    pub fn size(rt: &Runtime, view: ObjRef) -> Result<i64> {
        rt.expect_instance(view, Self::class())?;
        rt.int_field(view, Self::SIZE)
    }
}

fn iota_construct(rt: &mut Runtime, obj: ObjRef, args: &mut Args) -> Result<()> {
    rt.super_construct(obj, args)?;
    let size = args.next_int()?;
    rt.set_field(obj, IotaView::SIZE, size)
}

fn iota_begin(rt: &mut Runtime, view: ObjRef) -> Result<ObjRef> {
    IotaView::size(rt, view)?;
    IotaIterator::new(rt, 0)
}

fn iota_end(rt: &mut Runtime, view: ObjRef) -> Result<ObjRef> {
    let size = IotaView::size(rt, view)?;
    IotaIterator::new(rt, size.max(0))
}

/// Cursor over an `IotaView`.
pub struct IotaIterator;

impl IotaIterator {
    /// Field holding the cursor.
    pub const CURSOR: usize = 0;

    /// Returns the `IotaIterator` class.
    #[must_use]
    pub fn class() -> Class {
        static CLASS: OnceLock<Class> = OnceLock::new();
        *CLASS.get_or_init(|| {
            Class::builtin(
                "IotaIterator",
                IteratorBase::class(),
                ClassKind::Iterator,
                1,
                [
                    Imp::Construct(iota_iter_construct),
                    Imp::Increment(iota_iter_increment),
                    Imp::Deref(iota_iter_deref),
                    Imp::NotEqual(iota_iter_not_equal),
                ],
            )
        })
    }

    fn new(rt: &mut Runtime, cursor: i64) -> Result<ObjRef> {
        rt.new_instance(Self::class(), args![cursor])
    }

    fn cursor(rt: &Runtime, it: ObjRef) -> Result<i64> {
        rt.expect_instance(it, Self::class())?;
        rt.int_field(it, Self::CURSOR)
    }
}

fn iota_iter_construct(rt: &mut Runtime, obj: ObjRef, args: &mut Args) -> Result<()> {
    rt.super_construct(obj, args)?;
    let cursor = args.next_int()?;
    rt.set_field(obj, IotaIterator::CURSOR, cursor)
}

fn iota_iter_increment(rt: &mut Runtime, it: ObjRef) -> Result<()> {
    let cursor = IotaIterator::cursor(rt, it)?;
    rt.set_field(it, IotaIterator::CURSOR, cursor.saturating_add(1))
}

fn iota_iter_deref(rt: &mut Runtime, it: ObjRef) -> Result<ObjRef> {
    let cursor = IotaIterator::cursor(rt, it)?;
    let value = Integer::new(rt, cursor)?;
    Ok(rt.autorelease(value))
}

fn iota_iter_not_equal(rt: &mut Runtime, a: ObjRef, b: ObjRef) -> Result<bool> {
    Ok(IotaIterator::cursor(rt, a)? != IotaIterator::cursor(rt, b)?)
}
