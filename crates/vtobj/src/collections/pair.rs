//! `Pair`: two object references.

use crate::args;
use crate::error::Result;
use crate::runtime::{Args, Class, ClassKind, Imp, ObjRef, Runtime};
use std::cmp::Ordering;
use std::fmt;
use std::sync::OnceLock;

/// The `Pair` class and its accessors.
///
/// Pairs print as `(first, second)` and compare lexicographically. A pair
/// does not own its members.
///
/// ```rust
/// use vtobj::{Integer, Pair, Runtime, Str};
///
/// let mut rt = Runtime::new();
/// let key = Integer::new(&mut rt, 1).unwrap();
/// let value = Str::new(&mut rt, "one").unwrap();
/// let pair = Pair::new(&mut rt, key, value).unwrap();
///
/// assert_eq!(rt.describe(pair).unwrap(), "(1, one)");
/// assert_eq!(Pair::second(&rt, pair).unwrap(), value);
/// ```
pub struct Pair;

impl Pair {
    /// Field holding the first member.
    pub const FIRST: usize = 0;
    /// Field holding the second member.
    pub const SECOND: usize = 1;

    /// Returns the `Pair` class.
    #[must_use]
    pub fn class() -> Class {
        static CLASS: OnceLock<Class> = OnceLock::new();
        *CLASS.get_or_init(|| {
            Class::builtin(
                "Pair",
                Class::root(),
                ClassKind::Object,
                2,
                [
                    Imp::Construct(pair_construct),
                    Imp::Print(pair_print),
                    Imp::Compare(pair_compare),
                ],
            )
        })
    }

    /// Creates a pair. The caller owns it.
    pub fn new(rt: &mut Runtime, first: ObjRef, second: ObjRef) -> Result<ObjRef> {
        rt.new_instance(Self::class(), args![first, second])
    }

    pub fn first(rt: &Runtime, pair: ObjRef) -> Result<ObjRef> {
        rt.expect_instance(pair, Self::class())?;
        rt.obj_field(pair, Self::FIRST)
    }

    pub fn second(rt: &Runtime, pair: ObjRef) -> Result<ObjRef> {
        rt.expect_instance(pair, Self::class())?;
        rt.obj_field(pair, Self::SECOND)
    }

    pub fn set_first(rt: &mut Runtime, pair: ObjRef, first: ObjRef) -> Result<()> {
        rt.expect_instance(pair, Self::class())?;
        rt.set_field(pair, Self::FIRST, first)
    }

    pub fn set_second(rt: &mut Runtime, pair: ObjRef, second: ObjRef) -> Result<()> {
        rt.expect_instance(pair, Self::class())?;
        rt.set_field(pair, Self::SECOND, second)
    }
}

fn pair_construct(rt: &mut Runtime, obj: ObjRef, args: &mut Args) -> Result<()> {
    rt.super_construct(obj, args)?;
    let first = args.next_obj()?;
    let second = args.next_obj()?;
    rt.set_field(obj, Pair::FIRST, first)?;
    rt.set_field(obj, Pair::SECOND, second)
}

fn pair_print(rt: &mut Runtime, obj: ObjRef, out: &mut dyn fmt::Write) -> Result<()> {
    let first = Pair::first(rt, obj)?;
    let second = Pair::second(rt, obj)?;
    out.write_char('(')?;
    rt.print_to(first, &mut *out)?;
    out.write_str(", ")?;
    rt.print_to(second, &mut *out)?;
    out.write_char(')')?;
    Ok(())
}

fn pair_compare(rt: &mut Runtime, a: ObjRef, b: ObjRef) -> Result<Ordering> {
    if !rt.is_instance_of(b, Pair::class())? {
        return rt.super_compare(a, b);
    }
    let first = rt.compare(Pair::first(rt, a)?, Pair::first(rt, b)?)?;
    if first != Ordering::Equal {
        return Ok(first);
    }
    rt.compare(Pair::second(rt, a)?, Pair::second(rt, b)?)
}
