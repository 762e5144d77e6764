//! Boxed leaf values: `Integer`, `Float` and `String`.
//!
//! These are ordinary classes derived from the root. Each stores its value in
//! field 0, prints it plainly and compares by value against instances of the
//! same class. Against anything else comparison falls back to the root's
//! identity order.

use crate::args;
use crate::error::Result;
use crate::runtime::{Args, Class, ClassKind, Imp, ObjRef, Runtime};
use std::cmp::Ordering;
use std::fmt;
use std::sync::OnceLock;

/// Boxed `i64`.
///
/// ```rust
/// use vtobj::{Integer, Runtime};
///
/// let mut rt = Runtime::new();
/// let a = Integer::new(&mut rt, 3).unwrap();
/// let b = Integer::new(&mut rt, 3).unwrap();
///
/// assert!(rt.equals(a, b).unwrap());
/// assert_eq!(Integer::value(&rt, a).unwrap(), 3);
/// ```
pub struct Integer;

impl Integer {
    /// Field holding the value.
    pub const VALUE: usize = 0;

    /// Returns the `Integer` class.
    #[must_use]
    pub fn class() -> Class {
        static CLASS: OnceLock<Class> = OnceLock::new();
        *CLASS.get_or_init(|| {
            Class::builtin(
                "Integer",
                Class::root(),
                ClassKind::Object,
                1,
                [
                    Imp::Construct(integer_construct),
                    Imp::Print(integer_print),
                    Imp::Compare(integer_compare),
                ],
            )
        })
    }

    /// Creates an `Integer`. The caller owns it.
    pub fn new(rt: &mut Runtime, value: i64) -> Result<ObjRef> {
        rt.new_instance(Self::class(), args![value])
    }

    /// Reads the value of an `Integer`.
    pub fn value(rt: &Runtime, obj: ObjRef) -> Result<i64> {
        rt.expect_instance(obj, Self::class())?;
        rt.int_field(obj, Self::VALUE)
    }
}

fn integer_construct(rt: &mut Runtime, obj: ObjRef, args: &mut Args) -> Result<()> {
    rt.super_construct(obj, args)?;
    let value = args.next_int()?;
    rt.set_field(obj, Integer::VALUE, value)
}

fn integer_print(rt: &mut Runtime, obj: ObjRef, out: &mut dyn fmt::Write) -> Result<()> {
    write!(out, "{}", rt.int_field(obj, Integer::VALUE)?)?;
    Ok(())
}

fn integer_compare(rt: &mut Runtime, a: ObjRef, b: ObjRef) -> Result<Ordering> {
    if !rt.is_instance_of(b, Integer::class())? {
        return rt.super_compare(a, b);
    }
    let lhs = rt.int_field(a, Integer::VALUE)?;
    let rhs = rt.int_field(b, Integer::VALUE)?;
    Ok(lhs.cmp(&rhs))
}

/// Boxed `f64`, ordered with [`f64::total_cmp`].
pub struct Float;

impl Float {
    /// Field holding the value.
    pub const VALUE: usize = 0;

    /// Returns the `Float` class.
    #[must_use]
    pub fn class() -> Class {
        static CLASS: OnceLock<Class> = OnceLock::new();
        *CLASS.get_or_init(|| {
            Class::builtin(
                "Float",
                Class::root(),
                ClassKind::Object,
                1,
                [
                    Imp::Construct(float_construct),
                    Imp::Print(float_print),
                    Imp::Compare(float_compare),
                ],
            )
        })
    }

    /// Creates a `Float`. The caller owns it.
    pub fn new(rt: &mut Runtime, value: f64) -> Result<ObjRef> {
        rt.new_instance(Self::class(), args![value])
    }

    /// Reads the value of a `Float`.
    pub fn value(rt: &Runtime, obj: ObjRef) -> Result<f64> {
        rt.expect_instance(obj, Self::class())?;
        Ok(rt.field(obj, Self::VALUE)?.as_float().unwrap_or_default())
    }
}

fn float_construct(rt: &mut Runtime, obj: ObjRef, args: &mut Args) -> Result<()> {
    rt.super_construct(obj, args)?;
    let value = args.next_float()?;
    rt.set_field(obj, Float::VALUE, value)
}

fn float_print(rt: &mut Runtime, obj: ObjRef, out: &mut dyn fmt::Write) -> Result<()> {
    write!(out, "{}", Float::value(rt, obj)?)?;
    Ok(())
}

fn float_compare(rt: &mut Runtime, a: ObjRef, b: ObjRef) -> Result<Ordering> {
    if !rt.is_instance_of(b, Float::class())? {
        return rt.super_compare(a, b);
    }
    let lhs = Float::value(rt, a)?;
    let rhs = Float::value(rt, b)?;
    Ok(lhs.total_cmp(&rhs))
}

/// Boxed text. The class is named `String`.
pub struct Str;

impl Str {
    /// Field holding the text.
    pub const VALUE: usize = 0;

    /// Returns the `String` class.
    #[must_use]
    pub fn class() -> Class {
        static CLASS: OnceLock<Class> = OnceLock::new();
        *CLASS.get_or_init(|| {
            Class::builtin(
                "String",
                Class::root(),
                ClassKind::Object,
                1,
                [
                    Imp::Construct(str_construct),
                    Imp::Print(str_print),
                    Imp::Compare(str_compare),
                ],
            )
        })
    }

    /// Creates a `String`. The caller owns it.
    pub fn new(rt: &mut Runtime, text: &str) -> Result<ObjRef> {
        rt.new_instance(Self::class(), args![text])
    }

    /// Borrows the text of a `String`.
    pub fn value(rt: &Runtime, obj: ObjRef) -> Result<&str> {
        rt.expect_instance(obj, Self::class())?;
        Ok(rt.field(obj, Self::VALUE)?.as_str().unwrap_or_default())
    }
}

fn str_construct(rt: &mut Runtime, obj: ObjRef, args: &mut Args) -> Result<()> {
    rt.super_construct(obj, args)?;
    let text = args.next_str()?;
    rt.set_field(obj, Str::VALUE, text)
}

fn str_print(rt: &mut Runtime, obj: ObjRef, out: &mut dyn fmt::Write) -> Result<()> {
    out.write_str(Str::value(rt, obj)?)?;
    Ok(())
}

fn str_compare(rt: &mut Runtime, a: ObjRef, b: ObjRef) -> Result<Ordering> {
    if !rt.is_instance_of(b, Str::class())? {
        return rt.super_compare(a, b);
    }
    Ok(Str::value(rt, a)?.cmp(Str::value(rt, b)?))
}
