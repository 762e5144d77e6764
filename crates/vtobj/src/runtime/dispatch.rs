//! Table dispatch and super calls.
//!
//! Every dynamic operation is a two-step indirect call: read the receiver's
//! class from its instance, then call the function installed in the class's
//! table. No name lookup or caching is involved.
//!
//! # Super calls
//!
//! An overriding implementation usually chains to the one it replaced, for
//! example a constructor that initialises its own fields after
//! [`Runtime::super_construct`] has initialised the inherited ones. The
//! runtime keeps a stack of dispatch frames recording which class's
//! implementation is running for which receiver and slot. A super call starts
//! from the superclass of that owning class, not from the receiver's
//! superclass, so three-level chains run each level exactly once:
//!
//! ```rust
//! use vtobj::{args, Args, Class, Imp, ObjRef, Result, Runtime};
//!
//! fn count(rt: &mut Runtime, obj: ObjRef, args: &mut Args) -> Result<()> {
//!     rt.super_construct(obj, args)?;
//!     let depth = rt.int_field(obj, 0).unwrap_or(0);
//!     rt.set_field(obj, 0, depth + 1)
//! }
//!
//! let a = Class::derive("DocLevelA", Class::root(), 1, [Imp::Construct(count)]).unwrap();
//! let b = Class::derive("DocLevelB", a, 1, [Imp::Construct(count)]).unwrap();
//! let c = Class::derive("DocLevelC", b, 1, [Imp::Construct(count)]).unwrap();
//!
//! let mut rt = Runtime::new();
//! let obj = rt.new_instance(c, args![]).unwrap();
//! assert_eq!(rt.int_field(obj, 0).unwrap(), 3);
//! ```

use crate::error::{Error, Result};
use crate::runtime::{Args, Class, ObjRef, Runtime, Slot};
use std::cmp::Ordering;
use std::fmt;

/// A running dispatched call: `owner`'s implementation of `slot` on `obj`.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Frame {
    obj: ObjRef,
    slot: Slot,
    owner: Class,
}

impl Runtime {
    /// Returns the class of `obj`.
    ///
    /// # Errors
    ///
    /// [`Error::StaleObject`] if `obj` was deleted.
    pub fn class_of(&self, obj: ObjRef) -> Result<Class> {
        Ok(self.instance(obj)?.class)
    }

    /// Returns the superclass of `obj`'s class; `None` for root instances.
    pub fn super_of(&self, obj: ObjRef) -> Result<Option<Class>> {
        Ok(self.class_of(obj)?.super_class())
    }

    /// Returns `true` if `obj` is an instance of `class` or a subclass.
    pub fn is_instance_of(&self, obj: ObjRef, class: Class) -> Result<bool> {
        Ok(self.class_of(obj)?.is_subclass_of(&class))
    }

    /// Resolves `slot` for `obj`: the receiver's class and the class whose
    /// implementation sits in that slot.
    fn resolve(&self, obj: ObjRef, slot: Slot) -> Result<(Class, Class)> {
        let class = self.class_of(obj)?;
        let owner = class.owner_of(slot).ok_or_else(|| Error::SlotNotInHierarchy {
            class: class.name().to_string(),
            slot,
        })?;
        Ok((class, owner))
    }

    /// Finds the implementation a super call from the running frame reaches.
    fn resolve_super(&self, obj: ObjRef, slot: Slot) -> Result<Class> {
        let frame = self
            .frames
            .last()
            .filter(|frame| frame.obj == obj && frame.slot == slot)
            .ok_or(Error::SuperOutsideDispatch { slot })?;

        let no_super = || Error::NoSuperclass {
            class: frame.owner.name().to_string(),
            slot,
        };
        frame
            .owner
            .super_class()
            .ok_or_else(no_super)?
            .owner_of(slot)
            .ok_or_else(no_super)
    }

    fn enter<R>(
        &mut self,
        obj: ObjRef,
        slot: Slot,
        owner: Class,
        call: impl FnOnce(&mut Self) -> Result<R>,
    ) -> Result<R> {
        self.frames.push(Frame { obj, slot, owner });
        let result = call(self);
        self.frames.pop();
        result
    }

    pub(crate) fn construct(&mut self, obj: ObjRef, args: &mut Args) -> Result<()> {
        let (class, owner) = self.resolve(obj, Slot::Construct)?;
        let construct = class.vtable().construct;
        self.enter(obj, Slot::Construct, owner, |rt| construct(rt, obj, args))
    }

    pub(crate) fn destruct(&mut self, obj: ObjRef) -> Result<()> {
        let (class, owner) = self.resolve(obj, Slot::Destruct)?;
        let destruct = class.vtable().destruct;
        self.enter(obj, Slot::Destruct, owner, |rt| destruct(rt, obj))
    }

    /// Prints `obj` to stdout, followed by a newline.
    pub fn print(&mut self, obj: ObjRef) -> Result<()> {
        let text = self.describe(obj)?;
        println!("{text}");
        Ok(())
    }

    /// Prints `obj` into `out` with its class's print operation.
    pub fn print_to(&mut self, obj: ObjRef, out: &mut dyn fmt::Write) -> Result<()> {
        let (class, owner) = self.resolve(obj, Slot::Print)?;
        let print = class.vtable().print;
        self.enter(obj, Slot::Print, owner, |rt| print(rt, obj, out))
    }

    /// Returns what [`Runtime::print`] would write, without the newline.
    pub fn describe(&mut self, obj: ObjRef) -> Result<String> {
        let mut text = String::new();
        self.print_to(obj, &mut text)?;
        Ok(text)
    }

    /// Compares `a` with `b` using `a`'s compare operation.
    pub fn compare(&mut self, a: ObjRef, b: ObjRef) -> Result<Ordering> {
        let (class, owner) = self.resolve(a, Slot::Compare)?;
        let compare = class.vtable().compare;
        self.enter(a, Slot::Compare, owner, |rt| compare(rt, a, b))
    }

    /// Returns `true` if `a` compares equal to `b`.
    pub fn equals(&mut self, a: ObjRef, b: ObjRef) -> Result<bool> {
        Ok(self.compare(a, b)? == Ordering::Equal)
    }

    /// Runs the constructor the running constructor overrode.
    ///
    /// # Errors
    ///
    /// [`Error::SuperOutsideDispatch`] unless called from `obj`'s running
    /// constructor, [`Error::NoSuperclass`] from the root's.
    pub fn super_construct(&mut self, obj: ObjRef, args: &mut Args) -> Result<()> {
        let owner = self.resolve_super(obj, Slot::Construct)?;
        let construct = owner.vtable().construct;
        self.enter(obj, Slot::Construct, owner, |rt| construct(rt, obj, args))
    }

    /// Runs the destructor the running destructor overrode.
    pub fn super_destruct(&mut self, obj: ObjRef) -> Result<()> {
        let owner = self.resolve_super(obj, Slot::Destruct)?;
        let destruct = owner.vtable().destruct;
        self.enter(obj, Slot::Destruct, owner, |rt| destruct(rt, obj))
    }

    /// Runs the print operation the running one overrode.
    pub fn super_print(&mut self, obj: ObjRef, out: &mut dyn fmt::Write) -> Result<()> {
        let owner = self.resolve_super(obj, Slot::Print)?;
        let print = owner.vtable().print;
        self.enter(obj, Slot::Print, owner, |rt| print(rt, obj, out))
    }

    /// Runs the compare operation the running one overrode.
    pub fn super_compare(&mut self, a: ObjRef, b: ObjRef) -> Result<Ordering> {
        let owner = self.resolve_super(a, Slot::Compare)?;
        let compare = owner.vtable().compare;
        self.enter(a, Slot::Compare, owner, |rt| compare(rt, a, b))
    }

    /// Returns a fresh iterator at the first position of `range`. The caller
    /// owns it.
    pub fn begin(&mut self, range: ObjRef) -> Result<ObjRef> {
        let (class, owner) = self.resolve(range, Slot::Begin)?;
        let begin = class
            .vtable()
            .range
            .map(|table| table.begin)
            .ok_or_else(|| missing_slot(class, Slot::Begin))?;
        self.enter(range, Slot::Begin, owner, |rt| begin(rt, range))
    }

    /// Returns a fresh iterator one past the last position of `range`. The
    /// caller owns it.
    pub fn end(&mut self, range: ObjRef) -> Result<ObjRef> {
        let (class, owner) = self.resolve(range, Slot::End)?;
        let end = class
            .vtable()
            .range
            .map(|table| table.end)
            .ok_or_else(|| missing_slot(class, Slot::End))?;
        self.enter(range, Slot::End, owner, |rt| end(rt, range))
    }

    /// Advances `it` in place.
    pub fn increment(&mut self, it: ObjRef) -> Result<()> {
        let (class, owner) = self.resolve(it, Slot::Increment)?;
        let increment = class
            .vtable()
            .iter
            .map(|table| table.increment)
            .ok_or_else(|| missing_slot(class, Slot::Increment))?;
        self.enter(it, Slot::Increment, owner, |rt| increment(rt, it))
    }

    /// Returns the element under `it`.
    ///
    /// Elements of stored containers are borrowed from the container;
    /// elements a view produces on the fly are autoreleased.
    pub fn deref(&mut self, it: ObjRef) -> Result<ObjRef> {
        let (class, owner) = self.resolve(it, Slot::Deref)?;
        let deref = class
            .vtable()
            .iter
            .map(|table| table.deref)
            .ok_or_else(|| missing_slot(class, Slot::Deref))?;
        self.enter(it, Slot::Deref, owner, |rt| deref(rt, it))
    }

    /// Returns `true` while `a` and `b` denote different positions.
    pub fn not_equal(&mut self, a: ObjRef, b: ObjRef) -> Result<bool> {
        let (class, owner) = self.resolve(a, Slot::NotEqual)?;
        let not_equal = class
            .vtable()
            .iter
            .map(|table| table.not_equal)
            .ok_or_else(|| missing_slot(class, Slot::NotEqual))?;
        self.enter(a, Slot::NotEqual, owner, |rt| not_equal(rt, a, b))
    }
}

fn missing_slot(class: Class, slot: Slot) -> Error {
    Error::SlotNotInHierarchy {
        class: class.name().to_string(),
        slot,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Imp, args};
    use std::cell::RefCell;
    use std::sync::OnceLock;

    thread_local! {
        static TRAIL: RefCell<Vec<&'static str>> = const { RefCell::new(Vec::new()) };
    }

    fn trail() -> Vec<&'static str> {
        TRAIL.with(|trail| trail.borrow_mut().drain(..).collect())
    }

    fn note(step: &'static str) {
        TRAIL.with(|trail| trail.borrow_mut().push(step));
    }

    fn a_construct(rt: &mut Runtime, obj: ObjRef, args: &mut Args) -> Result<()> {
        rt.super_construct(obj, args)?;
        note("a");
        Ok(())
    }

    fn b_construct(rt: &mut Runtime, obj: ObjRef, args: &mut Args) -> Result<()> {
        rt.super_construct(obj, args)?;
        note("b");
        Ok(())
    }

    fn c_construct(rt: &mut Runtime, obj: ObjRef, args: &mut Args) -> Result<()> {
        rt.super_construct(obj, args)?;
        note("c");
        Ok(())
    }

    fn a_destruct(rt: &mut Runtime, obj: ObjRef) -> Result<()> {
        note("~a");
        rt.super_destruct(obj)
    }

    fn c_destruct(rt: &mut Runtime, obj: ObjRef) -> Result<()> {
        note("~c");
        rt.super_destruct(obj)
    }

    fn tagged_print(rt: &mut Runtime, obj: ObjRef, out: &mut dyn fmt::Write) -> Result<()> {
        out.write_str("tagged ")?;
        rt.super_print(obj, out)
    }

    fn chain() -> (Class, Class, Class) {
        static CHAIN: OnceLock<(Class, Class, Class)> = OnceLock::new();
        *CHAIN.get_or_init(|| {
            let a = Class::derive(
                "DispatchTestA",
                Class::root(),
                0,
                [Imp::Construct(a_construct), Imp::Destruct(a_destruct)],
            )
            .unwrap();
            // B leaves the destructor alone, so C's super destruct skips to A.
            let b = Class::derive("DispatchTestB", a, 0, [Imp::Construct(b_construct)]).unwrap();
            let c = Class::derive(
                "DispatchTestC",
                b,
                0,
                [
                    Imp::Construct(c_construct),
                    Imp::Destruct(c_destruct),
                    Imp::Print(tagged_print),
                ],
            )
            .unwrap();
            (a, b, c)
        })
    }

    #[test]
    fn test_super_chain_runs_each_level_once() {
        let (_, _, c) = chain();
        let mut rt = Runtime::new();
        trail();

        let obj = rt.new_instance(c, args![]).unwrap();
        assert_eq!(trail(), vec!["a", "b", "c"]);

        rt.delete(obj).unwrap();
        assert_eq!(trail(), vec!["~c", "~a"]);
        assert!(rt.frames.is_empty());
    }

    #[test]
    fn test_super_print_reaches_root() {
        let (_, _, c) = chain();
        let mut rt = Runtime::new();
        let obj = rt.new_instance(c, args![]).unwrap();

        assert_eq!(rt.describe(obj).unwrap(), "tagged <DispatchTestC>");
    }

    #[test]
    fn test_super_outside_dispatch() {
        let (a, _, _) = chain();
        let mut rt = Runtime::new();
        let obj = rt.new_instance(a, args![]).unwrap();

        assert_eq!(
            rt.super_destruct(obj),
            Err(Error::SuperOutsideDispatch {
                slot: Slot::Destruct
            })
        );
    }

    #[test]
    fn test_class_queries() {
        let (a, b, c) = chain();
        let mut rt = Runtime::new();
        let obj = rt.new_instance(c, args![]).unwrap();

        assert_eq!(rt.class_of(obj).unwrap(), c);
        assert_eq!(rt.super_of(obj).unwrap(), Some(b));
        assert!(rt.is_instance_of(obj, a).unwrap());
        assert!(!rt.is_instance_of(obj, Class::meta()).unwrap());
    }

    #[test]
    fn test_identity_compare() {
        let (a, _, _) = chain();
        let mut rt = Runtime::new();
        let x = rt.new_instance(a, args![]).unwrap();
        let y = rt.new_instance(a, args![]).unwrap();

        assert!(rt.equals(x, x).unwrap());
        assert!(!rt.equals(x, y).unwrap());
        assert_eq!(rt.compare(x, y).unwrap(), rt.compare(y, x).unwrap().reverse());
    }

    #[test]
    fn test_range_slots_missing_on_plain_objects() {
        let (a, _, _) = chain();
        let mut rt = Runtime::new();
        let obj = rt.new_instance(a, args![]).unwrap();

        assert_eq!(
            rt.begin(obj),
            Err(Error::SlotNotInHierarchy {
                class: "DispatchTestA".into(),
                slot: Slot::Begin
            })
        );
        assert!(rt.deref(obj).is_err());
        assert!(rt.not_equal(obj, obj).is_err());
    }

    #[test]
    fn test_stale_receiver() {
        let (a, _, _) = chain();
        let mut rt = Runtime::new();
        let obj = rt.new_instance(a, args![]).unwrap();
        rt.delete(obj).unwrap();
        trail();

        assert_eq!(rt.describe(obj), Err(Error::StaleObject { obj }));
        assert_eq!(rt.class_of(obj), Err(Error::StaleObject { obj }));
    }
}
