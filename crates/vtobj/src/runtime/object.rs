//! Object allocation, field access and autorelease pools.
//!
//! Objects are created with [`Runtime::new_instance`] and destroyed with
//! [`Runtime::delete`]. Creation allocates a zeroed instance (every field
//! `Nil`), installs the class and runs the constructor chain; deletion runs
//! the destructor chain and frees the slot.
//!
//! # Ownership
//!
//! Whoever creates an object owns it and must delete it. Operations that hand
//! out short-lived objects (an iterator's `deref` on a generated range, for
//! one) autorelease them instead: the object is recorded in the innermost
//! pool and deleted when that pool is popped.
//!
//! ```rust
//! use vtobj::{Integer, Runtime};
//!
//! let mut rt = Runtime::new();
//! rt.push_pool();
//! let n = Integer::new(&mut rt, 1).unwrap();
//! rt.autorelease(n);
//!
//! assert_eq!(rt.pop_pool().unwrap(), 1);
//! assert!(!rt.is_live(n));
//! ```

use crate::error::{Error, Result};
use crate::runtime::{Args, Class, Runtime, Value};
use std::any::{Any, type_name};
use std::fmt;
use vtobj_log::{debug, trace, warn};
use vtobj_mem::slots::SlotId;

/// Handle to an object in a [`Runtime`].
///
/// Handles are plain copyable ids. Two handles are equal only if they name
/// the same object; a handle outlives its object and then resolves to
/// [`Error::StaleObject`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ObjRef(SlotId);

impl ObjRef {
    /// Returns the heap slot index.
    #[must_use]
    pub const fn index(self) -> usize {
        self.0.index()
    }

    /// Returns the generation of the slot this handle was issued for.
    #[must_use]
    pub const fn generation(self) -> u32 {
        self.0.generation()
    }
}

impl fmt::Display for ObjRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Heap representation of an object: its class and its field words.
pub(crate) struct Instance {
    pub(crate) class: Class,
    pub(crate) fields: Box<[Value]>,
}

impl Runtime {
    /// Creates an instance of `class` and runs its constructor chain.
    ///
    /// # Errors
    ///
    /// - [`Error::OutOfMemory`] if the configured object limit is reached
    /// - any error the constructor returns; the destructor chain then runs
    ///   on the half-built object (fields never set are `Nil`) before it is
    ///   freed
    ///
    /// # Example
    ///
    /// ```rust
    /// use vtobj::{args, Class, Runtime};
    ///
    /// let point = Class::derive("DocPoint", Class::root(), 2, []).unwrap();
    /// let mut rt = Runtime::new();
    /// let p = rt.new_instance(point, args![]).unwrap();
    ///
    /// assert_eq!(rt.class_of(p).unwrap(), point);
    /// assert!(rt.field(p, 1).unwrap().is_nil());
    /// ```
    pub fn new_instance(&mut self, class: Class, mut args: Args) -> Result<ObjRef> {
        if let Some(limit) = self.config().max_objects {
            if self.heap.len() >= limit {
                return Err(Error::OutOfMemory { limit });
            }
        }

        let fields = std::iter::repeat_with(Value::default)
            .take(class.instance_size())
            .collect();
        let obj = ObjRef(self.heap.insert(Instance { class, fields }));
        trace!("new {} {}", class.name(), obj);

        if let Err(err) = self.construct(obj, &mut args) {
            debug!("constructing {} {} failed: {}", class.name(), obj, err);
            // Fields the failed chain never set are still Nil.
            if let Err(cleanup) = self.destruct(obj) {
                warn!("destructing half-built {} {}: {}", class.name(), obj, cleanup);
            }
            self.heap.remove(obj.0);
            return Err(err);
        }

        if !args.is_empty() {
            warn!(
                "{} construction argument(s) left over for {}",
                args.remaining(),
                class.name()
            );
        }

        Ok(obj)
    }

    /// Runs `obj`'s destructor chain and frees it.
    ///
    /// # Errors
    ///
    /// [`Error::StaleObject`] if `obj` was already deleted, or any error the
    /// destructor returns; in that case the object stays live.
    pub fn delete(&mut self, obj: ObjRef) -> Result<()> {
        self.destruct(obj)?;
        let instance = self.heap.remove(obj.0).ok_or(Error::StaleObject { obj })?;
        trace!("delete {} {}", instance.class.name(), obj);
        Ok(())
    }

    /// Returns `true` if `obj` names a live object.
    #[must_use]
    pub fn is_live(&self, obj: ObjRef) -> bool {
        self.heap.contains(obj.0)
    }

    /// Number of live objects.
    #[must_use]
    pub fn live_objects(&self) -> usize {
        self.heap.len()
    }

    pub(crate) fn instance(&self, obj: ObjRef) -> Result<&Instance> {
        self.heap.get(obj.0).ok_or(Error::StaleObject { obj })
    }

    pub(crate) fn instance_mut(&mut self, obj: ObjRef) -> Result<&mut Instance> {
        self.heap.get_mut(obj.0).ok_or(Error::StaleObject { obj })
    }

    /// Returns field `index` of `obj`.
    ///
    /// # Errors
    ///
    /// [`Error::StaleObject`] or [`Error::FieldOutOfBounds`].
    pub fn field(&self, obj: ObjRef, index: usize) -> Result<&Value> {
        let instance = self.instance(obj)?;
        instance
            .fields
            .get(index)
            .ok_or_else(|| Error::FieldOutOfBounds {
                class: instance.class.name().to_string(),
                index,
                size: instance.fields.len(),
            })
    }

    /// Returns field `index` of `obj` mutably.
    pub fn field_mut(&mut self, obj: ObjRef, index: usize) -> Result<&mut Value> {
        let instance = self.instance_mut(obj)?;
        let class = instance.class;
        let size = instance.fields.len();
        instance
            .fields
            .get_mut(index)
            .ok_or_else(|| Error::FieldOutOfBounds {
                class: class.name().to_string(),
                index,
                size,
            })
    }

    /// Stores `value` in field `index` of `obj`, dropping the old value.
    pub fn set_field(
        &mut self,
        obj: ObjRef,
        index: usize,
        value: impl Into<Value>,
    ) -> Result<()> {
        *self.field_mut(obj, index)? = value.into();
        Ok(())
    }

    /// Moves the value out of field `index`, leaving `Nil`.
    pub fn take_field(&mut self, obj: ObjRef, index: usize) -> Result<Value> {
        Ok(std::mem::take(self.field_mut(obj, index)?))
    }

    fn field_mismatch(&self, obj: ObjRef, index: usize, expected: &'static str) -> Error {
        match self.instance(obj) {
            Ok(instance) => Error::FieldTypeMismatch {
                class: instance.class.name().to_string(),
                index,
                expected,
            },
            Err(err) => err,
        }
    }

    /// Reads an integer field.
    pub fn int_field(&self, obj: ObjRef, index: usize) -> Result<i64> {
        self.field(obj, index)?
            .as_int()
            .ok_or_else(|| self.field_mismatch(obj, index, "int"))
    }

    /// Reads a non-negative integer field as an index.
    pub fn index_field(&self, obj: ObjRef, index: usize) -> Result<usize> {
        let value = self.int_field(obj, index)?;
        usize::try_from(value).map_err(|_| self.field_mismatch(obj, index, "index"))
    }

    /// Reads an object field.
    pub fn obj_field(&self, obj: ObjRef, index: usize) -> Result<ObjRef> {
        self.field(obj, index)?
            .as_obj()
            .ok_or_else(|| self.field_mismatch(obj, index, "object"))
    }

    /// Borrows the native storage in field `index` as a `T`.
    pub fn native<T: Any>(&self, obj: ObjRef, index: usize) -> Result<&T> {
        match self.field(obj, index)? {
            Value::Native(boxed) => boxed
                .downcast_ref::<T>()
                .ok_or_else(|| self.field_mismatch(obj, index, type_name::<T>())),
            _ => Err(self.field_mismatch(obj, index, type_name::<T>())),
        }
    }

    /// Mutably borrows the native storage in field `index` as a `T`.
    pub fn native_mut<T: Any>(&mut self, obj: ObjRef, index: usize) -> Result<&mut T> {
        let class = self.instance(obj)?.class;
        let mismatch = || Error::FieldTypeMismatch {
            class: class.name().to_string(),
            index,
            expected: type_name::<T>(),
        };
        match self.field_mut(obj, index)? {
            Value::Native(boxed) => boxed.downcast_mut::<T>().ok_or_else(mismatch),
            _ => Err(mismatch()),
        }
    }

    /// Checks that `obj` is an instance of `class` or one of its subclasses.
    ///
    /// # Errors
    ///
    /// [`Error::UnexpectedClass`] naming both classes, or
    /// [`Error::StaleObject`].
    pub fn expect_instance(&self, obj: ObjRef, class: Class) -> Result<()> {
        let found = self.instance(obj)?.class;
        if found.is_subclass_of(&class) {
            Ok(())
        } else {
            Err(Error::UnexpectedClass {
                expected: class.name().to_string(),
                found: found.name().to_string(),
            })
        }
    }

    /// Pushes a new autorelease pool.
    pub fn push_pool(&mut self) {
        self.pools.push(Vec::new());
    }

    /// Pops the innermost pool and deletes every object recorded in it that
    /// is still live, newest first. Returns how many were deleted.
    ///
    /// Every live object is attempted even if one destructor fails; the first
    /// failure is returned.
    ///
    /// # Errors
    ///
    /// [`Error::PoolUnderflow`] if no pool is pushed.
    pub fn pop_pool(&mut self) -> Result<usize> {
        let pool = self.pools.pop().ok_or(Error::PoolUnderflow)?;
        let mut released = 0;
        let mut first_error = None;

        for obj in pool.into_iter().rev() {
            if !self.is_live(obj) {
                continue;
            }
            match self.delete(obj) {
                Ok(()) => released += 1,
                Err(err) => {
                    first_error.get_or_insert(err);
                }
            }
        }

        trace!("pool drained, {} released", released);
        match first_error {
            Some(err) => Err(err),
            None => Ok(released),
        }
    }

    /// Records `obj` in the innermost pool and returns it.
    ///
    /// With no pool pushed the object is not recorded and stays the caller's
    /// to delete.
    pub fn autorelease(&mut self, obj: ObjRef) -> ObjRef {
        match self.pools.last_mut() {
            Some(pool) => pool.push(obj),
            None => debug!("autorelease of {} with no pool pushed", obj),
        }
        obj
    }

    /// Number of pools currently pushed.
    #[must_use]
    pub fn pool_depth(&self) -> usize {
        self.pools.len()
    }

    /// Runs `f` inside a fresh pool, draining it afterwards even if `f`
    /// fails. Pools `f` pushed and left behind are drained too.
    ///
    /// # Errors
    ///
    /// The error from `f`, otherwise the first error from draining.
    pub fn with_pool<R>(&mut self, f: impl FnOnce(&mut Self) -> Result<R>) -> Result<R> {
        let depth = self.pools.len();
        self.push_pool();
        let result = f(self);

        let mut drained = Ok(0);
        while self.pools.len() > depth {
            let popped = self.pop_pool();
            if drained.is_ok() {
                drained = popped;
            }
        }

        let value = result?;
        drained?;
        Ok(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::args;
    use std::sync::OnceLock;

    fn pair_class() -> Class {
        static CLASS: OnceLock<Class> = OnceLock::new();
        *CLASS.get_or_init(|| Class::derive("ObjectTestPair", Class::root(), 2, []).unwrap())
    }

    #[test]
    fn test_new_instance_zeroes_fields() {
        let mut rt = Runtime::new();
        let obj = rt.new_instance(pair_class(), args![]).unwrap();

        assert!(rt.is_live(obj));
        assert_eq!(rt.live_objects(), 1);
        assert!(rt.field(obj, 0).unwrap().is_nil());
        assert!(rt.field(obj, 1).unwrap().is_nil());
    }

    #[test]
    fn test_field_out_of_bounds() {
        let mut rt = Runtime::new();
        let obj = rt.new_instance(pair_class(), args![]).unwrap();

        assert_eq!(
            rt.field(obj, 2).unwrap_err(),
            Error::FieldOutOfBounds {
                class: "ObjectTestPair".into(),
                index: 2,
                size: 2
            }
        );
        assert!(rt.set_field(obj, 5, 1).is_err());
    }

    #[test]
    fn test_typed_field_access() {
        let mut rt = Runtime::new();
        let obj = rt.new_instance(pair_class(), args![]).unwrap();

        rt.set_field(obj, 0, 7).unwrap();
        rt.set_field(obj, 1, obj).unwrap();

        assert_eq!(rt.int_field(obj, 0).unwrap(), 7);
        assert_eq!(rt.index_field(obj, 0).unwrap(), 7);
        assert_eq!(rt.obj_field(obj, 1).unwrap(), obj);
        assert!(matches!(
            rt.int_field(obj, 1),
            Err(Error::FieldTypeMismatch { expected: "int", .. })
        ));

        rt.set_field(obj, 0, -1).unwrap();
        assert!(rt.index_field(obj, 0).is_err());

        assert_eq!(rt.take_field(obj, 0).unwrap().as_int(), Some(-1));
        assert!(rt.field(obj, 0).unwrap().is_nil());
    }

    #[test]
    fn test_native_fields() {
        let mut rt = Runtime::new();
        let obj = rt.new_instance(pair_class(), args![]).unwrap();
        rt.set_field(obj, 0, Value::native(vec![1u32, 2])).unwrap();

        rt.native_mut::<Vec<u32>>(obj, 0).unwrap().push(3);
        assert_eq!(rt.native::<Vec<u32>>(obj, 0).unwrap(), &vec![1, 2, 3]);
        assert!(rt.native::<String>(obj, 0).is_err());
        assert!(rt.native_mut::<String>(obj, 1).is_err());
    }

    #[test]
    fn test_delete_and_stale_handles() {
        let mut rt = Runtime::new();
        let obj = rt.new_instance(pair_class(), args![]).unwrap();

        rt.delete(obj).unwrap();
        assert!(!rt.is_live(obj));
        assert_eq!(rt.delete(obj), Err(Error::StaleObject { obj }));
        assert_eq!(rt.field(obj, 0).unwrap_err(), Error::StaleObject { obj });

        let reused = rt.new_instance(pair_class(), args![]).unwrap();
        assert_eq!(reused.index(), obj.index());
        assert_ne!(reused, obj);
        assert!(!rt.is_live(obj));
    }

    #[test]
    fn test_object_limit() {
        let mut rt = Runtime::with_config(crate::RuntimeConfig::default().with_max_objects(2));
        let a = rt.new_instance(pair_class(), args![]).unwrap();
        rt.new_instance(pair_class(), args![]).unwrap();

        assert_eq!(
            rt.new_instance(pair_class(), args![]),
            Err(Error::OutOfMemory { limit: 2 })
        );

        rt.delete(a).unwrap();
        assert!(rt.new_instance(pair_class(), args![]).is_ok());
    }

    #[test]
    fn test_expect_instance() {
        let mut rt = Runtime::new();
        let obj = rt.new_instance(pair_class(), args![]).unwrap();

        assert!(rt.expect_instance(obj, Class::root()).is_ok());
        assert!(rt.expect_instance(obj, pair_class()).is_ok());
        assert!(matches!(
            rt.expect_instance(obj, Class::meta()),
            Err(Error::UnexpectedClass { .. })
        ));
    }

    #[test]
    fn test_pools() {
        let mut rt = Runtime::new();
        assert_eq!(rt.pop_pool(), Err(Error::PoolUnderflow));

        rt.push_pool();
        let a = rt.new_instance(pair_class(), args![]).unwrap();
        let b = rt.new_instance(pair_class(), args![]).unwrap();
        rt.autorelease(a);
        rt.autorelease(b);
        rt.delete(b).unwrap();

        assert_eq!(rt.pool_depth(), 1);
        assert_eq!(rt.pop_pool(), Ok(1));
        assert!(!rt.is_live(a));
        assert_eq!(rt.live_objects(), 0);
    }

    #[test]
    fn test_autorelease_without_pool_keeps_object() {
        let mut rt = Runtime::new();
        let obj = rt.new_instance(pair_class(), args![]).unwrap();

        assert_eq!(rt.autorelease(obj), obj);
        assert!(rt.is_live(obj));
    }

    #[test]
    fn test_with_pool_drains_on_error() {
        let mut rt = Runtime::new();

        let result: Result<()> = rt.with_pool(|rt| {
            let obj = rt.new_instance(pair_class(), args![])?;
            rt.autorelease(obj);
            rt.push_pool();
            Err(Error::PoolUnderflow)
        });

        assert_eq!(result, Err(Error::PoolUnderflow));
        assert_eq!(rt.pool_depth(), 0);
        assert_eq!(rt.live_objects(), 0);
    }
}
