//! `Vector`: a growable array of object references.
//!
//! Capacity starts at the runtime's configured default (or the constructor
//! argument) and doubles whenever a push finds the vector full.

use crate::args;
use crate::collections::range::{ContainerBase, IteratorBase, exhausted};
use crate::error::{Error, Result};
use crate::runtime::{Args, Class, ClassKind, Imp, ObjRef, Runtime, Value};
use std::sync::OnceLock;
use vtobj_log::debug;

#[derive(Debug)]
struct Items {
    items: Vec<ObjRef>,
    capacity: usize,
}

impl Items {
    fn with_capacity(capacity: usize) -> Result<Self> {
        let capacity = capacity.max(1);
        let mut items = Vec::new();
        items
            .try_reserve_exact(capacity)
            .map_err(|_| Error::OutOfMemory { limit: capacity })?;
        Ok(Items { items, capacity })
    }

    /// Appends `item`, returning the new capacity if the vector had to grow.
    fn push(&mut self, item: ObjRef) -> Result<Option<usize>> {
        let grown = if self.items.len() == self.capacity {
            let capacity = self
                .capacity
                .checked_mul(2)
                .ok_or(Error::OutOfMemory { limit: usize::MAX })?;
            self.items
                .try_reserve_exact(capacity - self.items.len())
                .map_err(|_| Error::OutOfMemory { limit: capacity })?;
            self.capacity = capacity;
            Some(capacity)
        } else {
            None
        };
        self.items.push(item);
        Ok(grown)
    }
}

/// The `Vector` class and its operations.
///
/// ```rust
/// use vtobj::{Integer, Runtime, Vector};
///
/// let mut rt = Runtime::new();
/// let v = Vector::with_capacity(&mut rt, 1).unwrap();
/// for n in 0..3 {
///     let item = Integer::new(&mut rt, n).unwrap();
///     Vector::push_back(&mut rt, v, item).unwrap();
/// }
///
/// assert_eq!(Vector::len(&rt, v).unwrap(), 3);
/// assert_eq!(Vector::capacity(&rt, v).unwrap(), 4);
/// assert_eq!(rt.describe(v).unwrap(), "[0, 1, 2]");
/// ```
pub struct Vector;

impl Vector {
    /// Field holding the element storage.
    pub const ITEMS: usize = 0;

    /// Returns the `Vector` class.
    #[must_use]
    pub fn class() -> Class {
        static CLASS: OnceLock<Class> = OnceLock::new();
        *CLASS.get_or_init(|| {
            Class::builtin(
                "Vector",
                ContainerBase::class(),
                ClassKind::Container,
                1,
                [
                    Imp::Construct(vector_construct),
                    Imp::Destruct(vector_destruct),
                    Imp::Begin(vector_begin),
                    Imp::End(vector_end),
                ],
            )
        })
    }

    /// Creates an empty vector with the runtime's default capacity.
    pub fn new(rt: &mut Runtime) -> Result<ObjRef> {
        rt.new_instance(Self::class(), args![])
    }

    /// Creates an empty vector with room for `capacity` elements.
    ///
    /// # Errors
    ///
    /// [`Error::OutOfMemory`] if the storage cannot be reserved.
    pub fn with_capacity(rt: &mut Runtime, capacity: usize) -> Result<ObjRef> {
        rt.new_instance(Self::class(), args![capacity])
    }

    fn items(rt: &Runtime, vector: ObjRef) -> Result<&Items> {
        rt.expect_instance(vector, Self::class())?;
        rt.native::<Items>(vector, Self::ITEMS)
    }

    fn items_mut(rt: &mut Runtime, vector: ObjRef) -> Result<&mut Items> {
        rt.expect_instance(vector, Self::class())?;
        rt.native_mut::<Items>(vector, Self::ITEMS)
    }

    /// Appends `item`, doubling the capacity if the vector is full.
    ///
    /// # Errors
    ///
    /// [`Error::OutOfMemory`] if the doubled storage cannot be reserved.
    pub fn push_back(rt: &mut Runtime, vector: ObjRef, item: ObjRef) -> Result<()> {
        if let Some(capacity) = Self::items_mut(rt, vector)?.push(item)? {
            debug!("vector {} grew to capacity {}", vector, capacity);
        }
        Ok(())
    }

    /// Removes and returns the last element, or `None` if empty.
    pub fn pop_back(rt: &mut Runtime, vector: ObjRef) -> Result<Option<ObjRef>> {
        Ok(Self::items_mut(rt, vector)?.items.pop())
    }

    /// Returns the element at `index`, or `None` past the end.
    pub fn at(rt: &Runtime, vector: ObjRef, index: usize) -> Result<Option<ObjRef>> {
        Ok(Self::items(rt, vector)?.items.get(index).copied())
    }

    /// Number of elements.
    pub fn len(rt: &Runtime, vector: ObjRef) -> Result<usize> {
        Ok(Self::items(rt, vector)?.items.len())
    }

    /// Returns `true` if the vector has no elements.
    pub fn is_empty(rt: &Runtime, vector: ObjRef) -> Result<bool> {
        Ok(Self::len(rt, vector)? == 0)
    }

    /// Number of elements the vector holds before it next grows.
    pub fn capacity(rt: &Runtime, vector: ObjRef) -> Result<usize> {
        Ok(Self::items(rt, vector)?.capacity)
    }
}

fn vector_construct(rt: &mut Runtime, obj: ObjRef, args: &mut Args) -> Result<()> {
    rt.super_construct(obj, args)?;
    let capacity = if args.is_empty() {
        rt.config().vector_capacity
    } else {
        usize::try_from(args.next_int()?).unwrap_or(0)
    };
    let items = Items::with_capacity(capacity)?;
    rt.set_field(obj, Vector::ITEMS, Value::native(items))
}

fn vector_destruct(rt: &mut Runtime, obj: ObjRef) -> Result<()> {
    rt.take_field(obj, Vector::ITEMS)?;
    rt.super_destruct(obj)
}

fn vector_begin(rt: &mut Runtime, vector: ObjRef) -> Result<ObjRef> {
    Vector::items(rt, vector)?;
    VectorIterator::new(rt, vector, 0)
}

fn vector_end(rt: &mut Runtime, vector: ObjRef) -> Result<ObjRef> {
    let len = Vector::len(rt, vector)?;
    VectorIterator::new(rt, vector, len)
}

/// Position in a `Vector`.
pub struct VectorIterator;

impl VectorIterator {
    /// Field holding the vector.
    pub const VECTOR: usize = 0;
    /// Field holding the index.
    pub const INDEX: usize = 1;

    /// Returns the `VectorIterator` class.
    #[must_use]
    pub fn class() -> Class {
        static CLASS: OnceLock<Class> = OnceLock::new();
        *CLASS.get_or_init(|| {
            Class::builtin(
                "VectorIterator",
                IteratorBase::class(),
                ClassKind::Iterator,
                2,
                [
                    Imp::Construct(vector_iter_construct),
                    Imp::Increment(vector_iter_increment),
                    Imp::Deref(vector_iter_deref),
                    Imp::NotEqual(vector_iter_not_equal),
                ],
            )
        })
    }

    fn new(rt: &mut Runtime, vector: ObjRef, index: usize) -> Result<ObjRef> {
        rt.new_instance(Self::class(), args![vector, index])
    }

    fn index(rt: &Runtime, it: ObjRef) -> Result<usize> {
        rt.expect_instance(it, Self::class())?;
        rt.index_field(it, Self::INDEX)
    }
}

fn vector_iter_construct(rt: &mut Runtime, obj: ObjRef, args: &mut Args) -> Result<()> {
    rt.super_construct(obj, args)?;
    let vector = args.next_obj()?;
    let index = args.next_int()?;
    rt.set_field(obj, VectorIterator::VECTOR, vector)?;
    rt.set_field(obj, VectorIterator::INDEX, index)
}

fn vector_iter_increment(rt: &mut Runtime, it: ObjRef) -> Result<()> {
    let index = VectorIterator::index(rt, it)?;
    rt.set_field(it, VectorIterator::INDEX, index.saturating_add(1))
}

fn vector_iter_deref(rt: &mut Runtime, it: ObjRef) -> Result<ObjRef> {
    let index = VectorIterator::index(rt, it)?;
    let vector = rt.obj_field(it, VectorIterator::VECTOR)?;
    Vector::at(rt, vector, index)?.ok_or_else(|| exhausted(rt, it))
}

fn vector_iter_not_equal(rt: &mut Runtime, a: ObjRef, b: ObjRef) -> Result<bool> {
    Ok(VectorIterator::index(rt, a)? != VectorIterator::index(rt, b)?)
}
