//! `Class` descriptors and inheritance for the `vtobj` runtime.
//!
//! This module implements the class system with:
//! - Typed operation tables (`VTable`) and slot overrides (`Imp`)
//! - Single inheritance by copying the superclass table and applying overrides
//! - Slot families: plain objects, containers (begin/end) and iterators
//!   (increment/deref/not-equal)
//! - A global name registry
//!
//! # Architecture
//!
//! `Class`es are **globally registered** and never deallocated:
//! - Each descriptor lives in the global static arena (`'static` lifetime)
//! - Descriptors are immutable after creation
//! - Every chain ends at the root class `Object`
//! - Every descriptor's own class is the metaclass `Class`, whose own class is
//!   itself
//!
//! # Slots
//!
//! A slot is identified by the `Imp` variant that fills it, never by name, so
//! a function can only be installed in a slot whose signature it matches.
//! Installing a slot the hierarchy does not have (a `begin` on a plain object
//! class, say) is rejected when the class is defined.

use crate::error::{Error, Result};
use crate::runtime::value::Args;
use crate::runtime::{ObjRef, Runtime};
use fxhash::FxHashMap;
use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::{OnceLock, PoisonError, RwLock};
use vtobj_log::{debug, warn};
use vtobj_mem::arena::global_arena;

/// Constructor: initialises the receiver's fields from construction arguments.
pub type ConstructFn = fn(&mut Runtime, ObjRef, &mut Args) -> Result<()>;
/// Destructor: releases what the receiver owns before its slot is freed.
pub type DestructFn = fn(&mut Runtime, ObjRef) -> Result<()>;
/// Printer: renders the receiver into the writer.
pub type PrintFn = fn(&mut Runtime, ObjRef, &mut dyn fmt::Write) -> Result<()>;
/// Comparator: orders the receiver against another object.
pub type CompareFn = fn(&mut Runtime, ObjRef, ObjRef) -> Result<Ordering>;
/// `begin`/`end`: returns a fresh iterator owned by the caller.
pub type RangeFn = fn(&mut Runtime, ObjRef) -> Result<ObjRef>;
/// Advances an iterator in place.
pub type IncrementFn = fn(&mut Runtime, ObjRef) -> Result<()>;
/// Returns the element under an iterator.
pub type DerefFn = fn(&mut Runtime, ObjRef) -> Result<ObjRef>;
/// Returns `true` while two iterators denote different positions.
pub type NotEqualFn = fn(&mut Runtime, ObjRef, ObjRef) -> Result<bool>;

/// One operation in a class's table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Slot {
    /// Constructor.
    Construct,
    /// Destructor.
    Destruct,
    /// Printer.
    Print,
    /// Comparator.
    Compare,
    /// Container: first position.
    Begin,
    /// Container: one-past-last position.
    End,
    /// Iterator: advance.
    Increment,
    /// Iterator: current element.
    Deref,
    /// Iterator: position inequality.
    NotEqual,
}

impl Slot {
    /// Every slot, in table order.
    pub const ALL: [Slot; 9] = [
        Slot::Construct,
        Slot::Destruct,
        Slot::Print,
        Slot::Compare,
        Slot::Begin,
        Slot::End,
        Slot::Increment,
        Slot::Deref,
        Slot::NotEqual,
    ];

    /// Returns the slot name.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Slot::Construct => "construct",
            Slot::Destruct => "destruct",
            Slot::Print => "print",
            Slot::Compare => "compare",
            Slot::Begin => "begin",
            Slot::End => "end",
            Slot::Increment => "increment",
            Slot::Deref => "deref",
            Slot::NotEqual => "not_equal",
        }
    }

    /// Returns the slot family that introduces this slot.
    #[must_use]
    pub const fn family(self) -> ClassKind {
        match self {
            Slot::Construct | Slot::Destruct | Slot::Print | Slot::Compare => {
                ClassKind::Object
            }
            Slot::Begin | Slot::End => ClassKind::Container,
            Slot::Increment | Slot::Deref | Slot::NotEqual => ClassKind::Iterator,
        }
    }

    const fn bit(self) -> u16 {
        1 << self as u16
    }
}

impl fmt::Display for Slot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Which slot family a class's table carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ClassKind {
    /// Construct, destruct, print, compare.
    Object,
    /// Object slots plus begin/end.
    Container,
    /// Object slots plus increment/deref/not-equal.
    Iterator,
}

impl ClassKind {
    /// Returns `true` if tables of this kind have `slot`.
    #[must_use]
    pub fn has_slot(self, slot: Slot) -> bool {
        match slot.family() {
            ClassKind::Object => true,
            family => family == self,
        }
    }
}

/// A slot override: the variant names the slot, the payload fills it.
#[derive(Clone, Copy)]
pub enum Imp {
    /// Fills [`Slot::Construct`].
    Construct(ConstructFn),
    /// Fills [`Slot::Destruct`].
    Destruct(DestructFn),
    /// Fills [`Slot::Print`].
    Print(PrintFn),
    /// Fills [`Slot::Compare`].
    Compare(CompareFn),
    /// Fills [`Slot::Begin`].
    Begin(RangeFn),
    /// Fills [`Slot::End`].
    End(RangeFn),
    /// Fills [`Slot::Increment`].
    Increment(IncrementFn),
    /// Fills [`Slot::Deref`].
    Deref(DerefFn),
    /// Fills [`Slot::NotEqual`].
    NotEqual(NotEqualFn),
}

impl Imp {
    /// Returns the slot this override fills.
    #[must_use]
    pub const fn slot(&self) -> Slot {
        match self {
            Imp::Construct(_) => Slot::Construct,
            Imp::Destruct(_) => Slot::Destruct,
            Imp::Print(_) => Slot::Print,
            Imp::Compare(_) => Slot::Compare,
            Imp::Begin(_) => Slot::Begin,
            Imp::End(_) => Slot::End,
            Imp::Increment(_) => Slot::Increment,
            Imp::Deref(_) => Slot::Deref,
            Imp::NotEqual(_) => Slot::NotEqual,
        }
    }
}

impl fmt::Debug for Imp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Imp::{}", self.slot())
    }
}

/// Container slots.
#[derive(Clone, Copy)]
pub struct RangeTable {
    /// First position.
    pub begin: RangeFn,
    /// One-past-last position.
    pub end: RangeFn,
}

/// Iterator slots.
#[derive(Clone, Copy)]
pub struct IterTable {
    /// Advance.
    pub increment: IncrementFn,
    /// Current element.
    pub deref: DerefFn,
    /// Position inequality.
    pub not_equal: NotEqualFn,
}

/// A class's operation table.
///
/// The object slots are always present; `range` and `iter` are present for
/// container and iterator classes respectively.
#[derive(Clone, Copy)]
pub struct VTable {
    /// Constructor.
    pub construct: ConstructFn,
    /// Destructor.
    pub destruct: DestructFn,
    /// Printer.
    pub print: PrintFn,
    /// Comparator.
    pub compare: CompareFn,
    /// Container slots.
    pub range: Option<RangeTable>,
    /// Iterator slots.
    pub iter: Option<IterTable>,
}

impl VTable {
    /// Installs `imp`, returning `false` if this table lacks its slot.
    fn apply(&mut self, imp: Imp) -> bool {
        match (imp, &mut self.range, &mut self.iter) {
            (Imp::Construct(f), _, _) => self.construct = f,
            (Imp::Destruct(f), _, _) => self.destruct = f,
            (Imp::Print(f), _, _) => self.print = f,
            (Imp::Compare(f), _, _) => self.compare = f,
            (Imp::Begin(f), Some(range), _) => range.begin = f,
            (Imp::End(f), Some(range), _) => range.end = f,
            (Imp::Increment(f), _, Some(iter)) => iter.increment = f,
            (Imp::Deref(f), _, Some(iter)) => iter.deref = f,
            (Imp::NotEqual(f), _, Some(iter)) => iter.not_equal = f,
            _ => return false,
        }
        true
    }

    /// Returns the implementation installed in `slot`, if the table has it.
    #[must_use]
    pub fn get(&self, slot: Slot) -> Option<Imp> {
        match slot {
            Slot::Construct => Some(Imp::Construct(self.construct)),
            Slot::Destruct => Some(Imp::Destruct(self.destruct)),
            Slot::Print => Some(Imp::Print(self.print)),
            Slot::Compare => Some(Imp::Compare(self.compare)),
            Slot::Begin => self.range.map(|r| Imp::Begin(r.begin)),
            Slot::End => self.range.map(|r| Imp::End(r.end)),
            Slot::Increment => self.iter.map(|i| Imp::Increment(i.increment)),
            Slot::Deref => self.iter.map(|i| Imp::Deref(i.deref)),
            Slot::NotEqual => self.iter.map(|i| Imp::NotEqual(i.not_equal)),
        }
    }
}

impl fmt::Debug for VTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let slots: Vec<Slot> = Slot::ALL
            .into_iter()
            .filter(|slot| self.get(*slot).is_some())
            .collect();
        f.debug_struct("VTable").field("slots", &slots).finish()
    }
}

/// Internal class data stored in the global arena.
struct ClassInner {
    name: String,
    super_class: Option<Class>,
    /// Field words per instance, inherited fields included.
    instance_size: usize,
    kind: ClassKind,
    /// Slots this class overrode or introduced, as a bit set.
    defines: u16,
    vtable: VTable,
}

/// Global class registry: name -> descriptor.
struct ClassRegistry {
    classes: RwLock<FxHashMap<String, Class>>,
}

static REGISTRY: OnceLock<ClassRegistry> = OnceLock::new();

fn registry() -> &'static ClassRegistry {
    REGISTRY.get_or_init(|| ClassRegistry {
        classes: RwLock::new(FxHashMap::default()),
    })
}

/// A class descriptor.
///
/// `Class` is a copyable handle to immutable, program-lifetime data. Two
/// handles are equal only if they name the same descriptor.
///
/// # Example
///
/// ```rust
/// use vtobj::{Class, Imp};
///
/// let base = Class::derive("DocBase", Class::root(), 0, []).unwrap();
/// let child = Class::derive("DocChild", base, 1, []).unwrap();
///
/// assert!(child.is_subclass_of(&base));
/// assert_eq!(child.super_class(), Some(base));
/// assert_eq!(child.class(), Class::meta());
/// ```
#[derive(Clone, Copy)]
pub struct Class {
    inner: &'static ClassInner,
}

impl Class {
    /// Returns the root class `Object`.
    ///
    /// Its constructor and destructor do nothing, it prints as `<ClassName>`
    /// and compares by identity.
    #[must_use]
    pub fn root() -> Class {
        static ROOT: OnceLock<Class> = OnceLock::new();
        *ROOT.get_or_init(|| {
            let defines = Slot::ALL
                .into_iter()
                .filter(|slot| slot.family() == ClassKind::Object)
                .fold(0, |bits, slot| bits | slot.bit());
            Self::install_builtin(ClassInner {
                name: "Object".to_string(),
                super_class: None,
                instance_size: 0,
                kind: ClassKind::Object,
                defines,
                vtable: VTable {
                    construct: object_construct,
                    destruct: object_destruct,
                    print: object_print,
                    compare: object_compare,
                    range: None,
                    iter: None,
                },
            })
        })
    }

    /// Returns the metaclass `Class`: the class of every descriptor,
    /// including itself.
    #[must_use]
    pub fn meta() -> Class {
        static META: OnceLock<Class> = OnceLock::new();
        *META.get_or_init(|| {
            Self::builtin("Class", Self::root(), ClassKind::Object, 0, [])
        })
    }

    /// Defines a class by deriving from `super_class`.
    ///
    /// The superclass's table is copied, then each override is installed in
    /// the slot its variant names. A class without overrides behaves exactly
    /// like its parent.
    ///
    /// # Arguments
    ///
    /// * `name` - Class name (must be unique in the registry)
    /// * `super_class` - Class to inherit from
    /// * `instance_size` - Field words per instance, inherited fields included
    /// * `overrides` - Slot implementations to install
    ///
    /// # Errors
    ///
    /// - [`Error::InheritanceCycle`] if `name` already appears in the chain
    /// - [`Error::InstanceSizeShrinks`] if `instance_size` is below the
    ///   superclass's
    /// - [`Error::SlotNotInHierarchy`] if an override names a slot the
    ///   hierarchy lacks
    /// - [`Error::ClassAlreadyExists`] if `name` is taken
    pub fn derive(
        name: &str,
        super_class: Class,
        instance_size: usize,
        overrides: impl IntoIterator<Item = Imp>,
    ) -> Result<Class> {
        let inner = Self::assemble(
            name,
            super_class,
            super_class.kind(),
            instance_size,
            overrides,
        )?;
        Self::register(inner)
    }

    /// Defines a class that introduces a slot family on top of a plain object
    /// class.
    ///
    /// The new slots start out abstract: invoking them fails with
    /// [`Error::AbstractSlot`] until a subclass overrides them.
    ///
    /// # Errors
    ///
    /// [`Error::KindMismatch`] if `super_class` already has a slot family or
    /// `kind` is [`ClassKind::Object`]; otherwise as [`Class::derive`].
    pub fn extend(
        name: &str,
        super_class: Class,
        kind: ClassKind,
        instance_size: usize,
        overrides: impl IntoIterator<Item = Imp>,
    ) -> Result<Class> {
        if kind == ClassKind::Object || super_class.kind() != ClassKind::Object {
            return Err(Error::KindMismatch {
                class: name.to_string(),
                super_class: super_class.name().to_string(),
            });
        }
        let inner =
            Self::assemble(name, super_class, kind, instance_size, overrides)?;
        Self::register(inner)
    }

    /// Defines a class the runtime itself ships. The definition is known to
    /// be well formed, so only a name clash can go wrong, and that only hides
    /// the descriptor from [`Class::named`].
    ///
    /// # Panics
    ///
    /// Panics if the built-in definition itself is malformed.
    pub(crate) fn builtin(
        name: &str,
        super_class: Class,
        kind: ClassKind,
        instance_size: usize,
        overrides: impl IntoIterator<Item = Imp>,
    ) -> Class {
        match Self::assemble(name, super_class, kind, instance_size, overrides) {
            Ok(inner) => Self::install_builtin(inner),
            Err(err) => panic!("built-in class {name} is malformed: {err}"),
        }
    }

    /// Builds a descriptor without registering it.
    fn assemble(
        name: &str,
        super_class: Class,
        kind: ClassKind,
        instance_size: usize,
        overrides: impl IntoIterator<Item = Imp>,
    ) -> Result<ClassInner> {
        Self::check_inheritance_cycle(name, super_class)?;

        if instance_size < super_class.instance_size() {
            return Err(Error::InstanceSizeShrinks {
                class: name.to_string(),
                size: instance_size,
                inherited: super_class.instance_size(),
            });
        }

        let mut vtable = *super_class.vtable();
        let mut defines = 0;

        if kind != super_class.kind() {
            if super_class.kind() != ClassKind::Object {
                return Err(Error::KindMismatch {
                    class: name.to_string(),
                    super_class: super_class.name().to_string(),
                });
            }
            match kind {
                ClassKind::Container => {
                    vtable.range = Some(RangeTable {
                        begin: abstract_begin,
                        end: abstract_end,
                    });
                }
                ClassKind::Iterator => {
                    vtable.iter = Some(IterTable {
                        increment: abstract_increment,
                        deref: abstract_deref,
                        not_equal: abstract_not_equal,
                    });
                }
                ClassKind::Object => {}
            }
            defines = Slot::ALL
                .into_iter()
                .filter(|slot| slot.family() == kind)
                .fold(0, |bits, slot| bits | slot.bit());
        }

        for imp in overrides {
            if !vtable.apply(imp) {
                return Err(Error::SlotNotInHierarchy {
                    class: name.to_string(),
                    slot: imp.slot(),
                });
            }
            defines |= imp.slot().bit();
        }

        Ok(ClassInner {
            name: name.to_string(),
            super_class: Some(super_class),
            instance_size,
            kind,
            defines,
            vtable,
        })
    }

    /// Checks that `name` does not already appear in `super_class`'s chain.
    fn check_inheritance_cycle(name: &str, super_class: Class) -> Result<()> {
        if super_class.ancestors().any(|class| class.name() == name) {
            return Err(Error::InheritanceCycle {
                name: name.to_string(),
            });
        }
        Ok(())
    }

    /// Moves `inner` into the arena and registers it, rejecting duplicates.
    fn register(inner: ClassInner) -> Result<Class> {
        let mut classes = registry()
            .classes
            .write()
            .unwrap_or_else(PoisonError::into_inner);

        if classes.contains_key(&inner.name) {
            return Err(Error::ClassAlreadyExists { name: inner.name });
        }

        let class = Class {
            inner: global_arena().alloc(inner),
        };
        classes.insert(class.name().to_string(), class);
        drop(classes);

        class.log_definition();
        Ok(class)
    }

    fn install_builtin(inner: ClassInner) -> Class {
        let class = Class {
            inner: global_arena().alloc(inner),
        };

        let mut classes = registry()
            .classes
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        if classes.contains_key(class.name()) {
            warn!(
                "built-in class {} shadowed by an earlier user class",
                class.name()
            );
        } else {
            classes.insert(class.name().to_string(), class);
        }
        drop(classes);

        class.log_definition();
        class
    }

    fn log_definition(&self) {
        match self.super_class() {
            Some(super_class) => debug!(
                "defined {:?} class {} ({} fields) from {}",
                self.kind(),
                self.name(),
                self.instance_size(),
                super_class.name()
            ),
            None => debug!("defined root class {}", self.name()),
        }
    }

    /// Looks a class up by name.
    #[must_use]
    pub fn named(name: &str) -> Option<Class> {
        registry()
            .classes
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(name)
            .copied()
    }

    /// Returns every registered class, sorted by name.
    #[must_use]
    pub fn registered() -> Vec<Class> {
        let mut classes: Vec<Class> = registry()
            .classes
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .values()
            .copied()
            .collect();
        classes.sort_by(|a, b| a.name().cmp(b.name()));
        classes
    }

    /// Returns the class name.
    #[must_use]
    pub fn name(&self) -> &'static str {
        &self.inner.name
    }

    /// Returns the superclass, or `None` for the root class.
    #[must_use]
    pub fn super_class(&self) -> Option<Class> {
        self.inner.super_class
    }

    /// Returns the number of field words per instance.
    #[must_use]
    pub fn instance_size(&self) -> usize {
        self.inner.instance_size
    }

    /// Returns the slot family of this class's table.
    #[must_use]
    pub fn kind(&self) -> ClassKind {
        self.inner.kind
    }

    /// Returns the operation table.
    #[must_use]
    pub fn vtable(&self) -> &'static VTable {
        &self.inner.vtable
    }

    /// Returns the class of this descriptor: always the metaclass.
    #[must_use]
    pub fn class(&self) -> Class {
        Class::meta()
    }

    /// Returns `true` if this class itself installed `slot`, as opposed to
    /// inheriting it.
    #[must_use]
    pub fn defines(&self, slot: Slot) -> bool {
        self.inner.defines & slot.bit() != 0
    }

    /// Returns the nearest class in the chain, starting here, that installed
    /// `slot`; `None` if the hierarchy lacks the slot.
    #[must_use]
    pub fn owner_of(&self, slot: Slot) -> Option<Class> {
        self.ancestors().find(|class| class.defines(slot))
    }

    /// Iterates over this class and then each superclass up to the root.
    pub fn ancestors(self) -> impl Iterator<Item = Class> {
        std::iter::successors(Some(self), Class::super_class)
    }

    /// Returns `true` if `class` is this class or one of its ancestors.
    #[must_use]
    pub fn is_subclass_of(&self, class: &Class) -> bool {
        self.ancestors().any(|ancestor| ancestor == *class)
    }
}

impl PartialEq for Class {
    fn eq(&self, other: &Self) -> bool {
        std::ptr::eq(self.inner, other.inner)
    }
}

impl Eq for Class {}

impl Hash for Class {
    fn hash<H: Hasher>(&self, state: &mut H) {
        std::ptr::hash(self.inner, state);
    }
}

impl fmt::Debug for Class {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let super_name = self.super_class().map(|c| c.name());
        f.debug_struct("Class")
            .field("name", &self.name())
            .field("super_class", &super_name)
            .field("kind", &self.kind())
            .field("instance_size", &self.instance_size())
            .finish()
    }
}

impl fmt::Display for Class {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

fn object_construct(_rt: &mut Runtime, _obj: ObjRef, _args: &mut Args) -> Result<()> {
    Ok(())
}

fn object_destruct(_rt: &mut Runtime, _obj: ObjRef) -> Result<()> {
    Ok(())
}

fn object_print(rt: &mut Runtime, obj: ObjRef, out: &mut dyn fmt::Write) -> Result<()> {
    let class = rt.class_of(obj)?;
    write!(out, "<{}>", class.name())?;
    Ok(())
}

// Identity: equal only to itself, otherwise ordered by handle.
fn object_compare(_rt: &mut Runtime, a: ObjRef, b: ObjRef) -> Result<Ordering> {
    Ok(a.cmp(&b))
}

fn abstract_slot(rt: &Runtime, obj: ObjRef, slot: Slot) -> Error {
    match rt.class_of(obj) {
        Ok(class) => Error::AbstractSlot {
            class: class.name().to_string(),
            slot,
        },
        Err(err) => err,
    }
}

fn abstract_begin(rt: &mut Runtime, obj: ObjRef) -> Result<ObjRef> {
    Err(abstract_slot(rt, obj, Slot::Begin))
}

fn abstract_end(rt: &mut Runtime, obj: ObjRef) -> Result<ObjRef> {
    Err(abstract_slot(rt, obj, Slot::End))
}

fn abstract_increment(rt: &mut Runtime, obj: ObjRef) -> Result<()> {
    Err(abstract_slot(rt, obj, Slot::Increment))
}

fn abstract_deref(rt: &mut Runtime, obj: ObjRef) -> Result<ObjRef> {
    Err(abstract_slot(rt, obj, Slot::Deref))
}

fn abstract_not_equal(rt: &mut Runtime, obj: ObjRef, _other: ObjRef) -> Result<bool> {
    Err(abstract_slot(rt, obj, Slot::NotEqual))
}
