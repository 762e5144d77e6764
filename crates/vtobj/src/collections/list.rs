//! `List`: a doubly linked list of object references.
//!
//! Nodes live in an index-linked store inside the list object, between a
//! front and a back sentinel. A `ListIterator` holds the list and a node
//! index; the end iterator sits on the back sentinel.

use crate::args;
use crate::collections::range::{ContainerBase, IteratorBase, exhausted};
use crate::error::Result;
use crate::runtime::{Args, Class, ClassKind, Imp, ObjRef, Runtime, Value};
use std::sync::OnceLock;

const FRONT: usize = 0;
const BACK: usize = 1;

#[derive(Debug)]
struct Node {
    prev: usize,
    next: usize,
    item: Option<ObjRef>,
}

/// Node store. Index 0 and 1 are the sentinels; freed nodes are reused.
#[derive(Debug)]
struct Nodes {
    nodes: Vec<Node>,
    free: Vec<usize>,
    len: usize,
}

impl Nodes {
    fn new() -> Self {
        let sentinel = || Node {
            prev: FRONT,
            next: BACK,
            item: None,
        };
        Nodes {
            nodes: vec![sentinel(), sentinel()],
            free: Vec::new(),
            len: 0,
        }
    }

    fn link_after(&mut self, at: usize, item: ObjRef) {
        let next = self.nodes[at].next;
        let node = Node {
            prev: at,
            next,
            item: Some(item),
        };
        let index = match self.free.pop() {
            Some(index) => {
                self.nodes[index] = node;
                index
            }
            None => {
                self.nodes.push(node);
                self.nodes.len() - 1
            }
        };
        self.nodes[at].next = index;
        self.nodes[next].prev = index;
        self.len += 1;
    }

    fn unlink(&mut self, index: usize) -> Option<ObjRef> {
        if index == FRONT || index == BACK {
            return None;
        }
        let node = &mut self.nodes[index];
        let item = node.item.take()?;
        let (prev, next) = (node.prev, node.next);
        // A freed node points at the back so stale iterators run off the end.
        node.next = BACK;

        self.nodes[prev].next = next;
        self.nodes[next].prev = prev;
        self.free.push(index);
        self.len -= 1;
        Some(item)
    }

    fn first(&self) -> usize {
        self.nodes[FRONT].next
    }

    fn last(&self) -> usize {
        self.nodes[BACK].prev
    }

    fn next(&self, index: usize) -> usize {
        match index {
            BACK => BACK,
            _ => self.nodes.get(index).map_or(BACK, |node| node.next),
        }
    }

    fn item(&self, index: usize) -> Option<ObjRef> {
        self.nodes.get(index).and_then(|node| node.item)
    }
}

/// The `List` class and its operations.
///
/// ```rust
/// use vtobj::{Integer, List, Runtime};
///
/// let mut rt = Runtime::new();
/// let list = List::new(&mut rt).unwrap();
/// let one = Integer::new(&mut rt, 1).unwrap();
/// let two = Integer::new(&mut rt, 2).unwrap();
///
/// List::push_back(&mut rt, list, two).unwrap();
/// List::push_front(&mut rt, list, one).unwrap();
///
/// assert_eq!(rt.describe(list).unwrap(), "[1, 2]");
/// assert_eq!(List::pop_back(&mut rt, list).unwrap(), Some(two));
/// assert_eq!(List::len(&rt, list).unwrap(), 1);
/// ```
pub struct List;

impl List {
    /// Field holding the node store.
    pub const NODES: usize = 0;

    /// Returns the `List` class.
    #[must_use]
    pub fn class() -> Class {
        static CLASS: OnceLock<Class> = OnceLock::new();
        *CLASS.get_or_init(|| {
            Class::builtin(
                "List",
                ContainerBase::class(),
                ClassKind::Container,
                1,
                [
                    Imp::Construct(list_construct),
                    Imp::Destruct(list_destruct),
                    Imp::Begin(list_begin),
                    Imp::End(list_end),
                ],
            )
        })
    }

    /// Creates an empty list. The caller owns it; the elements stay owned by
    /// whoever created them.
    pub fn new(rt: &mut Runtime) -> Result<ObjRef> {
        rt.new_instance(Self::class(), args![])
    }

    fn nodes(rt: &Runtime, list: ObjRef) -> Result<&Nodes> {
        rt.expect_instance(list, Self::class())?;
        rt.native::<Nodes>(list, Self::NODES)
    }

    fn nodes_mut(rt: &mut Runtime, list: ObjRef) -> Result<&mut Nodes> {
        rt.expect_instance(list, Self::class())?;
        rt.native_mut::<Nodes>(list, Self::NODES)
    }

    /// Inserts `item` before the first element.
    pub fn push_front(rt: &mut Runtime, list: ObjRef, item: ObjRef) -> Result<()> {
        Self::nodes_mut(rt, list)?.link_after(FRONT, item);
        Ok(())
    }

    /// Appends `item` after the last element.
    pub fn push_back(rt: &mut Runtime, list: ObjRef, item: ObjRef) -> Result<()> {
        let nodes = Self::nodes_mut(rt, list)?;
        let last = nodes.last();
        nodes.link_after(last, item);
        Ok(())
    }

    /// Removes and returns the first element, or `None` if empty.
    pub fn pop_front(rt: &mut Runtime, list: ObjRef) -> Result<Option<ObjRef>> {
        let nodes = Self::nodes_mut(rt, list)?;
        let first = nodes.first();
        Ok(nodes.unlink(first))
    }

    /// Removes and returns the last element, or `None` if empty.
    pub fn pop_back(rt: &mut Runtime, list: ObjRef) -> Result<Option<ObjRef>> {
        let nodes = Self::nodes_mut(rt, list)?;
        let last = nodes.last();
        Ok(nodes.unlink(last))
    }

    /// Number of elements.
    pub fn len(rt: &Runtime, list: ObjRef) -> Result<usize> {
        Ok(Self::nodes(rt, list)?.len)
    }

    /// Returns `true` if the list has no elements.
    pub fn is_empty(rt: &Runtime, list: ObjRef) -> Result<bool> {
        Ok(Self::len(rt, list)? == 0)
    }
}

fn list_construct(rt: &mut Runtime, obj: ObjRef, args: &mut Args) -> Result<()> {
    rt.super_construct(obj, args)?;
    rt.set_field(obj, List::NODES, Value::native(Nodes::new()))
}

fn list_destruct(rt: &mut Runtime, obj: ObjRef) -> Result<()> {
    rt.take_field(obj, List::NODES)?;
    rt.super_destruct(obj)
}

fn list_begin(rt: &mut Runtime, list: ObjRef) -> Result<ObjRef> {
    let first = List::nodes(rt, list)?.first();
    ListIterator::new(rt, list, first)
}

fn list_end(rt: &mut Runtime, list: ObjRef) -> Result<ObjRef> {
    ListIterator::new(rt, list, BACK)
}

/// Position in a `List`.
pub struct ListIterator;

impl ListIterator {
    /// Field holding the list.
    pub const LIST: usize = 0;
    /// Field holding the node index.
    pub const NODE: usize = 1;

    /// Returns the `ListIterator` class.
    #[must_use]
    pub fn class() -> Class {
        static CLASS: OnceLock<Class> = OnceLock::new();
        *CLASS.get_or_init(|| {
            Class::builtin(
                "ListIterator",
                IteratorBase::class(),
                ClassKind::Iterator,
                2,
                [
                    Imp::Construct(list_iter_construct),
                    Imp::Increment(list_iter_increment),
                    Imp::Deref(list_iter_deref),
                    Imp::NotEqual(list_iter_not_equal),
                ],
            )
        })
    }

    fn new(rt: &mut Runtime, list: ObjRef, node: usize) -> Result<ObjRef> {
        rt.new_instance(Self::class(), args![list, node])
    }

    fn position(rt: &Runtime, it: ObjRef) -> Result<(ObjRef, usize)> {
        rt.expect_instance(it, Self::class())?;
        Ok((rt.obj_field(it, Self::LIST)?, rt.index_field(it, Self::NODE)?))
    }
}

fn list_iter_construct(rt: &mut Runtime, obj: ObjRef, args: &mut Args) -> Result<()> {
    rt.super_construct(obj, args)?;
    let list = args.next_obj()?;
    let node = args.next_int()?;
    rt.set_field(obj, ListIterator::LIST, list)?;
    rt.set_field(obj, ListIterator::NODE, node)
}

fn list_iter_increment(rt: &mut Runtime, it: ObjRef) -> Result<()> {
    let (list, node) = ListIterator::position(rt, it)?;
    let next = List::nodes(rt, list)?.next(node);
    rt.set_field(it, ListIterator::NODE, next)
}

fn list_iter_deref(rt: &mut Runtime, it: ObjRef) -> Result<ObjRef> {
    let (list, node) = ListIterator::position(rt, it)?;
    List::nodes(rt, list)?
        .item(node)
        .ok_or_else(|| exhausted(rt, it))
}

fn list_iter_not_equal(rt: &mut Runtime, a: ObjRef, b: ObjRef) -> Result<bool> {
    Ok(ListIterator::position(rt, a)? != ListIterator::position(rt, b)?)
}
