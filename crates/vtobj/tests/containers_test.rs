//! Integration tests for the stored containers: `List`, `Vector`, `Map` and
//! `Pair`, driven through the generic iterator protocol and range algorithms.

mod common;

use common::{int_values, integers, list_of, unique_name, vector_of};
use std::fmt;
use vtobj::{
    Class, Error, Float, Imp, Integer, List, Map, ObjRef, Pair, Result, Runtime,
    RuntimeConfig, Str, Vector, args, range_find, range_print, range_print_to,
};

#[test]
fn test_list_and_vector_print_alike() {
    let mut rt = Runtime::new();
    let list = list_of(&mut rt, &[1, 2, 3]);
    let vector = vector_of(&mut rt, &[1, 2, 3]);

    assert_eq!(rt.describe(list).unwrap(), "[1, 2, 3]");
    assert_eq!(rt.describe(vector).unwrap(), "[1, 2, 3]");
    assert_eq!(int_values(&mut rt, list), int_values(&mut rt, vector));
}

#[test]
fn test_heterogeneous_elements() {
    let mut rt = Runtime::new();
    let list = List::new(&mut rt).unwrap();
    let n = Integer::new(&mut rt, 1).unwrap();
    let x = Float::new(&mut rt, 2.5).unwrap();
    let s = Str::new(&mut rt, "three").unwrap();
    let inner = list_of(&mut rt, &[4]);
    for item in [n, x, s, inner] {
        List::push_back(&mut rt, list, item).unwrap();
    }

    assert_eq!(rt.describe(list).unwrap(), "[1, 2.5, three, [4]]");
    assert_eq!(range_find(&mut rt, list, s).unwrap(), Some(2));
}

#[test]
fn test_find_uses_element_compare() {
    let mut rt = Runtime::new();
    let vector = vector_of(&mut rt, &[10, 20, 30, 20]);

    let probes = integers(&mut rt, &[20, 30, 40]);
    assert_eq!(range_find(&mut rt, vector, probes[0]).unwrap(), Some(1));
    assert_eq!(range_find(&mut rt, vector, probes[1]).unwrap(), Some(2));
    assert_eq!(range_find(&mut rt, vector, probes[2]).unwrap(), None);

    let empty = List::new(&mut rt).unwrap();
    assert_eq!(range_find(&mut rt, empty, probes[0]).unwrap(), None);
}

#[test]
fn test_vector_growth_from_config() {
    let mut rt = Runtime::with_config(RuntimeConfig::default().with_vector_capacity(1));
    let vector = vector_of(&mut rt, &[0, 1, 2, 3, 4]);

    assert_eq!(Vector::len(&rt, vector).unwrap(), 5);
    assert_eq!(Vector::capacity(&rt, vector).unwrap(), 8);
    assert_eq!(int_values(&mut rt, vector), vec![0, 1, 2, 3, 4]);
}

#[test]
fn test_manual_iteration() {
    let mut rt = Runtime::new();
    let list = list_of(&mut rt, &[5, 6]);

    let it = rt.begin(list).unwrap();
    let end = rt.end(list).unwrap();
    let mut seen = Vec::new();
    while rt.not_equal(it, end).unwrap() {
        let item = rt.deref(it).unwrap();
        seen.push(Integer::value(&rt, item).unwrap());
        rt.increment(it).unwrap();
    }
    rt.delete(it).unwrap();
    rt.delete(end).unwrap();

    assert_eq!(seen, vec![5, 6]);
}

#[test]
fn test_map_lookup_by_value() {
    let mut rt = Runtime::new();
    let map = Map::new(&mut rt).unwrap();
    for (key, value) in [("apple", 1), ("pear", 2)] {
        let key = Str::new(&mut rt, key).unwrap();
        let value = Integer::new(&mut rt, value).unwrap();
        let pair = Pair::new(&mut rt, key, value).unwrap();
        Map::insert(&mut rt, map, pair).unwrap();
    }

    let probe = Str::new(&mut rt, "pear").unwrap();
    let found = Map::at(&mut rt, map, probe).unwrap().unwrap();
    assert_eq!(Integer::value(&rt, found).unwrap(), 2);

    let missing = Str::new(&mut rt, "plum").unwrap();
    assert_eq!(Map::at(&mut rt, map, missing).unwrap(), None);
    assert_eq!(rt.describe(map).unwrap(), "[(apple, 1), (pear, 2)]");
}

#[test]
fn test_containers_do_not_own_elements() {
    let mut rt = Runtime::new();
    let list = list_of(&mut rt, &[1, 2]);
    let vector = vector_of(&mut rt, &[3]);
    let map = Map::new(&mut rt).unwrap();
    let before = rt.live_objects();

    rt.delete(list).unwrap();
    rt.delete(vector).unwrap();
    rt.delete(map).unwrap();

    // Three containers and the map's inner vector are gone, the integers stay.
    assert_eq!(rt.live_objects(), before - 4);
}

#[test]
fn test_container_operations_reject_other_classes() {
    let mut rt = Runtime::new();
    let list = List::new(&mut rt).unwrap();
    let item = Integer::new(&mut rt, 1).unwrap();

    assert_eq!(
        Vector::push_back(&mut rt, list, item),
        Err(Error::UnexpectedClass {
            expected: "Vector".into(),
            found: "List".into()
        })
    );
    assert!(Map::len(&rt, list).is_err());
    assert!(Pair::first(&rt, list).is_err());
}

#[test]
fn test_list_order_and_print_count() {
    let mut rt = Runtime::new();
    let list = List::new(&mut rt).unwrap();
    let items = integers(&mut rt, &[1, 2, 3]);
    for item in &items {
        List::push_front(&mut rt, list, *item).unwrap();
    }

    assert_eq!(range_print(&mut rt, list).unwrap(), 3);
    assert_eq!(int_values(&mut rt, list), vec![3, 2, 1]);
    assert_eq!(List::pop_back(&mut rt, list).unwrap(), Some(items[0]));
    assert_eq!(List::pop_front(&mut rt, list).unwrap(), Some(items[2]));
}

#[test]
fn test_range_print_to_writer() {
    let mut rt = Runtime::new();
    let list = list_of(&mut rt, &[1, 2]);

    let mut out = String::from("items: ");
    assert_eq!(range_print_to(&mut rt, list, &mut out).unwrap(), 2);
    assert_eq!(out, "items: [1, 2]");
}

// ============================================================================
// A user-defined container subclass
// ============================================================================

fn tagged_print(rt: &mut Runtime, obj: ObjRef, out: &mut dyn fmt::Write) -> Result<()> {
    out.write_str("list")?;
    rt.super_print(obj, out)
}

#[test]
fn test_subclassed_list_keeps_behavior() {
    let tagged = Class::derive(
        &unique_name("TaggedList"),
        List::class(),
        List::class().instance_size(),
        [Imp::Print(tagged_print)],
    )
    .unwrap();
    let mut rt = Runtime::new();
    let list = rt.new_instance(tagged, args![]).unwrap();
    for item in integers(&mut rt, &[1, 2]) {
        List::push_back(&mut rt, list, item).unwrap();
    }

    assert_eq!(rt.describe(list).unwrap(), "list[1, 2]");
    assert_eq!(List::len(&rt, list).unwrap(), 2);
}
