// Common test utilities for integration tests
//
// This module provides shared helper functions and test fixtures
// for use across all integration tests.

#![allow(dead_code)]

use std::ops::ControlFlow;
use std::sync::atomic::{AtomicUsize, Ordering};
use vtobj::{Integer, List, ObjRef, Runtime, Vector, range_for_each};

static CLASS_ID: AtomicUsize = AtomicUsize::new(0);

/// Returns a class name no other test has used
pub fn unique_name(prefix: &str) -> String {
    let id = CLASS_ID.fetch_add(1, Ordering::SeqCst);
    format!("{prefix}_{id}")
}

/// Creates one `Integer` per value
pub fn integers(rt: &mut Runtime, values: &[i64]) -> Vec<ObjRef> {
    values
        .iter()
        .map(|value| Integer::new(rt, *value).expect("Failed to create Integer"))
        .collect()
}

/// Creates a list holding fresh `Integer`s
pub fn list_of(rt: &mut Runtime, values: &[i64]) -> ObjRef {
    let list = List::new(rt).expect("Failed to create List");
    for item in integers(rt, values) {
        List::push_back(rt, list, item).expect("Failed to push");
    }
    list
}

/// Creates a vector holding fresh `Integer`s
pub fn vector_of(rt: &mut Runtime, values: &[i64]) -> ObjRef {
    let vector = Vector::new(rt).expect("Failed to create Vector");
    for item in integers(rt, values) {
        Vector::push_back(rt, vector, item).expect("Failed to push");
    }
    vector
}

/// Collects the `Integer` values of a range
pub fn int_values(rt: &mut Runtime, range: ObjRef) -> Vec<i64> {
    let mut values = Vec::new();
    range_for_each(rt, range, |rt, _, item| {
        values.push(Integer::value(rt, item)?);
        Ok(ControlFlow::Continue(()))
    })
    .expect("Failed to walk range");
    values
}
