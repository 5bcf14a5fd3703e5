// -*- coding: utf-8 -*-
// ------------------------------------------------------------------------------------------------
// Copyright © 2021, scope-graphs authors.
// Licensed under either of Apache License, Version 2.0, or MIT license, at your option.
// Please see the LICENSE-APACHE or LICENSE-MIT files in this distribution for license details.
// ------------------------------------------------------------------------------------------------

use pretty_assertions::assert_eq;
use scope_graphs::arena::Arena;
use scope_graphs::arena::HandleSet;
use scope_graphs::arena::SupplementalArena;

#[test]
fn can_allocate_in_arena() {
    let mut arena = Arena::new();
    let hello1 = arena.add("hello".to_string());
    let hello2 = arena.add("hello".to_string());
    let there = arena.add("there".to_string());
    assert!(hello1 != hello2);
    assert!(hello1 != there);
    assert_eq!(arena.get(hello1), arena.get(hello2));
    assert!(arena.get(hello1) != arena.get(there));
    assert_eq!(arena.iter_handles().count(), 3);
}

#[test]
fn can_mutate_in_arena() {
    let mut arena = Arena::new();
    let handle = arena.add(1_u32);
    *arena.get_mut(handle) = 2;
    assert_eq!(*arena.get(handle), 2);
}

#[test]
fn can_store_supplemental_data() {
    let mut arena = Arena::<u32>::new();
    let first = arena.add(1);
    let second = arena.add(2);

    let mut supplemental = SupplementalArena::<u32, String>::new();
    assert_eq!(supplemental.get(first), None);

    // Mutable indexing creates a default entry on demand.
    supplemental[second].push_str("second");
    assert_eq!(supplemental.get(first), None);
    assert_eq!(supplemental.get(second).map(String::as_str), Some("second"));
}

#[test]
fn can_use_handle_sets() {
    let mut arena = Arena::<u32>::new();
    let handles = (0..10).map(|value| arena.add(value)).collect::<Vec<_>>();

    let mut set = HandleSet::new();
    assert!(set.is_empty());
    for handle in handles.iter().step_by(2) {
        set.add(*handle);
    }
    assert!(set.contains(handles[0]));
    assert!(!set.contains(handles[1]));
    assert_eq!(set.iter().count(), 5);

    set.remove(handles[0]);
    assert!(!set.contains(handles[0]));
    assert_eq!(set.iter().count(), 4);

    set.clear();
    assert!(set.is_empty());
}
