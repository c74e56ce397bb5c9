// Bounded buffer and keyed ring table tests

use crate::buffer::*;

#[test]
fn test_buffer_never_exceeds_capacity() {
    let mut buffer = BoundedBuffer::new(3);
    for i in 0..10 {
        buffer.push(i);
        assert!(buffer.len() <= 3);
    }
    assert_eq!(buffer.len(), 3);
}

#[test]
fn test_buffer_evicts_oldest_first() {
    let mut buffer = BoundedBuffer::new(2);
    assert_eq!(buffer.push(1), None);
    assert_eq!(buffer.push(2), None);
    assert_eq!(buffer.push(3), Some(1));

    assert_eq!(buffer.oldest(), Some(&2));
    assert_eq!(buffer.latest(), Some(&3));
}

#[test]
fn test_zero_capacity_is_raised_to_one() {
    let mut buffer = BoundedBuffer::new(0);
    buffer.push("a");
    buffer.push("b");
    assert_eq!(buffer.capacity(), 1);
    assert_eq!(buffer.latest(), Some(&"b"));
}

#[test]
fn test_trailing_window() {
    let mut buffer = BoundedBuffer::new(10);
    for i in 0..6 {
        buffer.push(i);
    }
    assert_eq!(buffer.trailing_vec(3), vec![3, 4, 5]);
    assert_eq!(buffer.trailing_vec(20), vec![0, 1, 2, 3, 4, 5]);

    buffer.clear();
    assert!(buffer.is_empty());
    assert!(buffer.trailing_vec(3).is_empty());
}

#[test]
fn test_keyed_table_series_are_bounded() {
    let mut table = KeyedRingTable::new(2);
    table.push("loads", 1.0);
    table.push("loads", 2.0);
    table.push("loads", 3.0);

    let series = table.get("loads").unwrap();
    assert_eq!(series.len(), 2);
    assert_eq!(series.latest(), Some(&3.0));
    assert!(table.get("missing").is_none());
}

#[test]
fn test_keyed_table_reuses_freed_slots() {
    let mut table = KeyedRingTable::new(4);
    table.push("a", 1);
    table.push("b", 2);
    assert_eq!(table.slot_count(), 2);

    assert!(table.remove("a"));
    assert!(!table.remove("a"));
    table.push("c", 3);

    assert_eq!(table.slot_count(), 2);
    assert_eq!(table.len(), 2);
    let mut names: Vec<&str> = table.iter().map(|(name, _)| name).collect();
    names.sort();
    assert_eq!(names, vec!["b", "c"]);
}

#[test]
fn test_keyed_table_clear() {
    let mut table = KeyedRingTable::new(4);
    table.push("a", 1);
    table.clear();
    assert!(table.is_empty());
    assert_eq!(table.slot_count(), 0);
}
