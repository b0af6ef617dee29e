//! Tests for the paged FIFO buffer.

use pushable::fifo::{DEFAULT_PAGE_CAPACITY, Fifo};
use pushable::PushableError;

#[test]
fn new_fifo_is_empty() {
    let mut fifo = Fifo::<u32>::new();
    assert!(fifo.is_empty());
    assert_eq!(fifo.len(), 0);
    assert_eq!(fifo.size(), 0);
    assert_eq!(fifo.shift(), None);
    assert_eq!(fifo.peek(), None);
}

#[test]
fn shifts_in_push_order() {
    let mut fifo = Fifo::new();
    for n in 0..100 {
        fifo.push(n);
    }
    assert_eq!(fifo.len(), 100);

    for n in 0..100 {
        assert_eq!(fifo.shift(), Some(n));
    }
    assert!(fifo.is_empty());
}

#[test]
fn interleaved_push_and_shift() {
    let mut fifo = Fifo::new();
    let mut expected = 0;
    for n in 0..1000 {
        fifo.push(n);
        if n % 3 == 0 {
            assert_eq!(fifo.shift(), Some(expected));
            expected += 1;
        }
    }
    while let Some(n) = fifo.shift() {
        assert_eq!(n, expected);
        expected += 1;
    }
    assert_eq!(expected, 1000);
}

#[test]
fn peek_does_not_remove() {
    let mut fifo = Fifo::new();
    fifo.push("a");
    fifo.push("b");

    assert_eq!(fifo.peek(), Some(&"a"));
    assert_eq!(fifo.peek(), Some(&"a"));
    assert_eq!(fifo.len(), 2);
    assert_eq!(fifo.shift(), Some("a"));
    assert_eq!(fifo.peek(), Some(&"b"));
}

#[test]
fn falsy_values_are_preserved() {
    let mut fifo = Fifo::new();
    fifo.push(None);
    fifo.push(Some(0));
    fifo.push(Some(-1));

    assert_eq!(fifo.shift(), Some(None));
    assert_eq!(fifo.shift(), Some(Some(0)));
    assert_eq!(fifo.shift(), Some(Some(-1)));
    assert_eq!(fifo.shift(), None);
}

#[test]
fn default_sizer_counts_values() {
    let mut fifo = Fifo::new();
    fifo.push(vec![1u8, 2, 3]);
    fifo.push(vec![4u8]);
    assert_eq!(fifo.size(), 2);
}

#[test]
fn custom_sizer_tracks_size() {
    let mut fifo = Fifo::with_sizer(|chunk: &Vec<u8>| chunk.len());
    fifo.push(vec![1, 2]);
    fifo.push(vec![3, 4, 5]);
    assert_eq!(fifo.size(), 5);

    fifo.shift();
    assert_eq!(fifo.size(), 3);

    fifo.shift();
    assert_eq!(fifo.size(), 0);
}

#[test]
fn clear_discards_everything() {
    let mut fifo = Fifo::with_sizer(|s: &String| s.len());
    for n in 0..50 {
        fifo.push(n.to_string());
    }
    fifo.clear();

    assert!(fifo.is_empty());
    assert_eq!(fifo.size(), 0);
    assert_eq!(fifo.page_count(), 1);

    fifo.push("again".to_string());
    assert_eq!(fifo.shift().as_deref(), Some("again"));
}

#[test]
fn grows_beyond_first_page() {
    let mut fifo = Fifo::new();
    for n in 0..DEFAULT_PAGE_CAPACITY * 4 {
        fifo.push(n);
    }
    assert!(fifo.page_count() > 1);
    assert_eq!(fifo.shift(), Some(0));
}

#[test]
fn custom_page_capacity() {
    let mut fifo = Fifo::<u32>::with_page_capacity(2, None).unwrap();
    for n in 0..10 {
        fifo.push(n);
    }
    assert_eq!(fifo.len(), 10);
    assert_eq!((0..10).map(|_| fifo.shift().unwrap()).collect::<Vec<_>>(), (0..10).collect::<Vec<_>>());
}

#[test]
fn page_capacity_must_be_power_of_two() {
    for capacity in [0, 3, 12, 100] {
        let err = Fifo::<u32>::with_page_capacity(capacity, None).unwrap_err();
        assert!(matches!(err, PushableError::Configuration(_)), "capacity {capacity}");
    }
    assert!(Fifo::<u32>::with_page_capacity(1, None).is_ok());
    assert!(Fifo::<u32>::with_page_capacity(1024, None).is_ok());
}
