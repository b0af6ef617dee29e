//! Growable FIFO buffer with logical size accounting.
//!
//! [`Fifo`] stores values in a chain of fixed-capacity ring-buffer pages.
//! Writes go to the newest page; when it fills up a new page of double the
//! capacity is appended. Reads come from the oldest page, which is dropped
//! once it is exhausted and a newer page exists. Allocation is amortized and
//! the number of live pages stays logarithmic in the number of buffered
//! values.
//!
//! Every value has a logical size computed once, at insertion, by the
//! buffer's sizer. The same figure is subtracted when the value leaves, so
//! [`Fifo::size`] always equals the sum over the values currently buffered.
//!
//! ```rust
//! use pushable::fifo::Fifo;
//!
//! let mut fifo = Fifo::with_sizer(|chunk: &Vec<u8>| chunk.len());
//! fifo.push(vec![1, 2]);
//! fifo.push(vec![3, 4, 5]);
//! assert_eq!(fifo.size(), 5);
//!
//! assert_eq!(fifo.shift(), Some(vec![1, 2]));
//! assert_eq!(fifo.size(), 3);
//! ```

use std::collections::VecDeque;
use std::fmt;
use std::sync::Arc;

use crate::{PushableError, Result};

/// Capacity of the first page. Later pages double.
pub const DEFAULT_PAGE_CAPACITY: usize = 16;

/// Computes the logical size of a buffered value.
pub type Sizer<T> = Arc<dyn Fn(&T) -> usize + Send + Sync>;

struct Entry<T> {
    value: T,
    size: usize,
}

/// Fixed-capacity ring buffer. `None` marks a free slot.
struct Page<T> {
    slots: Box<[Option<Entry<T>>]>,
    mask: usize,
    top: usize,
    btm: usize,
}

impl<T> Page<T> {
    fn new(capacity: usize) -> Self {
        debug_assert!(capacity.is_power_of_two());
        Self {
            slots: (0..capacity).map(|_| None).collect(),
            mask: capacity - 1,
            top: 0,
            btm: 0,
        }
    }

    fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Hands the entry back when the page is full.
    fn push(&mut self, entry: Entry<T>) -> std::result::Result<(), Entry<T>> {
        if self.slots[self.top].is_some() {
            return Err(entry);
        }
        self.slots[self.top] = Some(entry);
        self.top = (self.top + 1) & self.mask;
        Ok(())
    }

    fn shift(&mut self) -> Option<Entry<T>> {
        let entry = self.slots[self.btm].take()?;
        self.btm = (self.btm + 1) & self.mask;
        Some(entry)
    }

    fn peek(&self) -> Option<&Entry<T>> {
        self.slots[self.btm].as_ref()
    }

    fn clear(&mut self) {
        for slot in self.slots.iter_mut() {
            *slot = None;
        }
        self.top = 0;
        self.btm = 0;
    }
}

/// Growable first-in first-out buffer with logical size accounting.
///
/// The default sizer counts values (every value has size 1).
pub struct Fifo<T> {
    /// Oldest page at the front (read side), newest at the back (write side).
    pages: VecDeque<Page<T>>,
    len: usize,
    size: usize,
    /// `None` counts values.
    sizer: Option<Sizer<T>>,
}

impl<T> Fifo<T> {
    /// Create an empty buffer that counts values.
    pub fn new() -> Self {
        Self::from_parts(DEFAULT_PAGE_CAPACITY, None)
    }

    /// Create an empty buffer that measures values with `sizer`.
    pub fn with_sizer(sizer: impl Fn(&T) -> usize + Send + Sync + 'static) -> Self {
        Self::from_parts(DEFAULT_PAGE_CAPACITY, Some(Arc::new(sizer)))
    }

    /// Create an empty buffer whose first page holds `capacity` values.
    ///
    /// Fails with [`PushableError::Configuration`] unless `capacity` is a
    /// non-zero power of two. A `None` sizer counts values.
    pub fn with_page_capacity(capacity: usize, sizer: Option<Sizer<T>>) -> Result<Self> {
        if !capacity.is_power_of_two() {
            return Err(PushableError::Configuration(format!(
                "page capacity must be a power of two, got {capacity}"
            )));
        }
        Ok(Self::from_parts(capacity, sizer))
    }

    fn from_parts(capacity: usize, sizer: Option<Sizer<T>>) -> Self {
        let mut pages = VecDeque::with_capacity(1);
        pages.push_back(Page::new(capacity));
        Self {
            pages,
            len: 0,
            size: 0,
            sizer,
        }
    }

    /// Append a value. Never blocks and never fails.
    pub fn push(&mut self, value: T) {
        let size = self.sizer.as_ref().map_or(1, |sizer| sizer(&value));
        self.size += size;
        self.len += 1;

        let mut entry = Entry { value, size };
        let mut capacity = DEFAULT_PAGE_CAPACITY;
        if let Some(head) = self.pages.back_mut() {
            match head.push(entry) {
                Ok(()) => return,
                Err(rejected) => {
                    entry = rejected;
                    capacity = head.capacity() * 2;
                }
            }
        }

        let mut page = Page::new(capacity);
        // a fresh page always has room
        let _ = page.push(entry);
        self.pages.push_back(page);
    }

    /// Remove and return the oldest value.
    pub fn shift(&mut self) -> Option<T> {
        let entry = loop {
            let tail = self.pages.front_mut()?;
            if let Some(entry) = tail.shift() {
                break entry;
            }
            if self.pages.len() == 1 {
                return None;
            }
            self.pages.pop_front();
        };

        self.len -= 1;
        self.size = self.size.saturating_sub(entry.size);
        Some(entry.value)
    }

    /// The oldest value, without removing it.
    pub fn peek(&self) -> Option<&T> {
        self.pages
            .iter()
            .find_map(|page| page.peek())
            .map(|entry| &entry.value)
    }

    /// Drop every buffered value and reset the size to zero.
    ///
    /// The oldest page is kept for reuse.
    pub fn clear(&mut self) {
        self.pages.truncate(1);
        if let Some(page) = self.pages.front_mut() {
            page.clear();
        }
        self.len = 0;
        self.size = 0;
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Number of buffered values.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Sum of the logical sizes of the buffered values.
    pub fn size(&self) -> usize {
        self.size
    }

    /// Number of pages currently allocated.
    pub fn page_count(&self) -> usize {
        self.pages.len()
    }
}

impl<T> Default for Fifo<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> fmt::Debug for Fifo<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Fifo")
            .field("len", &self.len)
            .field("size", &self.size)
            .field("pages", &self.pages.len())
            .finish()
    }
}
