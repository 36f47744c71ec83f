/// Fixed-capacity circular window. Pushing into a full buffer silently drops
/// the oldest element; storage is allocated once and never grows.
#[derive(Debug, Clone)]
pub struct RingBuffer<T> {
    items: Box<[T]>,
    /// Slot the next push writes to.
    head: usize,
    /// Slot holding the oldest element.
    tail: usize,
    count: usize,
}

impl<T: Copy + Default> RingBuffer<T> {
    pub fn new(capacity: usize) -> Self {
        assert!(capacity > 0, "ring buffer capacity must be non-zero");
        Self {
            items: vec![T::default(); capacity].into_boxed_slice(),
            head: 0,
            tail: 0,
            count: 0,
        }
    }

    /// Appends `item`, returning the element it evicted when the buffer was full.
    pub fn push(&mut self, item: T) -> Option<T> {
        let capacity = self.capacity();
        let evicted = if self.count == capacity {
            let old = self.items[self.tail];
            self.tail = (self.tail + 1) % capacity;
            Some(old)
        } else {
            self.count += 1;
            None
        };

        self.items[self.head] = item;
        self.head = (self.head + 1) % capacity;
        evicted
    }

    /// Element `offset` positions behind the newest (0 = newest).
    ///
    /// # Panics
    ///
    /// When `offset >= len()`.
    pub fn read(&self, offset: usize) -> T {
        assert!(
            offset < self.count,
            "ring buffer read at offset {offset} with only {} items",
            self.count
        );
        let capacity = self.capacity();
        self.items[(self.head + capacity - 1 - offset) % capacity]
    }

    pub fn newest(&self) -> Option<T> {
        (self.count > 0).then(|| self.read(0))
    }

    /// Oldest to newest.
    pub fn iter(&self) -> impl DoubleEndedIterator<Item = T> + ExactSizeIterator + '_ {
        (0..self.count).rev().map(|offset| self.read(offset))
    }

    /// Copies the live elements, oldest first, into the front of `out` and
    /// returns how many were written.
    pub fn copy_to(&self, out: &mut [T]) -> usize {
        let n = self.count.min(out.len());
        for (slot, item) in out.iter_mut().zip(self.iter().skip(self.count - n)) {
            *slot = item;
        }
        n
    }

    /// Forgets every element. Capacity is kept.
    pub fn reset(&mut self) {
        self.head = 0;
        self.tail = 0;
        self.count = 0;
    }

    pub fn len(&self) -> usize {
        self.count
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    pub fn is_full(&self) -> bool {
        self.count == self.capacity()
    }

    pub fn capacity(&self) -> usize {
        self.items.len()
    }
}
