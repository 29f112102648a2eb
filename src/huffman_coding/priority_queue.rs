//! Binary min-heap used to build the Huffman trees.
//!
//! The standard library's BinaryHeap is a max-heap with an unspecified growth strategy. Tree
//! building needs the smallest element first and a fully predictable pop order, so the heap is
//! kept here with its own sift routines.

/// Starting capacity of a new queue.
const DEFAULT_CAPACITY: usize = 10;

#[derive(Debug, Clone)]
pub struct PriorityQueue<T: Ord> {
    queue: Vec<T>,
}

impl<T: Ord> PriorityQueue<T> {
    pub fn new() -> Self {
        Self {
            queue: Vec::with_capacity(DEFAULT_CAPACITY),
        }
    }

    /// Add an element. O(log n).
    pub fn add(&mut self, element: T) {
        if self.queue.len() == self.queue.capacity() {
            self.grow();
        }
        self.queue.push(element);
        self.sift_up(self.queue.len() - 1);
    }

    /// Add every element of another queue, one at a time.
    pub fn add_all(&mut self, other: PriorityQueue<T>) {
        for element in other.queue {
            self.add(element);
        }
    }

    /// Remove and return the smallest element. O(log n).
    pub fn poll(&mut self) -> Option<T> {
        if self.queue.is_empty() {
            return None;
        }
        // swap_remove moves the last element into the root slot.
        let result = self.queue.swap_remove(0);
        if !self.queue.is_empty() {
            self.sift_down(0);
        }
        Some(result)
    }

    /// Look at the smallest element without removing it.
    pub fn peek(&self) -> Option<&T> {
        self.queue.first()
    }

    pub fn size(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.queue.capacity()
    }

    /// Grow by old + 2 while small, then by half.
    fn grow(&mut self) {
        let old = self.queue.capacity();
        let extra = if old < 64 { old + 2 } else { old >> 1 };
        self.queue.reserve_exact(extra);
    }

    /// Move the element at k up until its parent is not greater.
    fn sift_up(&mut self, mut k: usize) {
        while k > 0 {
            let parent = (k - 1) >> 1;
            if self.queue[k] >= self.queue[parent] {
                break;
            }
            self.queue.swap(k, parent);
            k = parent;
        }
    }

    /// Move the element at k down until no child is smaller.
    fn sift_down(&mut self, mut k: usize) {
        let size = self.queue.len();
        let half = size >> 1;
        while k < half {
            let mut child = (k << 1) + 1;
            let right = child + 1;
            if right < size && self.queue[child] > self.queue[right] {
                child = right;
            }
            if self.queue[k] <= self.queue[child] {
                break;
            }
            self.queue.swap(k, child);
            k = child;
        }
    }
}

impl<T: Ord> Default for PriorityQueue<T> {
    fn default() -> Self {
        Self::new()
    }
}
