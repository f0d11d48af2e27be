//! Array-backed binary min-heap over prioritised values.
//!
//! `std::collections::BinaryHeap` wants `Ord` keys and has no way to rescale
//! every key in place, so the reservoir keeps its own.

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Entry {
    pub priority: f64,
    pub value: i64,
}

#[derive(Debug, Clone)]
pub struct PriorityHeap {
    entries: Vec<Entry>,
}

impl PriorityHeap {
    pub fn with_capacity(capacity: usize) -> PriorityHeap {
        PriorityHeap {
            entries: Vec::with_capacity(capacity),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn push(&mut self, entry: Entry) {
        self.entries.push(entry);
        let last = self.entries.len() - 1;
        self.sift_up(last);
    }

    /// Remove and return the lowest-priority entry.
    pub fn pop(&mut self) -> Option<Entry> {
        if self.entries.is_empty() {
            return None;
        }
        let last = self.entries.len() - 1;
        self.entries.swap(0, last);
        let min = self.entries.pop();
        if !self.entries.is_empty() {
            self.sift_down(0);
        }
        min
    }

    /// Multiply every priority by `factor`. A non-negative factor keeps the
    /// heap ordered, so no re-heapify is needed.
    pub fn scale(&mut self, factor: f64) {
        debug_assert!(factor >= 0.0);
        for entry in &mut self.entries {
            entry.priority *= factor;
        }
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn values(&self) -> Vec<i64> {
        self.entries.iter().map(|e| e.value).collect()
    }

    fn sift_up(&mut self, mut idx: usize) {
        while idx > 0 {
            let parent = (idx - 1) / 2;
            if self.entries[idx].priority >= self.entries[parent].priority {
                break;
            }
            self.entries.swap(idx, parent);
            idx = parent;
        }
    }

    fn sift_down(&mut self, mut idx: usize) {
        let len = self.entries.len();
        loop {
            let left = 2 * idx + 1;
            let right = left + 1;
            let mut smallest = idx;
            if left < len && self.entries[left].priority < self.entries[smallest].priority {
                smallest = left;
            }
            if right < len && self.entries[right].priority < self.entries[smallest].priority {
                smallest = right;
            }
            if smallest == idx {
                return;
            }
            self.entries.swap(idx, smallest);
            idx = smallest;
        }
    }
}
