//! Price Level - A FIFO queue of orders at a single price point.
//!
//! Implements a doubly-linked list using arena indices for O(1)
//! insertion, removal from head, and removal from arbitrary position.

use crate::arena::{Arena, ArenaIndex, NULL_INDEX};
use crate::command::Quantity;

/// A queue of orders at a specific price level.
///
/// Orders are processed in FIFO order (price-time priority).
/// The doubly-linked structure enables O(1) cancel from any position.
#[derive(Clone, Copy, Debug)]
pub struct PriceLevel {
    /// Index of the oldest order (highest priority, first to match)
    head: ArenaIndex,
    /// Index of the newest order (last to match)
    tail: ArenaIndex,
    /// Total remaining quantity across all orders at this level
    total_qty: u64,
    /// Number of orders at this level
    count: u32,
}

impl PriceLevel {
    /// Create a new empty price level
    #[inline]
    pub const fn new() -> Self {
        Self {
            head: NULL_INDEX,
            tail: NULL_INDEX,
            total_qty: 0,
            count: 0,
        }
    }

    /// Returns true if there are no orders at this level
    #[inline]
    pub const fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// Total remaining quantity at this level
    #[inline]
    pub const fn total_qty(&self) -> u64 {
        self.total_qty
    }

    /// Number of orders at this level
    #[inline]
    pub const fn count(&self) -> u32 {
        self.count
    }

    /// Append an order to the tail of the queue (newest order).
    ///
    /// # Complexity
    /// O(1)
    #[inline]
    pub fn push_back(&mut self, arena: &mut Arena, index: ArenaIndex) {
        let qty = arena.get(index).order.remaining_quantity();

        if self.tail == NULL_INDEX {
            // Empty list: new node becomes both head and tail
            debug_assert!(self.head == NULL_INDEX);
            self.head = index;
            self.tail = index;
            arena.get_mut(index).prev = NULL_INDEX;
            arena.get_mut(index).next = NULL_INDEX;
        } else {
            // Append to existing tail
            arena.get_mut(self.tail).next = index;
            arena.get_mut(index).prev = self.tail;
            arena.get_mut(index).next = NULL_INDEX;
            self.tail = index;
        }

        self.count += 1;
        self.total_qty += qty as u64;
    }

    /// Remove and return the head order (oldest/highest priority).
    ///
    /// The order is NOT freed from the arena; caller must do that.
    ///
    /// # Complexity
    /// O(1)
    #[inline]
    pub fn pop_front(&mut self, arena: &mut Arena) -> Option<ArenaIndex> {
        if self.head == NULL_INDEX {
            return None;
        }

        let index = self.head;
        self.remove(arena, index);
        Some(index)
    }

    /// Remove an order from anywhere in the queue.
    ///
    /// # Returns
    /// `true` if the level is now empty, `false` otherwise.
    /// The order is NOT freed from the arena; caller must do that.
    ///
    /// # Complexity
    /// O(1)
    #[inline]
    pub fn remove(&mut self, arena: &mut Arena, index: ArenaIndex) -> bool {
        let node = arena.get(index);
        let prev_idx = node.prev;
        let next_idx = node.next;
        let qty = node.order.remaining_quantity();

        if prev_idx == NULL_INDEX {
            debug_assert!(self.head == index);
            self.head = next_idx;
        } else {
            arena.get_mut(prev_idx).next = next_idx;
        }

        if next_idx == NULL_INDEX {
            debug_assert!(self.tail == index);
            self.tail = prev_idx;
        } else {
            arena.get_mut(next_idx).prev = prev_idx;
        }

        self.count -= 1;
        self.total_qty -= qty as u64;

        // Clear the removed node's linkage
        let node = arena.get_mut(index);
        node.prev = NULL_INDEX;
        node.next = NULL_INDEX;

        self.count == 0
    }

    /// Peek at the head order without removing it.
    #[inline]
    pub const fn peek_head(&self) -> Option<ArenaIndex> {
        if self.head == NULL_INDEX {
            None
        } else {
            Some(self.head)
        }
    }

    /// Update total quantity after a fill.
    ///
    /// Call this after reducing a queued order's remaining quantity.
    #[inline]
    pub fn subtract_qty(&mut self, qty: Quantity) {
        debug_assert!(self.total_qty >= qty as u64);
        self.total_qty -= qty as u64;
    }

    /// Walk the queue from head to tail.
    pub fn iter<'a>(&self, arena: &'a Arena) -> LevelIter<'a> {
        LevelIter {
            arena,
            cursor: self.head,
        }
    }
}

impl Default for PriceLevel {
    fn default() -> Self {
        Self::new()
    }
}

/// Iterator over the arena indices queued at one level, oldest first
pub struct LevelIter<'a> {
    arena: &'a Arena,
    cursor: ArenaIndex,
}

impl Iterator for LevelIter<'_> {
    type Item = ArenaIndex;

    fn next(&mut self) -> Option<ArenaIndex> {
        if self.cursor == NULL_INDEX {
            return None;
        }
        let index = self.cursor;
        self.cursor = self.arena.get(index).next;
        Some(index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::{OrderType, Side};
    use crate::order::Order;

    fn setup_arena_with_orders(arena: &mut Arena, count: u64) -> Vec<ArenaIndex> {
        (0..count)
            .map(|i| arena.alloc(Order::new(OrderType::GoodTillCancel, i, Side::Buy, 100, 100)))
            .collect()
    }

    fn queued(level: &PriceLevel, arena: &Arena) -> Vec<ArenaIndex> {
        level.iter(arena).collect()
    }

    #[test]
    fn test_empty_level() {
        let level = PriceLevel::new();
        assert!(level.is_empty());
        assert_eq!(level.count(), 0);
        assert_eq!(level.total_qty(), 0);
        assert_eq!(level.peek_head(), None);
    }

    #[test]
    fn test_push_single() {
        let mut arena = Arena::new();
        let mut level = PriceLevel::new();
        let idx = setup_arena_with_orders(&mut arena, 1)[0];

        level.push_back(&mut arena, idx);

        assert!(!level.is_empty());
        assert_eq!(level.count(), 1);
        assert_eq!(level.total_qty(), 100);
        assert_eq!(level.peek_head(), Some(idx));
    }

    #[test]
    fn test_push_multiple_fifo() {
        let mut arena = Arena::new();
        let mut level = PriceLevel::new();
        let indices = setup_arena_with_orders(&mut arena, 3);

        for &idx in &indices {
            level.push_back(&mut arena, idx);
        }

        assert_eq!(level.count(), 3);
        assert_eq!(level.total_qty(), 300);
        assert_eq!(queued(&level, &arena), indices);

        // Verify linkage
        assert_eq!(arena.get(indices[0]).next, indices[1]);
        assert_eq!(arena.get(indices[1]).prev, indices[0]);
        assert_eq!(arena.get(indices[1]).next, indices[2]);
        assert_eq!(arena.get(indices[2]).prev, indices[1]);
    }

    #[test]
    fn test_pop_front() {
        let mut arena = Arena::new();
        let mut level = PriceLevel::new();
        let indices = setup_arena_with_orders(&mut arena, 3);

        for &idx in &indices {
            level.push_back(&mut arena, idx);
        }

        assert_eq!(level.pop_front(&mut arena), Some(indices[0]));
        assert_eq!(level.count(), 2);
        assert_eq!(level.peek_head(), Some(indices[1]));
        assert_eq!(arena.get(indices[1]).prev, NULL_INDEX);

        assert_eq!(level.pop_front(&mut arena), Some(indices[1]));
        assert_eq!(level.pop_front(&mut arena), Some(indices[2]));
        assert!(level.is_empty());
        assert_eq!(level.total_qty(), 0);

        // Pop from empty
        assert!(level.pop_front(&mut arena).is_none());
    }

    #[test]
    fn test_remove_only_node() {
        let mut arena = Arena::new();
        let mut level = PriceLevel::new();
        let idx = setup_arena_with_orders(&mut arena, 1)[0];
        level.push_back(&mut arena, idx);

        assert!(level.remove(&mut arena, idx));
        assert!(level.is_empty());
        assert_eq!(level.peek_head(), None);
        assert_eq!(queued(&level, &arena), Vec::<ArenaIndex>::new());
    }

    #[test]
    fn test_remove_head() {
        let mut arena = Arena::new();
        let mut level = PriceLevel::new();
        let indices = setup_arena_with_orders(&mut arena, 3);
        for &idx in &indices {
            level.push_back(&mut arena, idx);
        }

        assert!(!level.remove(&mut arena, indices[0]));
        assert_eq!(level.count(), 2);
        assert_eq!(level.peek_head(), Some(indices[1]));
        assert_eq!(arena.get(indices[1]).prev, NULL_INDEX);
    }

    #[test]
    fn test_remove_tail() {
        let mut arena = Arena::new();
        let mut level = PriceLevel::new();
        let indices = setup_arena_with_orders(&mut arena, 3);
        for &idx in &indices {
            level.push_back(&mut arena, idx);
        }

        assert!(!level.remove(&mut arena, indices[2]));
        assert_eq!(level.count(), 2);
        assert_eq!(arena.get(indices[1]).next, NULL_INDEX);
        assert_eq!(queued(&level, &arena), vec![indices[0], indices[1]]);

        // New tail must accept appends
        let extra = arena.alloc(Order::new(OrderType::GoodTillCancel, 9, Side::Buy, 100, 5));
        level.push_back(&mut arena, extra);
        assert_eq!(queued(&level, &arena), vec![indices[0], indices[1], extra]);
    }

    #[test]
    fn test_remove_middle() {
        let mut arena = Arena::new();
        let mut level = PriceLevel::new();
        let indices = setup_arena_with_orders(&mut arena, 3);
        for &idx in &indices {
            level.push_back(&mut arena, idx);
        }

        assert!(!level.remove(&mut arena, indices[1]));
        assert_eq!(level.count(), 2);
        assert_eq!(level.total_qty(), 200);
        assert_eq!(arena.get(indices[0]).next, indices[2]);
        assert_eq!(arena.get(indices[2]).prev, indices[0]);
    }

    #[test]
    fn test_subtract_qty_after_fill() {
        let mut arena = Arena::new();
        let mut level = PriceLevel::new();
        let indices = setup_arena_with_orders(&mut arena, 2);
        for &idx in &indices {
            level.push_back(&mut arena, idx);
        }

        arena.get_mut(indices[0]).order.fill(40).unwrap();
        level.subtract_qty(40);
        assert_eq!(level.total_qty(), 160);

        // Removing the partially filled order takes only its remainder
        level.remove(&mut arena, indices[0]);
        assert_eq!(level.total_qty(), 100);
    }
}
