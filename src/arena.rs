//! Order Arena - slab of order records addressed by stable `u32` handles.
//!
//! The arena is the single owner of every resting order. Price levels and
//! the order index only hold handles into it, so removing an order never
//! invalidates a reference held elsewhere. Freed slots go on a free list
//! threaded through the `next` link and are reused before the slab grows.

use std::fmt;

use crate::order::Order;

/// Sentinel value representing a null/invalid index (like nullptr)
pub const NULL_INDEX: u32 = u32::MAX;

/// Type alias for arena indices - our "compressed pointers"
pub type ArenaIndex = u32;

/// An order plus its FIFO linkage within a price level.
///
/// 32 bytes, so two nodes share a cache line.
#[repr(C, align(32))]
#[derive(Clone)]
pub struct OrderNode {
    /// The order record
    pub order: Order,

    /// Index of next (younger) order at the same price level
    pub next: ArenaIndex,

    /// Index of previous (older) order (enables O(1) cancel)
    pub prev: ArenaIndex,
}

const _: () = assert!(
    std::mem::size_of::<OrderNode>() == 32,
    "OrderNode must be exactly 32 bytes"
);

impl OrderNode {
    #[inline]
    pub fn new(order: Order) -> Self {
        Self {
            order,
            next: NULL_INDEX,
            prev: NULL_INDEX,
        }
    }
}

impl fmt::Debug for OrderNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OrderNode")
            .field("order_id", &self.order.order_id())
            .field("price", &self.order.price())
            .field("remaining", &self.order.remaining_quantity())
            .field("prev", &self.prev)
            .field("next", &self.next)
            .finish()
    }
}

/// Growable slab of order nodes with O(1) allocation and deallocation.
pub struct Arena {
    /// Every node ever allocated; freed ones are linked from `free_head`
    nodes: Vec<OrderNode>,

    /// Head of the free list (index of first reusable node)
    free_head: ArenaIndex,

    /// Number of currently allocated nodes
    allocated_count: u32,
}

impl Arena {
    /// Create an empty arena
    pub fn new() -> Self {
        Self::with_capacity(0)
    }

    /// Create an arena with room for `capacity` orders before it reallocates.
    pub fn with_capacity(capacity: u32) -> Self {
        Self {
            nodes: Vec::with_capacity(capacity as usize),
            free_head: NULL_INDEX,
            allocated_count: 0,
        }
    }

    /// Store an order and return its handle.
    ///
    /// # Panics
    /// Panics if the arena would need more than `u32::MAX - 1` slots
    /// (`NULL_INDEX` is reserved).
    ///
    /// # Complexity
    /// O(1) amortised - pops the free list, otherwise appends
    #[inline]
    pub fn alloc(&mut self, order: Order) -> ArenaIndex {
        self.allocated_count += 1;

        if self.free_head != NULL_INDEX {
            let index = self.free_head;
            let node = &mut self.nodes[index as usize];
            self.free_head = node.next;
            *node = OrderNode::new(order);
            return index;
        }

        let index = self.nodes.len();
        assert!(index < NULL_INDEX as usize, "Arena exhausted the u32 index space");
        self.nodes.push(OrderNode::new(order));
        index as ArenaIndex
    }

    /// Release a node back to the arena and return its order record.
    ///
    /// The caller must have unlinked the node from its price level and must
    /// not free the same index twice.
    ///
    /// # Complexity
    /// O(1) - pushes to head of free list
    #[inline]
    pub fn free(&mut self, index: ArenaIndex) -> Order {
        debug_assert!((index as usize) < self.nodes.len(), "Index out of bounds");
        debug_assert!(self.allocated_count > 0, "Double free detected");

        let node = &mut self.nodes[index as usize];
        node.prev = NULL_INDEX;
        node.next = self.free_head;
        self.free_head = index;
        self.allocated_count -= 1;

        node.order.clone()
    }

    /// Get an immutable reference to a node.
    #[inline]
    pub fn get(&self, index: ArenaIndex) -> &OrderNode {
        debug_assert!((index as usize) < self.nodes.len(), "Index out of bounds");
        &self.nodes[index as usize]
    }

    /// Get a mutable reference to a node.
    #[inline]
    pub fn get_mut(&mut self, index: ArenaIndex) -> &mut OrderNode {
        debug_assert!((index as usize) < self.nodes.len(), "Index out of bounds");
        &mut self.nodes[index as usize]
    }

    /// Returns the number of currently allocated nodes.
    #[inline]
    pub fn allocated(&self) -> u32 {
        self.allocated_count
    }

    /// Returns the number of slots the arena has handed out so far.
    #[inline]
    pub fn slots(&self) -> usize {
        self.nodes.len()
    }

    /// Returns true if the arena is empty (no allocated nodes).
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.allocated_count == 0
    }

    /// Drop every node and reset the free list.
    pub fn clear(&mut self) {
        self.nodes.clear();
        self.free_head = NULL_INDEX;
        self.allocated_count = 0;
    }

    /// Pre-fault the reserved but unused memory (warm-up routine).
    ///
    /// Touches every spare slot so the OS maps the pages before the first
    /// orders arrive.
    pub fn warm_up(&mut self) {
        for slot in self.nodes.spare_capacity_mut() {
            // Volatile write to prevent optimization
            unsafe {
                std::ptr::write_volatile(slot.as_mut_ptr().cast::<u8>(), 0);
            }
        }
    }
}

impl Default for Arena {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Arena {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Arena")
            .field("slots", &self.nodes.len())
            .field("allocated", &self.allocated_count)
            .field("free_head", &self.free_head)
            .finish()
    }
}
