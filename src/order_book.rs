//! Order Book - price-level index and order index.
//!
//! Bids and asks are kept in `BTreeMap`s keyed by price, so the best level
//! on either side and the level snapshot in priority order come straight
//! from the map's ordering. The order index maps an order id to the copy of
//! everything needed to find it again: its arena handle, side and price.

use std::collections::BTreeMap;

use rustc_hash::FxHashMap;

use crate::arena::{Arena, ArenaIndex};
use crate::command::{OrderId, Price, Quantity, Side};
use crate::price_level::PriceLevel;

/// Mapping from OrderId to its locator entry for O(1) lookup
pub type OrderMap = FxHashMap<OrderId, OrderEntry>;

/// Locator for a resting order.
///
/// `Copy`, so callers always hold their own copy of the fields and never
/// read through a map slot that may already be gone.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct OrderEntry {
    /// Index in the arena
    pub arena_index: ArenaIndex,
    /// Order side (selects the book side)
    pub side: Side,
    /// Order price (selects the PriceLevel)
    pub price: Price,
}

/// Price-ordered levels for both sides plus the order index.
pub struct OrderBook {
    /// Bid price levels; best bid is the last key
    bids: BTreeMap<Price, PriceLevel>,
    /// Ask price levels; best ask is the first key
    asks: BTreeMap<Price, PriceLevel>,
    /// Order lookup map: OrderId -> OrderEntry
    orders: OrderMap,
}

impl OrderBook {
    /// Create a new empty order book
    pub fn new() -> Self {
        Self {
            bids: BTreeMap::new(),
            asks: BTreeMap::new(),
            orders: FxHashMap::default(),
        }
    }

    /// Create a new order book with a pre-sized order index
    pub fn with_capacity(orders: usize) -> Self {
        Self {
            bids: BTreeMap::new(),
            asks: BTreeMap::new(),
            orders: FxHashMap::with_capacity_and_hasher(orders, Default::default()),
        }
    }

    // ========================================================================
    // Best Price Access
    // ========================================================================

    /// Get the best bid price (highest buy price)
    #[inline]
    pub fn best_bid(&self) -> Option<Price> {
        self.bids.last_key_value().map(|(&price, _)| price)
    }

    /// Get the best ask price (lowest sell price)
    #[inline]
    pub fn best_ask(&self) -> Option<Price> {
        self.asks.first_key_value().map(|(&price, _)| price)
    }

    /// Get the best price on a given side
    #[inline]
    pub fn best_price(&self, side: Side) -> Option<Price> {
        match side {
            Side::Buy => self.best_bid(),
            Side::Sell => self.best_ask(),
        }
    }

    /// Head order of the best level on a side
    #[inline]
    pub fn best_head(&self, side: Side) -> Option<ArenaIndex> {
        let level = match side {
            Side::Buy => self.bids.last_key_value(),
            Side::Sell => self.asks.first_key_value(),
        };
        level.and_then(|(_, level)| level.peek_head())
    }

    // ========================================================================
    // Level Access
    // ========================================================================

    #[inline]
    fn levels(&self, side: Side) -> &BTreeMap<Price, PriceLevel> {
        match side {
            Side::Buy => &self.bids,
            Side::Sell => &self.asks,
        }
    }

    #[inline]
    fn levels_mut(&mut self, side: Side) -> &mut BTreeMap<Price, PriceLevel> {
        match side {
            Side::Buy => &mut self.bids,
            Side::Sell => &mut self.asks,
        }
    }

    /// Get a price level (immutable)
    #[inline]
    pub fn get_level(&self, side: Side, price: Price) -> Option<&PriceLevel> {
        self.levels(side).get(&price)
    }

    /// Head order of the level at `price`
    #[inline]
    pub fn head(&self, side: Side, price: Price) -> Option<ArenaIndex> {
        self.get_level(side, price).and_then(PriceLevel::peek_head)
    }

    /// Levels of one side in priority order (bids descending, asks ascending)
    pub fn iter_levels(&self, side: Side) -> Box<dyn Iterator<Item = (Price, &PriceLevel)> + '_> {
        let levels = self.levels(side).iter().map(|(&price, level)| (price, level));
        match side {
            Side::Buy => Box::new(levels.rev()),
            Side::Sell => Box::new(levels),
        }
    }

    // ========================================================================
    // Order Management
    // ========================================================================

    /// Add an order to the tail of its price level, creating the level.
    ///
    /// # Returns
    /// `true` if order was added, `false` if order_id already exists
    pub fn insert(
        &mut self,
        arena: &mut Arena,
        order_id: OrderId,
        side: Side,
        price: Price,
        arena_index: ArenaIndex,
    ) -> bool {
        if self.orders.contains_key(&order_id) {
            return false;
        }

        self.orders.insert(order_id, OrderEntry {
            arena_index,
            side,
            price,
        });

        self.levels_mut(side)
            .entry(price)
            .or_insert_with(PriceLevel::new)
            .push_back(arena, arena_index);

        true
    }

    /// Unlink an order from its level and drop its index entry.
    ///
    /// The entry is copied out before anything is removed; the level goes
    /// first, then the index entry. The arena slot is NOT freed.
    ///
    /// # Returns
    /// The removed order's entry, or `None` if not found
    pub fn remove(&mut self, arena: &mut Arena, order_id: OrderId) -> Option<OrderEntry> {
        let entry = *self.orders.get(&order_id)?;

        let levels = self.levels_mut(entry.side);
        if let Some(level) = levels.get_mut(&entry.price) {
            if level.remove(arena, entry.arena_index) {
                levels.remove(&entry.price);
            }
        }

        self.orders.remove(&order_id);
        Some(entry)
    }

    /// Pop the head order of a level and drop its index entry.
    ///
    /// Used by the matching loop once the head is fully filled. Removes the
    /// level if it empties. The arena slot is NOT freed.
    pub fn pop_head(&mut self, arena: &mut Arena, side: Side, price: Price) -> Option<ArenaIndex> {
        let levels = self.levels_mut(side);
        let level = levels.get_mut(&price)?;
        let index = level.pop_front(arena)?;
        if level.is_empty() {
            levels.remove(&price);
        }

        self.orders.remove(&arena.get(index).order.order_id());
        Some(index)
    }

    /// Account for a fill against an order queued at this level
    #[inline]
    pub fn record_fill(&mut self, side: Side, price: Price, qty: Quantity) {
        if let Some(level) = self.levels_mut(side).get_mut(&price) {
            level.subtract_qty(qty);
        }
    }

    /// Look up an order by ID.
    #[inline]
    pub fn get_order(&self, order_id: OrderId) -> Option<&OrderEntry> {
        self.orders.get(&order_id)
    }

    /// Check if an order exists.
    #[inline]
    pub fn contains_order(&self, order_id: OrderId) -> bool {
        self.orders.contains_key(&order_id)
    }

    // ========================================================================
    // Utility Methods
    // ========================================================================

    /// Get the total number of orders in the book
    pub fn order_count(&self) -> usize {
        self.orders.len()
    }

    /// Get the number of bid levels
    pub fn bid_levels(&self) -> usize {
        self.bids.len()
    }

    /// Get the number of ask levels
    pub fn ask_levels(&self) -> usize {
        self.asks.len()
    }

    /// Check if the book is empty
    pub fn is_empty(&self) -> bool {
        self.orders.is_empty()
    }

    /// Clear all orders from the book
    pub fn clear(&mut self) {
        self.bids.clear();
        self.asks.clear();
        self.orders.clear();
    }

    /// Calculate spread (best_ask - best_bid)
    pub fn spread(&self) -> Option<i64> {
        match (self.best_bid(), self.best_ask()) {
            (Some(bid), Some(ask)) if ask > bid => Some(ask as i64 - bid as i64),
            _ => None,
        }
    }

    /// Get depth at a price level: (total quantity, order count)
    pub fn depth_at(&self, side: Side, price: Price) -> (u64, u32) {
        self.get_level(side, price)
            .map(|l| (l.total_qty(), l.count()))
            .unwrap_or((0, 0))
    }
}

impl Default for OrderBook {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for OrderBook {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OrderBook")
            .field("best_bid", &self.best_bid())
            .field("best_ask", &self.best_ask())
            .field("bid_levels", &self.bids.len())
            .field("ask_levels", &self.asks.len())
            .field("order_count", &self.orders.len())
            .finish()
    }
}
