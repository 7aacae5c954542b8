//! Matching Engine - the book's public operations and the matching loop.
//!
//! An incoming order is always inserted first; the matching loop then
//! crosses the best bid against the best ask until the book is no longer
//! crossed. It is the only place trades are produced.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

use tracing::{debug, trace};

use crate::arena::{Arena, ArenaIndex};
use crate::command::{OrderId, OrderType, Price, Quantity, Side};
use crate::error::BookError;
use crate::level_info::{LevelInfo, LevelInfos, OrderbookLevelInfos};
use crate::order::{Order, OrderModify};
use crate::order_book::OrderBook;
use crate::trade::{Trade, TradeInfo, Trades};

/// A single-instrument limit order book with price-time priority.
pub struct MatchingEngine {
    /// Owner of every resting order record
    pub arena: Arena,
    /// Price levels and order index
    pub book: OrderBook,
}

impl MatchingEngine {
    /// Create an empty book
    pub fn new() -> Self {
        Self {
            arena: Arena::new(),
            book: OrderBook::new(),
        }
    }

    /// Create an empty book sized for `capacity` resting orders
    pub fn with_capacity(capacity: u32) -> Self {
        Self {
            arena: Arena::with_capacity(capacity),
            book: OrderBook::with_capacity(capacity as usize),
        }
    }

    /// Whether an incoming order of `side` at `price` would execute at all.
    pub fn can_match(&self, side: Side, price: Price) -> bool {
        let Some(best) = self.book.best_price(side.opposite()) else {
            return false;
        };

        match side {
            // Buyer willing to pay >= lowest ask
            Side::Buy => price >= best,
            // Seller willing to accept <= highest bid
            Side::Sell => price <= best,
        }
    }

    /// Submit an order and return the trades it caused.
    ///
    /// Duplicate ids, zero quantities and FillAndKill orders that cannot
    /// match are ignored and yield no trades.
    ///
    /// # Errors
    /// Only on an internal invariant violation; see [`BookError`].
    pub fn add_order(&mut self, order: Order) -> Result<Trades, BookError> {
        let order_id = order.order_id();

        if self.book.contains_order(order_id) {
            debug!(order_id, "duplicate order id ignored");
            return Ok(Trades::new());
        }

        if order.initial_quantity() == 0 {
            debug!(order_id, "zero quantity order ignored");
            return Ok(Trades::new());
        }

        if order.order_type() == OrderType::FillAndKill && !self.can_match(order.side(), order.price()) {
            debug!(order_id, price = order.price(), "fill-and-kill order cannot match, rejected");
            return Ok(Trades::new());
        }

        let side = order.side();
        let price = order.price();
        let arena_index = self.arena.alloc(order);
        if !self.book.insert(&mut self.arena, order_id, side, price, arena_index) {
            self.arena.free(arena_index);
            debug!(order_id, "order id already indexed, slot released");
            return Ok(Trades::new());
        }

        self.match_orders()
    }

    /// Cancel a resting order.
    ///
    /// # Returns
    /// The removed order record, or `None` if no order had that id.
    pub fn cancel_order(&mut self, order_id: OrderId) -> Option<Order> {
        let Some(entry) = self.book.remove(&mut self.arena, order_id) else {
            debug!(order_id, "cancel for unknown order ignored");
            return None;
        };

        Some(self.arena.free(entry.arena_index))
    }

    /// Replace a resting order, keeping its order type.
    ///
    /// The replacement joins the tail of its level, losing time priority.
    pub fn modify_order(&mut self, modify: OrderModify) -> Result<Trades, BookError> {
        let Some(entry) = self.book.get_order(modify.order_id).copied() else {
            debug!(order_id = modify.order_id, "modify for unknown order ignored");
            return Ok(Trades::new());
        };

        let order_type = self.arena.get(entry.arena_index).order.order_type();
        self.cancel_order(modify.order_id);
        self.add_order(modify.to_order(order_type))
    }

    /// Cross the book until best bid < best ask, then kill any FillAndKill
    /// order left at the head of either best level.
    fn match_orders(&mut self) -> Result<Trades, BookError> {
        let mut trades = Trades::new();

        loop {
            let (Some(bid_price), Some(ask_price)) = (self.book.best_bid(), self.book.best_ask()) else {
                break;
            };

            if bid_price < ask_price {
                break;
            }

            self.match_levels(bid_price, ask_price, &mut trades)?;
        }

        self.kill_resting_fill_and_kill(Side::Buy);
        self.kill_resting_fill_and_kill(Side::Sell);

        Ok(trades)
    }

    /// Match head against head at one bid level and one ask level until
    /// either level is exhausted.
    fn match_levels(
        &mut self,
        bid_price: Price,
        ask_price: Price,
        trades: &mut Trades,
    ) -> Result<(), BookError> {
        while let (Some(bid_idx), Some(ask_idx)) = (
            self.book.head(Side::Buy, bid_price),
            self.book.head(Side::Sell, ask_price),
        ) {
            let quantity = self
                .arena
                .get(bid_idx)
                .order
                .remaining_quantity()
                .min(self.arena.get(ask_idx).order.remaining_quantity());

            // Validate both legs before either order is touched
            self.arena.get(bid_idx).order.check_fill(quantity)?;
            self.arena.get(ask_idx).order.check_fill(quantity)?;

            let (bid, bid_filled) = self.fill(bid_idx, quantity)?;
            let (ask, ask_filled) = self.fill(ask_idx, quantity)?;
            self.book.record_fill(Side::Buy, bid_price, quantity);
            self.book.record_fill(Side::Sell, ask_price, quantity);

            trace!(bid = bid.order_id, ask = ask.order_id, quantity, "trade");
            trades.push(Trade::new(bid, ask));

            if bid_filled {
                self.release_head(Side::Buy, bid_price);
            }
            if ask_filled {
                self.release_head(Side::Sell, ask_price);
            }
        }

        Ok(())
    }

    /// Fill a queued order and describe the fill as a trade leg.
    #[inline]
    fn fill(&mut self, index: ArenaIndex, quantity: Quantity) -> Result<(TradeInfo, bool), BookError> {
        let order = &mut self.arena.get_mut(index).order;
        order.fill(quantity)?;

        let leg = TradeInfo {
            order_id: order.order_id(),
            price: order.price(),
            quantity,
        };
        Ok((leg, order.is_filled()))
    }

    /// Pop a fully filled head order out of the book and the arena.
    #[inline]
    fn release_head(&mut self, side: Side, price: Price) {
        if let Some(index) = self.book.pop_head(&mut self.arena, side, price) {
            self.arena.free(index);
        }
    }

    fn kill_resting_fill_and_kill(&mut self, side: Side) {
        let Some(index) = self.book.best_head(side) else {
            return;
        };

        let order = &self.arena.get(index).order;
        if order.order_type() == OrderType::FillAndKill {
            let order_id = order.order_id();
            if let Some(killed) = self.cancel_order(order_id) {
                debug!(
                    order_id,
                    filled = killed.filled_quantity(),
                    killed = killed.remaining_quantity(),
                    "fill-and-kill residual canceled"
                );
            }
        }
    }

    // ========================================================================
    // Read Access
    // ========================================================================

    /// Number of resting orders
    #[inline]
    pub fn size(&self) -> usize {
        self.book.order_count()
    }

    /// Snapshot of total remaining quantity per price level.
    pub fn level_infos(&self) -> OrderbookLevelInfos {
        let side_infos = |side: Side| -> LevelInfos {
            self.book
                .iter_levels(side)
                .map(|(price, level)| LevelInfo {
                    price,
                    quantity: level.total_qty(),
                })
                .collect()
        };

        OrderbookLevelInfos::new(side_infos(Side::Buy), side_infos(Side::Sell))
    }

    /// Look up a resting order
    pub fn get_order(&self, order_id: OrderId) -> Option<&Order> {
        self.book
            .get_order(order_id)
            .map(|entry| &self.arena.get(entry.arena_index).order)
    }

    /// Orders resting at one level, oldest first
    pub fn orders_at(&self, side: Side, price: Price) -> Vec<&Order> {
        self.book
            .get_level(side, price)
            .map(|level| {
                level
                    .iter(&self.arena)
                    .map(|index| &self.arena.get(index).order)
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Get the best bid price
    #[inline]
    pub fn best_bid(&self) -> Option<Price> {
        self.book.best_bid()
    }

    /// Get the best ask price
    #[inline]
    pub fn best_ask(&self) -> Option<Price> {
        self.book.best_ask()
    }

    /// Get the spread
    #[inline]
    pub fn spread(&self) -> Option<i64> {
        self.book.spread()
    }

    /// Get depth at a price level: (total quantity, order count)
    #[inline]
    pub fn depth_at(&self, side: Side, price: Price) -> (u64, u32) {
        self.book.depth_at(side, price)
    }

    /// Warm up the engine (pre-fault memory pages)
    pub fn warm_up(&mut self) {
        self.arena.warm_up();
    }

    /// Drop every resting order
    pub fn clear(&mut self) {
        self.book.clear();
        self.arena.clear();
    }

    /// Compute a hash of the current state (for determinism testing)
    pub fn state_hash(&self) -> u64 {
        let mut hasher = DefaultHasher::new();

        self.level_infos().hash(&mut hasher);
        for side in [Side::Buy, Side::Sell] {
            for (price, _) in self.book.iter_levels(side) {
                for order in self.orders_at(side, price) {
                    (order.order_id(), order.remaining_quantity()).hash(&mut hasher);
                }
            }
        }
        self.size().hash(&mut hasher);
        self.arena.allocated().hash(&mut hasher);

        hasher.finish()
    }
}

impl Default for MatchingEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for MatchingEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MatchingEngine")
            .field("book", &self.book)
            .field("arena", &self.arena)
            .finish()
    }
}
