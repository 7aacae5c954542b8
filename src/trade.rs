//! Trade records produced by the matching loop.

use crate::command::{OrderId, Price, Quantity};

/// One side of a trade
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct TradeInfo {
    pub order_id: OrderId,
    /// The leg's own resting price
    pub price: Price,
    pub quantity: Quantity,
}

/// A single match between the head bid and the head ask.
///
/// Each leg reports its own order's price; there is no single clearing price.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Trade {
    bid: TradeInfo,
    ask: TradeInfo,
}

impl Trade {
    pub fn new(bid: TradeInfo, ask: TradeInfo) -> Self {
        Self { bid, ask }
    }

    #[inline]
    pub fn bid(&self) -> &TradeInfo {
        &self.bid
    }

    #[inline]
    pub fn ask(&self) -> &TradeInfo {
        &self.ask
    }

    /// Executed quantity (identical on both legs)
    #[inline]
    pub fn quantity(&self) -> Quantity {
        self.bid.quantity
    }
}

/// Trades in the order they were generated
pub type Trades = Vec<Trade>;
