//! Level snapshot - per-price aggregate of the book for observers.

use crate::command::Price;

/// Total remaining quantity resting at one price
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct LevelInfo {
    pub price: Price,
    /// Sum of remaining quantities; wider than `Quantity` so it cannot overflow
    pub quantity: u64,
}

/// Levels of one side in priority order
pub type LevelInfos = Vec<LevelInfo>;

/// Immutable snapshot of both sides.
///
/// Bids run from highest to lowest price, asks from lowest to highest.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct OrderbookLevelInfos {
    bids: LevelInfos,
    asks: LevelInfos,
}

impl OrderbookLevelInfos {
    pub fn new(bids: LevelInfos, asks: LevelInfos) -> Self {
        Self { bids, asks }
    }

    #[inline]
    pub fn bids(&self) -> &LevelInfos {
        &self.bids
    }

    #[inline]
    pub fn asks(&self) -> &LevelInfos {
        &self.asks
    }

    pub fn best_bid(&self) -> Option<Price> {
        self.bids.first().map(|level| level.price)
    }

    pub fn best_ask(&self) -> Option<Price> {
        self.asks.first().map(|level| level.price)
    }

    pub fn total_bid_quantity(&self) -> u64 {
        self.bids.iter().map(|level| level.quantity).sum()
    }

    pub fn total_ask_quantity(&self) -> u64 {
        self.asks.iter().map(|level| level.quantity).sum()
    }
}
