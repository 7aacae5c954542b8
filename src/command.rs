//! Boundary types and commands for the order book.
//!
//! Commands are the unit of work handed to the engine thread.
//! Everything else here is the vocabulary shared by every module.

use serde::{Deserialize, Serialize};

use crate::order::{Order, OrderModify};

/// Limit price in book currency ticks (signed)
pub type Price = i32;

/// Order quantity
pub type Quantity = u32;

/// Caller-assigned order identifier
pub type OrderId = u64;

/// Order side
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[repr(u8)]
pub enum Side {
    /// Buy side (bids)
    Buy = 0,
    /// Sell side (asks)
    Sell = 1,
}

impl Side {
    /// Returns the opposite side
    #[inline]
    pub const fn opposite(self) -> Self {
        match self {
            Side::Buy => Side::Sell,
            Side::Sell => Side::Buy,
        }
    }
}

/// Order lifetime
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[repr(u8)]
pub enum OrderType {
    /// Rests until canceled or fully filled
    GoodTillCancel = 0,
    /// Executes immediately; any unfilled residual is discarded
    FillAndKill = 1,
}

/// Input commands for the engine thread
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Command {
    /// Submit a new order
    Add(Order),
    /// Cancel a resting order
    Cancel(OrderId),
    /// Replace a resting order (cancel + add, keeping its order type)
    Modify(OrderModify),
}

impl Command {
    /// Id of the order this command targets
    pub fn order_id(&self) -> OrderId {
        match self {
            Command::Add(order) => order.order_id(),
            Command::Cancel(order_id) => *order_id,
            Command::Modify(modify) => modify.order_id,
        }
    }
}
