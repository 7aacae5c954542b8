//! # Tick-Book
//!
//! A single-instrument, in-memory limit order book with price-time priority
//! matching.
//!
//! ## Design Principles
//!
//! - **Single-Writer**: One thread owns the book exclusively (no locks)
//! - **Arena Ownership**: Orders live in one slab; levels and the order
//!   index hold `u32` handles, so removal never leaves a dangling reference
//! - **O(1) Cancel**: Price levels are doubly-linked through the arena
//! - **Silent No-Ops**: Stale or duplicate commands never raise errors
//!
//! ## Architecture
//!
//! ```text
//! [Producers] --> [SPSC Ring Buffer] --> [Engine Thread (Pinned)]
//!                                                |
//!                                          [Trade Ring]
//! ```
//!
//! ## Example
//!
//! ```rust
//! use tick_book::{MatchingEngine, Order, OrderType, Side};
//!
//! let mut book = MatchingEngine::new();
//! book.add_order(Order::new(OrderType::GoodTillCancel, 1, Side::Buy, 100, 10)).unwrap();
//! let trades = book.add_order(Order::new(OrderType::GoodTillCancel, 2, Side::Sell, 100, 20)).unwrap();
//!
//! assert_eq!(trades.len(), 1);
//! assert_eq!(trades[0].quantity(), 10);
//! assert_eq!(book.size(), 1);
//! ```

pub mod arena;
pub mod command;
pub mod engine;
pub mod error;
pub mod level_info;
pub mod matching;
pub mod order;
pub mod order_book;
pub mod price_level;
pub mod replay;
pub mod trade;

// Re-exports for convenience
pub use arena::{Arena, ArenaIndex, OrderNode, NULL_INDEX};
pub use command::{Command, OrderId, OrderType, Price, Quantity, Side};
pub use engine::Engine;
pub use error::BookError;
pub use level_info::{LevelInfo, LevelInfos, OrderbookLevelInfos};
pub use matching::MatchingEngine;
pub use order::{Order, OrderModify};
pub use order_book::{OrderBook, OrderEntry};
pub use price_level::PriceLevel;
pub use replay::{read_commands, ReplayError, ReplayRow};
pub use trade::{Trade, TradeInfo, Trades};
