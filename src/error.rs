//! Error types for the order book.

use thiserror::Error;

use crate::command::{OrderId, Quantity};

/// Invariant violations raised by the book.
///
/// Unknown ids, duplicate submissions and unmatchable FillAndKill orders are
/// not errors; those paths are silent no-ops.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum BookError {
    #[error("order {order_id} cannot be filled for {requested}: only {remaining} remaining")]
    Overfill {
        order_id: OrderId,
        requested: Quantity,
        remaining: Quantity,
    },
}
