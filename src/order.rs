//! Order record and modify request.

use crate::command::{OrderId, OrderType, Price, Quantity, Side};
use crate::error::BookError;

/// A single order and its fill state.
///
/// `remaining_quantity` only ever moves down, through [`Order::fill`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Order {
    order_type: OrderType,
    order_id: OrderId,
    side: Side,
    price: Price,
    initial_quantity: Quantity,
    remaining_quantity: Quantity,
}

impl Order {
    /// Create a fresh, unfilled order
    pub fn new(
        order_type: OrderType,
        order_id: OrderId,
        side: Side,
        price: Price,
        quantity: Quantity,
    ) -> Self {
        Self {
            order_type,
            order_id,
            side,
            price,
            initial_quantity: quantity,
            remaining_quantity: quantity,
        }
    }

    #[inline]
    pub fn order_id(&self) -> OrderId {
        self.order_id
    }

    #[inline]
    pub fn side(&self) -> Side {
        self.side
    }

    #[inline]
    pub fn price(&self) -> Price {
        self.price
    }

    #[inline]
    pub fn order_type(&self) -> OrderType {
        self.order_type
    }

    #[inline]
    pub fn initial_quantity(&self) -> Quantity {
        self.initial_quantity
    }

    #[inline]
    pub fn remaining_quantity(&self) -> Quantity {
        self.remaining_quantity
    }

    /// Quantity executed so far
    #[inline]
    pub fn filled_quantity(&self) -> Quantity {
        self.initial_quantity - self.remaining_quantity
    }

    /// Returns true once nothing remains to execute
    #[inline]
    pub fn is_filled(&self) -> bool {
        self.remaining_quantity == 0
    }

    /// Execute `quantity` against this order.
    ///
    /// # Errors
    /// [`BookError::Overfill`] if `quantity` exceeds the remaining quantity.
    /// The order is left untouched in that case.
    #[inline]
    pub fn fill(&mut self, quantity: Quantity) -> Result<(), BookError> {
        self.check_fill(quantity)?;
        self.remaining_quantity -= quantity;
        Ok(())
    }

    /// Whether `quantity` could be executed, without touching the order.
    #[inline]
    pub fn check_fill(&self, quantity: Quantity) -> Result<(), BookError> {
        if quantity > self.remaining_quantity {
            return Err(BookError::Overfill {
                order_id: self.order_id,
                requested: quantity,
                remaining: self.remaining_quantity,
            });
        }
        Ok(())
    }
}

/// Request to replace a resting order.
///
/// Not an order itself: the book turns it into one, carrying over the
/// original order's type.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct OrderModify {
    /// Order to replace
    pub order_id: OrderId,
    /// New side
    pub side: Side,
    /// New limit price
    pub price: Price,
    /// New quantity
    pub quantity: Quantity,
}

impl OrderModify {
    pub fn new(order_id: OrderId, side: Side, price: Price, quantity: Quantity) -> Self {
        Self {
            order_id,
            side,
            price,
            quantity,
        }
    }

    /// Build the replacement order with the given type
    pub fn to_order(&self, order_type: OrderType) -> Order {
        Order::new(order_type, self.order_id, self.side, self.price, self.quantity)
    }
}
