//! Replay input - CSV command rows decoded into engine commands.
//!
//! One row per command:
//!
//! ```text
//! action,order_id,side,order_type,price,quantity
//! add,1,buy,good_till_cancel,100.25,10
//! modify,1,buy,,100.50,8
//! cancel,1,,,,
//! ```
//!
//! Prices are decimal and converted to integer ticks with the tick size
//! given to [`ReplayRow::to_command`].

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::Deserialize;
use thiserror::Error;

use crate::command::{Command, OrderId, OrderType, Price, Quantity, Side};
use crate::order::{Order, OrderModify};

/// Errors raised while decoding a replay file
#[derive(Error, Debug)]
pub enum ReplayError {
    #[error("row {row}: missing {field}")]
    MissingField { row: usize, field: &'static str },

    #[error("row {row}: unknown action {action:?}")]
    UnknownAction { row: usize, action: String },

    #[error("row {row}: price {price} is not a multiple of tick size {tick_size}")]
    OffTick {
        row: usize,
        price: Decimal,
        tick_size: Decimal,
    },

    #[error("row {row}: price {price} is out of range")]
    PriceOutOfRange { row: usize, price: Decimal },

    #[error("row {row}: quantity {quantity} is out of range")]
    QuantityOutOfRange { row: usize, quantity: Decimal },

    #[error("tick size must be positive, got {0}")]
    InvalidTickSize(Decimal),

    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),
}

/// A raw CSV row
#[derive(Debug, Clone, Deserialize)]
pub struct ReplayRow {
    pub action: String,
    pub order_id: OrderId,
    pub side: Option<Side>,
    pub order_type: Option<OrderType>,
    #[serde(default, with = "rust_decimal::serde::str_option")]
    pub price: Option<Decimal>,
    #[serde(default, with = "rust_decimal::serde::str_option")]
    pub quantity: Option<Decimal>,
}

impl ReplayRow {
    /// Convert the row into a command.
    ///
    /// `row` is only used for error messages. Orders without an explicit
    /// `order_type` are `GoodTillCancel`.
    pub fn to_command(&self, row: usize, tick_size: Decimal) -> Result<Command, ReplayError> {
        if tick_size <= Decimal::ZERO {
            return Err(ReplayError::InvalidTickSize(tick_size));
        }

        match self.action.trim().to_ascii_lowercase().as_str() {
            "add" => {
                let order_type = self.order_type.unwrap_or(OrderType::GoodTillCancel);
                Ok(Command::Add(Order::new(
                    order_type,
                    self.order_id,
                    self.side(row)?,
                    self.ticks(row, tick_size)?,
                    self.quantity(row)?,
                )))
            }
            "modify" => Ok(Command::Modify(OrderModify::new(
                self.order_id,
                self.side(row)?,
                self.ticks(row, tick_size)?,
                self.quantity(row)?,
            ))),
            "cancel" => Ok(Command::Cancel(self.order_id)),
            other => Err(ReplayError::UnknownAction {
                row,
                action: other.to_string(),
            }),
        }
    }

    fn side(&self, row: usize) -> Result<Side, ReplayError> {
        self.side.ok_or(ReplayError::MissingField { row, field: "side" })
    }

    fn ticks(&self, row: usize, tick_size: Decimal) -> Result<Price, ReplayError> {
        let price = self.price.ok_or(ReplayError::MissingField { row, field: "price" })?;

        let ticks = price
            .checked_div(tick_size)
            .ok_or(ReplayError::PriceOutOfRange { row, price })?;
        if ticks.fract() != Decimal::ZERO {
            return Err(ReplayError::OffTick { row, price, tick_size });
        }

        ticks
            .to_i32()
            .ok_or(ReplayError::PriceOutOfRange { row, price })
    }

    fn quantity(&self, row: usize) -> Result<Quantity, ReplayError> {
        let quantity = self
            .quantity
            .ok_or(ReplayError::MissingField { row, field: "quantity" })?;

        if quantity.fract() != Decimal::ZERO {
            return Err(ReplayError::QuantityOutOfRange { row, quantity });
        }
        quantity
            .to_u32()
            .ok_or(ReplayError::QuantityOutOfRange { row, quantity })
    }
}

/// Decode every row of a CSV source into commands, in file order.
pub fn read_commands<R: std::io::Read>(
    reader: R,
    tick_size: Decimal,
) -> Result<Vec<Command>, ReplayError> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader);

    csv_reader
        .deserialize::<ReplayRow>()
        .enumerate()
        .map(|(i, row)| row?.to_command(i + 1, tick_size))
        .collect()
}
