//! Engine - command dispatch and the single-consumer matching loop.
//!
//! Every mutation of a book goes through one thread. Hosts with several
//! producers funnel their commands into the ring consumed by [`Engine::run`],
//! which keeps add/cancel/modify strictly linearised.

use tracing::error;

use crate::command::{Command, Price};
use crate::error::BookError;
use crate::level_info::OrderbookLevelInfos;
use crate::matching::MatchingEngine;
use crate::trade::Trades;

/// Owns one book and applies commands to it in arrival order.
pub struct Engine {
    /// The underlying book
    pub matcher: MatchingEngine,
}

impl Engine {
    /// Create a new engine sized for `capacity` resting orders.
    pub fn new(capacity: u32) -> Self {
        Self {
            matcher: MatchingEngine::with_capacity(capacity),
        }
    }

    /// Run the engine event loop.
    ///
    /// Drains `input`, pushes every resulting trade to `output` and returns
    /// once the command producer has been dropped and the ring is empty.
    ///
    /// # Arguments
    /// * `input` - Consumer end of the command ring buffer
    /// * `output` - Producer end of the trade ring buffer
    /// * `pin_to_core` - Whether to pin to the last available CPU core
    #[cfg(feature = "runtime")]
    pub fn run(
        &mut self,
        input: &mut rtrb::Consumer<Command>,
        output: &mut rtrb::Producer<crate::trade::Trade>,
        pin_to_core: bool,
    ) {
        use tracing::{info, warn};

        if pin_to_core {
            self.pin_to_core();
        }

        self.warm_up();
        info!("matching loop started");

        let mut dropped = 0u64;
        loop {
            while let Ok(cmd) = input.pop() {
                let Ok(trades) = self.process_command(cmd) else {
                    continue;
                };
                for trade in trades {
                    if output.push(trade).is_err() {
                        dropped += 1;
                        warn!(dropped, "trade output ring full, trade dropped");
                    }
                }
            }

            if input.is_abandoned() && input.is_empty() {
                break;
            }
            std::hint::spin_loop();
        }

        info!(resting = self.order_count(), dropped, "matching loop stopped");
    }

    /// Apply a single command and return the trades it produced.
    ///
    /// This is the main entry point for synchronous usage (testing, benchmarks).
    ///
    /// # Errors
    /// Propagates [`BookError`] after logging it; the book is not usable
    /// for further matching once an invariant has been broken.
    #[inline]
    pub fn process_command(&mut self, cmd: Command) -> Result<Trades, BookError> {
        let result = match cmd {
            Command::Add(order) => self.matcher.add_order(order),
            Command::Cancel(order_id) => {
                self.matcher.cancel_order(order_id);
                Ok(Trades::new())
            }
            Command::Modify(modify) => self.matcher.modify_order(modify),
        };

        if let Err(err) = &result {
            error!(%err, "book invariant violated");
        }
        result
    }

    /// Pin the current thread to the last available CPU core.
    ///
    /// The last core is typically isolated from OS interrupts.
    pub fn pin_to_core(&self) {
        if let Some(core_ids) = core_affinity::get_core_ids() {
            if let Some(last_core) = core_ids.last() {
                core_affinity::set_for_current(*last_core);
            }
        }
    }

    /// Warm up the engine by pre-faulting memory pages.
    pub fn warm_up(&mut self) {
        self.matcher.warm_up();
    }

    /// Get the best bid price.
    #[inline]
    pub fn best_bid(&self) -> Option<Price> {
        self.matcher.best_bid()
    }

    /// Get the best ask price.
    #[inline]
    pub fn best_ask(&self) -> Option<Price> {
        self.matcher.best_ask()
    }

    /// Get the spread.
    #[inline]
    pub fn spread(&self) -> Option<i64> {
        self.matcher.spread()
    }

    /// Get total order count.
    #[inline]
    pub fn order_count(&self) -> usize {
        self.matcher.size()
    }

    /// Snapshot of both sides.
    #[inline]
    pub fn level_infos(&self) -> OrderbookLevelInfos {
        self.matcher.level_infos()
    }

    /// Compute state hash for determinism testing.
    #[inline]
    pub fn state_hash(&self) -> u64 {
        self.matcher.state_hash()
    }
}

impl Default for Engine {
    fn default() -> Self {
        Self::new(1_000_000) // 1M orders default capacity
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::{OrderType, Side};
    use crate::order::{Order, OrderModify};

    fn add(order_id: u64, side: Side, price: Price, qty: u32) -> Command {
        Command::Add(Order::new(OrderType::GoodTillCancel, order_id, side, price, qty))
    }

    #[test]
    fn test_engine_creation() {
        let engine = Engine::new(10000);
        assert_eq!(engine.order_count(), 0);
        assert_eq!(engine.best_bid(), None);
        assert_eq!(engine.best_ask(), None);
    }

    #[test]
    fn test_engine_process_add() {
        let mut engine = Engine::new(1000);

        let trades = engine.process_command(add(1, Side::Buy, 100, 10)).unwrap();

        assert!(trades.is_empty());
        assert_eq!(engine.order_count(), 1);
        assert_eq!(engine.best_bid(), Some(100));
    }

    #[test]
    fn test_engine_process_cancel() {
        let mut engine = Engine::new(1000);
        engine.process_command(add(1, Side::Buy, 100, 10)).unwrap();

        let trades = engine.process_command(Command::Cancel(1)).unwrap();

        assert!(trades.is_empty());
        assert_eq!(engine.order_count(), 0);
    }

    #[test]
    fn test_engine_process_modify() {
        let mut engine = Engine::new(1000);
        engine.process_command(add(1, Side::Sell, 105, 10)).unwrap();
        engine.process_command(add(2, Side::Buy, 100, 10)).unwrap();

        let trades = engine
            .process_command(Command::Modify(OrderModify::new(2, Side::Buy, 105, 10)))
            .unwrap();

        assert_eq!(trades.len(), 1);
        assert_eq!(engine.order_count(), 0);
    }

    #[test]
    fn test_engine_state_hash_determinism() {
        let mut engine1 = Engine::new(1000);
        let mut engine2 = Engine::new(1000);

        for i in 0..100u64 {
            let cmd = add(
                i,
                if i % 2 == 0 { Side::Buy } else { Side::Sell },
                100 + (i % 10) as Price,
                10,
            );
            engine1.process_command(cmd.clone()).unwrap();
            engine2.process_command(cmd).unwrap();
        }

        assert_eq!(engine1.state_hash(), engine2.state_hash());
    }

    #[test]
    fn test_engine_warm_up() {
        let mut engine = Engine::new(1000);
        engine.warm_up(); // Should not panic
    }

    #[cfg(feature = "runtime")]
    #[test]
    fn test_run_drains_queue_and_stops() {
        use rtrb::RingBuffer;

        let (mut cmd_tx, mut cmd_rx) = RingBuffer::<Command>::new(64);
        let (mut trade_tx, mut trade_rx) = RingBuffer::new(64);

        cmd_tx.push(add(1, Side::Sell, 100, 10)).unwrap();
        cmd_tx.push(add(2, Side::Buy, 100, 4)).unwrap();
        cmd_tx.push(add(3, Side::Buy, 100, 6)).unwrap();
        drop(cmd_tx);

        let handle = std::thread::spawn(move || {
            let mut engine = Engine::new(64);
            engine.run(&mut cmd_rx, &mut trade_tx, false);
            engine.order_count()
        });

        assert_eq!(handle.join().unwrap(), 0);

        let mut executed = Vec::new();
        while let Ok(trade) = trade_rx.pop() {
            executed.push((trade.bid().order_id, trade.quantity()));
        }
        assert_eq!(executed, vec![(2, 4), (3, 6)]);
    }
}
