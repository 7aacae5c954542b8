//! Property Tests - book invariants over arbitrary command sequences.

use proptest::prelude::*;
use std::collections::HashMap;
use tick_book::{Command, Engine, Order, OrderModify, OrderType, Side, Trade};

fn side_strategy() -> impl Strategy<Value = Side> {
    prop_oneof![Just(Side::Buy), Just(Side::Sell)]
}

fn type_strategy() -> impl Strategy<Value = OrderType> {
    prop_oneof![4 => Just(OrderType::GoodTillCancel), 1 => Just(OrderType::FillAndKill)]
}

/// Small id and price ranges so duplicates, stale cancels and crosses are common
fn command_strategy() -> impl Strategy<Value = Command> {
    prop_oneof![
        6 => (type_strategy(), 0u64..40, side_strategy(), 95i32..105, 0u32..50)
            .prop_map(|(t, id, side, price, qty)| Command::Add(Order::new(t, id, side, price, qty))),
        2 => (0u64..40).prop_map(Command::Cancel),
        2 => (0u64..40, side_strategy(), 95i32..105, 1u32..50)
            .prop_map(|(id, side, price, qty)| Command::Modify(OrderModify::new(id, side, price, qty))),
    ]
}

fn apply_all(commands: &[Command]) -> (Engine, Vec<Trade>) {
    let mut engine = Engine::new(64);
    let mut trades = Vec::new();
    for cmd in commands {
        trades.extend(engine.process_command(cmd.clone()).unwrap());
    }
    (engine, trades)
}

proptest! {
    #[test]
    fn test_book_never_left_crossed(commands in prop::collection::vec(command_strategy(), 1..200)) {
        let mut engine = Engine::new(64);
        for cmd in commands {
            engine.process_command(cmd).unwrap();
            if let (Some(bid), Some(ask)) = (engine.best_bid(), engine.best_ask()) {
                prop_assert!(bid < ask, "crossed book: bid {} ask {}", bid, ask);
            }
        }
    }

    #[test]
    fn test_trade_legs_conserve_quantity(commands in prop::collection::vec(command_strategy(), 1..200)) {
        let (_, trades) = apply_all(&commands);
        for trade in &trades {
            prop_assert_eq!(trade.bid().quantity, trade.ask().quantity);
            prop_assert!(trade.quantity() > 0);
            prop_assert!(trade.bid().price >= trade.ask().price);
        }
    }

    #[test]
    fn test_size_matches_snapshot(commands in prop::collection::vec(command_strategy(), 1..200)) {
        let (engine, _) = apply_all(&commands);
        let book = &engine.matcher;

        let infos = book.level_infos();
        let counted: u32 = infos
            .bids()
            .iter()
            .map(|l| book.depth_at(Side::Buy, l.price).1)
            .chain(infos.asks().iter().map(|l| book.depth_at(Side::Sell, l.price).1))
            .sum();

        prop_assert_eq!(counted as usize, book.size());
        prop_assert_eq!(book.arena.allocated() as usize, book.size());
        prop_assert!(infos.bids().iter().all(|l| l.quantity > 0));
        prop_assert!(infos.asks().iter().all(|l| l.quantity > 0));
        prop_assert!(infos.bids().windows(2).all(|w| w[0].price > w[1].price));
        prop_assert!(infos.asks().windows(2).all(|w| w[0].price < w[1].price));
    }

    #[test]
    fn test_fill_and_kill_never_rests(commands in prop::collection::vec(command_strategy(), 1..200)) {
        let mut engine = Engine::new(64);
        for cmd in commands {
            engine.process_command(cmd).unwrap();
            let book = &engine.matcher;
            let infos = book.level_infos();
            let levels = infos
                .bids()
                .iter()
                .map(|l| (Side::Buy, l.price))
                .chain(infos.asks().iter().map(|l| (Side::Sell, l.price)));
            for (side, price) in levels {
                for order in book.orders_at(side, price) {
                    prop_assert_eq!(order.order_type(), OrderType::GoodTillCancel);
                }
            }
        }
    }

    #[test]
    fn test_executed_never_exceeds_submitted(commands in prop::collection::vec(command_strategy(), 1..200)) {
        let mut engine = Engine::new(64);
        // Quantity submitted under each id, summed over every admission
        let mut submitted: HashMap<u64, u64> = HashMap::new();
        let mut executed: HashMap<u64, u64> = HashMap::new();

        for cmd in commands {
            let before = engine.matcher.get_order(cmd.order_id()).is_some();
            let trades = engine.process_command(cmd.clone()).unwrap();
            match &cmd {
                Command::Add(order) if !before => {
                    *submitted.entry(order.order_id()).or_default() += order.initial_quantity() as u64;
                }
                Command::Modify(modify) if before => {
                    *submitted.entry(modify.order_id).or_default() += modify.quantity as u64;
                }
                _ => {}
            }
            for trade in trades {
                *executed.entry(trade.bid().order_id).or_default() += trade.quantity() as u64;
                *executed.entry(trade.ask().order_id).or_default() += trade.quantity() as u64;
            }
        }

        for (order_id, qty) in executed {
            prop_assert!(qty <= submitted.get(&order_id).copied().unwrap_or(0));
        }
    }

    #[test]
    fn test_duplicate_add_changes_nothing(
        commands in prop::collection::vec(command_strategy(), 1..100),
        side in side_strategy(),
        price in 95i32..105,
        qty in 1u32..50,
    ) {
        let (mut engine, _) = apply_all(&commands);
        let Some(resting_id) = (0u64..40).find(|id| engine.matcher.get_order(*id).is_some()) else {
            return Ok(());
        };

        let before = engine.state_hash();
        let trades = engine
            .process_command(Command::Add(Order::new(OrderType::GoodTillCancel, resting_id, side, price, qty)))
            .unwrap();

        prop_assert!(trades.is_empty());
        prop_assert_eq!(engine.state_hash(), before);
    }

    #[test]
    fn test_cancel_unknown_changes_nothing(commands in prop::collection::vec(command_strategy(), 1..100)) {
        let (mut engine, _) = apply_all(&commands);
        let before = engine.state_hash();

        let trades = engine.process_command(Command::Cancel(1_000_000)).unwrap();

        prop_assert!(trades.is_empty());
        prop_assert_eq!(engine.state_hash(), before);
    }
}
