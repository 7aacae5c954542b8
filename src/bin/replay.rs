use clap::Parser;
use rust_decimal::Decimal;
use std::fs::File;
use std::io::BufReader;
use std::path::PathBuf;
use tick_book::{read_commands, Engine, LevelInfo};
use tracing_subscriber::EnvFilter;

/// Replay a CSV file of add / modify / cancel commands through one book
#[derive(Parser, Debug)]
#[command(name = "replay")]
struct Args {
    /// CSV file with columns action,order_id,side,order_type,price,quantity
    input: PathBuf,

    /// Price increment; decimal prices are divided by this to get ticks
    #[arg(long, default_value = "0.01")]
    tick_size: Decimal,

    /// Pre-sized order capacity
    #[arg(long, default_value_t = 100_000)]
    capacity: u32,

    /// Levels per side to print at the end
    #[arg(long, default_value_t = 10)]
    depth: usize,

    /// Print every trade as it happens
    #[arg(long)]
    trades: bool,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args = Args::parse();

    let file = File::open(&args.input)?;
    let commands = read_commands(BufReader::new(file), args.tick_size)?;
    tracing::info!(commands = commands.len(), input = %args.input.display(), "replaying");

    let mut engine = Engine::new(args.capacity);
    let mut trade_count = 0usize;
    let mut volume = 0u64;

    for cmd in commands {
        for trade in engine.process_command(cmd)? {
            trade_count += 1;
            volume += trade.quantity() as u64;
            if args.trades {
                println!(
                    "TRADE qty={:<8} bid={}@{} ask={}@{}",
                    trade.quantity(),
                    trade.bid().order_id,
                    trade.bid().price,
                    trade.ask().order_id,
                    trade.ask().price,
                );
            }
        }
    }

    let infos = engine.level_infos();
    println!("\n=== Replay Summary ===");
    println!("Trades:   {}", trade_count);
    println!("Volume:   {}", volume);
    println!("Resting:  {}", engine.order_count());
    println!("Spread:   {:?}", engine.spread());
    println!("\n{:>12} | {:<12}", "BID", "ASK");

    let row = |level: Option<&LevelInfo>| {
        level
            .map(|l| format!("{}x{}", l.quantity, l.price))
            .unwrap_or_default()
    };
    for i in 0..args.depth {
        let (bid, ask) = (infos.bids().get(i), infos.asks().get(i));
        if bid.is_none() && ask.is_none() {
            break;
        }
        println!("{:>12} | {:<12}", row(bid), row(ask));
    }

    Ok(())
}
