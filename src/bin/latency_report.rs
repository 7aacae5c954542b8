use clap::Parser;
use hdrhistogram::Histogram;
use std::time::{Duration, Instant};
use tick_book::{Command, Engine, Order, OrderType, Price, Side};
use tracing_subscriber::EnvFilter;

/// Latency histogram of add / cancel / match on a single book
#[derive(Parser, Debug)]
#[command(name = "latency-report")]
struct Args {
    /// Number of commands to time
    #[arg(long, default_value_t = 1_000_000)]
    iterations: u64,

    /// Pre-sized order capacity
    #[arg(long, default_value_t = 100_000)]
    capacity: u32,

    /// Every Nth command is a cancel of an older order
    #[arg(long, default_value_t = 4)]
    cancel_every: u64,

    /// Pin the benchmark thread to the last core
    #[arg(long)]
    pin: bool,
}

/// Record one sample; outliers past the histogram bound land in the top bucket
fn record_latency(histogram: &mut Histogram<u64>, elapsed: Duration) {
    histogram.saturating_record(elapsed.as_nanos().min(u64::MAX as u128) as u64);
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args = Args::parse();
    tracing::info!(?args, "preparing latency benchmark");

    let mut engine = Engine::new(args.capacity);
    if args.pin {
        engine.pin_to_core();
    }
    engine.warm_up();

    let mut histogram = Histogram::<u64>::new_with_bounds(1, 100_000, 3)?;
    let mut total_duration = Duration::ZERO;
    let mut trades = 0usize;

    for order_id in 1..=args.iterations {
        let cmd = if args.cancel_every > 0 && order_id % args.cancel_every == 0 {
            Command::Cancel(order_id / 2)
        } else {
            let side = if order_id % 2 == 0 { Side::Buy } else { Side::Sell };
            // Overlapping bands so a share of orders cross
            let price = match side {
                Side::Buy => 10_000 + (order_id % 50) as Price,
                Side::Sell => 10_040 + (order_id % 50) as Price,
            };
            Command::Add(Order::new(OrderType::GoodTillCancel, order_id, side, price, 10))
        };

        // Critical measurement section
        let start = Instant::now();
        let result = std::hint::black_box(engine.process_command(cmd));
        let elapsed = start.elapsed();

        trades += result?.len();
        record_latency(&mut histogram, elapsed);
        total_duration += elapsed;
    }

    println!("\n=== Latency Report (ns) ===");
    println!("Total Ops:  {}", args.iterations);
    println!("Trades:     {}", trades);
    println!("Resting:    {}", engine.order_count());
    println!("Throughput: {:.2} ops/sec", args.iterations as f64 / total_duration.as_secs_f64());
    println!("---------------------------");
    println!("Min:    {:6} ns", histogram.min());
    println!("P50:    {:6} ns", histogram.value_at_quantile(0.50));
    println!("P90:    {:6} ns", histogram.value_at_quantile(0.90));
    println!("P99:    {:6} ns", histogram.value_at_quantile(0.99));
    println!("P99.9:  {:6} ns", histogram.value_at_quantile(0.999));
    println!("P99.99: {:6} ns", histogram.value_at_quantile(0.9999));
    println!("Max:    {:6} ns", histogram.max());
    println!("---------------------------");

    println!("\nDistribution:");
    for v in histogram.iter_log(100, 2.0) {
        let count = v.count_since_last_iteration();
        if count > 0 {
            println!("<= {:6} ns: {:10} count", v.value_iterated_to(), count);
        }
    }

    Ok(())
}
