//! # Seed Data Generator
//!
//! Populates the database with a demo user and a backdated receipt history
//! for development.
//!
//! ## Usage
//! ```bash
//! # 200 receipts for user "demo" (default)
//! cargo run -p tally-db --bin seed
//!
//! # Custom amount, user and database
//! cargo run -p tally-db --bin seed -- --count 1000 --user borys --db ./data/tally.db
//! ```
//!
//! ## Generated Receipts
//! - 1 to 5 line items each, drawn from a small grocery catalog
//! - Some weighed items with fractional quantities (e.g. 0.75 kg)
//! - Cash payments rounded up to the next 10.00, cashless paid exactly
//! - `created_at` spread over the last 90 days, one receipt every few hours

use chrono::{Duration, Utc};
use std::env;
use tally_core::{create_receipt, LineItemRequest, Money, PaymentRequest, PaymentType, Quantity};
use tally_db::{Database, DbConfig};

/// Catalog: (name, unit price in cents, sold by weight)
const CATALOG: &[(&str, i64, bool)] = &[
    ("Bread", 2000, false),
    ("Milk 2.5%", 3050, false),
    ("Eggs (10 pcs)", 5490, false),
    ("Butter 82%", 8999, false),
    ("Apples", 3490, true),
    ("Bananas", 4990, true),
    ("Potatoes", 1590, true),
    ("Cheese Gouda", 36900, true),
    ("Sunflower oil 1L", 6790, false),
    ("Buckwheat 1kg", 5290, false),
    ("Ground coffee 250g", 18950, false),
    ("Dark chocolate 100g", 4550, false),
    ("Mineral water 1.5L", 2290, false),
    ("Chicken fillet", 17900, true),
    ("Sour cream 20%", 3690, false),
    (
        "Hand-made rye sourdough bread with sunflower seeds and caraway",
        6500,
        false,
    ),
];

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Parse command line arguments
    let args: Vec<String> = env::args().collect();

    let mut count: usize = 200;
    let mut db_path = String::from("./tally.db");
    let mut username = String::from("demo");

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--count" | "-c" => {
                if i + 1 < args.len() {
                    count = args[i + 1].parse().unwrap_or(200);
                    i += 1;
                }
            }
            "--db" | "-d" => {
                if i + 1 < args.len() {
                    db_path = args[i + 1].clone();
                    i += 1;
                }
            }
            "--user" | "-u" => {
                if i + 1 < args.len() {
                    username = args[i + 1].clone();
                    i += 1;
                }
            }
            "--help" | "-h" => {
                println!("Tally Seed Data Generator");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -c, --count <N>     Number of receipts to generate (default: 200)");
                println!("  -u, --user <NAME>   Owner username (default: demo)");
                println!("  -d, --db <PATH>     Database file path (default: ./tally.db)");
                println!("  -h, --help          Show this help message");
                return Ok(());
            }
            _ => {}
        }
        i += 1;
    }

    println!("🌱 Tally Seed Data Generator");
    println!("============================");
    println!("Database: {}", db_path);
    println!("User:     {}", username);
    println!("Receipts: {}", count);
    println!();

    let db = Database::new(DbConfig::new(&db_path)).await?;

    println!("✓ Connected to database");
    println!("✓ Migrations applied");

    let user = match db.users().get_by_username(&username).await? {
        Some(user) => user,
        None => db.users().create(&username).await?,
    };
    println!("✓ User '{}' has id {}", user.username, user.id);

    let existing = db.receipts().count_for_user(user.id).await?;
    if existing > 0 {
        println!("⚠ User already has {} receipts", existing);
        println!("  Skipping seed to avoid duplicates.");
        println!("  Delete the database file to regenerate.");
        return Ok(());
    }

    println!();
    println!("Generating receipts...");

    let start = std::time::Instant::now();
    let now = Utc::now();
    let mut generated = 0;

    for seed in 0..count {
        let (items, payment) = generate_receipt(seed);

        let receipt = match create_receipt(user.id, &items, &payment) {
            Ok(receipt) => receipt,
            Err(e) => {
                eprintln!("Skipping receipt {}: {}", seed, e);
                continue;
            }
        };

        // Spread over ~90 days, newest last
        let age = Duration::minutes(((count - seed) * 613 % (90 * 24 * 60)) as i64);
        if let Err(e) = db.receipts().save_at(receipt, now - age).await {
            eprintln!("Failed to save receipt {}: {}", seed, e);
            continue;
        }

        generated += 1;
        if generated % 50 == 0 {
            println!("  Generated {} receipts...", generated);
        }
    }

    let elapsed = start.elapsed();
    println!();
    println!("✓ Generated {} receipts in {:?}", generated, elapsed);

    db.close().await;
    Ok(())
}

/// Deterministic receipt contents for a given seed.
fn generate_receipt(seed: usize) -> (Vec<LineItemRequest>, PaymentRequest) {
    let item_count = 1 + seed % 5;

    let items: Vec<LineItemRequest> = (0..item_count)
        .map(|n| {
            let (name, price_cents, by_weight) = CATALOG[(seed * 7 + n * 3) % CATALOG.len()];
            let quantity = if by_weight {
                // 0.25 .. 2.00 kg
                Quantity::from_hundredths(25 + ((seed + n) * 25 % 200) as i64)
            } else {
                Quantity::from_units(1 + ((seed + n) % 3) as i64)
            };
            LineItemRequest::new(name, Money::from_cents(price_cents), quantity)
        })
        .collect();

    let total: i64 = items
        .iter()
        .filter_map(|item| item.unit_price.checked_mul_quantity(item.quantity))
        .map(|m| m.cents())
        .sum();

    let payment = if seed % 3 == 0 {
        PaymentRequest::new(PaymentType::Cashless, Money::from_cents(total))
    } else {
        // Round cash up to the next 10.00
        let paid = (total / 1000 + 1) * 1000;
        PaymentRequest::new(PaymentType::Cash, Money::from_cents(paid))
    };

    (items, payment)
}
