//! # Seed Data Generator
//!
//! Populates the catalog with bookshop titles for development.
//!
//! ## Usage
//! ```bash
//! # Seed the default development database
//! cargo run -p shepherd-db --bin seed
//!
//! # Specify database path and starting stock
//! cargo run -p shepherd-db --bin seed -- --db ./data/shepherd.db --stock 25
//! ```
//!
//! Each book gets a price between ₦1,500 and ₦9,500 and the requested
//! stock level (default 20).

use std::env;

use shepherd_db::{Database, DbConfig};

/// (title, author) pairs for realistic test data
const TITLES: &[(&str, &str)] = &[
    ("Morning and Evening", "C. H. Spurgeon"),
    ("The Pilgrim's Progress", "John Bunyan"),
    ("Mere Christianity", "C. S. Lewis"),
    ("The Pursuit of God", "A. W. Tozer"),
    ("Knowing God", "J. I. Packer"),
    ("The Cost of Discipleship", "Dietrich Bonhoeffer"),
    ("Celebration of Discipline", "Richard J. Foster"),
    ("The Practice of the Presence of God", "Brother Lawrence"),
    ("Confessions", "Augustine of Hippo"),
    ("Daily Light on the Daily Path", "Samuel Bagster"),
    ("The Hiding Place", "Corrie ten Boom"),
    ("Humility", "Andrew Murray"),
    ("Prayer", "Timothy Keller"),
    ("The Imitation of Christ", "Thomas à Kempis"),
    ("Through Gates of Splendor", "Elisabeth Elliot"),
    ("Streams in the Desert", "L. B. Cowman"),
];

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args: Vec<String> = env::args().collect();

    let mut stock: i64 = 20;
    let mut db_path = String::from("./shepherd_dev.db");

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--stock" | "-s" => {
                if i + 1 < args.len() {
                    stock = args[i + 1].parse().unwrap_or(20);
                    i += 1;
                }
            }
            "--db" | "-d" => {
                if i + 1 < args.len() {
                    db_path = args[i + 1].clone();
                    i += 1;
                }
            }
            "--help" | "-h" => {
                println!("Shepherd Catalog Seeder");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -s, --stock <N>    Copies per title (default: 20)");
                println!("  -d, --db <PATH>    Database file path (default: ./shepherd_dev.db)");
                println!("  -h, --help         Show this help message");
                return Ok(());
            }
            _ => {}
        }
        i += 1;
    }

    println!("Shepherd Catalog Seeder");
    println!("=======================");
    println!("Database: {}", db_path);
    println!("Stock per title: {}", stock);
    println!();

    let db = Database::new(DbConfig::new(&db_path)).await?;
    println!("✓ Connected to database");
    println!("✓ Migrations applied");

    let existing = db.books().count().await?;
    if existing > 0 {
        println!("⚠ Catalog already has {} books", existing);
        println!("  Skipping seed to avoid duplicates.");
        return Ok(());
    }

    let mut seeded = 0;
    for (index, (title, author)) in TITLES.iter().enumerate() {
        let price_minor = price_for(index);
        match db.books().create(title, Some(author), price_minor, stock).await {
            Ok(book) => {
                seeded += 1;
                println!("  + {} ({})", book.title, book.price());
            }
            Err(e) => eprintln!("Failed to insert {}: {}", title, e),
        }
    }

    println!();
    println!("✓ Seeded {} books", seeded);

    db.close().await;
    Ok(())
}

/// Deterministic price between ₦1,500 and ₦9,500 in ₦500 steps.
fn price_for(index: usize) -> i64 {
    let steps = (index * 7) % 17;
    150_000 + steps as i64 * 50_000
}
