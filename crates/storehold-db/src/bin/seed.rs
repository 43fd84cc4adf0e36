//! # Seed Data Generator
//!
//! Populates a development database with catalog products.
//!
//! ## Usage
//! ```bash
//! # Generate 200 products (default)
//! cargo run -p storehold-db --bin seed
//!
//! # Generate custom amount into a specific file
//! cargo run -p storehold-db --bin seed -- --count 500 --db ./data/storehold.db
//! ```
//!
//! Every product gets a deterministic price between ₦5,000 and ₦85,000, a
//! cost of 55-75% of that, 0-40 units on hand, and roughly one in six gets a
//! percentage discount running for the next week.

use chrono::{Duration, Utc};
use std::env;
use storehold_core::discount::discount_from_parts;
use storehold_core::{DiscountType, Product, ValidationError};
use storehold_db::repository::product;
use storehold_db::{Database, DbConfig};
use uuid::Uuid;

/// Store categories with sample product names.
const CATEGORIES: &[(&str, &[&str])] = &[
    (
        "CLOTHES",
        &["Linen Shirt", "Ankara Dress", "Denim Jacket", "Kaftan", "Chinos"],
    ),
    (
        "SHOES",
        &["Leather Loafers", "Canvas Sneakers", "Block Heels", "Slides", "Chelsea Boots"],
    ),
    (
        "PERFUMES",
        &["Oud Wood", "Amber Musk", "Vanilla Noir", "Rose Oud", "Citrus Bloom"],
    ),
    (
        "CREAMS",
        &["Shea Body Butter", "Cocoa Lotion", "Night Repair Cream", "Aloe Gel", "Hand Cream"],
    ),
    (
        "WATCHES",
        &["Chronograph Steel", "Classic Leather", "Minimalist Mesh", "Diver 200m", "Smart Band"],
    ),
    (
        "JEWELRY",
        &["Gold Hoops", "Pearl Necklace", "Silver Cuff", "Beaded Anklet", "Signet Ring"],
    ),
    (
        "BAGS",
        &["Leather Tote", "Crossbody Mini", "Weekender", "Clutch", "Backpack"],
    ),
    (
        "BODY_SPRAY",
        &["Fresh Breeze", "Midnight Musk", "Coconut Splash", "Cool Mint", "Velvet Rose"],
    ),
];

/// Variant suffixes appended to each sample name.
const VARIANTS: &[(&str, i64)] = &[
    ("", 0),
    ("Classic", 150_000),
    ("Premium", 900_000),
    ("Limited", 2_500_000),
    ("Travel", -100_000),
];

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args: Vec<String> = env::args().collect();

    let mut count: usize = 200;
    let mut db_path = String::from("./storehold_dev.db");

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
            "--help" | "-h" => {
                println!("Storehold Seed Data Generator");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -c, --count <N>    Number of products to generate (default: 200)");
                println!("  -d, --db <PATH>    Database file path (default: ./storehold_dev.db)");
                println!("  -h, --help         Show this help message");
                return Ok(());
            }
            _ => {}
        }
        i += 1;
    }

    println!("🌱 Storehold Seed Data Generator");
    println!("================================");
    println!("Database: {}", db_path);
    println!("Products: {}", count);
    println!();

    let db = Database::new(DbConfig::new(&db_path)).await?;

    println!("✓ Connected to database");
    println!("✓ Migrations applied");

    let existing = db.products().count().await?;
    if existing > 0 {
        println!("⚠ Database already has {} products", existing);
        println!("  Skipping seed to avoid duplicates.");
        println!("  Delete the database file to regenerate.");
        return Ok(());
    }

    println!();
    println!("Generating products...");

    let start = std::time::Instant::now();
    let mut generated = 0;
    let mut seed = 0usize;

    let mut tx = db.begin_immediate().await?;
    'outer: for round in 0.. {
        for (category, names) in CATEGORIES {
            for name in names.iter() {
                if generated >= count {
                    break 'outer;
                }
                let (variant, addon) = VARIANTS[round % VARIANTS.len()];
                let item = generate_product(category, name, variant, addon, round, seed)?;
                seed += 1;

                if let Err(e) = product::insert(&mut tx, &item).await {
                    eprintln!("Failed to insert {}: {}", item.name, e);
                    continue;
                }
                generated += 1;
            }
        }
    }
    tx.commit().await?;

    let elapsed = start.elapsed();
    println!();
    println!("✓ Generated {} products in {:?}", generated, elapsed);

    let low = db.reports().low_stock(5).await?;
    println!("  Low-stock products: {}", low.len());

    let storefront = db.products().list_storefront().await?;
    println!("  Visible on storefront: {}", storefront.len());

    println!();
    println!("✓ Seed complete!");

    Ok(())
}

/// Generates a single product with deterministic data.
fn generate_product(
    category: &str,
    name: &str,
    variant: &str,
    price_addon: i64,
    round: usize,
    seed: usize,
) -> Result<Product, ValidationError> {
    let now = Utc::now();

    let mut full_name = name.to_string();
    if !variant.is_empty() {
        full_name = format!("{} {}", name, variant);
    }
    if round >= VARIANTS.len() {
        full_name = format!("{} #{}", full_name, round / VARIANTS.len() + 1);
    }

    // ₦5,000 - ₦85,000 in kobo, plus the variant addon
    let base_price = 500_000 + ((seed * 7919) % 8_000_000) as i64;
    let selling_price = (base_price + price_addon).max(100_000);

    // Cost at 55-75% of price
    let cost_pct = 55 + (seed % 21) as i64;
    let cost_price = selling_price * cost_pct / 100;

    let quantity = (seed % 41) as i64;

    let discounted = seed % 6 == 0;
    let discount = discount_from_parts(
        discounted.then_some(DiscountType::Percentage),
        discounted.then_some(10 + (seed % 3) as i64 * 5),
        discounted.then_some(now),
        discounted.then(|| now + Duration::days(7)),
    )?;

    Ok(Product {
        id: Uuid::new_v4().to_string(),
        name: full_name,
        description: Some(format!("{} from the {} collection", name, category.to_lowercase())),
        category: category.to_string(),
        cost_price,
        selling_price,
        quantity,
        reserved_quantity: 0,
        discount_type: discount.as_ref().map(|d| d.kind),
        discount_value: discount.as_ref().map(|d| d.value),
        discount_start_at: discount.as_ref().and_then(|d| d.start_at),
        discount_end_at: discount.as_ref().and_then(|d| d.end_at),
        visible_on_website: seed % 10 != 9,
        is_archived: false,
        archived_at: None,
        created_at: now,
        updated_at: now,
    })
}
