//! # Seed Data Generator
//!
//! Populates the database with a demo catalog and, optionally, an admin
//! account.
//!
//! ## Usage
//! ```bash
//! # Demo data into ./sloths_dev.db
//! cargo run -p sloths-db --bin seed
//!
//! # Specify database path and create a login
//! cargo run -p sloths-db --bin seed -- --db ./data/sloths.db \
//!     --admin-user admin --admin-password 'change me please'
//! ```
//!
//! ## Generated Data
//! - Lookups: categories, types, manufacturers, models, statuses, locations
//! - Devices: one per catalog entry below
//! - Responsible persons
//! - Items `INV-000001..`, each with a short operation history so the
//!   current-state projection has something to show

use anyhow::{bail, Context};
use chrono::{Duration, TimeZone, Utc};
use sloths_core::{
    LookupEntry, LookupKind, NewDevice, NewItem, NewLookup, NewOperation, NewResponsible,
    NewUser, Responsible,
};
use sloths_db::{Database, DbConfig};
use std::env;

/// (category, type, manufacturer, model, items to create)
const CATALOG: &[(&str, &str, &str, &str, usize)] = &[
    ("Computers", "Laptop", "Lenovo", "ThinkPad T14", 6),
    ("Computers", "Laptop", "Apple", "MacBook Air M2", 3),
    ("Computers", "Desktop", "Dell", "OptiPlex 7010", 4),
    ("Displays", "Monitor", "Dell", "P2422H", 8),
    ("Displays", "Monitor", "LG", "27UL850", 2),
    ("Printing", "Laser printer", "HP", "LaserJet M404", 2),
    ("Printing", "MFP", "Kyocera", "ECOSYS M2040dn", 1),
    ("Network", "Switch", "Cisco", "Catalyst 9200", 2),
    ("Phones", "IP phone", "Yealink", "T46U", 5),
];

const STATUSES: &[&str] = &["In stock", "In use", "Repair", "Written off"];

const LOCATIONS: &[&str] = &["Warehouse", "Room 101", "Room 204", "Service center"];

/// (last, first, middle, employee id)
const PEOPLE: &[(&str, &str, Option<&str>, &str)] = &[
    ("Ivanov", "Ivan", Some("Ivanovich"), "E-0001"),
    ("Petrova", "Anna", Some("Sergeevna"), "E-0002"),
    ("Sidorov", "Pavel", None, "E-0003"),
    ("Storekeeper", "Main", None, ""),
];

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args: Vec<String> = env::args().collect();

    let mut db_path = String::from("./sloths_dev.db");
    let mut admin_user: Option<String> = None;
    let mut admin_password: Option<String> = None;

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--db" | "-d" => {
                if i + 1 < args.len() {
                    db_path = args[i + 1].clone();
                    i += 1;
                }
            }
            "--admin-user" => {
                if i + 1 < args.len() {
                    admin_user = Some(args[i + 1].clone());
                    i += 1;
                }
            }
            "--admin-password" => {
                if i + 1 < args.len() {
                    admin_password = Some(args[i + 1].clone());
                    i += 1;
                }
            }
            "--help" | "-h" => {
                println!("Sloths Inventory Seed Data Generator");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -d, --db <PATH>            Database file path (default: ./sloths_dev.db)");
                println!("      --admin-user <NAME>    Create a login with this username");
                println!("      --admin-password <PW>  Password for --admin-user");
                println!("  -h, --help                 Show this help message");
                return Ok(());
            }
            other => bail!("unknown argument: {} (try --help)", other),
        }
        i += 1;
    }

    println!("🦥 Sloths Inventory Seed Data Generator");
    println!("======================================");
    println!("Database: {}", db_path);
    println!();

    let db = Database::new(DbConfig::new(&db_path))
        .await
        .with_context(|| format!("opening {}", db_path))?;

    println!("✓ Connected to database");
    println!("✓ Migrations applied");

    match (admin_user, admin_password) {
        (Some(username), Some(password)) => seed_admin(&db, username, password).await?,
        (None, None) => {}
        _ => bail!("--admin-user and --admin-password must be given together"),
    }

    let existing = db.items().count().await?;
    if existing > 0 {
        println!("⚠ Database already has {} items", existing);
        println!("  Skipping demo data to avoid duplicates.");
        println!("  Delete the database file to regenerate.");
        return Ok(());
    }

    let start = std::time::Instant::now();
    let (items, operations) = seed_demo(&db).await?;

    println!();
    println!(
        "✓ Generated {} items with {} operations in {:?}",
        items,
        operations,
        start.elapsed()
    );
    println!("✓ Seed complete!");

    Ok(())
}

async fn seed_admin(db: &Database, username: String, password: String) -> anyhow::Result<()> {
    if db.users().find_by_username(&username).await?.is_some() {
        println!("⚠ User '{}' already exists, leaving it unchanged", username);
        return Ok(());
    }

    let user = db
        .users()
        .create(NewUser {
            username: username.clone(),
            password,
        })
        .await
        .with_context(|| format!("creating user {}", username))?;

    println!("✓ Created user '{}' ({})", user.username, user.id);
    Ok(())
}

/// Returns the existing row with this name, creating it if needed.
async fn lookup(db: &Database, kind: LookupKind, name: &str) -> anyhow::Result<LookupEntry> {
    let repo = db.lookups(kind);
    if let Some(entry) = repo.find_by_name(name).await? {
        return Ok(entry);
    }

    let entry = repo
        .create(NewLookup {
            name: name.to_string(),
            notes: String::new(),
        })
        .await
        .with_context(|| format!("creating {} '{}'", kind, name))?;
    Ok(entry)
}

async fn seed_demo(db: &Database) -> anyhow::Result<(usize, usize)> {
    let mut statuses = Vec::new();
    for name in STATUSES {
        statuses.push(lookup(db, LookupKind::Status, name).await?);
    }

    let mut locations = Vec::new();
    for name in LOCATIONS {
        locations.push(lookup(db, LookupKind::Location, name).await?);
    }

    let mut people: Vec<Responsible> = Vec::new();
    for (last, first, middle, employee_id) in PEOPLE {
        let person = db
            .responsibles()
            .create(NewResponsible {
                last_name: last.to_string(),
                first_name: first.to_string(),
                middle_name: middle.map(str::to_string),
                employee_id: employee_id.to_string(),
                user_id: None,
                notes: String::new(),
            })
            .await?;
        people.push(person);
    }
    println!("✓ {} statuses, {} locations, {} people", statuses.len(), locations.len(), people.len());

    let base = Utc
        .with_ymd_and_hms(2025, 1, 15, 9, 0, 0)
        .single()
        .context("invalid base date")?;

    let mut items = 0usize;
    let mut operations = 0usize;

    for (category, kind, manufacturer, model, count) in CATALOG {
        let category = lookup(db, LookupKind::Category, category).await?;
        let kind = lookup(db, LookupKind::Type, kind).await?;
        let manufacturer = lookup(db, LookupKind::Manufacturer, manufacturer).await?;
        let model = lookup(db, LookupKind::Model, model).await?;

        let device = db
            .devices()
            .create(NewDevice {
                category_id: category.id,
                type_id: kind.id,
                manufacturer_id: manufacturer.id,
                model_id: model.id,
                notes: String::new(),
            })
            .await?;

        for _ in 0..*count {
            items += 1;
            let item = db
                .items()
                .create(NewItem {
                    inventory_number: format!("INV-{:06}", items),
                    serial_number: format!("SN{:08X}", items * 7919),
                    device_id: device.id.clone(),
                    notes: String::new(),
                })
                .await?;

            // Every item arrives at the warehouse; most are then handed out,
            // some later go to repair.
            let steps = 1 + items % 3;
            for step in 0..steps {
                let (status, location) = match step {
                    0 => (&statuses[0], &locations[0]),
                    1 => (&statuses[1], &locations[1 + items % 2]),
                    _ => (&statuses[2], &locations[3]),
                };
                let person = if step == 0 {
                    &people[3]
                } else {
                    &people[items % 3]
                };

                let at = base + Duration::days((items * 3 + step * 20) as i64);
                db.operations()
                    .record_at(
                        &item.id,
                        NewOperation {
                            status_id: status.id.clone(),
                            responsible_id: person.id.clone(),
                            location_id: location.id.clone(),
                            notes: String::new(),
                        },
                        at,
                    )
                    .await?;
                operations += 1;
            }
        }
    }

    Ok((items, operations))
}
