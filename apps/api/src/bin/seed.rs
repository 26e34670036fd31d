//! # Seed Data Generator
//!
//! Populates the database with accounts and pets for development.
//!
//! ## Usage
//! ```bash
//! # Generate 60 pets (default)
//! cargo run -p petstore-api --bin seed
//!
//! # Generate custom amount
//! cargo run -p petstore-api --bin seed -- --count 200
//!
//! # Specify database path
//! cargo run -p petstore-api --bin seed -- --db ./data/petstore.db
//! ```
//!
//! ## Generated Data
//! - `admin`, `owner` and `customer` accounts, password `petstore123`
//! - Pets spread over Dogs, Cats, Birds, Fish and Reptiles, every one `available`
//! - Each pet gets a breed tag plus one temperament tag

use std::env;

use petstore_api::auth::hash_password;
use petstore_core::{NewPet, NewUser, Role};
use petstore_db::{Database, DbConfig};

/// Development password shared by the seeded accounts.
const SEED_PASSWORD: &str = "petstore123";

/// Seeded accounts, one per role.
const ACCOUNTS: &[(&str, Role, &str)] = &[
    ("admin", Role::Admin, "Ada"),
    ("owner", Role::StoreOwner, "Oscar"),
    ("customer", Role::Customer, "Cleo"),
];

/// Categories with their breeds.
const CATEGORIES: &[(&str, &[&str])] = &[
    (
        "Dogs",
        &["Labrador", "Beagle", "Poodle", "Bulldog", "Husky", "Dachshund", "Collie", "Boxer"],
    ),
    (
        "Cats",
        &["Siamese", "Persian", "Maine Coon", "Bengal", "Sphynx", "Ragdoll"],
    ),
    ("Birds", &["Budgie", "Cockatiel", "Canary", "Lovebird", "Parrot"]),
    ("Fish", &["Goldfish", "Betta", "Guppy", "Angelfish"]),
    ("Reptiles", &["Gecko", "Iguana", "Corn Snake", "Tortoise"]),
];

const NAMES: &[&str] = &[
    "Rex", "Bella", "Max", "Luna", "Charlie", "Milo", "Daisy", "Rocky", "Coco", "Ziggy", "Pepper", "Nala",
];

const TEMPERAMENTS: &[&str] = &["friendly", "playful", "calm", "shy", "energetic"];

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Parse command line arguments
    let args: Vec<String> = env::args().collect();

    let mut count: usize = 60;
    let mut db_path = String::from("./data/petstore.db");

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--count" | "-c" => {
                if i + 1 < args.len() {
                    count = args[i + 1].parse().unwrap_or(60);
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
                println!("Petstore Seed Data Generator");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -c, --count <N>    Number of pets to generate (default: 60)");
                println!("  -d, --db <PATH>    Database file path (default: ./data/petstore.db)");
                println!("  -h, --help         Show this help message");
                return Ok(());
            }
            _ => {}
        }
        i += 1;
    }

    println!("Petstore Seed Data Generator");
    println!("============================");
    println!("Database: {}", db_path);
    println!("Pets:     {}", count);
    println!();

    if let Some(parent) = std::path::Path::new(&db_path).parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    let db = Database::new(DbConfig::new(&db_path)).await?;
    println!("✓ Connected to database");
    println!("✓ Migrations applied");

    let existing = db.pets().count().await?;
    if existing > 0 {
        println!("⚠ Database already has {} pets", existing);
        println!("  Skipping seed to avoid duplicates.");
        println!("  Delete the database file to regenerate.");
        return Ok(());
    }

    println!();
    println!("Creating accounts...");
    let password_hash = hash_password(SEED_PASSWORD)?;
    for (username, role, first_name) in ACCOUNTS {
        if db.users().get_by_username(username).await?.is_some() {
            println!("  {} exists, skipped", username);
            continue;
        }
        let user = NewUser {
            username: username.to_string(),
            password: SEED_PASSWORD.to_string(),
            first_name: Some(first_name.to_string()),
            email: Some(format!("{}@petstore.local", username)),
            role: Some(*role),
            ..Default::default()
        };
        db.users().insert(&user, &password_hash).await?;
        println!("  {} ({})", username, role.as_str());
    }

    println!();
    println!("Generating pets...");

    let start = std::time::Instant::now();
    let mut generated = 0;

    'outer: for round in 0..count {
        for (category, breeds) in CATEGORIES {
            for (breed_idx, breed) in breeds.iter().enumerate() {
                if generated >= count {
                    break 'outer;
                }

                let pet = generate_pet(category, breed, round * 100 + breed_idx + generated);
                if let Err(e) = db.pets().insert(&pet).await {
                    eprintln!("Failed to insert {}: {}", pet.name, e);
                    continue;
                }

                generated += 1;
            }
        }
    }

    let elapsed = start.elapsed();
    println!();
    println!("✓ Generated {} pets in {:?}", generated, elapsed);

    let inventory = db.pets().inventory().await?;
    println!(
        "  Inventory: {} available, {} pending, {} sold",
        inventory.available, inventory.pending, inventory.sold
    );

    println!();
    println!("✓ Seed complete!");

    db.close().await;
    Ok(())
}

/// Builds one pet from its category, breed and a varying seed.
fn generate_pet(category: &str, breed: &str, seed: usize) -> NewPet {
    let name = format!("{} the {}", NAMES[seed % NAMES.len()], breed);
    let breed_tag = breed.to_lowercase().replace(' ', "-");
    let temperament = TEMPERAMENTS[seed % TEMPERAMENTS.len()];

    NewPet {
        name,
        category: Some(category.to_string()),
        tags: vec![breed_tag.clone(), temperament.to_string()],
        photo_urls: vec![format!("https://images.petstore.local/{}/{}.jpg", breed_tag, seed)],
    }
}
