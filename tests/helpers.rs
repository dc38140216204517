// Shared test helpers for database setup and test data creation.

use std::path::Path;

use sitekit::db::{ConnectOptions, Database};

/// Opens an in-memory SQLite database with a `ph7_` table prefix.
#[allow(dead_code)] // Used by other test files
pub async fn memory_db() -> Database {
    let mut db = Database::new();
    db.get_instance(ConnectOptions::new("sqlite::memory:").prefix("ph7_"))
        .await
        .expect("Failed to open in-memory database");
    db
}

/// Opens (creating if needed) a SQLite database file.
#[allow(dead_code)]
pub async fn file_db(path: &Path) -> Database {
    let mut db = Database::new();
    let dsn = format!("sqlite:{}", path.display());
    db.get_instance(ConnectOptions::new(dsn).driver_option("mode", "rwc"))
        .await
        .expect("Failed to open database file");
    db
}

/// Creates and fills the `ph7_members` table. Issues four counted calls.
#[allow(dead_code)]
pub async fn seed_members(db: &mut Database) {
    db.exec("CREATE TABLE ph7_members (id INTEGER PRIMARY KEY, name TEXT NOT NULL, age INTEGER)")
        .await
        .expect("Failed to create table");
    for (name, age) in [("alice", 31), ("bob", 27), ("carol", 45)] {
        db.exec(&format!(
            "INSERT INTO ph7_members (name, age) VALUES ('{name}', {age})"
        ))
        .await
        .expect("Failed to insert member");
    }
}
