//! Database schema initialization and upgrades.

use std::collections::HashSet;

use rusqlite::Connection;
use tracing::info;

use crate::error::ScraperError;

pub const CREATE_RESTAURANTS_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS restaurants (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT,
    url TEXT UNIQUE,
    rating REAL,
    review_count INTEGER,
    city TEXT,
    rating_1_count INTEGER,
    rating_2_count INTEGER,
    rating_3_count INTEGER,
    rating_4_count INTEGER,
    rating_5_count INTEGER
)
"#;

// review_id uniqueness lives in a separate index so older tables can gain it
pub const CREATE_REVIEWS_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS reviews (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    review_id TEXT,
    restaurant_id INTEGER,
    stars INTEGER NOT NULL,
    text TEXT NOT NULL,
    FOREIGN KEY (restaurant_id) REFERENCES restaurants(id)
)
"#;

pub const CREATE_REVIEW_ID_INDEX: &str =
    "CREATE UNIQUE INDEX IF NOT EXISTS idx_reviews_review_id ON reviews(review_id)";

const DISTRIBUTION_COLUMNS: [&str; 5] = [
    "rating_1_count",
    "rating_2_count",
    "rating_3_count",
    "rating_4_count",
    "rating_5_count",
];

fn column_names(conn: &Connection, table: &str) -> Result<HashSet<String>, ScraperError> {
    let mut stmt = conn.prepare(&format!("PRAGMA table_info({})", table))?;
    let names = stmt
        .query_map([], |row| row.get::<_, String>(1))?
        .collect::<Result<HashSet<_>, _>>()?;
    Ok(names)
}

/// Bring tables created by older versions up to the current columns.
fn upgrade_legacy_tables(conn: &Connection) -> Result<(), ScraperError> {
    let restaurant_columns = column_names(conn, "restaurants")?;
    for column in DISTRIBUTION_COLUMNS {
        if !restaurant_columns.contains(column) {
            info!("Adding missing column restaurants.{}", column);
            conn.execute(
                &format!("ALTER TABLE restaurants ADD COLUMN {} INTEGER", column),
                [],
            )?;
        }
    }

    if !column_names(conn, "reviews")?.contains("review_id") {
        info!("Adding missing column reviews.review_id");
        conn.execute("ALTER TABLE reviews ADD COLUMN review_id TEXT", [])?;
    }

    Ok(())
}

pub(crate) fn init_schema(conn: &Connection) -> Result<(), ScraperError> {
    conn.execute_batch(CREATE_RESTAURANTS_TABLE)?;
    conn.execute_batch(CREATE_REVIEWS_TABLE)?;
    upgrade_legacy_tables(conn)?;
    conn.execute_batch(CREATE_REVIEW_ID_INDEX)?;
    Ok(())
}
