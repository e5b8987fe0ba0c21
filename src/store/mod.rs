//! SQLite persistence for restaurants, reviews and rating distributions.
//!
//! All writes are idempotent: restaurants are unique per URL and reviews per
//! `review_id`, and duplicates are ignored rather than reported.

mod schema;

use std::path::Path;

use rusqlite::{params, Connection, OptionalExtension};
use tracing::info;

use crate::error::ScraperError;
use crate::maps::{Listing, NewReview, PendingRestaurant, RatingDistribution};

const INSERT_RESTAURANT: &str = r#"
INSERT OR IGNORE INTO restaurants (name, url, rating, review_count, city)
VALUES (?1, ?2, ?3, ?4, ?5)
"#;

const INSERT_REVIEW: &str = r#"
INSERT OR IGNORE INTO reviews (review_id, restaurant_id, stars, text)
VALUES (?1, ?2, ?3, ?4)
"#;

// NULL is "never harvested"; negative values are the legacy -1 default
const DISTRIBUTION_UNSET: &str = r#"
(rating_1_count IS NULL OR rating_1_count < 0)
AND (rating_2_count IS NULL OR rating_2_count < 0)
AND (rating_3_count IS NULL OR rating_3_count < 0)
AND (rating_4_count IS NULL OR rating_4_count < 0)
AND (rating_5_count IS NULL OR rating_5_count < 0)
"#;

pub struct RestaurantStore {
    conn: Connection,
}

impl RestaurantStore {
    /// Open (or create) the store file and make sure the schema is current.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, ScraperError> {
        let path = path.as_ref();
        info!("Opening store {:?}", path);
        Self::with_connection(Connection::open(path)?)
    }

    pub fn open_in_memory() -> Result<Self, ScraperError> {
        Self::with_connection(Connection::open_in_memory()?)
    }

    fn with_connection(conn: Connection) -> Result<Self, ScraperError> {
        schema::init_schema(&conn)?;
        Ok(Self { conn })
    }

    /// Returns false when the URL was already stored.
    pub fn insert_restaurant(&self, listing: &Listing) -> Result<bool, ScraperError> {
        let changed = self.conn.execute(
            INSERT_RESTAURANT,
            params![
                listing.name,
                listing.url,
                listing.rating,
                listing.review_count,
                listing.city
            ],
        )?;
        Ok(changed > 0)
    }

    /// Insert listings in one transaction, returning how many were new.
    pub fn insert_listings(&mut self, listings: &[Listing]) -> Result<usize, ScraperError> {
        let tx = self.conn.transaction()?;
        let mut inserted = 0;
        {
            let mut stmt = tx.prepare(INSERT_RESTAURANT)?;
            for listing in listings {
                inserted += stmt.execute(params![
                    listing.name,
                    listing.url,
                    listing.rating,
                    listing.review_count,
                    listing.city
                ])?;
            }
        }
        tx.commit()?;
        Ok(inserted)
    }

    /// Restaurants with no stored reviews, oldest first.
    ///
    /// A restaurant that yields no usable reviews stays pending and is offered
    /// again on the next run ahead of later rows.
    pub fn restaurants_pending_reviews(
        &self,
        limit: usize,
    ) -> Result<Vec<PendingRestaurant>, ScraperError> {
        let mut stmt = self.conn.prepare(
            r#"
            SELECT id, url FROM restaurants
            WHERE id NOT IN (
                SELECT DISTINCT restaurant_id FROM reviews WHERE restaurant_id IS NOT NULL
            )
            ORDER BY id
            LIMIT ?1
            "#,
        )?;
        let rows = stmt
            .query_map(params![limit as i64], |row| {
                Ok(PendingRestaurant {
                    id: row.get(0)?,
                    url: row.get(1)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    /// Restaurants whose five distribution columns are all unset.
    pub fn restaurants_pending_distribution(
        &self,
        limit: usize,
    ) -> Result<Vec<PendingRestaurant>, ScraperError> {
        let sql = format!(
            "SELECT id, url FROM restaurants WHERE {} ORDER BY id LIMIT ?1",
            DISTRIBUTION_UNSET
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt
            .query_map(params![limit as i64], |row| {
                Ok(PendingRestaurant {
                    id: row.get(0)?,
                    url: row.get(1)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    /// Insert one restaurant's reviews in a single transaction. Reviews whose
    /// `review_id` is already stored are skipped.
    pub fn insert_reviews(&mut self, reviews: &[NewReview]) -> Result<usize, ScraperError> {
        let tx = self.conn.transaction()?;
        let mut inserted = 0;
        {
            let mut stmt = tx.prepare(INSERT_REVIEW)?;
            for review in reviews {
                inserted += stmt.execute(params![
                    review.review_id,
                    review.restaurant_id,
                    review.stars,
                    review.text
                ])?;
            }
        }
        tx.commit()?;
        Ok(inserted)
    }

    pub fn update_distribution(
        &self,
        restaurant_id: i64,
        distribution: &RatingDistribution,
    ) -> Result<(), ScraperError> {
        let [one, two, three, four, five] = distribution.counts;
        self.conn.execute(
            r#"
            UPDATE restaurants
            SET rating_1_count = ?1, rating_2_count = ?2, rating_3_count = ?3,
                rating_4_count = ?4, rating_5_count = ?5
            WHERE id = ?6
            "#,
            params![one, two, three, four, five, restaurant_id],
        )?;
        Ok(())
    }

    /// Stored breakdown, or `None` while any level is still unset.
    pub fn distribution_for(
        &self,
        restaurant_id: i64,
    ) -> Result<Option<RatingDistribution>, ScraperError> {
        let counts = self
            .conn
            .query_row(
                r#"
                SELECT rating_1_count, rating_2_count, rating_3_count,
                       rating_4_count, rating_5_count
                FROM restaurants WHERE id = ?1
                "#,
                params![restaurant_id],
                |row| {
                    Ok([
                        row.get::<_, Option<i64>>(0)?,
                        row.get::<_, Option<i64>>(1)?,
                        row.get::<_, Option<i64>>(2)?,
                        row.get::<_, Option<i64>>(3)?,
                        row.get::<_, Option<i64>>(4)?,
                    ])
                },
            )
            .optional()?;

        let Some(counts) = counts else {
            return Ok(None);
        };

        let mut distribution = RatingDistribution::default();
        for (i, count) in counts.into_iter().enumerate() {
            match count {
                Some(count) if count >= 0 => distribution.counts[i] = count,
                _ => return Ok(None),
            }
        }
        Ok(Some(distribution))
    }

    pub fn restaurant_count(&self) -> Result<usize, ScraperError> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM restaurants", [], |row| row.get(0))?;
        Ok(count as usize)
    }

    pub fn review_count_for(&self, restaurant_id: i64) -> Result<usize, ScraperError> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM reviews WHERE restaurant_id = ?1",
            params![restaurant_id],
            |row| row.get(0),
        )?;
        Ok(count as usize)
    }

    pub fn close(self) -> Result<(), ScraperError> {
        self.conn.close().map_err(|(_, e)| ScraperError::Database(e))
    }
}
