//! Parsers for the semi-structured text scraped from the map UI.
//!
//! Nothing in here fails: an unmatched pattern or an unconvertible number
//! becomes `None`.

mod locale;

use std::sync::LazyLock;

use regex::Regex;

pub use locale::{Locale, LocaleRules};

/// Rating and review count read from a result card's accessibility label.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct RatingLabel {
    pub rating: Option<f64>,
    pub review_count: Option<i64>,
}

static GROUPED_INTEGER: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\d[\d,]*").unwrap());

/// Remove invisible bidi formatting marks (LRM, RLM, embeddings, isolates).
pub fn strip_directional_controls(text: &str) -> String {
    text.chars()
        .filter(|c| {
            !matches!(
                c,
                '\u{200E}' | '\u{200F}' | '\u{061C}' | '\u{202A}'..='\u{202E}' | '\u{2066}'..='\u{2069}'
            )
        })
        .collect()
}

fn parse_grouped_integer(digits: &str) -> Option<i64> {
    digits.replace(',', "").parse().ok()
}

fn star_level(value: i64) -> Option<u8> {
    (1..=5).contains(&value).then_some(value as u8)
}

impl LocaleRules {
    /// Trimmed text after the city marker, or the unknown-city marker when
    /// the query has none. A marker followed only by spaces gives `""`.
    pub fn extract_city(&self, query: &str) -> String {
        self.city
            .captures(query)
            .and_then(|caps| caps.get(1))
            .map(|m| m.as_str().trim())
            .unwrap_or(self.unknown_city)
            .to_string()
    }

    /// Each half of the label is matched independently; a missing half
    /// leaves only that field empty.
    pub fn parse_rating_label(&self, label: &str) -> RatingLabel {
        let label = strip_directional_controls(label);

        let rating = self
            .rating
            .captures(&label)
            .and_then(|caps| caps[1].parse::<f64>().ok());
        let review_count = self
            .review_count
            .captures(&label)
            .and_then(|caps| parse_grouped_integer(&caps[1]));

        RatingLabel {
            rating,
            review_count,
        }
    }

    /// Star level of a single review, 1 through 5.
    pub fn parse_review_stars(&self, label: &str) -> Option<u8> {
        let label = strip_directional_controls(label);

        if let Some(caps) = self.review_stars.captures(&label) {
            return caps[1].parse::<i64>().ok().and_then(star_level);
        }
        if label.contains(self.one_star) {
            return Some(1);
        }
        None
    }

    /// `(star level, review count)` from one row of the rating breakdown.
    pub fn parse_distribution_row(&self, label: &str) -> Option<(u8, i64)> {
        let label = strip_directional_controls(label);

        if let Some(caps) = self.distribution_row.captures(&label) {
            let stars = caps[1].parse::<i64>().ok().and_then(star_level)?;
            let count = parse_grouped_integer(&caps[2])?;
            return Some((stars, count));
        }

        // The one-star row spells its level out instead of using a digit
        if label.contains(self.one_star) {
            let rest = label.replacen(self.one_star, "", 1);
            let count = GROUPED_INTEGER
                .find(&rest)
                .and_then(|m| parse_grouped_integer(m.as_str()))?;
            return Some((1, count));
        }

        None
    }
}
