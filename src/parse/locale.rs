//! Localized label vocabulary.
//!
//! The map UI only exposes ratings and counts through accessibility labels
//! written in the interface language. Each locale bundles the patterns needed
//! to read them back.

use std::sync::LazyLock;

use regex::Regex;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Locale {
    #[default]
    Hebrew,
    English,
}

impl Locale {
    pub fn rules(self) -> &'static LocaleRules {
        match self {
            Locale::Hebrew => &HEBREW,
            Locale::English => &ENGLISH,
        }
    }
}

pub struct LocaleRules {
    /// Captures the city from a search query
    pub(crate) city: Regex,
    /// Returned when the query carries no city
    pub unknown_city: &'static str,
    /// Decimal rating preceding the "stars" word
    pub(crate) rating: Regex,
    /// Grouped integer preceding the "reviews" word
    pub(crate) review_count: Regex,
    /// Integer star level of a single review
    pub(crate) review_stars: Regex,
    /// Literal used for single-star reviews
    pub(crate) one_star: &'static str,
    /// Star level, then a grouped count, in one breakdown row
    pub(crate) distribution_row: Regex,
    /// Locates the reviews tab on a detail page
    pub reviews_tab_xpath: &'static str,
}

static HEBREW: LazyLock<LocaleRules> = LazyLock::new(|| LocaleRules {
    city: Regex::new(r"מסעדות ב(.+)").unwrap(),
    unknown_city: "לא ידוע",
    rating: Regex::new(r"([\d.]+)\s*כוכבים").unwrap(),
    review_count: Regex::new(r"([\d,]+)\s*ביקורות").unwrap(),
    review_stars: Regex::new(r"(\d+)\s+כוכבים").unwrap(),
    one_star: "כוכב אחד",
    distribution_row: Regex::new(r"(\d)[^\d]+כוכבים[^\d]+([\d,]+)").unwrap(),
    reviews_tab_xpath: r#"//button[.//div[contains(text(),"ביקורות")]]"#,
});

static ENGLISH: LazyLock<LocaleRules> = LazyLock::new(|| LocaleRules {
    city: Regex::new(r"(?i)restaurants in (.+)").unwrap(),
    unknown_city: "unknown",
    rating: Regex::new(r"([\d.]+)\s*stars?").unwrap(),
    review_count: Regex::new(r"([\d,]+)\s*reviews?").unwrap(),
    review_stars: Regex::new(r"(\d+)\s+stars").unwrap(),
    one_star: "1 star",
    distribution_row: Regex::new(r"(\d)[^\d]+stars?[^\d]+([\d,]+)").unwrap(),
    reviews_tab_xpath: r#"//button[.//div[contains(text(),"Reviews")]]"#,
});
