//! Selectors for the map UI.
//!
//! These track obfuscated class names and will break whenever the site ships a
//! new build. Update here when extraction starts coming back empty.

use crate::traits::Selector;

/// Search surface
pub mod search {
    use super::*;

    pub const SEARCH_BOX: Selector = Selector::Css("#searchboxinput");

    /// Scrollable result list that lazily appends cards
    pub const FEED: Selector = Selector::Css(r#"div[role="feed"]"#);

    pub const RESULT_CARD: Selector = Selector::Css("div.Nv2PK.THOPZb.CpccDe");
    pub const CARD_NAME: Selector = Selector::Css(".qBF1Pd");
    pub const CARD_LINK: Selector = Selector::Css("a");

    /// Carries the rating/review-count accessibility label
    pub const CARD_RATING: Selector = Selector::Css(".ZkP5Je");
}

/// Restaurant detail page
pub mod detail {
    use super::*;

    pub const REVIEW_PANEL: Selector = Selector::Css("div.m6QErb.DxyBCb.kA9KIf.dS8AEf.XiKgde");
    pub const SHOW_MORE: Selector = Selector::Css(".w8nwRe");
    pub const REVIEW_CONTAINER: Selector = Selector::Css("div.jftiEf");
    pub const REVIEW_TEXT: Selector = Selector::Css(".wiI7pd");
    pub const REVIEW_STARS: Selector = Selector::Css(".kvMYJc");

    /// One row of the per-star breakdown table
    pub const DISTRIBUTION_ROW: Selector = Selector::Css("tr.BHOKXe");
}

pub const ARIA_LABEL: &str = "aria-label";
pub const HREF: &str = "href";
