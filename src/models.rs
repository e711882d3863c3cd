use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// One scheduled screening, in the upstream `/movies` JSON shape.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Showtime {
    pub id: i64,
    pub cinema_name: String,
    pub movie_title: String,
    pub start_time: NaiveDateTime,
    /// `YYYY-MM-DD`; lexical order is chronological.
    pub date_str: String,
    #[serde(default)]
    pub ticket_url: Option<String>,
    #[serde(default)]
    pub movie_url: Option<String>,
    #[serde(default)]
    pub poster_url: Option<String>,
    /// Comma-delimited genre list.
    #[serde(default)]
    pub genre: Option<String>,
    #[serde(default)]
    pub age_restriction: Option<String>,
    #[serde(default)]
    pub age_restriction_url: Option<String>,
    /// Format or language tag, e.g. "feliratos".
    #[serde(default)]
    pub details_type: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Favorite {
    pub movie_title: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Status {
    #[serde(default)]
    pub last_scrape_time: Option<NaiveDateTime>,
}
