//! Showtime view-model derivation.
//!
//! [`ViewBuilder::build`] turns the flat showtime list into the
//! date → cinema → movie hierarchy the UI renders. It borrows its inputs and
//! never mutates them, so it is safe to call on every render.

use std::cmp::Ordering;
use std::collections::{BTreeSet, HashMap, HashSet};

use chrono::NaiveDateTime;
use icu_collator::{Collator, CollatorOptions};
use icu_locid::Locale;
use serde::Serialize;

use crate::error::{AppError, AppResult};
use crate::models::Showtime;

/// A screening as shown inside a movie row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Screening {
    pub id: i64,
    pub cinema_name: String,
    pub start_time: NaiveDateTime,
    pub ticket_url: Option<String>,
    pub details_type: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CinemaScreenings {
    pub cinema_name: String,
    /// Ascending by start time.
    pub screenings: Vec<Screening>,
}

/// All screenings of one title on the selected date.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MovieGroup {
    pub title: String,
    pub poster_url: Option<String>,
    pub movie_url: Option<String>,
    pub genre: Option<String>,
    pub age_restriction: Option<String>,
    pub age_restriction_url: Option<String>,
    pub is_favorite: bool,
    /// In source order.
    pub showtimes: Vec<Screening>,
    /// Cinemas in first-seen order.
    pub cinemas: Vec<CinemaScreenings>,
}

impl MovieGroup {
    /// Trimmed, non-empty labels from the comma-delimited genre field.
    pub fn genres(&self) -> Vec<&str> {
        self.genre
            .as_deref()
            .map(|g| g.split(',').map(str::trim).filter(|s| !s.is_empty()).collect())
            .unwrap_or_default()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ShowtimeView {
    /// Every date present in the source, ascending.
    pub dates: Vec<String>,
    /// Cinemas playing on the selected date.
    pub cinemas: Vec<String>,
    pub favorites: Vec<MovieGroup>,
    pub others: Vec<MovieGroup>,
}

impl ShowtimeView {
    pub fn is_empty(&self) -> bool {
        self.favorites.is_empty() && self.others.is_empty()
    }
}

/// Locale-aware view builder. Construct once and reuse.
pub struct ViewBuilder {
    collator: Collator,
}

impl ViewBuilder {
    pub fn new(locale: &str) -> AppResult<Self> {
        let parsed: Locale = locale
            .parse()
            .map_err(|e| AppError::Configuration(format!("invalid locale {}: {}", locale, e)))?;
        let collator = Collator::try_new(&(&parsed).into(), CollatorOptions::new())
            .map_err(|e| AppError::Configuration(format!("no collation for {}: {}", locale, e)))?;
        Ok(Self { collator })
    }

    /// Collation order, falling back to code points for full ties.
    pub fn compare(&self, a: &str, b: &str) -> Ordering {
        self.collator.compare(a, b).then_with(|| a.cmp(b))
    }

    pub fn build(
        &self,
        showtimes: &[Showtime],
        favorites: &HashSet<String>,
        selected_date: Option<&str>,
        selected_cinema: Option<&str>,
    ) -> ShowtimeView {
        let dates: Vec<String> = showtimes
            .iter()
            .map(|st| st.date_str.as_str())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .map(str::to_owned)
            .collect();

        let on_date: Vec<&Showtime> = showtimes
            .iter()
            .filter(|st| Some(st.date_str.as_str()) == selected_date)
            .collect();

        let mut cinemas: Vec<String> = on_date
            .iter()
            .map(|st| st.cinema_name.as_str())
            .collect::<HashSet<_>>()
            .into_iter()
            .map(str::to_owned)
            .collect();
        cinemas.sort_by(|a, b| self.compare(a, b));

        let visible = on_date
            .into_iter()
            .filter(|st| selected_cinema.map_or(true, |c| st.cinema_name == c));

        let (mut favorite_groups, mut other_groups): (Vec<_>, Vec<_>) =
            group_by_title(visible, favorites)
                .into_iter()
                .partition(|group| group.is_favorite);

        favorite_groups.sort_by(|a, b| self.compare(&a.title, &b.title));
        other_groups.sort_by(|a, b| self.compare(&a.title, &b.title));

        ShowtimeView {
            dates,
            cinemas,
            favorites: favorite_groups,
            others: other_groups,
        }
    }
}

fn group_by_title<'a>(
    showtimes: impl Iterator<Item = &'a Showtime>,
    favorites: &HashSet<String>,
) -> Vec<MovieGroup> {
    let mut groups: Vec<MovieGroup> = Vec::new();
    let mut index: HashMap<&str, usize> = HashMap::new();

    for st in showtimes {
        let slot = *index.entry(st.movie_title.as_str()).or_insert_with(|| {
            // First row wins for movie-level fields.
            groups.push(MovieGroup {
                title: st.movie_title.clone(),
                poster_url: st.poster_url.clone(),
                movie_url: st.movie_url.clone(),
                genre: st.genre.clone(),
                age_restriction: st.age_restriction.clone(),
                age_restriction_url: st.age_restriction_url.clone(),
                is_favorite: favorites.contains(&st.movie_title),
                showtimes: Vec::new(),
                cinemas: Vec::new(),
            });
            groups.len() - 1
        });
        groups[slot].showtimes.push(Screening {
            id: st.id,
            cinema_name: st.cinema_name.clone(),
            start_time: st.start_time,
            ticket_url: st.ticket_url.clone(),
            details_type: st.details_type.clone(),
        });
    }

    for group in &mut groups {
        group.cinemas = group_by_cinema(&group.showtimes);
    }
    groups
}

fn group_by_cinema(screenings: &[Screening]) -> Vec<CinemaScreenings> {
    let mut cinemas: Vec<CinemaScreenings> = Vec::new();
    for screening in screenings {
        match cinemas
            .iter_mut()
            .find(|c| c.cinema_name == screening.cinema_name)
        {
            Some(cinema) => cinema.screenings.push(screening.clone()),
            None => cinemas.push(CinemaScreenings {
                cinema_name: screening.cinema_name.clone(),
                screenings: vec![screening.clone()],
            }),
        }
    }
    for cinema in &mut cinemas {
        cinema.screenings.sort_by_key(|s| s.start_time);
    }
    cinemas
}
