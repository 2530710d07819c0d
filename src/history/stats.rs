//! Watch-log aggregation
//!
//! Pure reduction over the history log plus a time-boxed memo so repeated
//! dashboard reads don't recompute. The cache is an explicit
//! `{value, computed_at}` entry checked on read, never ambient state.

use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};

use crate::models::{WatchedItem, WatchedKind};

/// How long a computed dashboard stays fresh
pub const STATS_TTL: Duration = Duration::from_secs(15 * 60);

/// Aggregated dashboard payload
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ViewingStats {
    pub total_items: usize,
    pub total_watch_minutes: u64,
    pub movies_watched: usize,
    pub shows_watched: usize,
    pub completed_count: usize,
    /// Mean over rated items only
    pub average_rating: Option<f32>,
    /// Genre frequency, descending count then name
    pub top_genres: Vec<GenreCount>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenreCount {
    pub genre: String,
    pub count: u32,
}

/// Reduce the watch log into dashboard stats
pub fn aggregate(items: &[WatchedItem]) -> ViewingStats {
    let mut total_watch_minutes = 0f64;
    let mut movies_watched = 0;
    let mut shows_watched = 0;
    let mut completed_count = 0;
    let mut rating_sum = 0f32;
    let mut rated = 0u32;
    let mut genres: Vec<GenreCount> = Vec::new();

    for item in items {
        total_watch_minutes += item.watched_minutes();
        match item.kind {
            WatchedKind::Movie => movies_watched += 1,
            WatchedKind::Show => shows_watched += 1,
        }
        if item.completed {
            completed_count += 1;
        }
        if let Some(rating) = item.rating {
            rating_sum += rating;
            rated += 1;
        }
        for genre in &item.genres {
            match genres.iter_mut().find(|g| &g.genre == genre) {
                Some(entry) => entry.count += 1,
                None => genres.push(GenreCount {
                    genre: genre.clone(),
                    count: 1,
                }),
            }
        }
    }

    genres.sort_by(|a, b| b.count.cmp(&a.count).then(a.genre.cmp(&b.genre)));

    ViewingStats {
        total_items: items.len(),
        total_watch_minutes: total_watch_minutes.round() as u64,
        movies_watched,
        shows_watched,
        completed_count,
        average_rating: (rated > 0).then(|| rating_sum / rated as f32),
        top_genres: genres,
    }
}

/// Time-boxed memo for the aggregated dashboard
pub struct CachedStats {
    entry: Option<(ViewingStats, Instant)>,
    ttl: Duration,
}

impl CachedStats {
    pub fn new() -> Self {
        Self::with_ttl(STATS_TTL)
    }

    pub fn with_ttl(ttl: Duration) -> Self {
        Self { entry: None, ttl }
    }

    /// Return the cached value while fresh, else recompute from `items`
    pub fn get_or_compute(&mut self, items: &[WatchedItem]) -> &ViewingStats {
        let stale = self
            .entry
            .as_ref()
            .is_some_and(|(_, computed_at)| computed_at.elapsed() >= self.ttl);
        if stale {
            self.entry = None;
        }
        &self
            .entry
            .get_or_insert_with(|| (aggregate(items), Instant::now()))
            .0
    }

    /// Drop the memo so the next read recomputes
    pub fn invalidate(&mut self) {
        self.entry = None;
    }
}

impl Default for CachedStats {
    fn default() -> Self {
        Self::new()
    }
}
