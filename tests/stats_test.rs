//! History Store & Stats Tests
//!
//! File-backed watch-log persistence plus the pure aggregation pass and the
//! time-boxed dashboard cache.

use std::time::Duration;

use streamgate::history::{aggregate, CachedStats, HistoryStore};
use streamgate::models::{WatchedItem, WatchedKind};
use tempfile::tempdir;

fn item(
    title: &str,
    kind: WatchedKind,
    runtime: u32,
    progress: f32,
    rating: Option<f32>,
    genres: &[&str],
) -> WatchedItem {
    WatchedItem {
        id: format!("id-{}", title),
        kind,
        title: title.to_string(),
        runtime_minutes: runtime,
        progress_pct: progress,
        completed: progress >= 90.0,
        rating,
        genres: genres.iter().map(|g| g.to_string()).collect(),
        release_year: Some(2023),
        watched_at: 1_722_000_000,
    }
}

// =============================================================================
// Store Tests
// =============================================================================

#[test]
fn test_missing_log_reads_as_empty() {
    let dir = tempdir().unwrap();
    let store = HistoryStore::new(dir.path().join("history.json"));
    assert!(store.load().unwrap().is_empty());
}

#[test]
fn test_save_and_reload_preserves_records() {
    let dir = tempdir().unwrap();
    let store = HistoryStore::new(dir.path().join("data").join("history.json"));

    let log = vec![
        item("Dune", WatchedKind::Movie, 155, 100.0, Some(8.5), &["Sci-Fi"]),
        item("Severance", WatchedKind::Show, 50, 42.0, None, &["Drama", "Mystery"]),
    ];
    store.save(&log).unwrap();

    let reloaded = store.load().unwrap();
    assert_eq!(reloaded.len(), 2);
    assert_eq!(reloaded[0].title, "Dune");
    assert_eq!(reloaded[1].kind, WatchedKind::Show);
    assert_eq!(reloaded[1].genres, vec!["Drama", "Mystery"]);
}

#[test]
fn test_corrupt_log_surfaces_an_error() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("history.json");
    std::fs::write(&path, "{ definitely not a watch log").unwrap();

    assert!(HistoryStore::new(path).load().is_err());
}

// =============================================================================
// Aggregation Tests
// =============================================================================

#[test]
fn test_aggregate_empty_log_is_all_zeroes() {
    let stats = aggregate(&[]);
    assert_eq!(stats.total_items, 0);
    assert_eq!(stats.total_watch_minutes, 0);
    assert_eq!(stats.movies_watched, 0);
    assert_eq!(stats.shows_watched, 0);
    assert_eq!(stats.completed_count, 0);
    assert!(stats.average_rating.is_none());
    assert!(stats.top_genres.is_empty());
}

#[test]
fn test_aggregate_weights_minutes_by_progress() {
    let log = vec![
        // 155 min fully watched + 100 min half watched = 205
        item("Dune", WatchedKind::Movie, 155, 100.0, None, &[]),
        item("Halfway", WatchedKind::Movie, 100, 50.0, None, &[]),
    ];
    let stats = aggregate(&log);
    assert_eq!(stats.total_watch_minutes, 205);
}

#[test]
fn test_aggregate_splits_and_rating() {
    let log = vec![
        item("Dune", WatchedKind::Movie, 155, 100.0, Some(9.0), &["Sci-Fi"]),
        item("Severance", WatchedKind::Show, 50, 100.0, Some(7.0), &["Drama"]),
        item("Unrated", WatchedKind::Show, 40, 10.0, None, &["Drama"]),
    ];
    let stats = aggregate(&log);

    assert_eq!(stats.total_items, 3);
    assert_eq!(stats.movies_watched, 1);
    assert_eq!(stats.shows_watched, 2);
    assert_eq!(stats.completed_count, 2);
    // Mean over rated items only
    assert_eq!(stats.average_rating, Some(8.0));
}

#[test]
fn test_genre_table_sorted_by_count_then_name() {
    let log = vec![
        item("A", WatchedKind::Movie, 90, 100.0, None, &["Drama", "Thriller"]),
        item("B", WatchedKind::Movie, 90, 100.0, None, &["Thriller"]),
        item("C", WatchedKind::Movie, 90, 100.0, None, &["Action"]),
    ];
    let stats = aggregate(&log);

    let table: Vec<(&str, u32)> = stats
        .top_genres
        .iter()
        .map(|g| (g.genre.as_str(), g.count))
        .collect();
    assert_eq!(table, vec![("Thriller", 2), ("Action", 1), ("Drama", 1)]);
}

// =============================================================================
// Cache Tests
// =============================================================================

/// Within the freshness window repeated reads serve the memoized value
#[test]
fn test_cache_serves_memo_while_fresh() {
    let mut cache = CachedStats::with_ttl(Duration::from_secs(900));
    let log = vec![item("Dune", WatchedKind::Movie, 155, 100.0, None, &[])];

    assert_eq!(cache.get_or_compute(&log).total_items, 1);
    // The log changing underneath does not bust a fresh memo
    assert_eq!(cache.get_or_compute(&[]).total_items, 1);
}

#[test]
fn test_cache_recomputes_after_expiry() {
    let mut cache = CachedStats::with_ttl(Duration::ZERO);
    let log = vec![item("Dune", WatchedKind::Movie, 155, 100.0, None, &[])];

    assert_eq!(cache.get_or_compute(&log).total_items, 1);
    assert_eq!(cache.get_or_compute(&[]).total_items, 0);
}

#[test]
fn test_cache_invalidate_forces_recompute() {
    let mut cache = CachedStats::with_ttl(Duration::from_secs(900));
    assert_eq!(cache.get_or_compute(&[]).total_items, 0);

    cache.invalidate();
    let log = vec![item("Dune", WatchedKind::Movie, 155, 100.0, None, &[])];
    assert_eq!(cache.get_or_compute(&log).total_items, 1);
}
