// tests/view_projection.rs
//
// Projection = filter then recency order; same inputs, same output.

use chrono::{TimeZone, Utc};
use openfinance_feed::view::{project, project_limited};
use openfinance_feed::{Category, FilterSpec, Impact, NewsEvent, ReconciliationStore, Region};

fn ev(id: &str, ts: i64, category: Category, lat: f64, lon: f64) -> NewsEvent {
    NewsEvent {
        id: id.into(),
        url: format!("https://news.fake/{id}"),
        title: format!("title {id}"),
        summary: None,
        source: "view".into(),
        category,
        impact: Impact::Medium,
        companies: None,
        location_name: None,
        latitude: lat,
        longitude: lon,
        published_at: Utc.timestamp_opt(1_714_000_000 + ts, 0).unwrap(),
    }
}

fn ids(rows: &[NewsEvent]) -> Vec<&str> {
    rows.iter().map(|e| e.id.as_str()).collect()
}

#[test]
fn newest_first_regardless_of_arrival_order() {
    // b(t1), c(t2), d(t3) arriving out of order
    let mut store = ReconciliationStore::new();
    store.ingest_one(ev("c", 2, Category::Financial, -23.5, -46.6));
    store.ingest_one(ev("b", 1, Category::Financial, -23.5, -46.6));
    store.ingest_one(ev("d", 3, Category::Financial, -23.5, -46.6));

    assert_eq!(ids(&project(&store, &FilterSpec::all())), ["d", "c", "b"]);
}

#[test]
fn equal_timestamps_keep_arrival_order() {
    let mut store = ReconciliationStore::new();
    for id in ["x", "y", "z"] {
        store.ingest_one(ev(id, 10, Category::Political, -23.5, -46.6));
    }
    store.ingest_one(ev("late", 11, Category::Political, -23.5, -46.6));

    assert_eq!(
        ids(&project(&store, &FilterSpec::all())),
        ["late", "x", "y", "z"]
    );
}

#[test]
fn projection_is_deterministic() {
    let mut store = ReconciliationStore::new();
    for i in 0..30 {
        let cat = Category::ALL[i % 3];
        store.ingest_one(ev(&i.to_string(), (i % 7) as i64, cat, -3.0 - i as f64, -40.0));
    }
    let spec = FilterSpec::all().with_category(Category::Geopolitical);
    let a = project(&store, &spec);
    let b = project(&store, &spec);
    assert_eq!(a, b);
    assert!(a.iter().all(|e| e.category == Category::Geopolitical));
    assert!(a
        .windows(2)
        .all(|w| w[0].published_at >= w[1].published_at));
}

#[test]
fn region_filter_and_limit() {
    let mut store = ReconciliationStore::new();
    store.ingest_one(ev("norte-old", 1, Category::Financial, -3.1, -60.0));
    store.ingest_one(ev("sul", 5, Category::Financial, -30.0, -51.2));
    store.ingest_one(ev("norte-new", 9, Category::Financial, -1.4, -48.5));

    let spec = FilterSpec::all().with_region(Region::Norte);
    assert_eq!(ids(&project(&store, &spec)), ["norte-new", "norte-old"]);
    assert_eq!(ids(&project_limited(&store, &spec, 1)), ["norte-new"]);
    assert!(project(&store, &FilterSpec::all().with_region(Region::Nordeste)).is_empty());
}

#[test]
fn empty_store_projects_to_empty_view() {
    let store = ReconciliationStore::new();
    assert!(project(&store, &FilterSpec::all()).is_empty());
}
