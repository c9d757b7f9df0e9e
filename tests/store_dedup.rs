// tests/store_dedup.rs
//
// Dedup over arbitrary interleavings of snapshot batches and stream arrivals.

use std::collections::HashSet;

use chrono::{TimeZone, Utc};
use openfinance_feed::{Category, Impact, NewsEvent, ReconciliationStore};
use rand::seq::SliceRandom;
use rand::Rng;

fn ev(id: usize, url: usize, ts: i64) -> NewsEvent {
    NewsEvent {
        id: id.to_string(),
        url: format!("https://news.fake/{url}"),
        title: format!("event {id}"),
        summary: None,
        source: "fuzz".into(),
        category: Category::Financial,
        impact: Impact::Medium,
        companies: None,
        location_name: None,
        latitude: -23.55,
        longitude: -46.63,
        published_at: Utc.timestamp_opt(1_714_000_000 + ts, 0).unwrap(),
    }
}

#[test]
fn urls_are_unique_under_random_interleavings() {
    let mut rng = rand::rng();

    for _round in 0..50 {
        // 40 arrivals over 15 distinct urls
        let mut arrivals: Vec<NewsEvent> = (0..40)
            .map(|i| ev(i, rng.random_range(0..15), rng.random_range(0..3_600)))
            .collect();
        arrivals.shuffle(&mut rng);

        let mut store = ReconciliationStore::new();
        let mut first_seen: Vec<NewsEvent> = Vec::new();
        let mut seen = HashSet::new();

        let mut rest = arrivals.as_slice();
        while !rest.is_empty() {
            // alternate between a batch and a single stream event
            let take = rng.random_range(1..=rest.len().min(5));
            let (chunk, tail) = rest.split_at(take);
            if rng.random_bool(0.5) {
                store.ingest_batch(chunk.to_vec());
            } else {
                for e in chunk {
                    store.ingest_one(e.clone());
                }
            }
            for e in chunk {
                if seen.insert(e.url.clone()) {
                    first_seen.push(e.clone());
                }
            }
            rest = tail;
        }

        let urls: HashSet<_> = store.snapshot().iter().map(|e| e.url.as_str()).collect();
        assert_eq!(urls.len(), store.len(), "duplicate url in store");
        // first-seen-wins: the stored payload is the first arrival for that url
        assert_eq!(store.snapshot(), first_seen.as_slice());
    }
}

#[test]
fn reingesting_the_same_set_changes_nothing() {
    let events: Vec<_> = (0..10).map(|i| ev(i, i, i as i64)).collect();

    let mut store = ReconciliationStore::new();
    let first = store.ingest_batch(events.clone());
    assert_eq!(first.inserted, 10);
    let before = store.snapshot().to_vec();
    let rev = store.revision();

    let again = store.ingest_batch(events.clone());
    assert_eq!(again.inserted, 0);
    assert_eq!(again.duplicates, 10);
    for e in events {
        store.ingest_one(e);
    }
    assert_eq!(store.snapshot(), before.as_slice());
    assert_eq!(store.revision(), rev);
}

#[test]
fn later_payload_for_a_known_url_is_discarded() {
    let mut store = ReconciliationStore::new();
    store.ingest_one(ev(1, 7, 0));
    let mut newer = ev(2, 7, 500);
    newer.title = "corrected headline".into();
    store.ingest_one(newer);

    assert_eq!(store.len(), 1);
    assert_eq!(store.snapshot()[0].title, "event 1");
    assert!(store.contains_url("https://news.fake/7"));
}
