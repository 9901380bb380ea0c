mod common;

use std::time::Duration;

use common::{census_fixture, setup_sqlite, RecordingStore};
use content_index::db;
use content_index::fixtures;
use content_index::index::{self, IndexError, IndexSettings, PageRequest, RequestScope};
use content_index::model::UNCATEGORIZED;
use content_index::store::{ContentStore, InMemoryStore};

fn scope() -> RequestScope {
    RequestScope::new(Duration::from_secs(5))
}

#[tokio::test]
async fn home_view_merges_every_section() {
    let store = census_fixture();
    let view = index::home_view(&store, &IndexSettings::default(), &scope())
        .await
        .unwrap();

    let counts: Vec<(&str, u64)> = view
        .category_counts
        .iter()
        .map(|c| (c.category.as_str(), c.count))
        .collect();
    assert_eq!(counts, vec![("A", 2), ("B", 0), ("C", 1)]);

    let popular: Vec<i64> = view.popular_items.iter().map(|v| v.item.views).collect();
    assert_eq!(popular, vec![10, 5, 1, 0]);

    assert_eq!(view.editors_choice_items.len(), 1);
    assert_eq!(view.editors_choice_items[0].category, "A");
    assert_eq!(view.distinct_tags, vec!["x", "y"]);
    assert_eq!(view.items_by_category.get("A").unwrap().len(), 2);
    assert!(view.items_by_category.get("B").unwrap().is_empty());
    assert_eq!(view.catalog.len(), 4);
    assert_eq!(view.catalog[3].category, UNCATEGORIZED);
    assert_eq!(view.settings[0].value, "Demo");
}

#[tokio::test]
async fn census_never_exceeds_total_items() {
    let store = census_fixture();
    let view = index::home_view(&store, &IndexSettings::default(), &scope())
        .await
        .unwrap();
    let total = store
        .count_items(&content_index::store::ItemFilter::All)
        .await
        .unwrap();
    assert!(view.category_counts.total() <= total);
    assert_eq!(view.category_counts.total(), total - 1);
}

#[tokio::test]
async fn listing_view_reports_pagination() {
    let store = InMemoryStore::new();
    let tech = store.insert_category("Tech").unwrap();
    for i in 0..15 {
        store
            .insert_item(
                content_index::model::NewContentItem::new(format!("post {i}"))
                    .category(tech)
                    .views(i),
            )
            .unwrap();
    }
    let settings = IndexSettings::default();

    let view = index::listing_view(
        &store,
        &settings,
        &scope(),
        PageRequest::parse(Some("2")),
        Some("Tech"),
    )
    .await
    .unwrap();
    assert_eq!(view.page.items.len(), 5);
    assert_eq!(view.page.total_pages, 2);
    assert_eq!(view.page.starting_count, 11);
    assert_eq!(view.popular_items.len(), 10);
    assert_eq!(view.category_counts.get("Tech"), Some(15));

    let json = serde_json::to_value(&view).unwrap();
    assert_eq!(json["total_pages"], 2);
    assert_eq!(json["starting_count"], 11);
    assert_eq!(json["category"], "Tech");
}

#[tokio::test]
async fn listing_for_unknown_category_is_not_found() {
    let store = census_fixture();
    let err = index::listing_view(
        &store,
        &IndexSettings::default(),
        &scope(),
        PageRequest::FIRST,
        Some("Missing"),
    )
    .await
    .unwrap_err();
    assert!(matches!(err, IndexError::NotFound(name) if name == "Missing"));
}

#[tokio::test]
async fn dashboard_counts_collections() {
    let store = census_fixture();
    let view = index::dashboard_view(&store, &scope()).await.unwrap();
    assert_eq!(view.item_count, 4);
    assert_eq!(view.category_count, 3);
    assert_eq!(view.subscriber_count, 1);
}

#[tokio::test]
async fn failed_count_fails_the_whole_view() {
    let store = RecordingStore::new(census_fixture()).fail_on("count_items");
    let err = index::home_view(&store, &IndexSettings::default(), &scope())
        .await
        .unwrap_err();
    assert!(matches!(err, IndexError::BackendUnavailable(_)));
    assert!(err.to_string().contains("injected failure"));
}

#[tokio::test]
async fn failed_slice_fails_the_listing_view() {
    let store = RecordingStore::new(census_fixture()).fail_on("find_items");
    let err = index::listing_view(
        &store,
        &IndexSettings::default(),
        &scope(),
        PageRequest::FIRST,
        Some("A"),
    )
    .await
    .unwrap_err();
    assert!(matches!(err, IndexError::BackendUnavailable(_)));
    assert!(err.to_string().contains("injected failure in find_items"));
}

#[tokio::test]
async fn failed_category_listing_fails_census() {
    let store = RecordingStore::new(census_fixture()).fail_on("list_categories");
    let err = index::census(&store).await.unwrap_err();
    assert!(matches!(err, IndexError::BackendUnavailable(_)));
    assert_eq!(store.count_calls("count_items"), 0);
}

#[tokio::test]
async fn zero_categories_issue_no_counts() {
    let store = RecordingStore::new(InMemoryStore::new());
    let census = index::census(&store).await.unwrap();
    assert!(census.is_empty());
    assert_eq!(store.count_calls("count_items"), 0);
}

#[tokio::test(start_paused = true)]
async fn census_counts_run_concurrently() {
    let store =
        RecordingStore::new(census_fixture()).with_delay(Duration::from_millis(100));
    let census = index::census(&store).await.unwrap();
    assert_eq!(census.len(), 3);
    assert_eq!(store.count_calls("count_items"), 3);
    assert_eq!(store.max_in_flight(), 3);
}

#[tokio::test(start_paused = true)]
async fn home_view_fans_out() {
    let store =
        RecordingStore::new(census_fixture()).with_delay(Duration::from_millis(100));
    index::home_view(&store, &IndexSettings::default(), &scope())
        .await
        .unwrap();
    // list_categories, popular, recent, editors' choice, tags, catalog and
    // settings all start together.
    assert!(store.max_in_flight() >= 7);
}

#[tokio::test(start_paused = true)]
async fn deadline_aborts_slow_views() {
    let store = RecordingStore::new(census_fixture()).with_delay(Duration::from_secs(30));
    let scope = RequestScope::new(Duration::from_millis(200));
    let err = index::dashboard_view(&store, &scope).await.unwrap_err();
    assert!(matches!(err, IndexError::DeadlineExceeded(_)));
}

#[tokio::test(start_paused = true)]
async fn cancellation_aborts_in_flight_views() {
    let store = RecordingStore::new(census_fixture()).with_delay(Duration::from_secs(30));
    let scope = RequestScope::new(Duration::from_secs(60));
    let canceller = scope.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(50)).await;
        canceller.cancel();
    });
    let err = index::home_view(&store, &IndexSettings::default(), &scope)
        .await
        .unwrap_err();
    assert!(matches!(err, IndexError::Cancelled));
}

#[tokio::test]
async fn sqlite_backend_serves_home_and_listing() {
    let store = setup_sqlite().await;
    let fixture = fixtures::parse(
        r#"
categories: [A, B, C]
items:
  - title: "a one"
    category: A
    views: 10
    created_at: 2024-01-01T00:00:00Z
  - title: "a two"
    category: A
    views: 5
    editors_choice: true
    created_at: 2024-01-03T00:00:00Z
  - title: "c one"
    category: C
    views: 1
    tags: [x]
    created_at: 2024-01-02T00:00:00Z
  - title: "loose"
    tags: [y, x]
    created_at: 2024-01-04T00:00:00Z
settings:
  site_title: Demo
"#,
    )
    .unwrap();
    fixtures::seed(store.pool(), &fixture).await.unwrap();

    let settings = IndexSettings::default();
    let home = index::home_view(&store, &settings, &scope()).await.unwrap();
    let counts: Vec<(&str, u64)> = home
        .category_counts
        .iter()
        .map(|c| (c.category.as_str(), c.count))
        .collect();
    assert_eq!(counts, vec![("A", 2), ("B", 0), ("C", 1)]);
    let recent: Vec<&str> = home
        .recent_items
        .iter()
        .map(|v| v.item.title.as_str())
        .collect();
    assert_eq!(recent, vec!["loose", "a two", "c one", "a one"]);
    assert_eq!(home.distinct_tags, vec!["x", "y"]);

    let listing = index::listing_view(&store, &settings, &scope(), PageRequest::FIRST, None)
        .await
        .unwrap();
    assert_eq!(listing.page.total_items, 4);
    assert_eq!(listing.page.total_pages, 1);
    assert_eq!(listing.page.items[3].category, UNCATEGORIZED);
}

#[tokio::test]
async fn sqlite_dangling_category_renders_uncategorized() {
    let store = setup_sqlite().await;
    let gone = db::insert_category(store.pool(), "Gone").await.unwrap();
    db::insert_item(
        store.pool(),
        &content_index::model::NewContentItem::new("orphan").category(gone),
    )
    .await
    .unwrap();
    db::delete_category(store.pool(), gone).await.unwrap();

    let items = index::catalog_view(&store, &scope()).await.unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0].category, UNCATEGORIZED);
}
