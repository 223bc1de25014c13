//! Integration tests for the SQLite book repository.

use shelf_core::{CatalogEntry, Filter, UpstreamBook};
use shelf_metadata::{BookRepo, MetadataError, MetadataStore, SqliteStore};
use serde_json::json;
use tempfile::TempDir;

/// A test store wrapper that cleans up on drop.
struct TestStore {
    store: SqliteStore,
    _temp_dir: TempDir,
}

impl TestStore {
    async fn new() -> Self {
        let temp_dir = tempfile::tempdir().expect("Failed to create temp directory");
        let store = SqliteStore::new(temp_dir.path().join("shelf.db"), None)
            .await
            .expect("Failed to create metadata store");
        Self {
            store,
            _temp_dir: temp_dir,
        }
    }
}

fn entry(value: serde_json::Value) -> CatalogEntry {
    UpstreamBook::from_value(&value)
        .and_then(UpstreamBook::into_entry)
        .expect("valid record")
}

fn sample_entry() -> CatalogEntry {
    entry(json!({
        "title": "T",
        "author": "A",
        "isbns": [{"isbn10": "123"}],
        "ranks_history": [{"rank": 1, "list_name": "L"}],
        "reviews": []
    }))
}

#[tokio::test]
async fn test_store_book_with_children() {
    let test = TestStore::new().await;
    let store = &test.store;

    let stored = store.store_book(&sample_entry()).await.unwrap();
    assert_eq!(stored.identifiers, 1);
    assert_eq!(stored.ranks, 1);
    assert_eq!(stored.reviews, 0);

    let record = store.get_book(stored.book_id).await.unwrap().unwrap();
    assert_eq!(record.book.title, "T");
    assert_eq!(record.book.author, "A");
    assert_eq!(record.isbns.len(), 1);
    assert_eq!(record.isbns[0].kind, "isbn10");
    assert_eq!(record.isbns[0].number, "123");
    assert_eq!(record.ranks_history.len(), 1);
    assert_eq!(record.ranks_history[0].rank, Some(1));
    assert_eq!(record.ranks_history[0].list_name.as_deref(), Some("L"));
    assert_eq!(record.ranks_history[0].weeks_on_list, 0);
    assert!(!record.ranks_history[0].asterisk);
    assert!(record.reviews.is_empty());
    assert_eq!(store.count_books().await.unwrap(), 1);
}

#[tokio::test]
async fn test_full_record_fields_roundtrip() {
    let test = TestStore::new().await;
    let store = &test.store;

    let stored = store
        .store_book(&entry(json!({
            "title": "THE BOOK",
            "author": "Some Author",
            "description": "A story",
            "contributor": "by Some Author",
            "contributor_note": "",
            "price": "27.99",
            "publisher": "Pub",
            "isbns": [{"isbn10": "0123456789", "isbn13": "9780123456789"}],
            "ranks_history": [{
                "primary_isbn10": "0123456789",
                "primary_isbn13": "9780123456789",
                "rank": 4,
                "list_name": "Hardcover Fiction",
                "display_name": "Hardcover Fiction",
                "published_date": "2024-01-07",
                "bestsellers_date": "2023-12-23",
                "weeks_on_list": 12,
                "rank_last_week": 3,
                "asterisk": 0,
                "dagger": 1
            }],
            "reviews": [{
                "source": "NYT",
                "summary": "Good",
                "url": "https://example.test/review",
                "byline": "Critic",
                "publication_date": "2024-01-01",
                "rating": 4
            }]
        })))
        .await
        .unwrap();

    let record = store.get_book(stored.book_id).await.unwrap().unwrap();
    assert_eq!(record.book.price, Some(27.99));
    assert_eq!(record.book.publisher.as_deref(), Some("Pub"));
    assert_eq!(record.isbns.len(), 2);

    let rank = &record.ranks_history[0];
    assert_eq!(rank.weeks_on_list, 12);
    assert_eq!(rank.ranks_last_week, Some(3));
    assert_eq!(rank.published_date.as_deref(), Some("2024-01-07"));
    assert!(!rank.asterisk);
    assert!(rank.dagger);

    let review = &record.reviews[0];
    assert_eq!(review.source.as_deref(), Some("NYT"));
    assert_eq!(review.byline.as_deref(), Some("Critic"));
    assert_eq!(review.rating, Some(4));
}

#[tokio::test]
async fn test_duplicate_number_rolls_back_whole_record() {
    let test = TestStore::new().await;
    let store = &test.store;

    let duplicated = entry(json!({
        "title": "T",
        "author": "A",
        "isbns": [{"isbn10": "123"}, {"isbn10": "123"}],
        "ranks_history": [{"rank": 1, "list_name": "L"}]
    }));

    let err = store.store_book(&duplicated).await.unwrap_err();
    assert!(matches!(err, MetadataError::Constraint(_)), "got {err:?}");

    // Neither the book nor its rank survived.
    assert_eq!(store.count_books().await.unwrap(), 0);
    let ranks: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM book_ranks")
        .fetch_one(store.pool())
        .await
        .unwrap();
    assert_eq!(ranks, 0);
}

#[tokio::test]
async fn test_reingestion_appends_history() {
    let test = TestStore::new().await;
    let store = &test.store;

    let first = store.store_book(&sample_entry()).await.unwrap();
    let second = store.store_book(&sample_entry()).await.unwrap();
    assert_ne!(first.book_id, second.book_id);

    let ranks: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM book_ranks")
        .fetch_one(store.pool())
        .await
        .unwrap();
    assert_eq!(ranks, 2);

    // One number row per (kind, number, book).
    let per_book: Vec<(i64,)> = sqlx::query_as(
        "SELECT COUNT(*) FROM book_numbers WHERE kind = 'isbn10' AND number = '123' GROUP BY book_id",
    )
    .fetch_all(store.pool())
    .await
    .unwrap();
    assert_eq!(per_book, vec![(1,), (1,)]);

    let found = store.find_books_by_isbn("123").await.unwrap();
    assert_eq!(found.len(), 2);
}

#[tokio::test]
async fn test_search_books() {
    let test = TestStore::new().await;
    let store = &test.store;

    for (title, author, isbn) in [
        ("Winter Tale", "Jane Roe", "1111111111"),
        ("Summer Tale", "John Doe", "2222222222"),
        ("Autumn Notes", "John Doe", "3333333333"),
    ] {
        store
            .store_book(&entry(json!({
                "title": title,
                "author": author,
                "isbns": [{"isbn10": isbn}]
            })))
            .await
            .unwrap();
    }

    let all = store.search_books(&Filter::default(), 20).await.unwrap();
    assert_eq!(all.len(), 3);
    assert_eq!(all[0].book.title, "Winter Tale");

    let by_author = Filter {
        author: Some("Doe".into()),
        ..Default::default()
    };
    assert_eq!(store.search_books(&by_author, 20).await.unwrap().len(), 2);

    let by_title = Filter {
        author: Some("John".into()),
        title: Some("Tale".into()),
        ..Default::default()
    };
    let found = store.search_books(&by_title, 20).await.unwrap();
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].book.title, "Summer Tale");

    let by_isbn = Filter {
        isbns: Some(vec!["3333333333".into(), "1111111111".into()]),
        ..Default::default()
    };
    assert_eq!(store.search_books(&by_isbn, 20).await.unwrap().len(), 2);

    let limited = store.search_books(&Filter::default(), 2).await.unwrap();
    assert_eq!(limited.len(), 2);

    let past_end = Filter {
        offset: Some(20),
        ..Default::default()
    };
    assert!(store.search_books(&past_end, 20).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_missing_book() {
    let test = TestStore::new().await;
    assert!(
        test.store
            .get_book(uuid::Uuid::new_v4())
            .await
            .unwrap()
            .is_none()
    );
    assert!(test.store.find_books_by_isbn("0000000000").await.unwrap().is_empty());
    test.store.health_check().await.unwrap();
}
