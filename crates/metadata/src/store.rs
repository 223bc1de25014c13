//! Metadata store trait and the SQLite implementation.

use crate::error::{MetadataError, MetadataResult};
use crate::repos::BookRepo;
use async_trait::async_trait;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::{Pool, Sqlite};
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

/// Combined metadata store trait.
#[async_trait]
pub trait MetadataStore: BookRepo + Send + Sync {
    /// Create tables and indexes if missing.
    async fn migrate(&self) -> MetadataResult<()>;

    /// Check database connectivity and health.
    async fn health_check(&self) -> MetadataResult<()>;
}

/// SQLite-based metadata store.
pub struct SqliteStore {
    pool: Pool<Sqlite>,
    query_timeout_secs: u64,
}

impl SqliteStore {
    /// Open (or create) the database at `path` and apply the schema.
    pub async fn new(
        path: impl AsRef<Path>,
        query_timeout_secs: Option<u64>,
    ) -> MetadataResult<Self> {
        let path = path.as_ref();
        let query_timeout_secs = query_timeout_secs.unwrap_or(600);

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let opts = SqliteConnectOptions::from_str(&format!("sqlite:{}?mode=rwc", path.display()))?
            .create_if_missing(true)
            .journal_mode(sqlx::sqlite::SqliteJournalMode::Wal)
            .synchronous(sqlx::sqlite::SqliteSynchronous::Normal)
            .foreign_keys(true)
            // Prevent transient "database is locked" errors under concurrent access.
            .busy_timeout(Duration::from_secs(5));

        let pool = SqlitePoolOptions::new()
            // One writer at a time; concurrent ingestions queue on the pool.
            .max_connections(1)
            .acquire_timeout(Duration::from_secs(query_timeout_secs))
            .connect_with(opts)
            .await?;

        let store = Self {
            pool,
            query_timeout_secs,
        };
        store.migrate().await?;

        tracing::debug!(
            path = %path.display(),
            query_timeout_secs = store.query_timeout_secs,
            "SQLite metadata store opened"
        );

        Ok(store)
    }

    /// Get a reference to the connection pool.
    pub fn pool(&self) -> &Pool<Sqlite> {
        &self.pool
    }
}

#[async_trait]
impl MetadataStore for SqliteStore {
    async fn migrate(&self) -> MetadataResult<()> {
        sqlx::query(SCHEMA_SQL).execute(&self.pool).await?;
        Ok(())
    }

    async fn health_check(&self) -> MetadataResult<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}

mod sqlite_impl {
    use super::*;
    use crate::models::*;
    use crate::repos::StoredBook;
    use shelf_core::{CatalogEntry, Filter};
    use sqlx::QueryBuilder;
    use time::OffsetDateTime;
    use uuid::Uuid;

    impl SqliteStore {
        /// Load the related rows of each book, preserving order.
        async fn hydrate(&self, books: Vec<BookRow>) -> MetadataResult<Vec<BookRecord>> {
            let mut records = Vec::with_capacity(books.len());
            for book in books {
                let isbns = sqlx::query_as::<_, BookNumberRow>(
                    "SELECT * FROM book_numbers WHERE book_id = ? ORDER BY id",
                )
                .bind(book.book_id)
                .fetch_all(&self.pool)
                .await?;

                let ranks_history = sqlx::query_as::<_, BookRankRow>(
                    "SELECT * FROM book_ranks WHERE book_id = ? ORDER BY id",
                )
                .bind(book.book_id)
                .fetch_all(&self.pool)
                .await?;

                let reviews = sqlx::query_as::<_, BookReviewRow>(
                    "SELECT * FROM book_reviews WHERE book_id = ? ORDER BY id",
                )
                .bind(book.book_id)
                .fetch_all(&self.pool)
                .await?;

                records.push(BookRecord {
                    book,
                    isbns,
                    ranks_history,
                    reviews,
                });
            }
            Ok(records)
        }
    }

    #[async_trait]
    impl BookRepo for SqliteStore {
        async fn store_book(&self, entry: &CatalogEntry) -> MetadataResult<StoredBook> {
            let book_id = Uuid::new_v4();
            let now = OffsetDateTime::now_utc();
            let book = &entry.book;

            // Dropping `tx` on an early return rolls everything back.
            let mut tx = self.pool.begin().await?;

            sqlx::query(
                r#"
                INSERT INTO books (book_id, title, description, contributor, author,
                    contributor_note, price, publisher, created_at, updated_at)
                VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
                "#,
            )
            .bind(book_id)
            .bind(&book.title)
            .bind(&book.description)
            .bind(&book.contributor)
            .bind(&book.author)
            .bind(&book.contributor_note)
            .bind(book.price)
            .bind(&book.publisher)
            .bind(now)
            .bind(now)
            .execute(&mut *tx)
            .await
            .map_err(|e| MetadataError::from_insert(e, "books"))?;

            for identifier in &entry.identifiers {
                sqlx::query(
                    "INSERT INTO book_numbers (book_id, kind, number, created_at) VALUES (?, ?, ?, ?)",
                )
                .bind(book_id)
                .bind(identifier.kind.as_str())
                .bind(&identifier.value)
                .bind(now)
                .execute(&mut *tx)
                .await
                .map_err(|e| MetadataError::from_insert(e, "book_numbers"))?;
            }

            for rank in &entry.ranks {
                sqlx::query(
                    r#"
                    INSERT INTO book_ranks (book_id, primary_isbn10, primary_isbn13, rank,
                        list_name, display_name, published_date, bestsellers_date,
                        weeks_on_list, ranks_last_week, asterisk, dagger, created_at)
                    VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
                    "#,
                )
                .bind(book_id)
                .bind(&rank.primary_isbn10)
                .bind(&rank.primary_isbn13)
                .bind(rank.rank)
                .bind(&rank.list_name)
                .bind(&rank.display_name)
                .bind(&rank.published_date)
                .bind(&rank.bestsellers_date)
                .bind(rank.weeks_on_list)
                .bind(rank.rank_last_week)
                .bind(rank.asterisk)
                .bind(rank.dagger)
                .bind(now)
                .execute(&mut *tx)
                .await
                .map_err(|e| MetadataError::from_insert(e, "book_ranks"))?;
            }

            for review in &entry.reviews {
                sqlx::query(
                    r#"
                    INSERT INTO book_reviews (book_id, source, summary, url, byline,
                        publication_date, rating, created_at)
                    VALUES (?, ?, ?, ?, ?, ?, ?, ?)
                    "#,
                )
                .bind(book_id)
                .bind(&review.source)
                .bind(&review.summary)
                .bind(&review.url)
                .bind(&review.byline)
                .bind(&review.publication_date)
                .bind(review.rating)
                .bind(now)
                .execute(&mut *tx)
                .await
                .map_err(|e| MetadataError::from_insert(e, "book_reviews"))?;
            }

            tx.commit().await?;

            Ok(StoredBook {
                book_id,
                identifiers: entry.identifiers.len(),
                ranks: entry.ranks.len(),
                reviews: entry.reviews.len(),
            })
        }

        async fn get_book(&self, book_id: Uuid) -> MetadataResult<Option<BookRecord>> {
            let row = sqlx::query_as::<_, BookRow>("SELECT * FROM books WHERE book_id = ?")
                .bind(book_id)
                .fetch_optional(&self.pool)
                .await?;
            match row {
                Some(book) => Ok(self.hydrate(vec![book]).await?.pop()),
                None => Ok(None),
            }
        }

        async fn search_books(
            &self,
            filter: &Filter,
            limit: u32,
        ) -> MetadataResult<Vec<BookRecord>> {
            let mut qb = QueryBuilder::<Sqlite>::new("SELECT * FROM books WHERE 1 = 1");

            if let Some(author) = &filter.author {
                qb.push(" AND author LIKE ").push_bind(format!("%{author}%"));
            }
            if let Some(title) = &filter.title {
                qb.push(" AND title LIKE ").push_bind(format!("%{title}%"));
            }
            if let Some(isbns) = filter.isbns.as_ref().filter(|isbns| !isbns.is_empty()) {
                qb.push(" AND book_id IN (SELECT book_id FROM book_numbers WHERE number IN (");
                let mut separated = qb.separated(", ");
                for isbn in isbns {
                    separated.push_bind(isbn.clone());
                }
                separated.push_unseparated("))");
            }

            qb.push(" ORDER BY created_at, rowid LIMIT ")
                .push_bind(i64::from(limit))
                .push(" OFFSET ")
                .push_bind(i64::from(filter.offset.unwrap_or(0)));

            let books = qb
                .build_query_as::<BookRow>()
                .fetch_all(&self.pool)
                .await?;
            self.hydrate(books).await
        }

        async fn find_books_by_isbn(&self, isbn: &str) -> MetadataResult<Vec<BookRecord>> {
            let books = sqlx::query_as::<_, BookRow>(
                r#"
                SELECT * FROM books
                WHERE book_id IN (SELECT book_id FROM book_numbers WHERE number = ?)
                ORDER BY created_at, rowid
                "#,
            )
            .bind(isbn)
            .fetch_all(&self.pool)
            .await?;
            self.hydrate(books).await
        }

        async fn count_books(&self) -> MetadataResult<u64> {
            let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM books")
                .fetch_one(&self.pool)
                .await?;
            Ok(count as u64)
        }
    }
}

const SCHEMA_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS books (
    book_id BLOB PRIMARY KEY,
    title TEXT NOT NULL,
    description TEXT,
    contributor TEXT,
    author TEXT NOT NULL,
    contributor_note TEXT,
    price REAL,
    publisher TEXT,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_books_author ON books(author);
CREATE INDEX IF NOT EXISTS idx_books_title ON books(title);

-- Book numbers (ISBN-10 / ISBN-13); no duplicate number per book
CREATE TABLE IF NOT EXISTS book_numbers (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    book_id BLOB NOT NULL REFERENCES books(book_id) ON DELETE CASCADE,
    kind TEXT NOT NULL,
    number VARCHAR(20) NOT NULL,
    created_at TEXT NOT NULL,
    UNIQUE (kind, number, book_id)
);
CREATE INDEX IF NOT EXISTS idx_book_numbers_kind_number ON book_numbers(kind, number);
CREATE INDEX IF NOT EXISTS idx_book_numbers_number ON book_numbers(number);

-- Rank history (append-only)
CREATE TABLE IF NOT EXISTS book_ranks (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    book_id BLOB NOT NULL REFERENCES books(book_id) ON DELETE CASCADE,
    primary_isbn10 TEXT,
    primary_isbn13 TEXT,
    rank INTEGER,
    list_name TEXT,
    display_name TEXT,
    published_date TEXT,
    bestsellers_date TEXT,
    weeks_on_list INTEGER NOT NULL DEFAULT 0,
    ranks_last_week INTEGER,
    asterisk INTEGER NOT NULL DEFAULT 0,
    dagger INTEGER NOT NULL DEFAULT 0,
    created_at TEXT NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_book_ranks_book_list_date
    ON book_ranks(book_id, list_name, published_date);

-- Reviews (append-only)
CREATE TABLE IF NOT EXISTS book_reviews (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    book_id BLOB NOT NULL REFERENCES books(book_id) ON DELETE CASCADE,
    source TEXT,
    summary TEXT,
    url TEXT,
    byline TEXT,
    publication_date TEXT,
    rating INTEGER,
    created_at TEXT NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_book_reviews_book ON book_reviews(book_id);
"#;
