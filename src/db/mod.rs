pub mod migrations;
pub mod models;
pub mod schema;

use anyhow::{Context, Result};
use chrono::{Duration, Utc};
use rusqlite::{Connection, OptionalExtension};
use std::path::{Path, PathBuf};
use tracing::info;
use uuid::Uuid;

use crate::filter::ArticleFilter;
use crate::query::{Order, Query};
use models::*;

pub struct Database {
    pub conn: Connection,
    pub path: PathBuf,
}

impl Database {
    /// Open (or create) the database at the given path.
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
        }

        let conn = Connection::open(path)
            .with_context(|| format!("Failed to open database: {}", path.display()))?;

        // Performance pragmas
        conn.execute_batch(
            "PRAGMA journal_mode = WAL;
             PRAGMA synchronous = NORMAL;
             PRAGMA foreign_keys = ON;",
        )?;

        schema::create_schema(&conn)?;
        migrations::run_migrations(&conn)?;

        info!("Opened database: {}", path.display());

        Ok(Database {
            conn,
            path: path.to_path_buf(),
        })
    }

    /// Default database path: ~/.artq/artq.db
    pub fn default_db_path() -> Result<PathBuf> {
        let home = dirs::home_dir().context("Could not determine home directory")?;
        Ok(home.join(".artq").join("artq.db"))
    }

    /// Insert an author, returning the id of the new or existing row.
    pub fn insert_author(&self, author: &NewAuthor) -> Result<i64> {
        self.conn.execute(
            "INSERT INTO authors (first_name, last_name) VALUES (?1, ?2)
             ON CONFLICT(first_name, last_name) DO NOTHING",
            rusqlite::params![author.first_name, author.last_name],
        )?;
        let id: i64 = self.conn.query_row(
            "SELECT id FROM authors WHERE first_name = ?1 AND last_name = ?2",
            rusqlite::params![author.first_name, author.last_name],
            |row| row.get(0),
        )?;
        Ok(id)
    }

    pub fn insert_article(&self, article: &NewArticle) -> Result<()> {
        self.conn.execute(
            "INSERT OR REPLACE INTO articles (id, title, summary, status, inserted_at, author_id)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            rusqlite::params![
                article.id,
                article.title,
                article.summary,
                article.status,
                format_timestamp(article.inserted_at),
                article.author_id,
            ],
        )?;
        Ok(())
    }

    /// Get a single article by ID.
    pub fn get_article(&self, id: &str) -> Result<Option<Article>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, title, summary, status, inserted_at, author_id
             FROM articles WHERE id = ?1",
        )?;

        let result = stmt
            .query_row([id], |row| {
                Ok(Article {
                    id: row.get(0)?,
                    title: row.get(1)?,
                    summary: row.get(2)?,
                    status: row.get(3)?,
                    inserted_at: row.get(4)?,
                    author_id: row.get(5)?,
                })
            })
            .optional()?;

        Ok(result)
    }

    pub fn get_author(&self, id: i64) -> Result<Option<Author>> {
        let mut stmt = self
            .conn
            .prepare("SELECT id, first_name, last_name FROM authors WHERE id = ?1")?;
        let result = stmt
            .query_row([id], |row| {
                Ok(Author {
                    id: row.get(0)?,
                    first_name: row.get(1)?,
                    last_name: row.get(2)?,
                })
            })
            .optional()?;
        Ok(result)
    }

    /// Run the filter pipeline against the archive.
    pub fn list_articles(
        &self,
        filter: &ArticleFilter,
        sort: &str,
        limit: usize,
    ) -> Result<Vec<ArticleResult>> {
        let query = filter.apply(Query::articles().order_by(Order::from_flag(sort)));
        self.run_query(&query, limit)
    }

    /// Execute a built query value. The only place queries touch the database.
    pub fn run_query(&self, query: &Query, limit: usize) -> Result<Vec<ArticleResult>> {
        let (sql, params) = query.to_sql(limit);
        let mut stmt = self.conn.prepare(&sql)?;

        let param_refs: Vec<&dyn rusqlite::types::ToSql> =
            params.iter().map(|p| p.as_ref()).collect();

        let rows = stmt.query_map(param_refs.as_slice(), |row| {
            Ok(Article {
                id: row.get(0)?,
                title: row.get(1)?,
                summary: row.get(2)?,
                status: row.get(3)?,
                inserted_at: row.get(4)?,
                author_id: row.get(5)?,
            })
        })?;

        let mut articles = Vec::new();
        for row in rows {
            articles.push(row?);
        }

        // Resolve author names for display
        let mut name_stmt = self
            .conn
            .prepare("SELECT first_name || ' ' || last_name FROM authors WHERE id = ?1")?;
        let mut results = Vec::with_capacity(articles.len());
        for article in articles {
            let author: String = name_stmt.query_row([article.author_id], |row| row.get(0))?;
            results.push(ArticleResult {
                id: article.id,
                title: article.title,
                summary: article.summary,
                status: article.status,
                inserted_at: article.inserted_at,
                author,
            });
        }
        Ok(results)
    }

    /// Get database statistics.
    pub fn stats(&self) -> Result<DbStats> {
        let authors: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM authors", [], |r| r.get(0))?;
        let articles: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM articles", [], |r| r.get(0))?;

        let mut stmt = self
            .conn
            .prepare("SELECT status, COUNT(*) FROM articles GROUP BY status ORDER BY status")?;
        let status_rows = stmt.query_map([], |row| {
            Ok(StatusCount {
                status: row.get(0)?,
                count: row.get(1)?,
            })
        })?;
        let mut statuses = Vec::new();
        for row in status_rows {
            statuses.push(row?);
        }

        let db_size_bytes = std::fs::metadata(&self.path).map(|m| m.len()).unwrap_or(0);

        Ok(DbStats {
            authors,
            articles,
            statuses,
            db_size_bytes,
        })
    }

    /// Populate a handful of authors and articles so the example is runnable
    /// out of the box. No-op when the archive already has articles.
    pub fn seed_demo_data(&self) -> Result<usize> {
        let existing: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM articles", [], |r| r.get(0))?;
        if existing > 0 {
            return Ok(0);
        }

        let ada = self.insert_author(&NewAuthor {
            first_name: "Ada".to_string(),
            last_name: "Lovelace".to_string(),
        })?;
        let grace = self.insert_author(&NewAuthor {
            first_name: "Grace".to_string(),
            last_name: "Hopper".to_string(),
        })?;
        let edsger = self.insert_author(&NewAuthor {
            first_name: "Edsger".to_string(),
            last_name: "Dijkstra".to_string(),
        })?;

        let now = Utc::now();
        let demo: &[(&str, &str, ArticleStatus, i64, i64)] = &[
            (
                "Notes on the Analytical Engine",
                "Observations on programmable computation.",
                ArticleStatus::Published,
                5,
                ada,
            ),
            (
                "Sketch of a Compiler",
                "From arithmetic notation to machine orders.",
                ArticleStatus::Published,
                12,
                grace,
            ),
            (
                "Flow-Matic Memoranda",
                "Early notes on English-like data processing.",
                ArticleStatus::Draft,
                2,
                grace,
            ),
            (
                "On the Cruelty of Really Teaching Computing Science",
                "A transcript of remarks on curriculum design.",
                ArticleStatus::Published,
                70,
                edsger,
            ),
            (
                "Go To Statement Considered Harmful",
                "A letter on structured control flow.",
                ArticleStatus::Archived,
                400,
                edsger,
            ),
            (
                "A Discipline of Programming",
                "Working chapter drafts.",
                ArticleStatus::Draft,
                45,
                edsger,
            ),
        ];

        for (title, summary, status, age_days, author_id) in demo {
            self.insert_article(&NewArticle {
                id: Uuid::new_v4().to_string(),
                title: (*title).to_string(),
                summary: (*summary).to_string(),
                status: *status,
                inserted_at: now - Duration::days(*age_days),
                author_id: *author_id,
            })?;
        }

        info!("Seeded {} demo articles", demo.len());
        Ok(demo.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_db() -> (tempfile::TempDir, Database) {
        let dir = tempfile::tempdir().unwrap();
        let db = Database::open(&dir.path().join("artq.db")).unwrap();
        (dir, db)
    }

    fn insert(db: &Database, title: &str, status: ArticleStatus, age_days: i64, author_id: i64) {
        db.insert_article(&NewArticle {
            id: Uuid::new_v4().to_string(),
            title: title.to_string(),
            summary: String::new(),
            status,
            inserted_at: Utc::now() - Duration::days(age_days),
            author_id,
        })
        .unwrap();
    }

    fn author(db: &Database, first: &str, last: &str) -> i64 {
        db.insert_author(&NewAuthor {
            first_name: first.to_string(),
            last_name: last.to_string(),
        })
        .unwrap()
    }

    #[test]
    fn empty_filter_returns_everything_newest_first() {
        let (_dir, db) = test_db();
        let ada = author(&db, "Ada", "Lovelace");
        insert(&db, "old", ArticleStatus::Published, 40, ada);
        insert(&db, "new", ArticleStatus::Draft, 1, ada);

        let rows = db
            .list_articles(&ArticleFilter::default(), "date", 50)
            .unwrap();
        let titles: Vec<_> = rows.iter().map(|r| r.title.as_str()).collect();
        assert_eq!(titles, vec!["new", "old"]);
    }

    #[test]
    fn title_filter_matches_exactly() {
        let (_dir, db) = test_db();
        let ada = author(&db, "Ada", "Lovelace");
        insert(&db, "hello", ArticleStatus::Published, 1, ada);
        insert(&db, "hello world", ArticleStatus::Published, 1, ada);

        let filter = ArticleFilter {
            title_eq: Some("hello".to_string()),
            ..Default::default()
        };
        let rows = db.list_articles(&filter, "date", 50).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].title, "hello");
    }

    #[test]
    fn empty_status_set_matches_no_rows() {
        let (_dir, db) = test_db();
        let ada = author(&db, "Ada", "Lovelace");
        insert(&db, "a", ArticleStatus::Draft, 1, ada);
        insert(&db, "b", ArticleStatus::Published, 1, ada);

        let filter = ArticleFilter {
            status_in: Some(Vec::new()),
            ..Default::default()
        };
        assert!(db.list_articles(&filter, "date", 50).unwrap().is_empty());
    }

    #[test]
    fn status_set_matches_member_rows() {
        let (_dir, db) = test_db();
        let ada = author(&db, "Ada", "Lovelace");
        insert(&db, "a", ArticleStatus::Draft, 1, ada);
        insert(&db, "b", ArticleStatus::Published, 2, ada);
        insert(&db, "c", ArticleStatus::Archived, 3, ada);

        let filter = ArticleFilter {
            status_in: Some(vec![ArticleStatus::Draft, ArticleStatus::Published]),
            ..Default::default()
        };
        let rows = db.list_articles(&filter, "title", 50).unwrap();
        let titles: Vec<_> = rows.iter().map(|r| r.title.as_str()).collect();
        assert_eq!(titles, vec!["a", "b"]);
    }

    #[test]
    fn author_name_filters_select_only_that_author() {
        let (_dir, db) = test_db();
        let ada = author(&db, "Ada", "Lovelace");
        let grace = author(&db, "Grace", "Hopper");
        insert(&db, "by ada", ArticleStatus::Published, 1, ada);
        insert(&db, "by grace", ArticleStatus::Published, 1, grace);

        let filter = ArticleFilter {
            author_first_name_eq: Some("Ada".to_string()),
            author_last_name_eq: Some("Lovelace".to_string()),
            ..Default::default()
        };
        let rows = db.list_articles(&filter, "date", 50).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].author, "Ada Lovelace");
    }

    #[test]
    fn most_relevant_excludes_old_and_unpublished() {
        let (_dir, db) = test_db();
        let ada = author(&db, "Ada", "Lovelace");
        insert(&db, "recent published", ArticleStatus::Published, 3, ada);
        insert(&db, "old published", ArticleStatus::Published, 60, ada);
        insert(&db, "recent draft", ArticleStatus::Draft, 3, ada);

        let filter = ArticleFilter {
            most_relevant: Some(true),
            ..Default::default()
        };
        let rows = db.list_articles(&filter, "date", 50).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].title, "recent published");
    }

    #[test]
    fn seed_is_idempotent() {
        let (_dir, db) = test_db();
        let seeded = db.seed_demo_data().unwrap();
        assert!(seeded > 0);
        assert_eq!(db.seed_demo_data().unwrap(), 0);

        let stats = db.stats().unwrap();
        assert_eq!(stats.articles, seeded as i64);
        assert_eq!(stats.authors, 3);
    }
}
