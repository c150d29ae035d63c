use chrono::{DateTime, Utc};
use clap::ValueEnum;
use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, ValueRef};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Publication state of an article. Stored as lowercase text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ArticleStatus {
    Draft,
    Published,
    Archived,
}

impl ArticleStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Draft => "draft",
            Self::Published => "published",
            Self::Archived => "archived",
        }
    }
}

impl fmt::Display for ArticleStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl ToSql for ArticleStatus {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.as_str()))
    }
}

impl FromSql for ArticleStatus {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        match value.as_str()? {
            "draft" => Ok(Self::Draft),
            "published" => Ok(Self::Published),
            "archived" => Ok(Self::Archived),
            other => Err(FromSqlError::Other(
                format!("unknown article status: {other}").into(),
            )),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Author {
    pub id: i64,
    pub first_name: String,
    pub last_name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Article {
    pub id: String,
    pub title: String,
    pub summary: String,
    pub status: ArticleStatus,
    pub inserted_at: String,
    pub author_id: i64,
}

/// Row shape returned by list queries: article columns plus the author's
/// display name resolved for output.
#[derive(Debug, Clone, Serialize)]
pub struct ArticleResult {
    pub id: String,
    pub title: String,
    pub summary: String,
    pub status: ArticleStatus,
    pub inserted_at: String,
    pub author: String,
}

/// Data needed to insert a new article (no auto-generated fields).
#[derive(Debug, Clone)]
pub struct NewArticle {
    pub id: String,
    pub title: String,
    pub summary: String,
    pub status: ArticleStatus,
    pub inserted_at: DateTime<Utc>,
    pub author_id: i64,
}

#[derive(Debug, Clone)]
pub struct NewAuthor {
    pub first_name: String,
    pub last_name: String,
}

/// Stats returned by `artq stats`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DbStats {
    pub authors: i64,
    pub articles: i64,
    pub statuses: Vec<StatusCount>,
    pub db_size_bytes: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusCount {
    pub status: ArticleStatus,
    pub count: i64,
}

/// RFC3339 UTC at second precision. Matches the column default in schema.rs,
/// so lexicographic comparison of stored values is chronological.
pub fn format_timestamp(ts: DateTime<Utc>) -> String {
    ts.format("%Y-%m-%dT%H:%M:%SZ").to_string()
}
