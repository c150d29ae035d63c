use anyhow::Result;
use rusqlite::Connection;

pub fn create_schema(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "
        -- Version tracking
        CREATE TABLE IF NOT EXISTS artq_meta (
            key TEXT PRIMARY KEY,
            value TEXT NOT NULL
        );

        -- Core tables
        CREATE TABLE IF NOT EXISTS authors (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            first_name TEXT NOT NULL,
            last_name TEXT NOT NULL,
            UNIQUE(first_name, last_name)
        );

        CREATE TABLE IF NOT EXISTS articles (
            id TEXT PRIMARY KEY,
            title TEXT NOT NULL,
            summary TEXT NOT NULL DEFAULT '',
            status TEXT NOT NULL DEFAULT 'draft',
            inserted_at TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%SZ', 'now')),
            author_id INTEGER NOT NULL REFERENCES authors(id) ON DELETE CASCADE
        );

        -- Indexes for the filterable columns
        CREATE INDEX IF NOT EXISTS idx_articles_title ON articles(title);
        CREATE INDEX IF NOT EXISTS idx_articles_status ON articles(status);
        CREATE INDEX IF NOT EXISTS idx_articles_inserted_at ON articles(inserted_at);
        CREATE INDEX IF NOT EXISTS idx_articles_author ON articles(author_id);
        CREATE INDEX IF NOT EXISTS idx_authors_name ON authors(last_name, first_name);
        ",
    )?;

    // Set schema version
    conn.execute(
        "INSERT OR REPLACE INTO artq_meta (key, value) VALUES ('schema_version', '1')",
        [],
    )?;

    Ok(())
}
