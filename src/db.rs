use crate::config::Config;
use crate::model::{Bookmark, BookmarkPatch, List, NewBookmark, NewList};
use anyhow::Result;
use libsql::{Builder, Connection};
use std::path::Path;
use tokio::sync::Mutex;

const SYSTEM_MIGRATIONS: &[(&str, &str)] = &[(
    "system/000_migrations_table.sql",
    include_str!("migrations/system/000_migrations_table.sql"),
)];

const MIGRATIONS: &[(&str, &str)] = &[("001_schema.sql", include_str!("migrations/001_schema.sql"))];

pub struct Database {
    conn: Connection,
    tx_lock: Mutex<()>,
}

impl Database {
    pub async fn new(cfg: &Config, data_dir: &Path) -> Result<Self> {
        let path = data_dir.join(cfg.app.get_db());
        let db = Builder::new_local(&path).build().await?;
        let conn = db.connect()?;
        Self::setup(conn).await
    }

    /// Opens a throwaway in-memory database. Used by tests.
    pub async fn open_in_memory() -> Result<Self> {
        let db = Builder::new_local(":memory:").build().await?;
        let conn = db.connect()?;
        Self::setup(conn).await
    }

    async fn setup(conn: Connection) -> Result<Self> {
        conn.query("SELECT 1", ()).await?;
        conn.execute_batch("PRAGMA foreign_keys = ON").await?;

        for (filename, sql) in SYSTEM_MIGRATIONS {
            Self::run_migration(&conn, filename, sql).await?;
        }

        for (filename, sql) in MIGRATIONS {
            Self::run_migration(&conn, filename, sql).await?;
        }

        Ok(Database {
            conn,
            tx_lock: Mutex::new(()),
        })
    }

    async fn is_migration_applied(conn: &Connection, name: &str) -> Result<bool> {
        let query = "SELECT 1 FROM _migrations WHERE name = ?";
        match conn.query(query, libsql::params![name]).await {
            Ok(mut rows) => Ok(rows.next().await?.is_some()),
            Err(e) => {
                if e.to_string().contains("no such table") {
                    Ok(false)
                } else {
                    Err(e.into())
                }
            }
        }
    }

    async fn record_migration(conn: &Connection, name: &str) -> Result<()> {
        let query = r#"
            INSERT INTO _migrations (name, applied_at)
            VALUES (?, strftime('%Y-%m-%dT%H:%M:%fZ', 'now'))
        "#;
        conn.execute(query, libsql::params![name]).await?;
        Ok(())
    }

    async fn run_migration(conn: &Connection, name: &str, sql: &str) -> Result<()> {
        if Self::is_migration_applied(conn, name).await? {
            tracing::debug!("migration {} already applied, skipping", name);
            return Ok(());
        }

        tracing::info!("applying migration: {}", name);
        conn.execute_batch(sql)
            .await
            .map_err(|e| anyhow::anyhow!("failed to execute migration {name}: {e}"))?;

        Self::record_migration(conn, name).await?;
        Ok(())
    }

    pub async fn list_bookmarks(&self) -> Result<Vec<Bookmark>> {
        let query = r#"
            SELECT id, title, url, description, rating
            FROM bookmarks
            ORDER BY id
        "#;

        let mut rows = self.conn.query(query, ()).await?;
        let mut bookmarks = Vec::new();

        while let Some(row) = rows.next().await? {
            bookmarks.push(Self::row_to_bookmark(&row)?);
        }

        Ok(bookmarks)
    }

    pub async fn get_bookmark(&self, id: i32) -> Result<Option<Bookmark>> {
        let query = r#"
            SELECT id, title, url, description, rating
            FROM bookmarks WHERE id = ?
        "#;

        let mut rows = self.conn.query(query, libsql::params![id]).await?;

        if let Some(row) = rows.next().await? {
            Ok(Some(Self::row_to_bookmark(&row)?))
        } else {
            Ok(None)
        }
    }

    pub async fn create_bookmark(&self, input: NewBookmark) -> Result<Bookmark> {
        // The lock keeps this write from landing inside another task's
        // open transaction on the shared connection.
        let _guard = self.tx_lock.lock().await;

        let query = r#"
            INSERT INTO bookmarks (title, url, description, rating)
            VALUES (?, ?, ?, ?)
            RETURNING id, title, url, description, rating
        "#;

        let mut rows = self
            .conn
            .query(
                query,
                libsql::params![input.title, input.url, input.description, input.rating],
            )
            .await?;

        if let Some(row) = rows.next().await? {
            Ok(Self::row_to_bookmark(&row)?)
        } else {
            anyhow::bail!("Failed to create bookmark")
        }
    }

    pub async fn update_bookmark(&self, id: i32, patch: BookmarkPatch) -> Result<Option<Bookmark>> {
        let _guard = self.tx_lock.lock().await;

        if self.get_bookmark(id).await?.is_none() {
            return Ok(None);
        }

        let mut updates = Vec::new();
        let mut params: Vec<libsql::Value> = Vec::new();

        if let Some(title) = &patch.title {
            updates.push("title = ?");
            params.push(title.clone().into());
        }
        if let Some(url) = &patch.url {
            updates.push("url = ?");
            params.push(url.clone().into());
        }
        if let Some(description) = &patch.description {
            updates.push("description = ?");
            params.push(description.clone().into());
        }
        if let Some(rating) = patch.rating {
            updates.push("rating = ?");
            params.push(rating.into());
        }

        if updates.is_empty() {
            return self.get_bookmark(id).await;
        }

        updates.push("updated_at = strftime('%Y-%m-%dT%H:%M:%fZ', 'now')");
        params.push(id.into());

        let query = format!("UPDATE bookmarks SET {} WHERE id = ?", updates.join(", "));

        self.conn.execute(&query, params).await?;
        self.get_bookmark(id).await
    }

    /// Deletes a bookmark and scrubs it from every list in one transaction,
    /// so a crash can never leave a list pointing at a missing bookmark.
    pub async fn delete_bookmark(&self, id: i32) -> Result<bool> {
        let _guard = self.tx_lock.lock().await;

        self.conn.execute("BEGIN TRANSACTION", ()).await?;

        let result = async {
            self.conn
                .execute(
                    "DELETE FROM list_entries WHERE bookmark_id = ?",
                    libsql::params![id],
                )
                .await?;
            let deleted = self
                .conn
                .execute("DELETE FROM bookmarks WHERE id = ?", libsql::params![id])
                .await?;
            Ok::<u64, anyhow::Error>(deleted)
        }
        .await;

        match result {
            Ok(deleted) => {
                self.conn.execute("COMMIT", ()).await?;
                Ok(deleted > 0)
            }
            Err(e) => {
                let _ = self.conn.execute("ROLLBACK", ()).await;
                Err(e)
            }
        }
    }

    pub async fn list_lists(&self) -> Result<Vec<List>> {
        let mut rows = self
            .conn
            .query("SELECT id, name FROM lists ORDER BY id", ())
            .await?;
        let mut lists: Vec<List> = Vec::new();

        while let Some(row) = rows.next().await? {
            lists.push(List {
                id: row.get(0)?,
                name: row.get(1)?,
                bookmark_ids: Vec::new(),
            });
        }

        let query = r#"
            SELECT list_id, bookmark_id
            FROM list_entries
            ORDER BY list_id, position
        "#;
        let mut rows = self.conn.query(query, ()).await?;

        while let Some(row) = rows.next().await? {
            let list_id: i32 = row.get(0)?;
            let bookmark_id: i32 = row.get(1)?;
            if let Some(list) = lists.iter_mut().find(|list| list.id == list_id) {
                list.bookmark_ids.push(bookmark_id);
            }
        }

        Ok(lists)
    }

    pub async fn get_list(&self, id: i32) -> Result<Option<List>> {
        let mut rows = self
            .conn
            .query("SELECT id, name FROM lists WHERE id = ?", libsql::params![id])
            .await?;

        let mut list = if let Some(row) = rows.next().await? {
            List {
                id: row.get(0)?,
                name: row.get(1)?,
                bookmark_ids: Vec::new(),
            }
        } else {
            return Ok(None);
        };

        let query = r#"
            SELECT bookmark_id FROM list_entries
            WHERE list_id = ?
            ORDER BY position
        "#;
        let mut rows = self.conn.query(query, libsql::params![id]).await?;

        while let Some(row) = rows.next().await? {
            list.bookmark_ids.push(row.get(0)?);
        }

        Ok(Some(list))
    }

    /// Creates a list with its ordered entries. Returns `Ok(None)` when one
    /// of the referenced bookmarks does not exist.
    pub async fn create_list(&self, input: NewList) -> Result<Option<List>> {
        let _guard = self.tx_lock.lock().await;

        self.conn.execute("BEGIN TRANSACTION", ()).await?;

        let result = async {
            let mut rows = self
                .conn
                .query(
                    "INSERT INTO lists (name) VALUES (?) RETURNING id",
                    libsql::params![input.name.as_str()],
                )
                .await?;

            let list_id: i32 = if let Some(row) = rows.next().await? {
                row.get(0)?
            } else {
                anyhow::bail!("Failed to create list")
            };

            for (position, bookmark_id) in input.bookmark_ids.iter().enumerate() {
                self.conn
                    .execute(
                        "INSERT INTO list_entries (list_id, bookmark_id, position) VALUES (?, ?, ?)",
                        libsql::params![list_id, *bookmark_id, position as i32],
                    )
                    .await?;
            }

            Ok::<i32, anyhow::Error>(list_id)
        }
        .await;

        match result {
            Ok(list_id) => {
                self.conn.execute("COMMIT", ()).await?;
                Ok(Some(List {
                    id: list_id,
                    name: input.name,
                    bookmark_ids: input.bookmark_ids,
                }))
            }
            Err(e) if e.to_string().contains("FOREIGN KEY constraint failed") => {
                let _ = self.conn.execute("ROLLBACK", ()).await;
                Ok(None)
            }
            Err(e) => {
                let _ = self.conn.execute("ROLLBACK", ()).await;
                Err(e)
            }
        }
    }

    pub async fn delete_list(&self, id: i32) -> Result<bool> {
        let _guard = self.tx_lock.lock().await;

        self.conn.execute("BEGIN TRANSACTION", ()).await?;

        let result = async {
            self.conn
                .execute(
                    "DELETE FROM list_entries WHERE list_id = ?",
                    libsql::params![id],
                )
                .await?;
            let deleted = self
                .conn
                .execute("DELETE FROM lists WHERE id = ?", libsql::params![id])
                .await?;
            Ok::<u64, anyhow::Error>(deleted)
        }
        .await;

        match result {
            Ok(deleted) => {
                self.conn.execute("COMMIT", ()).await?;
                Ok(deleted > 0)
            }
            Err(e) => {
                let _ = self.conn.execute("ROLLBACK", ()).await;
                Err(e)
            }
        }
    }

    /// Removes list entries whose bookmark row is gone. The service itself
    /// cannot produce such rows while foreign keys are enforced; databases
    /// written by earlier versions or external tools can carry them.
    pub async fn prune_orphaned_list_entries(&self) -> Result<u64> {
        let _guard = self.tx_lock.lock().await;

        let removed = self
            .conn
            .execute(
                "DELETE FROM list_entries WHERE bookmark_id NOT IN (SELECT id FROM bookmarks)",
                (),
            )
            .await?;
        Ok(removed)
    }

    fn row_to_bookmark(row: &libsql::Row) -> Result<Bookmark> {
        Ok(Bookmark {
            id: row.get(0)?,
            title: row.get(1)?,
            url: row.get(2)?,
            description: row.get::<Option<String>>(3)?.unwrap_or_default(),
            rating: row.get(4)?,
        })
    }
}
