use super::Design;
use crate::{Error, Result};
use async_trait::async_trait;
use libsql::{Builder, Connection, Database, Value};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tracing::{debug, info, warn};

/// Storage collaborator for design records.
#[async_trait]
pub trait DesignStore: Send + Sync {
    async fn find(&self, id: &str) -> Result<Option<Design>>;

    /// Bumps the popularity counter by one. Fails with `NotFound` when the
    /// design does not exist.
    async fn increment_popularity(&self, id: &str) -> Result<()>;

    /// Inserts the design or replaces its catalog fields, keeping the
    /// accumulated popularity of an existing record.
    async fn upsert(&self, design: Design) -> Result<()>;

    async fn count(&self) -> Result<usize>;
}

const DESIGN_COLUMNS: &str = "id, name, description, colors, design_type, occasion, length, \
     material, image_path, thumbnail_path, popularity, created_by, salon_name, created_at";

struct DbHandle {
    // Keeps the database open for the lifetime of the connection.
    _database: Database,
    // A single connection serves `:memory:` databases, which are private to
    // the connection that created them.
    conn: tokio::sync::Mutex<Connection>,
}

pub struct LibsqlDesignStore {
    db: Option<DbHandle>,
    // In-memory fallback storage
    fallback: Arc<Mutex<HashMap<String, Design>>>,
}

impl LibsqlDesignStore {
    pub async fn new(db_path: &str) -> Result<Self> {
        let mut storage = Self {
            db: None,
            fallback: Arc::new(Mutex::new(HashMap::new())),
        };

        match storage.init_database(db_path).await {
            Ok(()) => {
                info!("Design database initialized successfully: {}", db_path);
            }
            Err(e) => {
                warn!(
                    "Design database initialization failed, using in-memory fallback: {}",
                    e
                );
            }
        }

        Ok(storage)
    }

    async fn init_database(&mut self, db_path: &str) -> Result<()> {
        let db = Builder::new_local(db_path).build().await?;

        let conn = db.connect()?;
        conn.execute(
            r#"
            CREATE TABLE IF NOT EXISTS designs (
                id TEXT PRIMARY KEY,
                name TEXT NOT NULL,
                description TEXT NOT NULL,
                colors TEXT NOT NULL,
                design_type TEXT,
                occasion TEXT,
                length TEXT,
                material TEXT,
                image_path TEXT NOT NULL,
                thumbnail_path TEXT,
                popularity INTEGER NOT NULL DEFAULT 0,
                created_by TEXT,
                salon_name TEXT,
                created_at TEXT NOT NULL
            )
            "#,
            (),
        )
        .await?;

        self.db = Some(DbHandle {
            _database: db,
            conn: tokio::sync::Mutex::new(conn),
        });
        Ok(())
    }

    async fn connection(&self) -> Option<tokio::sync::MutexGuard<'_, Connection>> {
        match self.db {
            Some(ref handle) => Some(handle.conn.lock().await),
            None => None,
        }
    }

    async fn find_in_db(&self, conn: &Connection, id: &str) -> Result<Option<Design>> {
        let sql = format!("SELECT {} FROM designs WHERE id = ?", DESIGN_COLUMNS);
        let mut rows = conn.query(&sql, [id]).await?;

        match rows.next().await? {
            Some(row) => Ok(Some(design_from_row(&row)?)),
            None => Ok(None),
        }
    }

    async fn upsert_in_db(&self, conn: &Connection, design: &Design) -> Result<()> {
        let sql = format!(
            r#"
            INSERT INTO designs ({})
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14)
            ON CONFLICT(id) DO UPDATE SET
                name = excluded.name,
                description = excluded.description,
                colors = excluded.colors,
                design_type = excluded.design_type,
                occasion = excluded.occasion,
                length = excluded.length,
                material = excluded.material,
                image_path = excluded.image_path,
                thumbnail_path = excluded.thumbnail_path,
                created_by = excluded.created_by,
                salon_name = excluded.salon_name
            "#,
            DESIGN_COLUMNS
        );

        let params: Vec<Value> = vec![
            Value::Text(design.id.clone()),
            Value::Text(design.name.clone()),
            Value::Text(design.description.clone()),
            Value::Text(serde_json::to_string(&design.colors)?),
            opt_value(&design.design_type),
            opt_value(&design.occasion),
            opt_value(&design.length),
            opt_value(&design.material),
            Value::Text(design.image_path.clone()),
            opt_value(&design.thumbnail_path),
            Value::Integer(design.popularity),
            opt_value(&design.created_by),
            opt_value(&design.salon_name),
            Value::Text(design.created_at.to_rfc3339()),
        ];

        conn.execute(&sql, params).await?;
        Ok(())
    }

    fn lock_fallback(&self) -> Result<std::sync::MutexGuard<'_, HashMap<String, Design>>> {
        self.fallback
            .lock()
            .map_err(|e| Error::internal(format!("Mutex lock failed: {e}")))
    }
}

#[async_trait]
impl DesignStore for LibsqlDesignStore {
    async fn find(&self, id: &str) -> Result<Option<Design>> {
        if let Some(conn) = self.connection().await {
            let design = self.find_in_db(&conn, id).await?;
            debug!("Design lookup for '{}': found={}", id, design.is_some());
            return Ok(design);
        }

        Ok(self.lock_fallback()?.get(id).cloned())
    }

    async fn increment_popularity(&self, id: &str) -> Result<()> {
        if let Some(conn) = self.connection().await {
            let changed = conn
                .execute(
                    "UPDATE designs SET popularity = popularity + 1 WHERE id = ?",
                    [id],
                )
                .await?;
            if changed == 0 {
                return Err(Error::not_found(id));
            }
            return Ok(());
        }

        let mut fallback = self.lock_fallback()?;
        match fallback.get_mut(id) {
            Some(design) => {
                design.popularity += 1;
                Ok(())
            }
            None => Err(Error::not_found(id)),
        }
    }

    async fn upsert(&self, design: Design) -> Result<()> {
        if let Some(conn) = self.connection().await {
            self.upsert_in_db(&conn, &design).await?;
            debug!("Design upserted: {}", design.id);
            return Ok(());
        }

        let mut fallback = self.lock_fallback()?;
        let popularity = fallback
            .get(&design.id)
            .map(|existing| existing.popularity)
            .unwrap_or(design.popularity);
        fallback.insert(design.id.clone(), Design { popularity, ..design });
        Ok(())
    }

    async fn count(&self) -> Result<usize> {
        if let Some(conn) = self.connection().await {
            let mut rows = conn.query("SELECT COUNT(*) FROM designs", ()).await?;
            let count: i64 = match rows.next().await? {
                Some(row) => row.get(0)?,
                None => 0,
            };
            return Ok(count as usize);
        }

        Ok(self.lock_fallback()?.len())
    }
}

fn opt_value(value: &Option<String>) -> Value {
    match value {
        Some(s) => Value::Text(s.clone()),
        None => Value::Null,
    }
}

fn opt_text(value: Value) -> Option<String> {
    match value {
        Value::Text(s) => Some(s),
        _ => None,
    }
}

fn design_from_row(row: &libsql::Row) -> Result<Design> {
    let colors_json: String = row.get(3)?;
    let created_at_str: String = row.get(13)?;
    let created_at = chrono::DateTime::parse_from_rfc3339(&created_at_str)
        .map_err(|e| Error::internal(format!("Failed to parse timestamp: {e}")))?
        .with_timezone(&chrono::Utc);

    Ok(Design {
        id: row.get(0)?,
        name: row.get(1)?,
        description: row.get(2)?,
        colors: serde_json::from_str(&colors_json)?,
        design_type: opt_text(row.get_value(4)?),
        occasion: opt_text(row.get_value(5)?),
        length: opt_text(row.get_value(6)?),
        material: opt_text(row.get_value(7)?),
        image_path: row.get(8)?,
        thumbnail_path: opt_text(row.get_value(9)?),
        popularity: row.get(10)?,
        created_by: opt_text(row.get_value(11)?),
        salon_name: opt_text(row.get_value(12)?),
        created_at,
    })
}
