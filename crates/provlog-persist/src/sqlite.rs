//! SQLite event store implementation

use async_trait::async_trait;
use chrono::DateTime;
use provlog_core::Event;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions, SqliteRow};
use sqlx::{QueryBuilder, Row, Sqlite};
use std::str::FromStr;
use tracing::info;
use uuid::Uuid;

use crate::event_store::{EventFilter, EventStore, Page, StoreError};

/// SQLite configuration options
#[derive(Debug, Clone)]
pub struct SqliteConfig {
    /// Database URL (e.g., "sqlite:provlog.db?mode=rwc" or "sqlite::memory:")
    pub url: String,
    /// Maximum number of connections in the pool
    pub max_connections: u32,
    /// Enable WAL journal mode for better concurrency
    pub wal_mode: bool,
    /// Busy timeout in seconds
    pub busy_timeout_secs: u32,
}

impl Default for SqliteConfig {
    fn default() -> Self {
        Self {
            url: "sqlite:provlog.db?mode=rwc".to_string(),
            max_connections: 5,
            wal_mode: true,
            busy_timeout_secs: 30,
        }
    }
}

impl SqliteConfig {
    /// Config for an in-memory database (testing). A single connection keeps
    /// every query on the same memory database.
    pub fn memory() -> Self {
        Self {
            url: "sqlite::memory:".to_string(),
            max_connections: 1,
            wal_mode: false,
            busy_timeout_secs: 5,
        }
    }
}

/// SQLite-backed event store
#[derive(Debug, Clone)]
pub struct SqliteEventStore {
    pool: SqlitePool,
}

impl SqliteEventStore {
    /// Connect with default config for the given URL.
    pub async fn connect(url: &str) -> Result<Self, StoreError> {
        let config = SqliteConfig {
            url: url.to_string(),
            ..Default::default()
        };
        Self::connect_with(config).await
    }

    /// Connect with full configuration and run migrations.
    pub async fn connect_with(config: SqliteConfig) -> Result<Self, StoreError> {
        let mut options = SqliteConnectOptions::from_str(&config.url)
            .map_err(|e| StoreError::Connection(e.to_string()))?;

        options = options.pragma("busy_timeout", (config.busy_timeout_secs * 1000).to_string());
        if config.wal_mode {
            options = options.pragma("journal_mode", "WAL");
        }

        let pool = SqlitePoolOptions::new()
            .max_connections(config.max_connections)
            .connect_with(options)
            .await
            .map_err(|e| StoreError::Connection(e.to_string()))?;

        sqlx::migrate!("./migrations")
            .run(&pool)
            .await
            .map_err(|e| StoreError::Connection(format!("migration failed: {}", e)))?;

        info!(url = %config.url, wal = config.wal_mode, "connected to SQLite event store");

        Ok(Self { pool })
    }

    /// Get the connection pool.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    fn push_filter(qb: &mut QueryBuilder<'_, Sqlite>, filter: &EventFilter) {
        if let Some(agent_id) = &filter.agent_id {
            qb.push(" AND agent_id = ").push_bind(agent_id.clone());
        }
        if let Some(action_type) = &filter.action_type {
            qb.push(" AND action_type = ").push_bind(action_type.clone());
        }
        if let Some(start) = filter.start_micros {
            qb.push(" AND timestamp_micros >= ").push_bind(start);
        }
        if let Some(end) = filter.end_micros {
            qb.push(" AND timestamp_micros <= ").push_bind(end);
        }
    }
}

const EVENT_COLUMNS: &str = "event_id, agent_id, action_type, tool_name, timestamp_micros, \
     environment, model_version, prompt_version, input_hash, output_hash, \
     previous_event_hash, event_hash";

fn row_to_event(row: &SqliteRow) -> Result<Event, StoreError> {
    let event_id: String = row
        .try_get("event_id")
        .map_err(|e| StoreError::Query(e.to_string()))?;
    let event_id = Uuid::parse_str(&event_id)
        .map_err(|e| StoreError::Query(format!("invalid event_id in store: {}", e)))?;

    let micros: i64 = row
        .try_get("timestamp_micros")
        .map_err(|e| StoreError::Query(e.to_string()))?;
    let timestamp = DateTime::from_timestamp_micros(micros)
        .ok_or_else(|| StoreError::Query(format!("timestamp out of range: {}", micros)))?;

    let get_text = |name: &str| -> Result<String, StoreError> {
        row.try_get(name).map_err(|e| StoreError::Query(e.to_string()))
    };
    let get_opt = |name: &str| -> Result<Option<String>, StoreError> {
        row.try_get(name).map_err(|e| StoreError::Query(e.to_string()))
    };

    Ok(Event {
        event_id,
        agent_id: get_text("agent_id")?,
        action_type: get_text("action_type")?,
        tool_name: get_opt("tool_name")?,
        timestamp,
        environment: get_opt("environment")?,
        model_version: get_opt("model_version")?,
        prompt_version: get_opt("prompt_version")?,
        input_hash: get_text("input_hash")?,
        output_hash: get_text("output_hash")?,
        previous_event_hash: get_opt("previous_event_hash")?,
        event_hash: get_text("event_hash")?,
    })
}

#[async_trait]
impl EventStore for SqliteEventStore {
    async fn insert(&self, event: &Event) -> Result<(), StoreError> {
        sqlx::query(
            "INSERT INTO events (event_id, agent_id, action_type, tool_name, timestamp_micros, \
             environment, model_version, prompt_version, input_hash, output_hash, \
             previous_event_hash, event_hash) \
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(event.event_id.to_string())
        .bind(&event.agent_id)
        .bind(&event.action_type)
        .bind(&event.tool_name)
        .bind(event.timestamp_micros())
        .bind(&event.environment)
        .bind(&event.model_version)
        .bind(&event.prompt_version)
        .bind(&event.input_hash)
        .bind(&event.output_hash)
        .bind(&event.previous_event_hash)
        .bind(&event.event_hash)
        .execute(&self.pool)
        .await
        .map_err(|e| match e.as_database_error() {
            Some(db) if db.is_unique_violation() => {
                StoreError::Conflict(format!("duplicate event identity: {}", db.message()))
            }
            _ => StoreError::Query(e.to_string()),
        })?;

        Ok(())
    }

    async fn tip_hash(&self, agent_id: &str) -> Result<Option<String>, StoreError> {
        let row = sqlx::query(
            "SELECT event_hash FROM events WHERE agent_id = ? \
             ORDER BY timestamp_micros DESC, event_id DESC LIMIT 1",
        )
        .bind(agent_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| StoreError::Query(e.to_string()))?;

        match row {
            Some(row) => {
                let hash: String = row
                    .try_get("event_hash")
                    .map_err(|e| StoreError::Query(e.to_string()))?;
                Ok(Some(hash))
            }
            None => Ok(None),
        }
    }

    async fn get(&self, event_id: Uuid) -> Result<Option<Event>, StoreError> {
        let sql = format!("SELECT {} FROM events WHERE event_id = ?", EVENT_COLUMNS);
        let row = sqlx::query(&sql)
            .bind(event_id.to_string())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| StoreError::Query(e.to_string()))?;

        row.as_ref().map(row_to_event).transpose()
    }

    async fn list(
        &self,
        filter: &EventFilter,
        page: Page,
    ) -> Result<(Vec<Event>, u64), StoreError> {
        let mut count_qb =
            QueryBuilder::<Sqlite>::new("SELECT COUNT(*) FROM events WHERE 1 = 1");
        Self::push_filter(&mut count_qb, filter);
        let total: i64 = count_qb
            .build_query_scalar()
            .fetch_one(&self.pool)
            .await
            .map_err(|e| StoreError::Query(e.to_string()))?;

        let mut qb = QueryBuilder::<Sqlite>::new(format!(
            "SELECT {} FROM events WHERE 1 = 1",
            EVENT_COLUMNS
        ));
        Self::push_filter(&mut qb, filter);
        qb.push(" ORDER BY timestamp_micros DESC, event_id DESC LIMIT ")
            .push_bind(i64::from(page.page_size))
            .push(" OFFSET ")
            .push_bind(page.offset());

        let rows = qb
            .build()
            .fetch_all(&self.pool)
            .await
            .map_err(|e| StoreError::Query(e.to_string()))?;

        let events = rows
            .iter()
            .map(row_to_event)
            .collect::<Result<Vec<_>, _>>()?;

        Ok((events, total as u64))
    }

    async fn chain_range(
        &self,
        agent_id: &str,
        start_micros: Option<i64>,
        end_micros: Option<i64>,
    ) -> Result<Vec<Event>, StoreError> {
        let filter = EventFilter {
            agent_id: Some(agent_id.to_string()),
            action_type: None,
            start_micros,
            end_micros,
        };

        let mut qb = QueryBuilder::<Sqlite>::new(format!(
            "SELECT {} FROM events WHERE 1 = 1",
            EVENT_COLUMNS
        ));
        Self::push_filter(&mut qb, &filter);
        qb.push(" ORDER BY timestamp_micros ASC, event_id ASC");

        let rows = qb
            .build()
            .fetch_all(&self.pool)
            .await
            .map_err(|e| StoreError::Query(e.to_string()))?;

        rows.iter().map(row_to_event).collect()
    }

    async fn exists_before(&self, agent_id: &str, micros: i64) -> Result<bool, StoreError> {
        let row = sqlx::query(
            "SELECT 1 FROM events WHERE agent_id = ? AND timestamp_micros < ? LIMIT 1",
        )
        .bind(agent_id)
        .bind(micros)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| StoreError::Query(e.to_string()))?;

        Ok(row.is_some())
    }

    async fn export_range(&self, filter: &EventFilter) -> Result<Vec<Event>, StoreError> {
        let mut qb = QueryBuilder::<Sqlite>::new(format!(
            "SELECT {} FROM events WHERE 1 = 1",
            EVENT_COLUMNS
        ));
        Self::push_filter(&mut qb, filter);
        qb.push(" ORDER BY timestamp_micros ASC, event_id ASC");

        let rows = qb
            .build()
            .fetch_all(&self.pool)
            .await
            .map_err(|e| StoreError::Query(e.to_string()))?;

        rows.iter().map(row_to_event).collect()
    }

    async fn is_healthy(&self) -> bool {
        sqlx::query("SELECT 1").fetch_one(&self.pool).await.is_ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use provlog_core::compute_event_hash;

    async fn memory_store() -> SqliteEventStore {
        SqliteEventStore::connect_with(SqliteConfig::memory())
            .await
            .unwrap()
    }

    fn make_event(agent_id: &str, micros: i64, prev: Option<String>) -> Event {
        let mut event = Event {
            event_id: Uuid::new_v4(),
            agent_id: agent_id.to_string(),
            action_type: "llm_call".to_string(),
            tool_name: None,
            timestamp: Utc.timestamp_micros(micros).unwrap(),
            environment: Some("test".to_string()),
            model_version: None,
            prompt_version: None,
            input_hash: "0".repeat(64),
            output_hash: "1".repeat(64),
            previous_event_hash: prev,
            event_hash: String::new(),
        };
        event.event_hash = compute_event_hash(&event.hash_input()).unwrap();
        event
    }

    #[tokio::test]
    async fn insert_and_get_roundtrip() {
        let store = memory_store().await;
        let event = make_event("a1", 1_700_000_000_000_000, None);

        store.insert(&event).await.unwrap();
        let loaded = store.get(event.event_id).await.unwrap().unwrap();
        assert_eq!(loaded, event);

        assert!(store.get(Uuid::new_v4()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn duplicate_hash_is_a_conflict() {
        let store = memory_store().await;
        let event = make_event("a1", 1_700_000_000_000_000, None);
        store.insert(&event).await.unwrap();

        let mut dup = event.clone();
        dup.event_id = Uuid::new_v4();
        let err = store.insert(&dup).await.unwrap_err();
        assert!(matches!(err, StoreError::Conflict(_)));
    }

    #[tokio::test]
    async fn tip_follows_timestamp_then_event_id() {
        let store = memory_store().await;
        assert!(store.tip_hash("a1").await.unwrap().is_none());

        let first = make_event("a1", 1_000, None);
        let second = make_event("a1", 2_000, Some(first.event_hash.clone()));
        store.insert(&first).await.unwrap();
        store.insert(&second).await.unwrap();
        assert_eq!(
            store.tip_hash("a1").await.unwrap().as_deref(),
            Some(second.event_hash.as_str())
        );

        // Equal timestamps fall back to lexicographic event_id.
        let mut low = make_event("a2", 5_000, None);
        low.event_id = Uuid::parse_str("00000000-0000-4000-8000-000000000001").unwrap();
        low.event_hash = compute_event_hash(&low.hash_input()).unwrap();
        let mut high = make_event("a2", 5_000, None);
        high.event_id = Uuid::parse_str("ffffffff-ffff-4fff-bfff-ffffffffffff").unwrap();
        high.input_hash = "2".repeat(64);
        high.event_hash = compute_event_hash(&high.hash_input()).unwrap();

        store.insert(&low).await.unwrap();
        store.insert(&high).await.unwrap();
        assert_eq!(
            store.tip_hash("a2").await.unwrap().as_deref(),
            Some(high.event_hash.as_str())
        );
    }

    #[tokio::test]
    async fn list_filters_and_paginates() {
        let store = memory_store().await;
        for i in 0..5 {
            let mut event = make_event("a1", 1_000 + i, None);
            event.input_hash = format!("{:064x}", i);
            event.event_hash = compute_event_hash(&event.hash_input()).unwrap();
            store.insert(&event).await.unwrap();
        }
        let other = make_event("a2", 9_000, None);
        store.insert(&other).await.unwrap();

        let filter = EventFilter {
            agent_id: Some("a1".to_string()),
            ..Default::default()
        };
        let (events, total) = store
            .list(&filter, Page { page: 1, page_size: 2 })
            .await
            .unwrap();
        assert_eq!(total, 5);
        assert_eq!(events.len(), 2);
        // Newest first.
        assert!(events[0].timestamp > events[1].timestamp);

        let (page3, _) = store
            .list(&filter, Page { page: 3, page_size: 2 })
            .await
            .unwrap();
        assert_eq!(page3.len(), 1);

        let ranged = EventFilter {
            agent_id: Some("a1".to_string()),
            start_micros: Some(1_002),
            end_micros: Some(1_003),
            ..Default::default()
        };
        let (events, total) = store
            .list(&ranged, Page { page: 1, page_size: 50 })
            .await
            .unwrap();
        assert_eq!(total, 2);
        assert_eq!(events.len(), 2);
    }

    #[tokio::test]
    async fn chain_range_is_ascending() {
        let store = memory_store().await;
        let a = make_event("a1", 3_000, None);
        let b = make_event("a1", 1_000, None);
        store.insert(&a).await.unwrap();
        store.insert(&b).await.unwrap();

        let events = store.chain_range("a1", None, None).await.unwrap();
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].event_id, b.event_id);
        assert_eq!(events[1].event_id, a.event_id);

        let windowed = store.chain_range("a1", Some(2_000), None).await.unwrap();
        assert_eq!(windowed.len(), 1);
        assert_eq!(windowed[0].event_id, a.event_id);
    }

    #[tokio::test]
    async fn exists_before_is_strict() {
        let store = memory_store().await;
        let event = make_event("a1", 2_000, None);
        store.insert(&event).await.unwrap();

        assert!(!store.exists_before("a1", 2_000).await.unwrap());
        assert!(store.exists_before("a1", 2_001).await.unwrap());
        assert!(!store.exists_before("a2", 9_999).await.unwrap());
    }
}
