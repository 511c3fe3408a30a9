use crate::models::ClickEvent;
use crate::storage::{ClickRecorder, LinkRepository};
use anyhow::Result;
use async_trait::async_trait;
use rand::distributions::Alphanumeric;
use rand::Rng;
use sqlx::sqlite::SqlitePoolOptions;
use sqlx::SqlitePool;
use std::sync::Arc;

pub struct SqliteStore {
    pool: Arc<SqlitePool>,
}

impl SqliteStore {
    pub async fn new(database_url: &str, max_connections: u32) -> Result<Self> {
        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections)
            .connect(database_url)
            .await?;
        Ok(Self {
            pool: Arc::new(pool),
        })
    }

    pub async fn init(&self) -> Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS smartlinks (
                id TEXT PRIMARY KEY,
                track_title TEXT,
                total_clicks INTEGER NOT NULL DEFAULT 0
            )
            "#,
        )
        .execute(self.pool.as_ref())
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS platform_links (
                smartlink_id TEXT NOT NULL,
                platform TEXT NOT NULL,
                url TEXT NOT NULL,
                PRIMARY KEY (smartlink_id, platform)
            )
            "#,
        )
        .execute(self.pool.as_ref())
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS clicks (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                tracking_id TEXT NOT NULL UNIQUE,
                smartlink_id TEXT NOT NULL,
                service_name TEXT NOT NULL,
                service_display_name TEXT NOT NULL,
                user_agent TEXT NOT NULL,
                country TEXT NOT NULL,
                region TEXT NOT NULL,
                city TEXT NOT NULL,
                country_code TEXT NOT NULL,
                timezone TEXT NOT NULL,
                ip TEXT NOT NULL,
                session_id TEXT,
                created_at TEXT NOT NULL
            )
            "#,
        )
        .execute(self.pool.as_ref())
        .await?;

        sqlx::query(
            "CREATE INDEX IF NOT EXISTS idx_clicks_smartlink ON clicks(smartlink_id, created_at)",
        )
        .execute(self.pool.as_ref())
        .await?;

        Ok(())
    }

    /// Register (or replace) the destination URL for a platform on a
    /// smart link, creating the smart link row if needed.
    pub async fn upsert_platform_link(
        &self,
        smartlink_id: &str,
        platform: &str,
        url: &str,
    ) -> Result<()> {
        sqlx::query("INSERT INTO smartlinks (id) VALUES (?) ON CONFLICT(id) DO NOTHING")
            .bind(smartlink_id)
            .execute(self.pool.as_ref())
            .await?;

        sqlx::query(
            r#"
            INSERT INTO platform_links (smartlink_id, platform, url)
            VALUES (?, ?, ?)
            ON CONFLICT(smartlink_id, platform) DO UPDATE SET url = excluded.url
            "#,
        )
        .bind(smartlink_id)
        .bind(platform)
        .bind(url)
        .execute(self.pool.as_ref())
        .await?;

        Ok(())
    }

    /// Running click total for a smart link, if the link exists.
    pub async fn total_clicks(&self, smartlink_id: &str) -> Result<Option<i64>> {
        let total = sqlx::query_scalar::<_, i64>(
            "SELECT total_clicks FROM smartlinks WHERE id = ?",
        )
        .bind(smartlink_id)
        .fetch_optional(self.pool.as_ref())
        .await?;
        Ok(total)
    }
}

fn generate_tracking_id(timestamp_millis: i64) -> String {
    let suffix: String = rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(9)
        .map(char::from)
        .collect();
    format!("click_{}_{}", timestamp_millis, suffix.to_lowercase())
}

#[async_trait]
impl LinkRepository for SqliteStore {
    async fn destination_url(
        &self,
        smartlink_id: &str,
        service_name: &str,
    ) -> Result<Option<String>> {
        let url = sqlx::query_scalar::<_, String>(
            "SELECT url FROM platform_links WHERE smartlink_id = ? AND platform = ?",
        )
        .bind(smartlink_id)
        .bind(service_name)
        .fetch_optional(self.pool.as_ref())
        .await?;
        Ok(url)
    }
}

#[async_trait]
impl ClickRecorder for SqliteStore {
    async fn record(&self, event: &ClickEvent) -> Result<String> {
        let tracking_id = generate_tracking_id(event.timestamp.timestamp_millis());

        sqlx::query(
            r#"
            INSERT INTO clicks (
                tracking_id, smartlink_id, service_name, service_display_name,
                user_agent, country, region, city, country_code, timezone,
                ip, session_id, created_at
            )
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&tracking_id)
        .bind(&event.smartlink_id)
        .bind(&event.service_name)
        .bind(&event.service_display_name)
        .bind(&event.user_agent)
        .bind(&event.geo.country)
        .bind(&event.geo.region)
        .bind(&event.geo.city)
        .bind(&event.geo.country_code)
        .bind(&event.geo.timezone)
        .bind(&event.geo.ip)
        .bind(&event.session_id)
        .bind(event.timestamp.to_rfc3339())
        .execute(self.pool.as_ref())
        .await?;

        // Keep the smart link's running total in step with the click log.
        sqlx::query("UPDATE smartlinks SET total_clicks = total_clicks + 1 WHERE id = ?")
            .bind(&event.smartlink_id)
            .execute(self.pool.as_ref())
            .await?;

        Ok(tracking_id)
    }
}
