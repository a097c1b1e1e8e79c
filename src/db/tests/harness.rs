//! Test harness for database repository testing
//!
//! Provides an in-memory SQLite database shaped like the panel's, plus
//! helpers for inserting inbounds and traffic rows.

use sqlx::SqlitePool;

/// Create an in-memory SQLite pool for testing
pub async fn create_sqlite_pool() -> SqlitePool {
    sqlx::sqlite::SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .expect("Failed to create in-memory SQLite pool")
}

/// Create the `inbounds` and `client_traffics` tables.
///
/// `client_traffics.email` is left without a UNIQUE constraint so tests can
/// reproduce duplicate-email data from older panel versions.
pub async fn create_panel_schema(pool: &SqlitePool) {
    sqlx::query(
        "CREATE TABLE inbounds (
            id integer PRIMARY KEY AUTOINCREMENT,
            user_id integer,
            up integer,
            down integer,
            total integer,
            remark text,
            enable numeric,
            expiry_time integer,
            listen text,
            port integer,
            protocol text,
            settings text,
            stream_settings text,
            tag text,
            sniffing text
        )",
    )
    .execute(pool)
    .await
    .expect("Failed to create inbounds table");

    sqlx::query(
        "CREATE TABLE client_traffics (
            id integer PRIMARY KEY AUTOINCREMENT,
            inbound_id integer,
            enable numeric,
            email text,
            up integer,
            down integer,
            expiry_time integer,
            total integer,
            reset integer DEFAULT 0
        )",
    )
    .execute(pool)
    .await
    .expect("Failed to create client_traffics table");
}

/// Create a pool with the panel schema already in place.
pub async fn create_panel_pool() -> SqlitePool {
    let pool = create_sqlite_pool().await;
    create_panel_schema(&pool).await;
    pool
}

/// Insert an inbound with the given raw settings document.
pub async fn insert_inbound(pool: &SqlitePool, id: i64, settings: &str) {
    sqlx::query(
        "INSERT INTO inbounds (id, user_id, up, down, total, remark, enable, expiry_time, port, protocol, settings, tag)
         VALUES (?, 1, 0, 0, 0, 'test', 1, 0, ?, 'vless', ?, ?)",
    )
    .bind(id)
    .bind(10000 + id)
    .bind(settings)
    .bind(format!("inbound-{}", id))
    .execute(pool)
    .await
    .expect("Failed to insert inbound");
}

/// Values for one `client_traffics` row.
#[derive(Debug, Clone)]
pub struct TrafficFixture {
    pub inbound_id: i64,
    pub email: &'static str,
    pub up: i64,
    pub down: i64,
    pub total: i64,
    pub expiry_time: i64,
    pub enable: bool,
}

impl TrafficFixture {
    pub fn new(inbound_id: i64, email: &'static str) -> Self {
        Self {
            inbound_id,
            email,
            up: 0,
            down: 0,
            total: 0,
            expiry_time: 0,
            enable: true,
        }
    }
}

/// Insert a traffic row and return its id.
pub async fn insert_client_traffic(pool: &SqlitePool, fixture: &TrafficFixture) -> i64 {
    sqlx::query(
        "INSERT INTO client_traffics (inbound_id, enable, email, up, down, expiry_time, total)
         VALUES (?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(fixture.inbound_id)
    .bind(fixture.enable)
    .bind(fixture.email)
    .bind(fixture.up)
    .bind(fixture.down)
    .bind(fixture.expiry_time)
    .bind(fixture.total)
    .execute(pool)
    .await
    .expect("Failed to insert client traffic")
    .last_insert_rowid()
}

/// Build an inbound settings document from `(id, email)` pairs.
pub fn settings_with_clients(clients: &[(&str, &str)]) -> String {
    let clients: Vec<serde_json::Value> = clients
        .iter()
        .map(|(id, email)| {
            serde_json::json!({
                "id": id,
                "email": email,
                "flow": "",
                "limitIp": 0,
                "totalGB": 0,
                "expiryTime": 0,
                "enable": true,
            })
        })
        .collect();
    serde_json::json!({ "clients": clients, "decryption": "none", "fallbacks": [] }).to_string()
}
