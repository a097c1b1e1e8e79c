use async_trait::async_trait;
use sqlx::{Row, SqlitePool};

use crate::{
    db::{error::DbResult, repos::ClientTrafficRepo},
    models::ClientTraffic,
};

/// Joins each traffic row to its inbound and keeps it only when the inbound's
/// `settings.clients` array holds an entry matching both the requested id and
/// the row's email. `json_valid` and the entry `type` check shield the scan
/// from malformed settings and non-object client entries in unrelated
/// inbounds; `json_extract` fails on anything that is not a JSON document.
/// Numeric columns are cast because panels declare some of them `numeric`.
const FIND_BY_CLIENT_ID: &str = r#"
    SELECT
        ct.id AS traffic_id,
        ct.email AS email,
        CAST(ct.inbound_id AS INTEGER) AS inbound_id,
        CAST(ct.up AS INTEGER) AS up,
        CAST(ct.down AS INTEGER) AS down,
        CAST(ct.total AS INTEGER) AS total,
        CAST(ct.expiry_time AS INTEGER) AS expiry_time,
        CAST(ct.enable AS INTEGER) AS enable,
        i.settings AS inbound_settings
    FROM client_traffics ct
    JOIN inbounds i ON ct.inbound_id = i.id
    WHERE CASE WHEN json_valid(i.settings) THEN EXISTS (
        SELECT 1 FROM json_each(i.settings, '$.clients') AS c
        WHERE CASE WHEN c.type = 'object' THEN
            json_extract(c.value, '$.id') = ?
            AND json_extract(c.value, '$.email') = ct.email
        ELSE 0 END
    ) ELSE 0 END
    LIMIT 1
"#;

pub struct SqliteClientTrafficRepo {
    pool: SqlitePool,
}

impl SqliteClientTrafficRepo {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    fn parse_row(row: &sqlx::sqlite::SqliteRow) -> DbResult<ClientTraffic> {
        // Panel rows are not guaranteed complete; absent counters read as 0
        let int = |column: &str| -> DbResult<i64> {
            Ok(row.try_get::<Option<i64>, _>(column)?.unwrap_or(0))
        };

        Ok(ClientTraffic {
            id: row.try_get("traffic_id")?,
            inbound_id: int("inbound_id")?,
            email: row
                .try_get::<Option<String>, _>("email")?
                .unwrap_or_default(),
            up: int("up")?,
            down: int("down")?,
            total: int("total")?,
            expiry_time: int("expiry_time")?,
            enable: int("enable")? != 0,
            inbound_settings: row.try_get("inbound_settings")?,
        })
    }
}

#[async_trait]
impl ClientTrafficRepo for SqliteClientTrafficRepo {
    async fn find_by_client_id(&self, client_id: &str) -> DbResult<Option<ClientTraffic>> {
        let row = sqlx::query(FIND_BY_CLIENT_ID)
            .bind(client_id)
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(Self::parse_row).transpose()
    }
}
