use std::{sync::Arc, time::Instant};

use crate::{
    clock::Clock,
    db::{ClientTrafficRepo, DbError},
    models::{ClientTraffic, InboundSettings, UsageSnapshot},
    observability::metrics,
    services::format::{format_expiry, format_gigabytes},
};

#[derive(Debug, thiserror::Error)]
pub enum LookupError {
    #[error("Client not found")]
    NotFound,

    #[error(transparent)]
    Store(#[from] DbError),
}

/// Resolves a client id to its usage snapshot.
#[derive(Clone)]
pub struct LookupService {
    repo: Arc<dyn ClientTrafficRepo>,
    clock: Arc<dyn Clock>,
}

impl LookupService {
    pub fn new(repo: Arc<dyn ClientTrafficRepo>, clock: Arc<dyn Clock>) -> Self {
        Self { repo, clock }
    }

    /// Look up the traffic row belonging to `client_id` and format it.
    ///
    /// The caller is expected to have validated the id's syntax already.
    pub async fn resolve(&self, client_id: &str) -> Result<UsageSnapshot, LookupError> {
        let start = Instant::now();
        let result = self.repo.find_by_client_id(client_id).await;
        metrics::record_db_operation(
            "find_by_client_id",
            start.elapsed().as_secs_f64(),
            result.is_ok(),
        );

        let row = result?.ok_or(LookupError::NotFound)?;
        Ok(self.snapshot(row))
    }

    fn snapshot(&self, row: ClientTraffic) -> UsageSnapshot {
        let client_id = resolve_credential_id(&row);
        if client_id.is_none() {
            metrics::record_unresolved_credential();
        }

        let now_ms = self.clock.now_millis();
        UsageSnapshot {
            traffic_id: row.id,
            inbound_id: row.inbound_id,
            client_id,
            enable: u8::from(row.enable),
            expiry_time: format_expiry(row.expiry_time, now_ms),
            up_gb: format_gigabytes(row.up),
            down_gb: format_gigabytes(row.down),
            total_gb: format_gigabytes(row.total),
            email: row.email,
        }
    }
}

/// Re-read the inbound settings and return the id of the first credential
/// sharing the row's email.
///
/// This pass is independent of the query's match. A settings document that
/// fails to parse yields `None` instead of failing the lookup.
fn resolve_credential_id(row: &ClientTraffic) -> Option<String> {
    let raw = row.inbound_settings.as_deref()?;

    match InboundSettings::parse(raw) {
        Ok(settings) => settings
            .credential_id_for_email(&row.email)
            .map(str::to_owned),
        Err(e) => {
            tracing::warn!(
                traffic_id = row.id,
                inbound_id = row.inbound_id,
                error = %e,
                "Inbound settings could not be parsed; client_id left empty"
            );
            None
        }
    }
}
