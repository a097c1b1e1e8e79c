use async_trait::async_trait;

use crate::{db::error::DbResult, models::ClientTraffic};

#[async_trait]
pub trait ClientTrafficRepo: Send + Sync {
    /// Find the traffic row owned by the credential with id `client_id`.
    ///
    /// A row qualifies when its inbound's settings contain a credential whose
    /// `id` equals `client_id` and whose `email` equals the row's email.
    /// If several rows qualify, the first one the store returns wins.
    async fn find_by_client_id(&self, client_id: &str) -> DbResult<Option<ClientTraffic>>;
}
