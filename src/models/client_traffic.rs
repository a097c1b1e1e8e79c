use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// A `client_traffics` row joined with the raw `settings` document of its
/// parent inbound.
///
/// The row and the credential entry it belongs to share only the `email`
/// value; there is no foreign key between them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientTraffic {
    pub id: i64,
    pub inbound_id: i64,
    pub email: String,
    /// Cumulative upload bytes.
    pub up: i64,
    /// Cumulative download bytes.
    pub down: i64,
    /// Byte quota, 0 when unbounded.
    pub total: i64,
    /// Expiry as epoch milliseconds, 0 when the client never expires.
    pub expiry_time: i64,
    pub enable: bool,
    /// Unparsed `inbounds.settings` JSON.
    pub inbound_settings: Option<String>,
}

/// The subset of an inbound's `settings` document this service reads.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct InboundSettings {
    #[serde(default, deserialize_with = "credential_entries")]
    pub clients: Vec<CredentialEntry>,
}

/// Keeps the object entries of `clients` and drops everything else, so a
/// legacy or hand-edited entry does not hide the well-formed ones.
fn credential_entries<'de, D>(deserializer: D) -> Result<Vec<CredentialEntry>, D::Error>
where
    D: Deserializer<'de>,
{
    let entries = match Option::<Value>::deserialize(deserializer)? {
        Some(Value::Array(items)) => items
            .into_iter()
            .filter(Value::is_object)
            .filter_map(|item| serde_json::from_value(item).ok())
            .collect(),
        _ => Vec::new(),
    };
    Ok(entries)
}

/// One client credential embedded in an inbound's settings.
///
/// Panels add protocol-specific fields (flow, limitIp, subId, ...); they
/// are ignored here.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CredentialEntry {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
}

impl InboundSettings {
    pub fn parse(raw: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(raw)
    }

    /// Id of the first credential whose email equals `email`.
    pub fn credential_id_for_email(&self, email: &str) -> Option<&str> {
        self.clients
            .iter()
            .find(|c| c.email.as_deref() == Some(email))
            .and_then(|c| c.id.as_deref())
    }
}

/// Caller-facing usage report for one client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UsageSnapshot {
    pub traffic_id: i64,
    pub email: String,
    pub inbound_id: i64,
    /// Credential id recovered from the inbound settings, if any.
    pub client_id: Option<String>,
    pub enable: u8,
    /// Countdown string, or one of the unbounded/expired sentinels.
    pub expiry_time: String,
    #[serde(rename = "upGB")]
    pub up_gb: String,
    #[serde(rename = "downGB")]
    pub down_gb: String,
    #[serde(rename = "totalGB")]
    pub total_gb: String,
}
