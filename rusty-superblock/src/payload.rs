//! Typed schema of a trigger object's structured payload.

use serde::de::Error as _;
use serde::{Deserialize, Deserializer};
use serde_json::Value;

use crate::error::SuperblockError;

/// Memo attached to the first superblock output when the backing object is gone.
pub const DEFAULT_PHASE_MEMO: &str = "<price>-0.00</price><qtphase>-0.00</qtphase>";

/// Fields of a trigger payload. Unknown keys are ignored.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct TriggerPayload {
    /// Height at which the payments must appear
    pub event_block_height: u64,
    /// `|`-separated payee addresses
    pub payment_addresses: String,
    /// `|`-separated payment amounts, in coins
    pub payment_amounts: String,
    #[serde(default, deserialize_with = "scalar_as_string")]
    pub price: Option<String>,
    #[serde(default, deserialize_with = "scalar_as_string")]
    pub qtphase: Option<String>,
    #[serde(default, deserialize_with = "scalar_as_string")]
    pub sig: Option<String>,
}

/// Accepts any JSON scalar and keeps its textual form.
fn scalar_as_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<Value>::deserialize(deserializer)? {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s)),
        Some(Value::Number(n)) => Ok(Some(n.to_string())),
        Some(Value::Bool(b)) => Ok(Some(b.to_string())),
        Some(other) => Err(D::Error::custom(format!("expected a scalar, found {}", other))),
    }
}

impl TriggerPayload {
    pub fn from_value(value: &Value) -> Result<Self, SuperblockError> {
        TriggerPayload::deserialize(value)
            .map_err(|e| SuperblockError::MalformedPayload(e.to_string()))
    }

    /// Price/phase/signature metadata carried by the first superblock output.
    pub fn phase_memo(&self) -> String {
        format!(
            "<price>{}</price><qtphase>{}</qtphase>{}",
            self.price.as_deref().unwrap_or_default(),
            self.qtphase.as_deref().unwrap_or_default(),
            self.sig.as_deref().unwrap_or_default(),
        )
    }
}
