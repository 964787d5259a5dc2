pub mod backend;
pub mod official;
pub mod official_history;
pub mod p2p;

pub use backend::BackendAdapter;
pub use official::OfficialRateAdapter;
pub use official_history::OfficialHistoryAdapter;
pub use p2p::P2pAdapter;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer};
use serde_json::Value;

use crate::data_source::SourceError;
use crate::http_client::{HttpClient, HttpRequest};
use crate::ProviderId;

/// Header carrying the official-rate provider's key.
pub const OFFICIAL_KEY_HEADER: &str = "x-dolarvzla-key";

/// Executes one GET and decodes a 2xx JSON body into the provider's native shape.
///
/// Transport errors, non-2xx statuses and undecodable bodies all come back as
/// [`SourceError`]s naming the provider.
pub(crate) async fn fetch_json<T>(
    provider: ProviderId,
    http_client: &dyn HttpClient,
    request: HttpRequest,
) -> Result<T, SourceError>
where
    T: DeserializeOwned,
{
    tracing::debug!(source = %provider, url = %request.url, "requesting upstream");

    let response = http_client.execute(request).await.map_err(|error| {
        if error.timed_out() {
            SourceError::timeout(format!("{provider} timed out: {}", error.message()))
        } else {
            SourceError::transport(format!("{provider} transport error: {}", error.message()))
        }
    })?;

    if !response.is_success() {
        return Err(SourceError::status(provider, response.status));
    }

    serde_json::from_str(&response.body).map_err(|error| {
        SourceError::schema(format!("failed to parse {provider} response: {error}"))
    })
}

/// Accepts a JSON number, a numeric string, or null/absent.
///
/// Anything else decodes as `None` so one odd field never rejects a whole payload.
pub(crate) fn lenient_f64<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::Number(number)) => number.as_f64(),
        Some(Value::String(text)) => text.trim().parse::<f64>().ok(),
        _ => None,
    }
    .filter(|number| number.is_finite()))
}

/// Accepts a string or number timestamp, keeping its textual form.
pub(crate) fn lenient_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::String(text)) if !text.trim().is_empty() => Some(text),
        Some(Value::Number(number)) => Some(number.to_string()),
        _ => None,
    })
}
