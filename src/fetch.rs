//! Fetching and decoding asset content.
//!
//! Asset URLs on the API's own host are fetched with the authenticated
//! session so private assets stay reachable; any other host is fetched
//! with the anonymous session (fixed User-Agent, same retry contract as
//! direct storage transfers).

use crate::asset::{AssetFormat, AssetValue};
use crate::client::DocumentCloud;
use crate::error::{Error, Result};

/// GET a synthesized asset URL and decode the body per `format`.
pub async fn fetch_asset(
    client: &DocumentCloud,
    url: &str,
    format: AssetFormat,
) -> Result<AssetValue> {
    let response = if client.is_api_host(url)? {
        client.get_full_url(url).await?
    } else {
        client.anonymous_get(url).await?
    };
    let bytes = response.bytes().await?;
    decode(bytes.to_vec(), format)
}

/// Decode a fetched body: UTF-8 text, parsed JSON, or raw bytes.
pub fn decode(bytes: Vec<u8>, format: AssetFormat) -> Result<AssetValue> {
    match format {
        AssetFormat::Text => {
            let text = String::from_utf8(bytes)
                .map_err(|_| Error::BadResponse("asset body is not valid UTF-8".to_string()))?;
            Ok(AssetValue::Text(text))
        }
        AssetFormat::Json => Ok(AssetValue::Json(serde_json::from_slice(&bytes)?)),
        AssetFormat::RawBytes => Ok(AssetValue::Bytes(bytes)),
    }
}
