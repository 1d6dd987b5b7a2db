use crate::ProviderError;
use bytes::Bytes;
use reqwest::{Response, StatusCode};
use serde::de::DeserializeOwned;

/// Turns a non-success status into a `ProviderError`, keeping the body for the log line.
pub(crate) async fn checked(resp: Response) -> Result<Response, ProviderError> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    let body = resp.bytes().await.unwrap_or(Bytes::from_static(b""));
    let detail = format!("status {} body {}", status, String::from_utf8_lossy(&body));
    if status == StatusCode::TOO_MANY_REQUESTS {
        Err(ProviderError::RateLimited(detail))
    } else {
        Err(ProviderError::RequestFailed(detail))
    }
}

pub(crate) async fn decode<T: DeserializeOwned>(resp: Response) -> Result<T, ProviderError> {
    resp.json()
        .await
        .map_err(|e| ProviderError::InvalidResponse(e.to_string()))
}
