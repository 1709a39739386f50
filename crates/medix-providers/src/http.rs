//! Shared HTTP error mapping for the backends.

use medix_contracts::error::{MedixError, MedixResult};

/// Longest slice of an error body kept in an error message.
const MAX_ERROR_BODY_CHARS: usize = 300;

pub(crate) fn send_error(provider: &str, e: reqwest::Error) -> MedixError {
    MedixError::ProviderFailed {
        provider: provider.to_string(),
        reason: format!("request failed: {}", e.without_url()),
    }
}

/// Return the body of a 2xx response, or an error carrying status and body.
pub(crate) async fn read_success_body(provider: &str, resp: reqwest::Response) -> MedixResult<String> {
    let status = resp.status();
    if !status.is_success() {
        let text = resp.text().await.unwrap_or_default();
        let snippet: String = text.chars().take(MAX_ERROR_BODY_CHARS).collect();
        return Err(MedixError::ProviderFailed {
            provider: provider.to_string(),
            reason: format!("HTTP {}: {}", status, snippet),
        });
    }

    resp.text().await.map_err(|e| MedixError::ResponseParsing {
        provider: provider.to_string(),
        reason: format!("failed to read response body: {}", e.without_url()),
    })
}
