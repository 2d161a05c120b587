use anyhow::Result;
use custom_error::custom_error;
use log::error;

custom_error! {pub ApiError
    Status{status: u16, url: String, body: String} = "HTTP {status} from {url}: {body}",
}

impl ApiError {
    pub fn status(&self) -> u16 {
        match self {
            ApiError::Status { status, .. } => *status,
        }
    }
}

/// Turns a non-2xx response into an `ApiError` carrying the response body,
/// so callers can report what the remote system said.
pub async fn error_for_status(response: reqwest::Response) -> Result<reqwest::Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let url = response.url().to_string();
    let body = response.text().await.unwrap_or_default();
    error!("Request to {url} failed with HTTP {status}");
    error!(
        "Response body (first 500 chars): {}",
        body.chars().take(500).collect::<String>()
    );
    Err(ApiError::Status {
        status: status.as_u16(),
        url,
        body,
    }
    .into())
}

/// Decodes a JSON body, logging the raw text when it does not match the expected shape.
pub fn decode_json<T: serde::de::DeserializeOwned>(text: &str, what: &str) -> Result<T> {
    match serde_json::from_str(text) {
        Ok(value) => Ok(value),
        Err(e) => {
            error!("Failed to decode {what} response. Error: {e}");
            error!(
                "Response body (first 500 chars): {}",
                text.chars().take(500).collect::<String>()
            );
            Err(anyhow::anyhow!(
                "Failed to decode {what} response: {e}. Check debug log for response body."
            ))
        }
    }
}
