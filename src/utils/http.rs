// src/utils/http.rs

//! HTTP client utilities.

use crate::error::{AppError, Result};
use crate::models::Page;

/// User-Agent sent with every request unless a page overrides it.
pub const DEFAULT_USER_AGENT: &str = concat!("pagewatch/", env!("CARGO_PKG_VERSION"));

/// Create the asynchronous HTTP client shared by all checks.
///
/// The per-check timeout is enforced by the checker, not the client.
pub fn create_async_client() -> Result<reqwest::Client> {
    let client = reqwest::Client::builder()
        .user_agent(DEFAULT_USER_AGENT)
        .build()?;
    Ok(client)
}

/// Download a page with its custom headers and return the body as UTF-8.
///
/// Bodies in another charset declared by `Content-Type` are transcoded.
pub async fn fetch_page_async(client: &reqwest::Client, page: &Page) -> Result<String> {
    let response = client
        .get(page.url.clone())
        .headers(page.headers.clone())
        .send()
        .await?;
    let status = response.status();
    if status.as_u16() >= 400 {
        return Err(AppError::Status {
            url: page.url.to_string(),
            status: status.as_u16(),
            reason: status.canonical_reason().unwrap_or("unknown").to_string(),
        });
    }

    Ok(response.text().await?)
}
