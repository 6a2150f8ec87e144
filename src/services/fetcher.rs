// src/services/fetcher.rs

//! Page download backends.

use async_trait::async_trait;

use crate::error::Result;
use crate::models::Page;
use crate::utils::http;

/// Source of page markup.
#[async_trait]
pub trait Fetcher: Send + Sync {
    /// Download the page and return its markup decoded to UTF-8.
    async fn fetch(&self, page: &Page) -> Result<String>;
}

/// Fetcher backed by a shared `reqwest` client.
#[derive(Clone)]
pub struct HttpFetcher {
    client: reqwest::Client,
}

impl HttpFetcher {
    pub fn new() -> Result<Self> {
        Ok(Self {
            client: http::create_async_client()?,
        })
    }

    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn fetch(&self, page: &Page) -> Result<String> {
        http::fetch_page_async(&self.client, page).await
    }
}
