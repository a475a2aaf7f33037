//! services/client/src/adapters/remote.rs
//!
//! This module contains the HTTP adapter, the concrete implementation of the
//! `RemoteProgressService` port. It speaks to the library gateway's reading
//! endpoints and collapses transport and status failures into `PortError` at
//! this boundary, so the core only ever branches on a `Result`.

use async_trait::async_trait;
use reading_library_core::domain::RawProgressRecord;
use reading_library_core::ports::{PortError, PortResult, RemoteProgressService};
use serde::Serialize;

/// Body of `POST /reading/start`.
#[derive(Serialize)]
struct StartReadingRequest<'a> {
    user_id: &'a str,
    book_id: &'a str,
    page: u32,
}

/// An HTTP adapter for the remote reading-progress service.
#[derive(Clone)]
pub struct HttpProgressAdapter {
    client: reqwest::Client,
    base_url: String,
}

impl HttpProgressAdapter {
    /// Creates a new adapter against `base_url` (no trailing slash needed).
    pub fn new(client: reqwest::Client, base_url: impl Into<String>) -> Self {
        let mut base_url = base_url.into();
        while base_url.ends_with('/') {
            base_url.pop();
        }
        Self { client, base_url }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

/// Maps a response to `Ok` only for 2xx statuses.
fn check_status(response: reqwest::Response) -> PortResult<reqwest::Response> {
    match response.error_for_status() {
        Ok(response) => Ok(response),
        Err(e) => Err(PortError::Unexpected(e.to_string())),
    }
}

#[async_trait]
impl RemoteProgressService for HttpProgressAdapter {
    async fn start(&self, user_id: &str, book_id: &str, page: u32) -> PortResult<()> {
        let response = self
            .client
            .post(self.url("/reading/start"))
            .json(&StartReadingRequest {
                user_id,
                book_id,
                page,
            })
            .send()
            .await
            .map_err(|e| PortError::Unexpected(e.to_string()))?;
        check_status(response)?;
        Ok(())
    }

    async fn fetch_progress_list(&self, user_id: &str) -> PortResult<Vec<RawProgressRecord>> {
        let response = self
            .client
            .get(self.url(&format!("/reading/progress/{}", user_id)))
            .send()
            .await
            .map_err(|e| PortError::Unexpected(e.to_string()))?;
        check_status(response)?
            .json()
            .await
            .map_err(|e| PortError::Unexpected(e.to_string()))
    }

    async fn delete_progress(&self, user_id: &str, book_id: &str) -> PortResult<()> {
        let response = self
            .client
            .delete(self.url(&format!("/reading/progress/{}/{}", user_id, book_id)))
            .send()
            .await
            .map_err(|e| PortError::Unexpected(e.to_string()))?;
        check_status(response)?;
        Ok(())
    }
}
