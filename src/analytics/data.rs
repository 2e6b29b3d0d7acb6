// ABOUTME: Analytics Data API client for core and realtime reporting
// ABOUTME: Runs runReport and runRealtimeReport against a property
//
// SPDX-License-Identifier: MIT OR Apache-2.0

use crate::constants::analytics::DATA_V1BETA_BASE;
use crate::errors::AppResult;
use serde_json::Value;

use super::post_json;

const SERVICE: &str = "Analytics Data API";

/// Client for the Analytics Data API, bound to one access token
pub struct DataApiClient {
    http: reqwest::Client,
    base_url: String,
    access_token: String,
}

impl DataApiClient {
    #[must_use]
    pub fn new(http: reqwest::Client, access_token: String) -> Self {
        Self {
            http,
            base_url: DATA_V1BETA_BASE.to_owned(),
            access_token,
        }
    }

    /// Base URL override for tests
    #[must_use]
    pub fn with_base_url(mut self, base_url: String) -> Self {
        self.base_url = base_url;
        self
    }

    /// Run a core report against a property
    ///
    /// # Errors
    ///
    /// Returns an error if the API call fails or the token is rejected.
    pub async fn run_report(&self, property: &str, request: &Value) -> AppResult<Value> {
        let url = format!("{}/{property}:runReport", self.base_url);
        post_json(&self.http, SERVICE, &url, request, &self.access_token).await
    }

    /// Run a realtime report against a property
    ///
    /// # Errors
    ///
    /// Returns an error if the API call fails or the token is rejected.
    pub async fn run_realtime_report(&self, property: &str, request: &Value) -> AppResult<Value> {
        let url = format!("{}/{property}:runRealtimeReport", self.base_url);
        post_json(&self.http, SERVICE, &url, request, &self.access_token).await
    }
}
