// ABOUTME: Analytics Admin API client for account and property administration
// ABOUTME: Covers account summaries, property details, Ads links, annotations, custom definitions
//
// SPDX-License-Identifier: MIT OR Apache-2.0

use crate::constants::analytics::{ADMIN_V1ALPHA_BASE, ADMIN_V1BETA_BASE};
use crate::errors::AppResult;
use serde_json::Value;

use super::paginate;

const SERVICE: &str = "Analytics Admin API";

/// Client for the Analytics Admin API, bound to one access token.
///
/// The same type serves the v1beta and v1alpha surfaces; they differ only in
/// base URL.
pub struct AdminApiClient {
    http: reqwest::Client,
    base_url: String,
    access_token: String,
}

impl AdminApiClient {
    /// Client for the v1beta surface
    #[must_use]
    pub fn new(http: reqwest::Client, access_token: String) -> Self {
        Self {
            http,
            base_url: ADMIN_V1BETA_BASE.to_owned(),
            access_token,
        }
    }

    /// Client for the v1alpha surface (reporting data annotations)
    #[must_use]
    pub fn new_alpha(http: reqwest::Client, access_token: String) -> Self {
        Self {
            http,
            base_url: ADMIN_V1ALPHA_BASE.to_owned(),
            access_token,
        }
    }

    /// Base URL override for tests
    #[must_use]
    pub fn with_base_url(mut self, base_url: String) -> Self {
        self.base_url = base_url;
        self
    }

    /// List summaries of every account and property the user can access,
    /// retrieving all pages.
    ///
    /// # Errors
    ///
    /// Returns an error if the API call fails or the token is rejected.
    pub async fn list_account_summaries(&self) -> AppResult<Vec<Value>> {
        let url = format!("{}/accountSummaries", self.base_url);
        paginate(&self.http, SERVICE, &url, "accountSummaries", &self.access_token).await
    }

    /// Get details of a single property
    ///
    /// # Errors
    ///
    /// Returns an error if the API call fails or the token is rejected.
    pub async fn get_property(&self, property: &str) -> AppResult<Value> {
        let url = format!("{}/{property}", self.base_url);
        super::get_json(&self.http, SERVICE, &url, &[], &self.access_token).await
    }

    /// List links to Google Ads accounts for a property, all pages
    ///
    /// # Errors
    ///
    /// Returns an error if the API call fails or the token is rejected.
    pub async fn list_google_ads_links(&self, property: &str) -> AppResult<Vec<Value>> {
        let url = format!("{}/{property}/googleAdsLinks", self.base_url);
        paginate(&self.http, SERVICE, &url, "googleAdsLinks", &self.access_token).await
    }

    /// List reporting data annotations for a property, all pages.
    ///
    /// Only available on the v1alpha surface.
    ///
    /// # Errors
    ///
    /// Returns an error if the API call fails or the token is rejected.
    pub async fn list_reporting_data_annotations(&self, property: &str) -> AppResult<Vec<Value>> {
        let url = format!("{}/{property}/reportingDataAnnotations", self.base_url);
        paginate(
            &self.http,
            SERVICE,
            &url,
            "reportingDataAnnotations",
            &self.access_token,
        )
        .await
    }

    /// List custom dimensions defined on a property, all pages
    ///
    /// # Errors
    ///
    /// Returns an error if the API call fails or the token is rejected.
    pub async fn list_custom_dimensions(&self, property: &str) -> AppResult<Vec<Value>> {
        let url = format!("{}/{property}/customDimensions", self.base_url);
        paginate(&self.http, SERVICE, &url, "customDimensions", &self.access_token).await
    }

    /// List custom metrics defined on a property, all pages
    ///
    /// # Errors
    ///
    /// Returns an error if the API call fails or the token is rejected.
    pub async fn list_custom_metrics(&self, property: &str) -> AppResult<Vec<Value>> {
        let url = format!("{}/{property}/customMetrics", self.base_url);
        paginate(&self.http, SERVICE, &url, "customMetrics", &self.access_token).await
    }
}
