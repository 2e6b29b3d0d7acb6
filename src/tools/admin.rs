// ABOUTME: Tool bodies for Google Analytics account and property administration
// ABOUTME: Thin wrappers over the Admin API client returning JSON payloads
//
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Tools for gathering Google Analytics account and property information.

use crate::analytics::AdminApiClient;
use crate::errors::AppResult;
use serde_json::{json, Value};

/// Retrieves information about the user's accounts and properties
///
/// # Errors
///
/// Returns an error if the Admin API call fails.
pub async fn get_account_summaries(client: &AdminApiClient) -> AppResult<Value> {
    let summaries = client.list_account_summaries().await?;
    Ok(Value::Array(summaries))
}

/// Returns details about a property
///
/// # Errors
///
/// Returns an error if the Admin API call fails.
pub async fn get_property_details(client: &AdminApiClient, property: &str) -> AppResult<Value> {
    client.get_property(property).await
}

/// Returns a list of links to Google Ads accounts for a property
///
/// # Errors
///
/// Returns an error if the Admin API call fails.
pub async fn list_google_ads_links(client: &AdminApiClient, property: &str) -> AppResult<Value> {
    let links = client.list_google_ads_links(property).await?;
    Ok(Value::Array(links))
}

/// Returns annotations for a property (v1alpha surface)
///
/// # Errors
///
/// Returns an error if the Admin API call fails.
pub async fn list_property_annotations(
    client: &AdminApiClient,
    property: &str,
) -> AppResult<Value> {
    let annotations = client.list_reporting_data_annotations(property).await?;
    Ok(Value::Array(annotations))
}

/// Retrieves the custom dimensions and metrics defined on a property
///
/// # Errors
///
/// Returns an error if either Admin API call fails.
pub async fn get_custom_dimensions_and_metrics(
    client: &AdminApiClient,
    property: &str,
) -> AppResult<Value> {
    let dimensions = client.list_custom_dimensions(property).await?;
    let metrics = client.list_custom_metrics(property).await?;
    Ok(json!({
        "custom_dimensions": dimensions,
        "custom_metrics": metrics,
    }))
}
