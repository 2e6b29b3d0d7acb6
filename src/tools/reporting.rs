// ABOUTME: Tool bodies for core and realtime Analytics reporting
// ABOUTME: Builds Data API request payloads from tool arguments
//
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Reporting tools over the Analytics Data API.

use crate::analytics::DataApiClient;
use crate::errors::{AppError, AppResult};
use serde_json::{json, Map, Value};

/// Runs a core report against a property
///
/// # Errors
///
/// Returns an error if the Data API call fails.
pub async fn run_report(
    client: &DataApiClient,
    property: &str,
    request: &Value,
) -> AppResult<Value> {
    client.run_report(property, request).await
}

/// Runs a realtime report against a property
///
/// # Errors
///
/// Returns an error if the Data API call fails.
pub async fn run_realtime_report(
    client: &DataApiClient,
    property: &str,
    request: &Value,
) -> AppResult<Value> {
    client.run_realtime_report(property, request).await
}

/// Build a `runReport` request body from tool arguments.
///
/// Tool arguments use snake_case and plain string lists; the Data API expects
/// camelCase with named objects.
///
/// # Errors
///
/// Returns `InvalidInput` when required report arguments are missing or of
/// the wrong shape.
pub fn build_report_request(args: &Value) -> AppResult<Value> {
    let mut body = Map::new();

    let date_ranges = args
        .get("date_ranges")
        .and_then(Value::as_array)
        .ok_or_else(|| AppError::invalid_input("'date_ranges' must be a non-empty array"))?;
    if date_ranges.is_empty() {
        return Err(AppError::invalid_input("'date_ranges' must be a non-empty array"));
    }
    let date_ranges = date_ranges
        .iter()
        .map(convert_date_range)
        .collect::<AppResult<Vec<Value>>>()?;
    body.insert("dateRanges".to_owned(), Value::Array(date_ranges));

    body.insert("metrics".to_owned(), named_list(args, "metrics", true)?);
    let dimensions = named_list(args, "dimensions", false)?;
    if dimensions.as_array().is_some_and(|list| !list.is_empty()) {
        body.insert("dimensions".to_owned(), dimensions);
    }

    copy_integer(args, &mut body, "limit");
    copy_integer(args, &mut body, "offset");

    Ok(Value::Object(body))
}

/// Build a `runRealtimeReport` request body from tool arguments
///
/// # Errors
///
/// Returns `InvalidInput` when required report arguments are missing or of
/// the wrong shape.
pub fn build_realtime_request(args: &Value) -> AppResult<Value> {
    let mut body = Map::new();

    body.insert("metrics".to_owned(), named_list(args, "metrics", true)?);
    let dimensions = named_list(args, "dimensions", false)?;
    if dimensions.as_array().is_some_and(|list| !list.is_empty()) {
        body.insert("dimensions".to_owned(), dimensions);
    }

    copy_integer(args, &mut body, "limit");

    Ok(Value::Object(body))
}

fn convert_date_range(range: &Value) -> AppResult<Value> {
    let start = range
        .get("start_date")
        .and_then(Value::as_str)
        .ok_or_else(|| AppError::invalid_input("each date range requires 'start_date'"))?;
    let end = range
        .get("end_date")
        .and_then(Value::as_str)
        .ok_or_else(|| AppError::invalid_input("each date range requires 'end_date'"))?;

    let mut converted = json!({
        "startDate": start,
        "endDate": end,
    });
    if let Some(name) = range.get("name").and_then(Value::as_str) {
        converted["name"] = json!(name);
    }
    Ok(converted)
}

/// Convert a list of API names into the `[{"name": ...}]` shape
fn named_list(args: &Value, field: &str, required: bool) -> AppResult<Value> {
    match args.get(field) {
        Some(Value::Array(items)) => {
            let named = items
                .iter()
                .map(|item| {
                    item.as_str()
                        .map(|name| json!({ "name": name }))
                        .ok_or_else(|| {
                            AppError::invalid_input(format!("'{field}' must be a list of strings"))
                        })
                })
                .collect::<AppResult<Vec<Value>>>()?;
            if required && named.is_empty() {
                return Err(AppError::invalid_input(format!(
                    "'{field}' must be a non-empty list"
                )));
            }
            Ok(Value::Array(named))
        }
        Some(_) => Err(AppError::invalid_input(format!(
            "'{field}' must be a list of strings"
        ))),
        None if required => Err(AppError::invalid_input(format!("'{field}' is required"))),
        None => Ok(Value::Array(Vec::new())),
    }
}

fn copy_integer(args: &Value, body: &mut Map<String, Value>, field: &str) {
    if let Some(value) = args.get(field).and_then(Value::as_i64) {
        body.insert(field.to_owned(), json!(value));
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;

    #[test]
    fn test_build_report_request_converts_shapes() {
        let args = json!({
            "date_ranges": [{"start_date": "2025-01-01", "end_date": "2025-01-31", "name": "jan"}],
            "dimensions": ["country"],
            "metrics": ["activeUsers"],
            "limit": 50,
        });
        let body = build_report_request(&args).unwrap();
        assert_eq!(body["dateRanges"][0]["startDate"], "2025-01-01");
        assert_eq!(body["dateRanges"][0]["name"], "jan");
        assert_eq!(body["dimensions"][0]["name"], "country");
        assert_eq!(body["metrics"][0]["name"], "activeUsers");
        assert_eq!(body["limit"], 50);
        assert!(body.get("offset").is_none());
    }

    #[test]
    fn test_build_report_request_requires_date_ranges() {
        let args = json!({"metrics": ["activeUsers"]});
        assert!(build_report_request(&args).is_err());
    }

    #[test]
    fn test_build_realtime_request_requires_metrics() {
        assert!(build_realtime_request(&json!({})).is_err());
        let body = build_realtime_request(&json!({"metrics": ["activeUsers"]})).unwrap();
        assert_eq!(body["metrics"][0]["name"], "activeUsers");
        assert!(body.get("dimensions").is_none());
    }
}
