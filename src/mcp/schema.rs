// ABOUTME: MCP tool catalog with JSON-Schema input definitions
// ABOUTME: Declares the Analytics admin and reporting tools exposed by this server
//
// SPDX-License-Identifier: MIT OR Apache-2.0

//! # Tool Catalog
//!
//! Type-safe definitions of every tool this server exposes. Each tool keeps
//! `user_email` visible and required; the injected API client never appears
//! in the externally visible signature.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

/// MCP Tool Schema Definition
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolSchema {
    pub name: String,
    pub description: String,
    #[serde(rename = "inputSchema")]
    pub input_schema: Value,
}

/// Tool names
pub mod tools {
    pub const GET_ACCOUNT_SUMMARIES: &str = "get_account_summaries";
    pub const GET_PROPERTY_DETAILS: &str = "get_property_details";
    pub const LIST_GOOGLE_ADS_LINKS: &str = "list_google_ads_links";
    pub const LIST_PROPERTY_ANNOTATIONS: &str = "list_property_annotations";
    pub const GET_CUSTOM_DIMENSIONS_AND_METRICS: &str = "get_custom_dimensions_and_metrics";
    pub const RUN_REPORT: &str = "run_report";
    pub const RUN_REALTIME_REPORT: &str = "run_realtime_report";
}

fn user_email_property() -> Value {
    json!({
        "type": "string",
        "description": "User's Google email address for authentication."
    })
}

fn property_id_property() -> Value {
    json!({
        "type": ["integer", "string"],
        "description": "The Google Analytics property ID. Accepted formats are a number, or a string consisting of 'properties/' followed by a number."
    })
}

/// The full tool catalog advertised by `tools/list`
#[must_use]
pub fn get_tools() -> Vec<ToolSchema> {
    vec![
        ToolSchema {
            name: tools::GET_ACCOUNT_SUMMARIES.to_owned(),
            description:
                "Retrieves information about the user's Google Analytics accounts and properties."
                    .to_owned(),
            input_schema: json!({
                "type": "object",
                "properties": {
                    "user_email": user_email_property(),
                },
                "required": ["user_email"],
            }),
        },
        ToolSchema {
            name: tools::GET_PROPERTY_DETAILS.to_owned(),
            description: "Returns details about a Google Analytics property.".to_owned(),
            input_schema: json!({
                "type": "object",
                "properties": {
                    "property_id": property_id_property(),
                    "user_email": user_email_property(),
                },
                "required": ["property_id", "user_email"],
            }),
        },
        ToolSchema {
            name: tools::LIST_GOOGLE_ADS_LINKS.to_owned(),
            description: "Returns a list of links to Google Ads accounts for a property."
                .to_owned(),
            input_schema: json!({
                "type": "object",
                "properties": {
                    "property_id": property_id_property(),
                    "user_email": user_email_property(),
                },
                "required": ["property_id", "user_email"],
            }),
        },
        ToolSchema {
            name: tools::LIST_PROPERTY_ANNOTATIONS.to_owned(),
            description: "Returns annotations for a property. Annotations are notes left on GA4 for specific dates or periods, typically recording releases, campaign launches, or traffic anomalies.".to_owned(),
            input_schema: json!({
                "type": "object",
                "properties": {
                    "property_id": property_id_property(),
                    "user_email": user_email_property(),
                },
                "required": ["property_id", "user_email"],
            }),
        },
        ToolSchema {
            name: tools::GET_CUSTOM_DIMENSIONS_AND_METRICS.to_owned(),
            description: "Retrieves the custom dimensions and custom metrics defined on a property.".to_owned(),
            input_schema: json!({
                "type": "object",
                "properties": {
                    "property_id": property_id_property(),
                    "user_email": user_email_property(),
                },
                "required": ["property_id", "user_email"],
            }),
        },
        ToolSchema {
            name: tools::RUN_REPORT.to_owned(),
            description: "Runs a Google Analytics report for a property over the given date ranges, dimensions, and metrics.".to_owned(),
            input_schema: json!({
                "type": "object",
                "properties": {
                    "property_id": property_id_property(),
                    "user_email": user_email_property(),
                    "date_ranges": {
                        "type": "array",
                        "description": "Date ranges to report on, each with start_date and end_date in YYYY-MM-DD format (or relative values like 'today', 'yesterday', 'NdaysAgo').",
                        "items": {
                            "type": "object",
                            "properties": {
                                "start_date": {"type": "string"},
                                "end_date": {"type": "string"},
                                "name": {"type": "string"},
                            },
                            "required": ["start_date", "end_date"],
                        },
                    },
                    "dimensions": {
                        "type": "array",
                        "description": "API names of the dimensions to report on.",
                        "items": {"type": "string"},
                    },
                    "metrics": {
                        "type": "array",
                        "description": "API names of the metrics to report on.",
                        "items": {"type": "string"},
                    },
                    "limit": {
                        "type": "integer",
                        "description": "Maximum number of rows to return.",
                    },
                    "offset": {
                        "type": "integer",
                        "description": "Row offset for pagination.",
                    },
                },
                "required": ["property_id", "user_email", "date_ranges", "metrics"],
            }),
        },
        ToolSchema {
            name: tools::RUN_REALTIME_REPORT.to_owned(),
            description: "Runs a realtime Google Analytics report for a property, covering events from the last 30 minutes.".to_owned(),
            input_schema: json!({
                "type": "object",
                "properties": {
                    "property_id": property_id_property(),
                    "user_email": user_email_property(),
                    "dimensions": {
                        "type": "array",
                        "description": "API names of the dimensions to report on.",
                        "items": {"type": "string"},
                    },
                    "metrics": {
                        "type": "array",
                        "description": "API names of the metrics to report on.",
                        "items": {"type": "string"},
                    },
                    "limit": {
                        "type": "integer",
                        "description": "Maximum number of rows to return.",
                    },
                },
                "required": ["property_id", "user_email", "metrics"],
            }),
        },
    ]
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;

    #[test]
    fn test_every_tool_requires_user_email() {
        for tool in get_tools() {
            let required = tool.input_schema["required"].as_array().unwrap();
            assert!(
                required.iter().any(|r| r == "user_email"),
                "{} must require user_email",
                tool.name
            );
        }
    }

    #[test]
    fn test_no_tool_exposes_injected_client() {
        for tool in get_tools() {
            let properties = tool.input_schema["properties"].as_object().unwrap();
            assert!(
                !properties.contains_key("client"),
                "{} must not expose the injected client parameter",
                tool.name
            );
        }
    }
}
