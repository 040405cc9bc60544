use super::AgentTool;
use anyhow::{bail, Result};
use async_trait::async_trait;
use chrono::Utc;
use serde::Deserialize;
use serde_json::{json, Value};
use std::fmt::Write;

const DEFAULT_FORMAT: &str = "%Y-%m-%d %H:%M:%S UTC";

/// Current UTC time
pub struct CurrentTime;

#[derive(Debug, Default, Deserialize)]
struct CurrentTimeInput {
    #[serde(default)]
    format: Option<String>,
}

#[async_trait]
impl AgentTool for CurrentTime {
    fn name(&self) -> &str {
        "current_time"
    }

    fn title(&self) -> &str {
        "Current time"
    }

    fn description(&self) -> &str {
        "Get the current date and time in UTC."
    }

    fn args(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "format": {
                    "type": "string",
                    "description": "Optional strftime format, defaults to \"%Y-%m-%d %H:%M:%S UTC\""
                }
            }
        })
    }

    async fn invoke(&self, input: Value) -> Result<String> {
        let input: CurrentTimeInput = if input.is_null() {
            CurrentTimeInput::default()
        } else {
            serde_json::from_value(input)?
        };
        let format = input.format.as_deref().unwrap_or(DEFAULT_FORMAT);

        let mut out = String::new();
        // chrono reports bad specifiers through fmt::Error
        if write!(out, "{}", Utc::now().format(format)).is_err() {
            bail!("invalid time format '{}'", format);
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_default_format() {
        let out = CurrentTime.invoke(json!({})).await.unwrap();
        assert!(out.ends_with(" UTC"));
        assert_eq!(out.len(), "2024-01-01 00:00:00 UTC".len());
    }

    #[tokio::test]
    async fn test_custom_format() {
        let out = CurrentTime.invoke(json!({"format": "%Y"})).await.unwrap();
        assert_eq!(out.len(), 4);
        assert!(out.chars().all(|c| c.is_ascii_digit()));
    }

    #[tokio::test]
    async fn test_invalid_format() {
        let err = CurrentTime.invoke(json!({"format": "%Q"})).await.unwrap_err();
        assert!(err.to_string().contains("invalid time format"));
    }
}
