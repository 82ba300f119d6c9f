use crate::application::tooling::{InputSchema, LocalTool, ToolArgs, ToolError};
use async_trait::async_trait;
use serde_json::json;

pub(super) const NAME: &str = "weather";

/// Canned weather report. Stands in for a real weather lookup.
pub struct Weather;

#[async_trait]
impl LocalTool for Weather {
    fn name(&self) -> &str {
        NAME
    }

    fn description(&self) -> &str {
        "Get weather for a given city."
    }

    fn input_schema(&self) -> InputSchema {
        InputSchema::from_value(json!({
            "type": "object",
            "properties": {
                "city": { "type": "string", "description": "City to report on" }
            },
            "required": ["city"]
        }))
    }

    async fn call(&self, args: ToolArgs) -> Result<String, ToolError> {
        Ok(format!("It's always sunny in {}!", args.str("city")?))
    }
}
