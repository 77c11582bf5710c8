//! Function declarations advertised to the chat backend.

use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

pub const WEATHER_TOOL_NAME: &str = "get_weather";
pub const WEATHER_TOOL_DESCRIPTION: &str = "Get current weather information for a specified city";

/// One entry of the request's `tools` array.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolSchema {
    #[serde(rename = "type")]
    pub kind: String,
    pub function: FunctionSchema,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionSchema {
    pub name: String,
    pub description: String,
    /// JSON schema of the arguments object.
    pub parameters: Value,
}

/// Arguments of a `get_weather` call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GetWeatherArgs {
    pub city: String,
}

impl GetWeatherArgs {
    /// Parse the JSON-encoded `function.arguments` string.
    pub fn parse(arguments: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(arguments)
    }
}

pub fn weather_tool() -> ToolSchema {
    ToolSchema {
        kind: "function".to_string(),
        function: FunctionSchema {
            name: WEATHER_TOOL_NAME.to_string(),
            description: WEATHER_TOOL_DESCRIPTION.to_string(),
            parameters: json!({
                "type": "object",
                "properties": {
                    "city": {
                        "type": "string",
                        "description": "The name of the city to get weather for"
                    }
                },
                "required": ["city"]
            }),
        },
    }
}

/// Every function the orchestrator can execute.
pub fn describe_tools() -> Vec<ToolSchema> {
    vec![weather_tool()]
}
