use rmcp::{
    ErrorData as McpError, ServerHandler,
    handler::server::{router::tool::ToolRouter, wrapper::Parameters},
    model::{CallToolResult, Content, Implementation, ServerCapabilities, ServerInfo},
    tool, tool_handler, tool_router,
};
use schemars::JsonSchema;
use serde::Deserialize;
use std::sync::Arc;
use weather_core::{WeatherError, WeatherProvider, WeatherSummary};

#[derive(Debug, Deserialize, JsonSchema)]
pub struct GetWeatherParams {
    /// Name of the city, e.g. "Paris" or "London,GB".
    pub city: String,
}

/// Stateless MCP front for a [`WeatherProvider`].
#[derive(Clone)]
pub struct WeatherServer {
    provider: Arc<dyn WeatherProvider>,
    tool_router: ToolRouter<Self>,
}

#[tool_router]
impl WeatherServer {
    pub fn new(provider: Arc<dyn WeatherProvider>) -> Self {
        Self {
            provider,
            tool_router: Self::tool_router(),
        }
    }

    async fn lookup(&self, city: &str) -> Result<WeatherSummary, WeatherError> {
        let reading = self.provider.fetch_weather(city).await?;
        Ok(WeatherSummary::from(&reading))
    }

    #[tool(name = "get_weather", description = "Fetch current weather for a given city")]
    async fn get_weather(
        &self,
        Parameters(params): Parameters<GetWeatherParams>,
    ) -> Result<CallToolResult, McpError> {
        tracing::debug!(city = %params.city, "get_weather called");

        let summary = self.lookup(&params.city).await.map_err(|err| {
            tracing::warn!(city = %params.city, "get_weather failed: {err}");
            fault(&err)
        })?;

        Ok(CallToolResult::success(vec![Content::json(&summary)?]))
    }
}

#[tool_handler]
impl ServerHandler for WeatherServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            server_info: Implementation {
                name: "weather-mcp".to_string(),
                version: env!("CARGO_PKG_VERSION").to_string(),
                ..Implementation::default()
            },
            instructions: Some(
                "Weather MCP Server. Use get_weather to fetch current conditions for a city."
                    .to_string(),
            ),
            ..ServerInfo::default()
        }
    }
}

/// Protocol error carrying the provider's message when there is one.
fn fault(err: &WeatherError) -> McpError {
    McpError::internal_error(err.host_message(), None)
}
