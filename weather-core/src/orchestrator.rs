//! One user turn: ask the backend, run any requested weather lookups, ask again.
//!
//! Failures never escape [`Orchestrator::complete`]. Backend errors are rendered
//! as the assistant's reply; weather errors are handed to the model as the tool
//! result so it can explain them.

use serde_json::json;

use crate::{
    Config,
    error::BackendError,
    llm::{ChatBackend, ChatMessage, ChatRequest, HttpChatBackend, ToolCall},
    provider::{WeatherProvider, provider_from_config},
    tools::{GetWeatherArgs, WEATHER_TOOL_NAME, describe_tools},
};

#[derive(Debug)]
pub struct Orchestrator {
    backend: Box<dyn ChatBackend>,
    weather: Box<dyn WeatherProvider>,
    model: String,
    temperature: f32,
}

impl Orchestrator {
    pub fn new(
        backend: Box<dyn ChatBackend>,
        weather: Box<dyn WeatherProvider>,
        model: impl Into<String>,
        temperature: f32,
    ) -> Self {
        Self {
            backend,
            weather,
            model: model.into(),
            temperature,
        }
    }

    /// HTTP backend and OpenWeather provider, both taken from `config`.
    pub fn from_config(config: &Config) -> anyhow::Result<Self> {
        let backend = HttpChatBackend::from_config(&config.backend)?;
        let weather = provider_from_config(config)?;

        Ok(Self::new(
            Box::new(backend),
            weather,
            config.backend.model.clone(),
            config.backend.temperature,
        ))
    }

    /// Final assistant text for a conversation ending in a user message.
    pub async fn complete(&self, history: &[ChatMessage]) -> String {
        let first = ChatRequest {
            model: self.model.clone(),
            messages: history.to_vec(),
            tools: Some(describe_tools()),
            tool_choice: Some("auto".to_string()),
            temperature: self.temperature,
        };

        let reply = match self.backend.send(&first).await {
            Ok(reply) => reply,
            Err(err) => return render_first_round_error(&err),
        };

        if reply.tool_calls().is_empty() {
            return reply.content().to_string();
        }

        tracing::debug!(calls = reply.tool_calls().len(), "model requested tool calls");

        let mut messages = first.messages;
        let calls = reply.tool_calls().to_vec();
        messages.push(reply);

        // Sequential, in the order the backend listed them.
        for call in &calls {
            let content = self.run_tool(call).await;
            messages.push(ChatMessage::tool(call.id.clone(), content));
        }

        let followup = ChatRequest {
            model: self.model.clone(),
            messages,
            tools: None,
            tool_choice: None,
            temperature: self.temperature,
        };

        match self.backend.send(&followup).await {
            Ok(reply) => reply.content().to_string(),
            Err(err) => render_final_round_error(&err),
        }
    }

    /// JSON tool result for one call. Always produces a reply so every call id is answered.
    async fn run_tool(&self, call: &ToolCall) -> String {
        let name = call.function.name.as_str();
        if name != WEATHER_TOOL_NAME {
            tracing::warn!(function = name, id = %call.id, "model requested an unknown function");
            return failure(format!("Unsupported function: {name}"));
        }

        let args = match GetWeatherArgs::parse(&call.function.arguments) {
            Ok(args) => args,
            Err(err) => {
                tracing::warn!(id = %call.id, "unparseable get_weather arguments: {err}");
                return failure(format!("Invalid arguments for {WEATHER_TOOL_NAME}: {err}"));
            }
        };

        tracing::debug!(city = %args.city, id = %call.id, "executing get_weather");

        match self.weather.fetch_weather(&args.city).await {
            Ok(reading) => json!({ "success": true, "data": reading }).to_string(),
            Err(err) => failure(err.to_string()),
        }
    }
}

fn failure(error: String) -> String {
    json!({ "success": false, "error": error }).to_string()
}

fn render_first_round_error(err: &BackendError) -> String {
    match err {
        BackendError::Status { .. } => format!("LLM error: {err}"),
        other => format!("LLM request failed: {other}"),
    }
}

fn render_final_round_error(err: &BackendError) -> String {
    match err {
        BackendError::Status { status_code, .. } => {
            format!("Error getting final response: {status_code}")
        }
        other => format!("Final response request failed: {other}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{error::WeatherError, model::WeatherReading};
    use async_trait::async_trait;
    use serde_json::Value;
    use std::{
        collections::VecDeque,
        sync::{Arc, Mutex},
    };

    #[derive(Debug, Default, Clone)]
    struct FakeBackend {
        replies: Arc<Mutex<VecDeque<Result<ChatMessage, BackendError>>>>,
        requests: Arc<Mutex<Vec<ChatRequest>>>,
    }

    impl FakeBackend {
        fn with_replies(replies: Vec<Result<ChatMessage, BackendError>>) -> Self {
            Self {
                replies: Arc::new(Mutex::new(replies.into())),
                requests: Arc::default(),
            }
        }

        fn requests(&self) -> Vec<ChatRequest> {
            self.requests.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl ChatBackend for FakeBackend {
        async fn send(&self, request: &ChatRequest) -> Result<ChatMessage, BackendError> {
            self.requests.lock().unwrap().push(request.clone());
            self.replies
                .lock()
                .unwrap()
                .pop_front()
                .expect("unexpected extra backend call")
        }
    }

    #[derive(Debug, Default, Clone)]
    struct FakeWeather {
        fail: bool,
        cities: Arc<Mutex<Vec<String>>>,
    }

    impl FakeWeather {
        fn failing() -> Self {
            Self { fail: true, ..Self::default() }
        }

        fn cities(&self) -> Vec<String> {
            self.cities.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl WeatherProvider for FakeWeather {
        async fn fetch_weather(&self, city: &str) -> Result<WeatherReading, WeatherError> {
            self.cities.lock().unwrap().push(city.to_string());
            if self.fail {
                return Err(WeatherError::Provider {
                    status_code: 404,
                    message: "city not found".into(),
                });
            }
            Ok(WeatherReading {
                city: city.to_string(),
                country: "JP".into(),
                temperature: 21.0,
                feels_like: Some(20.5),
                description: "few clouds".into(),
                humidity: 55,
                wind_speed: Some(2.0),
                pressure: Some(1010),
                observed_at: None,
            })
        }
    }

    fn orchestrator(backend: &FakeBackend, weather: &FakeWeather) -> Orchestrator {
        Orchestrator::new(Box::new(backend.clone()), Box::new(weather.clone()), "test-model", 0.3)
    }

    fn tool_call_reply(calls: Vec<ToolCall>) -> ChatMessage {
        ChatMessage::Assistant { content: None, tool_calls: calls }
    }

    fn history() -> Vec<ChatMessage> {
        vec![ChatMessage::system("sys"), ChatMessage::user("Weather in Tokyo?")]
    }

    fn tool_payload(msg: &ChatMessage) -> (String, Value) {
        match msg {
            ChatMessage::Tool { content, tool_call_id } => {
                (tool_call_id.clone(), serde_json::from_str(content).unwrap())
            }
            other => panic!("expected tool message, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn plain_reply_is_returned_after_one_call() {
        let backend = FakeBackend::with_replies(vec![Ok(ChatMessage::assistant("Hello there"))]);
        let weather = FakeWeather::default();

        let answer = orchestrator(&backend, &weather).complete(&history()).await;

        assert_eq!(answer, "Hello there");
        let requests = backend.requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].tools, Some(describe_tools()));
        assert_eq!(requests[0].tool_choice.as_deref(), Some("auto"));
        assert_eq!(requests[0].temperature, 0.3);
        assert_eq!(requests[0].messages, history());
        assert!(weather.cities().is_empty());
    }

    #[tokio::test]
    async fn weather_call_is_executed_and_answered() {
        let backend = FakeBackend::with_replies(vec![
            Ok(tool_call_reply(vec![ToolCall::function(
                "call_1",
                "get_weather",
                r#"{"city":"Tokyo"}"#,
            )])),
            Ok(ChatMessage::assistant("It is 21°C in Tokyo.")),
        ]);
        let weather = FakeWeather::default();

        let answer = orchestrator(&backend, &weather).complete(&history()).await;

        assert_eq!(answer, "It is 21°C in Tokyo.");
        assert_eq!(weather.cities(), vec!["Tokyo".to_string()]);

        let requests = backend.requests();
        assert_eq!(requests.len(), 2);

        let second = &requests[1];
        assert!(second.tools.is_none());
        assert!(second.tool_choice.is_none());
        assert_eq!(second.messages.len(), 4);
        assert_eq!(second.messages[2].tool_calls().len(), 1);

        let (id, payload) = tool_payload(&second.messages[3]);
        assert_eq!(id, "call_1");
        assert_eq!(payload["success"], true);
        assert_eq!(payload["data"]["city"], "Tokyo");
        assert_eq!(payload["data"]["feels_like"], 20.5);
    }

    #[tokio::test]
    async fn weather_failure_is_fed_back_as_tool_result() {
        let backend = FakeBackend::with_replies(vec![
            Ok(tool_call_reply(vec![ToolCall::function(
                "call_9",
                "get_weather",
                r#"{"city":"Atlantis"}"#,
            )])),
            Ok(ChatMessage::assistant("I couldn't find Atlantis.")),
        ]);
        let weather = FakeWeather::failing();

        let answer = orchestrator(&backend, &weather).complete(&history()).await;

        assert_eq!(answer, "I couldn't find Atlantis.");
        let requests = backend.requests();
        assert_eq!(requests.len(), 2);

        let (id, payload) = tool_payload(&requests[1].messages[3]);
        assert_eq!(id, "call_9");
        assert_eq!(payload["success"], false);
        assert!(payload["error"].as_str().unwrap().contains("404"));
    }

    #[tokio::test]
    async fn multiple_calls_run_in_listed_order() {
        let backend = FakeBackend::with_replies(vec![
            Ok(tool_call_reply(vec![
                ToolCall::function("a", "get_weather", r#"{"city":"London"}"#),
                ToolCall::function("b", "get_weather", r#"{"city":"Paris"}"#),
            ])),
            Ok(ChatMessage::assistant("London is cooler.")),
        ]);
        let weather = FakeWeather::default();

        orchestrator(&backend, &weather).complete(&history()).await;

        assert_eq!(weather.cities(), vec!["London".to_string(), "Paris".to_string()]);
        let second = &backend.requests()[1];
        assert_eq!(tool_payload(&second.messages[3]).0, "a");
        assert_eq!(tool_payload(&second.messages[4]).0, "b");
    }

    #[tokio::test]
    async fn unknown_function_gets_unsupported_reply() {
        let backend = FakeBackend::with_replies(vec![
            Ok(tool_call_reply(vec![ToolCall::function("x", "get_stock_price", r#"{"ticker":"ACME"}"#)])),
            Ok(ChatMessage::assistant("I can only check the weather.")),
        ]);
        let weather = FakeWeather::default();

        let answer = orchestrator(&backend, &weather).complete(&history()).await;

        assert_eq!(answer, "I can only check the weather.");
        assert!(weather.cities().is_empty());

        let (id, payload) = tool_payload(&backend.requests()[1].messages[3]);
        assert_eq!(id, "x");
        assert_eq!(payload["success"], false);
        assert_eq!(payload["error"], "Unsupported function: get_stock_price");
    }

    #[tokio::test]
    async fn invalid_arguments_get_error_reply() {
        let backend = FakeBackend::with_replies(vec![
            Ok(tool_call_reply(vec![ToolCall::function("c", "get_weather", "not json")])),
            Ok(ChatMessage::assistant("Which city?")),
        ]);
        let weather = FakeWeather::default();

        let answer = orchestrator(&backend, &weather).complete(&history()).await;

        assert_eq!(answer, "Which city?");
        assert!(weather.cities().is_empty());
        let (_, payload) = tool_payload(&backend.requests()[1].messages[3]);
        assert!(payload["error"].as_str().unwrap().starts_with("Invalid arguments for get_weather"));
    }

    #[tokio::test]
    async fn first_round_status_error_becomes_text() {
        let backend = FakeBackend::with_replies(vec![Err(BackendError::Status {
            status_code: 500,
            body: "model crashed".into(),
        })]);

        let answer = orchestrator(&backend, &FakeWeather::default()).complete(&history()).await;

        assert_eq!(answer, "LLM error: 500 - model crashed");
        assert_eq!(backend.requests().len(), 1);
    }

    #[tokio::test]
    async fn first_round_network_error_becomes_text() {
        let backend =
            FakeBackend::with_replies(vec![Err(BackendError::Network("connection refused".into()))]);

        let answer = orchestrator(&backend, &FakeWeather::default()).complete(&history()).await;

        assert_eq!(answer, "LLM request failed: request failed: connection refused");
    }

    #[tokio::test]
    async fn final_round_error_becomes_text() {
        let backend = FakeBackend::with_replies(vec![
            Ok(tool_call_reply(vec![ToolCall::function("1", "get_weather", r#"{"city":"Oslo"}"#)])),
            Err(BackendError::Status { status_code: 502, body: "bad gateway".into() }),
        ]);

        let answer = orchestrator(&backend, &FakeWeather::default()).complete(&history()).await;

        assert_eq!(answer, "Error getting final response: 502");
    }

    #[tokio::test]
    async fn final_reply_without_content_is_empty() {
        let backend = FakeBackend::with_replies(vec![
            Ok(tool_call_reply(vec![ToolCall::function("1", "get_weather", r#"{"city":"Oslo"}"#)])),
            Ok(ChatMessage::Assistant { content: None, tool_calls: Vec::new() }),
        ]);

        let answer = orchestrator(&backend, &FakeWeather::default()).complete(&history()).await;

        assert_eq!(answer, "");
    }

    #[tokio::test]
    async fn orchestrator_keeps_no_state_between_turns() {
        let backend = FakeBackend::with_replies(vec![
            Ok(ChatMessage::assistant("one")),
            Ok(ChatMessage::assistant("two")),
        ]);
        let orch = orchestrator(&backend, &FakeWeather::default());

        orch.complete(&history()).await;
        orch.complete(&history()).await;

        let requests = backend.requests();
        assert_eq!(requests[0].messages, requests[1].messages);
    }
}
