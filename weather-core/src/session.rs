use crate::llm::ChatMessage;

pub const DEFAULT_HISTORY_WINDOW: usize = 10;

pub const DEFAULT_SYSTEM_PROMPT: &str = "You are a helpful assistant with access to weather information. \
When users ask about weather, use the get_weather function to retrieve current weather data. \
Provide friendly, informative responses about weather conditions. \
For non-weather questions, respond normally as a helpful assistant.";

/// Chat transcript of one interactive session.
///
/// The full history is kept for display; only the most recent `window`
/// messages are sent to the backend.
#[derive(Debug, Clone)]
pub struct Session {
    system_prompt: String,
    window: usize,
    history: Vec<ChatMessage>,
}

impl Default for Session {
    fn default() -> Self {
        Self::new(DEFAULT_SYSTEM_PROMPT, DEFAULT_HISTORY_WINDOW)
    }
}

impl Session {
    pub fn new(system_prompt: impl Into<String>, window: usize) -> Self {
        Self {
            system_prompt: system_prompt.into(),
            window,
            history: Vec::new(),
        }
    }

    pub fn history(&self) -> &[ChatMessage] {
        &self.history
    }

    pub fn len(&self) -> usize {
        self.history.len()
    }

    pub fn is_empty(&self) -> bool {
        self.history.is_empty()
    }

    pub fn push_user(&mut self, content: impl Into<String>) {
        self.history.push(ChatMessage::user(content));
    }

    pub fn push_assistant(&mut self, content: impl Into<String>) {
        self.history.push(ChatMessage::assistant(content));
    }

    /// Messages for the next backend request: system prompt, then the tail of the history.
    pub fn context(&self) -> Vec<ChatMessage> {
        let start = self.history.len().saturating_sub(self.window);

        let mut messages = Vec::with_capacity(self.history.len() - start + 1);
        messages.push(ChatMessage::system(self.system_prompt.clone()));
        messages.extend_from_slice(&self.history[start..]);
        messages
    }

    pub fn clear(&mut self) {
        self.history.clear();
    }
}
