use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

impl ChatMessage {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ChatRequest {
    pub messages: Vec<ChatMessage>,
    pub temperature: Option<f64>,
    pub max_tokens: Option<i32>,
}

impl ChatRequest {
    pub fn new(messages: Vec<ChatMessage>) -> Self {
        Self {
            messages,
            temperature: None,
            max_tokens: None,
        }
    }

    /// Apply sampling settings from the `chat` config section.
    pub fn with_config(mut self, config: &serde_json::Value) -> Self {
        if let Some(chat) = config.get("chat") {
            self.temperature = chat
                .get("temperature")
                .and_then(|v| v.as_f64())
                .or(self.temperature);
            self.max_tokens = chat
                .get("max_tokens")
                .and_then(|v| v.as_i64())
                .map(|v| v as i32)
                .or(self.max_tokens);
        }

        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn with_config_applies_sampling_settings() {
        let config = json!({
            "chat": { "temperature": 0.2, "max_tokens": 512 }
        });

        let request = ChatRequest::new(vec![ChatMessage::user("hi")]).with_config(&config);

        assert_eq!(request.temperature, Some(0.2));
        assert_eq!(request.max_tokens, Some(512));
    }

    #[test]
    fn with_config_keeps_defaults_when_unset() {
        let config = json!({ "chat": { "temperature": null } });

        let request = ChatRequest::new(vec![]).with_config(&config);

        assert_eq!(request.temperature, None);
        assert_eq!(request.max_tokens, None);
    }
}
