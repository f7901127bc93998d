//! Streaming configuration

use serde::Deserialize;
use std::time::Duration;

use crate::adapters::reply::DEFAULT_REPLY_TEMPLATE;
use crate::application::handlers::StreamTurnConfig;

use super::error::ValidationError;

/// Reply streaming and message limits
#[derive(Debug, Clone, Deserialize)]
pub struct StreamingConfig {
    /// Characters per `message_delta`
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,

    /// Pause between deltas in milliseconds; 0 disables pacing
    #[serde(default = "default_chunk_delay")]
    pub chunk_delay_ms: u64,

    /// Longest accepted user message, in characters
    #[serde(default = "default_max_content_chars")]
    pub max_content_chars: usize,

    /// Reply text; `{content}` is replaced by the user's message
    #[serde(default = "default_reply_template")]
    pub reply_template: String,
}

impl StreamingConfig {
    pub fn chunk_delay(&self) -> Duration {
        Duration::from_millis(self.chunk_delay_ms)
    }

    pub fn to_stream_config(&self) -> StreamTurnConfig {
        StreamTurnConfig {
            chunk_size: self.chunk_size,
            chunk_delay: self.chunk_delay(),
            max_content_chars: self.max_content_chars,
        }
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.chunk_size == 0 {
            return Err(ValidationError::InvalidChunkSize);
        }
        if self.max_content_chars == 0 {
            return Err(ValidationError::InvalidContentLimit);
        }
        if !self.reply_template.contains("{content}") {
            return Err(ValidationError::InvalidReplyTemplate);
        }
        Ok(())
    }
}

impl Default for StreamingConfig {
    fn default() -> Self {
        Self {
            chunk_size: default_chunk_size(),
            chunk_delay_ms: default_chunk_delay(),
            max_content_chars: default_max_content_chars(),
            reply_template: default_reply_template(),
        }
    }
}

fn default_chunk_size() -> usize {
    5
}

fn default_chunk_delay() -> u64 {
    50
}

fn default_max_content_chars() -> usize {
    10_000
}

fn default_reply_template() -> String {
    DEFAULT_REPLY_TEMPLATE.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_handler_defaults() {
        let config = StreamingConfig::default().to_stream_config();
        let handler_default = StreamTurnConfig::default();
        assert_eq!(config.chunk_size, handler_default.chunk_size);
        assert_eq!(config.chunk_delay, handler_default.chunk_delay);
        assert_eq!(config.max_content_chars, handler_default.max_content_chars);
    }

    #[test]
    fn test_zero_chunk_size_rejected() {
        let config = StreamingConfig {
            chunk_size: 0,
            ..Default::default()
        };
        assert_eq!(config.validate(), Err(ValidationError::InvalidChunkSize));
    }

    #[test]
    fn test_zero_content_limit_rejected() {
        let config = StreamingConfig {
            max_content_chars: 0,
            ..Default::default()
        };
        assert_eq!(config.validate(), Err(ValidationError::InvalidContentLimit));
    }

    #[test]
    fn test_template_needs_placeholder() {
        let config = StreamingConfig {
            reply_template: "static reply".to_string(),
            ..Default::default()
        };
        assert_eq!(config.validate(), Err(ValidationError::InvalidReplyTemplate));
    }

    #[test]
    fn test_zero_delay_disables_pacing() {
        let config = StreamingConfig {
            chunk_delay_ms: 0,
            ..Default::default()
        };
        assert_eq!(config.chunk_delay(), Duration::ZERO);
    }
}
