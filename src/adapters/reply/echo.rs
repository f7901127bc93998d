//! Templated echo reply generator.
//!
//! Stands in for a text-generation backend: the reply is the template with
//! `{content}` replaced by the user's message. Deterministic, so the tests can
//! predict every chunk.

use async_trait::async_trait;

use crate::domain::foundation::{ConversationId, ValidationError};
use crate::ports::{ReplyError, ReplyGenerator};

/// Placeholder substituted with the user's message.
const PLACEHOLDER: &str = "{content}";

pub const DEFAULT_REPLY_TEMPLATE: &str =
    "Hello! I am your assistant. Your message was: {content}. I am working on it for you.";

#[derive(Debug, Clone)]
pub struct EchoReplyGenerator {
    template: String,
}

impl EchoReplyGenerator {
    /// Creates a generator from a template containing `{content}`.
    pub fn new(template: impl Into<String>) -> Result<Self, ValidationError> {
        let template = template.into();
        if !template.contains(PLACEHOLDER) {
            return Err(ValidationError::invalid_format(
                "reply_template",
                "must contain {content}",
            ));
        }
        Ok(Self { template })
    }

    /// Renders the reply for `content`.
    pub fn render(&self, content: &str) -> String {
        self.template.replace(PLACEHOLDER, content)
    }
}

impl Default for EchoReplyGenerator {
    fn default() -> Self {
        Self {
            template: DEFAULT_REPLY_TEMPLATE.to_string(),
        }
    }
}

#[async_trait]
impl ReplyGenerator for EchoReplyGenerator {
    async fn generate_reply(
        &self,
        _conversation_id: ConversationId,
        user_content: &str,
    ) -> Result<String, ReplyError> {
        Ok(self.render(user_content))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_template_echoes_content() {
        let reply = EchoReplyGenerator::default().render("hello");
        assert_eq!(
            reply,
            "Hello! I am your assistant. Your message was: hello. I am working on it for you."
        );
    }

    #[test]
    fn custom_template_requires_placeholder() {
        assert!(EchoReplyGenerator::new("no placeholder").is_err());
        let gen = EchoReplyGenerator::new("您的消息是：{content}。").unwrap();
        assert_eq!(gen.render("你好"), "您的消息是：你好。");
    }

    #[tokio::test]
    async fn generate_reply_is_deterministic() {
        let gen = EchoReplyGenerator::default();
        let a = gen.generate_reply(ConversationId::new(1), "x").await.unwrap();
        let b = gen.generate_reply(ConversationId::new(2), "x").await.unwrap();
        assert_eq!(a, b);
    }
}
