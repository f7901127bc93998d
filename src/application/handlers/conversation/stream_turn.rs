//! StreamTurn command handler.
//!
//! Runs one user-initiated exchange on a live connection: persist the user
//! turn, announce the reply, stream it in chunks, persist it, close it.

use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;

use crate::domain::conversation::{chunk_reply, NewTurn, Session, Turn};
use crate::domain::foundation::{ErrorCode, MessageId, ValidationError};
use crate::ports::{
    MessageStore, ReplyError, ReplyGenerator, SinkError, StoreError, StreamEvent, StreamEventSink,
};

/// Command to stream a reply to one client message.
#[derive(Debug, Clone)]
pub struct StreamTurnCommand {
    /// Session the message arrived on.
    pub session: Session,
    /// The user's message text.
    pub content: String,
}

impl StreamTurnCommand {
    pub fn new(session: Session, content: impl Into<String>) -> Self {
        Self {
            session,
            content: content.into(),
        }
    }
}

/// Errors that can occur while streaming a turn.
///
/// Everything except [`StreamTurnError::Transport`] leaves the connection
/// usable; the caller reports it to the client and keeps reading.
#[derive(Debug, Clone, Error)]
pub enum StreamTurnError {
    #[error("Invalid content: {0}")]
    InvalidContent(#[from] ValidationError),

    #[error("Failed to persist user turn: {0}")]
    UserTurnNotPersisted(#[source] StoreError),

    #[error("Reply generation failed: {source}")]
    ReplyFailed {
        message_id: MessageId,
        #[source]
        source: ReplyError,
    },

    #[error("Failed to persist assistant turn: {source}")]
    AssistantTurnNotPersisted {
        message_id: MessageId,
        #[source]
        source: StoreError,
    },

    #[error(transparent)]
    Transport(#[from] SinkError),
}

impl StreamTurnError {
    /// Id of the reply that was in flight, if one had been announced.
    pub fn message_id(&self) -> Option<MessageId> {
        match self {
            StreamTurnError::ReplyFailed { message_id, .. }
            | StreamTurnError::AssistantTurnNotPersisted { message_id, .. } => Some(*message_id),
            _ => None,
        }
    }

    /// True when the transport is gone and nothing more can be sent.
    pub fn is_terminal(&self) -> bool {
        matches!(self, StreamTurnError::Transport(_))
    }

    pub fn code(&self) -> ErrorCode {
        match self {
            StreamTurnError::InvalidContent(e) => e.code(),
            StreamTurnError::UserTurnNotPersisted(_)
            | StreamTurnError::AssistantTurnNotPersisted { .. } => ErrorCode::PersistenceFailure,
            StreamTurnError::ReplyFailed { .. } => ErrorCode::ReplyGenerationFailed,
            StreamTurnError::Transport(_) => ErrorCode::InternalError,
        }
    }
}

/// Both turns written by a completed exchange.
#[derive(Debug, Clone)]
pub struct StreamTurnResult {
    pub message_id: MessageId,
    pub user_turn: Turn,
    pub assistant_turn: Turn,
}

/// Configuration for the streaming handler.
#[derive(Debug, Clone)]
pub struct StreamTurnConfig {
    /// Characters per `message_delta`.
    pub chunk_size: usize,
    /// Pause between consecutive deltas.
    pub chunk_delay: Duration,
    /// Longest accepted user message, in characters.
    pub max_content_chars: usize,
}

impl Default for StreamTurnConfig {
    fn default() -> Self {
        Self {
            chunk_size: 5,
            chunk_delay: Duration::from_millis(50),
            max_content_chars: 10_000,
        }
    }
}

/// Handler for StreamTurn commands.
pub struct StreamTurnHandler {
    message_store: Arc<dyn MessageStore>,
    reply_generator: Arc<dyn ReplyGenerator>,
    config: StreamTurnConfig,
}

impl StreamTurnHandler {
    pub fn new(
        message_store: Arc<dyn MessageStore>,
        reply_generator: Arc<dyn ReplyGenerator>,
    ) -> Self {
        Self::with_config(message_store, reply_generator, StreamTurnConfig::default())
    }

    pub fn with_config(
        message_store: Arc<dyn MessageStore>,
        reply_generator: Arc<dyn ReplyGenerator>,
        config: StreamTurnConfig,
    ) -> Self {
        Self {
            message_store,
            reply_generator,
            config,
        }
    }

    pub fn config(&self) -> &StreamTurnConfig {
        &self.config
    }

    /// Checks the user's content against the configured length limit.
    pub fn validate_content(&self, content: &str) -> Result<(), ValidationError> {
        let actual = content.chars().count();
        if actual > self.config.max_content_chars {
            return Err(ValidationError::too_long(
                "content",
                self.config.max_content_chars,
                actual,
            ));
        }
        Ok(())
    }

    /// Handles a stream turn command, emitting events into `sink`.
    ///
    /// On success the sink has received `Start`, the deltas and `End`, in
    /// that order. On a recoverable error the sink has received at most a
    /// prefix of that sequence and no `End`.
    pub async fn handle<S>(
        &self,
        cmd: StreamTurnCommand,
        sink: &mut S,
    ) -> Result<StreamTurnResult, StreamTurnError>
    where
        S: StreamEventSink + ?Sized,
    {
        self.validate_content(&cmd.content)?;

        let conversation_id = cmd.session.conversation_id();

        // 1. Persist the user turn before anything is announced
        let user_turn = self
            .message_store
            .append(NewTurn::user(conversation_id, cmd.content))
            .await
            .map_err(StreamTurnError::UserTurnNotPersisted)?;

        // 2. Announce the reply
        let message_id = MessageId::new();
        sink.emit(StreamEvent::Start { message_id }).await?;

        tracing::debug!(
            connection_id = %cmd.session.connection_id(),
            conversation_id = %conversation_id,
            message_id = %message_id,
            "Streaming reply"
        );

        // 3. Produce the full reply
        let reply = self
            .reply_generator
            .generate_reply(conversation_id, &user_turn.content)
            .await
            .map_err(|source| StreamTurnError::ReplyFailed { message_id, source })?;

        // 4. Stream it in fixed-size chunks
        for (index, chunk) in chunk_reply(&reply, self.config.chunk_size)
            .into_iter()
            .enumerate()
        {
            if index > 0 && !self.config.chunk_delay.is_zero() {
                tokio::time::sleep(self.config.chunk_delay).await;
            }
            tracing::trace!(message_id = %message_id, index, "Sending chunk");
            sink.emit(StreamEvent::Delta {
                message_id,
                content: chunk.to_string(),
            })
            .await?;
        }

        // 5. Persist the assembled reply
        let assistant_turn = self
            .message_store
            .append(NewTurn::assistant(conversation_id, reply))
            .await
            .map_err(|source| StreamTurnError::AssistantTurnNotPersisted { message_id, source })?;

        // 6. Close the reply
        sink.emit(StreamEvent::End { message_id }).await?;

        Ok(StreamTurnResult {
            message_id,
            user_turn,
            assistant_turn,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::memory::InMemoryMessageStore;
    use crate::domain::conversation::{NewTurn, Role};
    use crate::domain::foundation::{ConnectionId, ConversationId, SubjectId};
    use crate::ports::{TurnPage, TurnQuery};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    // ════════════════════════════════════════════════════════════════════════
    // Test doubles
    // ════════════════════════════════════════════════════════════════════════

    struct FixedReply(&'static str);

    #[async_trait]
    impl ReplyGenerator for FixedReply {
        async fn generate_reply(
            &self,
            _conversation_id: ConversationId,
            _user_content: &str,
        ) -> Result<String, ReplyError> {
            Ok(self.0.to_string())
        }
    }

    struct BrokenReply;

    #[async_trait]
    impl ReplyGenerator for BrokenReply {
        async fn generate_reply(
            &self,
            _conversation_id: ConversationId,
            _user_content: &str,
        ) -> Result<String, ReplyError> {
            Err(ReplyError::Unavailable("backend down".into()))
        }
    }

    /// Fails every append after the first `ok_appends`.
    struct FlakyStore {
        inner: InMemoryMessageStore,
        ok_appends: usize,
        appends: AtomicUsize,
    }

    impl FlakyStore {
        fn failing_after(ok_appends: usize) -> Self {
            Self {
                inner: InMemoryMessageStore::new(),
                ok_appends,
                appends: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl MessageStore for FlakyStore {
        async fn append(&self, turn: NewTurn) -> Result<Turn, StoreError> {
            if self.appends.fetch_add(1, Ordering::SeqCst) >= self.ok_appends {
                return Err(StoreError::unavailable("disk full"));
            }
            self.inner.append(turn).await
        }

        async fn query(&self, query: TurnQuery) -> Result<TurnPage, StoreError> {
            self.inner.query(query).await
        }
    }

    /// Accepts `capacity` events, then reports the transport closed.
    struct ClosingSink {
        events: Vec<StreamEvent>,
        capacity: usize,
    }

    #[async_trait]
    impl StreamEventSink for ClosingSink {
        async fn emit(&mut self, event: StreamEvent) -> Result<(), SinkError> {
            if self.events.len() >= self.capacity {
                return Err(SinkError("connection reset".into()));
            }
            self.events.push(event);
            Ok(())
        }
    }

    fn session() -> Session {
        Session::new(
            ConnectionId::new(),
            ConversationId::new(42),
            SubjectId::new("17").unwrap(),
        )
    }

    fn fast_config() -> StreamTurnConfig {
        StreamTurnConfig {
            chunk_size: 5,
            chunk_delay: Duration::ZERO,
            max_content_chars: 20,
        }
    }

    fn handler(store: Arc<dyn MessageStore>, reply: Arc<dyn ReplyGenerator>) -> StreamTurnHandler {
        StreamTurnHandler::with_config(store, reply, fast_config())
    }

    // ════════════════════════════════════════════════════════════════════════
    // Happy path
    // ════════════════════════════════════════════════════════════════════════

    #[tokio::test]
    async fn emits_start_deltas_end_with_one_message_id() {
        let store = Arc::new(InMemoryMessageStore::new());
        let handler = handler(store.clone(), Arc::new(FixedReply("hello world")));
        let mut sink: Vec<StreamEvent> = Vec::new();

        let result = handler
            .handle(StreamTurnCommand::new(session(), "hi"), &mut sink)
            .await
            .unwrap();

        let id = result.message_id;
        assert_eq!(
            sink,
            vec![
                StreamEvent::Start { message_id: id },
                StreamEvent::Delta { message_id: id, content: "hello".into() },
                StreamEvent::Delta { message_id: id, content: " worl".into() },
                StreamEvent::Delta { message_id: id, content: "d".into() },
                StreamEvent::End { message_id: id },
            ]
        );
    }

    #[tokio::test]
    async fn persists_user_then_assistant() {
        let store = Arc::new(InMemoryMessageStore::new());
        let handler = handler(store.clone(), Arc::new(FixedReply("reply text")));
        let mut sink: Vec<StreamEvent> = Vec::new();

        let result = handler
            .handle(StreamTurnCommand::new(session(), "hi"), &mut sink)
            .await
            .unwrap();

        let turns = store.all().await;
        assert_eq!(turns.len(), 2);
        assert_eq!(turns[0].role, Role::User);
        assert_eq!(turns[0].content, "hi");
        assert_eq!(turns[1].role, Role::Assistant);
        assert_eq!(turns[1].content, "reply text");
        assert!(turns[0].id < turns[1].id);
        assert_eq!(result.assistant_turn.id, turns[1].id);
    }

    #[tokio::test]
    async fn deltas_reassemble_persisted_reply() {
        let store = Arc::new(InMemoryMessageStore::new());
        let handler = handler(store.clone(), Arc::new(FixedReply("您好！我是智能助手。")));
        let mut sink: Vec<StreamEvent> = Vec::new();

        let result = handler
            .handle(StreamTurnCommand::new(session(), "hi"), &mut sink)
            .await
            .unwrap();

        let assembled: String = sink
            .iter()
            .filter_map(|e| match e {
                StreamEvent::Delta { content, .. } => Some(content.as_str()),
                _ => None,
            })
            .collect();
        assert_eq!(assembled, result.assistant_turn.content);
    }

    #[tokio::test]
    async fn empty_reply_still_starts_and_ends() {
        let store = Arc::new(InMemoryMessageStore::new());
        let handler = handler(store.clone(), Arc::new(FixedReply("")));
        let mut sink: Vec<StreamEvent> = Vec::new();

        let result = handler
            .handle(StreamTurnCommand::new(session(), "hi"), &mut sink)
            .await
            .unwrap();

        assert_eq!(
            sink,
            vec![
                StreamEvent::Start { message_id: result.message_id },
                StreamEvent::End { message_id: result.message_id },
            ]
        );
    }

    #[tokio::test]
    async fn pacing_delay_does_not_change_output() {
        let store = Arc::new(InMemoryMessageStore::new());
        let config = StreamTurnConfig {
            chunk_delay: Duration::from_millis(1),
            ..fast_config()
        };
        let handler =
            StreamTurnHandler::with_config(store, Arc::new(FixedReply("abcdefghijk")), config);
        let mut sink: Vec<StreamEvent> = Vec::new();

        handler
            .handle(StreamTurnCommand::new(session(), "hi"), &mut sink)
            .await
            .unwrap();

        assert_eq!(sink.len(), 1 + 3 + 1);
    }

    // ════════════════════════════════════════════════════════════════════════
    // Failures
    // ════════════════════════════════════════════════════════════════════════

    #[tokio::test]
    async fn user_turn_failure_emits_nothing() {
        let store = Arc::new(FlakyStore::failing_after(0));
        let handler = handler(store.clone(), Arc::new(FixedReply("x")));
        let mut sink: Vec<StreamEvent> = Vec::new();

        let err = handler
            .handle(StreamTurnCommand::new(session(), "hi"), &mut sink)
            .await
            .unwrap_err();

        assert!(matches!(err, StreamTurnError::UserTurnNotPersisted(_)));
        assert!(err.message_id().is_none());
        assert!(!err.is_terminal());
        assert!(sink.is_empty());
    }

    #[tokio::test]
    async fn assistant_turn_failure_keeps_user_turn_and_skips_end() {
        let store = Arc::new(FlakyStore::failing_after(1));
        let handler = handler(store.clone(), Arc::new(FixedReply("hello")));
        let mut sink: Vec<StreamEvent> = Vec::new();

        let err = handler
            .handle(StreamTurnCommand::new(session(), "hi"), &mut sink)
            .await
            .unwrap_err();

        let started = match sink.first() {
            Some(StreamEvent::Start { message_id }) => *message_id,
            other => panic!("expected start, got {:?}", other),
        };
        assert_eq!(err.message_id(), Some(started));
        assert_eq!(err.code(), ErrorCode::PersistenceFailure);
        assert!(!sink.iter().any(|e| matches!(e, StreamEvent::End { .. })));
        assert_eq!(store.inner.count().await, 1);
    }

    #[tokio::test]
    async fn reply_failure_references_announced_id() {
        let store = Arc::new(InMemoryMessageStore::new());
        let handler = handler(store.clone(), Arc::new(BrokenReply));
        let mut sink: Vec<StreamEvent> = Vec::new();

        let err = handler
            .handle(StreamTurnCommand::new(session(), "hi"), &mut sink)
            .await
            .unwrap_err();

        assert_eq!(sink.len(), 1);
        assert!(err.message_id().is_some());
        assert_eq!(err.code(), ErrorCode::ReplyGenerationFailed);
        assert_eq!(store.count().await, 1);
    }

    #[tokio::test]
    async fn oversized_content_is_rejected_before_persisting() {
        let store = Arc::new(InMemoryMessageStore::new());
        let handler = handler(store.clone(), Arc::new(FixedReply("x")));
        let mut sink: Vec<StreamEvent> = Vec::new();

        let err = handler
            .handle(StreamTurnCommand::new(session(), "x".repeat(21)), &mut sink)
            .await
            .unwrap_err();

        assert!(matches!(err, StreamTurnError::InvalidContent(_)));
        assert_eq!(err.code(), ErrorCode::ContentTooLong);
        assert!(sink.is_empty());
        assert_eq!(store.count().await, 0);
    }

    #[tokio::test]
    async fn closed_transport_is_terminal() {
        let store = Arc::new(InMemoryMessageStore::new());
        let handler = handler(store.clone(), Arc::new(FixedReply("hello world")));
        let mut sink = ClosingSink {
            events: Vec::new(),
            capacity: 2,
        };

        let err = handler
            .handle(StreamTurnCommand::new(session(), "hi"), &mut sink)
            .await
            .unwrap_err();

        assert!(err.is_terminal());
        assert_eq!(sink.events.len(), 2);
        assert_eq!(store.count().await, 1);
    }
}
