//! Positional pairing of stored turns into exchanges.

use super::Turn;

/// One user turn and the reply stored right after it, if any.
#[derive(Debug, Clone, PartialEq)]
pub struct TurnPair {
    pub user: Turn,
    pub assistant: Option<Turn>,
}

/// Pairs turns by position: index `2k` is the user side, `2k + 1` the reply.
///
/// Pairing does not inspect roles. A page that starts on an assistant turn, or
/// a store that reordered writes, produces mismatched pairs; those are logged
/// and returned as-is so callers see what the store holds.
pub fn pair_turns(turns: Vec<Turn>) -> Vec<TurnPair> {
    let mut pairs = Vec::with_capacity(turns.len().div_ceil(2));
    let mut iter = turns.into_iter();

    while let Some(user) = iter.next() {
        let assistant = iter.next();

        if !user.is_user() || assistant.as_ref().is_some_and(|a| !a.is_assistant()) {
            tracing::warn!(
                conversation_id = %user.conversation_id,
                turn_id = %user.id,
                "History pair does not follow user/assistant order"
            );
        }

        pairs.push(TurnPair { user, assistant });
    }

    pairs
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::conversation::NewTurn;
    use crate::domain::foundation::{ConversationId, Timestamp, TurnId};
    use proptest::prelude::*;

    fn stored(id: i64, turn: NewTurn) -> Turn {
        turn.into_turn(TurnId::new(id), Timestamp::now())
    }

    fn user(id: i64, content: &str) -> Turn {
        stored(id, NewTurn::user(ConversationId::new(1), content))
    }

    fn assistant(id: i64, content: &str) -> Turn {
        stored(id, NewTurn::assistant(ConversationId::new(1), content))
    }

    #[test]
    fn empty_input_yields_no_pairs() {
        assert!(pair_turns(vec![]).is_empty());
    }

    #[test]
    fn trailing_user_turn_has_no_reply() {
        let turns = vec![
            user(1, "u1"),
            assistant(2, "a1"),
            user(3, "u2"),
            assistant(4, "a2"),
            user(5, "u3"),
        ];

        let pairs = pair_turns(turns);

        assert_eq!(pairs.len(), 3);
        assert_eq!(pairs[0].user.content, "u1");
        assert_eq!(pairs[0].assistant.as_ref().map(|t| t.content.as_str()), Some("a1"));
        assert_eq!(pairs[1].user.content, "u2");
        assert_eq!(pairs[1].assistant.as_ref().map(|t| t.content.as_str()), Some("a2"));
        assert_eq!(pairs[2].user.content, "u3");
        assert!(pairs[2].assistant.is_none());
    }

    #[test]
    fn pairing_is_positional_not_role_based() {
        let pairs = pair_turns(vec![assistant(1, "a0"), user(2, "u1")]);

        assert_eq!(pairs.len(), 1);
        assert_eq!(pairs[0].user.content, "a0");
        assert_eq!(pairs[0].assistant.as_ref().map(|t| t.content.as_str()), Some("u1"));
    }

    proptest! {
        #[test]
        fn pair_count_is_half_rounded_up(n in 0usize..64) {
            let turns: Vec<Turn> = (0..n)
                .map(|i| if i % 2 == 0 { user(i as i64, "u") } else { assistant(i as i64, "a") })
                .collect();

            let pairs = pair_turns(turns);

            prop_assert_eq!(pairs.len(), n.div_ceil(2));
            prop_assert_eq!(pairs.last().map(|p| p.assistant.is_none()).unwrap_or(false), n % 2 == 1);
        }

        #[test]
        fn pairing_preserves_order(n in 1usize..40) {
            let turns: Vec<Turn> = (0..n).map(|i| user(i as i64, "x")).collect();

            let flattened: Vec<i64> = pair_turns(turns)
                .into_iter()
                .flat_map(|p| std::iter::once(p.user).chain(p.assistant))
                .map(|t| t.id.as_i64())
                .collect();

            prop_assert_eq!(flattened, (0..n as i64).collect::<Vec<_>>());
        }
    }
}
