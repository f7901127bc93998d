//! Splitting a reply into transport chunks.

/// Splits `text` into consecutive pieces of at most `size` characters.
///
/// Counts Unicode scalar values, so multi-byte characters are never split.
/// Concatenating the result reproduces `text`. A `size` of zero is treated
/// as one.
pub fn chunk_reply(text: &str, size: usize) -> Vec<&str> {
    let size = size.max(1);
    let mut chunks = Vec::with_capacity(text.len() / size + 1);
    let mut start = 0;
    let mut count = 0;

    for (idx, _) in text.char_indices() {
        if count == size {
            chunks.push(&text[start..idx]);
            start = idx;
            count = 0;
        }
        count += 1;
    }

    if start < text.len() {
        chunks.push(&text[start..]);
    }

    chunks
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn splits_into_fixed_width_pieces() {
        assert_eq!(chunk_reply("hello world", 5), vec!["hello", " worl", "d"]);
    }

    #[test]
    fn empty_reply_has_no_chunks() {
        assert!(chunk_reply("", 5).is_empty());
    }

    #[test]
    fn counts_characters_not_bytes() {
        let chunks = chunk_reply("您好！我是智能助手", 5);
        assert_eq!(chunks, vec!["您好！我是", "智能助手"]);
    }

    #[test]
    fn zero_size_behaves_as_one() {
        assert_eq!(chunk_reply("abc", 0), vec!["a", "b", "c"]);
    }

    proptest! {
        #[test]
        fn concatenation_reproduces_input(text in "\\PC{0,200}", size in 1usize..16) {
            let chunks = chunk_reply(&text, size);
            prop_assert_eq!(chunks.concat(), text);
        }

        #[test]
        fn every_chunk_but_last_is_full(text in "\\PC{1,200}", size in 1usize..16) {
            let chunks = chunk_reply(&text, size);
            let (last, rest) = chunks.split_last().unwrap();
            for chunk in rest {
                prop_assert_eq!(chunk.chars().count(), size);
            }
            prop_assert!(last.chars().count() >= 1 && last.chars().count() <= size);
        }
    }
}
