//! Chat-to-prompt translation.

use std::fmt::Write;

use crate::domain::ChatMessage;

/// Trailing segment that primes the engine to produce the assistant turn.
pub const ASSISTANT_PRIMER: &str = "Assistant: ";

/// Render an ordered conversation into a single backend prompt.
///
/// Each message becomes one `"<Label>: <content>"` line in input order,
/// followed by an `"Assistant: "` primer with no trailing newline.
pub fn build_prompt(messages: &[ChatMessage]) -> String {
    let capacity = messages
        .iter()
        .map(|m| m.content.len() + m.role.as_str().len() + 3)
        .sum::<usize>()
        + ASSISTANT_PRIMER.len();
    let mut prompt = String::with_capacity(capacity);

    for message in messages {
        // Writing into a String cannot fail
        let _ = writeln!(prompt, "{}: {}", message.role.label(), message.content);
    }
    prompt.push_str(ASSISTANT_PRIMER);
    prompt
}
