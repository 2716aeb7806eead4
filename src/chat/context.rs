//! Conversation context assembly
//!
//! Pure state transitions over an ordered message sequence. Every function
//! returns a new sequence and never mutates its input, so the same base
//! context can be reused by concurrent exchanges.

use super::models::{Message, Role};

/// Set or merge the leading system directive.
///
/// The transcript carries at most one system message, always at index 0.
/// With `append` set, new text is appended to an existing directive with a
/// single space between. Without it, an existing directive wins and the new
/// text is discarded.
pub fn with_system_directive(context: &[Message], directive: &str, append: bool) -> Vec<Message> {
    if context.is_empty() {
        return vec![Message::system(directive)];
    }

    if context[0].role == Role::System {
        if append {
            let mut updated = context.to_vec();
            updated[0].content = format!("{} {}", updated[0].content, directive);
            return updated;
        }
        // Existing directive is kept as-is; the new text is dropped.
        return context.to_vec();
    }

    let mut updated = Vec::with_capacity(context.len() + 1);
    updated.push(Message::system(directive));
    updated.extend_from_slice(context);
    updated
}

/// Append one message at the tail. No role-alternation check.
pub fn append_message(context: &[Message], message: Message) -> Vec<Message> {
    let mut updated = context.to_vec();
    updated.push(message);
    updated
}

/// Apply the directive step when given, then the append step when given.
pub fn compose(
    context: &[Message],
    system_directive: Option<&str>,
    append_to_directive: bool,
    latest: Option<Message>,
) -> Vec<Message> {
    let mut updated = match system_directive {
        Some(directive) => with_system_directive(context, directive, append_to_directive),
        None => context.to_vec(),
    };

    if let Some(message) = latest {
        updated.push(message);
    }

    updated
}
