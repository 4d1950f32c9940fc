//! Fixed system instruction and completion request assembly.

use codemate_types::chat::{MessageRole, TranscriptEntry};
use codemate_types::llm::{CompletionRequest, ContextMode, Message};

/// Instruction prepended to every question.
pub const SYSTEM_INSTRUCTION: &str = "You are an expert coding assistant. Follow these rules:
1. Respond ONLY with:
   - Complete code solutions in ```language``` blocks
   - Concise explanations (1-2 sentences)
   - Debugging fixes with before/after examples
2. Include all necessary imports and helper functions
3. For algorithms, include time/space complexity
4. Decline non-coding questions politely";

/// The user turn actually sent to the model.
pub fn build_prompt(question: &str) -> String {
    format!("{SYSTEM_INSTRUCTION}\n\nQuestion: {question}")
}

/// Build the completion request for `question`.
///
/// `history` is the transcript before the current question. It is replayed
/// only in [`ContextMode::Session`]; earlier user turns are sent as typed,
/// without the system instruction.
pub fn build_request(
    model: &str,
    mode: ContextMode,
    history: &[TranscriptEntry],
    question: &str,
) -> CompletionRequest {
    let mut messages: Vec<Message> = match mode {
        ContextMode::Fresh => Vec::new(),
        ContextMode::Session => history
            .iter()
            .map(|entry| Message {
                role: entry.role,
                content: entry.content.clone(),
            })
            .collect(),
    };

    messages.push(Message {
        role: MessageRole::User,
        content: build_prompt(question),
    });

    CompletionRequest {
        model: model.to_string(),
        messages,
    }
}
