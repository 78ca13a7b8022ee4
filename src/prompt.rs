//! Prompt templates for the legal tutoring assistant.
//!
//! The prompts keep the model grounded: answers must come from the retrieved
//! context only, with page-number citations where available.

use crate::chat::{ChatMessage, ChatRole};

/// How many trailing history messages a follow-up prompt restates.
///
/// Bounds prompt growth over a long session while keeping enough recent
/// conversation for pronoun and topic resolution.
pub const HISTORY_WINDOW: usize = 6;

/// System prompt establishing the tutor persona.
pub const SYSTEM_PROMPT: &str = "You are an intelligent, patient, and encouraging AI tutor specializing in Ghanaian law. Your role is to help law students learn and understand legal concepts, principles, and their practical applications.

Core Principles:
1. **Clarity First**: Start with simple, clear explanations before introducing legal terminology
2. **Educational Approach**: Act as a tutor who helps students learn, not just an answer-providing service
3. **Context-Based**: Base your answers ONLY on the provided context from the knowledge base
4. **Ghanaian Context**: Always frame examples and explanations in the context of Ghana's legal system
5. **Encouraging**: Be supportive and positive, especially when students are learning complex concepts
6. **Precise Citations**: Always cite sources with page numbers when referencing specific information

Response Guidelines:
- Break down complex legal concepts into digestible parts
- Use examples relevant to Ghanaian legal context
- Explain \"why\" and \"how,\" not just \"what\"
- Ask clarifying questions when the query is unclear
- If information isn't in the provided context, clearly state that and suggest related topics that might be in the knowledge base
- Use simple language first, then introduce technical legal terms with explanations

Remember: You are teaching, not just informing. Help students build understanding.";

/// Build the user prompt for the first query of a session.
pub fn user_prompt(query: &str, context: &str) -> String {
    format!(
        "Please answer the following question about Ghanaian law based ONLY on the provided \
         context. If the context doesn't contain sufficient information, say so clearly and \
         suggest what related information might help.\n\n\
         Context from Knowledge Base:\n{context}\n\n\
         Question: {query}\n\n\
         Please provide a clear, educational answer with citations (page numbers) where applicable."
    )
}

/// Build the user prompt for a follow-up query.
///
/// Restates the most recent [`HISTORY_WINDOW`] turns with Student/Tutor
/// labels, then the fresh context and question.
pub fn follow_up_prompt(query: &str, context: &str, history: &[ChatMessage]) -> String {
    let start = history.len().saturating_sub(HISTORY_WINDOW);
    let history_context = history[start..]
        .iter()
        .map(|msg| {
            let speaker = if msg.role == ChatRole::User { "Student" } else { "Tutor" };
            format!("{speaker}: {}", msg.content)
        })
        .collect::<Vec<_>>()
        .join("\n\n");

    format!(
        "This is a follow-up question in an ongoing conversation. Please answer based on the \
         provided context and consider the conversation history.\n\n\
         Previous Conversation:\n{history_context}\n\n\
         New Context from Knowledge Base:\n{context}\n\n\
         New Question: {query}\n\n\
         Please provide a clear, educational answer that builds on our previous conversation. \
         Include citations (page numbers) where applicable."
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn follow_up_windows_to_last_six_messages() {
        let history: Vec<ChatMessage> = (0..8)
            .map(|i| {
                if i % 2 == 0 {
                    ChatMessage::user(format!("question {i}"))
                } else {
                    ChatMessage::assistant(format!("answer {i}"))
                }
            })
            .collect();

        let prompt = follow_up_prompt("next?", "some context", &history);
        assert!(!prompt.contains("question 0"));
        assert!(!prompt.contains("answer 1"));
        for i in 2..8 {
            let label = if i % 2 == 0 { format!("question {i}") } else { format!("answer {i}") };
            assert!(prompt.contains(&label), "missing turn: {label}");
        }
    }

    #[test]
    fn follow_up_labels_speakers() {
        let history = vec![ChatMessage::user("what is tort?"), ChatMessage::assistant("a wrong.")];
        let prompt = follow_up_prompt("more", "ctx", &history);
        assert!(prompt.contains("Student: what is tort?"));
        assert!(prompt.contains("Tutor: a wrong."));
    }

    #[test]
    fn user_prompt_embeds_query_and_context() {
        let prompt = user_prompt("what is consideration?", "[Page 3]\nConsideration is...");
        assert!(prompt.contains("Question: what is consideration?"));
        assert!(prompt.contains("[Page 3]\nConsideration is..."));
    }
}
