use tracing::{error, info};
use uuid::Uuid;

use crate::{
    conversation_log::LogEntry,
    error::ChatError,
    intent::classify,
    prompting::{assemble_system_prompt, SystemPromptContext},
    types::{AppState, ChatRequest},
};

pub const ATTACHMENT_GLYPH: &str = "📎";

pub const FILE_UPLOAD_REPLY: &str = "Great! I can see you uploaded a file! 📎

In a DEMO, I'm showing file upload capability. In a real implementation:

• I would analyze images with AI vision
• Extract text from PDFs automatically
• Process documents and data files
• Store files securely in cloud storage

This feature is perfect for:
• Support tickets with screenshots
• Document verification
• Invoice processing
• Image-based product searches

What else would you like to test?";

pub fn is_file_upload(message: &str) -> bool {
    message.to_lowercase().contains("uploaded a file") || message.contains(ATTACHMENT_GLYPH)
}

/// Runs one exchange end to end. Only completed exchanges reach the log.
pub async fn respond(state: &AppState, request: &ChatRequest) -> Result<String, ChatError> {
    let message = request.message.as_str();
    if message.trim().is_empty() {
        return Err(ChatError::Validation("No message provided".into()));
    }

    let correlation_id = Uuid::new_v4();
    let customer_id = request.customer_id.as_str();
    let customer = state.customers.lookup(customer_id);

    if is_file_upload(message) {
        state
            .conversation_log
            .record(LogEntry::now(customer_id, message, FILE_UPLOAD_REPLY))
            .await;
        info!(
            event_name = "chat.exchange.file_upload",
            correlation_id = %correlation_id,
            customer_id = %customer_id,
            "answered file upload with canned reply"
        );
        return Ok(FILE_UPLOAD_REPLY.to_string());
    }

    let intent = classify(message);
    let system_prompt = assemble_system_prompt(&SystemPromptContext {
        bot_name: &customer.bot_name,
        intent: &intent,
    });

    let reply = state
        .gateway
        .complete(&system_prompt, &request.history, message)
        .await
        .map_err(|err| {
            error!(
                event_name = "chat.completion.failed",
                correlation_id = %correlation_id,
                customer_id = %customer_id,
                intent = intent.kind(),
                error = %err,
                "completion request failed"
            );
            ChatError::from(err)
        })?;

    state
        .conversation_log
        .record(LogEntry::now(customer_id, message, &reply))
        .await;
    info!(
        event_name = "chat.exchange.completed",
        correlation_id = %correlation_id,
        customer_id = %customer_id,
        intent = intent.kind(),
        history_turns = request.history.len(),
        "chat exchange completed"
    );

    Ok(reply)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::{
        completion::{testing::ScriptedCompletions, ConversationTurn, Role},
        prompting::INTENT_ANNOTATION,
        types::testing::test_state,
    };

    fn request(message: &str) -> ChatRequest {
        ChatRequest {
            customer_id: "demo".to_string(),
            message: message.to_string(),
            history: Vec::new(),
        }
    }

    #[test]
    fn detects_upload_markers() {
        assert!(is_file_upload("I uploaded a file"));
        assert!(is_file_upload("i UPLOADED A FILE just now"));
        assert!(is_file_upload("📎 invoice.pdf"));
        assert!(!is_file_upload("Can I upload files?"));
    }

    #[tokio::test]
    async fn upload_message_skips_the_completion_service() {
        let completions = Arc::new(ScriptedCompletions::replying("unused"));
        let state = test_state(completions.clone());

        let reply = respond(&state, &request("I uploaded a file"))
            .await
            .expect("canned reply");

        assert_eq!(reply, FILE_UPLOAD_REPLY);
        assert_eq!(completions.calls(), 0);
        let logged = state.conversation_log.recent(1).await;
        assert_eq!(logged[0].user_text, "I uploaded a file");
        assert_eq!(logged[0].bot_text, FILE_UPLOAD_REPLY);
    }

    #[tokio::test]
    async fn empty_message_is_rejected_without_logging() {
        let completions = Arc::new(ScriptedCompletions::replying("unused"));
        let state = test_state(completions.clone());

        let err = respond(&state, &request("   ")).await.expect_err("invalid");

        assert!(matches!(err, ChatError::Validation(_)));
        assert_eq!(completions.calls(), 0);
        assert_eq!(state.conversation_log.len().await, 0);
    }

    #[tokio::test]
    async fn reply_is_logged_and_prompt_carries_intent() {
        let completions = Arc::new(ScriptedCompletions::replying("Your order has shipped!"));
        let state = test_state(completions.clone());

        let reply = respond(&state, &request("What's my order status?"))
            .await
            .expect("reply");

        assert_eq!(reply, "Your order has shipped!");
        let sent = completions.last_request().expect("request sent");
        assert!(sent.messages[0].content.starts_with("You are Eric,"));
        assert!(sent.messages[0].content.contains(INTENT_ANNOTATION));
        assert!(sent.messages[0].content.contains("DEMO-2024-5678"));
        assert_eq!(state.conversation_log.len().await, 1);
    }

    #[tokio::test]
    async fn upstream_failure_logs_nothing() {
        let state = test_state(Arc::new(ScriptedCompletions::failing()));

        let err = respond(&state, &request("hello")).await.expect_err("upstream");

        assert!(matches!(err, ChatError::Upstream(_)));
        assert_eq!(state.conversation_log.len().await, 0);
    }

    #[tokio::test]
    async fn only_recent_history_is_forwarded() {
        let completions = Arc::new(ScriptedCompletions::replying("ok"));
        let state = test_state(completions.clone());
        let mut chat = request("and now?");
        chat.history = (0..10)
            .map(|n| ConversationTurn {
                role: if n % 2 == 0 { Role::User } else { Role::Assistant },
                content: format!("turn {n}"),
            })
            .collect();

        respond(&state, &chat).await.expect("reply");

        let sent = completions.last_request().expect("request sent");
        let contents = sent.messages[1..sent.messages.len() - 1]
            .iter()
            .map(|m| m.content.as_str())
            .collect::<Vec<_>>();
        assert_eq!(
            contents,
            vec!["turn 4", "turn 5", "turn 6", "turn 7", "turn 8", "turn 9"]
        );
    }
}
