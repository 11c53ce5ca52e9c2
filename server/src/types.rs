use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::{
    completion::{CompletionGateway, ConversationTurn},
    conversation_log::ConversationLog,
    customers::{CustomerTable, DEFAULT_CUSTOMER_ID},
    intake::IntakeRelay,
};

pub struct AppState {
    pub customers: CustomerTable,
    pub gateway: CompletionGateway,
    pub conversation_log: ConversationLog,
    pub intake: IntakeRelay,
    pub frontend_dir: PathBuf,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChatRequest {
    #[serde(default = "default_customer_id")]
    pub customer_id: String,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub history: Vec<ConversationTurn>,
}

fn default_customer_id() -> String {
    DEFAULT_CUSTOMER_ID.to_string()
}

#[derive(Debug, Clone, Serialize)]
pub struct ChatReply {
    pub message: String,
    pub success: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct CustomerConfigBody {
    pub name: String,
    pub color: String,
    pub bot_name: String,
    pub welcome_message: String,
}

#[cfg(test)]
pub(crate) mod testing {
    use std::sync::Arc;

    use super::*;
    use crate::{completion::CompletionService, intake::testing::RecordingMailer};

    /// Serves `router` on an ephemeral local port and returns its base URL.
    pub async fn serve_stub(router: axum::Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind stub listener");
        let addr = listener.local_addr().expect("stub address");
        tokio::spawn(async move {
            axum::serve(listener, router).await.expect("stub server");
        });
        format!("http://{addr}")
    }

    pub fn test_state(completions: Arc<dyn CompletionService>) -> AppState {
        test_state_with(completions, Arc::new(RecordingMailer::accepting()), PathBuf::from("."))
    }

    pub fn test_state_with(
        completions: Arc<dyn CompletionService>,
        mailer: Arc<RecordingMailer>,
        fallback_dir: PathBuf,
    ) -> AppState {
        AppState {
            customers: CustomerTable::default(),
            gateway: CompletionGateway::new(completions),
            conversation_log: ConversationLog::default(),
            intake: IntakeRelay::new(mailer, "from@example.com", "to@example.com", &fallback_dir),
            frontend_dir: PathBuf::from("frontend"),
        }
    }
}
