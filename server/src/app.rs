use std::sync::Arc;

use anyhow::Context;
use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    response::{Html, IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde_json::json;
use tower_http::{cors::CorsLayer, services::ServeFile, trace::TraceLayer};
use tracing::{error, info, warn};

use crate::{
    admin::{render_dashboard, RECENT_ROWS},
    chat::respond,
    completion::{CompletionGateway, OpenAiCompletions},
    config::AppConfig,
    conversation_log::ConversationLog,
    customers::{CustomerTable, LoadError},
    error::ChatError,
    intake::{IntakeForm, IntakeReceipt, IntakeRelay, SendGridMailer},
    types::{AppState, ChatReply, ChatRequest, CustomerConfigBody},
};

async fn chat(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<ChatRequest>, JsonRejection>,
) -> Response {
    let Json(request) = match payload {
        Ok(body) => body,
        Err(rejection) => {
            return ChatError::Validation(rejection.body_text()).into_response();
        }
    };

    match respond(&state, &request).await {
        Ok(message) => Json(ChatReply {
            message,
            success: true,
        })
        .into_response(),
        Err(err) => err.into_response(),
    }
}

async fn get_config(
    Path(customer_id): Path<String>,
    State(state): State<Arc<AppState>>,
) -> Json<CustomerConfigBody> {
    let customer = state.customers.lookup(&customer_id);
    Json(CustomerConfigBody {
        name: customer.display_name.clone(),
        color: customer.accent_color.clone(),
        bot_name: customer.bot_name.clone(),
        welcome_message: customer.welcome_message(),
    })
}

async fn admin_panel(State(state): State<Arc<AppState>>) -> Response {
    let total = state.conversation_log.len().await;
    let recent = state.conversation_log.recent(RECENT_ROWS).await;

    match render_dashboard(total, &recent) {
        Ok(html) => Html(html).into_response(),
        Err(err) => {
            error!(event_name = "admin.render.failed", error = %err, "admin dashboard render failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Html("<h1>Admin panel unavailable</h1>".to_string()),
            )
                .into_response()
        }
    }
}

async fn health() -> impl IntoResponse {
    Json(json!({ "status": "healthy", "mode": "demo" }))
}

async fn submit_intake(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<IntakeForm>, JsonRejection>,
) -> Response {
    let Json(form) = match payload {
        Ok(body) => body,
        Err(rejection) => {
            return (
                StatusCode::BAD_REQUEST,
                Json(json!({ "success": false, "error": rejection.body_text() })),
            )
                .into_response();
        }
    };

    match state.intake.submit(&form).await {
        Ok(receipt) => {
            if let IntakeReceipt::SavedToFile(path) = &receipt {
                info!(
                    event_name = "intake.submission.saved",
                    path = %path.display(),
                    "intake submission kept on disk"
                );
            }
            Json(json!({ "success": true, "message": "Form submitted successfully!" }))
                .into_response()
        }
        Err(err) => {
            error!(event_name = "intake.submission.failed", error = %err, "intake submission failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "success": false, "error": err.to_string() })),
            )
                .into_response()
        }
    }
}

pub fn router(state: Arc<AppState>) -> Router {
    let frontend = state.frontend_dir.clone();

    Router::new()
        .route("/chat", post(chat))
        .route("/config/{customer_id}", get(get_config))
        .route("/admin", get(admin_panel))
        .route("/health", get(health))
        .route("/submit-intake", post(submit_intake))
        .route_service("/", ServeFile::new(frontend.join("landing.html")))
        .route_service("/widget.html", ServeFile::new(frontend.join("widget.html")))
        .route_service("/intake", ServeFile::new(frontend.join("intake-form.html")))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

fn load_customers(config: &AppConfig) -> anyhow::Result<CustomerTable> {
    match CustomerTable::load(&config.customers_file) {
        Ok(table) => {
            info!(
                event_name = "system.customers.loaded",
                path = %config.customers_file.display(),
                customers = table.customer_count(),
                "customer table loaded"
            );
            Ok(table)
        }
        Err(LoadError::Missing(path)) => {
            warn!(
                event_name = "system.customers.default",
                path = %path.display(),
                "customer file not found, using built-in demo customer"
            );
            Ok(CustomerTable::default())
        }
        Err(err) => Err(err.into()),
    }
}

pub fn build_state(config: &AppConfig) -> anyhow::Result<AppState> {
    let completions = OpenAiCompletions::new(
        &config.completion.base_url,
        config.completion.api_key.clone(),
        &config.completion.model,
    );
    if config.completion.api_key.is_none() {
        warn!(
            event_name = "system.completion.unconfigured",
            "OPENAI_API_KEY is not set, chat replies will fail"
        );
    }
    let mailer = SendGridMailer::new(config.intake.sendgrid_api_key.clone());

    Ok(AppState {
        customers: load_customers(config)?,
        gateway: CompletionGateway::new(Arc::new(completions)),
        conversation_log: ConversationLog::with_capacity(config.conversation_log_capacity),
        intake: IntakeRelay::new(
            Arc::new(mailer),
            &config.intake.from_email,
            &config.intake.to_email,
            &config.intake.fallback_dir,
        ),
        frontend_dir: config.frontend_dir.clone(),
    })
}

pub async fn run(config: AppConfig) -> anyhow::Result<()> {
    let state = Arc::new(build_state(&config)?);
    let app = router(state);

    let addr = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind TCP listener on {addr}"))?;

    info!(
        event_name = "system.server.started",
        bind_address = %addr,
        "demo chatbot server running at http://localhost:{}",
        config.port
    );
    axum::serve(listener, app)
        .with_graceful_shutdown(wait_for_shutdown())
        .await
        .context("server runtime failure")?;
    info!(event_name = "system.server.stopped", "demo chatbot server stopped");

    Ok(())
}

async fn wait_for_shutdown() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        error!(event_name = "system.server.signal_failed", error = %err, "could not listen for ctrl-c");
    }
}
