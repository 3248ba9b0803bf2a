use actix_web::{web, HttpRequest, HttpResponse, Responder};
use actix_ws::{CloseCode, CloseReason, Message, MessageStream, Session};
use futures_util::StreamExt;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::mpsc;
use validator::Validate;

use crate::models::requests::MAX_MESSAGE_CHARS;
use crate::models::{HealthResponse, InboundFrame, OutboundFrame, StatsResponse};
use crate::services::{Agent, AgentServices, ConnectionHandle, ConnectionRegistry};

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    pub services: AgentServices,
    pub registry: Arc<ConnectionRegistry>,
}

/// Configure the JSON API routes
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg
        .route("/health", web::get().to(health_check))
        .route("/stats", web::get().to(stats));
}

/// Health check endpoint
async fn health_check() -> impl Responder {
    HttpResponse::Ok().json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        timestamp: chrono::Utc::now(),
    })
}

/// Cache and connection statistics
///
/// GET /api/v1/stats
async fn stats(state: web::Data<AppState>) -> impl Responder {
    HttpResponse::Ok().json(StatsResponse {
        cache: state.services.chain.cache().stats(),
        active_connections: state.registry.active(),
        max_connections: state.registry.max_connections(),
    })
}

/// Chat WebSocket endpoint
///
/// GET /ws
///
/// Client frames are `{"message": "..."}`; server frames carry a `type` of
/// `status_update`, `ai_response` or `error`.
pub async fn chat_socket(
    req: HttpRequest,
    body: web::Payload,
    state: web::Data<AppState>,
) -> Result<HttpResponse, actix_web::Error> {
    let (response, session, msg_stream) = actix_ws::handle(&req, body)?;

    match state.registry.register(Instant::now()) {
        Ok(handle) => {
            tracing::info!(
                "Chat connection {} opened ({} active)",
                handle.id,
                state.registry.active()
            );
            actix_web::rt::spawn(run_session(state.get_ref().clone(), handle, session, msg_stream));
        }
        Err(e) => {
            tracing::warn!("Rejecting chat connection: {}", e);
            actix_web::rt::spawn(reject(session, e.to_string()));
        }
    }

    Ok(response)
}

async fn reject(mut session: Session, reason: String) {
    if let Ok(text) = serde_json::to_string(&OutboundFrame::error(reason)) {
        let _ = session.text(text).await;
    }
    let _ = session.close(Some(CloseReason::from(CloseCode::Again))).await;
}

/// Turn one inbound text frame into the frame to send back
///
/// Returns `None` for blank messages, which are ignored.
pub async fn handle_inbound(agent: &mut Agent, text: &str) -> Option<OutboundFrame> {
    let frame: InboundFrame = match serde_json::from_str(text) {
        Ok(frame) => frame,
        Err(e) => {
            tracing::debug!("Malformed chat frame: {}", e);
            return Some(OutboundFrame::error(
                "Invalid message format: expected {\"message\": \"...\"}",
            ));
        }
    };

    if let Err(errors) = frame.validate() {
        tracing::debug!("Chat frame failed validation: {}", errors);
        return Some(OutboundFrame::error(format!(
            "Message too long (max {} characters)",
            MAX_MESSAGE_CHARS
        )));
    }

    let message = frame.text()?;
    Some(OutboundFrame::response(agent.process_message(message).await))
}

async fn run_session(state: AppState, handle: ConnectionHandle, mut session: Session, mut stream: MessageStream) {
    // All frames for this connection go through one channel to keep their order
    let (tx, mut rx) = mpsc::unbounded_channel::<OutboundFrame>();

    let mut writer_session = session.clone();
    let writer = actix_web::rt::spawn(async move {
        while let Some(frame) = rx.recv().await {
            let text = match serde_json::to_string(&frame) {
                Ok(text) => text,
                Err(e) => {
                    tracing::error!("Failed to serialize frame: {}", e);
                    continue;
                }
            };
            if writer_session.text(text).await.is_err() {
                break;
            }
        }
    });

    let mut agent = Agent::new(state.services.clone()).with_status_channel(tx.clone());

    let close_reason = loop {
        tokio::select! {
            _ = handle.closed() => {
                tracing::info!("Closing idle chat connection {}", handle.id);
                break Some(CloseReason::from(CloseCode::Normal));
            }
            msg = stream.next() => match msg {
                Some(Ok(Message::Text(text))) => {
                    state.registry.touch(&handle.id, Instant::now());
                    if let Some(frame) = handle_inbound(&mut agent, &text).await {
                        let _ = tx.send(frame);
                    }
                    state.registry.touch(&handle.id, Instant::now());
                }
                Some(Ok(Message::Ping(bytes))) => {
                    if session.pong(&bytes).await.is_err() {
                        break None;
                    }
                }
                Some(Ok(Message::Close(reason))) => break reason,
                Some(Ok(_)) => {}
                Some(Err(e)) => {
                    tracing::warn!("Protocol error on chat connection {}: {}", handle.id, e);
                    break None;
                }
                None => break None,
            }
        }
    };

    state.registry.release(&handle.id);

    // The writer stops once every sender is gone and the queue is drained
    drop(agent);
    drop(tx);
    let _ = writer.await;

    let _ = session.close(close_reason).await;
    tracing::info!("Chat connection {} closed", handle.id);
}
