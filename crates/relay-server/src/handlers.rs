//! Connection handlers for the relay server.
//!
//! This module handles the connection lifecycle: origin checks, the
//! per-connection event loop, heartbeats and disconnect cleanup.

use crate::config::{Config, CorsConfig};
use crate::metrics::{self, ConnectionMetricsGuard};
use anyhow::{Context, Result};
use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    http::{header, HeaderMap, HeaderValue, Method, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use futures_util::stream::SplitSink;
use futures_util::{SinkExt, StreamExt};
use relay_protocol::{
    EncodedFrame, FrameCodec, InboundEvent, OutboundEvent, ProtocolError, WireFormat,
    PROTOCOL_VERSION,
};
use std::sync::Arc;
use std::time::Instant;
use tenvis_relay_core::{ConnectionHub, Router as EventRouter};
use tokio::net::TcpListener;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tracing::{debug, error, info, warn};

/// Shared server state.
pub struct AppState {
    /// Live connections.
    pub hub: Arc<ConnectionHub>,
    /// Presence registry and fanout rules.
    pub router: EventRouter<Arc<ConnectionHub>>,
    /// Frame codec with the configured size limit.
    pub codec: FrameCodec,
    /// One permit per allowed live connection.
    connection_slots: Arc<Semaphore>,
    /// Server configuration.
    pub config: Config,
}

impl AppState {
    /// Create new app state.
    #[must_use]
    pub fn new(config: Config) -> Self {
        let hub = Arc::new(ConnectionHub::new());
        Self {
            router: EventRouter::new(Arc::clone(&hub)),
            hub,
            codec: FrameCodec::new(config.limits.max_message_size),
            connection_slots: Arc::new(Semaphore::new(config.limits.max_connections)),
            config,
        }
    }

    /// Reserve a connection slot, or `None` at the connection limit.
    ///
    /// The slot is released when the permit is dropped.
    #[must_use]
    pub fn try_reserve_connection(&self) -> Option<OwnedSemaphorePermit> {
        Arc::clone(&self.connection_slots).try_acquire_owned().ok()
    }
}

/// Run the HTTP/WebSocket server.
///
/// # Errors
///
/// Returns an error if the server fails to start.
pub async fn run_server(config: Config) -> Result<()> {
    if config.metrics.enabled {
        if let Err(e) = metrics::start_metrics_server(config.metrics.port) {
            error!("Failed to start metrics server: {:#}", e);
        }
    }

    let addr = config.bind_addr()?;
    let path = config.transport.websocket_path.clone();
    let state = Arc::new(AppState::new(config));
    let app = build_app(state)?;

    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;

    info!("Relay server listening on {}", addr);
    info!("WebSocket endpoint: ws://{}{}", addr, path);

    axum::serve(listener, app).await?;

    Ok(())
}

/// Build the HTTP router.
///
/// # Errors
///
/// Returns an error if an allowed origin is not a valid header value.
pub fn build_app(state: Arc<AppState>) -> Result<Router> {
    let cors = cors_layer(&state.config.cors)?;

    Ok(Router::new()
        .route(&state.config.transport.websocket_path, get(ws_handler))
        .route("/health", get(health_handler))
        .with_state(state)
        .layer(cors))
}

fn cors_layer(config: &CorsConfig) -> Result<CorsLayer> {
    let layer = CorsLayer::new().allow_methods([Method::GET]);
    if config.allows_any() {
        return Ok(layer.allow_origin(Any));
    }

    let origins = config
        .allowed_origins
        .iter()
        .map(|o| {
            o.parse::<HeaderValue>()
                .with_context(|| format!("Invalid allowed origin: {}", o))
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(layer.allow_origin(AllowOrigin::list(origins)))
}

/// Health check handler.
async fn health_handler(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let stats = state.router.stats();
    axum::Json(serde_json::json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
        "protocol": PROTOCOL_VERSION,
        "users": stats.user_count,
        "connections": state.hub.len(),
    }))
}

/// WebSocket upgrade handler.
///
/// Browsers always send `Origin`; requests without one come from
/// non-browser clients and are not subject to the allow-list.
async fn ws_handler(
    ws: WebSocketUpgrade,
    headers: HeaderMap,
    State(state): State<Arc<AppState>>,
) -> Response {
    if let Some(origin) = headers.get(header::ORIGIN) {
        let allowed = origin
            .to_str()
            .map(|o| state.config.cors.allows_origin(o))
            .unwrap_or(false);
        if !allowed {
            warn!(origin = ?origin, "Rejected connection from disallowed origin");
            metrics::record_error("origin");
            return (StatusCode::FORBIDDEN, "Origin not allowed").into_response();
        }
    }

    // Held until the socket task ends.
    let Some(slot) = state.try_reserve_connection() else {
        warn!(
            limit = state.config.limits.max_connections,
            "Connection limit reached"
        );
        metrics::record_error("connection_limit");
        return (StatusCode::SERVICE_UNAVAILABLE, "Too many connections").into_response();
    };

    ws.max_message_size(state.config.limits.max_message_size)
        .on_upgrade(move |socket| async move {
            handle_websocket(socket, state).await;
            drop(slot);
        })
}

/// Handle a WebSocket connection.
async fn handle_websocket(socket: WebSocket, state: Arc<AppState>) {
    let _metrics_guard = ConnectionMetricsGuard::new();

    let (connection_id, mut outbox) = state.hub.register();
    debug!(connection = %connection_id, "WebSocket connected");

    let (mut sender, mut receiver) = socket.split();

    // Replies use whichever encoding the client last sent.
    let mut format = WireFormat::Json;

    let connected = OutboundEvent::connected(connection_id.clone());
    if send_event(&mut sender, &state.codec, &connected, format)
        .await
        .is_err()
    {
        error!(connection = %connection_id, "Failed to send connected event");
        disconnect(&state, &connection_id);
        return;
    }

    let heartbeat = state.config.heartbeat.clone();
    let mut ticker = tokio::time::interval_at(
        tokio::time::Instant::now() + heartbeat.interval(),
        heartbeat.interval(),
    );
    let mut last_seen = Instant::now();

    loop {
        tokio::select! {
            biased;

            // Events routed to this connection
            Some(event) = outbox.recv() => {
                if send_event(&mut sender, &state.codec, &event, format).await.is_err() {
                    break;
                }
            }

            // Receive from WebSocket
            msg = receiver.next() => {
                last_seen = Instant::now();

                let (decoded, size) = match msg {
                    Some(Ok(Message::Text(text))) => {
                        format = WireFormat::Json;
                        (state.codec.decode_text(&text), text.len())
                    }
                    Some(Ok(Message::Binary(data))) => {
                        format = WireFormat::MessagePack;
                        (state.codec.decode_binary(&data), data.len())
                    }
                    Some(Ok(Message::Ping(_))) | Some(Ok(Message::Pong(_))) => {
                        // Pings are answered by the WebSocket layer
                        continue;
                    }
                    Some(Ok(Message::Close(_))) => {
                        debug!(connection = %connection_id, "Received close frame");
                        break;
                    }
                    Some(Err(e)) => {
                        warn!(connection = %connection_id, error = %e, "WebSocket error");
                        metrics::record_error("websocket");
                        break;
                    }
                    None => {
                        debug!(connection = %connection_id, "WebSocket stream ended");
                        break;
                    }
                };

                if let Some(reply) = handle_inbound(&state, &connection_id, decoded, size) {
                    if send_event(&mut sender, &state.codec, &reply, format).await.is_err() {
                        break;
                    }
                }
            }

            _ = ticker.tick() => {
                if last_seen.elapsed() > heartbeat.deadline() {
                    debug!(connection = %connection_id, "Heartbeat timed out");
                    break;
                }
                if sender.send(Message::Ping(Vec::new())).await.is_err() {
                    break;
                }
            }
        }
    }

    disconnect(&state, &connection_id);
    debug!(connection = %connection_id, "WebSocket disconnected");
}

/// Route one decoded inbound frame.
///
/// Returns an event to send back to the originating connection, if any.
fn handle_inbound(
    state: &AppState,
    connection_id: &str,
    decoded: Result<InboundEvent, ProtocolError>,
    size: usize,
) -> Option<OutboundEvent> {
    let event = match decoded {
        Ok(event) => event,
        Err(e) => {
            warn!(connection = %connection_id, error = %e, "Rejected inbound frame");
            metrics::record_error("decode");
            return Some(OutboundEvent::error(e.to_string()));
        }
    };

    let name = event.name();
    let registers = matches!(event, InboundEvent::AddUser(_));
    metrics::record_event(name, size);

    let start = Instant::now();
    let fanout = state.router.handle(connection_id, event);
    metrics::record_latency(start.elapsed().as_secs_f64());
    metrics::record_fanout(name, &fanout);

    if registers {
        metrics::set_users_online(state.router.stats().user_count);
    }

    debug!(
        connection = %connection_id,
        event = name,
        recipients = fanout.delivered,
        "Routed"
    );
    None
}

/// Detach a connection from the hub first, so the presence broadcast that
/// follows does not target it.
fn disconnect(state: &AppState, connection_id: &str) {
    state.hub.unregister(connection_id);
    let fanout = state.router.disconnect(connection_id);
    metrics::record_fanout("disconnect", &fanout);
    metrics::set_users_online(state.router.stats().user_count);
}

/// Encode and send one event.
///
/// An event that cannot be encoded is logged and skipped; only socket
/// failures are returned.
async fn send_event(
    sender: &mut SplitSink<WebSocket, Message>,
    codec: &FrameCodec,
    event: &OutboundEvent,
    format: WireFormat,
) -> Result<()> {
    let frame = match codec.encode(event, format) {
        Ok(frame) => frame,
        Err(e) => {
            warn!(event = event.name(), error = %e, "Failed to encode event");
            metrics::record_error("encode");
            return Ok(());
        }
    };

    metrics::record_outbound(frame.len());
    let message = match frame {
        EncodedFrame::Text(text) => Message::Text(text),
        EncodedFrame::Binary(data) => Message::Binary(data.to_vec()),
    };
    sender.send(message).await?;
    Ok(())
}
