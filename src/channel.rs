// src/channel.rs
//
// Real-Time Channel: delivers violation reports from exactly one student
// to all connected admin consoles, and resolution decisions from an admin
// back to exactly the originating student. Group membership keyed by the
// external student identifier is the only addressing mechanism; there is
// no point-to-point client addressing.

use std::{
    collections::HashMap,
    sync::{Arc, Mutex},
};

use axum::{
    extract::{
        State, WebSocketUpgrade,
        ws::{Message, WebSocket},
    },
    response::IntoResponse,
};
use chrono::Utc;
use futures_util::{SinkExt, StreamExt};
use serde::{Deserialize, Serialize};
use tokio::sync::{broadcast, mpsc};

use crate::{
    error::AppError,
    models::violation::{ResolveAction, ViolationRecord},
    state::AppState,
    store,
};

const GROUP_CAPACITY: usize = 16;
const ADMIN_CAPACITY: usize = 256;

/// Events fanned out to every connected admin observer.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "event", rename_all = "kebab-case")]
pub enum AdminEvent {
    NewViolation { record: ViolationRecord },
}

/// Events delivered only to one student's channel group.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "event", rename_all = "kebab-case")]
pub enum ResolutionEvent {
    ViolationResolved { action: ResolveAction },
}

/// Frames a student-side guard sends over its socket.
#[derive(Debug, Deserialize)]
#[serde(tag = "event", rename_all = "kebab-case")]
pub enum StudentFrame {
    /// Registers channel membership. Must be re-sent after a reconnect;
    /// there is no automatic session resumption.
    Join { student_id: String },

    /// A suspicious signal observed by the client guard. The
    /// client-supplied `count` is advisory only; the authoritative tally
    /// comes out of the Session Store's atomic increment.
    ReportViolation {
        student_id: String,
        name: String,
        kind: String,
        #[serde(default)]
        count: i64,
    },
}

/// Shared membership map plus the admin fan-out sender.
///
/// Membership mutation and event dispatch both take the map lock only for
/// map access; sends happen on cloned senders outside the lock.
#[derive(Clone)]
pub struct ChannelRegistry {
    admins: broadcast::Sender<AdminEvent>,
    groups: Arc<Mutex<HashMap<String, broadcast::Sender<ResolutionEvent>>>>,
}

impl Default for ChannelRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl ChannelRegistry {
    pub fn new() -> Self {
        let (admins, _) = broadcast::channel(ADMIN_CAPACITY);
        Self {
            admins,
            groups: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Joins (or creates) the group for a student identifier and returns
    /// a receiver for targeted resolution events.
    pub fn join(&self, student_id: &str) -> broadcast::Receiver<ResolutionEvent> {
        let mut groups = self.groups.lock().expect("channel registry poisoned");
        let sender = groups
            .entry(student_id.to_string())
            .or_insert_with(|| broadcast::channel(GROUP_CAPACITY).0);
        sender.subscribe()
    }

    pub fn subscribe_admins(&self) -> broadcast::Receiver<AdminEvent> {
        self.admins.subscribe()
    }

    /// Unscoped broadcast to every connected admin observer. A send error
    /// just means no console is connected right now.
    pub fn broadcast_violation(&self, record: ViolationRecord) {
        let _ = self.admins.send(AdminEvent::NewViolation { record });
    }

    /// Targeted emit to one student's group. Returns the number of
    /// connected group members reached.
    pub fn resolve_to(&self, student_id: &str, action: ResolveAction) -> usize {
        let sender = {
            let groups = self.groups.lock().expect("channel registry poisoned");
            groups.get(student_id).cloned()
        };
        match sender {
            Some(tx) => tx
                .send(ResolutionEvent::ViolationResolved { action })
                .unwrap_or(0),
            None => {
                tracing::warn!(student_id, "resolution emitted for unknown channel group");
                0
            }
        }
    }
}

/// Server-side violation-report handler.
///
/// The record's `count` snapshots the Session Store tally coming out of
/// the atomic increment, so it stays consistent with approval resets and
/// cannot be duplicated by interleaved reports. Ordering matters: the
/// session increment and the ledger insert both commit before the admin
/// broadcast, so any concurrent status read sees consistent state.
pub async fn report_violation(
    state: &AppState,
    student_id: &str,
    student_name: &str,
    kind: &str,
    client_count: i64,
) -> Result<ViolationRecord, AppError> {
    let tally = store::sessions::record_violation(&state.pool, student_id, Utc::now()).await?;

    if client_count != 0 && client_count != tally {
        tracing::debug!(
            student_id,
            client_count,
            server_count = tally,
            "client-reported violation count ignored"
        );
    }

    let record =
        store::violations::insert(&state.pool, student_id, student_name, kind, tally).await?;

    tracing::info!(student_id, kind, count = tally, "violation recorded");
    state.channel.broadcast_violation(record.clone());

    Ok(record)
}

/// Upgrade handler for the student-side socket.
pub async fn student_socket(
    ws: WebSocketUpgrade,
    State(state): State<AppState>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_student(socket, state))
}

async fn handle_student(socket: WebSocket, state: AppState) {
    let (mut sink, mut stream) = socket.split();

    // All outbound frames funnel through one writer task.
    let (out_tx, mut out_rx) = mpsc::channel::<Message>(GROUP_CAPACITY);
    let writer = tokio::spawn(async move {
        while let Some(msg) = out_rx.recv().await {
            if sink.send(msg).await.is_err() {
                break;
            }
        }
    });

    let mut forward: Option<tokio::task::JoinHandle<()>> = None;

    while let Some(Ok(msg)) = stream.next().await {
        let text = match msg {
            Message::Text(text) => text,
            Message::Close(_) => break,
            _ => continue,
        };

        let frame = match serde_json::from_str::<StudentFrame>(&text) {
            Ok(frame) => frame,
            Err(e) => {
                tracing::debug!(error = %e, "discarding malformed student frame");
                continue;
            }
        };

        match frame {
            StudentFrame::Join { student_id } => {
                tracing::info!(%student_id, "student joined channel group");
                let mut rx = state.channel.join(&student_id);

                // A rejoin replaces the previous subscription.
                if let Some(task) = forward.take() {
                    task.abort();
                }

                let tx = out_tx.clone();
                forward = Some(tokio::spawn(async move {
                    loop {
                        match rx.recv().await {
                            Ok(event) => {
                                let Ok(payload) = serde_json::to_string(&event) else {
                                    continue;
                                };
                                if tx.send(Message::Text(payload.into())).await.is_err() {
                                    break;
                                }
                            }
                            Err(broadcast::error::RecvError::Lagged(missed)) => {
                                tracing::warn!(missed, "student receiver lagged");
                            }
                            Err(broadcast::error::RecvError::Closed) => break,
                        }
                    }
                }));
            }
            StudentFrame::ReportViolation {
                student_id,
                name,
                kind,
                count,
            } => {
                if let Err(e) =
                    report_violation(&state, &student_id, &name, &kind, count).await
                {
                    tracing::error!(%student_id, error = %e, "failed to record violation");
                }
            }
        }
    }

    if let Some(task) = forward {
        task.abort();
    }
    writer.abort();
}

/// Upgrade handler for the admin observer socket. Routed behind the admin
/// JWT middleware.
pub async fn admin_socket(
    ws: WebSocketUpgrade,
    State(state): State<AppState>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_admin(socket, state))
}

async fn handle_admin(socket: WebSocket, state: AppState) {
    let (mut sink, mut stream) = socket.split();
    let mut rx = state.channel.subscribe_admins();

    loop {
        tokio::select! {
            event = rx.recv() => match event {
                Ok(event) => {
                    let Ok(payload) = serde_json::to_string(&event) else { continue };
                    if sink.send(Message::Text(payload.into())).await.is_err() {
                        break;
                    }
                }
                Err(broadcast::error::RecvError::Lagged(missed)) => {
                    tracing::warn!(missed, "admin observer lagged, events dropped");
                }
                Err(broadcast::error::RecvError::Closed) => break,
            },
            msg = stream.next() => match msg {
                Some(Ok(Message::Close(_))) | Some(Err(_)) | None => break,
                Some(Ok(_)) => {}
            },
        }
    }
}
