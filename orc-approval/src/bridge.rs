//! [`ApprovalBridge`] — the seam gating write-actions (tool calls that
//! mutate state outside the workspace sandbox) behind a human decision.

use crate::error::ApprovalError;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, oneshot, Mutex};

/// Internal wait timeout for an approval decision.
const APPROVAL_TIMEOUT: Duration = Duration::from_secs(30);

/// Margin added on top of [`APPROVAL_TIMEOUT`] for the synchronous,
/// worker-thread-facing `request_approval` path, so the inner async
/// timeout always fires first under normal conditions.
const SYNC_TIMEOUT_MARGIN: Duration = Duration::from_secs(5);

/// A write-action approval request, as sent on the UI channel.
#[derive(Debug, Clone, serde::Serialize)]
pub struct WriteActionRequest {
    /// Correlates this request with its eventual [`ApprovalBridge::submit_response`] call.
    pub request_id: String,
    /// The agent requesting the action, if known.
    pub agent_id: Option<String>,
    /// The operation name (e.g. `write_file`).
    pub op: String,
    /// Operation-specific details (e.g. path and content preview).
    pub details: Value,
}

/// Gates write-actions behind an approval decision.
///
/// **Disconnected** (no UI channel installed): every request is denied
/// immediately, and the denial is logged.
/// **Connected**: requests are published on a channel for a UI to
/// consume, and resolved asynchronously via [`Self::submit_response`].
pub struct ApprovalBridge {
    connected: AtomicBool,
    sender: Mutex<Option<mpsc::UnboundedSender<WriteActionRequest>>>,
    pending: Mutex<HashMap<String, oneshot::Sender<bool>>>,
}

impl ApprovalBridge {
    /// Build a bridge in the disconnected state.
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            connected: AtomicBool::new(false),
            sender: Mutex::new(None),
            pending: Mutex::new(HashMap::new()),
        })
    }

    /// Whether the bridge currently has a UI channel installed.
    pub fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }

    /// Turn the UI channel on or off. Turning on installs a fresh
    /// channel and returns its receiver; turning off marks the bridge
    /// disconnected but does not drop any receiver already handed out
    /// (any in-flight requests on it simply stop being answered and
    /// will time out).
    pub async fn set_connected(&self, on: bool) -> Option<mpsc::UnboundedReceiver<WriteActionRequest>> {
        if on {
            let (tx, rx) = mpsc::unbounded_channel();
            *self.sender.lock().await = Some(tx);
            self.connected.store(true, Ordering::SeqCst);
            Some(rx)
        } else {
            self.connected.store(false, Ordering::SeqCst);
            None
        }
    }

    /// Request approval for `op`/`details`, awaiting the result
    /// asynchronously (up to the internal 30 s timeout). Returns
    /// `Ok(false)` — never an error — on timeout or a closed channel,
    /// per the "default to deny" policy.
    pub async fn request_approval_async(
        &self,
        op: impl Into<String>,
        details: Value,
        request_id: Option<String>,
        agent_id: Option<String>,
    ) -> Result<bool, ApprovalError> {
        if !self.is_connected() {
            tracing::warn!(op = %op.into(), "approval denied: bridge disconnected");
            return Ok(false);
        }
        let op = op.into();
        let request_id = request_id.unwrap_or_else(|| uuid::Uuid::new_v4().to_string());

        let (tx, rx) = oneshot::channel();
        self.pending.lock().await.insert(request_id.clone(), tx);

        let send_result = {
            let guard = self.sender.lock().await;
            match guard.as_ref() {
                Some(sender) => sender.send(WriteActionRequest {
                    request_id: request_id.clone(),
                    agent_id,
                    op: op.clone(),
                    details,
                }),
                None => Err(mpsc::error::SendError(WriteActionRequest {
                    request_id: request_id.clone(),
                    agent_id: None,
                    op: op.clone(),
                    details: Value::Null,
                })),
            }
        };

        if send_result.is_err() {
            self.pending.lock().await.remove(&request_id);
            tracing::warn!(op, request_id, "approval denied: failed to send request");
            return Ok(false);
        }

        let outcome = tokio::time::timeout(APPROVAL_TIMEOUT, rx).await;
        self.pending.lock().await.remove(&request_id);

        match outcome {
            Ok(Ok(approved)) => Ok(approved),
            Ok(Err(_)) => {
                tracing::warn!(op, request_id, "approval denied: responder dropped");
                Ok(false)
            }
            Err(_) => {
                tracing::warn!(op, request_id, "approval denied: timed out");
                Ok(false)
            }
        }
    }

    /// Synchronous variant for callers running on a worker thread
    /// outside the main event loop: blocks the current thread until a
    /// result arrives or a slightly longer outer timeout elapses.
    /// Requires a Tokio runtime to be reachable via [`tokio::runtime::Handle::current`].
    pub fn request_approval(
        self: &Arc<Self>,
        op: impl Into<String>,
        details: Value,
    ) -> Result<bool, ApprovalError> {
        let handle = tokio::runtime::Handle::try_current().map_err(|_| ApprovalError::NoRuntime)?;
        let bridge = Arc::clone(self);
        let op = op.into();

        tokio::task::block_in_place(move || {
            handle.block_on(async move {
                match tokio::time::timeout(
                    APPROVAL_TIMEOUT + SYNC_TIMEOUT_MARGIN,
                    bridge.request_approval_async(op, details, None, None),
                )
                .await
                {
                    Ok(result) => result,
                    Err(_) => Ok(false),
                }
            })
        })
    }

    /// Fulfil the in-flight request matching `request_id` with
    /// `approved`. Returns whether a matching slot existed.
    pub async fn submit_response(&self, request_id: &str, approved: bool) -> bool {
        match self.pending.lock().await.remove(request_id) {
            Some(tx) => tx.send(approved).is_ok(),
            None => false,
        }
    }
}
