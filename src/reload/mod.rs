// src/reload/mod.rs

//! Live-reload scope computation and the transport boundary.
//!
//! The broadcaster decides *what* connected clients should do after a batch;
//! the [`ReloadTransport`] trait is the narrow interface to whoever manages
//! the client connections (an HTTP/WebSocket server, a test harness). Client
//! lifecycle is out of scope here.

use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::{debug, info};

use crate::build::BuildReport;
use crate::types::AssetCategory;

/// What a transport should tell its clients.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReloadCommand {
    /// Reload the whole page.
    FullReload,
    /// Refresh just the elements referencing these output paths.
    Inject(Vec<String>),
}

/// Boundary to the live-reload server.
///
/// Implementations must not block; with no connected clients both calls are
/// no-ops and never errors.
pub trait ReloadTransport: Send + Sync {
    fn broadcast_full_reload(&self);
    fn broadcast_inject(&self, paths: &[String]);
}

/// Transport for the no-clients case: both broadcasts are silent no-ops.
#[derive(Debug, Clone, Default)]
pub struct NullTransport;

impl ReloadTransport for NullTransport {
    fn broadcast_full_reload(&self) {}
    fn broadcast_inject(&self, _paths: &[String]) {}
}

/// Forwards reload commands over a channel to whoever owns the client
/// connections. Used by server integrations and tests.
#[derive(Debug, Clone)]
pub struct ChannelTransport {
    tx: mpsc::UnboundedSender<ReloadCommand>,
}

impl ChannelTransport {
    /// Create a transport plus the receiving end for the server side.
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<ReloadCommand>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

impl ReloadTransport for ChannelTransport {
    fn broadcast_full_reload(&self) {
        let _ = self.tx.send(ReloadCommand::FullReload);
    }

    fn broadcast_inject(&self, paths: &[String]) {
        let _ = self.tx.send(ReloadCommand::Inject(paths.to_vec()));
    }
}

/// Computes the reload scope for a finished batch.
///
/// Policy:
/// - markup or script activity, or any mirrored deletion, forces a full
///   reload (script injection cannot safely hot-swap, and a removed artifact
///   cannot be injected);
/// - otherwise written style/image/icon/font artifacts are injected in
///   place;
/// - skipped and failed tasks never notify, so no-op filesystem touches
///   cannot cause reload storms.
pub struct Broadcaster {
    transport: Arc<dyn ReloadTransport>,
}

impl std::fmt::Debug for Broadcaster {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Broadcaster").finish_non_exhaustive()
    }
}

impl Broadcaster {
    pub fn new(transport: Arc<dyn ReloadTransport>) -> Self {
        Self { transport }
    }

    pub fn announce(&self, report: &BuildReport) {
        let written = report.written_artifacts();
        let deleted = report.deleted_artifacts();

        if written.is_empty() && deleted.is_empty() {
            debug!("no artifacts changed; not notifying clients");
            return;
        }

        let needs_full_reload = !deleted.is_empty()
            || written.iter().any(|(category, _)| {
                matches!(category, AssetCategory::Markup | AssetCategory::Script)
            });

        if needs_full_reload {
            info!("announcing full reload");
            self.transport.broadcast_full_reload();
        } else {
            let paths: Vec<String> = written.iter().map(|(_, p)| p.to_string()).collect();
            info!(?paths, "announcing asset injection");
            self.transport.broadcast_inject(&paths);
        }
    }
}
