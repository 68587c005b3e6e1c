// src/watch/watcher.rs

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Result;
use notify::event::ModifyKind;
use notify::{Config, Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::engine::RuntimeEvent;
use crate::types::ChangeKind;
use crate::watch::coalesce::Coalescer;
use crate::watch::path_utils::relative_str;

/// Handle for the filesystem watchers.
///
/// The supervisor task owns the underlying `notify` subscriptions; this
/// handle keeps its join handle so callers can hold the watcher for as long
/// as needed.
pub struct WatcherHandle {
    _supervisor: JoinHandle<()>,
}

impl std::fmt::Debug for WatcherHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WatcherHandle").finish()
    }
}

/// Signal from a blocking notify callback into the async supervisor.
enum WatchSignal {
    Event { event: Event },
    ProviderError { root_idx: usize },
}

/// Spawn one filesystem subscription per watch root and a supervisor task
/// that debounces events into `RuntimeEvent::ChangesDetected` batches.
///
/// - `source_root` is the directory all paths are relativized against.
/// - `roots` are watch roots relative to `source_root`; `"."` subscribes
///   non-recursively (top-level files only), everything else recursively.
/// - A subscription error triggers up to `resubscribe_attempts` retries for
///   that root alone; exhausting them abandons the root while the others
///   keep running.
pub fn spawn_watchers(
    source_root: impl Into<PathBuf>,
    roots: Vec<String>,
    debounce: Duration,
    resubscribe_attempts: u32,
    runtime_tx: mpsc::Sender<RuntimeEvent>,
) -> Result<WatcherHandle> {
    let source_root = source_root.into();
    // Canonicalize once so we have a stable base path.
    let source_root = source_root
        .canonicalize()
        .unwrap_or_else(|_| source_root.clone());

    let (signal_tx, signal_rx) = mpsc::unbounded_channel::<WatchSignal>();

    let mut subscriptions = Vec::with_capacity(roots.len());
    for (root_idx, root) in roots.iter().enumerate() {
        let abs = if root == "." {
            source_root.clone()
        } else {
            source_root.join(root)
        };
        let recursive = root != ".";

        // A root that cannot be subscribed (typically: the directory does
        // not exist) is fatal for that root only; the others keep running.
        let watcher = match subscribe(&abs, root_idx, recursive, &signal_tx) {
            Ok(watcher) => {
                info!(root = %root, recursive, "watch subscription started");
                Some(watcher)
            }
            Err(e) => {
                warn!(root = %root, error = %e, "cannot subscribe to watch root; skipping");
                None
            }
        };
        subscriptions.push(Subscription {
            abs,
            recursive,
            watcher,
        });
    }

    if subscriptions.iter().all(|s| s.watcher.is_none()) {
        return Err(anyhow::anyhow!(
            "no watch root could be subscribed under {:?}",
            source_root
        ));
    }

    let supervisor = tokio::spawn(supervise(
        source_root,
        subscriptions,
        signal_tx,
        signal_rx,
        debounce,
        resubscribe_attempts,
        runtime_tx,
    ));

    Ok(WatcherHandle {
        _supervisor: supervisor,
    })
}

struct Subscription {
    abs: PathBuf,
    recursive: bool,
    /// `None` once the root has been abandoned after repeated errors.
    watcher: Option<RecommendedWatcher>,
}

fn subscribe(
    abs_root: &Path,
    root_idx: usize,
    recursive: bool,
    signal_tx: &mpsc::UnboundedSender<WatchSignal>,
) -> notify::Result<RecommendedWatcher> {
    let tx = signal_tx.clone();
    let mut watcher = RecommendedWatcher::new(
        move |res: notify::Result<Event>| match res {
            Ok(event) => {
                let _ = tx.send(WatchSignal::Event { event });
            }
            Err(_) => {
                let _ = tx.send(WatchSignal::ProviderError { root_idx });
            }
        },
        Config::default(),
    )?;

    let mode = if recursive {
        RecursiveMode::Recursive
    } else {
        RecursiveMode::NonRecursive
    };
    watcher.watch(abs_root, mode)?;
    Ok(watcher)
}

/// Consume notify signals: coalesce events within the debounce window, flush
/// batches to the runtime, resubscribe erroring roots.
async fn supervise(
    source_root: PathBuf,
    mut subscriptions: Vec<Subscription>,
    signal_tx: mpsc::UnboundedSender<WatchSignal>,
    mut signal_rx: mpsc::UnboundedReceiver<WatchSignal>,
    debounce: Duration,
    resubscribe_attempts: u32,
    runtime_tx: mpsc::Sender<RuntimeEvent>,
) {
    let mut coalescer = Coalescer::new();
    let mut deadline: Option<tokio::time::Instant> = None;

    loop {
        // Disabled select branches still evaluate their expression, so feed
        // the timer a dummy deadline when the window is closed.
        let flush_at =
            deadline.unwrap_or_else(|| tokio::time::Instant::now() + Duration::from_secs(3600));

        tokio::select! {
            signal = signal_rx.recv() => match signal {
                None => {
                    debug!("watch signal channel closed; supervisor exiting");
                    break;
                }
                Some(WatchSignal::Event { event }) => {
                    for (kind, rel) in map_event(&event, &source_root) {
                        debug!(path = %rel, ?kind, "observed filesystem event");
                        coalescer.observe(rel, kind);
                    }
                    if !coalescer.is_empty() {
                        deadline = Some(tokio::time::Instant::now() + debounce);
                    }
                }
                Some(WatchSignal::ProviderError { root_idx }) => {
                    resubscribe(
                        &mut subscriptions[root_idx],
                        root_idx,
                        resubscribe_attempts,
                        &signal_tx,
                    )
                    .await;
                }
            },
            _ = tokio::time::sleep_until(flush_at), if deadline.is_some() => {
                deadline = None;
                let changes = coalescer.drain();
                if changes.is_empty() {
                    continue;
                }
                debug!(count = changes.len(), "debounce window closed; dispatching batch");
                if runtime_tx
                    .send(RuntimeEvent::ChangesDetected(changes))
                    .await
                    .is_err()
                {
                    // Runtime is gone; no point keeping the watcher alive.
                    debug!("runtime channel closed; supervisor exiting");
                    break;
                }
            }
        }
    }
}

async fn resubscribe(
    subscription: &mut Subscription,
    root_idx: usize,
    attempts: u32,
    signal_tx: &mpsc::UnboundedSender<WatchSignal>,
) {
    if subscription.watcher.is_none() {
        // Root already abandoned; late errors from the dead subscription.
        return;
    }

    warn!(root = ?subscription.abs, "watch subscription errored; resubscribing");
    subscription.watcher = None;

    for attempt in 1..=attempts {
        tokio::time::sleep(Duration::from_millis(200 * u64::from(attempt))).await;
        match subscribe(
            &subscription.abs,
            root_idx,
            subscription.recursive,
            signal_tx,
        ) {
            Ok(watcher) => {
                info!(root = ?subscription.abs, attempt, "watch subscription restored");
                subscription.watcher = Some(watcher);
                return;
            }
            Err(e) => {
                warn!(root = ?subscription.abs, attempt, error = %e, "resubscription failed");
            }
        }
    }

    error!(
        root = ?subscription.abs,
        "abandoning watch root after repeated errors; other roots continue"
    );
}

/// Map a notify event to `(kind, relative path)` pairs.
///
/// Metadata-only and access events are ignored; rename halves are resolved
/// by probing whether the path still exists.
fn map_event(event: &Event, source_root: &Path) -> Vec<(ChangeKind, String)> {
    let kind = match event.kind {
        EventKind::Create(_) => Some(ChangeKind::Add),
        EventKind::Remove(_) => Some(ChangeKind::Unlink),
        EventKind::Modify(ModifyKind::Name(_)) => None,
        EventKind::Modify(ModifyKind::Metadata(_)) => return Vec::new(),
        EventKind::Modify(_) => Some(ChangeKind::Change),
        EventKind::Access(_) | EventKind::Any | EventKind::Other => return Vec::new(),
    };

    event
        .paths
        .iter()
        .filter_map(|path| {
            // Directory churn is not a source change; per-file events follow.
            if path.is_dir() {
                return None;
            }
            let rel = relative_str(source_root, path)?;
            let kind = kind.unwrap_or_else(|| {
                if path.exists() {
                    ChangeKind::Add
                } else {
                    ChangeKind::Unlink
                }
            });
            Some((kind, rel))
        })
        .collect()
}
