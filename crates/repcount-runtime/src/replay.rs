//! Trace replay driver
//!
//! Events are routed to one worker task per client over a bounded channel,
//! so a client's events are applied in trace order while different clients
//! run concurrently. Every applied event produces a [`ReplayRecord`].

use std::collections::HashMap;
use std::sync::Arc;

use repcount_core::{ClientId, FrameTime};
use repcount_session::{FrameResult, SessionManager, SessionSummary};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::trace::{pose_frame, TraceError, TraceEvent};

/// Replay errors
#[derive(Error, Debug)]
pub enum ReplayError {
    #[error(transparent)]
    Trace(#[from] TraceError),

    #[error("Trace read failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("Worker for {0} terminated abnormally")]
    Worker(ClientId),
}

/// Replay configuration
#[derive(Debug, Clone)]
pub struct ReplayConfig {
    /// Events buffered per client before the reader waits
    pub channel_capacity: usize,
    /// Fail on the first malformed line instead of skipping it
    pub strict: bool,
}

impl Default for ReplayConfig {
    fn default() -> Self {
        ReplayConfig {
            channel_capacity: 256,
            strict: false,
        }
    }
}

/// Outcome of one applied event
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum ReplayRecord {
    Started {
        client: ClientId,
        exercise: String,
        replaced: bool,
    },
    Frame {
        client: ClientId,
        t: f64,
        #[serde(flatten)]
        result: FrameResult,
    },
    Reset {
        client: ClientId,
    },
    Stopped {
        client: ClientId,
        summary: SessionSummary,
    },
    Rejected {
        client: ClientId,
        error: String,
    },
}

impl ReplayRecord {
    pub fn client(&self) -> &ClientId {
        match self {
            ReplayRecord::Started { client, .. }
            | ReplayRecord::Frame { client, .. }
            | ReplayRecord::Reset { client }
            | ReplayRecord::Stopped { client, .. }
            | ReplayRecord::Rejected { client, .. } => client,
        }
    }
}

/// Totals for one replay run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReplayReport {
    pub lines: usize,
    pub events: usize,
    pub malformed: usize,
    pub clients: usize,
    /// Frames a live session accepted; rejected frames count only in `rejected`
    pub frames: usize,
    pub rejected: usize,
}

#[derive(Debug, Default, Clone, Copy)]
struct WorkerStats {
    frames: usize,
    rejected: usize,
}

struct Worker {
    tx: mpsc::Sender<TraceEvent>,
    handle: JoinHandle<WorkerStats>,
}

/// Replays traces against a session manager
pub struct Replayer {
    manager: Arc<SessionManager>,
    config: ReplayConfig,
}

impl Replayer {
    pub fn new(manager: Arc<SessionManager>, config: ReplayConfig) -> Self {
        Replayer { manager, config }
    }

    pub fn manager(&self) -> &Arc<SessionManager> {
        &self.manager
    }

    /// Read the whole trace, sending one record per applied event to `out`
    pub async fn run<R>(
        &self,
        reader: R,
        out: mpsc::UnboundedSender<ReplayRecord>,
    ) -> Result<ReplayReport, ReplayError>
    where
        R: AsyncBufRead + Unpin,
    {
        let mut report = ReplayReport::default();
        let mut workers: HashMap<ClientId, Worker> = HashMap::new();
        let mut lines = reader.lines();

        while let Some(line) = lines.next_line().await? {
            report.lines += 1;

            let event = match TraceEvent::parse_line(report.lines, &line) {
                Ok(Some(event)) => event,
                Ok(None) => continue,
                Err(e) if self.config.strict => return Err(e.into()),
                Err(e) => {
                    warn!(error = %e, "skipping malformed trace line");
                    report.malformed += 1;
                    continue;
                }
            };
            report.events += 1;

            let client = event.client().clone();
            let worker = workers.entry(client.clone()).or_insert_with(|| {
                debug!(%client, "spawning client worker");
                spawn_worker(
                    Arc::clone(&self.manager),
                    self.config.channel_capacity,
                    out.clone(),
                )
            });

            if worker.tx.send(event).await.is_err() {
                return Err(ReplayError::Worker(client));
            }
        }

        report.clients = workers.len();
        for (client, worker) in workers {
            drop(worker.tx);
            let stats = worker
                .handle
                .await
                .map_err(|_| ReplayError::Worker(client))?;
            report.frames += stats.frames;
            report.rejected += stats.rejected;
        }

        info!(
            lines = report.lines,
            events = report.events,
            clients = report.clients,
            frames = report.frames,
            rejected = report.rejected,
            "replay finished"
        );
        Ok(report)
    }
}

fn spawn_worker(
    manager: Arc<SessionManager>,
    capacity: usize,
    out: mpsc::UnboundedSender<ReplayRecord>,
) -> Worker {
    let (tx, mut rx) = mpsc::channel::<TraceEvent>(capacity.max(1));

    let handle = tokio::spawn(async move {
        let mut stats = WorkerStats::default();
        while let Some(event) = rx.recv().await {
            let record = apply(&manager, event, &mut stats);
            // Keep applying with no listener so session state stays complete
            let _ = out.send(record);
        }
        stats
    });

    Worker { tx, handle }
}

fn apply(manager: &SessionManager, event: TraceEvent, stats: &mut WorkerStats) -> ReplayRecord {
    let outcome = match event {
        TraceEvent::Start { client, exercise } => manager
            .create_session(client.clone(), &exercise)
            .map(|handle| ReplayRecord::Started {
                client: client.clone(),
                exercise: handle.exercise,
                replaced: handle.replaced,
            })
            .map_err(|e| (client, e)),
        TraceEvent::Frame {
            client,
            t,
            layout,
            keypoints,
        } => {
            let frame = pose_frame(layout, &keypoints);
            manager
                .process_frame(&client, &frame, FrameTime::from_secs_f64(t))
                .map(|result| {
                    stats.frames += 1;
                    ReplayRecord::Frame {
                        client: client.clone(),
                        t,
                        result,
                    }
                })
                .map_err(|e| (client, e))
        }
        TraceEvent::Reset { client } => manager
            .reset_session(&client)
            .map(|()| ReplayRecord::Reset {
                client: client.clone(),
            })
            .map_err(|e| (client, e)),
        TraceEvent::Stop { client } => manager
            .destroy_session(&client)
            .map(|summary| ReplayRecord::Stopped {
                client: client.clone(),
                summary,
            })
            .map_err(|e| (client, e)),
    };

    outcome.unwrap_or_else(|(client, error)| {
        stats.rejected += 1;
        warn!(%client, %error, "trace event rejected");
        ReplayRecord::Rejected {
            client,
            error: error.to_string(),
        }
    })
}
