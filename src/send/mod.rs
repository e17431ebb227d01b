//! Send orchestration: one background worker per run, progress delivered
//! over a channel the interactive surface drains without blocking.

mod message;
mod transport;

pub use message::{build_message, is_readable_file, LoadedAttachment};
pub use transport::{test_connection, Connector, Session, SmtpConnector};

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver, Sender, TryRecvError};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use lettre::message::Mailbox;

use crate::error::{DeliveryError, SendError};
use crate::store::{Draft, Recipient, SmtpProfile};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RunState {
    #[default]
    Idle,
    Running,
    Completed,
    Cancelled,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Success,
    Failure(DeliveryError),
}

/// The outcome for one recipient; `index` is 1-based
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SendResult {
    pub recipient: Recipient,
    pub index: usize,
    pub total: usize,
    pub outcome: Outcome,
}

impl SendResult {
    pub fn is_success(&self) -> bool {
        self.outcome == Outcome::Success
    }

    pub fn log_line(&self) -> String {
        match &self.outcome {
            Outcome::Success => format!("[{}/{}] Sent to {}", self.index, self.total, self.recipient),
            Outcome::Failure(e) => {
                format!("[{}/{}] Failed to {}: {}", self.index, self.total, self.recipient, e)
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunSummary {
    pub state: RunState,
    pub sent: usize,
    pub failed: usize,
    /// Recipients never delivered because the run stopped early
    pub unsent: Vec<Recipient>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SendEvent {
    Started { total: usize },
    Result(SendResult),
    Notice(String),
    Aborted {
        error: DeliveryError,
        unsent: Vec<Recipient>,
    },
    Finished(RunSummary),
}

/// Cooperative cancel flag shared with the worker
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }

    fn reset(&self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

/// Everything one run needs, owned by the worker
struct SendJob {
    from: Mailbox,
    subject: String,
    body: String,
    attachments: Vec<PathBuf>,
    recipients: Vec<Recipient>,
    profile: SmtpProfile,
}

impl SendJob {
    fn prepare(
        draft: &Draft,
        recipients: &[Recipient],
        profile: &SmtpProfile,
    ) -> Result<Self, SendError> {
        if recipients.is_empty() {
            return Err(SendError::EmptyRecipientList);
        }
        if let Some(field) = profile.missing_field() {
            return Err(SendError::IncompleteProfile(field));
        }
        let from: Mailbox = profile
            .username
            .parse()
            .map_err(|_| SendError::InvalidSender(profile.username.clone()))?;
        if let Some(missing) = draft.attachments.iter().find(|p| !is_readable_file(p)) {
            return Err(SendError::MissingAttachment(missing.clone()));
        }

        Ok(Self {
            from,
            subject: draft.subject.clone(),
            body: draft.body.clone(),
            attachments: draft.attachments.clone(),
            recipients: recipients.to_vec(),
            profile: profile.clone(),
        })
    }

    fn run(self, connector: &dyn Connector, cancel: &CancelToken, events: &Sender<SendEvent>) {
        let total = self.recipients.len();
        let emit = |event: SendEvent| {
            let _ = events.send(event);
        };
        emit(SendEvent::Started { total });

        let mut attachments = Vec::with_capacity(self.attachments.len());
        for path in &self.attachments {
            match LoadedAttachment::read(path) {
                Ok(a) => attachments.push(a),
                Err(e) => {
                    tracing::warn!(path = %path.display(), error = %e, "skipping attachment");
                    emit(SendEvent::Notice(format!(
                        "Attachment error: {} ({}), skipping this file.",
                        path.display(),
                        e
                    )));
                }
            }
        }

        let mut summary = RunSummary {
            state: RunState::Completed,
            sent: 0,
            failed: 0,
            unsent: Vec::new(),
        };

        let mut session = match connector.connect(&self.profile) {
            Ok(s) => s,
            Err(error) => {
                tracing::error!(host = %self.profile.host, error = %error, "SMTP connect failed");
                summary.unsent = self.recipients.clone();
                emit(SendEvent::Aborted {
                    error,
                    unsent: self.recipients,
                });
                emit(SendEvent::Finished(summary));
                return;
            }
        };

        for (idx, recipient) in self.recipients.iter().enumerate() {
            if cancel.is_cancelled() {
                emit(SendEvent::Notice("Sending cancelled by user.".to_string()));
                summary.state = RunState::Cancelled;
                summary.unsent = self.recipients[idx..].to_vec();
                break;
            }

            let delivered = build_message(
                &self.from,
                recipient,
                &self.subject,
                &self.body,
                &attachments,
            )
            .and_then(|message| session.send(&message));

            match delivered {
                Err(error) if error.is_fatal() => {
                    tracing::error!(recipient = %recipient, error = %error, "aborting send run");
                    summary.unsent = self.recipients[idx..].to_vec();
                    emit(SendEvent::Aborted {
                        error,
                        unsent: summary.unsent.clone(),
                    });
                    break;
                }
                delivered => {
                    let outcome = match delivered {
                        Ok(()) => {
                            summary.sent += 1;
                            Outcome::Success
                        }
                        Err(e) => {
                            summary.failed += 1;
                            Outcome::Failure(e)
                        }
                    };
                    let ok = outcome == Outcome::Success;
                    tracing::info!(recipient = %recipient, ok, "delivery");
                    emit(SendEvent::Result(SendResult {
                        recipient: recipient.clone(),
                        index: idx + 1,
                        total,
                        outcome,
                    }));
                }
            }
        }

        session.close();
        tracing::info!(
            sent = summary.sent,
            failed = summary.failed,
            unsent = summary.unsent.len(),
            state = ?summary.state,
            "send run finished"
        );
        emit(SendEvent::Finished(summary));
    }
}

/// Drives send runs one at a time.
///
/// `start` validates and hands the run to a worker thread; the caller then
/// calls `poll` (non-blocking) or `wait` (blocking) to collect progress.
pub struct Orchestrator {
    connector: Arc<dyn Connector>,
    cancel: CancelToken,
    state: RunState,
    events: Option<Receiver<SendEvent>>,
    worker: Option<JoinHandle<()>>,
}

impl Orchestrator {
    pub fn new(connector: Arc<dyn Connector>) -> Self {
        Self {
            connector,
            cancel: CancelToken::default(),
            state: RunState::Idle,
            events: None,
            worker: None,
        }
    }

    pub fn state(&self) -> RunState {
        self.state
    }

    pub fn is_running(&self) -> bool {
        self.state == RunState::Running
    }

    /// Run `test_connection` on its own thread; the answer arrives on the
    /// returned channel.
    pub fn spawn_connection_test(
        &self,
        profile: &SmtpProfile,
    ) -> Result<Receiver<Result<(), DeliveryError>>, SendError> {
        let (tx, rx) = mpsc::channel();
        let connector = Arc::clone(&self.connector);
        let profile = profile.clone();

        thread::Builder::new()
            .name("bulkmail-check".to_string())
            .spawn(move || {
                let result = test_connection(connector.as_ref(), &profile);
                tracing::info!(host = %profile.host, ok = result.is_ok(), "connection test");
                let _ = tx.send(result);
            })?;
        Ok(rx)
    }

    /// Handle for cancelling the current (or next) run from elsewhere
    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    pub fn start(
        &mut self,
        draft: &Draft,
        recipients: &[Recipient],
        profile: &SmtpProfile,
    ) -> Result<(), SendError> {
        if self.is_running() {
            return Err(SendError::AlreadyRunning);
        }
        let job = SendJob::prepare(draft, recipients, profile)?;

        self.cancel.reset();
        let (tx, rx) = mpsc::channel();
        let connector = Arc::clone(&self.connector);
        let cancel = self.cancel.clone();

        let worker = thread::Builder::new()
            .name("bulkmail-send".to_string())
            .spawn(move || job.run(connector.as_ref(), &cancel, &tx))?;

        tracing::info!(recipients = recipients.len(), host = %profile.host, "send run started");
        self.events = Some(rx);
        self.worker = Some(worker);
        self.state = RunState::Running;
        Ok(())
    }

    /// Request a stop at the next recipient boundary
    pub fn cancel(&self) {
        if self.is_running() {
            self.cancel.cancel();
        }
    }

    /// Collect whatever events are ready without blocking
    pub fn poll(&mut self) -> Vec<SendEvent> {
        let mut out = Vec::new();
        let Some(rx) = self.events.as_ref() else {
            return out;
        };

        let mut disconnected = false;
        loop {
            match rx.try_recv() {
                Ok(event) => out.push(event),
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => {
                    disconnected = true;
                    break;
                }
            }
        }

        self.observe(&out, disconnected);
        out
    }

    /// Block until the current run ends, returning all remaining events
    pub fn wait(&mut self) -> Vec<SendEvent> {
        let out: Vec<SendEvent> = match self.events.as_ref() {
            Some(rx) => rx.iter().collect(),
            None => return Vec::new(),
        };
        self.observe(&out, true);
        out
    }

    fn observe(&mut self, events: &[SendEvent], disconnected: bool) {
        for event in events {
            if let SendEvent::Finished(summary) = event {
                self.state = summary.state;
            }
        }

        if disconnected {
            if self.state == RunState::Running {
                tracing::error!("send worker exited without a summary");
                self.state = RunState::Completed;
            }
            self.events = None;
            if let Some(worker) = self.worker.take() {
                let _ = worker.join();
            }
        }
    }
}
