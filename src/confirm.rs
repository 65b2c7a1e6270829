//! Manual confirmation gate
//!
//! Between the confirmation request and the status poll the applicant has to
//! approve the push notification on their phone. The gate is the suspension
//! point where the run waits for someone to say that happened.

use std::io::{self, BufRead, Write};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::oneshot;
use tracing::{info, warn};

use crate::error::HandshakeError;

#[async_trait]
pub trait ConfirmationGate: Send {
    /// Wait for the attestation; `true` means the out-of-band step is done
    async fn await_confirmation(&mut self) -> bool;
}

/// Always answers the same way
#[derive(Debug, Clone, Copy)]
pub struct FixedGate(pub bool);

#[async_trait]
impl ConfirmationGate for FixedGate {
    async fn await_confirmation(&mut self) -> bool {
        self.0
    }
}

/// Answer delivered from elsewhere in the process (UI dialog, webhook handler)
///
/// A dropped sender counts as declined.
pub struct ChannelGate {
    receiver: Option<oneshot::Receiver<bool>>,
}

impl ChannelGate {
    pub fn new(receiver: oneshot::Receiver<bool>) -> Self {
        Self {
            receiver: Some(receiver),
        }
    }

    /// Gate plus the sender that resolves it
    pub fn pair() -> (oneshot::Sender<bool>, Self) {
        let (tx, rx) = oneshot::channel();
        (tx, Self::new(rx))
    }
}

#[async_trait]
impl ConfirmationGate for ChannelGate {
    async fn await_confirmation(&mut self) -> bool {
        match self.receiver.take() {
            Some(receiver) => receiver.await.unwrap_or(false),
            None => false,
        }
    }
}

/// Source of confirmation answers, read a line at a time
pub type AnswerInput = Box<dyn BufRead + Send>;

/// Prompt on stderr, read one answer line from stdin
///
/// The line is read on a detached thread; a timed-out wait leaves that read
/// behind without holding up runtime shutdown.
pub struct TerminalGate {
    prompt: String,
    affirmatives: Vec<String>,
    input: Arc<Mutex<AnswerInput>>,
}

impl TerminalGate {
    pub fn new(prompt: impl Into<String>, affirmatives: Vec<String>) -> Self {
        Self::with_input(prompt, affirmatives, io::BufReader::new(io::stdin()))
    }

    /// Read answers from `input` instead of stdin
    pub fn with_input(
        prompt: impl Into<String>,
        affirmatives: Vec<String>,
        input: impl BufRead + Send + 'static,
    ) -> Self {
        Self {
            prompt: prompt.into(),
            affirmatives,
            input: Arc::new(Mutex::new(Box::new(input))),
        }
    }

    /// Whether `answer` counts as a confirmation
    pub fn is_affirmative(&self, answer: &str) -> bool {
        let answer = answer.trim();
        !answer.is_empty()
            && self
                .affirmatives
                .iter()
                .any(|a| a.trim().eq_ignore_ascii_case(answer))
    }

    fn spawn_reader(&self) -> io::Result<oneshot::Receiver<io::Result<Option<String>>>> {
        let input = Arc::clone(&self.input);
        let (tx, rx) = oneshot::channel();
        thread::Builder::new()
            .name("confirm-answer".to_string())
            .spawn(move || {
                let answer = input
                    .lock()
                    .map_err(|_| io::Error::other("answer input poisoned"))
                    .and_then(|mut reader| {
                        let mut line = String::new();
                        match reader.read_line(&mut line)? {
                            0 => Ok(None),
                            _ => Ok(Some(line)),
                        }
                    });
                // receiver is gone once the wait timed out
                let _ = tx.send(answer);
            })?;
        Ok(rx)
    }
}

#[async_trait]
impl ConfirmationGate for TerminalGate {
    async fn await_confirmation(&mut self) -> bool {
        {
            let mut stderr = io::stderr().lock();
            let written =
                write!(stderr, "{} ", self.prompt.trim_end()).and_then(|()| stderr.flush());
            if let Err(e) = written {
                warn!("failed to write confirmation prompt: {}", e);
            }
        }

        let answer = match self.spawn_reader() {
            Ok(rx) => rx.await,
            Err(e) => {
                warn!("failed to start confirmation reader: {}", e);
                return false;
            }
        };

        match answer {
            Ok(Ok(Some(line))) => self.is_affirmative(&line),
            Ok(Ok(None)) | Err(_) => false,
            Ok(Err(e)) => {
                warn!("failed to read confirmation answer: {}", e);
                false
            }
        }
    }
}

/// Suspend until the gate answers, honouring an optional timeout
///
/// The wait is cancelled by dropping the gate future when the timeout fires.
pub async fn wait_for_confirmation<G: ConfirmationGate + ?Sized>(
    gate: &mut G,
    timeout: Option<Duration>,
) -> Result<(), HandshakeError> {
    info!("waiting for manual confirmation");
    let confirmed = match timeout {
        Some(limit) => tokio::time::timeout(limit, gate.await_confirmation())
            .await
            .map_err(|_| HandshakeError::UserDeclined {
                reason: format!("no confirmation within {}s", limit.as_secs()),
            })?,
        None => gate.await_confirmation().await,
    };

    if confirmed {
        info!("manual confirmation received");
        Ok(())
    } else {
        Err(HandshakeError::UserDeclined {
            reason: "confirmation was not affirmative".to_string(),
        })
    }
}
