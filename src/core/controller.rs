//! The session dispatcher: a single task that owns the [`Session`], drains a
//! queue of commands and async completions in arrival order, and applies the
//! upload → selection → processing → result transitions.
//!
//! Async work (transcode + gateway round trip, 4K download) runs on spawned
//! tasks and reports back through the same queue. Every job is tagged with
//! the session generation that issued it; a completion whose generation no
//! longer matches the live session is discarded, so work orphaned by a reset
//! or a re-upload can never write into a newer session.

use std::path::PathBuf;
use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::{debug, warn};

use crate::core::events::SessionEvent;
use crate::core::session::Session;
use crate::core::types::{EncodedImage, EnhancedPair, OperationKind, UploadFile, View};
use crate::processing::{EnhanceClient, TranscodeProfile, transcode};
use crate::utils::validation::ensure_image_upload;
use crate::utils::{ReviveError, ReviveResult, ValidationError, save_download};

/// User-driven actions, the surface a front end speaks.
#[derive(Debug)]
pub enum Command {
    /// A file was picked or dropped. Valid from any state; implicitly
    /// resets a previous cycle.
    SelectImage(UploadFile),
    /// The custom-instruction text changed.
    SetCustomInstruction(String),
    /// The custom-instruction input was cancelled.
    DismissCustomInput,
    /// An enhancement was requested for the selected image.
    RequestOperation(OperationKind),
    /// The 4K upscale-for-download was requested from the result screen.
    RequestDownload,
    /// Back to the initial upload screen.
    Reset,
}

/// Results of spawned jobs, tagged with the generation that issued them.
#[derive(Debug)]
pub enum Completion {
    Enhanced {
        generation: u64,
        outcome: ReviveResult<EncodedImage>,
    },
    DownloadReady {
        generation: u64,
        outcome: ReviveResult<PathBuf>,
    },
}

/// Everything the dispatcher queue carries.
#[derive(Debug)]
pub enum Message {
    Command(Command),
    Completion(Completion),
}

/// Clonable sender a front end uses to drive the dispatcher.
#[derive(Clone)]
pub struct CommandHandle {
    tx: mpsc::UnboundedSender<Message>,
}

impl CommandHandle {
    pub fn send(&self, command: Command) -> Result<(), mpsc::error::SendError<Message>> {
        self.tx.send(Message::Command(command))
    }
}

/// Dispatcher configuration.
#[derive(Debug, Clone)]
pub struct ControllerConfig {
    /// Where 4K downloads are written.
    pub download_dir: PathBuf,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            download_dir: dirs::download_dir().unwrap_or_else(std::env::temp_dir),
        }
    }
}

/// The view/request state machine.
///
/// All session mutation happens on the task running [`run`](Self::run);
/// spawned jobs communicate exclusively through generation-tagged
/// completions on the internal queue.
pub struct SessionController<C: EnhanceClient + 'static> {
    session: Session,
    client: Arc<C>,
    config: ControllerConfig,
    tx: mpsc::UnboundedSender<Message>,
    rx: mpsc::UnboundedReceiver<Message>,
    events: mpsc::UnboundedSender<SessionEvent>,
}

impl<C: EnhanceClient + 'static> SessionController<C> {
    pub fn new(
        client: Arc<C>,
        config: ControllerConfig,
        events: mpsc::UnboundedSender<SessionEvent>,
    ) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        Self {
            session: Session::new(),
            client,
            config,
            tx,
            rx,
            events,
        }
    }

    /// Handle for submitting commands from other tasks.
    pub fn commands(&self) -> CommandHandle {
        CommandHandle {
            tx: self.tx.clone(),
        }
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Drains the queue until every command handle and every in-flight job
    /// is gone.
    pub async fn run(mut self) {
        debug!("Session dispatcher started");
        while let Some(message) = self.rx.recv().await {
            self.handle_message(message);
        }
        debug!("Session dispatcher stopped");
    }

    /// Applies one queued message. Public so embedders (and tests) can run
    /// their own loop instead of [`run`](Self::run).
    pub fn handle_message(&mut self, message: Message) {
        match message {
            Message::Command(command) => self.handle_command(command),
            Message::Completion(completion) => self.handle_completion(completion),
        }
    }

    fn handle_command(&mut self, command: Command) {
        match command {
            Command::SelectImage(file) => self.select_image(file),
            Command::SetCustomInstruction(text) => self.set_custom_instruction(text),
            Command::DismissCustomInput => self.dismiss_custom_input(),
            Command::RequestOperation(operation) => self.request_operation(operation),
            Command::RequestDownload => self.request_download(),
            Command::Reset => self.reset(),
        }
    }

    fn select_image(&mut self, file: UploadFile) {
        if let Err(err) = ensure_image_upload(&file) {
            warn!("Rejected upload '{}': {}", file.file_name, err);
            self.emit(SessionEvent::InputRejected {
                reason: err.to_string(),
            });
            return;
        }

        match self.session.adopt_upload(file) {
            Ok(()) => {
                debug!("Image selected (generation {})", self.session.generation());
                self.emit_view();
            }
            Err(err) => {
                warn!("Failed to stage preview: {err}");
                self.emit(SessionEvent::InputRejected {
                    reason: err.to_string(),
                });
            }
        }
    }

    fn set_custom_instruction(&mut self, text: String) {
        if self.session.view() != View::Selection {
            debug!("Ignoring instruction edit outside the selection screen");
            return;
        }
        self.session.set_custom_instruction(text);
    }

    fn dismiss_custom_input(&mut self) {
        if self.session.view() != View::Selection {
            return;
        }
        self.session.set_custom_input_visible(false);
        self.emit(SessionEvent::CustomInputVisibility { visible: false });
    }

    fn request_operation(&mut self, operation: OperationKind) {
        if self.session.view() != View::Selection {
            debug!("Ignoring operation request from {:?}", self.session.view());
            return;
        }

        if operation == OperationKind::Custom {
            // First press primes the instruction input; it starts no work.
            if !self.session.is_custom_input_visible()
                && self.session.custom_instruction().is_empty()
            {
                self.session.set_custom_input_visible(true);
                self.emit(SessionEvent::CustomInputVisibility { visible: true });
                return;
            }
            if self.session.custom_instruction().trim().is_empty() {
                let err = ValidationError::MissingPrompt;
                self.session.set_error(Some(err.to_string()));
                self.emit(SessionEvent::InputRejected {
                    reason: err.to_string(),
                });
                return;
            }
        }

        let bytes = match self.session.source() {
            Some(source) => Arc::clone(&source.bytes),
            None => {
                warn!("Operation requested without a source image");
                return;
            }
        };

        self.session.set_operation(operation);
        self.session.set_error(None);
        self.session.set_view(View::Processing);

        let instruction = self.session.custom_instruction().to_string();
        self.emit(SessionEvent::ProcessingStarted {
            operation,
            title: operation.processing_title().to_string(),
            description: operation.processing_description(&instruction),
        });
        self.emit_view();

        let generation = self.session.generation();
        let client = Arc::clone(&self.client);
        let tx = self.tx.clone();
        tokio::spawn(async move {
            let outcome = enhance_job(client, bytes, operation, instruction).await;
            let _ = tx.send(Message::Completion(Completion::Enhanced {
                generation,
                outcome,
            }));
        });
    }

    fn request_download(&mut self) {
        if self.session.view() != View::Result {
            debug!("Ignoring download request from {:?}", self.session.view());
            return;
        }
        if self.session.is_downloading() {
            debug!("Download already in progress; ignoring");
            return;
        }

        let (enhanced, operation) = match (
            self.session.result(),
            self.session.selected_operation(),
        ) {
            (Some(result), Some(operation)) => (result.enhanced.clone(), operation),
            _ => {
                warn!("Result screen without a stored result");
                return;
            }
        };

        self.session.set_downloading(true);
        self.emit(SessionEvent::DownloadStarted);

        let generation = self.session.generation();
        let dir = self.config.download_dir.clone();
        let tx = self.tx.clone();
        tokio::spawn(async move {
            let outcome = download_job(enhanced, operation, dir).await;
            let _ = tx.send(Message::Completion(Completion::DownloadReady {
                generation,
                outcome,
            }));
        });
    }

    fn reset(&mut self) {
        debug!("Session reset");
        self.session.reset();
        self.emit(SessionEvent::DidReset);
        self.emit_view();
    }

    fn handle_completion(&mut self, completion: Completion) {
        match completion {
            Completion::Enhanced {
                generation,
                outcome,
            } => {
                if generation != self.session.generation() {
                    debug!("Dropping stale enhancement completion (generation {generation})");
                    return;
                }
                match outcome {
                    Ok(enhanced) => self.finish_enhancement(enhanced),
                    Err(err) => {
                        let message = err.to_string();
                        warn!("Enhancement failed: {message}");
                        self.session.set_error(Some(message.clone()));
                        self.session.set_view(View::Selection);
                        self.emit(SessionEvent::ProcessingFailed { message });
                        self.emit_view();
                    }
                }
            }
            Completion::DownloadReady {
                generation,
                outcome,
            } => {
                if generation != self.session.generation() {
                    debug!("Dropping stale download completion (generation {generation})");
                    return;
                }
                // Cleared on every path, success or failure.
                self.session.set_downloading(false);
                match outcome {
                    Ok(path) => self.emit(SessionEvent::DownloadFinished {
                        path: path.display().to_string(),
                    }),
                    Err(err) => {
                        warn!("4K download failed: {err}");
                        self.emit(SessionEvent::DownloadFailed {
                            message: err.to_string(),
                        });
                    }
                }
            }
        }
    }

    fn finish_enhancement(&mut self, enhanced: EncodedImage) {
        let (Some(original_path), Some(operation)) = (
            self.session.preview_path_buf(),
            self.session.selected_operation(),
        ) else {
            warn!("Enhancement finished without a live preview; discarding");
            return;
        };

        self.session.set_result(Some(EnhancedPair {
            original_path: original_path.clone(),
            enhanced: enhanced.clone(),
        }));
        self.session.set_view(View::Result);
        self.emit(SessionEvent::ResultReady {
            operation,
            label: operation.result_label().to_string(),
            original_path: original_path.display().to_string(),
            enhanced_data_uri: enhanced.to_data_uri(),
        });
        self.emit_view();
    }

    fn emit(&self, event: SessionEvent) {
        let _ = self.events.send(event);
    }

    fn emit_view(&self) {
        self.emit(SessionEvent::ViewChanged {
            view: self.session.view(),
        });
    }
}

/// Shape the upload, ask the model for the edit, return its image.
async fn enhance_job<C: EnhanceClient + ?Sized>(
    client: Arc<C>,
    bytes: Arc<Vec<u8>>,
    operation: OperationKind,
    instruction: String,
) -> ReviveResult<EncodedImage> {
    let profile = TranscodeProfile::upload(operation.upload_quality());
    let shaped = tokio::task::spawn_blocking(move || transcode(&bytes, &profile))
        .await
        .map_err(|e| ReviveError::io(format!("Transcode task failed: {e}")))??;

    let directive = operation.directive(&instruction);
    Ok(client.enhance(&shaped, &directive).await?)
}

/// Upscale the finished result to 4K and write it to disk.
async fn download_job(
    enhanced: EncodedImage,
    operation: OperationKind,
    dir: PathBuf,
) -> ReviveResult<PathBuf> {
    let upscaled = tokio::task::spawn_blocking(move || {
        transcode(&enhanced.bytes, &TranscodeProfile::download_4k())
    })
    .await
    .map_err(|e| ReviveError::download(format!("Upscale task failed: {e}")))?
    .map_err(|e| ReviveError::download(e.to_string()))?;

    save_download(&dir, operation, &upscaled.bytes)
        .await
        .map_err(|e| ReviveError::download(e.to_string()))
}
