//! The single live unit of work: one user's upload → enhance → download cycle.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tempfile::NamedTempFile;
use tracing::debug;

use crate::core::types::{EnhancedPair, OperationKind, UploadFile, View};
use crate::utils::{ReviveError, ReviveResult};

/// The uploaded original, kept in memory for the duration of the session.
#[derive(Debug, Clone)]
pub struct SourceImage {
    pub file_name: String,
    pub media_type: String,
    pub bytes: Arc<Vec<u8>>,
}

/// Transient on-disk reference to the uploaded image, used only for display.
///
/// Backed by a named temp file that is deleted when the value is dropped,
/// so a preview can never outlive the session slot that holds it and is
/// released exactly once.
#[derive(Debug)]
pub struct PreviewImage {
    file: NamedTempFile,
}

impl PreviewImage {
    /// Writes `bytes` to a fresh temp file and hands back the display handle.
    pub fn create(bytes: &[u8]) -> ReviveResult<Self> {
        let file = NamedTempFile::with_prefix("photorevive-preview-")
            .map_err(|e| ReviveError::io(format!("Failed to create preview file: {e}")))?;
        std::fs::write(file.path(), bytes)
            .map_err(|e| ReviveError::io(format!("Failed to write preview file: {e}")))?;
        debug!("Preview written to {}", file.path().display());
        Ok(Self { file })
    }

    pub fn path(&self) -> &Path {
        self.file.path()
    }
}

/// Session state for one interaction cycle.
///
/// Owned and mutated exclusively by the dispatcher; everything else sees it
/// through the read accessors. The `generation` counter distinguishes
/// successive cycles so that completions of work issued by an earlier cycle
/// can be recognized and discarded.
#[derive(Debug)]
pub struct Session {
    view: View,
    selected_operation: Option<OperationKind>,
    custom_instruction: String,
    custom_input_visible: bool,
    source: Option<SourceImage>,
    preview: Option<PreviewImage>,
    result: Option<EnhancedPair>,
    last_error: Option<String>,
    download_in_progress: bool,
    generation: u64,
}

impl Default for Session {
    fn default() -> Self {
        Self {
            view: View::Upload,
            selected_operation: None,
            custom_instruction: String::new(),
            custom_input_visible: false,
            source: None,
            preview: None,
            result: None,
            last_error: None,
            download_in_progress: false,
            generation: 0,
        }
    }
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn view(&self) -> View {
        self.view
    }

    pub fn selected_operation(&self) -> Option<OperationKind> {
        self.selected_operation
    }

    pub fn custom_instruction(&self) -> &str {
        &self.custom_instruction
    }

    pub fn is_custom_input_visible(&self) -> bool {
        self.custom_input_visible
    }

    pub fn source(&self) -> Option<&SourceImage> {
        self.source.as_ref()
    }

    pub fn preview_path(&self) -> Option<&Path> {
        self.preview.as_ref().map(|p| p.path())
    }

    pub fn result(&self) -> Option<&EnhancedPair> {
        self.result.as_ref()
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    pub fn is_downloading(&self) -> bool {
        self.download_in_progress
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Adopts a freshly uploaded file, implicitly resetting any previous
    /// cycle: the old preview is released, stale work is invalidated by the
    /// generation bump, and the session lands on the selection screen.
    ///
    /// The preview file is created before any field is touched, so a
    /// failure here leaves the session exactly as it was.
    pub(crate) fn adopt_upload(&mut self, file: UploadFile) -> ReviveResult<()> {
        let preview = PreviewImage::create(&file.bytes)?;

        // Assigning drops the previous preview, deleting its temp file.
        self.preview = Some(preview);
        self.source = Some(SourceImage {
            file_name: file.file_name,
            media_type: file.media_type,
            bytes: Arc::new(file.bytes),
        });
        self.result = None;
        self.selected_operation = None;
        self.last_error = None;
        self.custom_instruction.clear();
        self.custom_input_visible = false;
        self.download_in_progress = false;
        self.generation += 1;
        self.view = View::Selection;
        Ok(())
    }

    pub(crate) fn set_view(&mut self, view: View) {
        self.view = view;
    }

    pub(crate) fn set_operation(&mut self, op: OperationKind) {
        self.selected_operation = Some(op);
    }

    pub(crate) fn set_custom_instruction(&mut self, text: String) {
        self.custom_instruction = text;
    }

    pub(crate) fn set_custom_input_visible(&mut self, visible: bool) {
        self.custom_input_visible = visible;
    }

    pub(crate) fn set_error(&mut self, message: Option<String>) {
        self.last_error = message;
    }

    pub(crate) fn set_result(&mut self, pair: Option<EnhancedPair>) {
        self.result = pair;
    }

    pub(crate) fn set_downloading(&mut self, downloading: bool) {
        self.download_in_progress = downloading;
    }

    /// Path the comparison screen shows as the "before" half.
    pub(crate) fn preview_path_buf(&self) -> Option<PathBuf> {
        self.preview.as_ref().map(|p| p.path().to_path_buf())
    }

    /// Returns every field to its initial value and releases the preview.
    ///
    /// The generation keeps counting up across resets so in-flight work
    /// from the abandoned cycle can never write into the next one.
    pub(crate) fn reset(&mut self) {
        let generation = self.generation + 1;
        // Dropping the old value releases the preview temp file.
        *self = Session {
            generation,
            ..Session::default()
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn upload(name: &str) -> UploadFile {
        UploadFile {
            file_name: name.to_string(),
            media_type: "image/jpeg".to_string(),
            bytes: vec![0xFF, 0xD8, 0xFF, 0xE0, 1, 2, 3],
        }
    }

    #[test]
    fn fresh_session_starts_empty_on_upload_screen() {
        let session = Session::new();
        assert_eq!(session.view(), View::Upload);
        assert!(session.selected_operation().is_none());
        assert!(session.preview_path().is_none());
        assert!(session.result().is_none());
        assert!(session.last_error().is_none());
        assert!(!session.is_downloading());
        assert!(!session.is_custom_input_visible());
        assert_eq!(session.custom_instruction(), "");
    }

    #[test]
    fn adopting_an_upload_moves_to_selection_and_writes_a_preview() {
        let mut session = Session::new();
        session.adopt_upload(upload("cat.jpg")).unwrap();
        assert_eq!(session.view(), View::Selection);
        let path = session.preview_path().unwrap().to_path_buf();
        assert!(path.exists());
        assert_eq!(std::fs::read(&path).unwrap(), vec![0xFF, 0xD8, 0xFF, 0xE0, 1, 2, 3]);
    }

    #[test]
    fn adopting_a_second_upload_releases_the_first_preview() {
        let mut session = Session::new();
        session.adopt_upload(upload("one.jpg")).unwrap();
        let first = session.preview_path().unwrap().to_path_buf();
        let first_generation = session.generation();

        session.adopt_upload(upload("two.jpg")).unwrap();
        let second = session.preview_path().unwrap().to_path_buf();

        assert!(!first.exists(), "old preview file must be deleted");
        assert!(second.exists());
        assert_ne!(first, second);
        assert!(session.generation() > first_generation);
    }

    #[test]
    fn reset_restores_initial_state_and_releases_the_preview() {
        let mut session = Session::new();
        session.adopt_upload(upload("cat.jpg")).unwrap();
        session.set_custom_instruction("sky to purple".to_string());
        session.set_custom_input_visible(true);
        session.set_error(Some("boom".to_string()));
        let path = session.preview_path().unwrap().to_path_buf();
        let generation = session.generation();

        session.reset();

        assert!(!path.exists(), "preview file must be deleted on reset");
        assert_eq!(session.view(), View::Upload);
        assert!(session.source().is_none());
        assert!(session.preview_path().is_none());
        assert!(session.result().is_none());
        assert!(session.last_error().is_none());
        assert_eq!(session.custom_instruction(), "");
        assert!(!session.is_custom_input_visible());
        assert!(!session.is_downloading());
        assert_eq!(session.generation(), generation + 1);
    }

    #[test]
    fn reset_from_initial_state_is_harmless() {
        let mut session = Session::new();
        session.reset();
        assert_eq!(session.view(), View::Upload);
        assert_eq!(session.generation(), 1);
    }
}
