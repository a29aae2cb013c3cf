//! Events the engine publishes for a front end to render.

use serde::{Deserialize, Serialize};

use crate::core::types::{OperationKind, View};

/// High-level notifications emitted by the session dispatcher.
///
/// A UI subscribes to these instead of polling the session: each event
/// carries everything needed to redraw the affected part of the screen.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SessionEvent {
    /// The active screen changed.
    ViewChanged { view: View },
    /// A command was refused at its boundary (non-image upload, blank
    /// custom prompt). Shown as a one-off notice; no work was started.
    InputRejected { reason: String },
    /// The custom-instruction input should be revealed or hidden.
    CustomInputVisibility { visible: bool },
    /// An enhancement round trip started.
    ProcessingStarted {
        operation: OperationKind,
        title: String,
        description: String,
    },
    /// The enhancement failed; the session is back on the selection screen.
    ProcessingFailed { message: String },
    /// The enhancement succeeded and the comparison screen can be shown.
    ResultReady {
        operation: OperationKind,
        label: String,
        /// Display path of the untouched original
        original_path: String,
        /// The enhanced image, ready for an `<img>` element
        enhanced_data_uri: String,
    },
    /// The 4K upscale-for-download started.
    DownloadStarted,
    /// The 4K file was written to disk.
    DownloadFinished { path: String },
    /// The 4K path failed; the result screen is unaffected.
    DownloadFailed { message: String },
    /// The session returned to its initial state.
    DidReset,
}
