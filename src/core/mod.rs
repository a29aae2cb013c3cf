//! Core session types and the dispatcher.
//!
//! This module contains the fundamental types used throughout the engine:
//! - [`Session`]: the single live unit of work
//! - [`SessionController`]: the dispatcher applying view transitions
//! - [`Command`] / [`SessionEvent`]: the surface a front end speaks
//! - [`OperationKind`] / [`View`]: the enhancement kinds and screens

mod controller;
mod events;
mod session;
mod types;

pub use controller::{
    Command, CommandHandle, Completion, ControllerConfig, Message, SessionController,
};
pub use events::SessionEvent;
pub use session::{PreviewImage, Session, SourceImage};
pub use types::{EncodedImage, EnhancedPair, OperationKind, UploadFile, View};
