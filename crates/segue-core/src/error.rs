//! Error types for segue-core.

use thiserror::Error;

/// Error type for segue operations.
#[derive(Error, Debug)]
pub enum Error {
    #[error("Invalid config: {0}")]
    InvalidConfig(String),

    /// A payload could not be decoded as audio. Local and recoverable for
    /// streaming chunks (drop and continue); fatal for file loads.
    #[error("Decode error: {0}")]
    Decode(String),

    /// The remote session transport closed or errored. Forces a full stop.
    #[error("Transport error: {0}")]
    Transport(String),

    /// A prompt push failed while the session is otherwise alive.
    /// Forces a pause; the session handle stays valid.
    #[error("Send error: {0}")]
    Send(String),

    #[cfg(feature = "cpal-output")]
    #[error("Audio device not available")]
    DeviceNotAvailable(#[from] cpal::DefaultStreamConfigError),

    #[cfg(feature = "cpal-output")]
    #[error("Failed to build audio stream")]
    BuildStream(#[from] cpal::BuildStreamError),

    #[cfg(feature = "cpal-output")]
    #[error("Failed to play audio stream")]
    PlayStream(#[from] cpal::PlayStreamError),

    #[cfg(feature = "cpal-output")]
    #[error("Invalid device: {0}")]
    InvalidDevice(String),
}

/// Result type alias.
pub type Result<T> = core::result::Result<T, Error>;
