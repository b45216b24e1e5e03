//! Crate-wide error type
//!
//! Class registration and window creation surface the originating OS error
//! at the call site. Geometry and state queries never error; they return
//! default values when the handle is dead (see `platform::win32::window`).

use thiserror::Error;

/// Every error wndkit can produce
#[derive(Error, Debug)]
pub enum Error {
    /// RegisterClassExW failed
    #[error("window class registration failed: {0}")]
    ClassRegistration(#[source] windows::core::Error),

    /// CreateWindowExW failed
    #[error("window creation failed: {0}")]
    WindowCreation(#[source] windows::core::Error),

    /// GetMessageW returned -1
    #[error("message loop failure: {0}")]
    MessageLoop(#[source] windows::core::Error),

    /// Unrecoverable Direct2D failure (device loss is handled internally)
    #[error("render target failure: {0}")]
    Render(#[source] windows::core::Error),

    /// Config file could not be read or written
    #[error("config io error: {0}")]
    ConfigIo(#[from] std::io::Error),

    /// Config file did not parse
    #[error("config parse error: {0}")]
    ConfigParse(#[from] toml::de::Error),

    /// Config could not be encoded for saving
    #[error("config encode error: {0}")]
    ConfigEncode(#[from] toml::ser::Error),
}

/// Convenience alias used throughout the crate
pub type Result<T> = std::result::Result<T, Error>;
