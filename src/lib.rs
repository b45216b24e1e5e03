//! wndkit - a thin wrapper around Win32 windowing and Direct2D drawing
//!
//! Build simple native desktop windows without a GUI framework: register a
//! class, open a window, decode its input into plain event values, and
//! (optionally) drive a hardware-accelerated 2D surface from a frame-paced
//! render loop. Modal message boxes and the common open/save dialogs are
//! wrapped too.
//!
//! Everything window-related must happen on the thread that opened the
//! window; other threads reach it by posting closures through a
//! [`DispatchHandle`].
//!
//! ```no_run
//! use wndkit::{rect, Color, Event, RenderWindow, WindowConfig};
//!
//! fn main() -> wndkit::Result<()> {
//!     let config = WindowConfig {
//!         title: "demo".to_string(),
//!         ..Default::default()
//!     };
//!     let mut window = RenderWindow::open(&config)?;
//!     window.set_handler(|event| {
//!         if let Event::KeyDown(key) = event {
//!             println!("pressed {:?}", key.key);
//!         }
//!         false // fall through to default handling
//!     });
//!     window.run(|renderer, _elapsed| {
//!         let _ = renderer.fill_rect(rect(10.0, 10.0, 100.0, 60.0), Color::WHITE);
//!     })
//! }
//! ```

#![cfg(windows)]

#[macro_use]
pub mod log;

pub mod config;
pub mod dispatch;
pub mod error;
pub mod geometry;
pub mod platform;

pub use config::WindowConfig;
pub use dispatch::{DispatchHandle, DispatchQueue};
pub use error::{Error, Result};
pub use geometry::{Point, Rect, Size};
pub use platform::win32::{
    enable_dpi_awareness, message_box, post_quit, pump_messages, rect, run_message_loop,
    BorderStyle, Color, DpiInfo, Event, FileDialog, KeyCode, KeyEvent, MessageBoxButtons,
    MessageBoxIcon, MessageBoxResult, Modifiers, MouseButton, MouseEvent, RenderWindow, Renderer,
    Window,
};
