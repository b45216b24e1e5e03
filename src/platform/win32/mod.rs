//! Win32 platform implementation

pub mod dialogs;
pub mod dpi;
pub mod event;
pub mod render;
pub mod window;

pub use dialogs::{message_box, FileDialog, MessageBoxButtons, MessageBoxIcon, MessageBoxResult};
pub use dpi::{enable_dpi_awareness, DpiInfo};
pub use event::{
    post_quit, pump_messages, run_message_loop, translate_message, Event, KeyCode, KeyEvent,
    Modifiers, MouseButton, MouseEvent,
};
pub use render::{rect, Color, RenderWindow, Renderer};
pub use window::{class_is_registered, BorderStyle, Window};
