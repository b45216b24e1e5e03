//! Platform implementations
//!
//! Only Win32 is supported; the module exists to keep every `unsafe` OS call
//! in one place.

pub mod win32;
