//! Service layer
//!
//! This module contains service classes that separate infrastructure
//! concerns (file I/O, encoding) from the enhancement logic itself,
//! improving testability and maintainability.

pub mod format;
pub mod io;

pub use format::OutputEncoder;
pub use io::ImageIOService;
