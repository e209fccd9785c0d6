//! User interface module.
//!
//! - `formatter` - styled status lines and help text

pub mod formatter;

pub use formatter::{display_boundary_warning, display_error, display_success, format_usage};
