//! Command-line layer.
//!
//! - [options]: the declarative command table
//! - [args]: argument resolution into an [args::ArgumentIndex]
//! - [dispatch]: command selection, validation and the handler table
//! - [handlers]: one function per command

pub mod args;
pub mod dispatch;
pub mod handlers;
pub mod options;

pub use args::{resolve, ArgumentIndex};
pub use dispatch::{Dispatcher, Request, Response};
pub use handlers::Outcome;
pub use options::{CliOption, CommandKind, Registry};
