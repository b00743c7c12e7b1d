//! Engine: renderer processes, the wire codec, the worker pool, and the CLI host around them.

pub mod arg_parser;
pub mod cli;
pub mod pool;
pub mod preflight;
pub mod progress;
pub mod protocol;
pub mod tools;
pub mod worker;

// Re-export commonly used items
pub use arg_parser::Cli;
pub use cli::handle_run;
pub use pool::{PoolStats, WorkerPool};
pub use preflight::{check_importable, check_runner, resolve_executable};
pub use protocol::{RenderResponse, decode_response, encode_request};
pub use worker::{ListenerEvent, Worker};
