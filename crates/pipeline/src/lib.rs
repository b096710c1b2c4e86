//! Request pipeline: command routing and the per-request state machine that
//! drives validation, metadata lookup, staging, conversion, delivery and
//! cleanup.

// A panicking adapter fails only its own request, which needs unwinding.
#[cfg(panic = "abort")]
compile_error!("reelbot-pipeline must be built with panic = \"unwind\"");

pub mod command;
pub mod context;
pub mod error;
pub mod pipeline;
pub mod replies;
pub mod request;

pub use {
    command::{COMMANDS, Command, command_mention, detect_link, parse_command},
    context::{PipelineContext, PipelineSettings},
    error::{ErrorKind, PipelineError, Result},
    pipeline::{Pipeline, RunReport},
    request::{Mode, Request, Stage},
};
