//! Backend worker thread and the command type it consumes.

pub mod commands;
pub mod runtime;
