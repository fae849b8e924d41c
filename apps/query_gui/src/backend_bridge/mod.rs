//! Worker side of the GUI: commands queued from the UI and the runtime that serves them.

pub mod commands;
pub mod runtime;
