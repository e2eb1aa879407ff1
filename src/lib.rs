pub mod commands;
pub mod diff;
pub mod http;
pub mod package;
pub mod runtime;
pub mod source;
