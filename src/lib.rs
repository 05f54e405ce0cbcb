pub mod application;
pub mod archive;
pub mod commands;
pub mod config;
pub mod error;
pub mod package;
pub mod remote;
pub mod runtime;
