//! tasksync - import remote tracker issues into a local task store.
//!
//! The library lists a project's issues, works out for each one whether the
//! local store already holds a task for it, and creates the task when it does
//! not. The local store is only ever driven through its command line.

#![forbid(unsafe_code)]

pub mod collection;
pub mod domain;
pub mod error;
pub mod process;
pub mod remote;
pub mod store;
pub mod sync;

pub mod app;
pub mod cli;
pub mod commands;
pub mod config;
pub mod output;

pub use error::{Error, Result};
