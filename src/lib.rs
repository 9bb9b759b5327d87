//! Smartgrep - Interactive Code-Search Client
//!
//! Client-side session core for a code-search assistant: load a repository through an
//! index gateway, browse its file tree, and run free-text queries against one of several
//! retrieval models. Query tokens are matched back against each returned snippet to mark
//! the lines worth looking at.

pub mod cli;
pub mod client;
pub mod config;
pub mod error;
pub mod gateway;
pub mod highlight;
pub mod render;
pub mod session;
pub mod tree;
pub mod types;

pub use error::{Result, SmartgrepError};
