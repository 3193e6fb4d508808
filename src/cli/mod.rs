//! The `incydr` command-line interface.
//!
//! - [`args`]: the clap command tree.
//! - [`commands`]: one handler per resource group.
//! - [`output`]: `--format` / `--columns` rendering.
//! - [`input`]: bulk input files (`--file`).

pub mod args;
pub mod commands;
pub mod input;
pub mod output;
