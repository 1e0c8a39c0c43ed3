//! CLI module for the coding-context command-line interface

pub mod args;
pub mod commands;
