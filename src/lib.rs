//! Core library for the `logrelay` CLI.
//!
//! This crate provides the building blocks used by the binary: CLI argument
//! types, configuration parsing, the access-log metrics parser, and the
//! Loki/InfluxDB/SQLite sinks. The primary user-facing interface is the
//! `logrelay` command-line application; library APIs may evolve as the CLI
//! grows.
pub mod args;
pub mod config;
pub mod error;
pub mod parser;
pub mod sinks;
