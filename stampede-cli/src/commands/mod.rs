//! Command handlers

pub mod bench;
pub mod config;
