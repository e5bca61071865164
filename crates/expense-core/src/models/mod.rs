//! Data models for expense analysis results.

pub mod config;
pub mod expense;
pub mod geometry;
