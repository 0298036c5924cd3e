//! Gantt task-tree generation.
//!
//! Turns a flat, arbitrarily ordered set of parent-pointer records into an
//! ordered, indented task list: projects take their schedule from their leaf
//! descendants, siblings keep their input order, and colors, predecessor
//! links and collapse state are resolved and cached across passes.

pub mod cache;
pub mod cli;
pub mod config;
pub mod error;
pub mod format;
pub mod generator;
pub mod hierarchy;
pub mod logging;
pub mod schedule;
pub mod store;
pub mod theme;
pub mod types;
