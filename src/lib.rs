//! Shift-hour scheduling and output aggregation engine.
//!
//! This crate plans a factory worker's day as a sequence of fixed hour slots,
//! records the output reported for each slot and rolls planned and actual
//! output up through groups, teams, departments and offices.
//!
//! The write path lives in [`service`], the read-side math in
//! [`aggregation`] and [`report`], and [`api`] exposes both over HTTP.

#![warn(missing_docs)]

pub mod aggregation;
pub mod api;
pub mod config;
pub mod directory;
pub mod error;
pub mod models;
pub mod notify;
pub mod report;
pub mod schedule;
pub mod service;
pub mod store;
