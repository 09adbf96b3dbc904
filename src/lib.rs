//! duty-dispatch - per-item dispatch of validator duty artifacts
//!
//! Sends produced attestations and aggregate-and-proofs to a beacon node one
//! artifact at a time, concurrently, and folds the per-item outcomes into a
//! single result for the duty.

pub mod api;
pub mod config;
pub mod duties;
pub mod replay;
pub mod sending;
pub mod types;
pub mod utils;
