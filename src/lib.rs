//! Admin analytics for a challenge platform: user growth, engagement tiers,
//! per-challenge solve statistics, signup traffic, the leaderboard, and
//! submission success estimates.

pub mod chdb;
pub mod config;
pub mod envelope;
pub mod error;
pub mod metrics;
pub mod models;
pub mod server;
