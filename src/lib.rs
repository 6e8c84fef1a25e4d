//! # farewatch
//!
//! A weekend flight-fare monitor. farewatch plans round-trip searches that
//! match weekend travel patterns (depart Thursday or Friday, return Sunday
//! or Monday), filters and ranks the raw results, tracks best prices across
//! runs in a SQLite ledger, and delivers a ranked report by email.
//!
//! ## Pipeline
//!
//! ```text
//! ┌─────────┐   ┌───────┐   ┌───────────┐   ┌────────┐   ┌────────────┐
//! │ Planner │──▶│ Fetch │──▶│ Normalize │──▶│  Rank  │──▶│ Aggregate  │
//! └─────────┘   └───────┘   └───────────┘   └───┬────┘   └─────┬──────┘
//!                                               │              │
//!                                          ┌────▼──────┐  ┌────▼────┐
//!                                          │  History  │  │  Email  │
//!                                          │ (SQLite)  │  │ (SMTP)  │
//!                                          └───────────┘  └─────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```bash
//! farewatch init                  # create the history database
//! farewatch plan                  # show the queries the next run executes
//! farewatch run                   # fetch, rank, record, email
//! farewatch run --dry-run         # fetch and rank without writing/sending
//! farewatch history <key>         # price ledger for one key
//! farewatch stats                 # database overview
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration parsing |
//! | [`models`] | Core data types |
//! | [`planner`] | Weekend query planning |
//! | [`fetch`] | Flight-search HTTP client |
//! | [`normalize`] | Raw payload normalization |
//! | [`rank`] | Filtering and top-N ranking |
//! | [`history`] | Durable price history |
//! | [`report`] | Report aggregation |
//! | [`email`] | HTML rendering and SMTP delivery |
//! | [`run`] | Pipeline orchestration |
//! | [`db`] | Database connection |
//! | [`migrate`] | Schema migrations |

pub mod config;
pub mod db;
pub mod email;
pub mod fetch;
pub mod history;
pub mod migrate;
pub mod models;
pub mod normalize;
pub mod planner;
pub mod rank;
pub mod report;
pub mod run;
pub mod stats;
