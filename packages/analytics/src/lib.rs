#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Aggregation and scoring stages of the migration pipeline.
//!
//! - [`trend`] derives an Up/Down label per pincode from monthly
//!   demographic totals.
//! - [`aggregate`] collapses both datasets to one row per geography and
//!   outer-joins them.
//! - [`score`] computes the migration score and its percentile-normalized
//!   intensity.
//! - [`summary`] condenses the scored rows into headline figures for the
//!   run log.
//!
//! Every function here is pure: inputs are borrowed or consumed, and a new
//! collection is returned.

pub mod aggregate;
pub mod score;
pub mod summary;
pub mod trend;
