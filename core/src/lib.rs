//! Laboratory shift planning: automatic position and schedule-slot
//! assignment for technicians over a date range.

pub mod availability;
pub mod calendar;
pub mod catalog;
pub mod command;
pub mod config;
pub mod coverage;
pub mod directory;
pub mod engine;
pub mod error;
pub mod event;
pub mod leave;
pub mod ledger;
pub mod load;
pub mod snapshot;
pub mod store;
pub mod types;
