//! State module for tracking crawl progress
//!
//! `VisitState` tracks each URL a mirroring session has taken from its work
//! stack (visiting, saved, skipped, failed).

mod visit_state;

pub use visit_state::VisitState;
