//! Rental inquiry wizard and lead-gated chat assistant behind the MapleLeaf Rentals site.
//!
//! The [`workflows::inquiry`] module drives the five-step application form and ships the
//! finished record to the intake webhook. The [`workflows::chat`] module gates the rental
//! assistant behind lead capture and relays questions to the hosted chat model.

pub mod config;
pub mod error;
pub mod telemetry;
pub mod webhook;
pub mod workflows;
