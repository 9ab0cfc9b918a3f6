//! Billing API - subscription and payments control plane.
//!
//! Users bind payment cards through an external gateway, buy time-bounded
//! plans, and receive role upgrades and notifications as their
//! subscriptions move through the lifecycle.

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;
