//! SMM panel API: backend for buying social-media engagement and earning it back.
//!
//! This crate provides the REST API for:
//! - registration, login and bearer-token sessions
//! - engagement orders paid from an internal balance ledger
//! - micro-tasks that deliver those orders, reviewed and paid out on approval
//! - analytics, devices, connected social accounts and disputes
//! - the role-gated admin API used by operators

pub mod auth;
pub mod config;
pub mod db;
pub mod entities;
pub mod error;
pub mod extract;
pub mod maintenance;
pub mod routes;
pub mod services;
pub mod state;
