//! Udyog server library.
//!
//! Serves the embeddable chatbot widget API, runs the AI sales assistant
//! behind it, and exposes the operator dashboard API for live handoffs.
//!
//! # External services
//!
//! - Claude API (assistant replies)
//! - Clerk Backend API (operator identity)
//! - SMTP (handoff notifications)

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod claude;
pub mod config;
pub mod db;
pub mod error;
pub mod identity;
pub mod middleware;
pub mod models;
pub mod realtime;
pub mod routes;
pub mod services;
pub mod state;
