//! # PIEM API Server Library
//!
//! REST API of the Personal Inventory & Expenses Manager: validated CRUD
//! over users, categories, inventory items and suppliers, kept in a
//! document store.
//!
//! ## Modules
//!
//! - `app`: Application state and router builder
//! - `bootstrap`: Startup admin account
//! - `config`: Configuration management
//! - `error`: Error handling and HTTP response mapping
//! - `middleware`: Sessions, security headers, error details
//! - `routes`: API route handlers

pub mod app;
pub mod bootstrap;
pub mod config;
pub mod error;
pub mod middleware;
pub mod routes;
