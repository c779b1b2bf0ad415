//! # Task Board API
//!
//! A minimal HTTP CRUD service for managing tasks on a board.
//!
//! This library provides:
//! - An HTTP API for task create/read/update/delete plus aggregate stats
//! - A health endpoint that reports the backing store's reachability
//! - A startup gate that refuses to bind the listener until the store is up
//!
//! ## Request Flow
//! 1. Process start: the startup gate probes the store, retrying on a fixed
//!    interval until a probe succeeds, then binds the listener
//! 2. Each request passes the origin policy, body parsing, and route dispatch
//! 3. Task handlers delegate to the storage collaborator and translate
//!    outcomes into HTTP statuses with JSON bodies
//!
//! ## Modules
//! - `api`: routing, handlers, origin policy, error mapping
//! - `storage`: the `TaskStore` trait and its SQLite implementation
//! - `startup`: the readiness gate
//! - `task`: the task entity and status vocabulary

pub mod api;
pub mod config;
pub mod startup;
pub mod storage;
pub mod task;

pub use config::Config;
