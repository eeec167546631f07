//! Database module: models, schema and the actor-backed store.
//!
//! Layout:
//! - `models.rs`: Rust structs mirroring DB rows
//! - `schema.rs`: SQL DDL for initializing the database (SQLite-first)
//! - `store.rs`: the [`Store`] contract the engine persists through
//! - `actor.rs`: `DbActor` owning the pool, and its [`Store`] handle

pub mod actor;
pub mod models;
pub mod schema;
pub mod store;

pub use models::{DbChainUser, DbRecurringBooking, DbSession};
pub use schema::SQLITE_INIT;
pub use store::Store;

pub use actor::{DbActorHandle, spawn};
