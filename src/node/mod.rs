//! Node Module
//!
//! Ties the directory, blob store, and overlay into one running process and
//! exposes the client operations on top of them.
//!
//! ## Data Path
//! - **Store**: keep the bytes locally, then let the overlay advertise them at the key's root.
//! - **Get**: ask the root who advertises the key, then read from the first replica that answers.
//! - **Remove**: drop the local copy; the root forgets it once the advertisement lapses.

pub mod handlers;
pub mod protocol;
pub mod server;
pub mod tapestry;

pub use tapestry::Tapestry;
