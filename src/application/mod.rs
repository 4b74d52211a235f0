//! Application layer: the place-order engine.
//!
//! `PlaceOrderHandler` is the entry point. It loads the session's process,
//! runs states through the `StateRegistry` until one suspends or the process
//! finishes, and unwinds the rollback ledger when a state fails or the
//! customer cancels.

pub mod handler;
mod locks;
pub mod registry;
pub mod rollback;
pub mod states;
