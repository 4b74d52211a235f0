//! Domain model of the place-order process.
//!
//! Holds the persisted aggregate (`Process`), the cart snapshot it is built
//! from, the payment status model and the ports through which states reach
//! external collaborators. Nothing in here performs I/O.

pub mod cart;
pub mod payment;
pub mod ports;
pub mod process;
pub mod state;
