//! Transport-facing adapters: the checkout controller and the CSV command
//! script used by the CLI.

pub mod controller;
pub mod csv;
pub mod script;
