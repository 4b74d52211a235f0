//! The canonical place-order states.

mod await_payment;
mod create_payment;
mod persist_order;
mod terminal;
mod validate_cart;

pub use await_payment::AwaitPaymentConfirmation;
pub use create_payment::CreatePayment;
pub use persist_order::PersistOrder;
pub use terminal::{Failed, Success};
pub use validate_cart::ValidateCart;
