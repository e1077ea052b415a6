//! Dispatcher: generic CRUD routed by resource identifier.

mod dispatch;
pub use dispatch::Dispatcher;
