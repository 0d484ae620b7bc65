//! Direct chat feature, independent of the relay

pub mod responder;

pub use responder::ChatResponder;
