//! Translate-and-relay pipeline
//!
//! Posts from the source channel go through [`gate::SourceGate`], are
//! classified once by [`classifier::classify`], translated per destination by
//! [`translation::TranslationService`] and delivered by
//! [`dispatcher::FanoutDispatcher`]. [`pipeline::RelayPipeline`] ties them
//! together.

pub mod classifier;
pub mod dispatcher;
pub mod gate;
pub mod pipeline;
pub mod translation;

#[cfg(test)]
pub(crate) mod testing;
