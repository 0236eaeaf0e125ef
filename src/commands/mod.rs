//! Workflows that combine the importers, the estimator and the store.
//! Every error reaches the caller as a `String`.

pub mod estimation;
pub mod import;
