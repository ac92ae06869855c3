//! TCP listener and document-root dispatch.

pub mod docroot;
pub mod listener;
