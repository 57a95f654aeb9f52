//! Request middleware.

pub(crate) mod security;
pub(crate) mod session;
