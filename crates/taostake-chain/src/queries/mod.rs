//! Chain query implementations.

pub mod account;
pub mod stake;
