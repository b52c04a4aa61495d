//! Record provider implementations

pub mod spool;

pub use spool::SpoolProvider;
