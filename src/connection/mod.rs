//! Asynchronous connections that follow unified2 sources

pub mod spool;


pub use spool::SpoolConnection;
