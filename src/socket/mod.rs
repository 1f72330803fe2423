//! Connection establishment.
//!
//! - [`connectjob`]: DNS → TCP → TLS connection flow, stamping timings
//! - [`stream`]: socket wrapper that stamps write/read milestones
//! - [`tls`]: TLS configuration with BoringSSL

pub mod client;
pub mod connectjob;
pub mod stream;
pub mod tls;
