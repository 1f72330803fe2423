//! DNS resolution.
//!
//! The [`Resolve`] trait is the seam the connect path resolves host names
//! through. [`GaiResolver`] uses the system resolver;
//! [`DnsResolverWithOverrides`] pins chosen host names to fixed addresses,
//! which is how tests reach local servers under arbitrary names.

mod gai;
mod resolve;

pub use gai::GaiResolver;
pub use resolve::{Addrs, DnsResolverWithOverrides, Name, Resolve, Resolving};
