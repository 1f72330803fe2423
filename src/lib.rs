//! # sqlhttp
//!
//! An HTTP transaction engine for embedding in a SQL host.
//!
//! `sqlhttp` turns textual request parts (method, URL, a header block in
//! wire format, a body and a JSON cookie object) into HTTP/1.1 exchanges
//! and exposes the outcome as scalar values or as rows.
//!
//! ## Features
//!
//! - **Header codec**: wire-format header blocks with order and
//!   multiplicity preserved, case-insensitive lookup
//! - **Cookie codec**: JSON cookie objects merged into a single `Cookie`
//!   header
//! - **Governor**: process-wide minimum dispatch spacing and per-request
//!   timeout, adjustable at runtime
//! - **Timings**: per-phase timestamps (DNS, connect, TLS, first byte, body)
//! - **Rows**: one-row transaction cursors and a header enumeration cursor
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use sqlhttp::rows::RowCursor;
//! use sqlhttp::Client;
//!
//! let client = Client::builder().build()?;
//! let mut row = client.get("https://example.com/", "", "")?;
//! while row.next() {
//!     println!("{}", row.column_by_name("response_status")?);
//! }
//! # Ok::<(), sqlhttp::HttpError>(())
//! ```
//!
//! ## Modules
//!
//! - [`base`] - Error definitions and transaction timings
//! - [`cookies`] - Cookie object encoding and `Cookie` header merging
//! - [`dns`] - Host name resolution and overrides
//! - [`functions`] - Host-facing scalar and table-valued entry points
//! - [`governor`] - Shared rate limit and timeout
//! - [`http`] - Headers, requests, responses and transactions
//! - [`rows`] - Row cursors handed to the host
//! - [`socket`] - TCP/TLS connect path

pub mod base;
pub mod client;
pub mod cookies;
pub mod dns;
pub mod functions;
pub mod governor;
pub mod http;
pub mod rows;
pub mod socket;

pub use base::neterror::{HttpError, Result, TransportKind};
pub use client::{Client, ClientBuilder, Projected, Projection};
pub use governor::{Governor, GovernorConfig};
pub use http::{HeaderSet, RequestParams, RequestSpec, TransactionResult};
