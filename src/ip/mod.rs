//! Client address resolution.
//!
//! Picks the best-guess originating address of a request from, in order,
//! `X-Forwarded-For`, `Client-IP` and the socket peer (or the CGI variables
//! `HTTP_X_FORWARDED_FOR`, `HTTP_CLIENT_IP`, `REMOTE_ADDR` when no request
//! context is available), and builds a lookup URL for it.
//!
//! The address is a hint for display and lookups only: the forwarding
//! headers are client-controlled.
//!
//! # Example
//!
//! ```
//! use sitekit::ip::{lookup_url, AddressResolver, RequestContext};
//!
//! let ctx = RequestContext::from_headers([("X-Forwarded-For", "203.0.113.5")]);
//! assert_eq!(AddressResolver::new().resolve_from(&ctx), "203.0.113.5");
//! assert_eq!(lookup_url(Some("203.0.113.5")), "http://whatismyipaddress.com/ip/203.0.113.5");
//! ```

mod context;
mod resolve;

pub use context::{AddressSource, RequestContext};
pub use resolve::{is_valid_address, lookup_url, resolve, AddressResolver};
