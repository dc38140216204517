//! Client address resolution and lookup URLs.

use std::sync::LazyLock;

use log::debug;
use regex::Regex;

use super::context::{AddressSource, RequestContext};
use crate::config::{LOOKUP_BASE_URL, LOOPBACK_ADDRESS, MIN_ADDRESS_LEN};

/// Loose IPv4/IPv6 shape: at least seven hex digits, dots or colons.
static ADDRESS_SHAPE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(r"^[0-9A-Fa-f:.]{{{MIN_ADDRESS_LEN},}}$"))
        .expect("address shape pattern is valid")
});

/// Returns `true` if `candidate` looks like an IP address.
///
/// This is a shape check, not a parse: `999.1.1.1` passes, `::1` (too short)
/// and anything containing other characters fail.
pub fn is_valid_address(candidate: &str) -> bool {
    ADDRESS_SHAPE.is_match(candidate)
}

/// Picks the client address out of request candidates and builds lookup URLs.
#[derive(Debug, Clone)]
pub struct AddressResolver {
    base_url: String,
}

impl Default for AddressResolver {
    fn default() -> Self {
        Self {
            base_url: LOOKUP_BASE_URL.to_string(),
        }
    }
}

impl AddressResolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Uses `base_url` instead of the default lookup service.
    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Best guess at the originating address.
    ///
    /// Uses `request` when it carries any candidate, otherwise the process
    /// environment. Falls back to `127.0.0.1` when the winning candidate does
    /// not look like an address.
    pub fn resolve(&self, request: Option<&RequestContext>) -> String {
        match request.filter(|ctx| !ctx.is_empty()) {
            Some(ctx) => self.resolve_from(ctx),
            None => self.resolve_from(&RequestContext::from_env()),
        }
    }

    /// Resolves from `ctx` alone.
    ///
    /// The first non-empty candidate in priority order wins; for
    /// `X-Forwarded-For` only the first (client-most) hop of the list is used.
    /// The selected value is validated as is, so surrounding whitespace fails.
    pub fn resolve_from(&self, ctx: &RequestContext) -> String {
        let selected = ctx.candidates().into_iter().find_map(|(source, value)| {
            let value = value.filter(|v| !v.is_empty())?;
            let value = match source {
                AddressSource::ForwardedFor => value.split(',').next().unwrap_or(value),
                _ => value,
            };
            Some((source, value))
        });

        match selected {
            Some((source, address)) if is_valid_address(address) => {
                debug!("Client address {address} taken from {source:?}");
                address.to_string()
            }
            Some((source, address)) => {
                debug!("Rejected client address {address:?} from {source:?}; using loopback");
                LOOPBACK_ADDRESS.to_string()
            }
            None => {
                debug!("No client address candidates; using loopback");
                LOOPBACK_ADDRESS.to_string()
            }
        }
    }

    /// Lookup URL for `address`, resolving from the environment when it is
    /// missing or empty.
    pub fn lookup_url(&self, address: Option<&str>) -> String {
        let address = match address.filter(|a| !a.is_empty()) {
            Some(address) => address.to_string(),
            None => self.resolve(None),
        };
        format!("{}{}", self.base_url, address)
    }
}

/// [`AddressResolver::resolve`] with the default lookup service.
pub fn resolve(request: Option<&RequestContext>) -> String {
    AddressResolver::default().resolve(request)
}

/// [`AddressResolver::lookup_url`] with the default lookup service.
pub fn lookup_url(address: Option<&str>) -> String {
    AddressResolver::default().lookup_url(address)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_forwarded_for_beats_client_ip() {
        let ctx = RequestContext::new()
            .with_forwarded_for("203.0.113.5")
            .with_client_ip("198.51.100.7");
        assert_eq!(AddressResolver::new().resolve_from(&ctx), "203.0.113.5");
    }

    #[test]
    fn test_client_ip_beats_remote_addr() {
        let ctx = RequestContext::new()
            .with_client_ip("198.51.100.7")
            .with_remote_addr("192.0.2.1");
        assert_eq!(AddressResolver::new().resolve_from(&ctx), "198.51.100.7");
    }

    #[test]
    fn test_blank_candidate_is_skipped() {
        let ctx = RequestContext::new()
            .with_forwarded_for("")
            .with_remote_addr("198.51.100.9");
        assert_eq!(AddressResolver::new().resolve_from(&ctx), "198.51.100.9");
    }

    #[test]
    fn test_short_ipv6_falls_back_to_loopback() {
        let ctx = RequestContext::new().with_remote_addr("::1");
        assert_eq!(AddressResolver::new().resolve_from(&ctx), LOOPBACK_ADDRESS);
    }

    #[test]
    fn test_full_ipv6_is_kept_as_string() {
        let ctx = RequestContext::new().with_remote_addr("2001:db8::8a2e:370:7334");
        assert_eq!(
            AddressResolver::new().resolve_from(&ctx),
            "2001:db8::8a2e:370:7334"
        );
    }

    #[test]
    fn test_padded_candidate_is_rejected() {
        let ctx = RequestContext::new()
            .with_forwarded_for(" 203.0.113.5 ")
            .with_remote_addr("198.51.100.9");
        assert_eq!(AddressResolver::new().resolve_from(&ctx), LOOPBACK_ADDRESS);
    }

    #[test]
    fn test_forwarded_for_list_uses_first_hop() {
        let ctx = RequestContext::new().with_forwarded_for("203.0.113.5, 10.0.0.1, 10.0.0.2");
        assert_eq!(AddressResolver::new().resolve_from(&ctx), "203.0.113.5");
    }

    #[test]
    fn test_garbage_falls_back_to_loopback() {
        let ctx = RequestContext::new().with_forwarded_for("<script>alert(1)</script>");
        assert_eq!(AddressResolver::new().resolve_from(&ctx), LOOPBACK_ADDRESS);
        assert_eq!(
            AddressResolver::new().resolve_from(&RequestContext::new()),
            LOOPBACK_ADDRESS
        );
    }

    #[test]
    fn test_shape_check() {
        assert!(is_valid_address("192.0.2.1"));
        assert!(is_valid_address("fe80::1ff:fe23:4567:890a"));
        assert!(!is_valid_address("::1"));
        assert!(!is_valid_address("localhost"));
        assert!(!is_valid_address("192.0.2.1 "));
    }

    #[test]
    fn test_lookup_url_concatenates_address() {
        assert_eq!(
            lookup_url(Some("203.0.113.5")),
            "http://whatismyipaddress.com/ip/203.0.113.5"
        );
        let resolver = AddressResolver::with_base_url("https://ipinfo.example/");
        assert_eq!(
            resolver.lookup_url(Some("198.51.100.9")),
            "https://ipinfo.example/198.51.100.9"
        );
    }
}
