// Integration tests for client address resolution.

use std::collections::HashMap;

use sitekit::ip::{is_valid_address, lookup_url, AddressResolver, RequestContext};

#[test]
fn test_forwarded_for_has_priority_over_client_ip() {
    let ctx = RequestContext::from_headers([
        ("Client-IP", "198.51.100.7"),
        ("X-Forwarded-For", "203.0.113.5"),
    ]);
    assert_eq!(sitekit::resolve(Some(&ctx)), "203.0.113.5");
}

#[test]
fn test_remote_addr_used_when_headers_absent() {
    let ctx = RequestContext::from_headers([("Host", "example.com")])
        .with_remote_addr("198.51.100.9");
    assert_eq!(sitekit::resolve(Some(&ctx)), "198.51.100.9");
}

#[test]
fn test_short_loopback_ipv6_is_replaced() {
    let ctx = RequestContext::new().with_remote_addr("::1");
    assert_eq!(sitekit::resolve(Some(&ctx)), "127.0.0.1");
}

#[test]
fn test_proxy_chain_resolves_to_first_hop() {
    let ctx = RequestContext::from_headers([("x-forwarded-for", "192.0.2.44, 198.51.100.1")])
        .with_remote_addr("10.0.0.3");
    assert_eq!(sitekit::resolve(Some(&ctx)), "192.0.2.44");
}

#[test]
fn test_cgi_variables_follow_same_priority() {
    let vars: HashMap<&str, &str> = [
        ("HTTP_CLIENT_IP", "198.51.100.7"),
        ("REMOTE_ADDR", "192.0.2.1"),
    ]
    .into_iter()
    .collect();
    let ctx = RequestContext::from_lookup(|name| vars.get(name).map(|v| v.to_string()));
    assert_eq!(AddressResolver::new().resolve_from(&ctx), "198.51.100.7");
}

#[test]
fn test_resolved_address_always_passes_validation() {
    let inputs = ["203.0.113.5", "::1", "", "not-an-ip", "2001:db8::1", "1.1.1.1"];
    for input in inputs {
        let ctx = RequestContext::new().with_forwarded_for(input);
        let address = AddressResolver::new().resolve_from(&ctx);
        assert!(is_valid_address(&address), "{input:?} resolved to {address:?}");
    }
}

#[test]
fn test_lookup_url_for_explicit_address() {
    assert_eq!(
        lookup_url(Some("198.51.100.9")),
        "http://whatismyipaddress.com/ip/198.51.100.9"
    );
}

#[test]
fn test_lookup_url_without_address_uses_resolved_one() {
    let url = lookup_url(None);
    let address = url
        .strip_prefix("http://whatismyipaddress.com/ip/")
        .expect("lookup URL keeps the base");
    assert!(is_valid_address(address));
}

#[test]
fn test_socket_peer_resolves_without_port() {
    let peer: std::net::SocketAddr = "198.51.100.9:50412".parse().unwrap();
    let ctx = RequestContext::from_headers([("Accept", "*/*")]).with_peer_addr(peer);
    assert_eq!(sitekit::resolve(Some(&ctx)), "198.51.100.9");
}

#[test]
fn test_whitespace_around_header_value_is_not_trimmed() {
    let ctx = RequestContext::from_headers([("X-Forwarded-For", "203.0.113.5 ")]);
    assert_eq!(sitekit::resolve(Some(&ctx)), "127.0.0.1");
}
