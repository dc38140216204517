//! Request context consulted for the client address.

use std::net::SocketAddr;

use crate::config::{
    ENV_CLIENT_IP, ENV_FORWARDED_FOR, ENV_REMOTE_ADDR, HEADER_CLIENT_IP, HEADER_FORWARDED_FOR,
    HEADER_X_CLIENT_IP,
};

/// Where a candidate address came from, in priority order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddressSource {
    /// `X-Forwarded-For` header / `HTTP_X_FORWARDED_FOR`
    ForwardedFor,
    /// `Client-IP` header / `HTTP_CLIENT_IP`
    ClientIp,
    /// Socket peer / `REMOTE_ADDR`
    RemoteAddr,
}

/// The three address candidates of one request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestContext {
    pub forwarded_for: Option<String>,
    pub client_ip: Option<String>,
    pub remote_addr: Option<String>,
}

impl RequestContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Collects candidates from request headers. Header names match
    /// case-insensitively; `X-Client-IP` is accepted as an alias of `Client-IP`.
    pub fn from_headers<I, K, V>(headers: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let mut ctx = Self::default();
        for (name, value) in headers {
            let name = name.as_ref().to_ascii_lowercase();
            let value = value.as_ref().to_string();
            match name.as_str() {
                HEADER_FORWARDED_FOR => {
                    ctx.forwarded_for.get_or_insert(value);
                }
                HEADER_CLIENT_IP | HEADER_X_CLIENT_IP => {
                    ctx.client_ip.get_or_insert(value);
                }
                _ => {}
            }
        }
        ctx
    }

    /// Collects candidates from the CGI-style environment variables.
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Collects candidates through an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        Self {
            forwarded_for: lookup(ENV_FORWARDED_FOR),
            client_ip: lookup(ENV_CLIENT_IP),
            remote_addr: lookup(ENV_REMOTE_ADDR),
        }
    }

    pub fn with_forwarded_for(mut self, value: impl Into<String>) -> Self {
        self.forwarded_for = Some(value.into());
        self
    }

    pub fn with_client_ip(mut self, value: impl Into<String>) -> Self {
        self.client_ip = Some(value.into());
        self
    }

    /// Sets the remote address as reported by the server (`REMOTE_ADDR`).
    pub fn with_remote_addr(mut self, value: impl Into<String>) -> Self {
        self.remote_addr = Some(value.into());
        self
    }

    /// Sets the remote address from the accepted socket's peer; the port is dropped.
    pub fn with_peer_addr(self, peer: SocketAddr) -> Self {
        self.with_remote_addr(peer.ip().to_string())
    }

    /// Candidates in priority order.
    pub fn candidates(&self) -> [(AddressSource, Option<&str>); 3] {
        [
            (AddressSource::ForwardedFor, self.forwarded_for.as_deref()),
            (AddressSource::ClientIp, self.client_ip.as_deref()),
            (AddressSource::RemoteAddr, self.remote_addr.as_deref()),
        ]
    }

    /// `true` when no candidate holds a non-empty value.
    pub fn is_empty(&self) -> bool {
        self.candidates()
            .iter()
            .all(|(_, value)| value.map_or(true, str::is_empty))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_from_headers_is_case_insensitive() {
        let ctx = RequestContext::from_headers([
            ("X-Forwarded-For", "203.0.113.5"),
            ("Client-IP", "198.51.100.7"),
            ("Accept", "text/html"),
        ]);
        assert_eq!(ctx.forwarded_for.as_deref(), Some("203.0.113.5"));
        assert_eq!(ctx.client_ip.as_deref(), Some("198.51.100.7"));
        assert!(ctx.remote_addr.is_none());
    }

    #[test]
    fn test_from_headers_keeps_first_occurrence() {
        let ctx = RequestContext::from_headers(vec![
            ("x-client-ip".to_string(), "198.51.100.1".to_string()),
            ("client-ip".to_string(), "198.51.100.2".to_string()),
        ]);
        assert_eq!(ctx.client_ip.as_deref(), Some("198.51.100.1"));
    }

    #[test]
    fn test_from_lookup_reads_cgi_names() {
        let vars: HashMap<&str, &str> =
            [("REMOTE_ADDR", "192.0.2.10"), ("HTTP_CLIENT_IP", "192.0.2.11")]
                .into_iter()
                .collect();
        let ctx = RequestContext::from_lookup(|name| vars.get(name).map(|v| v.to_string()));
        assert!(ctx.forwarded_for.is_none());
        assert_eq!(ctx.client_ip.as_deref(), Some("192.0.2.11"));
        assert_eq!(ctx.remote_addr.as_deref(), Some("192.0.2.10"));
    }

    #[test]
    fn test_is_empty_ignores_empty_values() {
        assert!(RequestContext::new().is_empty());
        assert!(RequestContext::new().with_client_ip("").is_empty());
        assert!(!RequestContext::new().with_client_ip(" ").is_empty());
        assert!(!RequestContext::new()
            .with_remote_addr("192.0.2.1")
            .is_empty());
    }

    #[test]
    fn test_peer_addr_drops_port() {
        let v4: SocketAddr = "192.0.2.1:8080".parse().unwrap();
        let ctx = RequestContext::new().with_peer_addr(v4);
        assert_eq!(ctx.remote_addr.as_deref(), Some("192.0.2.1"));

        let v6: SocketAddr = "[2001:db8::1]:443".parse().unwrap();
        let ctx = RequestContext::new().with_peer_addr(v6);
        assert_eq!(ctx.remote_addr.as_deref(), Some("2001:db8::1"));
    }
}
