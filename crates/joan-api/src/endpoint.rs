// Server endpoint normalization
//
// Visionect servers are usually addressed by bare IP or hostname in local
// deployments. This module turns whatever the operator typed into a proper
// base URL: scheme defaults to http, port defaults to 8081, bare IPv6
// hosts get bracketed.

use std::fmt;
use std::net::Ipv6Addr;

use url::Url;

use crate::error::Error;

/// Default Visionect management API port.
pub const DEFAULT_PORT: u16 = 8081;

/// Normalized base URL of a Visionect server. Immutable once constructed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerEndpoint {
    url: Url,
}

impl ServerEndpoint {
    /// Parse and normalize a server address.
    ///
    /// Accepted inputs: `192.168.1.50`, `joan.local:8081`, `::1`,
    /// `https://joan.example.com`, `http://[fd00::5]:9000`.
    pub fn parse(raw: &str) -> Result<Self, Error> {
        let raw = raw.trim();
        if raw.is_empty() {
            return Err(Error::InvalidEndpoint {
                input: raw.to_owned(),
                reason: "empty server address".into(),
            });
        }

        let (scheme, rest) = match raw.split_once("://") {
            Some(("http", rest)) => ("http", rest),
            Some(("https", rest)) => ("https", rest),
            Some((other, _)) => {
                return Err(Error::InvalidEndpoint {
                    input: raw.to_owned(),
                    reason: format!("unsupported scheme '{other}'"),
                });
            }
            None => ("http", raw),
        };

        let hostport = Self::normalize_hostport(rest);
        let full = format!("{scheme}://{hostport}");

        let url = Url::parse(&full).map_err(|e| Error::InvalidEndpoint {
            input: raw.to_owned(),
            reason: e.to_string(),
        })?;

        if url.host_str().is_none() {
            return Err(Error::InvalidEndpoint {
                input: raw.to_owned(),
                reason: "missing host".into(),
            });
        }

        Ok(Self { url })
    }

    /// Bracket bare IPv6 hosts and append the default port where absent.
    fn normalize_hostport(rest: &str) -> String {
        let rest = rest.trim_end_matches('/');

        // Bare IPv6 address: every colon belongs to the address itself.
        if rest.parse::<Ipv6Addr>().is_ok() {
            return format!("[{rest}]:{DEFAULT_PORT}");
        }

        // Bracketed IPv6, with or without a port.
        if let Some(bracket_end) = rest.strip_prefix('[').and_then(|r| r.find(']')) {
            let after = &rest[bracket_end + 2..];
            if after.starts_with(':') {
                return rest.to_owned();
            }
            return format!("{rest}:{DEFAULT_PORT}");
        }

        // Hostname or IPv4, optionally with an explicit port.
        match rest.rsplit_once(':') {
            Some((_, port)) if port.chars().all(|c| c.is_ascii_digit()) && !port.is_empty() => {
                rest.to_owned()
            }
            _ => format!("{rest}:{DEFAULT_PORT}"),
        }
    }

    /// The normalized base URL.
    pub fn url(&self) -> &Url {
        &self.url
    }

    /// Join an absolute API path (e.g. `/api/ping`) onto the base URL.
    pub fn join(&self, path: &str) -> Result<Url, Error> {
        self.url.join(path).map_err(|e| Error::InvalidEndpoint {
            input: path.to_owned(),
            reason: e.to_string(),
        })
    }
}

impl fmt::Display for ServerEndpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Url adds a trailing slash to the root path; strip it for display.
        write!(f, "{}", self.url.as_str().trim_end_matches('/'))
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;

    fn base(input: &str) -> String {
        ServerEndpoint::parse(input).unwrap().to_string()
    }

    #[test]
    fn bare_ipv4_gets_scheme_and_port() {
        assert_eq!(base("192.168.1.50"), "http://192.168.1.50:8081");
    }

    #[test]
    fn bare_ipv6_gets_bracketed() {
        assert_eq!(base("::1"), "http://[::1]:8081");
    }

    #[test]
    fn bracketed_ipv6_port_preserved() {
        assert_eq!(base("[fd00::5]:9000"), "http://[fd00::5]:9000");
    }

    #[test]
    fn explicit_port_preserved() {
        assert_eq!(base("joan.local:8082"), "http://joan.local:8082");
    }

    #[test]
    fn https_scheme_preserved() {
        assert_eq!(base("https://joan.example.com"), "https://joan.example.com:8081");
    }

    #[test]
    fn trailing_slash_tolerated() {
        assert_eq!(base("http://192.168.1.50/"), "http://192.168.1.50:8081");
    }

    #[test]
    fn unsupported_scheme_rejected() {
        assert!(ServerEndpoint::parse("ftp://host").is_err());
        assert!(ServerEndpoint::parse("").is_err());
    }

    #[test]
    fn join_builds_api_urls() {
        let ep = ServerEndpoint::parse("192.168.1.50").unwrap();
        let url = ep.join("/api/device").unwrap();
        assert_eq!(url.as_str(), "http://192.168.1.50:8081/api/device");
    }
}
