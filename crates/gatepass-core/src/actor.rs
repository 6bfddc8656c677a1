//! The authenticated caller and where their request came from.

use std::net::SocketAddr;

use serde::{Deserialize, Serialize};

use crate::models::user::User;

/// Placeholder for an unresolvable address or missing user agent.
pub const UNKNOWN: &str = "unknown";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientInfo {
    pub source_ip: String,
    pub user_agent: String,
}

impl Default for ClientInfo {
    fn default() -> Self {
        Self {
            source_ip: UNKNOWN.into(),
            user_agent: UNKNOWN.into(),
        }
    }
}

impl ClientInfo {
    /// Resolve the client address with precedence `X-Forwarded-For` (first
    /// hop) > `X-Real-IP` > `CF-Connecting-IP` > socket peer.
    pub fn resolve(
        forwarded_for: Option<&str>,
        real_ip: Option<&str>,
        cf_connecting_ip: Option<&str>,
        peer: Option<SocketAddr>,
        user_agent: Option<&str>,
    ) -> Self {
        let first_hop = forwarded_for.and_then(|v| v.split(',').next());
        let source_ip = [first_hop, real_ip, cf_connecting_ip]
            .into_iter()
            .flatten()
            .map(str::trim)
            .find(|v| !v.is_empty())
            .map(str::to_string)
            .or_else(|| peer.map(|p| p.ip().to_string()))
            .unwrap_or_else(|| UNKNOWN.into());

        let user_agent = user_agent
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .unwrap_or(UNKNOWN)
            .to_string();

        Self {
            source_ip,
            user_agent,
        }
    }
}

/// A resolved actor, attached to every authenticated request.
#[derive(Debug, Clone)]
pub struct ActorContext {
    pub user: User,
    pub client: ClientInfo,
}

impl ActorContext {
    pub fn new(user: User, client: ClientInfo) -> Self {
        Self { user, client }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn forwarded_for_wins_and_takes_first_hop() {
        let info = ClientInfo::resolve(
            Some(" 203.0.113.7 , 10.0.0.1"),
            Some("198.51.100.2"),
            Some("192.0.2.1"),
            Some("127.0.0.1:5000".parse().unwrap()),
            Some("curl/8.0"),
        );
        assert_eq!(info.source_ip, "203.0.113.7");
        assert_eq!(info.user_agent, "curl/8.0");
    }

    #[test]
    fn falls_through_headers_in_order() {
        let info = ClientInfo::resolve(None, Some("198.51.100.2"), Some("192.0.2.1"), None, None);
        assert_eq!(info.source_ip, "198.51.100.2");

        let info = ClientInfo::resolve(Some("  "), None, Some("192.0.2.1"), None, None);
        assert_eq!(info.source_ip, "192.0.2.1");
    }

    #[test]
    fn peer_then_unknown() {
        let info = ClientInfo::resolve(None, None, None, Some("10.1.2.3:443".parse().unwrap()), None);
        assert_eq!(info.source_ip, "10.1.2.3");
        assert_eq!(info.user_agent, UNKNOWN);

        let info = ClientInfo::resolve(None, None, None, None, Some(""));
        assert_eq!(info, ClientInfo::default());
    }
}
