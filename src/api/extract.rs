//! Custom request extractors.

use std::convert::Infallible;
use std::net::SocketAddr;

use axum::extract::{ConnectInfo, FromRequestParts};
use axum::http::request::Parts;

use crate::domain::rate_limiter::UNKNOWN_CLIENT_KEY;
use crate::state::AppState;
use crate::utils::client_ip::resolve_client_ip;

/// Originating client address of the current request, if known.
///
/// Honours forwarding headers only when [`AppState::behind_proxy`] is set.
/// Never rejects: a request without connection info and without trusted
/// headers yields `ClientAddr(None)`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientAddr(pub Option<String>);

impl ClientAddr {
    /// Key used for per-client rate limiting.
    pub fn rate_limit_key(&self) -> &str {
        self.0.as_deref().unwrap_or(UNKNOWN_CLIENT_KEY)
    }
}

impl FromRequestParts<AppState> for ClientAddr {
    type Rejection = Infallible;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let peer = parts
            .extensions
            .get::<ConnectInfo<SocketAddr>>()
            .map(|ConnectInfo(addr)| *addr);

        Ok(ClientAddr(resolve_client_ip(
            &parts.headers,
            peer,
            state.behind_proxy,
        )))
    }
}
