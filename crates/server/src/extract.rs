use axum::async_trait;
use axum::extract::{ConnectInfo, FromRequestParts};
use axum::http::request::Parts;
use axum::http::{header, Extensions, HeaderMap};
use cohortgate_core::{
    AUTHORIZATION_HEADER, FORWARDED_FOR_HEADER, REAL_IP_HEADER, USER_AGENT_HEADER,
};
use cohortgate_security::RequestMeta;
use std::convert::Infallible;
use std::net::{IpAddr, SocketAddr};

/// Collect what the authorization core needs from a request's headers and
/// connection info
pub fn request_meta(headers: &HeaderMap, extensions: &Extensions) -> RequestMeta {
    let text = |name: &str| {
        headers
            .get(name)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string)
    };

    let cookies: Vec<&str> = headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .collect();

    RequestMeta {
        authorization: text(AUTHORIZATION_HEADER),
        cookies: (!cookies.is_empty()).then(|| cookies.join("; ")),
        forwarded_for: text(FORWARDED_FOR_HEADER),
        real_ip: text(REAL_IP_HEADER),
        user_agent: text(USER_AGENT_HEADER),
        peer: peer_address(extensions),
    }
}

pub fn peer_address(extensions: &Extensions) -> Option<IpAddr> {
    extensions
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip())
}

/// Extractor handing handlers the request's [`RequestMeta`]
#[derive(Debug, Clone)]
pub struct ClientMeta(pub RequestMeta);

#[async_trait]
impl<S> FromRequestParts<S> for ClientMeta
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(ClientMeta(request_meta(&parts.headers, &parts.extensions)))
    }
}
