//! Source-address allowlist for the payment gateway callback route.

use std::net::{IpAddr, SocketAddr};
use std::task::{Context, Poll};

use axum::extract::connect_info::ConnectInfo;
use axum::http::{HeaderMap, Request, StatusCode};
use axum::response::{IntoResponse, Response};
use tower::{Layer, Service};

use crate::config::AllowedIps;

#[derive(Clone, Debug)]
pub struct IpFilterLayer {
    allowed_ips: AllowedIps,
}

impl IpFilterLayer {
    pub fn new(allowed_ips: AllowedIps) -> Self {
        Self { allowed_ips }
    }
}

impl<S> Layer<S> for IpFilterLayer {
    type Service = IpFilterService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        IpFilterService {
            inner,
            allowed_ips: self.allowed_ips.clone(),
        }
    }
}

#[derive(Clone, Debug)]
pub struct IpFilterService<S> {
    inner: S,
    allowed_ips: AllowedIps,
}

impl<S, B> Service<Request<B>> for IpFilterService<S>
where
    S: Service<Request<B>, Response = Response> + Clone + Send + 'static,
    S::Future: Send + 'static,
    B: Send + 'static,
{
    type Response = S::Response;
    type Error = S::Error;
    type Future = futures_util::future::BoxFuture<'static, Result<Self::Response, Self::Error>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, req: Request<B>) -> Self::Future {
        let client_ip = extract_client_ip(req.headers(), req.extensions());
        let allowed = match client_ip {
            Some(ip) => self.allowed_ips.is_allowed(ip),
            None => matches!(self.allowed_ips, AllowedIps::Any),
        };

        if !allowed {
            tracing::warn!(client_ip = ?client_ip, "callback blocked: address not on the allowlist");
            let response = StatusCode::FORBIDDEN.into_response();
            return Box::pin(async move { Ok(response) });
        }

        let mut inner = self.inner.clone();
        Box::pin(async move { inner.call(req).await })
    }
}

fn extract_client_ip(headers: &HeaderMap, extensions: &axum::http::Extensions) -> Option<IpAddr> {
    if let Some(ConnectInfo(addr)) = extensions.get::<ConnectInfo<SocketAddr>>() {
        return Some(addr.ip());
    }

    // Behind a proxy the socket address is the proxy's; take the last
    // X-Forwarded-For hop, the one our own proxy appended.
    headers
        .get("x-forwarded-for")
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.split(',').last())
        .and_then(|value| value.trim().parse().ok())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn prefers_the_socket_address() {
        let mut extensions = axum::http::Extensions::new();
        extensions.insert(ConnectInfo::<SocketAddr>("10.0.0.5:443".parse().unwrap()));
        let mut headers = HeaderMap::new();
        headers.insert("x-forwarded-for", HeaderValue::from_static("203.0.113.9"));

        assert_eq!(
            extract_client_ip(&headers, &extensions),
            Some("10.0.0.5".parse().unwrap())
        );
    }

    #[test]
    fn falls_back_to_the_last_forwarded_hop() {
        let extensions = axum::http::Extensions::new();
        let mut headers = HeaderMap::new();
        headers.insert(
            "x-forwarded-for",
            HeaderValue::from_static("203.0.113.9, 10.0.0.1"),
        );

        assert_eq!(
            extract_client_ip(&headers, &extensions),
            Some("10.0.0.1".parse().unwrap())
        );
    }

    #[test]
    fn no_address_yields_none() {
        assert_eq!(
            extract_client_ip(&HeaderMap::new(), &axum::http::Extensions::new()),
            None
        );
    }
}
