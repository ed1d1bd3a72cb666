// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use axum::async_trait;
use axum::extract::FromRequestParts;
use axum::http::HeaderMap;
use axum::http::request::Parts;
use std::convert::Infallible;

use crate::context::Context;

/// Switches the acting user for one request.
pub const IMPERSONATE_HEADER: &str = "x-impersonate";
pub const FORWARDED_FOR_HEADER: &str = "x-forwarded-for";

/// Acting identity of the request: `default-user` unless impersonated.
#[derive(Debug, Clone)]
pub struct Acting(pub Context);

fn header<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
}

impl Acting {
    pub fn from_headers(headers: &HeaderMap) -> Self {
        let mut ctx = Context::default_context();
        if let Some(user) = header(headers, IMPERSONATE_HEADER) {
            ctx.impersonate(user);
        }
        // first hop is the client
        if let Some(ip) = header(headers, FORWARDED_FOR_HEADER)
            .and_then(|v| v.split(',').next())
            .map(str::trim)
            .filter(|v| !v.is_empty())
        {
            ctx.user_ip = ip.to_string();
        }
        Self(ctx)
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for Acting
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Self::from_headers(&parts.headers))
    }
}
