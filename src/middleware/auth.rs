use actix_web::{
    dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform},
    http::header::{self, HeaderValue},
    web, Error, HttpMessage, HttpResponse, ResponseError,
};
use futures::future::LocalBoxFuture;
use std::future::{ready, Ready};

use crate::config::AppConfig;
use crate::error::ApiError;
use crate::utils::verify_access_token;

pub const ACCESS_TOKEN_COOKIE: &str = "accessToken";

/// Requires a valid access token, from the `accessToken` cookie or a bearer header.
///
/// On success the token `Claims` and the user id (`String`, for
/// `web::ReqData<String>`) are inserted into the request extensions.
pub struct AuthMiddleware;

impl<S, B> Transform<S, ServiceRequest> for AuthMiddleware
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error>,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type InitError = ();
    type Transform = AuthMiddlewareService<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(AuthMiddlewareService { service }))
    }
}

pub struct AuthMiddlewareService<S> {
    service: S,
}

/// Token from a `Bearer <token>` authorization value
pub fn bearer_token(value: &HeaderValue) -> Option<String> {
    let raw = value.to_str().ok()?.trim();
    let token = raw.strip_prefix("Bearer ").or_else(|| raw.strip_prefix("bearer "))?;
    let token = token.trim();
    (!token.is_empty()).then(|| token.to_string())
}

fn request_token(req: &ServiceRequest) -> Option<String> {
    if let Some(cookie) = req.cookie(ACCESS_TOKEN_COOKIE) {
        if !cookie.value().is_empty() {
            return Some(cookie.value().to_string());
        }
    }
    req.headers().get(header::AUTHORIZATION).and_then(bearer_token)
}

// Errors leave through `Err`, which skips the CORS wrapper, so echo allowed origins here
fn add_cors_headers(mut response: HttpResponse, origin: Option<HeaderValue>) -> HttpResponse {
    if let Some(origin) = origin {
        let headers = response.headers_mut();
        headers.insert(header::ACCESS_CONTROL_ALLOW_ORIGIN, origin);
        headers.insert(
            header::ACCESS_CONTROL_ALLOW_CREDENTIALS,
            HeaderValue::from_static("true"),
        );
    }
    response
}

fn reject(err: ApiError, origin: Option<HeaderValue>) -> Error {
    let message = err.to_string();
    let response = add_cors_headers(err.error_response(), origin);
    actix_web::error::InternalError::from_response(message, response).into()
}

impl<S, B> Service<ServiceRequest> for AuthMiddlewareService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error>,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        // Skip auth for OPTIONS requests (CORS preflight)
        if req.method() == actix_web::http::Method::OPTIONS {
            let fut = self.service.call(req);
            return Box::pin(async move {
                let res = fut.await?;
                Ok(res)
            });
        }

        let Some(config) = req.app_data::<web::Data<AppConfig>>().cloned() else {
            log::error!("AuthMiddleware mounted without AppConfig app data");
            return Box::pin(async move {
                Err(reject(ApiError::internal("Authentication is not configured"), None))
            });
        };

        let origin = req
            .headers()
            .get(header::ORIGIN)
            .filter(|o| o.to_str().map_or(false, |o| config.is_allowed_origin(o)))
            .cloned();

        let Some(token) = request_token(&req) else {
            return Box::pin(async move {
                Err(reject(ApiError::unauthorized("Unauthorized request"), origin))
            });
        };

        match verify_access_token(&token, &config.auth) {
            Ok(claims) => {
                let user_id = claims.sub.clone();
                req.extensions_mut().insert(claims);
                req.extensions_mut().insert(user_id);
                let fut = self.service.call(req);
                Box::pin(async move {
                    let res = fut.await?;
                    Ok(res)
                })
            }
            Err(e) => {
                log::debug!("Rejected access token: {}", e);
                Box::pin(async move {
                    Err(reject(ApiError::unauthorized("Invalid access token"), origin))
                })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bearer_token() {
        assert_eq!(
            bearer_token(&HeaderValue::from_static("Bearer abc.def.ghi")),
            Some("abc.def.ghi".to_string())
        );
        assert_eq!(bearer_token(&HeaderValue::from_static("Bearer   ")), None);
        assert_eq!(bearer_token(&HeaderValue::from_static("Basic dXNlcg==")), None);
        assert_eq!(bearer_token(&HeaderValue::from_static("abc.def.ghi")), None);
    }
}
