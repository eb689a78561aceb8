//! 请求级中间件
//!
//! 每个请求分配一个 `x-request-id`，访问日志挂在以该 id 命名的 span 下。

use axum::{
    extract::Request,
    http::{header::USER_AGENT, HeaderName, HeaderValue},
    middleware::Next,
    response::Response,
};
use std::time::Instant;
use tracing::{info, info_span, Instrument};
use uuid::Uuid;

pub const REQUEST_ID_HEADER: HeaderName = HeaderName::from_static("x-request-id");

pub async fn request_logging_middleware(req: Request, next: Next) -> Response {
    let request_id = Uuid::new_v4();
    let user_agent = req
        .headers()
        .get(USER_AGENT)
        .and_then(|value| value.to_str().ok())
        .unwrap_or("-");
    let span = info_span!(
        "request",
        id = %request_id,
        method = %req.method(),
        uri = %req.uri(),
        user_agent,
    );

    async move {
        let started = Instant::now();
        let mut response = next.run(req).await;

        if let Ok(value) = HeaderValue::from_str(&request_id.to_string()) {
            response.headers_mut().insert(REQUEST_ID_HEADER, value);
        }
        info!(
            status = response.status().as_u16(),
            latency_ms = started.elapsed().as_millis() as u64,
            "request completed"
        );

        response
    }
    .instrument(span)
    .await
}
