use std::time::Instant;

use axum::{extract::Request, http::HeaderValue, middleware::Next, response::Response};

use super::trace_id::TraceId;

/// 每个请求一条访问日志，并附带 `x-response-time` 头
pub async fn access_log(req: Request, next: Next) -> Response {
    let method = req.method().clone();
    let path = req.uri().path().to_string();
    let trace_id = req
        .extensions()
        .get::<TraceId>()
        .map(|t| t.0.clone())
        .unwrap_or_else(|| "-".into());
    let start = Instant::now();

    let mut resp = next.run(req).await;

    let elapsed = start.elapsed().as_millis();
    tracing::info!(
        trace_id = %trace_id,
        method = %method,
        path = %path,
        status = resp.status().as_u16(),
        elapsed_ms = elapsed as u64,
        "http_request"
    );
    if let Ok(value) = HeaderValue::from_str(&format!("{}ms", elapsed)) {
        resp.headers_mut().insert("x-response-time", value);
    }
    resp
}
