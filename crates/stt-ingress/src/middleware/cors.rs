//! Permissive CORS middleware. The ingress surface exposes no
//! authentication or per-origin configuration (Non-goal), so every request
//! gets the same wide-open response the teacher's development CORS variant
//! produced.

use axum::body::Body;
use axum::extract::Request;
use axum::http::{header, HeaderValue, Method, StatusCode};
use axum::middleware::Next;
use axum::response::Response;

/// CORS layer builder.
pub fn cors_layer() -> impl tower::Layer<axum::routing::Route> + Clone {
    axum::middleware::from_fn(permissive_cors_middleware)
}

/// Permissive CORS middleware: allows every origin, method and header.
async fn permissive_cors_middleware(request: Request, next: Next) -> Response {
    let method = request.method().clone();

    if method == Method::OPTIONS {
        return Response::builder()
            .status(StatusCode::NO_CONTENT)
            .header(header::ACCESS_CONTROL_ALLOW_ORIGIN, "*")
            .header(header::ACCESS_CONTROL_ALLOW_METHODS, "GET, POST, PUT, DELETE, OPTIONS, HEAD")
            .header(header::ACCESS_CONTROL_ALLOW_HEADERS, "*")
            .header(header::ACCESS_CONTROL_MAX_AGE, "86400")
            .body(Body::empty())
            .expect("static response is always a valid http::Response");
    }

    let mut response = next.run(request).await;

    let headers = response.headers_mut();
    headers.insert(header::ACCESS_CONTROL_ALLOW_ORIGIN, HeaderValue::from_static("*"));
    headers.insert(header::ACCESS_CONTROL_EXPOSE_HEADERS, HeaderValue::from_static("*"));

    response
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::Request as HttpRequest;
    use tower::ServiceExt;

    async fn ok_handler() -> &'static str {
        "ok"
    }

    #[tokio::test]
    async fn preflight_request_gets_no_content_with_cors_headers() {
        let app = axum::Router::new().route("/", axum::routing::get(ok_handler)).layer(cors_layer());
        let request = HttpRequest::builder()
            .method(Method::OPTIONS)
            .uri("/")
            .body(Body::empty())
            .unwrap();
        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::NO_CONTENT);
        assert_eq!(response.headers().get(header::ACCESS_CONTROL_ALLOW_ORIGIN).unwrap(), "*");
    }

    #[tokio::test]
    async fn normal_request_gets_wildcard_origin_header() {
        let app = axum::Router::new().route("/", axum::routing::get(ok_handler)).layer(cors_layer());
        let request = HttpRequest::builder().method(Method::GET).uri("/").body(Body::empty()).unwrap();
        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers().get(header::ACCESS_CONTROL_ALLOW_ORIGIN).unwrap(), "*");
    }
}
