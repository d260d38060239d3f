//! Logs a weather lookup through the message logging layer.
//!
//! A local router stands in for the remote host so the demo runs offline.
//!
//! ```text
//! RUST_LOG=http_message_logging=info cargo run --example weather
//! ```

use axum::{
    body::Body,
    http::{header, Request},
    response::IntoResponse,
    routing::get,
    Router,
};
use http_body_util::BodyExt;
use http_message_logging::{HeaderNames, HttpMessageLoggingLayer, LoggingOptions, TracingSink};
use std::time::Duration;
use tokio::time::sleep;
use tower::{ServiceBuilder, ServiceExt};
use tracing::info;
use tracing_subscriber::EnvFilter;

async fn weather_handler() -> impl IntoResponse {
    sleep(Duration::from_millis(50)).await; // Simulate network latency
    (
        [
            (header::CONTENT_TYPE, "application/json"),
            (header::DATE, "Mon, 19 Oct 2026 10:00:00 GMT"),
        ],
        r#"{"coord":{"lon":-0.13,"lat":51.51},"main":{"temp":280.32},"name":"London"}"#,
    )
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("http_message_logging=info,weather=info")),
        )
        .init();

    let transport = Router::new().route("/data/2.5/weather", get(weather_handler));

    let options = LoggingOptions {
        category_name: Some("weather".into()),
        ignore_request_content: false,
        ignore_response_content: false,
        ignore_request_headers: HeaderNames::from_iter(["User-Agent"]),
        ignore_response_headers: HeaderNames::from_iter(["Date"]),
        ..Default::default()
    };

    let client = ServiceBuilder::new()
        .layer(HttpMessageLoggingLayer::new(options, TracingSink))
        .service(transport);

    let request = Request::get(
        "http://samples.openweathermap.org/data/2.5/weather?q=London,uk&appid=b1b15e88fa797225412429c1c50c122a1",
    )
    .header(header::USER_AGENT, "weather-demo/0.1")
    .header(header::AUTHORIZATION, "Bearer demo-token")
    .body(Body::empty())?;

    let response = client.oneshot(request).await?;
    let status = response.status();
    let body = response.into_body().collect().await?.to_bytes();
    info!(%status, body = %String::from_utf8_lossy(&body), "Caller received response");

    // Give the background log worker a moment to flush
    sleep(Duration::from_millis(100)).await;

    Ok(())
}
