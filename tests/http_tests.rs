// Router tests: health, ingest handshake rejection, status, segment serving

use anyhow::Result;
use axum::body::{to_bytes, Body};
use axum::http::{Request, StatusCode};
use live_broadcast::{create_router, AppState, BroadcastConfig, BroadcastSession, SessionStatus};
use std::sync::Arc;
use tempfile::TempDir;
use tower::ServiceExt;

fn app() -> Result<(TempDir, Arc<BroadcastSession>, axum::Router)> {
    let dir = TempDir::new()?;
    let session = Arc::new(BroadcastSession::new(BroadcastConfig::from_web_root(
        dir.path(),
    ))?);
    let router = create_router(AppState::new(session.clone()));
    Ok((dir, session, router))
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

#[tokio::test]
async fn test_health_check() -> Result<()> {
    let (_dir, _session, router) = app()?;

    let response = router.oneshot(get("/health")).await?;

    assert_eq!(response.status(), StatusCode::OK);
    let body = to_bytes(response.into_body(), usize::MAX).await?;
    assert_eq!(&body[..], b"OK");

    Ok(())
}

#[tokio::test]
async fn test_ingest_rejects_plain_http() -> Result<()> {
    let (_dir, session, router) = app()?;

    let response = router.oneshot(get("/ws/stream")).await?;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(!session.is_active(), "a rejected request must not start a broadcast");

    Ok(())
}

#[tokio::test]
async fn test_status_reports_idle_session() -> Result<()> {
    let (_dir, session, router) = app()?;

    let response = router.oneshot(get("/status")).await?;

    assert_eq!(response.status(), StatusCode::OK);
    let body = to_bytes(response.into_body(), usize::MAX).await?;
    let status: SessionStatus = serde_json::from_slice(&body)?;
    assert!(!status.active);
    assert_eq!(status.bytes_written, 0);
    assert_eq!(status.playlist, session.output_dir().join("index.m3u8"));

    Ok(())
}

#[tokio::test]
async fn test_serves_playlist_from_output_dir() -> Result<()> {
    let (_dir, session, router) = app()?;
    let playlist = "#EXTM3U\n#EXT-X-TARGETDURATION:4\nindex0.ts\n";
    std::fs::write(session.output_dir().join("index.m3u8"), playlist)?;

    let response = router.clone().oneshot(get("/live/index.m3u8")).await?;
    assert_eq!(response.status(), StatusCode::OK);
    let body = to_bytes(response.into_body(), usize::MAX).await?;
    assert_eq!(&body[..], playlist.as_bytes());

    let missing = router.oneshot(get("/live/index9.ts")).await?;
    assert_eq!(missing.status(), StatusCode::NOT_FOUND);

    Ok(())
}
