// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! IFC-Align Server - alignment analysis over HTTP.
//!
//! Uploaded IFC files are stored in a content-addressed disk cache and
//! analyzed on demand. Every request names its file by key; there is no
//! server-side "current file".
//!
//! # Endpoints
//!
//! - `GET /api/v1/health` - Health check
//! - `POST /api/v1/upload` - Upload an IFC file, returns its key and alignments
//! - `GET /api/v1/files/:file_key/alignments` - List alignments
//! - `GET /api/v1/files/:file_key/alignments/:id/report` - Report for one alignment
//! - `GET /api/v1/files/:file_key/reports` - Reports for every alignment

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tower_http::{
    compression::CompressionLayer, cors::CorsLayer, timeout::TimeoutLayer, trace::TraceLayer,
};
use tracing_subscriber::EnvFilter;

mod config;
mod error;
mod routes;
mod services;
mod types;

use config::Config;
use services::DiskCache;

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    pub cache: Arc<DiskCache>,
    pub config: Arc<Config>,
}

/// Build the router with all routes and middleware.
pub fn app(state: AppState) -> Router {
    let config = state.config.clone();

    Router::new()
        // Root endpoint - API information
        .route("/", get(routes::health::info))
        .route("/api/v1/health", get(routes::health::check))
        .route("/api/v1/upload", post(routes::files::upload))
        .route(
            "/api/v1/files/:file_key/alignments",
            get(routes::files::list_alignments),
        )
        .route(
            "/api/v1/files/:file_key/alignments/:id/report",
            get(routes::reports::report),
        )
        .route(
            "/api/v1/files/:file_key/reports",
            get(routes::reports::all_reports),
        )
        // Middleware
        .layer(DefaultBodyLimit::max(config.max_file_size_bytes()))
        .layer(CompressionLayer::new())
        .layer(TimeoutLayer::new(Duration::from_secs(
            config.request_timeout_secs,
        )))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::from_env();

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,tower_http=debug,ifc_align_server=debug"));
    if config.json_logs {
        tracing_subscriber::fmt().with_env_filter(filter).json().init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).pretty().init();
    }

    tracing::info!(
        port = config.port,
        cache_dir = %config.cache_dir,
        max_file_size_mb = config.max_file_size_mb,
        worker_threads = config.worker_threads,
        point_budget = config.analysis.sampling.point_budget,
        "Starting IFC-Align Server"
    );

    // Report building for all alignments runs on the global rayon pool
    rayon::ThreadPoolBuilder::new()
        .num_threads(config.worker_threads)
        .build_global()?;

    let cache = Arc::new(DiskCache::new(&config.cache_dir).await);
    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));

    let state = AppState {
        cache,
        config: Arc::new(config),
    };

    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("Listening on http://{}", addr);
    axum::serve(listener, app(state)).await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        body::{to_bytes, Body},
        http::{header, Request, StatusCode},
    };
    use serde_json::Value;
    use tower::ServiceExt;

    const ROAD: &str = r#"ISO-10303-21;
HEADER;
FILE_SCHEMA(('IFC4X3_ADD2'));
ENDSEC;
DATA;
#1=IFCCARTESIANPOINT((0.,0.));
#2=IFCDIRECTION((1.,0.));
#3=IFCAXIS2PLACEMENT2D(#1,#2);
#4=IFCLINE(#1,#5);
#5=IFCVECTOR(#2,1.);
#10=IFCCURVESEGMENT(.CONTINUOUS.,#3,IFCLENGTHMEASURE(0.),IFCLENGTHMEASURE(100.),#4);
#11=IFCCOMPOSITECURVE((#10),.F.);
#20=IFCCARTESIANPOINT((0.,40.));
#21=IFCDIRECTION((1.,0.01));
#22=IFCAXIS2PLACEMENT2D(#20,#21);
#23=IFCCURVESEGMENT(.CONTINUOUS.,#22,IFCLENGTHMEASURE(0.),IFCLENGTHMEASURE(100.),#4);
#24=IFCGRADIENTCURVE((#23),.F.,#11,$);
#30=IFCSHAPEREPRESENTATION($,'Axis','Curve2D',(#11));
#31=IFCSHAPEREPRESENTATION($,'Axis','Curve3D',(#24));
#32=IFCPRODUCTDEFINITIONSHAPE($,$,(#30,#31));
#40=IFCALIGNMENT('1F8XyUi0nDtxyU7DNIjKV1',$,'Main',$,$,$,#32,$);
#41=IFCPRODUCTDEFINITIONSHAPE($,$,(#30));
#42=IFCALIGNMENT('2G9YzVj1oEuyzV8EOJkLW2',$,'Plan only',$,$,$,#41,$);
ENDSEC;
END-ISO-10303-21;
"#;

    const BOUNDARY: &str = "ifc-align-test-boundary";

    async fn test_app() -> (Router, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let mut config = Config::from_lookup(|_| None);
        config.cache_dir = dir.path().to_string_lossy().into_owned();
        let state = AppState {
            cache: Arc::new(DiskCache::new(&config.cache_dir).await),
            config: Arc::new(config),
        };
        (app(state), dir)
    }

    fn upload_request(filename: &str, content: &str) -> Request<Body> {
        let body = format!(
            "--{BOUNDARY}\r\n\
             Content-Disposition: form-data; name=\"file\"; filename=\"{filename}\"\r\n\
             Content-Type: application/octet-stream\r\n\r\n\
             {content}\r\n\
             --{BOUNDARY}--\r\n"
        );
        Request::builder()
            .method("POST")
            .uri("/api/v1/upload")
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={BOUNDARY}"),
            )
            .body(Body::from(body))
            .unwrap()
    }

    fn get(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn health_and_info() {
        let (app, _dir) = test_app().await;

        let (status, body) = send(&app, get("/api/v1/health")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "healthy");

        let (status, body) = send(&app, get("/")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["endpoints"].as_array().unwrap().len(), 5);
    }

    #[tokio::test]
    async fn upload_then_report() {
        let (app, _dir) = test_app().await;

        let (status, upload) = send(&app, upload_request("road.ifc", ROAD)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(upload["filename"], "road.ifc");
        assert_eq!(upload["schema"], "IFC4X3");
        assert_eq!(upload["alignments"].as_array().unwrap().len(), 2);
        let key = upload["file_key"].as_str().unwrap().to_string();
        assert_eq!(key, DiskCache::generate_key(ROAD.as_bytes()));

        let (status, list) = send(&app, get(&format!("/api/v1/files/{key}/alignments"))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(list["alignments"][0]["id"], 40);
        assert_eq!(list["alignments"][1]["is_complete"], false);

        let (status, report) = send(
            &app,
            get(&format!("/api/v1/files/{key}/alignments/40/report?point_budget=50")),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(report["status"], "complete");
        assert_eq!(report["summary"]["name"], "Main");
        assert_eq!(report["tables"]["summary"][0]["property"], "Name");
        assert_eq!(report["tables"]["base_segments"].as_array().unwrap().len(), 1);
        assert!(report["base_points"].as_array().unwrap().len() <= 50);

        let (status, report) =
            send(&app, get(&format!("/api/v1/files/{key}/alignments/42/report"))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(report["status"], "incomplete");
        assert!(report.get("tables").is_none());

        let (status, all) = send(&app, get(&format!("/api/v1/files/{key}/reports"))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(all["complete"], 1);
        assert_eq!(all["incomplete"], 1);
    }

    #[tokio::test]
    async fn rejects_bad_uploads_and_unknown_ids() {
        let (app, _dir) = test_app().await;

        let (status, body) = send(&app, upload_request("road.dwg", ROAD)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["code"], "INVALID_FILE_TYPE");

        let (status, body) = send(&app, upload_request("notes.ifc", "hello")).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body["code"], "PROCESSING_ERROR");

        let missing = DiskCache::generate_key(b"never uploaded");
        let (status, _) = send(&app, get(&format!("/api/v1/files/{missing}/alignments"))).await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (_, upload) = send(&app, upload_request("road.ifc", ROAD)).await;
        let key = upload["file_key"].as_str().unwrap();
        let (status, body) =
            send(&app, get(&format!("/api/v1/files/{key}/alignments/10/report"))).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["code"], "NOT_FOUND");
    }
}
