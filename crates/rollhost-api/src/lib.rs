//! HTTP facade over the rollup host: the guest-facing rollup API, the
//! inspect API, and the read-only query API.

mod query;
pub mod rest;
mod rollup;
pub mod types;

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::routing::{get, post};
use axum::Router;
use rollhost_da::GioFetcher;
use rollhost_model::{InputRepository, NoticeRepository, ReportRepository, VoucherRepository};
use rollhost_rollup::{RollupModel, Sequencer};
use tokio::sync::watch;
use tower_http::cors::CorsLayer;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

/// Outer bound on any single request.
const HTTP_TIMEOUT: Duration = Duration::from_secs(10);

/// Everything the handlers need, cheap to clone per request.
#[derive(Clone)]
pub struct AppState {
    pub model: Arc<RollupModel>,
    pub sequencer: Arc<dyn Sequencer>,
    pub gio: Arc<GioFetcher>,
    pub inputs: InputRepository,
    pub vouchers: VoucherRepository,
    pub notices: NoticeRepository,
    pub reports: ReportRepository,
    /// Fires when the process is shutting down; pollers abort on it.
    pub shutdown: watch::Receiver<()>,
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/finish", post(rollup::finish))
        .route("/voucher", post(rollup::voucher))
        .route("/notice", post(rollup::notice))
        .route("/report", post(rollup::report))
        .route("/exception", post(rollup::exception))
        .route("/gio", post(rollup::gio))
        .route("/inspect", post(rollup::inspect))
        .route("/inputs", get(query::list_inputs))
        .route("/inputs/:index", get(query::get_input))
        .route("/vouchers", get(query::list_vouchers))
        .route(
            "/vouchers/:input_index/:output_index",
            get(query::get_voucher),
        )
        .route("/notices", get(query::list_notices))
        .route(
            "/notices/:input_index/:output_index",
            get(query::get_notice),
        )
        .route("/reports", get(query::list_reports))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .layer(TimeoutLayer::new(HTTP_TIMEOUT))
}

/// Serves the router until the shutdown signal fires.
pub async fn serve(
    address: SocketAddr,
    router: Router,
    mut shutdown: watch::Receiver<()>,
) -> anyhow::Result<()> {
    let listener = tokio::net::TcpListener::bind(address).await?;
    tracing::info!(%address, "http server: ready");
    axum::serve(listener, router)
        .with_graceful_shutdown(async move {
            let _ = shutdown.changed().await;
        })
        .await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{header, Request, Response, StatusCode};
    use rollhost_da::{
        EspressoClient, EspressoFetcher, SyscoinClient, DEFAULT_ESPRESSO_BASE_URL,
    };
    use rollhost_model::{AdvanceInput, CompletionStatus, Notice};
    use rollhost_rollup::{InputBoxSequencer, OutputDecoder};
    use tower::ServiceExt;

    const SENDER: &str = "0xf39fd6e51aad88f6f4ce6ab8827279cfffb92266";
    const DESTINATION: &str = "0xc6e7df5e7b4f2a278906862b61205850344d4e7d";

    struct Harness {
        router: Router,
        state: AppState,
        // Keeps the shutdown channel open for the lifetime of a test.
        _shutdown: watch::Sender<()>,
    }

    async fn harness() -> Harness {
        let mut opts = sea_orm::ConnectOptions::new("sqlite::memory:");
        opts.max_connections(1);
        let conn = sea_orm::Database::connect(opts).await.unwrap();
        rollhost_model::entity::setup_db(&conn).await.unwrap();

        let inputs = InputRepository::new(conn.clone());
        let vouchers = VoucherRepository::new(conn.clone());
        let notices = NoticeRepository::new(conn.clone());
        let reports = ReportRepository::new(conn);
        let decoder = Arc::new(OutputDecoder::new(vouchers.clone(), notices.clone()));
        let model = Arc::new(RollupModel::new(
            decoder,
            inputs.clone(),
            reports.clone(),
        ));
        let sequencer = Arc::new(InputBoxSequencer::new(model.clone()));
        let gio = Arc::new(GioFetcher::new(
            EspressoFetcher::new(
                inputs.clone(),
                EspressoClient::new(DEFAULT_ESPRESSO_BASE_URL),
                SENDER.parse().unwrap(),
                86_400,
            ),
            SyscoinClient::new("http://127.0.0.1:1"),
        ));

        let (tx, shutdown) = watch::channel(());
        let state = AppState {
            model,
            sequencer,
            gio,
            inputs,
            vouchers,
            notices,
            reports,
            shutdown,
        };
        Harness {
            router: build_router(state.clone()),
            state,
            _shutdown: tx,
        }
    }

    async fn post(harness: &Harness, path: &str, body: &str) -> Response<Body> {
        harness
            .router
            .clone()
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri(path)
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(body.to_owned()))
                    .unwrap(),
            )
            .await
            .unwrap()
    }

    async fn get_path(harness: &Harness, path: &str) -> Response<Body> {
        harness
            .router
            .clone()
            .oneshot(Request::builder().uri(path).body(Body::empty()).unwrap())
            .await
            .unwrap()
    }

    async fn body_text(response: Response<Body>) -> String {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    async fn body_json(response: Response<Body>) -> serde_json::Value {
        serde_json::from_str(&body_text(response).await).unwrap()
    }

    fn seeded_input(index: u64) -> AdvanceInput {
        AdvanceInput {
            index,
            status: CompletionStatus::Unprocessed,
            msg_sender: SENDER.parse().unwrap(),
            payload: vec![0xde, 0xad, 0xbe, 0xef],
            block_number: index,
            block_timestamp: 1_700_000_000_000,
            prev_randao: 0,
            exception: Vec::new(),
        }
    }

    #[tokio::test]
    async fn voucher_before_finish_is_forbidden() {
        let h = harness().await;
        let response = post(
            &h,
            "/voucher",
            &format!(r#"{{"destination": "{DESTINATION}", "payload": "0x11"}}"#),
        )
        .await;
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
        assert_eq!(
            body_text(response).await,
            "cannot add voucher in idle state"
        );
    }

    #[tokio::test]
    async fn non_json_bodies_are_unsupported() {
        let h = harness().await;
        let response = h
            .router
            .clone()
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/finish")
                    .header(header::CONTENT_TYPE, "text/plain")
                    .body(Body::from(r#"{"status": "accept"}"#))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNSUPPORTED_MEDIA_TYPE);
        assert_eq!(body_text(response).await, "invalid content type");
    }

    #[tokio::test]
    async fn bad_hex_and_bad_address_are_rejected() {
        let h = harness().await;
        let response = post(
            &h,
            "/voucher",
            r#"{"destination": "0x1234", "payload": "0x11"}"#,
        )
        .await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_text(response).await, "invalid address length");

        let response = post(&h, "/report", r#"{"payload": "nope"}"#).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_text(response).await, "invalid hex payload");
    }

    #[tokio::test]
    async fn finish_returns_the_seeded_advance() {
        let h = harness().await;
        h.state.inputs.create(seeded_input(0)).await.unwrap();

        let response = post(&h, "/finish", r#"{"status": "accept"}"#).await;
        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        assert_eq!(json["request_type"], "advance_state");
        assert_eq!(json["data"]["metadata"]["input_index"], 0);
        assert_eq!(json["data"]["metadata"]["msg_sender"], SENDER);
        assert_eq!(json["data"]["payload"], "0xdeadbeef");
    }

    #[tokio::test]
    async fn finish_exhausts_to_202_when_idle() {
        let h = harness().await;
        let response = post(&h, "/finish", r#"{"status": "accept"}"#).await;
        assert_eq!(response.status(), StatusCode::ACCEPTED);
        assert_eq!(body_text(response).await, "no rollup request available");
    }

    #[tokio::test]
    async fn accepted_voucher_lands_in_the_store() {
        let h = harness().await;
        h.state.inputs.create(seeded_input(0)).await.unwrap();
        post(&h, "/finish", r#"{"status": "accept"}"#).await;

        let response = post(
            &h,
            "/voucher",
            &format!(r#"{{"destination": "{DESTINATION}", "payload": "0x11"}}"#),
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await["index"], 0);

        // Second finish accepts the advance and persists its outputs.
        let response = post(&h, "/finish", r#"{"status": "accept"}"#).await;
        assert_eq!(response.status(), StatusCode::ACCEPTED);

        let voucher = h.state.vouchers.find_by_key(0, 0).await.unwrap().unwrap();
        assert_eq!(
            voucher.destination,
            DESTINATION.parse::<alloy::primitives::Address>().unwrap()
        );
        assert_eq!(voucher.payload, vec![0x11]);
        assert!(!voucher.executed);
    }

    #[tokio::test]
    async fn inspect_round_trip() {
        let h = harness().await;

        // Answer the inspect from a parallel guest loop.
        let state = h.state.clone();
        let guest = tokio::spawn(async move {
            loop {
                match state.model.finish_and_get_next(true).await.unwrap() {
                    Some(rollhost_rollup::RollupInput::Inspect(_)) => {
                        state.model.add_report(vec![0x42]).await.unwrap();
                        state.model.finish_and_get_next(true).await.unwrap();
                        break;
                    }
                    _ => tokio::time::sleep(Duration::from_millis(10)).await,
                }
            }
        });

        let response = post(&h, "/inspect", r#"{"payload": "0x99"}"#).await;
        guest.await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        assert_eq!(json["status"], "ACCEPTED");
        assert_eq!(json["reports"][0]["payload"], "0x42");
    }

    #[tokio::test]
    async fn gio_rejects_unknown_domains_and_bad_ids() {
        let h = harness().await;
        let response = post(&h, "/gio", r#"{"domain": 9999, "id": "x"}"#).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let id = format!("0x{}", "a".repeat(127));
        let response = post(&h, "/gio", &format!(r#"{{"domain": 2222, "id": "{id}"}}"#)).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn notices_page_after_a_cursor() {
        let h = harness().await;
        for input_index in 0..30u64 {
            h.state
                .notices
                .upsert(Notice {
                    input_index,
                    output_index: 0,
                    payload: vec![input_index as u8],
                })
                .await
                .unwrap();
        }
        let cursor = rollhost_model::encode_cursor(10);
        let response = get_path(&h, &format!("/notices?first=10&after={cursor}")).await;
        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        let indices: Vec<u64> = json["data"]
            .as_array()
            .unwrap()
            .iter()
            .map(|row| row["input_index"].as_u64().unwrap())
            .collect();
        assert_eq!(indices, (11..=20).collect::<Vec<_>>());
        assert_eq!(json["total"], 30);
    }

    #[tokio::test]
    async fn query_rejects_unsupported_filters() {
        let h = harness().await;
        // Status only supports `ne` on inputs.
        let filter = r#"[{"field":"Status","eq":"ACCEPTED"}]"#;
        let response = get_path(
            &h,
            &format!("/inputs?filter={}", urlencode(filter)),
        )
        .await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let response = get_path(&h, "/inputs?filter=not-json").await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn missing_rows_are_404() {
        let h = harness().await;
        let response = get_path(&h, "/inputs/7").await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        let response = get_path(&h, "/vouchers/0/0").await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    fn urlencode(value: &str) -> String {
        let mut out = String::new();
        for byte in value.bytes() {
            match byte {
                b'a'..=b'z' | b'A'..=b'Z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => {
                    out.push(byte as char)
                }
                other => out.push_str(&format!("%{other:02X}")),
            }
        }
        out
    }
}
