//! HTTP transport with modular organization
//!
//! - endpoints: handlers grouped by what they touch
//! - parsers: query string → domain types
//! - error: failure → status code and JSON body

mod endpoints;
mod error;
mod parsers;

use std::path::PathBuf;
use std::sync::Arc;

use axum::routing::get;
use axum::Router;

use crate::session::SessionHandle;
pub use error::ApiError;

/// Shared state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    pub session: SessionHandle,
    pub assets_dir: Arc<PathBuf>,
}

impl AppState {
    pub fn new(session: SessionHandle, assets_dir: PathBuf) -> Self {
        Self {
            session,
            assets_dir: Arc::new(assets_dir),
        }
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(endpoints::assets::index))
        .route("/move", get(endpoints::game::make_move))
        .route("/show", get(endpoints::game::show))
        .route("/fen", get(endpoints::game::fen))
        .route("/new", get(endpoints::game::new_game))
        .route("/info", get(endpoints::engine::info))
        .route("/img", get(endpoints::assets::image))
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::{spawn_session, SessionSettings};
    use axum::body::Body;
    use axum::http::{header, Request, StatusCode};
    use engine::mock::{MockOpponent, MockReply};
    use engine::{UciOption, UciOptionKind};
    use http_body_util::BodyExt;
    use serde_json::Value;
    use std::time::Duration;
    use tempfile::TempDir;
    use tower::ServiceExt;

    struct TestApp {
        router: Router,
        _assets: TempDir,
    }

    fn app(mock: MockOpponent) -> TestApp {
        let assets = tempfile::tempdir().unwrap();
        std::fs::write(assets.path().join("play.html"), "<html>play</html>").unwrap();
        std::fs::create_dir(assets.path().join("img")).unwrap();
        std::fs::write(assets.path().join("img").join("wK.png"), [0x89, b'P', b'N', b'G']).unwrap();

        let settings = SessionSettings {
            move_time: Duration::from_millis(10),
            search_grace: Duration::from_millis(200),
        };
        let session = spawn_session(Box::new(mock), settings);
        TestApp {
            router: router(AppState::new(session, assets.path().to_path_buf())),
            _assets: assets,
        }
    }

    async fn get_raw(app: &TestApp, uri: &str) -> (StatusCode, Option<String>, Vec<u8>) {
        let response = app
            .router
            .clone()
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let content_type = response
            .headers()
            .get(header::CONTENT_TYPE)
            .map(|v| v.to_str().unwrap().to_string());
        let body = response.into_body().collect().await.unwrap().to_bytes();
        (status, content_type, body.to_vec())
    }

    async fn get_json(app: &TestApp, uri: &str) -> (StatusCode, Value) {
        let (status, _, body) = get_raw(app, uri).await;
        (status, serde_json::from_slice(&body).unwrap())
    }

    #[tokio::test]
    async fn test_fen_initial_position() {
        let app = app(MockOpponent::new());
        let (status, json) = get_json(&app, "/fen").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["fen"], chess::STARTING_FEN);
        assert_eq!(json["legal_moves"].as_array().unwrap().len(), 20);
        assert_eq!(json["pgn"], serde_json::json!([]));
        assert_eq!(json["status"], "ongoing");
    }

    #[tokio::test]
    async fn test_move_exchange() {
        let app = app(MockOpponent::new().with_replies([MockReply::BestMove("e7e5".into())]));
        let (status, json) = get_json(&app, "/move?uci=e2e4").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["best_move"], "e7e5");
        assert_eq!(json["pgn"], serde_json::json!(["e4", "e5"]));
        assert!(json["legal_moves"].as_array().unwrap().len() > 0);
        assert!(json["info"].is_object());

        let (_, view) = get_json(&app, "/fen").await;
        assert_eq!(view["fen"], json["fen"]);
    }

    #[tokio::test]
    async fn test_move_with_san() {
        let app = app(MockOpponent::new().with_replies([MockReply::BestMove("d7d5".into())]));
        let (status, json) = get_json(&app, "/move?san=d4").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["pgn"], serde_json::json!(["d4", "d5"]));
    }

    #[tokio::test]
    async fn test_move_rejections() {
        let app = app(MockOpponent::new());
        let cases = [
            ("/move", "input_error"),
            ("/move?uci=e2e4&san=e4", "input_error"),
            ("/move?uci=e2e4&uci=d2d4", "input_error"),
            ("/move?uci=e2e5", "illegal_move"),
            ("/move?uci=hello", "invalid_move_notation"),
            ("/move?san=Ke9", "invalid_move_notation"),
        ];
        for (uri, kind) in cases {
            let (status, json) = get_json(&app, uri).await;
            assert_eq!(status, StatusCode::BAD_REQUEST, "{}", uri);
            assert_eq!(json["kind"], kind, "{}", uri);
            assert_eq!(json["committed"], "nothing", "{}", uri);
            assert!(json["error"].is_string());
        }
        let (_, view) = get_json(&app, "/fen").await;
        assert_eq!(view["move_count"], 0);
    }

    #[tokio::test]
    async fn test_opponent_fault_reports_committed_client_move() {
        let app = app(MockOpponent::new().with_replies([MockReply::Fail("engine died".into())]));
        let (status, json) = get_json(&app, "/move?uci=e2e4").await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(json["kind"], "opponent_protocol_fault");
        assert_eq!(json["committed"], "client_move");

        let (_, view) = get_json(&app, "/fen").await;
        assert_eq!(view["pgn"], serde_json::json!(["e4"]));
        assert_eq!(view["opponent_fault"], "engine died");
    }

    #[tokio::test]
    async fn test_show_board() {
        let app = app(MockOpponent::new());
        let (status, _, body) = get_raw(&app, "/show").await;
        assert_eq!(status, StatusCode::OK);
        let text = String::from_utf8(body).unwrap();
        assert!(text.starts_with("Current position: "));
        assert!(text.contains(" A B C D E F G H"));
        assert!(text.contains('♔'));
    }

    #[tokio::test]
    async fn test_new_game_resets() {
        let app = app(MockOpponent::new());
        get_json(&app, "/move?uci=e2e4").await;

        let (status, json) = get_json(&app, "/new").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["message"], "New game started");

        let (_, view) = get_json(&app, "/fen").await;
        assert_eq!(view["pgn"], serde_json::json!([]));
        assert_eq!(view["game_id"], json["game_id"]);
    }

    #[tokio::test]
    async fn test_info_passthrough() {
        let option = UciOption {
            name: "Hash".into(),
            kind: UciOptionKind::Spin,
            default: Some("16".into()),
            min: Some(1),
            max: Some(1024),
            vars: Vec::new(),
            value: Some("64".into()),
        };
        let app = app(MockOpponent::new().with_name("Stockfish 16").with_option(option));
        let (status, json) = get_json(&app, "/info").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["info"]["name"], "Stockfish 16");
        assert_eq!(json["options"][0]["name"], "Hash");
        assert_eq!(json["options"][0]["type"], "spin");
        assert_eq!(json["options"][0]["value"], "64");
    }

    #[tokio::test]
    async fn test_static_assets() {
        let app = app(MockOpponent::new());

        let (status, content_type, body) = get_raw(&app, "/").await;
        assert_eq!(status, StatusCode::OK);
        assert!(content_type.unwrap().starts_with("text/html"));
        assert_eq!(body, b"<html>play</html>");

        let (status, content_type, body) = get_raw(&app, "/img?piece=wK.png").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(content_type.as_deref(), Some("image/png"));
        assert_eq!(body, vec![0x89, b'P', b'N', b'G']);
    }

    #[tokio::test]
    async fn test_asset_failures() {
        let app = app(MockOpponent::new());

        let (status, json) = get_json(&app, "/img").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["kind"], "resource_fault");

        let (status, _) = get_json(&app, "/img?piece=..%2Fplay.html").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, json) = get_json(&app, "/img?piece=a.png&piece=b.png").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["kind"], "resource_fault");

        let (status, json) = get_json(&app, "/img?piece=bQ.png").await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(json["kind"], "resource_fault");
    }
}
