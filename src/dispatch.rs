use reqwest::header::CONTENT_TYPE;

use crate::config::Config;
use crate::error::DispatchError;
use crate::message::Message;


/// The webhook accepted the message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ack {
    pub status: u16,
    pub body: String,
}


/// Posts rendered messages to the configured webhook, one attempt per message.
pub struct Dispatcher {
    client: reqwest::Client,
    webhook_url: String,
}

impl Dispatcher {
    pub fn new(config: &Config) -> Result<Self, DispatchError> {
        // A redirect would turn one delivery into several requests, so 3xx is a rejection.
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .redirect(reqwest::redirect::Policy::none())
            .build()
            .map_err(DispatchError::Transport)?;

        Ok(Dispatcher {
            client,
            webhook_url: config.webhook_url.clone(),
        })
    }

    pub async fn dispatch(&self, message: &Message) -> Result<Ack, DispatchError> {
        let body = serde_json::to_vec(message)?;

        let response = self.client
            .post(&self.webhook_url)
            .header(CONTENT_TYPE, "application/json; charset=utf-8")
            .body(body)
            .send()
            .await
            .map_err(DispatchError::Transport)?;

        let status = response.status();
        // The status alone decides success; an unreadable body is reported as empty.
        let body = response.text().await.unwrap_or_default();

        if status.is_success() {
            Ok(Ack {
                status: status.as_u16(),
                body,
            })
        } else {
            Err(DispatchError::Rejected {
                status: status.as_u16(),
                body,
            })
        }
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DispatchErrorKind;
    use crate::message::{Block, TextObject};

    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    use axum::{Router, extract::State, http::{HeaderMap, StatusCode, header::LOCATION}, routing::{get, post}};

    #[derive(Clone, Default)]
    struct Received {
        bodies: Arc<Mutex<Vec<String>>>,
        content_types: Arc<Mutex<Vec<String>>>,
    }

    async fn spawn_webhook(router: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        format!("http://{addr}/hook")
    }

    fn config_for(url: String, timeout: Duration) -> Config {
        Config {
            webhook_url: url,
            channel: None,
            enable_logging: false,
            icon_url: None,
            icon_emoji: ":lock:".to_string(),
            username: "SSM Alerts".to_string(),
            timeout,
        }
    }

    fn message() -> Message {
        Message {
            text: "StartSession alice".to_string(),
            blocks: vec![Block::Header { text: TextObject::plain("SSM StartSession") }],
            unfurl_links: false,
            unfurl_media: false,
            username: "SSM Alerts".to_string(),
            icon_emoji: Some(":lock:".to_string()),
            icon_url: None,
            channel: None,
        }
    }

    #[tokio::test]
    async fn success_status_yields_ack() {
        let received = Received::default();
        let router = Router::new()
            .route("/hook", post(|State(received): State<Received>, headers: HeaderMap, body: String| async move {
                let content_type = headers
                    .get("content-type")
                    .and_then(|v| v.to_str().ok())
                    .unwrap_or_default()
                    .to_string();
                received.content_types.lock().unwrap().push(content_type);
                received.bodies.lock().unwrap().push(body);
                (StatusCode::OK, "ok")
            }))
            .with_state(received.clone());
        let url = spawn_webhook(router).await;

        let dispatcher = Dispatcher::new(&config_for(url, Duration::from_secs(5))).unwrap();
        let ack = dispatcher.dispatch(&message()).await.unwrap();

        assert_eq!(ack, Ack { status: 200, body: "ok".to_string() });

        let bodies = received.bodies.lock().unwrap();
        assert_eq!(bodies.len(), 1);
        let sent: serde_json::Value = serde_json::from_str(&bodies[0]).unwrap();
        assert_eq!(sent, serde_json::to_value(message()).unwrap());
        assert_eq!(received.content_types.lock().unwrap()[0], "application/json; charset=utf-8");
    }

    #[tokio::test]
    async fn server_error_is_rejected_with_status_and_body() {
        let router = Router::new().route(
            "/hook",
            post(|| async { (StatusCode::INTERNAL_SERVER_ERROR, "invalid_payload") }),
        );
        let url = spawn_webhook(router).await;

        let dispatcher = Dispatcher::new(&config_for(url, Duration::from_secs(5))).unwrap();
        let err = dispatcher.dispatch(&message()).await.unwrap_err();

        assert_eq!(err.kind(), DispatchErrorKind::Rejected);
        match err {
            DispatchError::Rejected { status, body } => {
                assert_eq!(status, 500);
                assert_eq!(body, "invalid_payload");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn not_found_is_rejected() {
        let router = Router::new().route("/other", post(|| async { "ok" }));
        let url = spawn_webhook(router).await;

        let dispatcher = Dispatcher::new(&config_for(url, Duration::from_secs(5))).unwrap();
        let err = dispatcher.dispatch(&message()).await.unwrap_err();

        assert!(matches!(err, DispatchError::Rejected { status: 404, .. }));
    }

    #[tokio::test]
    async fn redirect_is_rejected_without_following() {
        let hits = Arc::new(AtomicUsize::new(0));
        let router = Router::new()
            .route("/hook", post(|State(hits): State<Arc<AtomicUsize>>| async move {
                hits.fetch_add(1, Ordering::SeqCst);
                (StatusCode::FOUND, [(LOCATION, "/landing")], "moved")
            }))
            .route("/landing", get(|State(hits): State<Arc<AtomicUsize>>| async move {
                hits.fetch_add(1, Ordering::SeqCst);
                "welcome"
            }))
            .with_state(hits.clone());
        let url = spawn_webhook(router).await;

        let dispatcher = Dispatcher::new(&config_for(url, Duration::from_secs(5))).unwrap();
        let err = dispatcher.dispatch(&message()).await.unwrap_err();

        assert!(matches!(err, DispatchError::Rejected { status: 302, .. }));
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn stalled_webhook_times_out_as_transport_error() {
        let router = Router::new().route(
            "/hook",
            post(|| async {
                tokio::time::sleep(Duration::from_secs(30)).await;
                "too late"
            }),
        );
        let url = spawn_webhook(router).await;

        let dispatcher = Dispatcher::new(&config_for(url, Duration::from_millis(200))).unwrap();
        let started = std::time::Instant::now();
        let err = dispatcher.dispatch(&message()).await.unwrap_err();

        assert_eq!(err.kind(), DispatchErrorKind::Transport);
        assert!(started.elapsed() < Duration::from_secs(10));
    }

    #[tokio::test]
    async fn refused_connection_is_transport_error() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let config = config_for(format!("http://{addr}/hook"), Duration::from_secs(2));
        let err = Dispatcher::new(&config).unwrap().dispatch(&message()).await.unwrap_err();

        assert_eq!(err.kind(), DispatchErrorKind::Transport);
    }
}
