// src/poller/client.rs
use reqwest::Client;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use crate::models::status::ServerStatusSnapshot;
use crate::utils::{ get_json, FetchError };

/// Where a presenter gets its snapshots from.
pub trait SnapshotSource {
    fn fetch_snapshot(&self) -> impl Future<Output = Result<ServerStatusSnapshot, FetchError>> + Send;
}

impl<S: SnapshotSource> SnapshotSource for Arc<S> {
    fn fetch_snapshot(&self) -> impl Future<Output = Result<ServerStatusSnapshot, FetchError>> + Send {
        self.as_ref().fetch_snapshot()
    }
}

/// Talks to `GET /api/server-status` on a running proxy.
#[derive(Clone)]
pub struct ProxyClient {
    client: Client,
    url: String,
}

impl ProxyClient {
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self, FetchError> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            url: url.into(),
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

impl SnapshotSource for ProxyClient {
    async fn fetch_snapshot(&self) -> Result<ServerStatusSnapshot, FetchError> {
        get_json(&self.client, &self.url).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handlers::status::get_server_status;
    use crate::models::status::Players;
    use crate::proxy::tests::{ upstream, ScriptedUpstream };
    use crate::proxy::StatusProxy;
    use actix_web::{ http::StatusCode, web, App, HttpResponse, HttpServer };
    use serde_json::json;

    fn serve(status: StatusCode, body: serde_json::Value) -> String {
        let server = HttpServer::new(move || {
            let body = body.clone();
            App::new().route(
                "/api/server-status",
                web::get().to(move || {
                    let body = body.clone();
                    async move { HttpResponse::build(status).json(body) }
                })
            )
        })
            .workers(1)
            .bind(("127.0.0.1", 0))
            .unwrap();

        let addr = server.addrs()[0];
        actix_web::rt::spawn(server.run());
        format!("http://{}/api/server-status", addr)
    }

    fn client(url: String) -> ProxyClient {
        ProxyClient::new(url, Duration::from_secs(2)).unwrap()
    }

    #[actix_web::test]
    async fn reads_snapshot_from_running_proxy() {
        let proxy = web::Data::new(
            StatusProxy::new(ScriptedUpstream::new(vec![Ok(upstream(true, 5, "1.21"))]), Duration::from_secs(30))
        );
        let server = HttpServer::new(move || {
            App::new()
                .app_data(proxy.clone())
                .route("/api/server-status", web::get().to(get_server_status::<ScriptedUpstream>))
        })
            .workers(1)
            .bind(("127.0.0.1", 0))
            .unwrap();
        let addr = server.addrs()[0];
        actix_web::rt::spawn(server.run());

        let snapshot = client(format!("http://{}/api/server-status", addr)).fetch_snapshot().await.unwrap();

        assert!(snapshot.online);
        assert_eq!(snapshot.players, Players { online: 5, max: 100 });
        assert_eq!(snapshot.motd, "StoneMC Server");
    }

    #[actix_web::test]
    async fn partial_body_is_a_decode_error() {
        let url = serve(StatusCode::OK, json!({ "online": true, "players": { "online": 3 } }));

        let err = client(url).fetch_snapshot().await.unwrap_err();

        assert!(matches!(err, FetchError::Decode(_)));
    }

    #[actix_web::test]
    async fn error_status_is_reported() {
        let url = serve(StatusCode::SERVICE_UNAVAILABLE, json!({}));

        let err = client(url).fetch_snapshot().await.unwrap_err();

        assert!(matches!(err, FetchError::Status(s) if s.as_u16() == 503));
    }

    #[actix_web::test]
    async fn unreachable_proxy_is_a_transport_error() {
        let err = client("http://127.0.0.1:1/api/server-status".to_string())
            .fetch_snapshot().await
            .unwrap_err();

        assert!(matches!(err, FetchError::Transport(_)));
    }
}
