//! Server lifecycle — bind, spawn, graceful shutdown.
//!
//! Pattern: bind → spawn background task → return handle with shutdown
//! channel. Tests start a real listener on `127.0.0.1:0` and drive it
//! over HTTP.

use std::net::SocketAddr;

use tokio::sync::oneshot;

use crate::api::router::app_router;
use crate::api::types::AppContext;

/// Handle to a running server.
pub struct AppServer {
    local_addr: SocketAddr,
    shutdown_tx: Option<oneshot::Sender<()>>,
}

impl AppServer {
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Shut down the server gracefully. Safe to call more than once.
    pub fn shutdown(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
            tracing::info!("server shutdown signal sent");
        }
    }
}

/// Bind `addr`, mount the application router, and serve it from a
/// background task until the handle's shutdown channel fires.
pub async fn serve(ctx: AppContext, addr: SocketAddr) -> Result<AppServer, String> {
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|e| format!("Failed to bind {addr}: {e}"))?;
    let local_addr = listener
        .local_addr()
        .map_err(|e| format!("Failed to read bound address: {e}"))?;

    let app = app_router(ctx);
    let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();

    tokio::spawn(async move {
        let shutdown_signal = async move {
            let _ = shutdown_rx.await;
            tracing::info!("server received shutdown signal");
        };

        tracing::info!(%local_addr, "server started");

        if let Err(e) = axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal)
            .await
        {
            tracing::error!("server error: {e}");
        }

        tracing::info!("server stopped");
    });

    Ok(AppServer {
        local_addr,
        shutdown_tx: Some(shutdown_tx),
    })
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    use axum::http::{HeaderMap, StatusCode as AxStatus};
    use axum::routing::{get, post};
    use axum::{Json, Router};
    use serde_json::{json, Value};

    use crate::config::{AppConfig, LoginMode};

    use super::*;

    const NOTE_TEXT: &str = "Training Simulation — Educational Use Only\n\nPresenting Context – (stub)";

    /// GoTrue stand-in: one known account, one provisioned magic-link
    /// address, bearer validation on `/user`.
    async fn spawn_gotrue_stub() -> SocketAddr {
        let router = Router::new()
            .route(
                "/auth/v1/token",
                post(|Json(body): Json<Value>| async move {
                    if body["email"] == json!("user@example.com")
                        && body["password"] == json!("correctpw")
                    {
                        (
                            AxStatus::OK,
                            Json(json!({
                                "access_token": "access-abc",
                                "refresh_token": "refresh-xyz",
                                "expires_in": 3600,
                                "user": { "id": "uid-1", "email": "user@example.com" }
                            })),
                        )
                    } else {
                        (
                            AxStatus::BAD_REQUEST,
                            Json(json!({ "error_description": "Invalid login credentials" })),
                        )
                    }
                }),
            )
            .route(
                "/auth/v1/otp",
                post(|Json(body): Json<Value>| async move {
                    if body["email"] == json!("provisioned@example.com") {
                        (AxStatus::OK, Json(json!({})))
                    } else {
                        (
                            AxStatus::UNPROCESSABLE_ENTITY,
                            Json(json!({ "msg": "Signups not allowed for otp" })),
                        )
                    }
                }),
            )
            .route(
                "/auth/v1/user",
                get(|headers: HeaderMap| async move {
                    let bearer = headers
                        .get("Authorization")
                        .and_then(|v| v.to_str().ok())
                        .and_then(|v| v.strip_prefix("Bearer "))
                        .unwrap_or_default();
                    if bearer == "access-abc" {
                        (
                            AxStatus::OK,
                            Json(json!({ "id": "uid-1", "email": "user@example.com" })),
                        )
                    } else {
                        (AxStatus::UNAUTHORIZED, Json(json!({ "msg": "invalid JWT" })))
                    }
                }),
            )
            .route("/auth/v1/logout", post(|| async { AxStatus::NO_CONTENT }));

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        addr
    }

    /// Completion stand-in that counts how often it is called.
    async fn spawn_openai_stub() -> (SocketAddr, Arc<AtomicUsize>) {
        let calls = Arc::new(AtomicUsize::new(0));
        let seen = Arc::clone(&calls);
        let router = Router::new().route(
            "/v1/chat/completions",
            post(move || {
                let seen = Arc::clone(&seen);
                async move {
                    seen.fetch_add(1, Ordering::SeqCst);
                    Json(json!({
                        "choices": [ { "message": { "role": "assistant", "content": NOTE_TEXT } } ]
                    }))
                }
            }),
        );

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        (addr, calls)
    }

    async fn spawn_app(mode: LoginMode) -> (AppServer, Arc<AtomicUsize>) {
        let gotrue = spawn_gotrue_stub().await;
        let (openai, calls) = spawn_openai_stub().await;

        let config = AppConfig {
            supabase_url: format!("http://{gotrue}"),
            supabase_anon_key: "anon".into(),
            supabase_service_key: Some("service".into()),
            openai_api_key: "sk-test".into(),
            openai_base_url: format!("http://{openai}"),
            app_base_url: "http://localhost:8787".into(),
            login_mode: mode,
            model: "gpt-4.1-mini".into(),
            temperature: 0.2,
            max_tokens: 1500,
            listen_addr: "127.0.0.1:0".parse().unwrap(),
        };
        let server = serve(AppContext::new(config), "127.0.0.1:0".parse().unwrap())
            .await
            .expect("server should start");
        (server, calls)
    }

    /// Client that does not follow redirects, so Set-Cookie and
    /// Location on the 303 responses stay observable.
    fn http_client() -> reqwest::Client {
        reqwest::Client::builder()
            .redirect(reqwest::redirect::Policy::none())
            .build()
            .unwrap()
    }

    fn session_cookie_from(response: &reqwest::Response) -> String {
        response
            .headers()
            .get(reqwest::header::SET_COOKIE)
            .expect("Set-Cookie expected")
            .to_str()
            .unwrap()
            .split(';')
            .next()
            .unwrap()
            .to_string()
    }

    #[tokio::test]
    async fn password_login_generate_download_logout() {
        let (mut server, calls) = spawn_app(LoginMode::Password).await;
        let base = format!("http://{}", server.local_addr());
        let client = http_client();

        // Login succeeds, session cookie is set.
        let response = client
            .post(format!("{base}/auth/login"))
            .form(&[("email", "user@example.com"), ("password", "correctpw")])
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), reqwest::StatusCode::SEE_OTHER);
        let cookie = session_cookie_from(&response);

        // Gate view now shows the authenticated state.
        let response = client
            .get(format!("{base}/"))
            .header(reqwest::header::COOKIE, &cookie)
            .send()
            .await
            .unwrap();
        assert_eq!(
            response.headers().get(reqwest::header::CACHE_CONTROL).unwrap(),
            "no-store"
        );
        let html = response.text().await.unwrap();
        assert!(html.contains("Logged in as user@example.com"));

        // Whitespace-only narrative: warning, no provider call.
        let response = client
            .post(format!("{base}/generate"))
            .header(reqwest::header::COOKIE, &cookie)
            .form(&[("narrative", "   \n  ")])
            .send()
            .await
            .unwrap();
        let html = response.text().await.unwrap();
        assert!(html.contains("Please enter a fictional or de-identified scenario first."));
        assert_eq!(calls.load(Ordering::SeqCst), 0);

        // Real narrative: one provider call, note rendered.
        let response = client
            .post(format!("{base}/generate"))
            .header(reqwest::header::COOKIE, &cookie)
            .form(&[("narrative", "Fictional client paced during intake.")])
            .send()
            .await
            .unwrap();
        let html = response.text().await.unwrap();
        assert!(html.contains("Training Simulation — Educational Use Only"));
        assert!(html.contains("href=\"/download\""));
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        // Download serves the note as a named text attachment.
        let response = client
            .get(format!("{base}/download"))
            .header(reqwest::header::COOKIE, &cookie)
            .send()
            .await
            .unwrap();
        let disposition = response
            .headers()
            .get(reqwest::header::CONTENT_DISPOSITION)
            .unwrap()
            .to_str()
            .unwrap()
            .to_string();
        assert!(disposition.contains("attachment"));
        assert!(disposition.contains("fpn_training_note_"));
        assert_eq!(response.text().await.unwrap(), NOTE_TEXT);

        // Logout clears the session; repeating it is safe.
        for _ in 0..2 {
            let response = client
                .post(format!("{base}/auth/logout"))
                .header(reqwest::header::COOKIE, &cookie)
                .send()
                .await
                .unwrap();
            assert_eq!(response.status(), reqwest::StatusCode::SEE_OTHER);
        }
        let response = client
            .get(format!("{base}/"))
            .header(reqwest::header::COOKIE, &cookie)
            .send()
            .await
            .unwrap();
        let html = response.text().await.unwrap();
        assert!(html.contains("Secure Login"));

        server.shutdown();
    }

    #[tokio::test]
    async fn password_login_failure_stays_anonymous() {
        let (mut server, _) = spawn_app(LoginMode::Password).await;
        let base = format!("http://{}", server.local_addr());
        let client = http_client();

        let response = client
            .post(format!("{base}/auth/login"))
            .form(&[("email", "user@example.com"), ("password", "wrongpw")])
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), reqwest::StatusCode::OK);
        assert!(response.headers().get(reqwest::header::SET_COOKIE).is_none());
        let html = response.text().await.unwrap();
        assert!(html.contains("Invalid login credentials"));

        server.shutdown();
    }

    #[tokio::test]
    async fn magic_link_flow_end_to_end() {
        let (mut server, _) = spawn_app(LoginMode::MagicLink).await;
        let base = format!("http://{}", server.local_addr());
        let client = http_client();

        // Unknown address gets the distinct not-authorized message.
        let response = client
            .post(format!("{base}/auth/magic-link"))
            .form(&[("email", "stranger@example.com")])
            .send()
            .await
            .unwrap();
        let html = response.text().await.unwrap();
        assert!(html.contains("not authorized for the training simulation"));

        // Provisioned address gets the awaiting-link notice; the learner
        // stays anonymous until the callback.
        let response = client
            .post(format!("{base}/auth/magic-link"))
            .form(&[("email", "provisioned@example.com")])
            .send()
            .await
            .unwrap();
        let html = response.text().await.unwrap();
        assert!(html.contains("Check your email"));

        // Step 2 of the callback with a valid token pair establishes the
        // session; the gate view immediately reflects it.
        let response = client
            .get(format!(
                "{base}/auth/complete?access_token=access-abc&refresh_token=refresh-xyz&expires_in=3600&token_type=bearer&type=magiclink"
            ))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), reqwest::StatusCode::SEE_OTHER);
        let cookie = session_cookie_from(&response);

        let response = client
            .get(format!("{base}/"))
            .header(reqwest::header::COOKIE, &cookie)
            .send()
            .await
            .unwrap();
        let html = response.text().await.unwrap();
        assert!(html.contains("Logged in as user@example.com"));

        // A forged token pair is rejected and establishes nothing.
        let response = client
            .get(format!(
                "{base}/auth/complete?access_token=forged&refresh_token=refresh-xyz"
            ))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), reqwest::StatusCode::OK);
        assert!(response.headers().get(reqwest::header::SET_COOKIE).is_none());

        server.shutdown();
    }

    #[tokio::test]
    async fn shutdown_is_idempotent() {
        let (mut server, _) = spawn_app(LoginMode::Password).await;
        server.shutdown();
        server.shutdown();
    }
}
