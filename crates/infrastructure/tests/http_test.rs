#[cfg(test)]
mod tests {
    use std::net::SocketAddr;

    use axum::http::{HeaderMap, StatusCode};
    use axum::routing::{get, post};
    use axum::{Json, Router};
    use serde_json::json;
    use uuid::Uuid;

    use robosched_core::config::{AuthConfig, RunnerConfig};
    use robosched_core::traits::{CodeRunner, TokenValidator};
    use robosched_core::EngineError;
    use robosched_infrastructure::{HttpCodeRunner, HttpTokenValidator};

    async fn serve(app: Router) -> SocketAddr {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        addr
    }

    #[tokio::test]
    async fn test_runner_posts_code_and_prev_result() {
        let app = Router::new().route(
            "/run",
            post(|Json(body): Json<serde_json::Value>| async move {
                assert_eq!(body["code"], "return 1;");
                assert_eq!(body["prevResult"], json!({"v": 41}));
                Json(json!({"result": 42, "notification": null}))
            }),
        );
        let addr = serve(app).await;

        let runner = HttpCodeRunner::new(&RunnerConfig {
            endpoint: format!("http://{addr}/run"),
        });
        let prev = json!({"v": 41});
        let payload = runner.run("return 1;", Some(&prev)).await.unwrap();
        assert_eq!(payload["result"], 42);
    }

    #[tokio::test]
    async fn test_runner_maps_service_failure_to_invocation_error() {
        let app = Router::new().route(
            "/run",
            post(|| async { (StatusCode::INTERNAL_SERVER_ERROR, "worker crashed") }),
        );
        let addr = serve(app).await;

        let runner = HttpCodeRunner::new(&RunnerConfig {
            endpoint: format!("http://{addr}/run"),
        });
        let err = runner.run("return 1;", None).await.unwrap_err();
        assert!(matches!(err, EngineError::Invocation(_)));
    }

    #[tokio::test]
    async fn test_token_validator_exchanges_token_for_user_id() {
        let user_id = Uuid::new_v4();
        let app = Router::new().route(
            "/verify",
            get(move |headers: HeaderMap| async move {
                let auth = headers
                    .get("authorization")
                    .and_then(|v| v.to_str().ok())
                    .unwrap_or_default();
                if auth == "Bearer good-token" {
                    Ok(Json(json!({"user_id": user_id})))
                } else {
                    Err(StatusCode::UNAUTHORIZED)
                }
            }),
        );
        let addr = serve(app).await;

        let validator = HttpTokenValidator::new(&AuthConfig {
            verify_url: format!("http://{addr}/verify"),
        });
        assert_eq!(validator.validate("good-token").await.unwrap(), user_id);

        let err = validator.validate("stale-token").await.unwrap_err();
        assert!(matches!(err, EngineError::InvalidToken(_)));
    }
}
