//! Scenario tests for the auth service and its HTTP surface

mod service_tests {
    use crate::application::token::{EncodeOverrides, TokenType};
    use crate::application::SessionRegistry;
    use crate::domain::cache::Cache;
    use crate::error::AuthError;
    use crate::infra::memory::{MemoryCache, TxLog};
    use crate::testutil::*;

    #[tokio::test]
    async fn test_login_issues_typed_pair() {
        let fx = fixture();
        let tokens = fx
            .service
            .login(login_input("alice", PASSWORD, "laptop"))
            .await
            .unwrap();

        let codec = fx.service.codec();
        let access = codec.decode(&tokens.access_token).unwrap();
        let refresh = codec.decode(&tokens.refresh_token).unwrap();

        assert!(access.is(TokenType::Access));
        assert!(refresh.is(TokenType::Refresh));
        assert_eq!(access.sub, fx.user.user_id.to_hex());
        assert_eq!(refresh.sub, fx.user.user_id.to_hex());
        assert!(tokens.refresh_max_age > 3590 && tokens.refresh_max_age <= 3600);

        let key = SessionRegistry::<MemoryCache>::key(&fx.user.user_id);
        let entries = fx.cache.get_list(&key).await.unwrap();
        assert_eq!(entries, vec![format!("laptop::{}", tokens.refresh_token)]);

        let ttl = fx.cache.ttl(&key).unwrap().as_secs_f64();
        assert!(ttl <= tokens.refresh_max_age as f64);
        assert!(ttl > 3590.0);
        let until_expiry = (tokens.refresh_expires_at - chrono::Utc::now()).num_seconds();
        assert!((until_expiry as f64 - ttl).abs() <= 2.0);
    }

    #[tokio::test]
    async fn test_refresh_resets_key_ttl() {
        let fx = fixture();
        let (_, token) = fx
            .service
            .codec()
            .encode(&fx.user.user_id.to_hex(), TokenType::Refresh)
            .unwrap();
        let (_, other) = fx
            .service
            .codec()
            .encode(&fx.user.user_id.to_hex(), TokenType::Refresh)
            .unwrap();
        let registry = fx.service.registry();
        registry.register(&fx.user.user_id, "phone", &other, 60).await.unwrap();
        registry.register(&fx.user.user_id, "laptop", &token, 60).await.unwrap();

        let key = SessionRegistry::<MemoryCache>::key(&fx.user.user_id);
        assert!(fx.cache.ttl(&key).unwrap().as_secs() <= 60);

        let rotated = fx.service.refresh(&fp("laptop"), &token).await.unwrap();
        let ttl = fx.cache.ttl(&key).unwrap().as_secs_f64();
        assert!(ttl <= rotated.refresh_max_age as f64);
        assert!(ttl > 3590.0);
        assert_eq!(registry.count(&fx.user.user_id).await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_login_ignores_login_case() {
        let fx = fixture();
        assert!(
            fx.service
                .login(login_input("ALICE", PASSWORD, "laptop"))
                .await
                .is_ok()
        );
    }

    #[tokio::test]
    async fn test_unknown_user_and_wrong_password_look_alike() {
        let fx = fixture();

        let unknown = fx
            .service
            .login(login_input("mallory", PASSWORD, "fp"))
            .await
            .unwrap_err();
        let wrong = fx
            .service
            .login(login_input("alice", "guess", "fp"))
            .await
            .unwrap_err();

        assert!(matches!(unknown, AuthError::InvalidCredentials));
        assert!(matches!(wrong, AuthError::InvalidCredentials));
        assert_eq!(unknown.to_string(), wrong.to_string());
        assert_eq!(unknown.status_code(), wrong.status_code());
        assert_eq!(fx.service.registry().count(&fx.user.user_id).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_refresh_rotates_and_is_single_use() {
        let fx = fixture();
        let first = fx
            .service
            .login(login_input("alice", PASSWORD, "laptop"))
            .await
            .unwrap();

        let second = fx
            .service
            .refresh(&fp("laptop"), &first.refresh_token)
            .await
            .unwrap();
        assert_ne!(second.refresh_token, first.refresh_token);
        assert_eq!(fx.service.registry().count(&fx.user.user_id).await.unwrap(), 1);

        let replay = fx
            .service
            .refresh(&fp("laptop"), &first.refresh_token)
            .await
            .unwrap_err();
        assert!(matches!(replay, AuthError::SessionRevoked));

        // the replay took the rotated session down with it
        let after = fx
            .service
            .refresh(&fp("laptop"), &second.refresh_token)
            .await
            .unwrap_err();
        assert!(matches!(after, AuthError::SessionRevoked));
    }

    #[tokio::test]
    async fn test_wrong_fingerprint_wipes_all_sessions() {
        let fx = fixture();
        let laptop = fx
            .service
            .login(login_input("alice", PASSWORD, "laptop"))
            .await
            .unwrap();
        let phone = fx
            .service
            .login(login_input("alice", PASSWORD, "phone"))
            .await
            .unwrap();

        let err = fx
            .service
            .refresh(&fp("attacker"), &laptop.refresh_token)
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::SessionRevoked));
        assert_eq!(fx.service.registry().count(&fx.user.user_id).await.unwrap(), 0);

        assert!(
            fx.service
                .refresh(&fp("phone"), &phone.refresh_token)
                .await
                .is_err()
        );
    }

    #[tokio::test]
    async fn test_logout_removes_only_its_session() {
        let fx = fixture();
        let laptop = fx
            .service
            .login(login_input("alice", PASSWORD, "laptop"))
            .await
            .unwrap();
        let phone = fx
            .service
            .login(login_input("alice", PASSWORD, "phone"))
            .await
            .unwrap();

        let status = fx.service.logout(&laptop.refresh_token).await.unwrap();
        assert!(status.success);
        assert_eq!(fx.service.registry().count(&fx.user.user_id).await.unwrap(), 1);

        let again = fx.service.logout(&laptop.refresh_token).await.unwrap_err();
        assert!(matches!(again, AuthError::UnknownToken));

        assert!(
            fx.service
                .refresh(&fp("phone"), &phone.refresh_token)
                .await
                .is_ok()
        );
    }

    #[tokio::test]
    async fn test_sixth_login_wipes_prior_sessions() {
        let fx = fixture();
        let mut issued = Vec::new();
        for i in 0..5 {
            issued.push(
                fx.service
                    .login(login_input("alice", PASSWORD, &format!("device-{i}")))
                    .await
                    .unwrap(),
            );
        }
        assert_eq!(fx.service.registry().count(&fx.user.user_id).await.unwrap(), 5);

        let sixth = fx
            .service
            .login(login_input("alice", PASSWORD, "device-5"))
            .await
            .unwrap();
        assert_eq!(fx.service.registry().count(&fx.user.user_id).await.unwrap(), 1);

        assert!(
            fx.service
                .refresh(&fp("device-5"), &sixth.refresh_token)
                .await
                .is_ok()
        );
    }

    #[tokio::test]
    async fn test_session_count_never_exceeds_cap() {
        let fx = fixture();
        for i in 0..12 {
            fx.service
                .login(login_input("alice", PASSWORD, &format!("d{i}")))
                .await
                .unwrap();
            let count = fx.service.registry().count(&fx.user.user_id).await.unwrap();
            assert!(count <= fx.service.registry().max_sessions());
        }
    }

    #[tokio::test]
    async fn test_token_type_must_match() {
        let fx = fixture();
        let tokens = fx
            .service
            .login(login_input("alice", PASSWORD, "laptop"))
            .await
            .unwrap();

        let err = fx
            .service
            .refresh(&fp("laptop"), &tokens.access_token)
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::Unauthorized));

        let err = fx.service.logout(&tokens.access_token).await.unwrap_err();
        assert!(matches!(err, AuthError::Unauthorized));

        // a rejected type check leaves the registry alone
        assert_eq!(fx.service.registry().count(&fx.user.user_id).await.unwrap(), 1);

        let user = fx
            .service
            .authenticate(&tokens.access_token, TokenType::Access)
            .await
            .unwrap();
        assert_eq!(user.user_id, fx.user.user_id);
        assert!(
            fx.service
                .authenticate(&tokens.refresh_token, TokenType::Access)
                .await
                .is_err()
        );
    }

    #[tokio::test]
    async fn test_untyped_token_is_rejected() {
        let fx = fixture();
        let (_, token) = fx
            .service
            .codec()
            .encode_with(&fx.user.user_id.to_hex(), None, EncodeOverrides::default())
            .unwrap();

        let err = fx
            .service
            .authenticate(&token, TokenType::Access)
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::Unauthorized));
    }

    #[tokio::test]
    async fn test_deleted_user_cannot_refresh() {
        let fx = fixture();
        let tokens = fx
            .service
            .login(login_input("alice", PASSWORD, "laptop"))
            .await
            .unwrap();
        fx.store.remove(&fx.user.user_id);

        let err = fx
            .service
            .refresh(&fp("laptop"), &tokens.refresh_token)
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::Unauthorized));
    }

    #[tokio::test]
    async fn test_garbage_refresh_token() {
        let fx = fixture();
        let err = fx.service.refresh(&fp("x"), "garbage").await.unwrap_err();
        assert!(matches!(err, AuthError::TokenInvalid));
        let err = fx.service.logout("").await.unwrap_err();
        assert!(matches!(err, AuthError::TokenInvalid));
    }

    #[tokio::test]
    async fn test_commit_on_success_rollback_on_failure() {
        let fx = fixture();
        fx.service
            .login(login_input("alice", PASSWORD, "laptop"))
            .await
            .unwrap();
        let _ = fx.service.login(login_input("alice", "nope", "laptop")).await;
        let _ = fx.service.logout("garbage").await;

        assert_eq!(
            fx.store.tx_log(),
            TxLog {
                begun: 3,
                committed: 1,
                rolled_back: 2
            }
        );
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_logins_stay_consistent() {
        use std::sync::Arc;

        let fx = fixture();
        let service = Arc::new(fx.service);

        let handles: Vec<_> = (0..16)
            .map(|i| {
                let service = Arc::clone(&service);
                tokio::spawn(async move {
                    service
                        .login(login_input("alice", PASSWORD, &format!("dev-{i}")))
                        .await
                })
            })
            .collect();

        let mut issued = Vec::new();
        for handle in handles {
            issued.push(handle.await.unwrap().unwrap());
        }

        let registry = service.registry();
        let key = SessionRegistry::<MemoryCache>::key(&fx.user.user_id);
        let entries = registry.cache().get_list(&key).await.unwrap();

        // the size check is racy, so only bounds hold
        assert!(!entries.is_empty());
        assert!(entries.len() <= issued.len());
        for entry in &entries {
            assert!(
                issued
                    .iter()
                    .any(|t| entry.ends_with(&format!("::{}", t.refresh_token)))
            );
        }
    }
}

mod router_tests {
    use axum::Router;
    use axum::body::Body;
    use axum::http::{Request, StatusCode, header};
    use axum::middleware::from_fn_with_state;
    use axum::routing::get;
    use tower::ServiceExt;

    use crate::infra::{MemoryCache, MemoryUserStore};
    use crate::presentation::AuthAppState;
    use crate::presentation::middleware::{AuthenticatedUser, require_access_token};
    use crate::presentation::router::api_router;
    use crate::testutil::*;

    fn app() -> Router {
        let (state, _user) = app_state(config());
        protected(state.clone()).merge(api_router(state))
    }

    fn protected(state: AuthAppState<MemoryUserStore, MemoryCache, PlainHasher>) -> Router {
        Router::new()
            .route(
                "/v1/whoami",
                get(|user: AuthenticatedUser| async move { user.login }),
            )
            .route_layer(from_fn_with_state(
                state,
                require_access_token::<MemoryUserStore, MemoryCache, PlainHasher>,
            ))
    }

    fn json_post(uri: &str, body: serde_json::Value, cookie: Option<&str>) -> Request<Body> {
        let mut builder = Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json");
        if let Some(cookie) = cookie {
            builder = builder.header(header::COOKIE, cookie);
        }
        builder.body(Body::from(body.to_string())).unwrap()
    }

    fn set_cookie(response: &axum::response::Response) -> String {
        response
            .headers()
            .get(header::SET_COOKIE)
            .unwrap()
            .to_str()
            .unwrap()
            .to_string()
    }

    /// `refresh=<token>` part of a Set-Cookie value
    fn cookie_pair(set_cookie: &str) -> String {
        set_cookie.split(';').next().unwrap().to_string()
    }

    async fn json_body(response: axum::response::Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    async fn login(app: &Router, fingerprint: &str) -> (String, String) {
        let response = app
            .clone()
            .oneshot(json_post(
                "/v1/auth/login",
                serde_json::json!({
                    "login": "alice",
                    "password": PASSWORD,
                    "fingerprint": fingerprint,
                }),
                None,
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let cookie = cookie_pair(&set_cookie(&response));
        let body = json_body(response).await;
        (body["token"].as_str().unwrap().to_string(), cookie)
    }

    #[tokio::test]
    async fn test_login_sets_refresh_cookie() {
        let app = app();
        let response = app
            .oneshot(json_post(
                "/v1/auth/login",
                serde_json::json!({
                    "login": "alice",
                    "password": PASSWORD,
                    "fingerprint": "laptop",
                }),
                None,
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let cookie = set_cookie(&response);
        assert!(cookie.starts_with("refresh="));
        assert!(cookie.contains("HttpOnly"));
        assert!(cookie.contains("Secure"));
        assert!(cookie.contains("SameSite=Lax"));
        assert!(cookie.contains("Path=/"));
        assert!(cookie.contains("Max-Age="));

        let body = json_body(response).await;
        assert!(body["token"].as_str().is_some_and(|t| t.split('.').count() == 3));
    }

    #[tokio::test]
    async fn test_bad_credentials_are_401() {
        let app = app();
        let response = app
            .oneshot(json_post(
                "/v1/auth/login",
                serde_json::json!({
                    "login": "alice",
                    "password": "wrong",
                    "fingerprint": "laptop",
                }),
                None,
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert!(response.headers().get(header::SET_COOKIE).is_none());
        let body = json_body(response).await;
        assert_eq!(body["detail"], "Incorrect login or password");
    }

    #[tokio::test]
    async fn test_separator_in_fingerprint_is_400() {
        let app = app();
        let response = app
            .oneshot(json_post(
                "/v1/auth/login",
                serde_json::json!({
                    "login": "alice",
                    "password": PASSWORD,
                    "fingerprint": "a::b",
                }),
                None,
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_login_refresh_replay() {
        let app = app();
        let (_, first_cookie) = login(&app, "laptop").await;

        let response = app
            .clone()
            .oneshot(json_post(
                "/v1/auth/refresh",
                serde_json::json!({ "fingerprint": "laptop" }),
                Some(&first_cookie),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let second_cookie = cookie_pair(&set_cookie(&response));
        assert_ne!(second_cookie, first_cookie);

        let replay = app
            .clone()
            .oneshot(json_post(
                "/v1/auth/refresh",
                serde_json::json!({ "fingerprint": "laptop" }),
                Some(&first_cookie),
            ))
            .await
            .unwrap();
        assert_eq!(replay.status(), StatusCode::UNAUTHORIZED);
        let body = json_body(replay).await;
        assert_eq!(body["detail"], "Current token is not valid anymore");

        let after = app
            .oneshot(json_post(
                "/v1/auth/refresh",
                serde_json::json!({ "fingerprint": "laptop" }),
                Some(&second_cookie),
            ))
            .await
            .unwrap();
        assert_eq!(after.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_refresh_without_cookie_is_401() {
        let app = app();
        let response = app
            .oneshot(json_post(
                "/v1/auth/refresh",
                serde_json::json!({ "fingerprint": "laptop" }),
                None,
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_logout_clears_cookie() {
        let app = app();
        let (_, cookie) = login(&app, "laptop").await;

        let response = app
            .clone()
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/v1/auth/logout")
                    .header(header::COOKIE, &cookie)
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let cleared = set_cookie(&response);
        assert!(cleared.starts_with("refresh=;"));
        assert!(cleared.contains("Max-Age=0"));
        assert_eq!(json_body(response).await, serde_json::json!({ "success": true }));

        let again = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/v1/auth/logout")
                    .header(header::COOKIE, &cookie)
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(again.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(json_body(again).await["detail"], "Invalid token");
    }

    #[tokio::test]
    async fn test_healthcheck() {
        let response = app()
            .oneshot(
                Request::builder()
                    .uri("/v1/healthcheck")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(json_body(response).await, serde_json::json!({ "ok": true }));
    }

    #[tokio::test]
    async fn test_protected_route_requires_access_token() {
        let app = app();
        let (access, cookie) = login(&app, "laptop").await;

        let ok = app
            .clone()
            .oneshot(
                Request::builder()
                    .uri("/v1/whoami")
                    .header(header::AUTHORIZATION, format!("Bearer {access}"))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(ok.status(), StatusCode::OK);
        let bytes = axum::body::to_bytes(ok.into_body(), usize::MAX).await.unwrap();
        assert_eq!(&bytes[..], b"alice");

        let refresh_token = cookie.trim_start_matches("refresh=");
        let wrong_type = app
            .clone()
            .oneshot(
                Request::builder()
                    .uri("/v1/whoami")
                    .header(header::AUTHORIZATION, format!("Bearer {refresh_token}"))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(wrong_type.status(), StatusCode::UNAUTHORIZED);

        let missing = app
            .oneshot(
                Request::builder()
                    .uri("/v1/whoami")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(missing.status(), StatusCode::UNAUTHORIZED);
    }
}
