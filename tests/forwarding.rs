//! End-to-end forwarding tests against a mock upstream.

use axum::http::{Method, Response};
use bytes::Bytes;

mod common;

use common::{client, ok, start_proxy, status, test_config, MockUpstream};

#[tokio::test]
async fn test_rewrites_target_and_headers() {
    let upstream = MockUpstream::new(|_| ok("games"));
    let proxy = start_proxy(test_config(), upstream.clone()).await;

    let res = client()
        .get(proxy.url("/games/v1/games?universeIds=1&x=/y"))
        .header("User-Agent", "curl/8.0")
        .header("Roblox-Id", "12345")
        .header("Proxy-Connection", "keep-alive")
        .header("Accept", "application/json")
        .send()
        .await
        .expect("Proxy unreachable");

    assert_eq!(res.status(), 200);
    assert_eq!(res.text().await.unwrap(), "games");

    let seen = upstream.seen();
    assert_eq!(seen.len(), 1);
    let req = &seen[0];
    assert_eq!(req.method(), Method::GET);
    assert_eq!(
        req.uri().to_string(),
        "https://games.roblox.com/v1/games?universeIds=1&x=/y"
    );
    assert_eq!(req.headers()["host"], "games.roblox.com");
    assert_eq!(req.headers()["user-agent"], "RoProxy/1.0");
    assert_eq!(req.headers()["accept"], "application/json");
    assert!(!req.headers().contains_key("roblox-id"));
    assert!(!req.headers().contains_key("proxy-connection"));
}

#[tokio::test]
async fn test_empty_remainder_targets_root() {
    let upstream = MockUpstream::new(|_| ok("root"));
    let proxy = start_proxy(test_config(), upstream.clone()).await;

    let res = client().get(proxy.url("/users/")).send().await.unwrap();

    assert_eq!(res.status(), 200);
    assert_eq!(upstream.seen()[0].uri().to_string(), "https://users.roblox.com/");
}

#[tokio::test]
async fn test_malformed_paths_never_reach_upstream() {
    let upstream = MockUpstream::new(|_| ok("unexpected"));
    let proxy = start_proxy(test_config(), upstream.clone()).await;

    for path in ["/onlyone", "/", "/onlyone?x=1"] {
        let res = client().get(proxy.url(path)).send().await.unwrap();
        assert_eq!(res.status(), 400, "path {path}");
        assert_eq!(res.text().await.unwrap(), "URL format invalid.");
    }

    assert_eq!(upstream.calls(), 0);
}

#[tokio::test]
async fn test_upstream_errors_are_relayed_without_retry() {
    let upstream = MockUpstream::new(|_| status(503, "down for maintenance"));
    let proxy = start_proxy(test_config(), upstream.clone()).await;

    let res = client().get(proxy.url("/catalog/v1/items")).send().await.unwrap();

    assert_eq!(res.status(), 503);
    assert_eq!(res.text().await.unwrap(), "down for maintenance");
    assert_eq!(upstream.calls(), 1);
}

#[tokio::test]
async fn test_hop_by_hop_response_headers_are_dropped() {
    let upstream = MockUpstream::new(|_| {
        Response::builder()
            .status(200)
            .header("keep-alive", "timeout=5")
            .header("upgrade", "h2c")
            .header("proxy-authenticate", "Basic")
            .header("trailer", "expires")
            .header("x-csrf-token", "abc")
            .header("set-cookie", "a=1")
            .header("set-cookie", "b=2")
            .body(Bytes::from_static(b"{}"))
            .unwrap()
    });
    let proxy = start_proxy(test_config(), upstream).await;

    let res = client().get(proxy.url("/auth/v2/logout")).send().await.unwrap();

    let headers = res.headers();
    for name in ["keep-alive", "upgrade", "proxy-authenticate", "trailer"] {
        assert!(!headers.contains_key(name), "{name} leaked");
    }
    assert_eq!(headers["x-csrf-token"], "abc");
    let cookies: Vec<_> = headers.get_all("set-cookie").iter().collect();
    assert_eq!(cookies, vec!["a=1", "b=2"]);
}

#[tokio::test]
async fn test_bodies_round_trip() {
    let upstream = MockUpstream::new(|req| {
        let mut echo = Response::new(req.body().clone());
        *echo.status_mut() = axum::http::StatusCode::CREATED;
        echo
    });
    let proxy = start_proxy(test_config(), upstream.clone()).await;

    let payload: Vec<u8> = (0u8..=255).cycle().take(64 * 1024).collect();
    let res = client()
        .post(proxy.url("/friends/v1/users/1/request-friendship"))
        .header("Content-Type", "application/octet-stream")
        .body(payload.clone())
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), 201);
    assert_eq!(res.bytes().await.unwrap().as_ref(), payload.as_slice());
    assert_eq!(upstream.seen()[0].method(), Method::POST);
    assert_eq!(upstream.seen()[0].body().as_ref(), payload.as_slice());

    let res = client().get(proxy.url("/users/v1/users/1")).send().await.unwrap();
    assert_eq!(res.status(), 201);
    assert!(res.bytes().await.unwrap().is_empty());
    assert!(upstream.seen()[1].body().is_empty());
}

#[tokio::test]
async fn test_oversized_body_is_rejected() {
    let upstream = MockUpstream::new(|_| ok("unexpected"));
    let mut config = test_config();
    config.limits.max_body_bytes = 16;
    let proxy = start_proxy(config, upstream.clone()).await;

    let res = client()
        .post(proxy.url("/apis/v1/x"))
        .body(vec![0u8; 1024])
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), 413);
    assert_eq!(upstream.calls(), 0);
}
