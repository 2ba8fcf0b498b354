//! End-to-end forwarding through a plaintext gateway.

use cors_gateway::config::{presets, AlternateBaseConfig};

mod common;
use common::{client, gateway_config, route, start_gateway, start_programmable_backend, upstream, MockReply};

#[tokio::test]
async fn chat_completion_body_and_content_type_round_trip() {
    let inference = start_programmable_backend(|req| {
        MockReply::new(200, format!("{{\"echo\":{}}}", String::from_utf8_lossy(&req.body)))
            .header("Content-Type", "application/json; charset=utf-8")
    })
    .await;

    let config = gateway_config(
        vec![upstream("inference", &inference.url(), 30_000)],
        vec![route("inference-api", "/v1/", "inference", None)],
    );
    let (addr, shutdown) = start_gateway(config).await;

    let payload = r#"{"model":"asl","messages":[{"role":"user","content":"hi"}]}"#;
    let res = client()
        .post(format!("http://{}/v1/chat/completions", addr))
        .header("Content-Type", "application/json")
        .body(payload)
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), 200);
    assert_eq!(res.headers()["content-type"], "application/json; charset=utf-8");
    assert_eq!(res.headers()["access-control-allow-origin"], "*");
    assert_eq!(res.text().await.unwrap(), format!("{{\"echo\":{}}}", payload));

    let seen = inference.requests();
    assert_eq!(seen.len(), 1);
    assert_eq!(seen[0].method, "POST");
    assert_eq!(seen[0].target, "/v1/chat/completions");
    assert_eq!(seen[0].body, payload.as_bytes());
    assert_eq!(seen[0].header("content-type"), Some("application/json"));
    assert!(seen[0].header("x-request-id").is_some());

    shutdown.trigger();
}

#[tokio::test]
async fn upstream_error_status_and_body_are_relayed() {
    let marketplace = start_programmable_backend(|_| {
        MockReply::new(401, r#"{"errors":[{"message":"Invalid access token"}]}"#)
    })
    .await;

    let config = gateway_config(
        vec![upstream("marketplace", &marketplace.url(), 30_000)],
        vec![route("marketplace-api", "/api/ebay/", "marketplace", Some("/"))],
    );
    let (addr, shutdown) = start_gateway(config).await;

    let res = client()
        .get(format!("http://{}/api/ebay/buy/browse/v1/item_summary/search?q=x", addr))
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), 401);
    assert_eq!(res.headers()["access-control-allow-origin"], "*");
    assert_eq!(
        res.text().await.unwrap(),
        r#"{"errors":[{"message":"Invalid access token"}]}"#
    );

    shutdown.trigger();
}

#[tokio::test]
async fn hop_by_hop_headers_are_stripped_both_ways() {
    let backend = start_programmable_backend(|_| {
        MockReply::new(200, "ok")
            .header("Keep-Alive", "timeout=5")
            .header("X-Upstream", "yes")
            .header("Access-Control-Allow-Origin", "https://upstream.example")
    })
    .await;

    let config = gateway_config(
        vec![upstream("control", &backend.url(), 10_000)],
        vec![route("control", "/robot/", "control", Some("/"))],
    );
    let (addr, shutdown) = start_gateway(config).await;

    let res = client()
        .post(format!("http://{}/robot/command", addr))
        .header("Connection", "X-Private-Hop")
        .header("X-Private-Hop", "secret")
        .header("X-Kept", "1")
        .body(r#"{"command":"wave"}"#)
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), 200);
    assert!(res.headers().get("keep-alive").is_none());
    assert_eq!(res.headers()["x-upstream"], "yes");
    let origins: Vec<_> = res.headers().get_all("access-control-allow-origin").iter().collect();
    assert_eq!(origins, vec!["*"]);
    assert!(res.headers().get("access-control-max-age").is_none());

    let seen = &backend.requests()[0];
    assert_eq!(seen.target, "/command");
    assert_eq!(seen.header("x-private-hop"), None);
    assert_eq!(seen.header("x-kept"), Some("1"));
    // the upstream leg gets its own Host
    assert_eq!(seen.header("host"), Some(backend.addr.to_string().as_str()));

    shutdown.trigger();
}

#[tokio::test]
async fn preflight_never_contacts_the_upstream() {
    let backend = start_programmable_backend(|_| MockReply::new(200, "should not be called")).await;
    let config = gateway_config(
        vec![upstream("inference", &backend.url(), 30_000)],
        vec![route("everything", "/", "inference", None)],
    );
    let (addr, shutdown) = start_gateway(config).await;

    for path in ["/v1/chat/completions", "/api/ebay/anything", "/"] {
        let res = client()
            .request(reqwest::Method::OPTIONS, format!("http://{}{}", addr, path))
            .header("Origin", "https://app.example")
            .header("Access-Control-Request-Method", "POST")
            .send()
            .await
            .unwrap();

        assert_eq!(res.status(), 200);
        assert_eq!(res.headers()["access-control-allow-origin"], "*");
        assert_eq!(
            res.headers()["access-control-allow-methods"],
            "GET, POST, PUT, DELETE, OPTIONS"
        );
        assert_eq!(res.headers()["access-control-max-age"], "86400");
        assert!(res.bytes().await.unwrap().is_empty());
    }
    assert_eq!(backend.hits(), 0);

    shutdown.trigger();
}

#[tokio::test]
async fn unknown_path_returns_json_404() {
    let (addr, shutdown) = start_gateway(gateway_config(Vec::new(), Vec::new())).await;

    let res = client().get(format!("http://{}/favicon.ico", addr)).send().await.unwrap();
    assert_eq!(res.status(), 404);
    assert_eq!(res.headers()["access-control-allow-origin"], "*");
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body, serde_json::json!({"error": "Endpoint not found"}));

    shutdown.trigger();
}

#[tokio::test]
async fn sandbox_header_selects_the_marketplace_base() {
    let sandbox = start_programmable_backend(|_| MockReply::new(200, "sandbox")).await;
    let production = start_programmable_backend(|_| MockReply::new(200, "production")).await;

    let mut marketplace = upstream("marketplace", &sandbox.url(), 30_000);
    marketplace.alternate = Some(AlternateBaseConfig {
        header: presets::SANDBOX_HEADER.to_string(),
        primary_value: "true".to_string(),
        base_url: production.url(),
    });
    let config = gateway_config(
        vec![marketplace],
        vec![route("marketplace-api", "/api/ebay/", "marketplace", Some("/"))],
    );
    let (addr, shutdown) = start_gateway(config).await;
    let url = format!("http://{}/api/ebay/buy/browse/v1/item_summary/search?q=widget", addr);

    let res = client().get(&url).header("X-eBay-Sandbox", "true").send().await.unwrap();
    assert_eq!(res.text().await.unwrap(), "sandbox");
    let res = client().get(&url).send().await.unwrap();
    assert_eq!(res.text().await.unwrap(), "sandbox");
    let res = client().get(&url).header("X-eBay-Sandbox", "false").send().await.unwrap();
    assert_eq!(res.text().await.unwrap(), "production");

    assert_eq!(sandbox.hits(), 2);
    assert_eq!(production.hits(), 1);
    assert_eq!(
        sandbox.requests()[0].target,
        "/buy/browse/v1/item_summary/search?q=widget"
    );

    shutdown.trigger();
}

#[tokio::test]
async fn longest_prefix_wins_over_declaration_order() {
    let general = start_programmable_backend(|_| MockReply::new(200, "general")).await;
    let oauth = start_programmable_backend(|_| MockReply::new(200, "oauth")).await;

    let config = gateway_config(
        vec![
            upstream("general", &general.url(), 30_000),
            upstream("oauth", &oauth.url(), 30_000),
        ],
        vec![
            route("api", "/api/ebay/", "general", Some("/")),
            route("oauth", "/api/ebay/oauth/", "oauth", Some("/identity/v1/oauth2/")),
        ],
    );
    let (addr, shutdown) = start_gateway(config).await;

    let res = client()
        .post(format!("http://{}/api/ebay/oauth/token", addr))
        .send()
        .await
        .unwrap();
    assert_eq!(res.text().await.unwrap(), "oauth");
    assert_eq!(oauth.requests()[0].target, "/identity/v1/oauth2/token");
    assert_eq!(general.hits(), 0);

    shutdown.trigger();
}

#[tokio::test]
async fn redirects_are_relayed_not_followed() {
    let backend = start_programmable_backend(|_| {
        MockReply::new(302, "").header("Location", "/login")
    })
    .await;
    let config = gateway_config(
        vec![upstream("inference", &backend.url(), 30_000)],
        vec![route("health", "/health", "inference", None)],
    );
    let (addr, shutdown) = start_gateway(config).await;

    let no_follow = reqwest::Client::builder()
        .no_proxy()
        .redirect(reqwest::redirect::Policy::none())
        .build()
        .unwrap();
    let res = no_follow.get(format!("http://{}/health", addr)).send().await.unwrap();
    assert_eq!(res.status(), 302);
    assert_eq!(res.headers()["location"], "/login");
    assert_eq!(backend.hits(), 1);

    shutdown.trigger();
}

#[tokio::test]
async fn binary_bodies_are_relayed_byte_for_byte() {
    let blob: Vec<u8> = vec![0x00, 0xff, 0xfe, 0x80, 0x0d, 0x0a, 0xc3, 0x28, 0x00, 0x7f];
    let reply = blob.clone();
    let storage = start_programmable_backend(move |_| {
        MockReply::new(200, reply.clone()).header("Content-Type", "application/octet-stream")
    })
    .await;

    let config = gateway_config(
        vec![upstream("storage", &storage.url(), 30_000)],
        vec![route("storage", "/blobs/", "storage", Some("/"))],
    );
    let (addr, shutdown) = start_gateway(config).await;

    let upload: Vec<u8> = (0..=255u8).rev().collect();
    let res = client()
        .put(format!("http://{}/blobs/raw", addr))
        .body(upload.clone())
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), 200);
    assert_eq!(res.headers()["content-type"], "application/octet-stream");
    assert_eq!(&res.bytes().await.unwrap()[..], &blob[..]);
    assert_eq!(storage.requests()[0].body, upload);
    assert_eq!(storage.requests()[0].target, "/raw");

    shutdown.trigger();
}
