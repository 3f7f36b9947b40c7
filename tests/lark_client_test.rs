use alert_relay::cards::{render_resolved, AlertCard, CardActionPayload};
use alert_relay::config::LarkConfig;
use alert_relay::models::Alert;
use alert_relay::notifications::{CardTransport, LarkClient, NotifyError};
use alert_relay::processing::AlertFields;
use mockito::{Matcher, Server};
use serde_json::json;

fn config(base_url: String) -> LarkConfig {
    LarkConfig {
        app_id: "cli_app".to_string(),
        app_secret: "app-secret".to_string(),
        chat_id: "oc_alerts".to_string(),
        base_url,
        ..Default::default()
    }
}

fn firing_card() -> alert_relay::cards::RenderedCard {
    let alert = Alert {
        status: "firing".to_string(),
        starts_at: "2025-03-01T08:30:00Z".to_string(),
        ..Default::default()
    };
    let fields = AlertFields {
        alert_name: "HighMemory".to_string(),
        project: "payments".to_string(),
        notify_emails: String::new(),
        grafana_url: "N/A".to_string(),
        runbook_url: "N/A".to_string(),
        description: "N/A".to_string(),
    };
    AlertCard::new(&alert, fields).render_firing()
}

async fn mock_token(server: &mut Server, expected_calls: usize) -> mockito::Mock {
    server
        .mock("POST", "/open-apis/auth/v3/tenant_access_token/internal")
        .match_body(Matcher::Json(json!({"app_id": "cli_app", "app_secret": "app-secret"})))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"code":0,"msg":"ok","tenant_access_token":"t-123","expire":7200}"#)
        .expect(expected_calls)
        .create_async()
        .await
}

#[tokio::test]
async fn test_post_card_returns_message_id() {
    let mut server = Server::new_async().await;
    let token = mock_token(&mut server, 1).await;
    let post = server
        .mock("POST", "/open-apis/im/v1/messages")
        .match_query(Matcher::UrlEncoded("receive_id_type".into(), "chat_id".into()))
        .match_header("authorization", "Bearer t-123")
        .match_body(Matcher::PartialJson(json!({
            "receive_id": "oc_alerts",
            "msg_type": "interactive"
        })))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"code":0,"msg":"success","data":{"message_id":"om_1"}}"#)
        .expect(2)
        .create_async()
        .await;

    let client = LarkClient::new(&config(server.url())).unwrap();
    let card = firing_card();

    let reply = client.post_card("oc_alerts", &card).await.unwrap();
    assert!(reply.is_success());
    assert_eq!(reply.message_id.as_deref(), Some("om_1"));

    // the tenant token is reused
    client.post_card("oc_alerts", &card).await.unwrap();

    token.assert_async().await;
    post.assert_async().await;
}

#[tokio::test]
async fn test_in_band_error_is_reported_in_reply() {
    let mut server = Server::new_async().await;
    let _token = mock_token(&mut server, 1).await;
    let _update = server
        .mock("PATCH", "/open-apis/im/v1/messages/om_1")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"code":230001,"msg":"message not found"}"#)
        .create_async()
        .await;

    let client = LarkClient::new(&config(server.url())).unwrap();
    let card = render_resolved(&CardActionPayload {
        title: "HighMemory".to_string(),
        project: "payments".to_string(),
        time: "2025-03-01T08:30:00Z".to_string(),
        grafana_url: "N/A".to_string(),
        runbook_url: "N/A".to_string(),
        metric: "N/A".to_string(),
        description: "N/A".to_string(),
        action: "resolve".to_string(),
    });

    let reply = client.update_card("om_1", &card).await.unwrap();
    assert!(!reply.is_success());
    assert_eq!(reply.code, 230001);
    assert_eq!(reply.msg, "message not found");
}

#[tokio::test]
async fn test_unparseable_response_is_transport_error() {
    let mut server = Server::new_async().await;
    let _token = mock_token(&mut server, 1).await;
    let _post = server
        .mock("POST", "/open-apis/im/v1/messages")
        .match_query(Matcher::Any)
        .with_status(502)
        .with_body("bad gateway")
        .create_async()
        .await;

    let client = LarkClient::new(&config(server.url())).unwrap();
    let err = client.post_card("oc_alerts", &firing_card()).await.unwrap_err();
    assert!(matches!(err, NotifyError::Transport(ref msg) if msg.contains("502")));
}

#[tokio::test]
async fn test_token_rejection_is_in_band_error() {
    let mut server = Server::new_async().await;
    let _token = server
        .mock("POST", "/open-apis/auth/v3/tenant_access_token/internal")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"code":10003,"msg":"invalid app_secret"}"#)
        .create_async()
        .await;

    let client = LarkClient::new(&config(server.url())).unwrap();
    let err = client.post_card("oc_alerts", &firing_card()).await.unwrap_err();
    assert!(err.is_in_band());
}

#[tokio::test]
async fn test_rejected_token_is_fetched_again() {
    let mut server = Server::new_async().await;
    let token = mock_token(&mut server, 2).await;
    let expired = server
        .mock("POST", "/open-apis/im/v1/messages")
        .match_query(Matcher::Any)
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"code":99991663,"msg":"Invalid access token for authorization"}"#)
        .expect(1)
        .create_async()
        .await;

    let client = LarkClient::new(&config(server.url())).unwrap();
    let card = firing_card();

    let reply = client.post_card("oc_alerts", &card).await.unwrap();
    assert_eq!(reply.code, 99991663);
    expired.remove_async().await;

    let _ok = server
        .mock("POST", "/open-apis/im/v1/messages")
        .match_query(Matcher::Any)
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"code":0,"msg":"success","data":{"message_id":"om_2"}}"#)
        .create_async()
        .await;

    let reply = client.post_card("oc_alerts", &card).await.unwrap();
    assert_eq!(reply.message_id.as_deref(), Some("om_2"));
    token.assert_async().await;
}
