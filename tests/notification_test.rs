//! WhatsApp gateway client behavior against a mock HTTP server.

use mockito::Matcher;

use chika_pos::services::notification::{GatewayError, WaGateway, WaTarget, WhatsAppClient};

#[tokio::test]
async fn sends_the_expected_form_fields() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", "/send")
        .match_body(Matcher::AllOf(vec![
            Matcher::UrlEncoded("device_id".into(), "dev-1".into()),
            Matcher::UrlEncoded("number".into(), "081234567890".into()),
            Matcher::UrlEncoded("message".into(), "halo".into()),
        ]))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"status": true, "reason": null}"#)
        .create_async()
        .await;

    let client = WhatsAppClient::new(server.url(), "dev-1".to_string());
    let result = client
        .send_text(&WaTarget::Number("081234567890".to_string()), "halo")
        .await;

    assert!(result.is_ok());
    mock.assert_async().await;
}

#[tokio::test]
async fn group_targets_use_the_group_field() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", "/send")
        .match_body(Matcher::AllOf(vec![
            Matcher::UrlEncoded("device_id".into(), "dev-1".into()),
            Matcher::UrlEncoded("group".into(), "grup-kasir".into()),
        ]))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"status": true}"#)
        .create_async()
        .await;

    let client = WhatsAppClient::new(server.url(), "dev-1".to_string());
    let result = client
        .send_text(&WaTarget::Group("grup-kasir".to_string()), "laporan")
        .await;

    assert!(result.is_ok());
    mock.assert_async().await;
}

#[tokio::test]
async fn a_status_false_response_is_a_rejection() {
    let mut server = mockito::Server::new_async().await;
    let _mock = server
        .mock("POST", "/send")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"status": false, "reason": "device disconnected"}"#)
        .create_async()
        .await;

    let client = WhatsAppClient::new(server.url(), "dev-1".to_string());
    let result = client
        .send_text(&WaTarget::Number("081234567890".to_string()), "halo")
        .await;

    match result {
        Err(GatewayError::Rejected(reason)) => assert_eq!(reason, "device disconnected"),
        other => panic!("expected rejection, got {:?}", other.err()),
    }
}

#[tokio::test]
async fn http_errors_surface_as_request_errors() {
    let mut server = mockito::Server::new_async().await;
    let _mock = server
        .mock("POST", "/send")
        .with_status(500)
        .create_async()
        .await;

    let client = WhatsAppClient::new(server.url(), "dev-1".to_string());
    let result = client
        .send_text(&WaTarget::Number("081234567890".to_string()), "halo")
        .await;

    assert!(matches!(result, Err(GatewayError::Request(_))));
}

#[tokio::test]
async fn the_circuit_opens_after_consecutive_failures() {
    let mut server = mockito::Server::new_async().await;
    let _mock = server
        .mock("POST", "/send")
        .with_status(500)
        .expect_at_least(2)
        .create_async()
        .await;

    let client = WhatsAppClient::with_circuit_breaker(server.url(), "dev-1".to_string(), 2, 60);

    for _ in 0..2 {
        let _ = client
            .send_text(&WaTarget::Number("081234567890".to_string()), "halo")
            .await;
    }

    let result = client
        .send_text(&WaTarget::Number("081234567890".to_string()), "halo")
        .await;
    assert!(matches!(result, Err(GatewayError::CircuitOpen)));
    assert_eq!(client.circuit_state(), "open");
}
