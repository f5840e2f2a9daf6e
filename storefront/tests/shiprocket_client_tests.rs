// tests/shiprocket_client_tests.rs
mod common;

use common::setup_tracing;
use mockito::Matcher;
use rust_decimal::Decimal;
use serial_test::serial;
use storefront::config::ShiprocketConfig;
use storefront::errors::AppError;
use storefront::services::shiprocket::{Fulfillment, ShiprocketClient};

const LOGIN_OK: &str = r#"{"token":"tok-1","expires_at":"2099-01-01T00:00:00Z"}"#;

fn client_for(base_url: String) -> ShiprocketClient {
  ShiprocketClient::new(&ShiprocketConfig {
    api_base_url: base_url,
    email: Some("api@shop.test".to_string()),
    password: Some("secret".to_string()),
    pickup_location: "Home".to_string(),
    pickup_pincode: "201301".to_string(),
  })
}

#[tokio::test]
#[serial]
async fn token_is_reused_until_expiry() {
  setup_tracing();
  let mut server = mockito::Server::new_async().await;

  let login = server
    .mock("POST", "/auth/login")
    .match_body(Matcher::PartialJsonString(r#"{"email":"api@shop.test"}"#.to_string()))
    .with_status(200)
    .with_header("content-type", "application/json")
    .with_body(LOGIN_OK)
    .expect(1)
    .create_async()
    .await;

  let awb = server
    .mock("POST", "/courier/assign/awb")
    .match_header("authorization", "Bearer tok-1")
    .match_body(Matcher::Json(serde_json::json!({ "shipment_id": 42 })))
    .with_status(200)
    .with_header("content-type", "application/json")
    .with_body(r#"{"response":{"data":{"awb_code":"AWB777"}}}"#)
    .expect(1)
    .create_async()
    .await;

  let track = server
    .mock("GET", "/courier/track/shipment/42")
    .match_header("authorization", "Bearer tok-1")
    .with_status(200)
    .with_header("content-type", "application/json")
    .with_body(r#"{"tracking_data":{"shipment_status":"DELIVERED"}}"#)
    .expect(1)
    .create_async()
    .await;

  let client = client_for(server.url());
  assert!(client.is_configured());
  assert_eq!(client.assign_awb(42).await.unwrap().as_deref(), Some("AWB777"));
  let tracking = client.track_shipment(42).await.unwrap();
  assert_eq!(tracking["tracking_data"]["shipment_status"], "DELIVERED");

  login.assert_async().await;
  awb.assert_async().await;
  track.assert_async().await;
}

#[tokio::test]
#[serial]
async fn expired_token_triggers_a_new_login() {
  setup_tracing();
  let mut server = mockito::Server::new_async().await;

  let login = server
    .mock("POST", "/auth/login")
    .with_status(200)
    .with_header("content-type", "application/json")
    .with_body(r#"{"token":"short","expires_at":"2000-01-01T00:00:00Z"}"#)
    .expect(2)
    .create_async()
    .await;
  server
    .mock("GET", "/courier/track/awb/AWB1")
    .with_status(200)
    .with_header("content-type", "application/json")
    .with_body(r#"{"tracking_data":{}}"#)
    .expect(2)
    .create_async()
    .await;

  let client = client_for(server.url());
  client.track_awb("AWB1").await.unwrap();
  client.track_awb("AWB1").await.unwrap();
  login.assert_async().await;
}

#[tokio::test]
#[serial]
async fn unauthorized_response_drops_cached_token() {
  setup_tracing();
  let mut server = mockito::Server::new_async().await;

  let login = server
    .mock("POST", "/auth/login")
    .with_status(200)
    .with_header("content-type", "application/json")
    .with_body(LOGIN_OK)
    .expect(2)
    .create_async()
    .await;
  server
    .mock("GET", "/orders/show/shipment/9")
    .with_status(401)
    .with_header("content-type", "application/json")
    .with_body(r#"{"message":"Token has expired"}"#)
    .expect(1)
    .create_async()
    .await;
  server
    .mock("GET", "/orders/show/shipment/10")
    .with_status(200)
    .with_header("content-type", "application/json")
    .with_body(r#"{"data":{"id":10}}"#)
    .create_async()
    .await;

  let client = client_for(server.url());
  match client.get_shipment(9).await {
    Err(AppError::Upstream(message)) => assert_eq!(message, "Token has expired"),
    other => panic!("expected upstream error, got {:?}", other),
  }
  let shipment = client.get_shipment(10).await.unwrap();
  assert_eq!(shipment["data"]["id"], 10);
  login.assert_async().await;
}

#[tokio::test]
#[serial]
async fn missing_order_maps_to_not_found() {
  setup_tracing();
  let mut server = mockito::Server::new_async().await;
  server
    .mock("POST", "/auth/login")
    .with_status(200)
    .with_header("content-type", "application/json")
    .with_body(LOGIN_OK)
    .create_async()
    .await;
  server
    .mock("GET", "/orders/show/SR-404")
    .with_status(404)
    .with_header("content-type", "application/json")
    .with_body(r#"{"message":"Order not found"}"#)
    .create_async()
    .await;

  let client = client_for(server.url());
  let err = client.get_order("SR-404").await.unwrap_err();
  assert!(matches!(err, AppError::NotFound(ref m) if m == "Order not found"));
}

#[tokio::test]
#[serial]
async fn serviceability_query_carries_pincodes_and_weight() {
  setup_tracing();
  let mut server = mockito::Server::new_async().await;
  server
    .mock("POST", "/auth/login")
    .with_status(200)
    .with_header("content-type", "application/json")
    .with_body(LOGIN_OK)
    .create_async()
    .await;
  let rates = server
    .mock("GET", "/courier/serviceability/")
    .match_query(Matcher::AllOf(vec![
      Matcher::UrlEncoded("pickup_postcode".into(), "201301".into()),
      Matcher::UrlEncoded("delivery_postcode".into(), "560038".into()),
      Matcher::UrlEncoded("weight".into(), "0.2".into()),
      Matcher::UrlEncoded("cod".into(), "0".into()),
    ]))
    .with_status(200)
    .with_header("content-type", "application/json")
    .with_body(r#"{"data":{"available_courier_companies":[]}}"#)
    .expect(1)
    .create_async()
    .await;

  let client = client_for(server.url());
  let body = client
    .shipping_rates("201301", "560038", Decimal::new(2, 1))
    .await
    .unwrap();
  assert!(body["data"]["available_courier_companies"].is_array());
  rates.assert_async().await;
}

#[tokio::test]
#[serial]
async fn rejected_credentials_are_reported() {
  setup_tracing();
  let mut server = mockito::Server::new_async().await;
  server
    .mock("POST", "/auth/login")
    .with_status(403)
    .with_header("content-type", "application/json")
    .with_body(r#"{"message":"Invalid email and password combination"}"#)
    .create_async()
    .await;

  let client = client_for(server.url());
  match client.assign_awb(1).await {
    Err(AppError::Upstream(message)) => {
      assert!(message.starts_with("Shiprocket rejected the API user credentials"));
      assert!(message.contains("Invalid email and password combination"));
    }
    other => panic!("expected upstream error, got {:?}", other),
  }
}

#[tokio::test]
#[serial]
async fn missing_credentials_fail_without_a_request() {
  setup_tracing();
  let client = ShiprocketClient::new(&ShiprocketConfig {
    api_base_url: "http://127.0.0.1:9".to_string(),
    email: None,
    password: None,
    pickup_location: "Home".to_string(),
    pickup_pincode: "201301".to_string(),
  });
  assert!(!client.is_configured());
  assert!(matches!(client.track_awb("X").await, Err(AppError::Config(_))));
}

#[tokio::test]
#[serial]
async fn caller_supplied_ids_stay_inside_their_path_segment() {
  setup_tracing();
  let mut server = mockito::Server::new_async().await;
  server
    .mock("POST", "/auth/login")
    .with_status(200)
    .with_header("content-type", "application/json")
    .with_body(LOGIN_OK)
    .create_async()
    .await;
  let awb = server
    .mock("GET", "/courier/track/awb/..%2F..%2Forders")
    .with_status(200)
    .with_header("content-type", "application/json")
    .with_body(r#"{"tracking_data":{}}"#)
    .expect(1)
    .create_async()
    .await;
  let order = server
    .mock("GET", "/orders/show/SR-1%3Fpage=2")
    .with_status(200)
    .with_header("content-type", "application/json")
    .with_body(r#"{"data":{"id":"SR-1"}}"#)
    .expect(1)
    .create_async()
    .await;

  let client = client_for(server.url());
  client.track_awb("../../orders").await.unwrap();
  client.get_order("SR-1?page=2").await.unwrap();
  awb.assert_async().await;
  order.assert_async().await;
}
