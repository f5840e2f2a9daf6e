// tests/admin_api_tests.rs
mod common;

use actix_web::http::{header, StatusCode};
use actix_web::{test, web, App};
use common::*;
use serde_json::{json, Value};
use serial_test::serial;
use storefront::store::VerificationStore;
use storefront::web::configure_app_routes;

macro_rules! init_app {
  ($state:expr) => {
    test::init_service(
      App::new()
        .app_data(web::Data::new($state.clone()))
        .configure(configure_app_routes),
    )
    .await
  };
}

#[actix_web::test]
#[serial]
async fn health_reports_ok() {
  setup_tracing();
  let t = default_test_app();
  let app = init_app!(t.state);
  let req = test::TestRequest::get().uri("/api/v1/health").to_request();
  let body: Value = test::call_and_read_body_json(&app, req).await;
  assert_eq!(body["status"], "ok");
}

#[actix_web::test]
#[serial]
async fn product_lifecycle() {
  setup_tracing();
  let t = default_test_app();
  let app = init_app!(t.state);

  let req = test::TestRequest::post()
    .uri("/api/v1/products")
    .set_json(json!({ "name": "Hoodie", "description": "Warm", "price": 0 }))
    .to_request();
  let resp = test::call_service(&app, req).await;
  assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

  let req = test::TestRequest::post()
    .uri("/api/v1/products")
    .set_json(json!({
      "name": "Hoodie",
      "description": "Warm",
      "price": 40,
      "image_url": "https://cdn.example.com/hoodie.png",
      "stock": { "M": 7 },
    }))
    .to_request();
  let resp = test::call_service(&app, req).await;
  assert_eq!(resp.status(), StatusCode::CREATED);
  let body: Value = test::read_body_json(resp).await;
  let id = body["product"]["id"].as_str().unwrap().to_string();
  assert_eq!(body["product"]["stock"]["M"], 7);
  assert_eq!(body["product"]["stock"]["XXL"], 0);
  assert_eq!(body["product"]["sizes"], json!(["S", "M", "L", "XL", "XXL"]));

  let req = test::TestRequest::patch()
    .uri(&format!("/api/v1/products/{}", id))
    .set_json(json!({ "active": false }))
    .to_request();
  let body: Value = test::call_and_read_body_json(&app, req).await;
  assert_eq!(body["product"]["active"], false);

  let req = test::TestRequest::get().uri("/api/v1/products").to_request();
  let body: Value = test::call_and_read_body_json(&app, req).await;
  assert_eq!(body["products"].as_array().unwrap().len(), 0);

  let req = test::TestRequest::get().uri("/api/v1/products?active=false").to_request();
  let body: Value = test::call_and_read_body_json(&app, req).await;
  assert_eq!(body["products"].as_array().unwrap().len(), 1);

  let req = test::TestRequest::delete()
    .uri(&format!("/api/v1/products/{}", id))
    .to_request();
  let resp = test::call_service(&app, req).await;
  assert_eq!(resp.status(), StatusCode::OK);

  let req = test::TestRequest::get()
    .uri(&format!("/api/v1/products/{}", id))
    .to_request();
  let resp = test::call_service(&app, req).await;
  assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[actix_web::test]
#[serial]
async fn product_data_uri_images_are_stored() {
  setup_tracing();
  let t = default_test_app();
  let app = init_app!(t.state);

  let req = test::TestRequest::post()
    .uri("/api/v1/products")
    .set_json(json!({
      "name": "Cap",
      "description": "Blue cap",
      "price": 12.5,
      "image_url": "data:image/png;base64,iVBORw0KGgo=",
    }))
    .to_request();
  let resp = test::call_service(&app, req).await;
  assert_eq!(resp.status(), StatusCode::CREATED);
  let body: Value = test::read_body_json(resp).await;
  let url = body["product"]["image_url"].as_str().unwrap();
  assert!(url.starts_with("http://127.0.0.1:8080/uploads/products/"));
  assert!(url.ends_with(".png"));

  let path = url.trim_start_matches("http://127.0.0.1:8080");
  let req = test::TestRequest::get().uri(path).to_request();
  let resp = test::call_service(&app, req).await;
  assert_eq!(resp.status(), StatusCode::OK);
  assert_eq!(resp.headers().get(header::CONTENT_TYPE).unwrap(), "image/png");
  assert_eq!(resp.headers().get(header::X_CONTENT_TYPE_OPTIONS).unwrap(), "nosniff");
}

#[actix_web::test]
#[serial]
async fn multipart_upload_returns_url_and_path() {
  setup_tracing();
  let t = default_test_app();
  let app = init_app!(t.state);

  let boundary = "XBOUNDARYX";
  let payload = format!(
    "--{b}\r\nContent-Disposition: form-data; name=\"file\"; filename=\"tee.jpg\"\r\nContent-Type: image/jpeg\r\n\r\nnot-really-a-jpeg\r\n--{b}--\r\n",
    b = boundary
  );
  let req = test::TestRequest::post()
    .uri("/api/v1/upload")
    .insert_header((header::CONTENT_TYPE, format!("multipart/form-data; boundary={}", boundary)))
    .set_payload(payload)
    .to_request();
  let resp = test::call_service(&app, req).await;
  assert_eq!(resp.status(), StatusCode::OK);
  let body: Value = test::read_body_json(resp).await;
  let path = body["path"].as_str().unwrap();
  assert!(path.starts_with("products/") && path.ends_with(".jpg"));
  assert_eq!(
    body["url"].as_str().unwrap(),
    format!("http://127.0.0.1:8080/uploads/{}", path)
  );

  let req = test::TestRequest::post()
    .uri("/api/v1/upload")
    .set_json(json!({ "file": "" }))
    .to_request();
  let resp = test::call_service(&app, req).await;
  assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[actix_web::test]
#[serial]
async fn svg_uploads_are_rejected() {
  setup_tracing();
  let t = default_test_app();
  let app = init_app!(t.state);

  let boundary = "XBOUNDARYX";
  let payload = format!(
    "--{b}\r\nContent-Disposition: form-data; name=\"file\"; filename=\"logo.svg\"\r\nContent-Type: image/svg+xml\r\n\r\n<svg xmlns=\"http://www.w3.org/2000/svg\"><script>alert(1)</script></svg>\r\n--{b}--\r\n",
    b = boundary
  );
  let req = test::TestRequest::post()
    .uri("/api/v1/upload")
    .insert_header((header::CONTENT_TYPE, format!("multipart/form-data; boundary={}", boundary)))
    .set_payload(payload)
    .to_request();
  let resp = test::call_service(&app, req).await;
  assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
  let body: Value = test::read_body_json(resp).await;
  assert!(body["error"].as_str().unwrap().contains("Unsupported image type: svg"));

  let req = test::TestRequest::post()
    .uri("/api/v1/upload")
    .set_json(json!({ "file": "data:image/svg+xml;base64,PHN2Zz48L3N2Zz4=" }))
    .to_request();
  let resp = test::call_service(&app, req).await;
  assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[actix_web::test]
#[serial]
async fn partners_are_created_listed_and_patched() {
  setup_tracing();
  let t = default_test_app();
  let app = init_app!(t.state);

  let req = test::TestRequest::post()
    .uri("/api/v1/delivery-partners")
    .set_json(json!({ "name": "Swift", "email": "ops@swift.test", "phone": "98000" }))
    .to_request();
  let resp = test::call_service(&app, req).await;
  assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

  let req = test::TestRequest::post()
    .uri("/api/v1/delivery-partners")
    .set_json(json!({ "name": "Swift", "email": "ops@swift.test", "phone": "98000", "location": "Greater Noida" }))
    .to_request();
  let resp = test::call_service(&app, req).await;
  assert_eq!(resp.status(), StatusCode::CREATED);
  let body: Value = test::read_body_json(resp).await;
  let id = body["delivery_partner"]["id"].as_str().unwrap().to_string();
  assert_eq!(body["delivery_partner"]["service_type"], "standard");
  assert_eq!(body["delivery_partner"]["rating"].as_f64(), Some(5.0));

  let req = test::TestRequest::get()
    .uri("/api/v1/delivery-partners?location=noida")
    .to_request();
  let body: Value = test::call_and_read_body_json(&app, req).await;
  assert_eq!(body["delivery_partners"].as_array().unwrap().len(), 1);

  let req = test::TestRequest::patch()
    .uri(&format!("/api/v1/delivery-partners/{}", id))
    .set_json(json!({ "active": false }))
    .to_request();
  let body: Value = test::call_and_read_body_json(&app, req).await;
  assert_eq!(body["delivery_partner"]["active"], false);

  let req = test::TestRequest::get().uri("/api/v1/delivery-partners").to_request();
  let body: Value = test::call_and_read_body_json(&app, req).await;
  assert_eq!(body["delivery_partners"].as_array().unwrap().len(), 0);

  let req = test::TestRequest::get()
    .uri("/api/v1/delivery-partners?active=false")
    .to_request();
  let body: Value = test::call_and_read_body_json(&app, req).await;
  assert_eq!(body["delivery_partners"].as_array().unwrap().len(), 1);

  let req = test::TestRequest::delete()
    .uri(&format!("/api/v1/delivery-partners/{}", id))
    .to_request();
  let resp = test::call_service(&app, req).await;
  assert_eq!(resp.status(), StatusCode::OK);

  let req = test::TestRequest::get()
    .uri(&format!("/api/v1/delivery-partners/{}", id))
    .to_request();
  let resp = test::call_service(&app, req).await;
  assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[actix_web::test]
#[serial]
async fn dealers_are_created_and_filtered() {
  setup_tracing();
  let t = default_test_app();
  let app = init_app!(t.state);

  for (name, location) in [("North Merch", "Delhi"), ("South Merch", "Chennai")] {
    let req = test::TestRequest::post()
      .uri("/api/v1/dealers")
      .set_json(json!({ "name": name, "email": "d@example.com", "phone": "99", "location": location }))
      .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::CREATED);
  }

  let req = test::TestRequest::get().uri("/api/v1/dealers").to_request();
  let body: Value = test::call_and_read_body_json(&app, req).await;
  let dealers = body["dealers"].as_array().unwrap();
  assert_eq!(dealers.len(), 2);
  assert_eq!(dealers[0]["name"], "South Merch");

  let req = test::TestRequest::get().uri("/api/v1/dealers?location=delhi").to_request();
  let body: Value = test::call_and_read_body_json(&app, req).await;
  assert_eq!(body["dealers"].as_array().unwrap().len(), 1);

  let req = test::TestRequest::post()
    .uri("/api/v1/dealers")
    .set_json(json!({ "name": "Nameless" }))
    .to_request();
  let resp = test::call_service(&app, req).await;
  assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[actix_web::test]
#[serial]
async fn discount_endpoint_uses_email_match() {
  setup_tracing();
  let t = default_test_app();
  seed_verified(&t.store, "octocat", Some("octo@example.com")).await;
  let app = init_app!(t.state);

  let req = test::TestRequest::post()
    .uri("/api/v1/discount/calculate")
    .set_json(json!({ "user_email": "Octo@Example.com", "original_amount": 100 }))
    .to_request();
  let body: Value = test::call_and_read_body_json(&app, req).await;
  assert_eq!(body["github_verified"], true);
  assert_eq!(body["github_username"], "octocat");
  assert_eq!(body["discount_amount"].as_f64(), Some(5.0));
  assert_eq!(body["final_amount"].as_f64(), Some(95.0));

  let req = test::TestRequest::post()
    .uri("/api/v1/discount/calculate")
    .set_json(json!({ "github_username": "stranger", "original_amount": 80 }))
    .to_request();
  let body: Value = test::call_and_read_body_json(&app, req).await;
  assert_eq!(body["github_verified"], false);
  assert_eq!(body["github_username"], Value::Null);
  assert_eq!(body["final_amount"].as_f64(), Some(80.0));

  let req = test::TestRequest::post()
    .uri("/api/v1/discount/calculate")
    .set_json(json!({ "original_amount": 0 }))
    .to_request();
  let resp = test::call_service(&app, req).await;
  assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

  let req = test::TestRequest::post()
    .uri("/api/v1/discount/calculate")
    .set_json(json!({ "user_email": "octo@example.com", "original_amount": 7e28 }))
    .to_request();
  let resp = test::call_service(&app, req).await;
  assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
  let body: Value = test::read_body_json(resp).await;
  assert_eq!(body["error"], "original_amount is too large");
}

#[actix_web::test]
#[serial]
async fn shipping_quote_endpoint() {
  setup_tracing();
  let t = default_test_app();
  let app = init_app!(t.state);

  let req = test::TestRequest::post()
    .uri("/api/v1/shipping/calculate")
    .set_json(json!({ "shipping_address": "Noida 201301", "service_type": "express" }))
    .to_request();
  let body: Value = test::call_and_read_body_json(&app, req).await;
  assert_eq!(body["calculation"]["shipping_cost"].as_f64(), Some(8.1));
  assert_eq!(body["calculation"]["estimated_days"], 2);
  assert_eq!(body["calculation"]["service_type"], "express");

  let req = test::TestRequest::post()
    .uri("/api/v1/shipping/calculate")
    .set_json(json!({ "service_type": "express" }))
    .to_request();
  let resp = test::call_service(&app, req).await;
  assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

  let req = test::TestRequest::post()
    .uri("/api/v1/shipping/calculate")
    .set_json(json!({ "shipping_address": "Noida", "product_weight": -1 }))
    .to_request();
  let resp = test::call_service(&app, req).await;
  assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[actix_web::test]
#[serial]
async fn star_verification_endpoints() {
  setup_tracing();
  let t = test_app(FakeFulfillment::configured(), FakeStars::with_stargazers(&["octocat"]));
  let app = init_app!(t.state);

  let req = test::TestRequest::post()
    .uri("/api/v1/github/verify-star")
    .set_json(json!({ "github_username": "@OctoCat", "user_email": "octo@example.com" }))
    .to_request();
  let body: Value = test::call_and_read_body_json(&app, req).await;
  assert_eq!(body["verified"], true);
  assert_eq!(body["message"], "Star verified and stored successfully");

  let req = test::TestRequest::post()
    .uri("/api/v1/github/verify-star")
    .set_json(json!({ "github_username": "octocat" }))
    .to_request();
  let body: Value = test::call_and_read_body_json(&app, req).await;
  assert_eq!(body["already_verified"], true);
  assert_eq!(t.stars.call_count(), 1);

  let req = test::TestRequest::post()
    .uri("/api/v1/github/verify-star")
    .set_json(json!({ "github_username": "ghost" }))
    .to_request();
  let body: Value = test::call_and_read_body_json(&app, req).await;
  assert_eq!(body["verified"], false);
  assert_eq!(body["message"], "GitHub user not found");

  let req = test::TestRequest::post()
    .uri("/api/v1/github/verify-star")
    .set_json(json!({ "github_username": "someone" }))
    .to_request();
  let body: Value = test::call_and_read_body_json(&app, req).await;
  assert_eq!(body["verified"], false);
  assert_eq!(body["message"], format!("User has not starred {}/{}", REPO_OWNER, REPO_NAME));

  let req = test::TestRequest::get()
    .uri("/api/v1/github/verify-star?github_username=OctoCat")
    .to_request();
  let body: Value = test::call_and_read_body_json(&app, req).await;
  assert_eq!(body["verified"], true);

  let req = test::TestRequest::post()
    .uri("/api/v1/github/verify-star")
    .set_json(json!({}))
    .to_request();
  let resp = test::call_service(&app, req).await;
  assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[actix_web::test]
#[serial]
async fn star_verification_without_token_is_a_config_error() {
  setup_tracing();
  let t = test_app(FakeFulfillment::configured(), FakeStars::unconfigured());
  let app = init_app!(t.state);

  let req = test::TestRequest::post()
    .uri("/api/v1/github/verify-star")
    .set_json(json!({ "github_username": "octocat" }))
    .to_request();
  let resp = test::call_service(&app, req).await;
  assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
  let body: Value = test::read_body_json(resp).await;
  assert_eq!(body["error"], "GitHub token not configured");

  let req = test::TestRequest::post().uri("/api/v1/github/sync-stars").to_request();
  let resp = test::call_service(&app, req).await;
  assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
}

#[actix_web::test]
#[serial]
async fn manual_sync_then_recent_users() {
  setup_tracing();
  let t = test_app(
    FakeFulfillment::configured(),
    FakeStars::with_stargazers(&["alice", "bob"]),
  );
  seed_verified(&t.store, "alice", None).await;
  let app = init_app!(t.state);

  let req = test::TestRequest::post().uri("/api/v1/github/sync-stars").to_request();
  let body: Value = test::call_and_read_body_json(&app, req).await;
  assert_eq!(body["success"], true);
  assert_eq!(body["total_stargazers"], 2);
  assert_eq!(body["new_users"], 1);
  assert_eq!(body["updated_users"], 1);
  assert_eq!(body["stopped_early"], Value::Null);

  let req = test::TestRequest::get().uri("/api/v1/github/sync-stars").to_request();
  let body: Value = test::call_and_read_body_json(&app, req).await;
  assert_eq!(body["total_verified"], 2);

  assert!(t.store.find_by_username("bob").await.unwrap().is_some());
}

#[actix_web::test]
#[serial]
async fn courier_proxy_endpoints() {
  setup_tracing();
  let t = default_test_app();
  let app = init_app!(t.state);

  let req = test::TestRequest::get().uri("/api/v1/shiprocket/track").to_request();
  let resp = test::call_service(&app, req).await;
  assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

  let req = test::TestRequest::get()
    .uri("/api/v1/shiprocket/track?shipment_id=42")
    .to_request();
  let body: Value = test::call_and_read_body_json(&app, req).await;
  assert_eq!(body["status"], "IN TRANSIT");

  let req = test::TestRequest::get().uri("/api/v1/shiprocket/track?awb=AWB9").to_request();
  let body: Value = test::call_and_read_body_json(&app, req).await;
  assert_eq!(body["status"], "unknown");

  let req = test::TestRequest::post()
    .uri("/api/v1/shiprocket/rates")
    .set_json(json!({ "delivery_pincode": "560038" }))
    .to_request();
  let body: Value = test::call_and_read_body_json(&app, req).await;
  assert_eq!(body["rates"]["pickup"], "201301");
  assert_eq!(body["rates"]["weight"], "0.2");

  let req = test::TestRequest::get().uri("/api/v1/shiprocket/orders?page=2").to_request();
  let body: Value = test::call_and_read_body_json(&app, req).await;
  assert_eq!(body["page"], 2);
  assert_eq!(body["per_page"], 100);

  let req = test::TestRequest::get().uri("/api/v1/shiprocket/orders/missing").to_request();
  let body: Value = test::call_and_read_body_json(&app, req).await;
  assert_eq!(body["found"], false);

  let req = test::TestRequest::get().uri("/api/v1/shiprocket/shipments/abc").to_request();
  let resp = test::call_service(&app, req).await;
  assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

  let req = test::TestRequest::post()
    .uri("/api/v1/shiprocket/shipments/42/cancel")
    .set_json(json!({}))
    .to_request();
  let body: Value = test::call_and_read_body_json(&app, req).await;
  assert_eq!(body["data"]["reason"], "Cancelled by admin");

  let req = test::TestRequest::post()
    .uri("/api/v1/shiprocket/pickup")
    .set_json(json!({ "shipment_ids": [42, 43] }))
    .to_request();
  let body: Value = test::call_and_read_body_json(&app, req).await;
  assert_eq!(body["data"]["pickup_scheduled"], json!([42, 43]));
}

#[actix_web::test]
#[serial]
async fn price_list_is_published() {
  setup_tracing();
  let t = default_test_app();
  let app = init_app!(t.state);

  let req = test::TestRequest::get().uri("/api/v1/prices").to_request();
  let body: Value = test::call_and_read_body_json(&app, req).await;
  let prices = body["prices"].as_array().unwrap();
  assert_eq!(prices.len(), 2);
  assert_eq!(prices[0]["currency"], "FET");
  assert_eq!(prices[0]["display"], "0.1");
  assert_eq!(prices[1]["currency"], "USDC");
  assert_eq!(prices[1]["display"], "0.01");
}

#[actix_web::test]
#[serial]
async fn agent_query_ranks_active_products() {
  setup_tracing();
  let t = default_test_app();
  let app = init_app!(t.state);

  for (name, description, image_url) in [
    ("Black Hoodie", "Warm fleece", "/static/hoodie.png"),
    ("Logo Tee", "Soft tee with a black print", "https://cdn.test/tee.png"),
    ("Sticker Pack", "Ten vinyl stickers", "https://cdn.test/stickers.png"),
  ] {
    let req = test::TestRequest::post()
      .uri("/api/v1/products")
      .set_json(json!({ "name": name, "description": description, "price": 10, "image_url": image_url }))
      .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::CREATED);
  }

  let req = test::TestRequest::post()
    .uri("/api/v1/agent/query")
    .set_json(json!({ "query": "black hoodie" }))
    .to_request();
  let body: Value = test::call_and_read_body_json(&app, req).await;
  assert_eq!(body["query"], "black hoodie");
  assert_eq!(body["message"], "Found 2 matching product(s)");
  let products = body["products"].as_array().unwrap();
  assert_eq!(products.len(), 2);
  assert_eq!(products[0]["name"], "Black Hoodie");
  assert_eq!(products[0]["match_score"], 4);
  assert_eq!(products[0]["image_url"], "http://127.0.0.1:8080/static/hoodie.png");
  assert_eq!(products[0]["full_image_url"], products[0]["image_url"]);
  assert_eq!(products[1]["name"], "Logo Tee");
  assert_eq!(products[1]["match_score"], 1);

  let req = test::TestRequest::post()
    .uri("/api/v1/agent/query")
    .set_json(json!({ "query": "umbrella" }))
    .to_request();
  let body: Value = test::call_and_read_body_json(&app, req).await;
  assert_eq!(body["message"], "Showing all available products");
  assert_eq!(body["products"].as_array().unwrap().len(), 3);

  let req = test::TestRequest::post()
    .uri("/api/v1/agent/query")
    .set_json(json!({ "query": "  " }))
    .to_request();
  let resp = test::call_service(&app, req).await;
  assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}
