// storefront/src/web/routes.rs

use actix_web::web;

use crate::web::handlers::{
  agent_handlers, dealer_handlers, discount_handlers, github_handlers, order_handlers, partner_handlers, payment_handlers,
  price_handlers, product_handlers, shipping_handlers, shiprocket_handlers, upload_handlers,
};

async fn health_check_handler() -> actix_web::HttpResponse {
  actix_web::HttpResponse::Ok().json(serde_json::json!({ "status": "ok" }))
}

pub fn configure_app_routes(cfg: &mut web::ServiceConfig) {
  cfg
    .route(
      "/uploads/{path:.*}",
      web::get().to(upload_handlers::serve_upload_handler),
    )
    .service(
      web::scope("/api/v1")
        .route("/health", web::get().to(health_check_handler))
        .service(
          web::scope("/products")
            .route("", web::get().to(product_handlers::list_products_handler))
            .route("", web::post().to(product_handlers::create_product_handler))
            .route("/{product_id}", web::get().to(product_handlers::get_product_handler))
            .route("/{product_id}", web::patch().to(product_handlers::update_product_handler))
            .route("/{product_id}", web::delete().to(product_handlers::delete_product_handler)),
        )
        .service(
          web::scope("/orders")
            .route("", web::post().to(order_handlers::create_order_handler))
            .route("", web::get().to(order_handlers::list_orders_handler))
            .route("/count", web::get().to(order_handlers::count_orders_handler))
            .route(
              "/fix-payment-status",
              web::get().to(order_handlers::list_unconfirmed_paid_handler),
            )
            .route(
              "/fix-payment-status",
              web::post().to(order_handlers::fix_payment_status_handler),
            )
            .route("/{order_id}", web::get().to(order_handlers::get_order_handler))
            .route("/{order_id}", web::patch().to(order_handlers::update_order_handler)),
        )
        .service(
          web::scope("/payments")
            .route("/verify", web::post().to(payment_handlers::verify_payment_handler))
            .route("/verify", web::get().to(payment_handlers::payment_status_handler)),
        )
        .route(
          "/discount/calculate",
          web::post().to(discount_handlers::calculate_discount_handler),
        )
        .service(
          web::scope("/github")
            .route("/verify-star", web::post().to(github_handlers::verify_star_handler))
            .route("/verify-star", web::get().to(github_handlers::star_status_handler))
            .route("/sync-stars", web::post().to(github_handlers::sync_stars_handler))
            .route("/sync-stars", web::get().to(github_handlers::recent_verified_handler)),
        )
        .service(
          web::scope("/delivery-partners")
            .route("", web::get().to(partner_handlers::list_partners_handler))
            .route("", web::post().to(partner_handlers::create_partner_handler))
            .route("/{partner_id}", web::get().to(partner_handlers::get_partner_handler))
            .route("/{partner_id}", web::patch().to(partner_handlers::update_partner_handler))
            .route("/{partner_id}", web::delete().to(partner_handlers::delete_partner_handler)),
        )
        .service(
          web::scope("/dealers")
            .route("", web::get().to(dealer_handlers::list_dealers_handler))
            .route("", web::post().to(dealer_handlers::create_dealer_handler)),
        )
        .route("/upload", web::post().to(upload_handlers::upload_image_handler))
        .route(
          "/shipping/calculate",
          web::post().to(shipping_handlers::calculate_shipping_handler),
        )
        .service(
          web::scope("/shiprocket")
            .route("/track", web::get().to(shiprocket_handlers::track_handler))
            .route("/rates", web::post().to(shiprocket_handlers::rates_handler))
            .route("/pickup", web::post().to(shiprocket_handlers::generate_pickup_handler))
            .route("/orders", web::get().to(shiprocket_handlers::list_orders_handler))
            .route("/orders/{order_id}", web::get().to(shiprocket_handlers::get_order_handler))
            .route(
              "/shipments/{shipment_id}",
              web::get().to(shiprocket_handlers::get_shipment_handler),
            )
            .route(
              "/shipments/{shipment_id}/cancel",
              web::post().to(shiprocket_handlers::cancel_shipment_handler),
            ),
        )
        .route("/prices", web::get().to(price_handlers::list_prices_handler))
        .route("/agent/query", web::post().to(agent_handlers::agent_query_handler)),
    );
}
