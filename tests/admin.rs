mod common;

use axum::{
    body::Body,
    http::{Request, StatusCode},
};
use common::{Harness, decimal, json_request};
use rust_decimal::dec;
use serde_json::json;

#[tokio::test]
async fn admin_routes_require_a_session() {
    let h = Harness::new().await;
    let (status, _) = h.get("/admin/orders").await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let req = json_request("PUT", "/admin/products/crab-1", json!({}), Some("wrong"));
    let (status, _) = h.send(req).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn transition_to_out_for_delivery_notifies_once() {
    let h = Harness::new().await;
    let order = h.place_order().await;
    let id = order["id"].as_str().unwrap();
    h.flush_notifications().await;

    let (status, body) = h
        .admin(
            "PATCH",
            &format!("/admin/orders/{id}"),
            Some(json!({ "status": "out_for_delivery" })),
        )
        .await;

    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["data"]["status"], "out_for_delivery");
    assert_eq!(body["data"]["paymentStatus"], "pending");

    let sent = h.flush_notifications().await;
    let updates: Vec<&String> = sent.iter().filter(|m| m.starts_with("status:")).collect();
    assert_eq!(updates, vec!["status:out_for_delivery"]);
}

#[tokio::test]
async fn delivery_fields_update_without_notifying() {
    let h = Harness::new().await;
    let order = h.place_order().await;
    let id = order["id"].as_str().unwrap();
    h.flush_notifications().await;

    let (status, body) = h
        .admin(
            "PATCH",
            &format!("/admin/orders/{id}"),
            Some(json!({ "deliveryDate": "2025-03-20", "deliverySlot": "7-9 AM" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["deliveryDate"], "2025-03-20");
    assert_eq!(body["data"]["status"], "pending");
    assert_eq!(h.flush_notifications().await.len(), 1);
}

#[tokio::test]
async fn any_status_may_follow_any_other() {
    let h = Harness::new().await;
    let order = h.place_order().await;
    let uri = format!("/admin/orders/{}", order["id"].as_str().unwrap());

    for status in ["delivered", "pending", "cancelled", "processing"] {
        let (code, body) = h.admin("PATCH", &uri, Some(json!({ "status": status }))).await;
        assert_eq!(code, StatusCode::OK);
        assert_eq!(body["data"]["status"], status);
    }
}

#[tokio::test]
async fn orders_filter_by_status() {
    let h = Harness::new().await;
    let first = h.place_order().await;
    h.place_order().await;
    h.admin(
        "PATCH",
        &format!("/admin/orders/{}", first["id"].as_str().unwrap()),
        Some(json!({ "status": "cancelled" })),
    )
    .await;

    let (_, all) = h.admin("GET", "/admin/orders", None).await;
    assert_eq!(all["data"].as_array().unwrap().len(), 2);

    let (_, cancelled) = h.admin("GET", "/admin/orders?status=cancelled", None).await;
    let cancelled = cancelled["data"].as_array().unwrap();
    assert_eq!(cancelled.len(), 1);
    assert_eq!(cancelled[0]["id"], first["id"]);
}

#[tokio::test]
async fn product_and_area_management() {
    let h = Harness::new().await;

    let (status, created) = h
        .admin(
            "POST",
            "/admin/products",
            Some(json!({ "id": "prawn-1", "name": "Tiger Prawns", "category": "Prawns", "price": 640 })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED, "{created}");
    assert_eq!(created["data"]["unit"], "kg");
    assert_eq!(decimal(&created["data"]["minOrderQuantity"]), dec!(0.5));

    let (status, _) = h
        .admin(
            "POST",
            "/admin/products",
            Some(json!({ "name": "Bad", "category": "Fish", "price": -1 })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = h
        .admin(
            "PUT",
            "/admin/products/prawn-1",
            Some(json!({ "name": "Tiger Prawns", "category": "Prawns", "price": 700, "available": false })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    let (_, storefront) = h.get("/products").await;
    assert!(
        storefront["data"]
            .as_array()
            .unwrap()
            .iter()
            .all(|p| p["id"] != "prawn-1")
    );

    let (status, area) = h
        .admin(
            "POST",
            "/admin/delivery-areas",
            Some(json!({ "area": "Bhandup", "charge": 50 })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    let (_, found) = h.get("/delivery-areas?name=Bhandup").await;
    assert_eq!(decimal(&found["data"][0]["charge"]), dec!(50));

    let area_uri = format!("/admin/delivery-areas/{}", area["data"]["id"].as_str().unwrap());
    let (status, _) = h.admin("DELETE", &area_uri, None).await;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = h.admin("DELETE", &area_uri, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = h.admin("DELETE", "/admin/products/prawn-1", None).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn deleting_an_area_does_not_touch_placed_orders() {
    let h = Harness::new().await;
    let (_, area) = h
        .admin(
            "POST",
            "/admin/delivery-areas",
            Some(json!({ "area": "Bhandup", "charge": 50 })),
        )
        .await;
    let order = h.place_order().await;
    h.admin(
        "DELETE",
        &format!("/admin/delivery-areas/{}", area["data"]["id"].as_str().unwrap()),
        None,
    )
    .await;

    let (_, reread) = h.get(&format!("/orders/{}", order["id"].as_str().unwrap())).await;
    assert_eq!(decimal(&reread["data"]["deliveryCharge"]), dec!(50));
    assert_eq!(reread["data"]["deliveryAddress"]["area"], "Bhandup");
}

#[tokio::test]
async fn customers_and_stats() {
    let h = Harness::new().await;
    h.place_order().await;
    h.place_order().await;

    let (status, customers) = h.admin("GET", "/admin/customers", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(customers["data"][0]["orderCount"], 2);
    assert_eq!(customers["data"][0]["phone"], "9820012345");

    let req = Request::get("/admin/stats")
        .header("authorization", format!("Bearer {}", common::ADMIN_TOKEN))
        .body(Body::empty())
        .unwrap();
    let (status, stats) = h.send(req).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(stats["data"]["totalOrders"], 2);
    assert_eq!(stats["data"]["todayOrders"], 2);
    assert_eq!(stats["data"]["pendingOrders"], 2);
    assert_eq!(decimal(&stats["data"]["totalRevenue"]), dec!(0));
}
