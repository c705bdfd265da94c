mod common;

use std::{sync::atomic::Ordering, time::Duration};

use axum::http::StatusCode;
use common::{Harness, KEY_SECRET};
use seafood_orderservice::services::payments::payment_signature;
use serde_json::{Value, json};

async fn initiate(h: &Harness, order: &Value) -> String {
    let (status, body) = h
        .post(
            "/payments/razorpay/create-order",
            json!({ "orderId": order["id"], "amount": 800 }),
        )
        .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    body["data"]["orderId"].as_str().unwrap().to_string()
}

fn confirmation(order: &Value, session: &str, payment: &str, signature: &str) -> Value {
    json!({
        "orderId": order["id"],
        "razorpay_order_id": session,
        "razorpay_payment_id": payment,
        "razorpay_signature": signature,
    })
}

#[tokio::test]
async fn initiate_opens_session_for_final_amount_in_paise() {
    let h = Harness::new().await;
    let order = h.place_order().await;

    let (status, body) = h
        .post(
            "/payments/razorpay/create-order",
            json!({ "orderId": order["id"], "amount": 800 }),
        )
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body["data"],
        json!({ "orderId": "order_test_1", "amount": 80000, "currency": "INR", "key": "rzp_test_key" })
    );
    let requests = h.provider.requests.lock().unwrap().clone();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].amount, 80_000);
    assert_eq!(requests[0].receipt, order["id"].as_str().unwrap());

    let (_, reread) = h.get(&format!("/orders/{}", order["id"].as_str().unwrap())).await;
    assert_eq!(reread["data"]["providerOrderId"], "order_test_1");
    assert_eq!(reread["data"]["paymentStatus"], "pending");
}

#[tokio::test]
async fn initiate_rejects_amount_mismatch_without_calling_provider() {
    let h = Harness::new().await;
    let order = h.place_order().await;
    let (status, _) = h
        .post(
            "/payments/razorpay/create-order",
            json!({ "orderId": order["id"], "amount": 750 }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(h.provider.requests.lock().unwrap().is_empty());
}

#[tokio::test]
async fn cancelled_order_cannot_be_paid() {
    let h = Harness::new().await;
    let order = h.place_order().await;
    let uri = format!("/admin/orders/{}", order["id"].as_str().unwrap());
    let (status, _) = h
        .admin("PATCH", &uri, Some(json!({ "status": "cancelled" })))
        .await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = h
        .post(
            "/payments/razorpay/create-order",
            json!({ "orderId": order["id"], "amount": 800 }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST, "{body}");
    assert!(h.provider.requests.lock().unwrap().is_empty());
}

#[tokio::test]
async fn provider_failure_is_bad_gateway_and_leaves_order_untouched() {
    let h = Harness::new().await;
    let order = h.place_order().await;
    h.provider.fail.store(true, Ordering::SeqCst);

    let (status, body) = h
        .post(
            "/payments/razorpay/create-order",
            json!({ "orderId": order["id"], "amount": 800 }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(body["message"], "Payment could not be initiated");

    let (_, reread) = h.get(&format!("/orders/{}", order["id"].as_str().unwrap())).await;
    assert_eq!(reread["data"]["providerOrderId"], Value::Null);
}

#[tokio::test]
async fn verified_payment_confirms_order() {
    let h = Harness::new().await;
    let order = h.place_order().await;
    let session = initiate(&h, &order).await;
    let signature = payment_signature(KEY_SECRET, &session, "pay_001");

    let (status, body) = h
        .post(
            "/payments/razorpay/verify",
            confirmation(&order, &session, "pay_001", &signature),
        )
        .await;

    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["data"]["paymentStatus"], "paid");
    assert_eq!(body["data"]["status"], "confirmed");
    assert_eq!(body["data"]["paymentMethod"], "razorpay");
    assert_eq!(body["data"]["providerPaymentId"], "pay_001");
}

#[tokio::test]
async fn verify_is_idempotent() {
    let h = Harness::new().await;
    let order = h.place_order().await;
    let session = initiate(&h, &order).await;
    let signature = payment_signature(KEY_SECRET, &session, "pay_001");
    let body = confirmation(&order, &session, "pay_001", &signature);

    let (first_status, first) = h.post("/payments/razorpay/verify", body.clone()).await;
    let (second_status, second) = h.post("/payments/razorpay/verify", body).await;
    assert_eq!(first_status, StatusCode::OK);
    assert_eq!(second_status, StatusCode::OK);
    assert_eq!(first["data"]["paymentMethod"], second["data"]["paymentMethod"]);
    assert_eq!(first["data"]["providerPaymentId"], second["data"]["providerPaymentId"]);
    assert_eq!(first["data"]["updatedAt"], second["data"]["updatedAt"]);

    // A different, validly signed payment id must not overwrite the recorded one.
    let other = payment_signature(KEY_SECRET, &session, "pay_002");
    let (status, third) = h
        .post(
            "/payments/razorpay/verify",
            confirmation(&order, &session, "pay_002", &other),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(third["data"]["providerPaymentId"], "pay_001");

    let sent = h.flush_notifications().await;
    let confirmations = sent.iter().filter(|m| *m == "status:confirmed").count();
    assert_eq!(confirmations, 1, "{sent:?}");
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn concurrent_verifications_record_and_notify_once() {
    let h = Harness::new().await;
    let order = h.place_order().await;
    let session = initiate(&h, &order).await;
    let signature = payment_signature(KEY_SECRET, &session, "pay_001");
    let body = confirmation(&order, &session, "pay_001", &signature);

    let ((first_status, first), (second_status, second)) = tokio::join!(
        h.post("/payments/razorpay/verify", body.clone()),
        h.post("/payments/razorpay/verify", body.clone()),
    );

    assert_eq!(first_status, StatusCode::OK, "{first}");
    assert_eq!(second_status, StatusCode::OK, "{second}");
    assert_eq!(first["data"]["paymentStatus"], "paid");
    assert_eq!(second["data"]["paymentStatus"], "paid");
    assert_eq!(first["data"]["updatedAt"], second["data"]["updatedAt"]);

    let sent = h.flush_notifications().await;
    let confirmations = sent.iter().filter(|m| *m == "status:confirmed").count();
    assert_eq!(confirmations, 1, "{sent:?}");
}

#[tokio::test]
async fn tampered_signature_never_marks_paid() {
    let h = Harness::new().await;
    let order = h.place_order().await;
    let session = initiate(&h, &order).await;
    let forged = payment_signature("wrong_secret", &session, "pay_001");

    for _ in 0..3 {
        let (status, body) = h
            .post(
                "/payments/razorpay/verify",
                confirmation(&order, &session, "pay_001", &forged),
            )
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["message"], "Payment verification failed");
    }

    let (_, reread) = h.get(&format!("/orders/{}", order["id"].as_str().unwrap())).await;
    assert_eq!(reread["data"]["paymentStatus"], "pending");
    assert_eq!(reread["data"]["status"], "pending");
}

#[tokio::test]
async fn signature_for_another_session_is_rejected() {
    let h = Harness::new().await;
    let order = h.place_order().await;
    initiate(&h, &order).await;
    let signature = payment_signature(KEY_SECRET, "order_elsewhere", "pay_001");

    let (status, _) = h
        .post(
            "/payments/razorpay/verify",
            confirmation(&order, "order_elsewhere", "pay_001", &signature),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn verify_for_unknown_order_is_404() {
    let h = Harness::new().await;
    let ghost = json!({ "id": uuid::Uuid::new_v4().to_string() });
    let signature = payment_signature(KEY_SECRET, "order_x", "pay_x");
    let (status, _) = h
        .post(
            "/payments/razorpay/verify",
            confirmation(&ghost, "order_x", "pay_x", &signature),
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn write_failure_after_valid_signature_is_ambiguous() {
    let h = Harness::new().await;
    let order = h.place_order().await;
    let session = initiate(&h, &order).await;
    let signature = payment_signature(KEY_SECRET, &session, "pay_001");

    h.store.set_fail_writes(true);
    let (status, body) = h
        .post(
            "/payments/razorpay/verify",
            confirmation(&order, &session, "pay_001", &signature),
        )
        .await;
    h.store.set_fail_writes(false);

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(body["message"].as_str().unwrap().contains("Payment received"));
    let (_, reread) = h.get(&format!("/orders/{}", order["id"].as_str().unwrap())).await;
    assert_eq!(reread["data"]["paymentStatus"], "pending");
}

#[tokio::test]
async fn slow_payment_write_times_out_as_ambiguous() {
    let h = Harness::with_reconcile_timeout(Duration::from_millis(1)).await;
    let order = h.place_order().await;
    let session = initiate(&h, &order).await;
    let signature = payment_signature(KEY_SECRET, &session, "pay_001");

    h.store.set_payment_delay(Duration::from_millis(200));
    let (status, body) = h
        .post(
            "/payments/razorpay/verify",
            confirmation(&order, &session, "pay_001", &signature),
        )
        .await;
    h.store.set_payment_delay(Duration::ZERO);

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(body["message"].as_str().unwrap().contains("Payment received"));
    let (_, reread) = h.get(&format!("/orders/{}", order["id"].as_str().unwrap())).await;
    assert_eq!(reread["data"]["paymentStatus"], "pending");
}
