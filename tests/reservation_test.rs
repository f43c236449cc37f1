mod common;

use axum::http::StatusCode;
use common::{TestApp, seed_catalog, setup_app};
use serde_json::json;
use stockroom::authz::Role;

async fn stock_of(app: &TestApp, variant_id: i32) -> i64 {
    let res = app.get(&format!("/api/variants/{}", variant_id), None).await;
    res.body["variant"]["stock_quantity"].as_i64().unwrap()
}

#[tokio::test]
async fn test_create_reservation_prices_and_checks_stock() {
    let app = setup_app().await;
    let (_, manager) = app.user("mgr", Role::Manager).await;
    let (customer_id, customer) = app.user("cus", Role::Customer).await;
    let catalog = seed_catalog(&app, &manager, 5).await;

    let res = app
        .post(
            "/api/reservations",
            Some(&customer),
            json!({"variant_id": catalog.variant_id, "quantity": 3, "notes": "pick up friday"}),
        )
        .await;
    assert_eq!(res.status, StatusCode::CREATED, "{}", res.body);
    let r = &res.body["reservation"];
    assert_eq!(r["status"], "pending");
    assert_eq!(r["user_id"], customer_id);
    assert_eq!(r["unit_price"], 19.99);
    assert_eq!(r["total_price"], 59.97);
    assert_eq!(r["product_name"], "Classic Tee");
    assert_eq!(r["variant_sku"], "TEE-1-BLK-M");

    // Pending reservations do not move stock
    assert_eq!(stock_of(&app, catalog.variant_id).await, 5);

    let too_many = app
        .post(
            "/api/reservations",
            Some(&customer),
            json!({"variant_id": catalog.variant_id, "quantity": 6}),
        )
        .await;
    assert_eq!(too_many.status, StatusCode::CONFLICT);

    let zero = app
        .post(
            "/api/reservations",
            Some(&customer),
            json!({"variant_id": catalog.variant_id, "quantity": 0}),
        )
        .await;
    assert_eq!(zero.status, StatusCode::BAD_REQUEST);

    let missing = app
        .post(
            "/api/reservations",
            Some(&customer),
            json!({"variant_id": 999, "quantity": 1}),
        )
        .await;
    assert_eq!(missing.status, StatusCode::NOT_FOUND);

    let anon = app
        .post(
            "/api/reservations",
            None,
            json!({"variant_id": catalog.variant_id, "quantity": 1}),
        )
        .await;
    assert_eq!(anon.status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_confirm_decrements_once_and_cancel_restores() {
    let app = setup_app().await;
    let (_, manager) = app.user("mgr", Role::Manager).await;
    let (_, staff) = app.user("stf", Role::Staff).await;
    let (_, customer) = app.user("cus", Role::Customer).await;
    let catalog = seed_catalog(&app, &manager, 5).await;

    let res = app
        .post(
            "/api/reservations",
            Some(&customer),
            json!({"variant_id": catalog.variant_id, "quantity": 2}),
        )
        .await;
    let id = res.body["reservation"]["id"].as_i64().unwrap();
    let status_uri = format!("/api/reservations/{}/status", id);

    // Customers cannot confirm
    let denied = app
        .put(&status_uri, Some(&customer), json!({"status": "confirmed"}))
        .await;
    assert_eq!(denied.status, StatusCode::FORBIDDEN);

    let confirmed = app
        .put(&status_uri, Some(&staff), json!({"status": "confirmed"}))
        .await;
    assert_eq!(confirmed.status, StatusCode::OK, "{}", confirmed.body);
    assert_eq!(confirmed.body["reservation"]["status"], "confirmed");
    assert_eq!(stock_of(&app, catalog.variant_id).await, 3);

    let twice = app
        .put(&status_uri, Some(&staff), json!({"status": "confirmed"}))
        .await;
    assert_eq!(twice.status, StatusCode::CONFLICT);
    assert_eq!(stock_of(&app, catalog.variant_id).await, 3);

    // Owner may not cancel once confirmed
    let owner_cancel = app
        .post(&format!("/api/reservations/{}/cancel", id), Some(&customer), json!({}))
        .await;
    assert_eq!(owner_cancel.status, StatusCode::FORBIDDEN);

    let cancelled = app
        .post(&format!("/api/reservations/{}/cancel", id), Some(&staff), json!({}))
        .await;
    assert_eq!(cancelled.status, StatusCode::OK);
    assert_eq!(cancelled.body["reservation"]["status"], "cancelled");
    assert_eq!(stock_of(&app, catalog.variant_id).await, 5);

    let reopen = app
        .put(&status_uri, Some(&staff), json!({"status": "pending"}))
        .await;
    assert_eq!(reopen.status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_confirm_fails_when_stock_ran_out() {
    let app = setup_app().await;
    let (_, manager) = app.user("mgr", Role::Manager).await;
    let (_, a) = app.user("alice", Role::Customer).await;
    let (_, b) = app.user("bruno", Role::Customer).await;
    let catalog = seed_catalog(&app, &manager, 3).await;

    let mut ids = Vec::new();
    for token in [&a, &b] {
        let res = app
            .post(
                "/api/reservations",
                Some(token),
                json!({"variant_id": catalog.variant_id, "quantity": 2}),
            )
            .await;
        assert_eq!(res.status, StatusCode::CREATED);
        ids.push(res.body["reservation"]["id"].as_i64().unwrap());
    }

    let first = app
        .put(
            &format!("/api/reservations/{}/status", ids[0]),
            Some(&manager),
            json!({"status": "confirmed"}),
        )
        .await;
    assert_eq!(first.status, StatusCode::OK);

    let second = app
        .put(
            &format!("/api/reservations/{}/status", ids[1]),
            Some(&manager),
            json!({"status": "confirmed"}),
        )
        .await;
    assert_eq!(second.status, StatusCode::CONFLICT);
    assert_eq!(stock_of(&app, catalog.variant_id).await, 1);

    let completed = app
        .put(
            &format!("/api/reservations/{}/status", ids[0]),
            Some(&manager),
            json!({"status": "completed"}),
        )
        .await;
    assert_eq!(completed.status, StatusCode::OK);
    assert_eq!(stock_of(&app, catalog.variant_id).await, 1);
}

#[tokio::test]
async fn test_reservation_visibility() {
    let app = setup_app().await;
    let (_, manager) = app.user("mgr", Role::Manager).await;
    let (alice_id, alice) = app.user("alice", Role::Customer).await;
    let (_, bruno) = app.user("bruno", Role::Customer).await;
    let (_, staff) = app.user("stf", Role::Staff).await;
    let catalog = seed_catalog(&app, &manager, 10).await;

    let res = app
        .post(
            "/api/reservations",
            Some(&alice),
            json!({"variant_id": catalog.variant_id, "quantity": 1}),
        )
        .await;
    let id = res.body["reservation"]["id"].as_i64().unwrap();
    app.post(
        "/api/reservations",
        Some(&bruno),
        json!({"variant_id": catalog.variant_id, "quantity": 1}),
    )
    .await;

    let own = app.get("/api/reservations", Some(&alice)).await;
    assert_eq!(own.body["total"], 1);
    // The user_id filter cannot widen a customer's scope
    let sneaky = app
        .get("/api/reservations?user_id=999", Some(&alice))
        .await;
    assert_eq!(sneaky.body["total"], 1);

    let hidden = app
        .get(&format!("/api/reservations/{}", id), Some(&bruno))
        .await;
    assert_eq!(hidden.status, StatusCode::NOT_FOUND);

    let cancel_other = app
        .post(&format!("/api/reservations/{}/cancel", id), Some(&bruno), json!({}))
        .await;
    assert_eq!(cancel_other.status, StatusCode::NOT_FOUND);

    let all = app.get("/api/reservations", Some(&staff)).await;
    assert_eq!(all.body["total"], 2);
    let filtered = app
        .get(
            &format!("/api/reservations?user_id={}&status=pending", alice_id),
            Some(&staff),
        )
        .await;
    assert_eq!(filtered.body["total"], 1);

    let bad_status = app
        .get("/api/reservations?status=shipped", Some(&staff))
        .await;
    assert_eq!(bad_status.status, StatusCode::BAD_REQUEST);

    // Owner can cancel while pending
    let own_cancel = app
        .post(&format!("/api/reservations/{}/cancel", id), Some(&alice), json!({}))
        .await;
    assert_eq!(own_cancel.status, StatusCode::OK);
}

#[tokio::test]
async fn test_active_reservation_blocks_catalog_delete() {
    let app = setup_app().await;
    let (_, manager) = app.user("mgr", Role::Manager).await;
    let (_, customer) = app.user("cus", Role::Customer).await;
    let catalog = seed_catalog(&app, &manager, 10).await;

    let res = app
        .post(
            "/api/reservations",
            Some(&customer),
            json!({"variant_id": catalog.variant_id, "quantity": 1}),
        )
        .await;
    let id = res.body["reservation"]["id"].as_i64().unwrap();

    let del_variant = app
        .delete(&format!("/api/variants/{}", catalog.variant_id), Some(&manager))
        .await;
    assert_eq!(del_variant.status, StatusCode::CONFLICT);
    let del_product = app
        .delete(&format!("/api/products/{}", catalog.product_id), Some(&manager))
        .await;
    assert_eq!(del_product.status, StatusCode::CONFLICT);

    app.post(&format!("/api/reservations/{}/cancel", id), Some(&customer), json!({}))
        .await;
    let del_product = app
        .delete(&format!("/api/products/{}", catalog.product_id), Some(&manager))
        .await;
    assert_eq!(del_product.status, StatusCode::OK);
}

#[tokio::test]
async fn test_reserving_for_someone_else_needs_manage() {
    let app = setup_app().await;
    let (_, manager) = app.user("mgr", Role::Manager).await;
    let (alice_id, alice) = app.user("alice", Role::Customer).await;
    let (_, bruno) = app.user("bruno", Role::Customer).await;
    let (_, staff) = app.user("stf", Role::Staff).await;
    let catalog = seed_catalog(&app, &manager, 10).await;

    let body = json!({"variant_id": catalog.variant_id, "quantity": 1, "user_id": alice_id});
    let denied = app.post("/api/reservations", Some(&bruno), body.clone()).await;
    assert_eq!(denied.status, StatusCode::FORBIDDEN);

    let ok = app.post("/api/reservations", Some(&staff), body).await;
    assert_eq!(ok.status, StatusCode::CREATED);
    assert_eq!(ok.body["reservation"]["user_id"], alice_id);

    let mine = app.get("/api/reservations", Some(&alice)).await;
    assert_eq!(mine.body["total"], 1);
}
