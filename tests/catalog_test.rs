mod common;

use axum::http::StatusCode;
use common::{seed_catalog, setup_app};
use serde_json::json;
use stockroom::authz::Role;
use stockroom::domain::PageRequest;

#[tokio::test]
async fn test_catalog_is_public_but_writes_need_permission() {
    let app = setup_app().await;
    let (_, manager) = app.user("mgr", Role::Manager).await;
    let (_, customer) = app.user("cus", Role::Customer).await;
    let catalog = seed_catalog(&app, &manager, 10).await;

    let list = app.get("/api/products", None).await;
    assert_eq!(list.status, StatusCode::OK);
    assert_eq!(list.body["total"], 1);
    assert_eq!(list.body["page"], 1);
    assert_eq!(list.body["limit"], 20);

    let detail = app
        .get(&format!("/api/products/{}", catalog.product_id), None)
        .await;
    assert_eq!(detail.status, StatusCode::OK);
    let variant = &detail.body["product"]["variants"][0];
    assert_eq!(variant["color_name"], "Black");
    assert_eq!(variant["size_label"], "M");
    assert_eq!(variant["unit_price"], 19.99);

    let body = json!({"name": "Hoodie", "sku": "HOOD-1", "base_price": 39.0});
    let anon = app.post("/api/products", None, body.clone()).await;
    assert_eq!(anon.status, StatusCode::UNAUTHORIZED);
    let forbidden = app.post("/api/products", Some(&customer), body).await;
    assert_eq!(forbidden.status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_product_validation_and_search() {
    let app = setup_app().await;
    let (_, manager) = app.user("mgr", Role::Manager).await;

    let bad_price = app
        .post(
            "/api/products",
            Some(&manager),
            json!({"name": "Socks", "sku": "SOCK-1", "base_price": -1.0}),
        )
        .await;
    assert_eq!(bad_price.status, StatusCode::BAD_REQUEST);

    let blank = app
        .post(
            "/api/products",
            Some(&manager),
            json!({"name": "  ", "sku": "SOCK-1", "base_price": 1.0}),
        )
        .await;
    assert_eq!(blank.status, StatusCode::BAD_REQUEST);

    for (name, sku, category) in [
        ("Wool Socks", "SOCK-1", "accessories"),
        ("Denim Jacket", "JKT-1", "outerwear"),
        ("Rain Jacket", "JKT-2", "outerwear"),
    ] {
        let res = app
            .post(
                "/api/products",
                Some(&manager),
                json!({"name": name, "sku": sku, "category": category, "base_price": 10.0}),
            )
            .await;
        assert_eq!(res.status, StatusCode::CREATED);
    }

    let dup = app
        .post(
            "/api/products",
            Some(&manager),
            json!({"name": "Copy", "sku": "JKT-1", "base_price": 1.0}),
        )
        .await;
    assert_eq!(dup.status, StatusCode::CONFLICT);

    let res = app.get("/api/products?q=jacket", None).await;
    assert_eq!(res.body["total"], 2);
    let res = app.get("/api/products?q=SOCK", None).await;
    assert_eq!(res.body["total"], 1);
    let res = app.get("/api/products?category=outerwear&limit=1", None).await;
    assert_eq!(res.body["total"], 2);
    assert_eq!(res.body["products"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_huge_page_numbers_return_empty_pages() {
    let app = setup_app().await;
    let (_, manager) = app.user("mgr", Role::Manager).await;
    seed_catalog(&app, &manager, 1).await;

    let res = app
        .get("/api/products?page=18446744073709551615&limit=100", None)
        .await;
    assert_eq!(res.status, StatusCode::OK, "{}", res.body);
    assert_eq!(res.body["total"], 1);
    assert_eq!(res.body["products"].as_array().unwrap().len(), 0);
    assert_eq!(res.body["page"], PageRequest::MAX_PAGE);

    let users = app
        .get("/api/users?page=18446744073709551615", Some(&manager))
        .await;
    assert_eq!(users.status, StatusCode::OK, "{}", users.body);
    assert_eq!(users.body["users"].as_array().unwrap().len(), 0);
}

#[tokio::test]
async fn test_soft_delete_hides_product_and_cascades() {
    let app = setup_app().await;
    let (_, manager) = app.user("mgr", Role::Manager).await;
    let (_, customer) = app.user("cus", Role::Customer).await;
    let catalog = seed_catalog(&app, &manager, 10).await;

    let del = app
        .delete(&format!("/api/products/{}", catalog.product_id), Some(&manager))
        .await;
    assert_eq!(del.status, StatusCode::OK, "{}", del.body);
    assert_eq!(del.body["variants_affected"], 1);

    let list = app.get("/api/products", None).await;
    assert_eq!(list.body["total"], 0);
    let get = app
        .get(&format!("/api/products/{}", catalog.product_id), None)
        .await;
    assert_eq!(get.status, StatusCode::NOT_FOUND);
    let variant = app
        .get(&format!("/api/variants/{}", catalog.variant_id), None)
        .await;
    assert_eq!(variant.status, StatusCode::NOT_FOUND);

    // Deleting twice is a 404
    let again = app
        .delete(&format!("/api/products/{}", catalog.product_id), Some(&manager))
        .await;
    assert_eq!(again.status, StatusCode::NOT_FOUND);

    // include_deleted is gated by catalog:restore
    let anon = app.get("/api/products?include_deleted=true", None).await;
    assert_eq!(anon.status, StatusCode::UNAUTHORIZED);
    let denied = app
        .get("/api/products?include_deleted=true", Some(&customer))
        .await;
    assert_eq!(denied.status, StatusCode::FORBIDDEN);
    let visible = app
        .get("/api/products?include_deleted=true", Some(&manager))
        .await;
    assert_eq!(visible.body["total"], 1);
    assert!(visible.body["products"][0]["deleted_at"].is_string());
}

#[tokio::test]
async fn test_restore_brings_back_only_cascaded_variants() {
    let app = setup_app().await;
    let (_, manager) = app.user("mgr", Role::Manager).await;
    let catalog = seed_catalog(&app, &manager, 10).await;

    let size = app
        .post("/api/sizes", Some(&manager), json!({"label": "L", "sort_order": 30}))
        .await;
    let size_l = size.body["size"]["id"].as_i64().unwrap();
    let second = app
        .post(
            &format!("/api/products/{}/variants", catalog.product_id),
            Some(&manager),
            json!({"color_id": catalog.color_id, "size_id": size_l, "sku": "TEE-1-BLK-L", "price_override": 21.5}),
        )
        .await;
    assert_eq!(second.status, StatusCode::CREATED);
    assert_eq!(second.body["variant"]["unit_price"], 21.5);
    let second_id = second.body["variant"]["id"].as_i64().unwrap();

    // Deleted on its own before the product goes
    let res = app
        .delete(&format!("/api/variants/{}", second_id), Some(&manager))
        .await;
    assert_eq!(res.status, StatusCode::OK);

    let res = app
        .delete(&format!("/api/products/{}", catalog.product_id), Some(&manager))
        .await;
    assert_eq!(res.body["variants_affected"], 1);

    // Variant restore is refused while its product is deleted
    let early = app
        .post(
            &format!("/api/variants/{}/restore", catalog.variant_id),
            Some(&manager),
            json!({}),
        )
        .await;
    assert_eq!(early.status, StatusCode::CONFLICT);

    let restored = app
        .post(
            &format!("/api/products/{}/restore", catalog.product_id),
            Some(&manager),
            json!({}),
        )
        .await;
    assert_eq!(restored.status, StatusCode::OK, "{}", restored.body);
    assert_eq!(restored.body["variants_affected"], 1);

    let variants = app
        .get(&format!("/api/products/{}/variants", catalog.product_id), None)
        .await;
    assert_eq!(variants.body["total"], 1);
    assert_eq!(variants.body["variants"][0]["id"], catalog.variant_id);

    let live_again = app
        .post(
            &format!("/api/products/{}/restore", catalog.product_id),
            Some(&manager),
            json!({}),
        )
        .await;
    assert_eq!(live_again.status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_variant_combination_is_unique_among_live_rows() {
    let app = setup_app().await;
    let (_, manager) = app.user("mgr", Role::Manager).await;
    let catalog = seed_catalog(&app, &manager, 10).await;

    let dup = app
        .post(
            &format!("/api/products/{}/variants", catalog.product_id),
            Some(&manager),
            json!({"color_id": catalog.color_id, "size_id": catalog.size_id, "sku": "OTHER"}),
        )
        .await;
    assert_eq!(dup.status, StatusCode::CONFLICT);

    // After deleting the first one the combination is free
    app.delete(&format!("/api/variants/{}", catalog.variant_id), Some(&manager))
        .await;
    let replacement = app
        .post(
            &format!("/api/products/{}/variants", catalog.product_id),
            Some(&manager),
            json!({"color_id": catalog.color_id, "size_id": catalog.size_id, "sku": "OTHER"}),
        )
        .await;
    assert_eq!(replacement.status, StatusCode::CREATED);

    // ...and restoring the old one now conflicts
    let res = app
        .post(
            &format!("/api/variants/{}/restore", catalog.variant_id),
            Some(&manager),
            json!({}),
        )
        .await;
    assert_eq!(res.status, StatusCode::CONFLICT);

    let unknown_color = app
        .post(
            &format!("/api/products/{}/variants", catalog.product_id),
            Some(&manager),
            json!({"color_id": 999, "size_id": catalog.size_id, "sku": "NOPE"}),
        )
        .await;
    assert_eq!(unknown_color.status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_stock_adjustments_never_go_negative() {
    let app = setup_app().await;
    let (_, manager) = app.user("mgr", Role::Manager).await;
    let (_, staff) = app.user("stf", Role::Staff).await;
    let (_, customer) = app.user("cus", Role::Customer).await;
    let catalog = seed_catalog(&app, &manager, 3).await;
    let uri = format!("/api/variants/{}/stock", catalog.variant_id);

    let denied = app
        .post(&uri, Some(&customer), json!({"delta": 5, "reason": "receipt"}))
        .await;
    assert_eq!(denied.status, StatusCode::FORBIDDEN);

    let up = app
        .post(&uri, Some(&staff), json!({"delta": 5, "reason": "receipt"}))
        .await;
    assert_eq!(up.status, StatusCode::OK, "{}", up.body);
    assert_eq!(up.body["variant"]["stock_quantity"], 8);

    let too_much = app
        .post(&uri, Some(&staff), json!({"delta": -9, "reason": "shrinkage"}))
        .await;
    assert_eq!(too_much.status, StatusCode::CONFLICT);

    let zero = app.post(&uri, Some(&staff), json!({"delta": 0})).await;
    assert_eq!(zero.status, StatusCode::BAD_REQUEST);

    let down = app
        .post(&uri, Some(&staff), json!({"delta": -8, "reason": "shrinkage"}))
        .await;
    assert_eq!(down.body["variant"]["stock_quantity"], 0);
}

#[tokio::test]
async fn test_stock_adjustments_stay_within_integer_range() {
    let app = setup_app().await;
    let (_, manager) = app.user("mgr", Role::Manager).await;
    let catalog = seed_catalog(&app, &manager, i32::MAX).await;
    let uri = format!("/api/variants/{}/stock", catalog.variant_id);

    let overflow = app
        .post(&uri, Some(&manager), json!({"delta": 1, "reason": "receipt"}))
        .await;
    assert_eq!(overflow.status, StatusCode::CONFLICT, "{}", overflow.body);

    let lowest = app
        .post(&uri, Some(&manager), json!({"delta": i32::MIN, "reason": "shrinkage"}))
        .await;
    assert_eq!(lowest.status, StatusCode::CONFLICT, "{}", lowest.body);

    let res = app
        .get(&format!("/api/variants/{}", catalog.variant_id), None)
        .await;
    assert_eq!(res.body["variant"]["stock_quantity"], i32::MAX);

    let all_out = app
        .post(&uri, Some(&manager), json!({"delta": -i32::MAX, "reason": "clearance"}))
        .await;
    assert_eq!(all_out.status, StatusCode::OK, "{}", all_out.body);
    assert_eq!(all_out.body["variant"]["stock_quantity"], 0);

    let again = app
        .post(&uri, Some(&manager), json!({"delta": i32::MIN}))
        .await;
    assert_eq!(again.status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_colors_and_sizes() {
    let app = setup_app().await;
    let (_, manager) = app.user("mgr", Role::Manager).await;
    let catalog = seed_catalog(&app, &manager, 1).await;

    let bad_hex = app
        .post(
            "/api/colors",
            Some(&manager),
            json!({"name": "Red", "hex_code": "red"}),
        )
        .await;
    assert_eq!(bad_hex.status, StatusCode::BAD_REQUEST);

    let red = app
        .post(
            "/api/colors",
            Some(&manager),
            json!({"name": "Red", "hex_code": "#ff0000"}),
        )
        .await;
    assert_eq!(red.body["color"]["hex_code"], "#FF0000");

    // In use by a live variant
    let in_use = app
        .delete(&format!("/api/colors/{}", catalog.color_id), Some(&manager))
        .await;
    assert_eq!(in_use.status, StatusCode::CONFLICT);

    let red_id = red.body["color"]["id"].as_i64().unwrap();
    let del = app
        .delete(&format!("/api/colors/{}", red_id), Some(&manager))
        .await;
    assert_eq!(del.status, StatusCode::OK);
    let colors = app.get("/api/colors", None).await;
    assert_eq!(colors.body["total"], 1);
    let restored = app
        .post(
            &format!("/api/colors/{}/restore", red_id),
            Some(&manager),
            json!({}),
        )
        .await;
    assert_eq!(restored.status, StatusCode::OK);

    let live_again = app
        .post(
            &format!("/api/colors/{}/restore", red_id),
            Some(&manager),
            json!({}),
        )
        .await;
    assert_eq!(live_again.status, StatusCode::CONFLICT);
    let missing = app
        .post("/api/sizes/999/restore", Some(&manager), json!({}))
        .await;
    assert_eq!(missing.status, StatusCode::NOT_FOUND);

    app.post("/api/sizes", Some(&manager), json!({"label": "XS", "sort_order": 0}))
        .await;
    app.post("/api/sizes", Some(&manager), json!({"label": "XL", "sort_order": 40}))
        .await;
    let sizes = app.get("/api/sizes", None).await;
    let labels: Vec<&str> = sizes.body["sizes"]
        .as_array()
        .unwrap()
        .iter()
        .map(|s| s["label"].as_str().unwrap())
        .collect();
    assert_eq!(labels, vec!["XS", "M", "XL"]);
}
