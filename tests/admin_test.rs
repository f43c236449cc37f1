mod common;

use axum::http::StatusCode;
use common::{PASSWORD, TestApp, seed_catalog, setup_app};
use serde_json::{Value, json};
use stockroom::authz::Role;

async fn login(app: &TestApp, username: &str) -> Value {
    let res = app
        .post(
            "/api/auth/login",
            None,
            json!({"login": username, "password": PASSWORD}),
        )
        .await;
    assert_eq!(res.status, StatusCode::OK, "{}", res.body);
    res.body
}

async fn grant_manager(app: &TestApp, admin: &str, codes: &[&str]) {
    let res = app
        .put(
            "/api/roles/manager/permissions",
            Some(admin),
            json!({ "permissions": codes }),
        )
        .await;
    assert_eq!(res.status, StatusCode::OK, "{}", res.body);
}

const MANAGER_DEFAULTS: &[&str] = &[
    "reservations:create",
    "reservations:read_all",
    "reservations:manage",
    "inventory:write",
    "dashboard:read",
    "products:write",
    "products:delete",
    "catalog:restore",
    "users:read",
    "audit:read",
];

#[tokio::test]
async fn test_admin_creates_users_and_respects_hierarchy() {
    let app = setup_app().await;
    let (admin_id, admin) = app.user("root", Role::Admin).await;
    let (_, manager) = app.user("mgr", Role::Manager).await;

    // Managers cannot manage users until granted
    let denied = app
        .post(
            "/api/users",
            Some(&manager),
            json!({"username": "newbie", "email": "n@example.com", "password": PASSWORD, "role": "staff"}),
        )
        .await;
    assert_eq!(denied.status, StatusCode::FORBIDDEN);

    let mut grants = MANAGER_DEFAULTS.to_vec();
    grants.push("users:manage");
    grant_manager(&app, &admin, &grants).await;

    let created = app
        .post(
            "/api/users",
            Some(&manager),
            json!({"username": "newbie", "email": "n@example.com", "password": PASSWORD, "role": "staff"}),
        )
        .await;
    assert_eq!(created.status, StatusCode::CREATED, "{}", created.body);
    assert_eq!(created.body["user"]["role"], "staff");
    assert!(created.body["user"].get("password_hash").is_none());
    let staff_id = created.body["user"]["id"].as_i64().unwrap();

    let peer = app
        .post(
            "/api/users",
            Some(&manager),
            json!({"username": "peer", "email": "p@example.com", "password": PASSWORD, "role": "manager"}),
        )
        .await;
    assert_eq!(peer.status, StatusCode::FORBIDDEN);

    let promote = app
        .put(
            &format!("/api/users/{}", staff_id),
            Some(&manager),
            json!({"role": "manager"}),
        )
        .await;
    assert_eq!(promote.status, StatusCode::FORBIDDEN);

    let touch_admin = app
        .put(
            &format!("/api/users/{}", admin_id),
            Some(&manager),
            json!({"email": "hijack@example.com"}),
        )
        .await;
    assert_eq!(touch_admin.status, StatusCode::FORBIDDEN);

    let delete_admin = app
        .delete(&format!("/api/users/{}", admin_id), Some(&manager))
        .await;
    assert_eq!(delete_admin.status, StatusCode::FORBIDDEN);

    let bad_role = app
        .post(
            "/api/users",
            Some(&admin),
            json!({"username": "ghost", "email": "g@example.com", "password": PASSWORD, "role": "superuser"}),
        )
        .await;
    assert_eq!(bad_role.status, StatusCode::BAD_REQUEST);

    let duplicate_email = app
        .put(
            &format!("/api/users/{}", staff_id),
            Some(&admin),
            json!({"email": "mgr@example.com"}),
        )
        .await;
    assert_eq!(duplicate_email.status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_delete_and_restore_user() {
    let app = setup_app().await;
    let (admin_id, admin) = app.user("root", Role::Admin).await;
    let (staff_id, _) = app.user("stf", Role::Staff).await;

    let self_delete = app
        .delete(&format!("/api/users/{}", admin_id), Some(&admin))
        .await;
    assert_eq!(self_delete.status, StatusCode::FORBIDDEN);

    let session = login(&app, "stf").await;
    let refresh_token = session["refresh_token"].as_str().unwrap().to_string();

    let deleted = app
        .delete(&format!("/api/users/{}", staff_id), Some(&admin))
        .await;
    assert_eq!(deleted.status, StatusCode::OK, "{}", deleted.body);
    assert!(deleted.body["user"]["deleted_at"].is_string());

    let refresh = app
        .post(
            "/api/auth/refresh",
            None,
            json!({ "refresh_token": refresh_token }),
        )
        .await;
    assert_eq!(refresh.status, StatusCode::UNAUTHORIZED);

    let relogin = app
        .post(
            "/api/auth/login",
            None,
            json!({"login": "stf", "password": PASSWORD}),
        )
        .await;
    assert_eq!(relogin.status, StatusCode::UNAUTHORIZED);

    let live = app.get("/api/users", Some(&admin)).await;
    assert_eq!(live.body["total"], 1);
    let all = app
        .get("/api/users?include_deleted=true", Some(&admin))
        .await;
    assert_eq!(all.body["total"], 2);

    let again = app
        .delete(&format!("/api/users/{}", staff_id), Some(&admin))
        .await;
    assert_eq!(again.status, StatusCode::NOT_FOUND);

    let restored = app
        .post(&format!("/api/users/{}/restore", staff_id), Some(&admin), json!({}))
        .await;
    assert_eq!(restored.status, StatusCode::OK);
    assert!(restored.body["user"].get("deleted_at").is_none());

    let twice = app
        .post(&format!("/api/users/{}/restore", staff_id), Some(&admin), json!({}))
        .await;
    assert_eq!(twice.status, StatusCode::CONFLICT);

    let unknown = app
        .post("/api/users/999/restore", Some(&admin), json!({}))
        .await;
    assert_eq!(unknown.status, StatusCode::NOT_FOUND);

    login(&app, "stf").await;
}

#[tokio::test]
async fn test_user_read_access() {
    let app = setup_app().await;
    let (_, manager) = app.user("mgr", Role::Manager).await;
    let (customer_id, customer) = app.user("cus", Role::Customer).await;
    let (staff_id, _) = app.user("stf", Role::Staff).await;

    let me = app
        .get(&format!("/api/users/{}", customer_id), Some(&customer))
        .await;
    assert_eq!(me.status, StatusCode::OK);
    assert_eq!(me.body["user"]["username"], "cus");

    let other = app
        .get(&format!("/api/users/{}", staff_id), Some(&customer))
        .await;
    assert_eq!(other.status, StatusCode::FORBIDDEN);

    let list = app.get("/api/users", Some(&customer)).await;
    assert_eq!(list.status, StatusCode::FORBIDDEN);

    let staff_only = app.get("/api/users?role=staff", Some(&manager)).await;
    assert_eq!(staff_only.status, StatusCode::OK);
    assert_eq!(staff_only.body["total"], 1);
    assert_eq!(staff_only.body["users"][0]["username"], "stf");

    // include_deleted needs users:manage, which managers lack by default
    let deleted = app
        .get("/api/users?include_deleted=true", Some(&manager))
        .await;
    assert_eq!(deleted.status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_role_permissions_can_be_replaced() {
    let app = setup_app().await;
    let (_, admin) = app.user("root", Role::Admin).await;
    let (_, staff) = app.user("stf", Role::Staff).await;
    let (_, manager) = app.user("mgr", Role::Manager).await;

    let roles = app.get("/api/roles", Some(&manager)).await;
    assert_eq!(roles.status, StatusCode::OK);
    let names: Vec<&str> = roles.body["roles"]
        .as_array()
        .unwrap()
        .iter()
        .map(|r| r["name"].as_str().unwrap())
        .collect();
    assert_eq!(names, vec!["customer", "staff", "manager", "admin"]);
    assert_eq!(roles.body["roles"][3]["permissions"].as_array().unwrap().len(), 12);

    let no_roles = app.get("/api/roles", Some(&staff)).await;
    assert_eq!(no_roles.status, StatusCode::FORBIDDEN);

    let before = app.get("/api/dashboard/summary", Some(&staff)).await;
    assert_eq!(before.status, StatusCode::OK);

    let manager_try = app
        .put(
            "/api/roles/staff/permissions",
            Some(&manager),
            json!({"permissions": []}),
        )
        .await;
    assert_eq!(manager_try.status, StatusCode::FORBIDDEN);

    let replaced = app
        .put(
            "/api/roles/staff/permissions",
            Some(&admin),
            json!({"permissions": ["reservations:create", "reservations:read_all", "reservations:create"]}),
        )
        .await;
    assert_eq!(replaced.status, StatusCode::OK, "{}", replaced.body);
    assert_eq!(
        replaced.body["permissions"],
        json!(["reservations:create", "reservations:read_all"])
    );

    // Takes effect immediately for existing tokens
    let after = app.get("/api/dashboard/summary", Some(&staff)).await;
    assert_eq!(after.status, StatusCode::FORBIDDEN);

    let unknown_code = app
        .put(
            "/api/roles/staff/permissions",
            Some(&admin),
            json!({"permissions": ["launch:rockets"]}),
        )
        .await;
    assert_eq!(unknown_code.status, StatusCode::BAD_REQUEST);

    let admin_role = app
        .put(
            "/api/roles/admin/permissions",
            Some(&admin),
            json!({"permissions": []}),
        )
        .await;
    assert_eq!(admin_role.status, StatusCode::BAD_REQUEST);

    let unknown_role = app
        .put(
            "/api/roles/intern/permissions",
            Some(&admin),
            json!({"permissions": []}),
        )
        .await;
    assert_eq!(unknown_role.status, StatusCode::NOT_FOUND);

    app.state.audit.flush().await.unwrap();
    let history = app.get("/api/audit-logs/role/staff", Some(&admin)).await;
    assert_eq!(history.body["total"], 1);
    let entry = &history.body["entries"][0];
    assert_eq!(entry["action"], "permissions_update");
    assert_eq!(
        entry["changes"]["permissions"]["new"],
        json!(["reservations:create", "reservations:read_all"])
    );
}

#[tokio::test]
async fn test_audit_trail_records_changes_without_secrets() {
    let app = setup_app().await;
    let (admin_id, admin) = app.user("root", Role::Admin).await;
    let catalog = seed_catalog(&app, &admin, 10).await;

    app.put(
        &format!("/api/products/{}", catalog.product_id),
        Some(&admin),
        json!({"base_price": 24.5}),
    )
    .await;
    // No-op update leaves no trace
    app.put(
        &format!("/api/products/{}", catalog.product_id),
        Some(&admin),
        json!({"name": "Classic Tee"}),
    )
    .await;
    let created = app
        .post(
            "/api/users",
            Some(&admin),
            json!({"username": "cashier", "email": "c@example.com", "password": PASSWORD, "role": "staff"}),
        )
        .await;
    let cashier_id = created.body["user"]["id"].as_i64().unwrap();

    // Nothing is visible until the buffer is flushed
    let pending = app.get("/api/audit-logs", Some(&admin)).await;
    assert_eq!(pending.body["total"], 0);
    assert!(pending.body["pending"].as_u64().unwrap() > 0);

    let flushed = app.state.audit.flush().await.unwrap();
    assert!(flushed > 0);
    assert_eq!(app.state.audit.pending(), 0);

    let history = app
        .get(
            &format!("/api/audit-logs/product/{}", catalog.product_id),
            Some(&admin),
        )
        .await;
    assert_eq!(history.status, StatusCode::OK);
    let actions: Vec<&str> = history.body["entries"]
        .as_array()
        .unwrap()
        .iter()
        .map(|e| e["action"].as_str().unwrap())
        .collect();
    assert_eq!(actions, vec!["create", "update"]);

    let update = &history.body["entries"][1];
    assert_eq!(update["actor_id"], admin_id);
    assert_eq!(update["actor_username"], "root");
    assert_eq!(
        update["changes"],
        json!({"base_price": {"old": 19.99, "new": 24.5}})
    );

    let user_entries = app
        .get(&format!("/api/audit-logs/user/{}", cashier_id), Some(&admin))
        .await;
    let snapshot = &user_entries.body["entries"][0]["changes"];
    assert_eq!(snapshot["username"], "cashier");
    assert_eq!(snapshot["password_hash"], "[REDACTED]");

    let creates = app
        .get("/api/audit-logs?action=create&entity_type=product_variant", Some(&admin))
        .await;
    assert_eq!(creates.body["total"], 1);

    let by_actor = app
        .get(&format!("/api/audit-logs?actor_id={}", admin_id), Some(&admin))
        .await;
    assert_eq!(by_actor.body["total"], flushed as u64);

    let (_, staff) = app.user("stf", Role::Staff).await;
    let forbidden = app.get("/api/audit-logs", Some(&staff)).await;
    assert_eq!(forbidden.status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_stock_adjustment_is_audited_with_reason() {
    let app = setup_app().await;
    let (_, manager) = app.user("mgr", Role::Manager).await;
    let catalog = seed_catalog(&app, &manager, 4).await;

    let res = app
        .post(
            &format!("/api/variants/{}/stock", catalog.variant_id),
            Some(&manager),
            json!({"delta": 6, "reason": "delivery"}),
        )
        .await;
    assert_eq!(res.status, StatusCode::OK);

    app.state.audit.flush().await.unwrap();
    let history = app
        .get(
            &format!("/api/audit-logs/product_variant/{}", catalog.variant_id),
            Some(&manager),
        )
        .await;
    let entries = history.body["entries"].as_array().unwrap();
    let last = entries.last().unwrap();
    assert_eq!(last["action"], "stock_adjust");
    assert_eq!(last["changes"]["stock_quantity"], json!({"old": 4, "new": 10}));
    assert_eq!(last["changes"]["reason"], "delivery");
}

#[tokio::test]
async fn test_dashboard_summary() {
    let app = setup_app().await;
    let (_, manager) = app.user("mgr", Role::Manager).await;
    let (_, customer) = app.user("cus", Role::Customer).await;
    let catalog = seed_catalog(&app, &manager, 4).await;

    let size = app
        .post("/api/sizes", Some(&manager), json!({"label": "L", "sort_order": 30}))
        .await;
    let size_id = size.body["size"]["id"].as_i64().unwrap();
    app.post(
        &format!("/api/products/{}/variants", catalog.product_id),
        Some(&manager),
        json!({"color_id": catalog.color_id, "size_id": size_id, "sku": "TEE-1-BLK-L", "stock_quantity": 12}),
    )
    .await;

    app.post(
        "/api/reservations",
        Some(&customer),
        json!({"variant_id": catalog.variant_id, "quantity": 1}),
    )
    .await;

    let res = app.get("/api/dashboard/summary", Some(&manager)).await;
    assert_eq!(res.status, StatusCode::OK, "{}", res.body);
    assert_eq!(res.body["products"], 1);
    assert_eq!(res.body["variants"], 2);
    assert_eq!(res.body["units_in_stock"], 16);
    assert_eq!(res.body["low_stock_threshold"], 5);
    assert_eq!(res.body["low_stock_count"], 1);
    assert_eq!(res.body["low_stock"][0]["sku"], "TEE-1-BLK-M");
    assert_eq!(res.body["low_stock"][0]["product_name"], "Classic Tee");
    assert_eq!(res.body["reservations"]["pending"], 1);
    assert_eq!(res.body["reservations"]["confirmed"], 0);

    let wider = app
        .get("/api/dashboard/summary?low_stock_threshold=12", Some(&manager))
        .await;
    assert_eq!(wider.body["low_stock_count"], 2);

    let negative = app
        .get("/api/dashboard/summary?low_stock_threshold=-1", Some(&manager))
        .await;
    assert_eq!(negative.status, StatusCode::BAD_REQUEST);

    let forbidden = app.get("/api/dashboard/summary", Some(&customer)).await;
    assert_eq!(forbidden.status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_health_reports_database() {
    let app = setup_app().await;
    let res = app.get("/api/health", None).await;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.body["status"], "ok");
    assert_eq!(res.body["service"], "stockroom");
    assert_eq!(res.body["database"], "ok");
}
