use actix_web::{test, web, App};
use httpmock::Method::{GET, POST};
use httpmock::MockServer;
use serde_json::json;
use sqlx::Row;
use uuid::Uuid;

use producto_backend::api::payments::{capture_payment, create_payment};

mod support;

fn set_env(key: &str, value: &str) {
    std::env::set_var(key, value);
}

#[actix_web::test]
async fn create_then_capture_credits_the_ledger_once() {
    let Some(test_db) = support::init_test_db().await else {
        return;
    };
    let pool = &test_db.pool;

    let server = MockServer::start_async().await;
    set_env("PAYPAL_API_BASE_URL", &server.url(""));

    let user_id = Uuid::new_v4();
    sqlx::query("INSERT INTO users (id, email) VALUES ($1, $2)")
        .bind(user_id)
        .bind(format!("pay_{user_id}@example.com"))
        .execute(pool)
        .await
        .expect("insert user");

    let order_id = "ORDER-ONCE-1";
    let custom_id = json!({
        "userId": user_id,
        "packageId": "basic",
        "credits": 21
    })
    .to_string();

    let token_mock = server.mock(|when, then| {
        when.method(POST).path("/v1/oauth2/token");
        then.status(200)
            .json_body(json!({ "access_token": "test-token", "token_type": "Bearer" }));
    });
    let create_mock = server.mock(|when, then| {
        when.method(POST)
            .path("/v2/checkout/orders")
            .header("Authorization", "Bearer test-token");
        then.status(201)
            .json_body(json!({ "id": order_id, "status": "CREATED" }));
    });
    let get_mock = server.mock(|when, then| {
        when.method(GET).path(format!("/v2/checkout/orders/{order_id}"));
        then.status(200).json_body(json!({
            "id": order_id,
            "status": "COMPLETED",
            "purchase_units": [{ "custom_id": custom_id }]
        }));
    });

    let state = web::Data::new(support::build_state(test_db.pool.clone()).await);
    let app = test::init_service(
        App::new().app_data(state.clone()).service(
            web::scope("/api")
                .service(create_payment)
                .service(capture_payment),
        ),
    )
    .await;

    let req = test::TestRequest::post()
        .uri("/api/payments")
        .set_json(json!({ "packageId": "basic", "userId": user_id }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert!(resp.status().is_success());
    let body: serde_json::Value = test::read_body_json(resp).await;
    assert_eq!(body["orderId"], order_id);
    assert!(body["paymentId"].is_i64());

    let status: String = sqlx::query("SELECT status FROM payments WHERE provider_order_id = $1")
        .bind(order_id)
        .fetch_one(pool)
        .await
        .expect("select payment")
        .get("status");
    assert_eq!(status, "pending");

    // Capture twice; the second call must be a no-op for the ledger.
    for _ in 0..2 {
        let req = test::TestRequest::put()
            .uri("/api/payments")
            .set_json(json!({ "orderId": order_id }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert!(resp.status().is_success());
        let body: serde_json::Value = test::read_body_json(resp).await;
        assert_eq!(body["success"], true);
        assert_eq!(body["status"], "COMPLETED");
        assert_eq!(body["credits"], 21);
    }

    let balance: i64 = sqlx::query("SELECT balance FROM user_credits WHERE user_id = $1")
        .bind(user_id)
        .fetch_one(pool)
        .await
        .expect("select balance")
        .get("balance");
    assert_eq!(balance, 21);

    let purchase_rows = sqlx::query(
        r#"SELECT amount, related_payment_id
           FROM credit_transactions
           WHERE user_id = $1 AND kind = 'purchase'"#,
    )
    .bind(user_id)
    .fetch_all(pool)
    .await
    .expect("select purchase entries");
    assert_eq!(purchase_rows.len(), 1);
    assert_eq!(purchase_rows[0].get::<i64, _>("amount"), 21);
    assert!(purchase_rows[0]
        .get::<Option<i64>, _>("related_payment_id")
        .is_some());

    let status: String = sqlx::query("SELECT status FROM payments WHERE provider_order_id = $1")
        .bind(order_id)
        .fetch_one(pool)
        .await
        .expect("select payment")
        .get("status");
    assert_eq!(status, "completed");

    create_mock.assert();
    get_mock.assert_hits(2);
    token_mock.assert_hits(3);
}

#[actix_web::test]
async fn capture_settles_open_orders_through_the_provider() {
    let Some(test_db) = support::init_test_db().await else {
        return;
    };
    let pool = &test_db.pool;

    let server = MockServer::start_async().await;
    set_env("PAYPAL_API_BASE_URL", &server.url(""));

    let user_id = Uuid::new_v4();
    sqlx::query("INSERT INTO users (id, email) VALUES ($1, $2)")
        .bind(user_id)
        .bind(format!("cap_{user_id}@example.com"))
        .execute(pool)
        .await
        .expect("insert user");

    let order_id = "ORDER-OPEN-1";
    let custom_id = json!({
        "userId": user_id,
        "packageId": "starter",
        "credits": 3
    })
    .to_string();

    sqlx::query(
        r#"INSERT INTO payments
               (user_id, package_id, amount, currency, status, payment_method, provider_order_id)
           VALUES ($1, 'starter', 1.00, 'USD', 'pending', 'paypal', $2)"#,
    )
    .bind(user_id)
    .bind(order_id)
    .execute(pool)
    .await
    .expect("insert pending payment");

    let _token_mock = server.mock(|when, then| {
        when.method(POST).path("/v1/oauth2/token");
        then.status(200)
            .json_body(json!({ "access_token": "test-token", "token_type": "Bearer" }));
    });
    let get_mock = server.mock(|when, then| {
        when.method(GET).path(format!("/v2/checkout/orders/{order_id}"));
        then.status(200).json_body(json!({
            "id": order_id,
            "status": "APPROVED",
            "purchase_units": [{ "custom_id": custom_id }]
        }));
    });
    let capture_mock = server.mock(|when, then| {
        when.method(POST)
            .path(format!("/v2/checkout/orders/{order_id}/capture"));
        then.status(201)
            .json_body(json!({ "id": order_id, "status": "COMPLETED" }));
    });

    let state = web::Data::new(support::build_state(test_db.pool.clone()).await);
    let app = test::init_service(
        App::new()
            .app_data(state.clone())
            .service(web::scope("/api").service(capture_payment)),
    )
    .await;

    let req = test::TestRequest::put()
        .uri("/api/payments")
        .set_json(json!({ "orderId": order_id }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert!(resp.status().is_success());
    let body: serde_json::Value = test::read_body_json(resp).await;
    assert_eq!(body["status"], "COMPLETED");
    assert_eq!(body["credits"], 3);

    let balance: i64 = sqlx::query("SELECT balance FROM user_credits WHERE user_id = $1")
        .bind(user_id)
        .fetch_one(pool)
        .await
        .expect("select balance")
        .get("balance");
    assert_eq!(balance, 3);

    get_mock.assert();
    capture_mock.assert();
}
