//! HTTP-level tests through the full router: status codes, auth, and response shapes.

mod common;

use axum::http::{Method, StatusCode};
use common::{donate, origin, TestHarness};
use samaritan_core::common::{offset_north_km, UserId};
use samaritan_core::domains::identity::RoleKind;
use serde_json::json;
use test_context::test_context;

fn donation_body() -> serde_json::Value {
    json!({
        "category": 1,
        "description": "Fresh bread",
        "pickup_location": {"latitude": origin().latitude, "longitude": origin().longitude},
        "weight": 2.5,
        "weight_unit": "kg",
        "pickup_window_start": "09:00",
        "pickup_window_end": "17:00"
    })
}

#[test_context(TestHarness)]
#[tokio::test]
async fn health_reports_without_database(ctx: &TestHarness) {
    let (status, body) = ctx.request(Method::GET, "/health", None, None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["database"]["status"], "not_configured");
}

#[test_context(TestHarness)]
#[tokio::test]
async fn donate_returns_created_item(ctx: &TestHarness) {
    let donor = ctx.samaritan("donor").await;
    let token = ctx.token(&donor);

    let (status, body) = ctx
        .request(
            Method::POST,
            "/samaritan/donate",
            Some(&token),
            Some(donation_body()),
        )
        .await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["message"], "Item donated successfully");
    let item = &body["item"];
    assert_eq!(item["category"], json!({"id": 1, "name": "Food"}));
    assert_eq!(item["weight"]["value"], 2.5);
    assert_eq!(item["pickup_window"]["start"], "09:00");
    assert_eq!(item["is_active"], true);
    assert_eq!(item["is_reserved"], false);
    assert_eq!(item["posted_by"]["username"], "donor");
    assert!(item["created_at"].is_string());
    assert!(item.get("distance_km").is_none());
}

#[test_context(TestHarness)]
#[tokio::test]
async fn invalid_category_lists_the_options(ctx: &TestHarness) {
    let donor = ctx.samaritan("donor").await;
    let token = ctx.token(&donor);
    let mut body = donation_body();
    body["category"] = json!(99);

    let (status, body) = ctx
        .request(Method::POST, "/samaritan/donate", Some(&token), Some(body))
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Invalid category");
    assert_eq!(body["code"], "validation_error");
    assert_eq!(body["options"]["1"], "Food");
    assert!(body["options"].get("0").is_none());
}

#[test_context(TestHarness)]
#[tokio::test]
async fn missing_fields_are_listed_together(ctx: &TestHarness) {
    let donor = ctx.samaritan("donor").await;
    let token = ctx.token(&donor);

    let (status, body) = ctx
        .request(
            Method::POST,
            "/samaritan/donate",
            Some(&token),
            Some(json!({"description": "No category or location"})),
        )
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(
        body["error"],
        "Missing required fields: category, pickup_location"
    );
}

#[test_context(TestHarness)]
#[tokio::test]
async fn requests_without_a_valid_token_are_unauthorized(ctx: &TestHarness) {
    let (status, body) = ctx.request(Method::GET, "/listings", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["code"], "unauthenticated");

    let (status, _) = ctx
        .request(Method::GET, "/categories", Some("not-a-token"), None)
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[test_context(TestHarness)]
#[tokio::test]
async fn wrong_role_is_forbidden(ctx: &TestHarness) {
    let donor = ctx.samaritan("donor").await;
    let org = ctx.organization("org", origin()).await;

    let (status, body) = ctx
        .request(
            Method::POST,
            "/samaritan/donate",
            Some(&ctx.token(&org)),
            Some(donation_body()),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"], "Only samaritans can donate items");

    let (status, _) = ctx
        .request(Method::GET, "/listings", Some(&ctx.token(&donor)), None)
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[test_context(TestHarness)]
#[tokio::test]
async fn unknown_items_are_not_found(ctx: &TestHarness) {
    let org = ctx.organization("org", origin()).await;
    let token = ctx.token(&org);

    for uri in [
        format!("/items/{}/reserve", uuid::Uuid::new_v4()),
        "/items/not-a-uuid/reserve".to_string(),
    ] {
        let (status, body) = ctx.request(Method::POST, &uri, Some(&token), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND, "{}", uri);
        assert_eq!(body["code"], "not_found");
    }
}

#[test_context(TestHarness)]
#[tokio::test]
async fn wrong_method_is_not_allowed(ctx: &TestHarness) {
    let donor = ctx.samaritan("donor").await;

    let (status, _) = ctx
        .request(
            Method::GET,
            "/samaritan/donate",
            Some(&ctx.token(&donor)),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
}

#[test_context(TestHarness)]
#[tokio::test]
async fn reserve_conflict_is_a_bad_request(ctx: &TestHarness) {
    let donor = ctx.samaritan("donor").await;
    let b = ctx.organization("org_b", origin()).await;
    let c = ctx.organization("org_c", origin()).await;
    let item = donate(&ctx.deps, donor.id(), "Soup", origin()).await;
    let uri = format!("/items/{}/reserve", item.id);

    let (status, body) = ctx
        .request(Method::POST, &uri, Some(&ctx.token(&b)), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Item reserved successfully");
    assert_eq!(body["item"]["reserved_by"]["id"], json!(b.id()));

    let (status, body) = ctx
        .request(Method::POST, &uri, Some(&ctx.token(&c)), None)
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Item is already reserved");
    assert_eq!(body["code"], "already_reserved");
}

#[test_context(TestHarness)]
#[tokio::test]
async fn full_lifecycle_over_http(ctx: &TestHarness) {
    let donor = ctx.samaritan("donor").await;
    let org = ctx.organization("org", origin()).await;
    let org_token = ctx.token(&org);
    let item = donate(&ctx.deps, donor.id(), "Coats", offset_north_km(origin(), 2.0)).await;

    let (status, body) = ctx
        .request(Method::GET, "/listings?radius=5", Some(&org_token), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["radius_km"], 5.0);
    assert_eq!(body["total_items"], 1);
    assert_eq!(body["items"][0]["distance_km"], 2.0);

    for (action, message) in [
        ("reserve", "Item reserved successfully"),
        ("unreserve", "Item unreserved successfully"),
        ("reserve", "Item reserved successfully"),
        ("pickup", "Item picked up successfully"),
    ] {
        let (status, body) = ctx
            .request(
                Method::POST,
                &format!("/items/{}/{}", item.id, action),
                Some(&org_token),
                None,
            )
            .await;
        assert_eq!(status, StatusCode::OK, "{}", action);
        assert_eq!(body["message"], message);
    }

    let (status, body) = ctx
        .request(Method::GET, "/organization/items", Some(&org_token), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["picked_up_items"]["total_items"], 1);
    assert_eq!(body["reserved_items"]["total_items"], 0);

    let (status, body) = ctx
        .request(
            Method::GET,
            "/samaritan/items",
            Some(&ctx.token(&donor)),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["active_items"]["items"][0]["is_picked_up"], true);
}

#[test_context(TestHarness)]
#[tokio::test]
async fn page_past_the_end_is_not_found(ctx: &TestHarness) {
    let donor = ctx.samaritan("donor").await;
    let org = ctx.organization("org", origin()).await;
    donate(&ctx.deps, donor.id(), "One", origin()).await;

    let (status, body) = ctx
        .request(
            Method::GET,
            "/listings?page=2&items_per_page=1",
            Some(&ctx.token(&org)),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], "page_out_of_range");
}

#[test_context(TestHarness)]
#[tokio::test]
async fn categories_include_all(ctx: &TestHarness) {
    let donor = ctx.samaritan("donor").await;

    let (status, body) = ctx
        .request(Method::GET, "/categories", Some(&ctx.token(&donor)), None)
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["options"]["0"], "All");
    assert_eq!(body["options"]["10"], "Others");
}

#[test_context(TestHarness)]
#[tokio::test]
async fn tokens_for_deleted_accounts_are_not_found(ctx: &TestHarness) {
    let samaritan = ctx
        .jwt_service
        .create_token(UserId::new(), "gone".to_string(), RoleKind::Samaritan)
        .unwrap();
    let organization = ctx
        .jwt_service
        .create_token(UserId::new(), "gone_org".to_string(), RoleKind::Organization)
        .unwrap();

    let cases = [
        (Method::POST, "/samaritan/donate", &samaritan, Some(donation_body()), "Samaritan not found"),
        (Method::GET, "/samaritan/items", &samaritan, None, "Samaritan not found"),
        (Method::GET, "/organization/items", &organization, None, "Organization not found"),
    ];

    for (method, uri, token, body, message) in cases {
        let (status, body) = ctx.request(method, uri, Some(token.as_str()), body).await;
        assert_eq!(status, StatusCode::NOT_FOUND, "{}", uri);
        assert_eq!(body["error"], message);
        assert_eq!(body["code"], "not_found");
    }
    assert!(ctx.test_deps.items.is_empty());
}
