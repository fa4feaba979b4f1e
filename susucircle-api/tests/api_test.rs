/// Integration tests for the SusuCircle API
///
/// These tests verify the full system works end-to-end over HTTP:
/// - Credential exchange (register, login) against the identity adapter
/// - Group formation, joining, and the automatic start at capacity
/// - Contribution collection and rotation settlement
/// - Invitation issue and redemption
/// - Error mapping (validation, conflicts, authentication)
///
/// They require a running PostgreSQL database via DATABASE_URL.

mod common;

use axum::http::{Method, StatusCode};
use common::TestContext;
use serde_json::json;

#[tokio::test]
async fn test_register_and_login() {
    let ctx = TestContext::new(1).await.unwrap();

    let (status, body) = ctx
        .request(
            Method::POST,
            "/v1/auth/login",
            None,
            Some(json!({ "credential": ctx.users[0].token })),
        )
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["username"], ctx.users[0].username.as_str());
    assert_eq!(body["id"], ctx.users[0].user_id.to_string());

    // registering the same identity twice is a conflict
    let (status, _) = ctx
        .request(
            Method::POST,
            "/v1/auth/register",
            None,
            Some(json!({
                "credential": ctx.users[0].token,
                "username": "someone-else",
            })),
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_unknown_credential_rejected() {
    let ctx = TestContext::new(0).await.unwrap();

    let (status, body) = ctx
        .request(
            Method::POST,
            "/v1/auth/login",
            None,
            Some(json!({ "credential": "no-such-token" })),
        )
        .await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "unauthorized");
}

#[tokio::test]
async fn test_protected_routes_require_credentials() {
    let ctx = TestContext::new(0).await.unwrap();

    let (status, body) = ctx.request(Method::GET, "/v1/me", None, None).await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "missing_credentials");
}

#[tokio::test]
async fn test_create_group_validation() {
    let ctx = TestContext::new(1).await.unwrap();

    let (status, body) = ctx
        .request(
            Method::POST,
            "/v1/groups",
            Some(0),
            Some(json!({
                "name": "Too small",
                "cycle_size": 1,
                "weekly_amount": 10000,
            })),
        )
        .await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["error"], "validation_error");
}

#[tokio::test]
async fn test_full_group_lifecycle_over_http() {
    let ctx = TestContext::new(4).await.unwrap();

    // user 0 creates a three-seat group
    let (status, group) = ctx
        .request(
            Method::POST,
            "/v1/groups",
            Some(0),
            Some(json!({
                "name": "Akwaaba Savings",
                "description": "Friday circle",
                "cycle_size": 3,
                "weekly_amount": 20000,
            })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(group["status"], "forming");
    assert_eq!(group["total_pool_amount"], 60000);
    let group_id = group["id"].as_str().unwrap().to_string();

    // users 1 and 2 take the remaining seats; the group starts on the last
    for i in [1, 2] {
        let (status, membership) = ctx
            .request(
                Method::POST,
                &format!("/v1/groups/{group_id}/join"),
                Some(i),
                None,
            )
            .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(membership["payout_order"], i + 1);
    }

    let (status, detail) = ctx
        .request(Method::GET, &format!("/v1/groups/{group_id}"), Some(0), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(detail["status"], "collecting");
    assert_eq!(detail["member_count"], 3);
    assert_eq!(detail["available_slots"], 0);

    // a fourth user bounces off the full group
    let (status, body) = ctx
        .request(
            Method::POST,
            &format!("/v1/groups/{group_id}/join"),
            Some(3),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "conflict");

    // three full cycles: everyone contributes, the last payment settles
    for cycle in 1..=3 {
        for i in [0, 1, 2] {
            let (status, _) = ctx
                .request(
                    Method::POST,
                    &format!("/v1/groups/{group_id}/contributions"),
                    Some(i),
                    Some(json!({ "amount": 20000 })),
                )
                .await;
            assert_eq!(status, StatusCode::CREATED);
        }

        let (_, detail) = ctx
            .request(Method::GET, &format!("/v1/groups/{group_id}"), Some(0), None)
            .await;
        assert_eq!(detail["current_cycle"], cycle);
    }

    let (_, detail) = ctx
        .request(Method::GET, &format!("/v1/groups/{group_id}"), Some(0), None)
        .await;
    assert_eq!(detail["status"], "complete");
    assert_eq!(detail["current_cycle"], 3);

    // ledger of record: 9 contributions + 3 payouts
    let (status, ledger) = ctx
        .request(
            Method::GET,
            &format!("/v1/groups/{group_id}/ledger"),
            Some(1),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    let entries = ledger.as_array().unwrap();
    assert_eq!(entries.len(), 12);
    let payouts = entries
        .iter()
        .filter(|e| e["tx_type"] == "payout")
        .count();
    assert_eq!(payouts, 3);
    assert!(entries
        .iter()
        .filter(|e| e["tx_type"] == "payout")
        .all(|e| e["amount"] == 60000));
}

#[tokio::test]
async fn test_settle_is_idempotent_over_http() {
    let ctx = TestContext::new(2).await.unwrap();

    let (_, group) = ctx
        .request(
            Method::POST,
            "/v1/groups",
            Some(0),
            Some(json!({
                "name": "Pair circle",
                "cycle_size": 2,
                "weekly_amount": 5000,
            })),
        )
        .await;
    let group_id = group["id"].as_str().unwrap().to_string();

    ctx.request(
        Method::POST,
        &format!("/v1/groups/{group_id}/join"),
        Some(1),
        None,
    )
    .await;

    // nobody has paid: settle changes nothing
    let (status, settled) = ctx
        .request(
            Method::POST,
            &format!("/v1/groups/{group_id}/settle"),
            Some(0),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(settled["status"], "collecting");
    assert_eq!(settled["current_cycle"], 0);
}

#[tokio::test]
async fn test_invitation_flow_over_http() {
    let ctx = TestContext::new(2).await.unwrap();

    let (_, group) = ctx
        .request(
            Method::POST,
            "/v1/groups",
            Some(0),
            Some(json!({
                "name": "Invite only",
                "cycle_size": 2,
                "weekly_amount": 10000,
            })),
        )
        .await;
    let group_id = group["id"].as_str().unwrap().to_string();

    // neither email nor phone: rejected before any write
    let (status, _) = ctx
        .request(
            Method::POST,
            &format!("/v1/groups/{group_id}/invitations"),
            Some(0),
            Some(json!({ "name": "Efua" })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, invitation) = ctx
        .request(
            Method::POST,
            &format!("/v1/groups/{group_id}/invitations"),
            Some(0),
            Some(json!({ "email": "efua@example.com", "ttl_hours": 24 })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(invitation["status"], "pending");
    assert_eq!(invitation["is_valid"], true);
    let code = invitation["code"].as_str().unwrap().to_string();
    assert_eq!(code.len(), 8);

    // user 1 redeems and fills the last seat
    let (status, membership) = ctx
        .request(
            Method::POST,
            "/v1/invitations/redeem",
            Some(1),
            Some(json!({ "code": code })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(membership["payout_order"], 2);

    // the code is spent
    let (status, body) = ctx
        .request(
            Method::POST,
            "/v1/invitations/redeem",
            Some(0),
            Some(json!({ "code": code })),
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "conflict");

    let (_, detail) = ctx
        .request(Method::GET, &format!("/v1/groups/{group_id}"), Some(0), None)
        .await;
    assert_eq!(detail["status"], "collecting");
}

#[tokio::test]
async fn test_profile_update() {
    let ctx = TestContext::new(1).await.unwrap();

    let (status, profile) = ctx
        .request(
            Method::PATCH,
            "/v1/me",
            Some(0),
            Some(json!({ "full_name": "Ama Serwaa Mensah" })),
        )
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(profile["full_name"], "Ama Serwaa Mensah");

    let (_, me) = ctx.request(Method::GET, "/v1/me", Some(0), None).await;
    assert_eq!(me["full_name"], "Ama Serwaa Mensah");
}
