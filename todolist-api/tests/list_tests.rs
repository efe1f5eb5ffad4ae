/// To-do lists and membership over HTTP

mod common;

use axum::http::{Method, StatusCode};
use common::TestContext;
use serde_json::json;

#[tokio::test]
async fn test_requires_bearer_token() {
    let ctx = TestContext::new().unwrap();

    let (status, body) = ctx.send(Method::GET, "/v1/todolists", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "unauthorized");

    let (status, _) = ctx
        .send(Method::GET, "/v1/todolists", Some("not-a-jwt"), None)
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = ctx
        .send(Method::GET, "/v1/tasks?list_id=1", None, None)
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_create_and_fetch_list() {
    let ctx = TestContext::new().unwrap();
    let owner = ctx.register("owner").await;

    let (status, list) = ctx
        .send(
            Method::POST,
            "/v1/todolists",
            Some(&owner),
            Some(json!({ "title": "Groceries" })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(list["title"], "Groceries");
    assert_eq!(list["owner"]["username"], "owner");
    assert_eq!(list["members"].as_array().unwrap().len(), 1);
    assert_eq!(list["members"][0]["email"], "owner@example.com");
    assert_eq!(list["tasks"], json!([]));

    let uri = format!("/v1/todolists/{}", list["id"]);
    let (status, fetched) = ctx.send(Method::GET, &uri, Some(&owner), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(fetched, list);

    let (status, all) = ctx.send(Method::GET, "/v1/todolists", Some(&owner), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(all, json!([list]));
}

#[tokio::test]
async fn test_empty_title_rejected() {
    let ctx = TestContext::new().unwrap();
    let owner = ctx.register("owner").await;

    let (status, _) = ctx
        .send(
            Method::POST,
            "/v1/todolists",
            Some(&owner),
            Some(json!({ "title": "" })),
        )
        .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn test_membership_and_ownership() {
    let ctx = TestContext::new().unwrap();
    let owner = ctx.register("owner").await;
    let bob = ctx.register("bob").await;
    let list_id = ctx.create_list(&owner, "Groceries").await;
    let members_uri = format!("/v1/todolists/{}/members", list_id);

    // Not a member yet
    let (status, body) = ctx
        .send(Method::GET, &format!("/v1/todolists/{}", list_id), Some(&bob), None)
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["message"], "User is not a member of this list");

    let (status, list) = ctx
        .send(
            Method::POST,
            &members_uri,
            Some(&owner),
            Some(json!({ "member_email": "bob@example.com" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    let emails: Vec<&str> = list["members"]
        .as_array()
        .unwrap()
        .iter()
        .map(|m| m["email"].as_str().unwrap())
        .collect();
    assert_eq!(emails, vec!["owner@example.com", "bob@example.com"]);

    // Adding twice
    let (status, _) = ctx
        .send(
            Method::POST,
            &members_uri,
            Some(&owner),
            Some(json!({ "member_email": "bob@example.com" })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    // Unknown user
    let (status, _) = ctx
        .send(
            Method::POST,
            &members_uri,
            Some(&owner),
            Some(json!({ "member_email": "carol@example.com" })),
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    // Members can read but not administer
    let (status, _) = ctx
        .send(Method::GET, &format!("/v1/todolists/{}", list_id), Some(&bob), None)
        .await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = ctx
        .send(
            Method::PUT,
            &format!("/v1/todolists/{}/title", list_id),
            Some(&bob),
            Some(json!({ "title": "Bob's list" })),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["message"], "Only the owner can update the title");

    let (status, list) = ctx
        .send(
            Method::PUT,
            &format!("/v1/todolists/{}/title", list_id),
            Some(&owner),
            Some(json!({ "title": "Weekly shop" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(list["title"], "Weekly shop");
}

#[tokio::test]
async fn test_remove_member() {
    let ctx = TestContext::new().unwrap();
    let owner = ctx.register("owner").await;
    ctx.register("bob").await;
    let list_id = ctx.create_list(&owner, "Groceries").await;

    ctx.send(
        Method::POST,
        &format!("/v1/todolists/{}/members", list_id),
        Some(&owner),
        Some(json!({ "member_email": "bob@example.com" })),
    )
    .await;

    let (status, body) = ctx
        .send(
            Method::DELETE,
            &format!("/v1/todolists/{}/members/owner@example.com", list_id),
            Some(&owner),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["message"], "Owner cannot be removed");

    let bob_uri = format!("/v1/todolists/{}/members/bob@example.com", list_id);
    let (status, list) = ctx.send(Method::DELETE, &bob_uri, Some(&owner), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(list["members"].as_array().unwrap().len(), 1);

    let (status, body) = ctx.send(Method::DELETE, &bob_uri, Some(&owner), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["message"], "User is not a member of this list");
}

#[tokio::test]
async fn test_delete_list() {
    let ctx = TestContext::new().unwrap();
    let owner = ctx.register("owner").await;
    let bob = ctx.register("bob").await;
    let list_id = ctx.create_list(&owner, "Groceries").await;
    let uri = format!("/v1/todolists/{}", list_id);

    ctx.send(
        Method::POST,
        &format!("{}/members", uri),
        Some(&owner),
        Some(json!({ "member_email": "bob@example.com" })),
    )
    .await;
    ctx.send(
        Method::POST,
        "/v1/tasks",
        Some(&bob),
        Some(json!({ "list_id": list_id, "title": "Milk" })),
    )
    .await;

    let (status, _) = ctx.send(Method::DELETE, &uri, Some(&bob), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = ctx.send(Method::DELETE, &uri, Some(&owner), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    assert!(body.is_null());

    let (status, _) = ctx.send(Method::GET, &uri, Some(&owner), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, all) = ctx.send(Method::GET, "/v1/todolists", Some(&bob), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(all, json!([]));
}

#[tokio::test]
async fn test_unknown_list() {
    let ctx = TestContext::new().unwrap();
    let owner = ctx.register("owner").await;

    let (status, body) = ctx
        .send(Method::GET, "/v1/todolists/999", Some(&owner), None)
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "not_found");
}
