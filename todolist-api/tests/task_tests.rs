/// Tasks over HTTP

mod common;

use axum::http::{Method, StatusCode};
use common::TestContext;
use serde_json::json;

#[tokio::test]
async fn test_task_lifecycle() {
    let ctx = TestContext::new().unwrap();
    let owner = ctx.register("owner").await;
    let list_id = ctx.create_list(&owner, "Groceries").await;

    let (status, milk) = ctx
        .send(
            Method::POST,
            "/v1/tasks",
            Some(&owner),
            Some(json!({ "list_id": list_id, "title": "Milk", "description": "2 liters" })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(milk["title"], "Milk");
    assert_eq!(milk["description"], "2 liters");
    assert_eq!(milk["completed"], false);

    let (status, eggs) = ctx
        .send(
            Method::POST,
            "/v1/tasks",
            Some(&owner),
            Some(json!({ "list_id": list_id, "title": "Eggs" })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert!(eggs["description"].is_null());

    let tasks_uri = format!("/v1/tasks?list_id={}", list_id);
    let (status, tasks) = ctx.send(Method::GET, &tasks_uri, Some(&owner), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(tasks, json!([milk, eggs]));

    let (status, updated) = ctx
        .send(
            Method::PUT,
            &format!("/v1/tasks/{}", milk["id"]),
            Some(&owner),
            Some(json!({ "title": "Oat milk", "completed": true })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["title"], "Oat milk");
    assert!(updated["description"].is_null());
    assert_eq!(updated["completed"], true);

    let (status, _) = ctx
        .send(
            Method::DELETE,
            &format!("/v1/tasks/{}", eggs["id"]),
            Some(&owner),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, list) = ctx
        .send(
            Method::GET,
            &format!("/v1/todolists/{}", list_id),
            Some(&owner),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(list["tasks"], json!([updated]));
}

#[tokio::test]
async fn test_outsider_cannot_touch_tasks() {
    let ctx = TestContext::new().unwrap();
    let owner = ctx.register("owner").await;
    let eve = ctx.register("eve").await;
    let list_id = ctx.create_list(&owner, "Groceries").await;

    let (_, milk) = ctx
        .send(
            Method::POST,
            "/v1/tasks",
            Some(&owner),
            Some(json!({ "list_id": list_id, "title": "Milk" })),
        )
        .await;

    let (status, _) = ctx
        .send(
            Method::POST,
            "/v1/tasks",
            Some(&eve),
            Some(json!({ "list_id": list_id, "title": "Cake" })),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = ctx
        .send(
            Method::GET,
            &format!("/v1/tasks?list_id={}", list_id),
            Some(&eve),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = ctx
        .send(
            Method::PUT,
            &format!("/v1/tasks/{}", milk["id"]),
            Some(&eve),
            Some(json!({ "title": "Cake", "completed": true })),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = ctx
        .send(
            Method::DELETE,
            &format!("/v1/tasks/{}", milk["id"]),
            Some(&eve),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_unknown_task_and_list() {
    let ctx = TestContext::new().unwrap();
    let owner = ctx.register("owner").await;

    let (status, _) = ctx
        .send(
            Method::POST,
            "/v1/tasks",
            Some(&owner),
            Some(json!({ "list_id": 404, "title": "Milk" })),
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = ctx
        .send(Method::DELETE, "/v1/tasks/404", Some(&owner), None)
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = ctx
        .send(
            Method::PUT,
            "/v1/tasks/404",
            Some(&owner),
            Some(json!({ "title": "Milk", "completed": false })),
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
