//! Project endpoint integration tests.

mod common;

use common::{TestApp, TEST_USER_ID};
use serde_json::{json, Value};

#[tokio::test]
async fn create_project_generates_key() {
    let app = TestApp::spawn().await;
    let project = app.seed_project().await;

    let key = project["project_key"].as_str().unwrap();
    assert!(key.starts_with("pk_"));
    assert_eq!(key.len(), 35);
    assert_eq!(project["created_by"], TEST_USER_ID);
    assert_eq!(project["is_active"], true);

    app.cleanup().await;
}

#[tokio::test]
async fn list_projects_newest_first() {
    let app = TestApp::spawn().await;
    let org = app.create_organization("Acme").await;
    let org_id = org["id"].as_str().unwrap();
    let older = app.create_project(org_id, "Older").await;
    tokio::time::sleep(tokio::time::Duration::from_millis(5)).await;
    let newer = app.create_project(org_id, "Newer").await;

    let response = app
        .client
        .get(app.url(&format!(
            "/api/v1/projects?orgId={}&userId={}",
            org_id, TEST_USER_ID
        )))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 200);

    let body: Value = response.json().await.unwrap();
    let projects = body["data"].as_array().unwrap();
    assert_eq!(projects.len(), 2);
    assert_eq!(projects[0]["id"], newer["id"]);
    assert_eq!(projects[1]["id"], older["id"]);

    app.cleanup().await;
}

#[tokio::test]
async fn list_projects_requires_parameters() {
    let app = TestApp::spawn().await;

    let response = app
        .client
        .get(app.url("/api/v1/projects?orgId=abc"))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 400);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["error"], "Missing required parameters");

    app.cleanup().await;
}

#[tokio::test]
async fn create_project_in_unknown_organization() {
    let app = TestApp::spawn().await;

    let response = app
        .client
        .post(app.url(&format!(
            "/api/v1/projects?orgId={}&userId={}",
            uuid::Uuid::new_v4(),
            TEST_USER_ID
        )))
        .json(&json!({ "name": "Orphan" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 404);

    app.cleanup().await;
}

#[tokio::test]
async fn create_project_requires_name() {
    let app = TestApp::spawn().await;
    let org = app.create_organization("Acme").await;

    let response = app
        .client
        .post(app.url(&format!(
            "/api/v1/projects?orgId={}&userId={}",
            org["id"].as_str().unwrap(),
            TEST_USER_ID
        )))
        .json(&json!({ "description": "nameless" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 400);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["details"], "name");

    app.cleanup().await;
}

#[tokio::test]
async fn update_and_delete_project() {
    let app = TestApp::spawn().await;
    let project = app.seed_project().await;
    let project_id = project["id"].as_str().unwrap();

    let response = app
        .client
        .put(app.url(&format!("/api/v1/projects?projectId={}", project_id)))
        .json(&json!({ "description": "Customer support assistant" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 200);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["data"]["name"], "Support Bot");
    assert_eq!(body["data"]["description"], "Customer support assistant");
    assert_eq!(body["data"]["project_key"], project["project_key"]);

    let response = app
        .client
        .delete(app.url(&format!("/api/v1/projects?projectId={}", project_id)))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 200);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["message"], "project deleted successfully");

    let response = app
        .client
        .put(app.url(&format!("/api/v1/projects?projectId={}", project_id)))
        .json(&json!({ "name": "Ghost" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 404);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["error"], "project not found");

    app.cleanup().await;
}

#[tokio::test]
async fn delete_requires_project_id() {
    let app = TestApp::spawn().await;

    let response = app
        .client
        .delete(app.url("/api/v1/projects"))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 400);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["error"], "Missing project ID");

    app.cleanup().await;
}
