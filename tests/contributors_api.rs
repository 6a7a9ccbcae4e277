mod common;

use axum::http::StatusCode;
use common::TestApp;
use serde_json::json;

#[tokio::test]
async fn contributor_crud_round_trip() {
    let app = TestApp::spawn().await;

    let (status, created) = app
        .post("/api/v1/contributors", json!({"name": " Борис Стругацкий "}))
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(created["name"], "Борис Стругацкий");
    let uri = format!("/api/v1/contributors/{}", created["id"].as_str().unwrap());

    let (status, renamed) = app.patch(&uri, json!({"name": "Б. Стругацкий"})).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(renamed["name"], "Б. Стругацкий");

    let (_, stored) = app.get(&uri).await;
    let (status, unchanged) = app.patch(&uri, json!({})).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(unchanged, stored);

    let (status, _) = app.delete(&uri).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let (status, _) = app.get(&uri).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn names_may_repeat_but_not_be_blank() {
    let app = TestApp::spawn().await;
    let first = app.contributor("Иван Иванов").await;
    let second = app.contributor("Иван Иванов").await;
    assert_ne!(first, second);

    let (status, body) = app.post("/api/v1/contributors/", json!({"name": ""})).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["error"]["details"][0]["field"], "name");
}

#[tokio::test]
async fn list_searches_names_case_insensitively() {
    let app = TestApp::spawn().await;
    for name in ["Фёдор Достоевский", "Антон Чехов", "Михаил Булгаков"] {
        app.contributor(name).await;
    }

    let (status, page) = app.get("/api/v1/contributors/?q=%D1%87%D0%B5%D1%85").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(page["total"], 1);
    assert_eq!(page["items"][0]["name"], "Антон Чехов");

    let (_, all) = app.get("/api/v1/contributors/?page_size=2").await;
    assert_eq!(all["total"], 3);
    assert_eq!(all["items"][0]["name"], "Антон Чехов");
    assert_eq!(all["items"][1]["name"], "Михаил Булгаков");
}
