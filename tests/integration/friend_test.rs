//! Integration tests for friend requests and direct messages over HTTP.

mod helpers;

use axum::http::StatusCode;

#[tokio::test]
async fn test_request_then_accept() {
    let app = helpers::TestApp::new().await;
    let alice = app.register("alice").await;
    let bob = app.register("bob").await;

    let sent = app
        .request("PUT", &format!("/api/users/{}/friend?type=id", bob.user_id), None, Some(&alice.token))
        .await;
    assert_eq!(sent.status, StatusCode::OK);
    assert_eq!(sent.body["message"], "Friend request sent.");
    assert!(sent.body.get("chat").is_none());

    let again = app
        .request("PUT", &format!("/api/users/{}/friend?type=id", bob.user_id), None, Some(&alice.token))
        .await;
    assert_eq!(again.status, StatusCode::CONFLICT);

    let accepted = app
        .request("PUT", &format!("/api/users/{}/friend?type=id", alice.user_id), None, Some(&bob.token))
        .await;
    assert_eq!(accepted.status, StatusCode::OK);
    assert_eq!(accepted.body["message"], "Friend request accepted.");
    assert!(accepted.body["chat"]["id"].is_string());
}

#[tokio::test]
async fn test_cannot_befriend_yourself() {
    let app = helpers::TestApp::new().await;
    let alice = app.register("alice").await;

    let response = app
        .request("PUT", &format!("/api/users/{}/friend?type=id", alice.user_id), None, Some(&alice.token))
        .await;

    assert_eq!(response.status, StatusCode::CONFLICT);
    assert_eq!(response.body["message"], "You can't add yourself as a friend.");
}

#[tokio::test]
async fn test_bad_user_id_is_rejected() {
    let app = helpers::TestApp::new().await;
    let alice = app.register("alice").await;

    let response = app
        .request("PUT", "/api/users/not-a-uuid/friend?type=id", None, Some(&alice.token))
        .await;

    assert_eq!(response.status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_remove_without_relation_is_not_found() {
    let app = helpers::TestApp::new().await;
    let alice = app.register("alice").await;
    let bob = app.register("bob").await;

    let response = app
        .request("DELETE", &format!("/api/users/{}/friend", bob.user_id), None, Some(&alice.token))
        .await;

    assert_eq!(response.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_friends_exchange_messages() {
    let app = helpers::TestApp::new().await;
    let alice = app.register("alice").await;
    let bob = app.register("bob").await;
    let chat_id = app.befriend(&alice, &bob).await;
    let path = format!("/api/chats/{chat_id}/messages");

    for text in ["first", "second"] {
        let sent = app
            .request(
                "POST",
                &path,
                Some(serde_json::json!({ "content": text, "ackId": "a-1" })),
                Some(&alice.token),
            )
            .await;
        assert_eq!(sent.status, StatusCode::CREATED, "{:?}", sent.body);
        assert_eq!(sent.body["content"], text);
        assert_eq!(sent.body["ackId"], "a-1");
        assert_eq!(sent.body["chatId"], chat_id.as_str());
    }

    let listed = app.request("GET", &path, None, Some(&bob.token)).await;
    assert_eq!(listed.status, StatusCode::OK);
    let messages = listed.body.as_array().unwrap();
    assert_eq!(messages.len(), 2);
    assert_eq!(messages[0]["content"], "second");

    let limited = app
        .request("GET", &format!("{path}?limit=1"), None, Some(&bob.token))
        .await;
    assert_eq!(limited.body.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_messaging_requires_friendship_and_membership() {
    let app = helpers::TestApp::new().await;
    let alice = app.register("alice").await;
    let bob = app.register("bob").await;
    let eve = app.register("eve").await;
    let chat_id = app.befriend(&alice, &bob).await;
    let path = format!("/api/chats/{chat_id}/messages");

    let outsider = app
        .request(
            "POST",
            &path,
            Some(serde_json::json!({ "content": "hi" })),
            Some(&eve.token),
        )
        .await;
    assert_eq!(outsider.status, StatusCode::FORBIDDEN);

    let unfriended = app
        .request("DELETE", &format!("/api/users/{}/friend", alice.user_id), None, Some(&bob.token))
        .await;
    assert_eq!(unfriended.status, StatusCode::OK);
    assert_eq!(unfriended.body["message"], "Friend removed.");

    let after = app
        .request(
            "POST",
            &path,
            Some(serde_json::json!({ "content": "still there?" })),
            Some(&alice.token),
        )
        .await;
    assert_eq!(after.status, StatusCode::FORBIDDEN);
    assert_eq!(after.body["message"], "You must be friends to exchange messages.");

    let blank = app
        .request(
            "POST",
            &path,
            Some(serde_json::json!({ "content": "   " })),
            Some(&alice.token),
        )
        .await;
    assert_eq!(blank.status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_add_friend_by_username() {
    let app = helpers::TestApp::new().await;
    let alice = app.register("alice").await;
    let bob = app.register("Bob").await;

    let sent = app.request("PUT", "/api/users/bOB/friend", None, Some(&alice.token)).await;
    assert_eq!(sent.status, StatusCode::OK, "{:?}", sent.body);
    assert_eq!(sent.body["user_id"], bob.user_id.as_str());
    assert_eq!(sent.body["username"], "Bob");

    let accepted = app.request("PUT", "/api/users/alice/friend", None, Some(&bob.token)).await;
    assert_eq!(accepted.body["message"], "Friend request accepted.");

    let missing = app.request("PUT", "/api/users/nobody/friend", None, Some(&alice.token)).await;
    assert_eq!(missing.status, StatusCode::NOT_FOUND);
    assert_eq!(missing.body["message"], "User not found.");

    // Without `type=id` an id is just an unknown username.
    let by_id_as_name = app
        .request("PUT", &format!("/api/users/{}/friend", bob.user_id), None, Some(&alice.token))
        .await;
    assert_eq!(by_id_as_name.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_history_cursors_and_content_bounds() {
    let app = helpers::TestApp::new().await;
    let alice = app.register("alice").await;
    let bob = app.register("bob").await;
    let chat_id = app.befriend(&alice, &bob).await;
    let path = format!("/api/chats/{chat_id}/messages");

    let mut ids = Vec::new();
    for text in ["a", "b", "c"] {
        let sent = app
            .request("POST", &path, Some(serde_json::json!({ "content": text })), Some(&alice.token))
            .await;
        assert!(sent.body.get("ackId").is_none());
        ids.push(sent.body["id"].as_str().unwrap().to_string());
    }

    let older = app
        .request("GET", &format!("{path}?before={}", ids[2]), None, Some(&bob.token))
        .await;
    let contents: Vec<_> = older.body.as_array().unwrap().iter().map(|m| m["content"].clone()).collect();
    assert_eq!(contents, vec!["b", "a"]);

    let newer = app
        .request("GET", &format!("{path}?after={}", ids[0]), None, Some(&bob.token))
        .await;
    let contents: Vec<_> = newer.body.as_array().unwrap().iter().map(|m| m["content"].clone()).collect();
    assert_eq!(contents, vec!["c", "b"]);

    let bad_cursor = app
        .request("GET", &format!("{path}?before=nope"), None, Some(&bob.token))
        .await;
    assert_eq!(bad_cursor.status, StatusCode::BAD_REQUEST);

    let too_long = app
        .request(
            "POST",
            &path,
            Some(serde_json::json!({ "content": "x".repeat(1025) })),
            Some(&alice.token),
        )
        .await;
    assert_eq!(too_long.status, StatusCode::BAD_REQUEST);
    assert_eq!(
        too_long.body["message"],
        "Message content must be between 1 and 1024 characters."
    );

    let longest = app
        .request(
            "POST",
            &path,
            Some(serde_json::json!({ "content": format!(" {} ", "x".repeat(1024)) })),
            Some(&alice.token),
        )
        .await;
    assert_eq!(longest.status, StatusCode::CREATED);
}
