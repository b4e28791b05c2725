use std::path::PathBuf;

use httpmock::Method::GET;
use httpmock::MockServer;
use serde_json::json;
use tempfile::tempdir;
use url::Url;

fn render_args(server: &MockServer, out: PathBuf) -> posts_feed::CliArgs {
    posts_feed::CliArgs {
        api_url: Url::parse(&server.base_url()).unwrap(),
        user_agent: "test-agent".to_string(),
        timeout_secs: 5,
        cache_max_age_secs: None,
        progress: posts_feed::ProgressMode::Never,
        command: posts_feed::CliCommand::Render {
            out,
            title: "Test Feed".to_string(),
        },
    }
}

#[tokio::test]
async fn render_writes_page_with_posts() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/posts");
            then.status(200).json_body(json!([
                {"id": 1, "name": "alice", "img": "/a.png", "text": "hello <world>", "time": "1h"},
                {"id": 2, "name": "bob", "img": "", "text": "second", "time": "2h"}
            ]));
        })
        .await;

    let tmp = tempdir().unwrap();
    let out = tmp.path().join("nested/posts.html");
    posts_feed::run(render_args(&server, out.clone()))
        .await
        .unwrap();

    let html = std::fs::read_to_string(&out).unwrap();
    assert!(html.contains("<title>Test Feed</title>"));
    assert!(html.contains("hello &lt;world&gt;"));
    assert!(html.contains("Posts: 2"));
    assert_eq!(html.matches("class=\"pf-post\"").count(), 2);
}

#[tokio::test]
async fn render_failure_still_writes_error_page() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/posts");
            then.status(500).body("Internal");
        })
        .await;

    let tmp = tempdir().unwrap();
    let out = tmp.path().join("posts.html");
    let err = posts_feed::run(render_args(&server, out.clone()))
        .await
        .unwrap_err();
    assert_eq!(err.to_string(), "Server error: 500, message: Internal");

    let html = std::fs::read_to_string(&out).unwrap();
    assert!(html.contains("Server error: 500, message: Internal"));
    assert!(html.contains("class=\"pf-error\""));
    assert!(!html.contains("class=\"pf-post\""));
}

#[tokio::test]
async fn delete_command_hits_item_endpoint() {
    let server = MockServer::start_async().await;
    let delete = server
        .mock_async(|when, then| {
            when.method(httpmock::Method::DELETE).path("/posts/7");
            then.status(200);
        })
        .await;

    let mut args = render_args(&server, PathBuf::from("unused.html"));
    args.command = posts_feed::CliCommand::Delete { id: 7 };
    posts_feed::run(args).await.unwrap();
    delete.assert_hits_async(1).await;
}
