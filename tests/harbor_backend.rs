mod common;

use common::{BASIC_AUTH, StubRegistry, StubResponse};
use registry_syncer::config::BackendType;
use registry_syncer::error::SyncError;
use registry_syncer::registry::{HarborBackend, RegistryBackend};
use serde_json::json;
use std::collections::BTreeSet;

fn names(names: &[&str]) -> serde_json::Value {
    json!(names.iter().map(|n| json!({ "name": n })).collect::<Vec<_>>())
}

fn page(request: &common::RecordedRequest) -> u32 {
    request
        .query_param("page")
        .and_then(|p| p.parse().ok())
        .unwrap_or(0)
}

#[tokio::test]
async fn test_full_page_requests_next_page_until_empty() {
    let stub = StubRegistry::start(|req| {
        if req.path != "/api/v2.0/projects/library/repositories" {
            return StubResponse::status(404, "{}");
        }
        match page(req) {
            1 => StubResponse::json(json!(
                (0..100)
                    .map(|i| json!({ "name": format!("library/app-{:03}", i) }))
                    .collect::<Vec<_>>()
            )),
            2 => StubResponse::json(names(&["library/zeta"])),
            _ => StubResponse::json(json!([])),
        }
    })
    .await;

    let backend = HarborBackend::new(stub.client(BackendType::Harbor), 4);
    let repositories = backend.list_repositories("library/").await.unwrap();

    assert_eq!(repositories.len(), 101);
    assert!(repositories.contains("library/zeta"));

    let pages: Vec<u32> = stub.requests().iter().map(page).collect();
    assert_eq!(pages, vec![1, 2, 3]);
    for request in stub.requests() {
        assert_eq!(request.query_param("page_size").as_deref(), Some("100"));
        assert_eq!(request.authorization.as_deref(), Some(BASIC_AUTH));
    }
}

#[tokio::test]
async fn test_short_page_is_not_the_end() {
    let stub = StubRegistry::start(|req| match page(req) {
        1 => StubResponse::json(names(&["library/a"])),
        _ => StubResponse::json(json!([])),
    })
    .await;

    let backend = HarborBackend::new(stub.client(BackendType::Harbor), 4);
    let repositories = backend.list_repositories("library/").await.unwrap();

    assert_eq!(repositories, BTreeSet::from(["library/a".to_string()]));
    assert_eq!(stub.requests().len(), 2);
}

#[tokio::test]
async fn test_registry_wide_listing_aggregates_projects() {
    let stub = StubRegistry::start(|req| {
        let first = page(req) == 1;
        match req.path.as_str() {
            "/api/v2.0/projects" if first => StubResponse::json(names(&["library", "team"])),
            "/api/v2.0/projects/library/repositories" if first => {
                StubResponse::json(names(&["library/nginx", "library/redis"]))
            }
            "/api/v2.0/projects/team/repositories" if first => {
                StubResponse::json(names(&["team/app"]))
            }
            _ => StubResponse::json(json!([])),
        }
    })
    .await;

    let backend = HarborBackend::new(stub.client(BackendType::Harbor), 2);
    let repositories = backend.list_repositories("").await.unwrap();

    assert_eq!(
        repositories,
        BTreeSet::from([
            "library/nginx".to_string(),
            "library/redis".to_string(),
            "team/app".to_string(),
        ])
    );
}

#[tokio::test]
async fn test_failing_project_fails_registry_wide_listing() {
    let stub = StubRegistry::start(|req| match req.path.as_str() {
        "/api/v2.0/projects" if page(req) == 1 => StubResponse::json(names(&["library", "broken"])),
        "/api/v2.0/projects/broken/repositories" => StubResponse::status(403, "forbidden"),
        _ => StubResponse::json(json!([])),
    })
    .await;

    let backend = HarborBackend::new(stub.client(BackendType::Harbor), 4);
    let err = backend.list_repositories("").await.unwrap_err();

    assert!(matches!(err, SyncError::List { status: 403, .. }));
}

#[tokio::test]
async fn test_sub_prefix_keeps_literal_prefix_matches_only() {
    let stub = StubRegistry::start(|req| match page(req) {
        1 if req.path == "/api/v2.0/projects/team/repositories" => {
            StubResponse::json(names(&["team/sub/a", "team/sub/b/c", "team/subway", "team/other"]))
        }
        _ => StubResponse::json(json!([])),
    })
    .await;

    let backend = HarborBackend::new(stub.client(BackendType::Harbor), 4);

    let filtered = backend.list_repositories("team/sub/").await.unwrap();
    assert_eq!(
        filtered,
        BTreeSet::from(["team/sub/a".to_string(), "team/sub/b/c".to_string()])
    );

    let whole_project = backend.list_repositories("team/").await.unwrap();
    assert_eq!(whole_project.len(), 4);
}

#[tokio::test]
async fn test_latest_tag_double_encodes_nested_repository() {
    let stub = StubRegistry::start(|req| {
        if req.path == "/api/v2.0/projects/team/repositories/group%252Fapp/artifacts" {
            StubResponse::json(json!([{ "digest": "sha256:1", "tags": [{ "name": "v3" }, { "name": "stable" }] }]))
        } else {
            StubResponse::status(404, "{}")
        }
    })
    .await;

    let backend = HarborBackend::new(stub.client(BackendType::Harbor), 4);
    assert_eq!(backend.latest_tag("team/group/app").await.unwrap(), "v3");

    let request = &stub.requests()[0];
    assert_eq!(request.query_param("page_size").as_deref(), Some("1"));
    assert_eq!(request.query_param("with_tag").as_deref(), Some("true"));
    assert_eq!(
        request.query_param("sort").as_deref(),
        Some("creation_time%20desc")
    );
}

#[tokio::test]
async fn test_latest_tag_requires_project_separator() {
    let stub = StubRegistry::start(|_| StubResponse::json(json!([]))).await;
    let backend = HarborBackend::new(stub.client(BackendType::Harbor), 4);

    let err = backend.latest_tag("nginx").await.unwrap_err();
    assert!(matches!(err, SyncError::InvalidPath(path) if path == "nginx"));
    assert!(stub.requests().is_empty());
}

#[tokio::test]
async fn test_latest_tag_without_tagged_artifacts_is_not_found() {
    let stub = StubRegistry::start(|req| {
        if req.path.starts_with("/api/v2.0/projects/library/repositories/empty/") {
            StubResponse::json(json!([]))
        } else {
            StubResponse::json(json!([{ "digest": "sha256:1", "tags": null }]))
        }
    })
    .await;
    let backend = HarborBackend::new(stub.client(BackendType::Harbor), 4);

    assert!(matches!(
        backend.latest_tag("library/empty").await,
        Err(SyncError::NotFound(_))
    ));
    assert!(matches!(
        backend.latest_tag("library/untagged").await,
        Err(SyncError::NotFound(_))
    ));
}

#[tokio::test]
async fn test_undecodable_listing_is_parse_error() {
    let stub = StubRegistry::start(|_| StubResponse::status(200, "<html>login</html>")).await;
    let backend = HarborBackend::new(stub.client(BackendType::Harbor), 4);

    assert!(matches!(
        backend.list_repositories("library/").await,
        Err(SyncError::Parse { .. })
    ));
}
