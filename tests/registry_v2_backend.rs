mod common;

use common::{StubRegistry, StubResponse};
use registry_syncer::config::BackendType;
use registry_syncer::error::SyncError;
use registry_syncer::registry::{RegistryBackend, RegistryV2Backend};
use serde_json::json;
use std::collections::BTreeSet;

#[tokio::test]
async fn test_catalog_follows_link_until_no_next() {
    let stub = StubRegistry::start(|req| {
        if req.path != "/v2/_catalog" {
            return StubResponse::status(404, "{}");
        }
        match req.query_param("last").as_deref() {
            None => StubResponse::json(json!({ "repositories": ["apps/web", "library/alpine"] }))
                .with_link(r#"</v2/_catalog?last=library%2Falpine&n=100>; rel="next""#),
            Some("library%2Falpine") => {
                StubResponse::json(json!({ "repositories": ["library/nginx", "team/app"] }))
            }
            Some(_) => StubResponse::status(400, "unexpected cursor"),
        }
    })
    .await;

    let backend = RegistryV2Backend::new(stub.client(BackendType::RegistryV2));
    let repositories = backend.list_repositories("library").await.unwrap();

    assert_eq!(
        repositories,
        BTreeSet::from(["library/alpine".to_string(), "library/nginx".to_string()])
    );

    let requests = stub.requests_to("/v2/_catalog");
    assert_eq!(requests.len(), 2);
    assert_eq!(requests[0].query_param("n").as_deref(), Some("100"));
}

#[tokio::test]
async fn test_catalog_stops_without_next_relation() {
    let stub = StubRegistry::start(|_| {
        StubResponse::json(json!({ "repositories": ["library/nginx"] }))
            .with_link(r#"</v2/_catalog?last=a&n=100>; rel="prev""#)
    })
    .await;

    let backend = RegistryV2Backend::new(stub.client(BackendType::RegistryV2));
    let repositories = backend.list_repositories("").await.unwrap();

    assert_eq!(repositories.len(), 1);
    assert_eq!(stub.requests().len(), 1);
}

#[tokio::test]
async fn test_prefix_is_matched_with_separator() {
    let stub = StubRegistry::start(|_| {
        StubResponse::json(json!({ "repositories": ["lib/a", "library/b", "libs"] }))
    })
    .await;

    let backend = RegistryV2Backend::new(stub.client(BackendType::RegistryV2));
    let repositories = backend.list_repositories("lib/").await.unwrap();

    assert_eq!(repositories, BTreeSet::from(["lib/a".to_string()]));
}

#[tokio::test]
async fn test_catalog_error_status_is_list_error() {
    let stub = StubRegistry::start(|_| StubResponse::status(401, r#"{"errors":[{"code":"UNAUTHORIZED"}]}"#)).await;

    let backend = RegistryV2Backend::new(stub.client(BackendType::RegistryV2));
    match backend.list_repositories("").await {
        Err(SyncError::List { status, body, .. }) => {
            assert_eq!(status, 401);
            assert!(body.contains("UNAUTHORIZED"));
        }
        other => panic!("expected list error, got {:?}", other),
    }
}

#[tokio::test]
async fn test_list_tags_paginates() {
    let stub = StubRegistry::start(|req| {
        if req.path != "/v2/team/app/tags/list" {
            return StubResponse::status(404, "{}");
        }
        if req.query_param("last").is_none() {
            StubResponse::json(json!({ "name": "team/app", "tags": ["1.0", "1.1"] }))
                .with_link(r#"</v2/team/app/tags/list?last=1.1&n=100>; rel="next""#)
        } else {
            StubResponse::json(json!({ "name": "team/app", "tags": ["2.0"] }))
        }
    })
    .await;

    let backend = RegistryV2Backend::new(stub.client(BackendType::RegistryV2));
    let tags = backend.list_tags("team/app").await.unwrap();

    assert_eq!(tags, vec!["1.0", "1.1", "2.0"]);
}

#[tokio::test]
async fn test_acr_latest_tag() {
    let stub = StubRegistry::start(|req| {
        if req.path == "/acr/v1/team/app/_tags" {
            StubResponse::json(json!({
                "registry": "example.azurecr.io",
                "imageName": "team/app",
                "tagsAttributes": [{ "name": "v9", "digest": "sha256:9" }]
            }))
        } else {
            StubResponse::json(json!({ "tagsAttributes": [] }))
        }
    })
    .await;

    let backend = RegistryV2Backend::new(stub.client(BackendType::RegistryV2));
    assert_eq!(backend.latest_tag("team/app").await.unwrap(), "v9");

    let request = &stub.requests()[0];
    assert_eq!(request.query_param("orderby").as_deref(), Some("timedesc"));
    assert_eq!(request.query_param("n").as_deref(), Some("1"));

    assert!(matches!(
        backend.latest_tag("team/empty").await,
        Err(SyncError::NotFound(_))
    ));
}
