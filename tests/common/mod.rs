#![allow(dead_code)]

use axum::Router;
use axum::http::{HeaderMap, HeaderValue, StatusCode, Uri, header};
use axum::response::{IntoResponse, Response};
use registry_syncer::config::{AuthConfig, BackendType, RegistryEndpoint};
use registry_syncer::logging::Logger;
use registry_syncer::registry::RegistryClient;
use std::sync::{Arc, Mutex};

/// base64("admin:secret")
pub const BASIC_AUTH: &str = "Basic YWRtaW46c2VjcmV0";

#[derive(Debug, Clone)]
pub struct RecordedRequest {
    /// Raw, still percent-encoded path
    pub path: String,
    pub query: Option<String>,
    pub authorization: Option<String>,
    pub accept: Option<String>,
}

impl RecordedRequest {
    pub fn query_param(&self, name: &str) -> Option<String> {
        self.query.as_deref()?.split('&').find_map(|pair| {
            let (key, value) = pair.split_once('=')?;
            (key == name).then(|| value.to_string())
        })
    }
}

pub struct StubResponse {
    status: u16,
    body: String,
    link: Option<String>,
}

impl StubResponse {
    pub fn json(body: serde_json::Value) -> Self {
        Self {
            status: 200,
            body: body.to_string(),
            link: None,
        }
    }

    pub fn status(status: u16, body: &str) -> Self {
        Self {
            status,
            body: body.to_string(),
            link: None,
        }
    }

    pub fn with_link(mut self, link: &str) -> Self {
        self.link = Some(link.to_string());
        self
    }
}

type Handler = Arc<dyn Fn(&RecordedRequest) -> StubResponse + Send + Sync>;

/// Minimal HTTP registry answering every request through one closure
pub struct StubRegistry {
    pub base_url: String,
    requests: Arc<Mutex<Vec<RecordedRequest>>>,
}

impl StubRegistry {
    pub async fn start<F>(handler: F) -> Self
    where
        F: Fn(&RecordedRequest) -> StubResponse + Send + Sync + 'static,
    {
        let handler: Handler = Arc::new(handler);
        let requests = Arc::new(Mutex::new(Vec::new()));
        let recorded = Arc::clone(&requests);

        let app = Router::new().fallback(move |uri: Uri, headers: HeaderMap| {
            let handler = Arc::clone(&handler);
            let recorded = Arc::clone(&recorded);
            async move { respond(handler, recorded, uri, headers) }
        });

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            base_url: format!("http://{}", addr),
            requests,
        }
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn requests_to(&self, path: &str) -> Vec<RecordedRequest> {
        self.requests()
            .into_iter()
            .filter(|r| r.path == path)
            .collect()
    }

    pub fn endpoint(&self, backend: BackendType) -> RegistryEndpoint {
        RegistryEndpoint::new(
            &self.base_url,
            AuthConfig::new("admin".to_string(), "secret".to_string()),
            backend,
        )
    }

    pub fn client(&self, backend: BackendType) -> Arc<RegistryClient> {
        Arc::new(RegistryClient::new(self.endpoint(backend), Logger::new_quiet()).unwrap())
    }
}

fn respond(
    handler: Handler,
    recorded: Arc<Mutex<Vec<RecordedRequest>>>,
    uri: Uri,
    headers: HeaderMap,
) -> Response {
    let header_value = |name: header::HeaderName| {
        headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
    };

    let request = RecordedRequest {
        path: uri.path().to_string(),
        query: uri.query().map(str::to_string),
        authorization: header_value(header::AUTHORIZATION),
        accept: header_value(header::ACCEPT),
    };
    recorded.lock().unwrap().push(request.clone());

    let stub = handler(&request);
    let status = StatusCode::from_u16(stub.status).unwrap();
    let mut response = (status, stub.body).into_response();
    response.headers_mut().insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static("application/json"),
    );
    if let Some(link) = stub.link {
        response
            .headers_mut()
            .insert(header::LINK, HeaderValue::from_str(&link).unwrap());
    }
    response
}
