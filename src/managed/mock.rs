//! In-memory stand-in for the Kubernetes API server.
//!
//! GETs and merge patches answer with the stored object at the request path
//! (`/status` stripped), other writes echo their body back, and everything
//! else is a 404.

use http::{header, Method, Request, Response, StatusCode};
use hyper::Body;
use kube::Client;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tower_test::mock;

#[derive(Clone, Debug)]
pub struct Recorded {
    pub method: Method,
    pub path: String,
    pub content_type: Option<String>,
    pub body: Value,
}

#[derive(Clone, Default)]
pub struct ApiServer {
    objects: Arc<Mutex<HashMap<String, Value>>>,
    requests: Arc<Mutex<Vec<Recorded>>>,
}

impl ApiServer {
    pub fn with_object(self, path: &str, object: Value) -> Self {
        self.objects.lock().unwrap().insert(path.to_string(), object);
        self
    }

    /// A client whose requests are served by this server on a background task.
    pub fn client(&self) -> Client {
        let (service, mut handle) = mock::pair::<Request<Body>, Response<Body>>();
        let server = self.clone();
        tokio::spawn(async move {
            while let Some((request, send)) = handle.next_request().await {
                send.send_response(server.respond(request).await);
            }
        });
        Client::new(service, "default")
    }

    pub fn requests(&self, method: Method, path: &str) -> Vec<Recorded> {
        self.requests
            .lock()
            .unwrap()
            .iter()
            .filter(|r| r.method == method && r.path == path)
            .cloned()
            .collect()
    }

    async fn respond(&self, request: Request<Body>) -> Response<Body> {
        let (parts, body) = request.into_parts();
        let bytes = hyper::body::to_bytes(body).await.unwrap();
        let body: Value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        let path = parts.uri.path().to_string();
        let content_type = parts
            .headers
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(String::from);

        let stored = self
            .objects
            .lock()
            .unwrap()
            .get(path.trim_end_matches("/status"))
            .cloned();
        let merge = content_type.as_deref() == Some("application/merge-patch+json");
        let reply = match parts.method {
            Method::GET => stored,
            Method::PATCH if merge => stored,
            _ => Some(body.clone()),
        };

        self.requests.lock().unwrap().push(Recorded {
            method: parts.method,
            path,
            content_type,
            body,
        });

        match reply {
            Some(object) => Response::builder()
                .body(Body::from(serde_json::to_vec(&object).unwrap()))
                .unwrap(),
            None => Response::builder()
                .status(StatusCode::NOT_FOUND)
                .body(Body::from(
                    serde_json::to_vec(&json!({
                        "kind": "Status",
                        "apiVersion": "v1",
                        "status": "Failure",
                        "message": "not found",
                        "reason": "NotFound",
                        "code": 404,
                    }))
                    .unwrap(),
                ))
                .unwrap(),
        }
    }
}
