//! # In-Memory JSON:API Server
//!
//! [`MemoryServer`] is the *server* half: it owns the resource store and
//! answers requests one at a time in its own Tokio task, so the store needs no
//! locking. [`ServerHandle`] is the *client* half: it implements
//! [`Transport`], forwarding each request over a channel and waiting for the
//! answer.
//!
//! ## Routes
//!
//! | Method | Path | Answer |
//! |--------|------|--------|
//! | GET | `type` | 200, every resource of the type plus related resources in `included` |
//! | GET | `type/id` | 200 with `included`, or 404 |
//! | POST | `type` | 201 with a generated id, or 204 when the client sent an id |
//! | PATCH / PUT | `type/id` | 200, attributes and relationships merged into the stored resource |
//! | DELETE | `type/id` | 204, or 404 |

use async_trait::async_trait;
use indexmap::IndexMap;
use jsonapi_orm::transport::{ApiRequest, Method, RawResponse, Transport};
use jsonapi_orm::TransportError;
use serde_json::{json, Map, Value};
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, info, warn};

/// Failures a request can run into, each mapping to an HTTP status.
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    #[error("Bad request: {0}")]
    BadRequest(String),
    #[error("{0} does not exist")]
    NotFound(String),
    #[error("Method not allowed: {0}")]
    MethodNotAllowed(String),
    #[error("Conflict: {0}")]
    Conflict(String),
}

impl ServerError {
    pub fn status(&self) -> u16 {
        match self {
            ServerError::BadRequest(_) => 400,
            ServerError::NotFound(_) => 404,
            ServerError::MethodNotAllowed(_) => 405,
            ServerError::Conflict(_) => 409,
        }
    }

    fn into_response(self) -> RawResponse {
        let status = self.status();
        RawResponse::new(
            status,
            json!({"errors": [{"status": status.to_string(), "detail": self.to_string()}]}),
        )
    }
}

type Resource = Map<String, Value>;

struct Envelope {
    request: ApiRequest,
    respond_to: oneshot::Sender<RawResponse>,
}

/// Resource store answering JSON:API requests.
pub struct MemoryServer {
    receiver: mpsc::Receiver<Envelope>,
    store: IndexMap<String, IndexMap<String, Resource>>,
    next_id: u32,
}

impl MemoryServer {
    /// Creates the server and the handle used to reach it.
    ///
    /// The server does nothing until [`run`](Self::run) is spawned.
    pub fn new(buffer_size: usize) -> (Self, ServerHandle) {
        let (sender, receiver) = mpsc::channel(buffer_size);
        let server = Self {
            receiver,
            store: IndexMap::new(),
            next_id: 1,
        };
        (server, ServerHandle { sender })
    }

    /// Stores a resource as-is. It must carry a string `type` and `id`.
    pub fn seed(&mut self, resource: Value) -> Result<(), ServerError> {
        let Value::Object(resource) = resource else {
            return Err(ServerError::BadRequest("resource must be an object".into()));
        };
        let (kind, id) = match (str_member(&resource, "type"), str_member(&resource, "id")) {
            (Some(kind), Some(id)) => (kind.to_owned(), id.to_owned()),
            _ => return Err(ServerError::BadRequest("resource needs a type and an id".into())),
        };
        self.store.entry(kind).or_default().insert(id, resource);
        Ok(())
    }

    /// Number of stored resources of `kind`.
    pub fn len(&self, kind: &str) -> usize {
        self.store.get(kind).map_or(0, IndexMap::len)
    }

    /// Processes requests until every [`ServerHandle`] is dropped.
    pub async fn run(mut self) {
        info!(types = self.store.len(), "Server started");
        while let Some(Envelope {
            request,
            respond_to,
        }) = self.receiver.recv().await
        {
            let response = self.handle(request);
            let _ = respond_to.send(response);
        }
        let size: usize = self.store.values().map(IndexMap::len).sum();
        info!(size, "Server shutting down");
    }

    /// Answers one request.
    pub fn handle(&mut self, request: ApiRequest) -> RawResponse {
        let method = request.method;
        let path = request.path.trim_matches('/').to_owned();
        debug!(%method, %path, "Handling request");

        let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
        let result = match (method, segments.as_slice()) {
            (Method::Get, [kind]) => self.list(kind),
            (Method::Get, [kind, id]) => self.fetch(kind, id),
            (Method::Post, [kind]) => self.create(kind, request.body),
            (Method::Patch | Method::Put, [kind, id]) => self.update(kind, id, request.body),
            (Method::Delete, [kind, id]) => self.delete(kind, id),
            _ => Err(ServerError::MethodNotAllowed(format!("{method} {path}"))),
        };

        result.unwrap_or_else(|e| {
            warn!(%method, %path, error = %e, "Request rejected");
            e.into_response()
        })
    }

    fn list(&self, kind: &str) -> Result<RawResponse, ServerError> {
        let data: Vec<&Resource> = self
            .store
            .get(kind)
            .map(|resources| resources.values().collect())
            .unwrap_or_default();
        let included = self.related(&data);
        Ok(RawResponse::new(
            200,
            json!({"data": data, "included": included}),
        ))
    }

    fn fetch(&self, kind: &str, id: &str) -> Result<RawResponse, ServerError> {
        let resource = self.get(kind, id)?;
        let included = self.related(&[resource]);
        Ok(RawResponse::new(
            200,
            json!({"data": resource, "included": included}),
        ))
    }

    fn create(&mut self, kind: &str, body: Option<Value>) -> Result<RawResponse, ServerError> {
        let mut resource = primary_data(body)?;
        check_type(kind, &resource)?;

        if let Some(id) = str_member(&resource, "id").map(str::to_owned) {
            if self.get(kind, &id).is_ok() {
                return Err(ServerError::Conflict(format!("{kind}/{id} already exists")));
            }
            self.store.entry(kind.to_owned()).or_default().insert(id.clone(), resource);
            info!(kind, %id, "Created resource with client id");
            return Ok(RawResponse::empty(204));
        }

        let id = self.allocate_id(kind);
        resource.insert("id".into(), Value::String(id.clone()));
        self.store
            .entry(kind.to_owned())
            .or_default()
            .insert(id.clone(), resource.clone());
        info!(kind, %id, "Created resource");
        Ok(RawResponse::new(201, json!({"data": resource})))
    }

    fn update(
        &mut self,
        kind: &str,
        id: &str,
        body: Option<Value>,
    ) -> Result<RawResponse, ServerError> {
        let patch = primary_data(body)?;
        check_type(kind, &patch)?;
        if let Some(sent) = str_member(&patch, "id") {
            if sent != id {
                return Err(ServerError::Conflict(format!("id {sent} does not match {id}")));
            }
        }

        let stored = self
            .store
            .get_mut(kind)
            .and_then(|resources| resources.get_mut(id))
            .ok_or_else(|| ServerError::NotFound(format!("{kind}/{id}")))?;
        for member in ["attributes", "relationships"] {
            let Some(Value::Object(changes)) = patch.get(member) else {
                continue;
            };
            let target = stored
                .entry(member)
                .or_insert_with(|| Value::Object(Map::new()));
            if let Value::Object(target) = target {
                for (key, value) in changes {
                    target.insert(key.clone(), value.clone());
                }
            }
        }
        info!(kind, id, "Updated resource");
        Ok(RawResponse::new(200, json!({"data": stored})))
    }

    fn delete(&mut self, kind: &str, id: &str) -> Result<RawResponse, ServerError> {
        self.store
            .get_mut(kind)
            .and_then(|resources| resources.shift_remove(id))
            .ok_or_else(|| ServerError::NotFound(format!("{kind}/{id}")))?;
        info!(kind, id, "Deleted resource");
        Ok(RawResponse::empty(204))
    }

    fn get(&self, kind: &str, id: &str) -> Result<&Resource, ServerError> {
        self.store
            .get(kind)
            .and_then(|resources| resources.get(id))
            .ok_or_else(|| ServerError::NotFound(format!("{kind}/{id}")))
    }

    fn allocate_id(&mut self, kind: &str) -> String {
        loop {
            let id = self.next_id.to_string();
            self.next_id += 1;
            if self.get(kind, &id).is_err() {
                return id;
            }
        }
    }

    /// Stored targets of the relationships of `resources`, excluding `resources`
    /// themselves, each listed once.
    fn related(&self, resources: &[&Resource]) -> Vec<&Resource> {
        let primary: Vec<(&str, &str)> = resources.iter().filter_map(|r| key_of(r)).collect();
        let mut seen: Vec<(&str, &str)> = Vec::new();
        let mut included = Vec::new();
        for resource in resources {
            for identifier in linkage(resource) {
                let Some(key) = key_of(identifier) else {
                    continue;
                };
                if primary.contains(&key) || seen.contains(&key) {
                    continue;
                }
                seen.push(key);
                if let Ok(target) = self.get(key.0, key.1) {
                    included.push(target);
                }
            }
        }
        included
    }
}

/// Client half of the server; cheap to clone.
#[derive(Clone)]
pub struct ServerHandle {
    sender: mpsc::Sender<Envelope>,
}

#[async_trait]
impl Transport for ServerHandle {
    async fn request(&self, request: ApiRequest) -> Result<RawResponse, TransportError> {
        let (respond_to, response) = oneshot::channel();
        self.sender
            .send(Envelope {
                request,
                respond_to,
            })
            .await
            .map_err(|_| TransportError::Connection("server closed".into()))?;
        response
            .await
            .map_err(|_| TransportError::Connection("server dropped the request".into()))
    }
}

fn primary_data(body: Option<Value>) -> Result<Resource, ServerError> {
    match body {
        Some(Value::Object(mut document)) => match document.remove("data") {
            Some(Value::Object(resource)) => Ok(resource),
            _ => Err(ServerError::BadRequest("data must be a resource object".into())),
        },
        _ => Err(ServerError::BadRequest("missing document".into())),
    }
}

fn check_type(kind: &str, resource: &Resource) -> Result<(), ServerError> {
    match str_member(resource, "type") {
        Some(sent) if sent == kind => Ok(()),
        Some(sent) => Err(ServerError::Conflict(format!("type {sent} does not match {kind}"))),
        None => Err(ServerError::BadRequest("resource has no type".into())),
    }
}

fn str_member<'a>(object: &'a Map<String, Value>, member: &str) -> Option<&'a str> {
    object.get(member).and_then(Value::as_str)
}

fn key_of(object: &Map<String, Value>) -> Option<(&str, &str)> {
    Some((str_member(object, "type")?, str_member(object, "id")?))
}

/// Identifier objects in every relationship's `data`.
fn linkage(resource: &Resource) -> Vec<&Map<String, Value>> {
    let Some(Value::Object(relationships)) = resource.get("relationships") else {
        return Vec::new();
    };
    relationships
        .values()
        .filter_map(|relationship| relationship.get("data"))
        .flat_map(|data| match data {
            Value::Array(items) => items.iter().filter_map(Value::as_object).collect(),
            Value::Object(identifier) => vec![identifier],
            _ => Vec::new(),
        })
        .collect()
}
