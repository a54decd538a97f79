//! In-memory stand-in for the remote user API

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use serde_json::{Value, json};
use tokio::time::Instant;

use usermanager::{Method, RawResponse, RequestDescription, Transport, TransportError, User};

#[derive(Default)]
pub struct FakeApi {
    users: Mutex<HashMap<String, User>>,
    failing_creates: Mutex<HashSet<String>>,
    calls: AtomicUsize,
    call_times: Mutex<Vec<Instant>>,
}

impl FakeApi {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make POST /users fail for this user id
    pub fn fail_create(&self, user_id: &str) {
        self.failing_creates.lock().unwrap().insert(user_id.to_string());
    }

    pub fn seed(&self, user: User) {
        self.users.lock().unwrap().insert(user.user_id.clone(), user);
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn call_times(&self) -> Vec<Instant> {
        self.call_times.lock().unwrap().clone()
    }

    fn error(status: u16, code: u32, message: &str) -> RawResponse {
        let body = json!({ "error": true, "code": code, "message": message });
        RawResponse::new(status, body.to_string())
    }

    fn ok(value: impl serde::Serialize) -> RawResponse {
        RawResponse::new(200, serde_json::to_vec(&value).unwrap())
    }

    fn body(request: &RequestDescription) -> Value {
        request
            .body
            .as_deref()
            .map(|b| serde_json::from_slice(b).unwrap())
            .unwrap_or(Value::Null)
    }

    fn create(&self, request: &RequestDescription) -> RawResponse {
        let body = Self::body(request);
        let user_id = body["user_id"].as_str().unwrap_or_default().to_string();

        if self.failing_creates.lock().unwrap().contains(&user_id) {
            return Self::error(500, 500901, "internal error");
        }

        let mut users = self.users.lock().unwrap();
        if users.contains_key(&user_id) {
            return Self::error(400, 400202, "\"user_id\" violates a unique constraint.");
        }

        let user = User {
            user_id: user_id.clone(),
            nickname: body["nickname"].as_str().map(str::to_string),
            profile_url: body["profile_url"].as_str().map(str::to_string),
        };
        users.insert(user_id, user.clone());
        Self::ok(user)
    }

    fn update(&self, user_id: &str, request: &RequestDescription) -> RawResponse {
        let body = Self::body(request);
        let mut users = self.users.lock().unwrap();
        match users.get_mut(user_id) {
            Some(user) => {
                if let Some(nickname) = body["nickname"].as_str() {
                    user.nickname = Some(nickname.to_string());
                }
                if let Some(url) = body["profile_url"].as_str() {
                    user.profile_url = Some(url.to_string());
                }
                Self::ok(user.clone())
            }
            None => Self::error(400, 400201, "User not found."),
        }
    }

    fn get(&self, user_id: &str) -> RawResponse {
        match self.users.lock().unwrap().get(user_id) {
            Some(user) => Self::ok(user.clone()),
            None => Self::error(400, 400201, "User not found."),
        }
    }

    fn list(&self, request: &RequestDescription) -> RawResponse {
        let query: HashMap<String, String> = request.url.query_pairs().into_owned().collect();
        let nickname = query.get("nickname").cloned().unwrap_or_default();
        let limit: usize = query.get("limit").and_then(|l| l.parse().ok()).unwrap_or(10);

        let mut matching: Vec<User> = self
            .users
            .lock()
            .unwrap()
            .values()
            .filter(|u| u.nickname.as_deref() == Some(nickname.as_str()))
            .cloned()
            .collect();
        matching.sort_by(|a, b| a.user_id.cmp(&b.user_id));
        matching.truncate(limit);

        Self::ok(json!({ "users": matching, "next": "" }))
    }
}

#[async_trait]
impl Transport for FakeApi {
    async fn execute(&self, request: RequestDescription) -> Result<RawResponse, TransportError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.call_times.lock().unwrap().push(Instant::now());

        let segments: Vec<String> = request
            .url
            .path_segments()
            .map(|s| s.map(str::to_string).collect())
            .unwrap_or_default();
        let segments: Vec<&str> = segments.iter().map(String::as_str).collect();

        let response = match (request.method, segments.as_slice()) {
            (Method::Post, ["v3", "users"]) => self.create(&request),
            (Method::Get, ["v3", "users"]) => self.list(&request),
            (Method::Put, ["v3", "users", id]) => self.update(id, &request),
            (Method::Get, ["v3", "users", id]) => self.get(id),
            _ => return Err(TransportError::InvalidRequest(format!("unexpected {}", request.url))),
        };
        Ok(response)
    }
}
