//! Server side of the leaderboard HTTP contract
//!
//! [`LeaderboardService`] is framework-agnostic: hosts translate their
//! request type into [`Request`] and write back the [`Response`]. Storage
//! goes through any [`LeaderboardBackend`], so the retention and ranking
//! policy is the same one the local store applies.

use crate::leaderboard::{LeaderboardBackend, LeaderboardResult, ScoreRecord};
use crate::remote::{HttpResponse, Transport};
use serde_json::{json, Value};

/// CORS headers sent with every response
pub const CORS_HEADERS: [(&str, &str); 3] = [
    ("Access-Control-Allow-Origin", "*"),
    ("Access-Control-Allow-Methods", "GET, POST, OPTIONS"),
    ("Access-Control-Allow-Headers", "Content-Type"),
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    pub method: String,
    pub body: Option<String>,
}

impl Request {
    pub fn new(method: impl Into<String>, body: Option<String>) -> Self {
        Self {
            method: method.into(),
            body,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    pub status: u16,
    pub headers: Vec<(&'static str, &'static str)>,
    pub body: String,
}

impl Response {
    fn new(status: u16, body: String) -> Self {
        Self {
            status,
            headers: CORS_HEADERS.to_vec(),
            body,
        }
    }

    fn json(status: u16, value: &Value) -> Self {
        Self::new(status, value.to_string())
    }

    fn error(status: u16, message: &str) -> Self {
        Self::json(status, &json!({ "error": message }))
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| *v)
    }
}

/// HTTP handler over a leaderboard backend
pub struct LeaderboardService<B> {
    backend: B,
}

impl<B: LeaderboardBackend> LeaderboardService<B> {
    pub fn new(backend: B) -> Self {
        Self { backend }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Answer one request; `now_ms` stamps new records
    pub fn handle(&self, request: &Request, now_ms: u64) -> Response {
        match request.method.to_ascii_uppercase().as_str() {
            "OPTIONS" => Response::new(204, String::new()),
            "GET" => self.list(),
            "POST" => self.submit(request.body.as_deref().unwrap_or(""), now_ms),
            other => {
                log::debug!("rejecting {} request", other);
                Response::error(405, "Method Not Allowed")
            }
        }
    }

    fn list(&self) -> Response {
        match self.backend.fetch() {
            Ok(scores) => Response::json(200, &json!(scores)),
            Err(e) => {
                log::warn!("failed to retrieve scores: {}", e);
                Response::error(500, "Failed to retrieve scores.")
            }
        }
    }

    fn submit(&self, body: &str, now_ms: u64) -> Response {
        let Some(record) = parse_submission(body, now_ms) else {
            return Response::error(400, "Invalid score data.");
        };
        match self.backend.submit(record) {
            Ok(scores) => Response::json(200, &json!({ "success": true, "scores": scores })),
            Err(e) => {
                log::warn!("failed to save score: {}", e);
                Response::error(500, "Failed to save score.")
            }
        }
    }
}

/// Accepts any object whose `nickname` is a string and `score` a number
fn parse_submission(body: &str, now_ms: u64) -> Option<ScoreRecord> {
    let value: Value = serde_json::from_str(body).ok()?;
    let nickname = value.get("nickname")?.as_str()?.to_string();
    let score = value.get("score")?.as_f64()?;
    let text = |key: &str| {
        value
            .get(key)
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string()
    };
    Some(ScoreRecord {
        nickname,
        score: score.max(0.0).round().min(u32::MAX as f64) as u32,
        difficulty: text("difficulty"),
        time: text("time"),
        date: text("date"),
        emotion: text("emotion"),
        timestamp: now_ms,
    })
}

/// Routes client calls straight into a service, for tests and single-process setups
pub struct InProcessTransport<B> {
    service: LeaderboardService<B>,
    clock: Box<dyn Fn() -> u64 + Send + Sync>,
}

impl<B: LeaderboardBackend> InProcessTransport<B> {
    pub fn new(
        service: LeaderboardService<B>,
        clock: impl Fn() -> u64 + Send + Sync + 'static,
    ) -> Self {
        Self {
            service,
            clock: Box::new(clock),
        }
    }

    pub fn service(&self) -> &LeaderboardService<B> {
        &self.service
    }

    fn call(&self, method: &str, body: Option<&str>) -> HttpResponse {
        let request = Request::new(method, body.map(str::to_string));
        let response = self.service.handle(&request, (self.clock)());
        HttpResponse::new(response.status, response.body)
    }
}

impl<B: LeaderboardBackend> Transport for InProcessTransport<B> {
    fn get(&self, _url: &str) -> LeaderboardResult<HttpResponse> {
        Ok(self.call("GET", None))
    }

    fn post_json(
        &self,
        _url: &str,
        body: &str,
    ) -> LeaderboardResult<HttpResponse> {
        Ok(self.call("POST", Some(body)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::leaderboard::{LeaderboardManager, MemoryStore, MockLeaderboard};
    use crate::remote::RemoteLeaderboard;
    use std::sync::atomic::{AtomicU64, Ordering};
    use std::sync::Arc;

    fn service() -> LeaderboardService<MockLeaderboard> {
        LeaderboardService::new(MockLeaderboard::new(MemoryStore::new()))
    }

    fn post(service: &LeaderboardService<MockLeaderboard>, body: &str) -> Response {
        service.handle(&Request::new("POST", Some(body.to_string())), 1000)
    }

    #[test]
    fn test_preflight() {
        let response = service().handle(&Request::new("OPTIONS", None), 0);
        assert_eq!(response.status, 204);
        assert!(response.body.is_empty());
        assert_eq!(response.header("access-control-allow-origin"), Some("*"));
        assert_eq!(
            response.header("Access-Control-Allow-Methods"),
            Some("GET, POST, OPTIONS")
        );
    }

    #[test]
    fn test_post_validation() {
        let service = service();
        for body in [
            r#"{"nickname": 5, "score": 10}"#,
            r#"{"nickname": "ace", "score": "10"}"#,
            r#"{"score": 10}"#,
            "null",
            "garbage",
        ] {
            let response = post(&service, body);
            assert_eq!(response.status, 400, "{}", body);
            assert_eq!(response.body, r#"{"error":"Invalid score data."}"#);
            assert_eq!(response.header("Access-Control-Allow-Origin"), Some("*"));
        }
        assert_eq!(service.backend().store().count(), 0);
    }

    #[test]
    fn test_post_then_get_ranked() {
        let service = service();
        post(&service, r#"{"nickname": "low", "score": 12}"#);
        let response = post(
            &service,
            r#"{"nickname": "high", "score": 90, "difficulty": "4x4", "time": "00:40"}"#,
        );
        assert_eq!(response.status, 200);
        let body: Value = serde_json::from_str(&response.body).unwrap();
        assert_eq!(body["success"], true);
        assert_eq!(body["scores"][0]["nickname"], "high");
        assert_eq!(body["scores"][0]["timestamp"], 1000);

        let listed = service.handle(&Request::new("get", None), 0);
        assert_eq!(listed.status, 200);
        let scores: Vec<ScoreRecord> = serde_json::from_str(&listed.body).unwrap();
        let names: Vec<_> = scores.iter().map(|s| s.nickname.as_str()).collect();
        assert_eq!(names, ["high", "low"]);
    }

    #[test]
    fn test_other_methods_and_store_failure() {
        let service = service();
        assert_eq!(service.handle(&Request::new("DELETE", None), 0).status, 405);

        service.backend().store().set_available(false);
        assert_eq!(service.handle(&Request::new("GET", None), 0).status, 500);
        assert_eq!(post(&service, r#"{"nickname": "a", "score": 1}"#).status, 500);
    }

    #[test]
    fn test_remote_client_against_service() {
        let clock = Arc::new(AtomicU64::new(0));
        let tick = Arc::clone(&clock);
        let transport =
            InProcessTransport::new(service(), move || tick.fetch_add(1, Ordering::SeqCst) + 1);
        let remote = RemoteLeaderboard::new("/.netlify/functions/leaderboard", transport);
        let manager = LeaderboardManager::new(Box::new(remote));

        for (i, score) in [30u32, 80, 55].into_iter().enumerate() {
            let record = ScoreRecord {
                nickname: format!("p{}", i),
                score,
                difficulty: "4x4".into(),
                time: "00:30".into(),
                date: "2026-10-19".into(),
                emotion: String::new(),
                timestamp: 0,
            };
            manager.submit(record).unwrap();
        }
        let view = manager.list().unwrap();
        let scores: Vec<_> = view.entries().iter().map(|e| (e.rank, e.record.score)).collect();
        assert_eq!(scores, [(1, 80), (2, 55), (3, 30)]);
        assert_eq!(clock.load(Ordering::SeqCst), 4);
    }
}
