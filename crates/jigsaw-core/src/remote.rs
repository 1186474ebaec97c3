//! Client side of the leaderboard HTTP contract
//!
//! `GET {api}` returns the ranked list as a JSON array. `POST {api}` with a
//! submission body returns `{"success": true, "scores": [...]}`; failures
//! carry `{"error": "..."}`. The transport is pluggable so the terminal can
//! block on it while the browser drives the same codec from `fetch`.

use crate::leaderboard::{LeaderboardBackend, LeaderboardError, LeaderboardResult, ScoreRecord};
use serde::{Deserialize, Serialize};

/// A raw HTTP answer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub body: String,
}

impl HttpResponse {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Blocking request primitive
pub trait Transport: Send + Sync {
    fn get(&self, url: &str) -> LeaderboardResult<HttpResponse>;
    fn post_json(&self, url: &str, body: &str) -> LeaderboardResult<HttpResponse>;
}

/// What the client sends; the server stamps the creation time
#[derive(Debug, Serialize)]
struct Submission<'a> {
    nickname: &'a str,
    score: u32,
    difficulty: &'a str,
    time: &'a str,
    date: &'a str,
    emotion: &'a str,
}

#[derive(Debug, Deserialize)]
struct SubmitResponse {
    #[serde(default)]
    success: bool,
    #[serde(default)]
    scores: Vec<ScoreRecord>,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: String,
}

/// JSON body for a POST
pub fn encode_submission(record: &ScoreRecord) -> LeaderboardResult<String> {
    let body = Submission {
        nickname: &record.nickname,
        score: record.score,
        difficulty: &record.difficulty,
        time: &record.time,
        date: &record.date,
        emotion: &record.emotion,
    };
    serde_json::to_string(&body).map_err(|e| LeaderboardError::InvalidResponse(e.to_string()))
}

fn check_status(response: &HttpResponse) -> LeaderboardResult<()> {
    if response.is_success() {
        return Ok(());
    }
    let message = serde_json::from_str::<ErrorBody>(&response.body)
        .map(|b| b.error)
        .unwrap_or_else(|_| format!("HTTP {}", response.status));
    Err(LeaderboardError::ServerError(message))
}

/// Decode a GET answer
pub fn decode_list(response: &HttpResponse) -> LeaderboardResult<Vec<ScoreRecord>> {
    check_status(response)?;
    serde_json::from_str(&response.body)
        .map_err(|e| LeaderboardError::InvalidResponse(e.to_string()))
}

/// Decode a POST answer
pub fn decode_submit(response: &HttpResponse) -> LeaderboardResult<Vec<ScoreRecord>> {
    check_status(response)?;
    let parsed: SubmitResponse = serde_json::from_str(&response.body)
        .map_err(|e| LeaderboardError::InvalidResponse(e.to_string()))?;
    if !parsed.success {
        return Err(LeaderboardError::ServerError(
            "submission was not accepted".to_string(),
        ));
    }
    Ok(parsed.scores)
}

/// Leaderboard backed by a remote service
pub struct RemoteLeaderboard<T> {
    api_url: String,
    transport: T,
}

impl<T: Transport> RemoteLeaderboard<T> {
    pub fn new(api_url: impl Into<String>, transport: T) -> Self {
        Self {
            api_url: api_url.into(),
            transport,
        }
    }

    pub fn api_url(&self) -> &str {
        &self.api_url
    }
}

impl<T: Transport> LeaderboardBackend for RemoteLeaderboard<T> {
    fn fetch(&self) -> LeaderboardResult<Vec<ScoreRecord>> {
        let response = self.transport.get(&self.api_url)?;
        decode_list(&response)
    }

    fn submit(&self, record: ScoreRecord) -> LeaderboardResult<Vec<ScoreRecord>> {
        let body = encode_submission(&record)?;
        let response = self.transport.post_json(&self.api_url, &body)?;
        decode_submit(&response)
    }

    fn is_available(&self) -> bool {
        !self.api_url.is_empty()
    }

    fn backend_name(&self) -> &'static str {
        "Remote"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Transport that always fails to connect
    struct Offline;

    impl Transport for Offline {
        fn get(&self, _url: &str) -> LeaderboardResult<HttpResponse> {
            Err(LeaderboardError::NetworkError("connection refused".into()))
        }

        fn post_json(&self, _url: &str, _body: &str) -> LeaderboardResult<HttpResponse> {
            Err(LeaderboardError::NetworkError("connection refused".into()))
        }
    }

    #[test]
    fn test_submission_body_omits_timestamp() {
        let record = ScoreRecord {
            nickname: "ace".into(),
            score: 88,
            difficulty: "6x6".into(),
            time: "01:10".into(),
            date: "2026-10-19".into(),
            emotion: "🌟👏 Great Job!".into(),
            timestamp: 42,
        };
        let body: serde_json::Value =
            serde_json::from_str(&encode_submission(&record).unwrap()).unwrap();
        assert_eq!(body["nickname"], "ace");
        assert_eq!(body["score"], 88);
        assert!(body.get("timestamp").is_none());
    }

    #[test]
    fn test_error_body_becomes_server_error() {
        let response = HttpResponse::new(400, r#"{"error":"Invalid score data."}"#);
        assert_eq!(
            decode_submit(&response),
            Err(LeaderboardError::ServerError("Invalid score data.".into()))
        );
        let response = HttpResponse::new(502, "<html>bad gateway</html>");
        assert_eq!(
            decode_list(&response),
            Err(LeaderboardError::ServerError("HTTP 502".into()))
        );
    }

    #[test]
    fn test_garbage_is_invalid_response() {
        let response = HttpResponse::new(200, "not json");
        assert!(matches!(
            decode_list(&response),
            Err(LeaderboardError::InvalidResponse(_))
        ));
    }

    #[test]
    fn test_offline_remote() {
        let remote = RemoteLeaderboard::new("http://localhost:9/leaderboard", Offline);
        assert!(remote.is_available());
        assert!(matches!(remote.fetch(), Err(LeaderboardError::NetworkError(_))));
        assert!(!RemoteLeaderboard::new("", Offline).is_available());
    }
}
