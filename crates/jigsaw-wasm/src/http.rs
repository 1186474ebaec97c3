//! Remote leaderboard over the browser `fetch` API

use jigsaw_core::remote::{decode_list, decode_submit, encode_submission, HttpResponse};
use jigsaw_core::{LeaderboardError, LeaderboardResult, ScoreRecord};
use wasm_bindgen::{JsCast, JsValue};
use wasm_bindgen_futures::JsFuture;
use web_sys::{Headers, Request, RequestInit, RequestMode, Response};

fn network_error(e: JsValue) -> LeaderboardError {
    LeaderboardError::NetworkError(e.as_string().unwrap_or_else(|| format!("{:?}", e)))
}

async fn send(url: &str, method: &str, body: Option<&str>) -> Result<HttpResponse, JsValue> {
    let headers = Headers::new()?;
    let opts = RequestInit::new();
    opts.set_method(method);
    opts.set_mode(RequestMode::Cors);
    if let Some(body) = body {
        headers.append("Content-Type", "application/json")?;
        opts.set_body(&JsValue::from_str(body));
    }
    opts.set_headers(&headers);

    let request = Request::new_with_str_and_init(url, &opts)?;
    let window = web_sys::window().ok_or_else(|| JsValue::from_str("No window available"))?;
    let response: Response = JsFuture::from(window.fetch_with_request(&request))
        .await?
        .dyn_into()?;
    let text = JsFuture::from(response.text()?).await?;

    Ok(HttpResponse::new(
        response.status(),
        text.as_string().unwrap_or_default(),
    ))
}

/// `GET` the ranked list
pub async fn fetch_scores(url: &str) -> LeaderboardResult<Vec<ScoreRecord>> {
    log::debug!("GET {}", url);
    let response = send(url, "GET", None).await.map_err(network_error)?;
    decode_list(&response)
}

/// `POST` a record and return the updated ranked list
pub async fn submit_score(url: &str, record: &ScoreRecord) -> LeaderboardResult<Vec<ScoreRecord>> {
    let body = encode_submission(record)?;
    log::debug!("POST {}", url);
    let response = send(url, "POST", Some(&body))
        .await
        .map_err(network_error)?;
    decode_submit(&response)
}
