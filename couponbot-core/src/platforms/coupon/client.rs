use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, ACCEPT_LANGUAGE, CACHE_CONTROL, PRAGMA, REFERER};
use reqwest::Client;
use serde_json::Value;
use tracing::{debug, warn};

use couponbot_common::models::{json_text, RewardItem, RewardResponse};
use couponbot_common::traits::api::RewardClient;

use crate::config::BotConfig;
use crate::Error;

/// Result code the endpoint uses for a successful redemption.
pub const SUCCESS_RESULT_CODE: &str = "0000";
pub const LANGUAGE_TAG: &str = "EN_US";

const USER_AGENT: &str = "Mozilla/5.0 (Linux; Android 6.0; Nexus 5 Build/MRA58N) \
    AppleWebKit/537.36 (KHTML, like Gecko) Chrome/141.0.0.0 Mobile Safari/537.36";

/// Talks to the publisher's web coupon page API on behalf of registered players.
pub struct CouponApiClient {
    pub api_base: String,
    pub game_code: String,
    pub http_client: Client,
}

impl CouponApiClient {
    pub fn new(api_base: &str, game_code: &str, timeout: Duration) -> Result<Self, Error> {
        let api_base = api_base.trim_end_matches('/').to_string();
        let referer = format!("{api_base}/{game_code}");

        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json, text/plain, */*"));
        headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static("en-US,en;q=0.9"));
        headers.insert(CACHE_CONTROL, HeaderValue::from_static("no-cache, no-store"));
        headers.insert("dnt", HeaderValue::from_static("1"));
        headers.insert(PRAGMA, HeaderValue::from_static("no-cache"));
        headers.insert(
            REFERER,
            HeaderValue::from_str(&referer)
                .map_err(|e| Error::Config(format!("invalid referer '{referer}': {e}")))?,
        );
        headers.insert("sec-fetch-dest", HeaderValue::from_static("empty"));
        headers.insert("sec-fetch-mode", HeaderValue::from_static("cors"));
        headers.insert("sec-fetch-site", HeaderValue::from_static("same-origin"));

        let client = reqwest::ClientBuilder::new()
            .user_agent(USER_AGENT)
            .default_headers(headers)
            .timeout(timeout)
            .build()
            .map_err(|e| Error::Platform(format!("Failed to build reqwest client: {e}")))?;

        Ok(Self {
            api_base,
            game_code: game_code.to_string(),
            http_client: client,
        })
    }

    pub fn from_config(config: &BotConfig) -> Result<Self, Error> {
        Self::new(&config.api_base, &config.game_code, config.request_timeout)
    }

    fn reward_url(&self) -> String {
        format!("{}/api/coupon/reward", self.api_base)
    }
}

#[async_trait]
impl RewardClient for CouponApiClient {
    async fn redeem(&self, account_id: &str, code: &str) -> Result<RewardResponse, Error> {
        let resp = self
            .http_client
            .get(self.reward_url())
            .query(&[
                ("gameCode", self.game_code.as_str()),
                ("couponCode", code),
                ("langCd", LANGUAGE_TAG),
                ("pid", account_id),
            ])
            .send()
            .await
            .map_err(|e| Error::RewardRequest(e.to_string()))?;

        let status = resp.status();
        let body = resp
            .text()
            .await
            .map_err(|e| Error::RewardRequest(e.to_string()))?;
        debug!("coupon endpoint => HTTP {status} for pid={account_id} code={code}");

        interpret_reward_response(status.is_success(), &body)
    }
}

/// Maps an endpoint reply onto a [`RewardResponse`].
///
/// Success needs both an HTTP 2xx and a `resultCode` of `"0000"`. Any other
/// JSON reply is an ordinary failed redemption, whatever its shape. Only a
/// body that is not JSON at all is a transport failure.
pub fn interpret_reward_response(http_ok: bool, body: &str) -> Result<RewardResponse, Error> {
    let data: Value = serde_json::from_str(body)
        .map_err(|e| Error::RewardRequest(format!("unexpected response body: {e}")))?;

    let result_code = field_text(&data, "resultCode");
    let result_msg = field_text(&data, "resultMsg");

    if http_ok && result_code.as_deref() == Some(SUCCESS_RESULT_CODE) {
        Ok(RewardResponse::success(
            result_msg.unwrap_or_else(|| "Coupon redeemed successfully".to_string()),
            reward_lines(&data),
        ))
    } else {
        let fallback = format!("Error code: {}", result_code.as_deref().unwrap_or("unknown"));
        Ok(RewardResponse::failure(result_msg.unwrap_or(fallback)))
    }
}

/// Non-blank text of a top-level field, whatever its JSON type.
fn field_text(data: &Value, key: &str) -> Option<String> {
    data.get(key)
        .map(json_text)
        .filter(|s| !s.trim().is_empty())
}

/// Reward lines that look like objects. Anything else in the list is skipped.
fn reward_lines(data: &Value) -> Option<Vec<RewardItem>> {
    let list = data.get("rewardList")?.as_array()?;
    let items = list
        .iter()
        .filter_map(|line| match serde_json::from_value::<RewardItem>(line.clone()) {
            Ok(item) => Some(item),
            Err(e) => {
                warn!("skipping reward line {line}: {e}");
                None
            }
        })
        .collect();
    Some(items)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn success_code_with_http_ok_is_success() {
        let body = r#"{"resultCode":"0000","resultMsg":"Reward sent to mailbox","rewardList":[{"itemName":"Diamond","itemCnt":50}]}"#;
        let resp = interpret_reward_response(true, body).unwrap();
        assert!(resp.succeeded);
        assert_eq!(resp.message, "Reward sent to mailbox");
        assert_eq!(
            resp.reward_items,
            Some(vec![RewardItem::new("Diamond", "50")])
        );
    }

    #[test]
    fn success_without_message_uses_default_text() {
        let resp = interpret_reward_response(true, r#"{"resultCode":"0000"}"#).unwrap();
        assert!(resp.succeeded);
        assert_eq!(resp.message, "Coupon redeemed successfully");
        assert!(resp.reward_items.is_none());
    }

    #[test]
    fn remote_failure_is_not_an_error() {
        let body = r#"{"resultCode":"24004","resultMsg":"Already redeemed","rewardList":[{"itemName":"X","itemCnt":1}]}"#;
        let resp = interpret_reward_response(true, body).unwrap();
        assert!(!resp.succeeded);
        assert_eq!(resp.message, "Already redeemed");
        assert!(resp.reward_items.is_none(), "failed outcomes never carry rewards");
    }

    #[test]
    fn remote_failure_without_message_reports_code() {
        let resp = interpret_reward_response(true, r#"{"resultCode":"99"}"#).unwrap();
        assert_eq!(resp.message, "Error code: 99");

        let resp = interpret_reward_response(true, r#"{}"#).unwrap();
        assert_eq!(resp.message, "Error code: unknown");
    }

    #[test]
    fn success_code_on_http_error_is_failure() {
        let resp = interpret_reward_response(false, r#"{"resultCode":"0000","resultMsg":"ok"}"#).unwrap();
        assert!(!resp.succeeded);
        assert_eq!(resp.message, "ok");
    }

    #[test]
    fn non_json_body_is_a_transport_error() {
        let err = interpret_reward_response(false, "<html>502 Bad Gateway</html>").unwrap_err();
        assert!(matches!(err, Error::RewardRequest(_)));
        assert!(err.to_string().starts_with("Request failed:"));
    }

    #[test]
    fn client_builds_with_trimmed_base() {
        let client = CouponApiClient::new("https://coupon.example.com/", "tskgb", Duration::from_secs(5)).unwrap();
        assert_eq!(client.reward_url(), "https://coupon.example.com/api/coupon/reward");
    }

    #[test]
    fn odd_reward_lines_do_not_turn_success_into_an_error() {
        let body = r#"{"resultCode":"0000","resultMsg":"Reward sent","rewardList":[
            {"itemName":"Diamond","itemCnt":1.0},
            {"itemName":"Box","itemCnt":"1 set"},
            {"itemCnt":3},
            "not a line"
        ]}"#;
        let resp = interpret_reward_response(true, body).unwrap();
        assert!(resp.succeeded);
        assert_eq!(resp.message, "Reward sent");
        assert_eq!(
            resp.reward_items,
            Some(vec![
                RewardItem::new("Diamond", "1"),
                RewardItem::new("Box", "1 set"),
                RewardItem::new("", "3"),
            ])
        );
    }

    #[test]
    fn reward_list_of_the_wrong_type_is_ignored() {
        let resp = interpret_reward_response(true, r#"{"resultCode":"0000","rewardList":"none"}"#).unwrap();
        assert!(resp.succeeded);
        assert!(resp.reward_items.is_none());
    }

    #[test]
    fn numeric_result_code_is_a_remote_failure() {
        let resp = interpret_reward_response(true, r#"{"resultCode":0}"#).unwrap();
        assert!(!resp.succeeded);
        assert_eq!(resp.message, "Error code: 0");

        let resp = interpret_reward_response(true, r#"{"resultCode":24004,"resultMsg":"Expired"}"#).unwrap();
        assert_eq!(resp.message, "Expired");
    }

    #[test]
    fn json_that_is_not_an_object_is_a_remote_failure() {
        let resp = interpret_reward_response(true, "[1,2,3]").unwrap();
        assert!(!resp.succeeded);
        assert_eq!(resp.message, "Error code: unknown");
    }

    /// Accepts one connection, captures the raw request head and answers with
    /// `status_line` and a JSON `body`.
    async fn serve_once(
        status_line: &'static str,
        body: &'static str,
    ) -> (String, tokio::task::JoinHandle<String>) {
        use tokio::io::{AsyncReadExt, AsyncWriteExt};

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let base = format!("http://{}", listener.local_addr().unwrap());
        let handle = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut head = Vec::new();
            let mut buf = [0u8; 1024];
            while !head.windows(4).any(|w| w == b"\r\n\r\n") {
                let n = socket.read(&mut buf).await.unwrap();
                if n == 0 {
                    break;
                }
                head.extend_from_slice(&buf[..n]);
            }
            let reply = format!(
                "HTTP/1.1 {status_line}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
                body.len()
            );
            socket.write_all(reply.as_bytes()).await.unwrap();
            socket.shutdown().await.ok();
            String::from_utf8_lossy(&head).into_owned()
        });
        (base, handle)
    }

    #[tokio::test]
    async fn redeem_sends_query_and_browser_headers() {
        let (base, server) = serve_once(
            "200 OK",
            r#"{"resultCode":"0000","resultMsg":"Reward sent","rewardList":[{"itemName":"Diamond","itemCnt":30}]}"#,
        )
        .await;
        let client = CouponApiClient::new(&base, "tskgb", Duration::from_secs(5)).unwrap();

        let resp = client.redeem("ABC123", "SPRING").await.unwrap();
        assert!(resp.succeeded);
        assert_eq!(resp.reward_items, Some(vec![RewardItem::new("Diamond", "30")]));

        let head = server.await.unwrap();
        let request_line = head.lines().next().unwrap();
        assert_eq!(
            request_line,
            "GET /api/coupon/reward?gameCode=tskgb&couponCode=SPRING&langCd=EN_US&pid=ABC123 HTTP/1.1"
        );
        let lower = head.to_lowercase();
        assert!(lower.contains(&format!("referer: {}/tskgb\r\n", base)), "{head}");
        assert!(lower.contains("accept: application/json, text/plain, */*\r\n"), "{head}");
        assert!(lower.contains("dnt: 1\r\n"), "{head}");
        assert!(lower.contains("sec-fetch-mode: cors\r\n"), "{head}");
        assert!(lower.contains("user-agent: mozilla/5.0 (linux; android"), "{head}");
    }

    #[tokio::test]
    async fn server_error_with_json_body_is_a_failed_outcome() {
        let (base, server) = serve_once(
            "500 Internal Server Error",
            r#"{"resultCode":"9999","resultMsg":"Server busy"}"#,
        )
        .await;
        let client = CouponApiClient::new(&base, "tskgb", Duration::from_secs(5)).unwrap();

        let resp = client.redeem("ABC123", "SPRING").await.unwrap();
        assert!(!resp.succeeded);
        assert_eq!(resp.message, "Server busy");
        server.await.unwrap();
    }

    #[tokio::test]
    async fn unreachable_endpoint_is_a_transport_error() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let base = format!("http://{}", listener.local_addr().unwrap());
        drop(listener);

        let client = CouponApiClient::new(&base, "tskgb", Duration::from_secs(5)).unwrap();
        let err = client.redeem("ABC123", "SPRING").await.unwrap_err();
        assert!(matches!(err, Error::RewardRequest(_)), "got {err:?}");
    }
}
