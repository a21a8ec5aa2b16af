//! 基于HTTP组播接口的推送投递实现
//!
//! 面向FCM legacy风格的组播协议: 一次请求携带全部token,
//! 响应逐token给出结果, 永久失效的token上报给调用方清理

use async_trait::async_trait;
use lineup_core::config::NotifierConfig;
use lineup_core::{DispatchError, DispatchResult};
use lineup_domain::ports::{PushPayload, PushProvider, PushReport};
use serde::Deserialize;
use serde_json::json;
use std::time::Duration;
use tracing::{debug, warn};

/// 逐token的投递结果, 只关心error字段
#[derive(Debug, Deserialize)]
struct MulticastResult {
    #[serde(default)]
    error: Option<String>,
}

#[derive(Debug, Deserialize)]
struct MulticastResponse {
    #[serde(default)]
    success: usize,
    #[serde(default)]
    results: Vec<MulticastResult>,
}

/// 这两类错误说明token永久失效, 应从设备表清理
fn is_permanent_failure(error: &str) -> bool {
    matches!(error, "NotRegistered" | "InvalidRegistration")
}

pub struct HttpPushProvider {
    push_url: String,
    api_key: String,
    http_client: reqwest::Client,
}

impl HttpPushProvider {
    pub fn new(config: &NotifierConfig) -> DispatchResult<Self> {
        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.send_timeout_seconds))
            .build()
            .map_err(|e| DispatchError::Configuration(format!("构建HTTP客户端失败: {e}")))?;

        Ok(Self {
            push_url: config.push_url.clone(),
            api_key: config.api_key.clone(),
            http_client,
        })
    }
}

#[async_trait]
impl PushProvider for HttpPushProvider {
    async fn send_multicast(
        &self,
        tokens: &[String],
        payload: &PushPayload,
    ) -> DispatchResult<PushReport> {
        if tokens.is_empty() {
            return Ok(PushReport::default());
        }

        let body = json!({
            "registration_ids": tokens,
            "notification": {
                "title": payload.title,
                "body": payload.body,
            },
            "data": payload.data,
        });

        let response = self
            .http_client
            .post(&self.push_url)
            .header("Authorization", format!("key={}", self.api_key))
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                warn!("推送网关连接失败: {}", e);
                DispatchError::PushDelivery(format!("推送网关连接失败: {e}"))
            })?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            warn!("推送网关返回错误: HTTP {} - {}", status, text);
            return Err(DispatchError::PushDelivery(format!(
                "推送网关返回HTTP {status}"
            )));
        }

        let parsed: MulticastResponse = response
            .json()
            .await
            .map_err(|e| DispatchError::PushDelivery(format!("推送响应解析失败: {e}")))?;

        let invalid_tokens: Vec<String> = parsed
            .results
            .iter()
            .zip(tokens.iter())
            .filter_map(|(result, token)| {
                result
                    .error
                    .as_deref()
                    .filter(|e| is_permanent_failure(e))
                    .map(|_| token.clone())
            })
            .collect();

        debug!(
            delivered = parsed.success,
            invalid = invalid_tokens.len(),
            "组播投递完成"
        );

        Ok(PushReport {
            delivered: parsed.success,
            invalid_tokens,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_permanent_failure_classification() {
        assert!(is_permanent_failure("NotRegistered"));
        assert!(is_permanent_failure("InvalidRegistration"));
        assert!(!is_permanent_failure("Unavailable"));
        assert!(!is_permanent_failure("InternalServerError"));
    }

    #[test]
    fn test_multicast_response_parsing() {
        let raw = r#"{"success":2,"failure":1,"results":[{"message_id":"m1"},{"error":"NotRegistered"},{"message_id":"m2"}]}"#;
        let parsed: MulticastResponse = serde_json::from_str(raw).unwrap();
        assert_eq!(parsed.success, 2);
        assert_eq!(parsed.results.len(), 3);
        assert_eq!(parsed.results[1].error.as_deref(), Some("NotRegistered"));
    }

    #[tokio::test]
    async fn test_empty_tokens_short_circuit() {
        let provider = HttpPushProvider::new(&NotifierConfig::default()).unwrap();
        let report = provider
            .send_multicast(&[], &PushPayload::new("标题", "内容"))
            .await
            .unwrap();
        assert_eq!(report.delivered, 0);
        assert!(report.invalid_tokens.is_empty());
    }
}
