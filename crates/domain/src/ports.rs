//! 外部投递能力的端口定义

use async_trait::async_trait;
use lineup_core::DispatchResult;
use serde::{Deserialize, Serialize};

/// 推送消息体
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PushPayload {
    pub title: String,
    pub body: String,
    /// 附加的结构化数据, 客户端用来跳转
    pub data: serde_json::Value,
}

impl PushPayload {
    pub fn new(title: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            body: body.into(),
            data: serde_json::Value::Null,
        }
    }

    pub fn with_data(mut self, data: serde_json::Value) -> Self {
        self.data = data;
        self
    }
}

/// 一次组播投递的结果
///
/// 契约只区分"送达"与"该清理": 永久失效的token原样返回,
/// 调用方负责从投递目标集中删除, 瞬时失败不在这里区分
#[derive(Debug, Clone, Default)]
pub struct PushReport {
    pub delivered: usize,
    pub invalid_tokens: Vec<String>,
}

/// 推送投递端口
#[async_trait]
pub trait PushProvider: Send + Sync {
    /// 对一组token做单次组播
    async fn send_multicast(
        &self,
        tokens: &[String],
        payload: &PushPayload,
    ) -> DispatchResult<PushReport>;
}
