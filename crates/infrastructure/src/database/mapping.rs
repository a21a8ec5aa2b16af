//! 行到实体映射的公共辅助

use lineup_core::{DispatchError, DispatchResult};

/// photo_urls 以JSON文本落库, 两种后端共用同一序列化格式
pub fn photo_urls_to_json(urls: &[String]) -> DispatchResult<String> {
    serde_json::to_string(urls)
        .map_err(|e| DispatchError::Serialization(format!("序列化photo_urls失败: {e}")))
}

pub fn photo_urls_from_json(raw: &str) -> DispatchResult<Vec<String>> {
    if raw.trim().is_empty() {
        return Ok(Vec::new());
    }
    serde_json::from_str(raw)
        .map_err(|e| DispatchError::Serialization(format!("解析photo_urls失败: {e}")))
}
