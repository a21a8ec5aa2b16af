use crate::errors::{DispatchError, DispatchResult};

/// 配置验证trait, 各配置段在反序列化后统一校验
pub trait ConfigValidator {
    fn validate(&self) -> DispatchResult<()>;
}

pub(crate) fn require_not_empty(value: &str, field: &str) -> DispatchResult<()> {
    if value.trim().is_empty() {
        return Err(DispatchError::Configuration(format!("{field} 不能为空")));
    }
    Ok(())
}

pub(crate) fn require_positive(value: i64, field: &str) -> DispatchResult<()> {
    if value <= 0 {
        return Err(DispatchError::Configuration(format!(
            "{field} 必须为正数, 当前值: {value}"
        )));
    }
    Ok(())
}
