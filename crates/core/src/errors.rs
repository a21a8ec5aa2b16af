use thiserror::Error;

/// 派发引擎错误类型定义
#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("数据库错误: {0}")]
    Database(#[from] sqlx::Error),

    #[error("数据库操作错误: {0}")]
    DatabaseOperation(String),

    #[error("线索未找到: {id}")]
    LeadNotFound { id: String },

    #[error("Closer未找到: {id}")]
    CloserNotFound { id: String },

    #[error("权限不足: {0}")]
    PermissionDenied(String),

    #[error("前置条件不满足: {0}")]
    InvalidPrecondition(String),

    #[error("非法状态流转: {from} -> {to}")]
    InvalidTransition { from: String, to: String },

    #[error("推送投递错误: {0}")]
    PushDelivery(String),

    #[error("序列化错误: {0}")]
    Serialization(String),

    #[error("配置错误: {0}")]
    Configuration(String),

    #[error("内部错误: {0}")]
    Internal(String),
}

impl DispatchError {
    pub fn permission(message: impl Into<String>) -> Self {
        DispatchError::PermissionDenied(message.into())
    }

    pub fn precondition(message: impl Into<String>) -> Self {
        DispatchError::InvalidPrecondition(message.into())
    }

    pub fn database_operation(message: impl Into<String>) -> Self {
        DispatchError::DatabaseOperation(message.into())
    }

    /// 基础设施类错误只向调用方暴露通用描述, 详细原因进日志
    pub fn is_infrastructure(&self) -> bool {
        matches!(
            self,
            DispatchError::Database(_)
                | DispatchError::DatabaseOperation(_)
                | DispatchError::PushDelivery(_)
                | DispatchError::Serialization(_)
                | DispatchError::Configuration(_)
                | DispatchError::Internal(_)
        )
    }
}

/// 统一的Result类型
pub type DispatchResult<T> = std::result::Result<T, DispatchError>;
