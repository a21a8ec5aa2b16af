//! HTTP接入层
//!
//! 薄适配: 解析请求与调用者身份, 把操作转给事件反应器,
//! 再把领域结果/错误映射成统一的响应信封。业务规则不在这里。

pub mod auth;
pub mod error;
pub mod handlers;
pub mod response;
pub mod routes;

pub use error::{ApiError, ApiResult};
pub use response::ApiResponse;
pub use routes::{create_routes, AppState};
