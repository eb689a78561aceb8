//! 各资源共用的错误、响应、校验与中间件

pub mod error;
pub mod middleware;
pub mod response;
pub mod validation;
