//! # product-api
//!
//! 单一商品资源的 HTTP CRUD 服务。
//!
//! - `app`: 路由、共享状态与商品资源
//! - `core`: 错误映射、响应体、请求体校验、中间件
//! - `infrastructure`: 日志与 Postgres 存储
//! - `config`: TOML 配置与环境变量覆盖

pub mod app;
pub mod config;
pub mod core;
pub mod infrastructure;

pub use app::{create_app, AppState};
pub use config::{AppConfig, ConfigError};
