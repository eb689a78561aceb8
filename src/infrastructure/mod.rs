//! 日志初始化与 Postgres 存储

#[cfg(feature = "database")]
pub mod database;
pub mod logger;
