// アプリケーション層
// 同期APIパスのユースケースとクエリを提供する

pub mod error;
pub mod service;

pub use error::ApplicationError;
