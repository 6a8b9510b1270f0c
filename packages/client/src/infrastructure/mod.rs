//! Infrastructure 層
//!
//! ドメイン層のポート（KeyValueStore / LatencyApi / QuizApi / Connector）の
//! 具体的な実装と、ワイヤ形式の DTO を提供します。

pub mod dto;
pub mod gateway;
pub mod repository;
pub mod transport;
