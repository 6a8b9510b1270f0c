//! HTTP ゲートウェイの実装
//!
//! - `http`: reqwest を使った実装

pub mod http;

pub use http::{DEFAULT_REQUEST_TIMEOUT, HttpClassroomApi};
