//! KeyValueStore 実装
//!
//! - `inmemory`: HashMap を使った実装（テスト用）
//! - `file`: JSON ファイルを使った実装（CLI の永続ストレージ）

pub mod file;
pub mod inmemory;

pub use file::FileKeyValueStore;
pub use inmemory::InMemoryKeyValueStore;
