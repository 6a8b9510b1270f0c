//! 永続ストレージ trait 定義
//!
//! ドメイン層が必要とする key-value ストレージのインターフェースを定義します。
//! 具体的な実装は Infrastructure 層が提供します（依存性の逆転）。

use super::error::StorageError;

/// 再起動後の自動再参加に使うセッションキーの保存キー
pub const ACTIVE_SESSION_STORAGE_KEY: &str = "active_session_key";

/// Key-value ストレージ trait
///
/// 読み書きはローカルで完結するため同期 API とします。
/// テストではインメモリ実装に差し替えます。
pub trait KeyValueStore: Send + Sync {
    /// 値を取得（存在しなければ `None`）
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;

    /// 値を保存（既存の値は上書き）
    fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;

    /// 値を削除（存在しなくてもエラーにしない）
    fn remove(&self, key: &str) -> Result<(), StorageError>;
}
