//! InMemory KeyValueStore 実装
//!
//! ドメイン層が定義する KeyValueStore trait の具体的な実装。
//! HashMap をインメモリストレージとして使用します。プロセス終了で内容は失われるため、
//! 主にテストと自動再参加を使わない構成向けです。

use std::{collections::HashMap, sync::Mutex};

use crate::domain::{KeyValueStore, StorageError};

/// インメモリ KeyValueStore 実装
#[derive(Debug, Default)]
pub struct InMemoryKeyValueStore {
    entries: Mutex<HashMap<String, String>>,
}

impl InMemoryKeyValueStore {
    /// 新しい InMemoryKeyValueStore を作成
    pub fn new() -> Self {
        Self::default()
    }

    /// 初期値を持つ InMemoryKeyValueStore を作成
    pub fn with_entry(key: &str, value: &str) -> Self {
        let store = Self::new();
        if let Ok(mut entries) = store.entries.lock() {
            entries.insert(key.to_string(), value.to_string());
        }
        store
    }
}

impl KeyValueStore for InMemoryKeyValueStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        let entries = self.entries.lock().map_err(|_| StorageError::Poisoned)?;
        Ok(entries.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let mut entries = self.entries.lock().map_err(|_| StorageError::Poisoned)?;
        entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        let mut entries = self.entries.lock().map_err(|_| StorageError::Poisoned)?;
        entries.remove(key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_then_get() {
        // テスト項目: 保存した値を取得できる
        // given (前提条件):
        let store = InMemoryKeyValueStore::new();

        // when (操作):
        store.set("active_session_key", "S1").unwrap();

        // then (期待する結果):
        assert_eq!(
            store.get("active_session_key").unwrap(),
            Some("S1".to_string())
        );
    }

    #[test]
    fn test_set_overwrites() {
        // テスト項目: 同じキーへの保存は上書きになる
        // given (前提条件):
        let store = InMemoryKeyValueStore::with_entry("k", "old");

        // when (操作):
        store.set("k", "new").unwrap();

        // then (期待する結果):
        assert_eq!(store.get("k").unwrap(), Some("new".to_string()));
    }

    #[test]
    fn test_remove_missing_key_is_ok() {
        // テスト項目: 存在しないキーの削除もエラーにならない（冪等性）
        // given (前提条件):
        let store = InMemoryKeyValueStore::new();

        // when (操作):
        let result = store.remove("missing");

        // then (期待する結果):
        assert!(result.is_ok());
        assert_eq!(store.get("missing").unwrap(), None);
    }
}
