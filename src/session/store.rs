/// 세션 키-값 저장소
/// 동기식이며 항상 사용 가능하다고 가정한다. 쓰기 실패는 로그만 남긴다.
// region:    --- Imports
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};
use tracing::{debug, error, warn};

// endregion: --- Imports

// region:    --- Store Trait
pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&self, key: &str, value: &str);
    /// 여러 키를 한 번에 삭제 (호출자에게 부분 삭제 상태가 보이지 않아야 한다)
    fn remove_many(&self, keys: &[&str]);
}

// endregion: --- Store Trait

// region:    --- Memory Store
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn entries(&self) -> MutexGuard<'_, HashMap<String, String>> {
        self.entries.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Option<String> {
        self.entries().get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) {
        self.entries().insert(key.to_string(), value.to_string());
    }

    fn remove_many(&self, keys: &[&str]) {
        let mut entries = self.entries();
        for key in keys {
            entries.remove(*key);
        }
    }
}

// endregion: --- Memory Store

// region:    --- File Store
/// JSON 파일 하나에 모든 키를 저장하는 구현체
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    entries: Mutex<HashMap<String, String>>,
}

impl FileStore {
    /// 파일이 없거나 손상된 경우 빈 저장소로 시작
    pub fn open(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref().to_path_buf();
        let entries = match std::fs::read_to_string(&path) {
            Ok(raw) => serde_json::from_str(&raw).unwrap_or_else(|e| {
                warn!(
                    "{:<12} --> 세션 파일 파싱 실패, 빈 저장소로 시작: {:?}",
                    "FileStore", e
                );
                HashMap::new()
            }),
            Err(_) => HashMap::new(),
        };
        debug!("{:<12} --> 세션 파일 열기: {}", "FileStore", path.display());
        Self {
            path,
            entries: Mutex::new(entries),
        }
    }

    fn persist(&self, entries: &HashMap<String, String>) {
        let result = serde_json::to_string_pretty(entries)
            .map_err(std::io::Error::other)
            .and_then(|raw| std::fs::write(&self.path, raw));
        if let Err(e) = result {
            error!("{:<12} --> 세션 파일 저장 실패: {:?}", "FileStore", e);
        }
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Option<String> {
        self.entries
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .get(key)
            .cloned()
    }

    fn set(&self, key: &str, value: &str) {
        let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        entries.insert(key.to_string(), value.to_string());
        self.persist(&entries);
    }

    fn remove_many(&self, keys: &[&str]) {
        let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        for key in keys {
            entries.remove(*key);
        }
        self.persist(&entries);
    }
}

// endregion: --- File Store

// region:    --- Tests
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_store_removes_all_requested_keys() {
        let store = MemoryStore::new();
        store.set("token", "t");
        store.set("user", "{}");
        store.set("other", "keep");
        store.remove_many(&["token", "user"]);
        assert_eq!(store.get("token"), None);
        assert_eq!(store.get("user"), None);
        assert_eq!(store.get("other").as_deref(), Some("keep"));
    }

    #[test]
    fn file_store_survives_reopen() {
        let path = std::env::temp_dir().join(format!(
            "bidhouse-store-{}-{}.json",
            std::process::id(),
            chrono::Utc::now().timestamp_nanos_opt().unwrap_or_default()
        ));
        {
            let store = FileStore::open(&path);
            store.set("token", "abc");
        }
        let reopened = FileStore::open(&path);
        assert_eq!(reopened.get("token").as_deref(), Some("abc"));
        reopened.remove_many(&["token"]);
        assert_eq!(FileStore::open(&path).get("token"), None);
        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn corrupt_file_starts_empty() {
        let path = std::env::temp_dir().join(format!("bidhouse-corrupt-{}.json", std::process::id()));
        std::fs::write(&path, "not json").unwrap();
        let store = FileStore::open(&path);
        assert_eq!(store.get("token"), None);
        let _ = std::fs::remove_file(&path);
    }
}
// endregion: --- Tests
