/// 로그인 세션 컨텍스트
/// 토큰, 사용자 스냅샷, API 키를 주입된 키-값 저장소에 보관한다.
/// 로그인과 로그아웃 흐름 외에는 세션을 변경하지 않는다.
// region:    --- Imports
use crate::listings::model::Media;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{info, warn};

pub mod store;

pub use store::{FileStore, KeyValueStore, MemoryStore};

// endregion: --- Imports

// region:    --- Keys
pub const TOKEN_KEY: &str = "token";
pub const USER_KEY: &str = "user";
pub const API_KEY_KEY: &str = "apiKey";
pub const LAST_SEEN_WINS_KEY: &str = "lastSeenWinsCount";

// endregion: --- Keys

// region:    --- Models
/// 로그인 시점에 저장하는 사용자 프로필 스냅샷
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub name: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub credits: Option<f64>,
    #[serde(default)]
    pub avatar: Option<Media>,
    #[serde(default)]
    pub banner: Option<Media>,
    #[serde(default)]
    pub bio: Option<String>,
}

/// 로그인 응답 데이터
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginData {
    pub access_token: String,
    #[serde(flatten)]
    pub profile: UserProfile,
}

// endregion: --- Models

// region:    --- Provisioner
/// API 키 발급자
#[async_trait]
pub trait KeyProvisioner: Send + Sync {
    async fn provision_api_key(&self, token: &str) -> Option<String>;
}

// endregion: --- Provisioner

// region:    --- Session Context
pub struct SessionContext {
    store: Arc<dyn KeyValueStore>,
    provisioning: Mutex<()>,
}

impl SessionContext {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self {
            store,
            provisioning: Mutex::new(()),
        }
    }

    /// 메모리 저장소 기반 세션
    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryStore::new()))
    }

    pub fn store(&self) -> &Arc<dyn KeyValueStore> {
        &self.store
    }

    /// 사용자 스냅샷 조회 (없거나 파싱 실패 시 None)
    pub fn user(&self) -> Option<UserProfile> {
        let raw = self.store.get(USER_KEY)?;
        serde_json::from_str(&raw).ok()
    }

    pub fn token(&self) -> Option<String> {
        self.store.get(TOKEN_KEY).filter(|t| !t.is_empty())
    }

    pub fn api_key(&self) -> Option<String> {
        self.store.get(API_KEY_KEY).filter(|k| !k.is_empty())
    }

    pub fn is_authenticated(&self) -> bool {
        self.token().is_some()
    }

    /// 로그인 결과 저장
    pub fn store_login(&self, login: &LoginData) {
        self.store.set(TOKEN_KEY, &login.access_token);
        match serde_json::to_string(&login.profile) {
            Ok(raw) => self.store.set(USER_KEY, &raw),
            Err(e) => warn!("{:<12} --> 사용자 스냅샷 직렬화 실패: {:?}", "Session", e),
        }
        info!("{:<12} --> 로그인 세션 저장: {}", "Session", login.profile.name);
    }

    /// 세 키를 한 번에 삭제
    pub fn logout(&self) {
        self.store.remove_many(&[TOKEN_KEY, USER_KEY, API_KEY_KEY]);
        info!("{:<12} --> 세션 삭제", "Session");
    }

    /// API 키 확보
    /// 캐시된 키가 있으면 반환하고, 토큰이 없으면 None을 반환한다.
    /// 발급은 한 번에 하나만 진행되고, 대기하던 호출자는 락을 얻은 뒤 캐시를 다시 확인한다.
    pub async fn ensure_api_key(&self, provisioner: &dyn KeyProvisioner) -> Option<String> {
        if let Some(key) = self.api_key() {
            return Some(key);
        }

        let _guard = self.provisioning.lock().await;

        if let Some(key) = self.api_key() {
            return Some(key);
        }
        let token = self.token()?;

        let key = provisioner.provision_api_key(&token).await?;
        self.store.set(API_KEY_KEY, &key);
        info!("{:<12} --> API 키 발급 완료", "Session");
        Some(key)
    }
}

// endregion: --- Session Context

// region:    --- Tests
#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    struct CountingProvisioner {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl KeyProvisioner for CountingProvisioner {
        async fn provision_api_key(&self, _token: &str) -> Option<String> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_millis(20)).await;
            Some("fresh-key".to_string())
        }
    }

    fn login_data() -> LoginData {
        serde_json::from_value(serde_json::json!({
            "name": "kari",
            "email": "kari@stud.noroff.no",
            "accessToken": "tok",
            "credits": 1000
        }))
        .unwrap()
    }

    #[test]
    fn reads_return_none_on_absence_or_garbage() {
        let session = SessionContext::in_memory();
        assert!(session.user().is_none());
        assert!(session.token().is_none());
        session.store().set(USER_KEY, "{not json");
        assert!(session.user().is_none());
    }

    #[test]
    fn login_then_logout_clears_everything() {
        let session = SessionContext::in_memory();
        session.store_login(&login_data());
        session.store().set(API_KEY_KEY, "key");

        assert_eq!(session.user().map(|u| u.name), Some("kari".to_string()));
        assert_eq!(session.token().as_deref(), Some("tok"));

        session.logout();
        assert!(session.user().is_none());
        assert!(session.token().is_none());
        assert!(session.api_key().is_none());
    }

    #[tokio::test]
    async fn ensure_api_key_without_token_returns_none() {
        let session = SessionContext::in_memory();
        let provisioner = CountingProvisioner {
            calls: AtomicUsize::new(0),
        };
        assert_eq!(session.ensure_api_key(&provisioner).await, None);
        assert_eq!(provisioner.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn concurrent_callers_share_one_provisioning_call() {
        let session = SessionContext::in_memory();
        session.store_login(&login_data());
        let provisioner = CountingProvisioner {
            calls: AtomicUsize::new(0),
        };

        let (a, b) = tokio::join!(
            session.ensure_api_key(&provisioner),
            session.ensure_api_key(&provisioner)
        );

        assert_eq!(a.as_deref(), Some("fresh-key"));
        assert_eq!(b.as_deref(), Some("fresh-key"));
        assert_eq!(provisioner.calls.load(Ordering::SeqCst), 1);
    }
}
// endregion: --- Tests
