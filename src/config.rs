/// 클라이언트 설정
/// 환경 변수에서 읽고, 없으면 기본값을 사용한다.
// region:    --- Imports
use std::path::PathBuf;
use std::time::Duration;
use tracing::warn;

// endregion: --- Imports

// region:    --- Defaults
pub const DEFAULT_API_BASE: &str = "https://v2.api.noroff.dev";
pub const DEFAULT_API_KEY_HEADER: &str = "X-Noroff-API-Key";
pub const DEFAULT_API_KEY_NAME: &str = "BidHouse key";
pub const DEFAULT_EMAIL_DOMAIN: &str = "@stud.noroff.no";
pub const DEFAULT_PAGE_LIMIT: u32 = 20;
pub const DEFAULT_POLL_SECS: u64 = 30;

// endregion: --- Defaults

// region:    --- Config
/// 401 응답 처리 정책 (게이트웨이 한 곳에서만 결정)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnauthorizedPolicy {
    /// 세션을 지우고 로그인 화면으로 이동
    ClearSession,
    /// 에러만 반환
    Surface,
}

#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub api_base: String,
    pub api_key_header: String,
    pub api_key_name: String,
    pub email_domain: String,
    pub page_limit: u32,
    pub poll_interval: Duration,
    pub unauthorized: UnauthorizedPolicy,
    pub session_file: Option<PathBuf>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_base: DEFAULT_API_BASE.to_string(),
            api_key_header: DEFAULT_API_KEY_HEADER.to_string(),
            api_key_name: DEFAULT_API_KEY_NAME.to_string(),
            email_domain: DEFAULT_EMAIL_DOMAIN.to_string(),
            page_limit: DEFAULT_PAGE_LIMIT,
            poll_interval: Duration::from_secs(DEFAULT_POLL_SECS),
            unauthorized: UnauthorizedPolicy::ClearSession,
            session_file: None,
        }
    }
}

impl ClientConfig {
    /// 환경 변수에서 설정 생성
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// 키 조회 함수로부터 설정 생성
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();

        let unauthorized = match lookup("BIDHOUSE_UNAUTHORIZED").as_deref() {
            Some("surface") => UnauthorizedPolicy::Surface,
            Some("clear") | None => UnauthorizedPolicy::ClearSession,
            Some(other) => {
                warn!(
                    "{:<12} --> 알 수 없는 401 정책: {}, 기본값 사용",
                    "Config", other
                );
                UnauthorizedPolicy::ClearSession
            }
        };

        Self {
            api_base: lookup("BIDHOUSE_API_BASE").unwrap_or(defaults.api_base),
            api_key_header: lookup("BIDHOUSE_API_KEY_HEADER").unwrap_or(defaults.api_key_header),
            api_key_name: lookup("BIDHOUSE_API_KEY_NAME").unwrap_or(defaults.api_key_name),
            email_domain: lookup("BIDHOUSE_EMAIL_DOMAIN").unwrap_or(defaults.email_domain),
            page_limit: parse_positive(&lookup, "BIDHOUSE_PAGE_LIMIT", u64::from(DEFAULT_PAGE_LIMIT))
                .try_into()
                .unwrap_or(defaults.page_limit),
            poll_interval: Duration::from_secs(parse_positive(
                &lookup,
                "BIDHOUSE_POLL_SECS",
                DEFAULT_POLL_SECS,
            )),
            unauthorized,
            session_file: lookup("BIDHOUSE_SESSION_FILE").map(PathBuf::from),
        }
    }

    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into();
        self
    }

    pub fn with_unauthorized(mut self, policy: UnauthorizedPolicy) -> Self {
        self.unauthorized = policy;
        self
    }
}

// 0이나 숫자가 아닌 값은 기본값으로 대체
fn parse_positive(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: u64) -> u64 {
    match lookup(key) {
        Some(raw) => match raw.trim().parse::<u64>() {
            Ok(0) => {
                warn!("{:<12} --> {} 값은 0일 수 없음, 기본값 사용", "Config", key);
                default
            }
            Ok(value) => value,
            Err(_) => {
                warn!("{:<12} --> {} 값 파싱 실패: {}, 기본값 사용", "Config", key, raw);
                default
            }
        },
        None => default,
    }
}

// endregion: --- Config

// region:    --- Tests
#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn missing_values_fall_back_to_defaults() {
        let config = ClientConfig::from_lookup(|_| None);
        assert_eq!(config.api_base, DEFAULT_API_BASE);
        assert_eq!(config.page_limit, DEFAULT_PAGE_LIMIT);
        assert_eq!(config.unauthorized, UnauthorizedPolicy::ClearSession);
        assert!(config.session_file.is_none());
    }

    #[test]
    fn reads_overrides_and_ignores_garbage_numbers() {
        let env: HashMap<&str, &str> = HashMap::from([
            ("BIDHOUSE_API_BASE", "http://127.0.0.1:9999"),
            ("BIDHOUSE_PAGE_LIMIT", "abc"),
            ("BIDHOUSE_POLL_SECS", "5"),
            ("BIDHOUSE_UNAUTHORIZED", "surface"),
        ]);
        let config = ClientConfig::from_lookup(|k| env.get(k).map(|v| v.to_string()));
        assert_eq!(config.api_base, "http://127.0.0.1:9999");
        assert_eq!(config.page_limit, DEFAULT_PAGE_LIMIT);
        assert_eq!(config.poll_interval, Duration::from_secs(5));
        assert_eq!(config.unauthorized, UnauthorizedPolicy::Surface);
    }

    #[test]
    fn zero_poll_interval_and_page_limit_fall_back_to_defaults() {
        let env: HashMap<&str, &str> = HashMap::from([
            ("BIDHOUSE_PAGE_LIMIT", "0"),
            ("BIDHOUSE_POLL_SECS", " 0 "),
        ]);
        let config = ClientConfig::from_lookup(|k| env.get(k).map(|v| v.to_string()));
        assert_eq!(config.page_limit, DEFAULT_PAGE_LIMIT);
        assert_eq!(config.poll_interval, Duration::from_secs(DEFAULT_POLL_SECS));
    }
}
// endregion: --- Tests
