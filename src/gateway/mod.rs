/// 원격 경매 API 요청 게이트웨이
/// 1. 인증 헤더 주입
/// 2. JSON 파싱
/// 3. 실패 응답을 하나의 에러 형태로 정규화
/// 4. 401 처리 정책 적용
// region:    --- Imports
use crate::config::{ClientConfig, UnauthorizedPolicy};
use crate::error::{ApiError, ValidationError, NOT_FOUND_MESSAGE, REQUEST_FAILED_MESSAGE};
use crate::listings::model::{Envelope, Page};
use crate::navigation::{Navigator, View};
use crate::session::{KeyProvisioner, SessionContext, UserProfile};
use async_trait::async_trait;
use reqwest::{Method, Url};
use serde::de::DeserializeOwned;
use serde_json::{json, Map, Value};
use std::sync::Arc;
use tracing::{debug, error, info, warn};

pub mod transport;

pub use transport::{HttpRequest, HttpResponse, ReqwestTransport, Transport};

// endregion: --- Imports

// region:    --- Api Request
#[derive(Debug, Clone)]
pub struct ApiRequest {
    pub method: Method,
    pub target: String,
    pub segments: Vec<String>,
    pub query: Vec<(String, String)>,
    pub body: Option<Value>,
    pub headers: Vec<(String, String)>,
}

impl ApiRequest {
    pub fn new(method: Method, target: impl Into<String>) -> Self {
        Self {
            method,
            target: target.into(),
            segments: Vec::new(),
            query: Vec::new(),
            body: None,
            headers: Vec::new(),
        }
    }

    pub fn get(target: impl Into<String>) -> Self {
        Self::new(Method::GET, target)
    }

    pub fn post(target: impl Into<String>, body: Value) -> Self {
        Self::new(Method::POST, target).body(body)
    }

    pub fn put(target: impl Into<String>, body: Value) -> Self {
        Self::new(Method::PUT, target).body(body)
    }

    pub fn delete(target: impl Into<String>) -> Self {
        Self::new(Method::DELETE, target)
    }

    /// 경로 세그먼트 추가 (인코딩은 URL 생성 시 적용)
    pub fn segment(mut self, segment: impl Into<String>) -> Self {
        self.segments.push(segment.into());
        self
    }

    pub fn query(mut self, key: &str, value: impl ToString) -> Self {
        self.query.push((key.to_string(), value.to_string()));
        self
    }

    pub fn body(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    pub fn header(mut self, name: &str, value: impl Into<String>) -> Self {
        self.headers.push((name.to_string(), value.into()));
        self
    }
}

// endregion: --- Api Request

// region:    --- Gateway
pub struct Gateway {
    config: ClientConfig,
    transport: Arc<dyn Transport>,
    session: Arc<SessionContext>,
    navigator: Arc<dyn Navigator>,
}

impl Gateway {
    pub fn new(
        config: ClientConfig,
        transport: Arc<dyn Transport>,
        session: Arc<SessionContext>,
        navigator: Arc<dyn Navigator>,
    ) -> Self {
        Self {
            config,
            transport,
            session,
            navigator,
        }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn session(&self) -> &Arc<SessionContext> {
        &self.session
    }

    pub fn navigator(&self) -> &Arc<dyn Navigator> {
        &self.navigator
    }

    /// 요청 실행 후 JSON 반환 (바디가 없으면 빈 객체)
    pub async fn request(&self, request: ApiRequest) -> Result<Value, ApiError> {
        let url = self.resolve_url(&request)?;
        let headers = self.build_headers(&request.headers);
        let body = request.body.as_ref().map(Value::to_string);

        debug!("{:<12} --> {} {}", "Gateway", request.method, url);

        let response = self
            .transport
            .send(HttpRequest {
                method: request.method.clone(),
                url: url.clone(),
                headers,
                body,
            })
            .await
            .map_err(|e| {
                error!("{:<12} --> 네트워크 에러: {} {:?}", "Gateway", url, e);
                ApiError::Network(e)
            })?;

        let result = normalize_response(response.status, &response.body);
        if let Err(e) = &result {
            error!(
                "{:<12} --> API 에러: status={} url={} message={}",
                "Gateway", response.status, url, e
            );
            if response.status == 401 {
                self.handle_unauthorized();
            }
        }
        result
    }

    /// {data} 봉투를 풀어서 반환
    pub async fn get_data<T: DeserializeOwned>(&self, request: ApiRequest) -> Result<T, ApiError> {
        Ok(self.get_envelope(request).await?.data)
    }

    /// {data, meta} 봉투 전체 반환
    pub async fn get_envelope<T: DeserializeOwned>(
        &self,
        request: ApiRequest,
    ) -> Result<Envelope<T>, ApiError> {
        let value = self.request(request).await?;
        Ok(serde_json::from_value(value)?)
    }

    /// 쓰기 요청 (POST/PUT) 후 {data} 반환
    pub async fn send_data<T: DeserializeOwned>(&self, request: ApiRequest) -> Result<T, ApiError> {
        self.get_data(request).await
    }

    /// 목록 한 페이지 조회 (meta가 없으면 요청한 페이지 번호 사용)
    pub async fn get_page<T: DeserializeOwned>(
        &self,
        request: ApiRequest,
        requested_page: u32,
    ) -> Result<Page<T>, ApiError> {
        let envelope = self.get_envelope::<Vec<T>>(request).await?;
        let meta = envelope.meta.unwrap_or_default();
        Ok(Page {
            items: envelope.data,
            current_page: meta.current_page.unwrap_or(requested_page),
            page_count: meta.page_count,
            is_last_page: meta.is_last_page,
        })
    }

    /// API 키 확보 (동시 호출 시 발급은 한 번)
    pub async fn ensure_api_key(&self) -> Option<String> {
        self.session.ensure_api_key(self).await
    }

    /// 로그인 필요 작업의 선행 조건
    /// 세션이 없으면 로그인 화면으로 이동하고 AUTH_REQUIRED를 반환한다.
    pub fn require_session(&self) -> Result<UserProfile, ApiError> {
        match (self.session.token(), self.session.user()) {
            (Some(_), Some(user)) => Ok(user),
            _ => {
                info!("{:<12} --> 로그인 필요", "Gateway");
                self.navigator.navigate(View::Login);
                Err(ValidationError::AuthRequired.into())
            }
        }
    }

    fn handle_unauthorized(&self) {
        match self.config.unauthorized {
            UnauthorizedPolicy::ClearSession => {
                warn!("{:<12} --> 401 응답: 세션 삭제 후 로그인 이동", "Gateway");
                self.session.logout();
                self.navigator.navigate(View::Login);
            }
            UnauthorizedPolicy::Surface => {}
        }
    }

    fn resolve_url(&self, request: &ApiRequest) -> Result<Url, ApiError> {
        let target = &request.target;
        let raw = if target.starts_with("http://") || target.starts_with("https://") {
            target.clone()
        } else {
            format!(
                "{}/{}",
                self.config.api_base.trim_end_matches('/'),
                target.trim_start_matches('/')
            )
        };

        let mut url = Url::parse(&raw).map_err(|e| ApiError::InvalidUrl(format!("{raw}: {e}")))?;
        if !request.segments.is_empty() {
            url.path_segments_mut()
                .map_err(|_| ApiError::InvalidUrl(raw.clone()))?
                .pop_if_empty()
                .extend(&request.segments);
        }
        if !request.query.is_empty() {
            let mut pairs = url.query_pairs_mut();
            for (k, v) in &request.query {
                pairs.append_pair(k, v);
            }
        }
        Ok(url)
    }

    fn build_headers(&self, overrides: &[(String, String)]) -> Vec<(String, String)> {
        let mut headers = vec![("Content-Type".to_string(), "application/json".to_string())];
        for (name, value) in overrides {
            set_header(&mut headers, name, value);
        }
        if let Some(token) = self.session.token() {
            set_header(&mut headers, "Authorization", &format!("Bearer {token}"));
        }
        if let Some(key) = self.session.api_key() {
            set_header(&mut headers, &self.config.api_key_header, &key);
        }
        headers
    }
}

#[async_trait]
impl KeyProvisioner for Gateway {
    async fn provision_api_key(&self, token: &str) -> Option<String> {
        info!("{:<12} --> API 키 발급 요청", "Gateway");
        let request = ApiRequest::post(
            "auth/create-api-key",
            json!({ "name": self.config.api_key_name }),
        )
        .header("Authorization", format!("Bearer {token}"));

        match self.request(request).await {
            Ok(value) => {
                let key = value
                    .pointer("/data/key")
                    .and_then(Value::as_str)
                    .map(str::to_string);
                if key.is_none() {
                    warn!("{:<12} --> API 키 응답에 key 없음", "Gateway");
                }
                key
            }
            Err(e) => {
                error!("{:<12} --> API 키 발급 실패: {}", "Gateway", e);
                None
            }
        }
    }
}

fn set_header(headers: &mut Vec<(String, String)>, name: &str, value: &str) {
    match headers.iter_mut().find(|(k, _)| k.eq_ignore_ascii_case(name)) {
        Some(entry) => entry.1 = value.to_string(),
        None => headers.push((name.to_string(), value.to_string())),
    }
}

// endregion: --- Gateway

// region:    --- Normalization
/// 상태 코드와 바디를 결과로 정규화
pub fn normalize_response(status: u16, body: &str) -> Result<Value, ApiError> {
    let has_body = status != 204 && status != 205;
    let data: Option<Value> = if has_body && !body.trim().is_empty() {
        serde_json::from_str(body).ok()
    } else {
        None
    };

    if !(200..300).contains(&status) {
        let message = error_message(status, data.as_ref());
        return Err(if status == 404 {
            ApiError::NotFound {
                message,
                body: data,
            }
        } else {
            ApiError::Http {
                status,
                message,
                body: data,
            }
        });
    }

    Ok(match data {
        Some(Value::Null) | None => Value::Object(Map::new()),
        Some(value) => value,
    })
}

/// errors[0].message > message (404 제외) > 상태별 기본 메시지
fn error_message(status: u16, data: Option<&Value>) -> String {
    let non_empty = |v: Option<&Value>| {
        v.and_then(Value::as_str)
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
    };

    if let Some(message) = non_empty(data.and_then(|d| d.pointer("/errors/0/message"))) {
        return message;
    }
    if status == 404 {
        return NOT_FOUND_MESSAGE.to_string();
    }
    non_empty(data.and_then(|d| d.get("message")))
        .unwrap_or_else(|| REQUEST_FAILED_MESSAGE.to_string())
}

// endregion: --- Normalization

// region:    --- Tests
#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::TransportError;
    use crate::navigation::RecordingNavigator;
    use crate::session::{API_KEY_KEY, TOKEN_KEY, USER_KEY};
    use std::sync::Mutex;

    /// 미리 정해둔 응답을 돌려주는 전송 계층
    struct ScriptedTransport {
        status: u16,
        body: String,
        fail: bool,
        seen: Mutex<Vec<HttpRequest>>,
    }

    impl ScriptedTransport {
        fn new(status: u16, body: &str) -> Arc<Self> {
            Arc::new(Self {
                status,
                body: body.to_string(),
                fail: false,
                seen: Mutex::new(Vec::new()),
            })
        }

        fn failing() -> Arc<Self> {
            Arc::new(Self {
                status: 0,
                body: String::new(),
                fail: true,
                seen: Mutex::new(Vec::new()),
            })
        }
    }

    #[async_trait]
    impl Transport for ScriptedTransport {
        async fn send(&self, request: HttpRequest) -> Result<HttpResponse, TransportError> {
            self.seen.lock().unwrap().push(request);
            if self.fail {
                return Err("connection refused".into());
            }
            Ok(HttpResponse {
                status: self.status,
                body: self.body.clone(),
            })
        }
    }

    fn gateway(
        transport: Arc<ScriptedTransport>,
        policy: UnauthorizedPolicy,
    ) -> (Gateway, Arc<SessionContext>, Arc<RecordingNavigator>) {
        let session = Arc::new(SessionContext::in_memory());
        let navigator = Arc::new(RecordingNavigator::default());
        let config = ClientConfig::default()
            .with_api_base("http://api.test")
            .with_unauthorized(policy);
        let gateway = Gateway::new(config, transport, session.clone(), navigator.clone());
        (gateway, session, navigator)
    }

    #[test]
    fn not_found_prefers_errors_array_message() {
        let err = normalize_response(404, r#"{"errors":[{"message":"Listing not found"}]}"#)
            .unwrap_err();
        assert!(matches!(err, ApiError::NotFound { .. }));
        assert_eq!(err.to_string(), "Listing not found");
    }

    #[test]
    fn not_found_without_errors_uses_fixed_message() {
        let err = normalize_response(404, r#"{"message":"Not Found"}"#).unwrap_err();
        assert_eq!(err.to_string(), NOT_FOUND_MESSAGE);
        assert_eq!(err.body(), Some(&json!({"message": "Not Found"})));
    }

    #[test]
    fn other_failures_fall_back_to_message_then_generic() {
        let err = normalize_response(400, r#"{"message":"Bad amount"}"#).unwrap_err();
        assert_eq!(err.to_string(), "Bad amount");
        assert_eq!(err.status(), Some(400));

        let err = normalize_response(500, "<html>oops</html>").unwrap_err();
        assert_eq!(err.to_string(), REQUEST_FAILED_MESSAGE);
    }

    #[test]
    fn empty_success_bodies_become_empty_object() {
        assert_eq!(normalize_response(204, "").unwrap(), json!({}));
        assert_eq!(normalize_response(205, "ignored").unwrap(), json!({}));
        assert_eq!(normalize_response(200, "").unwrap(), json!({}));
        assert_eq!(
            normalize_response(200, r#"{"data":[]}"#).unwrap(),
            json!({"data": []})
        );
    }

    #[tokio::test]
    async fn injects_headers_from_session() {
        let transport = ScriptedTransport::new(200, r#"{"data":{}}"#);
        let (gateway, session, _) = gateway(transport.clone(), UnauthorizedPolicy::ClearSession);
        session.store().set(TOKEN_KEY, "tok");
        session.store().set(API_KEY_KEY, "key");

        gateway
            .request(ApiRequest::get("auction/listings").query("page", 2))
            .await
            .unwrap();

        let seen = transport.seen.lock().unwrap();
        let request = &seen[0];
        assert_eq!(request.url.as_str(), "http://api.test/auction/listings?page=2");
        assert_eq!(request.header("content-type"), Some("application/json"));
        assert_eq!(request.header("Authorization"), Some("Bearer tok"));
        assert_eq!(request.header("X-Noroff-API-Key"), Some("key"));
    }

    #[tokio::test]
    async fn path_segments_are_percent_encoded() {
        let transport = ScriptedTransport::new(200, "{}");
        let (gateway, _, _) = gateway(transport.clone(), UnauthorizedPolicy::ClearSession);
        gateway
            .request(
                ApiRequest::get("auction/listings/")
                    .segment("a b/c%")
                    .segment("bids"),
            )
            .await
            .unwrap();
        gateway
            .request(ApiRequest::get("auction/profiles").segment("kari_n-1.ø"))
            .await
            .unwrap();

        let seen = transport.seen.lock().unwrap();
        assert_eq!(
            seen[0].url.as_str(),
            "http://api.test/auction/listings/a%20b%2Fc%25/bids"
        );
        assert_eq!(
            seen[1].url.as_str(),
            "http://api.test/auction/profiles/kari_n-1.%C3%B8"
        );
    }

    #[tokio::test]
    async fn anonymous_requests_carry_no_auth_headers() {
        let transport = ScriptedTransport::new(200, "{}");
        let (gateway, _, _) = gateway(transport.clone(), UnauthorizedPolicy::ClearSession);
        gateway.request(ApiRequest::get("auction/listings")).await.unwrap();

        let seen = transport.seen.lock().unwrap();
        assert_eq!(seen[0].header("Authorization"), None);
        assert_eq!(seen[0].header("X-Noroff-API-Key"), None);
    }

    #[tokio::test]
    async fn transport_failure_is_network_error() {
        let (gateway, _, _) = gateway(ScriptedTransport::failing(), UnauthorizedPolicy::Surface);
        let err = gateway.request(ApiRequest::get("x")).await.unwrap_err();
        assert!(matches!(err, ApiError::Network(_)));
        assert_eq!(err.to_string(), "NETWORK_ERROR");
    }

    #[tokio::test]
    async fn unauthorized_clears_session_under_clear_policy() {
        let transport = ScriptedTransport::new(401, r#"{"errors":[{"message":"Invalid token"}]}"#);
        let (gateway, session, navigator) = gateway(transport, UnauthorizedPolicy::ClearSession);
        session.store().set(TOKEN_KEY, "tok");
        session.store().set(USER_KEY, r#"{"name":"kari"}"#);

        let err = gateway.request(ApiRequest::get("x")).await.unwrap_err();
        assert_eq!(err.status(), Some(401));
        assert!(session.token().is_none());
        assert_eq!(navigator.last(), Some(View::Login));
    }

    #[tokio::test]
    async fn unauthorized_is_only_surfaced_under_surface_policy() {
        let transport = ScriptedTransport::new(401, "{}");
        let (gateway, session, navigator) = gateway(transport, UnauthorizedPolicy::Surface);
        session.store().set(TOKEN_KEY, "tok");

        gateway.request(ApiRequest::get("x")).await.unwrap_err();
        assert!(session.token().is_some());
        assert!(navigator.visits().is_empty());
    }

    #[tokio::test]
    async fn require_session_redirects_when_logged_out() {
        let (gateway, _, navigator) =
            gateway(ScriptedTransport::new(200, "{}"), UnauthorizedPolicy::Surface);
        let err = gateway.require_session().unwrap_err();
        assert_eq!(err.validation(), Some(&ValidationError::AuthRequired));
        assert_eq!(navigator.last(), Some(View::Login));
    }
}
// endregion: --- Tests
