/// 인증 흐름
/// 1. 회원 가입
/// 2. 로그인 (세션 저장)
/// 3. 로그아웃 (세션 삭제)
// region:    --- Imports
use crate::error::{ApiError, ValidationError};
use crate::gateway::{ApiRequest, Gateway};
use crate::navigation::View;
use crate::session::{LoginData, UserProfile};
use serde_json::json;
use std::sync::Arc;
use tracing::info;

// endregion: --- Imports

pub const MIN_PASSWORD_LEN: usize = 8;

// region:    --- Auth
#[derive(Clone)]
pub struct AuthFlow {
    gateway: Arc<Gateway>,
}

impl AuthFlow {
    pub fn new(gateway: Arc<Gateway>) -> Self {
        Self { gateway }
    }

    /// 1. 회원 가입
    pub async fn register(
        &self,
        name: &str,
        email: &str,
        password: &str,
    ) -> Result<UserProfile, ApiError> {
        let name = name.trim();
        let email = email.trim();
        if name.is_empty() {
            return Err(ValidationError::MissingField("Name").into());
        }
        let domain = &self.gateway.config().email_domain;
        if !email.ends_with(domain.as_str()) {
            return Err(ValidationError::InvalidEmail(domain.clone()).into());
        }
        check_password(password)?;

        info!("{:<12} --> 회원 가입 요청: {}", "Auth", name);
        self.gateway
            .send_data(ApiRequest::post(
                "auth/register",
                json!({ "name": name, "email": email, "password": password }),
            ))
            .await
    }

    /// 2. 로그인
    pub async fn login(&self, email: &str, password: &str) -> Result<UserProfile, ApiError> {
        check_password(password)?;

        info!("{:<12} --> 로그인 요청: {}", "Auth", email.trim());
        let login: LoginData = self
            .gateway
            .send_data(ApiRequest::post(
                "auth/login",
                json!({ "email": email.trim(), "password": password }),
            ))
            .await?;

        self.gateway.session().store_login(&login);
        self.gateway.navigator().navigate(View::Home);
        Ok(login.profile)
    }

    /// 3. 로그아웃
    pub fn logout(&self) {
        self.gateway.session().logout();
        self.gateway.navigator().navigate(View::Home);
    }
}

fn check_password(password: &str) -> Result<(), ValidationError> {
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(ValidationError::PasswordTooShort(MIN_PASSWORD_LEN));
    }
    Ok(())
}

// endregion: --- Auth

// region:    --- Tests
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_passwords_are_rejected() {
        assert_eq!(
            check_password("1234567"),
            Err(ValidationError::PasswordTooShort(8))
        );
        assert_eq!(check_password("12345678"), Ok(()));
    }
}
// endregion: --- Tests
