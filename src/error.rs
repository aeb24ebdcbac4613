/// 클라이언트 에러 분류
/// 1. 네트워크 에러 (응답 없음)
/// 2. HTTP 에러 (2xx 이외의 응답)
/// 3. 404 에러 (HTTP 에러의 특수화)
/// 4. 검증 에러 (네트워크 호출 이전의 로컬 검증 실패)
// region:    --- Imports
use serde_json::Value;
use thiserror::Error;

// endregion: --- Imports

// region:    --- Constants
/// 404 응답에서 API 메시지가 없을 때 사용하는 고정 메시지
pub const NOT_FOUND_MESSAGE: &str = "Requested resource was not found.";

/// 그 외 실패 응답의 기본 메시지
pub const REQUEST_FAILED_MESSAGE: &str = "Request failed.";

/// 조회 실패 시 페이지 상단 배너 메시지
pub const LOAD_FAILED_MESSAGE: &str = "Could not load data. Please try again.";

// endregion: --- Constants

// region:    --- Errors
pub type TransportError = Box<dyn std::error::Error + Send + Sync>;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("NETWORK_ERROR")]
    Network(#[source] TransportError),

    #[error("{message}")]
    Http {
        status: u16,
        message: String,
        body: Option<Value>,
    },

    #[error("{message}")]
    NotFound { message: String, body: Option<Value> },

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("Unexpected response shape: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("Invalid request URL: {0}")]
    InvalidUrl(String),
}

impl ApiError {
    /// 응답 상태 코드 (HTTP 계열 에러만)
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Http { status, .. } => Some(*status),
            ApiError::NotFound { .. } => Some(404),
            _ => None,
        }
    }

    /// 원본 응답 바디
    pub fn body(&self) -> Option<&Value> {
        match self {
            ApiError::Http { body, .. } | ApiError::NotFound { body, .. } => body.as_ref(),
            _ => None,
        }
    }

    pub fn validation(&self) -> Option<&ValidationError> {
        match self {
            ApiError::Validation(v) => Some(v),
            _ => None,
        }
    }

    /// 사용자에게 보여줄 메시지
    pub fn user_message(&self) -> String {
        match self {
            ApiError::Network(_) => "Network error. Try again".to_string(),
            ApiError::Decode(_) | ApiError::InvalidUrl(_) => REQUEST_FAILED_MESSAGE.to_string(),
            other => other.to_string(),
        }
    }

    /// 에러 전파 정책 적용
    /// 검증 에러는 폼 안에, 조회 실패는 페이지 배너로, 쓰기 실패는 트리거한 컨트롤 옆에 표시한다.
    pub fn present(&self, operation: Operation) -> Notice {
        match (self, operation) {
            (ApiError::Validation(v), _) => Notice::Inline(v.to_string()),
            (_, Operation::Read) => Notice::Banner(LOAD_FAILED_MESSAGE.to_string()),
            (_, Operation::Write) => Notice::Inline(self.user_message()),
        }
    }
}

/// 로컬 검증 에러
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    #[error("You must be logged in to do that.")]
    AuthRequired,

    #[error("Please enter a valid amount.")]
    InvalidAmount,

    #[error("This auction has ended.")]
    ListingEnded,

    #[error("You cannot bid on your own listing.")]
    OwnListing,

    #[error("Bid must be higher than the current bid of {highest} credits.")]
    BidTooLow { amount: f64, highest: f64 },

    #[error("A bid is already being placed.")]
    SubmissionInFlight,

    #[error("{0} is required.")]
    MissingField(&'static str),

    #[error("Email must be {0}")]
    InvalidEmail(String),

    #[error("Password must be at least {0} characters")]
    PasswordTooShort(usize),

    #[error("Image URL cannot be a base64 data URL. Please use a regular HTTP/HTTPS URL.")]
    InvalidMediaUrl,

    #[error("Please choose a valid end date.")]
    InvalidEndDate,

    #[error("You cannot change a listing that already has bids.")]
    ListingHasBids,

    #[error("Nothing to update.")]
    NothingToUpdate,
}

impl ValidationError {
    /// 고정 에러 코드
    pub fn code(&self) -> &'static str {
        match self {
            ValidationError::AuthRequired => "AUTH_REQUIRED",
            ValidationError::InvalidAmount => "INVALID_AMOUNT",
            ValidationError::ListingEnded => "LISTING_ENDED",
            ValidationError::OwnListing => "OWN_LISTING",
            ValidationError::BidTooLow { .. } => "BID_TOO_LOW",
            ValidationError::SubmissionInFlight => "SUBMISSION_IN_FLIGHT",
            ValidationError::MissingField(_) => "MISSING_FIELD",
            ValidationError::InvalidEmail(_) => "INVALID_EMAIL",
            ValidationError::PasswordTooShort(_) => "PASSWORD_TOO_SHORT",
            ValidationError::InvalidMediaUrl => "INVALID_MEDIA_URL",
            ValidationError::InvalidEndDate => "INVALID_END_DATE",
            ValidationError::ListingHasBids => "LISTING_HAS_BIDS",
            ValidationError::NothingToUpdate => "NOTHING_TO_UPDATE",
        }
    }
}

// endregion: --- Errors

// region:    --- Presentation
/// 에러가 발생한 작업의 종류
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Read,
    Write,
}

/// 에러 표시 위치
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    /// 페이지 단위 "불러오기 실패" 배너
    Banner(String),
    /// 폼 또는 버튼 옆 인라인 메시지
    Inline(String),
}

// endregion: --- Presentation

// region:    --- Tests
#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn validation_errors_render_inline_for_any_operation() {
        let err = ApiError::from(ValidationError::InvalidAmount);
        assert_eq!(
            err.present(Operation::Read),
            Notice::Inline("Please enter a valid amount.".to_string())
        );
        assert_eq!(err.validation().map(|v| v.code()), Some("INVALID_AMOUNT"));
    }

    #[test]
    fn read_failures_become_banner() {
        let err = ApiError::Http {
            status: 500,
            message: "boom".to_string(),
            body: None,
        };
        assert_eq!(
            err.present(Operation::Read),
            Notice::Banner(LOAD_FAILED_MESSAGE.to_string())
        );
    }

    #[test]
    fn write_failures_keep_gateway_message() {
        let err = ApiError::Http {
            status: 400,
            message: "Amount exceeds your credits".to_string(),
            body: Some(json!({"errors": [{"message": "Amount exceeds your credits"}]})),
        };
        assert_eq!(
            err.present(Operation::Write),
            Notice::Inline("Amount exceeds your credits".to_string())
        );
        assert_eq!(err.status(), Some(400));
        assert!(err.body().is_some());
    }
}
// endregion: --- Tests
