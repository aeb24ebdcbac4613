/// 입찰 커맨드 처리
/// 상품 화면마다 하나씩 두는 입찰 흐름.
/// Idle -> Validating -> Submitting -> {Success, Failed}
/// 결과 단계는 다음 제출 전까지 유지된다.
// region:    --- Imports
use super::aggregate::{highest_bid, is_active};
use crate::error::{ApiError, ValidationError};
use crate::gateway::{ApiRequest, Gateway};
use crate::listings::fetcher::{ListingFetcher, ListingIncludes, LISTINGS};
use crate::listings::model::Listing;
use chrono::{DateTime, Utc};
use serde_json::{json, Value};
use std::sync::{Arc, Mutex};
use tracing::{info, warn};

// endregion: --- Imports

// region:    --- Commands
/// 입찰 명령
#[derive(Debug, Clone, PartialEq)]
pub struct PlaceBidCommand {
    pub listing_id: String,
    pub amount: f64,
}

impl PlaceBidCommand {
    fn payload(&self) -> Value {
        // 정수 금액은 정수로 전송
        if self.amount.fract() == 0.0 && self.amount.abs() < i64::MAX as f64 {
            json!({ "amount": self.amount as i64 })
        } else {
            json!({ "amount": self.amount })
        }
    }
}

/// 입찰 성공 결과
#[derive(Debug, Clone)]
pub struct BidPlaced {
    pub amount: f64,
    /// 입찰 후 다시 조회한 상품 (재조회 실패 시 None)
    pub listing: Option<Listing>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BidPhase {
    Idle,
    Validating,
    Submitting,
    Success,
    Failed,
}

/// 폼 입력값을 금액으로 변환
pub fn parse_amount(raw: &str) -> Result<f64, ValidationError> {
    let amount: f64 = raw
        .trim()
        .parse()
        .map_err(|_| ValidationError::InvalidAmount)?;
    if !amount.is_finite() || amount <= 0.0 {
        return Err(ValidationError::InvalidAmount);
    }
    Ok(amount)
}

/// 로컬 검증 (인증 확인 이후 단계)
/// 최고가 비교는 편의용 검사일 뿐이며, 최종 판단은 원격 API가 한다.
pub fn validate_bid(
    listing: &Listing,
    amount: f64,
    viewer: Option<&str>,
    now: DateTime<Utc>,
) -> Result<(), ValidationError> {
    if !amount.is_finite() || amount <= 0.0 {
        return Err(ValidationError::InvalidAmount);
    }
    if !is_active(listing, now) {
        return Err(ValidationError::ListingEnded);
    }
    if let (Some(viewer), Some(seller)) = (viewer, listing.seller_name()) {
        if viewer == seller {
            return Err(ValidationError::OwnListing);
        }
    }
    let highest = highest_bid(listing);
    if amount <= highest {
        return Err(ValidationError::BidTooLow { amount, highest });
    }
    Ok(())
}

// endregion: --- Commands

// region:    --- Bid Submission
pub struct BidSubmission {
    gateway: Arc<Gateway>,
    fetcher: ListingFetcher,
    phase: Arc<Mutex<BidPhase>>,
}

/// 결과 없이 중단되면 (future drop) Idle로 복귀
struct PhaseGuard(Arc<Mutex<BidPhase>>);

impl PhaseGuard {
    fn set(&self, phase: BidPhase) {
        *self.0.lock().unwrap_or_else(|e| e.into_inner()) = phase;
    }
}

impl Drop for PhaseGuard {
    fn drop(&mut self) {
        let mut phase = self.0.lock().unwrap_or_else(|e| e.into_inner());
        if matches!(*phase, BidPhase::Validating | BidPhase::Submitting) {
            *phase = BidPhase::Idle;
        }
    }
}

impl BidSubmission {
    pub fn new(gateway: Arc<Gateway>) -> Self {
        Self {
            fetcher: ListingFetcher::new(gateway.clone()),
            gateway,
            phase: Arc::new(Mutex::new(BidPhase::Idle)),
        }
    }

    pub fn phase(&self) -> BidPhase {
        *self.phase.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// 진행 중이면 제출 버튼을 비활성화해야 한다
    pub fn is_busy(&self) -> bool {
        matches!(self.phase(), BidPhase::Validating | BidPhase::Submitting)
    }

    /// 입찰 제출
    pub async fn submit(&self, listing: &Listing, amount: f64) -> Result<BidPlaced, ApiError> {
        let guard = {
            let mut phase = self.phase.lock().unwrap_or_else(|e| e.into_inner());
            if matches!(*phase, BidPhase::Validating | BidPhase::Submitting) {
                info!("{:<12} --> 이미 입찰 진행 중: {}", "Bidding", listing.id);
                return Err(ValidationError::SubmissionInFlight.into());
            }
            *phase = BidPhase::Validating;
            PhaseGuard(self.phase.clone())
        };

        let result = self.run(listing, amount, &guard).await;
        match &result {
            Ok(_) => guard.set(BidPhase::Success),
            Err(e) => {
                info!("{:<12} --> 입찰 실패: {}", "Bidding", e);
                guard.set(BidPhase::Failed);
            }
        }
        result
    }

    async fn run(
        &self,
        listing: &Listing,
        amount: f64,
        guard: &PhaseGuard,
    ) -> Result<BidPlaced, ApiError> {
        let viewer = self.gateway.require_session()?;
        validate_bid(listing, amount, Some(&viewer.name), Utc::now())?;

        guard.set(BidPhase::Submitting);
        let cmd = PlaceBidCommand {
            listing_id: listing.id.clone(),
            amount,
        };
        info!("{:<12} --> 입찰 요청: {:?}", "Bidding", cmd);

        self.gateway.ensure_api_key().await;
        self.gateway
            .request(
                ApiRequest::post(LISTINGS, cmd.payload())
                    .segment(&cmd.listing_id)
                    .segment("bids"),
            )
            .await?;

        // 다른 사용자의 동시 입찰을 반영하기 위해 전체 재조회
        let refreshed = match self
            .fetcher
            .fetch_listing(&cmd.listing_id, ListingIncludes::ALL)
            .await
        {
            Ok(listing) => Some(listing),
            Err(e) => {
                warn!("{:<12} --> 입찰 후 재조회 실패: {}", "Bidding", e);
                None
            }
        };

        Ok(BidPlaced {
            amount,
            listing: refreshed,
        })
    }
}

// endregion: --- Bid Submission

// region:    --- Tests
#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn listing(ends_in_minutes: i64, amounts: &[i64]) -> Listing {
        let bids: Vec<_> = amounts.iter().map(|a| json!({"amount": a})).collect();
        let ends_at = Utc::now() + Duration::minutes(ends_in_minutes);
        serde_json::from_value(json!({
            "id": "l1",
            "title": "Lamp",
            "endsAt": ends_at.to_rfc3339(),
            "seller": {"name": "ola"},
            "bids": bids
        }))
        .unwrap()
    }

    #[test]
    fn parses_form_amounts() {
        assert_eq!(parse_amount(" 120 "), Ok(120.0));
        assert_eq!(parse_amount("abc"), Err(ValidationError::InvalidAmount));
        assert_eq!(parse_amount("0"), Err(ValidationError::InvalidAmount));
        assert_eq!(parse_amount("-5"), Err(ValidationError::InvalidAmount));
        assert_eq!(parse_amount("inf"), Err(ValidationError::InvalidAmount));
    }

    #[test]
    fn validation_order_matches_flow() {
        let now = Utc::now();
        let open = listing(60, &[100]);
        let ended = listing(-60, &[100]);

        assert_eq!(
            validate_bid(&ended, f64::NAN, Some("kari"), now),
            Err(ValidationError::InvalidAmount)
        );
        assert_eq!(
            validate_bid(&ended, 500.0, Some("kari"), now),
            Err(ValidationError::ListingEnded)
        );
        assert_eq!(
            validate_bid(&open, 500.0, Some("ola"), now),
            Err(ValidationError::OwnListing)
        );
        assert_eq!(
            validate_bid(&open, 100.0, Some("kari"), now),
            Err(ValidationError::BidTooLow {
                amount: 100.0,
                highest: 100.0
            })
        );
        assert_eq!(validate_bid(&open, 101.0, Some("kari"), now), Ok(()));
    }

    #[test]
    fn guard_keeps_outcome_but_resets_interrupted_phase() {
        let phase = Arc::new(Mutex::new(BidPhase::Idle));

        let guard = PhaseGuard(phase.clone());
        guard.set(BidPhase::Submitting);
        drop(guard);
        assert_eq!(*phase.lock().unwrap(), BidPhase::Idle);

        let guard = PhaseGuard(phase.clone());
        guard.set(BidPhase::Failed);
        drop(guard);
        assert_eq!(*phase.lock().unwrap(), BidPhase::Failed);
    }

    #[test]
    fn whole_amounts_are_sent_as_integers() {
        let cmd = PlaceBidCommand {
            listing_id: "l1".to_string(),
            amount: 120.0,
        };
        assert_eq!(cmd.payload(), json!({"amount": 120}));

        let cmd = PlaceBidCommand {
            listing_id: "l1".to_string(),
            amount: 12.5,
        };
        assert_eq!(cmd.payload(), json!({"amount": 12.5}));
    }
}
// endregion: --- Tests
