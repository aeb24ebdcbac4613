/// 입찰 집계
/// 렌더링마다 다시 계산하는 파생 값들. 저장하지 않는다.
// region:    --- Imports
use crate::listings::model::{Bid, Listing};
use chrono::{DateTime, Utc};
use std::cmp::Ordering;

// endregion: --- Imports

// region:    --- Aggregation
/// 현재 최고 입찰가
/// 입찰이 있으면 금액의 최댓값, 없으면 기본 가격, 그것도 없으면 0.
/// 응답 배열의 순서는 보장되지 않으므로 마지막 원소를 최고가로 쓰지 않는다.
pub fn highest_bid(listing: &Listing) -> f64 {
    let bids = listing.bid_list();
    if bids.is_empty() {
        return listing.price.unwrap_or(0.0);
    }
    bids.iter()
        .map(contribution)
        .fold(0.0, f64::max)
}

/// 진행 중 여부 (종료 시각이 없거나 기준 시각 이후)
pub fn is_active(listing: &Listing, now: DateTime<Utc>) -> bool {
    match listing.ends_at {
        Some(ends_at) => ends_at > now,
        None => true,
    }
}

/// 금액 내림차순 (같은 금액은 원래 순서 유지)
pub fn bids_descending(listing: &Listing) -> Vec<&Bid> {
    let mut bids: Vec<&Bid> = listing.bid_list().iter().collect();
    bids.sort_by(|a, b| compare_amount(contribution(b), contribution(a)));
    bids
}

/// 최고가 입찰자 이름
pub fn leading_bidder(listing: &Listing) -> Option<&str> {
    bids_descending(listing).first().and_then(|bid| bid.bidder())
}

/// 금액 비교 (NaN 없는 값 기준 전순서)
pub fn compare_amount(a: f64, b: f64) -> Ordering {
    a.total_cmp(&b)
}

fn contribution(bid: &Bid) -> f64 {
    if bid.amount.is_finite() {
        bid.amount
    } else {
        0.0
    }
}

// endregion: --- Aggregation

// region:    --- Bid Rows
/// 입찰 목록 한 줄
#[derive(Debug, Clone, PartialEq)]
pub struct BidRow {
    pub label: String,
    pub amount: f64,
    pub is_viewer: bool,
}

/// 입찰 목록 표시용 행
/// 로그아웃 상태에서는 입찰자 이름을 숨기고, 본인 입찰에는 "(you)"를 붙인다.
pub fn bid_rows(listing: &Listing, viewer: Option<&str>) -> Vec<BidRow> {
    bids_descending(listing)
        .into_iter()
        .map(|bid| {
            let name = bid.bidder();
            let is_viewer = matches!((viewer, name), (Some(v), Some(n)) if v == n);
            let label = match (viewer, name) {
                (None, _) | (_, None) => "Bidder".to_string(),
                (Some(_), Some(n)) if is_viewer => format!("{n} (you)"),
                (Some(_), Some(n)) => n.to_string(),
            };
            BidRow {
                label,
                amount: contribution(bid),
                is_viewer,
            }
        })
        .collect()
}

// endregion: --- Bid Rows

// endregion: --- Tests
