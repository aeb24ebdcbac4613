use crate::listings::model::{Counts, Listing, Media};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

// 프로필 모델
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    pub name: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub bio: Option<String>,
    #[serde(default)]
    pub avatar: Option<Media>,
    #[serde(default)]
    pub banner: Option<Media>,
    #[serde(default)]
    pub credits: Option<f64>,
    #[serde(default)]
    pub listings: Option<Vec<Listing>>,
    #[serde(default)]
    pub wins: Option<Vec<Listing>>,
    #[serde(default, rename = "_count")]
    pub count: Option<Counts>,
}

impl Profile {
    /// 낙찰 수 (_count 우선, 없으면 wins 길이)
    pub fn wins_count(&self) -> u64 {
        self.count
            .as_ref()
            .and_then(|c| c.wins)
            .or_else(|| self.wins.as_ref().map(|w| w.len() as u64))
            .unwrap_or_default()
    }

    /// 최신 등록 상품 n개
    pub fn latest_listings(&self, n: usize) -> Vec<&Listing> {
        let mut listings: Vec<&Listing> = self.listings.iter().flatten().collect();
        listings.sort_by(|a, b| b.created.cmp(&a.created));
        listings.truncate(n);
        listings
    }
}

// 프로필 조회 시 함께 받을 하위 리소스
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ProfileIncludes {
    pub listings: bool,
    pub wins: bool,
}

// 프로필 수정 명령
#[derive(Debug, Clone, Default)]
pub struct ProfileUpdate {
    pub avatar_url: Option<String>,
    pub banner_url: Option<String>,
    pub bio: Option<String>,
}

// 내 입찰 요약 (상품별 내 최고 입찰)
#[derive(Debug, Clone, PartialEq)]
pub struct MyBidSummary {
    pub listing: Listing,
    pub my_bid: f64,
    pub ended: bool,
    pub is_win: bool,
}

// 진행 중인 내 입찰
#[derive(Debug, Clone, PartialEq)]
pub struct ActiveBid {
    pub listing_id: String,
    pub title: String,
    pub ends_at: Option<DateTime<Utc>>,
    pub my_bid: f64,
    pub current_highest: f64,
    pub is_leading: bool,
}

// 낙찰 응답 항목은 {listing: {...}} 이거나 상품 자체
pub(crate) fn win_listing(entry: Value) -> Option<Listing> {
    let value = match entry {
        Value::Object(mut map) if map.get("listing").is_some_and(Value::is_object) => {
            map.remove("listing")?
        }
        other => other,
    };
    serde_json::from_value::<Listing>(value)
        .ok()
        .filter(|l| !l.id.is_empty())
}
