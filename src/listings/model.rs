use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

// 미디어 (이미지 URL + 대체 텍스트)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Media {
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alt: Option<String>,
}

// 판매자 / 입찰자 요약
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProfileRef {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar: Option<Media>,
}

// 집계 카운트
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Counts {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bids: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wins: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub listings: Option<u64>,
}

// 상품 모델
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Listing {
    pub id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default, deserialize_with = "lenient_media")]
    pub media: Vec<Media>,
    #[serde(default, deserialize_with = "lenient_datetime")]
    pub created: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "lenient_datetime")]
    pub updated: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "lenient_datetime")]
    pub ends_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub seller: Option<ProfileRef>,
    #[serde(default)]
    pub bids: Option<Vec<Bid>>,
    #[serde(default, deserialize_with = "lenient_price")]
    pub price: Option<f64>,
    #[serde(default, rename = "_count")]
    pub count: Option<Counts>,
}

impl Listing {
    /// 내장된 입찰 목록 (없으면 빈 슬라이스)
    pub fn bid_list(&self) -> &[Bid] {
        self.bids.as_deref().unwrap_or(&[])
    }

    /// 입찰 수 (내장 목록 우선, 없으면 _count)
    pub fn bid_count(&self) -> usize {
        match &self.bids {
            Some(bids) => bids.len(),
            None => self
                .count
                .as_ref()
                .and_then(|c| c.bids)
                .unwrap_or_default() as usize,
        }
    }

    pub fn has_bids(&self) -> bool {
        self.bid_count() > 0
    }

    pub fn seller_name(&self) -> Option<&str> {
        self.seller.as_ref().map(|s| s.name.as_str())
    }

    pub fn cover(&self) -> Option<&Media> {
        self.media.first()
    }
}

// 입찰 모델
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Bid {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default, deserialize_with = "lenient_amount")]
    pub amount: f64,
    #[serde(default, deserialize_with = "lenient_datetime")]
    pub created: Option<DateTime<Utc>>,
    #[serde(default)]
    pub bidder: Option<ProfileRef>,
    #[serde(default)]
    pub bidder_name: Option<String>,
    #[serde(default)]
    pub listing: Option<Box<Listing>>,
}

impl Bid {
    pub fn bidder(&self) -> Option<&str> {
        self.bidder_name
            .as_deref()
            .or_else(|| self.bidder.as_ref().map(|b| b.name.as_str()))
    }
}

// 페이지 메타데이터
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Meta {
    #[serde(default)]
    pub is_first_page: Option<bool>,
    #[serde(default)]
    pub is_last_page: Option<bool>,
    #[serde(default)]
    pub current_page: Option<u32>,
    #[serde(default)]
    pub previous_page: Option<u32>,
    #[serde(default)]
    pub next_page: Option<u32>,
    #[serde(default)]
    pub page_count: Option<u32>,
    #[serde(default)]
    pub total_count: Option<u64>,
}

// 성공 응답 봉투
#[derive(Debug, Clone, Deserialize)]
pub struct Envelope<T> {
    pub data: T,
    #[serde(default)]
    pub meta: Option<Meta>,
}

// 목록 한 페이지
#[derive(Debug, Clone, PartialEq)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub current_page: u32,
    pub page_count: Option<u32>,
    pub is_last_page: Option<bool>,
}

impl<T> Page<T> {
    /// 마지막 페이지 여부 (빈 페이지도 마지막으로 취급)
    pub fn is_last(&self) -> bool {
        if self.items.is_empty() || self.is_last_page == Some(true) {
            return true;
        }
        matches!(self.page_count, Some(count) if self.current_page >= count)
    }
}

// 숫자가 아닌 금액은 0으로 취급
fn lenient_amount<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
    let value = Value::deserialize(deserializer)?;
    Ok(value.as_f64().filter(|n| n.is_finite()).unwrap_or(0.0))
}

fn lenient_price<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<f64>, D::Error> {
    let value = Value::deserialize(deserializer)?;
    Ok(value.as_f64().filter(|n| n.is_finite()))
}

// 잘못된 날짜는 "없음"으로 취급
fn lenient_datetime<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Option<DateTime<Utc>>, D::Error> {
    let value = Value::deserialize(deserializer)?;
    Ok(value
        .as_str()
        .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
        .map(|d| d.with_timezone(&Utc)))
}

fn lenient_media<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<Media>, D::Error> {
    let value = Value::deserialize(deserializer)?;
    let Value::Array(entries) = value else {
        return Ok(Vec::new());
    };
    Ok(entries
        .into_iter()
        .filter_map(|entry| serde_json::from_value(entry).ok())
        .collect())
}
