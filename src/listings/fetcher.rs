/// 상품 조회
/// 1. 목록 페이지 조회 (검색/태그/정렬/진행 중 필터)
/// 2. 단일 상품 조회
/// 3. 마감 임박 위젯
/// 4. 판매자 상품 목록
// region:    --- Imports
use super::model::{Listing, Page};
use super::query::{ListingQuery, SortField, SortOrder};
use crate::bidding::aggregate::{compare_amount, highest_bid, is_active};
use crate::error::ApiError;
use crate::gateway::{ApiRequest, Gateway};
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tracing::info;

// endregion: --- Imports

// region:    --- Includes
/// 단일 상품 조회 시 함께 받을 하위 리소스
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ListingIncludes {
    pub bids: bool,
    pub seller: bool,
}

impl ListingIncludes {
    pub const ALL: Self = Self {
        bids: true,
        seller: true,
    };

    pub const BIDS: Self = Self {
        bids: true,
        seller: false,
    };

    fn apply(self, mut request: ApiRequest) -> ApiRequest {
        if self.seller {
            request = request.query("_seller", "true");
        }
        if self.bids {
            request = request.query("_bids", "true");
        }
        request
    }
}

// endregion: --- Includes

// region:    --- Fetcher
#[derive(Clone)]
pub struct ListingFetcher {
    gateway: Arc<Gateway>,
}

impl ListingFetcher {
    pub fn new(gateway: Arc<Gateway>) -> Self {
        Self { gateway }
    }

    /// 목록 한 페이지 조회
    pub async fn fetch_page(&self, query: &ListingQuery) -> Result<Page<Listing>, ApiError> {
        info!(
            "{:<12} --> 상품 목록 조회 page: {} query: {:?}",
            "Listings", query.page, query.query
        );
        let mut page: Page<Listing> = self
            .gateway
            .get_page(query.to_request(), query.page)
            .await?;
        if let Some(order) = query.price_sort {
            sort_by_price(&mut page.items, order);
        }
        Ok(page)
    }

    /// 단일 상품 조회 (없으면 NotFound)
    pub async fn fetch_listing(
        &self,
        id: &str,
        includes: ListingIncludes,
    ) -> Result<Listing, ApiError> {
        info!("{:<12} --> 상품 조회 id: {}", "Listings", id);
        let request = includes.apply(ApiRequest::get(LISTINGS).segment(id));
        self.gateway.get_data(request).await
    }

    /// 마감 임박 상품
    /// 서버의 _active 필터와 별개로 이미 끝난 상품을 직접 걸러낸다.
    pub async fn ending_soon(&self, limit: u32) -> Result<Vec<Listing>, ApiError> {
        info!("{:<12} --> 마감 임박 상품 조회", "Listings");
        let query = ListingQuery::default()
            .page(1)
            .limit(limit)
            .active_only(true)
            .sort(SortField::EndsAt, SortOrder::Asc);
        let page = self.fetch_page(&query).await?;
        Ok(filter_ending_soon(page.items, Utc::now(), limit as usize))
    }

    /// 판매자 본인 상품 목록
    pub async fn seller_listings(&self, name: &str) -> Result<Vec<Listing>, ApiError> {
        info!("{:<12} --> 판매자 상품 조회: {}", "Listings", name);
        let request = ApiRequest::get(PROFILES)
            .segment(name)
            .segment("listings")
            .query("_bids", "true")
            .query("sort", SortField::Created.as_str())
            .query("sortOrder", SortOrder::Desc.as_str());
        self.gateway.get_data(request).await
    }
}

pub(crate) const LISTINGS: &str = "auction/listings";
pub(crate) const PROFILES: &str = "auction/profiles";

/// 최고 입찰가 기준 안정 정렬 (한 페이지 안에서만)
pub fn sort_by_price(listings: &mut [Listing], order: SortOrder) {
    listings.sort_by(|a, b| {
        let ordering = compare_amount(highest_bid(a), highest_bid(b));
        match order {
            SortOrder::Asc => ordering,
            SortOrder::Desc => ordering.reverse(),
        }
    });
}

/// 마감 임박 필터: 제목이 없거나 종료 시각이 없거나 이미 끝난 상품 제외
pub fn filter_ending_soon(listings: Vec<Listing>, now: DateTime<Utc>, limit: usize) -> Vec<Listing> {
    let mut candidates: Vec<Listing> = listings
        .into_iter()
        .filter(|l| !l.title.trim().is_empty())
        .filter(|l| l.ends_at.is_some() && is_active(l, now))
        .collect();
    candidates.sort_by_key(|l| l.ends_at);
    candidates.truncate(limit);
    candidates
}

// endregion: --- Fetcher

// region:    --- Feed Cursor
/// "더 보기" 페이지 커서
#[derive(Debug, Clone)]
pub struct FeedCursor {
    query: ListingQuery,
    page: u32,
    exhausted: bool,
}

impl FeedCursor {
    pub fn new(query: ListingQuery) -> Self {
        Self {
            page: query.page,
            query,
            exhausted: false,
        }
    }

    pub fn page(&self) -> u32 {
        self.page
    }

    /// 마지막으로 받은 페이지가 끝이 아니면 true
    pub fn has_more(&self) -> bool {
        !self.exhausted
    }

    /// 조건을 바꾸고 첫 페이지부터 다시 조회
    pub async fn reset(
        &mut self,
        fetcher: &ListingFetcher,
        query: ListingQuery,
    ) -> Result<Page<Listing>, ApiError> {
        self.query = query;
        self.page = 1;
        self.exhausted = false;
        let page = fetcher.fetch_page(&self.query.clone().page(1)).await?;
        self.exhausted = page.is_last();
        Ok(page)
    }

    /// 다음 페이지 조회 (마지막 페이지면 None)
    pub async fn next(&mut self, fetcher: &ListingFetcher) -> Result<Option<Page<Listing>>, ApiError> {
        if !self.has_more() {
            return Ok(None);
        }
        let next = self.page + 1;
        let page = fetcher.fetch_page(&self.query.clone().page(next)).await?;
        self.page = next;
        self.exhausted = page.is_last();
        Ok(Some(page))
    }
}

// endregion: --- Feed Cursor

// region:    --- Tests
#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use serde_json::json;

    fn listing(id: &str, amounts: &[i64]) -> Listing {
        let bids: Vec<_> = amounts.iter().map(|a| json!({"amount": a})).collect();
        serde_json::from_value(json!({"id": id, "title": id, "bids": bids})).unwrap()
    }

    #[test]
    fn price_sort_is_stable_and_uses_true_maximum() {
        let mut items = vec![
            listing("a", &[100, 5]),
            listing("b", &[20]),
            listing("c", &[5, 100]),
            listing("d", &[]),
        ];
        sort_by_price(&mut items, SortOrder::Desc);
        let ids: Vec<_> = items.iter().map(|l| l.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "c", "b", "d"]);

        sort_by_price(&mut items, SortOrder::Asc);
        let ids: Vec<_> = items.iter().map(|l| l.id.as_str()).collect();
        assert_eq!(ids, vec!["d", "b", "a", "c"]);
    }

    #[test]
    fn ending_soon_drops_past_and_untitled() {
        let now = Utc::now();
        let mk = |id: &str, title: &str, ends: Option<DateTime<Utc>>| {
            let mut l = listing(id, &[]);
            l.title = title.to_string();
            l.ends_at = ends;
            l
        };
        let items = vec![
            mk("past", "Old", Some(now - Duration::hours(1))),
            mk("later", "Later", Some(now + Duration::hours(5))),
            mk("untitled", "", Some(now + Duration::hours(1))),
            mk("open", "No end", None),
            mk("soon", "Soon", Some(now + Duration::minutes(10))),
        ];

        let ids: Vec<_> = filter_ending_soon(items, now, 4)
            .into_iter()
            .map(|l| l.id)
            .collect();
        assert_eq!(ids, vec!["soon", "later"]);
    }
}
// endregion: --- Tests
