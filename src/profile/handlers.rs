/// 프로필 관련 조회/수정
/// 1. 프로필 조회, 수정
/// 2. 입찰/낙찰 이력
/// 3. 내 입찰 요약, 진행 중 입찰, 내 낙찰 목록
// region:    --- Imports
use super::model::{win_listing, ActiveBid, MyBidSummary, Profile, ProfileIncludes, ProfileUpdate};
use crate::bidding::aggregate::{highest_bid, is_active};
use crate::error::{ApiError, ValidationError};
use crate::gateway::{ApiRequest, Gateway};
use crate::navigation::View;
use crate::listings::fetcher::{ListingFetcher, ListingIncludes, PROFILES};
use crate::listings::model::{Bid, Listing, Media};
use chrono::{DateTime, Utc};
use futures::future::join_all;
use serde_json::{Map, Value};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tracing::{info, warn};

// endregion: --- Imports

// region:    --- Profile Service
#[derive(Clone)]
pub struct ProfileService {
    gateway: Arc<Gateway>,
    fetcher: ListingFetcher,
}

impl ProfileService {
    pub fn new(gateway: Arc<Gateway>) -> Self {
        Self {
            fetcher: ListingFetcher::new(gateway.clone()),
            gateway,
        }
    }

    /// 프로필 조회
    pub async fn fetch_profile(
        &self,
        name: &str,
        includes: ProfileIncludes,
    ) -> Result<Profile, ApiError> {
        info!("{:<12} --> 프로필 조회: {}", "Profile", name);
        let mut request = ApiRequest::get(PROFILES).segment(name);
        if includes.listings {
            request = request.query("_listings", "true");
        }
        if includes.wins {
            request = request.query("_wins", "true");
        }
        self.gateway.get_data(request).await
    }

    /// 입찰 이력 (최신순, 상품 포함)
    pub async fn profile_bids(&self, name: &str) -> Result<Vec<Bid>, ApiError> {
        info!("{:<12} --> 입찰 이력 조회: {}", "Profile", name);
        let request = ApiRequest::get(PROFILES)
            .segment(name)
            .segment("bids")
            .query("_listings", "true")
            .query("sort", "created")
            .query("sortOrder", "desc");
        self.gateway.get_data(request).await
    }

    /// 낙찰 이력
    pub async fn profile_wins(&self, name: &str) -> Result<Vec<Listing>, ApiError> {
        info!("{:<12} --> 낙찰 이력 조회: {}", "Profile", name);
        let request =
            ApiRequest::get(PROFILES)
                .segment(name)
                .segment("wins")
                .query("_listings", "true");
        let entries: Vec<Value> = self.gateway.get_data(request).await?;
        Ok(entries.into_iter().filter_map(win_listing).collect())
    }

    /// 낙찰 수
    pub async fn wins_count(&self, name: &str) -> Result<u64, ApiError> {
        let profile = self
            .fetch_profile(
                name,
                ProfileIncludes {
                    listings: false,
                    wins: true,
                },
            )
            .await?;
        Ok(profile.wins_count())
    }

    /// 내 프로필 수정
    pub async fn update_profile(&self, update: ProfileUpdate) -> Result<Profile, ApiError> {
        let user = self.gateway.require_session()?;
        let body = update_body(&user.name, &update)?;
        info!("{:<12} --> 프로필 수정: {}", "Profile", user.name);

        self.gateway.ensure_api_key().await;
        let profile: Profile = self
            .gateway
            .send_data(ApiRequest::put(PROFILES, body).segment(&user.name))
            .await?;
        self.gateway.navigator().navigate(View::Profile);
        Ok(profile)
    }

    /// 내 입찰 요약
    /// 상품별 내 최고 입찰을 모으고 상품을 다시 조회해 종료/낙찰 여부를 붙인다.
    pub async fn my_bids(&self) -> Result<Vec<MyBidSummary>, ApiError> {
        let user = self.gateway.require_session()?;
        self.gateway.ensure_api_key().await;

        let (bids, wins) = tokio::join!(
            self.profile_bids(&user.name),
            self.profile_wins(&user.name)
        );
        let bids = bids?;
        // 낙찰 조회 실패는 낙찰 없음으로 취급
        let wins = wins.unwrap_or_else(|e| {
            warn!("{:<12} --> 낙찰 이력 조회 실패: {}", "Profile", e);
            Vec::new()
        });
        let win_ids: HashSet<String> = wins.into_iter().map(|l| l.id).collect();

        let grouped = group_my_bids(bids);
        let detailed = join_all(grouped.iter().map(|(listing, _)| {
            self.fetcher.fetch_listing(&listing.id, ListingIncludes::ALL)
        }))
        .await;

        let now = Utc::now();
        Ok(grouped
            .into_iter()
            .zip(detailed)
            .map(|((embedded, my_bid), fetched)| {
                let listing = fetched.unwrap_or(embedded);
                let ended = !is_active(&listing, now);
                let is_win = ended && win_ids.contains(&listing.id);
                MyBidSummary {
                    listing,
                    my_bid,
                    ended,
                    is_win,
                }
            })
            .collect())
    }

    /// 진행 중인 상품에 대한 내 입찰 (마감 순)
    pub async fn active_bids(&self) -> Result<Vec<ActiveBid>, ApiError> {
        let user = self.gateway.require_session()?;
        self.gateway.ensure_api_key().await;

        let bids = self.profile_bids(&user.name).await?;
        let items = active_bid_items(bids, Utc::now());

        let detailed = join_all(
            items
                .iter()
                .map(|(listing, _)| self.fetcher.fetch_listing(&listing.id, ListingIncludes::BIDS)),
        )
        .await;

        Ok(items
            .into_iter()
            .zip(detailed)
            .map(|((listing, my_bid), fetched)| {
                let current_highest = fetched.map(|l| highest_bid(&l)).unwrap_or(0.0);
                ActiveBid {
                    listing_id: listing.id,
                    title: listing.title,
                    ends_at: listing.ends_at,
                    my_bid,
                    current_highest,
                    is_leading: is_leading(my_bid, current_highest),
                }
            })
            .collect())
    }

    /// 내 낙찰 목록 (재조회 실패한 항목은 제외)
    pub async fn my_wins(&self) -> Result<Vec<Listing>, ApiError> {
        let user = self.gateway.require_session()?;
        self.gateway.ensure_api_key().await;

        let wins = self.profile_wins(&user.name).await?;
        let fetched = join_all(
            wins.iter()
                .map(|l| self.fetcher.fetch_listing(&l.id, ListingIncludes::ALL)),
        )
        .await;

        Ok(fetched
            .into_iter()
            .filter_map(|result| match result {
                Ok(listing) => Some(listing),
                Err(e) => {
                    warn!("{:<12} --> 낙찰 상품 재조회 실패: {}", "Profile", e);
                    None
                }
            })
            .collect())
    }
}

// endregion: --- Profile Service

// region:    --- Derivations
/// 프로필 수정 바디 (비어 있으면 NOTHING_TO_UPDATE)
pub fn update_body(name: &str, update: &ProfileUpdate) -> Result<Value, ValidationError> {
    let non_empty = |v: &Option<String>| {
        v.as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
    };

    let mut body = Map::new();
    if let Some(url) = non_empty(&update.avatar_url) {
        body.insert(
            "avatar".to_string(),
            serde_json::to_value(Media {
                url,
                alt: Some(format!("{name} avatar")),
            })
            .unwrap_or_default(),
        );
    }
    if let Some(url) = non_empty(&update.banner_url) {
        body.insert(
            "banner".to_string(),
            serde_json::to_value(Media {
                url,
                alt: Some(format!("{name} banner")),
            })
            .unwrap_or_default(),
        );
    }
    if let Some(bio) = non_empty(&update.bio) {
        body.insert("bio".to_string(), Value::String(bio));
    }

    if body.is_empty() {
        return Err(ValidationError::NothingToUpdate);
    }
    Ok(Value::Object(body))
}

/// 상품별 내 최고 입찰 (처음 등장한 순서 유지)
pub fn group_my_bids(bids: Vec<Bid>) -> Vec<(Listing, f64)> {
    let mut order: Vec<(Listing, f64)> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();

    for bid in bids {
        let Some(listing) = bid.listing else { continue };
        if listing.id.is_empty() {
            continue;
        }
        match index.get(&listing.id) {
            Some(&i) => {
                if bid.amount > order[i].1 {
                    order[i].1 = bid.amount;
                }
            }
            None => {
                index.insert(listing.id.clone(), order.len());
                order.push((*listing, bid.amount));
            }
        }
    }
    order
}

/// 진행 중인 상품만 남기고 마감 순 정렬 (마감 시각 없는 상품은 뒤로)
pub fn active_bid_items(bids: Vec<Bid>, now: DateTime<Utc>) -> Vec<(Listing, f64)> {
    let mut items: Vec<(Listing, f64)> = group_my_bids(bids)
        .into_iter()
        .filter(|(listing, _)| is_active(listing, now))
        .collect();
    items.sort_by_key(|(listing, _)| (listing.ends_at.is_none(), listing.ends_at));
    items
}

pub fn is_leading(my_bid: f64, current_highest: f64) -> bool {
    current_highest > 0.0 && my_bid >= current_highest
}

// endregion: --- Derivations

// endregion: --- Tests
