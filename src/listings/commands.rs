/// 상품 관련 커맨드 처리
/// 1. 상품 등록
/// 2. 상품 수정
/// 3. 상품 삭제
// region:    --- Imports
use super::fetcher::LISTINGS;
use super::model::{Listing, Media};
use crate::error::{ApiError, ValidationError};
use crate::gateway::{ApiRequest, Gateway};
use crate::navigation::View;
use chrono::{DateTime, Utc};
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::info;

// endregion: --- Imports

// region:    --- Commands
/// 상품 등록 명령
#[derive(Debug, Clone, Default)]
pub struct NewListing {
    pub title: String,
    pub description: Option<String>,
    pub tags: Vec<String>,
    pub media_url: Option<String>,
    pub ends_at: Option<DateTime<Utc>>,
}

/// 상품 수정 명령
#[derive(Debug, Clone, Default)]
pub struct ListingUpdate {
    pub title: String,
    pub description: Option<String>,
    pub media_url: Option<String>,
    pub ends_at: Option<DateTime<Utc>>,
}

impl NewListing {
    pub fn validate(&self, now: DateTime<Utc>) -> Result<(), ValidationError> {
        validate_title(&self.title)?;
        match self.ends_at {
            Some(ends_at) if ends_at > now => {}
            _ => return Err(ValidationError::InvalidEndDate),
        }
        validate_media(self.media_url.as_deref())
    }

    fn payload(&self) -> Value {
        let title = self.title.trim();
        json!({
            "title": title,
            "description": self.description.as_deref().map(str::trim).unwrap_or_default(),
            "tags": self.tags,
            "endsAt": self.ends_at,
            "media": media_payload(self.media_url.as_deref(), title),
        })
    }
}

impl ListingUpdate {
    pub fn validate(&self) -> Result<(), ValidationError> {
        validate_title(&self.title)?;
        validate_media(self.media_url.as_deref())
    }

    fn payload(&self) -> Value {
        let title = self.title.trim();
        let mut body = json!({
            "title": title,
            "description": self.description.as_deref().map(str::trim).unwrap_or_default(),
            "media": media_payload(self.media_url.as_deref(), title),
        });
        if let Some(ends_at) = self.ends_at {
            body["endsAt"] = json!(ends_at);
        }
        body
    }
}

fn validate_title(title: &str) -> Result<(), ValidationError> {
    if title.trim().is_empty() {
        return Err(ValidationError::MissingField("Title"));
    }
    Ok(())
}

// base64 data URL은 허용하지 않음
fn validate_media(url: Option<&str>) -> Result<(), ValidationError> {
    match url.map(str::trim) {
        Some(url)
            if url
                .get(..5)
                .is_some_and(|scheme| scheme.eq_ignore_ascii_case("data:")) =>
        {
            Err(ValidationError::InvalidMediaUrl)
        }
        _ => Ok(()),
    }
}

fn media_payload(url: Option<&str>, title: &str) -> Vec<Media> {
    url.map(str::trim)
        .filter(|u| !u.is_empty())
        .map(|u| Media {
            url: u.to_string(),
            alt: Some(if title.is_empty() {
                "Listing image".to_string()
            } else {
                title.to_string()
            }),
        })
        .into_iter()
        .collect()
}

/// 입찰이 있는 상품은 수정/삭제 불가
pub fn guard_editable(listing: &Listing) -> Result<(), ValidationError> {
    if listing.has_bids() {
        return Err(ValidationError::ListingHasBids);
    }
    Ok(())
}

// endregion: --- Commands

// region:    --- Command Handlers
#[derive(Clone)]
pub struct ListingCommands {
    gateway: Arc<Gateway>,
}

impl ListingCommands {
    pub fn new(gateway: Arc<Gateway>) -> Self {
        Self { gateway }
    }

    /// 1. 상품 등록
    pub async fn create_listing(&self, cmd: NewListing) -> Result<Listing, ApiError> {
        self.gateway.require_session()?;
        cmd.validate(Utc::now())?;
        info!("{:<12} --> 상품 등록: {}", "Command", cmd.title);

        self.gateway.ensure_api_key().await;
        let created: Listing = self
            .gateway
            .send_data(ApiRequest::post(LISTINGS, cmd.payload()))
            .await?;
        self.gateway.navigator().navigate(View::MyListings);
        Ok(created)
    }

    /// 2. 상품 수정
    pub async fn update_listing(
        &self,
        listing: &Listing,
        cmd: ListingUpdate,
    ) -> Result<Listing, ApiError> {
        self.gateway.require_session()?;
        guard_editable(listing)?;
        cmd.validate()?;
        info!("{:<12} --> 상품 수정 id: {}", "Command", listing.id);

        self.gateway.ensure_api_key().await;
        let updated: Listing = self
            .gateway
            .send_data(ApiRequest::put(LISTINGS, cmd.payload()).segment(&listing.id))
            .await?;
        self.gateway.navigator().navigate(View::MyListings);
        Ok(updated)
    }

    /// 3. 상품 삭제
    pub async fn delete_listing(&self, listing: &Listing) -> Result<(), ApiError> {
        self.gateway.require_session()?;
        guard_editable(listing)?;
        info!("{:<12} --> 상품 삭제 id: {}", "Command", listing.id);

        self.gateway.ensure_api_key().await;
        self.gateway
            .request(ApiRequest::delete(LISTINGS).segment(&listing.id))
            .await?;
        Ok(())
    }
}

// endregion: --- Command Handlers

// region:    --- Tests
#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn new_listing_requires_title_and_future_end() {
        let now = Utc::now();
        let mut cmd = NewListing {
            title: "  ".to_string(),
            ends_at: Some(now + Duration::days(1)),
            ..Default::default()
        };
        assert_eq!(cmd.validate(now), Err(ValidationError::MissingField("Title")));

        cmd.title = "Lamp".to_string();
        assert_eq!(cmd.validate(now), Ok(()));

        cmd.ends_at = Some(now - Duration::minutes(1));
        assert_eq!(cmd.validate(now), Err(ValidationError::InvalidEndDate));

        cmd.ends_at = None;
        assert_eq!(cmd.validate(now), Err(ValidationError::InvalidEndDate));
    }

    #[test]
    fn data_urls_are_rejected() {
        let cmd = ListingUpdate {
            title: "Lamp".to_string(),
            media_url: Some("DATA:image/png;base64,AAAA".to_string()),
            ..Default::default()
        };
        assert_eq!(cmd.validate(), Err(ValidationError::InvalidMediaUrl));
    }

    /// 다섯 번째 바이트가 문자 중간에 걸리는 URL
    #[test]
    fn non_ascii_media_urls_are_accepted() {
        for url in ["aaaañ.png", "ñ", "https://img/ñandú.png", "데이터:x"] {
            let cmd = ListingUpdate {
                title: "Lamp".to_string(),
                media_url: Some(url.to_string()),
                ..Default::default()
            };
            assert_eq!(cmd.validate(), Ok(()), "{url}");
        }
    }

    #[test]
    fn payload_uses_title_as_alt_text() {
        let cmd = NewListing {
            title: "Lamp".to_string(),
            media_url: Some("https://img/lamp.png".to_string()),
            ends_at: Some(Utc::now() + Duration::days(1)),
            ..Default::default()
        };
        let body = cmd.payload();
        assert_eq!(body["media"][0]["alt"], "Lamp");
        assert_eq!(body["media"][0]["url"], "https://img/lamp.png");

        let bare = NewListing {
            title: "Lamp".to_string(),
            ..Default::default()
        };
        assert_eq!(bare.payload()["media"], json!([]));
    }

    #[test]
    fn listings_with_bids_are_locked() {
        let listing: Listing = serde_json::from_value(json!({
            "id": "1",
            "bids": [{"amount": 5}]
        }))
        .unwrap();
        assert_eq!(guard_editable(&listing), Err(ValidationError::ListingHasBids));
    }
}
// endregion: --- Tests
