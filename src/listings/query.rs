/// 상품 목록 조회 조건
// region:    --- Imports
use crate::config::DEFAULT_PAGE_LIMIT;
use crate::gateway::ApiRequest;

// endregion: --- Imports

// region:    --- Sort
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortField {
    Created,
    EndsAt,
}

impl SortField {
    pub fn as_str(&self) -> &'static str {
        match self {
            SortField::Created => "created",
            SortField::EndsAt => "endsAt",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    Asc,
    Desc,
}

impl SortOrder {
    pub fn as_str(&self) -> &'static str {
        match self {
            SortOrder::Asc => "asc",
            SortOrder::Desc => "desc",
        }
    }
}

/// 화면의 정렬 선택지
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortPreset {
    #[default]
    Newest,
    Oldest,
    EndingSoon,
    EndingLast,
    PriceHigh,
    PriceLow,
}

impl SortPreset {
    /// 알 수 없는 값은 Newest
    pub fn parse(raw: &str) -> Self {
        match raw {
            "oldest" => SortPreset::Oldest,
            "endingSoon" => SortPreset::EndingSoon,
            "endingLast" => SortPreset::EndingLast,
            "priceHigh" => SortPreset::PriceHigh,
            "priceLow" => SortPreset::PriceLow,
            _ => SortPreset::Newest,
        }
    }
}

// endregion: --- Sort

// region:    --- Query
/// 가격 정렬(`price_sort`)은 원격 API가 지원하지 않아 받아온 한 페이지 안에서만 정렬한다.
/// 여러 페이지에 걸친 전체 순서는 보장하지 않는다.
#[derive(Debug, Clone, PartialEq)]
pub struct ListingQuery {
    pub page: u32,
    pub limit: u32,
    pub query: String,
    pub tag: String,
    pub active_only: bool,
    pub sort_field: SortField,
    pub sort_order: SortOrder,
    pub price_sort: Option<SortOrder>,
    pub include_bids: bool,
    pub include_seller: bool,
}

impl Default for ListingQuery {
    fn default() -> Self {
        Self {
            page: 1,
            limit: DEFAULT_PAGE_LIMIT,
            query: String::new(),
            tag: String::new(),
            active_only: true,
            sort_field: SortField::Created,
            sort_order: SortOrder::Desc,
            price_sort: None,
            include_bids: true,
            include_seller: true,
        }
    }
}

impl ListingQuery {
    pub fn page(mut self, page: u32) -> Self {
        self.page = page.max(1);
        self
    }

    pub fn limit(mut self, limit: u32) -> Self {
        self.limit = limit;
        self
    }

    pub fn search(mut self, query: impl Into<String>) -> Self {
        self.query = query.into();
        self
    }

    pub fn tag(mut self, tag: impl Into<String>) -> Self {
        self.tag = tag.into();
        self
    }

    pub fn active_only(mut self, active_only: bool) -> Self {
        self.active_only = active_only;
        self
    }

    pub fn sort(mut self, field: SortField, order: SortOrder) -> Self {
        self.sort_field = field;
        self.sort_order = order;
        self.price_sort = None;
        self
    }

    /// 화면 정렬 선택지를 조회 조건으로 변환
    pub fn preset(mut self, preset: SortPreset) -> Self {
        let (field, order, price) = match preset {
            SortPreset::Newest => (SortField::Created, SortOrder::Desc, None),
            SortPreset::Oldest => (SortField::Created, SortOrder::Asc, None),
            SortPreset::EndingSoon => (SortField::EndsAt, SortOrder::Asc, None),
            SortPreset::EndingLast => (SortField::EndsAt, SortOrder::Desc, None),
            SortPreset::PriceHigh => (SortField::Created, SortOrder::Desc, Some(SortOrder::Desc)),
            SortPreset::PriceLow => (SortField::Created, SortOrder::Desc, Some(SortOrder::Asc)),
        };
        self.sort_field = field;
        self.sort_order = order;
        self.price_sort = price;
        self
    }

    pub fn price_sort(mut self, order: SortOrder) -> Self {
        self.price_sort = Some(order);
        self
    }

    pub fn includes(mut self, bids: bool, seller: bool) -> Self {
        self.include_bids = bids;
        self.include_seller = seller;
        self
    }

    pub fn is_search(&self) -> bool {
        !self.query.trim().is_empty()
    }

    /// 요청 생성
    /// 가격 정렬이면 서버에는 기본 정렬(created desc)로 요청한다.
    pub fn to_request(&self) -> ApiRequest {
        let target = if self.is_search() {
            "auction/listings/search"
        } else {
            "auction/listings"
        };

        let (field, order) = match self.price_sort {
            Some(_) => (SortField::Created, SortOrder::Desc),
            None => (self.sort_field, self.sort_order),
        };

        let mut request = ApiRequest::get(target)
            .query("page", self.page)
            .query("limit", self.limit)
            .query("sort", field.as_str())
            .query("sortOrder", order.as_str());

        if self.include_seller {
            request = request.query("_seller", "true");
        }
        if self.include_bids {
            request = request.query("_bids", "true");
        }
        if self.is_search() {
            request = request.query("q", self.query.trim());
        }
        if !self.tag.trim().is_empty() {
            request = request.query("_tag", self.tag.trim());
        }
        if self.active_only {
            request = request.query("_active", "true");
        }
        request
    }
}

// endregion: --- Query

// endregion: --- Tests
