/// 경매 클라이언트
/// 게이트웨이, 세션, 조회/커맨드 핸들러를 한 곳에서 생성한다.
// region:    --- Imports
use crate::auth::AuthFlow;
use crate::bidding::BidSubmission;
use crate::config::ClientConfig;
use crate::error::ApiError;
use crate::gateway::{Gateway, ReqwestTransport, Transport};
use crate::listings::{Listing, ListingCommands, ListingFetcher, ListingQuery};
use crate::navigation::{LogNavigator, Navigator, View};
use crate::profile::{ProfileService, WinNotice, WinTracker};
use crate::scheduler::{PollHandle, Poller};
use crate::session::{FileStore, KeyValueStore, MemoryStore, SessionContext};
use std::sync::Arc;
use tracing::info;

// endregion: --- Imports

// region:    --- Client
/// 마감 임박 위젯 기본 개수
pub const ENDING_SOON_LIMIT: u32 = 4;

#[derive(Clone)]
pub struct AuctionClient {
    gateway: Arc<Gateway>,
}

impl AuctionClient {
    /// 설정에 세션 파일이 있으면 파일 저장소, 없으면 메모리 저장소 사용
    pub fn from_config(config: ClientConfig) -> Self {
        let store: Arc<dyn KeyValueStore> = match &config.session_file {
            Some(path) => Arc::new(FileStore::open(path)),
            None => Arc::new(MemoryStore::new()),
        };
        Self::new(config, store, Arc::new(LogNavigator))
    }

    pub fn new(
        config: ClientConfig,
        store: Arc<dyn KeyValueStore>,
        navigator: Arc<dyn Navigator>,
    ) -> Self {
        Self::with_transport(config, store, navigator, Arc::new(ReqwestTransport::new()))
    }

    pub fn with_transport(
        config: ClientConfig,
        store: Arc<dyn KeyValueStore>,
        navigator: Arc<dyn Navigator>,
        transport: Arc<dyn Transport>,
    ) -> Self {
        info!("{:<12} --> 클라이언트 생성: {}", "Client", config.api_base);
        let session = Arc::new(SessionContext::new(store));
        let gateway = Arc::new(Gateway::new(config, transport, session, navigator));
        Self { gateway }
    }

    pub fn gateway(&self) -> &Arc<Gateway> {
        &self.gateway
    }

    pub fn session(&self) -> &Arc<SessionContext> {
        self.gateway.session()
    }

    pub fn auth(&self) -> AuthFlow {
        AuthFlow::new(self.gateway.clone())
    }

    pub fn listings(&self) -> ListingFetcher {
        ListingFetcher::new(self.gateway.clone())
    }

    /// 설정된 페이지 크기를 쓰는 기본 목록 조회 조건
    pub fn listing_query(&self) -> ListingQuery {
        ListingQuery::default().limit(self.gateway.config().page_limit)
    }

    pub fn listing_commands(&self) -> ListingCommands {
        ListingCommands::new(self.gateway.clone())
    }

    pub fn profiles(&self) -> ProfileService {
        ProfileService::new(self.gateway.clone())
    }

    /// 상품 화면 하나당 입찰 흐름 하나
    pub fn bid_submission(&self) -> BidSubmission {
        BidSubmission::new(self.gateway.clone())
    }

    /// 마감 임박 위젯 폴링
    pub fn watch_ending_soon(&self) -> PollHandle<Vec<Listing>> {
        let fetcher = self.listings();
        Poller::new("EndingSoon", self.gateway.config().poll_interval).start(move || {
            let fetcher = fetcher.clone();
            async move { fetcher.ending_soon(ENDING_SOON_LIMIT).await }
        })
    }

    /// 새 낙찰 확인 폴링
    /// 틱마다 낙찰 수만 조회하고, 알림 판단은 반영된 최신 값으로만 한다.
    pub fn watch_wins(&self) -> WinWatch {
        let profiles = self.profiles();
        let gateway = self.gateway.clone();

        let handle = Poller::new("Wins", self.gateway.config().poll_interval).start(move || {
            let profiles = profiles.clone();
            let gateway = gateway.clone();
            async move {
                // 로그아웃 상태면 조회하지 않음
                let Some(user) = gateway.session().user() else {
                    return Ok(None);
                };
                gateway.ensure_api_key().await;
                let wins = profiles.wins_count(&user.name).await?;
                Ok::<_, ApiError>(Some(wins))
            }
        });

        WinWatch::new(
            handle,
            WinTracker::new(self.session().store().clone()),
            self.gateway.navigator().clone(),
        )
    }

    /// 현재 낙찰 수까지 확인 처리 후 내 낙찰 화면으로 이동
    pub async fn acknowledge_wins(&self) -> Result<u64, ApiError> {
        let user = self.gateway.require_session()?;
        self.gateway.ensure_api_key().await;
        let wins = self.profiles().wins_count(&user.name).await?;
        WinTracker::new(self.session().store().clone()).mark_seen(wins);
        self.gateway.navigator().navigate(View::MyWins);
        Ok(wins)
    }
}

// endregion: --- Client

// region:    --- Win Watch
/// 반영된 낙찰 수와 그때 발생한 알림
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WinUpdate {
    pub wins: u64,
    pub notice: Option<WinNotice>,
}

/// 낙찰 폴링 핸들
/// 폴러가 최신 토큰으로 반영한 값만 추적기에 전달하므로 늦게 도착한 응답이 기준값을 되돌리지 않는다.
pub struct WinWatch {
    handle: PollHandle<Option<u64>>,
    tracker: WinTracker,
    navigator: Arc<dyn Navigator>,
}

impl WinWatch {
    fn new(
        handle: PollHandle<Option<u64>>,
        tracker: WinTracker,
        navigator: Arc<dyn Navigator>,
    ) -> Self {
        Self {
            handle,
            tracker,
            navigator,
        }
    }

    /// 다음 낙찰 수 반영까지 대기 (취소되면 None)
    pub async fn changed(&mut self) -> Option<WinUpdate> {
        loop {
            let Some(wins) = self.handle.changed().await? else {
                continue;
            };
            let notice = self.tracker.observe(wins);
            return Some(WinUpdate { wins, notice });
        }
    }

    /// 마지막으로 반영된 낙찰 수까지 확인 처리 후 내 낙찰 화면으로 이동
    pub fn acknowledge(&self) {
        self.tracker.acknowledge();
        self.navigator.navigate(View::MyWins);
    }

    pub fn last_seen(&self) -> u64 {
        self.tracker.last_seen()
    }

    pub fn cancel(&self) {
        self.handle.cancel();
    }
}

// endregion: --- Win Watch

// region:    --- Tests
#[cfg(test)]
mod tests {
    use super::*;
    use crate::navigation::RecordingNavigator;
    use crate::session::{KeyValueStore, LAST_SEEN_WINS_KEY};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tokio::time::{timeout, Duration};

    /// 늦게 도착한 이전 틱의 낮은 낙찰 수가 같은 낙찰을 다시 알리게 하지 않음
    #[tokio::test]
    async fn late_tick_does_not_replay_win_notice() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let handle = Poller::new("Wins", Duration::from_millis(20)).start(move || {
            let n = counter.fetch_add(1, Ordering::SeqCst) + 1;
            async move {
                if n == 1 {
                    tokio::time::sleep(Duration::from_millis(120)).await;
                    return Ok::<_, ApiError>(Some(3));
                }
                Ok(Some(4))
            }
        });
        let store: Arc<dyn KeyValueStore> = Arc::new(MemoryStore::new());
        let navigator = Arc::new(RecordingNavigator::default());
        let mut watch = WinWatch::new(
            handle,
            WinTracker::new(store.clone()),
            navigator.clone(),
        );

        let mut seen = Vec::new();
        let mut notices = 0;
        while let Ok(Some(update)) = timeout(Duration::from_millis(300), watch.changed()).await {
            seen.push(update.wins);
            notices += usize::from(update.notice.is_some());
            if calls.load(Ordering::SeqCst) >= 10 {
                break;
            }
        }
        watch.cancel();

        assert!(!seen.contains(&3), "{seen:?}");
        assert_eq!(notices, 0);

        watch.acknowledge();
        assert_eq!(store.get(LAST_SEEN_WINS_KEY).as_deref(), Some("4"));
        assert_eq!(watch.last_seen(), 4);
        assert_eq!(navigator.last(), Some(View::MyWins));
    }

    #[test]
    fn listing_query_uses_configured_page_limit() {
        let mut config = ClientConfig::default();
        config.page_limit = 7;
        let client = AuctionClient::new(
            config,
            Arc::new(MemoryStore::new()),
            Arc::new(RecordingNavigator::default()),
        );
        let query = client.listing_query();
        assert_eq!(query.limit, 7);
        assert_eq!(query.page, 1);
    }
}
// endregion: --- Tests
