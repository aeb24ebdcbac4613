/// 주기적 재조회 스케줄러
/// 마감 임박 위젯, 새 낙찰 확인 등 읽기 위주 화면을 일정 간격으로 다시 불러온다.
/// 틱마다 독립된 요청을 보내므로 느린 요청이 다음 틱과 겹칠 수 있다.
/// 요청마다 단조 증가 토큰을 붙이고, 더 최신 토큰의 결과만 반영한다.
// region:    --- Imports
use crate::error::ApiError;
use std::future::Future;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{interval, Duration, MissedTickBehavior};
use tracing::{debug, error, warn};

// endregion: --- Imports

// region:    --- Poller
/// 0 간격 대신 사용하는 최소 간격
pub const MIN_PERIOD: Duration = Duration::from_secs(1);

pub struct Poller {
    name: &'static str,
    period: Duration,
}

impl Poller {
    pub fn new(name: &'static str, period: Duration) -> Self {
        let period = if period.is_zero() {
            warn!(
                "{:<12} --> {} 폴링 간격이 0, {:?}로 대체",
                "Scheduler", name, MIN_PERIOD
            );
            MIN_PERIOD
        } else {
            period
        };
        Self { name, period }
    }

    pub fn period(&self) -> Duration {
        self.period
    }

    /// 폴링 시작
    pub fn start<T, F, Fut>(&self, fetch: F) -> PollHandle<T>
    where
        T: Send + Sync + 'static,
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<T, ApiError>> + Send + 'static,
    {
        let (sender, receiver) = watch::channel(None);
        let sender = Arc::new(sender);
        let cancelled = Arc::new(AtomicBool::new(false));
        let next_token = Arc::new(AtomicU64::new(0));

        let name = self.name;
        let period = self.period;
        let ticker = {
            let cancelled = Arc::clone(&cancelled);
            tokio::spawn(async move {
                let mut interval = interval(period);
                interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
                loop {
                    interval.tick().await;
                    if cancelled.load(Ordering::SeqCst) {
                        break;
                    }

                    let token = next_token.fetch_add(1, Ordering::SeqCst) + 1;
                    let request = fetch();
                    let sender = Arc::clone(&sender);
                    let cancelled = Arc::clone(&cancelled);

                    tokio::spawn(async move {
                        match request.await {
                            Ok(value) => {
                                if cancelled.load(Ordering::SeqCst) {
                                    return;
                                }
                                let applied = sender.send_if_modified(|slot| match slot {
                                    Some((latest, _)) if *latest >= token => false,
                                    _ => {
                                        *slot = Some((token, value));
                                        true
                                    }
                                });
                                if !applied {
                                    debug!(
                                        "{:<12} --> {} 오래된 응답 무시: token={}",
                                        "Scheduler", name, token
                                    );
                                }
                            }
                            Err(e) => {
                                error!(
                                    "{:<12} --> {} 재조회 중 오류 발생: {:?}",
                                    "Scheduler", name, e
                                );
                            }
                        }
                    });
                }
            })
        };

        PollHandle {
            receiver,
            ticker,
            cancelled,
        }
    }
}

// endregion: --- Poller

// region:    --- Poll Handle
pub struct PollHandle<T> {
    receiver: watch::Receiver<Option<(u64, T)>>,
    ticker: JoinHandle<()>,
    cancelled: Arc<AtomicBool>,
}

impl<T: Clone> PollHandle<T> {
    /// 마지막으로 반영된 결과
    pub fn latest(&self) -> Option<T> {
        self.receiver.borrow().as_ref().map(|(_, value)| value.clone())
    }

    /// 마지막으로 반영된 요청 토큰
    pub fn latest_token(&self) -> Option<u64> {
        self.receiver.borrow().as_ref().map(|(token, _)| *token)
    }

    /// 다음 결과가 반영될 때까지 대기 (취소되면 None)
    pub async fn changed(&mut self) -> Option<T> {
        self.receiver.changed().await.ok()?;
        self.receiver
            .borrow_and_update()
            .as_ref()
            .map(|(_, value)| value.clone())
    }
}

impl<T> PollHandle<T> {
    /// 폴링 중단 (진행 중인 요청의 결과는 무시)
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
        self.ticker.abort();
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}

impl<T> Drop for PollHandle<T> {
    fn drop(&mut self) {
        self.cancel();
    }
}

// endregion: --- Poll Handle

// endregion: --- Tests
