/// 새 낙찰 알림 추적
/// 첫 관측은 기준값으로만 쓰고, 이후 낙찰 수가 이전 값과 "확인한 값"을 모두 넘으면 알린다.
// region:    --- Imports
use crate::session::{KeyValueStore, LAST_SEEN_WINS_KEY};
use std::sync::Arc;
use tracing::info;

// endregion: --- Imports

// region:    --- Win Tracker
pub struct WinTracker {
    store: Arc<dyn KeyValueStore>,
    last_count: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WinNotice {
    pub wins: u64,
    pub badge: String,
}

impl WinTracker {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self {
            store,
            last_count: None,
        }
    }

    /// 확인한 낙찰 수
    pub fn last_seen(&self) -> u64 {
        self.store
            .get(LAST_SEEN_WINS_KEY)
            .and_then(|raw| raw.trim().parse().ok())
            .unwrap_or_default()
    }

    /// 확인하지 않은 낙찰이 있는지
    pub fn has_unseen(&self, wins: u64) -> bool {
        wins > self.last_seen()
    }

    /// 새 관측값 반영
    pub fn observe(&mut self, wins: u64) -> Option<WinNotice> {
        let previous = self.last_count.replace(wins);
        let previous = previous?;

        if wins > previous && wins > self.last_seen() {
            info!("{:<12} --> 새 낙찰 발생: {}", "Wins", wins);
            return Some(WinNotice {
                wins,
                badge: badge_text(wins),
            });
        }
        None
    }

    /// 알림 확인 처리 (마지막 관측값 기준)
    pub fn acknowledge(&self) {
        self.mark_seen(self.last_count.unwrap_or_default());
    }

    /// 주어진 낙찰 수까지 확인한 것으로 저장
    pub fn mark_seen(&self, wins: u64) {
        info!("{:<12} --> 낙찰 확인: {}", "Wins", wins);
        self.store.set(LAST_SEEN_WINS_KEY, &wins.to_string());
    }
}

/// 뱃지 텍스트 (10 이상은 "9+")
pub fn badge_text(wins: u64) -> String {
    if wins > 9 {
        "9+".to_string()
    } else {
        wins.to_string()
    }
}

// endregion: --- Win Tracker

// endregion: --- Tests
