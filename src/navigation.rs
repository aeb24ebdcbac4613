/// 화면 이동 협력자
/// 화면 전환은 반환값이 없는 부수 효과로만 다룬다.
// region:    --- Imports
use std::sync::Mutex;
use tracing::info;

// endregion: --- Imports

// region:    --- Navigator
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum View {
    Home,
    Login,
    MyListings,
    Profile,
    MyWins,
}

pub trait Navigator: Send + Sync {
    fn navigate(&self, view: View);
}

/// 이동 요청을 로그로만 남기는 구현체
#[derive(Debug, Default)]
pub struct LogNavigator;

impl Navigator for LogNavigator {
    fn navigate(&self, view: View) {
        info!("{:<12} --> 화면 이동: {:?}", "Navigator", view);
    }
}

/// 이동 요청을 기록하는 구현체
#[derive(Debug, Default)]
pub struct RecordingNavigator {
    visits: Mutex<Vec<View>>,
}

impl RecordingNavigator {
    pub fn visits(&self) -> Vec<View> {
        self.visits
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    pub fn last(&self) -> Option<View> {
        self.visits().pop()
    }
}

impl Navigator for RecordingNavigator {
    fn navigate(&self, view: View) {
        self.visits
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(view);
    }
}

// endregion: --- Navigator
