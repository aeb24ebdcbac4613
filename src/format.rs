/// 표시용 포맷
// region:    --- Imports
use chrono::{DateTime, Utc};

// endregion: --- Imports

/// 남은 시간
/// 종료 시각이 없으면 "Unknown", 지났으면 "Ended".
pub fn format_ends_in(ends_at: Option<DateTime<Utc>>, now: DateTime<Utc>) -> String {
    let Some(ends_at) = ends_at else {
        return "Unknown".to_string();
    };

    let diff = ends_at - now;
    if diff.num_milliseconds() <= 0 {
        return "Ended".to_string();
    }

    let total_minutes = diff.num_minutes();
    let days = total_minutes / (60 * 24);
    let hours = (total_minutes - days * 60 * 24) / 60;
    let minutes = total_minutes % 60;

    if days > 0 {
        format!("Ends in {days}d {hours}h")
    } else if hours > 0 {
        format!("Ends in {hours}h {minutes}m")
    } else {
        format!("Ends in {minutes}m")
    }
}

pub fn render_credits(amount: f64) -> String {
    let amount = if amount.is_finite() { amount } else { 0.0 };
    format!("{amount} credits")
}
