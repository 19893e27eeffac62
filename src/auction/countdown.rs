/// 경매 종료까지 남은 시간
/// 저장하지 않고 종료 시각에서 매번 다시 계산한다.
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt;

const ENDED_LABEL: &str = "Auction Ended";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TimeLeft {
    pub days: i64,
    pub hours: i64,
    pub minutes: i64,
    pub seconds: i64,
}

impl TimeLeft {
    /// 남은 시간 계산, 이미 종료되었으면 None
    pub fn until(end_time: DateTime<Utc>, now: DateTime<Utc>) -> Option<Self> {
        let total = (end_time - now).num_seconds();
        if total <= 0 {
            return None;
        }
        Some(Self {
            days: total / 86_400,
            hours: (total % 86_400) / 3_600,
            minutes: (total % 3_600) / 60,
            seconds: total % 60,
        })
    }

    pub fn total_seconds(&self) -> i64 {
        self.days * 86_400 + self.hours * 3_600 + self.minutes * 60 + self.seconds
    }
}

impl fmt::Display for TimeLeft {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.days > 0 {
            write!(f, "{}d {}h {}m", self.days, self.hours, self.minutes)
        } else if self.hours > 0 {
            write!(f, "{}h {}m {}s", self.hours, self.minutes, self.seconds)
        } else {
            write!(f, "{}m {}s", self.minutes, self.seconds)
        }
    }
}

/// 화면 표시용 문자열
pub fn format_time_left(end_time: DateTime<Utc>, now: DateTime<Utc>) -> String {
    match TimeLeft::until(end_time, now) {
        Some(left) => left.to_string(),
        None => ENDED_LABEL.to_string(),
    }
}
