// region:    --- Imports
use super::extract::Query;
use crate::auth::MaybeUser;
use crate::change_feed::{visible_to, ChangeFilter, Viewer};
use crate::error::{AppError, AppResult};
use crate::state::AppState;
use axum::extract::State;
use axum::response::sse::{Event, KeepAlive, Sse};
use futures::stream::{self, Stream};
use std::convert::Infallible;
use std::time::Duration;
use tokio::sync::broadcast;
use tracing::{info, warn};

// endregion: --- Imports

/// 변경 알림 구독 (SSE)
/// 다른 사용자 기준 구독은 막고, 이벤트는 구독자 권한에 맞게 가려서 보낸다.
pub async fn handle_changes(
    State(state): State<AppState>,
    Query(filter): Query<ChangeFilter>,
    MaybeUser(viewer): MaybeUser,
) -> AppResult<Sse<impl Stream<Item = Result<Event, Infallible>>>> {
    if let Some(user) = filter.user {
        match &viewer {
            Some(profile) if profile.id == user => {}
            Some(_) => return Err(AppError::forbidden("본인 알림만 구독할 수 있습니다.")),
            None => return Err(AppError::Unauthorized),
        }
    }
    info!("{:<12} --> 변경 알림 구독 filter: {:?}", "HandlerQuery", filter);
    let viewer = viewer.map(|profile| Viewer {
        id: profile.id,
        is_admin: profile.is_admin(),
    });

    let rx = state.hub.subscribe();
    let stream = stream::unfold((rx, filter), move |(mut rx, filter)| async move {
        loop {
            match rx.recv().await {
                Ok(event) if filter.matches(&event) => {
                    let Some(event) = visible_to(event, viewer) else {
                        continue;
                    };
                    let json = serde_json::to_string(&event).unwrap_or_default();
                    let sse = Event::default().event("change").data(json);
                    return Some((Ok(sse), (rx, filter)));
                }
                Ok(_) => continue,
                Err(broadcast::error::RecvError::Lagged(count)) => {
                    warn!("{:<12} --> 구독자가 {}건을 놓쳤습니다", "HandlerQuery", count);
                    let sse = Event::default().event("warning").data("Missed some events");
                    return Some((Ok(sse), (rx, filter)));
                }
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    });

    Ok(Sse::new(stream).keep_alive(KeepAlive::new().interval(Duration::from_secs(15))))
}
