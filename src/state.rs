// region:    --- Imports
use crate::change_feed::{ChangeHub, ChangePublisher};
use crate::config::Config;
use crate::database::DatabaseManager;
use crate::media::ObjectStorage;
use crate::notify::Mailer;
use std::sync::Arc;

// endregion: --- Imports

/// 핸들러 공유 상태
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<DatabaseManager>,
    pub publisher: Arc<dyn ChangePublisher>,
    pub hub: ChangeHub,
    pub storage: Arc<dyn ObjectStorage>,
    pub mailer: Arc<dyn Mailer>,
    pub config: Arc<Config>,
}
