// region:    --- Imports
use crate::state::AppState;
use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post, put};
use axum::Router;

// endregion: --- Imports

// region:    --- Modules
mod admin;
mod auctions;
mod bids;
mod changes;
mod extract;
mod profiles;
mod submissions;
mod uploads;

// endregion: --- Modules

/// 라우터 구성
pub fn router(state: AppState) -> Router {
    let body_limit = state.config.server.body_limit;

    let public = Router::new()
        .route("/health", get(auctions::handle_health))
        .route("/categories", get(auctions::handle_list_categories))
        .route("/auctions", get(auctions::handle_list_auctions))
        .route("/auctions/:id", get(auctions::handle_get_auction))
        .route(
            "/auctions/:id/bids",
            get(bids::handle_get_bid_history).post(bids::handle_place_bid),
        )
        .route("/changes", get(changes::handle_changes));

    let seller = Router::new()
        .route("/uploads", post(uploads::handle_upload))
        .route("/submissions", post(submissions::handle_submit))
        .route(
            "/submissions/:id",
            put(submissions::handle_edit).delete(submissions::handle_withdraw),
        )
        .route(
            "/submissions/:id/resubmit",
            get(submissions::handle_resubmission_draft),
        );

    let me = Router::new()
        .route(
            "/me",
            get(profiles::handle_get_me).put(profiles::handle_update_me),
        )
        .route("/me/dashboard", get(profiles::handle_dashboard))
        .route("/me/watchlist", get(profiles::handle_watchlist))
        .route(
            "/me/watchlist/:auction_id",
            put(profiles::handle_save).delete(profiles::handle_unsave),
        )
        .route(
            "/me/watchlist/:auction_id/toggle",
            post(profiles::handle_toggle_saved),
        );

    let admin = Router::new()
        .route("/admin/auctions", get(admin::handle_overview))
        .route(
            "/admin/auctions/:id/comparison",
            get(admin::handle_comparison),
        )
        .route("/admin/auctions/:id/approve", post(admin::handle_approve))
        .route("/admin/auctions/:id/reject", post(admin::handle_reject))
        .route("/admin/auctions/:id/start", post(admin::handle_start))
        .route("/admin/auctions/:id/pause", post(admin::handle_pause))
        .route("/admin/auctions/:id/comments", put(admin::handle_comments))
        .route("/admin/activity", get(admin::handle_activity))
        .route(
            "/admin/categories",
            get(admin::handle_list_categories).post(admin::handle_create_category),
        )
        .route(
            "/admin/categories/:id",
            put(admin::handle_update_category).delete(admin::handle_delete_category),
        );

    Router::new()
        .merge(public)
        .merge(seller)
        .merge(me)
        .merge(admin)
        .layer(DefaultBodyLimit::max(body_limit))
        .with_state(state)
}
