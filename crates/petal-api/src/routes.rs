use axum::{
    Router,
    middleware,
    routing::{delete, get, post, put},
};

use crate::auth::{self, AppState};
use crate::middleware::require_admin;
use crate::{categories, images, messages, notes, site};

/// All API routes. Transport layers (CORS, tracing, body limits, static
/// files) are added by the server binary.
pub fn router(state: AppState) -> Router {
    let public_routes = Router::new()
        .route("/keep-alive", get(site::keep_alive))
        .route("/auth/login", post(auth::login))
        .route("/site/cover", get(site::get_cover))
        .route("/site/profile", get(site::get_profile))
        .route("/site/flowers", get(site::get_flowers))
        .route("/site/flowers", post(site::send_flower))
        .route("/notes", get(notes::list_notes))
        .route("/notes/{note_id}", get(notes::get_note))
        .route("/categories", get(categories::list_categories))
        .route("/messages", get(messages::list_messages))
        .route("/messages", post(messages::post_message))
        .route("/messages/challenge", get(messages::get_challenge));

    let admin_routes = Router::new()
        .route("/site/profile", put(site::update_profile))
        .route("/site/challenge", put(messages::update_challenge))
        .route("/site/cover/image", post(images::upload_cover))
        .route("/site/avatar/image", post(images::upload_avatar))
        .route("/notes", post(notes::create_note))
        .route("/notes/cover-image", post(images::upload_note_cover))
        .route("/notes/{note_id}", delete(notes::delete_note))
        .route("/categories", post(categories::create_category))
        .route("/messages/{message_id}", delete(messages::delete_message))
        .route_layer(middleware::from_fn_with_state(state.clone(), require_admin));

    Router::new()
        .merge(public_routes)
        .merge(admin_routes)
        .with_state(state)
}
