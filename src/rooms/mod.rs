pub mod membership;
pub mod policy;
pub mod store;

mod msg;
mod room;

pub use msg::Message;
pub use store::Room;

use axum::Router;
use axum::routing::{get, post, put};

use crate::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(room::create_room).get(room::list_rooms))
        .route(
            "/{room_id}",
            get(room::get_room)
                .put(room::update_room)
                .delete(room::delete_room),
        )
        .route("/name/{name}", get(room::get_room_by_name))
        .route("/{room_id}/join", post(room::join_room))
        .route("/{room_id}/leave", post(room::leave_room))
        .route("/{room_id}/username", put(room::update_username))
        .route("/{room_id}/membership", get(room::membership_check))
        .route("/{room_id}/members/count", get(room::member_count))
        .route(
            "/{room_id}/messages",
            get(msg::room_messages).post(msg::post_message),
        )
}
