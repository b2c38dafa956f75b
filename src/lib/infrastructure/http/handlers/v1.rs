use axum::{
    routing::{get, post},
    Json, Router,
};
use utoipa::OpenApi;

use crate::{
    domain::delivery::DeliveryStrategy,
    infrastructure::http::{open_api::ApiDocs, state::AppState},
};

pub mod send_email;
pub mod stoplight;
pub mod uptime;

pub fn router<S: DeliveryStrategy>() -> Router<AppState<S>> {
    Router::new()
        .route("/", get(stoplight::handler))
        .route("/openapi.json", get(Json(ApiDocs::openapi())))
        .route("/uptime", get(uptime::handler))
        .route("/send", post(send_email::handler))
}
