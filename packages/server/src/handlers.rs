//! HTTP handler functions for the bubble map API.

use std::sync::MutexGuard;

use actix_web::{HttpResponse, web};
use bubble_map_render::MapSession;
use bubble_map_server_models::{
    ApiHealth, ApiMapView, ApiOptions, ApiSelectionRequest, ApiSelectionResponse,
};

use crate::AppState;

/// `GET /api/health`
pub async fn health() -> HttpResponse {
    HttpResponse::Ok().json(ApiHealth {
        healthy: true,
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// `GET /api/map`
///
/// Returns the initial view and base tile layer for the map widget.
pub async fn map_view(state: web::Data<AppState>) -> HttpResponse {
    HttpResponse::Ok().json(ApiMapView::from(&state.map_view))
}

/// `GET /api/options`
///
/// Returns the values the category and year selectors are populated with.
pub async fn options(state: web::Data<AppState>) -> HttpResponse {
    match lock_session(&state) {
        Ok(session) => HttpResponse::Ok().json(ApiOptions::from(session.dataset())),
        Err(response) => response,
    }
}

/// `GET /api/selection`
///
/// Returns the most recent selection so the controls can be restored,
/// including one that did not change the map.
pub async fn current_selection(state: web::Data<AppState>) -> HttpResponse {
    match lock_session(&state) {
        Ok(session) => HttpResponse::Ok().json(session.selection()),
        Err(response) => response,
    }
}

/// `PUT /api/selection`
///
/// Applies a category/year selection to the session's marker layer and
/// returns the outcome together with the resulting layer. No-op outcomes
/// (incomplete selection, no matching data) still answer `200` with the
/// unchanged layer.
pub async fn select(
    state: web::Data<AppState>,
    body: web::Json<ApiSelectionRequest>,
) -> HttpResponse {
    let mut session = match lock_session(&state) {
        Ok(session) => session,
        Err(response) => return response,
    };

    let outcome = session.select(body.into_inner().into());
    HttpResponse::Ok().json(ApiSelectionResponse::new(&outcome, session.layer()))
}

/// `GET /api/markers`
///
/// Returns the markers currently on the map as a `GeoJSON`
/// `FeatureCollection`.
pub async fn markers(state: web::Data<AppState>) -> HttpResponse {
    match lock_session(&state) {
        Ok(session) => HttpResponse::Ok().json(session.layer().to_feature_collection()),
        Err(response) => response,
    }
}

fn lock_session(state: &AppState) -> Result<MutexGuard<'_, MapSession>, HttpResponse> {
    state.session.lock().map_err(|e| {
        log::error!("Session lock poisoned: {e}");
        HttpResponse::InternalServerError().json(serde_json::json!({
            "error": "Session unavailable"
        }))
    })
}
