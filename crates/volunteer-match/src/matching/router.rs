use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use serde::{Deserialize, Serialize};
use serde_json::json;

use super::domain::{MatchView, OpportunityId, ProfileId, VolunteerProfile};
use super::repository::{MatchDataSource, MatchStore, RepositoryError};
use super::service::{MatchService, MatchServiceError};

/// Router builder exposing match generation and the match feed.
pub fn match_router<D, S>(service: Arc<MatchService<D, S>>) -> Router
where
    D: MatchDataSource + 'static,
    S: MatchStore + 'static,
{
    Router::new()
        .route(
            "/api/v1/profiles/:profile_id/matches",
            post(generate_handler::<D, S>).get(list_handler::<D, S>),
        )
        .route(
            "/api/v1/profiles/:profile_id/matches/:opportunity_id/viewed",
            post(viewed_handler::<D, S>),
        )
        .route(
            "/api/v1/profiles/:profile_id/matches/:opportunity_id/dismiss",
            post(dismiss_handler::<D, S>),
        )
        .with_state(service)
}

/// Profile fields submitted when (re)generating matches; the id comes from the path.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MatchRunRequest {
    #[serde(default)]
    pub location: String,
    #[serde(default)]
    pub interests: Vec<String>,
    #[serde(default)]
    pub availability: Vec<String>,
}

impl MatchRunRequest {
    pub fn into_profile(self, id: ProfileId) -> VolunteerProfile {
        VolunteerProfile {
            id,
            location: self.location,
            interests: self.interests,
            availability: self.availability,
        }
    }
}

pub(crate) async fn generate_handler<D, S>(
    State(service): State<Arc<MatchService<D, S>>>,
    Path(profile_id): Path<String>,
    axum::Json(request): axum::Json<MatchRunRequest>,
) -> Response
where
    D: MatchDataSource + 'static,
    S: MatchStore + 'static,
{
    let profile = request.into_profile(ProfileId(profile_id));
    let outcome = service.generate_matches(&profile);
    (StatusCode::ACCEPTED, axum::Json(outcome.view())).into_response()
}

pub(crate) async fn list_handler<D, S>(
    State(service): State<Arc<MatchService<D, S>>>,
    Path(profile_id): Path<String>,
) -> Response
where
    D: MatchDataSource + 'static,
    S: MatchStore + 'static,
{
    let profile_id = ProfileId(profile_id);
    match service.list_matches(&profile_id) {
        Ok(records) => {
            let matches: Vec<MatchView> = records.iter().map(|record| record.view()).collect();
            let payload = json!({
                "profile_id": profile_id,
                "matches": matches,
            });
            (StatusCode::OK, axum::Json(payload)).into_response()
        }
        Err(other) => error_response(other),
    }
}

pub(crate) async fn viewed_handler<D, S>(
    State(service): State<Arc<MatchService<D, S>>>,
    Path((profile_id, opportunity_id)): Path<(String, String)>,
) -> Response
where
    D: MatchDataSource + 'static,
    S: MatchStore + 'static,
{
    match service.mark_viewed(&ProfileId(profile_id), &OpportunityId(opportunity_id)) {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(other) => error_response(other),
    }
}

pub(crate) async fn dismiss_handler<D, S>(
    State(service): State<Arc<MatchService<D, S>>>,
    Path((profile_id, opportunity_id)): Path<(String, String)>,
) -> Response
where
    D: MatchDataSource + 'static,
    S: MatchStore + 'static,
{
    match service.dismiss(&ProfileId(profile_id), &OpportunityId(opportunity_id)) {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(other) => error_response(other),
    }
}

fn error_response(error: MatchServiceError) -> Response {
    let status = match error {
        MatchServiceError::Repository(RepositoryError::NotFound) => StatusCode::NOT_FOUND,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    };
    let payload = json!({
        "error": error.to_string(),
    });
    (status, axum::Json(payload)).into_response()
}
