use tracing::{error, info, instrument, warn};
use uuid::Uuid;

use super::repo_types::{NewRide, Point, Ride};
use crate::{
    auth::{repo_types::User, services::require_user},
    error::{ApiError, ApiResult},
    mailer::MailMessage,
    state::AppState,
};

/// Fewest points a ride may have.
pub const MIN_RIDE_POINTS: usize = 3;

#[derive(Debug, Clone)]
pub struct RideDraft {
    pub name: String,
    pub description: Option<String>,
    pub points: Vec<Point>,
    pub distance: f64,
}

#[derive(Debug, Clone)]
pub struct ContactRequest {
    pub recipient_id: String,
    pub subject: String,
    pub content: String,
}

/// Parses a GraphQL ID; anything that is not a UUID cannot name a record.
pub fn parse_id(id: &str) -> Option<Uuid> {
    Uuid::parse_str(id.trim()).ok()
}

/// Place name at `point`, or an empty string when the lookup fails or finds nothing.
async fn place_name(state: &AppState, point: Point) -> String {
    match state.geocoder.reverse(point).await {
        Ok(name) => name.unwrap_or_default(),
        Err(e) => {
            warn!(error = %e, ?point, "reverse geocoding failed");
            String::new()
        }
    }
}

#[instrument(skip(state, draft), fields(name = %draft.name, points = draft.points.len()))]
pub async fn create_ride(
    state: &AppState,
    session_user: Option<Uuid>,
    draft: RideDraft,
) -> ApiResult<Ride> {
    let user = require_user(state, session_user).await?;

    if draft.points.len() < MIN_RIDE_POINTS {
        warn!("ride too short");
        return Err(ApiError::user_input("RIDE_TOO_SHORT"));
    }
    let name = draft.name.trim().to_string();
    if name.is_empty() {
        return Err(ApiError::user_input("RIDE_NAME_REQUIRED"));
    }
    if !draft.points.iter().all(Point::is_valid) {
        return Err(ApiError::user_input("INVALID_POINT"));
    }
    if !draft.distance.is_finite() || draft.distance < 0.0 {
        return Err(ApiError::user_input("INVALID_DISTANCE"));
    }

    // len >= MIN_RIDE_POINTS, so both ends exist
    let start = place_name(state, draft.points[0]).await;
    let finish = place_name(state, draft.points[draft.points.len() - 1]).await;

    let ride = state
        .store
        .create_ride(NewRide {
            creator_id: user.id,
            name,
            description: draft
                .description
                .map(|d| d.trim().to_string())
                .filter(|d| !d.is_empty()),
            points: draft.points,
            distance: draft.distance,
            start,
            finish,
        })
        .await?;

    info!(ride_id = %ride.id, user_id = %user.id, "ride created");
    Ok(ride)
}

#[instrument(skip(state))]
pub async fn delete_ride(state: &AppState, session_user: Option<Uuid>, id: &str) -> ApiResult<Ride> {
    let no_match = || ApiError::user_input("no matching ride");
    let ride_id = parse_id(id).ok_or_else(no_match)?;
    let ride = state.store.find_ride(ride_id).await?.ok_or_else(no_match)?;

    if session_user != Some(ride.creator_id) {
        warn!(ride_id = %ride.id, ?session_user, "delete ride not allowed");
        return Err(ApiError::forbidden("NOT_ALLOWED"));
    }

    if !state.store.delete_ride(ride.id).await? {
        // removed concurrently between lookup and delete
        return Err(no_match());
    }
    info!(ride_id = %ride.id, "ride deleted");
    Ok(ride)
}

pub async fn get_ride(state: &AppState, session_user: Option<Uuid>, id: &str) -> ApiResult<Option<Ride>> {
    if session_user.is_none() {
        return Err(ApiError::login_required());
    }
    match parse_id(id) {
        Some(ride_id) => Ok(state.store.find_ride(ride_id).await?),
        None => Ok(None),
    }
}

pub async fn list_rides(state: &AppState, limit: Option<i64>, offset: Option<i64>) -> ApiResult<Vec<Ride>> {
    if limit.is_some_and(|l| l < 0) || offset.is_some_and(|o| o < 0) {
        return Err(ApiError::user_input("INVALID_PAGINATION"));
    }
    Ok(state.store.list_rides(limit, offset.unwrap_or(0)).await?)
}

pub async fn rides_by_creator(state: &AppState, creator_id: Uuid) -> ApiResult<Vec<Ride>> {
    Ok(state.store.list_rides_by_creator(creator_id).await?)
}

pub async fn ride_creator(state: &AppState, ride: &Ride) -> ApiResult<User> {
    state
        .store
        .find_user_by_id(ride.creator_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("ride creator not found".into()))
}

/// Mails a ride creator on behalf of the session user. `false` when delivery fails.
#[instrument(skip(state, request), fields(recipient = %request.recipient_id))]
pub async fn contact_ride_creator(
    state: &AppState,
    session_user: Option<Uuid>,
    request: ContactRequest,
) -> ApiResult<bool> {
    let sender = require_user(state, session_user).await?;

    let subject = request.subject.trim();
    if subject.is_empty() {
        return Err(ApiError::user_input("MAIL_OBJECT_REQUIRED"));
    }
    let content = request.content.trim();
    if content.is_empty() {
        return Err(ApiError::user_input("MAIL_CONTENT_REQUIRED"));
    }

    let no_match = || ApiError::user_input("no matching user");
    let recipient_id = parse_id(&request.recipient_id).ok_or_else(no_match)?;
    let recipient = state
        .store
        .find_user_by_id(recipient_id)
        .await?
        .ok_or_else(no_match)?;

    let message = MailMessage {
        to: recipient.email,
        reply_to: Some(sender.email),
        subject: subject.to_string(),
        body: format!("Message de {} :\n\n{}", sender.username, content),
    };
    if let Err(e) = state.mailer.send(message).await {
        error!(error = %e, sender = %sender.id, "send contact mail failed");
        return Ok(false);
    }

    info!(sender = %sender.id, "ride creator contacted");
    Ok(true)
}
