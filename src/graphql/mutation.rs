use async_graphql::{Context, Object, ID};
use axum::http::header::SET_COOKIE;
use tracing::info;
use uuid::Uuid;

use super::{
    session,
    types::{
        ContactRideCreatorInput, CreateRideInput, RegisterUserInput, ResetPasswordInput,
        RideObject, UserObject,
    },
};
use crate::{
    auth::{
        jwt::clear_session_cookie,
        services::{self as auth, Registration},
        JwtKeys,
    },
    error::ApiError,
    rides::services::{self as rides, ContactRequest, RideDraft},
    state::AppState,
};

/// Attaches a fresh session cookie for `user_id` to the HTTP response.
fn start_session(ctx: &Context<'_>, state: &AppState, user_id: Uuid) -> async_graphql::Result<()> {
    let keys = JwtKeys::from(&state.config.session);
    let cookie = keys.session_cookie(user_id).map_err(ApiError::from)?;
    ctx.append_http_header(SET_COOKIE, cookie);
    Ok(())
}

#[derive(Default)]
pub struct MutationRoot;

#[Object]
impl MutationRoot {
    async fn create_ride(
        &self,
        ctx: &Context<'_>,
        input: CreateRideInput,
    ) -> async_graphql::Result<RideObject> {
        let state = ctx.data::<AppState>()?;
        let draft = RideDraft {
            name: input.name,
            description: input.description,
            points: input.points.into_iter().map(Into::into).collect(),
            distance: input.distance,
        };
        let ride = rides::create_ride(state, session(ctx).user_id, draft).await?;
        Ok(RideObject(ride))
    }

    /// Deletes a ride owned by the session user and returns it.
    async fn delete_ride(&self, ctx: &Context<'_>, id: ID) -> async_graphql::Result<RideObject> {
        let state = ctx.data::<AppState>()?;
        let ride = rides::delete_ride(state, session(ctx).user_id, &id).await?;
        Ok(RideObject(ride))
    }

    async fn register_user(
        &self,
        ctx: &Context<'_>,
        input: RegisterUserInput,
    ) -> async_graphql::Result<UserObject> {
        let state = ctx.data::<AppState>()?;
        let user = auth::register(
            state,
            Registration {
                email: input.email,
                password: input.password,
                username: input.username,
                firstname: input.firstname,
                lastname: input.lastname,
                invite_code: input.invite_code,
            },
        )
        .await?;
        start_session(ctx, state, user.id)?;
        Ok(UserObject(user))
    }

    async fn login(
        &self,
        ctx: &Context<'_>,
        email: String,
        password: String,
    ) -> async_graphql::Result<UserObject> {
        let state = ctx.data::<AppState>()?;
        let user = auth::login(state, &email, &password).await?;
        start_session(ctx, state, user.id)?;
        Ok(UserObject(user))
    }

    async fn logout(&self, ctx: &Context<'_>) -> bool {
        ctx.append_http_header(SET_COOKIE, clear_session_cookie());
        info!(user_id = ?session(ctx).user_id, "user logged out");
        true
    }

    /// Sets a new password from a reset token and logs the user in.
    async fn reset_password(
        &self,
        ctx: &Context<'_>,
        input: ResetPasswordInput,
    ) -> async_graphql::Result<UserObject> {
        let state = ctx.data::<AppState>()?;
        let user = auth::reset_password(
            state,
            &input.token,
            &input.password,
            &input.password_confirmation,
        )
        .await?;
        start_session(ctx, state, user.id)?;
        Ok(UserObject(user))
    }

    async fn contact_ride_creator(
        &self,
        ctx: &Context<'_>,
        input: ContactRideCreatorInput,
    ) -> async_graphql::Result<bool> {
        let state = ctx.data::<AppState>()?;
        let sent = rides::contact_ride_creator(
            state,
            session(ctx).user_id,
            ContactRequest {
                recipient_id: input.user_id.0,
                subject: input.mail_object,
                content: input.mail_content,
            },
        )
        .await?;
        Ok(sent)
    }

    async fn request_password_reset(
        &self,
        ctx: &Context<'_>,
        email: String,
    ) -> async_graphql::Result<bool> {
        let state = ctx.data::<AppState>()?;
        Ok(auth::request_password_reset(state, &email).await?)
    }
}
