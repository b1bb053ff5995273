use async_graphql::{Context, Object, ID};

use super::{session, types::{RideObject, UserObject}};
use crate::{
    auth::services::current_user,
    rides::services::{get_ride, list_rides},
    state::AppState,
};

#[derive(Default)]
pub struct QueryRoot;

#[Object]
impl QueryRoot {
    /// The logged-in user, or null for anonymous sessions.
    async fn current_user(&self, ctx: &Context<'_>) -> async_graphql::Result<Option<UserObject>> {
        let state = ctx.data::<AppState>()?;
        let user = current_user(state, session(ctx).user_id).await?;
        Ok(user.map(UserObject))
    }

    async fn ride(&self, ctx: &Context<'_>, id: ID) -> async_graphql::Result<Option<RideObject>> {
        let state = ctx.data::<AppState>()?;
        let ride = get_ride(state, session(ctx).user_id, &id).await?;
        Ok(ride.map(RideObject))
    }

    /// Every ride, newest first.
    async fn rides(
        &self,
        ctx: &Context<'_>,
        limit: Option<i64>,
        offset: Option<i64>,
    ) -> async_graphql::Result<Vec<RideObject>> {
        let state = ctx.data::<AppState>()?;
        let rides = list_rides(state, limit, offset).await?;
        Ok(rides.into_iter().map(RideObject).collect())
    }
}
