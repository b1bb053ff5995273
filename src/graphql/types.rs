use async_graphql::{Context, InputObject, Object, SimpleObject, ID};
use time::format_description::well_known::Rfc3339;

use crate::{
    auth::repo_types::User,
    rides::{
        preview::{preview_url, random_color},
        repo_types::{Point, Ride},
        services::{ride_creator, rides_by_creator},
    },
    state::AppState,
};

pub struct UserObject(pub User);

#[Object(name = "User")]
impl UserObject {
    async fn id(&self) -> ID {
        ID(self.0.id.to_string())
    }

    async fn email(&self) -> &str {
        &self.0.email
    }

    async fn firstname(&self) -> Option<&str> {
        self.0.firstname.as_deref()
    }

    async fn lastname(&self) -> Option<&str> {
        self.0.lastname.as_deref()
    }

    async fn username(&self) -> &str {
        &self.0.username
    }

    /// Rides created by this user, newest first.
    async fn rides(&self, ctx: &Context<'_>) -> async_graphql::Result<Vec<RideObject>> {
        let state = ctx.data::<AppState>()?;
        let rides = rides_by_creator(state, self.0.id).await?;
        Ok(rides.into_iter().map(RideObject).collect())
    }
}

pub struct RideObject(pub Ride);

#[Object(name = "Ride")]
impl RideObject {
    async fn id(&self) -> ID {
        ID(self.0.id.to_string())
    }

    async fn creator(&self, ctx: &Context<'_>) -> async_graphql::Result<UserObject> {
        let state = ctx.data::<AppState>()?;
        Ok(UserObject(ride_creator(state, &self.0).await?))
    }

    async fn name(&self) -> &str {
        &self.0.name
    }

    async fn description(&self) -> Option<&str> {
        self.0.description.as_deref()
    }

    async fn points(&self) -> Vec<PointObject> {
        self.0.points.iter().copied().map(PointObject::from).collect()
    }

    /// Length of the route in meters.
    async fn distance(&self) -> f64 {
        self.0.distance
    }

    async fn start(&self) -> &str {
        &self.0.start
    }

    async fn finish(&self) -> &str {
        &self.0.finish
    }

    #[graphql(name = "previewURL")]
    async fn preview_url(&self, ctx: &Context<'_>) -> async_graphql::Result<String> {
        let mapbox = &ctx.data::<AppState>()?.config.mapbox;
        Ok(preview_url(&mapbox.api_url, &mapbox.token, &self.0.points))
    }

    async fn color(&self) -> String {
        random_color()
    }

    async fn created_at(&self) -> String {
        self.0
            .created_at
            .format(&Rfc3339)
            .unwrap_or_else(|_| self.0.created_at.to_string())
    }
}

#[derive(SimpleObject, Clone, Copy)]
#[graphql(name = "Point")]
pub struct PointObject {
    pub latitude: f64,
    pub longitude: f64,
}

impl From<Point> for PointObject {
    fn from(p: Point) -> Self {
        Self {
            latitude: p.latitude,
            longitude: p.longitude,
        }
    }
}

#[derive(InputObject, Clone, Copy)]
pub struct PointInput {
    pub latitude: f64,
    pub longitude: f64,
}

impl From<PointInput> for Point {
    fn from(p: PointInput) -> Self {
        Self {
            latitude: p.latitude,
            longitude: p.longitude,
        }
    }
}

#[derive(InputObject)]
pub struct CreateRideInput {
    pub name: String,
    pub points: Vec<PointInput>,
    pub description: Option<String>,
    pub distance: f64,
}

#[derive(InputObject)]
pub struct RegisterUserInput {
    pub email: String,
    pub password: String,
    pub firstname: Option<String>,
    pub lastname: Option<String>,
    pub username: String,
    pub invite_code: Option<String>,
}

#[derive(InputObject)]
pub struct ResetPasswordInput {
    pub token: String,
    pub password: String,
    pub password_confirmation: String,
}

#[derive(InputObject)]
pub struct ContactRideCreatorInput {
    #[graphql(name = "userID")]
    pub user_id: ID,
    pub mail_object: String,
    pub mail_content: String,
}
