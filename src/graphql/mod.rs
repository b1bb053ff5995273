use async_graphql::{http::GraphiQLSource, Context, EmptySubscription, Schema};
use async_graphql_axum::{GraphQLRequest, GraphQLResponse};
use axum::{
    response::{Html, IntoResponse},
    routing::{get, post},
    Extension, Router,
};
use tracing::instrument;

use crate::{auth::Session, state::AppState};

mod mutation;
mod query;
pub mod types;

pub use mutation::MutationRoot;
pub use query::QueryRoot;

pub type RideshareSchema = Schema<QueryRoot, MutationRoot, EmptySubscription>;

const MAX_QUERY_DEPTH: usize = 12;

pub fn build_schema(state: AppState) -> RideshareSchema {
    Schema::build(QueryRoot, MutationRoot, EmptySubscription)
        .data(state)
        .limit_depth(MAX_QUERY_DEPTH)
        .finish()
}

/// The request's session; anonymous when the handler attached none.
pub(crate) fn session(ctx: &Context<'_>) -> Session {
    ctx.data_opt::<Session>().copied().unwrap_or_default()
}

pub fn router(state: &AppState) -> Router<AppState> {
    let schema = build_schema(state.clone());
    let route = if state.config.enable_graphiql {
        tracing::warn!("GraphiQL enabled on GET /graphql");
        get(graphiql).post(graphql_handler)
    } else {
        post(graphql_handler)
    };
    Router::new()
        .route("/graphql", route)
        .layer(Extension(schema))
}

#[instrument(skip_all, fields(user_id = ?session.user_id))]
pub async fn graphql_handler(
    Extension(schema): Extension<RideshareSchema>,
    session: Session,
    req: GraphQLRequest,
) -> GraphQLResponse {
    schema.execute(req.into_inner().data(session)).await.into()
}

pub async fn graphiql() -> impl IntoResponse {
    Html(GraphiQLSource::build().endpoint("/graphql").finish())
}
