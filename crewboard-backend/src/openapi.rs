use axum::Router;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

#[derive(OpenApi)]
#[openapi(
    info(description = "Crewboard API Documentation", license(name = "MIT or Apache2", identifier="MIT Apache2.0"), title = "Crewboard", version = env!("CARGO_PKG_VERSION")),
    paths(
        crate::project::get_projects,
        crate::project::get_project,
        crate::project::get_hot_projects,
        crate::project::get_favorite_projects,
        crate::project::get_my_projects,
        crate::project::post_project,
        crate::project::update_project,
        crate::project::delete_project,
        crate::project::post_favorite,
        crate::project::delete_favorite,
        crate::comment::get_comments,
        crate::comment::post_comment,
        crate::comment::update_comment,
        crate::comment::delete_comment,
        crate::objectstore::download_file,
    )
)]
pub struct ApiDoc;

pub(crate) fn api_route<T: Clone + Sync + Send + 'static>() -> Router<T> {
    let doc = ApiDoc::openapi();
    Router::new().merge(SwaggerUi::new("/api/v1/swagger-ui").url("/api/v1/openapi.json", doc))
}
