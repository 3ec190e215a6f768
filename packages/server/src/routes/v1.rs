use utoipa_axum::router::OpenApiRouter;
use utoipa_axum::routes;

use crate::config::AppConfig;
use crate::handlers;
use crate::state::AppState;

pub fn routes(config: &AppConfig) -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .nest("/files", file_routes(config))
        .nest("/posts", post_routes())
        .nest("/users", user_routes())
        .nest("/admin", admin_routes())
}

fn file_routes(config: &AppConfig) -> OpenApiRouter<AppState> {
    let upload = OpenApiRouter::new()
        .routes(routes!(handlers::files::upload_file))
        .layer(handlers::files::upload_body_limit(&config.upload));

    OpenApiRouter::new()
        .routes(routes!(handlers::files::get_file))
        .routes(routes!(handlers::files::get_presigned_url))
        .merge(upload)
}

fn post_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(handlers::posts::set_thumbnail))
        .routes(routes!(handlers::posts::sync_post_content))
        .routes(routes!(handlers::posts::clear_post_files))
}

fn user_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new().routes(routes!(handlers::users::set_profile_image))
}

fn admin_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new().routes(routes!(handlers::admin::run_file_gc))
}
