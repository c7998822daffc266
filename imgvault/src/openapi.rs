//! OpenAPI document for the upload API, served at `/openapi.json`.

use utoipa::OpenApi;

use crate::api;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "imgvault",
        description = "Signed, content-addressed image uploads. Stored files are served under `/static/`."
    ),
    paths(api::handlers::uploads::upload_image),
    components(schemas(api::models::uploads::UploadResponse)),
    tags((name = "uploads", description = "Image upload"))
)]
pub struct ApiDoc;
