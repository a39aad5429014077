use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "fanout API",
        version = "0.1.0",
        description = "Coordinator for a distributed crawl: submit URLs, watch workers, read results."
    ),
    paths(
        crate::routes::submit_urls,
        crate::routes::get_results,
        crate::routes::get_session_results,
        crate::routes::get_workers,
        crate::routes::get_progress,
        crate::routes::list_sessions,
        crate::routes::health,
    ),
    components(schemas(
        crate::dto::SubmitUrlsRequest,
        crate::dto::SubmitUrlsResponse,
        crate::dto::ResultsResponse,
        crate::dto::WorkersResponse,
        crate::dto::ProgressResponse,
        crate::dto::SessionResponse,
        crate::dto::SessionListResponse,
        crate::dto::HealthResponse,
        crate::dto::ErrorResponse,
    )),
    tags(
        (name = "crawl", description = "URL submission"),
        (name = "results", description = "Extracted product data"),
        (name = "monitoring", description = "Workers, progress and sessions"),
        (name = "system", description = "Health and system status"),
    )
)]
pub struct ApiDoc;
