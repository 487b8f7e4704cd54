mod error;
mod image_processing;
mod palette;

use axum::{
    extract::{multipart::Field, Multipart, State},
    routing::{get, post},
    Json, Router,
};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use utoipa::{OpenApi, ToSchema};
use utoipa_scalar::{Scalar, Servable};

use crate::error::AppError;
use crate::palette::{ColorEntry, MatchResult, Palette, Rgb};

/// Default reference table, relative to the working directory
const DEFAULT_COLORS_CSV: &str = "colors.csv";

/// Application state shared across handlers
#[derive(Clone)]
struct AppState {
    palette: Arc<Palette>,
}

/// OpenAPI documentation
#[derive(OpenApi)]
#[openapi(
    info(
        title = "Color Detection API",
        description = "Upload an image and identify the named reference color at a chosen pixel",
        version = "0.1.0"
    ),
    tags(
        (name = "Colors", description = "Pixel color detection endpoints")
    ),
    paths(health, get_palette, detect_color),
    components(schemas(Rgb, ColorEntry, MatchResult))
)]
struct ApiDoc;

/// Multipart form for a detection request
///
/// Documentation only; the handler reads the parts manually.
#[derive(ToSchema)]
#[allow(dead_code)]
struct DetectForm {
    /// Image file bytes (png or jpeg)
    #[schema(value_type = String, format = Binary)]
    image: Vec<u8>,
    /// Horizontal pixel coordinate, 0 <= x < width
    x: u32,
    /// Vertical pixel coordinate, 0 <= y < height
    y: u32,
}

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()),
        )
        .init();

    // Load the reference table once; it is immutable for the process lifetime
    let palette_path =
        std::env::var("COLORS_CSV").unwrap_or_else(|_| DEFAULT_COLORS_CSV.to_string());

    let palette = match Palette::load(&palette_path) {
        Ok(palette) if palette.is_empty() => {
            tracing::error!("Reference table {} has no entries", palette_path);
            std::process::exit(1);
        }
        Ok(palette) => Arc::new(palette),
        Err(e) => {
            tracing::error!("Failed to load reference table {}: {}", palette_path, e);
            std::process::exit(1);
        }
    };

    tracing::info!(
        "Loaded {} reference colors from {}",
        palette.len(),
        palette_path
    );

    // Create app state
    let state = AppState { palette };

    // Build router
    let app = Router::new()
        .route("/health", get(health))
        .route("/palette", get(get_palette))
        .route("/detect", post(detect_color))
        .merge(Scalar::with_url("/docs", ApiDoc::openapi()))
        .route("/openapi.json", get(openapi_json))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    // Get port from environment or use default
    let port = std::env::var("PORT")
        .ok()
        .and_then(|p| p.parse().ok())
        .unwrap_or(3000);

    let addr = format!("0.0.0.0:{}", port);
    tracing::info!("Starting server on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await.unwrap();
    axum::serve(listener, app).await.unwrap();
}

/// Health check endpoint
#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Service is healthy", body = String)
    )
)]
async fn health() -> &'static str {
    "ok"
}

/// Get OpenAPI JSON specification
async fn openapi_json() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}

/// Get the reference color table
///
/// Returns every named color the matcher compares against, in load order.
#[utoipa::path(
    get,
    path = "/palette",
    tag = "Colors",
    responses(
        (status = 200, description = "Reference color table", body = Vec<ColorEntry>)
    )
)]
async fn get_palette(State(state): State<AppState>) -> Json<Vec<ColorEntry>> {
    Json(state.palette.entries().to_vec())
}

/// Detect the color at a pixel
///
/// Accepts a multipart form with an `image` part (png or jpeg bytes) and
/// integer `x`/`y` coordinate parts. Decodes the image, reads the pixel at
/// (x, y), and returns the closest reference color.
#[utoipa::path(
    post,
    path = "/detect",
    tag = "Colors",
    request_body(
        content = inline(DetectForm),
        content_type = "multipart/form-data",
        description = "Parts: `image` (png/jpeg file), `x` and `y` (pixel coordinates)"
    ),
    responses(
        (status = 200, description = "Closest reference color for the pixel", body = MatchResult),
        (status = 400, description = "Undecodable image, missing form part, or out-of-bounds coordinate")
    )
)]
async fn detect_color(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<MatchResult>, AppError> {
    let mut image_data: Option<Vec<u8>> = None;
    let mut x: Option<u32> = None;
    let mut y: Option<u32> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::InvalidForm(e.to_string()))?
    {
        let name = field.name().map(str::to_string);
        match name.as_deref() {
            Some("image") => {
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| AppError::InvalidForm(e.to_string()))?;
                image_data = Some(bytes.to_vec());
            }
            Some("x") => x = Some(parse_coordinate(field, "x").await?),
            Some("y") => y = Some(parse_coordinate(field, "y").await?),
            _ => {}
        }
    }

    let image_data =
        image_data.ok_or_else(|| AppError::InvalidForm("missing image part".to_string()))?;
    let x = x.ok_or_else(|| AppError::InvalidForm("missing x part".to_string()))?;
    let y = y.ok_or_else(|| AppError::InvalidForm("missing y part".to_string()))?;

    let img = image_processing::decode_image(&image_data)?;
    let pixel = image_processing::pixel_at(&img, x, y)?;

    tracing::info!(
        "Detect request: ({}, {}) -> rgb({}, {}, {})",
        x,
        y,
        pixel.r,
        pixel.g,
        pixel.b
    );

    let result = state.palette.find_closest(pixel)?;
    Ok(Json(result))
}

/// Parse a coordinate form part as a non-negative integer
async fn parse_coordinate(field: Field<'_>, name: &str) -> Result<u32, AppError> {
    let text = field
        .text()
        .await
        .map_err(|e| AppError::InvalidForm(e.to_string()))?;
    text.trim().parse().map_err(|_| {
        AppError::InvalidForm(format!(
            "{} must be a non-negative integer, got {:?}",
            name, text
        ))
    })
}
