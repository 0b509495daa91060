use std::num::NonZeroU16;
use std::path::Path;
use std::sync::Arc;

use askama::Template;
use askama_web::WebTemplate;
use axum::Router;
use axum::extract::{DefaultBodyLimit, Multipart, State};
use axum::routing::get;
use tokio::sync::Semaphore;
use tower_http::services::ServeDir;
use tracing::{error, info};

use crate::config::AppConfig;
use crate::error::AppError;
use crate::generator::{GenerationResult, Generator};
use crate::prompt::UPLOAD_FIELD;
use crate::upload::{read_image_field, save_upload};

/// Gallery links for locally written images live under this path.
pub const OUTPUTS_ROUTE: &str = "/outputs";
const MAX_UPLOAD_BYTES: usize = 50 * 1024 * 1024;

#[derive(Clone, Debug)]
pub struct AppState {
    config: Arc<AppConfig>,
    generator: Arc<Generator>,
    slots: Arc<Semaphore>,
}

impl AppState {
    pub fn new(config: AppConfig) -> crate::error::Result<Self> {
        let generator = Generator::from_config(&config)?;
        let slots = Arc::new(Semaphore::new(config.max_concurrent));
        Ok(Self {
            config: Arc::new(config),
            generator: Arc::new(generator),
            slots,
        })
    }
}

#[derive(Template, WebTemplate)]
#[template(path = "index.html")]
pub(crate) struct IndexTemplate {
    pub(crate) field: &'static str,
}

#[derive(Template, WebTemplate)]
#[template(path = "result.html")]
pub(crate) struct ResultTemplate {
    pub(crate) images: Vec<String>,
}

fn gallery_links(result: GenerationResult) -> Vec<String> {
    match result {
        GenerationResult::Saved(paths) => paths
            .iter()
            .filter_map(|path| path.file_name())
            .map(|name| format!("{OUTPUTS_ROUTE}/{}", name.to_string_lossy()))
            .collect(),
        GenerationResult::Remote(urls) => urls,
    }
}

pub(crate) async fn upload_page() -> IndexTemplate {
    IndexTemplate {
        field: UPLOAD_FIELD,
    }
}

/// Saves the photo, generates, and renders the gallery. Holds one generation slot for
/// the whole wait; if the client goes away the future is dropped and the poll loop with it.
pub(crate) async fn handle_image_upload(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<ResultTemplate, AppError> {
    let _permit = state
        .slots
        .clone()
        .try_acquire_owned()
        .map_err(|_| AppError::Busy)?;

    let upload = read_image_field(&mut multipart, UPLOAD_FIELD).await?;
    let saved = save_upload(&state.config.input_dir, &upload).await?;
    info!(
        "saved upload {} ({} bytes, {})",
        saved.display(),
        upload.bytes.len(),
        upload.content_type.as_deref().unwrap_or("unknown type")
    );

    let result = state.generator.run(&saved, upload.bytes.to_vec()).await?;
    Ok(ResultTemplate {
        images: gallery_links(result),
    })
}

pub fn create_router(state: AppState, output_dir: &Path) -> Router {
    Router::new()
        .route(
            "/",
            get(upload_page)
                .post(handle_image_upload)
                .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES)),
        )
        .nest_service(OUTPUTS_ROUTE, ServeDir::new(output_dir))
        .with_state(state)
}

pub async fn setup_server(
    listen_addr: &str,
    port: NonZeroU16,
    config: AppConfig,
) -> Result<(), anyhow::Error> {
    let output_dir = config.output_dir.clone();
    let provider = config.provider_kind();
    let state = AppState::new(config)?;
    let app = create_router(state, &output_dir);

    let addr = format!("{}:{}", listen_addr, port);
    info!("Starting server on http://{} using {:?}", addr, provider);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    if let Err(err) = axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
        })
        .await
    {
        error!("Server error: {}", err);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    use axum::body::Body;
    use axum::http::{Request, StatusCode, header::CONTENT_TYPE};
    use http_body_util::BodyExt;
    use tower::ServiceExt;

    use crate::config::ProviderConfig;

    fn test_config(root: &Path, max_concurrent: usize) -> AppConfig {
        AppConfig {
            provider: ProviderConfig::Gemini {
                api_key: "key".into(),
                base_url: "http://127.0.0.1:9".into(),
            },
            input_dir: root.join("inputs"),
            output_dir: root.join("outputs/images"),
            logo_path: root.join("logo.png"),
            output_prefix: "indigo".into(),
            max_concurrent,
        }
    }

    fn app(root: &Path, max_concurrent: usize) -> Router {
        let config = test_config(root, max_concurrent);
        let output_dir = config.output_dir.clone();
        create_router(AppState::new(config).unwrap(), &output_dir)
    }

    async fn read_body(response: axum::response::Response) -> String {
        let bytes = response
            .into_body()
            .collect()
            .await
            .expect("collect body")
            .to_bytes();
        String::from_utf8_lossy(&bytes).to_string()
    }

    fn multipart_request(field: &str, file_name: &str, bytes: &[u8]) -> Request<Body> {
        let boundary = "XBOUNDARYX";
        let mut body = Vec::new();
        body.extend_from_slice(
            format!(
                "--{boundary}\r\nContent-Disposition: form-data; name=\"{field}\"; filename=\"{file_name}\"\r\nContent-Type: image/png\r\n\r\n"
            )
            .as_bytes(),
        );
        body.extend_from_slice(bytes);
        body.extend_from_slice(format!("\r\n--{boundary}--\r\n").as_bytes());
        Request::builder()
            .method("POST")
            .uri("/")
            .header(CONTENT_TYPE, format!("multipart/form-data; boundary={boundary}"))
            .body(Body::from(body))
            .unwrap()
    }

    #[tokio::test]
    async fn get_renders_upload_form() {
        let dir = tempfile::tempdir().unwrap();
        let request = Request::builder().uri("/").body(Body::empty()).unwrap();

        let response = app(dir.path(), 1).oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = read_body(response).await;
        assert!(body.contains("enctype=\"multipart/form-data\""));
        assert!(body.contains("name=\"face\""));
    }

    #[tokio::test]
    async fn post_without_face_field_is_bad_request() {
        let dir = tempfile::tempdir().unwrap();
        let request = multipart_request("avatar", "me.png", b"bytes");

        let response = app(dir.path(), 1).oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn provider_failure_is_generic_server_error_after_saving_upload() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("logo.png"), b"logo").unwrap();
        let request = multipart_request("face", "me.png", b"photo bytes");

        let response = app(dir.path(), 1).oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(read_body(response).await, "Internal server error");
        assert_eq!(
            std::fs::read(dir.path().join("inputs/me.png")).unwrap(),
            b"photo bytes"
        );
    }

    #[tokio::test]
    async fn no_free_slot_is_service_unavailable() {
        let dir = tempfile::tempdir().unwrap();
        let config = test_config(dir.path(), 1);
        let output_dir = config.output_dir.clone();
        let state = AppState::new(config).unwrap();
        let _held = state.slots.clone().try_acquire_owned().unwrap();
        let router = create_router(state, &output_dir);

        let response = router
            .oneshot(multipart_request("face", "me.png", b"x"))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
        assert!(!dir.path().join("inputs/me.png").exists());
    }

    #[test]
    fn empty_gallery_renders_notice() {
        let html = ResultTemplate { images: vec![] }.render().unwrap();
        assert!(html.contains("did not return any images"));
    }

    #[test]
    fn gallery_links_point_at_outputs_route() {
        let saved = GenerationResult::Saved(vec![
            PathBuf::from("outputs/images/indigo_1.png"),
            PathBuf::from("outputs/images/indigo_2.png"),
        ]);
        assert_eq!(
            gallery_links(saved),
            vec!["/outputs/indigo_1.png", "/outputs/indigo_2.png"]
        );

        let remote = GenerationResult::Remote(vec!["https://cdn.example/x.png".into()]);
        assert_eq!(gallery_links(remote), vec!["https://cdn.example/x.png"]);
    }
}
