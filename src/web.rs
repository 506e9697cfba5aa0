use crate::completion::{GenerationParams, GroqClient};
use crate::config::{MAX_BODY_BYTES, ServerConfig};
use crate::prompt::{PromptError, PromptTemplate};
use crate::reply::{ResultEnvelope, coerce_answer};
use crate::resolver::{Resolution, ResolveError, Resolver, TOO_SHORT_MESSAGE};
use axum::{
    Json, Router,
    extract::{State, rejection::JsonRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use std::fmt;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::signal;
use tower_http::cors::{Any, CorsLayer};
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tracing::{info, warn};
use utoipa::{OpenApi, ToSchema};

type SharedState = Arc<AppState>;

#[derive(Clone)]
pub struct AppState {
    pub resolver: Resolver,
}

#[derive(Debug)]
pub enum WebError {
    Io(std::io::Error),
    Prompt(PromptError),
}

impl fmt::Display for WebError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WebError::Io(err) => write!(f, "io error: {err}"),
            WebError::Prompt(err) => write!(f, "{err}"),
        }
    }
}

impl std::error::Error for WebError {}

impl From<std::io::Error> for WebError {
    fn from(value: std::io::Error) -> Self {
        WebError::Io(value)
    }
}

impl From<PromptError> for WebError {
    fn from(value: PromptError) -> Self {
        WebError::Prompt(value)
    }
}

pub async fn serve(config: ServerConfig) -> Result<(), WebError> {
    // An unreadable template is a startup failure, never a per-request one.
    let template = PromptTemplate::load(&config.prompt_path)?;
    let client = GroqClient::new(config.api_key.clone(), config.model.clone())
        .with_api_base(config.api_base.clone());
    if !client.has_api_key() {
        warn!("GROQ_API_KEY is not set; every /ask call will fail upstream");
    }
    let state = Arc::new(AppState {
        resolver: Resolver::new(template, Arc::new(client), GenerationParams::default()),
    });
    let base_url = format!("http://{}", config.addr);
    let router = build_router(state, config.enable_openapi.then_some(base_url.as_str()));
    info!(
        %config.addr,
        model = %config.model,
        prompt = %config.prompt_path.display(),
        openapi = config.enable_openapi,
        "Binding HTTP listener"
    );
    let listener = TcpListener::bind(config.addr).await?;
    info!("Server running on {base_url}");
    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    info!("HTTP server exited");
    Ok(())
}

#[derive(Debug)]
struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    fn internal(message: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, message)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let payload = json!({ "error": self.message });
        (self.status, Json(payload)).into_response()
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        // Oversized bodies keep their 413; everything else is a plain bad request.
        let status = match rejection.status() {
            StatusCode::PAYLOAD_TOO_LARGE => StatusCode::PAYLOAD_TOO_LARGE,
            _ => StatusCode::BAD_REQUEST,
        };
        Self::new(status, rejection.body_text())
    }
}

impl From<ResolveError> for ApiError {
    fn from(err: ResolveError) -> Self {
        match err {
            ResolveError::TooShort => ApiError::bad_request(TOO_SHORT_MESSAGE),
            ResolveError::Completion(inner) => {
                warn!(error = %inner, "Completion call failed");
                ApiError::internal(inner.to_string())
            }
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct AskRequest {
    /// Text captured on the page. Non-string scalars are accepted and
    /// stringified; `null`, `false`, `0` and `""` count as no text.
    #[serde(default)]
    #[schema(value_type = Option<String>, example = "What is 2 + 2?")]
    pub text: Option<Value>,
}

impl AskRequest {
    pub fn text(&self) -> String {
        match &self.text {
            None | Some(Value::Null) | Some(Value::Bool(false)) => String::new(),
            Some(Value::Number(n)) if n.as_f64() == Some(0.0) => String::new(),
            Some(Value::Object(_)) => "[object Object]".to_string(),
            Some(value) => coerce_answer(Some(value)),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ErrorBody {
    pub error: String,
}

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Liquid AI Helper API",
        version = "1.0.0",
        description = "API for the browser extension (selection → AI response)."
    ),
    paths(ask, health),
    components(schemas(AskRequest, ResultEnvelope, ErrorBody))
)]
struct ApiDoc;

/// Machine-readable description of the HTTP surface.
pub fn openapi_document(base_url: &str) -> utoipa::openapi::OpenApi {
    let mut doc = ApiDoc::openapi();
    doc.servers = Some(vec![utoipa::openapi::server::Server::new(base_url)]);
    doc
}

/// Builds the application router; `openapi` carries the public base URL when
/// the documentation endpoints should be mounted.
pub fn build_router(state: SharedState, openapi: Option<&str>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let mut router = Router::new()
        .route("/ask", post(ask))
        .route("/healthz", get(health))
        .with_state(state);

    if let Some(base_url) = openapi {
        router = mount_docs(router, openapi_document(base_url));
    }

    router
        .layer(RequestBodyLimitLayer::new(MAX_BODY_BYTES))
        .layer(cors)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().include_headers(true))
                .on_response(DefaultOnResponse::new().include_headers(true)),
        )
}

#[cfg(feature = "web-openapi")]
fn mount_docs(router: Router, doc: utoipa::openapi::OpenApi) -> Router {
    use utoipa_swagger_ui::SwaggerUi;
    router.merge(SwaggerUi::new("/docs").url("/openapi.json", doc))
}

#[cfg(not(feature = "web-openapi"))]
fn mount_docs(router: Router, doc: utoipa::openapi::OpenApi) -> Router {
    let doc = Arc::new(doc);
    router.route(
        "/openapi.json",
        get(move || {
            let doc = Arc::clone(&doc);
            async move { Json(doc.as_ref().clone()) }
        }),
    )
}

async fn shutdown_signal() {
    let ctrl_c = async {
        let _ = signal::ctrl_c().await;
    };
    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{SignalKind, signal};
        if let Ok(mut stream) = signal(SignalKind::terminate()) {
            let _ = stream.recv().await;
        }
    };
    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}

/// Ask the AI helper about selected text.
#[utoipa::path(
    post,
    path = "/ask",
    request_body = AskRequest,
    responses(
        (status = 200, description = "AI result", body = ResultEnvelope),
        (status = 400, description = "Text is too short or the body is not valid JSON", body = ErrorBody),
        (status = 413, description = "Body larger than 100 KiB"),
        (status = 500, description = "Unparseable model output (`{\"answer\":\"—\"}`) or upstream failure (`{\"error\": ...}`)")
    )
)]
async fn ask(
    State(state): State<SharedState>,
    payload: Result<Json<AskRequest>, JsonRejection>,
) -> Result<Response, ApiError> {
    let request = match payload {
        Ok(Json(request)) => request,
        // A body that was not declared as JSON carries no text.
        Err(JsonRejection::MissingJsonContentType(_)) => AskRequest::default(),
        Err(rejection) => return Err(rejection.into()),
    };
    let text = request.text();
    let resolution = state.resolver.resolve(&text).await?;
    let response = match resolution {
        Resolution::Answered(envelope) => (StatusCode::OK, Json(envelope)).into_response(),
        Resolution::Degraded(envelope) => {
            (StatusCode::INTERNAL_SERVER_ERROR, Json(envelope)).into_response()
        }
    };
    Ok(response)
}

#[utoipa::path(
    get,
    path = "/healthz",
    responses((status = 200, description = "Service is up"))
)]
async fn health() -> impl IntoResponse {
    Json(json!({ "status": "ok", "service": "liquid-helper" }))
}
