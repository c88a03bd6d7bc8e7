use crate::mvc::error::{MvcError, Result};
use crate::mvc::mapping::{ModelAndView, View};
use crate::mvc::method::RequestMethod;
use crate::mvc::registry::AnnotationHandlerMapping;
use crate::mvc::request::RequestContext;
use axum::{
    Router,
    body::{Body, Bytes},
    extract::Request,
    http::{
        HeaderValue, StatusCode,
        header::{CONTENT_TYPE, LOCATION},
    },
    response::{IntoResponse, Response},
};
use http_body_util::LengthLimitError;
use std::sync::Arc;
use tokio::net::{TcpListener, ToSocketAddrs};

/// Largest request body read before dispatch.
const MAX_BODY_SIZE: usize = 2 * 1024 * 1024;

/// Front controller: looks up the handler, runs it and renders its view.
///
/// # Example
/// ```rust,ignore
/// let context = ApplicationContext::builder().base_package("my_app").build()?;
/// context.dispatcher().serve("127.0.0.1:8080").await?;
/// ```
#[derive(Debug, Clone)]
pub struct Dispatcher {
    handler_mapping: Arc<AnnotationHandlerMapping>,
}

impl Dispatcher {
    pub fn new(handler_mapping: Arc<AnnotationHandlerMapping>) -> Self {
        Self { handler_mapping }
    }

    pub fn handler_mapping(&self) -> &Arc<AnnotationHandlerMapping> {
        &self.handler_mapping
    }

    pub fn dispatch(&self, request: axum::http::Request<Bytes>) -> Result<Response> {
        let method = RequestMethod::try_from(request.method())?;
        let path = request.uri().path().to_string();

        let Some(matched) = self.handler_mapping.get_handler(method, &path) else {
            if self.handler_mapping.has_path(&path) {
                return Err(MvcError::UnsupportedMethod {
                    method: method.to_string(),
                });
            }
            return Err(MvcError::HandlerNotFound {
                method: method.to_string(),
                path,
            });
        };

        let context = RequestContext::new(request).with_path_variables(matched.path_variables);
        let model_and_view = matched.execution.handle(&context)?;
        render(&context, model_and_view)
    }

    /// Dispatch and turn any failure into an error response.
    pub fn handle(&self, request: axum::http::Request<Bytes>) -> Response {
        let method = request.method().clone();
        let path = request.uri().path().to_string();

        match self.dispatch(request) {
            Ok(response) => response,
            Err(e) => {
                if e.status().is_server_error() {
                    tracing::error!("{} {} failed: {}", method, path, e);
                } else {
                    tracing::debug!("{} {} rejected: {}", method, path, e);
                }
                e.into_response()
            }
        }
    }

    async fn handle_body(&self, request: Request) -> Response {
        let (parts, body) = request.into_parts();
        match axum::body::to_bytes(body, MAX_BODY_SIZE).await {
            Ok(bytes) => self.handle(axum::http::Request::from_parts(parts, bytes)),
            Err(e) => {
                let status = body_error_status(&e);
                tracing::debug!("Could not read request body ({}): {}", status, e);
                (status, e.to_string()).into_response()
            }
        }
    }

    /// An axum router sending every request through this dispatcher.
    pub fn router(&self) -> Router {
        let dispatcher = self.clone();
        Router::new().fallback(move |request: Request| {
            let dispatcher = dispatcher.clone();
            async move { dispatcher.handle_body(request).await }
        })
    }

    pub async fn serve<A: ToSocketAddrs>(&self, addr: A) -> std::io::Result<()> {
        let listener = TcpListener::bind(addr).await?;
        tracing::info!("Dispatcher listening on {}", listener.local_addr()?);
        axum::serve(listener, self.router()).await
    }
}

/// 413 when the body went over `MAX_BODY_SIZE`, 400 for any other read failure.
fn body_error_status(error: &axum::Error) -> StatusCode {
    let over_limit = std::iter::successors(
        Some(error as &(dyn std::error::Error + 'static)),
        |e| e.source(),
    )
    .any(|e| e.is::<LengthLimitError>());

    if over_limit {
        StatusCode::PAYLOAD_TOO_LARGE
    } else {
        StatusCode::BAD_REQUEST
    }
}

fn render(context: &RequestContext, model_and_view: ModelAndView) -> Result<Response> {
    let mut response = match model_and_view.view() {
        View::Json => {
            let model = context.model().clone();
            model.merge(model_and_view.model());
            let body = serde_json::to_vec(&model.to_json())?;

            let mut response = Response::new(Body::from(body));
            *response.status_mut() = context.response().status();
            response
                .headers_mut()
                .insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
            response
        }
        View::Redirect(location) => {
            let mut response = Response::new(Body::empty());
            *response.status_mut() = StatusCode::FOUND;
            response
                .headers_mut()
                .insert(LOCATION, HeaderValue::from_str(location)?);
            response
        }
    };

    for (name, value) in context.response().headers().iter() {
        response.headers_mut().insert(name.clone(), value.clone());
    }
    Ok(response)
}
