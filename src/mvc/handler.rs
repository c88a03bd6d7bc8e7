use crate::beans::BeanObject;
use crate::mvc::error::{MvcError, Result};
use crate::mvc::mapping::{HandlerArguments, ModelAndView, RequestMapping};
use crate::mvc::method::RequestMethod;
use crate::mvc::pattern::normalize_path;
use crate::mvc::request::RequestContext;
use crate::mvc::resolver::HandlerMethodArgumentResolver;
use std::fmt;
use std::sync::Arc;

/// Routing identity: normalized URL pattern and verb.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct HandlerKey {
    url: String,
    method: RequestMethod,
}

impl HandlerKey {
    pub fn new(url: &str, method: RequestMethod) -> Self {
        Self {
            url: normalize_path(url),
            method,
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn method(&self) -> RequestMethod {
        self.method
    }
}

impl fmt::Display for HandlerKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.method, self.url)
    }
}

/// A handler bound to its controller instance and the argument resolver chain.
#[derive(Clone)]
pub struct HandlerExecution {
    resolvers: Vec<Arc<dyn HandlerMethodArgumentResolver>>,
    target: BeanObject,
    mapping: RequestMapping,
}

impl HandlerExecution {
    pub fn new(
        target: BeanObject,
        mapping: RequestMapping,
        resolvers: Vec<Arc<dyn HandlerMethodArgumentResolver>>,
    ) -> Self {
        Self {
            resolvers,
            target,
            mapping,
        }
    }

    pub fn mapping(&self) -> &RequestMapping {
        &self.mapping
    }

    /// Resolve each parameter with the first supporting resolver, then call the handler.
    pub fn handle(&self, context: &RequestContext) -> Result<ModelAndView> {
        let mut values = Vec::with_capacity(self.mapping.parameters().len());
        for parameter in self.mapping.parameters() {
            let resolver = self
                .resolvers
                .iter()
                .find(|resolver| resolver.supports_parameter(parameter))
                .ok_or_else(|| MvcError::UnsupportedParameter {
                    handler: self.mapping.handler_name(),
                    index: parameter.index(),
                })?;
            values.push(resolver.resolve_argument(parameter, context)?);
        }

        tracing::debug!("Invoking {}", self.mapping.handler_name());
        self.mapping
            .invoke(self.target.as_ref(), HandlerArguments::new(values))
    }
}

impl fmt::Debug for HandlerExecution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HandlerExecution")
            .field("mapping", &self.mapping)
            .field("resolvers", &self.resolvers.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mvc::resolver::default_resolvers;
    use axum::body::Bytes;
    use axum::http::Request;

    struct EchoController;

    fn execution(mapping: RequestMapping) -> HandlerExecution {
        HandlerExecution::new(Arc::new(EchoController), mapping, default_resolvers())
    }

    #[test]
    fn test_handler_key_normalizes_url() {
        assert_eq!(
            HandlerKey::new("users/", RequestMethod::Get),
            HandlerKey::new("/users", RequestMethod::Get)
        );
        assert_ne!(
            HandlerKey::new("/users", RequestMethod::Get),
            HandlerKey::new("/users", RequestMethod::Post)
        );
        assert_eq!(HandlerKey::new("/users", RequestMethod::Get).to_string(), "GET /users");
    }

    #[test]
    fn test_handle_resolves_arguments_in_order() {
        let mapping = RequestMapping::new("/echo", "echo", |_: &EchoController, args| {
            let request = args.request(0)?;
            let word = args.param(1)?.unwrap_or_default();
            let model = args.model(2)?;
            model.add_attribute("path", request.uri().path())?;
            ModelAndView::json().add_object("word", word)
        })
        .request()
        .request_param("word")
        .model();

        let context = RequestContext::new(
            Request::builder()
                .uri("/echo?word=hello")
                .body(Bytes::new())
                .unwrap(),
        );
        let model_and_view = execution(mapping).handle(&context).unwrap();

        assert_eq!(
            model_and_view.model().get_attribute("word"),
            Some(serde_json::json!("hello"))
        );
        assert_eq!(
            context.model().get_attribute("path"),
            Some(serde_json::json!("/echo"))
        );
    }

    #[test]
    fn test_handle_without_resolvers_fails() {
        let mapping = RequestMapping::new("/echo", "echo", |_: &EchoController, _| {
            Ok(ModelAndView::json())
        })
        .request();
        let execution = HandlerExecution::new(Arc::new(EchoController), mapping, Vec::new());
        let context =
            RequestContext::new(Request::builder().uri("/echo").body(Bytes::new()).unwrap());

        let result = execution.handle(&context);
        assert!(matches!(result, Err(MvcError::UnsupportedParameter { index: 0, .. })));
    }

    #[test]
    fn test_handler_error_is_wrapped() {
        let mapping = RequestMapping::new("/fail", "fail", |_: &EchoController, _| {
            Err(anyhow::anyhow!("boom"))
        });
        let context =
            RequestContext::new(Request::builder().uri("/fail").body(Bytes::new()).unwrap());

        let result = execution(mapping).handle(&context);
        assert!(matches!(result, Err(MvcError::Handler(_))));
    }
}
