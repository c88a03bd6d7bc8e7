use crate::beans::TypeKey;
use crate::mvc::error::{MvcError, Result};
use crate::mvc::method::RequestMethod;
use crate::mvc::request::{HttpResponse, Model};
use axum::body::Bytes;
use axum::http::Request;
use serde::Serialize;
use std::any::Any;
use std::fmt;
use std::sync::Arc;

/// A bean exposing request handlers.
///
/// # Example
/// ```rust,ignore
/// #[derive(Component)]
/// #[component(controller)]
/// pub struct UserController {
///     user_service: Arc<UserService>,
/// }
///
/// impl Controller for UserController {
///     fn request_mappings() -> Vec<RequestMapping> {
///         vec![
///             RequestMapping::new("/users", "find_user", |this: &Self, args| {
///                 let account = args.param(0)?.unwrap_or_default();
///                 let user = this.user_service.find(&account)?;
///                 ModelAndView::json().add_object("user", user)
///             })
///             .method(RequestMethod::Get)
///             .request_param("account"),
///         ]
///     }
/// }
/// ```
pub trait Controller: Send + Sync + 'static {
    fn request_mappings() -> Vec<RequestMapping>;
}

/// Binding hint of one handler parameter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParameterKind {
    Request,
    Response,
    RequestParam { name: String, required: bool },
    PathVariable { name: String },
    Model,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MethodParameter {
    index: usize,
    kind: ParameterKind,
}

impl MethodParameter {
    pub fn new(index: usize, kind: ParameterKind) -> Self {
        Self { index, kind }
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn kind(&self) -> &ParameterKind {
        &self.kind
    }
}

/// A resolved handler argument.
#[derive(Debug, Clone)]
pub enum ArgumentValue {
    Request(Arc<Request<Bytes>>),
    Response(HttpResponse),
    /// Request parameter or path variable; `None` for an absent optional parameter.
    Text(Option<String>),
    Model(Model),
}

/// Resolved arguments handed to a handler, in parameter order.
#[derive(Debug, Clone, Default)]
pub struct HandlerArguments {
    values: Vec<ArgumentValue>,
}

impl HandlerArguments {
    pub fn new(values: Vec<ArgumentValue>) -> Self {
        Self { values }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn request(&self, index: usize) -> Result<Arc<Request<Bytes>>> {
        match self.values.get(index) {
            Some(ArgumentValue::Request(request)) => Ok(Arc::clone(request)),
            _ => Err(MvcError::ArgumentMismatch {
                index,
                expected: "request",
            }),
        }
    }

    pub fn response(&self, index: usize) -> Result<HttpResponse> {
        match self.values.get(index) {
            Some(ArgumentValue::Response(response)) => Ok(response.clone()),
            _ => Err(MvcError::ArgumentMismatch {
                index,
                expected: "response",
            }),
        }
    }

    /// A request parameter or path variable.
    pub fn param(&self, index: usize) -> Result<Option<String>> {
        match self.values.get(index) {
            Some(ArgumentValue::Text(value)) => Ok(value.clone()),
            _ => Err(MvcError::ArgumentMismatch {
                index,
                expected: "text value",
            }),
        }
    }

    pub fn model(&self, index: usize) -> Result<Model> {
        match self.values.get(index) {
            Some(ArgumentValue::Model(model)) => Ok(model.clone()),
            _ => Err(MvcError::ArgumentMismatch {
                index,
                expected: "model",
            }),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum View {
    /// Render the model as a JSON object.
    Json,
    /// Respond with `302 Found` to the given location.
    Redirect(String),
}

/// Handler result: which view to render and the model to render it with.
#[derive(Debug, Clone)]
pub struct ModelAndView {
    view: View,
    model: Model,
}

impl ModelAndView {
    pub fn new(view: View) -> Self {
        Self {
            view,
            model: Model::new(),
        }
    }

    pub fn json() -> Self {
        Self::new(View::Json)
    }

    pub fn redirect(location: impl Into<String>) -> Self {
        Self::new(View::Redirect(location.into()))
    }

    pub fn with_model(mut self, model: Model) -> Self {
        self.model = model;
        self
    }

    pub fn add_object<T: Serialize>(self, name: &str, value: T) -> anyhow::Result<Self> {
        self.model.add_attribute(name, value)?;
        Ok(self)
    }

    pub fn view(&self) -> &View {
        &self.view
    }

    pub fn model(&self) -> &Model {
        &self.model
    }
}

type Invoker =
    Arc<dyn Fn(&(dyn Any + Send + Sync), HandlerArguments) -> Result<ModelAndView> + Send + Sync>;

/// One routed handler method of a controller.
#[derive(Clone)]
pub struct RequestMapping {
    path: String,
    methods: Vec<RequestMethod>,
    method_name: String,
    controller: TypeKey,
    parameters: Vec<MethodParameter>,
    invoker: Invoker,
}

impl RequestMapping {
    /// Map `path` to `handler`. Without [`method`](Self::method) calls the mapping
    /// answers every verb.
    pub fn new<C, F>(path: impl Into<String>, method_name: impl Into<String>, handler: F) -> Self
    where
        C: Send + Sync + 'static,
        F: Fn(&C, HandlerArguments) -> anyhow::Result<ModelAndView> + Send + Sync + 'static,
    {
        let invoker: Invoker = Arc::new(move |target: &(dyn Any + Send + Sync), args| {
            let controller =
                target
                    .downcast_ref::<C>()
                    .ok_or_else(|| MvcError::TargetMismatch {
                        expected: std::any::type_name::<C>().to_string(),
                    })?;
            handler(controller, args).map_err(MvcError::from_handler)
        });

        Self {
            path: path.into(),
            methods: Vec::new(),
            method_name: method_name.into(),
            controller: TypeKey::of::<C>(),
            parameters: Vec::new(),
            invoker,
        }
    }

    pub fn method(mut self, method: RequestMethod) -> Self {
        if !self.methods.contains(&method) {
            self.methods.push(method);
        }
        self
    }

    pub fn methods<I: IntoIterator<Item = RequestMethod>>(self, methods: I) -> Self {
        methods.into_iter().fold(self, Self::method)
    }

    pub fn request(self) -> Self {
        self.parameter(ParameterKind::Request)
    }

    pub fn response(self) -> Self {
        self.parameter(ParameterKind::Response)
    }

    pub fn request_param(self, name: impl Into<String>) -> Self {
        self.parameter(ParameterKind::RequestParam {
            name: name.into(),
            required: true,
        })
    }

    pub fn optional_param(self, name: impl Into<String>) -> Self {
        self.parameter(ParameterKind::RequestParam {
            name: name.into(),
            required: false,
        })
    }

    pub fn path_variable(self, name: impl Into<String>) -> Self {
        self.parameter(ParameterKind::PathVariable { name: name.into() })
    }

    pub fn model(self) -> Self {
        self.parameter(ParameterKind::Model)
    }

    pub fn parameter(mut self, kind: ParameterKind) -> Self {
        let index = self.parameters.len();
        self.parameters.push(MethodParameter::new(index, kind));
        self
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    /// Declared verbs; empty means every verb.
    pub fn request_methods(&self) -> &[RequestMethod] {
        &self.methods
    }

    pub fn method_name(&self) -> &str {
        &self.method_name
    }

    pub fn controller(&self) -> TypeKey {
        self.controller
    }

    pub fn parameters(&self) -> &[MethodParameter] {
        &self.parameters
    }

    /// `Controller::method` label used in logs and errors.
    pub fn handler_name(&self) -> String {
        format!("{}::{}", self.controller.short_name(), self.method_name)
    }

    pub(crate) fn invoke(
        &self,
        target: &(dyn Any + Send + Sync),
        args: HandlerArguments,
    ) -> Result<ModelAndView> {
        (self.invoker)(target, args)
    }
}

impl fmt::Debug for RequestMapping {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RequestMapping")
            .field("path", &self.path)
            .field("methods", &self.methods)
            .field("handler", &self.handler_name())
            .field("parameters", &self.parameters)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct GreetingController {
        greeting: String,
    }

    fn greet_mapping() -> RequestMapping {
        RequestMapping::new("/greet", "greet", |this: &GreetingController, args| {
            let name = args.param(0)?.unwrap_or_else(|| "world".to_string());
            ModelAndView::json().add_object("message", format!("{}, {}", this.greeting, name))
        })
        .method(RequestMethod::Get)
        .method(RequestMethod::Get)
        .optional_param("name")
    }

    #[test]
    fn test_builder_collects_parameters() {
        let mapping = greet_mapping();
        assert_eq!(mapping.request_methods(), &[RequestMethod::Get]);
        assert_eq!(mapping.parameters().len(), 1);
        assert_eq!(
            mapping.parameters()[0].kind(),
            &ParameterKind::RequestParam {
                name: "name".to_string(),
                required: false
            }
        );
        assert_eq!(mapping.handler_name(), "GreetingController::greet");
    }

    #[test]
    fn test_invoke_calls_handler_on_target() {
        let controller = GreetingController {
            greeting: "hello".to_string(),
        };
        let args = HandlerArguments::new(vec![ArgumentValue::Text(Some("gugu".to_string()))]);

        let model_and_view = greet_mapping().invoke(&controller, args).unwrap();
        assert_eq!(model_and_view.view(), &View::Json);
        assert_eq!(
            model_and_view.model().get_attribute("message"),
            Some(serde_json::json!("hello, gugu"))
        );
    }

    #[test]
    fn test_invoke_with_wrong_target_fails() {
        let result = greet_mapping().invoke(&String::from("not a controller"), HandlerArguments::default());
        assert!(matches!(result, Err(MvcError::TargetMismatch { .. })));
    }

    #[test]
    fn test_argument_accessor_mismatch() {
        let args = HandlerArguments::new(vec![ArgumentValue::Model(Model::new())]);
        assert!(args.model(0).is_ok());
        assert!(matches!(args.param(0), Err(MvcError::ArgumentMismatch { index: 0, .. })));
        assert!(matches!(args.request(1), Err(MvcError::ArgumentMismatch { index: 1, .. })));
    }
}
