//! Request dispatch: controller handler table and argument resolution.

pub mod dispatcher;
pub mod error;
pub mod handler;
pub mod mapping;
pub mod method;
pub mod pattern;
pub mod registry;
pub mod request;
pub mod resolver;

pub use dispatcher::Dispatcher;
pub use error::MvcError;
pub use handler::{HandlerExecution, HandlerKey};
pub use mapping::{
    ArgumentValue, Controller, HandlerArguments, MethodParameter, ModelAndView, ParameterKind,
    RequestMapping, View,
};
pub use method::RequestMethod;
pub use registry::{AnnotationHandlerMapping, HandlerMappingScanner, HandlerMatch};
pub use request::{HttpResponse, Model, RequestContext};
pub use resolver::{
    HandlerMethodArgumentResolver, HttpRequestArgumentResolver, HttpResponseArgumentResolver,
    ModelArgumentResolver, PathVariableArgumentResolver, RequestParamArgumentResolver,
    default_resolvers,
};
