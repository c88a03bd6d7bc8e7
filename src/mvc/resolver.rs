use crate::mvc::error::{MvcError, Result};
use crate::mvc::mapping::{ArgumentValue, MethodParameter, ParameterKind};
use crate::mvc::request::RequestContext;
use std::sync::Arc;

/// Strategy turning one handler parameter into an argument value.
pub trait HandlerMethodArgumentResolver: Send + Sync {
    fn supports_parameter(&self, parameter: &MethodParameter) -> bool;

    fn resolve_argument(
        &self,
        parameter: &MethodParameter,
        context: &RequestContext,
    ) -> Result<ArgumentValue>;
}

/// Resolver chain used by every handler, in lookup order.
pub fn default_resolvers() -> Vec<Arc<dyn HandlerMethodArgumentResolver>> {
    vec![
        Arc::new(HttpRequestArgumentResolver),
        Arc::new(HttpResponseArgumentResolver),
        Arc::new(RequestParamArgumentResolver),
        Arc::new(PathVariableArgumentResolver),
        Arc::new(ModelArgumentResolver),
    ]
}

#[derive(Debug, Default)]
pub struct HttpRequestArgumentResolver;

impl HandlerMethodArgumentResolver for HttpRequestArgumentResolver {
    fn supports_parameter(&self, parameter: &MethodParameter) -> bool {
        matches!(parameter.kind(), ParameterKind::Request)
    }

    fn resolve_argument(&self, _: &MethodParameter, context: &RequestContext) -> Result<ArgumentValue> {
        Ok(ArgumentValue::Request(context.request()))
    }
}

#[derive(Debug, Default)]
pub struct HttpResponseArgumentResolver;

impl HandlerMethodArgumentResolver for HttpResponseArgumentResolver {
    fn supports_parameter(&self, parameter: &MethodParameter) -> bool {
        matches!(parameter.kind(), ParameterKind::Response)
    }

    fn resolve_argument(&self, _: &MethodParameter, context: &RequestContext) -> Result<ArgumentValue> {
        Ok(ArgumentValue::Response(context.response().clone()))
    }
}

#[derive(Debug, Default)]
pub struct RequestParamArgumentResolver;

impl HandlerMethodArgumentResolver for RequestParamArgumentResolver {
    fn supports_parameter(&self, parameter: &MethodParameter) -> bool {
        matches!(parameter.kind(), ParameterKind::RequestParam { .. })
    }

    fn resolve_argument(
        &self,
        parameter: &MethodParameter,
        context: &RequestContext,
    ) -> Result<ArgumentValue> {
        let ParameterKind::RequestParam { name, required } = parameter.kind() else {
            return Err(MvcError::ArgumentMismatch {
                index: parameter.index(),
                expected: "request parameter",
            });
        };

        match context.parameter(name) {
            Some(value) => Ok(ArgumentValue::Text(Some(value.to_string()))),
            None if *required => Err(MvcError::MissingParameter { name: name.clone() }),
            None => Ok(ArgumentValue::Text(None)),
        }
    }
}

#[derive(Debug, Default)]
pub struct PathVariableArgumentResolver;

impl HandlerMethodArgumentResolver for PathVariableArgumentResolver {
    fn supports_parameter(&self, parameter: &MethodParameter) -> bool {
        matches!(parameter.kind(), ParameterKind::PathVariable { .. })
    }

    fn resolve_argument(
        &self,
        parameter: &MethodParameter,
        context: &RequestContext,
    ) -> Result<ArgumentValue> {
        let ParameterKind::PathVariable { name } = parameter.kind() else {
            return Err(MvcError::ArgumentMismatch {
                index: parameter.index(),
                expected: "path variable",
            });
        };

        context
            .path_variable(name)
            .map(|value| ArgumentValue::Text(Some(value.to_string())))
            .ok_or_else(|| MvcError::MissingPathVariable { name: name.clone() })
    }
}

#[derive(Debug, Default)]
pub struct ModelArgumentResolver;

impl HandlerMethodArgumentResolver for ModelArgumentResolver {
    fn supports_parameter(&self, parameter: &MethodParameter) -> bool {
        matches!(parameter.kind(), ParameterKind::Model)
    }

    fn resolve_argument(&self, _: &MethodParameter, context: &RequestContext) -> Result<ArgumentValue> {
        Ok(ArgumentValue::Model(context.model().clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Bytes;
    use axum::http::Request;
    use std::collections::HashMap;

    fn context(uri: &str) -> RequestContext {
        RequestContext::new(Request::builder().uri(uri).body(Bytes::new()).unwrap())
    }

    fn resolve(kind: ParameterKind, context: &RequestContext) -> Result<ArgumentValue> {
        let parameter = MethodParameter::new(0, kind);
        let resolver = default_resolvers()
            .into_iter()
            .find(|resolver| resolver.supports_parameter(&parameter))
            .unwrap();
        resolver.resolve_argument(&parameter, context)
    }

    #[test]
    fn test_every_kind_has_exactly_one_resolver() {
        let kinds = [
            ParameterKind::Request,
            ParameterKind::Response,
            ParameterKind::RequestParam {
                name: "id".into(),
                required: true,
            },
            ParameterKind::PathVariable { name: "id".into() },
            ParameterKind::Model,
        ];
        let resolvers = default_resolvers();
        for kind in kinds {
            let parameter = MethodParameter::new(0, kind);
            let supporting = resolvers
                .iter()
                .filter(|resolver| resolver.supports_parameter(&parameter))
                .count();
            assert_eq!(supporting, 1, "{:?}", parameter);
        }
    }

    #[test]
    fn test_request_param() {
        let context = context("/users?account=gugu");
        let value = resolve(
            ParameterKind::RequestParam {
                name: "account".into(),
                required: true,
            },
            &context,
        )
        .unwrap();
        assert!(matches!(value, ArgumentValue::Text(Some(ref v)) if v == "gugu"));
    }

    #[test]
    fn test_missing_required_param() {
        let context = context("/users");
        let result = resolve(
            ParameterKind::RequestParam {
                name: "account".into(),
                required: true,
            },
            &context,
        );
        assert!(matches!(result, Err(MvcError::MissingParameter { .. })));

        let optional = resolve(
            ParameterKind::RequestParam {
                name: "account".into(),
                required: false,
            },
            &context,
        )
        .unwrap();
        assert!(matches!(optional, ArgumentValue::Text(None)));
    }

    #[test]
    fn test_path_variable() {
        let context = context("/users/42")
            .with_path_variables(HashMap::from([("id".to_string(), "42".to_string())]));
        let value = resolve(ParameterKind::PathVariable { name: "id".into() }, &context).unwrap();
        assert!(matches!(value, ArgumentValue::Text(Some(ref v)) if v == "42"));

        let result = resolve(ParameterKind::PathVariable { name: "name".into() }, &context);
        assert!(matches!(result, Err(MvcError::MissingPathVariable { .. })));
    }

    #[test]
    fn test_model_is_shared_with_context() {
        let context = context("/");
        let ArgumentValue::Model(model) = resolve(ParameterKind::Model, &context).unwrap() else {
            panic!("expected model");
        };
        model.add_attribute("id", 1).unwrap();
        assert!(context.model().contains_attribute("id"));
    }
}
