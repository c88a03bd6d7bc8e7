use crate::mvc::error::MvcError;
use axum::http::Method;
use strum::IntoEnumIterator;
use strum_macros::{Display, EnumIter, EnumString};

/// HTTP verbs a handler can be mapped to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Display, EnumIter, EnumString)]
#[strum(serialize_all = "UPPERCASE")]
pub enum RequestMethod {
    Get,
    Head,
    Post,
    Put,
    Patch,
    Delete,
    Options,
    Trace,
}

impl RequestMethod {
    pub fn all() -> Vec<RequestMethod> {
        Self::iter().collect()
    }
}

impl TryFrom<&Method> for RequestMethod {
    type Error = MvcError;

    fn try_from(method: &Method) -> Result<Self, Self::Error> {
        method
            .as_str()
            .parse()
            .map_err(|_| MvcError::UnsupportedMethod {
                method: method.to_string(),
            })
    }
}

impl From<RequestMethod> for Method {
    fn from(method: RequestMethod) -> Self {
        match method {
            RequestMethod::Get => Method::GET,
            RequestMethod::Head => Method::HEAD,
            RequestMethod::Post => Method::POST,
            RequestMethod::Put => Method::PUT,
            RequestMethod::Patch => Method::PATCH,
            RequestMethod::Delete => Method::DELETE,
            RequestMethod::Options => Method::OPTIONS,
            RequestMethod::Trace => Method::TRACE,
        }
    }
}
