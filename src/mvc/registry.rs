use crate::beans::BeanFactory;
use crate::mvc::error::Result;
use crate::mvc::handler::{HandlerExecution, HandlerKey};
use crate::mvc::method::RequestMethod;
use crate::mvc::pattern::{PathPattern, normalize_path};
use crate::mvc::resolver::{HandlerMethodArgumentResolver, default_resolvers};
use std::collections::HashMap;
use std::sync::Arc;

/// Builds the handler table from the controllers of an initialized [`BeanFactory`].
pub struct HandlerMappingScanner {
    resolvers: Vec<Arc<dyn HandlerMethodArgumentResolver>>,
}

impl HandlerMappingScanner {
    pub fn new() -> Self {
        Self::with_resolvers(default_resolvers())
    }

    pub fn with_resolvers(resolvers: Vec<Arc<dyn HandlerMethodArgumentResolver>>) -> Self {
        Self { resolvers }
    }

    /// One entry per (path, verb). A mapping without verbs is registered under every
    /// verb. When two handlers claim the same key the later one replaces the earlier.
    pub fn scan(&self, bean_factory: &BeanFactory) -> Result<HashMap<HandlerKey, HandlerExecution>> {
        let mut controllers: Vec<_> = bean_factory.get_controllers().into_iter().collect();
        controllers.sort_by_key(|(key, _)| key.name());

        let mut handlers = HashMap::new();
        for (key, controller) in controllers {
            let definition = bean_factory.registry().get_bean_definition(&key)?;
            let Some(request_mappings) = definition.request_mappings() else {
                tracing::debug!("Controller {} declares no request mappings", key);
                continue;
            };

            for mapping in request_mappings() {
                let methods = if mapping.request_methods().is_empty() {
                    RequestMethod::all()
                } else {
                    mapping.request_methods().to_vec()
                };

                for method in methods {
                    let handler_key = HandlerKey::new(mapping.path(), method);
                    let execution = HandlerExecution::new(
                        Arc::clone(&controller),
                        mapping.clone(),
                        self.resolvers.clone(),
                    );
                    match handlers.insert(handler_key.clone(), execution) {
                        Some(previous) => tracing::warn!(
                            "{} was mapped to {}, replaced by {}",
                            handler_key,
                            previous.mapping().handler_name(),
                            mapping.handler_name()
                        ),
                        None => tracing::debug!("Mapped {} to {}", handler_key, mapping.handler_name()),
                    }
                }
            }
        }
        Ok(handlers)
    }
}

impl Default for HandlerMappingScanner {
    fn default() -> Self {
        Self::new()
    }
}

/// A matched handler and the variables extracted from the request path.
#[derive(Debug)]
pub struct HandlerMatch<'a> {
    pub execution: &'a HandlerExecution,
    pub path_variables: HashMap<String, String>,
}

/// Request lookup over the handler table.
#[derive(Debug, Default)]
pub struct AnnotationHandlerMapping {
    handlers: HashMap<HandlerKey, HandlerExecution>,
    patterns: Vec<(HandlerKey, PathPattern)>,
}

impl AnnotationHandlerMapping {
    pub fn new(handlers: HashMap<HandlerKey, HandlerExecution>) -> Self {
        let mut patterns: Vec<(HandlerKey, PathPattern)> = handlers
            .keys()
            .map(|key| (key.clone(), PathPattern::parse(key.url())))
            .filter(|(_, pattern)| pattern.is_dynamic())
            .collect();
        // Fewer variables means a more specific pattern.
        patterns.sort_by(|(a_key, a), (b_key, b)| {
            a.variable_count()
                .cmp(&b.variable_count())
                .then_with(|| a_key.cmp(b_key))
        });

        tracing::info!("Initialized handler mapping with {} handlers", handlers.len());
        Self { handlers, patterns }
    }

    pub fn initialize(bean_factory: &BeanFactory) -> Result<Self> {
        Ok(Self::new(HandlerMappingScanner::new().scan(bean_factory)?))
    }

    /// Exact key lookup first, then `{variable}` patterns.
    pub fn get_handler(&self, method: RequestMethod, path: &str) -> Option<HandlerMatch<'_>> {
        let key = HandlerKey::new(path, method);
        if let Some(execution) = self.handlers.get(&key) {
            return Some(HandlerMatch {
                execution,
                path_variables: HashMap::new(),
            });
        }

        let path = normalize_path(path);
        self.patterns
            .iter()
            .filter(|(pattern_key, _)| pattern_key.method() == method)
            .find_map(|(pattern_key, pattern)| {
                let path_variables = pattern.matches(&path)?;
                let execution = self.handlers.get(pattern_key)?;
                Some(HandlerMatch {
                    execution,
                    path_variables,
                })
            })
    }

    /// Whether any verb is mapped for `path`, used to tell 404 from 405.
    pub fn has_path(&self, path: &str) -> bool {
        let path = normalize_path(path);
        self.handlers.keys().any(|key| key.url() == path)
            || self
                .patterns
                .iter()
                .any(|(_, pattern)| pattern.matches(&path).is_some())
    }

    pub fn keys(&self) -> impl Iterator<Item = &HandlerKey> {
        self.handlers.keys()
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}
