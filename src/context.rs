//! Application bootstrap
//!
//! Wires scanning, bean construction and the handler table into one
//! ready-to-serve context.

use crate::beans::{
    BeanDefinition, BeanDefinitionRegistry, BeanFactory, ClassPathBeanScanner, TypeKey,
};
use crate::config::Environment;
use crate::error::BeanError;
use crate::mvc::{AnnotationHandlerMapping, Dispatcher, MvcError};
use std::sync::Arc;
use thiserror::Error;

/// Property listing the base packages to scan when none are given to the builder.
pub const SCAN_PACKAGES_PROPERTY: &str = "SCAN_PACKAGES";

/// Errors that can occur while building an [`ApplicationContext`]
#[derive(Debug, Error)]
pub enum ContextError {
    #[error("Container initialization failed: {0}")]
    Bean(#[from] BeanError),

    #[error("Handler mapping failed: {0}")]
    Mvc(#[from] MvcError),
}

/// A specialized Result type for bootstrap operations
pub type Result<T> = std::result::Result<T, ContextError>;

/// An initialized container together with its handler table.
///
/// # Example
///
/// ```rust,ignore
/// #[tokio::main]
/// async fn main() -> anyhow::Result<()> {
///     let context = ApplicationContext::builder()
///         .base_package("my_app")
///         .build()?;
///
///     let users = context.get_bean::<UserService>()?;
///     context.dispatcher().serve("127.0.0.1:8080").await?;
///     Ok(())
/// }
/// ```
pub struct ApplicationContext {
    bean_factory: Arc<BeanFactory>,
    handler_mapping: Arc<AnnotationHandlerMapping>,
    environment: Environment,
}

impl ApplicationContext {
    pub fn builder() -> ApplicationContextBuilder {
        ApplicationContextBuilder::new()
    }

    pub fn bean_factory(&self) -> &Arc<BeanFactory> {
        &self.bean_factory
    }

    pub fn get_bean<T: ?Sized + Send + Sync + 'static>(&self) -> crate::Result<Arc<T>> {
        self.bean_factory.get_bean::<T>()
    }

    pub fn environment(&self) -> &Environment {
        &self.environment
    }

    pub fn handler_mapping(&self) -> &Arc<AnnotationHandlerMapping> {
        &self.handler_mapping
    }

    pub fn dispatcher(&self) -> Dispatcher {
        Dispatcher::new(Arc::clone(&self.handler_mapping))
    }
}

/// Builder for [`ApplicationContext`]
#[derive(Default)]
pub struct ApplicationContextBuilder {
    base_packages: Vec<String>,
    registries: Vec<BeanDefinitionRegistry>,
    definitions: Vec<BeanDefinition>,
    environment: Option<Environment>,
}

impl ApplicationContextBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a module path to scan, e.g. `my_app::user`
    pub fn base_package(mut self, package: impl Into<String>) -> Self {
        self.base_packages.push(package.into());
        self
    }

    pub fn base_packages<I, S>(mut self, packages: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.base_packages.extend(packages.into_iter().map(Into::into));
        self
    }

    /// Merge an explicitly built registry into the scanned one
    pub fn registry(mut self, registry: BeanDefinitionRegistry) -> Self {
        self.registries.push(registry);
        self
    }

    /// Register one definition next to the scanned ones
    pub fn bean_definition(mut self, definition: BeanDefinition) -> Self {
        self.definitions.push(definition);
        self
    }

    /// Use `environment` instead of the process environment
    pub fn environment(mut self, environment: Environment) -> Self {
        self.environment = Some(environment);
        self
    }

    /// Scan, construct every singleton and build the handler table.
    ///
    /// Base packages fall back to the comma separated `SCAN_PACKAGES` property. Scanning
    /// is skipped when there are no packages but explicit registries or definitions.
    ///
    /// # Errors
    ///
    /// Returns an error if scanning, registration, construction or handler mapping fails.
    pub fn build(self) -> Result<ApplicationContext> {
        let environment = self.environment.unwrap_or_else(Environment::from_env);

        let base_packages = if self.base_packages.is_empty() {
            environment.get_list(SCAN_PACKAGES_PROPERTY)
        } else {
            self.base_packages
        };

        tracing::info!("Starting application context...");

        let explicit = !self.registries.is_empty() || !self.definitions.is_empty();
        let mut registry = if base_packages.is_empty() && explicit {
            BeanDefinitionRegistry::new()
        } else {
            ClassPathBeanScanner::new(base_packages)?.scan()?
        };

        for other in &self.registries {
            registry.merge_bean_definition_registry(other)?;
        }
        for definition in self.definitions {
            registry.register_bean_definition(definition.bean_type(), definition)?;
        }
        registry.register_bean_definition(
            TypeKey::of::<Environment>(),
            BeanDefinition::instance(environment.clone()),
        )?;

        let mut bean_factory = BeanFactory::new(registry);
        bean_factory.initialize()?;
        let handler_mapping = AnnotationHandlerMapping::initialize(&bean_factory)?;

        tracing::info!(
            "Application context started ({} beans, {} handlers)",
            bean_factory.singleton_count(),
            handler_mapping.len()
        );

        Ok(ApplicationContext {
            bean_factory: Arc::new(bean_factory),
            handler_mapping: Arc::new(handler_mapping),
            environment,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::beans::{Constructor, Stereotype};

    struct Greeter {
        greeting: String,
    }

    fn greeter() -> BeanDefinition {
        BeanDefinition::builder::<Greeter>()
            .stereotype(Stereotype::Service)
            .constructor(
                Constructor::new(|deps| {
                    let environment = deps.get::<Environment>()?;
                    Ok(Greeter {
                        greeting: environment.get_or("GREETING", "hello"),
                    })
                })
                .param::<Environment>(),
            )
            .build()
            .unwrap()
    }

    #[test]
    fn test_environment_is_autowirable() {
        let context = ApplicationContext::builder()
            .environment(Environment::from_vars([("GREETING", "hi")]))
            .bean_definition(greeter())
            .build()
            .unwrap();

        assert_eq!(context.get_bean::<Greeter>().unwrap().greeting, "hi");
        assert!(context.handler_mapping().is_empty());
    }

    #[test]
    fn test_nothing_to_scan_fails() {
        let result = ApplicationContext::builder()
            .environment(Environment::new())
            .build();
        assert!(matches!(
            result,
            Err(ContextError::Bean(BeanError::ScanFailure { .. }))
        ));
    }

    #[test]
    fn test_construction_failure_is_reported() {
        struct Broken;

        let broken = BeanDefinition::builder::<Broken>()
            .constructor(Constructor::new(|_| {
                Err(BeanError::construction_failed("Broken", "missing database url"))
            }))
            .build()
            .unwrap();

        let result = ApplicationContext::builder()
            .environment(Environment::new())
            .bean_definition(broken)
            .build();
        assert!(matches!(
            result,
            Err(ContextError::Bean(BeanError::ConstructionFailed { .. }))
        ));
    }
}
