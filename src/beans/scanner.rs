use crate::beans::{BeanDefinition, BeanDefinitionBuilder, BeanDefinitionRegistry};
use crate::error::{BeanError, Result};

/// A type the container knows how to build.
///
/// Usually implemented by `#[derive(Component)]`, which also submits a
/// [`ComponentEntry`] so the type is found by [`ClassPathBeanScanner`].
pub trait Component: Send + Sync + 'static {
    fn bean_definition() -> Result<BeanDefinition>;
}

/// Declares the factory methods of a `#[component(configuration)]` type.
///
/// # Example
/// ```rust,ignore
/// impl Configuration for DataSourceConfig {
///     fn bean_methods(builder: BeanDefinitionBuilder<Self>) -> BeanDefinitionBuilder<Self> {
///         builder.factory_method(FactoryMethod::new("data_source", |config: &Self, _| {
///             Ok(DataSource::connect(&config.url))
///         }))
///     }
/// }
/// ```
pub trait Configuration: Sized + Send + Sync + 'static {
    fn bean_methods(builder: BeanDefinitionBuilder<Self>) -> BeanDefinitionBuilder<Self>;
}

/// Link-time catalog entry for one component type.
pub struct ComponentEntry {
    /// `module_path!()` of the declaring module.
    pub package: &'static str,
    pub type_name: &'static str,
    pub definition: fn() -> Result<BeanDefinition>,
}

impl ComponentEntry {
    pub const fn new(
        package: &'static str,
        type_name: &'static str,
        definition: fn() -> Result<BeanDefinition>,
    ) -> Self {
        Self {
            package,
            type_name,
            definition,
        }
    }

    /// Whether the entry's module equals `base` or is nested under it.
    pub fn is_under(&self, base: &str) -> bool {
        self.package == base
            || self
                .package
                .strip_prefix(base)
                .is_some_and(|rest| rest.starts_with("::"))
    }

    fn qualified_name(&self) -> String {
        format!("{}::{}", self.package, self.type_name)
    }
}

inventory::collect!(ComponentEntry);

/// Discovers components registered in the catalog under a set of base packages.
///
/// Packages are Rust module paths such as `my_app` or `my_app::user`.
#[derive(Debug, Clone)]
pub struct ClassPathBeanScanner {
    base_packages: Vec<String>,
}

impl ClassPathBeanScanner {
    /// # Errors
    /// [`BeanError::ScanFailure`] when no base package is given.
    pub fn new<I, S>(base_packages: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let base_packages: Vec<String> = base_packages
            .into_iter()
            .map(Into::into)
            .map(|package| package.trim().trim_end_matches("::").to_string())
            .filter(|package| !package.is_empty())
            .collect();

        if base_packages.is_empty() {
            return Err(BeanError::scan_failure("at least one base package is required"));
        }
        Ok(Self { base_packages })
    }

    pub fn base_packages(&self) -> &[String] {
        &self.base_packages
    }

    /// Build a fresh registry from every matching catalog entry.
    pub fn scan(&self) -> Result<BeanDefinitionRegistry> {
        let mut entries: Vec<&ComponentEntry> = inventory::iter::<ComponentEntry>
            .into_iter()
            .filter(|entry| self.base_packages.iter().any(|base| entry.is_under(base)))
            .collect();
        entries.sort_by_key(|entry| entry.qualified_name());

        let mut registry = BeanDefinitionRegistry::new();
        for entry in entries {
            let definition = (entry.definition)().map_err(|e| {
                BeanError::scan_failure(format!("{}: {}", entry.qualified_name(), e))
            })?;
            if !definition.stereotype().is_scanned() {
                tracing::debug!("Skipping {} ({})", entry.qualified_name(), definition.stereotype());
                continue;
            }
            registry.register_bean_definition(definition.bean_type(), definition)?;
        }

        tracing::info!(
            "Scanned {} bean definitions under [{}]",
            registry.len(),
            self.base_packages.join(", ")
        );
        Ok(registry)
    }
}
