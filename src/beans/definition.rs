use crate::beans::{Stereotype, TypeKey};
use crate::error::{BeanError, Result};
use crate::mvc::RequestMapping;
use std::any::Any;
use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

/// A constructed bean, type-erased.
pub type BeanObject = Arc<dyn Any + Send + Sync>;

/// Turns a bean object into a view of one of the types it satisfies.
///
/// The returned object wraps an `Arc<V>` where `V` is the requested type, which may be a
/// trait object. See [`unwrap_view`].
type CasterFn = Arc<dyn Fn(BeanObject) -> Result<BeanObject> + Send + Sync>;

type ConstructorFn = Arc<dyn Fn(&Dependencies) -> Result<BeanObject> + Send + Sync>;

/// Signature of [`Controller::request_mappings`](crate::mvc::Controller::request_mappings).
pub type RequestMappingsFn = fn() -> Vec<RequestMapping>;

fn view_caster<T, V, F>(cast: F) -> CasterFn
where
    T: Send + Sync + 'static,
    V: ?Sized + Send + Sync + 'static,
    F: Fn(Arc<T>) -> Arc<V> + Send + Sync + 'static,
{
    Arc::new(move |object: BeanObject| {
        let concrete = object
            .downcast::<T>()
            .map_err(|_| BeanError::DowncastFailed {
                type_name: std::any::type_name::<T>().to_string(),
            })?;
        let view: Arc<V> = cast(concrete);
        Ok(Arc::new(view) as BeanObject)
    })
}

/// Recover the typed `Arc<V>` from a view produced by a caster.
pub(crate) fn unwrap_view<V: ?Sized + Send + Sync + 'static>(view: BeanObject) -> Result<Arc<V>> {
    let wrapper = view
        .downcast::<Arc<V>>()
        .map_err(|_| BeanError::DowncastFailed {
            type_name: std::any::type_name::<V>().to_string(),
        })?;
    Ok(wrapper.as_ref().clone())
}

/// Resolved constructor arguments, in the order the constructor declared them.
pub struct Dependencies {
    bean_name: String,
    resolved: Vec<(TypeKey, BeanObject)>,
}

impl Dependencies {
    pub(crate) fn new(bean_name: impl Into<String>, resolved: Vec<(TypeKey, BeanObject)>) -> Self {
        Self {
            bean_name: bean_name.into(),
            resolved,
        }
    }

    /// Fetch a declared dependency, either a concrete bean type or a `dyn Trait` capability.
    ///
    /// # Errors
    /// Returns [`BeanError::UndeclaredDependency`] if the constructor did not declare `T`
    /// as a parameter.
    pub fn get<T: ?Sized + Send + Sync + 'static>(&self) -> Result<Arc<T>> {
        let key = TypeKey::of::<T>();
        let view = self
            .resolved
            .iter()
            .find(|(declared, _)| *declared == key)
            .map(|(_, view)| Arc::clone(view))
            .ok_or_else(|| BeanError::UndeclaredDependency {
                bean_name: self.bean_name.clone(),
                type_name: key.name().to_string(),
            })?;
        unwrap_view::<T>(view)
    }

    pub fn len(&self) -> usize {
        self.resolved.len()
    }

    pub fn is_empty(&self) -> bool {
        self.resolved.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BeanKind {
    Component,
    Configuration,
    FactoryMethod {
        configuration: TypeKey,
        method: String,
    },
}

/// Metadata describing how to construct one bean.
#[derive(Clone)]
pub struct BeanDefinition {
    name: String,
    bean_type: TypeKey,
    produced_type: TypeKey,
    stereotype: Stereotype,
    kind: BeanKind,
    dependencies: Vec<TypeKey>,
    constructor: ConstructorFn,
    views: Vec<(TypeKey, CasterFn)>,
    factory_methods: Vec<BeanDefinition>,
    request_mappings: Option<RequestMappingsFn>,
}

impl BeanDefinition {
    /// Start a definition for `T`.
    ///
    /// # Example
    /// ```rust,ignore
    /// let definition = BeanDefinition::builder::<UserService>()
    ///     .stereotype(Stereotype::Service)
    ///     .constructor(
    ///         Constructor::new(|deps| Ok(UserService::new(deps.get::<dyn UserRepository>()?)))
    ///             .param::<dyn UserRepository>(),
    ///     )
    ///     .build()?;
    /// ```
    pub fn builder<T: Send + Sync + 'static>() -> BeanDefinitionBuilder<T> {
        BeanDefinitionBuilder::new()
    }

    /// A component with no dependencies, built through `Default`.
    pub fn of_default<T: Default + Send + Sync + 'static>(stereotype: Stereotype) -> Result<Self> {
        Self::builder::<T>()
            .stereotype(stereotype)
            .constructor(Constructor::no_args())
            .build()
    }

    /// Wrap an already constructed value.
    pub fn instance<T: Send + Sync + 'static>(value: T) -> Self {
        let key = TypeKey::of::<T>();
        let object: BeanObject = Arc::new(value);
        Self {
            name: key.short_name().to_string(),
            bean_type: key,
            produced_type: key,
            stereotype: Stereotype::Component,
            kind: BeanKind::Component,
            dependencies: Vec::new(),
            constructor: Arc::new(move |_| Ok(Arc::clone(&object))),
            views: vec![(key, view_caster::<T, T, _>(|bean| bean))],
            factory_methods: Vec::new(),
            request_mappings: None,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// The declaring type; for factory-method beans, the configuration class.
    pub fn bean_type(&self) -> TypeKey {
        self.bean_type
    }

    pub fn produced_type(&self) -> TypeKey {
        self.produced_type
    }

    pub fn stereotype(&self) -> Stereotype {
        self.stereotype
    }

    pub fn kind(&self) -> &BeanKind {
        &self.kind
    }

    /// Only singleton scope is supported.
    pub fn is_singleton(&self) -> bool {
        true
    }

    pub fn is_configuration(&self) -> bool {
        self.kind == BeanKind::Configuration
    }

    pub fn is_controller(&self) -> bool {
        self.stereotype == Stereotype::Controller
    }

    /// Constructor or factory-method parameter types, in declaration order.
    pub fn dependencies(&self) -> &[TypeKey] {
        &self.dependencies
    }

    pub fn factory_methods(&self) -> &[BeanDefinition] {
        &self.factory_methods
    }

    pub fn request_mappings(&self) -> Option<RequestMappingsFn> {
        self.request_mappings
    }

    pub fn has_same_name(&self, other: &BeanDefinition) -> bool {
        self.name == other.name
    }

    /// Whether a lookup for `key` may be satisfied by this definition.
    pub fn is_assignable_to(&self, key: &TypeKey) -> bool {
        self.views.iter().any(|(view, _)| view == key)
    }

    /// Capability types this bean declares besides its own type.
    pub fn capabilities(&self) -> impl Iterator<Item = TypeKey> + '_ {
        self.views
            .iter()
            .map(|(key, _)| *key)
            .filter(move |key| *key != self.produced_type)
    }

    pub(crate) fn construct(&self, dependencies: &Dependencies) -> Result<BeanObject> {
        (self.constructor)(dependencies)
    }

    pub(crate) fn view(&self, key: &TypeKey, object: BeanObject) -> Result<BeanObject> {
        let (_, caster) = self
            .views
            .iter()
            .find(|(view, _)| view == key)
            .ok_or_else(|| BeanError::DowncastFailed {
                type_name: key.name().to_string(),
            })?;
        caster(object)
    }
}

impl fmt::Debug for BeanDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BeanDefinition")
            .field("name", &self.name)
            .field("bean_type", &self.bean_type)
            .field("produced_type", &self.produced_type)
            .field("stereotype", &self.stereotype)
            .field("kind", &self.kind)
            .field("dependencies", &self.dependencies)
            .field("factory_methods", &self.factory_methods)
            .finish()
    }
}

/// A constructor candidate for `T` with its declared parameter types.
pub struct Constructor<T> {
    params: Vec<TypeKey>,
    autowired: bool,
    build: Arc<dyn Fn(&Dependencies) -> Result<T> + Send + Sync>,
}

impl<T: Send + Sync + 'static> Constructor<T> {
    pub fn new<F>(build: F) -> Self
    where
        F: Fn(&Dependencies) -> Result<T> + Send + Sync + 'static,
    {
        Self {
            params: Vec::new(),
            autowired: false,
            build: Arc::new(build),
        }
    }

    /// Declare the next parameter. `P` may be a concrete bean type or `dyn Trait`.
    pub fn param<P: ?Sized + 'static>(mut self) -> Self {
        self.params.push(TypeKey::of::<P>());
        self
    }

    /// Designate this constructor when the type has several candidates.
    pub fn autowired(mut self) -> Self {
        self.autowired = true;
        self
    }

    fn erase(self) -> (Vec<TypeKey>, ConstructorFn) {
        let build = self.build;
        let constructor: ConstructorFn =
            Arc::new(move |deps: &Dependencies| Ok(Arc::new(build(deps)?) as BeanObject));
        (self.params, constructor)
    }
}

impl<T: Default + Send + Sync + 'static> Constructor<T> {
    pub fn no_args() -> Self {
        Self::new(|_| Ok(T::default()))
    }
}

/// A bean-producing method on a configuration class `C`, returning `R`.
pub struct FactoryMethod<C, R> {
    name: String,
    params: Vec<TypeKey>,
    views: Vec<(TypeKey, CasterFn)>,
    invoke: Arc<dyn Fn(&C, &Dependencies) -> Result<R> + Send + Sync>,
}

impl<C, R> FactoryMethod<C, R>
where
    C: Send + Sync + 'static,
    R: Send + Sync + 'static,
{
    pub fn new<F>(name: impl Into<String>, invoke: F) -> Self
    where
        F: Fn(&C, &Dependencies) -> Result<R> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            params: Vec::new(),
            views: vec![(TypeKey::of::<R>(), view_caster::<R, R, _>(|bean| bean))],
            invoke: Arc::new(invoke),
        }
    }

    pub fn param<P: ?Sized + 'static>(mut self) -> Self {
        self.params.push(TypeKey::of::<P>());
        self
    }

    pub fn provides<V, F>(mut self, cast: F) -> Self
    where
        V: ?Sized + Send + Sync + 'static,
        F: Fn(Arc<R>) -> Arc<V> + Send + Sync + 'static,
    {
        self.views.push((TypeKey::of::<V>(), view_caster::<R, V, F>(cast)));
        self
    }

    fn into_definition(self) -> BeanDefinition {
        let configuration = TypeKey::of::<C>();
        // The configuration bean is always the first argument.
        let mut dependencies = Vec::with_capacity(self.params.len() + 1);
        dependencies.push(configuration);
        dependencies.extend(self.params);

        let invoke = self.invoke;
        let constructor: ConstructorFn = Arc::new(move |deps: &Dependencies| {
            let config = deps.get::<C>()?;
            Ok(Arc::new(invoke(config.as_ref(), deps)?) as BeanObject)
        });

        BeanDefinition {
            name: self.name.clone(),
            bean_type: configuration,
            produced_type: TypeKey::of::<R>(),
            stereotype: Stereotype::Bean,
            kind: BeanKind::FactoryMethod {
                configuration,
                method: self.name,
            },
            dependencies,
            constructor,
            views: self.views,
            factory_methods: Vec::new(),
            request_mappings: None,
        }
    }
}

/// Builder for [`BeanDefinition`]. Obtained from [`BeanDefinition::builder`].
pub struct BeanDefinitionBuilder<T> {
    name: Option<String>,
    stereotype: Stereotype,
    constructors: Vec<Constructor<T>>,
    views: Vec<(TypeKey, CasterFn)>,
    factory_methods: Vec<BeanDefinition>,
    request_mappings: Option<RequestMappingsFn>,
    _marker: PhantomData<fn() -> T>,
}

impl<T: Send + Sync + 'static> BeanDefinitionBuilder<T> {
    fn new() -> Self {
        Self {
            name: None,
            stereotype: Stereotype::Component,
            constructors: Vec::new(),
            views: vec![(TypeKey::of::<T>(), view_caster::<T, T, _>(|bean| bean))],
            factory_methods: Vec::new(),
            request_mappings: None,
            _marker: PhantomData,
        }
    }

    /// Override the bean name. Defaults to the type's short name.
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn stereotype(mut self, stereotype: Stereotype) -> Self {
        self.stereotype = stereotype;
        self
    }

    pub fn constructor(mut self, constructor: Constructor<T>) -> Self {
        self.constructors.push(constructor);
        self
    }

    /// Declare that this bean satisfies capability `V`, usually a trait object.
    ///
    /// ```rust,ignore
    /// builder.provides::<dyn UserRepository, _>(|bean| bean as Arc<dyn UserRepository>)
    /// ```
    pub fn provides<V, F>(mut self, cast: F) -> Self
    where
        V: ?Sized + Send + Sync + 'static,
        F: Fn(Arc<T>) -> Arc<V> + Send + Sync + 'static,
    {
        self.views.push((TypeKey::of::<V>(), view_caster::<T, V, F>(cast)));
        self
    }

    pub fn factory_method<R: Send + Sync + 'static>(mut self, method: FactoryMethod<T, R>) -> Self {
        self.factory_methods.push(method.into_definition());
        self
    }

    pub fn request_mappings(mut self, mappings: RequestMappingsFn) -> Self {
        self.request_mappings = Some(mappings);
        self
    }

    pub fn build(mut self) -> Result<BeanDefinition> {
        let key = TypeKey::of::<T>();

        if !self.factory_methods.is_empty() && self.stereotype != Stereotype::Configuration {
            return Err(BeanError::invalid_definition(
                key.name(),
                "factory methods require the Configuration stereotype",
            ));
        }

        let constructor = match self.constructors.len() {
            0 => {
                return Err(BeanError::invalid_definition(key.name(), "no constructor declared"));
            }
            1 => self.constructors.remove(0),
            _ => {
                let mut designated: Vec<_> = self
                    .constructors
                    .into_iter()
                    .filter(|candidate| candidate.autowired)
                    .collect();
                if designated.len() != 1 {
                    return Err(BeanError::invalid_definition(
                        key.name(),
                        "multiple constructors found but exactly one must be autowired",
                    ));
                }
                designated.remove(0)
            }
        };
        let (dependencies, constructor) = constructor.erase();

        let kind = if self.stereotype == Stereotype::Configuration {
            BeanKind::Configuration
        } else {
            BeanKind::Component
        };

        Ok(BeanDefinition {
            name: self.name.unwrap_or_else(|| key.short_name().to_string()),
            bean_type: key,
            produced_type: key,
            stereotype: self.stereotype,
            kind,
            dependencies,
            constructor,
            views: self.views,
            factory_methods: self.factory_methods,
            request_mappings: self.request_mappings,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    trait Greeter: Send + Sync {
        fn greet(&self) -> String;
    }

    #[derive(Default)]
    struct English;

    impl Greeter for English {
        fn greet(&self) -> String {
            "hello".to_string()
        }
    }

    struct Hub {
        greeter: Arc<dyn Greeter>,
    }

    #[test]
    fn test_zero_arg_constructor_has_no_dependencies() {
        let definition = BeanDefinition::of_default::<English>(Stereotype::Service).unwrap();
        assert_eq!(definition.name(), "English");
        assert!(definition.dependencies().is_empty());
        assert!(definition.is_singleton());
        assert!(!definition.is_configuration());
    }

    #[test]
    fn test_multiple_constructors_without_designation_fail() {
        let result = BeanDefinition::builder::<English>()
            .constructor(Constructor::no_args())
            .constructor(Constructor::new(|_| Ok(English)))
            .build();
        assert!(matches!(result, Err(BeanError::InvalidDefinition { .. })));
    }

    #[test]
    fn test_designated_constructor_is_selected() {
        let definition = BeanDefinition::builder::<Hub>()
            .constructor(Constructor::new(|_| Ok(Hub { greeter: Arc::new(English) })))
            .constructor(
                Constructor::new(|deps| Ok(Hub { greeter: deps.get::<dyn Greeter>()? }))
                    .param::<dyn Greeter>()
                    .autowired(),
            )
            .build()
            .unwrap();
        assert_eq!(definition.dependencies(), &[TypeKey::of::<dyn Greeter>()]);
    }

    #[test]
    fn test_missing_constructor_fails() {
        let result = BeanDefinition::builder::<English>().build();
        assert!(matches!(result, Err(BeanError::InvalidDefinition { .. })));
    }

    #[test]
    fn test_capability_view() {
        let definition = BeanDefinition::builder::<English>()
            .constructor(Constructor::no_args())
            .provides::<dyn Greeter, _>(|bean| bean as Arc<dyn Greeter>)
            .build()
            .unwrap();
        let key = TypeKey::of::<dyn Greeter>();
        assert!(definition.is_assignable_to(&key));
        assert_eq!(definition.capabilities().collect::<Vec<_>>(), vec![key]);

        let object = definition
            .construct(&Dependencies::new("English", Vec::new()))
            .unwrap();
        let greeter = unwrap_view::<dyn Greeter>(definition.view(&key, object).unwrap()).unwrap();
        assert_eq!(greeter.greet(), "hello");
    }

    #[test]
    fn test_undeclared_dependency_is_rejected() {
        let deps = Dependencies::new("Hub", Vec::new());
        let result = deps.get::<dyn Greeter>();
        assert!(matches!(result, Err(BeanError::UndeclaredDependency { .. })));
    }

    #[test]
    fn test_factory_methods_require_configuration() {
        #[derive(Default)]
        struct Settings;

        let result = BeanDefinition::builder::<Settings>()
            .constructor(Constructor::no_args())
            .factory_method(FactoryMethod::new("english", |_: &Settings, _| Ok(English)))
            .build();
        assert!(matches!(result, Err(BeanError::InvalidDefinition { .. })));

        let definition = BeanDefinition::builder::<Settings>()
            .stereotype(Stereotype::Configuration)
            .constructor(Constructor::no_args())
            .factory_method(FactoryMethod::new("english", |_: &Settings, _| Ok(English)))
            .build()
            .unwrap();
        assert!(definition.is_configuration());

        let factory = &definition.factory_methods()[0];
        assert_eq!(factory.name(), "english");
        assert_eq!(factory.produced_type(), TypeKey::of::<English>());
        assert_eq!(factory.dependencies(), &[TypeKey::of::<Settings>()]);
        assert_eq!(factory.stereotype(), Stereotype::Bean);
    }
}
