use proc_macro::TokenStream;

mod component;

/// Derive macro registering a struct with the bean container
///
/// `Arc<T>` and `Arc<dyn Trait>` fields are autowired through the constructor,
/// every other field starts from `Default::default()`. The type is added to the
/// component catalog read by `ClassPathBeanScanner`.
///
/// Attributes:
/// - `controller`, `service`, `repository`, `configuration`: the stereotype
///   (plain component when absent). Controllers implement `minibean::mvc::Controller`,
///   configurations implement `minibean::Configuration`.
/// - `name = "..."`: bean name, defaults to the type name
/// - `provides(Trait, ...)`: traits the bean can be autowired as
///
/// # Example
/// ```rust,ignore
/// use minibean::prelude::*;
///
/// #[derive(Component)]
/// #[component(service, provides(UserLookup))]
/// pub struct UserService {
///     repository: Arc<dyn UserRepository>,
/// }
/// ```
#[proc_macro_derive(Component, attributes(component))]
pub fn derive_component(input: TokenStream) -> TokenStream {
    component::derive_component(input)
}
