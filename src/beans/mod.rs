//! Bean container: definitions, registry, scanning and construction.

pub mod definition;
pub mod factory;
pub mod key;
pub mod registry;
pub mod scanner;
pub mod stereotype;

pub use definition::{
    BeanDefinition, BeanDefinitionBuilder, BeanKind, BeanObject, Constructor, Dependencies,
    FactoryMethod, RequestMappingsFn,
};
pub use factory::BeanFactory;
pub use key::TypeKey;
pub use registry::BeanDefinitionRegistry;
pub use scanner::{ClassPathBeanScanner, Component, ComponentEntry, Configuration};
pub use stereotype::Stereotype;
