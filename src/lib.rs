//! # Minibean
//!
//! A miniature application framework: a singleton dependency-injection container
//! and a request dispatcher built on top of it.
//!
//! ## Features
//!
//! - **Component Scanning**: `#[derive(Component)]` registers a type in a link-time
//!   catalog; [`ClassPathBeanScanner`] picks up everything under a module path
//! - **Constructor Autowiring**: `Arc<T>` and `Arc<dyn Trait>` fields are resolved
//!   from the container, traits through declared capabilities
//! - **Configuration Beans**: factory methods on configuration types produce beans
//! - **Cycle Detection**: construction fails fast on circular dependencies
//! - **Handler Dispatch**: controllers map paths and verbs to handlers whose arguments
//!   come from a resolver chain
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use minibean::prelude::*;
//!
//! pub trait UserRepository: Send + Sync {
//!     fn find(&self, account: &str) -> Option<String>;
//! }
//!
//! #[derive(Default, Component)]
//! #[component(repository, provides(UserRepository))]
//! pub struct InMemoryUserRepository;
//!
//! impl UserRepository for InMemoryUserRepository {
//!     fn find(&self, account: &str) -> Option<String> {
//!         Some(account.to_string())
//!     }
//! }
//!
//! #[derive(Component)]
//! #[component(controller)]
//! pub struct UserController {
//!     repository: Arc<dyn UserRepository>,
//! }
//!
//! impl Controller for UserController {
//!     fn request_mappings() -> Vec<RequestMapping> {
//!         vec![
//!             RequestMapping::new("/users/{account}", "find", |this: &Self, args| {
//!                 let account = args.param(0)?.unwrap_or_default();
//!                 ModelAndView::json().add_object("user", this.repository.find(&account))
//!             })
//!             .method(RequestMethod::Get)
//!             .path_variable("account"),
//!         ]
//!     }
//! }
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let context = ApplicationContext::builder()
//!         .base_package(module_path!())
//!         .build()?;
//!     context.dispatcher().serve("127.0.0.1:8080").await?;
//!     Ok(())
//! }
//! ```

extern crate self as minibean;

pub mod beans;
pub mod config;
pub mod context;
pub mod error;
pub mod mvc;

// Re-export core types
pub use beans::{
    BeanDefinition, BeanDefinitionBuilder, BeanDefinitionRegistry, BeanFactory, BeanKind,
    BeanObject, ClassPathBeanScanner, Component, ComponentEntry, Configuration, Constructor,
    Dependencies, FactoryMethod, Stereotype, TypeKey,
};
pub use config::Environment;
pub use context::{ApplicationContext, ApplicationContextBuilder, ContextError};
pub use error::{BeanError, Result};

// Re-export macros
pub use minibean_macro::Component as DeriveComponent;

// Used by generated code
pub use inventory;

/// Prelude module for convenient imports
///
/// ```rust,ignore
/// use minibean::prelude::*;
/// ```
pub mod prelude {
    pub use crate::beans::{
        BeanDefinition, BeanDefinitionBuilder, BeanFactory, ClassPathBeanScanner, Component,
        Configuration, Constructor, Dependencies, FactoryMethod, Stereotype,
    };
    pub use crate::config::Environment;
    pub use crate::context::ApplicationContext;
    pub use crate::error::{BeanError, Result};
    pub use crate::mvc::{
        Controller, Dispatcher, HandlerArguments, HttpResponse, Model, ModelAndView,
        RequestMapping, RequestMethod, View,
    };
    pub use crate::DeriveComponent as Component;
    pub use std::sync::Arc;
}
