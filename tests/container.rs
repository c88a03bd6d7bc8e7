use minibean::prelude::*;
use minibean::{BeanDefinitionRegistry, ContextError, TypeKey};

mod app {
    pub mod repository {
        use minibean::prelude::*;

        pub trait UserRepository: Send + Sync {
            fn find(&self, account: &str) -> Option<String>;
        }

        #[derive(Default, Component)]
        #[component(repository, provides(UserRepository))]
        pub struct InMemoryUserRepository;

        impl UserRepository for InMemoryUserRepository {
            fn find(&self, account: &str) -> Option<String> {
                (account == "gugu").then(|| "gugu@example.com".to_string())
            }
        }
    }

    pub mod service {
        use super::config::DataSource;
        use super::repository::UserRepository;
        use minibean::prelude::*;

        #[derive(Component)]
        #[component(service, name = "userService")]
        pub struct UserService {
            pub repository: Arc<dyn UserRepository>,
            pub data_source: Arc<DataSource>,
            pub lookups: std::sync::atomic::AtomicUsize,
        }

        impl UserService {
            pub fn email(&self, account: &str) -> Option<String> {
                self.lookups
                    .fetch_add(1, std::sync::atomic::Ordering::Relaxed);
                self.repository.find(account)
            }
        }
    }

    pub mod config {
        use minibean::prelude::*;

        pub struct DataSource {
            pub url: String,
        }

        #[derive(Component)]
        #[component(configuration)]
        pub struct DataSourceConfig {
            pub environment: Arc<Environment>,
        }

        impl Configuration for DataSourceConfig {
            fn bean_methods(builder: BeanDefinitionBuilder<Self>) -> BeanDefinitionBuilder<Self> {
                builder.factory_method(FactoryMethod::new("dataSource", |config: &Self, _| {
                    Ok(DataSource {
                        url: config.environment.get_or("DATABASE_URL", "jdbc:h2:mem:test"),
                    })
                }))
            }
        }
    }

    pub mod web {
        use super::service::UserService;
        use minibean::prelude::*;

        #[derive(Component)]
        #[component(controller)]
        pub struct UserController {
            pub user_service: Arc<UserService>,
        }

        impl Controller for UserController {
            fn request_mappings() -> Vec<RequestMapping> {
                vec![
                    RequestMapping::new("/api/user", "show", |this: &Self, args| {
                        let account = args.param(0)?.unwrap_or_default();
                        ModelAndView::json().add_object("email", this.user_service.email(&account))
                    })
                    .method(RequestMethod::Get)
                    .request_param("account"),
                ]
            }
        }
    }
}

mod cyclic {
    use minibean::prelude::*;

    #[derive(Component)]
    pub struct First {
        pub second: Arc<Second>,
    }

    #[derive(Component)]
    pub struct Second {
        pub third: Arc<Third>,
    }

    #[derive(Component)]
    pub struct Third {
        pub first: Arc<First>,
    }
}

mod ambiguous {
    use minibean::prelude::*;

    pub trait Notifier: Send + Sync {}

    #[derive(Default, Component)]
    #[component(service, provides(Notifier))]
    pub struct MailNotifier;
    impl Notifier for MailNotifier {}

    #[derive(Default, Component)]
    #[component(service, provides(Notifier))]
    pub struct SmsNotifier;
    impl Notifier for SmsNotifier {}

    #[derive(Component)]
    pub struct Alerts {
        pub notifier: Arc<dyn Notifier>,
    }
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
}

fn app_context() -> ApplicationContext {
    init_tracing();
    ApplicationContext::builder()
        .base_package("container::app")
        .environment(Environment::from_vars([("DATABASE_URL", "jdbc:h2:mem:users")]))
        .build()
        .unwrap()
}

#[test]
fn test_scan_registers_derived_components() {
    let registry = ClassPathBeanScanner::new(["container::app"])
        .unwrap()
        .scan()
        .unwrap();

    let classes = registry.get_bean_classes();
    assert!(classes.contains(&TypeKey::of::<app::repository::InMemoryUserRepository>()));
    assert!(classes.contains(&TypeKey::of::<app::service::UserService>()));
    assert!(classes.contains(&TypeKey::of::<app::config::DataSourceConfig>()));
    assert!(classes.contains(&TypeKey::of::<app::web::UserController>()));
    assert!(!classes.contains(&TypeKey::of::<cyclic::First>()));

    let service = registry
        .get_bean_definition(&TypeKey::of::<app::service::UserService>())
        .unwrap();
    assert_eq!(service.name(), "userService");
    assert_eq!(service.stereotype(), Stereotype::Service);
    assert_eq!(service.dependencies().len(), 2);
}

#[test]
fn test_context_wires_the_whole_graph() {
    let context = app_context();

    let service = context.get_bean::<app::service::UserService>().unwrap();
    let repository = context
        .get_bean::<dyn app::repository::UserRepository>()
        .unwrap();
    assert!(Arc::ptr_eq(&service.repository, &repository));
    assert_eq!(service.email("gugu").as_deref(), Some("gugu@example.com"));

    let data_source = context.get_bean::<app::config::DataSource>().unwrap();
    assert_eq!(data_source.url, "jdbc:h2:mem:users");
    assert!(Arc::ptr_eq(&service.data_source, &data_source));

    let controller = context.get_bean::<app::web::UserController>().unwrap();
    assert!(Arc::ptr_eq(&controller.user_service, &service));
}

#[test]
fn test_controllers_view_contains_only_controllers() {
    let context = app_context();
    let controllers = context.bean_factory().get_controllers();

    assert_eq!(controllers.len(), 1);
    assert!(controllers.contains_key(&TypeKey::of::<app::web::UserController>()));
    assert_eq!(context.handler_mapping().len(), 1);
}

#[test]
fn test_bean_classes_include_factory_products() {
    let context = app_context();
    let classes = context.bean_factory().get_bean_classes();

    assert!(classes.contains(&TypeKey::of::<app::config::DataSource>()));
    assert!(classes.contains(&TypeKey::of::<Environment>()));
}

#[test]
fn test_circular_components_fail_to_start() {
    init_tracing();
    let registry = ClassPathBeanScanner::new(["container::cyclic"])
        .unwrap()
        .scan()
        .unwrap();
    let mut bean_factory = BeanFactory::new(registry);

    let err = bean_factory.initialize().unwrap_err();
    match err {
        BeanError::CircularDependency { cycle } => {
            assert_eq!(cycle, "First -> Second -> Third -> First")
        }
        other => panic!("expected a circular dependency, got {other}"),
    }
    assert_eq!(bean_factory.singleton_count(), 0);
}

#[test]
fn test_ambiguous_trait_dependency_fails_to_start() {
    let result = ApplicationContext::builder()
        .base_package("container::ambiguous")
        .environment(Environment::new())
        .build();

    assert!(matches!(
        result,
        Err(ContextError::Bean(BeanError::AmbiguousCandidate { .. }))
    ));
}

#[test]
fn test_merging_registries_into_context() {
    let extra = BeanDefinitionRegistry::from_definitions([
        BeanDefinition::of_default::<ambiguous::MailNotifier>(Stereotype::Service).unwrap(),
    ])
    .unwrap();

    let context = ApplicationContext::builder()
        .environment(Environment::new())
        .registry(extra)
        .build()
        .unwrap();

    assert!(context.get_bean::<ambiguous::MailNotifier>().is_ok());
    assert!(matches!(
        context.get_bean::<app::service::UserService>(),
        Err(BeanError::BeanNotFound { .. })
    ));
}

#[test]
fn test_scan_packages_from_environment() {
    let context = ApplicationContext::builder()
        .environment(Environment::from_vars([("SCAN_PACKAGES", "container::app")]))
        .build()
        .unwrap();

    assert!(context.get_bean::<app::web::UserController>().is_ok());
}
