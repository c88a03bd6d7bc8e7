use crate::beans::definition::unwrap_view;
use crate::beans::registry::BeanId;
use crate::beans::{BeanDefinitionRegistry, BeanKind, BeanObject, Dependencies, TypeKey};
use crate::error::{BeanError, Result};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BeanState {
    Unvisited,
    InProgress,
    Constructed,
}

/// One pending construction on the explicit stack.
struct Frame {
    id: BeanId,
    next_dependency: usize,
}

/// Singleton bean container.
///
/// Construction runs depth-first on an explicit stack. Every definition carries a
/// three-state marker; reaching a definition that is still `InProgress` means the graph
/// has a cycle and initialization aborts.
///
/// # Example
/// ```rust,ignore
/// let registry = ClassPathBeanScanner::new(["my_app"])?.scan()?;
/// let mut bean_factory = BeanFactory::new(registry);
/// bean_factory.initialize()?;
///
/// let service = bean_factory.get_bean::<UserService>()?;
/// let repository = bean_factory.get_bean::<dyn UserRepository>()?;
/// ```
pub struct BeanFactory {
    registry: BeanDefinitionRegistry,
    states: Vec<BeanState>,
    singletons: Vec<Option<BeanObject>>,
}

impl BeanFactory {
    pub fn new(registry: BeanDefinitionRegistry) -> Self {
        let len = registry.len();
        Self {
            registry,
            states: vec![BeanState::Unvisited; len],
            singletons: vec![None; len],
        }
    }

    pub fn registry(&self) -> &BeanDefinitionRegistry {
        &self.registry
    }

    /// Construct every registered bean that is not constructed yet.
    ///
    /// Calling this again keeps existing singletons. On failure the factory is reset
    /// and holds no beans.
    pub fn initialize(&mut self) -> Result<()> {
        tracing::info!("Initializing bean factory ({} definitions)", self.registry.len());

        for id in 0..self.registry.len() {
            if let Err(e) = self.initialize_bean(id) {
                if e.is_wiring_error() {
                    tracing::error!("Unsatisfiable dependency graph: {}", e);
                } else {
                    tracing::error!("Bean factory initialization failed: {}", e);
                }
                self.reset();
                return Err(e);
            }
        }

        tracing::info!(
            "Bean factory initialized ({} singletons)",
            self.singleton_count()
        );
        Ok(())
    }

    /// Construct one bean and, for a configuration bean, everything its factory methods
    /// produce.
    fn initialize_bean(&mut self, id: BeanId) -> Result<()> {
        self.construct(id)?;

        let definition = Arc::clone(self.registry.definition(id));
        if definition.is_configuration() {
            let produced: Vec<BeanId> = self
                .registry
                .definitions()
                .filter(|(_, candidate)| {
                    matches!(
                        candidate.kind(),
                        BeanKind::FactoryMethod { configuration, .. }
                            if *configuration == definition.bean_type()
                    )
                })
                .map(|(factory_id, _)| factory_id)
                .collect();
            for factory_id in produced {
                self.construct(factory_id)?;
            }
        }
        Ok(())
    }

    fn construct(&mut self, root: BeanId) -> Result<BeanObject> {
        if let Some(existing) = &self.singletons[root] {
            return Ok(Arc::clone(existing));
        }

        self.states[root] = BeanState::InProgress;
        let mut stack = vec![Frame {
            id: root,
            next_dependency: 0,
        }];

        while let Some(frame) = stack.last_mut() {
            let id = frame.id;
            let definition = Arc::clone(self.registry.definition(id));

            if let Some(key) = definition.dependencies().get(frame.next_dependency) {
                frame.next_dependency += 1;
                let dependency = self.resolve_dependency(key)?;
                match self.states[dependency] {
                    BeanState::Constructed => {}
                    BeanState::InProgress => {
                        return Err(self.circular_dependency(&stack, dependency));
                    }
                    BeanState::Unvisited => {
                        self.states[dependency] = BeanState::InProgress;
                        stack.push(Frame {
                            id: dependency,
                            next_dependency: 0,
                        });
                    }
                }
                continue;
            }

            let mut resolved = Vec::with_capacity(definition.dependencies().len());
            for key in definition.dependencies() {
                let dependency = self.resolve_dependency(key)?;
                let object = self.singletons[dependency].clone().ok_or_else(|| {
                    BeanError::construction_failed(definition.name(), format!("{} was not constructed", key))
                })?;
                let view = self.registry.definition(dependency).view(key, object)?;
                resolved.push((*key, view));
            }

            let object = definition.construct(&Dependencies::new(definition.name(), resolved))?;
            tracing::debug!("Constructed bean {} ({})", definition.name(), definition.produced_type());

            self.singletons[id] = Some(object);
            self.states[id] = BeanState::Constructed;
            stack.pop();
        }

        self.singletons[root].clone().ok_or_else(|| BeanError::BeanNotFound {
            type_name: self.registry.definition(root).produced_type().name().to_string(),
        })
    }

    /// Resolve a parameter type to a definition. A candidate that is still under
    /// construction is reported as a cycle before any ambiguity is considered.
    fn resolve_dependency(&self, key: &TypeKey) -> Result<BeanId> {
        match self.registry.resolve_id(key) {
            Err(BeanError::AmbiguousCandidate { type_name, candidates }) => {
                if let Some(in_progress) = self
                    .registry
                    .candidates(key)
                    .into_iter()
                    .find(|id| self.states[*id] == BeanState::InProgress)
                {
                    return Ok(in_progress);
                }
                Err(BeanError::AmbiguousCandidate { type_name, candidates })
            }
            other => other,
        }
    }

    fn circular_dependency(&self, stack: &[Frame], repeated: BeanId) -> BeanError {
        let start = stack
            .iter()
            .position(|frame| frame.id == repeated)
            .unwrap_or(0);
        let mut names: Vec<&str> = stack[start..]
            .iter()
            .map(|frame| self.registry.definition(frame.id).name())
            .collect();
        names.push(self.registry.definition(repeated).name());
        BeanError::CircularDependency {
            cycle: names.join(" -> "),
        }
    }

    fn reset(&mut self) {
        self.states.iter_mut().for_each(|state| *state = BeanState::Unvisited);
        self.singletons.iter_mut().for_each(|singleton| *singleton = None);
    }

    /// Fetch a constructed singleton by concrete type or by `dyn Trait` capability.
    ///
    /// # Errors
    /// [`BeanError::BeanNotFound`] when no bean was constructed for `T`,
    /// [`BeanError::AmbiguousCandidate`] when several beans satisfy `T`.
    pub fn get_bean<T: ?Sized + Send + Sync + 'static>(&self) -> Result<Arc<T>> {
        let key = TypeKey::of::<T>();
        let not_found = || BeanError::BeanNotFound {
            type_name: key.name().to_string(),
        };

        let id = self.registry.resolve_id(&key).map_err(|e| match e {
            BeanError::NoCandidate { .. } => not_found(),
            other => other,
        })?;
        let object = self.singletons[id].clone().ok_or_else(not_found)?;
        let view = self.registry.definition(id).view(&key, object)?;
        unwrap_view::<T>(view)
    }

    pub fn contains_bean<T: ?Sized + 'static>(&self) -> bool {
        self.registry
            .resolve_id(&TypeKey::of::<T>())
            .map(|id| self.singletons[id].is_some())
            .unwrap_or(false)
    }

    /// Constructed controller beans keyed by their type.
    pub fn get_controllers(&self) -> HashMap<TypeKey, BeanObject> {
        self.registry
            .definitions()
            .filter(|(_, definition)| definition.is_controller())
            .filter_map(|(id, definition)| {
                self.singletons[id]
                    .as_ref()
                    .map(|object| (definition.produced_type(), Arc::clone(object)))
            })
            .collect()
    }

    /// Produced types of every definition, constructed or not.
    pub fn get_bean_classes(&self) -> HashSet<TypeKey> {
        self.registry
            .definitions()
            .map(|(_, definition)| definition.produced_type())
            .collect()
    }

    pub fn singleton_count(&self) -> usize {
        self.singletons.iter().filter(|singleton| singleton.is_some()).count()
    }
}

impl Default for BeanFactory {
    fn default() -> Self {
        Self::new(BeanDefinitionRegistry::new())
    }
}
