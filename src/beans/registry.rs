use crate::beans::{BeanDefinition, TypeKey};
use crate::error::{BeanError, Result};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

/// Index of a definition in the registry arena.
pub(crate) type BeanId = usize;

/// Registry of bean definitions.
///
/// Definitions live in an arena indexed by [`BeanId`]. Configuration definitions are
/// expanded on registration: each of their factory methods gets its own arena slot.
/// Only the explicitly registered type is indexed for exact lookup; everything else is
/// found by produced type or declared capability.
#[derive(Debug, Clone, Default)]
pub struct BeanDefinitionRegistry {
    definitions: Vec<Arc<BeanDefinition>>,
    registrations: HashMap<TypeKey, BeanId>,
}

impl BeanDefinitionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a registry keyed by each definition's own type.
    pub fn from_definitions<I>(definitions: I) -> Result<Self>
    where
        I: IntoIterator<Item = BeanDefinition>,
    {
        let mut registry = Self::new();
        for definition in definitions {
            registry.register_bean_definition(definition.bean_type(), definition)?;
        }
        Ok(registry)
    }

    /// Register `definition` under `key`.
    ///
    /// # Errors
    /// - [`BeanError::DuplicateBeanName`] when `key` is already registered, or when the
    ///   definition or one of its factory methods reuses an existing bean name.
    /// - [`BeanError::InvalidDefinition`] when the definition cannot satisfy `key`, or
    ///   when it produces a type some other definition already produces.
    pub fn register_bean_definition(&mut self, key: TypeKey, definition: BeanDefinition) -> Result<()> {
        if let Some(existing) = self.registrations.get(&key) {
            return Err(BeanError::DuplicateBeanName {
                bean_name: self.definitions[*existing].name().to_string(),
                type_name: key.name().to_string(),
            });
        }
        if !definition.is_assignable_to(&key) {
            return Err(BeanError::invalid_definition(
                key.name(),
                format!("{} neither is nor provides this type", definition.name()),
            ));
        }

        let mut incoming: Vec<&BeanDefinition> = vec![&definition];
        incoming.extend(definition.factory_methods());
        for (index, candidate) in incoming.iter().enumerate() {
            let clashes_existing = self
                .definitions
                .iter()
                .any(|existing| existing.has_same_name(candidate));
            let clashes_sibling = incoming[..index]
                .iter()
                .any(|sibling| sibling.has_same_name(candidate));
            if clashes_existing || clashes_sibling {
                return Err(BeanError::DuplicateBeanName {
                    bean_name: candidate.name().to_string(),
                    type_name: key.name().to_string(),
                });
            }

            // One singleton per produced type.
            let produced = candidate.produced_type();
            let producer = self
                .definitions
                .iter()
                .map(|existing| existing.as_ref())
                .chain(incoming[..index].iter().copied())
                .find(|existing| existing.produced_type() == produced);
            if let Some(producer) = producer {
                return Err(BeanError::invalid_definition(
                    produced.name(),
                    format!(
                        "{} would produce a second instance, already produced by {}",
                        candidate.name(),
                        producer.name()
                    ),
                ));
            }
        }

        tracing::debug!(
            "Registering bean definition {} for {} ({})",
            definition.name(),
            key,
            definition.stereotype()
        );

        let factory_methods = definition.factory_methods().to_vec();
        let id = self.definitions.len();
        self.definitions.push(Arc::new(definition));
        self.registrations.insert(key, id);

        for factory in factory_methods {
            tracing::debug!(
                "Registering factory method bean {} producing {}",
                factory.name(),
                factory.produced_type()
            );
            self.definitions.push(Arc::new(factory));
        }
        Ok(())
    }

    /// Look up the definition for `key`.
    ///
    /// An exact registration wins. Otherwise exactly one definition must produce `key` or
    /// declare it as a capability.
    pub fn get_bean_definition(&self, key: &TypeKey) -> Result<&Arc<BeanDefinition>> {
        let id = self.resolve_id(key)?;
        Ok(&self.definitions[id])
    }

    /// Register every definition of `other` into `self`, stopping at the first conflict.
    pub fn merge_bean_definition_registry(&mut self, other: &BeanDefinitionRegistry) -> Result<()> {
        for (key, definition) in other.get_bean_definitions() {
            self.register_bean_definition(key, definition.clone())?;
        }
        Ok(())
    }

    /// Types definitions were explicitly registered under.
    pub fn get_bean_classes(&self) -> HashSet<TypeKey> {
        self.registrations.keys().copied().collect()
    }

    /// Explicit registrations in registration order. Factory-method definitions are
    /// reachable through their configuration definition.
    pub fn get_bean_definitions(&self) -> Vec<(TypeKey, &BeanDefinition)> {
        let mut registered: Vec<_> = self
            .registrations
            .iter()
            .map(|(key, id)| (*id, *key))
            .collect();
        registered.sort_by_key(|(id, _)| *id);
        registered
            .into_iter()
            .map(|(id, key)| (key, self.definitions[id].as_ref()))
            .collect()
    }

    pub fn clear(&mut self) {
        self.definitions.clear();
        self.registrations.clear();
    }

    /// Number of definitions, factory-method beans included.
    pub fn len(&self) -> usize {
        self.definitions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.definitions.is_empty()
    }

    pub(crate) fn definition(&self, id: BeanId) -> &Arc<BeanDefinition> {
        &self.definitions[id]
    }

    pub(crate) fn definitions(&self) -> impl Iterator<Item = (BeanId, &Arc<BeanDefinition>)> {
        self.definitions.iter().enumerate()
    }

    /// Every definition that can satisfy `key`, ignoring exact registrations.
    pub(crate) fn candidates(&self, key: &TypeKey) -> Vec<BeanId> {
        self.definitions
            .iter()
            .enumerate()
            .filter(|(_, definition)| definition.is_assignable_to(key))
            .map(|(id, _)| id)
            .collect()
    }

    pub(crate) fn resolve_id(&self, key: &TypeKey) -> Result<BeanId> {
        if let Some(id) = self.registrations.get(key) {
            return Ok(*id);
        }

        let candidates = self.candidates(key);
        match candidates.as_slice() {
            [id] => Ok(*id),
            [] => Err(BeanError::NoCandidate {
                type_name: key.name().to_string(),
            }),
            _ => Err(BeanError::AmbiguousCandidate {
                type_name: key.name().to_string(),
                candidates: candidates
                    .iter()
                    .map(|id| self.definitions[*id].name())
                    .collect::<Vec<_>>()
                    .join(", "),
            }),
        }
    }
}
