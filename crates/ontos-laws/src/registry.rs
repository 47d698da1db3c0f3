//! Ordered law registry
//!
//! Provides [`LawRegistry`], the table the engine walks. Registration order
//! is evaluation order, so editing the table (add, remove, insert before)
//! changes report order without touching any graph-walking code.

use crate::builtin;
use crate::config::EngineConfig;
use crate::error::RegistryError;
use crate::law::{Law, LawMeta};
use crate::violation::LawCategory;

/// Ordered collection of laws with unique ids
#[derive(Debug, Default, Clone)]
pub struct LawRegistry {
    laws: Vec<Law>,
}

impl LawRegistry {
    /// Create empty registry
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self { laws: Vec::new() }
    }

    /// Registry with the built-in laws using default limits
    #[must_use]
    pub fn with_defaults() -> Self {
        Self::with_config(&EngineConfig::default())
    }

    /// Registry with the built-in laws using the given limits
    #[must_use]
    pub fn with_config(config: &EngineConfig) -> Self {
        Self {
            laws: builtin::all(config),
        }
    }

    /// Append a law
    ///
    /// # Errors
    /// Returns `DuplicateLaw` if the id is taken
    pub fn register(&mut self, law: Law) -> Result<(), RegistryError> {
        if self.contains(law.id()) {
            return Err(RegistryError::DuplicateLaw(law.id().to_string()));
        }
        self.laws.push(law);
        Ok(())
    }

    /// Insert a law so it runs immediately before `anchor`
    ///
    /// # Errors
    /// Returns `DuplicateLaw` if the id is taken, `LawNotFound` if `anchor` is absent
    pub fn insert_before(&mut self, anchor: &str, law: Law) -> Result<(), RegistryError> {
        if self.contains(law.id()) {
            return Err(RegistryError::DuplicateLaw(law.id().to_string()));
        }
        let pos = self
            .position(anchor)
            .ok_or_else(|| RegistryError::LawNotFound(anchor.to_string()))?;
        self.laws.insert(pos, law);
        Ok(())
    }

    /// Remove a law by id
    ///
    /// # Errors
    /// Returns `LawNotFound` if absent
    pub fn remove(&mut self, id: &str) -> Result<Law, RegistryError> {
        let pos = self
            .position(id)
            .ok_or_else(|| RegistryError::LawNotFound(id.to_string()))?;
        Ok(self.laws.remove(pos))
    }

    /// Look up a law
    #[must_use]
    pub fn get(&self, id: &str) -> Option<&Law> {
        self.laws.iter().find(|l| l.id() == id)
    }

    /// Whether a law id is registered
    #[inline]
    #[must_use]
    pub fn contains(&self, id: &str) -> bool {
        self.position(id).is_some()
    }

    fn position(&self, id: &str) -> Option<usize> {
        self.laws.iter().position(|l| l.id() == id)
    }

    /// Law ids in evaluation order
    #[must_use]
    pub fn ids(&self) -> Vec<&str> {
        self.laws.iter().map(Law::id).collect()
    }

    /// Metadata of every law, in evaluation order
    #[must_use]
    pub fn catalog(&self) -> Vec<LawMeta> {
        self.laws.iter().map(|l| l.meta().clone()).collect()
    }

    /// Laws in a category, in evaluation order
    pub fn in_category(&self, category: LawCategory) -> impl Iterator<Item = &Law> {
        self.laws.iter().filter(move |l| l.category() == category)
    }

    /// Iterate in evaluation order
    pub fn iter(&self) -> impl Iterator<Item = &Law> {
        self.laws.iter()
    }

    /// Number of laws
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.laws.len()
    }

    /// Check if registry is empty
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.laws.is_empty()
    }
}
