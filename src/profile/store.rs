//! In-memory cost profile store
//!
//! Holds administrator-managed profiles keyed by id. Deletion is a hard delete
//! with no cascade: calculations that later reference a deleted id resolve to
//! `ProfileNotFound` through [`ProfileSource`].

use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;
use uuid::Uuid;

use super::data::{CostProfile, NewCostProfile, ProfileId};
use crate::error::{PricingError, Result};

/// Prefix applied to the name and description of a duplicated profile
pub const DUPLICATE_PREFIX: &str = "Copy of ";

/// Read-only profile lookup used by the batch orchestrator
pub trait ProfileSource: Send + Sync {
    /// Resolve a profile by id
    fn get_profile(&self, id: &str) -> Option<CostProfile>;

    /// Resolve a profile by id, mapping a miss to `ProfileNotFound`
    fn require_profile(&self, id: &str) -> Result<CostProfile> {
        self.get_profile(id)
            .ok_or_else(|| PricingError::ProfileNotFound(id.to_string()))
    }
}

impl<T: ProfileSource + ?Sized> ProfileSource for &T {
    fn get_profile(&self, id: &str) -> Option<CostProfile> {
        (**self).get_profile(id)
    }
}

impl<T: ProfileSource + ?Sized> ProfileSource for Arc<T> {
    fn get_profile(&self, id: &str) -> Option<CostProfile> {
        (**self).get_profile(id)
    }
}

/// Profile store with create/update/delete/duplicate operations
#[derive(Debug, Default, Clone)]
pub struct ProfileStore {
    entries: HashMap<ProfileId, CostProfile>,
}

impl ProfileStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a store from already-identified profiles (e.g. loaded from CSV)
    pub fn from_profiles(profiles: Vec<CostProfile>) -> Result<Self> {
        let mut store = Self::new();
        for profile in profiles {
            profile.params.validate()?;
            if store.entries.contains_key(&profile.id) {
                return Err(PricingError::invalid(format!(
                    "duplicate profile id: {}",
                    profile.id
                )));
            }
            store.entries.insert(profile.id.clone(), profile);
        }
        Ok(store)
    }

    /// Create a new profile with a fresh id
    pub fn create(&mut self, new: NewCostProfile) -> Result<CostProfile> {
        new.validate()?;

        let now = Utc::now();
        let profile = CostProfile {
            id: Uuid::new_v4().to_string(),
            name: new.name,
            description: new.description,
            params: new.params,
            created_at: now,
            updated_at: now,
        };

        log::debug!("Created cost profile {} ({})", profile.id, profile.name);
        self.entries.insert(profile.id.clone(), profile.clone());
        Ok(profile)
    }

    /// Replace the editable fields of an existing profile
    pub fn update(&mut self, id: &str, changes: NewCostProfile) -> Result<CostProfile> {
        changes.validate()?;

        let profile = self
            .entries
            .get_mut(id)
            .ok_or_else(|| PricingError::ProfileNotFound(id.to_string()))?;

        profile.name = changes.name;
        profile.description = changes.description;
        profile.params = changes.params;
        profile.updated_at = Utc::now();

        Ok(profile.clone())
    }

    /// Hard delete, returning the removed profile
    pub fn delete(&mut self, id: &str) -> Result<CostProfile> {
        let removed = self
            .entries
            .remove(id)
            .ok_or_else(|| PricingError::ProfileNotFound(id.to_string()))?;
        log::debug!("Deleted cost profile {} ({})", removed.id, removed.name);
        Ok(removed)
    }

    /// Copy every numeric field into a new, independent profile.
    /// The id and timestamps are never copied.
    pub fn duplicate(&mut self, id: &str) -> Result<CostProfile> {
        let source = self
            .entries
            .get(id)
            .ok_or_else(|| PricingError::ProfileNotFound(id.to_string()))?;

        let copy = NewCostProfile {
            name: format!("{}{}", DUPLICATE_PREFIX, source.name),
            description: source
                .description
                .as_ref()
                .map(|d| format!("{}{}", DUPLICATE_PREFIX, d)),
            params: source.params,
        };

        self.create(copy)
    }

    /// All profiles ordered by name, then id
    pub fn list(&self) -> Vec<CostProfile> {
        let mut profiles: Vec<_> = self.entries.values().cloned().collect();
        profiles.sort_by(|a, b| a.name.cmp(&b.name).then_with(|| a.id.cmp(&b.id)));
        profiles
    }

    pub fn get_by_id(&self, id: &str) -> Option<&CostProfile> {
        self.entries.get(id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl ProfileSource for ProfileStore {
    fn get_profile(&self, id: &str) -> Option<CostProfile> {
        self.entries.get(id).cloned()
    }
}
