//! Read-only collaborators the wizard consumes but does not own: the category
//! list, reverse geocoding and the caller's role.

use std::collections::HashMap;
use std::fmt;

use anyhow::Result;
use async_trait::async_trait;
use serde::Deserialize;

use crate::errors::WizardError;

// ────────────────────────────────────────────────────────────────────────────
// Categories
// ────────────────────────────────────────────────────────────────────────────

/// Resolves a category id to its display name.
pub trait CategoryLookup: Send + Sync {
    fn name_for(&self, id: &str) -> Option<String>;
}

/// A category as listed by the API. Either id spelling may be present, or both.
#[derive(Debug, Clone, Deserialize)]
pub struct Category {
    pub id: Option<String>,
    #[serde(rename = "_id")]
    pub object_id: Option<String>,
    pub name: String,
}

impl Category {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: Some(id.into()),
            object_id: None,
            name: name.into(),
        }
    }

    /// `id`, falling back to `_id`.
    pub fn category_id(&self) -> Option<&str> {
        self.id.as_deref().or(self.object_id.as_deref())
    }
}

/// In-memory lookup built from an already fetched category list.
#[derive(Debug, Clone, Default)]
pub struct StaticCategories {
    by_id: HashMap<String, String>,
}

impl StaticCategories {
    pub fn new(categories: impl IntoIterator<Item = Category>) -> Self {
        Self {
            by_id: categories
                .into_iter()
                .filter_map(|c| Some((c.category_id()?.to_string(), c.name)))
                .collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.by_id.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_id.is_empty()
    }
}

impl CategoryLookup for StaticCategories {
    fn name_for(&self, id: &str) -> Option<String> {
        self.by_id.get(id).cloned()
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Reverse geocoding
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct GeocodedAddress {
    pub street: String,
    pub city: String,
    pub region: String,
    pub country: String,
}

/// Turns coordinates into a postal address. Only used to prefill location fields.
#[async_trait]
pub trait ReverseGeocoder: Send + Sync {
    async fn reverse(&self, lat: f64, lng: f64) -> Result<GeocodedAddress>;
}

// ────────────────────────────────────────────────────────────────────────────
// Roles
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Seeker,
    Provider,
    Admin,
}

impl From<&str> for Role {
    fn from(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "provider" => Role::Provider,
            "admin" => Role::Admin,
            _ => Role::Seeker,
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Role::Seeker => "seeker",
            Role::Provider => "provider",
            Role::Admin => "admin",
        })
    }
}

/// Only providers and admins may open the posting wizard.
pub fn ensure_can_post(role: Role) -> Result<(), WizardError> {
    match role {
        Role::Provider | Role::Admin => Ok(()),
        Role::Seeker => Err(WizardError::Forbidden(role)),
    }
}
