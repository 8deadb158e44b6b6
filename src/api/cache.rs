//! Identity-keyed entity cache
//!
//! Rows coming back from the executor are merged into one [`EntityStore`]
//! per resource type, so two queries touching the same remote object share
//! a single local representation.

use crate::api::expression::{unmap_wire, Field, Resource, Transport};
use anyhow::{anyhow, bail};
use log::debug;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::fmt;
use std::marker::PhantomData;

/// Local representation of one remote object
///
/// Properties are keyed by member name, independent of the transport the
/// values were loaded through.
pub struct Entity<T: Resource> {
    key: String,
    properties: Map<String, Value>,
    _resource: PhantomData<fn() -> T>,
}

impl<T: Resource> Entity<T> {
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            properties: Map::new(),
            _resource: PhantomData,
        }
    }

    /// Builder-style property setter
    pub fn with(mut self, field: T::Field, value: impl Into<Value>) -> Self {
        self.set(field, value);
        self
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn get(&self, field: T::Field) -> Option<&Value> {
        self.properties.get(field.name())
    }

    /// Deserialize a loaded property, `None` when absent or of another shape
    pub fn get_as<V: DeserializeOwned>(&self, field: T::Field) -> Option<V> {
        self.get(field).and_then(|value| serde_json::from_value(value.clone()).ok())
    }

    /// Property by member name, by a key that matches no member, or by the
    /// wire name a member arrives under on either transport
    pub fn value(&self, name: &str) -> Option<&Value> {
        self.properties.get(name).or_else(|| {
            [Transport::Rest, Transport::Graph]
                .into_iter()
                .find_map(|transport| unmap_wire::<T::Field>(name, transport))
                .and_then(|field| self.get(field))
        })
    }

    /// Whether the property has been loaded or set locally
    pub fn has_property(&self, field: T::Field) -> bool {
        self.properties.contains_key(field.name())
    }

    pub fn set(&mut self, field: T::Field, value: impl Into<Value>) {
        self.properties.insert(field.name().to_string(), value.into());
    }

    pub fn properties(&self) -> &Map<String, Value> {
        &self.properties
    }

    /// Build an entity from a response row
    ///
    /// Wire names are mapped back to member names for `transport`; names
    /// that match no member are kept as they are. OData annotations are
    /// dropped.
    pub fn from_wire(row: &Value, transport: Transport) -> anyhow::Result<Self> {
        let Some(object) = row.as_object() else {
            bail!("response row is not an object: {}", row);
        };

        let mut properties = Map::new();
        for (wire, value) in object {
            if is_annotation(wire) {
                continue;
            }
            let name = match unmap_wire::<T::Field>(wire, transport) {
                Some(field) => field.name().to_string(),
                None => wire.clone(),
            };
            properties.insert(name, value.clone());
        }

        let key_field = T::key_field();
        let key = properties
            .get(key_field.name())
            .and_then(identity_of)
            .ok_or_else(|| anyhow!("response row has no '{}' identity", key_field.name()))?;

        Ok(Self {
            key,
            properties,
            _resource: PhantomData,
        })
    }
}

impl<T: Resource> Clone for Entity<T> {
    fn clone(&self) -> Self {
        Self {
            key: self.key.clone(),
            properties: self.properties.clone(),
            _resource: PhantomData,
        }
    }
}

impl<T: Resource> PartialEq for Entity<T> {
    fn eq(&self, other: &Self) -> bool {
        self.key == other.key && self.properties == other.properties
    }
}

impl<T: Resource> fmt::Debug for Entity<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Entity")
            .field("key", &self.key)
            .field("properties", &self.properties)
            .finish()
    }
}

fn is_annotation(name: &str) -> bool {
    name.contains('@') || name.starts_with("odata.") || name.starts_with("__")
}

/// Canonical string form of an identity value
fn identity_of(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

/// Entities of one resource type, keyed by identity, in first-seen order
pub struct EntityStore<T: Resource> {
    entities: HashMap<String, Entity<T>>,
    order: Vec<String>,
}

impl<T: Resource> Default for EntityStore<T> {
    fn default() -> Self {
        Self {
            entities: HashMap::new(),
            order: Vec::new(),
        }
    }
}

impl<T: Resource> EntityStore<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Merge an entity into the store and return the merged state
    ///
    /// Properties present on `entity` overwrite the stored ones; everything
    /// else already known about the object is kept.
    pub fn merge(&mut self, entity: Entity<T>) -> Entity<T> {
        match self.entities.get_mut(&entity.key) {
            Some(existing) => {
                debug!(
                    "Merging {} properties into cached {:?} '{}'",
                    entity.properties.len(),
                    T::key_field(),
                    entity.key
                );
                for (name, value) in entity.properties {
                    existing.properties.insert(name, value);
                }
                existing.clone()
            }
            None => {
                self.order.push(entity.key.clone());
                self.entities.insert(entity.key.clone(), entity.clone());
                entity
            }
        }
    }

    /// Insert or replace an entity
    pub fn add(&mut self, entity: Entity<T>) {
        if !self.entities.contains_key(&entity.key) {
            self.order.push(entity.key.clone());
        }
        self.entities.insert(entity.key.clone(), entity);
    }

    /// Merge local changes into an existing entity, `false` when unknown
    pub fn update(&mut self, entity: Entity<T>) -> bool {
        if !self.entities.contains_key(&entity.key) {
            return false;
        }
        self.merge(entity);
        true
    }

    pub fn remove(&mut self, key: &str) -> Option<Entity<T>> {
        let removed = self.entities.remove(key)?;
        self.order.retain(|k| k != key);
        Some(removed)
    }

    pub fn get(&self, key: &str) -> Option<&Entity<T>> {
        self.entities.get(key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entities.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Entity<T>> {
        self.order.iter().filter_map(|key| self.entities.get(key))
    }
}
