#![deny(missing_docs)]

//! # Schema Graph
//!
//! Owns every `SchemaDescriptor` of a run. Descriptors are stored in visitation
//! order and indexed by path; the index is the only way to reach one.

use crate::model::schema::{SchemaDescriptor, Shape, TypeRef};
use crate::oas::pointer::SchemaPath;
use serde::{Serialize, Serializer};
use std::collections::HashMap;

/// Flat, path-indexed descriptor store.
#[derive(Debug, Clone, Default)]
pub struct SchemaGraph {
    descriptors: Vec<SchemaDescriptor>,
    index: HashMap<SchemaPath, usize>,
}

impl SchemaGraph {
    /// Empty graph.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a descriptor unless its path is already present.
    ///
    /// Returns `false` when the path was already known (the new value is dropped).
    pub fn insert(&mut self, descriptor: SchemaDescriptor) -> bool {
        if self.index.contains_key(&descriptor.path) {
            return false;
        }
        self.index
            .insert(descriptor.path.clone(), self.descriptors.len());
        self.descriptors.push(descriptor);
        true
    }

    /// Whether a descriptor exists at `path`.
    pub fn contains(&self, path: &SchemaPath) -> bool {
        self.index.contains_key(path)
    }

    /// Descriptor at `path`.
    pub fn get(&self, path: &SchemaPath) -> Option<&SchemaDescriptor> {
        self.index.get(path).map(|&i| &self.descriptors[i])
    }

    pub(crate) fn by_index_mut(&mut self, i: usize) -> Option<&mut SchemaDescriptor> {
        self.descriptors.get_mut(i)
    }

    /// Position of `path` in visitation order.
    pub fn position(&self, path: &SchemaPath) -> Option<usize> {
        self.index.get(path).copied()
    }

    /// Descriptors in visitation order.
    pub fn iter(&self) -> impl Iterator<Item = &SchemaDescriptor> {
        self.descriptors.iter()
    }

    /// Number of descriptors.
    pub fn len(&self) -> usize {
        self.descriptors.len()
    }

    /// True when nothing was gathered.
    pub fn is_empty(&self) -> bool {
        self.descriptors.is_empty()
    }

    /// Follows `Alias(Schema)` chains to the descriptor (or primitive) they end at.
    ///
    /// Used for identity comparisons; cycles stop at the first repeated path.
    pub fn resolve_alias<'a>(&'a self, ty: &'a TypeRef) -> &'a TypeRef {
        let mut current = ty;
        let mut hops = 0;
        while let Some(path) = current.as_schema() {
            match self.get(path).and_then(SchemaDescriptor::shape) {
                Some(Shape::Alias { target }) if hops < self.descriptors.len() => {
                    current = target;
                    hops += 1;
                }
                _ => break,
            }
        }
        current
    }
}

impl Serialize for SchemaGraph {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.descriptors.serialize(serializer)
    }
}
