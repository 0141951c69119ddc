//! Tag registry: discriminator tag → variant descriptor.

use std::collections::HashMap;
use std::sync::Arc;

use thiserror::Error;

use crate::catalog;
use crate::descriptor::{DescriptorBuilder, DescriptorError, VariantDescriptor};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RegistryError {
    #[error("tag `{tag}` registered by both {existing} and {duplicate}")]
    DuplicateTagRegistration {
        tag: String,
        existing: String,
        duplicate: String,
    },
    #[error(transparent)]
    Descriptor(#[from] DescriptorError),
}

/// Collects registrations before the registry is frozen.
#[derive(Debug, Default)]
pub struct RegistryBuilder {
    descriptors: HashMap<String, Arc<VariantDescriptor>>,
    order: Vec<String>,
}

impl RegistryBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a built descriptor under its tag. A tag that is already taken
    /// is an error; nothing is overwritten.
    pub fn register(&mut self, descriptor: VariantDescriptor) -> Result<&mut Self, RegistryError> {
        if let Some(existing) = self.descriptors.get(descriptor.tag()) {
            return Err(RegistryError::DuplicateTagRegistration {
                tag: descriptor.tag().to_owned(),
                existing: existing.name().to_owned(),
                duplicate: descriptor.name().to_owned(),
            });
        }
        let tag = descriptor.tag().to_owned();
        self.order.push(tag.clone());
        self.descriptors.insert(tag, Arc::new(descriptor));
        Ok(self)
    }

    /// Build `builder` and register the result.
    pub fn declare(&mut self, builder: DescriptorBuilder) -> Result<&mut Self, RegistryError> {
        let descriptor = builder.build()?;
        self.register(descriptor)
    }

    pub fn len(&self) -> usize {
        self.descriptors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.descriptors.is_empty()
    }

    pub fn build(self) -> EventRegistry {
        EventRegistry {
            descriptors: self.descriptors,
            order: self.order,
        }
    }
}

/// Frozen tag → descriptor map. Read-only and shared across decoders.
#[derive(Debug, Clone)]
pub struct EventRegistry {
    descriptors: HashMap<String, Arc<VariantDescriptor>>,
    order: Vec<String>,
}

impl EventRegistry {
    pub fn builder() -> RegistryBuilder {
        RegistryBuilder::new()
    }

    /// Registry holding every known gateway event kind.
    pub fn standard() -> Result<Self, RegistryError> {
        let mut builder = RegistryBuilder::new();
        for variant in catalog::standard_variants() {
            builder.declare(variant)?;
        }
        Ok(builder.build())
    }

    pub fn lookup(&self, tag: &str) -> Option<&Arc<VariantDescriptor>> {
        self.descriptors.get(tag)
    }

    pub fn contains(&self, tag: &str) -> bool {
        self.descriptors.contains_key(tag)
    }

    pub fn len(&self) -> usize {
        self.descriptors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.descriptors.is_empty()
    }

    /// Registered tags, sorted.
    pub fn tags(&self) -> Vec<&str> {
        let mut tags: Vec<&str> = self.descriptors.keys().map(String::as_str).collect();
        tags.sort_unstable();
        tags
    }

    /// Descriptors in registration order.
    pub fn descriptors(&self) -> impl Iterator<Item = &Arc<VariantDescriptor>> {
        self.order.iter().filter_map(|tag| self.descriptors.get(tag))
    }
}
