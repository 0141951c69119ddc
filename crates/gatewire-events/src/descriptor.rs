//! Variant descriptors: the per-event-kind decoding contract.
//!
//! A descriptor pairs the variant's own field schema with its composition
//! directives. Descriptors are built once at start-up through
//! [`DescriptorBuilder`] and are read-only afterwards.

use std::collections::HashSet;
use std::fmt;

use gatewire_protocol::{FieldSpec, FieldType, FieldValue, Schema, SchemaRef};
use serde_json::{Map, Value};
use thiserror::Error;

use crate::event::DecodedEvent;
use crate::naming::tag_of;

/// Computed attribute evaluated against a fully decoded event.
pub type DerivedFn = fn(&DecodedEvent) -> FieldValue;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum DescriptorError {
    #[error("{variant}: proxy target `{target}` is not a declared field")]
    UnknownProxyTarget { variant: String, target: String },
    #[error("{variant}: field `{field}` declared twice")]
    DuplicateField { variant: String, field: String },
    #[error("{variant}: field `{field}` is also declared by embedded {schema}")]
    ShadowsEmbedded {
        variant: String,
        field: String,
        schema: String,
    },
    #[error("{variant}: attach rule {rule} has an empty component")]
    InvalidAttachRule { variant: String, rule: String },
}

/// Embed directive: top-level keys declared by `schema` are gathered under `alias`.
#[derive(Debug, Clone, PartialEq)]
pub struct Embed {
    schema: SchemaRef,
    alias: String,
}

impl Embed {
    pub fn schema(&self) -> &'static Schema {
        self.schema.get()
    }

    pub fn alias(&self) -> &str {
        &self.alias
    }

    /// Move every top-level key of `body` that an embedded field reads (its
    /// wire alias or its name) into a nested object stored at the alias. Only
    /// keys present are moved; the alias key is always written, even when
    /// nothing matched.
    pub fn migrate(&self, body: &mut Map<String, Value>) {
        let nested: Map<String, Value> = self
            .schema()
            .fields()
            .flat_map(wire_keys)
            .filter_map(|key| body.remove(key).map(|raw| (key.to_owned(), raw)))
            .collect();
        body.insert(self.alias.clone(), Value::Object(nested));
    }
}

/// Keys a field is read from on the wire, alias first.
fn wire_keys(spec: &FieldSpec) -> impl Iterator<Item = &str> {
    spec.alias().into_iter().chain([spec.name()])
}

/// Copy `source` onto attribute `dest_attribute` of the model held by `dest_field`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttachRule {
    pub(crate) source: String,
    pub(crate) dest_field: String,
    pub(crate) dest_attribute: String,
}

impl AttachRule {
    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn dest_field(&self) -> &str {
        &self.dest_field
    }

    pub fn dest_attribute(&self) -> &str {
        &self.dest_attribute
    }
}

impl fmt::Display for AttachRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} -> {}.{}",
            self.source, self.dest_field, self.dest_attribute
        )
    }
}

#[derive(Clone)]
pub struct DerivedAttribute {
    name: String,
    compute: DerivedFn,
}

impl DerivedAttribute {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn compute(&self, event: &DecodedEvent) -> FieldValue {
        (self.compute)(event)
    }
}

impl fmt::Debug for DerivedAttribute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("DerivedAttribute").field(&self.name).finish()
    }
}

/// Decoding contract for one event kind.
#[derive(Debug)]
pub struct VariantDescriptor {
    name: String,
    tag: String,
    fields: Schema,
    embed: Option<Embed>,
    proxy: Option<String>,
    attach: Vec<AttachRule>,
    derived: Vec<DerivedAttribute>,
    trace_raw: bool,
}

impl VariantDescriptor {
    pub fn builder(name: impl Into<String>) -> DescriptorBuilder {
        DescriptorBuilder::new(name)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn tag(&self) -> &str {
        &self.tag
    }

    /// Own fields, including the embed alias field when an embed is declared.
    pub fn fields(&self) -> &Schema {
        &self.fields
    }

    pub fn embed(&self) -> Option<&Embed> {
        self.embed.as_ref()
    }

    pub fn proxy(&self) -> Option<&str> {
        self.proxy.as_deref()
    }

    pub fn attach_rules(&self) -> &[AttachRule] {
        &self.attach
    }

    pub fn derived(&self, name: &str) -> Option<&DerivedAttribute> {
        self.derived.iter().find(|d| d.name == name)
    }

    pub fn traces_raw(&self) -> bool {
        self.trace_raw
    }
}

/// Builder collecting fields and directives for a [`VariantDescriptor`].
///
/// Variants that specialise another one start from the parent's builder and
/// add to it.
#[derive(Debug, Clone)]
pub struct DescriptorBuilder {
    name: String,
    tag: Option<String>,
    fields: Vec<FieldSpec>,
    embed: Option<Embed>,
    proxy: Option<String>,
    attach: Vec<AttachRule>,
    derived: Vec<DerivedAttribute>,
    trace_raw: bool,
}

impl DescriptorBuilder {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            tag: None,
            fields: Vec::new(),
            embed: None,
            proxy: None,
            attach: Vec::new(),
            derived: Vec::new(),
            trace_raw: false,
        }
    }

    /// Rename the variant, keeping everything declared so far.
    pub fn renamed(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self.tag = None;
        self
    }

    /// Use `tag` instead of the one computed by the naming rule.
    pub fn tag(mut self, tag: impl Into<String>) -> Self {
        self.tag = Some(tag.into());
        self
    }

    pub fn field(mut self, spec: FieldSpec) -> Self {
        self.fields.push(spec);
        self
    }

    /// Embed `schema` under its lowercased name (`StageInstance` → `stageinstance`).
    pub fn embed(self, schema: fn() -> &'static Schema) -> Self {
        let alias = schema().name().to_lowercase();
        self.embed_as(schema, alias)
    }

    pub fn embed_as(mut self, schema: fn() -> &'static Schema, alias: impl Into<String>) -> Self {
        self.embed = Some(Embed {
            schema: SchemaRef::new(schema),
            alias: alias.into(),
        });
        self
    }

    pub fn proxy(mut self, field: impl Into<String>) -> Self {
        self.proxy = Some(field.into());
        self
    }

    pub fn attach(
        mut self,
        source: impl Into<String>,
        dest_field: impl Into<String>,
        dest_attribute: impl Into<String>,
    ) -> Self {
        self.attach.push(AttachRule {
            source: source.into(),
            dest_field: dest_field.into(),
            dest_attribute: dest_attribute.into(),
        });
        self
    }

    pub fn derived(mut self, name: impl Into<String>, compute: DerivedFn) -> Self {
        self.derived.push(DerivedAttribute {
            name: name.into(),
            compute,
        });
        self
    }

    /// Log every raw body decoded under this variant at debug level.
    pub fn trace_raw(mut self) -> Self {
        self.trace_raw = true;
        self
    }

    pub fn build(self) -> Result<VariantDescriptor, DescriptorError> {
        let Self {
            name,
            tag,
            fields,
            embed,
            proxy,
            attach,
            derived,
            trace_raw,
        } = self;

        let mut specs = Vec::with_capacity(fields.len() + 1);
        if let Some(embed) = &embed {
            specs.push(FieldSpec::new(
                embed.alias.clone(),
                FieldType::Model(embed.schema),
            ));
        }
        specs.extend(fields);

        let mut seen = HashSet::new();
        for spec in &specs {
            if !seen.insert(spec.name()) {
                return Err(DescriptorError::DuplicateField {
                    variant: name,
                    field: spec.name().to_owned(),
                });
            }
        }
        for attribute in &derived {
            if !seen.insert(attribute.name.as_str()) {
                return Err(DescriptorError::DuplicateField {
                    variant: name,
                    field: attribute.name.clone(),
                });
            }
        }

        if let Some(embed) = &embed {
            let embedded = embed.schema();
            if let Some(spec) = specs
                .iter()
                .skip(1)
                .find(|spec| {
                    embedded
                        .fields()
                        .flat_map(wire_keys)
                        .any(|key| wire_keys(spec).any(|own| own == key))
                })
            {
                return Err(DescriptorError::ShadowsEmbedded {
                    variant: name,
                    field: spec.name().to_owned(),
                    schema: embedded.name().to_owned(),
                });
            }
        }

        if let Some(rule) = attach.iter().find(|rule| {
            rule.source.is_empty() || rule.dest_field.is_empty() || rule.dest_attribute.is_empty()
        }) {
            return Err(DescriptorError::InvalidAttachRule {
                variant: name,
                rule: rule.to_string(),
            });
        }

        // An explicit proxy wins over the one implied by the embed.
        let proxy = proxy.or_else(|| embed.as_ref().map(|e| e.alias.clone()));
        if let Some(target) = &proxy
            && !seen.contains(target.as_str())
        {
            return Err(DescriptorError::UnknownProxyTarget {
                variant: name,
                target: target.clone(),
            });
        }

        let tag = tag.unwrap_or_else(|| tag_of(&name));
        let fields = Schema::new(name.clone(), specs);
        Ok(VariantDescriptor {
            name,
            tag,
            fields,
            embed,
            proxy,
            attach,
            derived,
            trace_raw,
        })
    }
}
