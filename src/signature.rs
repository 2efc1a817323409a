//! Named, typed handles for class members, used as map keys by the
//! inheritance analysis.

use std::fmt;
use std::hash::{Hash, Hasher};

use crate::descriptor::{parse_field_type, parse_method_descriptor, FieldType, MethodDescriptor};
use crate::error::{Error, Result};

/// The seam shared by field and method signatures.
pub trait MemberSignature {
    fn name(&self) -> &str;
}

/// A field, by name and (optionally) type.
///
/// The type is optional because callers sometimes only know a name,
/// e.g. when chasing a shadowed field through an obfuscated
/// hierarchy. Equality degrades to a name-only comparison whenever
/// either side lacks a type; two signatures that both carry a type
/// compare name and type. Lenient lookups depend on this, so the
/// behaviour is part of the contract.
#[derive(Debug, Clone)]
pub struct FieldSignature {
    name: String,
    field_type: Option<FieldType>,
}

impl FieldSignature {
    pub fn new(name: impl Into<String>, field_type: FieldType) -> Self {
        Self {
            name: name.into(),
            field_type: Some(field_type),
        }
    }

    /// A signature carrying a name only.
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            field_type: None,
        }
    }

    /// Builds a signature from a raw field descriptor.
    pub fn of(name: impl Into<String>, descriptor: &str) -> Result<Self> {
        Ok(Self::new(name, parse_field_type(descriptor)?))
    }

    pub fn field_type(&self) -> Option<&FieldType> {
        self.field_type.as_ref()
    }
}

impl MemberSignature for FieldSignature {
    fn name(&self) -> &str {
        &self.name
    }
}

impl PartialEq for FieldSignature {
    fn eq(&self, other: &Self) -> bool {
        match (&self.field_type, &other.field_type) {
            (Some(this), Some(that)) => self.name == other.name && this == that,
            _ => self.name == other.name,
        }
    }
}

impl Eq for FieldSignature {}

impl Hash for FieldSignature {
    fn hash<H: Hasher>(&self, state: &mut H) {
        // Only the name: the hash has to agree with the name-only
        // equality fallback, or typed and untyped keys could never
        // find each other in a map.
        self.name.hash(state);
    }
}

impl fmt::Display for FieldSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.field_type {
            Some(field_type) => write!(f, "{}:{}", self.name, field_type),
            None => write!(f, "{}", self.name),
        }
    }
}

/// A method, by name and full descriptor.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MethodSignature {
    name: String,
    descriptor: MethodDescriptor,
}

impl MethodSignature {
    pub fn new(name: impl Into<String>, descriptor: MethodDescriptor) -> Self {
        Self {
            name: name.into(),
            descriptor,
        }
    }

    /// Builds a signature from a raw method descriptor.
    pub fn of(name: impl Into<String>, descriptor: &str) -> Result<Self> {
        Ok(Self::new(name, parse_method_descriptor(descriptor)?))
    }

    /// Splits a combined `name(params)ret` form, e.g. `"isEmpty()Z"`.
    pub fn of_jvms(jvms: &str) -> Result<Self> {
        let open = jvms
            .find('(')
            .ok_or_else(|| Error::InvalidDescriptor(jvms.to_owned()))?;
        Self::of(&jvms[..open], &jvms[open..])
    }

    pub fn descriptor(&self) -> &MethodDescriptor {
        &self.descriptor
    }
}

impl MemberSignature for MethodSignature {
    fn name(&self) -> &str {
        &self.name
    }
}

impl fmt::Display for MethodSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.name, self.descriptor)
    }
}
