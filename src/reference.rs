//! Qualified references: unique paths to classes, members, and method
//! parameters, addressable without any hierarchy having been built.

use std::fmt;

use crate::descriptor::ObjectType;
use crate::error::{Error, Result};
use crate::signature::{FieldSignature, MemberSignature, MethodSignature};

pub const INNER_CLASS_SEPARATOR: char = '$';

/// The kind of program element a reference points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReferenceKind {
    TopLevelClass,
    InnerClass,
    Field,
    Method,
    MethodParameter,
}

/// A path to a class, either top-level or nested.
///
/// A nested class owns the reference to its enclosing class; the
/// chain is derived from the `$`-joined internal name.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ClassReference {
    TopLevel {
        class_type: ObjectType,
    },
    Inner {
        parent: Box<ClassReference>,
        class_type: ObjectType,
    },
}

impl ClassReference {
    /// Builds a reference for the given type, deriving the enclosing
    /// chain from any `$` separators in the name.
    pub fn of(class_type: ObjectType) -> Self {
        match class_type.class_name().rfind(INNER_CLASS_SEPARATOR) {
            Some(split) => {
                let parent = Self::of(ObjectType::new(&class_type.class_name()[..split]));
                ClassReference::Inner {
                    parent: Box::new(parent),
                    class_type,
                }
            }
            None => ClassReference::TopLevel { class_type },
        }
    }

    pub fn named(class_name: impl Into<String>) -> Self {
        Self::of(ObjectType::new(class_name))
    }

    pub fn class_type(&self) -> &ObjectType {
        match self {
            ClassReference::TopLevel { class_type } => class_type,
            ClassReference::Inner { class_type, .. } => class_type,
        }
    }

    pub fn parent_class(&self) -> Option<&ClassReference> {
        match self {
            ClassReference::TopLevel { .. } => None,
            ClassReference::Inner { parent, .. } => Some(parent),
        }
    }

    /// A reference to a class nested directly inside this one.
    pub fn inner_class(&self, unqualified_name: &str) -> ClassReference {
        let name = format!(
            "{}{}{}",
            self.class_type().class_name(),
            INNER_CLASS_SEPARATOR,
            unqualified_name,
        );
        ClassReference::Inner {
            parent: Box::new(self.clone()),
            class_type: ObjectType::new(name),
        }
    }

    pub fn field(&self, signature: FieldSignature) -> FieldReference {
        FieldReference {
            owning_class: self.clone(),
            signature,
        }
    }

    pub fn method(&self, signature: MethodSignature) -> MethodReference {
        MethodReference {
            owning_class: self.clone(),
            signature,
        }
    }

    pub fn kind(&self) -> ReferenceKind {
        match self {
            ClassReference::TopLevel { .. } => ReferenceKind::TopLevelClass,
            ClassReference::Inner { .. } => ReferenceKind::InnerClass,
        }
    }
}

impl fmt::Display for ClassReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.class_type().class_name())
    }
}

/// A path to a field of a class.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FieldReference {
    owning_class: ClassReference,
    signature: FieldSignature,
}

impl FieldReference {
    pub fn owning_class(&self) -> &ClassReference {
        &self.owning_class
    }

    pub fn signature(&self) -> &FieldSignature {
        &self.signature
    }
}

impl fmt::Display for FieldReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.owning_class, self.signature)
    }
}

/// A path to a method of a class.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MethodReference {
    owning_class: ClassReference,
    signature: MethodSignature,
}

impl MethodReference {
    pub fn owning_class(&self) -> &ClassReference {
        &self.owning_class
    }

    pub fn signature(&self) -> &MethodSignature {
        &self.signature
    }

    /// A reference to the parameter at `index` (zero-based); the
    /// index is checked against the descriptor's parameter count.
    pub fn parameter(&self, index: usize) -> Result<MethodParameterReference> {
        let count = self.signature.descriptor().params().len();
        if index >= count {
            return Err(Error::OutOfBoundsParameter { index, count });
        }
        Ok(MethodParameterReference {
            parent_method: self.clone(),
            index,
        })
    }
}

impl fmt::Display for MethodReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.owning_class, self.signature)
    }
}

/// A path to a single parameter of a method.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MethodParameterReference {
    parent_method: MethodReference,
    index: usize,
}

impl MethodParameterReference {
    pub fn parent_method(&self) -> &MethodReference {
        &self.parent_method
    }

    pub fn index(&self) -> usize {
        self.index
    }
}

impl fmt::Display for MethodParameterReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.parent_method, self.index)
    }
}

/// Any reference, for callers that address program elements
/// uniformly.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum QualifiedReference {
    Class(ClassReference),
    Field(FieldReference),
    Method(MethodReference),
    MethodParameter(MethodParameterReference),
}

impl QualifiedReference {
    pub fn kind(&self) -> ReferenceKind {
        match self {
            QualifiedReference::Class(class) => class.kind(),
            QualifiedReference::Field(_) => ReferenceKind::Field,
            QualifiedReference::Method(_) => ReferenceKind::Method,
            QualifiedReference::MethodParameter(_) => ReferenceKind::MethodParameter,
        }
    }

    /// The name of the referenced element: the class name for class
    /// references, the member name otherwise.
    pub fn name(&self) -> &str {
        match self {
            QualifiedReference::Class(class) => class.class_type().class_name(),
            QualifiedReference::Field(field) => field.signature().name(),
            QualifiedReference::Method(method) => method.signature().name(),
            QualifiedReference::MethodParameter(parameter) => {
                parameter.parent_method().signature().name()
            }
        }
    }
}

impl fmt::Display for QualifiedReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QualifiedReference::Class(class) => class.fmt(f),
            QualifiedReference::Field(field) => field.fmt(f),
            QualifiedReference::Method(method) => method.fmt(f),
            QualifiedReference::MethodParameter(parameter) => parameter.fmt(f),
        }
    }
}
