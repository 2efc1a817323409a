//! Inheritance analysis: per-class fact snapshots, the pluggable
//! provider boundary that supplies them, and the resolution of
//! transitive parent sets and member-inheritance questions.

mod providers;
mod resolver;

pub use providers::{
    CachingInheritanceProvider, ClassSet, ClassSetInheritanceProvider,
    ClassSourceInheritanceProvider,
};
pub use resolver::InheritanceResolver;

use std::any::Any;
use std::collections::{HashMap, HashSet};
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use crate::class;
use crate::error::Result;
use crate::signature::{FieldSignature, MethodSignature};

/// Supplies inheritance information one class at a time, on request,
/// rather than in bulk.
///
/// `None` means the class cannot be located; callers must treat
/// "unknown" and "does not exist" identically. Providers translate
/// their own read failures into `None` as well, so a resolution walk
/// never has to handle backend-specific errors.
pub trait InheritanceProvider {
    fn provide(&self, class_name: &str) -> Option<Arc<ClassInfo>>;

    /// Like [`provide`](Self::provide), with an opaque hint the
    /// provider may use to skip the name lookup. A hint a provider
    /// does not recognise is ignored.
    fn provide_with_hint(&self, class_name: &str, _hint: &dyn Any) -> Option<Arc<ClassInfo>> {
        self.provide(class_name)
    }

    /// Wraps this provider so each class name is fetched from the
    /// backing source at most once.
    fn cached(self) -> CachingInheritanceProvider<Self>
    where
        Self: Sized,
    {
        CachingInheritanceProvider::new(self)
    }
}

/// How a member travels down the hierarchy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InheritanceType {
    Public,
    Protected,
    Package,
    Private,
    /// Safe default for a member that was looked up but not declared.
    None,
}

impl InheritanceType {
    const ACC_PUBLIC: u16 = 0x0001;
    const ACC_PRIVATE: u16 = 0x0002;
    const ACC_PROTECTED: u16 = 0x0004;

    /// Classifies a member by its raw access bits.
    pub fn from_access(flags: u16) -> Self {
        if flags & Self::ACC_PRIVATE != 0 {
            InheritanceType::Private
        } else if flags & Self::ACC_PROTECTED != 0 {
            InheritanceType::Protected
        } else if flags & Self::ACC_PUBLIC != 0 {
            InheritanceType::Public
        } else {
            InheritanceType::Package
        }
    }

    /// Whether `child` could inherit a member of this visibility
    /// declared in `parent`. Ancestry between the two is not checked
    /// here.
    pub fn can_inherit(self, parent: &ClassInfo, child: &ClassInfo) -> bool {
        match self {
            InheritanceType::Public | InheritanceType::Protected => true,
            InheritanceType::Package => parent.package() == child.package(),
            InheritanceType::Private | InheritanceType::None => false,
        }
    }
}

/// An immutable snapshot of one class's own, non-inherited facts.
///
/// Equality and hashing go by name alone: two snapshots of the same
/// class name are the same entity, even if one is staler than the
/// other.
#[derive(Debug, Clone)]
pub struct ClassInfo {
    name: String,
    is_interface: bool,
    super_name: String,
    interfaces: Vec<String>,
    fields: HashMap<FieldSignature, InheritanceType>,
    methods: HashMap<MethodSignature, InheritanceType>,
}

impl ClassInfo {
    pub fn new(
        name: impl Into<String>,
        is_interface: bool,
        super_name: impl Into<String>,
        interfaces: Vec<String>,
        fields: HashMap<FieldSignature, InheritanceType>,
        methods: HashMap<MethodSignature, InheritanceType>,
    ) -> Self {
        Self {
            name: name.into(),
            is_interface,
            super_name: super_name.into(),
            interfaces,
            fields,
            methods,
        }
    }

    /// Builds a snapshot from a decoded class file. Fails only on a
    /// malformed member descriptor, which marks a corrupt source.
    pub fn of_class(class: &class::Class) -> Result<Self> {
        let mut fields = HashMap::with_capacity(class.fields.len());
        for field in &class.fields {
            fields.insert(
                FieldSignature::of(field.name.as_ref(), &field.descriptor)?,
                InheritanceType::from_access(field.access_flags.bits()),
            );
        }

        let mut methods = HashMap::with_capacity(class.methods.len());
        for method in &class.methods {
            methods.insert(
                MethodSignature::of(method.name.as_ref(), &method.descriptor)?,
                InheritanceType::from_access(method.access_flags.bits()),
            );
        }

        Ok(Self::new(
            class.name.as_ref(),
            class.is_interface(),
            class.super_name.as_deref().unwrap_or(""),
            class.interfaces.iter().map(|i| i.to_string()).collect(),
            fields,
            methods,
        ))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// The package part of the name; empty for the default package.
    pub fn package(&self) -> &str {
        match self.name.rfind('/') {
            Some(split) => &self.name[..split],
            None => "",
        }
    }

    pub fn is_interface(&self) -> bool {
        self.is_interface
    }

    /// Empty for `java/lang/Object` and for interfaces.
    pub fn super_name(&self) -> &str {
        &self.super_name
    }

    /// Direct interfaces only, in declaration order.
    pub fn interfaces(&self) -> &[String] {
        &self.interfaces
    }

    /// Declared fields only; inherited fields are never included.
    pub fn fields(&self) -> &HashMap<FieldSignature, InheritanceType> {
        &self.fields
    }

    /// Declared methods only; inherited methods are never included.
    pub fn methods(&self) -> &HashMap<MethodSignature, InheritanceType> {
        &self.methods
    }

    /// All parents of this class, recursively: the superclass chain
    /// plus every interface, including interfaces of interfaces.
    ///
    /// An ancestor the provider cannot supply is missing from the
    /// result along with its own parents; that is deliberate, not an
    /// error. Callers needing strictness check the result against the
    /// direct edges themselves. A cyclic hierarchy reported by a
    /// broken provider terminates, and a class is never its own
    /// parent.
    pub fn parents<P: InheritanceProvider + ?Sized>(&self, provider: &P) -> HashSet<Arc<ClassInfo>> {
        let mut parents = HashSet::new();
        self.collect_parents(provider, &mut parents);
        parents
    }

    /// Populates `parents` instead of allocating a fresh set.
    pub fn collect_parents<P: InheritanceProvider + ?Sized>(
        &self,
        provider: &P,
        parents: &mut HashSet<Arc<ClassInfo>>,
    ) {
        let mut visited = HashSet::new();
        visited.insert(self.name.clone());
        self.walk_parents(provider, &mut visited, parents);
    }

    fn walk_parents<P: InheritanceProvider + ?Sized>(
        &self,
        provider: &P,
        visited: &mut HashSet<String>,
        parents: &mut HashSet<Arc<ClassInfo>>,
    ) {
        for parent_name in self.parent_names() {
            if parent_name.is_empty() || !visited.insert(parent_name.to_owned()) {
                continue;
            }
            if let Some(parent) = provider.provide(parent_name) {
                parent.walk_parents(provider, visited, parents);
                parents.insert(parent);
            }
        }
    }

    fn parent_names(&self) -> impl Iterator<Item = &str> {
        std::iter::once(self.super_name.as_str())
            .chain(self.interfaces.iter().map(String::as_str))
    }

    /// Whether `klass` is among this class's parents, recursively.
    pub fn has_parent<P: InheritanceProvider + ?Sized>(&self, klass: &str, provider: &P) -> bool {
        self.parents(provider).iter().any(|p| p.name() == klass)
    }

    /// Whether `info` is among this class's parents, recursively.
    pub fn has_parent_info<P: InheritanceProvider + ?Sized>(
        &self,
        info: &ClassInfo,
        provider: &P,
    ) -> bool {
        self.parents(provider).contains(info)
    }

    /// Whether `child` could inherit `field` as declared in this
    /// class.
    ///
    /// This does not check that `child` actually descends from this
    /// class; pair it with [`has_parent`](Self::has_parent) when that
    /// is not already established.
    pub fn can_inherit_field(&self, child: &ClassInfo, field: &FieldSignature) -> bool {
        self.fields
            .get(field)
            .copied()
            .unwrap_or(InheritanceType::None)
            .can_inherit(self, child)
    }

    /// Whether `child` could inherit `method` as declared in this
    /// class. The same ancestry caveat as
    /// [`can_inherit_field`](Self::can_inherit_field) applies.
    pub fn can_inherit_method(&self, child: &ClassInfo, method: &MethodSignature) -> bool {
        self.methods
            .get(method)
            .copied()
            .unwrap_or(InheritanceType::None)
            .can_inherit(self, child)
    }
}

impl PartialEq for ClassInfo {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
    }
}

impl Eq for ClassInfo {}

impl Hash for ClassInfo {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.name.hash(state);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct MapProvider {
        classes: HashMap<String, Arc<ClassInfo>>,
    }

    impl MapProvider {
        fn new(classes: impl IntoIterator<Item = ClassInfo>) -> Self {
            Self {
                classes: classes
                    .into_iter()
                    .map(|info| (info.name().to_owned(), Arc::new(info)))
                    .collect(),
            }
        }

        fn get(&self, name: &str) -> Arc<ClassInfo> {
            Arc::clone(&self.classes[name])
        }
    }

    impl InheritanceProvider for MapProvider {
        fn provide(&self, class_name: &str) -> Option<Arc<ClassInfo>> {
            self.classes.get(class_name).cloned()
        }
    }

    fn class(name: &str, super_name: &str, interfaces: &[&str]) -> ClassInfo {
        ClassInfo::new(
            name,
            false,
            super_name,
            interfaces.iter().map(|i| i.to_string()).collect(),
            HashMap::new(),
            HashMap::new(),
        )
    }

    fn interface(name: &str, interfaces: &[&str]) -> ClassInfo {
        ClassInfo::new(
            name,
            true,
            "",
            interfaces.iter().map(|i| i.to_string()).collect(),
            HashMap::new(),
            HashMap::new(),
        )
    }

    fn jdk_like() -> MapProvider {
        MapProvider::new([
            class("java/lang/Object", "", &[]),
            interface("java/util/Collection", &[]),
            interface("java/util/List", &["java/util/Collection"]),
            interface("java/util/RandomAccess", &[]),
            class(
                "java/util/AbstractList",
                "java/lang/Object",
                &["java/util/List"],
            ),
            class(
                "java/util/ArrayList",
                "java/util/AbstractList",
                &["java/util/List", "java/util/RandomAccess"],
            ),
        ])
    }

    fn names(parents: &HashSet<Arc<ClassInfo>>) -> HashSet<&str> {
        parents.iter().map(|p| p.name()).collect()
    }

    #[test]
    fn transitive_closure() {
        let provider = jdk_like();
        let array_list = provider.get("java/util/ArrayList");

        let parents = array_list.parents(&provider);
        assert_eq!(
            names(&parents),
            HashSet::from([
                "java/lang/Object",
                "java/util/AbstractList",
                "java/util/List",
                "java/util/Collection",
                "java/util/RandomAccess",
            ]),
        );
        // the diamond through AbstractList and the direct List edge
        // still yields one entry per class
        assert_eq!(parents.len(), 5);

        // direct interfaces stay non-recursive
        assert!(!array_list
            .interfaces()
            .contains(&"java/util/Collection".to_owned()));
    }

    #[test]
    fn parents_excludes_self() {
        let provider = jdk_like();
        let list = provider.get("java/util/List");
        assert!(!list.parents(&provider).contains(list.as_ref()));
    }

    #[test]
    fn has_parent() {
        let provider = jdk_like();
        let array_list = provider.get("java/util/ArrayList");

        assert!(array_list.has_parent("java/util/Collection", &provider));
        assert!(!array_list.has_parent("java/util/Map", &provider));
        assert!(array_list
            .has_parent_info(&provider.get("java/util/List"), &provider));
    }

    #[test]
    fn unknown_ancestor_is_silently_omitted() {
        let provider = MapProvider::new([
            interface("java/util/Collection", &[]),
            interface("java/util/List", &["java/util/Collection"]),
            class("a/Orphan", "a/MissingBase", &["java/util/List"]),
        ]);

        let orphan = provider.get("a/Orphan");
        let parents = orphan.parents(&provider);
        assert_eq!(
            names(&parents),
            HashSet::from(["java/util/List", "java/util/Collection"]),
        );
    }

    #[test]
    fn cyclic_hierarchy_terminates() {
        let provider = MapProvider::new([class("a/A", "a/B", &[]), class("a/B", "a/A", &[])]);

        let a = provider.get("a/A");
        let parents = a.parents(&provider);
        assert_eq!(names(&parents), HashSet::from(["a/B"]));

        let b = provider.get("a/B");
        assert_eq!(names(&b.parents(&provider)), HashSet::from(["a/A"]));
    }

    fn with_fields(name: &str, fields: &[(&str, InheritanceType)]) -> ClassInfo {
        ClassInfo::new(
            name,
            false,
            "",
            Vec::new(),
            fields
                .iter()
                .map(|&(field, visibility)| (FieldSignature::of(field, "I").unwrap(), visibility))
                .collect(),
            HashMap::new(),
        )
    }

    #[test]
    fn field_visibility() {
        let base = with_fields(
            "a/Base",
            &[
                ("pub_f", InheritanceType::Public),
                ("prot_f", InheritanceType::Protected),
                ("pkg_f", InheritanceType::Package),
                ("priv_f", InheritanceType::Private),
            ],
        );
        let same_package = class("a/Child", "a/Base", &[]);
        let other_package = class("b/Other", "a/Base", &[]);

        let field = |name: &str| FieldSignature::of(name, "I").unwrap();

        assert!(base.can_inherit_field(&same_package, &field("pub_f")));
        assert!(base.can_inherit_field(&other_package, &field("pub_f")));
        assert!(base.can_inherit_field(&other_package, &field("prot_f")));
        assert!(base.can_inherit_field(&same_package, &field("pkg_f")));
        assert!(!base.can_inherit_field(&other_package, &field("pkg_f")));
        assert!(!base.can_inherit_field(&same_package, &field("priv_f")));
        assert!(!base.can_inherit_field(&same_package, &field("absent")));
    }

    #[test]
    fn untyped_field_lookup_is_lenient() {
        let base = with_fields("a/Base", &[("counter", InheritanceType::Public)]);
        let child = class("a/Child", "a/Base", &[]);
        assert!(base.can_inherit_field(&child, &FieldSignature::named("counter")));
    }

    #[test]
    fn method_visibility() {
        let grow = MethodSignature::of("grow", "(I)V").unwrap();
        let base = ClassInfo::new(
            "a/Base",
            false,
            "",
            Vec::new(),
            HashMap::new(),
            HashMap::from([(grow.clone(), InheritanceType::Package)]),
        );
        let same_package = class("a/Child", "a/Base", &[]);
        let other_package = class("b/Other", "a/Base", &[]);

        assert!(base.can_inherit_method(&same_package, &grow));
        assert!(!base.can_inherit_method(&other_package, &grow));
        assert!(!base.can_inherit_method(
            &same_package,
            &MethodSignature::of("shrink", "(I)V").unwrap(),
        ));
    }

    #[test]
    fn inheritance_type_from_access() {
        assert_eq!(InheritanceType::from_access(0x0001), InheritanceType::Public);
        assert_eq!(
            InheritanceType::from_access(0x0002),
            InheritanceType::Private,
        );
        assert_eq!(
            InheritanceType::from_access(0x0004),
            InheritanceType::Protected,
        );
        assert_eq!(
            InheritanceType::from_access(0x0008),
            InheritanceType::Package,
        );
    }

    #[test]
    fn package_of() {
        let info = class("java/lang/Object", "", &[]);
        assert_eq!(info.package(), "java/lang");
        assert_eq!(class("TopLevel", "", &[]).package(), "");
    }

    #[test]
    fn snapshot_identity_is_by_name() {
        let stale = class("a/Foo", "", &[]);
        let fresh = class("a/Foo", "java/lang/Object", &["a/Iface"]);
        assert_eq!(stale, fresh);

        let mut set = HashSet::new();
        set.insert(Arc::new(stale));
        assert!(set.contains(&fresh));
    }
}
