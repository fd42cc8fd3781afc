//! Secured views over catalog objects.
//!
//! One wrapper variant per catalog-object kind, each holding the wrapped
//! original and the policy it was wrapped under. Read accessors are always
//! available; mutating calls on a read-only wrap fail with the authorization
//! error. `into_inner` is the escape hatch used internally before any
//! write-through to the unsecured catalog.

use crate::access::WrapperPolicy;
use crate::catalog::{CatalogObject, DataStore, Layer, LayerGroup, Namespace, Resource, Workspace};
use crate::error::{Error, Result};

/// Internal name access shared by all catalog object kinds.
trait Named {
    fn name(&self) -> &str;
    fn set_name(&mut self, name: String);
}

macro_rules! impl_named {
    ($($ty:ty),*) => {
        $(impl Named for $ty {
            fn name(&self) -> &str {
                self.name()
            }
            fn set_name(&mut self, name: String) {
                self.set_name(name);
            }
        })*
    };
}

impl_named!(Workspace, Namespace, DataStore, Resource, Layer, LayerGroup);

/// A catalog object wrapped under a [`WrapperPolicy`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Secured<T> {
    inner: T,
    policy: WrapperPolicy,
}

impl<T> Secured<T> {
    pub(crate) fn new(inner: T, policy: WrapperPolicy) -> Self {
        Self { inner, policy }
    }

    /// The policy this object was wrapped under.
    pub fn policy(&self) -> WrapperPolicy {
        self.policy
    }

    /// Read access to the wrapped object.
    pub fn get(&self) -> &T {
        &self.inner
    }

    /// Unwrap the original object. Internal write-through paths call this
    /// after re-checking write capability.
    pub fn into_inner(self) -> T {
        self.inner
    }

    /// Whether mutating calls are accepted.
    pub fn can_write(&self) -> bool {
        self.policy.allows_write()
    }

    /// Whether the underlying data (not just metadata) may be read.
    pub fn allows_data_access(&self) -> bool {
        self.policy.allows_data_access()
    }
}

impl<T: Named> Secured<T> {
    /// The wrapped object's name; visible under every policy.
    pub fn name(&self) -> &str {
        self.inner.name()
    }

    /// Rename the wrapped object. Rejected on read-only wraps.
    pub fn rename(&mut self, name: impl Into<String>) -> Result<()> {
        if !self.policy.allows_write() {
            return Err(Error::AccessDenied(self.inner.name().to_string()));
        }
        self.inner.set_name(name.into());
        Ok(())
    }
}

/// A layer group wrap also carries its members' individual wraps, since a
/// group is only as accessible as its most restricted member.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SecuredLayerGroup {
    inner: LayerGroup,
    policy: WrapperPolicy,
    layers: Vec<Secured<Layer>>,
}

impl SecuredLayerGroup {
    pub(crate) fn new(inner: LayerGroup, policy: WrapperPolicy, layers: Vec<Secured<Layer>>) -> Self {
        Self {
            inner,
            policy,
            layers,
        }
    }

    /// The group name.
    pub fn name(&self) -> &str {
        self.inner.name()
    }

    /// The effective policy of the group as a whole.
    pub fn policy(&self) -> WrapperPolicy {
        self.policy
    }

    /// The surviving member layers with their individual wraps, in the
    /// original publication order.
    pub fn layers(&self) -> &[Secured<Layer>] {
        &self.layers
    }

    /// Rename the group. Rejected on read-only wraps.
    pub fn rename(&mut self, name: impl Into<String>) -> Result<()> {
        if !self.policy.allows_write() {
            return Err(Error::AccessDenied(self.inner.name().to_string()));
        }
        self.inner.set_name(name.into());
        Ok(())
    }

    /// Unwrap the original group.
    pub fn into_inner(self) -> LayerGroup {
        self.inner
    }
}

/// A secured catalog object of any kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SecuredObject {
    Workspace(Secured<Workspace>),
    Namespace(Secured<Namespace>),
    Store(Secured<DataStore>),
    Resource(Secured<Resource>),
    Layer(Secured<Layer>),
    LayerGroup(SecuredLayerGroup),
}

impl SecuredObject {
    pub(crate) fn wrap(object: CatalogObject, policy: WrapperPolicy) -> Self {
        match object {
            CatalogObject::Workspace(w) => SecuredObject::Workspace(Secured::new(w, policy)),
            CatalogObject::Namespace(n) => SecuredObject::Namespace(Secured::new(n, policy)),
            CatalogObject::Store(s) => SecuredObject::Store(Secured::new(s, policy)),
            CatalogObject::Resource(r) => SecuredObject::Resource(Secured::new(r, policy)),
            CatalogObject::Layer(l) => SecuredObject::Layer(Secured::new(l, policy)),
            CatalogObject::LayerGroup(g) => {
                SecuredObject::LayerGroup(SecuredLayerGroup::new(g, policy, Vec::new()))
            }
        }
    }

    /// The wrapped object's name.
    pub fn name(&self) -> &str {
        match self {
            SecuredObject::Workspace(w) => w.name(),
            SecuredObject::Namespace(n) => n.name(),
            SecuredObject::Store(s) => s.name(),
            SecuredObject::Resource(r) => r.name(),
            SecuredObject::Layer(l) => l.name(),
            SecuredObject::LayerGroup(g) => g.name(),
        }
    }

    /// The policy the object was wrapped under.
    pub fn policy(&self) -> WrapperPolicy {
        match self {
            SecuredObject::Workspace(w) => w.policy(),
            SecuredObject::Namespace(n) => n.policy(),
            SecuredObject::Store(s) => s.policy(),
            SecuredObject::Resource(r) => r.policy(),
            SecuredObject::Layer(l) => l.policy(),
            SecuredObject::LayerGroup(g) => g.policy(),
        }
    }

    /// Unwrap back to the plain catalog object.
    pub fn into_object(self) -> CatalogObject {
        match self {
            SecuredObject::Workspace(w) => CatalogObject::Workspace(w.into_inner()),
            SecuredObject::Namespace(n) => CatalogObject::Namespace(n.into_inner()),
            SecuredObject::Store(s) => CatalogObject::Store(s.into_inner()),
            SecuredObject::Resource(r) => CatalogObject::Resource(r.into_inner()),
            SecuredObject::Layer(l) => CatalogObject::Layer(l.into_inner()),
            SecuredObject::LayerGroup(g) => CatalogObject::LayerGroup(g.into_inner()),
        }
    }
}
