//! Plain catalog object model consumed by the access decision engine.
//!
//! These are the narrow read interfaces of the catalog: names plus owning
//! workspace references. Rules apply at workspace granularity and propagate
//! down to stores, resources and layers.

use dashmap::DashMap;

/// A workspace, the primary access-control granule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Workspace {
    name: String,
}

impl Workspace {
    /// Create a workspace.
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }

    /// The workspace name.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub(crate) fn set_name(&mut self, name: String) {
        self.name = name;
    }
}

/// A namespace; its visibility derives from the workspace sharing its name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Namespace {
    name: String,
    uri: String,
}

impl Namespace {
    /// Create a namespace with the given prefix and URI.
    pub fn new(name: impl Into<String>, uri: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            uri: uri.into(),
        }
    }

    /// The namespace prefix, matching the owning workspace's name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The namespace URI.
    pub fn uri(&self) -> &str {
        &self.uri
    }

    pub(crate) fn set_name(&mut self, name: String) {
        self.name = name;
    }
}

/// What kind of data a store serves.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreKind {
    /// Vector data; writable through the catalog.
    Vector,
    /// Coverage (raster) data; read-only in nature.
    Coverage,
}

impl StoreKind {
    /// Coverage stores cannot be written through the catalog anyway, so a
    /// read-only wrap adds nothing for them.
    pub fn is_inherently_read_only(self) -> bool {
        matches!(self, StoreKind::Coverage)
    }
}

/// A data store inside a workspace.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataStore {
    name: String,
    workspace: String,
    kind: StoreKind,
}

impl DataStore {
    /// Create a store owned by the given workspace.
    pub fn new(name: impl Into<String>, workspace: impl Into<String>, kind: StoreKind) -> Self {
        Self {
            name: name.into(),
            workspace: workspace.into(),
            kind,
        }
    }

    /// The store name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The owning workspace name.
    pub fn workspace(&self) -> &str {
        &self.workspace
    }

    /// The store kind.
    pub fn kind(&self) -> StoreKind {
        self.kind
    }

    pub(crate) fn set_name(&mut self, name: String) {
        self.name = name;
    }
}

/// A resource (feature type or coverage) published from a store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resource {
    name: String,
    store: DataStore,
}

impl Resource {
    /// Create a resource published from the given store.
    pub fn new(name: impl Into<String>, store: DataStore) -> Self {
        Self {
            name: name.into(),
            store,
        }
    }

    /// The resource name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The publishing store.
    pub fn store(&self) -> &DataStore {
        &self.store
    }

    /// The owning workspace name, through the store.
    pub fn workspace(&self) -> &str {
        self.store.workspace()
    }

    pub(crate) fn set_name(&mut self, name: String) {
        self.name = name;
    }
}

/// A published layer backed by a resource.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Layer {
    name: String,
    resource: Resource,
}

impl Layer {
    /// Create a layer over the given resource.
    pub fn new(name: impl Into<String>, resource: Resource) -> Self {
        Self {
            name: name.into(),
            resource,
        }
    }

    /// The layer name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The backing resource.
    pub fn resource(&self) -> &Resource {
        &self.resource
    }

    /// The owning workspace name, through the resource.
    pub fn workspace(&self) -> &str {
        self.resource.workspace()
    }

    pub(crate) fn set_name(&mut self, name: String) {
        self.name = name;
    }
}

/// A named group of layers, optionally scoped to a workspace.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LayerGroup {
    name: String,
    workspace: Option<String>,
    layers: Vec<Layer>,
}

impl LayerGroup {
    /// Create a layer group; `workspace` is `None` for a global group.
    pub fn new(name: impl Into<String>, workspace: Option<String>, layers: Vec<Layer>) -> Self {
        Self {
            name: name.into(),
            workspace,
            layers,
        }
    }

    /// The group name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The owning workspace, if the group is workspace-scoped.
    pub fn workspace(&self) -> Option<&str> {
        self.workspace.as_deref()
    }

    /// The member layers, in publication order.
    pub fn layers(&self) -> &[Layer] {
        &self.layers
    }

    pub(crate) fn set_name(&mut self, name: String) {
        self.name = name;
    }
}

/// Any catalog object the engine can be asked about.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CatalogObject {
    Workspace(Workspace),
    Namespace(Namespace),
    Store(DataStore),
    Resource(Resource),
    Layer(Layer),
    LayerGroup(LayerGroup),
}

impl CatalogObject {
    /// The object's own name.
    pub fn name(&self) -> &str {
        match self {
            CatalogObject::Workspace(w) => w.name(),
            CatalogObject::Namespace(n) => n.name(),
            CatalogObject::Store(s) => s.name(),
            CatalogObject::Resource(r) => r.name(),
            CatalogObject::Layer(l) => l.name(),
            CatalogObject::LayerGroup(g) => g.name(),
        }
    }

    /// The workspace name access rules are evaluated against, if any.
    ///
    /// Workspaces and namespaces answer with their own name; a global layer
    /// group has none.
    pub fn workspace_name(&self) -> Option<&str> {
        match self {
            CatalogObject::Workspace(w) => Some(w.name()),
            CatalogObject::Namespace(n) => Some(n.name()),
            CatalogObject::Store(s) => Some(s.workspace()),
            CatalogObject::Resource(r) => Some(r.workspace()),
            CatalogObject::Layer(l) => Some(l.workspace()),
            CatalogObject::LayerGroup(g) => g.workspace(),
        }
    }
}

/// Resolver for workspaces by name, supplied by the catalog.
pub trait WorkspaceLookup: Send + Sync {
    /// Resolve a workspace by name.
    fn workspace(&self, name: &str) -> Option<Workspace>;
}

/// A fixed, concurrently readable workspace registry.
#[derive(Debug, Default)]
pub struct StaticWorkspaces {
    workspaces: DashMap<String, Workspace>,
}

impl StaticWorkspaces {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a workspace.
    pub fn add(&self, workspace: Workspace) {
        self.workspaces
            .insert(workspace.name().to_string(), workspace);
    }
}

impl WorkspaceLookup for StaticWorkspaces {
    fn workspace(&self, name: &str) -> Option<Workspace> {
        self.workspaces.get(name).map(|w| w.clone())
    }
}
