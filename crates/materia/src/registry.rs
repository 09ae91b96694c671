//! # Component Registry
//!
//! Maps the stable type name written in a document (`"SpriteRenderer"`) to a
//! factory that builds the component from its `properties` object. The
//! loader resolves every component record through a registry, so a name
//! that is not registered is skipped instead of guessed at.
//!
//! ```ignore
//! let mut registry = ComponentRegistry::with_builtins();
//! registry.register("Sprite", Arc::new(|props| {
//!     serde_json::from_value::<SpriteRenderer>(props.clone()).map(Ley::from)
//! }));
//! ```
//!
//! Registering a name again replaces the previous factory. Late-bound
//! registration goes through the process-wide [`global`] registry.

use std::collections::HashMap;
use std::sync::{Arc, LazyLock, RwLock};

use serde_json::Value;

use crate::leyes::*;

/// Builds a component from its document `properties`.
pub type LeyFactory = Arc<dyn Fn(&Value) -> Result<Ley, serde_json::Error> + Send + Sync>;

#[derive(Clone, Default)]
pub struct ComponentRegistry {
    factories: HashMap<String, LeyFactory>,
}

impl ComponentRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry with every built-in component type, plus the names older
    /// documents used for a few of them.
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        registry.register_type::<Transform>();
        registry.register_type::<UITransform>();
        registry.register_type::<Camera>();
        registry.register_type::<SpriteRenderer>();
        registry.register_type::<Tilemap>();
        registry.register_type::<TilemapRenderer>();
        registry.register_type::<TilemapCollider2D>();
        registry.register_type::<Animator>();
        registry.register_type::<AnimatorController>();
        registry.register_type::<Rigidbody2D>();
        registry.register_type::<BoxCollider2D>();
        registry.register_type::<CapsuleCollider2D>();
        registry.register_type::<Canvas>();
        registry.register_type::<UIImage>();
        registry.register_type::<UIText>();
        registry.register_type::<Button>();
        registry.register_type::<PointLight2D>();
        registry.register_type::<SpotLight2D>();
        registry.register_type::<FreeformLight2D>();
        registry.register_type::<SpriteLight2D>();
        registry.register_type::<CreativeScript>();
        registry.register_type::<CustomComponent>();

        registry.register_type_as::<Rigidbody2D>("Rigidbody");
        registry.register_type_as::<BoxCollider2D>("BoxCollider");
        registry.register_type_as::<Canvas>("UICanvas");
        registry
    }

    /// Associate `name` with `factory`. Replaces any existing registration.
    pub fn register(&mut self, name: impl Into<String>, factory: LeyFactory) {
        let name = name.into();
        if self.factories.insert(name.clone(), factory).is_some() {
            log::debug!("Component type '{name}' re-registered");
        }
    }

    /// Register `T` under its own type name.
    pub fn register_type<T: LeyVariant>(&mut self) {
        self.register_type_as::<T>(T::TYPE);
    }

    /// Register `T` under another name, e.g. a legacy one.
    pub fn register_type_as<T: LeyVariant>(&mut self, name: &str) {
        self.register(
            name,
            Arc::new(|props: &Value| serde_json::from_value::<T>(props.clone()).map(T::into_ley)),
        );
    }

    pub fn resolve(&self, name: &str) -> Option<&LeyFactory> {
        self.factories.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.factories.contains_key(name)
    }

    /// Build a component. `None` if `name` is not registered.
    pub fn create(&self, name: &str, properties: &Value) -> Option<Result<Ley, serde_json::Error>> {
        let factory = self.resolve(name)?;
        Some(factory(properties))
    }

    /// All registered names, sorted.
    pub fn component_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.factories.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Properties of a default-constructed component, for "add component"
    /// tools.
    pub fn default_properties(&self, name: &str) -> Option<Value> {
        let empty = Value::Object(serde_json::Map::new());
        let ley = self.create(name, &empty)?.ok()?;
        ley.properties().ok()
    }
}

impl std::fmt::Debug for ComponentRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ComponentRegistry")
            .field("types", &self.component_names())
            .finish()
    }
}

static GLOBAL: LazyLock<RwLock<ComponentRegistry>> =
    LazyLock::new(|| RwLock::new(ComponentRegistry::with_builtins()));

/// The process-wide registry, initialised with the built-ins.
///
/// ```ignore
/// registry::global().write().unwrap().register("Legacy", factory);
/// let snapshot = registry::global().read().unwrap().clone();
/// ```
pub fn global() -> &'static RwLock<ComponentRegistry> {
    &GLOBAL
}
