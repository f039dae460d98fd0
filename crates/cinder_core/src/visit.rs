//! Double dispatch over scene node types.
//!
//! A traversal operation owns a [`Dispatcher`] that maps the `TypeId` of a
//! concrete node type to a handler. Nodes hand themselves to the operation as
//! `&dyn Any` and the handler registered for their runtime type runs. Node
//! types never learn about the operations that walk them, and a new node type
//! only needs a new registration.

use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

type Handler<V> = Arc<dyn Fn(&mut V, &dyn Any) + Send + Sync>;

/// Handler table of a visitor `V`, keyed by node type.
pub struct Dispatcher<V> {
    handlers: HashMap<TypeId, Handler<V>>,
}

impl<V: 'static> Dispatcher<V> {
    pub fn new() -> Self {
        Self {
            handlers: HashMap::new(),
        }
    }

    /// Register `handler` for nodes of concrete type `T`.
    ///
    /// Registering the same type twice replaces the earlier handler.
    pub fn register<T: Any>(&mut self, handler: fn(&mut V, &T)) -> &mut Self {
        let erased: Handler<V> = Arc::new(move |visitor: &mut V, node: &dyn Any| {
            if let Some(node) = node.downcast_ref::<T>() {
                handler(visitor, node);
            }
        });
        self.handlers.insert(TypeId::of::<T>(), erased);
        self
    }

    /// Whether a handler exists for type `T`.
    pub fn handles<T: Any>(&self) -> bool {
        self.handlers.contains_key(&TypeId::of::<T>())
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }

    fn handler_for(&self, type_id: TypeId) -> Option<Handler<V>> {
        self.handlers.get(&type_id).cloned()
    }
}

impl<V: 'static> Default for Dispatcher<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V> fmt::Debug for Dispatcher<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Dispatcher")
            .field("handlers", &self.handlers.len())
            .finish()
    }
}

/// A traversal operation over heterogeneous scene nodes.
pub trait Visitor: Sized + 'static {
    fn dispatcher(&self) -> &Dispatcher<Self>;

    /// Run the handler registered for the runtime type of `node`.
    ///
    /// Returns `false` when no handler matches; unregistered types are
    /// simply not visited.
    fn visit(&mut self, node: &dyn Any) -> bool {
        // The handler is cloned out so it can borrow `self` mutably.
        let Some(handler) = self.dispatcher().handler_for(node.type_id()) else {
            return false;
        };
        handler(self, node);
        true
    }
}
