//! Node identity and attachment handles
//!
//! Containers hand a [`Parent`] handle to each child they bind. The handle
//! records what kind of container it stands for and, once the container is
//! itself bound, where the container sits. Children keep the handle, so a
//! child bound before its container can still see the container's final
//! position later.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use once_cell::sync::OnceCell;

use crate::registry::Registry;
use crate::serializers::SerializerClass;

/// Identity of a schema node
///
/// Every constructed node gets a distinct id, including copies made from
/// a declared prototype.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(u64);

impl NodeId {
    /// Allocate a fresh id
    pub fn next() -> Self {
        static COUNTER: AtomicU64 = AtomicU64::new(1);
        NodeId(COUNTER.fetch_add(1, Ordering::Relaxed))
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// What kind of container a [`Parent`] handle stands for
#[derive(Clone)]
pub enum ParentKind {
    /// A composite schema instance of the given class
    Composite(Arc<SerializerClass>),
    /// A repeating-element wrapper with a single child node
    Sequence {
        /// The wrapped child
        child: NodeId,
    },
}

/// Position of a node: its field name and the container that owns it
#[derive(Debug, Clone)]
pub struct Attachment {
    /// Name the node is bound under (empty for list children)
    pub field_name: String,
    /// The owning container
    pub parent: Parent,
}

/// Shared handle to a container in a schema tree
#[derive(Clone)]
pub struct Parent(Arc<ParentInner>);

struct ParentInner {
    node: NodeId,
    kind: ParentKind,
    attachment: OnceCell<Attachment>,
    registry: OnceCell<Arc<Registry>>,
}

impl Parent {
    /// Handle for a composite schema instance
    pub fn composite(node: NodeId, class: Arc<SerializerClass>) -> Self {
        Self::with_kind(node, ParentKind::Composite(class))
    }

    /// Handle for a repeating-element wrapper
    pub fn sequence(node: NodeId, child: NodeId) -> Self {
        Self::with_kind(node, ParentKind::Sequence { child })
    }

    fn with_kind(node: NodeId, kind: ParentKind) -> Self {
        Parent(Arc::new(ParentInner {
            node,
            kind,
            attachment: OnceCell::new(),
            registry: OnceCell::new(),
        }))
    }

    /// Id of the container this handle stands for
    pub fn node_id(&self) -> NodeId {
        self.0.node
    }

    /// Kind of container
    pub fn kind(&self) -> &ParentKind {
        &self.0.kind
    }

    /// Record the container's own position; the first call wins
    pub fn attach(&self, field_name: &str, parent: &Parent) {
        let attachment = Attachment {
            field_name: field_name.to_string(),
            parent: parent.clone(),
        };
        if self.0.attachment.set(attachment).is_err() {
            tracing::warn!(node = %self.0.node, field_name, "container is already attached");
        }
    }

    /// The container's own position, once it has been bound
    pub fn attachment(&self) -> Option<&Attachment> {
        self.0.attachment.get()
    }

    /// Make a registry available to everything below this container
    pub fn set_registry(&self, registry: Arc<Registry>) {
        if self.0.registry.set(registry).is_err() {
            tracing::warn!(node = %self.0.node, "registry is already set");
        }
    }

    /// Registry of the nearest container above (or at) this one that has one
    pub fn registry(&self) -> Option<Arc<Registry>> {
        let mut current = self.clone();
        loop {
            if let Some(registry) = current.0.registry.get() {
                return Some(registry.clone());
            }
            let up = current.attachment()?.parent.clone();
            current = up;
        }
    }

    /// Whether two handles stand for the same container
    pub fn same_node(&self, other: &Parent) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }

    /// Human readable description for error messages
    pub fn describe(&self) -> String {
        match &self.0.kind {
            ParentKind::Composite(class) => format!("composite '{}'", class.qualified_name()),
            ParentKind::Sequence { child } => {
                format!("repeating element {} (child {})", self.0.node, child)
            }
        }
    }
}

impl fmt::Debug for Parent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Parent")
            .field("node", &self.0.node)
            .field("kind", &self.describe())
            .field("attached", &self.0.attachment.get().is_some())
            .finish()
    }
}
