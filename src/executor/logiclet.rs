//! The executable node abstraction and composite dispatch.

use super::context::ExecutionContext;
use super::error::{BuildError, ExecuteError};
use super::events::ExecuteWatcher;
use crate::properties::Properties;
use std::time::Instant;
use uuid::Uuid;

/// The output document position a node writes into.
pub type Document = serde_json::Map<String, serde_json::Value>;

/// Identity of a node in a built script.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NodeMeta {
    id: Uuid,
    tag: String,
    parent: Option<Uuid>,
}

impl NodeMeta {
    pub fn new(tag: impl Into<String>, parent: Option<Uuid>) -> Self {
        Self {
            id: Uuid::new_v4(),
            tag: tag.into(),
            parent,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn tag(&self) -> &str {
        &self.tag
    }

    /// The enclosing node, if any. Only an id: parents own children, never
    /// the reverse.
    pub fn parent(&self) -> Option<Uuid> {
        self.parent
    }
}

/// One executable step of a script.
///
/// `configure` runs once while the script is built; afterwards a node is
/// read-only and may be executed any number of times, from several threads,
/// each with its own context.
pub trait Logiclet: Send + Sync {
    fn meta(&self) -> &NodeMeta;

    fn configure(&mut self, _props: &Properties) -> Result<(), BuildError> {
        Ok(())
    }

    /// The child list, for nodes that take children.
    fn segment_mut(&mut self) -> Option<&mut Segment> {
        None
    }

    fn execute(
        &self,
        root: &serde_json::Value,
        current: &mut Document,
        ctx: &mut ExecutionContext,
        watcher: Option<&dyn ExecuteWatcher>,
    ) -> Result<(), ExecuteError>;
}

/// Execute one node, notifying the watcher before and after.
pub fn dispatch(
    node: &dyn Logiclet,
    root: &serde_json::Value,
    current: &mut Document,
    ctx: &mut ExecutionContext,
    watcher: Option<&dyn ExecuteWatcher>,
) -> Result<(), ExecuteError> {
    let Some(watcher) = watcher else {
        return node.execute(root, current, ctx, None);
    };

    watcher.on_start(node.meta());
    let started = Instant::now();
    let result = node.execute(root, current, ctx, Some(watcher));
    watcher.on_finish(node.meta(), result.as_ref().map(|_| ()), started.elapsed());
    result
}

/// An ordered list of children, executed in declaration order.
///
/// Used directly as the `segment` node and embedded by every node that runs
/// children.
pub struct Segment {
    meta: NodeMeta,
    children: Vec<Box<dyn Logiclet>>,
}

impl Segment {
    pub fn new(meta: NodeMeta) -> Self {
        Self {
            meta,
            children: Vec::new(),
        }
    }

    pub fn push(&mut self, child: Box<dyn Logiclet>) {
        self.children.push(child);
    }

    pub fn children(&self) -> &[Box<dyn Logiclet>] {
        &self.children
    }

    /// Run every child, stopping at the first failure.
    pub fn execute_children(
        &self,
        root: &serde_json::Value,
        current: &mut Document,
        ctx: &mut ExecutionContext,
        watcher: Option<&dyn ExecuteWatcher>,
    ) -> Result<(), ExecuteError> {
        for child in &self.children {
            dispatch(child.as_ref(), root, current, ctx, watcher)?;
        }
        Ok(())
    }
}

impl Logiclet for Segment {
    fn meta(&self) -> &NodeMeta {
        &self.meta
    }

    fn segment_mut(&mut self) -> Option<&mut Segment> {
        Some(self)
    }

    fn execute(
        &self,
        root: &serde_json::Value,
        current: &mut Document,
        ctx: &mut ExecutionContext,
        watcher: Option<&dyn ExecuteWatcher>,
    ) -> Result<(), ExecuteError> {
        self.execute_children(root, current, ctx, watcher)
    }
}
