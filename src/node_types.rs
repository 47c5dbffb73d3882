use crate::executor::builtins::{
    CacheGet, CacheScope, LogMessage, ObjectScope, Output, SetVariable, Throw,
};
use crate::executor::cache_locate::CacheLocate;
use crate::executor::error::BuildError;
use crate::executor::logiclet::{Logiclet, NodeMeta, Segment};
use crate::graph::NodeDef;
use crate::properties::Properties;
use std::collections::HashMap;
use std::sync::Arc;
use uuid::Uuid;

/// The built-in node catalog.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum NodeKind {
    Segment,
    Cache,
    CacheLocate,
    CacheGet,
    Set,
    Output,
    Obj,
    Log,
    Throw,
}

impl NodeKind {
    pub const ALL: [NodeKind; 9] = [
        NodeKind::Segment,
        NodeKind::Cache,
        NodeKind::CacheLocate,
        NodeKind::CacheGet,
        NodeKind::Set,
        NodeKind::Output,
        NodeKind::Obj,
        NodeKind::Log,
        NodeKind::Throw,
    ];

    pub fn tag(self) -> &'static str {
        match self {
            NodeKind::Segment => "segment",
            NodeKind::Cache => "cache",
            NodeKind::CacheLocate => "cache-locate",
            NodeKind::CacheGet => "cache-get",
            NodeKind::Set => "set",
            NodeKind::Output => "output",
            NodeKind::Obj => "obj",
            NodeKind::Log => "log",
            NodeKind::Throw => "throw",
        }
    }

    pub fn from_tag(tag: &str) -> Option<NodeKind> {
        NodeKind::ALL.into_iter().find(|kind| kind.tag() == tag)
    }

    fn create(self, meta: NodeMeta) -> Box<dyn Logiclet> {
        match self {
            NodeKind::Segment => Box::new(Segment::new(meta)),
            NodeKind::Cache => Box::new(CacheScope::new(meta)),
            NodeKind::CacheLocate => Box::new(CacheLocate::new(meta)),
            NodeKind::CacheGet => Box::new(CacheGet::new(meta)),
            NodeKind::Set => Box::new(SetVariable::new(meta)),
            NodeKind::Output => Box::new(Output::new(meta)),
            NodeKind::Obj => Box::new(ObjectScope::new(meta)),
            NodeKind::Log => Box::new(LogMessage::new(meta)),
            NodeKind::Throw => Box::new(Throw::new(meta)),
        }
    }
}

/// Constructor for a custom node tag.
pub type NodeConstructor = Arc<dyn Fn(NodeMeta) -> Box<dyn Logiclet> + Send + Sync>;

/// Builds node trees from definitions.
#[derive(Clone, Default)]
pub struct NodeFactory {
    custom: HashMap<String, NodeConstructor>,
}

impl NodeFactory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a tag. Custom tags take precedence over built-in ones.
    pub fn register<F>(&mut self, tag: &str, ctor: F)
    where
        F: Fn(NodeMeta) -> Box<dyn Logiclet> + Send + Sync + 'static,
    {
        self.custom.insert(tag.to_string(), Arc::new(ctor));
    }

    pub fn build(&self, def: &NodeDef) -> Result<Box<dyn Logiclet>, BuildError> {
        self.build_node(def, None)
    }

    fn build_node(&self, def: &NodeDef, parent: Option<Uuid>) -> Result<Box<dyn Logiclet>, BuildError> {
        let meta = NodeMeta::new(def.tag.clone(), parent);
        let mut node = match self.custom.get(&def.tag) {
            Some(ctor) => (**ctor)(meta),
            None => NodeKind::from_tag(&def.tag)
                .ok_or_else(|| BuildError::UnknownTag(def.tag.clone()))?
                .create(meta),
        };

        let props = Properties::from_json_object(&def.props);
        node.configure(&props)?;

        if def.children.is_empty() {
            return Ok(node);
        }
        let id = node.meta().id();
        let Some(segment) = node.segment_mut() else {
            return Err(BuildError::UnexpectedChildren(def.tag.clone()));
        };
        for child in &def.children {
            segment.push(self.build_node(child, Some(id))?);
        }
        Ok(node)
    }
}
