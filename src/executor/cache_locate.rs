//! Locate a cached object and bind it for the children.

use super::context::ExecutionContext;
use super::error::{BuildError, ExecuteError};
use super::events::ExecuteWatcher;
use super::logiclet::{Document, Logiclet, NodeMeta, Segment};
use crate::graph::Value;
use crate::properties::Properties;

/// `cache-locate`
///
/// Looks up `id` (after interpolation) in the store bound under `pid` and
/// binds the object under `cid` while the children run. An empty id skips
/// the node.
pub struct CacheLocate {
    segment: Segment,
    id: String,
    pid: String,
    cid: String,
}

impl CacheLocate {
    pub fn new(meta: NodeMeta) -> Self {
        Self {
            segment: Segment::new(meta),
            id: "id".to_string(),
            pid: "$cache".to_string(),
            cid: "$cache-object".to_string(),
        }
    }
}

impl Logiclet for CacheLocate {
    fn meta(&self) -> &NodeMeta {
        self.segment.meta()
    }

    fn configure(&mut self, props: &Properties) -> Result<(), BuildError> {
        self.id = props.get_raw("id", &self.id);
        self.pid = props.get_string("pid", &self.pid);
        self.cid = props.get_string("cid", &self.cid);
        Ok(())
    }

    fn segment_mut(&mut self) -> Option<&mut Segment> {
        Some(&mut self.segment)
    }

    fn execute(
        &self,
        root: &serde_json::Value,
        current: &mut Document,
        ctx: &mut ExecutionContext,
        watcher: Option<&dyn ExecuteWatcher>,
    ) -> Result<(), ExecuteError> {
        let cache = ctx.store(&self.pid)?;

        let key = ctx.transform(&self.id);
        if key.is_empty() {
            log::trace!("cache-locate: empty id from {:?}, skipping", self.id);
            return Ok(());
        }

        let found = cache
            .load(&key, true)
            .ok_or(ExecuteError::ObjectNotFound { key })?;

        let mut scope = ctx.bind_scoped(&self.cid, Value::Object(found));
        self.segment.execute_children(root, current, &mut scope, watcher)
    }
}
