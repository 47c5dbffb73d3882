//! Built-in nodes besides `segment` and `cache-locate`.

use super::context::ExecutionContext;
use super::error::{BuildError, ExecuteError};
use super::events::ExecuteWatcher;
use super::json_helpers::value_to_json;
use super::logiclet::{Document, Logiclet, NodeMeta, Segment};
use crate::graph::Value;
use crate::properties::Properties;
use crate::store::CacheObject;
use std::str::FromStr;
use std::sync::Arc;

fn required(meta: &NodeMeta, props: &Properties, name: &str) -> Result<String, BuildError> {
    let value = props.get_string(name, "");
    if value.is_empty() {
        return Err(BuildError::MissingAttribute {
            tag: meta.tag().to_string(),
            name: name.to_string(),
        });
    }
    Ok(value)
}

/// `cache`: binds the session store `id` under `cid` for the children.
pub struct CacheScope {
    segment: Segment,
    id: String,
    cid: String,
}

impl CacheScope {
    pub fn new(meta: NodeMeta) -> Self {
        Self {
            segment: Segment::new(meta),
            id: String::new(),
            cid: "$cache".to_string(),
        }
    }
}

impl Logiclet for CacheScope {
    fn meta(&self) -> &NodeMeta {
        self.segment.meta()
    }

    fn configure(&mut self, props: &Properties) -> Result<(), BuildError> {
        self.id = required(self.segment.meta(), props, "id")?;
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
        let store = ctx
            .session()
            .store(&self.id)
            .ok_or_else(|| ExecuteError::StoreNotRegistered { id: self.id.clone() })?;

        let mut scope = ctx.bind_scoped(&self.cid, Value::Store(store));
        self.segment.execute_children(root, current, &mut scope, watcher)
    }
}

/// `cache-get`: copies one field of the bound cache object into a binding.
pub struct CacheGet {
    meta: NodeMeta,
    cid: String,
    field: String,
    id: String,
    dft: String,
}

impl CacheGet {
    pub fn new(meta: NodeMeta) -> Self {
        Self {
            meta,
            cid: "$cache-object".to_string(),
            field: String::new(),
            id: String::new(),
            dft: String::new(),
        }
    }
}

impl Logiclet for CacheGet {
    fn meta(&self) -> &NodeMeta {
        &self.meta
    }

    fn configure(&mut self, props: &Properties) -> Result<(), BuildError> {
        self.cid = props.get_string("cid", &self.cid);
        self.field = required(&self.meta, props, "field")?;
        self.id = props.get_string("id", &self.field);
        self.dft = props.get_raw("dft", "");
        Ok(())
    }

    fn execute(
        &self,
        _root: &serde_json::Value,
        _current: &mut Document,
        ctx: &mut ExecutionContext,
        _watcher: Option<&dyn ExecuteWatcher>,
    ) -> Result<(), ExecuteError> {
        let object = ctx
            .get::<Arc<CacheObject>>(&self.cid)
            .ok_or_else(|| ExecuteError::MissingBinding { name: self.cid.clone() })?;

        let value = match object.get(&self.field) {
            Some(v) => v.to_string(),
            None => ctx.transform(&self.dft),
        };
        ctx.set_binding(&self.id, value);
        Ok(())
    }
}

/// `set`: binds `id` to the interpolated `value`.
pub struct SetVariable {
    meta: NodeMeta,
    id: String,
    value: String,
}

impl SetVariable {
    pub fn new(meta: NodeMeta) -> Self {
        Self {
            meta,
            id: String::new(),
            value: String::new(),
        }
    }
}

impl Logiclet for SetVariable {
    fn meta(&self) -> &NodeMeta {
        &self.meta
    }

    fn configure(&mut self, props: &Properties) -> Result<(), BuildError> {
        self.id = required(&self.meta, props, "id")?;
        self.value = props.get_raw("value", "");
        Ok(())
    }

    fn execute(
        &self,
        _root: &serde_json::Value,
        _current: &mut Document,
        ctx: &mut ExecutionContext,
        _watcher: Option<&dyn ExecuteWatcher>,
    ) -> Result<(), ExecuteError> {
        let value = ctx.transform(&self.value);
        ctx.set_binding(&self.id, value);
        Ok(())
    }
}

/// `output`: writes into the current document.
///
/// With `ref`, the binding of that name is written as JSON; otherwise the
/// interpolated `value` is written as a string.
pub struct Output {
    meta: NodeMeta,
    id: String,
    value: String,
    reference: String,
}

impl Output {
    pub fn new(meta: NodeMeta) -> Self {
        Self {
            meta,
            id: String::new(),
            value: String::new(),
            reference: String::new(),
        }
    }
}

impl Logiclet for Output {
    fn meta(&self) -> &NodeMeta {
        &self.meta
    }

    fn configure(&mut self, props: &Properties) -> Result<(), BuildError> {
        self.id = required(&self.meta, props, "id")?;
        self.value = props.get_raw("value", "");
        self.reference = props.get_string("ref", "");
        Ok(())
    }

    fn execute(
        &self,
        _root: &serde_json::Value,
        current: &mut Document,
        ctx: &mut ExecutionContext,
        _watcher: Option<&dyn ExecuteWatcher>,
    ) -> Result<(), ExecuteError> {
        let value = if self.reference.is_empty() {
            serde_json::Value::String(ctx.transform(&self.value))
        } else {
            ctx.get_binding(&self.reference)
                .map(value_to_json)
                .unwrap_or(serde_json::Value::Null)
        };
        current.insert(self.id.clone(), value);
        Ok(())
    }
}

/// `obj`: makes child object `tag` the current position for the children.
pub struct ObjectScope {
    segment: Segment,
    tag: String,
}

impl ObjectScope {
    pub fn new(meta: NodeMeta) -> Self {
        Self {
            segment: Segment::new(meta),
            tag: String::new(),
        }
    }
}

impl Logiclet for ObjectScope {
    fn meta(&self) -> &NodeMeta {
        self.segment.meta()
    }

    fn configure(&mut self, props: &Properties) -> Result<(), BuildError> {
        self.tag = required(self.segment.meta(), props, "tag")?;
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
        let tag = ctx.transform(&self.tag);
        let child = current
            .entry(tag)
            .or_insert_with(|| serde_json::Value::Object(Document::new()));
        if !child.is_object() {
            *child = serde_json::Value::Object(Document::new());
        }
        match child {
            serde_json::Value::Object(position) => {
                self.segment.execute_children(root, position, ctx, watcher)
            }
            _ => Ok(()),
        }
    }
}

/// `log`: writes the interpolated `msg` at `level`.
pub struct LogMessage {
    meta: NodeMeta,
    msg: String,
    level: log::Level,
}

impl LogMessage {
    pub fn new(meta: NodeMeta) -> Self {
        Self {
            meta,
            msg: String::new(),
            level: log::Level::Info,
        }
    }
}

impl Logiclet for LogMessage {
    fn meta(&self) -> &NodeMeta {
        &self.meta
    }

    fn configure(&mut self, props: &Properties) -> Result<(), BuildError> {
        self.msg = props.get_raw("msg", "");
        self.level = log::Level::from_str(&props.get_string("level", "info")).unwrap_or(log::Level::Info);
        Ok(())
    }

    fn execute(
        &self,
        _root: &serde_json::Value,
        _current: &mut Document,
        ctx: &mut ExecutionContext,
        watcher: Option<&dyn ExecuteWatcher>,
    ) -> Result<(), ExecuteError> {
        let msg = ctx.transform(&self.msg);
        log::log!(self.level, "{}", msg);
        if let Some(watcher) = watcher {
            watcher.on_log(&msg);
        }
        Ok(())
    }
}

/// `throw`: fails with the configured code and interpolated message.
pub struct Throw {
    meta: NodeMeta,
    code: String,
    msg: String,
}

impl Throw {
    pub fn new(meta: NodeMeta) -> Self {
        Self {
            meta,
            code: "core.e1004".to_string(),
            msg: String::new(),
        }
    }
}

impl Logiclet for Throw {
    fn meta(&self) -> &NodeMeta {
        &self.meta
    }

    fn configure(&mut self, props: &Properties) -> Result<(), BuildError> {
        self.code = props.get_string("code", &self.code);
        self.msg = props.get_raw("msg", "");
        Ok(())
    }

    fn execute(
        &self,
        _root: &serde_json::Value,
        _current: &mut Document,
        ctx: &mut ExecutionContext,
        _watcher: Option<&dyn ExecuteWatcher>,
    ) -> Result<(), ExecuteError> {
        Err(ExecuteError::Thrown {
            code: self.code.clone(),
            message: ctx.transform(&self.msg),
        })
    }
}
