//! Script execution.
//!
//! A [`Script`] is a node tree built once from a [`NodeDef`]. Each call to
//! [`Script::execute`] runs the tree depth-first against its own
//! [`ExecutionContext`]; independent invocations may run in parallel.

pub mod builtins;
pub mod cache_locate;
pub mod context;
pub mod error;
pub mod events;
pub mod json_helpers;
pub mod logiclet;
pub mod type_conversions;

use crate::graph::NodeDef;
use crate::node_types::NodeFactory;
use context::{ExecutionContext, Session};
use error::{BuildError, ExecuteError};
use events::ExecuteWatcher;
use logiclet::{Document, Logiclet, dispatch};
use rayon::prelude::*;
use std::path::Path;
use std::sync::Arc;

pub struct Script {
    root: Box<dyn Logiclet>,
}

impl Script {
    pub fn build(def: &NodeDef, factory: &NodeFactory) -> Result<Self, BuildError> {
        Ok(Self {
            root: factory.build(def)?,
        })
    }

    pub fn from_json_str(text: &str) -> Result<Self, BuildError> {
        let def: NodeDef = serde_json::from_str(text)?;
        Self::build(&def, &NodeFactory::new())
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, BuildError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }

    /// Run the tree once. Returns the output document on success.
    pub fn execute(
        &self,
        root: &serde_json::Value,
        ctx: &mut ExecutionContext,
        watcher: Option<&dyn ExecuteWatcher>,
    ) -> Result<Document, ExecuteError> {
        let mut output = Document::new();
        let result = dispatch(self.root.as_ref(), root, &mut output, ctx, watcher);
        if let Some(watcher) = watcher {
            watcher.on_complete(result.as_ref().map(|_| ()));
        }
        result.map(|()| output)
    }

    /// Run the tree once per input, in parallel, each invocation with its
    /// own context. The object entries of every input are bound as
    /// parameters. Results keep the input order.
    pub fn execute_batch(
        &self,
        session: &Arc<Session>,
        inputs: &[serde_json::Value],
        watcher: Option<&dyn ExecuteWatcher>,
    ) -> Vec<Result<Document, ExecuteError>> {
        inputs
            .par_iter()
            .map(|input| {
                let mut ctx = match input.as_object() {
                    Some(params) => ExecutionContext::with_params(session.clone(), params),
                    None => ExecutionContext::new(session.clone()),
                };
                self.execute(input, &mut ctx, watcher)
            })
            .collect()
    }
}
