pub mod dictionary;
pub mod executor;
pub mod graph;
pub mod node_types;
pub mod properties;
pub mod store;

pub use executor::Script;
pub use executor::context::{BindingGuard, ExecutionContext, Session};
pub use executor::error::{BuildError, ExecuteError};
pub use executor::events::{ChannelWatcher, ExecuteWatcher, ExecutionEvent, LogWatcher};
pub use executor::logiclet::{Document, Logiclet, NodeMeta, Segment};
pub use graph::{FromValue, NodeDef, Value};
pub use node_types::{NodeFactory, NodeKind};
pub use properties::Properties;
pub use store::{CacheObject, CacheStore, InMemoryStore, LoadPolicy, Loader, Store};
