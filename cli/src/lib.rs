//! Terminal shell for the ArogyaAI core: resolves its effects with reqwest,
//! a JSON file store and a path-based image picker.

pub mod config;
pub mod http;
pub mod picker;
pub mod present;
pub mod shell;
pub mod store;

pub use crate::http::{HttpExecutor, ReqwestExecutor};
pub use crate::picker::{MediaPicker, PathPicker};
pub use crate::shell::{Shell, ShellError};
pub use crate::store::{FileKvStore, KeyValueStore, StoreError};
