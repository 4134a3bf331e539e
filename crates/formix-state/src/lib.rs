//! Path-addressed access to nested JSON form documents.
//!
//! `formix-state` is the document layer of formix: it parses field path
//! expressions and reads/writes values in a `serde_json::Value` tree.
//!
//! # Core Concepts
//!
//! - **Path**: a sequence of key and index segments, parsed from
//!   `"a.b[0].c"` or `"a.b.0.c"`
//! - **get_at_path**: bounds-checked read; every miss is `None`
//! - **set_at_path**: write that creates the containers it needs
//! - **DocCell**: a shared document with read-after-write consistency
//!
//! # Quick Start
//!
//! ```
//! use formix_state::{get_at_path, parse_path, set_at_path};
//! use serde_json::json;
//!
//! let mut doc = json!({"a": 1, "b": [10, 20]});
//!
//! set_at_path(&mut doc, &parse_path("b[2]"), json!(30));
//! set_at_path(&mut doc, &parse_path("c.d"), json!(true));
//!
//! assert_eq!(doc, json!({"a": 1, "b": [10, 20, 30], "c": {"d": true}}));
//! assert_eq!(get_at_path(&doc, &parse_path("b.1")), Some(&json!(20)));
//! assert_eq!(get_at_path(&doc, &parse_path("b.x")), None);
//! ```

mod access;
mod doc_cell;
mod error;
mod path;

pub use access::{
    append_at_path, delete_at_path, get_at_path, get_at_path_mut, remove_index_at_path,
    set_at_path,
};
pub use doc_cell::DocCell;
pub use error::{value_type_name, StateError, StateResult};
pub use path::{parse_path, Path, Seg};

// Re-export serde_json::Value for convenience
pub use serde_json::Value;
