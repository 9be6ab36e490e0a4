//! Callback-based asynchronous dispatch of named, parameterized SQL
//! statements.
//!
//! A single controller registers statement templates, submits work through
//! the four `execute_*` call shapes, and periodically drains completed
//! results; a bounded, lazily grown pool of worker threads executes each
//! request on its own backend connection and answers through shared queues.
//! Each request's callback fires exactly once, on the draining context, in
//! completion order.
//!
//! ```rust
//! use std::collections::HashMap;
//! use std::thread;
//! use std::time::Duration;
//!
//! use sql_dispatch::prelude::*;
//!
//! fn main() -> Result<(), DispatchError> {
//!     let mut connector = Connector::sqlite(":memory:", 1)?;
//!     connector.load_queries([
//!         StatementTemplate::new(
//!             "create_users",
//!             "CREATE TABLE users (id INTEGER PRIMARY KEY, name TEXT)",
//!             Vec::<String>::new(),
//!         ),
//!         StatementTemplate::new(
//!             "insert_user",
//!             "INSERT INTO users (name) VALUES (:name)",
//!             ["name"],
//!         ),
//!     ])?;
//!
//!     connector.execute_generic("create_users", &HashMap::new(), || {}, None)?;
//!
//!     let mut args = NamedArgs::new();
//!     args.insert("name".to_string(), SqlValue::Text("Alice".to_string()));
//!     connector.execute_insert(
//!         "insert_user",
//!         &args,
//!         |id, rows| assert_eq!((id, rows), (1, 1)),
//!         None,
//!     )?;
//!
//!     // An external driver normally calls check_results on a timer.
//!     while connector.in_flight() > 0 {
//!         connector.check_results()?;
//!         thread::sleep(Duration::from_millis(10));
//!     }
//!     connector.close()
//! }
//! ```

pub mod connector;
pub mod driver;
pub mod error;
pub mod pool;
pub mod prelude;
pub mod queue;
pub mod results;
pub mod statements;
#[cfg(feature = "sqlite")]
pub mod sqlite;
pub mod types;

pub use connector::Connector;
pub use error::DispatchError;
pub use statements::{PlaceholderStyle, StatementTemplate};
pub use types::{NamedArgs, ResultPayload, SqlValue};
