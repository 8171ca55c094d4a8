//! SmartMark local database layer.
//!
//! Holds the encrypted auth session between runs. Bookmarks themselves
//! live only on the remote backend.
//!
//! # Usage
//!
//! ```no_run
//! use smartmark::database::Database;
//!
//! // Open a persistent database
//! let db = Database::open("smartmark.db").expect("failed to open database");
//!
//! // Or use an in-memory database for testing
//! let db = Database::open_in_memory().expect("failed to open in-memory database");
//!
//! // Access the underlying connection for queries
//! let conn = db.connection();
//! ```

pub mod connection;
pub mod migrations;

pub use connection::Database;
