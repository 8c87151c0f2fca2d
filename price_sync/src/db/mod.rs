//! Database access for the `airdrops` record store.
//!
//! This module provides:
//! - Connection helpers: [`connection::connect`] dispatches on the URL
//!   (`postgres://` / `postgresql://` open PostgreSQL, anything else is a SQLite
//!   path), and [`connection::connect_sqlite`] applies WAL, foreign_keys=ON, and
//!   a 5000ms busy_timeout.
//! - The [`store::RecordStore`] seam with implementations for both backends.
//!
//! The schema is owned elsewhere; nothing here creates or migrates tables.
//!
//! Example:
//! ```no_run
//! use price_sync::db::connection;
//!
//! let path = std::env::temp_dir().join("price_sync_example.db");
//! let mut store = connection::connect(path.to_str().unwrap()).expect("connect");
//! let records = store.load_candidates(Some(10)).expect("load");
//! println!("{} candidates", records.len());
//! ```
//!
//! Note: Building with PostgreSQL support requires the system libpq (e.g., libpq-dev on Debian/Ubuntu).

pub mod connection;
pub mod store;
