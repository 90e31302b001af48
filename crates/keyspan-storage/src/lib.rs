//! [`Repository`](keyspan_core::Repository) implementations.

pub mod memory;
pub mod mysql;

pub use memory::InMemoryRepository;
pub use mysql::MySqlRepository;

/// Schema for the `links` table used by [`MySqlRepository`].
pub const MYSQL_SCHEMA: &str = include_str!("../ddl/mysql/links.sql");
