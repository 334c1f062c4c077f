//! Database migrations - embedded SQL files
//!
//! Migrations are compiled into the binary at build time using include_str!.
//! Each migration is a tuple of (name, sql_content), applied in order and
//! recorded in `sys_migrations`. The bootstrap migration `000_migrations.sql`
//! is shared by both databases.
//!
//! IMPORTANT: When adding a new migration:
//! 1. Create the SQL file: NNN_description.sql
//! 2. Add an entry to the right list, in order

/// Bootstrap migration creating `sys_migrations`
pub const BOOTSTRAP: &str = "000_migrations.sql";

/// Document database (`prorab.duckdb`)
pub const MIGRATIONS: &[(&str, &str)] = &[
    (BOOTSTRAP, include_str!("000_migrations.sql")),
    ("001_documents.sql", include_str!("001_documents.sql")),
];

/// Event log database (`logs.duckdb`)
pub const LOG_MIGRATIONS: &[(&str, &str)] = &[
    (BOOTSTRAP, include_str!("000_migrations.sql")),
    ("001_sys_logs.sql", include_str!("logs/001_sys_logs.sql")),
];
