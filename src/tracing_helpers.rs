//! Span constructors for the `tracing` feature

use crate::migration::MigrationId;
use tracing::Span;

pub(crate) fn apply_migration_span(id: &MigrationId, name: &str, namespace: &str) -> Span {
    tracing::info_span!(
        "ladder.apply_migration",
        migration.id = %id,
        migration.name = name,
        migration.namespace = namespace
    )
}

pub(crate) fn rollback_migration_span(id: &MigrationId, name: &str, namespace: &str) -> Span {
    tracing::info_span!(
        "ladder.rollback_migration",
        migration.id = %id,
        migration.name = name,
        migration.namespace = namespace
    )
}

pub(crate) fn execute_statement_span(sql: &str) -> Span {
    tracing::debug_span!("ladder.execute_statement", db.statement = sql)
}
