//! redb table definitions.

use redb::TableDefinition;

/// Declared overlay bodies keyed by overlay name.
pub const CUSTOM_OVERLAYS: TableDefinition<&str, &[u8]> = TableDefinition::new("custom_overlays");
