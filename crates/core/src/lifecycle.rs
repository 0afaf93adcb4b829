//! Two-state soft-delete lifecycle shared by every catalog row.

use serde::{Deserialize, Serialize};

/// Row lifecycle: active, or soft-deleted (hidden but restorable).
///
/// Soft-deletion is always reversible; nothing in this subsystem ever issues
/// a hard delete. State transitions happen only at the store boundary, which
/// keeps call sites from re-inventing delete flags.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Lifecycle {
    #[default]
    Active,
    Deleted,
}

impl Lifecycle {
    pub fn is_active(self) -> bool {
        matches!(self, Lifecycle::Active)
    }

    pub fn is_deleted(self) -> bool {
        matches!(self, Lifecycle::Deleted)
    }

    /// Transition to soft-deleted. Idempotent.
    pub fn delete(&mut self) {
        *self = Lifecycle::Deleted;
    }

    /// Clear the delete marker. Idempotent.
    pub fn restore(&mut self) {
        *self = Lifecycle::Active;
    }
}
