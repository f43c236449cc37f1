//! Audit trail: snapshot/diff capture, redaction, and buffered persistence

pub mod diff;
pub mod logger;
pub mod redact;

pub use diff::diff;
pub use logger::{AuditLogger, PendingEntry};
pub use redact::{REDACTED, redact};

use serde::Serialize;

use crate::models::{color, product, product_variant, reservation, size, user};

/// A model whose writes are recorded in the audit trail
pub trait Audited: Serialize {
    const ENTITY_TYPE: &'static str;

    fn audit_id(&self) -> String;
}

impl Audited for product::Model {
    const ENTITY_TYPE: &'static str = "product";

    fn audit_id(&self) -> String {
        self.id.to_string()
    }
}

impl Audited for product_variant::Model {
    const ENTITY_TYPE: &'static str = "product_variant";

    fn audit_id(&self) -> String {
        self.id.to_string()
    }
}

impl Audited for color::Model {
    const ENTITY_TYPE: &'static str = "color";

    fn audit_id(&self) -> String {
        self.id.to_string()
    }
}

impl Audited for size::Model {
    const ENTITY_TYPE: &'static str = "size";

    fn audit_id(&self) -> String {
        self.id.to_string()
    }
}

impl Audited for reservation::Model {
    const ENTITY_TYPE: &'static str = "reservation";

    fn audit_id(&self) -> String {
        self.id.to_string()
    }
}

impl Audited for user::Model {
    const ENTITY_TYPE: &'static str = "user";

    fn audit_id(&self) -> String {
        self.id.to_string()
    }
}
