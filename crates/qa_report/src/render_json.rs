//! Report JSON renderer (header → workers → backlog → balance → unassignable → notes).
//!
//! Field order follows the model's declaration order; `serde_json` keeps struct
//! field order when serializing directly, so no `preserve_order` is needed.

use crate::{ReportError, ReportModel};

/// Pretty JSON for humans and downstream tooling.
pub fn render_report_json(m: &ReportModel) -> Result<String, ReportError> {
    serde_json::to_string_pretty(m).map_err(|e| ReportError::Render(e.to_string()))
}
