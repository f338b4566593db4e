//! Plain-text summary for the console.
//!
//! Section order: header → per-worker lines → backlog → balance → unassignable → notes.
//! Worker and backlog lines keep the familiar `- Name: n products (Limit: cap)` shape.

use std::fmt::Write as _;

use crate::ReportModel;

pub fn render_report_text(m: &ReportModel) -> String {
    let mut out = String::with_capacity(512);

    let _ = writeln!(out, "{}", m.header.title);
    let _ = writeln!(
        out,
        "Items: {} | Active workers: {} | Input: {}{}",
        m.header.total_items,
        m.header.active_workers,
        m.header.input_digest,
        if m.header.backlog_mode { " | backlog mode" } else { "" }
    );
    out.push('\n');

    for w in &m.workers {
        let _ = writeln!(
            out,
            "- {}: {} products (Limit: {}) target {} variance {} [{}]",
            w.name, w.assigned, w.limit, w.target, w.variance, w.utilization
        );
    }
    let _ = writeln!(out, "- Backlog: {} products ({})", m.backlog.count, m.backlog.share);
    out.push('\n');

    let b = &m.balance;
    let _ = writeln!(
        out,
        "Spread: {} (max {}, min {}); blocks whole {}, split {}",
        b.spread, b.max_assigned, b.min_assigned, b.whole_blocks, b.split_blocks
    );

    if !m.unassignable.is_empty() {
        let _ = writeln!(out, "\nUnassignable ({}):", m.unassignable.len());
        for u in &m.unassignable {
            let _ = writeln!(out, "- record #{} {}: {}", u.position, u.id.as_deref().unwrap_or("-"), u.reason);
        }
    }

    if !m.notes.is_empty() {
        let _ = writeln!(out, "\nNotes:");
        for n in &m.notes {
            let _ = writeln!(out, "- {n}");
        }
    }
    out
}
