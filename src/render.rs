//! Terminal rendering of presenter decisions.

use feed_adapter::presenter::{self, DashboardViewConfig, RenderDecision, RenderMode};
use feed_adapter::store::SnapshotStore;

/// Format one full redraw of a screen as text, one line per metric row.
pub fn render(
    config: &DashboardViewConfig,
    decision: &RenderDecision,
    store: &SnapshotStore,
) -> String {
    let mut out = String::new();
    out.push_str(&format!("{} [{}]\n", config.name, decision.status));
    match decision.mode {
        RenderMode::Loading => out.push_str("  waiting for first snapshot...\n"),
        RenderMode::Error => out.push_str(&format!(
            "  error: {}\n",
            decision.error.as_deref().unwrap_or("unknown error")
        )),
        RenderMode::Data => {
            let width = config
                .columns
                .iter()
                .map(|column| column.title.len())
                .max()
                .unwrap_or(0);
            for row in presenter::rows(config, store) {
                out.push_str(&format!(
                    "  {:<width$}  {:>8}\n",
                    row.title,
                    row.value,
                    width = width
                ));
            }
        }
    }
    out
}
