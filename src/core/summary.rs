//! Summary projector - condensed view of a builder state for list displays.

use crate::core::{factory::CUSTOM_PRESET, schema::BuilderState};
use chrono::{DateTime, Utc};
use serde::Serialize;

/// Lightweight, derived view of a builder state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BuilderSummary {
    /// Blueprint id or `"custom"`
    pub preset_id: String,
    /// Color theme key, absent when there is no builder
    #[serde(skip_serializing_if = "Option::is_none")]
    pub accent: Option<String>,
    /// Number of sections
    pub sections: usize,
    /// Last save time
    pub last_edited_at: Option<DateTime<Utc>>,
    /// Percentage of completed stages, rounded half up, in `0..=100`
    pub progress: u8,
}

/// Summarizes a builder state; a missing state summarizes as an empty custom form.
#[must_use]
pub fn summarize(state: Option<&BuilderState>) -> BuilderSummary {
    let Some(state) = state else {
        return BuilderSummary {
            preset_id: CUSTOM_PRESET.to_string(),
            accent: None,
            sections: 0,
            last_edited_at: None,
            progress: 0,
        };
    };

    let total = state.stage_progress.len();
    let completed = state.stage_progress.iter().filter(|s| s.complete).count();

    BuilderSummary {
        preset_id: state.preset_id.clone(),
        accent: Some(state.accent.clone()),
        sections: state.sections.len(),
        last_edited_at: Some(state.updated_at),
        progress: progress_percent(completed, total),
    }
}

/// `round(100 * completed / total)` in integer arithmetic; zero stages give 0.
fn progress_percent(completed: usize, total: usize) -> u8 {
    if total == 0 {
        return 0;
    }
    let completed = completed.min(total);
    u8::try_from((completed * 200 + total) / (total * 2)).unwrap_or(100)
}
