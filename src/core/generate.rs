//! Synthetic todo lists for trying the app against large files.

use chrono::{DateTime, Duration, Utc};

use crate::core::todo::{TodoDocument, TodoItem};

const TITLES: &[&str] = &[
    "Buy groceries for the week",
    "Complete project documentation",
    "Review pull request #{n}",
    "Fix bug in authentication module",
    "Update dependencies to latest versions",
    "Write unit tests for {module} module",
    "Refactor legacy code in {module} package",
    "Schedule team meeting for Q{quarter} planning",
    "Optimize database query performance",
    "Deploy hotfix to production",
    "Research new framework alternatives",
    "Create user onboarding flow",
    "Implement dark mode toggle",
    "Add error logging to API endpoints",
    "Update README with installation instructions",
];

const MODULES: &[&str] = &["billing", "search", "storage", "auth", "export"];

/// Number of completed items for `count` items at `percent` completion.
pub fn completed_count(count: usize, percent: f64) -> usize {
    let percent = percent.clamp(0.0, 100.0);
    ((count as f64) * percent / 100.0).floor() as usize
}

/// `count` items with ids `1..=count`, the last [`completed_count`] of them
/// completed, item `i` created `i` minutes before `now`.
pub fn generate(count: usize, percent: f64, now: DateTime<Utc>) -> TodoDocument {
    let first_completed = count - completed_count(count, percent);
    let todos = (0..count)
        .map(|i| TodoItem {
            id: i as u64 + 1,
            title: format!("{} [Item #{}]", title_for(i), i + 1),
            completed: i >= first_completed,
            created_at: now - Duration::minutes(i as i64),
        })
        .collect();

    TodoDocument {
        todos,
        next_id: count as u64 + 1,
    }
}

fn title_for(i: usize) -> String {
    TITLES[i % TITLES.len()]
        .replace("{n}", &(i + 1).to_string())
        .replace("{module}", MODULES[i % MODULES.len()])
        .replace("{quarter}", &(i % 4 + 1).to_string())
}
