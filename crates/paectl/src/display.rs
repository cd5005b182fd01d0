//! Terminal rendering for grids, progress and achievements.
//!
//! Every function returns a `String`; `color` switches ANSI styling off for
//! pipes and tests.

use owo_colors::OwoColorize;
use pae_common::achievements::AchievementCatalog;
use pae_common::grid::BandCounts;
use pae_common::{ConfidenceBand, DisplayGrid, ProgressTracker, Protein};

pub const THIN_SEP: &str = "------------------------------------------------------------";

/// Two-character cell for a band
pub fn band_cell(band: ConfidenceBand, color: bool) -> String {
    let glyph = match band {
        ConfidenceBand::High => "██",
        ConfidenceBand::Medium => "▓▓",
        ConfidenceBand::Low => "░░",
    };
    if !color {
        return glyph.to_string();
    }
    match band {
        ConfidenceBand::High => glyph.blue().to_string(),
        ConfidenceBand::Medium => glyph.cyan().to_string(),
        ConfidenceBand::Low => glyph.yellow().to_string(),
    }
}

/// Grid with row/column indices
pub fn render_grid(grid: &DisplayGrid, color: bool) -> String {
    let mut out = String::new();
    out.push_str("    ");
    for col in 0..grid.size {
        out.push_str(&format!("{:>2} ", col));
    }
    out.push('\n');

    for (i, row) in grid.rows().enumerate() {
        out.push_str(&format!("{:>2}  ", i));
        let cells: Vec<String> = row
            .iter()
            .map(|c| band_cell(c.confidence, color))
            .collect();
        out.push_str(&cells.join(" "));
        out.push('\n');
    }
    out
}

pub fn render_legend(counts: &BandCounts, color: bool) -> String {
    ConfidenceBand::ALL
        .iter()
        .map(|band| {
            format!(
                "{} {} ({}, {} cells)",
                band_cell(*band, color),
                band,
                band.range_label(),
                counts.get(*band)
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// `[#####-----]` style bar for a 0.0-1.0 fraction
pub fn progress_bar(fraction: f64, width: usize) -> String {
    let filled = ((fraction.clamp(0.0, 1.0) * width as f64).round() as usize).min(width);
    format!("[{}{}]", "#".repeat(filled), "-".repeat(width - filled))
}

pub fn render_progress(tracker: &ProgressTracker, color: bool) -> String {
    let stats = &tracker.stats;
    let level = format!("Level {}", tracker.level);
    let level = if color { level.bold().to_string() } else { level };

    let mut lines = vec![
        format!(
            "  {}  {} {}/{} XP",
            level,
            progress_bar(tracker.level_progress(), 20),
            tracker.experience,
            tracker.experience_to_next
        ),
        String::new(),
        format!("  Questions:      {}", stats.total_questions),
        format!("  Correct:        {} ({}%)", stats.correct_answers, stats.accuracy_percent()),
        format!("  Streak:         {} (best {})", stats.streak, stats.max_streak),
        format!("  Quizzes:        {}", stats.quizzes_completed),
        format!("  Proteins:       {}", stats.proteins_explored.len()),
        format!("  Achievements:   {}", tracker.unlocked_achievement_ids.len()),
    ];
    if let Some(last) = stats.last_play_date {
        lines.push(format!("  Last played:    {}", last.format("%Y-%m-%d %H:%M UTC")));
    }
    lines.join("\n")
}

pub fn render_achievements(
    catalog: &AchievementCatalog,
    tracker: &ProgressTracker,
    color: bool,
) -> String {
    catalog
        .rules()
        .iter()
        .map(|rule| {
            let unlocked = tracker.is_unlocked(&rule.id);
            let mark = match (unlocked, color) {
                (true, true) => "[x]".green().to_string(),
                (true, false) => "[x]".to_string(),
                (false, true) => "[ ]".dimmed().to_string(),
                (false, false) => "[ ]".to_string(),
            };
            format!(
                "  {} {} {:<20} {:>3} XP  {}",
                mark, rule.icon, rule.name, rule.points, rule.description
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn render_protein_summary(protein: &Protein, maps: &[String]) -> String {
    format!(
        "  {:<4} {:<28} {:<20} maps: {}",
        protein.id,
        protein.name,
        protein.species.as_deref().unwrap_or("-"),
        maps.join(", ")
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use pae_common::{project, ErrorMatrix};

    #[test]
    fn test_progress_bar() {
        assert_eq!(progress_bar(0.0, 10), "[----------]");
        assert_eq!(progress_bar(0.5, 10), "[#####-----]");
        assert_eq!(progress_bar(1.7, 4), "[####]");
    }

    #[test]
    fn test_render_grid_plain() {
        let m = ErrorMatrix::new(vec![vec![1.0, 20.0], vec![20.0, 10.0]]).unwrap();
        let grid = project(&m, 2).unwrap();
        let text = render_grid(&grid, false);
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[1], " 0  ██ ░░");
        assert_eq!(lines[2], " 1  ░░ ▓▓");
    }

    #[test]
    fn test_legend_counts() {
        let counts = BandCounts {
            high: 3,
            medium: 0,
            low: 1,
        };
        let legend = render_legend(&counts, false);
        assert!(legend.contains("high (below 5 Å, 3 cells)"));
        assert!(legend.contains("low (15 Å or more, 1 cells)"));
    }

    #[test]
    fn test_render_progress_plain() {
        let mut tracker = ProgressTracker::default();
        tracker.experience = 50;
        tracker.stats.total_questions = 4;
        tracker.stats.correct_answers = 3;
        let text = render_progress(&tracker, false);
        assert!(text.contains("Level 1  [##########----------] 50/100 XP"));
        assert!(text.contains("Correct:        3 (75%)"));
    }

    #[test]
    fn test_render_achievements_marks_unlocked() {
        let catalog = AchievementCatalog::default();
        let mut tracker = ProgressTracker::default();
        tracker.unlocked_achievement_ids.insert("first_steps".to_string());
        let text = render_achievements(&catalog, &tracker, false);
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 8);
        assert!(lines[0].starts_with("  [x]"));
        assert!(lines[1].starts_with("  [ ]"));
    }
}
