//! Text rendering for CLI output

use std::fmt::Write;

use colored::{ColoredString, Colorize};

use crate::coordination::SystemStatus;
use crate::domain::{
    CrossPillarMessage, CycleStatus, FeedbackCycle, Impact, PillarStatus, RepositoryActivity, SystemActivity,
};
use crate::feedback::AggregateMetrics;
use crate::health::HealthReport;

fn pillar_status(status: PillarStatus) -> ColoredString {
    match status {
        PillarStatus::Online => status.to_string().green(),
        PillarStatus::Degraded => status.to_string().yellow(),
        PillarStatus::Offline => status.to_string().red(),
    }
}

fn cycle_status(status: CycleStatus) -> ColoredString {
    match status {
        CycleStatus::Active => status.to_string().cyan(),
        CycleStatus::Completed => status.to_string().green(),
        CycleStatus::Failed => status.to_string().red(),
    }
}

fn impact(impact: Impact) -> ColoredString {
    match impact {
        Impact::High => impact.to_string().bold(),
        Impact::Medium => impact.to_string().normal(),
        Impact::Low => impact.to_string().dimmed(),
    }
}

fn health_score(score: u8) -> ColoredString {
    let text = format!("{}%", score);
    match score {
        80..=100 => text.green(),
        40..=79 => text.yellow(),
        _ => text.red(),
    }
}

pub fn render_status(status: &SystemStatus, metrics: &AggregateMetrics, current: Option<&FeedbackCycle>) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{}", "Pillars".bold());
    for (name, state) in &status.pillar_statuses {
        let _ = writeln!(out, "  {:<12} {}", name, pillar_status(*state));
    }
    let _ = writeln!(out, "  Health score: {}", health_score(status.health_score));
    let _ = writeln!(out, "  Discussions: {}", status.active_discussion_count);
    let _ = writeln!(out, "  Activities: {}", status.activity_count);

    let _ = writeln!(out);
    let _ = writeln!(out, "{}", "Feedback".bold());
    let running = if metrics.running { "running".green() } else { "stopped".red() };
    let _ = writeln!(out, "  Scheduler: {}", running);
    let _ = writeln!(out, "  Cycles: {}", metrics.total_cycles);
    let _ = writeln!(out, "  Repositories created: {}", metrics.total_repositories_created);
    let _ = writeln!(out, "  Commits: {}", metrics.total_commits);
    let _ = writeln!(out, "  Average score: {:.1}", metrics.average_feedback_score);
    match current {
        Some(cycle) => {
            let _ = writeln!(out, "  Active cycle: #{}", cycle.sequence_number);
        }
        None => {
            let _ = writeln!(out, "  Active cycle: none");
        }
    }
    out
}

pub fn render_cycles(cycles: &[FeedbackCycle]) -> String {
    if cycles.is_empty() {
        return "No feedback cycles yet\n".to_string();
    }
    let mut out = String::new();
    for cycle in cycles {
        let _ = writeln!(
            out,
            "#{:<4} {:<10} score {:>3}  repos {}  commits {}  detected {}  services {}  {}ms",
            cycle.sequence_number,
            cycle_status(cycle.status),
            cycle.feedback_score,
            cycle.repositories_created.len(),
            cycle.commits_generated,
            cycle.opportunities_detected,
            cycle.services_created,
            cycle.duration_ms(),
        );
        if let Some(error) = &cycle.error {
            let _ = writeln!(out, "      {}", error.red());
        }
    }
    out
}

pub fn render_repository_activity(entries: &[RepositoryActivity]) -> String {
    if entries.is_empty() {
        return "No repository activity yet\n".to_string();
    }
    let mut out = String::new();
    for entry in entries {
        let _ = writeln!(
            out,
            "{} {:<28} {:<14} {} files, {} lines",
            entry.recorded_at.format("%H:%M:%S").to_string().dimmed(),
            entry.repo_name.cyan(),
            entry.commit_identifier,
            entry.files_added.len(),
            entry.line_count,
        );
    }
    out
}

pub fn render_discussions(messages: &[CrossPillarMessage]) -> String {
    if messages.is_empty() {
        return "No discussions yet\n".to_string();
    }
    let mut out = String::new();
    for message in messages {
        let _ = writeln!(
            out,
            "{} {} -> {}  {}",
            message.created_at.format("%H:%M:%S").to_string().dimmed(),
            message.source_pillar.cyan(),
            message.target_pillar.cyan(),
            message.payload,
        );
    }
    out
}

pub fn render_activities(activities: &[SystemActivity]) -> String {
    if activities.is_empty() {
        return "No activities yet\n".to_string();
    }
    let mut out = String::new();
    for activity in activities {
        let _ = writeln!(
            out,
            "{} {:<12} [{}] {}",
            activity.recorded_at.format("%H:%M:%S").to_string().dimmed(),
            activity.pillar.cyan(),
            impact(activity.impact),
            activity.description,
        );
    }
    out
}

pub fn render_health(reports: &[HealthReport]) -> String {
    let mut out = String::new();
    for report in reports {
        let _ = writeln!(
            out,
            "{:<12} {:<10} {}",
            report.pillar,
            pillar_status(report.status),
            report.detail.dimmed()
        );
    }
    let online = reports.iter().filter(|r| r.status.is_online()).count();
    let score = crate::coordination::health_score(online, reports.len());
    let _ = writeln!(out, "Health score: {}", health_score(score));
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Pillar;

    fn plain() {
        colored::control::set_override(false);
    }

    #[test]
    fn test_render_status() {
        plain();
        let mut hub = Pillar::new("hub", "http://localhost:5000", "/api/health");
        hub.status = PillarStatus::Online;
        let dao = Pillar::new("dao", "http://localhost:5002", "/api/health");
        let status = SystemStatus::from_pillars(&[hub, dao], 2, 5);

        let text = render_status(&status, &AggregateMetrics::default(), None);
        assert!(text.contains("hub"));
        assert!(text.contains("online"));
        assert!(text.contains("offline"));
        assert!(text.contains("Health score: 50%"));
        assert!(text.contains("Active cycle: none"));
    }

    #[test]
    fn test_render_cycles() {
        plain();
        assert_eq!(render_cycles(&[]), "No feedback cycles yet\n");

        let mut failed = FeedbackCycle::start(2);
        failed.fail("opportunity listing failed".to_string());
        let text = render_cycles(&[failed]);
        assert!(text.contains("#2"));
        assert!(text.contains("failed"));
        assert!(text.contains("opportunity listing failed"));
    }

    #[test]
    fn test_render_health() {
        plain();
        let reports = vec![HealthReport {
            pillar: "hub".to_string(),
            previous: PillarStatus::Offline,
            status: PillarStatus::Degraded,
            detail: "HTTP 500".to_string(),
        }];
        let text = render_health(&reports);
        assert!(text.contains("degraded"));
        assert!(text.contains("HTTP 500"));
        assert!(text.contains("Health score: 0%"));
    }

    #[test]
    fn test_render_activities() {
        plain();
        let text = render_activities(&[SystemActivity::new("dao", "Proposal queue reviewed", Impact::High)]);
        assert!(text.contains("dao"));
        assert!(text.contains("[high]"));
    }
}
