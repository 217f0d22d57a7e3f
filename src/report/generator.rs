//! Markdown and JSON report generation.
//!
//! Renders a stored [`AnalysisRecord`] for people (Markdown) or tools
//! (JSON).

use crate::analysis::summary_text;
use crate::models::{
    AgentFailure, AnalysisRecord, Category, DiligenceQuestion, DocumentSummary, ExtractionStatus,
    Finding, QuestionPriority, ScoreReport,
};
use anyhow::{Context, Result};
use std::path::Path;

/// Generate a complete Markdown report.
pub fn generate_markdown_report(record: &AnalysisRecord) -> String {
    let mut output = String::new();

    output.push_str(&format!("# Investment Analysis: {}\n\n", record.company_name));
    output.push_str(&generate_metadata_section(record));
    output.push_str(&generate_score_section(&record.score_report));
    output.push_str(&generate_breakdown_section(&record.score_report));
    output.push_str(&generate_failures_section(&record.failures));
    output.push_str(&generate_questions_section(&record.questions));
    output.push_str(&generate_insights_section(&record.findings));
    output.push_str(&generate_documents_section(&record.documents));
    output.push_str(&generate_footer());

    output
}

fn generate_metadata_section(record: &AnalysisRecord) -> String {
    let mut section = String::new();

    section.push_str("## Metadata\n\n");
    section.push_str(&format!("- **Analysis ID:** `{}`\n", record.analysis_id));
    section.push_str(&format!(
        "- **Analysis Date:** {}\n",
        record.created_at.format("%Y-%m-%d %H:%M:%S UTC")
    ));
    section.push_str(&format!("- **Mode:** {}\n", record.mode));
    section.push_str(&format!("- **Documents:** {}\n", record.documents.len()));

    let agents: Vec<String> = record
        .findings
        .iter()
        .map(|f| f.agent_kind.to_string())
        .collect();
    if !agents.is_empty() {
        section.push_str(&format!("- **Agents:** {}\n", agents.join(", ")));
    }
    section.push('\n');

    section
}

fn generate_score_section(report: &ScoreReport) -> String {
    let mut section = String::new();

    section.push_str("## Investment Score\n\n");

    if report.category_breakdown.values().all(|c| c.contributors == 0) {
        section.push_str("Not scored: no agent in this run reports category scores.\n\n");
        return section;
    }

    section.push_str(&format!(
        "**{} {}/100 ({})**\n\n",
        report.grade.emoji(),
        report.overall_score,
        report.grade
    ));
    section.push_str(&format!("{}\n\n", summary_text(report)));

    section.push_str("| Category | Weight | Score | Confidence | Agents |\n");
    section.push_str("|:---|:---:|:---:|:---:|:---:|\n");
    for (category, score) in &report.category_breakdown {
        let flag = if score.low_confidence { " ⚠️" } else { "" };
        section.push_str(&format!(
            "| {}{} | {}% | {:.1} | {:.0}% | {} |\n",
            category,
            flag,
            category.weight_percent(),
            score.score,
            score.confidence * 100.0,
            score.contributors
        ));
    }
    section.push_str(&format!(
        "\n*Overall confidence: {:.0}%*\n\n",
        report.confidence * 100.0
    ));

    section
}

fn generate_breakdown_section(report: &ScoreReport) -> String {
    let explained: Vec<(&Category, &String)> = report
        .category_breakdown
        .iter()
        .filter(|(_, c)| !c.rationale.is_empty())
        .map(|(category, c)| (category, &c.rationale))
        .collect();

    if explained.is_empty() {
        return String::new();
    }

    let mut section = String::new();
    section.push_str("## Category Breakdown\n\n");

    for (category, rationale) in explained {
        section.push_str(&format!("### {}\n\n", category));
        for line in rationale.lines() {
            section.push_str(&format!("- {}\n", line));
        }
        section.push('\n');
    }

    section
}

fn generate_failures_section(failures: &[AgentFailure]) -> String {
    if failures.is_empty() {
        return String::new();
    }

    let mut section = String::new();
    section.push_str("## Failed Agents\n\n");
    section.push_str("These agents did not contribute; the score is based on the rest.\n\n");
    section.push_str("| Agent | Failure | Attempts | Details |\n");
    section.push_str("|:---|:---|:---:|:---|\n");

    for failure in failures {
        section.push_str(&format!(
            "| {} | {} | {} | {} |\n",
            failure.agent_kind,
            failure.kind,
            failure.attempts,
            failure.message.replace('|', "\\|")
        ));
    }
    section.push('\n');

    section
}

fn generate_questions_section(questions: &[DiligenceQuestion]) -> String {
    if questions.is_empty() {
        return String::new();
    }

    let mut section = String::new();
    section.push_str("## Founder Questions\n\n");

    let mut current: Option<QuestionPriority> = None;
    let mut number = 0;
    for question in questions {
        if current != Some(question.priority) {
            current = Some(question.priority);
            section.push_str(&format!("### {}\n\n", question.priority));
        }
        number += 1;

        section.push_str(&format!("{}. **{}**\n", number, question.question));
        if let Some(category) = question.category {
            section.push_str(&format!("   - *Category:* {}\n", category));
        }
        if !question.validates.is_empty() {
            section.push_str(&format!("   - *Validates:* {}\n", question.validates));
        }
        if let Some(ref red_flags) = question.red_flags {
            section.push_str(&format!("   - *Red flags:* {}\n", red_flags));
        }
    }
    section.push('\n');

    section
}

fn generate_insights_section(findings: &[Finding]) -> String {
    let with_insights: Vec<&Finding> = findings
        .iter()
        .filter(|f| !f.raw_insights.is_empty())
        .collect();

    if with_insights.is_empty() {
        return String::new();
    }

    let mut section = String::new();
    section.push_str("## Agent Insights\n\n");

    for finding in with_insights {
        section.push_str(&format!(
            "### {} (confidence {:.0}%)\n\n",
            finding.agent_kind,
            finding.confidence * 100.0
        ));
        for insight in &finding.raw_insights {
            section.push_str(&format!("- {}\n", insight));
        }
        section.push('\n');
    }

    section
}

fn generate_documents_section(documents: &[DocumentSummary]) -> String {
    if documents.is_empty() {
        return String::new();
    }

    let mut section = String::new();
    section.push_str("## Documents\n\n");
    section.push_str("| File | Role | Status | Characters |\n");
    section.push_str("|:---|:---|:---|:---:|\n");

    for doc in documents {
        let status = match doc.extraction_status {
            ExtractionStatus::Extracted => "✅ extracted".to_string(),
            ExtractionStatus::Empty => "⚪ empty".to_string(),
            ExtractionStatus::Failed(ref reason) => format!("❌ {}", reason.replace('|', "\\|")),
        };
        section.push_str(&format!(
            "| `{}` | {:?} | {} | {} |\n",
            doc.filename, doc.role, status, doc.chars
        ));
    }
    section.push('\n');

    section
}

fn generate_footer() -> String {
    format!(
        "---\n\n*Report generated by PitchLens v{}. Scores are a weighted aggregate of model \
         output and are not investment advice.*\n",
        env!("CARGO_PKG_VERSION")
    )
}

/// Generate a JSON report.
pub fn generate_json_report(record: &AnalysisRecord) -> Result<String> {
    serde_json::to_string_pretty(record).map_err(Into::into)
}

/// Write rendered report content, creating parent directories.
pub fn write_report(content: &str, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }
    std::fs::write(path, content)
        .with_context(|| format!("Failed to write report to {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{AgentKind, AnalysisMode, FailureKind};
    use crate::testing::sample_record;
    use tempfile::TempDir;

    #[test]
    fn test_generate_markdown_report() {
        let mut record = sample_record("Acme Robotics", 72.0);
        record.findings[0].raw_insights = vec!["Strong repeat founders".to_string()];
        record.failures.push(AgentFailure {
            agent_kind: AgentKind::DataRoom,
            kind: FailureKind::Timeout,
            message: "timed out after 300s".to_string(),
            attempts: 3,
        });

        let markdown = generate_markdown_report(&record);

        assert!(markdown.starts_with("# Investment Analysis: Acme Robotics"));
        assert!(markdown.contains("## Investment Score"));
        assert!(markdown.contains("72/100 (Moderate Potential)"));
        assert!(markdown.contains("| Team | 25% | 72.0 | 70% | 1 |"));
        assert!(markdown.contains("## Category Breakdown"));
        assert!(markdown.contains("- Pitch Deck: Pitch Deck view of Team"));
        assert!(markdown.contains("## Failed Agents"));
        assert!(markdown.contains("| Data Room | timeout | 3 |"));
        assert!(markdown.contains("Strong repeat founders"));
        assert!(markdown.contains("`pitch_deck.md`"));
        assert!(!markdown.contains("## Founder Questions"));
    }

    #[test]
    fn test_questions_grouped_by_priority() {
        let mut record = sample_record("Acme", 50.0);
        record.questions = vec![
            DiligenceQuestion {
                priority: QuestionPriority::MustAsk,
                category: Some(Category::Traction),
                question: "How is ARR defined?".to_string(),
                validates: "Revenue claims".to_string(),
                red_flags: Some("Bookings counted as ARR".to_string()),
                source: Some(AgentKind::Question),
            },
            DiligenceQuestion {
                priority: QuestionPriority::Risk,
                category: None,
                question: "What if the lead investor pulls out?".to_string(),
                validates: String::new(),
                red_flags: None,
                source: None,
            },
        ];

        let markdown = generate_markdown_report(&record);

        assert!(markdown.contains("### Must Ask\n\n1. **How is ARR defined?**"));
        assert!(markdown.contains("   - *Red flags:* Bookings counted as ARR"));
        assert!(markdown.contains("### Risk & Mitigation\n\n2. **What if the lead investor pulls out?**"));
    }

    #[test]
    fn test_questions_mode_is_not_scored() {
        let mut record = sample_record("Acme", 50.0);
        record.mode = AnalysisMode::Questions;
        record.findings.clear();
        record.score_report = crate::analysis::aggregate(&[]);

        let markdown = generate_markdown_report(&record);
        assert!(markdown.contains("Not scored"));
        assert!(!markdown.contains("0/100"));
    }

    #[test]
    fn test_json_report_round_trips() {
        let record = sample_record("Acme", 64.0);
        let json = generate_json_report(&record).unwrap();
        let parsed: AnalysisRecord = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, record);
    }

    #[test]
    fn test_write_report_creates_parents() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("reports/acme.md");

        write_report("# Report\n", &path).unwrap();
        assert_eq!(std::fs::read_to_string(path).unwrap(), "# Report\n");
    }
}
