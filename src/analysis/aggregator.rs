//! Score aggregation.
//!
//! Merges the findings of a run into one weighted [`ScoreReport`]. The
//! computation is a pure function of the finding list: same findings in
//! the same order, same report.

use crate::models::{Category, CategoryScore, Finding, Grade, ScoreReport};
use std::collections::BTreeMap;

/// Combine findings into a weighted score report.
///
/// Every category appears in the breakdown. A category with no finding
/// scores 0 and is flagged low confidence.
pub fn aggregate(findings: &[Finding]) -> ScoreReport {
    let mut breakdown = BTreeMap::new();

    for category in Category::ALL {
        breakdown.insert(category, score_category(category, findings));
    }

    let weighted: f64 = breakdown
        .iter()
        .map(|(category, c)| c.score * category.weight_percent() as f64)
        .sum::<f64>()
        / 100.0;
    let overall_score = weighted.round().clamp(0.0, 100.0) as u8;

    ScoreReport {
        overall_score,
        confidence: report_confidence(&breakdown),
        grade: Grade::from_score(overall_score),
        category_breakdown: breakdown,
    }
}

fn score_category(category: Category, findings: &[Finding]) -> CategoryScore {
    let contributions: Vec<(&Finding, f64, f64)> = findings
        .iter()
        .filter_map(|f| {
            f.category_scores.get(&category).map(|score| {
                (
                    f,
                    score.clamp(0.0, 100.0),
                    f.confidence.clamp(0.0, 1.0),
                )
            })
        })
        .collect();

    if contributions.is_empty() {
        return CategoryScore {
            score: 0.0,
            weight: category.weight(),
            rationale: String::new(),
            confidence: 0.0,
            contributors: 0,
            low_confidence: true,
        };
    }

    let total_confidence: f64 = contributions.iter().map(|(_, _, c)| c).sum();
    let (score, low_confidence) = if total_confidence > 0.0 {
        let weighted: f64 = contributions.iter().map(|(_, s, c)| s * c).sum();
        (weighted / total_confidence, false)
    } else {
        let sum: f64 = contributions.iter().map(|(_, s, _)| s).sum();
        (sum / contributions.len() as f64, true)
    };

    // Independent support accumulates: 1 - prod(1 - c).
    let confidence = 1.0
        - contributions
            .iter()
            .map(|(_, _, c)| 1.0 - c)
            .product::<f64>();

    let rationale = contributions
        .iter()
        .filter_map(|(f, _, _)| {
            f.rationale
                .get(&category)
                .map(|text| text.trim())
                .filter(|text| !text.is_empty())
                .map(|text| format!("{}: {}", f.agent_kind, text))
        })
        .collect::<Vec<_>>()
        .join("\n");

    CategoryScore {
        score: score.clamp(0.0, 100.0),
        weight: category.weight(),
        rationale,
        confidence,
        contributors: contributions.len(),
        low_confidence,
    }
}

/// Mean confidence of the categories that were scored, scaled by the share
/// of categories that were scored at all.
fn report_confidence(breakdown: &BTreeMap<Category, CategoryScore>) -> f64 {
    let present: Vec<f64> = breakdown
        .values()
        .filter(|c| c.contributors > 0)
        .map(|c| c.confidence)
        .collect();

    if present.is_empty() {
        return 0.0;
    }

    let mean = present.iter().sum::<f64>() / present.len() as f64;
    mean * present.len() as f64 / breakdown.len() as f64
}

/// One-line human summary of a report.
pub fn summary_text(report: &ScoreReport) -> String {
    let scored: Vec<(&Category, &CategoryScore)> = report
        .category_breakdown
        .iter()
        .filter(|(_, c)| c.contributors > 0)
        .collect();

    if scored.is_empty() {
        return "No category was scored.".to_string();
    }

    let mut summary = format!(
        "{} {}/100 ({}), confidence {:.0}%",
        report.grade.emoji(),
        report.overall_score,
        report.grade,
        report.confidence * 100.0
    );

    let strongest = scored
        .iter()
        .max_by(|a, b| a.1.score.total_cmp(&b.1.score));
    let weakest = scored
        .iter()
        .min_by(|a, b| a.1.score.total_cmp(&b.1.score));
    if let (Some((best, b)), Some((worst, w))) = (strongest, weakest) {
        summary.push_str(&format!(
            ". Strongest: {} ({:.0}). Weakest: {} ({:.0})",
            best, b.score, worst, w.score
        ));
    }

    let missing = report.low_confidence_categories();
    if !missing.is_empty() {
        let names: Vec<String> = missing.iter().map(|c| c.to_string()).collect();
        summary.push_str(&format!(". Low confidence: {}", names.join(", ")));
    }

    summary.push('.');
    summary
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::AgentKind;
    use crate::testing::finding;

    #[test]
    fn test_empty_findings() {
        let report = aggregate(&[]);

        assert_eq!(report.overall_score, 0);
        assert_eq!(report.confidence, 0.0);
        assert_eq!(report.grade, Grade::HighRisk);
        assert_eq!(report.category_breakdown.len(), 6);
        assert!(report.category_breakdown.values().all(|c| c.low_confidence));
        assert_eq!(summary_text(&report), "No category was scored.");
    }

    #[test]
    fn test_confidence_weighted_mean() {
        let findings = vec![
            finding(AgentKind::PitchDeck, &[Category::Team], 80.0, 0.75),
            finding(AgentKind::WebIntelligence, &[Category::Team], 40.0, 0.25),
        ];
        let report = aggregate(&findings);
        let team = &report.category_breakdown[&Category::Team];

        assert!((team.score - 70.0).abs() < 1e-9);
        assert_eq!(team.contributors, 2);
        assert!(!team.low_confidence);
        assert!((team.confidence - (1.0 - 0.25 * 0.75)).abs() < 1e-9);
        assert_eq!(team.weight, 0.25);
        // 70 * 0.25 = 17.5 rounds to 18
        assert_eq!(report.overall_score, 18);
    }

    #[test]
    fn test_missing_categories_scored_zero_and_flagged() {
        let findings = vec![finding(
            AgentKind::PitchDeck,
            &[Category::Team, Category::Market],
            90.0,
            0.8,
        )];
        let report = aggregate(&findings);

        for category in [Category::Product, Category::Traction, Category::Financials, Category::Moat] {
            let c = &report.category_breakdown[&category];
            assert_eq!(c.score, 0.0);
            assert!(c.low_confidence);
            assert_eq!(c.contributors, 0);
        }
        assert_eq!(report.overall_score, 45);
        // mean 0.8 over 2 present categories, scaled by 2/6
        assert!((report.confidence - 0.8 * 2.0 / 6.0).abs() < 1e-9);
        assert_eq!(
            report.low_confidence_categories(),
            vec![Category::Product, Category::Traction, Category::Financials, Category::Moat]
        );
    }

    #[test]
    fn test_zero_confidence_falls_back_to_mean() {
        let findings = vec![
            finding(AgentKind::PitchDeck, &[Category::Product], 60.0, 0.0),
            finding(AgentKind::DataRoom, &[Category::Product], 80.0, 0.0),
        ];
        let product = aggregate(&findings).category_breakdown[&Category::Product].clone();

        assert_eq!(product.score, 70.0);
        assert!(product.low_confidence);
        assert_eq!(product.confidence, 0.0);
    }

    #[test]
    fn test_overall_score_bounds() {
        for mask in 0u32..64 {
            let findings: Vec<Finding> = Category::ALL
                .iter()
                .enumerate()
                .map(|(i, category)| {
                    let score = if mask & (1 << i) != 0 { 100.0 } else { 0.0 };
                    finding(AgentKind::PitchDeck, &[*category], score, 0.9)
                })
                .collect();
            let report = aggregate(&findings);
            assert!(report.overall_score <= 100);
        }

        let all_max: Vec<Finding> = vec![finding(AgentKind::PitchDeck, &Category::ALL, 100.0, 1.0)];
        assert_eq!(aggregate(&all_max).overall_score, 100);

        let out_of_range = vec![finding(AgentKind::PitchDeck, &Category::ALL, 250.0, 3.0)];
        let report = aggregate(&out_of_range);
        assert_eq!(report.overall_score, 100);
        assert!(report.confidence <= 1.0);
    }

    #[test]
    fn test_idempotent() {
        let findings = vec![
            finding(AgentKind::PitchDeck, &[Category::Team, Category::Traction], 67.0, 0.6),
            finding(AgentKind::DataRoom, &[Category::Traction, Category::Financials], 33.3, 0.7),
            finding(AgentKind::Interaction, &[Category::Team], 51.0, 0.35),
        ];

        assert_eq!(aggregate(&findings), aggregate(&findings));
    }

    #[test]
    fn test_partial_run_has_lower_confidence() {
        let categories = [Category::Team, Category::Market, Category::Traction];
        let a = finding(AgentKind::PitchDeck, &categories, 70.0, 0.6);
        let b = Finding {
            agent_kind: AgentKind::DataRoom,
            ..a.clone()
        };
        let c = Finding {
            agent_kind: AgentKind::Interaction,
            ..a.clone()
        };

        let partial = aggregate(&[a.clone()]);
        let full = aggregate(&[a, b, c]);

        assert!(partial.confidence < full.confidence);
        assert_eq!(partial.overall_score, full.overall_score);
    }

    #[test]
    fn test_rationale_follows_finding_order() {
        let findings = vec![
            finding(AgentKind::DataRoom, &[Category::Traction], 20.0, 0.9),
            finding(AgentKind::PitchDeck, &[Category::Traction], 90.0, 0.9),
        ];
        let traction = &aggregate(&findings).category_breakdown[&Category::Traction];

        let lines: Vec<&str> = traction.rationale.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].starts_with("Data Room: "));
        assert!(lines[1].starts_with("Pitch Deck: "));
    }

    #[test]
    fn test_summary_text() {
        let findings = vec![
            finding(AgentKind::PitchDeck, &[Category::Team], 80.0, 0.9),
            finding(AgentKind::PitchDeck, &[Category::Market], 40.0, 0.9),
        ];
        let summary = summary_text(&aggregate(&findings));

        assert!(summary.contains("Strongest: Team (80)"));
        assert!(summary.contains("Weakest: Market (40)"));
        assert!(summary.contains("Low confidence: Product"));
    }
}
