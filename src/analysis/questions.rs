//! Founder question compilation.

use crate::models::{Category, DiligenceQuestion, Finding, QuestionPriority, ScoreReport};
use std::collections::HashSet;

/// Question asked when nothing reliable was found for a category.
fn gap_question(category: Category) -> (&'static str, &'static str, &'static str) {
    match category {
        Category::Team => (
            "Who are the founders and key hires, and what in their background prepares them to win this market?",
            "Team capability and founder-market fit",
            "Missing technical co-founder, part-time founders, unexplained gaps",
        ),
        Category::Market => (
            "How large is the market you can realistically serve, and how did you size it?",
            "Market size and sizing method",
            "Top-down TAM only, no bottom-up customer math",
        ),
        Category::Product => (
            "What does the product do today, and what is still on the roadmap?",
            "Product maturity and differentiation",
            "Demo-only product, roadmap presented as shipped",
        ),
        Category::Traction => (
            "What are your current revenue, customer count and month-over-month growth, and how are they measured?",
            "Traction claims and their definitions",
            "Pilots counted as customers, GMV presented as revenue",
        ),
        Category::Financials => (
            "What is your monthly burn, your runway, and how will this round be spent?",
            "Capital efficiency and use of funds",
            "Runway under 12 months, no hiring plan",
        ),
        Category::Moat => (
            "What stops a well-funded competitor from copying your product within a year?",
            "Defensibility",
            "Moat described only as first-mover advantage",
        ),
    }
}

fn normalize(question: &str) -> String {
    question
        .to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Merge agent questions with gap questions for low confidence categories.
///
/// Agent questions keep their finding order within a priority band; gap
/// questions follow them. Categories weighted 20% or more get Must Ask gap
/// questions, the rest Risk & Mitigation.
pub fn compile_questions(findings: &[Finding], report: &ScoreReport) -> Vec<DiligenceQuestion> {
    let mut questions: Vec<DiligenceQuestion> = findings
        .iter()
        .flat_map(|f| {
            f.questions.iter().cloned().map(move |mut q| {
                q.source.get_or_insert(f.agent_kind);
                q
            })
        })
        .collect();

    for category in report.low_confidence_categories() {
        let (question, validates, red_flags) = gap_question(category);
        let priority = if category.weight_percent() >= 20 {
            QuestionPriority::MustAsk
        } else {
            QuestionPriority::Risk
        };
        questions.push(DiligenceQuestion {
            priority,
            category: Some(category),
            question: question.to_string(),
            validates: validates.to_string(),
            red_flags: Some(red_flags.to_string()),
            source: None,
        });
    }

    let mut seen = HashSet::new();
    questions.retain(|q| {
        let key = normalize(&q.question);
        !key.is_empty() && seen.insert(key)
    });

    questions.sort_by_key(|q| q.priority);
    questions
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::aggregate;
    use crate::models::AgentKind;
    use crate::testing::finding;

    fn question(priority: QuestionPriority, text: &str) -> DiligenceQuestion {
        DiligenceQuestion {
            priority,
            category: None,
            question: text.to_string(),
            validates: "claims".to_string(),
            red_flags: None,
            source: None,
        }
    }

    #[test]
    fn test_gap_questions_for_missing_categories() {
        let findings = vec![finding(
            AgentKind::PitchDeck,
            &[Category::Team, Category::Market, Category::Product, Category::Traction],
            70.0,
            0.8,
        )];
        let report = aggregate(&findings);
        let questions = compile_questions(&findings, &report);

        assert_eq!(questions.len(), 2);
        assert!(questions.iter().all(|q| q.priority == QuestionPriority::Risk));
        assert_eq!(questions[0].category, Some(Category::Financials));
        assert_eq!(questions[1].category, Some(Category::Moat));
        assert!(questions.iter().all(|q| q.source.is_none()));
    }

    #[test]
    fn test_heavy_categories_are_must_ask() {
        let report = aggregate(&[]);
        let questions = compile_questions(&[], &report);

        assert_eq!(questions.len(), 6);
        let must_ask: Vec<Option<Category>> = questions
            .iter()
            .filter(|q| q.priority == QuestionPriority::MustAsk)
            .map(|q| q.category)
            .collect();
        assert_eq!(
            must_ask,
            vec![
                Some(Category::Team),
                Some(Category::Market),
                Some(Category::Product),
                Some(Category::Traction)
            ]
        );
    }

    #[test]
    fn test_dedup_and_stable_priority_sort() {
        let mut asker = finding(AgentKind::Question, &[], 0.0, 0.5);
        asker.questions = vec![
            question(QuestionPriority::FollowUp, "When can we see the data room?"),
            question(QuestionPriority::MustAsk, "Who is your largest customer?"),
            question(QuestionPriority::Risk, "What if the key supplier fails?"),
            question(QuestionPriority::MustAsk, "who is your LARGEST customer"),
            question(QuestionPriority::MustAsk, "How do you price?"),
        ];
        let findings = vec![
            finding(AgentKind::PitchDeck, &Category::ALL, 70.0, 0.8),
            asker,
        ];
        let report = aggregate(&findings);
        let questions = compile_questions(&findings, &report);

        let texts: Vec<&str> = questions.iter().map(|q| q.question.as_str()).collect();
        assert_eq!(
            texts,
            vec![
                "Who is your largest customer?",
                "How do you price?",
                "What if the key supplier fails?",
                "When can we see the data room?",
            ]
        );
        assert!(questions
            .iter()
            .all(|q| q.source == Some(AgentKind::Question)));
    }
}
