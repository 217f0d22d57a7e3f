//! Prompt construction shared by the agents.

use super::RunContext;
use crate::models::{Category, Document};
use crate::provider::{Prompt, SchemaHint};

/// Render documents as `=== File: name ===` blocks, each truncated to `max_chars`.
pub fn document_blocks(documents: &[&Document], max_chars: usize) -> String {
    let mut out = String::new();

    for doc in documents {
        out.push_str(&format!("=== File: {} ===\n", doc.filename));
        let total = doc.extracted_text.chars().count();
        if total > max_chars {
            out.extend(doc.extracted_text.chars().take(max_chars));
            out.push_str(&format!("\n[... truncated, {} of {} chars shown]\n\n", max_chars, total));
        } else {
            out.push_str(&doc.extracted_text);
            out.push_str("\n\n");
        }
    }

    out
}

fn company_header(context: &RunContext) -> String {
    let profile = &context.profile;
    let mut header = format!("Company: {}\n", profile.display_name());
    if let Some(ref industry) = profile.industry {
        header.push_str(&format!("Industry: {}\n", industry));
    }
    if let Some(ref stage) = profile.stage {
        header.push_str(&format!("Stage: {}\n", stage));
    }
    header
}

fn claims_section(context: &RunContext) -> String {
    if context.claims.is_empty() {
        return String::new();
    }
    let mut out = String::from("\nQuantitative claims found in the materials:\n");
    for claim in &context.claims {
        out.push_str(&format!("- {}\n", claim));
    }
    out
}

/// Prompt asking for scores on `focus` categories.
///
/// `extra` is appended after the documents (used for web search results).
pub fn scoring_prompt(
    system: &str,
    focus: &[Category],
    documents: &[&Document],
    context: &RunContext,
    max_document_chars: usize,
    extra: Option<&str>,
) -> Prompt {
    let keys: Vec<&str> = focus.iter().map(|c| c.key()).collect();

    let mut user = company_header(context);
    user.push_str(&format!(
        "\nScore these categories from 0 to 100: {}.\n",
        keys.join(", ")
    ));
    user.push_str("Give a short rationale per category grounded in the materials, ");
    user.push_str("list key insights, and a confidence between 0 and 1 reflecting how much evidence you had.\n");
    user.push_str(&claims_section(context));

    user.push_str("\n=== DOCUMENTS ===\n\n");
    user.push_str(&document_blocks(documents, max_document_chars));
    user.push_str("=== END OF DOCUMENTS ===\n");

    if let Some(extra) = extra {
        user.push('\n');
        user.push_str(extra);
    }

    user.push_str("\nRespond with a single JSON object shaped like:\n");
    user.push_str(SchemaHint::Scores.example());

    Prompt {
        system: system.to_string(),
        user,
    }
}

/// Prompt asking for founder interview questions.
pub fn questions_prompt(
    system: &str,
    documents: &[&Document],
    context: &RunContext,
    max_document_chars: usize,
) -> Prompt {
    let mut user = company_header(context);
    user.push_str(
        "\nPrepare due-diligence questions for the founders. Prioritize each one as \
         must_ask, domain_deep_dive, alignment, risk or follow_up, tag it with the \
         category it probes (team, market, product, traction, financials, moat), say \
         what the answer validates and which answers would be red flags. Also list \
         information gaps in the materials.\n",
    );
    user.push_str(&claims_section(context));

    user.push_str("\n=== DOCUMENTS ===\n\n");
    user.push_str(&document_blocks(documents, max_document_chars));
    user.push_str("=== END OF DOCUMENTS ===\n");

    user.push_str("\nRespond with a single JSON object shaped like:\n");
    user.push_str(SchemaHint::Questions.example());

    Prompt {
        system: system.to_string(),
        user,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::company::CompanyProfile;

    fn context() -> RunContext {
        RunContext {
            run_id: uuid::Uuid::nil(),
            profile: CompanyProfile {
                name: Some("Acme".to_string()),
                industry: Some("saas".to_string()),
                stage: None,
            },
            claims: vec!["$2M ARR".to_string()],
        }
    }

    #[test]
    fn test_document_blocks_truncate() {
        let doc = Document::from_text("deck.md", "abcdefghij");
        let blocks = document_blocks(&[&doc], 4);
        assert!(blocks.starts_with("=== File: deck.md ===\nabcd\n"));
        assert!(blocks.contains("4 of 10 chars shown"));
    }

    #[test]
    fn test_scoring_prompt_contents() {
        let doc = Document::from_text("deck.md", "Acme builds robots");
        let prompt = scoring_prompt(
            "system",
            &[Category::Traction, Category::Moat],
            &[&doc],
            &context(),
            1000,
            Some("=== WEB SEARCH RESULTS ==="),
        );

        assert_eq!(prompt.system, "system");
        assert!(prompt.user.contains("Company: Acme\nIndustry: saas\n"));
        assert!(prompt.user.contains("0 to 100: traction, moat."));
        assert!(prompt.user.contains("- $2M ARR"));
        assert!(prompt.user.contains("Acme builds robots"));
        assert!(prompt.user.contains("=== WEB SEARCH RESULTS ==="));
        assert!(!prompt.user.contains("Stage:"));
    }
}
