//! Data models for the investment analysis engine.
//!
//! This module contains the core data structures shared by the agents,
//! the orchestrator, the aggregator and the analysis store.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use uuid::Uuid;

/// Scoring category from the fixed weighting table.
///
/// Declaration order is the order categories appear in reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Team,
    Market,
    Product,
    Traction,
    Financials,
    Moat,
}

impl Category {
    /// Every category, in table order.
    pub const ALL: [Category; 6] = [
        Category::Team,
        Category::Market,
        Category::Product,
        Category::Traction,
        Category::Financials,
        Category::Moat,
    ];

    /// Weight in whole percent. The table sums to exactly 100.
    pub fn weight_percent(&self) -> u32 {
        match self {
            Category::Team => 25,
            Category::Market => 25,
            Category::Product => 20,
            Category::Traction => 20,
            Category::Financials => 5,
            Category::Moat => 5,
        }
    }

    /// Weight as a fraction of 1.0.
    pub fn weight(&self) -> f64 {
        f64::from(self.weight_percent()) / 100.0
    }

    /// Lowercase key used in prompts and model output.
    pub fn key(&self) -> &'static str {
        match self {
            Category::Team => "team",
            Category::Market => "market",
            Category::Product => "product",
            Category::Traction => "traction",
            Category::Financials => "financials",
            Category::Moat => "moat",
        }
    }

    /// Parse a category name as a model is likely to write it.
    pub fn parse(s: &str) -> Option<Category> {
        match s.trim().to_lowercase().as_str() {
            "team" | "founders" | "founder" => Some(Category::Team),
            "market" => Some(Category::Market),
            "product" | "technology" => Some(Category::Product),
            "traction" | "growth" => Some(Category::Traction),
            "financials" | "financial" | "finance" => Some(Category::Financials),
            "moat" | "defensibility" => Some(Category::Moat),
            _ => None,
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Category::Team => write!(f, "Team"),
            Category::Market => write!(f, "Market"),
            Category::Product => write!(f, "Product"),
            Category::Traction => write!(f, "Traction"),
            Category::Financials => write!(f, "Financials"),
            Category::Moat => write!(f, "Moat"),
        }
    }
}

/// The kinds of analysis agents.
///
/// Declaration order is the canonical submission order for a full run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AgentKind {
    PitchDeck,
    DataRoom,
    WebIntelligence,
    Interaction,
    Question,
}

impl AgentKind {
    pub const ALL: [AgentKind; 5] = [
        AgentKind::PitchDeck,
        AgentKind::DataRoom,
        AgentKind::WebIntelligence,
        AgentKind::Interaction,
        AgentKind::Question,
    ];

    /// Whether documents with this role are routed to the agent.
    pub fn accepts(&self, role: DocumentRole) -> bool {
        match self {
            AgentKind::PitchDeck => matches!(role, DocumentRole::PitchDeck | DocumentRole::General),
            AgentKind::DataRoom => role == DocumentRole::DataRoom,
            AgentKind::Interaction => role == DocumentRole::Interaction,
            AgentKind::WebIntelligence | AgentKind::Question => true,
        }
    }

    /// Categories the agent is asked to score.
    pub fn focus(&self) -> &'static [Category] {
        match self {
            AgentKind::PitchDeck => &Category::ALL,
            AgentKind::DataRoom => &[Category::Traction, Category::Financials, Category::Market],
            AgentKind::Interaction => &[Category::Team, Category::Product, Category::Traction],
            AgentKind::WebIntelligence => &[
                Category::Market,
                Category::Moat,
                Category::Traction,
                Category::Team,
            ],
            AgentKind::Question => &[],
        }
    }
}

impl fmt::Display for AgentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AgentKind::PitchDeck => write!(f, "Pitch Deck"),
            AgentKind::DataRoom => write!(f, "Data Room"),
            AgentKind::WebIntelligence => write!(f, "Web Intelligence"),
            AgentKind::Interaction => write!(f, "Interaction"),
            AgentKind::Question => write!(f, "Question"),
        }
    }
}

/// Analysis mode chosen by the caller; selects the agent set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnalysisMode {
    #[default]
    Full,
    Summary,
    Scoring,
    Questions,
}

impl AnalysisMode {
    /// Agents to run, in submission order.
    pub fn agent_kinds(&self) -> Vec<AgentKind> {
        match self {
            AnalysisMode::Full => AgentKind::ALL.to_vec(),
            AnalysisMode::Summary => vec![AgentKind::PitchDeck],
            AnalysisMode::Scoring => vec![AgentKind::PitchDeck, AgentKind::DataRoom],
            AnalysisMode::Questions => vec![AgentKind::Question],
        }
    }
}

impl fmt::Display for AnalysisMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AnalysisMode::Full => write!(f, "Full"),
            AnalysisMode::Summary => write!(f, "Summary"),
            AnalysisMode::Scoring => write!(f, "Scoring"),
            AnalysisMode::Questions => write!(f, "Questions"),
        }
    }
}

/// What kind of material a document is, derived from its filename.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentRole {
    PitchDeck,
    DataRoom,
    WebContent,
    Interaction,
    General,
}

impl DocumentRole {
    /// Categorize a file by keywords in its name, then by extension.
    pub fn from_filename(filename: &str) -> Self {
        let name = filename.to_lowercase();
        let has_any = |keywords: &[&str]| keywords.iter().any(|k| name.contains(k));

        if has_any(&["pitch", "deck", "presentation", "slides"]) {
            DocumentRole::PitchDeck
        } else if has_any(&[
            "financial",
            "traction",
            "metrics",
            "kpi",
            "revenue",
            "onepager",
            "one-pager",
        ]) {
            DocumentRole::DataRoom
        } else if has_any(&["website", "landing", "blog", "faq", "web", "content"]) {
            DocumentRole::WebContent
        } else if has_any(&[
            "call",
            "recording",
            "transcript",
            "interview",
            "questionnaire",
            "feedback",
        ]) {
            DocumentRole::Interaction
        } else if has_any(&[".pdf", ".pptx", ".key"]) && ends_with_any(&name, &["pdf", "pptx", "key"]) {
            DocumentRole::PitchDeck
        } else if ends_with_any(&name, &["xlsx", "xls", "csv"]) {
            DocumentRole::DataRoom
        } else if ends_with_any(&name, &["txt", "md", "json"]) {
            DocumentRole::WebContent
        } else {
            DocumentRole::General
        }
    }
}

fn ends_with_any(name: &str, extensions: &[&str]) -> bool {
    extensions
        .iter()
        .any(|ext| name.ends_with(&format!(".{}", ext)))
}

/// Format of an uploaded file, as far as extraction cares.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MimeKind {
    Pdf,
    Pptx,
    Xlsx,
    Csv,
    Json,
    Markdown,
    Text,
    Other,
}

impl MimeKind {
    pub fn from_filename(filename: &str) -> Self {
        let ext = filename
            .rsplit_once('.')
            .map(|(_, ext)| ext.to_lowercase())
            .unwrap_or_default();

        match ext.as_str() {
            "pdf" => MimeKind::Pdf,
            "pptx" | "ppt" | "key" => MimeKind::Pptx,
            "xlsx" | "xls" => MimeKind::Xlsx,
            "csv" => MimeKind::Csv,
            "json" => MimeKind::Json,
            "md" | "markdown" => MimeKind::Markdown,
            "txt" | "text" | "vtt" | "srt" => MimeKind::Text,
            _ => MimeKind::Other,
        }
    }
}

/// Outcome of extracting text from a document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", content = "reason", rename_all = "snake_case")]
pub enum ExtractionStatus {
    Extracted,
    Empty,
    Failed(String),
}

/// An uploaded document with its extracted text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub id: String,
    pub filename: String,
    pub mime_kind: MimeKind,
    pub role: DocumentRole,
    pub extracted_text: String,
    pub extraction_status: ExtractionStatus,
}

impl Document {
    /// Build a document from already-extracted text.
    pub fn from_text(filename: impl Into<String>, text: impl Into<String>) -> Self {
        let filename = filename.into();
        let text = text.into();
        let status = if text.trim().is_empty() {
            ExtractionStatus::Empty
        } else {
            ExtractionStatus::Extracted
        };

        Self {
            id: Uuid::new_v4().to_string(),
            mime_kind: MimeKind::from_filename(&filename),
            role: DocumentRole::from_filename(&filename),
            filename,
            extracted_text: text,
            extraction_status: status,
        }
    }

    /// Build a document whose extraction failed.
    pub fn failed(filename: impl Into<String>, reason: impl Into<String>) -> Self {
        let filename = filename.into();
        Self {
            id: Uuid::new_v4().to_string(),
            mime_kind: MimeKind::from_filename(&filename),
            role: DocumentRole::from_filename(&filename),
            filename,
            extracted_text: String::new(),
            extraction_status: ExtractionStatus::Failed(reason.into()),
        }
    }

    /// Whether the document has text an agent can work with.
    pub fn is_usable(&self) -> bool {
        self.extraction_status == ExtractionStatus::Extracted && !self.extracted_text.trim().is_empty()
    }
}

/// Lifecycle state of an agent task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    Pending,
    Running,
    Succeeded,
    Failed,
    TimedOut,
}

impl TaskStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            TaskStatus::Succeeded | TaskStatus::Failed | TaskStatus::TimedOut
        )
    }
}

/// Failure class recorded on a task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    Extraction,
    Provider,
    Validation,
    Timeout,
    Crashed,
    Cancelled,
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureKind::Extraction => write!(f, "extraction"),
            FailureKind::Provider => write!(f, "provider"),
            FailureKind::Validation => write!(f, "validation"),
            FailureKind::Timeout => write!(f, "timeout"),
            FailureKind::Crashed => write!(f, "crashed"),
            FailureKind::Cancelled => write!(f, "cancelled"),
        }
    }
}

/// Why an agent did not produce a finding.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentFailure {
    pub agent_kind: AgentKind,
    pub kind: FailureKind,
    pub message: String,
    pub attempts: u32,
}

/// One agent's unit of work within a run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentTask {
    pub agent_kind: AgentKind,
    /// Ids of the documents routed to this agent.
    pub input_documents: Vec<String>,
    pub status: TaskStatus,
    pub started_at: Option<DateTime<Utc>>,
    pub finished_at: Option<DateTime<Utc>>,
    pub attempts: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub finding: Option<Finding>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<AgentFailure>,
}

impl AgentTask {
    pub fn new(agent_kind: AgentKind, input_documents: Vec<String>) -> Self {
        Self {
            agent_kind,
            input_documents,
            status: TaskStatus::Pending,
            started_at: None,
            finished_at: None,
            attempts: 0,
            finding: None,
            error: None,
        }
    }
}

/// Priority bands of the founder interview guide.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuestionPriority {
    MustAsk,
    DomainDeepDive,
    Alignment,
    Risk,
    FollowUp,
}

impl QuestionPriority {
    pub fn parse(s: &str) -> Option<Self> {
        let normalized: String = s
            .to_lowercase()
            .chars()
            .filter(|c| c.is_ascii_alphanumeric())
            .collect();

        match normalized.as_str() {
            "mustask" | "must" | "priority1" | "1" | "critical" => Some(QuestionPriority::MustAsk),
            "domaindeepdive" | "domain" | "priority2" | "2" => Some(QuestionPriority::DomainDeepDive),
            "alignment" | "visionalignment" | "vision" | "priority3" | "3" => {
                Some(QuestionPriority::Alignment)
            }
            "risk" | "riskmitigation" | "priority4" | "4" => Some(QuestionPriority::Risk),
            "followup" | "followups" | "5" => Some(QuestionPriority::FollowUp),
            _ => None,
        }
    }
}

impl fmt::Display for QuestionPriority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QuestionPriority::MustAsk => write!(f, "Must Ask"),
            QuestionPriority::DomainDeepDive => write!(f, "Domain Deep Dive"),
            QuestionPriority::Alignment => write!(f, "Vision & Alignment"),
            QuestionPriority::Risk => write!(f, "Risk & Mitigation"),
            QuestionPriority::FollowUp => write!(f, "Follow-up"),
        }
    }
}

/// A due-diligence question for the founders.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiligenceQuestion {
    pub priority: QuestionPriority,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<Category>,
    pub question: String,
    /// What the answer is meant to validate.
    pub validates: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub red_flags: Option<String>,
    /// Agent that proposed the question; `None` for gap-derived questions.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<AgentKind>,
}

/// Structured output of one successful agent execution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Finding {
    pub agent_kind: AgentKind,
    pub category_scores: BTreeMap<Category, f64>,
    pub rationale: BTreeMap<Category, String>,
    pub raw_insights: Vec<String>,
    pub confidence: f64,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub questions: Vec<DiligenceQuestion>,
}

impl Finding {
    /// Creates an empty finding for an agent.
    pub fn new(agent_kind: AgentKind, confidence: f64) -> Self {
        Self {
            agent_kind,
            category_scores: BTreeMap::new(),
            rationale: BTreeMap::new(),
            raw_insights: Vec::new(),
            confidence,
            questions: Vec::new(),
        }
    }

    /// Adds a category score with its rationale.
    pub fn with_score(mut self, category: Category, score: f64, rationale: impl Into<String>) -> Self {
        self.category_scores.insert(category, score);
        self.rationale.insert(category, rationale.into());
        self
    }
}

/// One orchestrated execution of an agent set over a document set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisRun {
    pub run_id: Uuid,
    pub documents: Vec<Document>,
    pub tasks: Vec<AgentTask>,
    pub created_at: DateTime<Utc>,
}

impl AnalysisRun {
    /// Findings of succeeded tasks, in submission order.
    pub fn findings(&self) -> Vec<Finding> {
        self.tasks
            .iter()
            .filter(|t| t.status == TaskStatus::Succeeded)
            .filter_map(|t| t.finding.clone())
            .collect()
    }

    /// Failures of tasks that did not succeed, in submission order.
    pub fn failures(&self) -> Vec<AgentFailure> {
        self.tasks.iter().filter_map(|t| t.error.clone()).collect()
    }

    pub fn succeeded_count(&self) -> usize {
        self.tasks
            .iter()
            .filter(|t| t.status == TaskStatus::Succeeded)
            .count()
    }
}

/// Grade band derived from the overall score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Grade {
    HighRisk,
    MediumRisk,
    ModeratePotential,
    StrongPotential,
    Exceptional,
}

impl Grade {
    /// Bands include their lower bound: 40 is Medium Risk, 85 is Exceptional.
    pub fn from_score(score: u8) -> Self {
        match score {
            0..=39 => Grade::HighRisk,
            40..=59 => Grade::MediumRisk,
            60..=74 => Grade::ModeratePotential,
            75..=84 => Grade::StrongPotential,
            _ => Grade::Exceptional,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Grade::HighRisk => "High Risk",
            Grade::MediumRisk => "Medium Risk",
            Grade::ModeratePotential => "Moderate Potential",
            Grade::StrongPotential => "Strong Potential",
            Grade::Exceptional => "Exceptional",
        }
    }

    /// Returns an emoji representation of the grade.
    pub fn emoji(&self) -> &'static str {
        match self {
            Grade::HighRisk => "🔴",
            Grade::MediumRisk => "🟠",
            Grade::ModeratePotential => "🟡",
            Grade::StrongPotential => "🟢",
            Grade::Exceptional => "🌟",
        }
    }
}

impl fmt::Display for Grade {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Aggregated score for one category.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryScore {
    pub score: f64,
    pub weight: f64,
    pub rationale: String,
    pub confidence: f64,
    /// Number of findings that scored this category.
    pub contributors: usize,
    pub low_confidence: bool,
}

/// The weighted investment score with per-category rationale.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreReport {
    pub overall_score: u8,
    pub category_breakdown: BTreeMap<Category, CategoryScore>,
    pub confidence: f64,
    pub grade: Grade,
}

impl ScoreReport {
    /// Categories that are missing or only weakly supported.
    pub fn low_confidence_categories(&self) -> Vec<Category> {
        self.category_breakdown
            .iter()
            .filter(|(_, c)| c.low_confidence)
            .map(|(category, _)| *category)
            .collect()
    }
}

/// Summary of an input document kept with the record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentSummary {
    pub filename: String,
    pub role: DocumentRole,
    pub mime_kind: MimeKind,
    pub extraction_status: ExtractionStatus,
    pub chars: usize,
}

impl From<&Document> for DocumentSummary {
    fn from(doc: &Document) -> Self {
        Self {
            filename: doc.filename.clone(),
            role: doc.role,
            mime_kind: doc.mime_kind,
            extraction_status: doc.extraction_status.clone(),
            chars: doc.extracted_text.chars().count(),
        }
    }
}

/// The persisted snapshot of a completed analysis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisRecord {
    pub analysis_id: String,
    pub company_name: String,
    pub created_at: DateTime<Utc>,
    pub mode: AnalysisMode,
    pub score_report: ScoreReport,
    pub findings: Vec<Finding>,
    #[serde(default)]
    pub failures: Vec<AgentFailure>,
    pub questions: Vec<DiligenceQuestion>,
    #[serde(default)]
    pub documents: Vec<DocumentSummary>,
}

/// Index metadata for one stored analysis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexEntry {
    pub analysis_id: String,
    pub company_name: String,
    pub created_at: DateTime<Utc>,
    pub overall_score: u8,
    pub grade: Grade,
    pub confidence: f64,
}

impl From<&AnalysisRecord> for IndexEntry {
    fn from(record: &AnalysisRecord) -> Self {
        Self {
            analysis_id: record.analysis_id.clone(),
            company_name: record.company_name.clone(),
            created_at: record.created_at,
            overall_score: record.score_report.overall_score,
            grade: record.score_report.grade,
            confidence: record.score_report.confidence,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_weights_sum_to_one() {
        let total: u32 = Category::ALL.iter().map(|c| c.weight_percent()).sum();
        assert_eq!(total, 100);

        let fractional: f64 = Category::ALL.iter().map(|c| c.weight()).sum();
        assert!((fractional - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_grade_boundaries() {
        assert_eq!(Grade::from_score(39), Grade::HighRisk);
        assert_eq!(Grade::from_score(40), Grade::MediumRisk);
        assert_eq!(Grade::from_score(59), Grade::MediumRisk);
        assert_eq!(Grade::from_score(60), Grade::ModeratePotential);
        assert_eq!(Grade::from_score(75), Grade::StrongPotential);
        assert_eq!(Grade::from_score(84), Grade::StrongPotential);
        assert_eq!(Grade::from_score(85), Grade::Exceptional);
        assert_eq!(Grade::from_score(100), Grade::Exceptional);
        assert_eq!(Grade::from_score(40).label(), "Medium Risk");
    }

    #[test]
    fn test_category_parse() {
        assert_eq!(Category::parse("Team"), Some(Category::Team));
        assert_eq!(Category::parse(" FINANCIAL "), Some(Category::Financials));
        assert_eq!(Category::parse("defensibility"), Some(Category::Moat));
        assert_eq!(Category::parse("vibes"), None);
    }

    #[test]
    fn test_document_role_from_filename() {
        assert_eq!(DocumentRole::from_filename("Acme_Pitch.pdf"), DocumentRole::PitchDeck);
        assert_eq!(DocumentRole::from_filename("kpi-2024.xlsx"), DocumentRole::DataRoom);
        assert_eq!(DocumentRole::from_filename("founder_call.txt"), DocumentRole::Interaction);
        assert_eq!(DocumentRole::from_filename("landing.html"), DocumentRole::WebContent);
        assert_eq!(DocumentRole::from_filename("overview.pdf"), DocumentRole::PitchDeck);
        assert_eq!(DocumentRole::from_filename("cohorts.csv"), DocumentRole::DataRoom);
        assert_eq!(DocumentRole::from_filename("notes.md"), DocumentRole::WebContent);
        assert_eq!(DocumentRole::from_filename("archive.zip"), DocumentRole::General);
    }

    #[test]
    fn test_mode_agent_selection() {
        assert_eq!(AnalysisMode::Full.agent_kinds().len(), 5);
        assert_eq!(AnalysisMode::Summary.agent_kinds(), vec![AgentKind::PitchDeck]);
        assert_eq!(
            AnalysisMode::Scoring.agent_kinds(),
            vec![AgentKind::PitchDeck, AgentKind::DataRoom]
        );
        assert_eq!(AnalysisMode::Questions.agent_kinds(), vec![AgentKind::Question]);
    }

    #[test]
    fn test_agent_routing() {
        assert!(AgentKind::PitchDeck.accepts(DocumentRole::General));
        assert!(!AgentKind::PitchDeck.accepts(DocumentRole::DataRoom));
        assert!(AgentKind::Question.accepts(DocumentRole::Interaction));
        assert!(!AgentKind::Interaction.accepts(DocumentRole::PitchDeck));
    }

    #[test]
    fn test_document_usability() {
        assert!(Document::from_text("deck.txt", "Acme").is_usable());
        assert!(!Document::from_text("deck.txt", "   ").is_usable());
        assert!(!Document::failed("deck.pdf", "unsupported").is_usable());
    }

    #[test]
    fn test_question_priority_parse() {
        assert_eq!(QuestionPriority::parse("must_ask"), Some(QuestionPriority::MustAsk));
        assert_eq!(QuestionPriority::parse("Risk & Mitigation"), Some(QuestionPriority::Risk));
        assert_eq!(QuestionPriority::parse("follow-up"), Some(QuestionPriority::FollowUp));
        assert_eq!(QuestionPriority::parse("whenever"), None);
    }
}
