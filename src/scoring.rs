//! Rule-based lead scoring.
//!
//! Every lead gets a 0-100 score ("temperature"):
//! - 70-100 hot: urgent deadline, large budget, decision maker
//! - 40-69 warm: medium budget, reasonable timeline
//! - 0-39 cold: little data, small budget, no urgency
//!
//! Alongside the score the engine recommends a priority, whether the lead
//! deserves a personal manager, which department should pick it up, and a
//! short rationale. Scoring is pure and never fails: missing or unrecognised
//! fields simply contribute nothing.
//!
//! Keyword tables carry English and Russian stems; all matching is done on a
//! trimmed, lowercased copy of each field.

use regex::RegexSet;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::OnceLock;

use crate::models::{Lead, ScoredLead};

// ============ Rule tables ============

const URGENT_DEADLINE: &[&str] = &[
    "urgent",
    "immediately",
    "today",
    "tomorrow",
    "asap",
    "1-2 day",
    "couple of days",
    "this week",
    "as soon as possible",
    "end of week",
    "end of the week",
    "emergency",
    "срочн",
    "немедленн",
    "сегодня",
    "завтра",
    "1-2 дн",
    "пару дней",
    "эта недел",
    "ближайш",
    "как можно скор",
    "до конца недел",
    "экстренн",
];

const MEDIUM_DEADLINE: &[&str] = &[
    "2 week",
    "two weeks",
    "month",
    "2-3 week",
    "3-4 week",
    "2 недел",
    "месяц",
    "2-3 недел",
    "3-4 недел",
];

// Amounts from roughly 500k. The bare "500-" pattern is intentionally loose
// and also matches phrases like "500-meter"; kept for compatibility.
const HIGH_BUDGET_PATTERNS: &[&str] = &[
    r"\d[\d\s]*\s*(?:млн|миллион|million|mln)",
    r"(?:от|from)\s*\d[\d\s]*00\s*(?:тыс|thousand)",
    r"\d[\d\s]*00\s*[-–]\s*\d+\s*(?:тыс|thousand)",
    r"500\s*[-–—]",
];

// Amounts from roughly 50k-100k. "100-" has no unit anchor either.
const MID_BUDGET_PATTERNS: &[&str] = &[
    r"100\s*[-–—]",
    r"\d[\d\s]*0\s*[-–]\s*\d+\s*(?:тыс|thousand)",
    r"(?:от|from)\s*50",
];

const MONEY_MARKERS: &[&str] = &[
    "thousand", "тыс", "rub", "руб", "₽", "$", "€", "usd", "eur", "budget", "бюджет",
];

const DECISION_MAKERS: &[&str] = &[
    "director",
    "ceo",
    "cto",
    "coo",
    "cfo",
    "owner",
    "founder",
    "partner",
    "president",
    "chairman",
    "general manager",
    "head of company",
    "head of business",
    "директор",
    "генеральный",
    "собственник",
    "владелец",
    "основатель",
    "учредитель",
    "руководитель",
    "партнёр",
    "партнер",
    "управляющий",
];

const MIDDLE_ROLES: &[&str] = &[
    "manager",
    "head of",
    "team lead",
    "teamlead",
    "project lead",
    "supervisor",
    "менеджер",
    "начальник",
    "руководитель отдел",
    "тимлид",
    "руководитель проект",
];

const LARGE_COMPANY: &[&str] = &[
    "large",
    "enterprise",
    "500+",
    "1000+",
    "100+",
    "corporation",
    "holding",
    "more than 100",
    "more than 50",
    "over 100",
    "50-100",
    "100-500",
    "крупн",
    "корпорац",
    "холдинг",
    "более 100",
    "более 50",
];

const MEDIUM_COMPANY: &[&str] = &[
    "medium",
    "mid-size",
    "midsize",
    "20-50",
    "10-50",
    "50 employees",
    "small-to-medium",
    "средн",
    "50 сотрудник",
    "малый-средн",
];

const LARGE_VOLUME: &[&str] = &[
    "large", "big", "complex", "ongoing", "regular", "massive", "больш", "масштаб", "комплекс",
    "постоянн", "регулярн", "крупн",
];

const MEDIUM_VOLUME: &[&str] = &["medium", "several", "a number of", "средн", "несколько", "ряд"];

const CONSULTING_KEYWORDS: &[&str] = &[
    "audit", "consult", "analys", "analyz", "strateg", "optimiz", "optimis", "аудит", "консульт",
    "анализ", "стратег", "оптимиз",
];

const SUPPORT_KEYWORDS: &[&str] = &[
    "maintenance",
    "repair",
    "support",
    "service",
    "emergency",
    "technical",
    "обслуж",
    "ремонт",
    "поддерж",
    "сервис",
    "аварий",
    "технич",
];

const MAX_SCORE: u32 = 100;
const HOT_THRESHOLD: u8 = 70;
const WARM_THRESHOLD: u8 = 40;
const PERSONAL_MANAGER_THRESHOLD: u8 = 60;
const MAX_COMPLETENESS_POINTS: u32 = 15;

/// Summary used when no rule produced a reason.
pub const INSUFFICIENT_DATA: &str = "insufficient data for analysis";

fn high_budget_patterns() -> &'static RegexSet {
    static SET: OnceLock<RegexSet> = OnceLock::new();
    SET.get_or_init(|| {
        RegexSet::new(HIGH_BUDGET_PATTERNS).expect("high budget patterns are valid")
    })
}

fn mid_budget_patterns() -> &'static RegexSet {
    static SET: OnceLock<RegexSet> = OnceLock::new();
    SET.get_or_init(|| {
        RegexSet::new(MID_BUDGET_PATTERNS).expect("mid budget patterns are valid")
    })
}

fn contains_any(text: &str, keywords: &[&str]) -> bool {
    keywords.iter().any(|kw| text.contains(kw))
}

// ============ Input / output types ============

/// The lead fields the engine looks at.
///
/// Storage rows convert into this shape before scoring (see `From<&Lead>`).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeadRecord {
    pub deadline: Option<String>,
    pub budget: Option<String>,
    pub role: Option<String>,
    pub company_size: Option<String>,
    pub business_size: Option<String>,
    pub task_volume: Option<String>,
    pub need_volume: Option<String>,
    pub task_type: Option<String>,
    pub service: Option<String>,
    pub niche: Option<String>,
    pub business_info: Option<String>,
    pub contact_method: Option<String>,
    pub comments: Option<String>,
    pub product_interest: Option<String>,
    pub preferred_contact_method: Option<String>,
    pub convenient_time: Option<String>,
}

impl LeadRecord {
    /// Number of checklist fields carrying non-blank text.
    pub fn filled_fields(&self) -> usize {
        [
            &self.business_info,
            &self.budget,
            &self.niche,
            &self.company_size,
            &self.task_volume,
            &self.role,
            &self.business_size,
            &self.need_volume,
            &self.deadline,
            &self.task_type,
            &self.product_interest,
            &self.contact_method,
            &self.preferred_contact_method,
            &self.convenient_time,
            &self.comments,
            &self.service,
        ]
        .into_iter()
        .filter(|field| normalized(field).is_some())
        .count()
    }
}

impl From<&Lead> for LeadRecord {
    fn from(lead: &Lead) -> Self {
        Self {
            deadline: lead.deadline.clone(),
            budget: lead.budget.clone(),
            role: lead.role.clone(),
            company_size: lead.company_size.clone(),
            business_size: lead.business_size.clone(),
            task_volume: lead.task_volume.clone(),
            need_volume: lead.need_volume.clone(),
            task_type: lead.task_type.clone(),
            service: lead.service.clone(),
            niche: lead.niche.clone(),
            business_info: lead.business_info.clone(),
            contact_method: lead.contact_method.clone(),
            comments: lead.comments.clone(),
            product_interest: lead.product_interest.clone(),
            preferred_contact_method: lead.preferred_contact_method.clone(),
            convenient_time: lead.convenient_time.clone(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Temperature {
    Hot,
    Warm,
    Cold,
}

impl Temperature {
    pub fn from_score(score: u8) -> Self {
        if score >= HOT_THRESHOLD {
            Self::Hot
        } else if score >= WARM_THRESHOLD {
            Self::Warm
        } else {
            Self::Cold
        }
    }

    pub fn priority(self) -> Priority {
        match self {
            Self::Hot => Priority::High,
            Self::Warm => Priority::Medium,
            Self::Cold => Priority::Low,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Hot => "hot",
            Self::Warm => "warm",
            Self::Cold => "cold",
        }
    }
}

impl fmt::Display for Temperature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    High,
    Medium,
    Low,
}

impl Priority {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::High => "high",
            Self::Medium => "medium",
            Self::Low => "low",
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Department a lead should be routed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Department {
    Sales,
    Consulting,
    Support,
}

impl Department {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Sales => "sales",
            Self::Consulting => "consulting",
            Self::Support => "support",
        }
    }
}

impl fmt::Display for Department {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of scoring a single lead. Computed on demand, never stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeadScore {
    /// 0-100.
    pub score: u8,
    pub temperature: Temperature,
    pub priority: Priority,
    pub needs_personal_manager: bool,
    pub department: Department,
    /// Reasons joined with "; ", or [`INSUFFICIENT_DATA`].
    pub summary: String,
}

// ============ Scoring ============

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Contribution {
    points: u32,
    reason: Option<&'static str>,
}

impl Contribution {
    const fn new(points: u32, reason: Option<&'static str>) -> Self {
        Self { points, reason }
    }
}

/// Trimmed, lowercased field text; `None` for missing or blank values.
fn normalized(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_lowercase)
}

fn deadline_contribution(deadline: &str) -> Contribution {
    if contains_any(deadline, URGENT_DEADLINE) {
        Contribution::new(25, Some("urgent deadline"))
    } else if contains_any(deadline, MEDIUM_DEADLINE) {
        Contribution::new(12, Some("moderate deadline"))
    } else {
        Contribution::new(5, Some("deadline specified"))
    }
}

fn budget_contribution(budget: &str) -> Contribution {
    if high_budget_patterns().is_match(budget) {
        Contribution::new(25, Some("large budget"))
    } else if mid_budget_patterns().is_match(budget) {
        Contribution::new(14, Some("medium budget"))
    } else if contains_any(budget, MONEY_MARKERS) {
        Contribution::new(7, Some("budget specified"))
    } else {
        Contribution::new(0, None)
    }
}

fn role_contribution(role: &str) -> Contribution {
    if is_decision_maker(role) {
        Contribution::new(15, Some("decision maker"))
    } else if contains_any(role, MIDDLE_ROLES) {
        Contribution::new(8, Some("middle management"))
    } else {
        Contribution::new(3, None)
    }
}

fn company_contribution(size: &str) -> Contribution {
    if contains_any(size, LARGE_COMPANY) {
        Contribution::new(10, Some("large company"))
    } else if contains_any(size, MEDIUM_COMPANY) {
        Contribution::new(5, Some("medium company"))
    } else {
        Contribution::new(2, None)
    }
}

fn volume_contribution(volume: &str) -> Contribution {
    if contains_any(volume, LARGE_VOLUME) {
        Contribution::new(10, Some("large volume"))
    } else if contains_any(volume, MEDIUM_VOLUME) {
        Contribution::new(5, None)
    } else {
        Contribution::new(2, None)
    }
}

/// 1.2 points per filled field, capped at 15. `filled * 12` is always even,
/// so the +5 rounding never lands on a tie.
fn completeness_contribution(filled: usize) -> Contribution {
    let points = ((filled as u32 * 12 + 5) / 10).min(MAX_COMPLETENESS_POINTS);
    let reason = if filled >= 10 {
        Some("form filled in detail")
    } else if filled >= 5 {
        Some("form partially filled")
    } else {
        None
    };
    Contribution::new(points, reason)
}

/// Whether a (lowercased) role names someone who can approve spend.
pub fn is_decision_maker(role: &str) -> bool {
    contains_any(role, DECISION_MAKERS)
}

/// Routing recommendation from task type, service and niche.
pub fn recommend_department(lead: &LeadRecord) -> Department {
    let combined = [&lead.task_type, &lead.service, &lead.niche]
        .into_iter()
        .map(|field| normalized(field).unwrap_or_default())
        .collect::<Vec<_>>()
        .join(" ");

    if contains_any(&combined, CONSULTING_KEYWORDS) {
        Department::Consulting
    } else if contains_any(&combined, SUPPORT_KEYWORDS) {
        Department::Support
    } else {
        Department::Sales
    }
}

/// Score a lead.
pub fn score_lead(lead: &LeadRecord) -> LeadScore {
    let role = normalized(&lead.role);
    let company = normalized(&lead.company_size).or_else(|| normalized(&lead.business_size));
    let volume = normalized(&lead.task_volume).or_else(|| normalized(&lead.need_volume));

    let contributions = [
        normalized(&lead.deadline).map(|d| deadline_contribution(&d)),
        normalized(&lead.budget).map(|b| budget_contribution(&b)),
        role.as_deref().map(role_contribution),
        company.as_deref().map(company_contribution),
        volume.as_deref().map(volume_contribution),
        Some(completeness_contribution(lead.filled_fields())),
    ];

    let points: u32 = contributions.iter().flatten().map(|c| c.points).sum();
    let reasons: Vec<&str> = contributions
        .iter()
        .flatten()
        .filter_map(|c| c.reason)
        .collect();

    let score = points.min(MAX_SCORE) as u8;
    let temperature = Temperature::from_score(score);
    let needs_personal_manager =
        score >= PERSONAL_MANAGER_THRESHOLD || role.as_deref().is_some_and(is_decision_maker);

    let summary = if reasons.is_empty() {
        INSUFFICIENT_DATA.to_string()
    } else {
        reasons.join("; ")
    };

    LeadScore {
        score,
        temperature,
        priority: temperature.priority(),
        needs_personal_manager,
        department: recommend_department(lead),
        summary,
    }
}

/// Score a batch, order it hottest first and cut one page out of it.
///
/// The sort is stable, so leads with equal scores keep their input order.
/// `offset`/`limit` apply to the sorted sequence.
pub fn rank_leads(leads: Vec<Lead>, offset: usize, limit: usize) -> Vec<ScoredLead> {
    let mut scored: Vec<ScoredLead> = leads.into_iter().map(ScoredLead::new).collect();
    scored.sort_by(|a, b| b.scoring.score.cmp(&a.scoring.score));
    scored.into_iter().skip(offset).take(limit).collect()
}
