use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use sqlx::FromRow;

use crate::scoring::{score_lead, LeadRecord, LeadScore};

// ============ Database Models ============

/// A lead submitted through the public intake form.
#[derive(Debug, Clone, Default, FromRow, Serialize, Deserialize)]
pub struct Lead {
    pub id: i32,
    pub name: String,
    pub surname: String,
    pub patronymic: Option<String>,
    /// Free-form description of the business.
    pub business_info: Option<String>,
    pub budget: Option<String>,
    pub contact_method: Option<String>,
    pub comments: Option<String>,
    pub niche: Option<String>,
    pub company_size: Option<String>,
    pub task_volume: Option<String>,
    /// Position of the person filling in the form.
    pub role: Option<String>,
    pub business_size: Option<String>,
    pub need_volume: Option<String>,
    pub deadline: Option<String>,
    pub task_type: Option<String>,
    pub product_interest: Option<String>,
    pub preferred_contact_method: Option<String>,
    pub convenient_time: Option<String>,
    /// Service picked from the catalog, if any.
    pub service: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Behavioral metrics collected on the landing page, 1:1 with a lead.
///
/// `id` is the lead id; rows are removed together with their lead.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct LeadMetrics {
    pub id: i32,
    pub time_on_page_seconds: Option<String>,
    /// JSON-encoded list of clicked buttons, stored as sent by the tracker.
    pub buttons_clicked: Option<String>,
    pub cursor_hover_data: Option<String>,
    pub return_count: i32,
    pub raw_metrics: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// ============ API Models ============

/// Lead with its on-demand score, as returned by the scored listing.
#[derive(Debug, Clone, Serialize)]
pub struct ScoredLead {
    #[serde(flatten)]
    pub lead: Lead,
    pub scoring: LeadScore,
}

impl ScoredLead {
    pub fn new(lead: Lead) -> Self {
        let scoring = score_lead(&LeadRecord::from(&lead));
        Self { lead, scoring }
    }
}

/// Body of `POST /api/leads`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CreateLeadRequest {
    pub name: String,
    pub surname: String,
    pub patronymic: Option<String>,
    pub business_info: Option<String>,
    pub budget: Option<String>,
    pub contact_method: Option<String>,
    pub comments: Option<String>,
    pub niche: Option<String>,
    pub company_size: Option<String>,
    pub task_volume: Option<String>,
    pub role: Option<String>,
    pub business_size: Option<String>,
    pub need_volume: Option<String>,
    pub deadline: Option<String>,
    pub task_type: Option<String>,
    pub product_interest: Option<String>,
    pub preferred_contact_method: Option<String>,
    pub convenient_time: Option<String>,
    pub service: Option<String>,
}

/// Body of `PATCH /api/leads/:id`.
///
/// Absent keys leave a column untouched; an explicit `null` clears it.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateLeadRequest {
    pub name: Option<String>,
    pub surname: Option<String>,
    #[serde(default, deserialize_with = "present")]
    pub patronymic: Option<Option<String>>,
    #[serde(default, deserialize_with = "present")]
    pub business_info: Option<Option<String>>,
    #[serde(default, deserialize_with = "present")]
    pub budget: Option<Option<String>>,
    #[serde(default, deserialize_with = "present")]
    pub contact_method: Option<Option<String>>,
    #[serde(default, deserialize_with = "present")]
    pub comments: Option<Option<String>>,
    #[serde(default, deserialize_with = "present")]
    pub niche: Option<Option<String>>,
    #[serde(default, deserialize_with = "present")]
    pub company_size: Option<Option<String>>,
    #[serde(default, deserialize_with = "present")]
    pub task_volume: Option<Option<String>>,
    #[serde(default, deserialize_with = "present")]
    pub role: Option<Option<String>>,
    #[serde(default, deserialize_with = "present")]
    pub business_size: Option<Option<String>>,
    #[serde(default, deserialize_with = "present")]
    pub need_volume: Option<Option<String>>,
    #[serde(default, deserialize_with = "present")]
    pub deadline: Option<Option<String>>,
    #[serde(default, deserialize_with = "present")]
    pub task_type: Option<Option<String>>,
    #[serde(default, deserialize_with = "present")]
    pub product_interest: Option<Option<String>>,
    #[serde(default, deserialize_with = "present")]
    pub preferred_contact_method: Option<Option<String>>,
    #[serde(default, deserialize_with = "present")]
    pub convenient_time: Option<Option<String>>,
    #[serde(default, deserialize_with = "present")]
    pub service: Option<Option<String>>,
}

impl UpdateLeadRequest {
    /// Apply the provided fields on top of an existing row.
    pub fn apply_to(self, lead: &mut Lead) {
        fn set<T>(target: &mut T, value: Option<T>) {
            if let Some(v) = value {
                *target = v;
            }
        }

        set(&mut lead.name, self.name);
        set(&mut lead.surname, self.surname);
        set(&mut lead.patronymic, self.patronymic);
        set(&mut lead.business_info, self.business_info);
        set(&mut lead.budget, self.budget);
        set(&mut lead.contact_method, self.contact_method);
        set(&mut lead.comments, self.comments);
        set(&mut lead.niche, self.niche);
        set(&mut lead.company_size, self.company_size);
        set(&mut lead.task_volume, self.task_volume);
        set(&mut lead.role, self.role);
        set(&mut lead.business_size, self.business_size);
        set(&mut lead.need_volume, self.need_volume);
        set(&mut lead.deadline, self.deadline);
        set(&mut lead.task_type, self.task_type);
        set(&mut lead.product_interest, self.product_interest);
        set(&mut lead.preferred_contact_method, self.preferred_contact_method);
        set(&mut lead.convenient_time, self.convenient_time);
        set(&mut lead.service, self.service);
    }
}

/// Body of `POST /api/lead-metrics/:lead_id`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CreateLeadMetricsRequest {
    pub time_on_page_seconds: Option<String>,
    pub buttons_clicked: Option<String>,
    pub cursor_hover_data: Option<String>,
    #[serde(default)]
    pub return_count: i32,
    pub raw_metrics: Option<String>,
}

/// Body of `PATCH /api/lead-metrics/:lead_id`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateLeadMetricsRequest {
    #[serde(default, deserialize_with = "present")]
    pub time_on_page_seconds: Option<Option<String>>,
    #[serde(default, deserialize_with = "present")]
    pub buttons_clicked: Option<Option<String>>,
    #[serde(default, deserialize_with = "present")]
    pub cursor_hover_data: Option<Option<String>>,
    pub return_count: Option<i32>,
    #[serde(default, deserialize_with = "present")]
    pub raw_metrics: Option<Option<String>>,
}

impl UpdateLeadMetricsRequest {
    pub fn apply_to(self, metrics: &mut LeadMetrics) {
        if let Some(v) = self.time_on_page_seconds {
            metrics.time_on_page_seconds = v;
        }
        if let Some(v) = self.buttons_clicked {
            metrics.buttons_clicked = v;
        }
        if let Some(v) = self.cursor_hover_data {
            metrics.cursor_hover_data = v;
        }
        if let Some(v) = self.return_count {
            metrics.return_count = v;
        }
        if let Some(v) = self.raw_metrics {
            metrics.raw_metrics = v;
        }
    }
}

/// `skip` / `limit` query parameters.
#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct PageParams {
    pub skip: Option<i64>,
    pub limit: Option<i64>,
}

/// Marks a key as present even when its value is `null`.
fn present<'de, T, D>(deserializer: D) -> Result<Option<T>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    T::deserialize(deserializer).map(Some)
}
