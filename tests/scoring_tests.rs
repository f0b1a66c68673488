/// Behavioral tests for the lead scoring engine
/// Covers full-record outcomes, tiers, the personal-manager rule, routing and ranking
use lead_intake_api::models::Lead;
use lead_intake_api::scoring::{
    rank_leads, recommend_department, score_lead, Department, LeadRecord, Priority, Temperature,
    INSUFFICIENT_DATA,
};

fn some(s: &str) -> Option<String> {
    Some(s.to_string())
}

fn fully_filled_hot_lead() -> LeadRecord {
    LeadRecord {
        deadline: some("Urgent, need it tomorrow"),
        budget: some("2 million rub"),
        role: some("CEO"),
        company_size: some("500+ employees"),
        business_size: some("large"),
        task_volume: some("large-scale project"),
        need_volume: some("ongoing work"),
        task_type: some("website development"),
        service: some("Landing page"),
        niche: some("furniture retail"),
        business_info: some("Chain of furniture stores"),
        contact_method: some("phone"),
        comments: some("Call after lunch"),
        product_interest: some("online store"),
        preferred_contact_method: some("telegram"),
        convenient_time: some("14:00-18:00"),
    }
}

#[cfg(test)]
mod full_record_tests {
    use super::*;

    #[test]
    fn test_empty_record_is_cold_with_fallback_summary() {
        let result = score_lead(&LeadRecord::default());

        assert_eq!(result.score, 0);
        assert_eq!(result.temperature, Temperature::Cold);
        assert_eq!(result.priority, Priority::Low);
        assert!(!result.needs_personal_manager);
        assert_eq!(result.department, Department::Sales);
        assert_eq!(result.summary, INSUFFICIENT_DATA);
    }

    #[test]
    fn test_whitespace_only_record_behaves_like_empty() {
        let blank = LeadRecord {
            deadline: some("   "),
            budget: some("\t"),
            role: some(" "),
            task_type: some("\n"),
            ..Default::default()
        };
        assert_eq!(score_lead(&blank), score_lead(&LeadRecord::default()));
    }

    #[test]
    fn test_fully_filled_hot_lead_reaches_maximum() {
        let result = score_lead(&fully_filled_hot_lead());

        // 25 + 25 + 15 + 10 + 10 + 15
        assert_eq!(result.score, 100);
        assert_eq!(result.temperature, Temperature::Hot);
        assert_eq!(result.priority, Priority::High);
        assert!(result.needs_personal_manager);
        assert_eq!(result.department, Department::Sales);
        assert_eq!(
            result.summary,
            "urgent deadline; large budget; decision maker; large company; large volume; \
             form filled in detail"
        );
    }

    #[test]
    fn test_founder_alone_gets_personal_manager() {
        let lead = LeadRecord {
            role: some("founder"),
            ..Default::default()
        };
        let result = score_lead(&lead);

        // 15 for the role, 1 for one filled checklist field
        assert_eq!(result.score, 16);
        assert_eq!(result.temperature, Temperature::Cold);
        assert_eq!(result.priority, Priority::Low);
        assert!(result.needs_personal_manager);
        assert_eq!(result.summary, "decision maker");
    }

    #[test]
    fn test_warm_lead_without_manager() {
        let lead = LeadRecord {
            deadline: some("within a month"),
            budget: some("50-80 thousand"),
            role: some("Marketing manager"),
            company_size: some("10-50"),
            ..Default::default()
        };
        let result = score_lead(&lead);

        // 12 + 14 + 8 + 5 + round(4 * 1.2)
        assert_eq!(result.score, 44);
        assert_eq!(result.temperature, Temperature::Warm);
        assert_eq!(result.priority, Priority::Medium);
        assert!(!result.needs_personal_manager);
        assert_eq!(
            result.summary,
            "moderate deadline; medium budget; middle management; medium company"
        );
    }

    #[test]
    fn test_high_score_alone_triggers_personal_manager() {
        let lead = LeadRecord {
            deadline: some("ASAP"),
            budget: some("from 300 thousand"),
            role: some("project manager"),
            ..Default::default()
        };
        let result = score_lead(&lead);

        // 25 + 25 + 8 + round(3 * 1.2)
        assert_eq!(result.score, 62);
        assert_eq!(result.temperature, Temperature::Warm);
        assert!(result.needs_personal_manager);
    }

    #[test]
    fn test_russian_form_input() {
        let lead = LeadRecord {
            deadline: some("Срочно, до конца недели"),
            budget: some("от 500 тыс. руб"),
            role: some("Владелец бизнеса"),
            company_size: some("Крупная сеть"),
            task_volume: some("Регулярные задачи"),
            ..Default::default()
        };
        let result = score_lead(&lead);

        // 25 + 25 + 15 + 10 + 10 + round(5 * 1.2)
        assert_eq!(result.score, 91);
        assert_eq!(result.temperature, Temperature::Hot);
        assert!(result.summary.ends_with("form partially filled"));
    }

    #[test]
    fn test_scoring_does_not_depend_on_case() {
        let lower = LeadRecord {
            deadline: some("asap"),
            role: some("ceo"),
            ..Default::default()
        };
        let upper = LeadRecord {
            deadline: some("ASAP"),
            role: some("CEO"),
            ..Default::default()
        };
        assert_eq!(score_lead(&lower), score_lead(&upper));
    }
}

#[cfg(test)]
mod department_tests {
    use super::*;

    fn task(task_type: &str) -> LeadRecord {
        LeadRecord {
            task_type: some(task_type),
            ..Default::default()
        }
    }

    #[test]
    fn test_support_keywords() {
        assert_eq!(
            recommend_department(&task("equipment repair and maintenance")),
            Department::Support
        );
        assert_eq!(
            recommend_department(&task("Ремонт оборудования")),
            Department::Support
        );
    }

    #[test]
    fn test_consulting_keywords() {
        assert_eq!(
            recommend_department(&task("business strategy audit")),
            Department::Consulting
        );
        assert_eq!(
            recommend_department(&task("Анализ продаж")),
            Department::Consulting
        );
    }

    #[test]
    fn test_defaults_to_sales() {
        assert_eq!(
            recommend_department(&task("website development")),
            Department::Sales
        );
        assert_eq!(
            recommend_department(&LeadRecord::default()),
            Department::Sales
        );
    }

    #[test]
    fn test_consulting_wins_over_support() {
        assert_eq!(
            recommend_department(&task("audit of our technical support")),
            Department::Consulting
        );
    }

    #[test]
    fn test_service_work_goes_to_support() {
        assert_eq!(
            recommend_department(&task("car service center")),
            Department::Support
        );
        assert_eq!(
            recommend_department(&task("Автосервис")),
            Department::Support
        );

        let lead = LeadRecord {
            service: some("IT service"),
            ..Default::default()
        };
        assert_eq!(recommend_department(&lead), Department::Support);
    }

    #[test]
    fn test_service_and_niche_are_considered() {
        let lead = LeadRecord {
            task_type: some("website"),
            niche: some("car repair"),
            ..Default::default()
        };
        assert_eq!(recommend_department(&lead), Department::Support);

        let lead = LeadRecord {
            service: some("Process optimization"),
            ..Default::default()
        };
        assert_eq!(recommend_department(&lead), Department::Consulting);
    }
}

#[cfg(test)]
mod ranking_tests {
    use super::*;

    fn lead(id: i32, deadline: Option<&str>) -> Lead {
        Lead {
            id,
            name: format!("Lead {}", id),
            surname: "Test".to_string(),
            deadline: deadline.map(str::to_string),
            ..Default::default()
        }
    }

    fn ids(page: &[lead_intake_api::models::ScoredLead]) -> Vec<i32> {
        page.iter().map(|s| s.lead.id).collect()
    }

    fn sample() -> Vec<Lead> {
        vec![
            lead(1, None),              // 0
            lead(2, Some("tomorrow")),  // 26
            lead(3, Some("someday")),   // 6
            lead(4, Some("in a month")), // 13
        ]
    }

    #[test]
    fn test_hottest_first() {
        let page = rank_leads(sample(), 0, 10);
        assert_eq!(ids(&page), vec![2, 4, 3, 1]);
        assert_eq!(page[0].scoring.score, 26);
        assert_eq!(page[3].scoring.score, 0);
    }

    #[test]
    fn test_pagination_applies_after_sorting() {
        assert_eq!(ids(&rank_leads(sample(), 0, 2)), vec![2, 4]);
        assert_eq!(ids(&rank_leads(sample(), 1, 2)), vec![4, 3]);
        assert_eq!(ids(&rank_leads(sample(), 3, 5)), vec![1]);
        assert!(rank_leads(sample(), 4, 5).is_empty());
    }

    #[test]
    fn test_ties_keep_input_order() {
        let leads = vec![
            lead(5, Some("today")),
            lead(6, None),
            lead(7, Some("today")),
            lead(8, None),
            lead(9, Some("today")),
        ];
        assert_eq!(ids(&rank_leads(leads, 0, 10)), vec![5, 7, 9, 6, 8]);
    }

    #[test]
    fn test_empty_batch() {
        assert!(rank_leads(Vec::new(), 0, 100).is_empty());
    }
}
