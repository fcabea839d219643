use crate::pipeline::AnalysisResult;
use chrono::{DateTime, Local};
use std::path::Path;

/// Evidence excerpts at or below this trimmed length are treated as noise
/// and left out of the report.
const MIN_EVIDENCE_LENGTH: usize = 20;

const MISSING_SECTION_FALLBACK: &str = "Analysis output is unavailable.";

/// Render the analysis result as a Markdown incident report.
///
/// Aside from the generation timestamp in the header this is a pure
/// function of its inputs; no field combination makes it panic.
pub fn render_report(result: &AnalysisResult, source_name: &str) -> String {
    render_report_at(result, source_name, Local::now())
}

pub fn render_report_at(
    result: &AnalysisResult,
    source_name: &str,
    generated_at: DateTime<Local>,
) -> String {
    let base_name = Path::new(source_name)
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| source_name.to_string());

    let mut parts: Vec<String> = Vec::new();

    parts.push(format!("# Incident Analysis Report: {}", base_name));
    parts.push(format!(
        "> Generated: {}\n",
        generated_at.format("%Y-%m-%d %H:%M:%S")
    ));

    parts.push("## 1. Overview".to_string());
    parts.push(format!(
        "{}\n",
        non_empty_or(&result.summary, MISSING_SECTION_FALLBACK)
    ));

    parts.push("## 2. Root-Cause Analysis".to_string());
    if result.root_causes.is_empty() {
        parts.push(
            "The collected information is not sufficient to determine a clear cause.".to_string(),
        );
    } else {
        if result.root_causes.len() == 1 {
            parts.push("The most likely cause is the following:".to_string());
        } else {
            parts.push("The analysis points to the following likely causes:".to_string());
        }
        for cause in &result.root_causes {
            parts.push(format!("- {}", cause));
        }
    }
    parts.push(String::new());

    parts.push("## 3. Evidence Logs".to_string());
    let meaningful: Vec<&str> = result
        .evidence
        .iter()
        .map(|e| e.trim())
        .filter(|e| e.chars().count() > MIN_EVIDENCE_LENGTH)
        .collect();
    if meaningful.is_empty() {
        parts.push("No meaningful supporting log evidence was found.".to_string());
    } else {
        parts.push("The log excerpts most directly tied to the failure are the following.".to_string());
        for excerpt in meaningful {
            parts.push(format!("```log\n{}\n```", excerpt));
        }
    }
    parts.push(String::new());

    parts.push("## 4. Impact Scope".to_string());
    parts.push(format!(
        "{}\n",
        non_empty_or(&result.impact_scope, MISSING_SECTION_FALLBACK)
    ));

    parts.push("## 5. Recommended Actions".to_string());
    if result.recommended_actions.is_empty() {
        parts.push(
            "No actions could be suggested automatically; further review by an engineer is required."
                .to_string(),
        );
    } else {
        if result.recommended_actions.len() == 1 {
            parts.push("The following action is recommended as the immediate next step:".to_string());
        } else {
            parts.push("The following actions are recommended, in order:".to_string());
        }
        for (i, action) in result.recommended_actions.iter().enumerate() {
            parts.push(format!("{}. {}", i + 1, action));
        }
    }
    parts.push(String::new());

    parts.push("## 6. Prevention Plan".to_string());
    parts.push("- `TODO: fill in after the incident review meeting`".to_string());

    parts.join("\n")
}

fn non_empty_or<'a>(text: &'a str, fallback: &'a str) -> &'a str {
    if text.trim().is_empty() {
        fallback
    } else {
        text
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn sample_result() -> AnalysisResult {
        AnalysisResult {
            summary: "The API gateway lost its database connection at 10:30.".to_string(),
            root_causes: vec!["Connection pool exhaustion".to_string()],
            evidence: vec!["2024-01-20 10:30:01 ERROR pool exhausted, 0 connections left".to_string()],
            impact_scope: "All write traffic failed for six minutes.".to_string(),
            recommended_actions: vec![
                "Raise the pool ceiling".to_string(),
                "Add saturation alerting".to_string(),
            ],
        }
    }

    fn fixed_instant() -> DateTime<Local> {
        Local.with_ymd_and_hms(2024, 1, 20, 10, 30, 0).unwrap()
    }

    #[test]
    fn test_sections_in_order() {
        let report = render_report_at(&sample_result(), "/var/log/gateway.log", fixed_instant());

        let headers = [
            "# Incident Analysis Report: gateway.log",
            "## 1. Overview",
            "## 2. Root-Cause Analysis",
            "## 3. Evidence Logs",
            "## 4. Impact Scope",
            "## 5. Recommended Actions",
            "## 6. Prevention Plan",
        ];
        let mut last = 0;
        for header in headers {
            let position = report[last..]
                .find(header)
                .unwrap_or_else(|| panic!("missing or out-of-order header: {}", header));
            last += position;
        }
    }

    #[test]
    fn test_rendering_is_deterministic() {
        let result = sample_result();
        let first = render_report_at(&result, "gateway.log", fixed_instant());
        let second = render_report_at(&result, "gateway.log", fixed_instant());
        assert_eq!(first, second);
    }

    #[test]
    fn test_evidence_filter_drops_short_entries() {
        let mut result = sample_result();
        result.evidence = vec![
            "short".to_string(),
            "a".repeat(25),
            "b".repeat(100),
        ];
        let report = render_report_at(&result, "app.log", fixed_instant());

        assert!(!report.contains("```log\nshort\n```"));
        assert!(report.contains(&format!("```log\n{}\n```", "a".repeat(25))));
        assert!(report.contains(&format!("```log\n{}\n```", "b".repeat(100))));
    }

    #[test]
    fn test_evidence_fallback_when_all_filtered() {
        let mut result = sample_result();
        result.evidence = vec!["tiny".to_string(), "   ".to_string()];
        let report = render_report_at(&result, "app.log", fixed_instant());
        assert!(report.contains("No meaningful supporting log evidence was found."));
        assert!(!report.contains("```log"));
    }

    #[test]
    fn test_singular_and_plural_cause_lead_ins() {
        let mut result = sample_result();
        let report = render_report_at(&result, "app.log", fixed_instant());
        assert!(report.contains("The most likely cause is the following:"));

        result.root_causes.push("Slow failover".to_string());
        let report = render_report_at(&result, "app.log", fixed_instant());
        assert!(report.contains("The analysis points to the following likely causes:"));

        result.root_causes.clear();
        let report = render_report_at(&result, "app.log", fixed_instant());
        assert!(report.contains("not sufficient to determine a clear cause"));
    }

    #[test]
    fn test_action_lead_ins_and_numbering() {
        let mut result = sample_result();
        let report = render_report_at(&result, "app.log", fixed_instant());
        assert!(report.contains("The following actions are recommended, in order:"));
        assert!(report.contains("1. Raise the pool ceiling"));
        assert!(report.contains("2. Add saturation alerting"));

        result.recommended_actions.truncate(1);
        let report = render_report_at(&result, "app.log", fixed_instant());
        assert!(report.contains("The following action is recommended as the immediate next step:"));

        result.recommended_actions.clear();
        let report = render_report_at(&result, "app.log", fixed_instant());
        assert!(report.contains("No actions could be suggested automatically"));
    }

    #[test]
    fn test_empty_fields_fall_back_without_panicking() {
        let result = AnalysisResult {
            summary: String::new(),
            root_causes: vec![],
            evidence: vec![],
            impact_scope: "  ".to_string(),
            recommended_actions: vec![],
        };
        let report = render_report_at(&result, "empty.log", fixed_instant());
        assert_eq!(report.matches(MISSING_SECTION_FALLBACK).count(), 2);
        assert!(report.contains("## 6. Prevention Plan"));
    }
}
