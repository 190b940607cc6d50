//! Risk aggregation: one score, one level, and the list of blockers that
//! make powering the board pointless until fixed.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::analysis::Severity;
use crate::checklist::{ChecklistStep, StepCategory, StepRisk};
use crate::findings::Finding;

/// Weight tables and cut points for [`aggregate`]. The defaults are the
/// tuned values; expose them so a caller can re-weight without forking
/// the scorer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RiskConfig {
    /// Findings weight per severity; worst case is `critical`.
    pub severity_weights: SeverityWeights,
    /// Checklist weight per step risk; worst case is `high`.
    pub step_weights: StepWeights,
    /// Share of the combined score taken from findings (the rest comes
    /// from the checklist).
    pub findings_share: f64,
    /// Combined score at or above this is high risk.
    pub high_cutoff: u32,
    /// Combined score at or above this is medium risk.
    pub medium_cutoff: u32,
    /// Blockers listed in the report are truncated to this many entries;
    /// counting is never truncated.
    pub max_blockers_listed: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SeverityWeights {
    pub low: u32,
    pub medium: u32,
    pub high: u32,
    pub critical: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StepWeights {
    pub low: u32,
    pub medium: u32,
    pub high: u32,
}

impl Default for RiskConfig {
    fn default() -> Self {
        Self {
            severity_weights: SeverityWeights {
                low: 1,
                medium: 5,
                high: 10,
                critical: 20,
            },
            step_weights: StepWeights {
                low: 1,
                medium: 3,
                high: 7,
            },
            findings_share: 0.6,
            high_cutoff: 70,
            medium_cutoff: 40,
            max_blockers_listed: 5,
        }
    }
}

impl RiskConfig {
    fn severity_weight(&self, severity: Severity) -> u32 {
        match severity {
            Severity::Low => self.severity_weights.low,
            Severity::Medium => self.severity_weights.medium,
            Severity::High => self.severity_weights.high,
            Severity::Critical => self.severity_weights.critical,
        }
    }

    fn step_weight(&self, risk: StepRisk) -> u32 {
        match risk {
            StepRisk::Low => self.step_weights.low,
            StepRisk::Medium => self.step_weights.medium,
            StepRisk::High => self.step_weights.high,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
    Critical,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OverallRisk {
    /// Combined score, clamped to 0..=100.
    pub score: u32,
    pub level: RiskLevel,
    pub total_findings: usize,
    pub critical_findings: usize,
    pub high_findings: usize,
    /// Display list, truncated to `max_blockers_listed`.
    pub blockers: Vec<String>,
    /// Full blocker count; drives `can_attempt_bringup`.
    pub blocker_count: usize,
    pub can_attempt_bringup: bool,
    /// Per-category contribution, each clamped to 0..=100.
    pub breakdown: BTreeMap<String, u32>,
}

/// Combine checklist risk and finding severity into one risk picture.
///
/// Each side is normalized against its own worst case (every finding
/// critical, every step high risk), combined `findings_share` /
/// `1 - findings_share`, then clamped. Any critical finding forces a
/// `Critical` level regardless of score.
pub fn aggregate(steps: &[ChecklistStep], findings: &[Finding], cfg: &RiskConfig) -> OverallRisk {
    let checklist_raw: u32 = steps.iter().map(|s| cfg.step_weight(s.risk)).sum();
    let checklist_max = steps.len() as u32 * cfg.step_weights.high;
    let checklist_score = normalized(checklist_raw, checklist_max);

    let findings_raw: u32 = findings
        .iter()
        .map(|f| cfg.severity_weight(f.severity))
        .sum();
    let findings_max = findings.len() as u32 * cfg.severity_weights.critical;
    let findings_score = normalized(findings_raw, findings_max);

    let combined = findings_score * cfg.findings_share
        + checklist_score * (1.0 - cfg.findings_share);
    let score = (combined.round() as u32).min(100);

    let critical_findings = findings
        .iter()
        .filter(|f| f.severity == Severity::Critical)
        .count();
    let high_findings = findings
        .iter()
        .filter(|f| f.severity == Severity::High)
        .count();

    let level = if critical_findings > 0 {
        RiskLevel::Critical
    } else if score >= cfg.high_cutoff {
        RiskLevel::High
    } else if score >= cfg.medium_cutoff {
        RiskLevel::Medium
    } else {
        RiskLevel::Low
    };

    let mut blockers: Vec<String> = findings
        .iter()
        .filter(|f| f.is_blocker())
        .map(|f| f.summary.clone())
        .collect();
    blockers.extend(
        steps
            .iter()
            .filter(|s| s.prevents_bringup)
            .map(|s| format!("[step {}] {}", s.sequence, s.title)),
    );
    let blocker_count = blockers.len();
    blockers.truncate(cfg.max_blockers_listed);

    OverallRisk {
        score,
        level,
        total_findings: findings.len(),
        critical_findings,
        high_findings,
        blockers,
        blocker_count,
        can_attempt_bringup: blocker_count == 0,
        breakdown: breakdown(steps, findings, cfg),
    }
}

fn normalized(raw: u32, max: u32) -> f64 {
    if max == 0 {
        0.0
    } else {
        (raw as f64 / max as f64 * 100.0).min(100.0)
    }
}

fn breakdown(
    steps: &[ChecklistStep],
    findings: &[Finding],
    cfg: &RiskConfig,
) -> BTreeMap<String, u32> {
    let mut scores: BTreeMap<String, u32> = BTreeMap::new();
    let power_findings = findings.iter().filter(|f| f.id.contains("power")).count() as u32;
    scores.insert("power".into(), (power_findings * 25).min(100));
    let connectivity = findings
        .iter()
        .filter(|f| {
            ["unattached", "disconnect", "floating", "unnamed", "single_node"]
                .iter()
                .any(|kw| f.id.contains(kw))
        })
        .count() as u32;
    scores.insert("connectivity".into(), (connectivity * 15).min(100));

    let mut design = 0u32;
    let mut functional = 0u32;
    for step in steps {
        let weight = cfg.step_weight(step.risk);
        match step.category {
            StepCategory::Power => {
                *scores.entry("power".into()).or_insert(0) += weight * 5;
            }
            StepCategory::Reset | StepCategory::Clock | StepCategory::Programming => {
                functional += weight * 5;
            }
            StepCategory::Functional => design += weight * 3,
        }
    }
    scores.insert("design".into(), design.min(100));
    scores.insert("functional".into(), functional.min(100));
    if let Some(power) = scores.get_mut("power") {
        *power = (*power).min(100);
    }
    scores
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Value;

    fn finding(severity: Severity, prevents: bool, summary: &str) -> Finding {
        Finding {
            id: "test_finding".into(),
            severity,
            summary: summary.into(),
            why: String::new(),
            evidence: Value::Null,
            fix_suggestion: None,
            prevents_bringup: prevents,
            location: None,
        }
    }

    fn step(risk: StepRisk, prevents: bool, seq: u32) -> ChecklistStep {
        ChecklistStep {
            id: format!("step-{seq}"),
            sequence: seq,
            category: StepCategory::Power,
            title: format!("step {seq}"),
            instruction: String::new(),
            expected: String::new(),
            component: None,
            pins: vec![],
            nets: vec![],
            likely_faults: vec![],
            fix_suggestions: vec![],
            risk,
            prevents_bringup: prevents,
            measurement: None,
        }
    }

    #[test]
    fn empty_inputs_score_zero_and_allow_bringup() {
        let risk = aggregate(&[], &[], &RiskConfig::default());
        assert_eq!(risk.score, 0);
        assert_eq!(risk.level, RiskLevel::Low);
        assert!(risk.can_attempt_bringup);
        assert_eq!(risk.blocker_count, 0);
    }

    #[test]
    fn all_critical_findings_max_out_the_findings_side() {
        // One critical finding: findings side 100, checklist side 0.
        // Combined: 100 * 0.6 = 60.
        let findings = vec![finding(Severity::Critical, true, "broken power")];
        let risk = aggregate(&[], &findings, &RiskConfig::default());
        assert_eq!(risk.score, 60);
        assert_eq!(risk.level, RiskLevel::Critical); // critical overrides score
        assert!(!risk.can_attempt_bringup);
    }

    #[test]
    fn sixty_forty_combination() {
        // Findings: one high out of max critical -> 10/20 = 50.
        // Checklist: one high step -> 7/7 = 100.
        // Combined: 50*0.6 + 100*0.4 = 70 -> High.
        let findings = vec![finding(Severity::High, false, "floating out")];
        let steps = vec![step(StepRisk::High, false, 1)];
        let risk = aggregate(&steps, &findings, &RiskConfig::default());
        assert_eq!(risk.score, 70);
        assert_eq!(risk.level, RiskLevel::High);
    }

    #[test]
    fn medium_band() {
        // Findings: one medium -> 5/20 = 25. Checklist: one high -> 100.
        // Combined: 25*0.6 + 100*0.4 = 55 -> Medium.
        let findings = vec![finding(Severity::Medium, false, "unnamed nets")];
        let steps = vec![step(StepRisk::High, false, 1)];
        let risk = aggregate(&steps, &findings, &RiskConfig::default());
        assert_eq!(risk.score, 55);
        assert_eq!(risk.level, RiskLevel::Medium);
    }

    #[test]
    fn blockers_truncate_for_display_but_count_fully() {
        let findings: Vec<Finding> = (0..8)
            .map(|i| finding(Severity::Critical, true, &format!("blocker {i}")))
            .collect();
        let risk = aggregate(&[], &findings, &RiskConfig::default());
        assert_eq!(risk.blockers.len(), 5);
        assert_eq!(risk.blocker_count, 8);
        assert!(!risk.can_attempt_bringup);
    }

    #[test]
    fn blocking_step_prevents_bringup_without_findings() {
        let steps = vec![step(StepRisk::High, true, 1)];
        let risk = aggregate(&steps, &[], &RiskConfig::default());
        assert_eq!(risk.blocker_count, 1);
        assert!(risk.blockers[0].contains("[step 1]"));
        assert!(!risk.can_attempt_bringup);
    }

    #[test]
    fn score_is_clamped() {
        let findings: Vec<Finding> = (0..50)
            .map(|_| finding(Severity::Critical, false, "bad"))
            .collect();
        let steps: Vec<ChecklistStep> = (0..50)
            .map(|i| step(StepRisk::High, false, i))
            .collect();
        let risk = aggregate(&steps, &findings, &RiskConfig::default());
        assert_eq!(risk.score, 100);
    }
}
