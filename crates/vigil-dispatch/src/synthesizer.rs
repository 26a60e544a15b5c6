use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use uuid::Uuid;
use vigil_core::AgentKind;

/// Agents running concurrently above this count earn the parallel bonus.
pub const PARALLEL_THRESHOLD: usize = 2;
/// Coordination bonus for a genuinely parallel session.
pub const PARALLEL_BONUS: f64 = 0.15;
/// Fixed efficiency constant applied to every session.
pub const EFFICIENCY_CONSTANT: f64 = 0.05;
/// Weight of the success ratio in the verification score.
pub const BASE_QUALITY_WEIGHT: f64 = 0.8;

/// Findings bucketed by severity across every agent payload.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RiskSummary {
    pub critical: u32,
    pub high: u32,
    pub medium: u32,
    pub low: u32,
}

impl RiskSummary {
    pub fn total(&self) -> u32 {
        self.critical + self.high + self.medium + self.low
    }
}

/// The merged cross-cutting report for one session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SynthesizedReport {
    pub session_id: Uuid,
    pub agents_expected: usize,
    /// Agents that published a completion before the deadline.
    pub agents_reported: usize,
    /// Per domain area: reporting status and finding count.
    pub coverage: BTreeMap<String, serde_json::Value>,
    pub risk_summary: RiskSummary,
    pub coordination_score: f64,
    /// Overall verification score in [0, 1].
    pub verification_score: f64,
    /// Per-agent payloads, verbatim as collected.
    pub agent_results: HashMap<AgentKind, serde_json::Value>,
}

/// Merges per-agent payloads into a single report.
///
/// Pure and total: produces a report for any input map, including one
/// holding only timeout or failure entries — the scores degrade, the
/// synthesis never fails.
pub struct ResultSynthesizer;

impl ResultSynthesizer {
    pub fn synthesize(
        session_id: Uuid,
        expected: &[AgentKind],
        agent_results: HashMap<AgentKind, serde_json::Value>,
    ) -> SynthesizedReport {
        let mut coverage = BTreeMap::new();
        let mut risk = RiskSummary::default();
        let mut reported = 0usize;
        let mut completed = 0usize;

        for (agent, payload) in &agent_results {
            let status = payload["status"].as_str().unwrap_or("unknown");
            if status != "timeout" {
                reported += 1;
            }
            if status == "completed" {
                completed += 1;
            }

            let findings = payload["result"]["findings"].as_array();
            for finding in findings.into_iter().flatten() {
                match finding["severity"].as_str() {
                    Some("critical") => risk.critical += 1,
                    Some("high") => risk.high += 1,
                    Some("medium") => risk.medium += 1,
                    Some("low") => risk.low += 1,
                    _ => {}
                }
            }

            coverage.insert(
                agent.domain_area().to_string(),
                serde_json::json!({
                    "status": status,
                    "findings": findings.map_or(0, Vec::len),
                }),
            );
        }

        let parallel_bonus = if expected.len() > PARALLEL_THRESHOLD {
            PARALLEL_BONUS
        } else {
            0.0
        };
        let coordination_score = parallel_bonus + EFFICIENCY_CONSTANT;

        let success_ratio = completed as f64 / expected.len().max(1) as f64;
        let verification_score =
            (BASE_QUALITY_WEIGHT * success_ratio + coordination_score).clamp(0.0, 1.0);

        SynthesizedReport {
            session_id,
            agents_expected: expected.len(),
            agents_reported: reported,
            coverage,
            risk_summary: risk,
            coordination_score,
            verification_score,
            agent_results,
        }
    }
}
