use serde::{Deserialize, Serialize};

/// The fixed fleet of specialized assessment agents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AgentKind {
    /// Scans for vulnerable surfaces and insecure configuration.
    Security,
    /// Profiles latency, throughput, and resource ceilings.
    Performance,
    /// Audits interfaces against accessibility criteria.
    Accessibility,
    /// Replays the regression suite against the target.
    Regression,
    /// Probes failure handling under injected faults.
    Resilience,
}

impl AgentKind {
    /// Every member of the fleet, in dispatch order.
    pub const ALL: [AgentKind; 5] = [
        AgentKind::Security,
        AgentKind::Performance,
        AgentKind::Accessibility,
        AgentKind::Regression,
        AgentKind::Resilience,
    ];

    /// Keywords that route free-text scenarios to this agent.
    /// Matching is case-insensitive substring containment.
    pub fn trigger_words(self) -> &'static [&'static str] {
        match self {
            AgentKind::Security => &["security", "vulnerability", "auth", "injection", "xss"],
            AgentKind::Performance => &["performance", "latency", "load", "throughput", "slow"],
            AgentKind::Accessibility => &["accessibility", "a11y", "aria", "contrast", "wcag"],
            AgentKind::Regression => &["regression", "smoke", "functional", "end-to-end"],
            AgentKind::Resilience => &["resilience", "chaos", "failover", "fault", "recovery"],
        }
    }

    /// Channel carrying new-task notifications for this agent.
    pub fn task_channel(self) -> String {
        format!("{self}:tasks")
    }

    /// Domain area this agent's findings cover in the synthesized report.
    pub fn domain_area(self) -> &'static str {
        match self {
            AgentKind::Security => "security",
            AgentKind::Performance => "performance",
            AgentKind::Accessibility => "accessibility",
            AgentKind::Regression => "functional",
            AgentKind::Resilience => "resilience",
        }
    }
}

impl std::fmt::Display for AgentKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AgentKind::Security => write!(f, "security"),
            AgentKind::Performance => write!(f, "performance"),
            AgentKind::Accessibility => write!(f, "accessibility"),
            AgentKind::Regression => write!(f, "regression"),
            AgentKind::Resilience => write!(f, "resilience"),
        }
    }
}

impl std::str::FromStr for AgentKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "security" => Ok(AgentKind::Security),
            "performance" => Ok(AgentKind::Performance),
            "accessibility" => Ok(AgentKind::Accessibility),
            "regression" => Ok(AgentKind::Regression),
            "resilience" => Ok(AgentKind::Resilience),
            other => Err(format!("unknown agent kind: {other}")),
        }
    }
}
