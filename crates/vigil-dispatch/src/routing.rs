use vigil_core::{AgentKind, SubmitRequest};

/// Decide which agents a request fans out to.
///
/// Per candidate, in fleet order: an explicit exclude always wins; an
/// explicit include passes; otherwise the agent is selected when one of
/// its trigger words appears (case-insensitive substring) in the
/// request's description or scenario texts. Agents failing the
/// predicate are simply omitted. No agent appears twice.
pub fn route(request: &SubmitRequest) -> Vec<AgentKind> {
    let mut haystack = request.description.to_lowercase();
    for scenario in &request.scenarios {
        haystack.push('\n');
        haystack.push_str(&scenario.to_lowercase());
    }

    AgentKind::ALL
        .into_iter()
        .filter(|kind| !request.exclude_agents.contains(kind))
        .filter(|kind| {
            request.include_agents.contains(kind)
                || kind
                    .trigger_words()
                    .iter()
                    .any(|word| haystack.contains(word))
        })
        .collect()
}
