use crate::application::tooling::ProviderGuidance;

/// Base prompt followed by one guidance line per provider that advertised
/// instructions during its handshake.
pub fn compose_system_prompt(base: &str, guidance: &[ProviderGuidance]) -> String {
    let mut lines: Vec<String> = Vec::with_capacity(guidance.len() + 1);
    let base = base.trim();
    if !base.is_empty() {
        lines.push(base.to_string());
    }
    for entry in guidance {
        let instruction = entry.instruction.trim();
        if instruction.is_empty() {
            continue;
        }
        lines.push(format!(
            "Provider '{}' guidance: {}",
            entry.provider, instruction
        ));
    }
    lines.join("\n\n")
}
