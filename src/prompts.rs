pub const REPORT_INSTRUCTION: &str = include_str!("../data/prompts/report_instruction.txt");

/// Replace `{{key}}` placeholders in a template string.
pub fn render(template: &str, vars: &[(&str, &str)]) -> String {
    let mut result = template.to_string();
    for (key, value) in vars {
        result = result.replace(&format!("{{{{{}}}}}", key), value);
    }
    result
}

/// Instruction sent alongside the colposcopy image.
///
/// The medical history is embedded verbatim; it is prompt text, not a query,
/// so it is not escaped.
pub fn compose_instruction(medical_history: &str) -> String {
    render(REPORT_INSTRUCTION, &[("history", medical_history)])
}
