use serde_json::Value;

use crate::chat::{ChatContext, PromptMode};
use crate::protocol::gemini::report::REPORT_FUNCTION_NAME;

/// Build the literal instruction text sent upstream for `mode`.
///
/// Wording here is presentation, not contract; the contractual part is that
/// each mode produces its own instruction and that domain data and language
/// reach the model.
#[must_use]
pub fn build_instruction(mode: PromptMode, context: &ChatContext) -> String {
    match mode {
        PromptMode::ReportGeneration => report_instruction(context),
        PromptMode::FirstTurnQa => first_turn_instruction(context),
        PromptMode::FollowUpQa => follow_up_instruction(context),
    }
}

fn report_instruction(context: &ChatContext) -> String {
    let mut out = String::with_capacity(512);
    out.push_str(
        "You are a nutrition coach analyzing a user's tracked diary data. \
         Produce a complete progress report by calling the ",
    );
    out.push_str(REPORT_FUNCTION_NAME);
    out.push_str(
        " function with every field you can support from the data. \
         Do not answer in prose. ",
    );
    push_language(&mut out, &context.language);
    push_domain_data(&mut out, context);
    out
}

fn first_turn_instruction(context: &ChatContext) -> String {
    let mut out = String::with_capacity(512);
    out.push_str(
        "You are a friendly, evidence-based nutrition coach. Greet the user, \
         answer their question using their tracked data where relevant, and \
         keep the answer focused and practical. ",
    );
    push_language(&mut out, &context.language);
    push_domain_data(&mut out, context);
    out
}

fn follow_up_instruction(context: &ChatContext) -> String {
    let mut out = String::with_capacity(512);
    out.push_str(
        "You are continuing an ongoing coaching conversation. Answer the \
         user's follow-up concisely, staying consistent with your earlier \
         replies. Do not re-introduce yourself. ",
    );
    push_language(&mut out, &context.language);
    push_domain_data(&mut out, context);
    out
}

fn push_language(out: &mut String, language: &str) {
    if language.is_empty() {
        return;
    }
    out.push_str("Respond in ");
    out.push_str(language);
    out.push_str(". ");
}

fn push_domain_data(out: &mut String, context: &ChatContext) {
    if context.domain_data.is_empty() {
        return;
    }
    out.push_str("\n\nUser data:\n");
    for (key, value) in &context.domain_data {
        out.push_str("- ");
        out.push_str(key);
        out.push_str(": ");
        match value {
            Value::String(text) => out.push_str(text),
            other => out.push_str(&other.to_string()),
        }
        out.push('\n');
    }
}

#[cfg(test)]
mod tests {
    use super::build_instruction;
    use crate::chat::{ChatContext, PromptMode};
    use crate::protocol::gemini::report::REPORT_FUNCTION_NAME;
    use serde_json::json;

    fn context() -> ChatContext {
        let domain_data = match json!({
            "weight_log": "82.1, 81.8, 81.5",
            "calorie_target": 2200
        }) {
            serde_json::Value::Object(map) => map,
            _ => unreachable!(),
        };
        ChatContext {
            user_text: "How am I doing?".to_string(),
            domain_data,
            language: "German".to_string(),
            history: Vec::new(),
            wants_report: false,
        }
    }

    #[test]
    fn report_instruction_names_the_forced_function() {
        let text = build_instruction(PromptMode::ReportGeneration, &context());
        assert!(text.contains(REPORT_FUNCTION_NAME));
    }

    #[test]
    fn each_mode_produces_distinct_instruction() {
        let ctx = context();
        let report = build_instruction(PromptMode::ReportGeneration, &ctx);
        let first = build_instruction(PromptMode::FirstTurnQa, &ctx);
        let follow = build_instruction(PromptMode::FollowUpQa, &ctx);
        assert_ne!(report, first);
        assert_ne!(first, follow);
        assert_ne!(report, follow);
    }

    #[test]
    fn language_and_domain_data_are_rendered() {
        let text = build_instruction(PromptMode::FirstTurnQa, &context());
        assert!(text.contains("Respond in German."));
        assert!(text.contains("weight_log: 82.1, 81.8, 81.5"));
        assert!(text.contains("calorie_target: 2200"));
    }

    #[test]
    fn empty_language_adds_no_directive() {
        let mut ctx = context();
        ctx.language = String::new();
        let text = build_instruction(PromptMode::FollowUpQa, &ctx);
        assert!(!text.contains("Respond in"));
    }
}
