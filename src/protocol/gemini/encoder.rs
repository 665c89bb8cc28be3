use crate::chat::{ChatContext, PromptMode, TurnRole};

use super::report::{report_function_declaration, REPORT_FUNCTION_NAME};
use super::{
    Content, FunctionCallingConfig, GenerateRequest, GenerationConfig, Part, ToolConfig,
    ToolDeclaration,
};

const DEFAULT_TEMPERATURE: f32 = 0.7;
/// Reports run colder so the structured output stays stable.
const REPORT_TEMPERATURE: f32 = 0.2;

/// Encode one chat turn into the upstream wire request.
///
/// History turns become `contents` in order, the caller's new input is the
/// final user content, and the instruction text goes into
/// `system_instruction`. Report mode additionally declares the report
/// function and forces it via the tool config.
#[must_use]
pub fn encode_chat_request(
    context: &ChatContext,
    instruction: &str,
    mode: PromptMode,
) -> GenerateRequest {
    let mut contents = Vec::with_capacity(context.history.len() + 1);
    for turn in &context.history {
        contents.push(Content {
            role: Some(turn_role_name(turn.role).to_string()),
            parts: vec![Part::Text(turn.content.clone())],
        });
    }
    contents.push(Content {
        role: Some("user".to_string()),
        parts: vec![Part::Text(context.user_text.clone())],
    });

    let (tools, tool_config, temperature) = if mode == PromptMode::ReportGeneration {
        (
            Some(vec![ToolDeclaration {
                function_declarations: vec![report_function_declaration()],
            }]),
            Some(ToolConfig {
                function_calling_config: Some(FunctionCallingConfig {
                    mode: "ANY".to_string(),
                    allowed_function_names: Some(vec![REPORT_FUNCTION_NAME.to_string()]),
                }),
            }),
            REPORT_TEMPERATURE,
        )
    } else {
        (None, None, DEFAULT_TEMPERATURE)
    };

    GenerateRequest {
        contents,
        tools,
        tool_config,
        system_instruction: Some(Content {
            role: None,
            parts: vec![Part::Text(instruction.to_string())],
        }),
        generation_config: Some(GenerationConfig {
            temperature: Some(temperature),
            max_output_tokens: None,
        }),
    }
}

fn turn_role_name(role: TurnRole) -> &'static str {
    match role {
        TurnRole::User => "user",
        TurnRole::Model => "model",
    }
}
