use nutrilens::chat::{ChatContext, ChatTurn, PromptMode, TurnRole};
use nutrilens::protocol::gemini::encoder::encode_chat_request;
use nutrilens::protocol::gemini::report::REPORT_FUNCTION_NAME;
use nutrilens::protocol::gemini::Part;

fn context(history: Vec<ChatTurn>, wants_report: bool) -> ChatContext {
    ChatContext {
        user_text: "How did this week go?".to_string(),
        domain_data: serde_json::Map::new(),
        language: "English".to_string(),
        history,
        wants_report,
    }
}

fn turn(role: TurnRole, content: &str) -> ChatTurn {
    ChatTurn {
        role,
        content: content.to_string(),
    }
}

#[test]
fn report_mode_forces_the_declared_function() {
    let ctx = context(Vec::new(), true);
    let mode = PromptMode::select(ctx.history.len(), ctx.wants_report);
    assert_eq!(mode, PromptMode::ReportGeneration);

    let request = encode_chat_request(&ctx, "instruction", mode);

    let tools = request.tools.expect("tools declared");
    assert_eq!(tools[0].function_declarations[0].name, REPORT_FUNCTION_NAME);

    let config = request
        .tool_config
        .expect("tool config")
        .function_calling_config
        .expect("calling config");
    assert_eq!(config.mode, "ANY");
    assert_eq!(
        config.allowed_function_names,
        Some(vec![REPORT_FUNCTION_NAME.to_string()])
    );
}

#[test]
fn qa_modes_declare_no_tools() {
    let ctx = context(Vec::new(), false);
    let request = encode_chat_request(&ctx, "instruction", PromptMode::FirstTurnQa);
    assert!(request.tools.is_none());
    assert!(request.tool_config.is_none());
}

#[test]
fn history_is_encoded_in_order_with_user_text_last() {
    let ctx = context(
        vec![
            turn(TurnRole::User, "first question"),
            turn(TurnRole::Model, "first answer"),
            turn(TurnRole::User, "second question"),
        ],
        false,
    );
    let request = encode_chat_request(&ctx, "instruction", PromptMode::FollowUpQa);

    assert_eq!(request.contents.len(), 4);
    let roles: Vec<_> = request
        .contents
        .iter()
        .map(|content| content.role.as_deref().unwrap_or_default())
        .collect();
    assert_eq!(roles, ["user", "model", "user", "user"]);

    match &request.contents[3].parts[0] {
        Part::Text(text) => assert_eq!(text, "How did this week go?"),
        other => panic!("unexpected part: {other:?}"),
    }
}

#[test]
fn instruction_becomes_the_system_instruction() {
    let ctx = context(Vec::new(), false);
    let request = encode_chat_request(&ctx, "be concise", PromptMode::FirstTurnQa);
    let system = request.system_instruction.expect("system instruction");
    match &system.parts[0] {
        Part::Text(text) => assert_eq!(text, "be concise"),
        other => panic!("unexpected part: {other:?}"),
    }
}

#[test]
fn report_request_serializes_with_camel_case_wire_names() {
    let ctx = context(Vec::new(), true);
    let request = encode_chat_request(&ctx, "instruction", PromptMode::ReportGeneration);
    let wire = serde_json::to_value(&request).expect("serialize");

    assert!(wire.get("systemInstruction").is_some());
    assert!(wire.get("toolConfig").is_some());
    assert_eq!(
        wire["toolConfig"]["functionCallingConfig"]["mode"],
        "ANY"
    );
    assert!(wire["generationConfig"]["temperature"].is_number());
}
