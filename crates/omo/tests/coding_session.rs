use std::fs;
use std::sync::{Arc, Mutex};

use omo::SessionBuilder;
use omo::core::AgentEvent;
use omo::core::instructions::StaticInstructions;
use omo_test_model::{PresetEvent, PresetResponse, TestModelProvider};

#[tokio::test]
async fn test_write_then_read() {
    let dir = tempfile::tempdir().unwrap();

    let mut model_provider = TestModelProvider::default();
    model_provider.add_response(PresetResponse::with_events([
        PresetEvent::text("Creating the file."),
        PresetEvent::tool_call(1, "write"),
        PresetEvent::arguments(1, r#"{"path":"notes/todo.md","#),
        PresetEvent::arguments(1, r#""content":"- buy milk\n"}"#),
    ]));
    model_provider.add_response(PresetResponse::with_events([
        PresetEvent::tool_call(0, "edit"),
        PresetEvent::tool_call(1, "read"),
        PresetEvent::arguments(
            0,
            r#"{"path":"notes/todo.md","search":"milk","replace":"bread"}"#,
        ),
        PresetEvent::arguments(1, r#"{"path":"notes/todo.md"}"#),
    ]));
    model_provider.add_response(PresetResponse::with_events([
        PresetEvent::text("Your list says: buy bread."),
    ]));

    let events = Arc::new(Mutex::new(vec![]));
    let mut session = SessionBuilder::with_model_provider(model_provider.clone())
        .with_working_dir(dir.path())
        .with_instructions(StaticInstructions::new("Be helpful."))
        .on_event({
            let events = Arc::clone(&events);
            move |event| events.lock().unwrap().push(event.clone())
        })
        .build();

    let reply = session.send_message("note that I need milk").await.unwrap();
    assert_eq!(reply, "Your list says: buy bread.");
    assert_eq!(
        fs::read_to_string(dir.path().join("notes/todo.md")).unwrap(),
        "- buy bread\n"
    );

    let path = dir.path().join("notes/todo.md");
    let turns: Vec<_> = session
        .transcript()
        .turns()
        .iter()
        .map(|t| t.content().to_owned())
        .collect();
    assert_eq!(
        turns,
        vec![
            "note that I need milk".to_owned(),
            "Creating the file.".to_owned(),
            format!("Tool \"write\" returned: Wrote 11 bytes to {}", path.display()),
            "(tool call)".to_owned(),
            format!("Tool \"edit\" returned: Edited {}", path.display()),
            "Tool \"read\" returned: - buy bread\n".to_owned(),
            "Your list says: buy bread.".to_owned(),
        ]
    );

    // All built-in tools are offered to the model on every request.
    let requests = model_provider.requests();
    assert_eq!(requests.len(), 3);
    for request in &requests {
        let names: Vec<_> =
            request.tools.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names, vec!["bash", "read", "write", "edit"]);
        assert_eq!(request.instructions, "Be helpful.");
    }

    let tool_starts: Vec<_> = events
        .lock()
        .unwrap()
        .iter()
        .filter_map(|e| match e {
            AgentEvent::ToolStart { name, .. } => Some(name.clone()),
            _ => None,
        })
        .collect();
    assert_eq!(tool_starts, vec!["write", "edit", "read"]);
}

#[tokio::test]
async fn test_memory_instructions_by_default() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("IDENTITY.md"), "You are Omo.").unwrap();

    let mut model_provider = TestModelProvider::default();
    model_provider.add_response(PresetResponse::with_events([
        PresetEvent::text("Hi!"),
    ]));

    let mut session = SessionBuilder::with_model_provider(model_provider.clone())
        .with_working_dir(dir.path())
        .with_home_dir(dir.path())
        .build();
    session.send_message("hello").await.unwrap();

    let instructions = &model_provider.requests()[0].instructions;
    assert!(instructions.starts_with("You are Omo.\n\n---\n\n# Daily Log - "));
    assert!(dir.path().join("MEMORY.md").is_file());
    assert!(dir.path().join("memory").is_dir());

    session.clear();
    assert!(session.transcript().is_empty());
}
