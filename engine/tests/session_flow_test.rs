//! End-to-end turn handling over an in-memory session

mod common;

use common::{answer, math_script, ScriptedProvider};
use mathcrew_engine::config::Config;
use mathcrew_engine::handlers::run_turn;
use mathcrew_engine::orchestrator::{build_pipeline, PipelineKind};
use mathcrew_engine::session::{SessionService, Turn};

#[tokio::test]
async fn test_turns_are_recorded_in_the_session() {
    let mut script = math_script("12 / 3 + 4", "8.0");
    script.push(answer("No poem was requested."));
    script.push(answer("12 / 3 + 4 = 8.0"));
    let provider = ScriptedProvider::new(script);

    let config = Config::default();
    let pipeline = build_pipeline(PipelineKind::Sequential, &config, provider.clone());
    let sessions = SessionService::new();

    let report = run_turn(
        pipeline.as_ref(),
        &sessions,
        "demo-session",
        "demo-user",
        Turn::user_text("What is 12 / 3 + 4?"),
    )
    .await
    .unwrap();

    assert_eq!(report.final_response, "12 / 3 + 4 = 8.0");
    assert_eq!(provider.call_count(), 4);

    let session = sessions.get_session("demo-session").unwrap();
    assert_eq!(session.user_id, "demo-user");
    assert_eq!(session.turns.len(), 2);
    assert_eq!(session.turns[0].author, "user");
    assert_eq!(session.turns[1].author, "synthesizer_agent");
    assert_eq!(session.turns[1].text(), "12 / 3 + 4 = 8.0");

    let rendered: Vec<String> = report.events.iter().map(|e| e.render()).collect();
    assert_eq!(
        rendered,
        vec![
            "math_agent 8.0",
            "poetry_agent No poem was requested.",
            "synthesizer_agent 12 / 3 + 4 = 8.0",
        ]
    );
}

#[tokio::test]
async fn test_creative_stage_uses_raised_temperature() {
    let mut script = math_script("1 + 1", "2.0");
    script.push(answer("No poem was requested."));
    script.push(answer("2.0"));
    let provider = ScriptedProvider::new(script);

    let config = Config::default();
    let pipeline = build_pipeline(PipelineKind::Sequential, &config, provider.clone());
    run_turn(
        pipeline.as_ref(),
        &SessionService::new(),
        "s",
        "u",
        Turn::user_text("1 + 1"),
    )
    .await
    .unwrap();

    let temperatures: Vec<f64> = provider.calls().iter().map(|c| c.options.temperature).collect();
    assert_eq!(temperatures, vec![0.2, 0.2, 0.6, 0.2]);
}
