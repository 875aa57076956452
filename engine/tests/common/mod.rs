//! Shared helpers for integration tests

#![allow(dead_code)]

use async_trait::async_trait;
use mathcrew_engine::llm::{
    FinalAnswer, GenerateOptions, LLMError, LLMProvider, LLMResponse, Message, ToolCall,
};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

/// One recorded `generate` call
#[derive(Debug, Clone)]
pub struct RecordedCall {
    pub messages: Vec<Message>,
    pub options: GenerateOptions,
}

/// Provider that replays a fixed script and records what it was sent
pub struct ScriptedProvider {
    script: Mutex<VecDeque<Result<LLMResponse, LLMError>>>,
    calls: Mutex<Vec<RecordedCall>>,
}

impl ScriptedProvider {
    pub fn new(script: Vec<Result<LLMResponse, LLMError>>) -> Arc<Self> {
        Arc::new(Self {
            script: Mutex::new(script.into()),
            calls: Mutex::new(Vec::new()),
        })
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

#[async_trait]
impl LLMProvider for ScriptedProvider {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn generate(
        &self,
        messages: &[Message],
        options: &GenerateOptions,
    ) -> Result<LLMResponse, LLMError> {
        self.calls.lock().unwrap().push(RecordedCall {
            messages: messages.to_vec(),
            options: options.clone(),
        });
        self.script
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(LLMError::Unknown("script exhausted".to_string())))
    }
}

pub fn answer(text: &str) -> Result<LLMResponse, LLMError> {
    Ok(LLMResponse::FinalAnswer(FinalAnswer::new(text)))
}

pub fn tool_call(id: &str, name: &str, arguments: serde_json::Value) -> Result<LLMResponse, LLMError> {
    Ok(LLMResponse::ToolCall(ToolCall::new(
        id,
        name,
        arguments.to_string(),
    )))
}

/// Math script: one evaluator call followed by a summary
pub fn math_script(expression: &str, summary: &str) -> Vec<Result<LLMResponse, LLMError>> {
    vec![
        tool_call(
            "eval_1",
            "compute_basic_math",
            serde_json::json!({ "expression": expression }),
        ),
        answer(summary),
    ]
}
