//! Scripted `LanguageModel` double for tests: hand it a queue of
//! replies, then assert on the calls it recorded.

use std::sync::Mutex;

use async_trait::async_trait;

use crate::config::GenParams;
use crate::error::AppError;

use super::{ChatMessage, LanguageModel};

/// One scripted reply.
#[derive(Debug, Clone)]
pub enum Reply {
    Text(&'static str),
    Fail,
}

pub struct ScriptedModel {
    replies: Mutex<Vec<Reply>>,
    /// When true, the final reply repeats forever instead of exhausting.
    repeat_last: bool,
    calls: Mutex<Vec<(Vec<ChatMessage>, GenParams)>>,
}

impl ScriptedModel {
    /// A model that plays the given replies in order, then fails with a
    /// transport error once exhausted.
    pub fn new(replies: Vec<Reply>) -> Self {
        Self {
            replies: Mutex::new(replies),
            repeat_last: false,
            calls: Mutex::new(Vec::new()),
        }
    }

    /// A model that answers every call with the same text.
    pub fn always(text: &'static str) -> Self {
        Self {
            replies: Mutex::new(vec![Reply::Text(text)]),
            repeat_last: true,
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    pub fn calls(&self) -> Vec<(Vec<ChatMessage>, GenParams)> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl LanguageModel for ScriptedModel {
    async fn complete(
        &self,
        messages: &[ChatMessage],
        params: GenParams,
    ) -> Result<String, AppError> {
        self.calls.lock().unwrap().push((messages.to_vec(), params));

        let mut replies = self.replies.lock().unwrap();
        let reply = if replies.is_empty() {
            return Err(AppError::Transport("scripted model exhausted".into()));
        } else if self.repeat_last && replies.len() == 1 {
            replies[0].clone()
        } else {
            replies.remove(0)
        };

        match reply {
            Reply::Text(t) => Ok(t.to_string()),
            Reply::Fail => Err(AppError::Transport("scripted failure".into())),
        }
    }
}
