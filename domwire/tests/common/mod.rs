#![allow(dead_code)]

use domwire::{HandlerOutput, prelude::*, testing::CallRecorder};
use serde_json::Value;

#[path = "../fixtures/ajax/greeter.rs"]
pub mod greeter;

#[path = "../fixtures/ajax/admin/user_list.rs"]
pub mod user_list;

// ============================================================================
// Test Classes
// ============================================================================

#[derive(Default)]
pub struct Sample {
    ctx: Context,
}

#[callable(context = ctx)]
impl Sample {
    pub fn hello(&mut self, name: String) {
        self.response().html("greeting", format!("Hello {name}"));
    }

    pub fn fail(&mut self) -> Result<(), BoxError> {
        Err("database unavailable".into())
    }

    pub fn partial(&mut self) -> Result<(), BoxError> {
        self.response().html("progress", "started");
        Err("boom".into())
    }

    pub fn nested(&mut self) -> Response {
        self.response().html("outer", "written first");
        let mut sub = Response::new();
        sub.html("inner", "returned");
        sub
    }

    pub fn upload_count(&mut self) {
        let count = self.files().len();
        self.response().html("files", count);
    }

    // Not exported: not public.
    fn helper(&self) -> usize {
        1
    }
}

/// Records its hooks; constructed with an injected recorder.
pub struct Audited {
    ctx: Context,
    calls: CallRecorder,
}

#[callable(context = ctx)]
impl Audited {
    pub fn new(calls: CallRecorder) -> Self {
        Self {
            ctx: Context::default(),
            calls,
        }
    }

    pub fn save(&mut self, id: i64) {
        self.calls.record(format!("save{id}"));
    }

    pub fn load(&mut self) {
        self.calls.record("load");
    }

    #[protected]
    pub fn open(&mut self) {
        self.calls.record("open");
    }

    #[protected]
    pub fn lock(&mut self, mode: String) {
        self.calls.record(format!("lock:{mode}"));
    }

    #[protected]
    pub fn close(&mut self) {
        self.calls.record("close");
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Transport(pub &'static str);

/// Constructor parameters resolved by type and by name.
pub struct Mailer {
    ctx: Context,
    transport: Transport,
    sender: String,
}

#[callable(context = ctx)]
impl Mailer {
    pub fn new(transport: Transport, sender: String) -> Result<Self, String> {
        if sender.is_empty() {
            return Err("sender must not be empty".to_string());
        }
        Ok(Self {
            ctx: Context::default(),
            transport,
            sender,
        })
    }

    pub fn send(&mut self) {
        let clock = self.injected::<u64>("clock").unwrap_or_default();
        let text = format!("{} via {} at {clock}", self.sender, self.transport.0);
        self.response().html("mail", text);
    }
}

// ============================================================================
// Helpers
// ============================================================================

pub fn fixtures() -> String {
    concat!(env!("CARGO_MANIFEST_DIR"), "/tests/fixtures/ajax").to_string()
}

pub fn app() -> App {
    App::builder().build().unwrap()
}

pub fn app_with(config: Config) -> App {
    App::builder().config(config).build().unwrap()
}

/// Decode the command array of a handler output.
pub fn commands(output: &HandlerOutput) -> Vec<Value> {
    serde_json::from_str(&output.body).unwrap()
}

/// The command codes of a handler output, in order.
pub fn codes(output: &HandlerOutput) -> Vec<String> {
    commands(output)
        .iter()
        .map(|c| c["cmd"].as_str().unwrap().to_string())
        .collect()
}
