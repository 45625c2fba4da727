use serde::Deserialize;

use crate::wizard::WizardSession;

#[derive(Debug, Deserialize, Clone)]
pub struct Request {
    pub id: String,
    pub method: String,
    #[serde(default)]
    pub params: serde_json::Value,
}

/// All daemon state: at most one editing session at a time.
pub struct AppState {
    pub session: Option<WizardSession>,
}
