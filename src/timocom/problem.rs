use serde::Deserialize;
use serde_json::Value;

/// RFC 7807 error body returned by the freight exchange.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProblemDetails {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub detail: Option<String>,
    #[serde(default, rename = "invalid-params", alias = "invalidParams")]
    pub invalid_params: Vec<InvalidParam>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct InvalidParam {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub reason: Option<String>,
}

impl InvalidParam {
    pub fn describe(&self) -> String {
        let name = self.name.as_deref().unwrap_or("unknown");
        match self.reason.as_deref() {
            Some(reason) if !reason.is_empty() => format!("Invalid parameter '{name}': {reason}"),
            _ => format!("Invalid parameter '{name}'"),
        }
    }
}

impl ProblemDetails {
    pub fn from_body(body: &Value) -> Option<Self> {
        serde_json::from_value(body.clone()).ok()
    }

    /// One human-readable line per invalid parameter.
    pub fn messages(&self) -> Vec<String> {
        self.invalid_params.iter().map(InvalidParam::describe).collect()
    }

    /// Short summary: the detail, else the title.
    pub fn summary(&self) -> Option<String> {
        self.detail
            .clone()
            .or_else(|| self.title.clone())
            .filter(|s| !s.is_empty())
    }
}
