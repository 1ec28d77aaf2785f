use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AnalyzeRequest {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub website: Option<String>,
    #[serde(default)]
    pub instagram: Option<String>,
    #[serde(default)]
    pub linkedin: Option<String>,
}

impl AnalyzeRequest {
    pub fn name(&self) -> Option<&str> {
        non_blank(self.name.as_deref())
    }

    /// Website with surrounding whitespace removed, `None` when blank
    pub fn website(&self) -> Option<&str> {
        non_blank(self.website.as_deref())
    }

    pub fn instagram(&self) -> Option<&str> {
        non_blank(self.instagram.as_deref())
    }

    pub fn linkedin(&self) -> Option<&str> {
        non_blank(self.linkedin.as_deref())
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageSnapshot {
    pub html: String,
    pub screenshot_base64: Option<String>,
}

#[derive(Debug, Clone, Copy)]
pub struct FetchOptions {
    pub render: bool,
    pub timeout_ms: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageSignals {
    pub title: String,
    pub description: String,
    pub has_testimonials: bool,
    pub has_case_studies: bool,
    pub has_about_section: bool,
    pub has_contact_info: bool,
    pub word_count: usize,
}
