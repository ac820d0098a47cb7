//! # Ideation Form
//!
//! Editable form state and client-side validation. Nothing invalid ever
//! reaches the socket.

use crate::error::ValidationError;
use crate::models::{ContentFormat, IdeationRequest};

/// Backend schema limit for `industry`
pub const MAX_INDUSTRY_LEN: usize = 100;
/// Backend schema limit for `target_audience`
pub const MAX_AUDIENCE_LEN: usize = 200;

/// Form fields as the user edits them
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdeationForm {
    pub industry: String,
    pub target_audience: String,
    pub blog: bool,
    pub video: bool,
    pub social: bool,
    /// Optional free text; blank means none
    pub additional_context: String,
}

impl Default for IdeationForm {
    fn default() -> Self {
        Self {
            industry: String::new(),
            target_audience: String::new(),
            blog: true,
            video: true,
            social: true,
            additional_context: String::new(),
        }
    }
}

impl IdeationForm {
    pub fn new(industry: impl Into<String>, target_audience: impl Into<String>) -> Self {
        Self {
            industry: industry.into(),
            target_audience: target_audience.into(),
            ..Self::default()
        }
    }

    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.additional_context = context.into();
        self
    }

    /// Check exactly the given formats
    pub fn with_formats(mut self, formats: &[ContentFormat]) -> Self {
        self.blog = formats.contains(&ContentFormat::Blog);
        self.video = formats.contains(&ContentFormat::Video);
        self.social = formats.contains(&ContentFormat::Social);
        self
    }

    /// Checked formats in display order
    pub fn selected_formats(&self) -> Vec<ContentFormat> {
        ContentFormat::ALL
            .into_iter()
            .filter(|format| match format {
                ContentFormat::Blog => self.blog,
                ContentFormat::Video => self.video,
                ContentFormat::Social => self.social,
            })
            .collect()
    }

    /// Whether the submit control is enabled
    pub fn can_submit(&self, connected: bool, running: bool) -> bool {
        connected && !running && self.validate().is_ok()
    }

    /// Build the outbound request. Text fields are sent as typed.
    pub fn validate(&self) -> Result<IdeationRequest, ValidationError> {
        if self.industry.trim().is_empty() {
            return Err(ValidationError::MissingIndustry);
        }
        if self.target_audience.trim().is_empty() {
            return Err(ValidationError::MissingAudience);
        }
        if self.industry.chars().count() > MAX_INDUSTRY_LEN {
            return Err(ValidationError::TooLong {
                field: "industry",
                max: MAX_INDUSTRY_LEN,
            });
        }
        if self.target_audience.chars().count() > MAX_AUDIENCE_LEN {
            return Err(ValidationError::TooLong {
                field: "target_audience",
                max: MAX_AUDIENCE_LEN,
            });
        }

        let content_types = self.selected_formats();
        if content_types.is_empty() {
            return Err(ValidationError::NoFormats);
        }

        Ok(IdeationRequest {
            industry: self.industry.clone(),
            target_audience: self.target_audience.clone(),
            content_types,
            additional_context: Some(self.additional_context.trim())
                .filter(|context| !context.is_empty())
                .map(str::to_string),
        })
    }
}
