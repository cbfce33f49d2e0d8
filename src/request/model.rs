use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Backend rejects paragraphs longer than this many characters.
pub const MAX_PARAGRAPH_CHARS: usize = 2000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Tone {
    #[serde(rename = "活潑輕鬆")]
    Lively,
    #[serde(rename = "溫暖")]
    Warm,
    #[serde(rename = "專業")]
    Professional,
    #[serde(rename = "謙虛")]
    Humble,
    #[serde(rename = "幽默")]
    Humorous,
}

impl Tone {
    pub const ALL: [Tone; 5] = [
        Tone::Lively,
        Tone::Warm,
        Tone::Professional,
        Tone::Humble,
        Tone::Humorous,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Tone::Lively => "活潑輕鬆",
            Tone::Warm => "溫暖",
            Tone::Professional => "專業",
            Tone::Humble => "謙虛",
            Tone::Humorous => "幽默",
        }
    }

    fn alias(self) -> &'static str {
        match self {
            Tone::Lively => "lively",
            Tone::Warm => "warm",
            Tone::Professional => "professional",
            Tone::Humble => "humble",
            Tone::Humorous => "humorous",
        }
    }
}

impl FromStr for Tone {
    type Err = ValidationIssue;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        Tone::ALL
            .into_iter()
            .find(|tone| tone.label() == wanted || tone.alias().eq_ignore_ascii_case(wanted))
            .ok_or(ValidationIssue::UnknownTone)
    }
}

impl fmt::Display for Tone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Language {
    #[serde(rename = "廣東話")]
    Cantonese,
    #[serde(rename = "普通話")]
    Mandarin,
    #[serde(rename = "英文")]
    English,
    #[serde(rename = "西班牙文")]
    Spanish,
}

impl Language {
    pub const ALL: [Language; 4] = [
        Language::Cantonese,
        Language::Mandarin,
        Language::English,
        Language::Spanish,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Language::Cantonese => "廣東話",
            Language::Mandarin => "普通話",
            Language::English => "英文",
            Language::Spanish => "西班牙文",
        }
    }

    fn alias(self) -> &'static str {
        match self {
            Language::Cantonese => "cantonese",
            Language::Mandarin => "mandarin",
            Language::English => "english",
            Language::Spanish => "spanish",
        }
    }
}

impl FromStr for Language {
    type Err = ValidationIssue;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        Language::ALL
            .into_iter()
            .find(|lang| lang.label() == wanted || lang.alias().eq_ignore_ascii_case(wanted))
            .ok_or(ValidationIssue::UnknownLanguage)
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// The three fields as the user typed them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormInput {
    pub paragraph: String,
    pub tone: String,
    pub language: String,
}

impl FormInput {
    pub fn new(
        paragraph: impl Into<String>,
        tone: impl Into<String>,
        language: impl Into<String>,
    ) -> Self {
        Self {
            paragraph: paragraph.into(),
            tone: tone.into(),
            language: language.into(),
        }
    }

    pub fn validate(&self) -> Result<RewriteRequest, ValidationIssue> {
        if self.paragraph.trim().is_empty()
            || self.tone.trim().is_empty()
            || self.language.trim().is_empty()
        {
            return Err(ValidationIssue::MissingFields);
        }
        if self.paragraph.chars().count() > MAX_PARAGRAPH_CHARS {
            return Err(ValidationIssue::ParagraphTooLong);
        }
        Ok(RewriteRequest {
            paragraph: self.paragraph.clone(),
            tone: self.tone.parse()?,
            language: self.language.parse()?,
        })
    }
}

/// Body of `POST /process`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RewriteRequest {
    pub paragraph: String,
    pub tone: Tone,
    pub language: Language,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationIssue {
    MissingFields,
    ParagraphTooLong,
    UnknownTone,
    UnknownLanguage,
}

impl ValidationIssue {
    pub fn message(self) -> &'static str {
        match self {
            ValidationIssue::MissingFields => "請填寫所有必要欄位",
            ValidationIssue::ParagraphTooLong => "段落內容過長，請限制在2000字元以內",
            ValidationIssue::UnknownTone => "無效的語調選項",
            ValidationIssue::UnknownLanguage => "無效的語言選項",
        }
    }
}

impl fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.message())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serializes_with_backend_labels() {
        let request = FormInput::new("你好", "warm", "英文").validate().unwrap();
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"paragraph": "你好", "tone": "溫暖", "language": "英文"})
        );
    }

    #[test]
    fn any_blank_field_is_missing() {
        for form in [
            FormInput::new("", "溫暖", "英文"),
            FormInput::new("text", "  ", "英文"),
            FormInput::new("text", "溫暖", ""),
        ] {
            assert_eq!(form.validate(), Err(ValidationIssue::MissingFields));
        }
    }

    #[test]
    fn paragraph_length_counts_characters() {
        let at_limit = "字".repeat(MAX_PARAGRAPH_CHARS);
        assert!(FormInput::new(at_limit.clone(), "溫暖", "英文").validate().is_ok());
        let over = format!("{at_limit}字");
        assert_eq!(
            FormInput::new(over, "溫暖", "英文").validate(),
            Err(ValidationIssue::ParagraphTooLong)
        );
    }

    #[test]
    fn unknown_choices_are_rejected() {
        assert_eq!(
            FormInput::new("text", "angry", "英文").validate(),
            Err(ValidationIssue::UnknownTone)
        );
        assert_eq!(
            FormInput::new("text", "Humorous", "klingon").validate(),
            Err(ValidationIssue::UnknownLanguage)
        );
    }
}
