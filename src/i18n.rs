use serde::{Deserialize, Serialize};

/// 报告的目标语言
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Default)]
pub enum TargetLanguage {
    #[serde(rename = "en")]
    #[default]
    English,
    #[serde(rename = "zh")]
    Chinese,
    #[serde(rename = "ja")]
    Japanese,
    #[serde(rename = "ko")]
    Korean,
    #[serde(rename = "de")]
    German,
    #[serde(rename = "fr")]
    French,
    #[serde(rename = "ru")]
    Russian,
}

impl std::fmt::Display for TargetLanguage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TargetLanguage::English => write!(f, "en"),
            TargetLanguage::Chinese => write!(f, "zh"),
            TargetLanguage::Japanese => write!(f, "ja"),
            TargetLanguage::Korean => write!(f, "ko"),
            TargetLanguage::German => write!(f, "de"),
            TargetLanguage::French => write!(f, "fr"),
            TargetLanguage::Russian => write!(f, "ru"),
        }
    }
}

impl std::str::FromStr for TargetLanguage {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "en" | "english" | "英文" => Ok(TargetLanguage::English),
            "zh" | "chinese" | "中文" => Ok(TargetLanguage::Chinese),
            "ja" | "japanese" | "日本語" | "日文" => Ok(TargetLanguage::Japanese),
            "ko" | "korean" | "한국어" | "韩文" => Ok(TargetLanguage::Korean),
            "de" | "german" | "deutsch" | "德文" => Ok(TargetLanguage::German),
            "fr" | "french" | "français" | "法文" => Ok(TargetLanguage::French),
            "ru" | "russian" | "русский" | "俄文" => Ok(TargetLanguage::Russian),
            _ => Err(format!("Unknown target language: {}", s)),
        }
    }
}

impl TargetLanguage {
    /// 获取语言的描述性名称
    pub fn display_name(&self) -> &'static str {
        match self {
            TargetLanguage::English => "English",
            TargetLanguage::Chinese => "中文",
            TargetLanguage::Japanese => "日本語",
            TargetLanguage::Korean => "한국어",
            TargetLanguage::German => "Deutsch",
            TargetLanguage::French => "Français",
            TargetLanguage::Russian => "Русский",
        }
    }

    /// 附加到报告类提示词末尾的语言指令，英文时为空
    pub fn prompt_instruction(&self) -> Option<&'static str> {
        match self {
            TargetLanguage::English => None,
            TargetLanguage::Chinese => Some("请使用中文撰写，保持Markdown标题结构不变。"),
            TargetLanguage::Japanese => {
                Some("日本語で執筆してください。Markdownの見出し構造はそのまま維持してください。")
            }
            TargetLanguage::Korean => {
                Some("한국어로 작성해 주세요. Markdown 제목 구조는 그대로 유지해 주세요.")
            }
            TargetLanguage::German => Some(
                "Bitte schreiben Sie auf Deutsch und behalten Sie die Markdown-Überschriftenstruktur bei.",
            ),
            TargetLanguage::French => Some(
                "Veuillez rédiger en français en conservant la structure des titres Markdown.",
            ),
            TargetLanguage::Russian => Some(
                "Пожалуйста, пишите на русском языке, сохраняя структуру заголовков Markdown.",
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_and_display_round() {
        assert_eq!("中文".parse::<TargetLanguage>().unwrap(), TargetLanguage::Chinese);
        assert_eq!("EN".parse::<TargetLanguage>().unwrap(), TargetLanguage::English);
        assert_eq!(TargetLanguage::Japanese.to_string(), "ja");
        assert!("klingon".parse::<TargetLanguage>().is_err());
    }

    #[test]
    fn test_english_has_no_extra_instruction() {
        assert!(TargetLanguage::default().prompt_instruction().is_none());
        assert!(TargetLanguage::German.prompt_instruction().is_some());
    }
}
