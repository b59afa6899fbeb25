// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Jonathan D. A. Jewell <hyperpolymath>

//! User-facing notices in English and Chinese

use serde::{Deserialize, Serialize};

use crate::organizer::Step;
use crate::NotewiseError;

/// Display language, carried in [`crate::AppConfig`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    #[default]
    En,
    Zh,
}

impl Language {
    /// Pick a language from a POSIX locale string such as `zh_CN.UTF-8`
    pub fn from_locale(locale: &str) -> Self {
        if locale.to_lowercase().starts_with("zh") {
            Language::Zh
        } else {
            Language::En
        }
    }

    /// Language of the current environment (`LC_ALL`, then `LANG`)
    pub fn detect() -> Self {
        std::env::var("LC_ALL")
            .or_else(|_| std::env::var("LANG"))
            .map(|l| Self::from_locale(&l))
            .unwrap_or_default()
    }
}

/// Messages shown to the user after an organization attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    ApiKeyMissing,
    WaitingForModel,
    Organized { path: String },
    NothingToDo,
    Step(Step),
    Failed { error: String },
    StoppedAfter { completed: usize },
}

impl Notice {
    pub fn from_error(error: &NotewiseError) -> Self {
        Notice::Failed { error: error.to_string() }
    }

    pub fn render(&self, lang: Language) -> String {
        match (self, lang) {
            (Notice::ApiKeyMissing, Language::En) => {
                "Please configure an API key for the selected provider".to_string()
            }
            (Notice::ApiKeyMissing, Language::Zh) => "请先为所选服务商配置 API 密钥".to_string(),

            (Notice::WaitingForModel, Language::En) => "Asking the model for suggestions...".to_string(),
            (Notice::WaitingForModel, Language::Zh) => "正在等待模型的建议……".to_string(),

            (Notice::Organized { path }, Language::En) => format!("Note organized: {}", path),
            (Notice::Organized { path }, Language::Zh) => format!("笔记已整理：{}", path),

            (Notice::NothingToDo, Language::En) => "Note already matches the suggestion".to_string(),
            (Notice::NothingToDo, Language::Zh) => "笔记已符合建议，无需更改".to_string(),

            (Notice::Step(Step::Renamed { from, to }), Language::En) => format!("Renamed {} -> {}", from, to),
            (Notice::Step(Step::Renamed { from, to }), Language::Zh) => format!("已重命名 {} -> {}", from, to),
            (Notice::Step(Step::Moved { from, to }), Language::En) => format!("Moved {} -> {}", from, to),
            (Notice::Step(Step::Moved { from, to }), Language::Zh) => format!("已移动 {} -> {}", from, to),
            (Notice::Step(Step::TagsMerged { added }), Language::En) => {
                format!("Added tags: {}", added.join(", "))
            }
            (Notice::Step(Step::TagsMerged { added }), Language::Zh) => {
                format!("已添加标签：{}", added.join("、"))
            }

            (Notice::Failed { error }, Language::En) => format!("Organization failed: {}", error),
            (Notice::Failed { error }, Language::Zh) => format!("整理失败：{}", error),

            (Notice::StoppedAfter { completed }, Language::En) => {
                format!("Stopped after {} completed step(s); completed steps were kept", completed)
            }
            (Notice::StoppedAfter { completed }, Language::Zh) => {
                format!("已完成 {} 个步骤后停止，已完成的更改已保留", completed)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_locale() {
        assert_eq!(Language::from_locale("zh_CN.UTF-8"), Language::Zh);
        assert_eq!(Language::from_locale("en_US.UTF-8"), Language::En);
        assert_eq!(Language::from_locale("C"), Language::En);
    }

    #[test]
    fn test_render_follows_language() {
        let notice = Notice::Organized { path: "A/B.md".to_string() };
        assert_eq!(notice.render(Language::En), "Note organized: A/B.md");
        assert_eq!(notice.render(Language::Zh), "笔记已整理：A/B.md");
    }

    #[test]
    fn test_language_serde() {
        let lang: Language = serde_json::from_str("\"zh\"").unwrap();
        assert_eq!(lang, Language::Zh);
        assert_eq!(serde_json::to_string(&Language::En).unwrap(), "\"en\"");
    }
}
