//! User-facing strings. The learner's native language is Japanese, so
//! notices shown in the UI are Japanese; log lines stay English.

pub const GREETING: &str =
    "Hello! I'm your English teacher. How can I help you practice English today?";

pub const REPLY_FAILED: &str = "AI回答の取得中にエラーが発生しました。";
pub const ENRICHMENT_FAILED: &str = "翻訳またはフィードバックの取得中にエラーが発生しました。";
pub const HINT_FAILED: &str = "ヒントの取得中にエラーが発生しました。もう一度お試しください。";
pub const PROVIDER_SWITCH_FAILED: &str = "プロバイダーの切り替え中にエラーが発生しました。";
pub const UNKNOWN_ERROR: &str = "Unknown error";
pub const REPLY_PENDING: &str = "先生の返答を待っています。少々お待ちください。";

pub const TRANSLATION_PLACEHOLDER: &str = "和訳がここに表示されます";
pub const FEEDBACK_PLACEHOLDER: &str = "フィードバックがここに表示されます";

pub fn level_changed(level: &str) -> String {
    format!("レベルが変更されました: TOEIC {level}")
}

pub fn provider_switched(name: &str) -> String {
    format!("AI provider switched to {name}")
}

pub fn provider_rejected(reason: &str) -> String {
    format!("Failed to switch provider: {reason}")
}

pub const MANUAL: &str = "\
Type English and press Enter to talk with your teacher.
Commands:
  /reset                      start a new conversation
  /hint <日本語>              ask how to say something in English
  /level <400|600|800>        change the TOEIC level
  /provider <id>              switch AI provider (anthropic, azure_openai)
  /toggle <translation|feedback>  show or hide a panel
  /theme                      switch light/dark theme
  /help                       show this manual";
