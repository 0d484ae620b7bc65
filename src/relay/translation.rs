//! Translation with pass-through fallback

use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

use crate::core::client::LanguageModel;
use crate::core::config::RelayConfig;
use crate::core::models::TranslationOutcome;

/// Quote pairs some models wrap their answer in
const QUOTE_PAIRS: &[(char, char)] = &[('"', '"'), ('\u{201C}', '\u{201D}'), ('«', '»')];

/// Translates one text into one language, falling back to the original on any failure
#[derive(Clone)]
pub struct TranslationService {
    model: Arc<dyn LanguageModel>,
    config: Arc<RelayConfig>,
    timeout: Duration,
}

impl TranslationService {
    pub fn new(model: Arc<dyn LanguageModel>, config: Arc<RelayConfig>) -> Self {
        let timeout = Duration::from_millis(config.translation.timeout_ms);
        Self {
            model,
            config,
            timeout,
        }
    }

    /// Translate `text` into `target_language`
    ///
    /// Never fails: on error, timeout or a blank answer the outcome carries the
    /// original text with `success` set to false. Blank input is returned as-is
    /// without calling the model. Each call is attempted exactly once.
    pub async fn translate(&self, text: &str, target_language: &str) -> TranslationOutcome {
        if text.trim().is_empty() {
            return TranslationOutcome::translated(text, text);
        }

        let instruction = self.config.render_instruction(target_language);
        let call = self.model.complete(Some(&instruction), text);

        match tokio::time::timeout(self.timeout, call).await {
            Ok(Ok(answer)) => {
                let answer = clean_answer(text, &answer);
                if answer.is_empty() {
                    warn!(language = target_language, "Translation came back empty, using original text");
                    return TranslationOutcome::fallback(text);
                }

                debug!(language = target_language, "Translated {} chars", text.chars().count());
                TranslationOutcome::translated(text, answer)
            }
            Ok(Err(e)) => {
                warn!(language = target_language, "Translation failed: {}, using original text", e);
                TranslationOutcome::fallback(text)
            }
            Err(_) => {
                warn!(
                    language = target_language,
                    "Translation timed out after {:?}, using original text", self.timeout
                );
                TranslationOutcome::fallback(text)
            }
        }
    }
}

/// Trim the answer and drop one pair of wrapping quotes the source did not have
fn clean_answer(source: &str, answer: &str) -> String {
    let answer = answer.trim();
    let source = source.trim();

    for &(open, close) in QUOTE_PAIRS {
        if answer.chars().count() >= 2
            && answer.starts_with(open)
            && answer.ends_with(close)
            && !source.starts_with(open)
        {
            let inner = &answer[open.len_utf8()..answer.len() - close.len_utf8()];
            return inner.trim().to_string();
        }
    }

    answer.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::relay::testing::{test_config, FakeModel};

    fn service(model: FakeModel) -> (TranslationService, Arc<FakeModel>) {
        let model = Arc::new(model);
        let service = TranslationService::new(model.clone(), Arc::new(test_config()));
        (service, model)
    }

    #[tokio::test]
    async fn test_translate_success() {
        let (service, model) = service(FakeModel::new().reply("English", "Hello world"));

        let outcome = service.translate("سلام دنیا", "English").await;

        assert!(outcome.success);
        assert_eq!(outcome.text, "Hello world");
        assert_eq!(outcome.original, "سلام دنیا");

        let calls = model.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].user, "سلام دنیا");
        assert!(calls[0].system.as_deref().unwrap().contains("into English"));
    }

    #[tokio::test]
    async fn test_empty_text_makes_no_call() {
        let (service, model) = service(FakeModel::new());

        let outcome = service.translate("", "English").await;

        assert!(outcome.success);
        assert_eq!(outcome.text, "");
        assert!(model.calls().is_empty());
    }

    #[tokio::test]
    async fn test_failure_falls_back_to_original() {
        let (service, _) = service(FakeModel::new().fail("English"));

        let outcome = service.translate("خبر مهم", "English").await;

        assert!(!outcome.success);
        assert_eq!(outcome.text, "خبر مهم");
        assert_eq!(outcome.effective_text(), "خبر مهم");
    }

    #[tokio::test]
    async fn test_blank_answer_falls_back_to_original() {
        let (service, _) = service(FakeModel::new().reply("English", "  \n"));

        let outcome = service.translate("خبر مهم", "English").await;

        assert!(!outcome.success);
        assert_eq!(outcome.text, "خبر مهم");
    }

    #[tokio::test]
    async fn test_timeout_falls_back_to_original() {
        let mut config = test_config();
        config.translation.timeout_ms = 50;
        let model = Arc::new(FakeModel::new().hang("English"));
        let service = TranslationService::new(model.clone(), Arc::new(config));

        let outcome = service.translate("خبر مهم", "English").await;

        assert!(!outcome.success);
        assert_eq!(outcome.text, "خبر مهم");
        assert_eq!(model.calls().len(), 1);
    }

    #[test]
    fn test_clean_answer() {
        assert_eq!(clean_answer("سلام", "  \"Hello\" \n"), "Hello");
        assert_eq!(clean_answer("سلام", "«Merhaba»"), "Merhaba");
        assert_eq!(clean_answer("\"نقل قول\"", "\"A quote\""), "\"A quote\"");
        assert_eq!(clean_answer("سلام", "Hello #news @team"), "Hello #news @team");
        assert_eq!(clean_answer("سلام", "\""), "\"");
    }
}
