use fluent_bundle::concurrent::FluentBundle;
use fluent_bundle::{FluentArgs, FluentResource};
use std::collections::HashMap;
use std::sync::RwLock;
use tracing::{debug, warn};
use unic_langid::LanguageIdentifier;

/// Internationalization service using Fluent (thread-safe)
pub struct I18n {
    bundles: RwLock<HashMap<String, FluentBundle<FluentResource>>>,
    default_locale: String,
}

impl I18n {
    /// Create a new i18n service with embedded English and Korean translations
    pub fn new() -> Self {
        let i18n = Self {
            bundles: RwLock::new(HashMap::new()),
            default_locale: "en".to_string(),
        };

        i18n.load_embedded_locales();

        i18n
    }

    /// Add a locale with translations
    pub fn add_locale(&self, locale: &str, content: &str) -> Result<(), String> {
        let lang_id: LanguageIdentifier = locale
            .parse()
            .map_err(|e| format!("Invalid locale '{}': {}", locale, e))?;

        let resource = FluentResource::try_new(content.to_string())
            .map_err(|(_, errors)| format!("Failed to parse Fluent resource: {:?}", errors))?;

        let mut bundle = FluentBundle::new_concurrent(vec![lang_id]);
        bundle
            .add_resource(resource)
            .map_err(|errors| format!("Failed to add resource to bundle: {:?}", errors))?;

        let mut bundles = self.bundles.write().unwrap();
        bundles.insert(locale.to_string(), bundle);

        debug!(locale = %locale, "Loaded translations");

        Ok(())
    }

    /// Get a translated message
    pub fn get(&self, locale: &str, key: &str, args: Option<&FluentArgs>) -> String {
        // Try requested locale, fall back to default, fall back to key
        self.try_get(locale, key, args)
            .or_else(|| self.try_get(&self.default_locale, key, args))
            .unwrap_or_else(|| key.to_string())
    }

    /// Try to get a translation from a specific locale
    fn try_get(&self, locale: &str, key: &str, args: Option<&FluentArgs>) -> Option<String> {
        let bundles = self.bundles.read().unwrap();
        let bundle = bundles.get(locale)?;
        let message = bundle.get_message(key)?;
        let pattern = message.value()?;

        let mut errors = vec![];
        let result = bundle.format_pattern(pattern, args, &mut errors);

        if !errors.is_empty() {
            warn!(key = %key, errors = ?errors, "Fluent formatting errors");
        }

        Some(result.to_string())
    }

    /// Get a translated message with arguments
    pub fn format(&self, locale: &str, key: &str, args: &[(&str, &str)]) -> String {
        let mut fluent_args = FluentArgs::new();
        for (k, v) in args {
            fluent_args.set(*k, *v);
        }
        self.get(locale, key, Some(&fluent_args))
    }

    /// Load embedded translations
    fn load_embedded_locales(&self) {
        let en_translations = r#"
# Docent Service - English Translations

# Errors
error-document-not-found = Document not found: { $id }
error-document-not-ready = The document has not finished processing yet. Please try again shortly.
error-document-empty = No text could be extracted from the document.
error-empty-message = Please enter a message.
error-message-too-long = Your message is too long. Please keep it under { $max } characters.
error-unknown-expert-mode = Unsupported expert mode: { $mode }
error-completion-auth = Authentication failed. Please check the API key.
error-completion-rate-limit = Request limit exceeded. Please try again shortly.
error-completion-timeout = The request timed out. Please try again.
error-not-configured = The service is not configured correctly. Please contact an administrator.
error-internal = Sorry, the service is currently having problems. Please try again shortly.

# Documents
doc-upload-success = PDF uploaded successfully.
doc-upload-duplicate = This PDF has already been uploaded.
doc-delete-success = PDF document deleted successfully.
doc-summary-missing = No summary has been generated for this document.

# Health
health-status-healthy = Docent service is running
health-status-degraded = Service is degraded: { $reason }
"#;

        let ko_translations = r#"
# Docent Service - Korean Translations

# Errors
error-document-not-found = PDF 문서를 찾을 수 없습니다: { $id }
error-document-not-ready = PDF 처리가 완료되지 않았습니다. 잠시 후 다시 시도해주세요.
error-document-empty = PDF에서 텍스트를 추출할 수 없습니다.
error-empty-message = 메시지를 입력해주세요.
error-message-too-long = 메시지가 너무 깁니다. { $max }자 이내로 입력해주세요.
error-unknown-expert-mode = 지원하지 않는 전문가 모드입니다: { $mode }
error-completion-auth = 인증에 실패했습니다. API 키를 확인해주세요.
error-completion-rate-limit = 요청 한도를 초과했습니다. 잠시 후 다시 시도해주세요.
error-completion-timeout = 요청 시간이 초과되었습니다. 다시 시도해주세요.
error-not-configured = 서비스 설정에 문제가 있습니다. 관리자에게 문의해주세요.
error-internal = 죄송합니다. 현재 서비스에 문제가 있습니다. 잠시 후 다시 시도해주세요.

# Documents
doc-upload-success = PDF 파일이 성공적으로 업로드되었습니다.
doc-upload-duplicate = 이미 업로드된 PDF 파일입니다.
doc-delete-success = PDF 문서가 성공적으로 삭제되었습니다.
doc-summary-missing = PDF 요약이 생성되지 않았습니다.

# Health
health-status-healthy = Docent 서비스가 실행 중입니다
health-status-degraded = 서비스가 저하되었습니다: { $reason }
"#;

        if let Err(e) = self.add_locale("en", en_translations) {
            warn!(error = %e, "Failed to load embedded English translations");
        }
        if let Err(e) = self.add_locale("ko", ko_translations) {
            warn!(error = %e, "Failed to load embedded Korean translations");
        }
    }
}

impl Default for I18n {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_message() {
        let i18n = I18n::new();

        let msg = i18n.get("en", "error-empty-message", None);
        assert_eq!(msg, "Please enter a message.");
    }

    #[test]
    fn test_format_message() {
        let i18n = I18n::new();

        let msg = i18n.format("en", "error-message-too-long", &[("max", "1000")]);
        // Fluent adds Unicode bidi isolation characters around variables
        // U+2068 (First Strong Isolate) and U+2069 (Pop Directional Isolate)
        assert_eq!(
            msg,
            "Your message is too long. Please keep it under \u{2068}1000\u{2069} characters."
        );
    }

    #[test]
    fn test_korean_locale() {
        let i18n = I18n::new();

        let msg = i18n.get("ko", "error-empty-message", None);
        assert_eq!(msg, "메시지를 입력해주세요.");
    }

    #[test]
    fn test_fallback_to_key() {
        let i18n = I18n::new();

        let msg = i18n.get("en", "nonexistent-key", None);
        assert_eq!(msg, "nonexistent-key");
    }

    #[test]
    fn test_fallback_to_default_locale() {
        let i18n = I18n::new();

        // Request French (not loaded), should fall back to English
        let msg = i18n.get("fr", "error-empty-message", None);
        assert_eq!(msg, "Please enter a message.");
    }
}
