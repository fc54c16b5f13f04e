// src/middleware/i18n.rs

use axum::extract::FromRequestParts;
use axum::http::{header, request::Parts, HeaderMap};

use crate::common::i18n::{DEFAULT_LANG, SUPPORTED_LANGS};

// Nosso extrator de idioma: sempre um dos idiomas suportados
#[derive(Debug, Clone)]
pub struct Locale(pub String);

impl Locale {
    pub fn from_headers(headers: &HeaderMap) -> Self {
        let lang = headers
            .get(header::ACCEPT_LANGUAGE)
            .and_then(|header_value| header_value.to_str().ok())
            .and_then(|header_str| {
                // "pt-BR,en;q=0.8" -> ["pt-BR", "en"] -> primeiro suportado, só o prefixo
                accept_language::parse(header_str)
                    .into_iter()
                    .filter_map(|tag| tag.split('-').next().map(str::to_lowercase))
                    .find(|lang| SUPPORTED_LANGS.contains(&lang.as_str()))
            })
            .unwrap_or_else(|| DEFAULT_LANG.to_string());

        Locale(lang)
    }
}

impl<S> FromRequestParts<S> for Locale
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Locale::from_headers(&parts.headers))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn locale(value: &str) -> String {
        let mut headers = HeaderMap::new();
        headers.insert(header::ACCEPT_LANGUAGE, HeaderValue::from_str(value).unwrap());
        Locale::from_headers(&headers).0
    }

    #[test]
    fn picks_the_first_supported_language() {
        assert_eq!(locale("pt-BR,pt;q=0.9"), "pt");
        assert_eq!(locale("fr-FR,pt;q=0.5"), "pt");
        assert_eq!(locale("de"), "en");
        assert_eq!(Locale::from_headers(&HeaderMap::new()).0, "en");
    }
}
