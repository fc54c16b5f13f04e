// src/common/i18n.rs

use std::collections::HashMap;

pub const DEFAULT_LANG: &str = "en";
pub const SUPPORTED_LANGS: [&str; 2] = ["en", "pt"];

// (chave, inglês, português)
const MESSAGES: &[(&str, &str, &str)] = &[
    ("validation.invalid_fields", "One or more fields are invalid.", "Um ou mais campos são inválidos."),
    ("required", "This field is required.", "Campo obrigatório."),
    ("invalid_email", "The e-mail is invalid.", "O e-mail fornecido é inválido."),
    ("password_too_short", "The password must have at least 6 characters.", "A senha deve ter no mínimo 6 caracteres."),
    ("image_required", "Please upload an image before submitting!", "Envie uma imagem antes de salvar!"),
    ("birth_date_required", "Please select a valid birth date.", "Selecione uma data de nascimento válida."),
    ("invalid_stock", "Please enter a valid number for stock!", "Informe um número válido para o estoque!"),
    ("invalid_target", "The target must be a number.", "A meta deve ser um número."),
    ("validation.image_required", "Please upload an image before submitting!", "Envie uma imagem antes de salvar!"),
    ("validation.missing_file", "No file was sent.", "Nenhum arquivo foi enviado."),
    ("validation.invalid_range", "Unknown time range.", "Período desconhecido."),
    ("auth.email_exists", "This e-mail is already in use.", "Este e-mail já está em uso."),
    ("auth.invalid_credentials", "Invalid e-mail or password.", "E-mail ou senha inválidos."),
    ("auth.requires_recent_login", "You need to log in again to delete your account.", "Faça login novamente para excluir sua conta."),
    ("auth.not_admin", "Sorry, only administrators can access the dashboard.", "Apenas administradores podem acessar o painel."),
    ("auth.invalid_token", "Invalid or missing authentication token.", "Token de autenticação inválido ou ausente."),
    ("auth.user_not_found", "User not found.", "Usuário não encontrado."),
    ("store.not_found", "The requested record does not exist.", "O registro solicitado não existe."),
    ("store.timeout", "The data source took too long to answer.", "A fonte de dados demorou demais para responder."),
    ("upload.failed", "Image upload failed. Please try again.", "Falha no upload da imagem. Tente novamente."),
    ("generic.unexpected", "An unexpected error occurred.", "Ocorreu um erro inesperado."),
];

/// Catálogo de mensagens públicas por idioma.
pub struct I18nStore {
    messages: HashMap<&'static str, (&'static str, &'static str)>,
}

impl I18nStore {
    pub fn new() -> Self {
        let messages = MESSAGES
            .iter()
            .map(|(key, en, pt)| (*key, (*en, *pt)))
            .collect();
        Self { messages }
    }

    /// Chaves desconhecidas voltam como estão, para não esconder mensagens do `validator`.
    pub fn translate(&self, lang: &str, key: &str) -> String {
        match self.messages.get(key) {
            Some((_, pt)) if lang == "pt" => (*pt).to_string(),
            Some((en, _)) => (*en).to_string(),
            None => key.to_string(),
        }
    }
}

impl Default for I18nStore {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn falls_back_to_english_and_raw_keys() {
        let store = I18nStore::new();
        assert_eq!(store.translate("pt", "auth.not_admin"), "Apenas administradores podem acessar o painel.");
        assert_eq!(store.translate("fr", "auth.user_not_found"), "User not found.");
        assert_eq!(store.translate("en", "something.custom"), "something.custom");
    }
}
