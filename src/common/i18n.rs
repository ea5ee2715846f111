// src/common/i18n.rs

use std::collections::HashMap;

use anyhow::Context;

// Catálogos embutidos no binário (chave plana -> mensagem com {parametros})
const CATALOGS: &[(&str, &str)] = &[
    ("es", include_str!("../../locales/es.json")),
    ("pt", include_str!("../../locales/pt.json")),
    ("en", include_str!("../../locales/en.json")),
];

#[derive(Debug, Clone)]
pub struct I18nStore {
    catalogs: HashMap<String, HashMap<String, String>>,
    default_lang: String,
}

impl I18nStore {
    pub fn load(default_lang: &str) -> anyhow::Result<Self> {
        let mut catalogs = HashMap::new();
        for (lang, raw) in CATALOGS {
            let entries: HashMap<String, String> = serde_json::from_str(raw)
                .with_context(|| format!("Catálogo de mensagens '{}' inválido", lang))?;
            catalogs.insert(lang.to_string(), entries);
        }

        if !catalogs.contains_key(default_lang) {
            anyhow::bail!("Idioma padrão '{}' não possui catálogo", default_lang);
        }

        Ok(Self {
            catalogs,
            default_lang: default_lang.to_string(),
        })
    }

    pub fn default_lang(&self) -> &str {
        &self.default_lang
    }

    /// Busca a mensagem no idioma pedido, cai para o idioma padrão e, por último, devolve a própria chave.
    pub fn translate(&self, lang: &str, key: &str, params: &[(&str, String)]) -> String {
        let template = self
            .catalogs
            .get(lang)
            .and_then(|c| c.get(key))
            .or_else(|| self.catalogs.get(&self.default_lang).and_then(|c| c.get(key)));

        let Some(template) = template else {
            return key.to_string();
        };

        params.iter().fold(template.clone(), |msg, (name, value)| {
            msg.replace(&format!("{{{}}}", name), value)
        })
    }
}
