//! Raw question → search-ready token set.
//!
//! Support tickets arrive wrapped in greetings and sign-offs; the normalizer
//! peels those off, keeps only searchable tokens, and injects the product
//! keyword into under-specified configuration/error queries. Normalization
//! is idempotent: running it on its own output yields the same token set.

use docanswer_shared::NormalizedQuery;

/// Greeting/closing phrases stripped from the prefix or suffix of a question
/// (exact phrase match, case-insensitive, repeated to fixpoint).
const STOP_PHRASES: &[&str] = &[
    "bom dia",
    "boa tarde",
    "boa noite",
    "olá",
    "ola",
    "oi",
    "att",
    "atenciosamente",
    "cumprimentos",
    "obrigado",
    "obrigada",
    "prezado",
    "prezada",
    "caro",
    "cara",
    "senhor",
    "senhora",
    "saudações",
    "tudo bem",
    "tudo bem?",
    "amigo",
    "amiga",
    "por favor",
    "grato",
    "grata",
    "cordialmente",
    "abraço",
    "abs",
];

/// Domain abbreviations kept even below the minimum token length.
const TECHNICAL_TERMS: &[&str] = &[
    "erp", "sql", "api", "xml", "json", "tss", "nt", "danfe", "nfe", "cte", "mdfe",
];

/// Tokens signalling a configuration/error-report intent; when present
/// without the product keyword, the keyword is appended so search stays
/// anchored to the right product line.
const INTENT_TOKENS: &[&str] = &[
    "erro",
    "erros",
    "falha",
    "rejeição",
    "rejeicao",
    "configurar",
    "configuração",
    "configuracao",
    "parâmetro",
    "parametro",
    "parâmetros",
    "parametros",
];

/// Accented letters preserved during tokenization.
const ACCENTED: &str = "áàâãéèêíïóôõöúçñ";

/// Minimum token length; shorter tokens are dropped unless allowlisted.
const MIN_TOKEN_LEN: usize = 3;

/// Whether a token is on the technical-term allowlist.
pub fn is_technical_term(token: &str) -> bool {
    TECHNICAL_TERMS.contains(&token)
}

/// Normalize a raw question into an ordered token set.
///
/// An empty or whitespace-only input (or one consisting entirely of
/// greetings) yields an empty query; the driver must treat that as
/// "could not process" and skip retrieval.
pub fn normalize(raw: &str, product_keyword: &str) -> NormalizedQuery {
    // Dropping a short trailing token can expose a greeting at the new
    // suffix ("emitir obrigado x" → "emitir obrigado"), so the pass runs to
    // fixpoint; that is what makes normalization idempotent.
    let mut tokens = normalize_once(&raw.trim().to_lowercase());
    loop {
        let again = normalize_once(&tokens.join(" "));
        if again == tokens {
            break;
        }
        tokens = again;
    }

    let mut query = NormalizedQuery::new(tokens);

    // Configuration/error questions without a product mention search poorly;
    // anchor them to the configured product line.
    let product = product_keyword.to_lowercase();
    if !query.is_empty()
        && !product.is_empty()
        && !query.contains(&product)
        && query.tokens().iter().any(|t| INTENT_TOKENS.contains(&t.as_str()))
    {
        query.push_unique(product);
    }

    query
}

/// One pass of greeting stripping, charset filtering, and tokenization.
fn normalize_once(text: &str) -> Vec<String> {
    if text.is_empty() {
        return Vec::new();
    }

    let text = strip_stop_phrases(text);
    let text = keep_searchable_chars(&text);

    text.split_whitespace()
        .filter(|t| t.chars().count() >= MIN_TOKEN_LEN || is_technical_term(t))
        .map(str::to_string)
        .collect()
}

/// Strip greeting/closing phrases from the prefix and suffix, repeatedly,
/// until no phrase matches.
fn strip_stop_phrases(text: &str) -> String {
    let mut current = text.trim().to_string();

    loop {
        let mut changed = false;
        for phrase in STOP_PHRASES {
            if let Some(rest) = current.strip_prefix(phrase) {
                current = rest.trim().to_string();
                changed = true;
            }
            if let Some(rest) = current.strip_suffix(phrase) {
                current = rest.trim().to_string();
                changed = true;
            }
        }
        if !changed || current.is_empty() {
            return current;
        }
    }
}

/// Replace every character outside the searchable set (ASCII alphanumerics,
/// the accented-letter allowlist, and hyphens) with a space.
fn keep_searchable_chars(text: &str) -> String {
    text.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || ACCENTED.contains(c) {
                c
            } else {
                ' '
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn norm(raw: &str) -> NormalizedQuery {
        normalize(raw, "Protheus")
    }

    #[test]
    fn keeps_technical_and_long_tokens() {
        let q = norm("erro ao gerar danfe");
        assert_eq!(q.tokens(), ["erro", "gerar", "danfe", "protheus"]);
    }

    #[test]
    fn drops_short_non_technical_tokens() {
        let q = norm("o nt da nf");
        // "nt" survives via the allowlist; "o", "da", "nf" do not.
        assert_eq!(q.tokens(), ["nt"]);
    }

    #[test]
    fn strips_greetings_from_both_ends() {
        let q = norm("Bom dia, como emitir boleto? Obrigado");
        assert!(!q.contains("bom"));
        assert!(!q.contains("dia"));
        assert!(!q.contains("obrigado"));
        assert!(q.contains("emitir"));
        assert!(q.contains("boleto"));
    }

    #[test]
    fn empty_input_yields_empty_query() {
        assert!(norm("").is_empty());
        assert!(norm("   \t  ").is_empty());
        assert!(norm("bom dia").is_empty());
    }

    #[test]
    fn normalization_is_idempotent() {
        for raw in [
            "Olá, erro ao gerar DANFE no faturamento!",
            "como configurar parâmetros do financeiro",
            "NT 2023.004 rejeição 999",
            // Dropping "x" exposes "obrigado" at the suffix; the fixpoint
            // loop must strip it in the first call already.
            "emitir nota obrigado x",
        ] {
            let once = norm(raw);
            let twice = normalize(&once.to_string(), "Protheus");
            assert_eq!(once, twice, "not idempotent for {raw:?}");
        }
    }

    #[test]
    fn preserves_accented_tokens() {
        let q = norm("rejeição na emissão");
        assert!(q.contains("rejeição"));
        assert!(q.contains("emissão"));
    }

    #[test]
    fn product_keyword_appended_on_error_intent() {
        let q = norm("erro ao faturar pedido");
        assert!(q.contains("protheus"));
    }

    #[test]
    fn product_keyword_not_duplicated() {
        let q = norm("erro no Protheus ao faturar");
        let count = q.tokens().iter().filter(|t| *t == "protheus").count();
        assert_eq!(count, 1);
    }

    #[test]
    fn product_keyword_not_added_without_intent() {
        let q = norm("como emitir boleto bancário");
        assert!(!q.contains("protheus"));
    }

    #[test]
    fn punctuation_becomes_spaces() {
        let q = norm("faturamento/estoque: erro (MATA410)");
        assert!(q.contains("faturamento"));
        assert!(q.contains("estoque"));
        assert!(q.contains("mata410"));
    }
}
