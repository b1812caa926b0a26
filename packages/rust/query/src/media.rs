//! Detection of questions that only reference screenshots, videos, or
//! attachments.
//!
//! These run against the raw text (not the normalized token set) because the
//! patterns must match as whole words anywhere in the sentence, before any
//! token filtering happens. A match short-circuits the pipeline: there is
//! nothing to look up in the documentation for "see the attached video".

use std::sync::LazyLock;

use regex::Regex;

static MEDIA_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?x)
        \b(
            anexos?
          | anexad[oa]s?
          | v[íi]deos?
          | grava[çc][ãa]o
          | grava[çc][õo]es
          | prints?
          | imagem
          | imagens
          | screenshots?
        )\b",
    )
    .expect("valid regex")
});

/// Whether the raw question merely references an attachment, video, or
/// screenshot instead of describing the problem in text.
pub fn references_media(raw: &str) -> bool {
    MEDIA_RE.is_match(&raw.to_lowercase())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn matches_print_reference() {
        assert!(references_media("me manda um print da tela de erro"));
    }

    #[test]
    fn matches_attachment_variants() {
        assert!(references_media("Segue anexo o arquivo"));
        assert!(references_media("conforme anexado no chamado"));
        assert!(references_media("os anexos estão no e-mail"));
    }

    #[test]
    fn matches_video_with_and_without_accent() {
        assert!(references_media("gravei um vídeo do problema"));
        assert!(references_media("gravei um video do problema"));
        assert!(references_media("segue a gravação da tela"));
    }

    #[test]
    fn ignores_plain_technical_questions() {
        assert!(!references_media("erro ao gerar danfe"));
        assert!(!references_media("como configurar parâmetros do financeiro"));
    }

    #[test]
    fn requires_whole_word_match() {
        // "imprimir" contains no whole-word media term.
        assert!(!references_media("como imprimir o boleto"));
    }
}
