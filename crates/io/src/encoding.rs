// Character encoding detection for delimited text

use encoding_rs::{Encoding, UTF_8};

/// Detected text encoding. Copyable so one detection result can be threaded
/// through both the raw load and the header-aware reload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EncodingLabel(&'static Encoding);

impl EncodingLabel {
    pub const DEFAULT: EncodingLabel = EncodingLabel(UTF_8);

    pub fn for_label(label: &str) -> Option<Self> {
        Encoding::for_label(label.as_bytes()).map(EncodingLabel)
    }

    /// WHATWG name, e.g. "UTF-8", "windows-1252", "Shift_JIS"
    pub fn name(&self) -> &'static str {
        self.0.name()
    }

    /// Decode the whole buffer. A leading BOM is honoured and stripped;
    /// malformed sequences become U+FFFD.
    pub fn decode(&self, bytes: &[u8]) -> String {
        let (text, actual, had_errors) = self.0.decode(bytes);
        if actual != self.0 {
            log::debug!("BOM overrides {} with {}", self.0.name(), actual.name());
        }
        if had_errors {
            log::warn!("malformed {} sequences replaced while decoding", actual.name());
        }
        text.into_owned()
    }
}

impl Default for EncodingLabel {
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl std::fmt::Display for EncodingLabel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Guess the encoding of a text payload.
///
/// Empty input, BOM, then strict UTF-8, then a statistical guess over the
/// entire buffer. Falls back to UTF-8 when nothing better is known.
pub fn detect(bytes: &[u8]) -> EncodingLabel {
    if bytes.is_empty() {
        return EncodingLabel::DEFAULT;
    }

    if let Some((encoding, _)) = Encoding::for_bom(bytes) {
        log::debug!("encoding from BOM: {}", encoding.name());
        return EncodingLabel(encoding);
    }

    if std::str::from_utf8(bytes).is_ok() {
        return EncodingLabel::DEFAULT;
    }

    let mut detector = chardetng::EncodingDetector::new();
    detector.feed(bytes, true);
    let guess = detector.guess(None, true);
    log::debug!("encoding guessed from content: {}", guess.name());
    EncodingLabel(guess)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_defaults_to_utf8() {
        assert_eq!(detect(b""), EncodingLabel::DEFAULT);
        assert_eq!(detect(b"").name(), "UTF-8");
    }

    #[test]
    fn test_ascii_and_utf8() {
        assert_eq!(detect(b"A,B\n1,2\n").name(), "UTF-8");
        assert_eq!(detect("Straße,Köln\n".as_bytes()).name(), "UTF-8");
    }

    #[test]
    fn test_bom_wins() {
        let mut bytes = vec![0xFF, 0xFE];
        for unit in "A,B\n".encode_utf16() {
            bytes.extend_from_slice(&unit.to_le_bytes());
        }
        let label = detect(&bytes);
        assert_eq!(label.name(), "UTF-16LE");
        assert_eq!(label.decode(&bytes), "A,B\n");
    }

    #[test]
    fn test_latin_text_is_not_utf8() {
        // "Café,Crème brûlée\nNaïve,Déjà vu\n" encoded as windows-1252
        let (bytes, _, _) = encoding_rs::WINDOWS_1252
            .encode("Nom,Adresse\nCafé,Crème brûlée\nNaïve,Déjà vu à la française\n");
        let label = detect(&bytes);
        assert_ne!(label.name(), "UTF-8");
        assert!(label.decode(&bytes).contains("Crème brûlée"));
    }

    #[test]
    fn test_for_label() {
        assert_eq!(EncodingLabel::for_label("latin1").unwrap().name(), "windows-1252");
        assert!(EncodingLabel::for_label("no-such-encoding").is_none());
    }
}
