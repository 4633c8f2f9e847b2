use once_cell::sync::Lazy;
use regex::Regex;

/// How much work a message needs before it can go to the model.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputClass {
    /// Explicit digits, no slang. Safe to send as-is.
    Clean,
    /// Read-only question about existing data.
    Query,
    /// Contains informal money shorthand that needs normalizing.
    Slang,
    /// Correction or deletion of something already recorded.
    Edit,
    /// Anything else. Gets the full treatment.
    Complex,
}

impl InputClass {
    pub fn as_str(&self) -> &'static str {
        match self {
            InputClass::Clean => "clean",
            InputClass::Query => "query",
            InputClass::Slang => "slang",
            InputClass::Edit => "edit",
            InputClass::Complex => "complex",
        }
    }
}

/// Grouped digits (15.000, 1,250,000) or a bare number of 4+ digits.
static EXPLICIT_AMOUNT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b\d{1,3}(?:[.,]\d{3})+\b|\b\d{4,}\b").unwrap());

static CURRENCY_AMOUNT: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)\brp\.?\s*\d").unwrap());

static SLANG_AMOUNT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)\b\d+(?:[.,]\d+)?\s*(?:rb|rebu|ribu|k|jt|juta|jeti)\b|\b(?:ribu|rebu|juta|jeti|cepek|gopek|seceng|noceng|goceng|ceban|noban|goban|cetiao|cetiau|sejuta|serebu|seribu|setengah)\b",
    )
    .unwrap()
});

/// Correction or deletion request. `salah` and `ganti` are everyday words
/// ("ganti oli", "salah jalan") and only count next to a correction cue.
pub(crate) static EDIT_REQUEST: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)\b(?:hapus|hapusin|apus|delete|edit|ubah|koreksi|revisi|ralat|batalin|batalkan|undo)\b|\b(?:salah|ganti)\b.*\b(?:transaksi|catatan|catetan|input|nominal|harusnya|seharusnya|jadi|tadi|terakhir)\b|\b(?:transaksi|catatan|catetan|input|nominal|tadi|terakhir)\b.*\b(?:salah|ganti)\b",
    )
    .unwrap()
});

static QUERY_START: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)^\s*(?:rekap|recap|laporan|list|daftar|cek|check|lihat|liat|target|riwayat|history|histori|berapa|total|sisa|progres|progress)\b",
    )
    .unwrap()
});

static SETUP_START: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)^\s*(?:kewajiban|tagihan|cicilan|setoran|sewa|kontrakan|kos|kost|goal|nabung|menabung|tabungan|impian)\b",
    )
    .unwrap()
});

fn has_explicit_amount(line: &str) -> bool {
    EXPLICIT_AMOUNT.is_match(line) || CURRENCY_AMOUNT.is_match(line)
}

pub fn has_slang(text: &str) -> bool {
    SLANG_AMOUNT.is_match(text)
}

/// Classify a raw message. Pure: the result depends on `text` alone.
///
/// Rules are checked in priority order and the first match wins.
pub fn classify_input(text: &str) -> InputClass {
    let trimmed = text.trim();

    if trimmed.contains('\n') {
        let all_clean = trimmed
            .lines()
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .all(|l| EXPLICIT_AMOUNT.is_match(l) && !has_slang(l));
        return if all_clean {
            InputClass::Clean
        } else {
            InputClass::Complex
        };
    }

    if EDIT_REQUEST.is_match(trimmed) {
        return InputClass::Edit;
    }
    if QUERY_START.is_match(trimmed) {
        return InputClass::Query;
    }

    let slang = has_slang(trimmed);
    if slang {
        return InputClass::Slang;
    }
    // Setup messages skip normalization even without an amount.
    if SETUP_START.is_match(trimmed) {
        return InputClass::Clean;
    }
    if has_explicit_amount(trimmed) {
        return InputClass::Clean;
    }

    InputClass::Complex
}

/// Only messages guaranteed free of slang can skip the normalization pass.
pub fn can_skip_nlu(class: InputClass) -> bool {
    matches!(class, InputClass::Clean | InputClass::Query)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn multi_line_explicit_amounts_are_clean() {
        let text = "orderan 150.000\nbensin 25.000\n\nmakan 20000";
        assert_eq!(classify_input(text), InputClass::Clean);
    }

    #[test]
    fn one_slang_line_makes_multi_line_complex() {
        let text = "orderan 150.000\nbensin 25rb";
        assert_eq!(classify_input(text), InputClass::Complex);
    }

    #[test]
    fn one_line_without_amount_makes_multi_line_complex() {
        let text = "orderan 150.000\nhapus yang tadi";
        assert_eq!(classify_input(text), InputClass::Complex);
    }

    #[test]
    fn edit_keywords_win_over_amounts() {
        assert_eq!(classify_input("salah, harusnya 25.000"), InputClass::Edit);
        assert_eq!(classify_input("hapus transaksi terakhir"), InputClass::Edit);
        assert_eq!(classify_input("ganti jadi 30.000"), InputClass::Edit);
        assert_eq!(classify_input("yang tadi salah"), InputClass::Edit);
    }

    #[test]
    fn everyday_ganti_and_salah_are_expenses() {
        assert_eq!(classify_input("ganti oli 50.000"), InputClass::Clean);
        assert_eq!(classify_input("ganti ban 150.000"), InputClass::Clean);
        assert_eq!(classify_input("salah jalan, bensin 20.000"), InputClass::Clean);
    }

    #[test]
    fn query_keyword_must_lead_the_message() {
        assert_eq!(classify_input("rekap minggu ini"), InputClass::Query);
        assert_eq!(classify_input("cek target hari ini"), InputClass::Query);
        assert_eq!(classify_input("tolong rekap dong"), InputClass::Complex);
    }

    #[test]
    fn slang_amounts() {
        assert_eq!(classify_input("bensin 25rb"), InputClass::Slang);
        assert_eq!(classify_input("dapet 1,5jt hari ini"), InputClass::Slang);
        assert_eq!(classify_input("parkir goceng"), InputClass::Slang);
        assert_eq!(classify_input("makan 20k"), InputClass::Slang);
    }

    #[test]
    fn setup_keyword_is_clean_unless_slang() {
        assert_eq!(classify_input("cicilan motor 900.000 bulanan"), InputClass::Clean);
        assert_eq!(classify_input("nabung buat hp baru"), InputClass::Clean);
        assert_eq!(classify_input("kontrakan 1jt sebulan"), InputClass::Slang);
    }

    #[test]
    fn explicit_amounts_are_clean() {
        assert_eq!(classify_input("orderan Rp 85.000"), InputClass::Clean);
        assert_eq!(classify_input("bensin 30000"), InputClass::Clean);
    }

    #[test]
    fn fallback_is_complex() {
        assert_eq!(classify_input("tadi narik sampe malem capek banget"), InputClass::Complex);
        assert_eq!(classify_input(""), InputClass::Complex);
    }

    #[test]
    fn classification_is_repeatable() {
        let text = "bensin 25rb\nmakan 15.000";
        assert_eq!(classify_input(text), classify_input(text));
    }

    #[test]
    fn skip_nlu_only_for_clean_and_query() {
        assert!(can_skip_nlu(InputClass::Clean));
        assert!(can_skip_nlu(InputClass::Query));
        assert!(!can_skip_nlu(InputClass::Slang));
        assert!(!can_skip_nlu(InputClass::Edit));
        assert!(!can_skip_nlu(InputClass::Complex));
    }
}
