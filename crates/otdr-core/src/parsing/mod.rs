pub mod values;

use regex::Regex;
use std::sync::LazyLock;

use crate::model::{Measurements, SpanLoss, WavelengthSet};
use values::parse_number;

/// A decimal number, optionally with comma thousands separators.
const NUMBER: &str = r"(\d[\d,]*(?:\.\d*)?|\.\d+)";

/// Most span-loss values a report prints after the label.
pub const MAX_LOSS_VALUES: usize = 3;

static SPAN_LENGTH: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(r"(?i)span\s+length\s*\(ft\)\s*[:\-]?\s*{NUMBER}"))
        .expect("span length pattern is valid")
});

// Any whitespace separates the values, so a second value printed on the next
// line still belongs to the label.
static SPAN_LOSS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(
        r"(?i)span\s+loss\s*\(db\)\s*[:\-]?\s*{NUMBER}(?:\s+{NUMBER})?(?:\s+{NUMBER})?"
    ))
    .expect("span loss pattern is valid")
});

/// Extract span length and span loss from the text of one report page.
///
/// Span-loss values are bound to `wavelengths` by position: the first value
/// printed after the label belongs to the first wavelength, and so on. A
/// wavelength label printed in the report is never consulted. Anything not
/// found is `None`; this function does not fail.
pub fn extract(page_text: &str, wavelengths: &WavelengthSet) -> Measurements {
    let span_length_ft = span_length(page_text);
    let tokens = span_loss_tokens(page_text);
    Measurements {
        span_length_ft,
        span_loss: bind_positionally(&tokens, wavelengths),
    }
}

/// First "Span length (ft)" value on the page.
pub fn span_length(text: &str) -> Option<f64> {
    let caps = SPAN_LENGTH.captures(text)?;
    parse_number(caps.get(1)?.as_str())
}

/// Numeric tokens following the first "Span loss (dB)" label, in printed
/// order. Only the first occurrence of the label is considered.
pub fn span_loss_tokens(text: &str) -> Vec<Option<f64>> {
    let Some(caps) = SPAN_LOSS.captures(text) else {
        return Vec::new();
    };
    (1..=MAX_LOSS_VALUES)
        .map_while(|i| caps.get(i))
        .map(|m| {
            let value = parse_number(m.as_str());
            if value.is_none() {
                log::debug!("ignoring unparseable span loss token '{}'", m.as_str());
            }
            value
        })
        .collect()
}

/// Assign the i-th token to the i-th wavelength. Wavelengths without a
/// token get `None`; tokens beyond the number of wavelengths are dropped.
pub fn bind_positionally(tokens: &[Option<f64>], wavelengths: &WavelengthSet) -> Vec<SpanLoss> {
    wavelengths
        .iter()
        .enumerate()
        .map(|(i, wavelength)| SpanLoss {
            wavelength,
            db: tokens.get(i).copied().flatten(),
        })
        .collect()
}
