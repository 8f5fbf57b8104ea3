mod printf;
mod template;

pub use printf::format_scalar;
pub use template::{Directives, expand};

use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

/// Longest string [`format_number`] produces, in bytes.
pub const MAX_NUMBER_LEN: usize = 9;

/// Largest rendered line, counting a terminator.
pub const OUTPUT_LIMIT: usize = 256;

const KIB: f64 = 1024.0;
const MIB: f64 = KIB * 1024.0;
const GIB: f64 = MIB * 1024.0;
const TIB: f64 = GIB * 1024.0;
const PIB: f64 = TIB * 1024.0;
const EIB: f64 = PIB * 1024.0;

#[derive(Clone, Copy, Debug)]
enum Notation {
    Fixed { decimals: usize, suffix: &'static str },
    Scientific,
}

#[derive(Clone, Copy, Debug)]
struct Tier {
    threshold: f64,
    divisor: f64,
    notation: Notation,
}

const fn fixed(threshold: f64, divisor: f64, decimals: usize, suffix: &'static str) -> Tier {
    Tier {
        threshold,
        divisor,
        notation: Notation::Fixed { decimals, suffix },
    }
}

// Each unit has a one-decimal tier and a zero-decimal tier starting at ten
// units, which keeps the output at most four digits wide.
const TIERS: [Tier; 13] = [
    fixed(0.0, 1.0, 1, ""),
    fixed(10.0, 1.0, 0, ""),
    fixed(KIB, KIB, 1, "K"),
    fixed(KIB * 10.0, KIB, 0, "K"),
    fixed(MIB, MIB, 1, "M"),
    fixed(MIB * 10.0, MIB, 0, "M"),
    fixed(GIB, GIB, 1, "G"),
    fixed(GIB * 10.0, GIB, 0, "G"),
    fixed(TIB, TIB, 1, "T"),
    fixed(TIB * 10.0, TIB, 0, "T"),
    fixed(PIB, PIB, 1, "P"),
    fixed(PIB * 10.0, PIB, 0, "P"),
    Tier {
        threshold: EIB * 1024.0,
        divisor: 1.0,
        notation: Notation::Scientific,
    },
];

/// Formats a magnitude with a binary unit suffix, e.g. `3.4K` or `120M`.
///
/// The tier is found by scanning the table in order: a tier is used as soon
/// as the next tier's threshold exceeds the value. The result is never longer
/// than [`MAX_NUMBER_LEN`] bytes.
pub fn format_number(value: f64) -> String {
    let last = TIERS.len() - 1;
    let index = (0..TIERS.len())
        .find(|&i| i == last || TIERS[i + 1].threshold > value)
        .unwrap_or(last);
    let tier = TIERS[index];
    let scaled = value / tier.divisor;

    let mut out = match tier.notation {
        Notation::Fixed { decimals, suffix } => format!("{scaled:.decimals$}{suffix}"),
        Notation::Scientific => scientific(scaled),
    };
    out.truncate(MAX_NUMBER_LEN);
    out
}

/// `%.2e` with a signed, two-digit exponent (`1.50e+21`).
fn scientific(value: f64) -> String {
    let raw = format!("{value:.2e}");
    let Some((mantissa, exponent)) = raw.split_once('e') else {
        return raw;
    };
    match exponent.parse::<i32>() {
        Ok(exp) => {
            let sign = if exp < 0 { '-' } else { '+' };
            format!("{mantissa}e{sign}{:02}", exp.unsigned_abs())
        }
        Err(_) => raw,
    }
}

/// Formats a ratio already expressed in percent, one decimal, no scaling.
pub fn format_percent(value: f64) -> String {
    let mut out = format!("{value:.1}");
    out.truncate(MAX_NUMBER_LEN);
    out
}

/// Shortens `s` to at most `maxsize - 1` bytes, the way a C buffer of
/// `maxsize` holds it, without splitting a character.
pub fn truncate_to_limit(s: &mut String, maxsize: usize) {
    let limit = maxsize.saturating_sub(1);
    if s.len() <= limit {
        return;
    }
    let cut = (0..=limit).rev().find(|&i| s.is_char_boundary(i)).unwrap_or(0);
    s.truncate(cut);
}

/// Cuts `s` to at most `max_width` terminal columns, marking the cut with an
/// ellipsis.
pub fn truncate_unicode(s: &str, max_width: usize) -> String {
    if s.width() <= max_width {
        return s.to_string();
    }
    let mut result = String::new();
    let mut width = 0;
    for ch in s.chars() {
        let ch_width = ch.width().unwrap_or(0);
        if width + ch_width > max_width.saturating_sub(1) {
            result.push('\u{2026}');
            break;
        }
        result.push(ch);
        width += ch_width;
    }
    result
}
