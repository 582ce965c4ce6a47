//! The phone number canonicalizer.
//!
//! Takes loosely-formatted Japanese numbers (arbitrary dashes and spaces,
//! optional leading zero, optional `81` country code in any of its textual
//! renderings) to the single canonical shape
//! `+81 <area/mobile>-<4 digits>-<4 digits>`.
//!
//! The rewrite runs in fixed stages, each gated by a full-string shape
//! match:
//!
//! 1. strip separators, and the country code if present, down to bare digits
//! 2. restore the single leading zero
//! 3. hyphenate: mobile/IP numbers (`070/080/090/050`) at fixed offsets,
//!    everything else through the area-code waterfall
//! 4. swap the leading zero for the `+81 ` prefix
//!
//! The waterfall tests the leading digits against the [`CodeTable`] buckets
//! longest first, because a short code is always a prefix of some longer
//! code's digit space and matching short-first would split too early.
//!
//! A value that matches no shape at any stage is returned as-is: formatting
//! may fail, data is never lost.

use std::sync::OnceLock;

use regex::Regex;

use crate::codes::CodeTable;

/// A domestic-shape number body: an optional leading zero, an area or
/// mobile/IP code, and the subscriber digits, with a dash or space allowed
/// at the code boundary, mid-split, and before the last four digits.
const SEPARATED_BODY: &str = r"(?:0?(?:[1-9][-\s]?[1-9]\d{3}|[1-9]{2}[-\s]?\d{3}|[1-9]{2}\d[-\s]?\d{2}|[1-9]{2}\d{2}[-\s]?\d)[-\s]?\d{4}|0?[5789]0[-\s]?\d{4}[-\s]?\d{4})";

/// Any textual rendering of the `81` country code: `81`, `+81`, `(81)`,
/// `(+81)`, with optional internal spacing and a trailing dash.
const COUNTRY_PREFIX: &str = r"\+?\s*\(?\+?81\)?\s*-?";

/// Shape 1: domestic, separators allowed, leading zero optional.
fn domestic_regex() -> &'static Regex {
    static REGEX: OnceLock<Regex> = OnceLock::new();
    REGEX.get_or_init(|| Regex::new(&format!("^{SEPARATED_BODY}$")).unwrap())
}

/// Shape 2: same digit shapes as shape 1 behind a country-code rendering.
fn country_code_regex() -> &'static Regex {
    static REGEX: OnceLock<Regex> = OnceLock::new();
    REGEX.get_or_init(|| Regex::new(&format!("^{COUNTRY_PREFIX}{SEPARATED_BODY}$")).unwrap())
}

fn country_prefix_regex() -> &'static Regex {
    static REGEX: OnceLock<Regex> = OnceLock::new();
    REGEX.get_or_init(|| Regex::new(&format!("^{COUNTRY_PREFIX}")).unwrap())
}

/// Shape 3: bare digits with the leading zero still missing, safe to
/// re-zero. Zeroless landlines are nine digits starting with two non-zero
/// digits; zeroless mobile/IP numbers are ten.
fn bare_no_zero_regex() -> &'static Regex {
    static REGEX: OnceLock<Regex> = OnceLock::new();
    REGEX.get_or_init(|| Regex::new(r"^(?:[1-9]{2}\d{7}|[5789]0\d{8})$").unwrap())
}

/// Shape 4: mobile/IP, zeroed, no separators. The fixed-width fast path.
fn mobile_zeroed_regex() -> &'static Regex {
    static REGEX: OnceLock<Regex> = OnceLock::new();
    REGEX.get_or_init(|| Regex::new(r"^0[5789]0\d{8}$").unwrap())
}

/// Shape 5: domestic, zeroed, no separators. The waterfall gate.
fn domestic_zeroed_regex() -> &'static Regex {
    static REGEX: OnceLock<Regex> = OnceLock::new();
    REGEX.get_or_init(|| Regex::new(r"^(?:0[1-9]{2}\d{7}|0[5789]0\d{8})$").unwrap())
}

/// Shape 6: domestic, zeroed, dashes optional. The final gate before the
/// international prefix goes on; the alternation pins where the dashes may
/// sit for each code length.
fn dashed_zeroed_regex() -> &'static Regex {
    static REGEX: OnceLock<Regex> = OnceLock::new();
    REGEX.get_or_init(|| {
        Regex::new(
            r"(?x)
            ^(?:
                0(?:
                    [1-9]-?[1-9]\d{3}
                    |[1-9]{2}-?\d{3}
                    |[1-9]{2}\d-?\d{2}
                    |[1-9]{2}\d{2}-?\d
                )-?\d{4}
                |0[5789]0-?\d{4}-?\d{4}
            )$",
        )
        .unwrap()
    })
}

fn canonical_regex() -> &'static Regex {
    static REGEX: OnceLock<Regex> = OnceLock::new();
    REGEX.get_or_init(|| {
        Regex::new(
            r"(?x)
            ^\+81\x20(?:
                (?:
                    [1-9]-[1-9]\d{3}
                    |[1-9]{2}-\d{3}
                    |[1-9]{2}\d-\d{2}
                    |[1-9]{2}\d{2}-\d
                )-\d{4}
                |[5789]0-\d{4}-\d{4}
            )$",
        )
        .unwrap()
    })
}

/// The shape a value is known to have as it moves through the pipeline.
///
/// Each stage states what it consumes in the type instead of re-probing an
/// untyped string: `Bare` is digits only with the zero state unknown,
/// `Zeroed` is digits only with exactly one leading zero (shape 5 holds),
/// `Split` carries hyphens at the code boundary.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Number {
    Bare(String),
    Zeroed(String),
    Split(String),
}

impl Number {
    fn into_inner(self) -> String {
        match self {
            Number::Bare(s) | Number::Zeroed(s) | Number::Split(s) => s,
        }
    }
}

fn strip_separators(s: &str) -> String {
    s.chars()
        .filter(|c| *c != '-' && !c.is_whitespace())
        .collect()
}

/// Strips a recognizable number down to bare digits, removing separators
/// and any country-code rendering. `None` when neither shape matches.
fn strip_decorations(trimmed: &str) -> Option<Number> {
    let bare = if domestic_regex().is_match(trimmed) {
        strip_separators(trimmed)
    } else if country_code_regex().is_match(trimmed) {
        strip_separators(&country_prefix_regex().replace(trimmed, ""))
    } else {
        return None;
    };
    Some(Number::Bare(bare))
}

/// Restores the single leading zero on a zeroless number.
///
/// Existing zeros are trimmed off first so that a double-zero artifact left
/// by country-code stripping cannot survive. Already-zeroed values promote
/// directly once they pass the zeroed gate.
fn restore_zero(number: Number) -> Number {
    let Number::Bare(s) = number else {
        return number;
    };
    if bare_no_zero_regex().is_match(&s) {
        let mut zeroed = String::with_capacity(s.len() + 1);
        zeroed.push('0');
        zeroed.push_str(s.trim_start_matches('0'));
        Number::Zeroed(zeroed)
    } else if domestic_zeroed_regex().is_match(&s) {
        Number::Zeroed(s)
    } else {
        Number::Bare(s)
    }
}

/// Places the hyphens: mobile/IP numbers at fixed offsets, landlines at the
/// boundary found by the area-code waterfall.
///
/// The waterfall consults the 4-, then 3-, then 2-digit bucket; the first
/// match wins. Buckets are disjoint by construction so order only matters
/// for prefix overlap across lengths, which is exactly what longest-first
/// resolves. A number whose code is in no bucket stays unsplit.
fn hyphenate(number: Number, table: &CodeTable) -> Number {
    let Number::Zeroed(s) = number else {
        return number;
    };
    if mobile_zeroed_regex().is_match(&s) {
        return Number::Split(format!("{}-{}-{}", &s[..3], &s[3..7], &s[7..]));
    }
    for width in [4, 3, 2] {
        let (code, rest) = s.split_at(width);
        if table.has_area_code(code) {
            let (middle, last) = rest.split_at(rest.len() - 4);
            return Number::Split(format!("{code}-{middle}-{last}"));
        }
    }
    Number::Zeroed(s)
}

/// Swaps the domestic leading zero for the international prefix.
fn internationalize(value: &str) -> Option<String> {
    dashed_zeroed_regex()
        .is_match(value)
        .then(|| format!("+81 {}", value.trim_start_matches('0')))
}

/// Normalizes one raw phone value against the code table.
///
/// A pure function of `(raw, table)`: the table is never mutated and no
/// state is carried between calls. Values that match no shape at any stage
/// come back unchanged apart from the whitespace trim, so a non-empty input
/// never produces an empty output. Use [`is_canonical`] downstream to tell
/// pass-throughs apart from real reformats.
pub fn normalize(raw: &str, table: &CodeTable) -> String {
    let trimmed = raw.trim();
    let value = match strip_decorations(trimmed) {
        Some(number) => hyphenate(restore_zero(number), table).into_inner(),
        // The safety net: nothing recognized the value, keep it verbatim.
        // This runs before the prefix stage on purpose; the prefix gate
        // still gets a chance at originals that were already well-formed.
        None => trimmed.to_owned(),
    };
    match internationalize(&value) {
        Some(canonical) => canonical,
        None => value,
    }
}

/// Whether a value is in the canonical `+81 <code>-<middle>-<4 digits>`
/// shape. The audit predicate for distinguishing pass-throughs and partial
/// rewrites from fully formatted numbers.
pub fn is_canonical(s: &str) -> bool {
    canonical_regex().is_match(s)
}
