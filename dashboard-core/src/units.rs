//! Small conversions applied to raw API values before they reach the charts.

/// Zero degrees Celsius expressed in Kelvin.
pub const KELVIN_OFFSET: f64 = 273.15;

/// Convert a Kelvin reading to Celsius, rounded to one decimal place.
pub fn kelvin_to_celsius(kelvin: f64) -> f64 {
    round1(kelvin - KELVIN_OFFSET)
}

/// Round to one decimal place.
///
/// Formatting rounds the exact binary value, so `18.45` (stored just below the
/// tie) becomes `18.4` and exact ties go to the even digit.
pub fn round1(value: f64) -> f64 {
    format!("{value:.1}").parse().unwrap_or(value)
}

/// Upper-case the first letter of every word and lower-case the rest.
///
/// A "word" starts after any non-alphabetic character, so `"o'clock"` becomes
/// `"O'Clock"`, matching how condition descriptions are displayed.
pub fn title_case(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut prev_alpha = false;

    for ch in text.chars() {
        if ch.is_alphabetic() {
            if prev_alpha {
                out.extend(ch.to_lowercase());
            } else {
                out.extend(ch.to_uppercase());
            }
            prev_alpha = true;
        } else {
            out.push(ch);
            prev_alpha = false;
        }
    }

    out
}
