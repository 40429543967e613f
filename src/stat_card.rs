use serde::Serialize;

/// Labeled numeric value shown at the top of the dashboard.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct StatCard {
    pub title: String,
    pub value: f64,
}

impl StatCard {
    pub fn new(title: impl Into<String>, value: f64) -> Self {
        StatCard {
            title: title.into(),
            value,
        }
    }

    /// Value as displayed on the card.
    pub fn formatted(&self) -> String {
        format_pt_br(self.value)
    }

    /// Card markup
    ///
    /// # Returns
    /// * `String` - A `div` holding the escaped title and the formatted value
    pub fn render_html(&self) -> String {
        format!(
            "<div class=\"stat-card\"><h3 class=\"stat-title\">{}</h3><p class=\"stat-value\">{}</p></div>",
            escape_html(&self.title),
            escape_html(&self.formatted())
        )
    }
}

/// Format a number the way the pt-BR locale does
///
/// Uses `.` between thousands groups and `,` before decimals, keeping at most
/// three fraction digits with trailing zeros dropped.
///
/// # Examples
/// ```
/// use corridas_dashboard::stat_card::format_pt_br;
///
/// assert_eq!(format_pt_br(1234567.0), "1.234.567");
/// assert_eq!(format_pt_br(1234.5), "1.234,5");
/// assert_eq!(format_pt_br(-0.1234), "-0,123");
/// ```
pub fn format_pt_br(value: f64) -> String {
    if value.is_nan() {
        return "NaN".to_string();
    }
    if value.is_infinite() {
        return (if value < 0.0 { "-∞" } else { "∞" }).to_string();
    }

    let rounded = format!("{:.3}", value.abs());
    let (int_part, frac_part) = rounded.split_once('.').unwrap_or((rounded.as_str(), ""));
    let frac_part = frac_part.trim_end_matches('0');

    let mut out = String::new();
    let is_zero = int_part.chars().all(|c| c == '0') && frac_part.is_empty();
    if value < 0.0 && !is_zero {
        out.push('-');
    }
    out.push_str(&group_thousands(int_part));
    if !frac_part.is_empty() {
        out.push(',');
        out.push_str(frac_part);
    }
    out
}

fn group_thousands(digits: &str) -> String {
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push('.');
        }
        grouped.push(c);
    }
    grouped
}

pub(crate) fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}
