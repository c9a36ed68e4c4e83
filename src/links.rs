// Public URLs for an invoice and its social share links

use rust_decimal::Decimal;

use crate::models::{ShareLinks, Slid};

pub fn pay_url(app_url: &str, short_id: &str) -> String {
    format!("{}/p/{}", app_url, short_id)
}

pub fn share_url(app_url: &str, short_id: &str) -> String {
    format!("{}/dashboard/share/{}", app_url, short_id)
}

pub fn receipt_url(app_url: &str, short_id: &str) -> String {
    format!("{}/receipt/{}", app_url, short_id)
}

pub fn share_links(pay_url: &str, slid: &Slid) -> ShareLinks {
    let amount = slid.amount.normalize();
    ShareLinks {
        telegram: format!(
            "https://t.me/share/url?url={}&text={}",
            urlencoding::encode(pay_url),
            urlencoding::encode(&format!("Invoice for ${} - {}", amount, slid.description))
        ),
        whatsapp: format!(
            "https://wa.me/?text={}",
            urlencoding::encode(&format!("Invoice for ${}: {}", amount, pay_url))
        ),
        twitter: format!(
            "https://twitter.com/intent/tweet?text={}",
            urlencoding::encode(&format!("Invoice ready: {}", pay_url))
        ),
    }
}

/// `1234.5` -> `1,234.50`; sub-cent digits are kept
pub fn format_amount(amount: Decimal) -> String {
    let text = amount.normalize().to_string();
    let (sign, digits) = match text.strip_prefix('-') {
        Some(rest) => ("-", rest),
        None => ("", text.as_str()),
    };
    let (int_part, frac_part) = match digits.split_once('.') {
        Some((i, f)) => (i, Some(f)),
        None => (digits, None),
    };

    let mut grouped = String::with_capacity(int_part.len() + int_part.len() / 3);
    for (i, ch) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    let frac = match frac_part {
        Some(f) if f.len() >= 2 => f.to_string(),
        Some(f) => format!("{:0<2}", f),
        None => "00".to_string(),
    };
    format!("{}{}.{}", sign, grouped, frac)
}

/// `0x1234...abcd`
pub fn truncate_middle(value: &str, head: usize, tail: usize) -> String {
    if value.len() <= head + tail + 3 || !value.is_ascii() {
        return value.to_string();
    }
    format!("{}...{}", &value[..head], &value[value.len() - tail..])
}
