//! Server-rendered landing page.

use ipscope_lookup::{IpRecord, UNKNOWN};

const STYLE: &str = "body{font-family:sans-serif;max-width:42rem;margin:2rem auto;padding:0 1rem}\
table{border-collapse:collapse;width:100%}\
th,td{text-align:left;padding:.35rem .5rem;border-bottom:1px solid #ddd}\
th{width:12rem;color:#555}\
.notice{font-size:.9rem;color:#666}\
.error{color:#b00}";

/// Escape text for an HTML body or attribute
pub fn escape_html(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

fn layout(body: &str) -> String {
    format!(
        "<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n<meta charset=\"utf-8\">\n\
         <title>ipscope</title>\n<style>{}</style>\n</head>\n<body>\n\
         <h1>ipscope</h1>\n{}\n</body>\n</html>\n",
        STYLE, body
    )
}

fn coordinate(value: Option<f64>) -> String {
    value.map_or_else(|| UNKNOWN.to_string(), |v| v.to_string())
}

fn weather_summary(record: &IpRecord) -> String {
    let weather = &record.weather;
    if !weather.is_available() {
        return "Not available".to_string();
    }
    let mut parts = Vec::new();
    if let Some(condition) = &weather.condition {
        parts.push(condition.clone());
    }
    if let Some(temp) = weather.temperature {
        parts.push(format!("{:.1}°", temp));
    }
    if let Some(feels) = weather.feels_like {
        parts.push(format!("feels like {:.1}°", feels));
    }
    if let Some(humidity) = weather.humidity {
        parts.push(format!("{}% humidity", humidity));
    }
    parts.join(", ")
}

/// The caller's own record as a table
pub fn render_record(record: &IpRecord) -> String {
    let rows: [(&str, String); 17] = [
        ("IPv4", record.ipv4.clone()),
        ("IPv6", record.ipv6.clone()),
        ("City", record.city.clone()),
        ("Region", record.region.clone()),
        ("Country", record.country.clone()),
        ("Postal code", record.postal.clone()),
        ("Latitude", coordinate(record.latitude)),
        ("Longitude", coordinate(record.longitude)),
        ("Timezone", record.timezone.clone()),
        ("Local time", record.local_time.clone()),
        ("Weather", weather_summary(record)),
        ("ISP", record.isp.clone()),
        ("Organization", record.org.clone()),
        ("Owner", record.owner.clone()),
        ("ASN", format!("{} ({})", record.asn, record.asn_org)),
        ("Address type", record.ip_type.clone()),
        ("Connection", record.connection_type.clone()),
    ];

    let mut table = String::from("<table>\n");
    for (label, value) in &rows {
        table.push_str(&format!(
            "<tr><th>{}</th><td>{}</td></tr>\n",
            label,
            escape_html(value)
        ));
    }
    table.push_str("</table>\n");

    layout(&format!(
        "{}<p class=\"notice\">{}</p>\n<p class=\"notice\">{}</p>",
        table,
        escape_html(&record.privacy_notice),
        escape_html(&record.data_retention)
    ))
}

pub fn render_error(message: &str) -> String {
    layout(&format!("<p class=\"error\">{}</p>", escape_html(message)))
}
