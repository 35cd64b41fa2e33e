use chrono::{DateTime, Utc};

/// Relative age of a timestamp: "just now", "3m ago", "2h ago", "5d ago".
pub fn time_ago(when: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let secs = (now - when).num_seconds().max(0);
    if secs < 60 {
        return "just now".to_string();
    }
    let mins = secs / 60;
    if mins < 60 {
        return format!("{}m ago", mins);
    }
    let hours = mins / 60;
    if hours < 24 {
        return format!("{}h ago", hours);
    }
    format!("{}d ago", hours / 24)
}

/// Format an RFC 3339 due stamp for display. The provider sends date-only
/// dues with a midnight time, so the time is shown only when it carries
/// information. Unparseable input is shown verbatim.
pub fn format_due(raw: &str) -> String {
    match DateTime::parse_from_rfc3339(raw) {
        Ok(due) => {
            let due = due.with_timezone(&Utc);
            if due.format("%H:%M:%S").to_string() == "00:00:00" {
                due.format("%a %b %-d").to_string()
            } else {
                due.format("%a %b %-d %H:%M").to_string()
            }
        }
        Err(_) => raw.to_string(),
    }
}
