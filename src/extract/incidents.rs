//! Incident feed extraction (RSS/XML).

use chrono::{DateTime, Utc};
use serde::Deserialize;

use crate::error::{AppError, Result};
use crate::models::IncidentRecord;

/// Category terms that carry an incident status rather than an affected
/// component.
const STATUS_TAGS: [&str; 10] = [
    "operational",
    "degraded",
    "degraded-performance",
    "partial",
    "partial-outage",
    "major",
    "major-outage",
    "maintenance",
    "under-maintenance",
    "resolved",
];

#[derive(Debug, Deserialize)]
struct Rss {
    channel: Channel,
}

#[derive(Debug, Deserialize)]
struct Channel {
    #[serde(default, rename = "item")]
    items: Vec<Item>,
}

#[derive(Debug, Deserialize)]
struct Item {
    #[serde(default)]
    title: String,
    #[serde(default)]
    description: String,
    #[serde(default)]
    link: String,
    guid: Option<Guid>,
    #[serde(default, rename = "pubDate")]
    pub_date: String,
    #[serde(default, rename = "category")]
    categories: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct Guid {
    #[serde(default, rename = "$text")]
    value: String,
}

/// Extract all incident entries from the feed, newest first (feed order).
///
/// Entries without a guid are skipped; an unparseable document is
/// structure drift. `fetched_at` stamps entries whose publication date
/// is missing or malformed.
pub fn extract_incidents(xml: &str, fetched_at: DateTime<Utc>) -> Result<Vec<IncidentRecord>> {
    let rss: Rss = quick_xml::de::from_str(xml)
        .map_err(|e| AppError::extract("incident-feed", format!("feed did not parse: {e}")))?;

    let incidents = rss
        .channel
        .items
        .into_iter()
        .filter_map(|item| {
            let guid = item.guid.as_ref().map(|g| g.value.trim().to_string())?;
            if guid.is_empty() {
                return None;
            }

            let (status, components) = split_categories(&item.categories);
            let timestamp = DateTime::parse_from_rfc2822(item.pub_date.trim())
                .map(|dt| dt.with_timezone(&Utc))
                .unwrap_or(fetched_at);

            Some(IncidentRecord {
                guid,
                title: item.title.trim().to_string(),
                description: item.description.trim().to_string(),
                status,
                components,
                link: item.link.trim().to_string(),
                timestamp,
            })
        })
        .collect();

    Ok(incidents)
}

/// Extract only the newest entry, `None` on an empty feed.
pub fn extract_latest_incident(
    xml: &str,
    fetched_at: DateTime<Utc>,
) -> Result<Option<IncidentRecord>> {
    Ok(extract_incidents(xml, fetched_at)?.into_iter().next())
}

/// Partition category terms into (status tag, affected components).
///
/// The first term matching the known status set wins; everything else is
/// an affected component. No status term falls back to "unknown".
fn split_categories(categories: &[String]) -> (String, Vec<String>) {
    let mut status: Option<String> = None;
    let mut components = Vec::new();

    for term in categories {
        let term = term.trim();
        if term.is_empty() {
            continue;
        }
        if status.is_none() && STATUS_TAGS.contains(&term.to_lowercase().as_str()) {
            status = Some(term.to_string());
        } else {
            components.push(term.to_string());
        }
    }

    (status.unwrap_or_else(|| "unknown".to_string()), components)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Severity;

    const FEED: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<rss version="2.0">
  <channel>
    <title>Status Feed</title>
    <item>
      <title>Major PU outage</title>
      <description>&lt;p&gt;We are investigating.&lt;/p&gt;</description>
      <link>https://status.example.com/incidents/x1</link>
      <guid isPermaLink="false">X1</guid>
      <pubDate>Sat, 26 Oct 2024 08:30:00 +0000</pubDate>
      <category>major-outage</category>
      <category>Persistent Universe</category>
    </item>
    <item>
      <title>Login slowness resolved</title>
      <link>https://status.example.com/incidents/x0</link>
      <guid>X0</guid>
      <pubDate>Fri, 25 Oct 2024 10:00:00 +0000</pubDate>
      <category>resolved</category>
      <category>Platform</category>
    </item>
  </channel>
</rss>"#;

    #[test]
    fn feed_entries_newest_first() {
        let incidents = extract_incidents(FEED, Utc::now()).unwrap();
        assert_eq!(incidents.len(), 2);
        assert_eq!(incidents[0].guid, "X1");
        assert_eq!(incidents[1].guid, "X0");
    }

    #[test]
    fn status_tag_from_structured_metadata() {
        let incident = extract_latest_incident(FEED, Utc::now()).unwrap().unwrap();
        assert_eq!(incident.status, "major-outage");
        assert_eq!(incident.components, vec!["Persistent Universe"]);
        assert_eq!(incident.severity(), Severity::Major);
    }

    #[test]
    fn missing_status_tag_falls_back_to_unknown() {
        let xml = r#"<rss><channel><item>
            <title>Notice</title>
            <guid>N1</guid>
            <category>Platform</category>
        </item></channel></rss>"#;
        let incident = extract_latest_incident(xml, Utc::now()).unwrap().unwrap();
        assert_eq!(incident.status, "unknown");
        assert_eq!(incident.components, vec!["Platform"]);
    }

    #[test]
    fn entry_without_guid_is_skipped() {
        let xml = r#"<rss><channel>
            <item><title>No id</title></item>
            <item><title>Ok</title><guid>G2</guid></item>
        </channel></rss>"#;
        let incidents = extract_incidents(xml, Utc::now()).unwrap();
        assert_eq!(incidents.len(), 1);
        assert_eq!(incidents[0].guid, "G2");
    }

    #[test]
    fn pub_date_is_parsed() {
        let incident = extract_latest_incident(FEED, Utc::now()).unwrap().unwrap();
        assert_eq!(incident.timestamp.to_rfc3339(), "2024-10-26T08:30:00+00:00");
    }

    #[test]
    fn garbage_is_structure_drift() {
        assert!(matches!(
            extract_incidents("not xml at all <", Utc::now()),
            Err(AppError::Extract { .. })
        ));
    }

    #[test]
    fn empty_feed_is_ok() {
        let xml = r#"<rss><channel><title>empty</title></channel></rss>"#;
        assert!(
            extract_latest_incident(xml, Utc::now())
                .unwrap()
                .is_none()
        );
    }
}
