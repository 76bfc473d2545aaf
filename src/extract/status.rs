//! Status page extraction.

use chrono::{DateTime, Utc};
use scraper::Html;

use crate::error::{AppError, Result};
use crate::models::{MONITORED_SYSTEMS, StatusSnapshot, SystemStatus};

use super::{parse_selector, select_text};

/// Extract a status snapshot from the status page HTML.
///
/// Component names on the page are matched to the monitored systems by
/// keyword. Systems absent from the page report `Unknown`; a page with
/// no recognizable component at all is structure drift.
pub fn extract_status(html: &str, checked_at: DateTime<Utc>) -> Result<StatusSnapshot> {
    let document = Html::parse_document(html);
    let component_sel = parse_selector("div.component")?;
    let name_sel = parse_selector("span.name")?;
    let status_sel = parse_selector("span.component-status")?;

    let mut snapshot = StatusSnapshot::uniform(SystemStatus::Unknown, checked_at);
    let mut matched = 0usize;

    for component in document.select(&component_sel) {
        let Some(name) = select_text(&component, &name_sel) else {
            continue;
        };
        let status = component
            .select(&status_sel)
            .next()
            .and_then(|el| el.value().attr("data-status"))
            .map(SystemStatus::parse)
            .unwrap_or(SystemStatus::Unknown);

        if let Some(system) = system_for_component(&name) {
            snapshot.systems.insert(system.to_string(), status);
            matched += 1;
        }
    }

    if matched == 0 {
        return Err(AppError::extract(
            "status",
            "no recognizable status components on page",
        ));
    }

    Ok(snapshot)
}

/// Map a page component name to one of the monitored systems.
fn system_for_component(name: &str) -> Option<&'static str> {
    let name = name.to_lowercase();
    if name.contains("platform") {
        Some(MONITORED_SYSTEMS[0])
    } else if name.contains("persistent universe") {
        Some(MONITORED_SYSTEMS[1])
    } else if name.contains("arena commander") || name.contains("electronic access") {
        Some(MONITORED_SYSTEMS[2])
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const STATUS_PAGE: &str = r#"
        <html><body>
          <div class="component">
            <span class="name">Platform</span>
            <span class="component-status" data-status="operational">Operational</span>
          </div>
          <div class="component">
            <span class="name">Persistent Universe</span>
            <span class="component-status" data-status="degraded-performance">Degraded</span>
          </div>
          <div class="component">
            <span class="name">Arena Commander</span>
            <span class="component-status" data-status="major-outage">Major Outage</span>
          </div>
        </body></html>
    "#;

    #[test]
    fn extracts_all_monitored_systems() {
        let snapshot = extract_status(STATUS_PAGE, Utc::now()).unwrap();
        assert_eq!(snapshot.systems["platform"], SystemStatus::Operational);
        assert_eq!(
            snapshot.systems["persistent-universe"],
            SystemStatus::Degraded
        );
        assert_eq!(snapshot.systems["electronic-access"], SystemStatus::Major);
    }

    #[test]
    fn missing_component_reports_unknown() {
        let html = r#"
            <div class="component">
              <span class="name">Platform</span>
              <span class="component-status" data-status="operational">Up</span>
            </div>
        "#;
        let snapshot = extract_status(html, Utc::now()).unwrap();
        assert_eq!(snapshot.systems.len(), MONITORED_SYSTEMS.len());
        assert_eq!(snapshot.systems["platform"], SystemStatus::Operational);
        assert_eq!(
            snapshot.systems["persistent-universe"],
            SystemStatus::Unknown
        );
    }

    #[test]
    fn unrecognizable_page_is_structure_drift() {
        let result = extract_status("<html><body><p>redesigned</p></body></html>", Utc::now());
        assert!(matches!(result, Err(AppError::Extract { .. })));
    }

    #[test]
    fn component_without_status_attr_is_unknown() {
        let html = r#"
            <div class="component">
              <span class="name">Platform</span>
              <span class="component-status">Up</span>
            </div>
        "#;
        let snapshot = extract_status(html, Utc::now()).unwrap();
        assert_eq!(snapshot.systems["platform"], SystemStatus::Unknown);
    }
}
