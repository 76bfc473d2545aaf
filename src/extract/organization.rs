//! Organization profile page extraction.

use scraper::Html;

use crate::error::{AppError, Result};
use crate::models::{OrgFocus, OrganizationProfile};
use crate::utils::resolve;

use super::{parse_selector, select_attr, select_text};

/// Extract an organization profile from its public page.
///
/// The organization name is required structure; media URLs, focus areas
/// and the member count are optional. The member count comes from the
/// separate search endpoint (see [`extract_member_count`]).
pub fn extract_org_profile(html: &str, sid: &str, base_url: &str) -> Result<OrganizationProfile> {
    let document = Html::parse_document(html);
    let root = document.root_element();

    let name_sel = parse_selector("#organization h1")?;
    let logo_sel = parse_selector(".logo.noshadow img")?;
    let banner_sel = parse_selector(".banner img")?;
    let primary_sel = parse_selector(".primary.tooltip-wrap img")?;
    let secondary_sel = parse_selector(".secondary.tooltip-wrap img")?;

    let name = select_text(&root, &name_sel)
        .map(|n| n.trim_matches(['/', ' ']).to_string())
        .filter(|n| !n.is_empty())
        .ok_or_else(|| AppError::extract("organization", "organization name not found"))?;

    let resolve_media =
        |src: Option<String>| src.and_then(|s| resolve(base_url, &s)).unwrap_or_default();

    let primary_focus = OrgFocus {
        name: select_attr(&root, &primary_sel, "alt").unwrap_or_default(),
        image_url: resolve_media(select_attr(&root, &primary_sel, "src")),
    };
    let secondary_focus = OrgFocus {
        name: select_attr(&root, &secondary_sel, "alt").unwrap_or_default(),
        image_url: resolve_media(select_attr(&root, &secondary_sel, "src")),
    };

    Ok(OrganizationProfile {
        sid: sid.to_string(),
        name,
        member_count: 0,
        primary_focus,
        secondary_focus,
        logo_url: resolve_media(select_attr(&root, &logo_sel, "src")),
        banner_url: resolve_media(select_attr(&root, &banner_sel, "src")),
    })
}

/// Extract an organization's member count from the search endpoint's
/// HTML fragment, matching on the short-code.
pub fn extract_member_count(fragment_html: &str, sid: &str) -> Result<Option<u32>> {
    let fragment = Html::parse_fragment(fragment_html);
    let cell_sel = parse_selector(".org-cell")?;
    let symbol_sel = parse_selector(".symbol")?;
    let value_sel = parse_selector(".value")?;

    for cell in fragment.select(&cell_sel) {
        let Some(symbol) = select_text(&cell, &symbol_sel) else {
            continue;
        };
        if !symbol.eq_ignore_ascii_case(sid) {
            continue;
        }

        // The member count is the last value cell in the card.
        let count = cell
            .select(&value_sel)
            .last()
            .map(|el| el.text().collect::<String>())
            .and_then(|text| text.trim().replace(',', "").parse::<u32>().ok());
        return Ok(count);
    }

    Ok(None)
}

#[cfg(test)]
mod tests {
    use super::*;

    const ORG_PAGE: &str = r#"
        <html><body>
          <div id="organization">
            <h1>/ Draco Consortium /</h1>
            <div class="logo noshadow"><img src="/media/logo.png" /></div>
            <div class="banner"><img src="/media/banner.jpg" /></div>
            <div class="primary tooltip-wrap"><img src="/media/trade.png" alt="Trading" /></div>
            <div class="secondary tooltip-wrap"><img src="/media/sec.png" alt="Security" /></div>
          </div>
        </body></html>
    "#;

    #[test]
    fn extracts_profile_fields() {
        let profile = extract_org_profile(ORG_PAGE, "DRACO", "https://example.com").unwrap();
        assert_eq!(profile.sid, "DRACO");
        assert_eq!(profile.name, "Draco Consortium");
        assert_eq!(profile.logo_url, "https://example.com/media/logo.png");
        assert_eq!(profile.banner_url, "https://example.com/media/banner.jpg");
        assert_eq!(profile.primary_focus.name, "Trading");
        assert_eq!(profile.secondary_focus.name, "Security");
    }

    #[test]
    fn missing_name_is_structure_drift() {
        let result =
            extract_org_profile("<html><body></body></html>", "DRACO", "https://example.com");
        assert!(matches!(result, Err(AppError::Extract { .. })));
    }

    #[test]
    fn member_count_matches_on_sid() {
        let fragment = r#"
            <div class="org-cell">
              <span class="symbol">OTHER</span>
              <span class="value">10</span>
            </div>
            <div class="org-cell">
              <span class="symbol">DRACO</span>
              <span class="value">Rank A</span>
              <span class="value">1,204</span>
            </div>
        "#;
        assert_eq!(extract_member_count(fragment, "DRACO").unwrap(), Some(1204));
        assert_eq!(extract_member_count(fragment, "NOBODY").unwrap(), None);
    }
}
