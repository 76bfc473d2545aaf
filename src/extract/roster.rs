//! Roster page extraction.
//!
//! The member-listing endpoint returns a JSON envelope wrapping an HTML
//! fragment of member cards.

use scraper::Html;
use serde::Deserialize;

use crate::error::{AppError, Result};
use crate::models::{MemberRecord, OrgAffiliation};
use crate::utils::resolve;

use super::{parse_selector, select_attr, select_text};

/// One extracted roster page.
#[derive(Debug, Clone, Default)]
pub struct RosterPage {
    pub members: Vec<MemberRecord>,
    /// Whether the page held a full `page_size` of records; a short page
    /// ends pagination.
    pub full_page: bool,
}

#[derive(Debug, Deserialize)]
struct Envelope {
    #[serde(default)]
    success: i64,
    #[serde(default)]
    data: Option<EnvelopeData>,
}

#[derive(Debug, Deserialize)]
struct EnvelopeData {
    #[serde(default)]
    html: String,
}

/// Extract member records from one roster page response.
///
/// The JSON envelope (`success`, `data.html`) is required structure;
/// individual cards missing a handle are skipped rather than failing the
/// page.
pub fn extract_roster_page(body: &str, page_size: usize, base_url: &str) -> Result<RosterPage> {
    let envelope: Envelope = serde_json::from_str(body)
        .map_err(|e| AppError::extract("roster-page", format!("envelope did not parse: {e}")))?;

    if envelope.success != 1 {
        return Err(AppError::extract(
            "roster-page",
            format!("endpoint reported success={}", envelope.success),
        ));
    }
    let Some(data) = envelope.data else {
        return Err(AppError::extract("roster-page", "envelope missing data"));
    };

    let fragment = Html::parse_fragment(&data.html);
    let item_sel = parse_selector(".member-item")?;
    let nick_sel = parse_selector(".nick")?;
    let name_sel = parse_selector(".name")?;
    let rank_sel = parse_selector(".rank")?;
    let stars_sel = parse_selector(".stars")?;
    let role_sel = parse_selector(".rolelist li")?;
    let image_sel = parse_selector("img")?;

    let mut members = Vec::new();
    for item in fragment.select(&item_sel) {
        let Some(handle) = select_text(&item, &nick_sel).filter(|h| !h.is_empty()) else {
            continue;
        };

        let display = select_text(&item, &name_sel)
            .filter(|n| !n.is_empty())
            .unwrap_or_else(|| handle.clone());
        let rank = select_text(&item, &rank_sel).unwrap_or_default();
        let stars = select_attr(&item, &stars_sel, "style")
            .map(|style| super::parse_stars(&style))
            .unwrap_or(0);
        let roles: Vec<String> = item
            .select(&role_sel)
            .map(|el| el.text().collect::<String>().trim().to_string())
            .filter(|r| !r.is_empty())
            .collect();
        let avatar_url = select_attr(&item, &image_sel, "src")
            .and_then(|src| resolve(base_url, &src));

        let affiliation = if item.value().classes().any(|c| c == "org-affiliate") {
            OrgAffiliation::Affiliate
        } else {
            OrgAffiliation::Main
        };

        members.push(MemberRecord {
            handle,
            display,
            rank,
            stars,
            roles,
            affiliation,
            avatar_url,
        });
    }

    let full_page = members.len() == page_size;
    Ok(RosterPage { members, full_page })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_body(cards: &str) -> String {
        let html = format!("<div class=\"members\">{cards}</div>");
        serde_json::json!({
            "success": 1,
            "data": { "html": html }
        })
        .to_string()
    }

    const CARD: &str = r#"
        <div class="member-item">
          <img src="/media/avatar.jpg" />
          <span class="name">Space Ace</span>
          <span class="nick">SpaceAce</span>
          <span class="rank">Director</span>
          <span class="stars" style="width: 80%"></span>
          <ul class="rolelist"><li>Fleet</li><li>Security</li></ul>
        </div>
    "#;

    #[test]
    fn extracts_member_fields() {
        let body = make_body(CARD);
        let page = extract_roster_page(&body, 32, "https://example.com").unwrap();
        assert_eq!(page.members.len(), 1);

        let member = &page.members[0];
        assert_eq!(member.handle, "SpaceAce");
        assert_eq!(member.display, "Space Ace");
        assert_eq!(member.rank, "Director");
        assert_eq!(member.stars, 4);
        assert_eq!(member.roles, vec!["Fleet", "Security"]);
        assert_eq!(member.affiliation, OrgAffiliation::Main);
        assert_eq!(
            member.avatar_url.as_deref(),
            Some("https://example.com/media/avatar.jpg")
        );
    }

    #[test]
    fn affiliate_class_marks_affiliation() {
        let card = r#"<div class="member-item org-affiliate">
            <span class="nick">SideGig</span>
        </div>"#;
        let page = extract_roster_page(&make_body(card), 32, "https://example.com").unwrap();
        assert_eq!(page.members[0].affiliation, OrgAffiliation::Affiliate);
    }

    #[test]
    fn card_without_handle_is_skipped() {
        let card = r#"<div class="member-item"><span class="name">Ghost</span></div>"#;
        let page = extract_roster_page(&make_body(card), 32, "https://example.com").unwrap();
        assert!(page.members.is_empty());
    }

    #[test]
    fn full_page_flag_tracks_page_size() {
        let cards: String = (0..3)
            .map(|i| format!(r#"<div class="member-item"><span class="nick">m{i}</span></div>"#))
            .collect();
        let page = extract_roster_page(&make_body(&cards), 3, "https://example.com").unwrap();
        assert!(page.full_page);

        let page = extract_roster_page(&make_body(&cards), 32, "https://example.com").unwrap();
        assert!(!page.full_page);
    }

    #[test]
    fn failed_envelope_is_structure_drift() {
        let body = serde_json::json!({ "success": 0 }).to_string();
        assert!(matches!(
            extract_roster_page(&body, 32, "https://example.com"),
            Err(AppError::Extract { .. })
        ));
    }

    #[test]
    fn missing_optional_fields_default() {
        let card = r#"<div class="member-item"><span class="nick">Bare</span></div>"#;
        let page = extract_roster_page(&make_body(card), 32, "https://example.com").unwrap();
        let member = &page.members[0];
        assert_eq!(member.display, "Bare");
        assert_eq!(member.stars, 0);
        assert!(member.roles.is_empty());
        assert!(member.avatar_url.is_none());
    }
}
