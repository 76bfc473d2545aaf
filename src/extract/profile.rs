//! Per-user profile page extraction.

use scraper::{ElementRef, Html};

use crate::error::{AppError, Result};
use crate::models::{UserOrgMembership, UserProfile};
use crate::utils::resolve;

use super::{parse_selector, parse_stars, select_attr, select_text};

/// Extract a user profile with organization affiliations.
///
/// The profile block itself is required structure (an unknown handle
/// renders an error page without it); everything inside is optional and
/// defaults.
pub fn extract_user_profile(html: &str, handle: &str, base_url: &str) -> Result<UserProfile> {
    let document = Html::parse_document(html);
    let root = document.root_element();

    let profile_sel = parse_selector(".profile")?;
    let display_sel = parse_selector(".profile .info .value")?;
    let enlisted_sel = parse_selector(".profile-content .left-col .value")?;
    let thumb_sel = parse_selector(".thumb img")?;
    let main_org_sel = parse_selector(".main-org")?;
    let affiliate_sel = parse_selector(".affiliate-org")?;

    if root.select(&profile_sel).next().is_none() {
        return Err(AppError::extract(
            "user-profile",
            format!("no profile block for handle '{handle}'"),
        ));
    }

    let display = select_text(&root, &display_sel)
        .filter(|d| !d.is_empty())
        .unwrap_or_else(|| handle.to_string());
    let enlisted = select_text(&root, &enlisted_sel).unwrap_or_default();
    let avatar_url =
        select_attr(&root, &thumb_sel, "src").and_then(|src| resolve(base_url, &src));

    let main_org = root
        .select(&main_org_sel)
        .next()
        .and_then(|block| extract_org_block(&block));
    let affiliates = root
        .select(&affiliate_sel)
        .filter_map(|block| extract_org_block(&block))
        .collect();

    Ok(UserProfile {
        handle: handle.to_string(),
        display,
        enlisted,
        avatar_url,
        main_org,
        affiliates,
    })
}

/// One org membership block; a block without a short-code is skipped.
fn extract_org_block(block: &ElementRef) -> Option<UserOrgMembership> {
    let symbol_sel = parse_selector(".symbol").ok()?;
    let name_sel = parse_selector(".name").ok()?;
    let rank_sel = parse_selector(".rank").ok()?;
    let stars_sel = parse_selector(".stars").ok()?;

    let sid = select_text(block, &symbol_sel).filter(|s| !s.is_empty())?;
    let name = select_text(block, &name_sel).unwrap_or_default();
    let rank = select_text(block, &rank_sel).unwrap_or_default();
    let stars = select_attr(block, &stars_sel, "style")
        .map(|style| parse_stars(&style))
        .unwrap_or(0);

    Some(UserOrgMembership {
        sid,
        name,
        rank,
        stars,
    })
}
