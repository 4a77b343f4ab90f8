//! Public feed resolution.
//!
//! Turns the full version catalog into the client-facing
//! `plugins-v1.json` document: one best version per plugin, filtered by the
//! requesting client's version and beta entitlements, plus a blacklist of
//! rejected versions.

use std::collections::HashMap;

use sea_orm::prelude::DateTimeUtc;
use serde::Serialize;
use sha1::{Digest as _, Sha1};

use crate::entity::version::VersionStatus;

/// Versions of a beta-gated plugin stop being visible to beta testers once
/// this download count is reached.
pub const BETA_DOWNLOAD_LIMIT: i32 = 5000;

/// Collapse a dotted version string into a single ordering integer.
///
/// Up to three numeric components are read; missing or non-numeric
/// components count as zero, and trailing non-digits within a component
/// (pre-release suffixes) are ignored. Arithmetic saturates, so absurdly
/// large components from untrusted input order last instead of wrapping.
pub fn parse_version_int(s: &str) -> u64 {
    let mut components = [0u64; 3];
    for (slot, part) in components.iter_mut().zip(s.split('.')) {
        let digits: String = part.chars().take_while(|c| c.is_ascii_digit()).collect();
        *slot = digits.parse().unwrap_or(0);
    }
    components[0]
        .saturating_mul(10_000_000)
        .saturating_add(components[1].saturating_mul(100_000))
        .saturating_add(components[2])
}

/// Parse the explicit `version` request argument.
///
/// Anything that does not lead with a digit means no version filtering,
/// the same answer an unparseable user agent gets.
pub fn client_version_from_arg(arg: &str) -> u64 {
    if arg.starts_with(|c: char| c.is_ascii_digit()) {
        parse_version_int(arg)
    } else {
        u64::MAX
    }
}

/// Extract the client version from a `<product> <arch> <x.y.z>` user agent.
///
/// Unparseable agents get `u64::MAX` so unknown clients see everything the
/// rest of the filters allow.
pub fn client_version_from_user_agent(user_agent: &str) -> u64 {
    match user_agent.split_whitespace().last() {
        Some(token) if token.starts_with(|c: char| c.is_ascii_digit()) => {
            parse_version_int(token)
        }
        _ => u64::MAX,
    }
}

/// One catalog row fed into the resolver: a version joined with its
/// plugin's beta secret.
#[derive(Debug, Clone)]
pub struct CatalogRow {
    pub plugin_id: String,
    pub version: String,
    pub created_at: DateTimeUtc,
    pub kind: String,
    pub author: String,
    pub min_app_version: String,
    pub title: String,
    pub category: String,
    pub synopsis: String,
    pub description: String,
    pub homepage: String,
    pub pkg_digest: String,
    pub icon_digest: Option<String>,
    pub downloads: i32,
    pub published: bool,
    pub status: VersionStatus,
    pub beta_secret: String,
}

#[derive(Debug, Clone)]
pub struct FeedRequest {
    pub client_version: u64,
    /// `betapassword` request argument, if any.
    pub beta_password: Option<String>,
    /// The configured admin feed password was supplied: skip approval,
    /// publication and beta gating (version gating still applies).
    pub admin_bypass: bool,
}

#[derive(Debug, Serialize, PartialEq, Eq)]
pub struct FeedEntry {
    pub id: String,
    pub version: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub author: String,
    #[serde(rename = "minAppVersion")]
    pub min_app_version: String,
    pub title: String,
    pub category: String,
    pub synopsis: String,
    pub description: String,
    pub homepage: String,
    #[serde(rename = "downloadURL")]
    pub download_url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
}

#[derive(Debug, Serialize, PartialEq, Eq)]
pub struct BlacklistEntry {
    pub id: String,
    pub version: String,
}

#[derive(Debug, Serialize)]
pub struct FeedDocument {
    /// Feed format version, always 1.
    pub version: u32,
    pub plugins: Vec<FeedEntry>,
    pub blacklist: Vec<BlacklistEntry>,
}

fn eligible(row: &CatalogRow, request: &FeedRequest) -> bool {
    if request.admin_bypass {
        return true;
    }

    let beta_access = !row.beta_secret.is_empty()
        && request.beta_password.as_deref() == Some(row.beta_secret.as_str());

    if row.status != VersionStatus::Approved {
        // Unapproved versions are only visible to beta testers, and only
        // while the version is still in limited circulation.
        if !beta_access || row.downloads >= BETA_DOWNLOAD_LIMIT {
            return false;
        }
    }

    if !row.published && !beta_access {
        return false;
    }

    true
}

/// Resolve the catalog into a feed document for one request.
///
/// Single pass: rejected versions always land on the blacklist; among the
/// remaining eligible versions the numerically greatest one per plugin
/// wins, with the most recently ingested row breaking exact ties.
pub fn resolve_feed(rows: Vec<CatalogRow>, request: &FeedRequest, base_url: &str) -> FeedDocument {
    let mut blacklist = Vec::new();
    let mut best: HashMap<String, (u64, CatalogRow)> = HashMap::new();

    for row in rows {
        if row.status == VersionStatus::Rejected {
            blacklist.push(BlacklistEntry {
                id: row.plugin_id,
                version: row.version,
            });
            continue;
        }

        if !eligible(&row, request) {
            continue;
        }

        if parse_version_int(&row.min_app_version) > request.client_version {
            continue;
        }

        let ord = parse_version_int(&row.version);
        match best.get(&row.plugin_id) {
            Some((cur_ord, _)) if *cur_ord > ord => {}
            Some((cur_ord, cur)) if *cur_ord == ord && cur.created_at >= row.created_at => {}
            _ => {
                best.insert(row.plugin_id.clone(), (ord, row));
            }
        }
    }

    let mut plugins: Vec<FeedEntry> = best
        .into_values()
        .map(|(_, row)| FeedEntry {
            download_url: format!("{base_url}/data/{}", row.pkg_digest),
            icon: row
                .icon_digest
                .map(|digest| format!("{base_url}/data/{digest}")),
            id: row.plugin_id,
            version: row.version,
            kind: row.kind,
            author: row.author,
            min_app_version: row.min_app_version,
            title: row.title,
            category: row.category,
            synopsis: row.synopsis,
            description: row.description,
            homepage: row.homepage,
        })
        .collect();

    // Stable output so identical catalogs serialize identically and the
    // derived ETag stays cacheable.
    plugins.sort_by(|a, b| a.id.cmp(&b.id));
    blacklist.sort_by(|a, b| (&a.id, &a.version).cmp(&(&b.id, &b.version)));

    FeedDocument {
        version: 1,
        plugins,
        blacklist,
    }
}

/// Serialize a feed document and derive its entity tag.
pub fn render(document: &FeedDocument) -> (String, String) {
    // Serializing a struct of plain strings cannot fail.
    let json = serde_json::to_string(document).unwrap_or_default();
    let etag = hex::encode(Sha1::digest(json.as_bytes()));
    (json, etag)
}
