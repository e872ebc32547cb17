use std::collections::HashSet;

use anyhow::{Result, anyhow};
use rand::Rng;

pub const MINIAPP_URL_PREFIX: &str = "https://farcaster.xyz/miniapps/";
pub const MAX_URL_LEN: usize = 256;
pub const MAX_SLUG_LEN: usize = 64;
pub const MAX_NAME_LEN: usize = 128;
pub const MAX_DESCRIPTION_LEN: usize = 512;
pub const MAX_EXCLUDE_IDS: usize = 1024;

const _: [(); 4096 - MAX_EXCLUDE_IDS] = [(); 4096 - MAX_EXCLUDE_IDS];

/// Outcome of a random pick over the directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pick {
    /// Index into the id slice the pick was made over
    pub index: usize,
    /// True when the exclusion set covered the whole directory and the
    /// caller should clear its shown-app history
    pub reset: bool,
}

/// Uniformly pick an entry whose id is not excluded. When the exclusion set
/// covers everything, pick uniformly over the full slice and signal a reset.
/// Returns `None` only for an empty directory.
pub fn pick_index<R: Rng>(ids: &[i64], exclude: &HashSet<i64>, rng: &mut R) -> Option<Pick> {
    if ids.is_empty() {
        return None;
    }
    assert!(ids.len() <= 1_000_000, "Directory size exceeds bounds");

    let available: Vec<usize> = ids
        .iter()
        .enumerate()
        .filter(|(_, id)| !exclude.contains(id))
        .map(|(index, _)| index)
        .collect();

    if available.is_empty() {
        return Some(Pick {
            index: rng.random_range(0..ids.len()),
            reset: true,
        });
    }

    let choice = available[rng.random_range(0..available.len())];
    Some(Pick {
        index: choice,
        reset: false,
    })
}

/// Extract the app slug from a canonical mini-app URL.
pub fn app_slug_from_url(url: &str) -> Result<String> {
    let trimmed = url.trim();
    if trimmed.is_empty() {
        return Err(anyhow!("URL cannot be empty"));
    }
    if trimmed.len() > MAX_URL_LEN {
        return Err(anyhow!("URL exceeds {MAX_URL_LEN} character limit"));
    }
    let remainder = trimmed.strip_prefix(MINIAPP_URL_PREFIX).ok_or_else(|| {
        anyhow!("Invalid URL format. Must start with {MINIAPP_URL_PREFIX}")
    })?;
    let slug = remainder
        .trim_end_matches('/')
        .rsplit('/')
        .next()
        .unwrap_or_default();
    if slug.is_empty() {
        return Err(anyhow!("URL is missing an app slug"));
    }
    if slug.len() > MAX_SLUG_LEN {
        return Err(anyhow!("App slug exceeds {MAX_SLUG_LEN} character limit"));
    }
    if !slug
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
    {
        return Err(anyhow!("App slug contains unsupported characters"));
    }
    Ok(slug.to_string())
}

/// Derive a display name from a slug: hyphen-separated words, title-cased.
pub fn display_name_from_slug(slug: &str) -> String {
    slug.split('-')
        .filter(|word| !word.is_empty())
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

pub fn canonicalize_app_name(value: &str) -> Result<Option<String>> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }
    if trimmed.chars().count() > MAX_NAME_LEN {
        return Err(anyhow!("App name exceeds {MAX_NAME_LEN} character limit"));
    }
    Ok(Some(trimmed.to_string()))
}

pub fn canonicalize_description(value: &str) -> Result<Option<String>> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }
    if trimmed.chars().count() > MAX_DESCRIPTION_LEN {
        return Err(anyhow!(
            "Description exceeds {MAX_DESCRIPTION_LEN} character limit"
        ));
    }
    Ok(Some(trimmed.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn rng() -> StdRng {
        StdRng::seed_from_u64(7)
    }

    #[test]
    fn pick_avoids_excluded_ids() {
        let ids = vec![1, 2, 3];
        let exclude: HashSet<i64> = [1, 2].into_iter().collect();
        for seed in 0..64 {
            let mut rng = StdRng::seed_from_u64(seed);
            let pick = pick_index(&ids, &exclude, &mut rng).unwrap();
            assert!(!pick.reset);
            assert_eq!(ids[pick.index], 3);
        }
    }

    #[test]
    fn pick_resets_when_everything_excluded() {
        let ids = vec![1, 2, 3];
        let exclude: HashSet<i64> = [1, 2, 3].into_iter().collect();
        for seed in 0..64 {
            let mut rng = StdRng::seed_from_u64(seed);
            let pick = pick_index(&ids, &exclude, &mut rng).unwrap();
            assert!(pick.reset);
            assert!(pick.index < ids.len());
        }
    }

    #[test]
    fn pick_ignores_unknown_excluded_ids() {
        let ids = vec![10, 20];
        let exclude: HashSet<i64> = [99].into_iter().collect();
        let pick = pick_index(&ids, &exclude, &mut rng()).unwrap();
        assert!(!pick.reset);
    }

    #[test]
    fn pick_on_empty_directory_is_none() {
        let exclude = HashSet::new();
        assert_eq!(pick_index(&[], &exclude, &mut rng()), None);
    }

    #[test]
    fn slug_extraction() {
        let slug =
            app_slug_from_url("https://farcaster.xyz/miniapps/e7UFI7j3sB9Q/bankr").unwrap();
        assert_eq!(slug, "bankr");

        let slug =
            app_slug_from_url("https://farcaster.xyz/miniapps/abc/word-game/").unwrap();
        assert_eq!(slug, "word-game");

        assert!(app_slug_from_url("https://example.com/miniapps/x/y").is_err());
        assert!(app_slug_from_url("https://farcaster.xyz/miniapps/").is_err());
        assert!(app_slug_from_url("").is_err());
    }

    #[test]
    fn display_names_from_slugs() {
        assert_eq!(display_name_from_slug("bankr"), "Bankr");
        assert_eq!(display_name_from_slug("word-game"), "Word Game");
        assert_eq!(display_name_from_slug("a--b"), "A B");
    }
}
