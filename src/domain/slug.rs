//! Slug helpers for categories and products.
//!
//! Slugs are derived from display names with the `slug` crate. Uniqueness is
//! decided by a caller-supplied predicate so the derivation stays pure; the
//! async variant lets services consult a repository between attempts.

use std::future::Future;

use slug::slugify;
use thiserror::Error;

const MAX_SUFFIX_ATTEMPTS: usize = 32;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SlugError {
    #[error("slug source text is empty")]
    EmptyInput,
    #[error("failed to derive slug from `{input}`")]
    Unrepresentable { input: String },
    #[error("exhausted attempts to find a unique slug for `{base}`")]
    Exhausted { base: String },
}

#[derive(Debug, Error)]
pub enum SlugAsyncError<E>
where
    E: std::error::Error + Send + Sync + 'static,
{
    #[error(transparent)]
    Slug(#[from] SlugError),
    #[error(transparent)]
    Predicate(E),
}

/// Derive a base slug from a display name (`"Potato Chips"` -> `"potato-chips"`).
pub fn derive_slug(input: &str) -> Result<String, SlugError> {
    if input.trim().is_empty() {
        return Err(SlugError::EmptyInput);
    }

    let candidate = slugify(input);
    if candidate.is_empty() {
        return Err(SlugError::Unrepresentable {
            input: input.to_string(),
        });
    }

    Ok(candidate)
}

/// Produce a slug the predicate accepts, retrying with `-2`, `-3`, ...
///
/// `is_unique` must resolve to `true` when the candidate is free.
pub async fn generate_unique_slug_async<F, Fut, E>(
    input: &str,
    mut is_unique: F,
) -> Result<String, SlugAsyncError<E>>
where
    F: FnMut(&str) -> Fut,
    Fut: Future<Output = Result<bool, E>>,
    E: std::error::Error + Send + Sync + 'static,
{
    let base = derive_slug(input)?;

    if is_unique(&base).await.map_err(SlugAsyncError::Predicate)? {
        return Ok(base);
    }

    for attempt in 2..=MAX_SUFFIX_ATTEMPTS + 1 {
        let candidate = format!("{base}-{attempt}");
        if is_unique(&candidate)
            .await
            .map_err(SlugAsyncError::Predicate)?
        {
            return Ok(candidate);
        }
    }

    Err(SlugAsyncError::Slug(SlugError::Exhausted { base }))
}

/// Suffix used when a restored record collides with a live slug.
pub fn timestamp_suffixed(slug: &str, unix_millis: i128) -> String {
    format!("{slug}-{unix_millis}")
}

#[cfg(test)]
mod tests {
    use std::convert::Infallible;
    use std::sync::Arc;

    use tokio::sync::Mutex;

    use super::*;

    #[test]
    fn derive_slug_lowercases_and_hyphenates() {
        assert_eq!(derive_slug("Snacks").expect("slug"), "snacks");
        assert_eq!(
            derive_slug("  Fresh Fruits & Vegetables ").expect("slug"),
            "fresh-fruits-vegetables"
        );
    }

    #[test]
    fn derive_slug_rejects_blank_and_symbol_only_input() {
        assert_eq!(derive_slug("   "), Err(SlugError::EmptyInput));
        assert!(matches!(
            derive_slug("!!!"),
            Err(SlugError::Unrepresentable { .. })
        ));
    }

    #[test]
    fn timestamp_suffix_is_appended() {
        assert_eq!(
            timestamp_suffixed("potato-chips", 1_700_000_000_000),
            "potato-chips-1700000000000"
        );
    }

    #[tokio::test]
    async fn unique_slug_appends_counter() {
        let existing = Arc::new(Mutex::new(vec!["milk".to_string()]));

        let slug = generate_unique_slug_async("Milk", |candidate| {
            let existing = existing.clone();
            let candidate = candidate.to_string();
            async move {
                let mut guard = existing.lock().await;
                if guard.contains(&candidate) {
                    Ok::<bool, Infallible>(false)
                } else {
                    guard.push(candidate);
                    Ok(true)
                }
            }
        })
        .await
        .expect("unique slug");

        assert_eq!(slug, "milk-2");
    }

    #[tokio::test]
    async fn unique_slug_gives_up_after_bounded_attempts() {
        let result =
            generate_unique_slug_async("Bread", |_| async { Ok::<bool, Infallible>(false) }).await;

        match result {
            Err(SlugAsyncError::Slug(SlugError::Exhausted { base })) => assert_eq!(base, "bread"),
            other => panic!("expected exhaustion, got {other:?}"),
        }
    }
}
