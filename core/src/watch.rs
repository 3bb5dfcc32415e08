use log::{debug, info};

use crate::catalog::CatalogEntry;
use crate::error::{CoreError, CoreResult};
use crate::metadata::{ContentDetails, MediaType, MetadataSource};
use crate::playback::PlaybackMode;
use crate::resolver::SourceResolver;
use crate::wallet::WalletState;

/// Everything a playback view needs to open
#[derive(Debug, Clone, PartialEq)]
pub struct WatchPlan {
    pub kind: MediaType,
    pub details: ContentDetails,
    /// YouTube key of the trailer, when the title has one
    pub trailer_key: Option<String>,
    /// Asset for full playback
    pub source: CatalogEntry,
    /// `false` when `source` is the id-based stand-in rather than this title
    pub source_matched: bool,
}

impl WatchPlan {
    /// Playback opens on the full asset; every plan carries one, the
    /// id-based stand-in included. The trailer stays one switch away.
    pub fn initial_mode(&self) -> PlaybackMode {
        PlaybackMode::FullAsset
    }
}

/// Builds watch plans: wallet gate, details lookup, source resolution
pub struct WatchPlanner<'a> {
    resolver: &'a SourceResolver,
}

impl<'a> WatchPlanner<'a> {
    pub fn new(resolver: &'a SourceResolver) -> Self {
        Self { resolver }
    }

    /// Plan playback of title `id`.
    ///
    /// Refused without a connected wallet. Fails only when the details
    /// cannot be fetched; the source lookup always produces an asset.
    pub async fn plan(
        &self,
        metadata: &dyn MetadataSource,
        wallet: &WalletState,
        kind: MediaType,
        id: u64,
    ) -> CoreResult<WatchPlan> {
        if !wallet.is_connected() {
            return Err(CoreError::WalletRequired);
        }
        if !kind.is_title() {
            return Err(CoreError::Metadata(format!("cannot watch a {}", kind.as_path())));
        }

        let details = metadata.details(kind, id).await?;
        let trailer_key = details.trailer_key().map(str::to_string);
        let (source, source_matched) = self.source_for(&details, kind, id);

        info!(
            "Watch plan for '{}': source '{}' (matched: {}), trailer: {}",
            details.display_title(),
            source.title,
            source_matched,
            trailer_key.is_some()
        );

        Ok(WatchPlan {
            kind,
            details,
            trailer_key,
            source,
            source_matched,
        })
    }

    fn source_for(&self, details: &ContentDetails, kind: MediaType, id: u64) -> (CatalogEntry, bool) {
        if kind == MediaType::Movie {
            let result = self.resolver.resolve(
                details.display_title(),
                details.summary.release_year(),
                Some(id),
            );
            if let Some(entry) = result.entry {
                return (entry, true);
            }
        }
        debug!("No catalog entry for {} {}, using id fallback", kind.as_path(), id);
        (self.resolver.resolve_by_id(id).clone(), false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::Catalog;
    use crate::metadata::MockMetadataSource;

    fn connected() -> WalletState {
        WalletState {
            address: Some("0x1234567890abcdef1234567890abcdef12345678".into()),
            chain_id: Some("0x2105".into()),
            balance: Some("1.0000".into()),
        }
    }

    fn details_json(json: &str) -> ContentDetails {
        serde_json::from_str(json).unwrap()
    }

    #[tokio::test]
    async fn test_wallet_required() {
        let resolver = SourceResolver::new(Catalog::public_domain());
        let mut metadata = MockMetadataSource::new();
        metadata.expect_details().never();

        let result = WatchPlanner::new(&resolver)
            .plan(&metadata, &WalletState::default(), MediaType::Movie, 653)
            .await;
        assert!(matches!(result, Err(CoreError::WalletRequired)));
    }

    #[tokio::test]
    async fn test_movie_resolves_to_catalog_entry() {
        let resolver = SourceResolver::new(Catalog::public_domain());
        let mut metadata = MockMetadataSource::new();
        metadata
            .expect_details()
            .withf(|kind, id| *kind == MediaType::Movie && *id == 653)
            .returning(|_, _| {
                Ok(details_json(
                    r#"{"id": 653, "title": "Nosferatu", "release_date": "1922-02-16",
                        "videos": {"results": [{"key": "FC6jFoYm3xs", "site": "YouTube", "type": "Trailer"}]}}"#,
                ))
            });

        let plan = WatchPlanner::new(&resolver)
            .plan(&metadata, &connected(), MediaType::Movie, 653)
            .await
            .unwrap();
        assert!(plan.source_matched);
        assert_eq!(plan.source.title, "Nosferatu (1922)");
        assert_eq!(plan.trailer_key.as_deref(), Some("FC6jFoYm3xs"));
        assert_eq!(plan.initial_mode(), PlaybackMode::FullAsset);
    }

    #[tokio::test]
    async fn test_unknown_movie_falls_back_to_id_pick() {
        let resolver = SourceResolver::new(Catalog::public_domain());
        let mut metadata = MockMetadataSource::new();
        metadata.expect_details().returning(|_, _| {
            Ok(details_json(
                r#"{"id": 550, "title": "Fight Club", "release_date": "1999-10-15",
                    "videos": {"results": [{"key": "qtRKdVHc-cE", "site": "YouTube", "type": "Trailer"}]}}"#,
            ))
        });

        let plan = WatchPlanner::new(&resolver)
            .plan(&metadata, &connected(), MediaType::Movie, 550)
            .await
            .unwrap();
        assert!(!plan.source_matched);
        assert_eq!(&plan.source, resolver.resolve_by_id(550));
        assert_eq!(plan.trailer_key.as_deref(), Some("qtRKdVHc-cE"));
        assert_eq!(plan.initial_mode(), PlaybackMode::FullAsset);
    }

    #[tokio::test]
    async fn test_tv_uses_id_pick() {
        let resolver = SourceResolver::new(Catalog::public_domain());
        let mut metadata = MockMetadataSource::new();
        metadata
            .expect_details()
            .returning(|_, _| Ok(details_json(r#"{"id": 1399, "name": "Game of Thrones"}"#)));

        let plan = WatchPlanner::new(&resolver)
            .plan(&metadata, &connected(), MediaType::Tv, 1399)
            .await
            .unwrap();
        assert!(!plan.source_matched);
        assert_eq!(plan.trailer_key, None);
        assert_eq!(plan.initial_mode(), PlaybackMode::FullAsset);
    }

    #[tokio::test]
    async fn test_details_failure_surfaces() {
        let resolver = SourceResolver::new(Catalog::public_domain());
        let mut metadata = MockMetadataSource::new();
        metadata
            .expect_details()
            .returning(|_, _| Err(CoreError::Metadata("movie/1 returned status 404".into())));

        let result = WatchPlanner::new(&resolver)
            .plan(&metadata, &connected(), MediaType::Movie, 1)
            .await;
        assert!(matches!(result, Err(CoreError::Metadata(_))));
    }
}
