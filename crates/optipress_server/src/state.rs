//! Shared application state and the upload pipeline.

use crate::ServerConfig;
use optipress_error::{
    OptipressError, OptipressErrorKind, OptipressResult, StoreError, StoreErrorKind,
};
use optipress_optimize::Optimizer;
use optipress_store::{
    ArtifactName, FormatPolicy, IngestedArtifact, NamespaceDirs, NamespaceId, StoreRoot,
};
use tracing::instrument;

/// State shared across request handlers.
#[derive(Clone)]
pub struct AppState {
    store: StoreRoot,
    policy: FormatPolicy,
    optimizer: Optimizer,
}

impl AppState {
    /// Build the state a configuration describes.
    ///
    /// # Errors
    ///
    /// Returns an error when the configuration names unknown formats.
    pub fn new(config: &ServerConfig) -> OptipressResult<Self> {
        Ok(Self {
            store: config.store_root(),
            policy: config.policy()?,
            optimizer: config.optimizer()?,
        })
    }

    /// Resolve a request's namespace from its token, if it carried one.
    ///
    /// Every handler goes through here; no path is formed from a token that
    /// has not been validated.
    pub fn resolve(&self, token: Option<&str>) -> OptipressResult<NamespaceDirs> {
        let Some(raw) = token else {
            return Err(StoreError::new(StoreErrorKind::MissingIdentifier).into());
        };
        let id = NamespaceId::parse(raw)?;
        Ok(self.store.resolve(&id))
    }

    /// Sniff and compress a freshly ingested original.
    ///
    /// Returns the stored name and the optimized copy's byte size. An
    /// original the format policy rejects is removed from the namespace
    /// before the rejection propagates; an original whose compressor fails
    /// stays in place.
    #[instrument(
        skip(self, dirs, artifact),
        fields(namespace = %dirs.id(), artifact = %artifact.name())
    )]
    pub async fn finish_upload(
        &self,
        dirs: &NamespaceDirs,
        artifact: IngestedArtifact,
    ) -> OptipressResult<(ArtifactName, u64)> {
        let format = match self.policy.enforce(artifact.path()).await {
            Ok(format) => format,
            Err(e) => {
                if is_unsupported(&e) {
                    let _ = tokio::fs::remove_file(artifact.path()).await;
                }
                return Err(e);
            }
        };

        let optimized = self.optimizer.optimize(dirs, &artifact, format).await?;
        Ok((artifact.name().clone(), *optimized.size()))
    }
}

/// Whether an error is a format-policy rejection.
fn is_unsupported(err: &OptipressError) -> bool {
    matches!(
        err.kind(),
        OptipressErrorKind::Store(e) if matches!(e.kind, StoreErrorKind::UnsupportedFileType(_))
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn state() -> AppState {
        AppState::new(&ServerConfig::default()).unwrap()
    }

    #[test]
    fn test_resolve_requires_token() {
        let err = state().resolve(None).unwrap_err();
        assert!(matches!(
            err.kind(),
            OptipressErrorKind::Store(e) if matches!(e.kind, StoreErrorKind::MissingIdentifier)
        ));
    }

    #[test]
    fn test_resolve_validates_token() {
        assert!(state().resolve(Some("client-42")).is_ok());
        assert!(state().resolve(Some("../escape")).is_err());
        assert!(state().resolve(Some("")).is_err());
    }

    #[test]
    fn test_unsupported_detection_is_kind_exact() {
        let unsupported: OptipressError =
            StoreError::new(StoreErrorKind::UnsupportedFileType("image/gif".into())).into();
        let not_found: OptipressError =
            StoreError::new(StoreErrorKind::NotFound("x.png".into())).into();

        assert!(is_unsupported(&unsupported));
        assert!(!is_unsupported(&not_found));
    }
}
