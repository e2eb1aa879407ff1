use anyhow::Result;
use futures_util::future::join_all;
use log::{debug, warn};
use std::sync::Arc;

use crate::{
    diff::{DiffSession, Projection, SortMode},
    package::PackageRecord,
    runtime::Runtime,
    source::CatalogSource,
};

use super::config::{Config, ConfigOptions};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ListOptions {
    /// Group by originating source instead of API level.
    pub by_source: bool,
    /// Only show packages with an update available.
    pub updates: bool,
    /// Print JSON instead of a text tree.
    pub json: bool,
}

impl ListOptions {
    fn mode(&self) -> SortMode {
        if self.by_source {
            SortMode::BySource
        } else {
            SortMode::ByApi
        }
    }
}

/// List installed and available packages
#[tracing::instrument(skip(runtime, config_options))]
pub async fn list<R: Runtime + 'static>(
    runtime: R,
    config_options: ConfigOptions,
    options: ListOptions,
) -> Result<()> {
    let config = Config::new(runtime, config_options)?;
    let output = run(&config, options).await?;
    print!("{}", output);
    Ok(())
}

#[tracing::instrument(skip(config))]
pub async fn run<R: Runtime + 'static>(config: &Config<R>, options: ListOptions) -> Result<String> {
    let installed = config.installed_packages()?;
    let session = reconcile(&installed, &config.registry.sources(), options.mode()).await?;

    let mut projection = session.projection();
    if options.updates {
        projection = projection.updates_only();
    }
    render(&projection, options.json)
}

/// Fetch every source concurrently, then merge everything in one update.
///
/// A source that fails to fetch is skipped.
pub async fn reconcile(
    installed: &[PackageRecord],
    sources: &[Arc<dyn CatalogSource>],
    mode: SortMode,
) -> Result<DiffSession> {
    let fetches = sources.iter().map(|source| async move {
        let result = source.fetch_packages().await;
        (source.id().clone(), result)
    });
    let fetched = join_all(fetches).await;

    let mut session = DiffSession::new();
    let op = session.update_start(mode);
    session.update_source_packages(&op, None, installed)?;

    for (id, result) in fetched {
        match result {
            Ok(records) => {
                session.update_source_packages(&op, Some(&id), &records)?;
            }
            Err(e) => warn!("Skipping source {}: {:#}", id, e),
        }
    }

    let changed = session.update_end(&op)?;
    debug!("Reconciled {} package(s), changed={}", session.ledger().len(), changed);
    Ok(session)
}

fn render(projection: &Projection, json: bool) -> Result<String> {
    if json {
        return Ok(format!("{}\n", serde_json::to_string_pretty(projection)?));
    }
    if projection.categories().is_empty() {
        return Ok("No packages found.\n".to_string());
    }
    Ok(projection.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::package::PackageKey;
    use crate::source::{MockCatalogSource, SourceId};

    fn src1() -> SourceId {
        SourceId::new("http://repo.com/url1", "repo1")
    }

    fn mock_source(id: SourceId, records: Vec<PackageRecord>) -> Arc<dyn CatalogSource> {
        let mut mock = MockCatalogSource::new();
        mock.expect_id().return_const(id);
        mock.expect_fetch_packages()
            .returning(move || Ok(records.clone()));
        Arc::new(mock)
    }

    fn failing_source(id: SourceId) -> Arc<dyn CatalogSource> {
        let mut mock = MockCatalogSource::new();
        mock.expect_id().return_const(id);
        mock.expect_fetch_packages()
            .returning(|| Err(anyhow::anyhow!("connection refused")));
        Arc::new(mock)
    }

    #[tokio::test]
    async fn test_reconcile_installed_and_remote() {
        let installed = vec![PackageRecord::tool(10, Some(src1()))];
        let sources = vec![mock_source(
            src1(),
            vec![
                PackageRecord::tool(11, Some(src1())),
                PackageRecord::platform(3, "android-3", 6, Some(src1())),
            ],
        )];

        let session = reconcile(&installed, &sources, SortMode::ByApi)
            .await
            .unwrap();
        let projection = session.projection();

        assert!(projection.item(&PackageKey::Tool).unwrap().has_update());
        assert_eq!(
            projection.to_string(),
            "Tools [#items=1]\n\
             -- <UPDATE, Android SDK Tools, revision 10, update: revision 11>\n\
             Android android-3 (API 3) [#items=1]\n\
             -- <NEW, SDK Platform Android android-3, API 3, revision 6>\n\
             Extras [#items=0]\n"
        );
    }

    #[test_log::test(tokio::test)]
    async fn test_reconcile_skips_failed_source() {
        let src2 = SourceId::new("http://repo.com/url2", "repo2");
        let sources = vec![
            failing_source(src1()),
            mock_source(
                src2.clone(),
                vec![PackageRecord::extra("android", "usb_driver", 5, Some(src2.clone()))],
            ),
        ];

        let session = reconcile(&[], &sources, SortMode::BySource).await.unwrap();

        assert_eq!(
            session.projection().to_string(),
            "repo2 (repo.com) [#items=1]\n\
             -- <NEW, Android Usb Driver package, revision 5>\n"
        );
    }

    #[tokio::test]
    async fn test_reconcile_without_sources() {
        let installed = vec![PackageRecord::platform_tool(3, None)];
        let session = reconcile(&installed, &[], SortMode::BySource).await.unwrap();

        assert_eq!(
            session.projection().to_string(),
            "Local Packages (no source) [#items=1]\n\
             -- <INSTALLED, Android SDK Platform-tools, revision 3>\n"
        );
    }

    #[test]
    fn test_render_empty_source_projection() {
        let mut session = DiffSession::new();
        let op = session.update_start(SortMode::BySource);
        session.update_end(&op).unwrap();

        let text = render(&session.projection(), false).unwrap();
        assert_eq!(text, "No packages found.\n");
    }

    #[test]
    fn test_render_json() {
        let session = DiffSession::new();
        let text = render(&session.projection(), true).unwrap();
        let json: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert_eq!(json["mode"], "by-api");
        assert_eq!(json["categories"][0]["label"], "Tools");
    }
}
