use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, trace};

use crate::{
    identity::{IdentityResolver, ResolveError},
    usage::{TimeWindow, UsageRecord, UsageSource},
    utils::{clock::Clock, time::LocalZone},
};

use super::{AppInfo, BuildError};

/// Builds a complete, sorted list of used apps.
#[derive(Clone)]
pub struct UsageListBuilder {
    source: Arc<dyn UsageSource>,
    resolver: Arc<dyn IdentityResolver>,
    clock: Arc<dyn Clock>,
    zone: LocalZone,
    include_system: bool,
}

impl UsageListBuilder {
    pub fn new(
        source: Arc<dyn UsageSource>,
        resolver: Arc<dyn IdentityResolver>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            source,
            resolver,
            clock,
            zone: LocalZone::System,
            include_system: true,
        }
    }

    pub fn with_zone(self, zone: LocalZone) -> Self {
        Self { zone, ..self }
    }

    /// Leaves out packages shipped with the system image.
    pub fn without_system_packages(self) -> Self {
        Self {
            include_system: false,
            ..self
        }
    }

    pub fn zone(&self) -> LocalZone {
        self.zone
    }

    /// Runs a build on a blocking worker. `cancel` stops the build between records.
    #[instrument(skip_all)]
    pub async fn build(&self, cancel: CancellationToken) -> Result<Vec<AppInfo>, BuildError> {
        let builder = self.clone();
        tokio::task::spawn_blocking(move || builder.build_blocking(&cancel)).await?
    }

    /// The synchronous part of [Self::build].
    ///
    /// 1. Queries usage for the last [LOOKBACK_DAYS](crate::usage::LOOKBACK_DAYS).
    /// 2. Resolves each record separately. Uninstalled packages are kept without a name.
    /// 3. Sorts the result by last use, most recent first.
    pub fn build_blocking(&self, cancel: &CancellationToken) -> Result<Vec<AppInfo>, BuildError> {
        let window = TimeWindow::lookback_from(self.clock.time());
        let records = self.source.query(window)?;
        debug!("Received {} usage records", records.len());

        let mut apps = Vec::with_capacity(records.len());
        for (index, record) in records.into_iter().enumerate() {
            if cancel.is_cancelled() {
                debug!("Build cancelled at record {index}");
                return Err(BuildError::Cancelled);
            }
            trace!("Resolving record {index} {}", record.package_name);
            let app = self.enrich(record)?;
            if app.is_system && !self.include_system {
                continue;
            }
            apps.push(app);
        }

        apps.sort_by(|a, b| b.last_time_used.cmp(&a.last_time_used));
        info!("Built list of {} apps", apps.len());
        Ok(apps)
    }

    fn enrich(&self, record: UsageRecord) -> Result<AppInfo, BuildError> {
        let identity = match self.resolver.resolve(&record.package_name) {
            Ok(identity) => Some(identity),
            Err(ResolveError::NotFound(_)) => None,
            Err(e) => return Err(BuildError::Resolution(e)),
        };

        let (name, icon, is_system) = match identity {
            Some(identity) => (Some(identity.name), identity.icon, identity.is_system),
            None => (None, None, false),
        };

        Ok(AppInfo {
            package_name: record.package_name,
            name,
            icon,
            is_system,
            last_time_used: self.zone.to_local(record.last_time_used),
            last_time_visible: self.zone.to_local(record.last_time_visible),
        })
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use chrono::{DateTime, Duration, FixedOffset, NaiveDate, TimeZone, Utc};
    use tokio_util::sync::CancellationToken;

    use crate::{
        identity::{AppIdentity, MockIdentityResolver, ResolveError},
        listing::BuildError,
        usage::{MockUsageSource, SourceError, UsageRecord},
        utils::{
            clock::FixedClock,
            logging::TEST_LOGGING,
            time::LocalZone,
        },
    };

    use super::UsageListBuilder;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 3, 0, 0, 0).unwrap()
    }

    fn record(package: &str, used: DateTime<Utc>) -> UsageRecord {
        UsageRecord {
            package_name: package.into(),
            last_time_used: used,
            last_time_visible: used - Duration::minutes(1),
        }
    }

    fn identity(name: &str) -> AppIdentity {
        AppIdentity {
            name: name.into(),
            icon: None,
            is_system: false,
        }
    }

    fn test_records() -> Vec<UsageRecord> {
        vec![
            record("z", Utc.with_ymd_and_hms(2024, 1, 1, 10, 0, 0).unwrap()),
            record("x", Utc.with_ymd_and_hms(2024, 1, 2, 10, 0, 0).unwrap()),
            record("y", Utc.with_ymd_and_hms(2024, 1, 2, 9, 0, 0).unwrap()),
        ]
    }

    fn builder(source: MockUsageSource, resolver: MockIdentityResolver) -> UsageListBuilder {
        UsageListBuilder::new(
            Arc::new(source),
            Arc::new(resolver),
            Arc::new(FixedClock(now())),
        )
        .with_zone(LocalZone::Fixed(FixedOffset::east_opt(0).unwrap()))
    }

    #[tokio::test]
    async fn build_sorts_by_last_use() -> Result<(), BuildError> {
        *TEST_LOGGING;
        let mut source = MockUsageSource::new();
        source
            .expect_query()
            .withf(|window| window.end == now() && window.end - window.start == Duration::days(180))
            .times(1)
            .returning(|_| Ok(test_records()));
        let mut resolver = MockIdentityResolver::new();
        resolver
            .expect_resolve()
            .returning(|package| Ok(identity(&package.to_uppercase())));

        let apps = builder(source, resolver)
            .build(CancellationToken::new())
            .await?;

        let packages = apps.iter().map(|v| &*v.package_name).collect::<Vec<_>>();
        assert_eq!(packages, vec!["x", "y", "z"]);
        assert_eq!(apps[0].name.as_deref(), Some("X"));
        assert_eq!(
            apps[0].last_time_used,
            NaiveDate::from_ymd_opt(2024, 1, 2)
                .unwrap()
                .and_hms_opt(10, 0, 0)
                .unwrap()
        );
        assert_eq!(
            apps[0].last_time_visible,
            NaiveDate::from_ymd_opt(2024, 1, 2)
                .unwrap()
                .and_hms_opt(9, 59, 0)
                .unwrap()
        );
        Ok(())
    }

    #[tokio::test]
    async fn uninstalled_package_is_kept_without_identity() -> Result<(), BuildError> {
        let mut source = MockUsageSource::new();
        source.expect_query().returning(|_| Ok(test_records()));
        let mut resolver = MockIdentityResolver::new();
        resolver.expect_resolve().returning(|package| match package {
            "y" => Err(ResolveError::NotFound(package.into())),
            _ => Ok(identity(package)),
        });

        let apps = builder(source, resolver)
            .build(CancellationToken::new())
            .await?;

        assert_eq!(apps.len(), 3);
        let y = apps.iter().find(|v| &*v.package_name == "y").unwrap();
        assert_eq!(y.name, None);
        assert_eq!(y.icon, None);
        assert!(!y.is_system);
        Ok(())
    }

    #[tokio::test]
    async fn unexpected_resolution_failure_aborts_build() {
        let mut source = MockUsageSource::new();
        source.expect_query().returning(|_| Ok(test_records()));
        let mut resolver = MockIdentityResolver::new();
        resolver
            .expect_resolve()
            .returning(|package| Err(ResolveError::Unexpected {
                package: package.into(),
                reason: "registry crashed".into(),
            }));

        let result = builder(source, resolver)
            .build(CancellationToken::new())
            .await;

        assert!(matches!(result, Err(BuildError::Resolution(_))));
    }

    #[tokio::test]
    async fn unavailable_source_fails_build() {
        let mut source = MockUsageSource::new();
        source
            .expect_query()
            .returning(|_| Err(SourceError::Unavailable("permission denied".into())));
        let mut resolver = MockIdentityResolver::new();
        resolver.expect_resolve().never();

        let result = builder(source, resolver)
            .build(CancellationToken::new())
            .await;

        assert!(matches!(
            result,
            Err(BuildError::Source(SourceError::Unavailable(_)))
        ));
    }

    #[tokio::test]
    async fn empty_usage_builds_empty_list() -> Result<(), BuildError> {
        let mut source = MockUsageSource::new();
        source.expect_query().returning(|_| Ok(vec![]));

        let apps = builder(source, MockIdentityResolver::new())
            .build(CancellationToken::new())
            .await?;

        assert!(apps.is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn system_packages_can_be_left_out() -> Result<(), BuildError> {
        let mut source = MockUsageSource::new();
        source.expect_query().returning(|_| Ok(test_records()));
        let mut resolver = MockIdentityResolver::new();
        resolver.expect_resolve().returning(|package| {
            Ok(AppIdentity {
                is_system: package == "z",
                ..identity(package)
            })
        });

        let apps = builder(source, resolver)
            .without_system_packages()
            .build(CancellationToken::new())
            .await?;

        let packages = apps.iter().map(|v| &*v.package_name).collect::<Vec<_>>();
        assert_eq!(packages, vec!["x", "y"]);
        Ok(())
    }

    #[test]
    fn cancellation_is_checked_between_records() {
        let cancel = CancellationToken::new();
        let mut source = MockUsageSource::new();
        source.expect_query().returning(|_| Ok(test_records()));
        let mut resolver = MockIdentityResolver::new();
        let token = cancel.clone();
        resolver.expect_resolve().times(1).returning(move |package| {
            token.cancel();
            Ok(identity(package))
        });

        let result = builder(source, resolver).build_blocking(&cancel);

        assert!(matches!(result, Err(BuildError::Cancelled)));
    }
}
