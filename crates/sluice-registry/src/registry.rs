//! The feature registry
//!
//! [`Registry`] owns the resident [`Catalog`] and a [`RegistryStore`] used to
//! persist it. Every read returns an owned clone, so callers can never
//! observe or mutate the resident state. Mutations take `&mut self`; callers
//! sharing a registry across tasks wrap it in their own lock.

use chrono::{DateTime, Utc};
use sluice_core::{
    BatchFeatureView, CatalogObject, DataSource, Entity, FeatureService, FeatureView,
    FeatureViewKind, Infra, MaterializationInterval, ObjectKind, OnDemandFeatureView,
    ProjectMetadata, RequestFeatureView, SavedDataset, StreamFeatureView, ValidationReference,
};
use tracing::{debug, info, warn};

use crate::catalog::{Catalog, Catalogued};
use crate::config::{RegistryBackend, RegistryConfig};
use crate::error::{RegistryError, RegistryResult};
use crate::file_system::FileRegistryStore;
use crate::memory::MemoryRegistryStore;
use crate::models::{CacheState, RegistryStats};
use crate::snapshot::Snapshot;
use crate::traits::RegistryStore;

/// Generates the typed `apply_*`/`get_*`/`list_*`/`delete_*` wrappers for a kind
macro_rules! kind_operations {
    ($ty:ty, $apply:ident, $get:ident, $list:ident, $delete:ident) => {
        pub fn $apply(&mut self, object: $ty, project: &str) -> RegistryResult<()> {
            self.apply(object, project)
        }

        pub fn $get(&self, name: &str, project: &str) -> RegistryResult<$ty> {
            self.get::<$ty>(name, project)
        }

        pub fn $list(&self, project: &str) -> Vec<$ty> {
            self.list::<$ty>(project)
        }

        pub fn $delete(&mut self, name: &str, project: &str) -> RegistryResult<()> {
            self.delete::<$ty>(name, project)
        }
    };
}

/// Project-scoped catalog of feature definitions
pub struct Registry {
    catalog: Catalog,
    store: Box<dyn RegistryStore>,
    config: RegistryConfig,
    /// Version of the last snapshot read or written
    version: u64,
    /// Set while the catalog is a fail-open stand-in for an unreachable backend
    degraded: bool,
    cache: CacheState,
    stats: RegistryStats,
}

impl std::fmt::Debug for Registry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Registry")
            .field("store", &self.store.name())
            .field("version", &self.version)
            .field("objects", &self.catalog.object_count())
            .finish()
    }
}

impl Registry {
    /// Create a registry over `store`; the resident catalog starts empty
    pub fn new(store: impl RegistryStore + 'static, config: RegistryConfig) -> Self {
        let cache = CacheState::new(config.cache_ttl());
        Self {
            catalog: Catalog::default(),
            store: Box::new(store),
            config,
            version: 0,
            degraded: false,
            cache,
            stats: RegistryStats::default(),
        }
    }

    /// Registry that persists nothing
    pub fn in_memory() -> Self {
        Self::new(MemoryRegistryStore::new(), RegistryConfig::memory())
    }

    /// Validate `config`, connect the configured backend and load its snapshot
    pub async fn from_config(config: RegistryConfig) -> RegistryResult<Self> {
        config.validate()?;

        let mut registry = match config.backend {
            RegistryBackend::Memory => Self::new(MemoryRegistryStore::new(), config),
            RegistryBackend::File => {
                let path = config.path.clone().unwrap_or_default();
                Self::new(FileRegistryStore::new(path)?, config)
            }
            #[cfg(feature = "postgres")]
            RegistryBackend::Postgres => {
                match crate::postgres::PostgresRegistryStore::from_config(&config).await {
                    Ok(store) => Self::new(store, config),
                    Err(RegistryError::BackendUnavailable(reason)) if config.fail_open => {
                        warn!(%reason, "registry backend unavailable, starting with an empty in-memory catalog");
                        let mut registry = Self::new(MemoryRegistryStore::new(), config);
                        registry.cache.mark_loaded();
                        return Ok(registry);
                    }
                    Err(e) => return Err(e),
                }
            }
            #[cfg(not(feature = "postgres"))]
            RegistryBackend::Postgres => {
                return Err(RegistryError::BackendUnavailable(
                    "postgres backend requires the 'postgres' feature".to_string(),
                ))
            }
        };

        registry.refresh().await?;
        Ok(registry)
    }

    pub fn config(&self) -> &RegistryConfig {
        &self.config
    }

    /// Version of the last snapshot read or written
    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn stats(&self) -> RegistryStats {
        self.stats
    }

    /// Owned copy of the whole resident catalog
    pub fn catalog(&self) -> Catalog {
        self.catalog.clone()
    }

    // =========================================================================
    // Persistence
    // =========================================================================

    /// Replace the resident catalog with the backend's latest snapshot
    ///
    /// A missing snapshot yields an empty catalog. When the backend is
    /// unreachable the error propagates unless `fail_open` is set, in which
    /// case the registry continues with an empty catalog at version 0 and
    /// refuses to commit until a later refresh succeeds.
    pub async fn refresh(&mut self) -> RegistryResult<()> {
        if !self.store.is_persistent() {
            self.cache.mark_loaded();
            return Ok(());
        }

        let bytes = match self.store.read_snapshot().await {
            Ok(bytes) => bytes,
            Err(RegistryError::BackendUnavailable(reason)) if self.config.fail_open => {
                warn!(
                    backend = self.store.name(),
                    %reason,
                    "registry backend unavailable, continuing with an empty catalog at version 0; commits are refused until a refresh succeeds"
                );
                self.catalog = Catalog::default();
                self.version = 0;
                self.degraded = true;
                self.cache.mark_loaded();
                return Ok(());
            }
            Err(e) => return Err(e),
        };

        match bytes {
            Some(bytes) => {
                let snapshot = Snapshot::decode(&bytes)?;
                debug!(
                    backend = self.store.name(),
                    version = snapshot.version,
                    "loaded registry snapshot"
                );
                self.version = snapshot.version;
                self.catalog = snapshot.catalog;
            }
            None => {
                debug!(backend = self.store.name(), "no registry snapshot yet");
                self.version = 0;
                self.catalog = Catalog::default();
            }
        }

        self.degraded = false;
        self.cache.mark_loaded();
        self.stats.refreshes += 1;
        Ok(())
    }

    /// Refresh only if the resident catalog is older than the cache TTL
    pub async fn refresh_if_stale(&mut self) -> RegistryResult<bool> {
        if !self.cache.is_expired() {
            self.stats.fresh_hits += 1;
            return Ok(false);
        }
        self.refresh().await?;
        Ok(true)
    }

    /// Write the resident catalog as a new snapshot version
    ///
    /// Fails with `BackendUnavailable` while the catalog is a fail-open
    /// stand-in, so an empty catalog never overwrites the real snapshot.
    pub async fn commit(&mut self) -> RegistryResult<()> {
        if self.degraded {
            return Err(RegistryError::BackendUnavailable(format!(
                "{} backend was unreachable at the last refresh; refresh before committing",
                self.store.name()
            )));
        }
        let snapshot = Snapshot::new(self.version + 1, self.catalog.clone());
        let bytes = snapshot.encode()?;
        self.store.write_snapshot(&bytes).await?;

        self.version = snapshot.version;
        self.cache.mark_loaded();
        self.stats.commits += 1;
        info!(
            backend = self.store.name(),
            version = self.version,
            objects = self.catalog.object_count(),
            "committed registry snapshot"
        );
        Ok(())
    }

    /// Irreversibly drop everything the backend and the registry hold
    pub async fn teardown(&mut self) -> RegistryResult<()> {
        self.store.teardown().await?;
        self.catalog = Catalog::default();
        self.version = 0;
        self.degraded = false;
        warn!(backend = self.store.name(), "registry torn down");
        Ok(())
    }

    // =========================================================================
    // Generic object operations
    // =========================================================================

    /// Insert `object` into its kind's namespace of `project`
    ///
    /// Feature views go through [`Registry::apply_feature_view`] and the typed
    /// wrappers, which also enforce cross-kind name uniqueness.
    pub(crate) fn apply<T: Catalogued>(&mut self, object: T, project: &str) -> RegistryResult<()> {
        object.validate()?;
        if T::namespace(&self.catalog).contains(project, object.name()) {
            return Err(RegistryError::duplicate(T::KIND, object.name(), project));
        }
        self.insert(object, project);
        Ok(())
    }

    /// Owned copy of the named object
    pub fn get<T: Catalogued>(&self, name: &str, project: &str) -> RegistryResult<T> {
        T::namespace(&self.catalog)
            .get(project, name)
            .cloned()
            .ok_or_else(|| RegistryError::not_found(T::KIND, name, project))
    }

    /// Owned copies of every object of this kind in `project`, ordered by name
    pub fn list<T: Catalogued>(&self, project: &str) -> Vec<T> {
        T::namespace(&self.catalog).iter(project).cloned().collect()
    }

    pub(crate) fn delete<T: Catalogued>(&mut self, name: &str, project: &str) -> RegistryResult<()> {
        T::namespace_mut(&mut self.catalog)
            .remove(project, name)
            .ok_or_else(|| RegistryError::not_found(T::KIND, name, project))?;
        debug!(kind = %T::KIND, name, project, "deleted");
        self.touch_project(project, Utc::now());
        Ok(())
    }

    fn insert<T: Catalogued>(&mut self, mut object: T, project: &str) {
        let now = Utc::now();
        let meta = object.meta_mut();
        meta.created_timestamp.get_or_insert(now);
        meta.last_updated_timestamp = Some(now);
        let name = object.name().to_string();
        debug!(kind = %T::KIND, name = %name, project, "applied");
        T::namespace_mut(&mut self.catalog).insert(project, name, object);
        self.touch_project(project, now);
    }

    /// Record project metadata on first use, refresh its timestamp afterwards
    fn touch_project(&mut self, project: &str, now: DateTime<Utc>) {
        self.catalog
            .project_metadata
            .entry(project.to_string())
            .and_modify(|meta| {
                if now > meta.last_updated_timestamp {
                    meta.last_updated_timestamp = now;
                }
            })
            .or_insert_with(|| {
                info!(project, "registered new project");
                ProjectMetadata {
                    project_name: project.to_string(),
                    project_uuid: uuid::Uuid::new_v4().to_string(),
                    last_updated_timestamp: now,
                }
            });
    }

    // =========================================================================
    // Typed object operations
    // =========================================================================

    kind_operations!(Entity, apply_entity, get_entity, list_entities, delete_entity);
    kind_operations!(
        DataSource,
        apply_data_source,
        get_data_source,
        list_data_sources,
        delete_data_source
    );
    kind_operations!(
        FeatureService,
        apply_feature_service,
        get_feature_service,
        list_feature_services,
        delete_feature_service
    );
    kind_operations!(
        SavedDataset,
        apply_saved_dataset,
        get_saved_dataset,
        list_saved_datasets,
        delete_saved_dataset
    );
    kind_operations!(
        ValidationReference,
        apply_validation_reference,
        get_validation_reference,
        list_validation_references,
        delete_validation_reference
    );

    // =========================================================================
    // Feature views
    // =========================================================================

    /// Apply any feature view into its kind's namespace
    pub fn apply_feature_view(
        &mut self,
        view: impl Into<FeatureView>,
        project: &str,
    ) -> RegistryResult<()> {
        let view = view.into();
        if self.config.unique_feature_view_names {
            self.check_unique_view_name(view.name(), project)?;
        }
        match view {
            FeatureView::Batch(v) => self.apply(v, project),
            FeatureView::Stream(v) => self.apply(v, project),
            FeatureView::OnDemand(v) => self.apply(v, project),
            FeatureView::Request(v) => self.apply(v, project),
        }
    }

    fn check_unique_view_name(&self, name: &str, project: &str) -> RegistryResult<()> {
        let kinds = [
            (
                ObjectKind::BatchFeatureView,
                self.catalog.batch_feature_views.contains(project, name),
            ),
            (
                ObjectKind::StreamFeatureView,
                self.catalog.stream_feature_views.contains(project, name),
            ),
            (
                ObjectKind::OnDemandFeatureView,
                self.catalog.on_demand_feature_views.contains(project, name),
            ),
            (
                ObjectKind::RequestFeatureView,
                self.catalog.request_feature_views.contains(project, name),
            ),
        ];
        match kinds.into_iter().find(|(_, exists)| *exists) {
            Some((kind, _)) => Err(RegistryError::duplicate(kind, name, project)),
            None => Ok(()),
        }
    }

    pub fn get_feature_view(&self, name: &str, project: &str) -> RegistryResult<BatchFeatureView> {
        self.get(name, project)
    }

    pub fn get_stream_feature_view(
        &self,
        name: &str,
        project: &str,
    ) -> RegistryResult<StreamFeatureView> {
        self.get(name, project)
    }

    pub fn get_on_demand_feature_view(
        &self,
        name: &str,
        project: &str,
    ) -> RegistryResult<OnDemandFeatureView> {
        self.get(name, project)
    }

    pub fn get_request_feature_view(
        &self,
        name: &str,
        project: &str,
    ) -> RegistryResult<RequestFeatureView> {
        self.get(name, project)
    }

    pub fn list_feature_views(&self, project: &str) -> Vec<BatchFeatureView> {
        self.list(project)
    }

    pub fn list_stream_feature_views(&self, project: &str) -> Vec<StreamFeatureView> {
        self.list(project)
    }

    pub fn list_on_demand_feature_views(&self, project: &str) -> Vec<OnDemandFeatureView> {
        self.list(project)
    }

    pub fn list_request_feature_views(&self, project: &str) -> Vec<RequestFeatureView> {
        self.list(project)
    }

    /// Feature views of one kind, named by its string form
    /// (`batch`, `stream`, `on_demand`, `request`)
    pub fn list_feature_views_by_kind(
        &self,
        kind: &str,
        project: &str,
    ) -> RegistryResult<Vec<FeatureView>> {
        let kind: FeatureViewKind = kind
            .parse()
            .map_err(|_| RegistryError::UnknownObjectKind(kind.to_string()))?;

        let views = match kind {
            FeatureViewKind::Batch => self.wrap_views::<BatchFeatureView>(project),
            FeatureViewKind::Stream => self.wrap_views::<StreamFeatureView>(project),
            FeatureViewKind::OnDemand => self.wrap_views::<OnDemandFeatureView>(project),
            FeatureViewKind::Request => self.wrap_views::<RequestFeatureView>(project),
        };
        Ok(views)
    }

    /// Every feature view of `project`, batch first, then stream, on demand, request
    pub fn list_all_feature_views(&self, project: &str) -> Vec<FeatureView> {
        let mut views = self.wrap_views::<BatchFeatureView>(project);
        views.extend(self.wrap_views::<StreamFeatureView>(project));
        views.extend(self.wrap_views::<OnDemandFeatureView>(project));
        views.extend(self.wrap_views::<RequestFeatureView>(project));
        views
    }

    fn wrap_views<T>(&self, project: &str) -> Vec<FeatureView>
    where
        T: Catalogued + Into<FeatureView>,
    {
        T::namespace(&self.catalog)
            .iter(project)
            .cloned()
            .map(Into::into)
            .collect()
    }

    /// Delete the first feature view named `name`, searching stream, batch,
    /// on demand, then request views
    pub fn delete_feature_view(&mut self, name: &str, project: &str) -> RegistryResult<()> {
        let removed = self
            .catalog
            .stream_feature_views
            .remove(project, name)
            .map(|_| ObjectKind::StreamFeatureView)
            .or_else(|| {
                self.catalog
                    .batch_feature_views
                    .remove(project, name)
                    .map(|_| ObjectKind::BatchFeatureView)
            })
            .or_else(|| {
                self.catalog
                    .on_demand_feature_views
                    .remove(project, name)
                    .map(|_| ObjectKind::OnDemandFeatureView)
            })
            .or_else(|| {
                self.catalog
                    .request_feature_views
                    .remove(project, name)
                    .map(|_| ObjectKind::RequestFeatureView)
            });

        match removed {
            Some(kind) => {
                debug!(%kind, name, project, "deleted");
                self.touch_project(project, Utc::now());
                Ok(())
            }
            None => Err(RegistryError::not_found(
                ObjectKind::BatchFeatureView,
                name,
                project,
            )),
        }
    }

    // =========================================================================
    // Materialization
    // =========================================================================

    /// Record that `[start, end]` of a batch or stream view was materialized
    pub fn apply_materialization(
        &mut self,
        view_name: &str,
        project: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> RegistryResult<()> {
        let now = Utc::now();
        let interval = MaterializationInterval { start, end };

        if let Some(view) = self.catalog.batch_feature_views.get_mut(project, view_name) {
            view.materialization_intervals.push(interval);
            view.meta.touch(now);
        } else if let Some(view) = self.catalog.stream_feature_views.get_mut(project, view_name) {
            view.materialization_intervals.push(interval);
            view.meta.touch(now);
        } else {
            return Err(RegistryError::not_found(
                ObjectKind::BatchFeatureView,
                view_name,
                project,
            ));
        }

        debug!(view = view_name, project, %start, %end, "recorded materialization");
        self.touch_project(project, now);
        Ok(())
    }

    // =========================================================================
    // Project metadata, infra and user metadata
    // =========================================================================

    /// Metadata of `project`, or of every known project when `None`
    pub fn list_project_metadata(&self, project: Option<&str>) -> Vec<ProjectMetadata> {
        self.catalog
            .project_metadata
            .values()
            .filter(|meta| project.map_or(true, |p| meta.project_name == p))
            .cloned()
            .collect()
    }

    pub fn update_infra(&mut self, infra: Infra, project: &str) {
        self.catalog.infra.insert(project.to_string(), infra);
        self.touch_project(project, Utc::now());
    }

    /// Infra of `project`; empty if never set
    pub fn get_infra(&self, project: &str) -> Infra {
        self.catalog.infra.get(project).cloned().unwrap_or_default()
    }

    /// Attach opaque bytes to a batch or stream feature view
    pub fn apply_user_metadata(
        &mut self,
        project: &str,
        view_name: &str,
        metadata: Vec<u8>,
    ) -> RegistryResult<()> {
        self.require_materializable(view_name, project)?;
        self.catalog
            .user_metadata
            .entry(project.to_string())
            .or_default()
            .insert(view_name.to_string(), metadata);
        Ok(())
    }

    pub fn get_user_metadata(&self, project: &str, view_name: &str) -> RegistryResult<Option<Vec<u8>>> {
        self.require_materializable(view_name, project)?;
        Ok(self
            .catalog
            .user_metadata
            .get(project)
            .and_then(|views| views.get(view_name))
            .cloned())
    }

    fn require_materializable(&self, view_name: &str, project: &str) -> RegistryResult<()> {
        if self.catalog.batch_feature_views.contains(project, view_name)
            || self.catalog.stream_feature_views.contains(project, view_name)
        {
            Ok(())
        } else {
            Err(RegistryError::not_found(
                ObjectKind::BatchFeatureView,
                view_name,
                project,
            ))
        }
    }
}
