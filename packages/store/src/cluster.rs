//! Clustered process store.
//!
//! Every node keeps its own map of loaded process versions, backed by a
//! [`ConfStore`] that all nodes share. The node that deploys a unit
//! announces it through the [`ClusterManager`]; the other nodes react in
//! [`ClusterProcessStore::publish_service`] by retiring the previous
//! versions they had loaded and loading the new unit from the shared store.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, LazyLock, Mutex, MutexGuard, RwLock, RwLockReadGuard, RwLockWriteGuard};

use chrono::Utc;
use orkest_model::{HeaderValue, ProcessEnvelope, QName};
use orkest_parser::config::PROCESS_FILE_EXTENSION;
use orkest_parser::compile_file;
use regex::Regex;

use crate::conf_store::ConfStore;
use crate::config::StoreConfig;
use crate::error::{Result, StoreError};
use crate::models::{DeploymentUnit, ProcessConf, ProcessState, ProcessStateChange, ProcessStoreEvent};

/// Transport for deployment events between nodes.
pub trait ClusterManager: Send + Sync {
    fn publish_process_store_event(&self, event: ProcessStoreEvent) -> Result<()>;
}

/// Callback for process state changes.
pub type StateListener = Box<dyn Fn(&ProcessStateChange) -> Result<()> + Send + Sync>;

/// A trailing `-N` or `.N` version suffix.
#[allow(clippy::expect_used)] // Static regex that is guaranteed to be valid
static VERSION_SUFFIX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[-.]\d+$").expect("valid regex"));

/// Pattern matching every version of the package family of `du_name`.
///
/// The version suffix of the first path segment (if any) becomes optional
/// and matches any version number; the remaining segments must match
/// literally.
///
/// # Examples
/// ```
/// use orkest_store::cluster::previous_version_pattern;
///
/// let pattern = previous_version_pattern("shop-2/orders").unwrap();
/// assert!(pattern.is_match("shop/orders"));
/// assert!(pattern.is_match("shop.17/orders"));
/// assert!(!pattern.is_match("shop-2/invoices"));
/// assert!(!pattern.is_match("shopping-2/orders"));
/// ```
pub fn previous_version_pattern(du_name: &str) -> Result<Regex> {
    let mut segments = du_name.split('/');
    let first = segments.next().unwrap_or_default();
    let family = VERSION_SUFFIX.replace(first, "");

    let mut pattern = format!(r"^{}([-.]\d+)?", regex::escape(&family));
    for segment in segments {
        pattern.push('/');
        pattern.push_str(&regex::escape(segment));
    }
    pattern.push('$');

    Ok(Regex::new(&pattern)?)
}

/// Process store of one cluster node.
pub struct ClusterProcessStore {
    config: StoreConfig,
    conf_store: Arc<dyn ConfStore>,
    cluster: Arc<dyn ClusterManager>,
    loaded: RwLock<HashMap<QName, ProcessConf>>,
    listeners: RwLock<Vec<StateListener>>,
    /// Serializes deploy and undeploy on this node.
    deployment: Mutex<()>,
}

impl ClusterProcessStore {
    pub fn new(
        config: StoreConfig,
        conf_store: Arc<dyn ConfStore>,
        cluster: Arc<dyn ClusterManager>,
    ) -> Self {
        Self {
            config,
            conf_store,
            cluster,
            loaded: RwLock::new(HashMap::new()),
            listeners: RwLock::new(Vec::new()),
            deployment: Mutex::new(()),
        }
    }

    pub fn node_id(&self) -> &str {
        &self.config.node_id
    }

    /// Register a listener for process state changes.
    pub fn register_listener<F>(&self, listener: F) -> Result<()>
    where
        F: Fn(&ProcessStateChange) -> Result<()> + Send + Sync + 'static,
    {
        self.write_listeners()?.push(Box::new(listener));
        Ok(())
    }

    /// Snapshot of a loaded process.
    pub fn process(&self, process_id: &QName) -> Result<Option<ProcessConf>> {
        Ok(self.read_loaded()?.get(process_id).cloned())
    }

    /// Snapshot of every loaded process, sorted by id.
    pub fn processes(&self) -> Result<Vec<ProcessConf>> {
        let mut processes: Vec<_> = self.read_loaded()?.values().cloned().collect();
        processes.sort_by(|a, b| a.process_id.cmp(&b.process_id));
        Ok(processes)
    }

    /// Deploy a directory of process definitions as one deployment unit.
    ///
    /// Older active versions of the same package family are retired, the
    /// unit is recorded in the shared store and the other nodes are told
    /// about it. A rejected unit changes nothing on this node: the loaded
    /// processes are only touched once the shared store has accepted it.
    pub fn deploy(&self, dir: &Path) -> Result<Vec<QName>> {
        let _guard = self.lock_deployment()?;

        let du_name = deployment_unit_name(dir)?;
        if self.conf_store.get(&du_name)?.is_some() {
            return Err(StoreError::AlreadyDeployed(du_name));
        }

        let files = process_files(dir)?;
        if files.is_empty() {
            return Err(StoreError::EmptyDeploymentUnit(du_name));
        }

        let headers = vec![("deploymentUnit".to_string(), HeaderValue::from(du_name.as_str()))];
        let mut envelopes: Vec<ProcessEnvelope> = Vec::with_capacity(files.len());
        for file in &files {
            let envelope = compile_file(file, &headers).map_err(|source| StoreError::Compile {
                file: file.clone(),
                source,
            })?;
            let process_type = envelope.process.qname();
            if envelopes.iter().any(|e| e.process.qname() == process_type) {
                return Err(StoreError::DuplicateProcess(process_type));
            }
            envelopes.push(envelope);
        }

        let version = self.conf_store.next_version()?;
        let deployed_at = Utc::now();
        let processes: Vec<ProcessConf> = envelopes
            .into_iter()
            .map(|envelope| {
                let envelope = envelope.with_header(
                    "version",
                    HeaderValue::Integer(i64::try_from(version).unwrap_or(i64::MAX)),
                );
                ProcessConf::new(envelope, &du_name, version, deployed_at)
            })
            .collect();

        let du = DeploymentUnit {
            name: du_name.clone(),
            version,
            deployed_at,
            processes,
        };
        let deployed = du.process_ids();
        let new_confs = du.processes.clone();
        // Another node may have claimed the name since the check above.
        self.conf_store.insert_new(du)?;

        let mut changes = self.retire_previous_versions(&du_name)?;
        {
            let mut loaded = self.write_loaded()?;
            for conf in new_confs {
                changes.push(conf.state_change());
                loaded.insert(conf.process_id.clone(), conf);
            }
        }

        tracing::info!(
            deployment_unit = %du_name,
            version,
            processes = deployed.len(),
            "Deployed"
        );

        self.fire_state_changes(&changes);
        self.cluster
            .publish_process_store_event(ProcessStoreEvent::Deployed {
                deployment_unit: du_name,
                node: self.config.node_id.clone(),
            })?;

        Ok(deployed)
    }

    /// Deploy every subdirectory of the configured deploy directory that is
    /// not deployed yet.
    pub fn deploy_all(&self) -> Result<Vec<QName>> {
        let Some(root) = &self.config.deploy_dir else {
            return Err(StoreError::Config("no deploy directory configured".into()));
        };

        let mut dirs: Vec<PathBuf> = fs::read_dir(root)?
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|path| path.is_dir())
            .collect();
        dirs.sort();

        let mut deployed = Vec::new();
        for dir in dirs {
            let du_name = deployment_unit_name(&dir)?;
            if self.conf_store.get(&du_name)?.is_some() {
                tracing::debug!(deployment_unit = %du_name, "Already deployed, skipping");
                continue;
            }
            deployed.extend(self.deploy(&dir)?);
        }
        Ok(deployed)
    }

    /// React to a unit deployed on another node.
    ///
    /// Retires the loaded active versions of the unit's package family,
    /// loads the unit from the shared store and notifies listeners for every
    /// affected process. Failures are logged, never propagated.
    pub fn publish_service(&self, du_name: &str) -> Vec<QName> {
        let mut changes = match self.retire_previous_versions(du_name) {
            Ok(changes) => changes,
            Err(e) => {
                tracing::error!(deployment_unit = %du_name, error = %e, "Error retiring previous versions");
                Vec::new()
            }
        };

        match self.load_from_store(du_name) {
            Ok(loaded) => changes.extend(loaded),
            Err(e) => {
                tracing::error!(deployment_unit = %du_name, error = %e, "Error loading DU from store");
            }
        }

        self.fire_state_changes(&changes);
        changes.into_iter().map(|c| c.process_id).collect()
    }

    /// Undeploy a deployment unit and tell the other nodes.
    pub fn undeploy(&self, dir: &Path) -> Result<Vec<QName>> {
        let _guard = self.lock_deployment()?;
        let du_name = deployment_unit_name(dir)?;

        let mut undeployed = match self.conf_store.remove(&du_name)? {
            Some(du) => du.process_ids(),
            None => {
                tracing::warn!(deployment_unit = %du_name, "Undeploying unknown deployment unit");
                Vec::new()
            }
        };
        for id in self.drop_loaded(&du_name)? {
            if !undeployed.contains(&id) {
                undeployed.push(id);
            }
        }

        tracing::info!(deployment_unit = %du_name, processes = undeployed.len(), "Undeployed");

        self.cluster
            .publish_process_store_event(ProcessStoreEvent::Undeployed {
                deployment_unit: du_name,
                node: self.config.node_id.clone(),
            })?;
        Ok(undeployed)
    }

    /// Drop the loaded processes of a unit undeployed on another node.
    pub fn undeploy_processes(&self, du_name: &str) -> Result<Vec<QName>> {
        let undeployed = self.drop_loaded(du_name)?;
        tracing::info!(deployment_unit = %du_name, processes = undeployed.len(), "Unloaded processes");
        Ok(undeployed)
    }

    /// Retire every loaded active process of the package family of `du_name`.
    fn retire_previous_versions(&self, du_name: &str) -> Result<Vec<ProcessStateChange>> {
        let pattern = previous_version_pattern(du_name)?;
        let mut changes = Vec::new();

        let mut loaded = self.write_loaded()?;
        for conf in loaded.values_mut() {
            if conf.is_active() && pattern.is_match(&conf.package) {
                conf.state = ProcessState::Retired;
                tracing::info!(process = %conf.process_id, package = %conf.package, "Retired");
                changes.push(conf.state_change());
            }
        }
        drop(loaded);

        for package in changes.iter().map(|c| c.package.as_str()) {
            self.persist_state(package)?;
        }
        Ok(changes)
    }

    /// Write the loaded state of a unit's processes back to the shared store.
    fn persist_state(&self, package: &str) -> Result<()> {
        let Some(mut du) = self.conf_store.get(package)? else {
            return Ok(());
        };
        {
            let loaded = self.read_loaded()?;
            for conf in &mut du.processes {
                if let Some(current) = loaded.get(&conf.process_id) {
                    conf.state = current.state;
                }
            }
        }
        self.conf_store.put(du)
    }

    fn load_from_store(&self, du_name: &str) -> Result<Vec<ProcessStateChange>> {
        let Some(du) = self.conf_store.get(du_name)? else {
            tracing::debug!(deployment_unit = %du_name, "Deployment unit not in store");
            return Ok(Vec::new());
        };

        let mut loaded = self.write_loaded()?;
        Ok(du
            .processes
            .into_iter()
            .map(|conf| {
                let change = conf.state_change();
                loaded.insert(conf.process_id.clone(), conf);
                change
            })
            .collect())
    }

    fn drop_loaded(&self, du_name: &str) -> Result<Vec<QName>> {
        let mut loaded = self.write_loaded()?;
        let ids: Vec<QName> = loaded
            .values()
            .filter(|conf| conf.package == du_name)
            .map(|conf| conf.process_id.clone())
            .collect();
        for id in &ids {
            loaded.remove(id);
        }
        Ok(ids)
    }

    /// Notify every listener of every change. A failing listener is logged
    /// and the remaining notifications still go out.
    fn fire_state_changes(&self, changes: &[ProcessStateChange]) {
        let listeners = match self.listeners.read() {
            Ok(listeners) => listeners,
            Err(_) => {
                tracing::error!("Listener lock poisoned, dropping state change notifications");
                return;
            }
        };
        for change in changes {
            for listener in listeners.iter() {
                if let Err(e) = listener(change) {
                    tracing::error!(
                        process = %change.process_id,
                        package = %change.package,
                        error = %e,
                        "Error with process retiring or activating"
                    );
                }
            }
        }
    }

    fn read_loaded(&self) -> Result<RwLockReadGuard<'_, HashMap<QName, ProcessConf>>> {
        self.loaded
            .read()
            .map_err(|_| StoreError::LockPoisoned("loaded processes"))
    }

    fn write_loaded(&self) -> Result<RwLockWriteGuard<'_, HashMap<QName, ProcessConf>>> {
        self.loaded
            .write()
            .map_err(|_| StoreError::LockPoisoned("loaded processes"))
    }

    fn lock_deployment(&self) -> Result<MutexGuard<'_, ()>> {
        self.deployment
            .lock()
            .map_err(|_| StoreError::LockPoisoned("deployment"))
    }

    fn write_listeners(&self) -> Result<RwLockWriteGuard<'_, Vec<StateListener>>> {
        self.listeners
            .write()
            .map_err(|_| StoreError::LockPoisoned("listeners"))
    }
}

/// Deployment unit name: the directory's own name.
fn deployment_unit_name(dir: &Path) -> Result<String> {
    dir.file_name()
        .and_then(|name| name.to_str())
        .map(str::to_string)
        .ok_or_else(|| StoreError::InvalidDeploymentUnit(dir.to_path_buf()))
}

/// Process definition files directly inside `dir`, sorted.
fn process_files(dir: &Path) -> Result<Vec<PathBuf>> {
    if !dir.is_dir() {
        return Err(StoreError::InvalidDeploymentUnit(dir.to_path_buf()));
    }
    let mut files: Vec<PathBuf> = fs::read_dir(dir)?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|path| {
            path.is_file() && path.extension().is_some_and(|ext| ext == PROCESS_FILE_EXTENSION)
        })
        .collect();
    files.sort();
    Ok(files)
}

/// [`ClusterManager`] that keeps published events in memory.
#[derive(Debug, Default)]
pub struct InMemoryClusterManager {
    events: RwLock<Vec<ProcessStoreEvent>>,
}

impl InMemoryClusterManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Remove and return every event published so far.
    pub fn take_events(&self) -> Result<Vec<ProcessStoreEvent>> {
        let mut events = self
            .events
            .write()
            .map_err(|_| StoreError::LockPoisoned("cluster events"))?;
        Ok(std::mem::take(&mut *events))
    }
}

impl ClusterManager for InMemoryClusterManager {
    fn publish_process_store_event(&self, event: ProcessStoreEvent) -> Result<()> {
        tracing::debug!(?event, "Publishing process store event");
        self.events
            .write()
            .map_err(|_| StoreError::LockPoisoned("cluster events"))?
            .push(event);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pattern_strips_one_version_suffix() {
        let pattern = previous_version_pattern("order-2.1").unwrap();
        assert!(pattern.is_match("order-2"));
        assert!(pattern.is_match("order-2.7"));
        assert!(!pattern.is_match("order-3"));
        assert!(!pattern.is_match("order-2.1/extra"));
    }

    #[test]
    fn test_pattern_without_version() {
        let pattern = previous_version_pattern("billing").unwrap();
        assert!(pattern.is_match("billing"));
        assert!(pattern.is_match("billing-12"));
        assert!(!pattern.is_match("billingX"));
        assert!(!pattern.is_match("xbilling"));
    }

    #[test]
    fn test_pattern_escapes_literals() {
        let pattern = previous_version_pattern("a+b-1/c.d").unwrap();
        assert!(pattern.is_match("a+b/c.d"));
        assert!(pattern.is_match("a+b.4/c.d"));
        assert!(!pattern.is_match("aab/c.d"));
        assert!(!pattern.is_match("a+b/cxd"));
    }

    #[test]
    fn test_deployment_unit_name() {
        assert_eq!(
            deployment_unit_name(Path::new("/srv/deploy/shop-3")).unwrap(),
            "shop-3"
        );
        assert!(matches!(
            deployment_unit_name(Path::new("/")),
            Err(StoreError::InvalidDeploymentUnit(_))
        ));
    }

    #[test]
    fn test_in_memory_cluster_manager() {
        let cluster = InMemoryClusterManager::new();
        cluster
            .publish_process_store_event(ProcessStoreEvent::Deployed {
                deployment_unit: "du".to_string(),
                node: "n".to_string(),
            })
            .unwrap();
        assert_eq!(cluster.take_events().unwrap().len(), 1);
        assert!(cluster.take_events().unwrap().is_empty());
    }
}
