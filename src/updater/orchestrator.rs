//! Init, update and upgrade of an installation
//!
//! Every cycle follows the same path: resolve the package, pick the target
//! release, download it, run `before` scripts, extract over the working
//! directory, run `after` scripts, then record the new version. The
//! downloaded archive is closed and deleted whatever the outcome.

use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use crate::archive::inspector::{Archive, ArchiveOptions, base_folder};
use crate::archive::manifest::{HookPhase, ManifestConfig};
use crate::config::{self, MANIFEST_FILE, MAX_CREDENTIAL_PROMPTS};
use crate::repository::client::RepositoryClient;
use crate::repository::credentials::{CredentialStore, Credentials};
use crate::repository::error::RegistryError;
use crate::repository::registry::Repository;
use crate::repository::types::PackageDescriptor;
use crate::state::InstallState;
use crate::updater::error::UpdaterError;
use crate::updater::hooks::{HookRunner, ShellHookRunner};
use crate::updater::prompt::{Prompter, TerminalPrompter};
use crate::version::error::VersionError;
use crate::version::resolver;
use crate::version::semver::{is_dev_branch, is_strict};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UpdateOptions {
    /// Keep applying releases until none is left in the current major line
    pub all: bool,
    /// Fall back to the development branch when no release is pending
    pub dev: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UpgradeOptions {
    /// Upgrade to this release instead of the next major version
    pub version: Option<String>,
    /// Upgrade to the development branch
    pub dev: bool,
}

/// Result of an update run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdateReport {
    /// Number of releases applied
    pub processed: usize,
    /// Recorded version after the run
    pub version: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UpgradeOutcome {
    /// Releases in the current major line must be applied first
    UpdatesPending,
    NoUpgrades,
    Upgraded(String),
}

pub struct Updater<R: Repository> {
    working_dir: PathBuf,
    manifest: ManifestConfig,
    repository: R,
    credentials: CredentialStore,
    hooks: Box<dyn HookRunner>,
    prompter: Box<dyn Prompter>,
    interactive: bool,
}

impl Updater<RepositoryClient> {
    /// Open the installation in `working_dir` using its `updater.json` and the
    /// configured credential files
    pub fn open(working_dir: impl AsRef<Path>) -> Result<Self, UpdaterError> {
        let working_dir = working_dir.as_ref();
        let working_dir = std::fs::canonicalize(working_dir)
            .ok()
            .filter(|dir| dir.is_dir())
            .ok_or_else(|| UpdaterError::InvalidDirectory(working_dir.to_path_buf()))?;

        let manifest = load_manifest(&working_dir)?;
        let credentials = CredentialStore::load(
            &config::credential_files(&working_dir),
            config::local_credentials_path(&working_dir),
        )?;

        let mut repository = RepositoryClient::new(manifest.url(), None)?;
        if let Some(host) = repository.host()
            && let Some(found) = credentials.get(&host)
        {
            debug!("Using stored credentials for {}", host);
            repository.set_credentials(Some(found.clone()));
        }

        Ok(Self::build(working_dir, manifest, repository, credentials))
    }
}

impl<R: Repository> Updater<R> {
    /// Assemble an updater from its parts, running hooks in the shell and
    /// prompting on the terminal
    pub fn build(
        working_dir: impl Into<PathBuf>,
        manifest: ManifestConfig,
        repository: R,
        credentials: CredentialStore,
    ) -> Self {
        Self {
            working_dir: working_dir.into(),
            manifest,
            repository,
            credentials,
            hooks: Box::new(ShellHookRunner),
            prompter: Box::new(TerminalPrompter::new()),
            interactive: true,
        }
    }

    pub fn with_hooks(mut self, hooks: impl HookRunner + 'static) -> Self {
        self.hooks = Box::new(hooks);
        self
    }

    pub fn with_prompter(mut self, prompter: impl Prompter + 'static) -> Self {
        self.prompter = Box::new(prompter);
        self
    }

    /// Allow or forbid asking the operator for input
    pub fn interactive(mut self, interactive: bool) -> Self {
        self.interactive = interactive;
        self
    }

    pub fn working_dir(&self) -> &Path {
        &self.working_dir
    }

    pub fn manifest(&self) -> &ManifestConfig {
        &self.manifest
    }

    /// Initialize the installation at `version`, asking for it when missing
    /// or malformed. Checks whether the repository needs credentials first.
    pub async fn init(&mut self, version: Option<&str>) -> Result<InstallState, UpdaterError> {
        if InstallState::exists(&self.working_dir) {
            return Err(UpdaterError::AlreadyInitialized(self.working_dir.clone()));
        }

        let version = self.starting_version(version).await?;
        self.authenticate().await?;

        let state = InstallState::new(version);
        state.save(&self.working_dir)?;
        info!(
            package = self.manifest.package(),
            version = %state.version,
            "Updater initialized"
        );

        Ok(state)
    }

    /// Apply the next pending release, or every pending release with `all`
    pub async fn update(&mut self, options: &UpdateOptions) -> Result<UpdateReport, UpdaterError> {
        let mut state = self.load_state()?;
        let mut processed = 0;

        loop {
            info!(
                package = self.manifest.package(),
                version = %state.version,
                "Checking for updates"
            );
            let package = self.repository.resolve(self.manifest.package()).await?;

            let mut next = resolver::next(&state.version, &package.releases())?;
            if next.is_none() && options.dev {
                next = package.dev_release().map(str::to_string);
            }
            let Some(next) = next else {
                break;
            };

            self.process(&package, &next, &mut state).await?;
            processed += 1;

            // A development branch is never recorded, so it can't be moved past
            if !options.all || is_dev_branch(&next) {
                break;
            }
        }

        Ok(UpdateReport {
            processed,
            version: state.version,
        })
    }

    /// Move to the next major version. Refused while releases of the current
    /// major line are still pending.
    pub async fn upgrade(
        &mut self,
        options: &UpgradeOptions,
    ) -> Result<UpgradeOutcome, UpdaterError> {
        let mut state = self.load_state()?;

        info!(
            package = self.manifest.package(),
            version = %state.version,
            "Checking for upgrades"
        );
        let package = self.repository.resolve(self.manifest.package()).await?;
        let releases = package.releases();

        if let Some(pending) = resolver::next(&state.version, &releases)? {
            info!("Update to {} is available, not upgrading", pending);
            return Ok(UpgradeOutcome::UpdatesPending);
        }

        let target = if let Some(version) = &options.version {
            package.release(version)?;
            Some(version.clone())
        } else if options.dev {
            package.dev_release().map(str::to_string)
        } else {
            resolver::next_major(&state.version, &releases)?
        };

        let Some(target) = target else {
            return Ok(UpgradeOutcome::NoUpgrades);
        };

        self.process(&package, &target, &mut state).await?;
        Ok(UpgradeOutcome::Upgraded(target))
    }

    fn load_state(&self) -> Result<InstallState, UpdaterError> {
        if !InstallState::exists(&self.working_dir) {
            return Err(UpdaterError::NotInitialized(self.working_dir.clone()));
        }
        Ok(InstallState::load(&self.working_dir)?)
    }

    async fn starting_version(&self, version: Option<&str>) -> Result<String, UpdaterError> {
        if let Some(version) = version.filter(|v| is_strict(v)) {
            return Ok(version.to_string());
        }

        if !self.interactive {
            return Err(match version {
                Some(version) => VersionError::InvalidVersion(version.to_string()).into(),
                None => UpdaterError::VersionRequired,
            });
        }

        loop {
            let answer = self
                .prompter
                .ask("What version number would you like to start at, e.g. 1.0.0?")
                .await
                .map_err(UpdaterError::Prompt)?;

            match answer {
                Some(answer) if is_strict(&answer) => return Ok(answer),
                Some(answer) => warn!("Invalid version {:?}", answer),
                None => return Err(UpdaterError::VersionRequired),
            }
        }
    }

    /// Check access to the repository until it accepts our credentials, asking for new
    /// ones after each rejection
    async fn authenticate(&mut self) -> Result<(), UpdaterError> {
        let mut attempts = 0;

        loop {
            match self.check_access().await {
                Ok(()) => return Ok(()),
                Err(e)
                    if e.is_unauthorized()
                        && self.interactive
                        && attempts < MAX_CREDENTIAL_PROMPTS =>
                {
                    attempts += 1;
                    warn!("The repository requires authentication");
                    self.ask_for_credentials().await?;
                }
                Err(e) => return Err(e),
            }
        }
    }

    /// Resolve the package and download its first release
    async fn check_access(&self) -> Result<(), UpdaterError> {
        let package = self.repository.resolve(self.manifest.package()).await?;

        let Some(first) = package.releases().into_iter().next() else {
            debug!("{} has no releases to download", package.name());
            return Ok(());
        };

        let dist = package.dist(&first)?;
        let path = self.repository.download_archive(&dist.url).await?;
        remove_download(&path);

        Ok(())
    }

    async fn ask_for_credentials(&mut self) -> Result<(), UpdaterError> {
        let username = self.ask_required("Username:").await?;
        let password = self.ask_required("Password:").await?;
        let credentials = Credentials::new(username, password);

        let host = self.repository.host().unwrap_or_default();
        self.credentials.store(&host, credentials.clone())?;
        self.repository.set_credentials(Some(credentials));

        Ok(())
    }

    async fn ask_required(&self, question: &str) -> Result<String, UpdaterError> {
        self.prompter
            .ask(question)
            .await
            .map_err(UpdaterError::Prompt)?
            .ok_or_else(|| {
                UpdaterError::Prompt(std::io::Error::new(
                    std::io::ErrorKind::UnexpectedEof,
                    "input closed",
                ))
            })
    }

    /// Download, apply and record one release
    async fn process(
        &mut self,
        package: &PackageDescriptor,
        version: &str,
        state: &mut InstallState,
    ) -> Result<(), UpdaterError> {
        info!(package = package.name(), version, "Downloading");
        let mut archive = self.fetch_archive(package, version).await?;

        let applied = self.apply(&mut archive, version).await;

        let path = archive.path().to_path_buf();
        if let Err(e) = archive.delete() {
            warn!("Failed to remove {:?}: {}", path, e);
        }
        applied?;

        if is_dev_branch(version) {
            info!("Installed {}, keeping recorded version {}", version, state.version);
        } else {
            state.record(version);
            state.save(&self.working_dir)?;
            info!(package = package.name(), version, "Updated");
        }

        Ok(())
    }

    /// Download a release archive, asking for credentials once if the
    /// repository rejects the download
    async fn fetch_archive(
        &mut self,
        package: &PackageDescriptor,
        version: &str,
    ) -> Result<Archive, UpdaterError> {
        let release = package.release(version)?;
        let dist = package.dist(version)?;

        let path = match self.repository.download_archive(&dist.url).await {
            Err(RegistryError::Unauthorized(url)) if self.interactive => {
                warn!("Authentication required to download {}", url);
                self.ask_for_credentials().await?;
                self.repository.download_archive(&dist.url).await?
            }
            result => result?,
        };

        let name = if release.name.is_empty() {
            package.name()
        } else {
            release.name.as_str()
        };
        let options = ArchiveOptions {
            base_folder: base_folder(&dist.url, name, dist.reference.as_deref()),
            package: Some(package.name().to_string()),
            version: Some(version.to_string()),
        };

        Archive::open(&path, options).map_err(|e| {
            remove_download(&path);
            e.into()
        })
    }

    async fn apply(&self, archive: &mut Archive, version: &str) -> Result<(), UpdaterError> {
        if !archive.has_manifest() {
            return Err(UpdaterError::InvalidPackage(version.to_string()));
        }
        let manifest = archive.manifest()?;

        self.run_hooks(&manifest, HookPhase::Before).await;

        info!("Extracting {} to {:?}", version, self.working_dir);
        archive.extract(&self.working_dir)?;

        self.run_hooks(&manifest, HookPhase::After).await;

        Ok(())
    }

    /// Run a phase's scripts in order. Failures are logged and never abort
    /// the update.
    async fn run_hooks(&self, manifest: &ManifestConfig, phase: HookPhase) {
        let commands = manifest.scripts(phase);
        if commands.is_empty() {
            return;
        }

        info!("Running {} scripts", phase);
        for command in commands {
            info!("> {}", command);
            match self.hooks.run(command, &self.working_dir).await {
                Ok(output) => {
                    for line in output.stdout.lines() {
                        info!("{}", line);
                    }
                    for line in output.stderr.lines() {
                        warn!("{}", line);
                    }
                    if !output.success() {
                        warn!("Script `{}` exited with status {:?}", command, output.status);
                    }
                }
                Err(e) => warn!("Failed to run script `{}`: {}", command, e),
            }
        }
    }
}

fn load_manifest(working_dir: &Path) -> Result<ManifestConfig, UpdaterError> {
    let path = working_dir.join(MANIFEST_FILE);
    if !path.is_file() {
        return Err(UpdaterError::ManifestMissing(working_dir.to_path_buf()));
    }
    Ok(ManifestConfig::load(&path)?)
}

fn remove_download(path: &Path) {
    if let Err(e) = std::fs::remove_file(path) {
        warn!("Failed to remove {:?}: {}", path, e);
    }
}
