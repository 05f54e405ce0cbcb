mod create;
mod list;
mod update;

pub use create::create;
pub use list::{list, list_entries};
pub use update::update;

use anyhow::Result;
use std::path::{Path, PathBuf};

use crate::config::Config;
use crate::remote::{Catalog, MountedRemote};
use crate::runtime::Runtime;
use crate::runtime::path::absolutize;

/// Configuration plus the working directory every command resolves paths against.
pub(crate) struct Workspace {
    pub config: Config,
    pub cwd: PathBuf,
}

impl Workspace {
    pub fn load<R: Runtime>(runtime: &R, config_path: Option<&Path>) -> Result<Self> {
        let cwd = runtime.current_dir()?;
        let config_path = config_path.map(|p| absolutize(&cwd, p));
        let config = Config::load(runtime, config_path.as_deref())?;
        Ok(Self { config, cwd })
    }

    pub fn catalog<'a, R: Runtime>(
        &self,
        runtime: &'a R,
    ) -> Catalog<'a, R, MountedRemote<'a, R>> {
        let remote = MountedRemote::new(runtime, self.cwd.join(&self.config.remote_root));
        Catalog::new(
            runtime,
            remote,
            self.config.packets_path.clone(),
            self.config.local_packets_dir(&self.cwd),
        )
    }
}
