use crate::tui;
use color_eyre::config::HookBuilder;
use color_eyre::{eyre, Result};
use directories::ProjectDirs;
use std::panic;
use std::path::PathBuf;

fn project_dirs() -> Result<ProjectDirs> {
    ProjectDirs::from("", "", "zulip-share")
        .ok_or_else(|| eyre::eyre!("failed to determine home directory"))
}

pub fn get_config_dir() -> Result<PathBuf> {
    Ok(project_dirs()?.config_dir().to_path_buf())
}

pub fn get_data_dir() -> Result<PathBuf> {
    Ok(project_dirs()?.data_local_dir().to_path_buf())
}

/// Directory for the instance socket. Falls back to the config dir where the
/// platform has no runtime dir.
pub fn get_runtime_dir() -> Result<PathBuf> {
    let dirs = project_dirs()?;
    Ok(dirs
        .runtime_dir()
        .unwrap_or_else(|| dirs.config_dir())
        .to_path_buf())
}

pub fn initialize_panic_handler() -> Result<()> {
    let (panic_hook, eyre_hook) = HookBuilder::default().into_hooks();
    eyre_hook.install()?;

    let panic_hook = panic_hook.into_panic_hook();
    panic::set_hook(Box::new(move |panic_info| {
        if let Err(e) = tui::restore() {
            log::error!("failed to restore terminal: {e}");
        }
        panic_hook(panic_info);
    }));
    Ok(())
}
