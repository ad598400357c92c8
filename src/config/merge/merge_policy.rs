//! Merge rules: defaults, override order, conflict handling.

use config::Config;
use config::ConfigBuilder;
use config::ConfigError;

/// Create a Config builder with merge policy defaults applied.
///
/// Later sources override earlier ones key by key; tables merge, arrays
/// are replaced wholesale.
pub fn builder_with_defaults() -> Result<ConfigBuilder<config::builder::DefaultState>, ConfigError>
{
    Ok(Config::builder()
        .set_default("git.executable", "git")?
        .set_default("git.clone_root", "tmp/git_repos")?
        .set_default("git.skip_smudge", true)?
        .set_default("git.timeout_secs", 600)?
        .set_default("storage.store_path", ".treesync/store")?
        .set_default("sync.max_concurrent_syncs", 4)?
        .set_default("sync.finalize_on_partial_failure", true)?)
}
