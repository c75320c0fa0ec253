use std::{io, path::PathBuf};

use clap::{Parser, ValueEnum};
use color_eyre as ey;
use ey::eyre::{eyre, Context};
use shade_content::{shader::discover_shaders, FileSystem, ReadAsset, Shader, SyncConfig, Synchronizer};
use shade_shared::log::{self, error, info};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct CommandLineArguments {
    /// Most verbose level of the log messages that are printed
    #[arg(short, long, value_enum, default_value_t = LogLevel::Info, global = true)]
    log_level: LogLevel,

    #[clap(subcommand)]
    command: Command,
}

#[derive(Parser, Debug)]
enum Command {
    /// Lists all shaders generated by Shade and whether their material exists
    List(ListCommand),
    /// Creates or updates the materials of the shaders generated by Shade
    Sync(SyncCommand),
}

#[derive(Parser, Debug)]
struct ListCommand {
    /// Root directory of the assets
    root: PathBuf,

    /// Prefix of the shader names that Shade generates
    #[arg(long, default_value = "Shade/")]
    shader_name_prefix: String,
}

#[derive(Parser, Debug)]
struct SyncCommand {
    /// Root directory of the assets
    root: PathBuf,

    /// Shader to synchronize, relative to the root directory. All shaders are synchronized when omitted.
    #[arg(short, long)]
    shader: Vec<PathBuf>,

    /// Prefix of the shader names that Shade generates
    #[arg(long, default_value = "Shade/")]
    shader_name_prefix: String,

    /// Name of the graph descriptor next to every shader
    #[arg(long, default_value = "Graph.json")]
    descriptor_file_name: String,

    /// Extension of the images that back the texture nodes
    #[arg(long, default_value = "png")]
    image_extension: String,
}

#[derive(ValueEnum, Debug, Clone, Copy)]
enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<LogLevel> for log::LevelFilter {
    fn from(value: LogLevel) -> Self {
        match value {
            LogLevel::Error => log::LevelFilter::Error,
            LogLevel::Warn => log::LevelFilter::Warn,
            LogLevel::Info => log::LevelFilter::Info,
            LogLevel::Debug => log::LevelFilter::Debug,
            LogLevel::Trace => log::LevelFilter::Trace,
        }
    }
}

/// Loads the selected shaders. Shaders that can't be loaded or that aren't generated by Shade are
/// logged and counted as failures.
fn load_shaders<S: ReadAsset>(store: &S, paths: &[PathBuf], prefix: &str) -> (Vec<Shader>, usize) {
    let mut shaders = Vec::new();
    let mut failures = 0;
    for path in paths {
        match Shader::load(store, path.as_path()) {
            Ok(Some(shader)) if shader.name().starts_with(prefix) => shaders.push(shader),
            Ok(Some(shader)) => {
                error!("Shader '{}' in '{}' isn't prefixed with '{prefix}'", shader.name(), path.display());
                failures += 1;
            }
            Ok(None) => {
                error!("No shader declaration in '{}'", path.display());
                failures += 1;
            }
            Err(err) => {
                error!("Failed to load shader '{}': {err}", path.display());
                failures += 1;
            }
        }
    }
    (shaders, failures)
}

fn main() -> ey::Result<()> {
    let command_line_arguments = CommandLineArguments::parse();

    // Setup logging
    fern::Dispatch::new()
        .format(|out, message, record| {
            out.finish(format_args!(
                "{}[{}][{}] {}",
                shade_shared::chrono::Local::now().format("[%Y-%m-%d][%H:%M:%S]"),
                record.target(),
                record.level(),
                message
            ))
        })
        .level(command_line_arguments.log_level.into())
        .chain(io::stdout())
        .apply()
        .map_err(|err| io::Error::new(io::ErrorKind::Other, err))?;

    match &command_line_arguments.command {
        Command::List(list) => {
            let shaders = discover_shaders(&list.root, &list.shader_name_prefix).wrap_err("Failed to discover shaders")?;
            let mut file_system = FileSystem::new(&list.root).wrap_err("Failed to open the asset directory")?;
            let config = SyncConfig {
                shader_name_prefix: list.shader_name_prefix.clone(),
                ..SyncConfig::default()
            };
            let synchronizer = Synchronizer::with_config(&mut file_system, config);
            for shader in &shaders {
                let state = if synchronizer.material_exists(shader) {
                    "material exists"
                } else {
                    "no material"
                };
                println!(
                    "{}\t{}\t{}",
                    shader.short_name(&list.shader_name_prefix),
                    shader.asset_key().as_str(),
                    state
                );
            }
        }
        Command::Sync(sync) => {
            let mut file_system = FileSystem::new(&sync.root).wrap_err("Failed to open the asset directory")?;

            let mut failures = 0;
            let shaders = if sync.shader.is_empty() {
                discover_shaders(&sync.root, &sync.shader_name_prefix).wrap_err("Failed to discover shaders")?
            } else {
                let (shaders, load_failures) = load_shaders(&file_system, &sync.shader, &sync.shader_name_prefix);
                failures += load_failures;
                shaders
            };

            let config = SyncConfig {
                descriptor_file_name: sync.descriptor_file_name.clone(),
                image_extension: sync.image_extension.clone(),
                shader_name_prefix: sync.shader_name_prefix.clone(),
                ..SyncConfig::default()
            };
            let total = shaders.len() + failures;
            let results = Synchronizer::with_config(&mut file_system, config).synchronize_all(shaders);
            for (shader, result) in &results {
                if let Ok(report) = result {
                    let verb = if report.created { "Created" } else { "Updated" };
                    info!(
                        "{verb} {} for '{}': {} textures bound, {} missing",
                        report.material.as_str(),
                        shader.name(),
                        report.bound.len(),
                        report.skipped.len()
                    );
                }
            }
            failures += results.iter().filter(|(_, result)| result.is_err()).count();

            if failures > 0 {
                return Err(eyre!("Failed to synchronize {failures} of {total} shaders"));
            }
            info!("Synchronized {total} shaders");
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use shade_content::MemoryStore;

    use super::*;

    #[test]
    fn selected_shaders_need_prefix() {
        let mut store = MemoryStore::new();
        store.insert("Shade/Foo/Foo.shader", "Shader \"Shade/Foo\" {}");
        store.insert("Custom/Foo/Foo.shader", "Shader \"Custom/Foo\" {}");
        store.insert("Empty/Empty.shader", "");
        let paths = ["Shade/Foo/Foo.shader", "Custom/Foo/Foo.shader", "Empty/Empty.shader", "Missing/Missing.shader"]
            .map(PathBuf::from);

        let (shaders, failures) = load_shaders(&store, &paths, "Shade/");
        assert_eq!(shaders, vec![Shader::new("Shade/Foo/Foo.shader", "Shade/Foo")]);
        assert_eq!(failures, 3);
    }
}
