use std::io;
use std::path::PathBuf;

use anyhow::Result;
use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::Shell;
use fdpack_installer::{
    install_package, payload_entry_count, read_manifest, uninstall_package,
    workspace_root_from_env, UninstallStatus, WorkspaceLayout,
};
use fdpack_registry::PackageDatabase;

mod render;

use render::{
    format_conflict_lines, format_record_lines, print_error, print_status, start_progress,
};


#[derive(Parser, Debug)]
#[command(name = "fdpack")]
#[command(about = "Framework distribution package installer", long_about = None)]
struct Cli {
    /// Workspace root. Defaults to the WORKSPACE environment variable.
    #[arg(long, global = true)]
    workspace: Option<PathBuf>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Create an empty package registry in the workspace.
    Init,
    /// Install a distribution package archive into the workspace.
    Install {
        archive: PathBuf,
        /// Destination directory, relative to the workspace root.
        #[arg(long = "to")]
        to: String,
        /// Skip conflict reconciliation; the escape hatch for reinstalling
        /// over a known prior version.
        #[arg(long)]
        force: bool,
    },
    /// Remove an installed package and its registry record.
    Uninstall { name: String },
    /// List installed packages.
    List,
    /// Show the identity embedded in a package archive without installing.
    Info { archive: PathBuf },
    /// Emit a shell completion script on stdout.
    Completions { shell: Shell },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Init => {
            let workspace = resolve_workspace(cli.workspace)?;
            let registry_file = workspace.registry_path();
            if registry_file.exists() {
                print_status("ok", &format!("registry already present: {}", registry_file.display()));
                return Ok(());
            }
            PackageDatabase::create_empty(&registry_file)?;
            print_status("created", &format!("{}", registry_file.display()));
        }
        Commands::Install { archive, to, force } => {
            let workspace = resolve_workspace(cli.workspace)?;
            let total = payload_entry_count(&archive)?;
            let progress = start_progress("install", total);

            let outcome = install_package(&workspace, &archive, &to, force, &mut |_| {
                progress.inc(1)
            });
            progress.finish_and_clear();

            match outcome {
                Ok(report) => {
                    print_status(
                        "installed",
                        &format!(
                            "{} {} ({} files) -> {}",
                            report.manifest.name,
                            report.manifest.version,
                            report.installed_files.len(),
                            report.install_path
                        ),
                    );
                }
                Err(err) => {
                    print_error(&err.to_string());
                    for line in format_conflict_lines(err.conflicting_records()) {
                        eprintln!("{line}");
                    }
                    return Err(err.into());
                }
            }
        }
        Commands::Uninstall { name } => {
            let workspace = resolve_workspace(cli.workspace)?;
            let report = uninstall_package(&workspace, &name)?;
            match report.status {
                UninstallStatus::NotInstalled => {
                    print_status("skipped", &format!("{} is not installed", report.name));
                }
                UninstallStatus::Uninstalled => {
                    print_status(
                        "uninstalled",
                        &format!(
                            "{} {}",
                            report.name,
                            report.version.as_deref().unwrap_or("")
                        ),
                    );
                }
                UninstallStatus::RepairedStaleState => {
                    print_status(
                        "repaired",
                        &format!("{} had a stale registry record; record dropped", report.name),
                    );
                }
            }
        }
        Commands::List => {
            let workspace = resolve_workspace(cli.workspace)?;
            let registry_file = workspace.registry_path();
            if !registry_file.exists() {
                println!("No packages installed");
                return Ok(());
            }

            let database = PackageDatabase::open(&registry_file)?;
            if database.count() == 0 {
                println!("No packages installed");
                return Ok(());
            }
            for line in format_record_lines(database.list()) {
                println!("{line}");
            }
        }
        Commands::Info { archive } => {
            let manifest = read_manifest(&archive)?;
            println!("name:    {}", manifest.name);
            println!("version: {}", manifest.version);
            println!("guid:    {}", manifest.guid);
        }
        Commands::Completions { shell } => {
            let mut command = Cli::command();
            clap_complete::generate(shell, &mut command, "fdpack", &mut io::stdout());
        }
    }

    Ok(())
}

fn resolve_workspace(flag: Option<PathBuf>) -> Result<WorkspaceLayout> {
    let root = match flag {
        Some(root) => root,
        None => workspace_root_from_env()?,
    };
    Ok(WorkspaceLayout::new(root))
}
