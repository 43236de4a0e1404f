use std::error::Error;
use std::path::{Path, PathBuf};
use clap::{Parser, Subcommand};

use crate::config::ConversionConfig;
use crate::convert::{CancellationToken, ConversionRequest, Converter};
use crate::pass::system::Warning;
use crate::render::{HtmlBundleBuilder, OutputFormat};
use crate::resolve::MatchPolicy;
use crate::resource::ResourceSet;

#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    Convert(ConvertCli),
    Archive(ArchiveCli),
    Build(BuildCli),
    BaseDir(BaseDirCli),
}

/// Options shared by every command that produces a document.
#[derive(clap::Args, Debug)]
pub struct OutputArgs {
    /// The output file.
    #[arg(long)]
    output: PathBuf,
    /// Write recorded warnings to this file as JSON.
    #[arg(long)]
    report: Option<PathBuf>,
    /// How image and stylesheet references are matched to resource files.
    #[arg(long, value_enum)]
    policy: Option<MatchPolicy>,
    #[arg(long, value_enum, default_value_t = OutputFormat::Html)]
    format: OutputFormat,
    /// Document title.
    #[arg(long)]
    title: Option<String>,
}

/// Convert an HTML file with its resources on disk.
#[derive(Parser, Debug)]
pub struct ConvertCli {
    #[arg(long)]
    html: PathBuf,
    /// Array of file paths or unix style glob patterns.
    #[arg(long, num_args = 1..)]
    resource: Vec<String>,
    #[command(flatten)]
    out: OutputArgs,
}

/// Convert an uploaded `.zip` bundle.
#[derive(Parser, Debug)]
pub struct ArchiveCli {
    #[arg(long)]
    input: PathBuf,
    #[command(flatten)]
    out: OutputArgs,
}

/// Convert using a `docpack.toml` manifest.
#[derive(Parser, Debug)]
pub struct BuildCli {
    #[arg(long)]
    pub manifest: PathBuf,
}

/// Print the common base directory of the given paths.
#[derive(Parser, Debug)]
pub struct BaseDirCli {
    #[arg(num_args = 1..)]
    paths: Vec<PathBuf>,
}

impl Cli {
    pub fn execute(self) -> Result<(), Box<dyn Error>> {
        match self.command {
            Command::Convert(convert_cli) => convert_cli.execute(),
            Command::Archive(archive_cli) => archive_cli.execute(),
            Command::Build(build_cli) => build_cli.execute(),
            Command::BaseDir(base_dir_cli) => base_dir_cli.execute(),
        }
    }
}

impl ConvertCli {
    pub fn execute(self) -> Result<(), Box<dyn Error>> {
        let resources = crate::path_utils::resolve_file_path_patterns(&self.resource)?
            .into_iter()
            .collect::<ResourceSet>();
        let job = Job::from_args(&self.out, ConversionConfig::default());
        job.run(&self.html, resources)
    }
}

impl ArchiveCli {
    pub fn execute(self) -> Result<(), Box<dyn Error>> {
        let upload = crate::archive::extract_to_temp(&self.input)?;
        let job = Job::from_args(&self.out, ConversionConfig::default());
        job.run(&upload.upload.html_path, upload.upload.resources.clone())
    }
}

impl BuildCli {
    pub fn execute(self) -> Result<(), Box<dyn Error>> {
        let manifest_dir = self.manifest.parent().unwrap_or(Path::new("."));
        let manifest = crate::manifest::load_project_manifest(&self.manifest)?.rooted_at(manifest_dir);
        let resources = crate::path_utils::resolve_file_path_patterns(&manifest.resources)?
            .into_iter()
            .collect::<ResourceSet>();
        let job = Job {
            config: manifest.conversion,
            format: OutputFormat::default(),
            title: manifest.title,
            output: manifest.output,
            report: manifest.report,
        };
        job.run(&manifest.html, resources)
    }
}

impl BaseDirCli {
    pub fn execute(self) -> Result<(), Box<dyn Error>> {
        let base = crate::path_utils::common_base_directory(&self.paths);
        println!("{}", base.display());
        Ok(())
    }
}

// ————————————————————————————————————————————————————————————————————————————
// JOB
// ————————————————————————————————————————————————————————————————————————————

struct Job {
    config: ConversionConfig,
    format: OutputFormat,
    title: Option<String>,
    output: PathBuf,
    report: Option<PathBuf>,
}

impl Job {
    fn from_args(args: &OutputArgs, mut config: ConversionConfig) -> Self {
        if let Some(policy) = args.policy {
            config.policy = policy;
        }
        Job {
            config,
            format: args.format,
            title: args.title.clone(),
            output: args.output.clone(),
            report: args.report.clone(),
        }
    }

    fn run(self, html_path: &Path, resources: ResourceSet) -> Result<(), Box<dyn Error>> {
        let html_content = std::fs::read_to_string(html_path)?;
        let title = self.title
            .or_else(|| {
                html_path.file_stem().map(|stem| stem.to_string_lossy().into_owned())
            })
            .unwrap_or_default();
        let converter = Converter { config: self.config, format: self.format };
        let request = ConversionRequest { html_content, resources };
        let conversion = converter.convert(
            &request,
            HtmlBundleBuilder::new().with_title(title),
            &CancellationToken::new(),
        )?;
        if let Some(parent) = self.output.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&self.output, &conversion.bytes)?;
        log::info!(
            "wrote {} ({} images, {} warnings)",
            self.output.display(),
            conversion.image_count,
            conversion.warnings.len(),
        );
        if let Some(report) = self.report.as_ref() {
            write_report(report, &conversion.warnings)?;
        }
        Ok(())
    }
}

fn write_report(path: &Path, warnings: &[Warning]) -> Result<(), Box<dyn Error>> {
    let json = serde_json::to_string_pretty(warnings)?;
    std::fs::write(path, json)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_convert_with_resource_globs() {
        let cli = Cli::try_parse_from([
            "docpack", "convert",
            "--html", "index.html",
            "--resource", "img/*.png", "style.css",
            "--output", "out.html",
            "--policy", "suffix",
        ]).unwrap();
        let Command::Convert(convert) = cli.command else { panic!("expected convert") };
        assert_eq!(convert.resource, vec!["img/*.png", "style.css"]);
        assert_eq!(convert.out.policy, Some(MatchPolicy::Suffix));
        assert_eq!(convert.out.format, OutputFormat::Html);
    }

    #[test]
    fn parses_base_dir() {
        let cli = Cli::try_parse_from(["docpack", "base-dir", "/a/b/c.png", "/a/d.png"]).unwrap();
        let Command::BaseDir(base_dir) = cli.command else { panic!("expected base-dir") };
        assert_eq!(base_dir.paths.len(), 2);
    }

    #[test]
    fn policy_flag_overrides_config() {
        let cli = Cli::try_parse_from([
            "docpack", "archive", "--input", "x.zip", "--output", "o.html", "--policy", "suffix",
        ]).unwrap();
        let Command::Archive(archive) = cli.command else { panic!("expected archive") };
        let job = Job::from_args(&archive.out, ConversionConfig::default());
        assert_eq!(job.config.policy, MatchPolicy::Suffix);
    }
}
