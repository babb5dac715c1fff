//! guide-lint: check deployment guides and their translations.
//!
//! Two modes:
//!
//! - **stdin mode**: `guide-lint < guide.md` parses one bilingual document
//!   with `<!-- @lang:xx -->` markers.
//! - **file mode**: `guide-lint solutions/*/guide*.md` groups `guide.md`,
//!   `guide_zh.md`, ... per directory and checks each group's structure.

use anyhow::{Context, Result};
use clap::{ArgAction, Parser};
use deploy_guide::render::{self, GuideReport};
use deploy_guide::{
    parse_bilingual_with, parse_multilang_with, split_by_language, MergeConfig, ParseResult,
    StructureValidationResult,
};
use regex::Regex;
use std::collections::BTreeMap;
use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::LazyLock;

#[derive(Parser)]
#[command(
    name = "guide-lint",
    about = "Check Markdown deployment guides and keep their translations in sync"
)]
struct Cli {
    /// Guide files, directories or glob patterns. If omitted, reads from stdin.
    files: Vec<String>,

    /// Output format: text (default), json
    #[arg(short = 'f', long, default_value = "text")]
    format: String,

    /// Write the report to a file instead of stdout
    #[arg(short = 'o', long)]
    output: Option<PathBuf>,

    /// Language of files without a `_<code>` suffix
    #[arg(long, default_value = "en")]
    lang: String,

    /// Base language for structure checks (default: en, else the first code)
    #[arg(long)]
    base: Option<String>,

    /// Codes read as language suffixes (`guide_<code>.md`). Comma separated
    /// or repeated; a region part (`zh-cn`) is matched on its first code.
    #[arg(
        long = "lang-code",
        value_delimiter = ',',
        default_values_t = DEFAULT_LANG_CODES.map(String::from)
    )]
    lang_codes: Vec<String>,

    /// More logging on stderr (-v debug, -vv trace)
    #[arg(short = 'v', long, action = ArgAction::Count)]
    verbose: u8,
}

const DEFAULT_LANG_CODES: [&str; 10] = ["en", "zh", "ja", "ko", "de", "fr", "es", "pt", "ru", "it"];

/// `guide_zh.md`, `README_zh-cn.md`
static RE_LANG_SUFFIX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^(.+)_([a-z]{2}(?:-[a-z]{2,4})?)$").unwrap());

fn main() -> Result<ExitCode> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let config = MergeConfig {
        base_language: cli.base.clone(),
    };
    let reports = if cli.files.is_empty() {
        stdin_mode(&config)?
    } else {
        file_mode(&cli, &config)?
    };

    let renderer = render::create_renderer(&cli.format)?;
    let output = renderer.render(&reports)?;
    match &cli.output {
        Some(path) => fs::write(path, &output)
            .with_context(|| format!("failed to write {}", path.display()))?,
        None => print!("{}", output),
    }

    if reports.iter().all(GuideReport::is_ok) {
        Ok(ExitCode::SUCCESS)
    } else {
        Ok(ExitCode::FAILURE)
    }
}

fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => tracing::Level::INFO,
        1 => tracing::Level::DEBUG,
        _ => tracing::Level::TRACE,
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(io::stderr)
        .with_target(false)
        .init();
}

/// stdin mode: one document, legacy bilingual format.
fn stdin_mode(config: &MergeConfig) -> Result<Vec<GuideReport>> {
    let mut input = String::new();
    io::stdin()
        .read_to_string(&mut input)
        .context("failed to read stdin")?;

    let (result, validation) = parse_bilingual_with(&input, config);
    Ok(vec![report("<stdin>".to_string(), result, validation)])
}

/// Structure results are only shown when at least two languages were compared.
fn report(source: String, result: ParseResult, validation: StructureValidationResult) -> GuideReport {
    let compared = validation.presets.len() > 1;
    GuideReport {
        source,
        result,
        validation: compared.then_some(validation),
    }
}

/// file mode: group translations of the same guide and check each group.
fn file_mode(cli: &Cli, config: &MergeConfig) -> Result<Vec<GuideReport>> {
    let input_files = expand_inputs(&cli.files)?;

    let mut groups: BTreeMap<PathBuf, BTreeMap<String, (PathBuf, String)>> = BTreeMap::new();
    for path in input_files {
        let content = fs::read_to_string(&path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        let (key, lang) = group_key(&path, &cli.lang, &cli.lang_codes);
        let group = groups.entry(key).or_default();
        if let Some((previous, _)) = group.get(&lang) {
            eprintln!(
                "warning: {} and {} are both '{}'; using {}",
                previous.display(),
                path.display(),
                lang,
                path.display()
            );
        }
        group.insert(lang, (path, content));
    }

    let mut reports = Vec::new();
    for (key, files) in groups {
        tracing::debug!(guide = %key.display(), languages = files.len(), "checking");
        reports.push(check_group(&key, files, config));
    }
    Ok(reports)
}

fn check_group(
    key: &Path,
    files: BTreeMap<String, (PathBuf, String)>,
    config: &MergeConfig,
) -> GuideReport {
    if files.len() == 1 {
        if let Some((path, content)) = files.values().next() {
            if split_by_language(content).has_markers {
                let (result, validation) = parse_bilingual_with(content, config);
                return report(path.display().to_string(), result, validation);
            }
        }
    }

    let source = match files.values().next() {
        Some((path, _)) if files.len() == 1 => path.display().to_string(),
        _ => key.display().to_string(),
    };
    let texts: BTreeMap<String, String> = files
        .into_iter()
        .map(|(lang, (_, content))| (lang, content))
        .collect();
    let (result, validation) = parse_multilang_with(&texts, config);
    report(source, result, validation)
}

/// Group key (directory joined with the base stem) and language of a file.
/// Only suffixes whose code is in `codes` count as languages.
fn group_key(path: &Path, default_lang: &str, codes: &[String]) -> (PathBuf, String) {
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_default();
    let dir = path.parent().unwrap_or_else(|| Path::new(""));

    if let Some(caps) = RE_LANG_SUFFIX.captures(&stem) {
        let lang = caps[2].to_lowercase();
        let primary = lang.split('-').next().unwrap_or_default();
        if codes.iter().any(|code| code.eq_ignore_ascii_case(primary)) {
            return (dir.join(&caps[1]), lang);
        }
    }
    (dir.join(&stem), default_lang.to_lowercase())
}

/// Expand glob patterns and directories into a sorted list of Markdown files.
fn expand_inputs(patterns: &[String]) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for pattern in patterns {
        let path = Path::new(pattern);
        if path.is_dir() {
            let dir_pattern = path.join("*.md");
            let dir_pattern = dir_pattern.to_string_lossy();
            for entry in glob::glob(&dir_pattern)
                .with_context(|| format!("invalid directory: {}", pattern))?
            {
                files.push(entry.with_context(|| format!("failed to read {}", pattern))?);
            }
            continue;
        }

        let matches: Vec<_> = glob::glob(pattern)
            .with_context(|| format!("invalid glob pattern: {}", pattern))?
            .collect();
        if matches.is_empty() {
            // Not a glob, treat as literal path
            files.push(PathBuf::from(pattern));
        } else {
            for entry in matches {
                files.push(entry.with_context(|| format!("failed to resolve glob: {}", pattern))?);
            }
        }
    }
    files.sort();
    files.dedup();
    Ok(files)
}
