//! CLI: schema → (signature | example | doc)
use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use colored::Colorize;
use emmyrc_doc::render::markdown::MarkdownSink;
use emmyrc_doc::sig::{self, Token};
use emmyrc_doc::{document, render_example, AutoDocOptions, ExampleKind, Loader, LoaderOptions, Registry};

// ————————————————————————————————————————————————————————————————————————————
// TYPES
// ————————————————————————————————————————————————————————————————————————————

/// document a JSON-Schema settings schema: type signatures, example configs and Markdown reference pages
#[derive(Parser, Debug)]
pub struct CommandLineInterface {
    /// more logging on stderr (-v info, -vv debug); RUST_LOG takes precedence
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// print the type signature of a schema entry point
    Signature(SignatureOut),
    /// synthesize an example configuration document
    Example(ExampleOut),
    /// render Markdown documentation
    Doc(DocOut),
}

#[derive(Args, Debug, Clone)]
struct SchemaSettings {
    /// root schema file
    #[arg(long, required = true)]
    schema: PathBuf,

    /// name the root schema is registered under; `$ref`s and entry points use it
    #[arg(long, default_value = "EmmyRc")]
    root_name: String,

    /// further schema documents, registered under their file name. May be quoted glob patterns
    #[arg(long, num_args = 1..)]
    resource: Vec<String>,

    /// extension keyword marking a property as a user-level setting
    #[arg(long, default_value = emmyrc_doc::loader::DEFAULT_USER_SETTING_KEYWORD)]
    user_setting_keyword: String,
}

#[derive(clap::Parser, Debug)]
struct SignatureOut {
    #[command(flatten)]
    schema_settings: SchemaSettings,

    /// entry point, e.g. `EmmyRc` or `EmmyRc#/$defs/Strict`
    uri: String,

    /// plain output without highlighting
    #[arg(long)]
    no_color: bool,
}

#[derive(clap::Parser, Debug)]
struct ExampleOut {
    #[command(flatten)]
    schema_settings: SchemaSettings,

    /// entry point, e.g. `EmmyRc`
    uri: String,

    /// which settings to include
    #[arg(long, value_enum, default_value_t = ExampleKind::All)]
    kind: ExampleKind,

    /// output .json file (stdout if omitted)
    #[arg(short, long)]
    out: Option<PathBuf>,
}

#[derive(clap::Parser, Debug)]
struct DocOut {
    #[command(flatten)]
    schema_settings: SchemaSettings,

    /// entry point, e.g. `EmmyRc`
    uri: String,

    /// document nested settings and every shared type
    #[arg(long)]
    recursive: bool,

    /// list the root's properties at the top level
    #[arg(long)]
    unwrap: bool,

    /// page title
    #[arg(long)]
    title: Option<String>,

    /// skip an entry: `URI` or `"URI path"` (repeatable)
    #[arg(long)]
    exclude: Vec<String>,

    /// output .md file (stdout if omitted)
    #[arg(short, long)]
    out: Option<PathBuf>,
}

// ————————————————————————————————————————————————————————————————————————————
// IMPLEMENTATION
// ————————————————————————————————————————————————————————————————————————————

impl SchemaSettings {
    fn loader(&self) -> anyhow::Result<Loader> {
        let mut registry = Registry::new()
            .with_json_file(self.root_name.as_str(), &self.schema)
            .with_context(|| format!("failed to load root schema {}", self.schema.display()))?;
        for path in resolve_file_path_patterns(&self.resource)? {
            let name = path
                .file_name()
                .map(|name| name.to_string_lossy().into_owned())
                .with_context(|| format!("resource path has no file name: {}", path.display()))?;
            tracing::info!(%name, path = %path.display(), "registering schema resource");
            registry = registry.with_json_file(name, &path)?;
        }
        let options = LoaderOptions { user_setting_keyword: self.user_setting_keyword.clone() };
        Ok(Loader::with_options(registry.crawl(), options))
    }
}

impl CommandLineInterface {
    pub fn load() -> Self {
        Self::parse()
    }

    pub fn verbosity(&self) -> u8 {
        self.verbose
    }

    pub fn run(&self) -> anyhow::Result<()> {
        match &self.cmd {
            Command::Signature(target) => {
                let mut loader = target.schema_settings.loader()?;
                let root = loader
                    .load(&target.uri)
                    .with_context(|| format!("failed to load `{}`", target.uri))?;
                let printed = root.print(Some(&loader), false);
                if target.no_color {
                    println!("{}", sig::normalize(&printed));
                } else {
                    println!("{}", highlight(&printed));
                }
                Ok(())
            }
            Command::Example(target) => {
                let mut loader = target.schema_settings.loader()?;
                let root = loader
                    .load(&target.uri)
                    .with_context(|| format!("failed to load `{}`", target.uri))?;
                let example = render_example(&loader, &root, target.kind);
                write_output(target.out.as_deref(), &example)
            }
            Command::Doc(target) => {
                let mut loader = target.schema_settings.loader()?;
                let options = AutoDocOptions {
                    recursive: target.recursive,
                    unwrap: target.unwrap,
                    title: target.title.clone(),
                    exclude: target.exclude.clone(),
                };
                let mut sink = MarkdownSink::new();
                document(&mut loader, &target.uri, &options, &mut sink)
                    .with_context(|| format!("failed to document `{}`", target.uri))?;
                write_output(target.out.as_deref(), &sink.finish())
            }
        }
    }
}

// ————————————————————————————————————————————————————————————————————————————
// INTERNAL HELPERS
// ————————————————————————————————————————————————————————————————————————————

fn highlight(signature: &str) -> String {
    sig::tokenize(signature)
        .iter()
        .map(|token| {
            let text = token.display();
            match token {
                Token::Str(_) => text.green().to_string(),
                Token::Number(_) => text.yellow().to_string(),
                Token::Keyword { .. } => text.blue().to_string(),
                Token::Name(_) => text.cyan().bold().to_string(),
                Token::Ellipsis | Token::Punct(_) | Token::OtherPunct(_) | Token::Other(_) => text,
            }
        })
        .collect::<String>()
        .trim()
        .to_owned()
}

fn write_output(out: Option<&Path>, contents: &str) -> anyhow::Result<()> {
    let Some(out) = out else {
        println!("{contents}");
        return Ok(());
    };
    if let Some(parent) = out.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }
    std::fs::write(out, contents).with_context(|| format!("failed to write {}", out.display()))?;
    tracing::info!(path = %out.display(), "wrote output");
    Ok(())
}

fn resolve_file_path_patterns<I>(patterns: I) -> anyhow::Result<Vec<PathBuf>>
where
    I: IntoIterator,
    I::Item: AsRef<str>,
{
    fn has_glob_chars(s: &str) -> bool {
        s.bytes().any(|b| matches!(b, b'*' | b'?' | b'[' | b'{'))
    }

    let mut out = Vec::<PathBuf>::new();

    for raw in patterns {
        let pattern = raw.as_ref();

        if has_glob_chars(pattern) {
            let mut matched_any = false;
            for entry in glob::glob(pattern).with_context(|| format!("invalid glob pattern: {pattern}"))? {
                out.push(entry?);
                matched_any = true;
            }
            if !matched_any {
                anyhow::bail!("glob pattern matched no files: {pattern}");
            }
        } else {
            out.push(PathBuf::from(pattern));
        }
    }

    Ok(out)
}
