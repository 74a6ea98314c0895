use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use std::path::{Path, PathBuf};
use typewriter_config::Config;
use typewriter_engine::outline::{Heading, extract_headings, toc_html, toc_markdown};
use typewriter_engine::render::render;
use typewriter_engine::stats::{count_characters, count_words};
use typewriter_engine::sync::SyncOptions;

#[derive(Parser, Debug)]
#[command(name = "typewriter")]
#[command(about = "Render bidirectional Markdown with a source position map", long_about = None)]
struct Cli {
    /// Config file to use instead of ~/.config/typewriter/config.toml
    #[arg(long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Render a Markdown file to an HTML fragment
    Render {
        file: PathBuf,

        /// Keep the document direction instead of setting it per block
        #[arg(long)]
        no_auto_direction: bool,

        /// Append the char map as a JSON <script> element
        #[arg(long)]
        embed_char_map: bool,

        /// Write here instead of stdout
        #[arg(long, short = 'o', value_name = "FILE")]
        output: Option<PathBuf>,
    },
    /// List the ATX headings of a file
    Outline {
        file: PathBuf,

        #[arg(long, value_enum, default_value_t = OutlineFormat::Markdown)]
        format: OutlineFormat,
    },
    /// Word and character counts
    Stats { file: PathBuf },
    /// Show or create the settings file
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand, Debug, PartialEq, Eq)]
enum ConfigAction {
    /// Print the effective settings
    Show,
    /// Write the default settings file if there is none
    Init,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
enum OutlineFormat {
    Markdown,
    Html,
    Json,
}

fn main() -> Result<()> {
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .init();

    let cli = Cli::parse();
    let config_path = cli.config.clone().unwrap_or_else(Config::config_path);

    match cli.command {
        Command::Render {
            file,
            no_auto_direction,
            embed_char_map,
            output,
        } => {
            let config = load_config(&config_path)?;
            let mut options = sync_options(&config);
            options.auto_direction &= !no_auto_direction;
            let embed = config.render.embed_char_map || embed_char_map;
            let html = render_file(&file, options, embed)?;
            match output {
                Some(path) => std::fs::write(&path, html)
                    .with_context(|| format!("Failed to write {}", path.display()))?,
                None => println!("{html}"),
            }
        }
        Command::Outline { file, format } => {
            let source = read_source(&file)?;
            let headings: Vec<Heading> = extract_headings(&source).collect();
            print!("{}", format_outline(&headings, format)?);
        }
        Command::Stats { file } => {
            let source = read_source(&file)?;
            println!("words: {}", count_words(&source));
            println!("characters: {}", count_characters(&source));
            println!("lines: {}", source.lines().count());
        }
        Command::Config { action } => run_config(action, &config_path)?,
    }
    Ok(())
}

fn load_config(path: &Path) -> Result<Config> {
    let config = Config::load_from_path(path)
        .with_context(|| format!("Failed to load config from {}", path.display()))?;
    Ok(config.unwrap_or_else(|| {
        log::debug!("using default settings");
        Config::default()
    }))
}

/// Engine options for the settings in `config`.
fn sync_options(config: &Config) -> SyncOptions {
    SyncOptions {
        echo_window: config.sync.echo_window(),
        auto_direction: config.editor.auto_direction,
    }
}

fn read_source(file: &Path) -> Result<String> {
    std::fs::read_to_string(file).with_context(|| format!("Failed to read {}", file.display()))
}

fn render_file(file: &Path, options: SyncOptions, embed_char_map: bool) -> Result<String> {
    let source = read_source(file)?;
    let output = render(&source, options.auto_direction);
    log::info!(
        "rendered {} via {:?}: {} wrappers",
        file.display(),
        output.path,
        output.char_map.len()
    );
    if embed_char_map {
        output.embedded_html().context("Failed to serialise char map")
    } else {
        Ok(output.html)
    }
}

fn format_outline(headings: &[Heading], format: OutlineFormat) -> Result<String> {
    Ok(match format {
        OutlineFormat::Markdown => toc_markdown(headings),
        OutlineFormat::Html => toc_html(headings),
        OutlineFormat::Json => serde_json::to_string_pretty(headings)? + "\n",
    })
}

fn run_config(action: ConfigAction, path: &Path) -> Result<()> {
    match action {
        ConfigAction::Show => {
            let config = load_config(path)?;
            println!("# {}", path.display());
            print!("{}", config.to_toml()?);
        }
        ConfigAction::Init => {
            if path.exists() {
                log::info!("{} already exists", path.display());
            } else {
                Config::default().save_to_path(path)?;
                log::info!("wrote {}", path.display());
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    #[test]
    fn parses_render_flags() {
        let cli = Cli::try_parse_from([
            "typewriter",
            "render",
            "notes.md",
            "--no-auto-direction",
            "--embed-char-map",
            "-o",
            "out.html",
        ])
        .unwrap();
        match cli.command {
            Command::Render {
                file,
                no_auto_direction,
                embed_char_map,
                output,
            } => {
                assert_eq!(file, PathBuf::from("notes.md"));
                assert!(no_auto_direction);
                assert!(embed_char_map);
                assert_eq!(output, Some(PathBuf::from("out.html")));
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn outline_format_defaults_to_markdown() {
        let cli = Cli::try_parse_from(["typewriter", "outline", "a.md"]).unwrap();
        assert!(matches!(
            cli.command,
            Command::Outline {
                format: OutlineFormat::Markdown,
                ..
            }
        ));
        let cli = Cli::try_parse_from(["typewriter", "outline", "a.md", "--format", "json"]).unwrap();
        assert!(matches!(
            cli.command,
            Command::Outline {
                format: OutlineFormat::Json,
                ..
            }
        ));
    }

    #[test]
    fn global_config_flag() {
        let cli = Cli::try_parse_from(["typewriter", "config", "show", "--config", "/tmp/c.toml"]).unwrap();
        assert_eq!(cli.config, Some(PathBuf::from("/tmp/c.toml")));
        assert!(matches!(
            cli.command,
            Command::Config {
                action: ConfigAction::Show
            }
        ));
    }

    #[test]
    fn missing_file_argument_is_an_error() {
        assert!(Cli::try_parse_from(["typewriter", "render"]).is_err());
        assert!(Cli::try_parse_from(["typewriter", "outline", "a.md", "--format", "pdf"]).is_err());
    }

    #[test]
    fn render_file_embeds_when_asked() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("doc.md");
        std::fs::write(&file, "# سلام\n\nHello").unwrap();

        let plain = render_file(&file, SyncOptions::default(), false).unwrap();
        assert!(plain.contains(r#"<h1 id="heading-1-سلام""#));
        assert!(!plain.contains("<script"));

        let embedded = render_file(&file, SyncOptions::default(), true).unwrap();
        assert!(embedded.starts_with(&plain));
        assert!(embedded.ends_with("</script>"));
    }

    #[test]
    fn settings_become_sync_options() {
        let mut config = Config::default();
        assert_eq!(sync_options(&config), SyncOptions::default());

        config.sync.echo_suppression_ms = 600;
        config.editor.auto_direction = false;
        let options = sync_options(&config);
        assert_eq!(options.echo_window, std::time::Duration::from_millis(600));
        assert!(!options.auto_direction);
    }

    #[test]
    fn render_without_auto_direction_skips_plain_path() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("doc.md");
        std::fs::write(&file, "سلام دنیا").unwrap();
        let options = SyncOptions {
            auto_direction: false,
            ..SyncOptions::default()
        };
        let html = render_file(&file, options, false).unwrap();
        assert!(!html.contains("markdown-preview"));
        assert!(html.starts_with("<p>"));
    }

    #[test]
    fn render_missing_file_names_it() {
        let err = render_file(Path::new("/nonexistent/doc.md"), SyncOptions::default(), false).unwrap_err();
        assert!(err.to_string().contains("/nonexistent/doc.md"));
    }

    #[test]
    fn outline_json_lists_headings() {
        let headings: Vec<Heading> = extract_headings("# One\n\n## دو").collect();
        let json = format_outline(&headings, OutlineFormat::Json).unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed[1]["text"], "دو");
        assert_eq!(parsed[1]["level"], 2);
        assert_eq!(parsed[1]["line"], 3);
    }

    #[test]
    fn config_init_then_show() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        run_config(ConfigAction::Init, &path).unwrap();
        assert!(path.exists());
        assert_eq!(load_config(&path).unwrap(), Config::default());
        assert!(std::fs::read_to_string(&path).unwrap().contains("[editor]"));
    }
}
