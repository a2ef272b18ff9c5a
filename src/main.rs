use std::path::PathBuf;

use anyhow::{bail, Context};
use clap::{Args, Parser, Subcommand, ValueEnum};

use breakpoint_override::document::HtmlPage;
use breakpoint_override::scheduler::Scheduler;
use breakpoint_override::server::InjectionPoint;
use breakpoint_override::store::{BreakpointInput, ThresholdStore, TomlFileBackend};
use breakpoint_override::{generator, sanitize, BreakpointPair, OverrideConfig};

#[derive(Parser)]
#[command(name = "breakpoint-override", version, about = "Override a theme's responsive breakpoints")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Args)]
struct PairArgs {
    /// Tablet breakpoint in pixels
    #[arg(long)]
    tablet: Option<i64>,
    /// Mobile breakpoint in pixels
    #[arg(long)]
    mobile: Option<i64>,
    /// TOML file holding the persisted breakpoints
    #[arg(long)]
    config: Option<PathBuf>,
}

impl PairArgs {
    /// Explicit values win over the config file, which wins over defaults
    fn resolve(&self) -> BreakpointPair {
        let stored = match &self.config {
            Some(path) => ThresholdStore::new(TomlFileBackend::new(path)).get(),
            None => BreakpointPair::default(),
        };
        sanitize(
            self.tablet.unwrap_or(i64::from(stored.tablet)),
            self.mobile.unwrap_or(i64::from(stored.mobile)),
        )
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum Part {
    All,
    Early,
    Late,
    Footer,
    Script,
}

#[derive(Subcommand)]
enum Command {
    /// Print generated override CSS
    Css {
        #[command(flatten)]
        pair: PairArgs,
        #[arg(long, value_enum, default_value = "all")]
        part: Part,
    },
    /// Rewrite the inline styles of a static HTML page
    Rewrite {
        file: PathBuf,
        #[command(flatten)]
        pair: PairArgs,
        /// Output file (stdout when omitted)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Show the stored breakpoints
    Get {
        #[arg(long)]
        config: PathBuf,
    },
    /// Store new breakpoints
    Set {
        #[arg(long)]
        config: PathBuf,
        #[arg(long)]
        tablet: Option<String>,
        #[arg(long)]
        mobile: Option<String>,
    },
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    match cli.command {
        Command::Css { pair, part } => {
            let pair = pair.resolve();
            let css = match part {
                Part::All => generator::generate(pair),
                Part::Early => InjectionPoint::HeadEarly.css(pair),
                Part::Late => InjectionPoint::HeadLate.css(pair),
                Part::Footer => InjectionPoint::Footer.css(pair),
                Part::Script => generator::script_css(pair),
            };
            print!("{}", css);
        }
        Command::Rewrite { file, pair, output } => {
            let pair = pair.resolve();
            let source = std::fs::read_to_string(&file)
                .with_context(|| format!("failed to read {}", file.display()))?;
            let mut page = HtmlPage::parse(source);
            let report = Scheduler::new(pair, OverrideConfig::default()).run_pass(&mut page);
            eprintln!(
                "rewrote {} style elements ({} declarations) for {}",
                report.modified, report.replacements, pair
            );
            let html = page.render();
            match output {
                Some(path) => std::fs::write(&path, html)
                    .with_context(|| format!("failed to write {}", path.display()))?,
                None => print!("{}", html),
            }
        }
        Command::Get { config } => {
            let store = ThresholdStore::new(TomlFileBackend::new(config));
            let pair = store.get();
            println!("tablet = {}\nmobile = {}", pair.tablet, pair.mobile);
        }
        Command::Set { config, tablet, mobile } => {
            if tablet.is_none() && mobile.is_none() {
                bail!("nothing to set: pass --tablet and/or --mobile");
            }
            let store = ThresholdStore::new(TomlFileBackend::new(config));
            let pair = store.set(&BreakpointInput { tablet, mobile })?;
            println!("stored {}", pair);
        }
    }
    Ok(())
}
