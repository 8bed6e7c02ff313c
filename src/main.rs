// Four Pillars Engine - CLI
// analyze a chart, search and match knowledge rules

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::{Path, PathBuf};

use four_pillars::{
    analyze, categorize_marriage, match_rules, AnalysisReport, Chart, ChartDigest, EngineConfig,
    Gender, HiddenCombinationMode, KnowledgeBase, PillarOrder,
};

#[derive(Parser)]
#[command(name = "four-pillars", version, about = "Four-pillar relation and inference engine")]
struct Cli {
    /// Engine config (TOML).
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Detect relations, classify the chart and print explained results.
    Analyze {
        #[command(flatten)]
        chart: ChartArgs,

        /// Interim (decade) cycle pillar, e.g. "甲午".
        #[arg(long)]
        interim: Option<String>,

        /// Annual cycle pillar, e.g. "乙亥".
        #[arg(long)]
        annual: Option<String>,

        /// Print the full report as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Knowledge-base rules.
    Rules {
        #[command(subcommand)]
        action: RulesAction,
    },
}

#[derive(Subcommand)]
enum RulesAction {
    /// Rules whose condition or result contains a keyword.
    Search {
        keyword: String,

        /// Rules file (JSON or CSV).
        #[arg(long)]
        rules: PathBuf,
    },
    /// Match rules against a chart.
    Match {
        #[command(flatten)]
        chart: ChartArgs,

        /// Rules file (JSON or CSV).
        #[arg(long)]
        rules: PathBuf,
    },
}

#[derive(Args)]
struct ChartArgs {
    /// Four stems separated by spaces, e.g. "丁 戊 辛 辛".
    #[arg(long, requires = "branches", conflicts_with = "pillars")]
    stems: Option<String>,

    /// Four branches separated by spaces, e.g. "午 卯 亥 子".
    #[arg(long, requires = "stems")]
    branches: Option<String>,

    /// Four pillars separated by spaces, e.g. "丁午 戊卯 辛亥 辛子".
    #[arg(long)]
    pillars: Option<String>,

    /// male / female (乾 / 坤 also accepted).
    #[arg(long, default_value = "female")]
    gender: String,

    /// Order of the pillars given; defaults to the config's input order.
    #[arg(long, value_enum)]
    order: Option<OrderArg>,

    /// Use every hidden stem for hidden combinations.
    #[arg(long)]
    loose: bool,
}

#[derive(Clone, Copy, ValueEnum)]
enum OrderArg {
    TimeFirst,
    YearFirst,
}

impl From<OrderArg> for PillarOrder {
    fn from(arg: OrderArg) -> Self {
        match arg {
            OrderArg::TimeFirst => PillarOrder::TimeFirst,
            OrderArg::YearFirst => PillarOrder::YearFirst,
        }
    }
}

impl ChartArgs {
    /// Config with this command's overrides applied
    fn engine_config(&self, base: &EngineConfig) -> EngineConfig {
        if self.loose {
            base.clone().with_hidden_mode(HiddenCombinationMode::Loose)
        } else {
            base.clone()
        }
    }

    fn build(&self, config: &EngineConfig) -> Result<Chart> {
        let gender = Gender::parse(&self.gender)?;
        let order = self.order.map(PillarOrder::from).unwrap_or(config.input_order);

        let chart = match (&self.stems, &self.branches, &self.pillars) {
            (Some(stems), Some(branches), None) => {
                Chart::parse_split(stems, branches, order, gender)?
            }
            (None, None, Some(pillars)) => Chart::parse_pillars(pillars, order, gender)?,
            _ => bail!("Provide either --stems with --branches, or --pillars"),
        };
        Ok(chart)
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .init();

    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => EngineConfig::from_file(path)?,
        None => EngineConfig::default(),
    };

    match cli.command {
        Commands::Analyze {
            chart,
            interim,
            annual,
            json,
        } => {
            let config = chart.engine_config(&config);
            let parsed = chart.build(&config)?;
            let report = analyze(&parsed, &config, interim.as_deref(), annual.as_deref());

            if json {
                println!("{}", report.to_json()?);
            } else {
                print_report(&report);
            }
        }
        Commands::Rules { action } => run_rules(action, &config)?,
    }

    Ok(())
}

fn run_rules(action: RulesAction, config: &EngineConfig) -> Result<()> {
    match action {
        RulesAction::Search { keyword, rules } => {
            let kb = load_rules(&rules)?;
            let found = kb.search(&keyword);

            println!("🔎 {} rule(s) containing '{}'", found.len(), keyword);
            for rule in found {
                println!("  [{}] {} → {} ({})", rule.id, rule.condition, rule.result, rule.category);
            }
        }
        RulesAction::Match { chart, rules } => {
            let kb = load_rules(&rules)?;
            let config = chart.engine_config(config);
            let parsed = chart.build(&config)?;
            let report = analyze(&parsed, &config, None, None);
            let digest = ChartDigest::from_summary(&report.chart, &report.summary);

            let matched = match_rules(&digest, kb.rules(), &config);
            let hits: Vec<_> = kb
                .rules()
                .iter()
                .filter(|r| matched.get(&r.id).copied().unwrap_or(false))
                .collect();

            println!("📚 {} of {} rule(s) matched", hits.len(), kb.rule_count());
            for rule in &hits {
                println!("  [{}] {} → {}", rule.id, rule.condition, rule.result);
            }

            let marriage = categorize_marriage(&hits);
            println!("\n💍 Marriage buckets");
            println!("  divorce:    {:?}", marriage.divorce);
            println!("  remarriage: {:?}", marriage.remarriage);
            println!("  single:     {:?}", marriage.single);
        }
    }
    Ok(())
}

fn load_rules(path: &Path) -> Result<KnowledgeBase> {
    KnowledgeBase::from_file(path)
        .with_context(|| format!("Failed to load knowledge base: {:?}", path))
}

fn print_report(report: &AnalysisReport) {
    println!("🏛️  Four Pillars Analysis");
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    println!(
        "Pillars (time → year): {}",
        report.chart.pillar_labels().join(" ")
    );
    println!("Gender: {}", report.chart.gender.as_str());

    println!("\n🔗 Relations");
    if report.summary.relations.is_empty() {
        println!("  (none)");
    }
    for relation in &report.summary.relations {
        println!("  {:<14} {}", relation.label, relation.kind.as_str());
    }

    println!(
        "\n🏗️  Archetype: {} ({})",
        report.summary.archetype.traditional_name(),
        report.summary.archetype
    );
    if !report.summary.focus.is_empty() {
        let focus: Vec<&str> = report
            .summary
            .focus
            .iter()
            .map(|f| f.traditional_name())
            .collect();
        println!("   Focus: {}", focus.join(", "));
    }

    println!("\n🔮 Inference");
    for result in &report.results {
        println!("  [{}] {}", result.category, result.conclusion);
        println!("      {}", result.principle);
    }

    println!("\n━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    println!("Fingerprint: {}", report.fingerprint);
}
