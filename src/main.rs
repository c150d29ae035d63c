use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use artq::config::{self, ArtqConfig};
use artq::db::models::ArticleStatus;
use artq::db::Database;
use artq::filter::form::build_filter;
use artq::filter::ArticleFilter;
use artq::output::{print_json, table};
use artq::query::{Order, Query};

#[derive(Parser)]
#[command(name = "artq", version, about = "Article Query — composable, validated search filters over a SQLite article archive")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output as JSON
    #[arg(long, global = true)]
    json: bool,

    /// Path to database file (default: ~/.artq/artq.db)
    #[arg(long, global = true, env = "ARTQ_DB")]
    db: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// List articles matching the given filters
    List {
        /// Exact title match
        #[arg(long)]
        title: Option<String>,

        /// Exact summary match
        #[arg(long)]
        summary: Option<String>,

        /// Status membership (repeat for multiple: --status draft --status published)
        #[arg(long, value_enum)]
        status: Vec<ArticleStatus>,

        /// Exact author first-name match
        #[arg(long)]
        author_first_name: Option<String>,

        /// Exact author last-name match
        #[arg(long)]
        author_last_name: Option<String>,

        /// Only published articles from the last month
        #[arg(long)]
        most_relevant: bool,

        /// Sort by: date (default) or title
        #[arg(long, default_value = "date")]
        sort: String,

        /// Maximum results
        #[arg(long)]
        limit: Option<usize>,
    },

    /// Build a filter from a raw JSON document and run it
    Query {
        /// JSON object, e.g. '{"title_eq": "hello", "status_in": ["draft"]}'
        input: String,

        /// Print the generated SQL instead of executing
        #[arg(long)]
        explain: bool,

        /// Sort by: date (default) or title
        #[arg(long, default_value = "date")]
        sort: String,

        /// Maximum results
        #[arg(long)]
        limit: Option<usize>,
    },

    /// Show article details
    Show {
        /// Article ID
        id: String,
    },

    /// Insert demo authors and articles
    Seed,

    /// Show database statistics
    Stats,

    /// Manage ~/.artq/config.toml
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Print the current config
    Show,
    /// Create a template config file if missing
    Init,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::WARN.into()),
        )
        .with_target(false)
        .init();

    let cli = Cli::parse();
    let json_output = cli.json;

    let config = ArtqConfig::load()?;

    let db_path = match cli.db.or_else(|| config.db_path.clone()) {
        Some(path) => path,
        None => Database::default_db_path()?,
    };
    let db = Database::open(&db_path)?;

    match cli.command {
        Commands::List {
            title,
            summary,
            status,
            author_first_name,
            author_last_name,
            most_relevant,
            sort,
            limit,
        } => {
            let filter = ArticleFilter {
                title_eq: title,
                summary_eq: summary,
                status_in: if status.is_empty() { None } else { Some(status) },
                author_first_name_eq: author_first_name,
                author_last_name_eq: author_last_name,
                most_relevant: most_relevant.then_some(true),
            };
            let limit = resolve_limit(limit, &config);
            let results = db.list_articles(&filter, &sort, limit)?;
            if json_output {
                print_json(&results)?;
            } else {
                table::print_article_results(&results);
            }
        }

        Commands::Query {
            input,
            explain,
            sort,
            limit,
        } => {
            let raw: serde_json::Map<String, serde_json::Value> =
                serde_json::from_str(&input).context("Filter input is not a JSON object")?;

            let filter = match build_filter(&raw) {
                Ok(filter) => filter,
                Err(err) => {
                    if json_output {
                        print_json(&err.errors)?;
                    } else {
                        eprintln!("{err}");
                        for fe in &err.errors {
                            eprintln!("  {}: {}", fe.field, fe.message);
                        }
                    }
                    std::process::exit(1);
                }
            };

            let limit = resolve_limit(limit, &config);
            if explain {
                let query = filter.apply(Query::articles().order_by(Order::from_flag(&sort)));
                let (sql, params) = query.to_sql(limit);
                println!("{sql}");
                println!("-- {} bound parameter(s)", params.len());
            } else {
                let results = db.list_articles(&filter, &sort, limit)?;
                if json_output {
                    print_json(&results)?;
                } else {
                    table::print_article_results(&results);
                }
            }
        }

        Commands::Show { id } => {
            let article = db
                .get_article(&id)?
                .with_context(|| format!("Article not found: {id}"))?;
            let author = db.get_author(article.author_id)?;

            if json_output {
                print_json(&serde_json::json!({
                    "article": article,
                    "author": author,
                }))?;
            } else {
                table::print_article_detail(&article, author.as_ref());
            }
        }

        Commands::Seed => {
            let seeded = db.seed_demo_data()?;
            if seeded == 0 {
                println!("Database already contains articles; nothing seeded.");
            } else {
                println!(
                    "Seeded {seeded} article{}",
                    if seeded == 1 { "" } else { "s" }
                );
            }
        }

        Commands::Stats => {
            let stats = db.stats()?;
            if json_output {
                print_json(&stats)?;
            } else {
                table::print_stats(&stats);
            }
        }

        Commands::Config { action } => match action {
            ConfigAction::Show => {
                println!("{}", config.display());
            }
            ConfigAction::Init => {
                let path = config::config_path()?;
                if config::init_config()? {
                    println!("Created {}", path.display());
                } else {
                    println!("Config already exists: {}", path.display());
                }
            }
        },
    }

    Ok(())
}

fn resolve_limit(flag: Option<usize>, config: &ArtqConfig) -> usize {
    flag.or(config.default_limit).unwrap_or(50)
}
