use clap::{Parser, Subcommand};
use stackfront::carousel::{Carousel, CarouselBlock};
use stackfront::client::DeliveryClient;
use stackfront::config::{self, SiteConfig};
use stackfront::output;
use stackfront::pages::{
    GetEntryByUrl, Pages, execute_graphql_query, field_at, get_all_content_types, get_locales,
};
use std::path::{Path, PathBuf};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "stackfront")]
#[command(about = "Fetch, resolve and render marketing-site content from the CMS")]
#[command(long_about = "\
Fetch, resolve and render marketing-site content from the CMS

Entries reference each other through stubs ({ uid, _content_type_uid }).
Every command that prints entries resolves those stubs recursively; stubs
that cannot be fetched stay in place and are reported.

Configuration (later wins):
  stock defaults → stackfront.toml → environment

Credentials may come from the environment:
  CONTENTSTACK_API_KEY, CONTENTSTACK_DELIVERY_TOKEN, CONTENTSTACK_ENVIRONMENT,
  CONTENTSTACK_API_HOST (NEXT_PUBLIC_-prefixed names are accepted too)

Log verbosity follows RUST_LOG (default: info). Logs go to stderr.

Run 'stackfront gen-config' to generate a documented stackfront.toml.")]
#[command(version)]
struct Cli {
    /// Path to the config file
    #[arg(long, default_value = config::CONFIG_FILENAME, global = true)]
    config: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    #[command(flatten)]
    Stack(StackCommand),
    /// Print a stock stackfront.toml with all options documented
    GenConfig,
}

/// Commands that talk to the stack.
#[derive(Subcommand)]
enum StackCommand {
    /// List every entry of a content type with references resolved
    Entries {
        content_type: String,
        #[arg(long)]
        locale: Option<String>,
        /// Print the resolved entries as JSON instead of a summary
        #[arg(long)]
        json: bool,
    },
    /// Print the entry published at a URL, fully resolved
    Entry {
        content_type: String,
        #[arg(long, default_value = "/")]
        url: String,
        #[arg(long)]
        locale: Option<String>,
        /// Reference field to inline in the query (repeatable)
        #[arg(long = "include")]
        include: Vec<String>,
    },
    /// List the content types on the stack
    ContentTypes,
    /// List the locales published on the stack
    Locales,
    /// Run a GraphQL query and print the response
    Graphql {
        /// Query text
        query: Option<String>,
        /// Read the query from a file instead
        #[arg(long, conflicts_with = "query")]
        file: Option<PathBuf>,
    },
    /// Render the hero carousel of a page to HTML
    Carousel {
        #[arg(long, default_value = "page")]
        content_type: String,
        #[arg(long, default_value = "/")]
        url: String,
        #[arg(long)]
        locale: Option<String>,
        /// Dotted path to the carousel block inside the page
        #[arg(long, default_value = "page_components.hero_carousel")]
        path: String,
        /// Write the HTML here instead of stdout
        #[arg(long)]
        out: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_logging();
    let cli = Cli::parse();

    let command = match cli.command {
        Command::Stack(command) => command,
        Command::GenConfig => {
            print!("{}", config::stock_config_toml());
            return Ok(());
        }
    };

    let site = load_site(&cli.config)?;
    let client = DeliveryClient::new(&site.stack)?;
    let pages = Pages::new(&client, &site.content);

    match command {
        StackCommand::Entries {
            content_type,
            locale,
            json,
        } => {
            let entries = pages
                .get_all_entries_by_content_type(&content_type, locale.as_deref())
                .await;
            if json {
                let values: Vec<_> = entries.iter().map(|entry| &entry.value).collect();
                println!("{}", serde_json::to_string_pretty(&values)?);
            } else {
                output::print_entries(&content_type, &entries);
            }
        }
        StackCommand::Entry {
            content_type,
            url,
            locale,
            include,
        } => {
            let request = GetEntryByUrl {
                content_type_uid: content_type,
                entry_url: url,
                reference_field_path: include,
                locale,
            };
            let entry = find_page(&pages, &request).await?;
            let resolved = pages
                .resolve_nested_entry(&entry, request.locale.as_deref())
                .await;
            for failure in &resolved.unresolved {
                tracing::warn!(path = %failure.path, stub = %failure.stub, "left unresolved");
            }
            println!("{}", serde_json::to_string_pretty(&resolved.value)?);
        }
        StackCommand::ContentTypes => {
            let content_types = get_all_content_types(&client).await?;
            output::print_content_types(&content_types);
        }
        StackCommand::Locales => {
            let locales = get_locales(&client).await?;
            output::print_locales(&locales);
        }
        StackCommand::Graphql { query, file } => {
            let query = match (query, file) {
                (_, Some(path)) => std::fs::read_to_string(path)?,
                (Some(query), None) => query,
                (None, None) => return Err("provide a query or --file".into()),
            };
            let response = execute_graphql_query(&client, &query).await?;
            println!("{}", serde_json::to_string_pretty(&response)?);
        }
        StackCommand::Carousel {
            content_type,
            url,
            locale,
            path,
            out,
        } => {
            let request = GetEntryByUrl {
                content_type_uid: content_type,
                entry_url: url,
                reference_field_path: Vec::new(),
                locale,
            };
            let entry = find_page(&pages, &request).await?;
            let resolved = pages
                .resolve_nested_entry(&entry, request.locale.as_deref())
                .await;
            let block = match field_at(&resolved.value, &path) {
                Some(block) => CarouselBlock::from_value(block)?,
                None => {
                    tracing::warn!(%path, "no carousel block on page");
                    CarouselBlock::default()
                }
            };
            let carousel = Carousel::from_config(block.title, block.carousel, &site.carousel);
            let html = carousel.render().into_string();
            match out {
                Some(out) => {
                    std::fs::write(&out, html)?;
                    println!(
                        "Wrote {} slides → {}",
                        carousel.banners().len(),
                        out.display()
                    );
                }
                None => println!("{html}"),
            }
        }
    }

    Ok(())
}

fn init_logging() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

async fn find_page(
    pages: &Pages<'_, DeliveryClient>,
    request: &GetEntryByUrl,
) -> Result<serde_json::Value, Box<dyn std::error::Error>> {
    pages.get_entry_by_url(request).await?.ok_or_else(|| {
        format!(
            "no {} entry at {}",
            request.content_type_uid, request.entry_url
        )
        .into()
    })
}

fn load_site(path: &Path) -> Result<SiteConfig, config::ConfigError> {
    let site = config::load_config(path)?;
    tracing::debug!(
        config = %path.display(),
        environment = %site.stack.environment,
        locale = %site.content.default_locale,
        "configuration loaded"
    );
    Ok(site)
}
