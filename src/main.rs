use clap::{Parser, Subcommand};
use folio::collection::{load_blog, load_collection};
use folio::filter::{FilterState, compute_visible};
use folio::gallery::Gallery;
use folio::taxonomy::Taxonomy;
use folio::{config, optimize, output, server};
use std::path::{Path, PathBuf};
use tracing_subscriber::{EnvFilter, fmt};

#[derive(Parser)]
#[command(name = "folio")]
#[command(about = "Portfolio and blog engine for a photography site")]
#[command(long_about = "\
Portfolio and blog engine for a photography site

The item collection is the data source: a filterable gallery and lightbox
read it, and the vote endpoint writes star ratings back into it.

Site structure:

  site/
  ├── config.toml                  # Optional, overrides stock defaults
  ├── data/
  │   ├── portfolio.json           # [{id, title, categories, year, description?, votes?}]
  │   └── blog.json                # [{id, title, date, tags, excerpt, image, content}]
  └── images/
      ├── todo/                    # Sources for `folio optimize` (file stem = item id)
      ├── optimized/               # <id>.avif gallery thumbnails
      └── original/                # <id>.webp lightbox images

Run 'folio gen-config' to generate a documented config.toml.
Set RUST_LOG (e.g. RUST_LOG=folio=debug) to adjust log output.")]
#[command(version)]
struct Cli {
    /// Site root directory
    #[arg(long, default_value = ".", global = true)]
    root: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Validate the collections and summarize facets and votes
    Check,
    /// Print the gallery order for a facet selection
    Filter {
        /// Category tag to select (repeatable)
        #[arg(long = "category")]
        categories: Vec<String>,
        /// Year to select (repeatable)
        #[arg(long = "year")]
        years: Vec<String>,
        /// Print the rendered gallery markup instead of the listing
        #[arg(long)]
        html: bool,
    },
    /// Convert source photos into gallery thumbnails and lightbox images
    Optimize {
        /// Disable the encode cache and re-encode every image
        #[arg(long)]
        no_cache: bool,
    },
    /// Serve the collections and the vote endpoint over HTTP
    Serve,
    /// Print a stock config.toml with all options documented
    GenConfig,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Command::Check => {
            let site_config = config::load_config(&cli.root)?;
            println!("==> Checking {}", cli.root.display());
            let items = load_collection(
                &cli.root.join(&site_config.data.portfolio),
                site_config.votes.bounds(),
            )?;
            let taxonomy = Taxonomy::from_items(&items, &site_config.categories);
            let blog_path = cli.root.join(&site_config.data.blog);
            let posts = if blog_path.exists() {
                Some(load_blog(&blog_path)?)
            } else {
                None
            };
            output::print_check_output(&items, &taxonomy, posts.as_deref());
            println!("==> Collections are valid");
        }
        Command::Filter {
            categories,
            years,
            html,
        } => {
            let site_config = config::load_config(&cli.root)?;
            let mut gallery =
                Gallery::load(&cli.root.join(&site_config.data.portfolio), &site_config)?;
            // Flags are selections, not clicks: repeating one must not toggle it off
            gallery.render(FilterState::new(categories, years));
            if html {
                println!("{}", gallery.markup().into_string());
            } else {
                let visible = compute_visible(gallery.items(), gallery.state());
                output::print_filter_output(
                    &visible,
                    gallery.items().len(),
                    gallery.state(),
                    &site_config.categories,
                );
            }
        }
        Command::Optimize { no_cache } => {
            let site_config = config::load_config(&cli.root)?;
            println!(
                "==> Optimizing {}",
                cli.root.join(&site_config.images.source_dir).display()
            );
            let report = optimize::optimize(&cli.root, &site_config, !no_cache)?;
            output::print_optimize_output(&report, &cli.root);
            if !report.failures.is_empty() {
                return Err(format!("{} image(s) failed", report.failures.len()).into());
            }
        }
        Command::Serve => {
            let site_config = config::load_config(&cli.root)?;
            let root = absolute_root(&cli.root)?;
            let runtime = tokio::runtime::Runtime::new()?;
            runtime.block_on(server::serve(site_config, root))?;
        }
        Command::GenConfig => {
            print!("{}", config::stock_config_toml());
        }
    }

    Ok(())
}

/// Resolve the site root once so log lines show where votes are written.
fn absolute_root(root: &Path) -> std::io::Result<PathBuf> {
    std::path::absolute(root)
}
