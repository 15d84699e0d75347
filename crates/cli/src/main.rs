use anyhow::Context;
use clap::{Parser, Subcommand};
use countries_core::report::format_thousands;
use countries_core::{CoreConfig, CountryService, ListOptions, Sort};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "countries")]
#[command(about = "Country mirror CLI")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// List stored countries as JSON
    List {
        /// Only countries in this region (case-insensitive)
        #[arg(long)]
        region: Option<String>,
        /// Only countries using this currency code (case-insensitive)
        #[arg(long)]
        currency: Option<String>,
        /// Sort expression, e.g. gdp_desc or population_asc
        #[arg(long)]
        sort: Option<String>,
    },
    /// Show one country as JSON
    Show {
        /// Country name
        name: String,
    },
    /// Delete one country
    Delete {
        /// Country name
        name: String,
    },
    /// Pull both external feeds and update the store
    Refresh,
    /// Print the number of stored countries and the last refresh time
    Status,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("countries_core=warn".parse()?),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    let Some(command) = cli.command else {
        println!("Use 'countries --help' for commands");
        return Ok(());
    };

    let cfg = CoreConfig::from_lookup(|key| std::env::var(key).ok())?;
    let service = CountryService::from_config(&cfg).context("opening country store")?;

    match command {
        Commands::List {
            region,
            currency,
            sort,
        } => {
            let sort = sort
                .map(|s| s.parse::<Sort>())
                .transpose()
                .context("invalid --sort")?;
            let options = ListOptions {
                region,
                currency_code: currency,
                sort,
            };
            let countries = service.list_countries(&options)?;
            println!("{}", serde_json::to_string_pretty(&countries)?);
        }
        Commands::Show { name } => match service.get_country(&name)? {
            Some(country) => println!("{}", serde_json::to_string_pretty(&country)?),
            None => anyhow::bail!("Country '{}' not found", name),
        },
        Commands::Delete { name } => {
            if !service.delete_country(&name)? {
                anyhow::bail!("Country '{}' not found", name);
            }
            println!("Country '{}' deleted successfully", name);
        }
        Commands::Refresh => {
            let outcome = service.refresh().await?;
            println!(
                "Refreshed {} countries at {}",
                outcome.total_countries,
                outcome.last_refreshed_at.to_rfc3339()
            );
            if outcome.skipped > 0 {
                println!("Skipped {} unnamed entries", outcome.skipped);
            }
            match outcome.summary_image {
                Some(path) => println!("Summary image: {}", path.display()),
                None => println!("Summary image not updated"),
            }
        }
        Commands::Status => {
            let status = service.status()?;
            println!("Total countries: {}", status.total_countries);
            match status.last_refreshed_at {
                Some(at) => println!("Last refreshed: {}", at.to_rfc3339()),
                None => println!("Last refreshed: never"),
            }
            let top = service.store().top_by_estimated_gdp(1)?;
            if let Some(country) = top.first() {
                if let Some(gdp) = country.estimated_gdp {
                    println!("Largest estimated GDP: {} ({})", country.name, format_thousands(gdp));
                }
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_list_flags_parse() {
        let cli = Cli::try_parse_from([
            "countries", "list", "--region", "Africa", "--sort", "gdp_desc",
        ])
        .unwrap();
        match cli.command {
            Some(Commands::List {
                region,
                currency,
                sort,
            }) => {
                assert_eq!(region.as_deref(), Some("Africa"));
                assert_eq!(currency, None);
                assert_eq!(sort.as_deref(), Some("gdp_desc"));
            }
            _ => panic!("expected list command"),
        }
    }

    #[test]
    fn test_show_requires_name() {
        assert!(Cli::try_parse_from(["countries", "show"]).is_err());
    }
}
