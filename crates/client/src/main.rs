//! standards-client CLI entry point.

use clap::Parser;
use standards_client::cli::events::EventsAction;
use standards_client::cli::health::HealthAction;
use standards_client::cli::{parse_data, Cli, Commands, OutputFormat};
use standards_client::output::{format_json, pretty};
use standards_client::StandardsClient;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let client = StandardsClient::new(&cli.base_url);

    match cli.command {
        Commands::List(args) => match args.query()? {
            Some(params) => {
                let page = client.search(args.resource, &params).await?;
                match cli.format {
                    OutputFormat::Json => println!("{}", format_json(&page)),
                    OutputFormat::Pretty => {
                        println!("{}", pretty::format_page(args.resource, &page))
                    }
                }
            }
            None => {
                let records = client.list(args.resource).await?;
                match cli.format {
                    OutputFormat::Json => println!("{}", format_json(&records)),
                    OutputFormat::Pretty => {
                        println!("{}", pretty::format_records(args.resource, &records))
                    }
                }
            }
        },
        Commands::Get { resource, id } => {
            let record = client.get(resource, id).await?;
            match cli.format {
                OutputFormat::Json => println!("{}", format_json(&record)),
                OutputFormat::Pretty => println!("{}", pretty::format_record(&record)),
            }
        }
        Commands::Details { resource, id } => {
            let details = client.details(resource, id).await?;
            match cli.format {
                OutputFormat::Json => println!("{}", format_json(&details)),
                OutputFormat::Pretty => {
                    let mut record = details.clone();
                    let references = record
                        .as_object_mut()
                        .and_then(|fields| fields.remove("references"));
                    println!("{}", pretty::format_record(&record));
                    if let Some(serde_json::Value::Object(references)) = references {
                        for (field, referenced) in references {
                            println!("\n[{}]\n{}", field, pretty::format_record(&referenced));
                        }
                    }
                }
            }
        }
        Commands::Create { resource, data } => {
            let record = client.create(resource, &parse_data(&data)?).await?;
            match cli.format {
                OutputFormat::Json => println!("{}", format_json(&record)),
                OutputFormat::Pretty => {
                    println!("Created:\n{}", pretty::format_record(&record))
                }
            }
        }
        Commands::Update { resource, id, data } => {
            let record = client.update(resource, id, &parse_data(&data)?).await?;
            match cli.format {
                OutputFormat::Json => println!("{}", format_json(&record)),
                OutputFormat::Pretty => {
                    println!("Updated:\n{}", pretty::format_record(&record))
                }
            }
        }
        Commands::Patch { resource, id, data } => {
            let record = client.patch(resource, id, &parse_data(&data)?).await?;
            match cli.format {
                OutputFormat::Json => println!("{}", format_json(&record)),
                OutputFormat::Pretty => {
                    println!("Patched:\n{}", pretty::format_record(&record))
                }
            }
        }
        Commands::Delete { resource, id } => {
            client.delete(resource, id).await?;
            if !cli.quiet {
                println!("Deleted {} {}", resource.display_name(), id);
            }
        }
        Commands::Resources => {
            let resources = client.resources().await?;
            match cli.format {
                OutputFormat::Json => println!("{}", format_json(&resources)),
                OutputFormat::Pretty => println!("{}", pretty::format_resources(&resources)),
            }
        }
        Commands::Events(events_cmd) => {
            use tokio_stream::StreamExt;
            match events_cmd.action {
                EventsAction::Watch {
                    kind,
                    last_event_id,
                } => {
                    if !cli.quiet {
                        match kind {
                            Some(kind) => println!("Watching {} events...", kind.as_str()),
                            None => println!("Watching events..."),
                        }
                    }
                    let stream = client.watch_events(kind, last_event_id).await?;
                    tokio::pin!(stream);
                    while let Some(event_result) = stream.next().await {
                        match event_result {
                            Ok(event) => match cli.format {
                                OutputFormat::Json => {
                                    println!("{}", format_json(&event))
                                }
                                OutputFormat::Pretty => println!("{}", pretty::format_event(&event)),
                            },
                            Err(e) => {
                                eprintln!("Error: {}", e);
                                break;
                            }
                        }
                    }
                }
            }
        }
        Commands::Health(health_cmd) => match health_cmd.action {
            HealthAction::Live => {
                let live = client.livez().await?;
                if !cli.quiet {
                    println!("{}", if live { "live" } else { "not live" });
                }
                if !live {
                    std::process::exit(1);
                }
            }
            HealthAction::Status => {
                let report = client.healthz().await?;
                match cli.format {
                    OutputFormat::Json => println!("{}", format_json(&report)),
                    OutputFormat::Pretty => println!("{}", pretty::format_health(&report)),
                }
            }
            HealthAction::Ready => {
                let status = client.readyz().await?;
                match cli.format {
                    OutputFormat::Json => println!("{}", format_json(&status)),
                    OutputFormat::Pretty => println!("Ready: {}", status),
                }
            }
        },
    }

    Ok(())
}
