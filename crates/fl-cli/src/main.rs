//! # fl: FAULTLINE command-line client
//!
//! Thin client for the `fl-hub` query API.
//!
//! - `fl logs`: Page through matching logs.
//! - `fl groups --by host_name,error_number`: Group counts as a tree.
//! - `fl trend --breakdown host_name`: Bucketed counts over the window.
//! - `fl watch`: Re-run a listing on a timer, newest answer wins.
//! - `fl generate --out logs.jsonl`: Write mock records locally.

use std::path::PathBuf;
use std::time::Duration as StdDuration;

use clap::{Parser, Subcommand};
use futures::stream::{FuturesUnordered, StreamExt};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use fl_core::FieldId;
use fl_io::generator::MockGenerator;
use fl_io::journal::write_jsonl;
use fl_query::{
    DrillDownRequest, ExportRequest, QueryRequest, QueryResponse, RequestSequencer, TrendPoint,
};

mod query_args;
mod render;

use query_args::{keys_map, parse_key, QueryArgs};

type CliResult<T = ()> = Result<T, Box<dyn std::error::Error>>;

/// FAULTLINE: browse, group and chart report-server error logs.
#[derive(Parser)]
#[command(name = "fl", version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Page through matching logs.
    Logs {
        #[command(flatten)]
        query: QueryArgs,
    },

    /// Count matching logs per group, nested in field order.
    Groups {
        /// Comma-separated group-by fields, outermost first.
        #[arg(long, value_delimiter = ',', required = true)]
        by: Vec<FieldId>,

        #[command(flatten)]
        query: QueryArgs,
    },

    /// Bucketed counts across the query window.
    Trend {
        /// Field to tally inside each bucket.
        #[arg(long)]
        breakdown: Option<FieldId>,

        #[command(flatten)]
        query: QueryArgs,
    },

    /// List the logs behind one group, e.g. --key host_name=rs-prod-01.
    Drill {
        #[arg(long = "key", value_parser = parse_key, required = true)]
        keys: Vec<(FieldId, String)>,

        #[command(flatten)]
        query: QueryArgs,
    },

    /// Download the full result set as CSV.
    Export {
        #[arg(long)]
        out: PathBuf,

        /// Comma-separated columns (default: all).
        #[arg(long, value_delimiter = ',')]
        columns: Vec<FieldId>,

        #[command(flatten)]
        query: QueryArgs,
    },

    /// List the queryable fields.
    Fields,

    /// Report hub status as JSON.
    Status,

    /// Re-run a listing every few seconds.
    Watch {
        #[arg(long, default_value_t = 5)]
        interval_secs: u64,

        /// Stop after this many requests.
        #[arg(long)]
        rounds: Option<usize>,

        #[command(flatten)]
        query: QueryArgs,
    },

    /// Write seeded mock records to a JSON-lines file (no hub needed).
    Generate {
        #[arg(long)]
        out: PathBuf,

        #[arg(long, default_value_t = 5000)]
        count: usize,

        #[arg(long, default_value_t = 42)]
        seed: u64,

        /// Days of history ending now.
        #[arg(long, default_value_t = 14)]
        span_days: i64,
    },
}

fn main() {
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Generate {
            out,
            count,
            seed,
            span_days,
        } => generate(out, count, seed, span_days),

        // Async Commands
        cmd => match tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
        {
            Ok(rt) => rt.block_on(async_main(cmd)),
            Err(e) => Err(e.into()),
        },
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn generate(out: PathBuf, count: usize, seed: u64, span_days: i64) -> CliResult {
    let span = chrono::Duration::try_days(span_days)
        .filter(|span| *span > chrono::Duration::zero())
        .ok_or_else(|| format!("--span-days must be a positive day count, got {}", span_days))?;
    let generator = MockGenerator::new(seed, count, span, chrono::Utc::now());
    let records = generator.generate();
    write_jsonl(&out, &records)?;
    eprintln!("Wrote {} records to {}", records.len(), out.display());
    Ok(())
}

async fn async_main(cmd: Commands) -> CliResult {
    let hub = Hub {
        client: reqwest::Client::new(),
        base_url: std::env::var("FL_BASE_URL")
            .unwrap_or_else(|_| "http://127.0.0.1:3000".to_string()),
    };

    match cmd {
        Commands::Logs { query } => {
            let request = query.to_request()?;
            let response: QueryResponse = hub.post("/api/logs/query", &request).await?;
            print_page(&request, &response);
        }

        Commands::Groups { by, query } => {
            let request = QueryRequest {
                group_by: by,
                ..query.to_request()?
            };
            let response: QueryResponse = hub.post("/api/logs/groups", &request).await?;
            print!("{}", render::group_tree(&response.group_data));
            println!("{} records", response.total_count);
        }

        Commands::Trend { breakdown, query } => {
            let request = QueryRequest {
                breakdown_field: breakdown,
                ..query.to_request()?
            };
            let points: Vec<TrendPoint> = hub.post("/api/logs/trend", &request).await?;
            println!("{}", render::trend_table(&points));
        }

        Commands::Drill { keys, query } => {
            let request = DrillDownRequest {
                query: query.to_request()?,
                keys: keys_map(&keys),
            };
            let response: QueryResponse = hub.post("/api/logs/drill-down", &request).await?;
            print_page(&request.query, &response);
        }

        Commands::Export {
            out,
            columns,
            query,
        } => {
            let request = ExportRequest {
                query: query.to_request()?,
                columns,
            };
            let csv = hub.post_text("/api/logs/export", &request).await?;
            std::fs::write(&out, &csv)?;
            let rows = csv.lines().count().saturating_sub(1);
            eprintln!("Wrote {} rows to {}", rows, out.display());
        }

        Commands::Fields => {
            let fields: Vec<render::FieldRow> = hub.get("/api/fields").await?;
            println!("{}", render::fields_table(fields));
        }

        Commands::Status => {
            let status: serde_json::Value = hub.get("/api/status").await?;
            println!("{}", serde_json::to_string_pretty(&status)?);
        }

        Commands::Watch {
            interval_secs,
            rounds,
            query,
        } => {
            let request = query.to_request()?;
            watch(&hub, request, StdDuration::from_secs(interval_secs.max(1)), rounds).await?;
        }

        Commands::Generate {
            out,
            count,
            seed,
            span_days,
        } => generate(out, count, seed, span_days)?,
    }
    Ok(())
}

fn print_page(request: &QueryRequest, response: &QueryResponse) {
    let pagination = request.pagination();
    println!("{}", render::logs_table(&response.logs));
    println!(
        "{}",
        render::page_footer(pagination.page, pagination.page_size, response.total_count)
    );
}

/// Issues a listing every `every`, without waiting for earlier answers.
/// Answers that arrive after a newer request was issued are dropped.
async fn watch(
    hub: &Hub,
    request: QueryRequest,
    every: StdDuration,
    rounds: Option<usize>,
) -> CliResult {
    let sequencer = RequestSequencer::new();
    let mut ticker = tokio::time::interval(every);
    let mut in_flight = FuturesUnordered::new();
    let mut issued = 0usize;

    loop {
        tokio::select! {
            _ = ticker.tick(), if rounds.map_or(true, |r| issued < r) => {
                let id = sequencer.next_id();
                issued += 1;
                let request = QueryRequest {
                    request_id: format!("{}-{}", request.request_id, id),
                    ..request.clone()
                };
                in_flight.push(async move {
                    let response: CliResult<QueryResponse> =
                        hub.post("/api/logs/query", &request).await;
                    (id, request, response)
                });
            }
            Some((id, request, response)) = in_flight.next(), if !in_flight.is_empty() => {
                if !sequencer.accept(id) {
                    eprintln!("(dropped stale answer #{}, {} so far)", id, sequencer.discarded());
                    continue;
                }
                match response {
                    Ok(response) => {
                        println!("── #{} at {} ──", id, chrono::Local::now().format("%H:%M:%S"));
                        print_page(&request, &response);
                    }
                    Err(e) => eprintln!("Error: {}", e),
                }
            }
            else => break,
        }
    }
    Ok(())
}

// =============================================================================
// Hub client
// =============================================================================

#[derive(Deserialize)]
struct ApiError {
    error: String,
}

struct Hub {
    client: reqwest::Client,
    base_url: String,
}

impl Hub {
    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url.trim_end_matches('/'), path)
    }

    async fn get<T: DeserializeOwned>(&self, path: &str) -> CliResult<T> {
        let resp = checked(get_request(&self.client, &self.url(path)).await?).await?;
        Ok(resp.json::<T>().await?)
    }

    async fn post<T: DeserializeOwned, B: Serialize>(&self, path: &str, body: &B) -> CliResult<T> {
        let resp = checked(post_request(&self.client, &self.url(path), body).await?).await?;
        Ok(resp.json::<T>().await?)
    }

    async fn post_text<B: Serialize>(&self, path: &str, body: &B) -> CliResult<String> {
        let resp = checked(post_request(&self.client, &self.url(path), body).await?).await?;
        Ok(resp.text().await?)
    }
}

/// Turns a non-2xx answer into an error carrying the hub's message.
async fn checked(resp: reqwest::Response) -> CliResult<reqwest::Response> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    let body = resp.text().await.unwrap_or_default();
    let message = serde_json::from_str::<ApiError>(&body)
        .map(|e| e.error)
        .unwrap_or(body);
    Err(format!("hub answered {}: {}", status, message).into())
}

async fn get_request(
    client: &reqwest::Client,
    url: &str,
) -> Result<reqwest::Response, reqwest::Error> {
    client.get(url).send().await
}

async fn post_request<B: Serialize>(
    client: &reqwest::Client,
    url: &str,
    json: &B,
) -> Result<reqwest::Response, reqwest::Error> {
    client.post(url).json(json).send().await
}
