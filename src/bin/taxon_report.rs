use anyhow::{Context, Result};
use clap::Parser;
use seqscout::{
    about,
    entrez::EntrezClient,
    logging,
    prompt::{self, Prompter},
    report_export::export_report,
    settings::EntrezSettings,
    taxon_report::{
        LengthRange, RetrievalEvent, RetrievalPlan, TaxonQuery, normalize_taxid,
        retrieve_filtered_with_progress,
    },
};
use std::io::{BufRead, Write};
use std::path::PathBuf;

/// Length-filtered CSV report and chart of all NCBI nucleotide records for a taxon.
#[derive(Parser, Debug)]
#[command(name = "taxon_report", disable_version_flag = true)]
struct Args {
    /// Contact email sent to NCBI with every request (or set NCBI_EMAIL).
    #[arg(long)]
    email: Option<String>,

    /// NCBI taxonomy ID, e.g. 2697049.
    #[arg(long)]
    taxid: Option<String>,

    /// Minimum sequence length (inclusive).
    #[arg(long = "min-len", value_name = "BP")]
    min_len: Option<usize>,

    /// Maximum sequence length (inclusive).
    #[arg(long = "max-len", value_name = "BP")]
    max_len: Option<usize>,

    /// JSON file with E-utilities settings.
    #[arg(long, value_name = "JSON")]
    settings: Option<PathBuf>,

    /// Directory for the CSV report and chart.
    #[arg(long = "out-dir", value_name = "DIR", default_value = ".")]
    out_dir: PathBuf,

    /// Still write a report from the batches fetched before a failure.
    #[arg(long = "keep-partial")]
    keep_partial: bool,

    /// More log output on stderr (-v debug, -vv trace).
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Print version information.
    #[arg(short = 'V', long)]
    version: bool,
}

fn main() {
    if let Err(e) = run() {
        eprintln!("{e:#}");
        std::process::exit(1);
    }
}

fn load_settings(args: &Args) -> Result<EntrezSettings> {
    let settings = match &args.settings {
        Some(path) => EntrezSettings::from_json_file(&path.to_string_lossy())?,
        None => EntrezSettings::default(),
    };
    let mut settings = settings.with_env_overrides();
    if let Some(email) = &args.email {
        settings.email = email.clone();
    }
    Ok(settings)
}

fn read_length_range<R: BufRead, W: Write>(
    prompter: &mut Prompter<R, W>,
    args: &Args,
) -> Result<LengthRange> {
    let mut min = args.min_len;
    let mut max = args.max_len;
    loop {
        let lo = match min.take() {
            Some(v) => v,
            None => prompter.ask_until("Minimum length of sequence: ", prompt::parse_length)?,
        };
        let hi = match max.take() {
            Some(v) => v,
            None => prompter.ask_until("Maximum length of sequence: ", prompt::parse_length)?,
        };
        match LengthRange::new(lo, hi) {
            Ok(range) => return Ok(range),
            Err(e) => prompter.say(&format!("{e}, try again."))?,
        }
    }
}

fn read_query<R: BufRead, W: Write>(
    prompter: &mut Prompter<R, W>,
    args: &Args,
) -> Result<TaxonQuery> {
    let taxid = match args.taxid.as_deref().map(normalize_taxid) {
        Some(parsed) => parsed?,
        None => prompter.ask_until("Taxonomy ID of the organism: ", |raw| {
            normalize_taxid(raw).map_err(|e| e.to_string())
        })?,
    };
    let range = read_length_range(prompter, args)?;
    Ok(TaxonQuery::new(&taxid, range)?)
}

fn run() -> Result<()> {
    let args = Args::parse();
    if args.version {
        println!("{}", about::version_cli_text());
        return Ok(());
    }
    logging::init(args.verbose);

    let mut settings = load_settings(&args)?;
    let mut prompter = prompt::stdio();
    if !settings.has_email() {
        settings.email = prompter.ask_until("NCBI contact email: ", prompt::parse_nonempty)?;
    }
    let settings = settings.validated()?;
    let query = read_query(&mut prompter, &args)?;

    println!(
        "Fetching records for taxid {} (length {})...",
        query.taxid(),
        query.range()
    );
    let plan = RetrievalPlan {
        batch_size: settings.batch_size,
        batch_delay: settings.batch_delay(),
    };
    let client = EntrezClient::new(settings).context("could not set up the NCBI client")?;
    let mut on_progress = |event: &RetrievalEvent| match event {
        RetrievalEvent::Searched { count } => println!("Found {count} records."),
        RetrievalEvent::Batch(p) => println!(
            "  records {}-{} of {}: kept {}",
            p.start + 1,
            p.start + p.fetched,
            p.total,
            p.retained
        ),
    };

    let table = match retrieve_filtered_with_progress(&client, &query, &plan, &mut on_progress) {
        Ok(table) => table,
        Err(failure) => {
            eprintln!("Retrieval failed: {failure}");
            if !args.keep_partial || failure.partial.is_empty() {
                return Ok(());
            }
            eprintln!(
                "Writing the {} records retrieved before the failure.",
                failure.partial.len()
            );
            failure.partial
        }
    };

    match export_report(table, &query, &args.out_dir) {
        Ok(None) => println!("No records retrieved."),
        Ok(Some(report)) => {
            println!("Saved report: {}", report.csv_path);
            println!("Saved chart: {} ({})", report.plot_path, report.title);
        }
        Err(e) => eprintln!("Could not write the report: {e}"),
    }
    Ok(())
}
