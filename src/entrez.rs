//! Minimal blocking client for NCBI E-utilities (`esearch` / `efetch`).
//!
//! Only the three calls the pipelines need are covered: a history-enabled
//! taxon search, a paged GenBank fetch against that history, and a single
//! FASTA fetch by accession. Response parsing lives in free functions so it
//! can be tested without a network.

use crate::{
    error::{Result, SeqScoutError},
    settings::EntrezSettings,
};
use gb_io::{reader::SeqReader, seq::Seq};
use reqwest::blocking::Client;
use serde::Deserialize;
use tracing::debug;

pub const NUCLEOTIDE_DB: &str = "nucleotide";
pub const NUCCORE_DB: &str = "nuccore";
const ERROR_SNIPPET_CHARS: usize = 500;

/// History handle of a completed search.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SearchSession {
    pub count: usize,
    pub web_env: String,
    pub query_key: String,
}

impl SearchSession {
    pub fn empty() -> Self {
        Self {
            count: 0,
            web_env: String::new(),
            query_key: String::new(),
        }
    }
}

/// A remote store that can be searched by taxon and paged through.
pub trait SequenceDatabase {
    fn search_taxon(&self, taxid: &str) -> Result<SearchSession>;

    fn fetch_genbank_batch(
        &self,
        session: &SearchSession,
        start: usize,
        max: usize,
    ) -> Result<Vec<Seq>>;
}

/// A remote store that can hand out a single record as FASTA text.
pub trait ReferenceSource {
    fn fetch_fasta_text(&self, accession: &str) -> Result<String>;
}

pub fn taxon_search_term(taxid: &str) -> String {
    format!("txid{taxid}[Organism]")
}

#[derive(Debug, Deserialize)]
#[serde(rename = "eSearchResult")]
struct ESearchResultXml {
    #[serde(rename = "Count")]
    count: Option<String>,
    #[serde(rename = "QueryKey")]
    query_key: Option<String>,
    #[serde(rename = "WebEnv")]
    web_env: Option<String>,
    #[serde(rename = "ERROR")]
    error: Option<String>,
}

pub fn parse_esearch_xml(xml: &str) -> Result<SearchSession> {
    let parsed: ESearchResultXml = quick_xml::de::from_str(xml)
        .map_err(|e| SeqScoutError::Parse(format!("malformed eSearchResult XML: {e}")))?;

    let Some(raw_count) = nonempty_owned(parsed.count.as_deref()) else {
        let reason = nonempty_owned(parsed.error.as_deref())
            .unwrap_or_else(|| "eSearchResult has no Count".to_string());
        return Err(SeqScoutError::Parse(reason));
    };
    let count = raw_count
        .parse::<usize>()
        .map_err(|e| SeqScoutError::Parse(format!("invalid Count '{raw_count}': {e}")))?;
    if count == 0 {
        return Ok(SearchSession::empty());
    }

    let web_env = nonempty_owned(parsed.web_env.as_deref())
        .ok_or_else(|| SeqScoutError::Parse("eSearchResult is missing WebEnv".to_string()))?;
    let query_key = nonempty_owned(parsed.query_key.as_deref())
        .ok_or_else(|| SeqScoutError::Parse("eSearchResult is missing QueryKey".to_string()))?;
    Ok(SearchSession {
        count,
        web_env,
        query_key,
    })
}

pub fn parse_genbank_batch(text: &[u8]) -> Result<Vec<Seq>> {
    SeqReader::new(text)
        .enumerate()
        .map(|(idx, record)| {
            record.map_err(|e| {
                SeqScoutError::Parse(format!("malformed GenBank record #{}: {e}", idx + 1))
            })
        })
        .collect()
}

fn nonempty_owned(raw: Option<&str>) -> Option<String> {
    let text = raw.unwrap_or_default().trim();
    (!text.is_empty()).then_some(text.to_string())
}

fn error_snippet(body: &str) -> String {
    let trimmed = body.trim();
    let mut snippet: String = trimmed.chars().take(ERROR_SNIPPET_CHARS).collect();
    if trimmed.chars().count() > ERROR_SNIPPET_CHARS {
        snippet.push_str("...");
    }
    snippet
}

pub struct EntrezClient {
    http: Client,
    settings: EntrezSettings,
}

impl EntrezClient {
    pub fn new(settings: EntrezSettings) -> Result<Self> {
        let http = Client::builder()
            .timeout(settings.timeout())
            .user_agent(format!("{}/{}", settings.tool, env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| format!("could not build E-utilities client: {e}"))?;
        Ok(Self { http, settings })
    }

    fn identity_params(&self) -> Vec<(&'static str, String)> {
        let mut params = vec![("tool", self.settings.tool.clone())];
        if self.settings.has_email() {
            params.push(("email", self.settings.email.clone()));
        }
        if let Some(key) = &self.settings.api_key {
            params.push(("api_key", key.clone()));
        }
        params
    }

    fn get_text(&self, utility: &str, mut params: Vec<(&'static str, String)>) -> Result<String> {
        let url = self.settings.endpoint(utility);
        params.extend(self.identity_params());
        debug!(%url, utility, "E-utilities request");

        let response = self.http.get(&url).query(&params).send()?;
        let status = response.status();
        let body = response.text()?;
        if !status.is_success() {
            return Err(SeqScoutError::HttpStatus {
                url,
                status: status.as_u16(),
                snippet: error_snippet(&body),
            });
        }
        Ok(body)
    }
}

impl SequenceDatabase for EntrezClient {
    fn search_taxon(&self, taxid: &str) -> Result<SearchSession> {
        let xml = self.get_text(
            "esearch",
            vec![
                ("db", NUCLEOTIDE_DB.to_string()),
                ("term", taxon_search_term(taxid)),
                ("usehistory", "y".to_string()),
                ("idtype", "acc".to_string()),
                ("retmax", "0".to_string()),
            ],
        )?;
        parse_esearch_xml(&xml)
    }

    fn fetch_genbank_batch(
        &self,
        session: &SearchSession,
        start: usize,
        max: usize,
    ) -> Result<Vec<Seq>> {
        let text = self.get_text(
            "efetch",
            vec![
                ("db", NUCLEOTIDE_DB.to_string()),
                ("rettype", "gb".to_string()),
                ("retmode", "text".to_string()),
                ("retstart", start.to_string()),
                ("retmax", max.to_string()),
                ("WebEnv", session.web_env.clone()),
                ("query_key", session.query_key.clone()),
            ],
        )?;
        parse_genbank_batch(text.as_bytes())
    }
}

impl ReferenceSource for EntrezClient {
    fn fetch_fasta_text(&self, accession: &str) -> Result<String> {
        self.get_text(
            "efetch",
            vec![
                ("db", NUCCORE_DB.to_string()),
                ("id", accession.to_string()),
                ("rettype", "fasta".to_string()),
                ("retmode", "text".to_string()),
            ],
        )
    }
}
