//! Paged retrieval of all nucleotide records for one taxon, keeping those
//! whose length falls in a closed interval.

use crate::{
    entrez::{SearchSession, SequenceDatabase},
    error::{Result, SeqScoutError},
};
use gb_io::seq::Seq;
use serde::Serialize;
use std::{fmt, thread, time::Duration};
use tracing::{debug, info};

pub const DESCRIPTION_WIDTH: usize = 60;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LengthRange {
    min: usize,
    max: usize,
}

impl LengthRange {
    pub fn new(min: usize, max: usize) -> Result<Self> {
        if min > max {
            return Err(SeqScoutError::Message(format!(
                "Minimum length {min} is greater than maximum length {max}"
            )));
        }
        Ok(Self { min, max })
    }

    #[inline(always)]
    pub fn min(&self) -> usize {
        self.min
    }

    #[inline(always)]
    pub fn max(&self) -> usize {
        self.max
    }

    #[inline(always)]
    pub fn contains(&self, length: usize) -> bool {
        (self.min..=self.max).contains(&length)
    }
}

impl fmt::Display for LengthRange {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}-{}", self.min, self.max)
    }
}

/// Accepts a bare numeric taxid, optionally written as `txid<digits>`.
pub fn normalize_taxid(raw: &str) -> Result<String> {
    let trimmed = raw.trim();
    let digits = trimmed
        .strip_prefix("txid")
        .or_else(|| trimmed.strip_prefix("TXID"))
        .unwrap_or(trimmed);
    if digits.is_empty() || !digits.chars().all(|c| c.is_ascii_digit()) {
        return Err(SeqScoutError::Message(format!(
            "Taxonomy ID '{}' must be a number",
            raw.trim()
        )));
    }
    Ok(digits.to_string())
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TaxonQuery {
    taxid: String,
    range: LengthRange,
}

impl TaxonQuery {
    pub fn new(taxid: &str, range: LengthRange) -> Result<Self> {
        Ok(Self {
            taxid: normalize_taxid(taxid)?,
            range,
        })
    }

    pub fn taxid(&self) -> &str {
        &self.taxid
    }

    pub fn range(&self) -> LengthRange {
        self.range
    }

    /// Shared stem of every output file for this query.
    pub fn base_file_name(&self) -> String {
        format!("taxid_{}_{}", self.taxid, self.range)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct SequenceRecord {
    #[serde(rename = "acc")]
    pub accession: String,
    #[serde(rename = "len")]
    pub length: usize,
    #[serde(rename = "desc")]
    pub description: String,
}

impl SequenceRecord {
    pub fn new(accession: &str, length: usize, description: &str) -> Self {
        Self {
            accession: accession.to_string(),
            length,
            description: truncate_chars(description, DESCRIPTION_WIDTH),
        }
    }

    pub fn from_genbank(seq: &Seq) -> Self {
        let accession = nonempty(seq.version.as_deref())
            .or_else(|| nonempty(seq.accession.as_deref()))
            .or_else(|| nonempty(seq.name.as_deref()))
            .unwrap_or("<unknown>");
        let definition = seq.definition.as_deref().unwrap_or_default().trim();
        let definition = definition.strip_suffix('.').unwrap_or(definition);
        Self::new(accession, genbank_length(seq), definition)
    }
}

/// Declared LOCUS length, or the residue count when the header has none.
pub fn genbank_length(seq: &Seq) -> usize {
    seq.len.unwrap_or(seq.seq.len())
}

fn nonempty(raw: Option<&str>) -> Option<&str> {
    raw.map(str::trim).filter(|s| !s.is_empty())
}

fn truncate_chars(text: &str, width: usize) -> String {
    text.chars().take(width).collect()
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ReportTable {
    records: Vec<SequenceRecord>,
}

impl ReportTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, record: SequenceRecord) {
        self.records.push(record);
    }

    #[inline(always)]
    pub fn records(&self) -> &[SequenceRecord] {
        &self.records
    }

    #[inline(always)]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    #[inline(always)]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Longest first; ties keep retrieval order.
    pub fn sort_by_length_desc(&mut self) {
        self.records.sort_by(|a, b| b.length.cmp(&a.length));
    }

    pub fn top(&self, n: usize) -> &[SequenceRecord] {
        &self.records[..self.records.len().min(n)]
    }
}

impl FromIterator<SequenceRecord> for ReportTable {
    fn from_iter<I: IntoIterator<Item = SequenceRecord>>(iter: I) -> Self {
        Self {
            records: iter.into_iter().collect(),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RetrievalPlan {
    pub batch_size: usize,
    pub batch_delay: Duration,
}

impl Default for RetrievalPlan {
    fn default() -> Self {
        Self {
            batch_size: crate::settings::DEFAULT_BATCH_SIZE,
            batch_delay: Duration::from_millis(crate::settings::DEFAULT_BATCH_DELAY_MS),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BatchProgress {
    pub start: usize,
    pub fetched: usize,
    pub retained: usize,
    pub total: usize,
}

/// Reported while a taxon is retrieved: once after the search, then per batch.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RetrievalEvent {
    Searched { count: usize },
    Batch(BatchProgress),
}

/// A batch that failed mid-run, with everything retained before it.
#[derive(Debug)]
pub struct RetrievalFailure {
    pub start: Option<usize>,
    pub partial: ReportTable,
    pub reason: SeqScoutError,
}

impl fmt::Display for RetrievalFailure {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self.start {
            Some(start) => write!(
                f,
                "batch starting at record {start} failed after {} retained records: {}",
                self.partial.len(),
                self.reason
            ),
            None => write!(f, "search failed: {}", self.reason),
        }
    }
}

impl std::error::Error for RetrievalFailure {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.reason)
    }
}

pub fn retrieve_filtered<D: SequenceDatabase>(
    db: &D,
    query: &TaxonQuery,
    plan: &RetrievalPlan,
) -> std::result::Result<ReportTable, RetrievalFailure> {
    let mut noop = |_: &RetrievalEvent| {};
    retrieve_filtered_with_progress(db, query, plan, &mut noop)
}

pub fn retrieve_filtered_with_progress<D, F>(
    db: &D,
    query: &TaxonQuery,
    plan: &RetrievalPlan,
    on_event: &mut F,
) -> std::result::Result<ReportTable, RetrievalFailure>
where
    D: SequenceDatabase,
    F: FnMut(&RetrievalEvent),
{
    retrieve_paced(db, query, plan, on_event, &mut thread::sleep)
}

fn retrieve_paced<D, F, P>(
    db: &D,
    query: &TaxonQuery,
    plan: &RetrievalPlan,
    on_event: &mut F,
    pause: &mut P,
) -> std::result::Result<ReportTable, RetrievalFailure>
where
    D: SequenceDatabase,
    F: FnMut(&RetrievalEvent),
    P: FnMut(Duration),
{
    let session = db
        .search_taxon(query.taxid())
        .map_err(|reason| RetrievalFailure {
            start: None,
            partial: ReportTable::new(),
            reason,
        })?;
    info!(taxid = query.taxid(), count = session.count, "search finished");
    on_event(&RetrievalEvent::Searched {
        count: session.count,
    });
    if session.count == 0 {
        return Ok(ReportTable::new());
    }
    filter_batches(db, &session, query.range(), plan, on_event, pause)
}

/// Fetches every batch of `session`, pausing `plan.batch_delay` between
/// consecutive batches only.
fn filter_batches<D, F, P>(
    db: &D,
    session: &SearchSession,
    range: LengthRange,
    plan: &RetrievalPlan,
    on_event: &mut F,
    pause: &mut P,
) -> std::result::Result<ReportTable, RetrievalFailure>
where
    D: SequenceDatabase,
    F: FnMut(&RetrievalEvent),
    P: FnMut(Duration),
{
    let batch_size = plan.batch_size.max(1);
    let mut table = ReportTable::new();
    let mut starts = (0..session.count).step_by(batch_size).peekable();

    while let Some(start) = starts.next() {
        let batch = match db.fetch_genbank_batch(session, start, batch_size) {
            Ok(batch) => batch,
            Err(reason) => {
                return Err(RetrievalFailure {
                    start: Some(start),
                    partial: table,
                    reason,
                });
            }
        };
        let before = table.len();
        for seq in &batch {
            if range.contains(genbank_length(seq)) {
                table.push(SequenceRecord::from_genbank(seq));
            }
        }
        let progress = BatchProgress {
            start,
            fetched: batch.len(),
            retained: table.len() - before,
            total: session.count,
        };
        debug!(?progress, "batch filtered");
        on_event(&RetrievalEvent::Batch(progress));

        if starts.peek().is_some() && !plan.batch_delay.is_zero() {
            pause(plan.batch_delay);
        }
    }
    Ok(table)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entrez::parse_genbank_batch;
    use std::cell::{Cell, RefCell};

    fn toy_seq(version: &str, len: usize, definition: &str) -> Seq {
        let mut seq = Seq::empty();
        seq.version = Some(version.to_string());
        seq.definition = Some(definition.to_string());
        seq.seq = vec![b'A'; len];
        seq.len = Some(len);
        seq
    }

    struct MockDatabase {
        count: usize,
        records: Vec<Seq>,
        fail_at: Option<usize>,
        fetch_calls: Cell<usize>,
        starts: RefCell<Vec<usize>>,
    }

    impl MockDatabase {
        fn new(records: Vec<Seq>) -> Self {
            Self {
                count: records.len(),
                records,
                fail_at: None,
                fetch_calls: Cell::new(0),
                starts: RefCell::new(vec![]),
            }
        }
    }

    impl SequenceDatabase for MockDatabase {
        fn search_taxon(&self, _taxid: &str) -> Result<SearchSession> {
            if self.count == 0 {
                return Ok(SearchSession::empty());
            }
            Ok(SearchSession {
                count: self.count,
                web_env: "MCID_test".to_string(),
                query_key: "1".to_string(),
            })
        }

        fn fetch_genbank_batch(
            &self,
            session: &SearchSession,
            start: usize,
            max: usize,
        ) -> Result<Vec<Seq>> {
            assert_eq!(session.web_env, "MCID_test");
            self.fetch_calls.set(self.fetch_calls.get() + 1);
            self.starts.borrow_mut().push(start);
            if self.fail_at == Some(start) {
                return Err(SeqScoutError::Message("connection reset".to_string()));
            }
            let end = self.records.len().min(start + max);
            Ok(self.records[start..end].to_vec())
        }
    }

    fn fast_plan(batch_size: usize) -> RetrievalPlan {
        RetrievalPlan {
            batch_size,
            batch_delay: Duration::ZERO,
        }
    }

    #[test]
    fn closed_interval_keeps_both_bounds() {
        let range = LengthRange::new(100, 200).unwrap();
        assert!(range.contains(100));
        assert!(range.contains(200));
        assert!(!range.contains(99));
        assert!(!range.contains(201));
        assert!(LengthRange::new(5, 5).unwrap().contains(5));
        assert!(LengthRange::new(6, 5).is_err());
    }

    #[test]
    fn taxid_must_be_numeric() {
        let range = LengthRange::new(1, 2).unwrap();
        assert_eq!(TaxonQuery::new(" 9606 ", range).unwrap().taxid(), "9606");
        assert_eq!(TaxonQuery::new("txid10239", range).unwrap().taxid(), "10239");
        assert!(TaxonQuery::new("", range).is_err());
        assert!(TaxonQuery::new("human", range).is_err());
    }

    #[test]
    fn base_file_name_uses_taxid_and_bounds() {
        let query = TaxonQuery::new("2697049", LengthRange::new(29000, 30000).unwrap()).unwrap();
        assert_eq!(query.base_file_name(), "taxid_2697049_29000-30000");
    }

    #[test]
    fn zero_count_performs_no_fetches() {
        let db = MockDatabase::new(vec![]);
        let query = TaxonQuery::new("1", LengthRange::new(0, 10).unwrap()).unwrap();
        let mut events = vec![];
        let table =
            retrieve_filtered_with_progress(&db, &query, &fast_plan(100), &mut |e: &RetrievalEvent| {
                events.push(e.clone())
            })
            .unwrap();
        assert!(table.is_empty());
        assert_eq!(db.fetch_calls.get(), 0);
        assert_eq!(events, vec![RetrievalEvent::Searched { count: 0 }]);
    }

    #[test]
    fn default_plan_pages_by_100_with_300ms_pause() {
        let plan = RetrievalPlan::default();
        assert_eq!(plan.batch_size, 100);
        assert_eq!(plan.batch_delay, Duration::from_millis(300));
    }

    const PAUSE_MARK: usize = usize::MAX;

    #[test]
    fn pauses_only_between_batches() {
        let db = MockDatabase::new(
            (0..250)
                .map(|i| toy_seq(&format!("W{i}.1"), 10, "paced"))
                .collect(),
        );
        let query = TaxonQuery::new("1", LengthRange::new(0, 100).unwrap()).unwrap();
        let mut pauses = vec![];
        let table = retrieve_paced(
            &db,
            &query,
            &RetrievalPlan::default(),
            &mut |_: &RetrievalEvent| {},
            &mut |d: Duration| {
                db.starts.borrow_mut().push(PAUSE_MARK);
                pauses.push(d);
            },
        )
        .unwrap();
        assert_eq!(table.len(), 250);
        assert_eq!(pauses, vec![Duration::from_millis(300); 2]);
        assert_eq!(
            *db.starts.borrow(),
            vec![0, PAUSE_MARK, 100, PAUSE_MARK, 200]
        );
    }

    #[test]
    fn single_batch_never_pauses() {
        let db = MockDatabase::new(vec![toy_seq("S1.1", 10, "one")]);
        let query = TaxonQuery::new("1", LengthRange::new(0, 100).unwrap()).unwrap();
        let mut pauses = 0;
        retrieve_paced(
            &db,
            &query,
            &RetrievalPlan::default(),
            &mut |_: &RetrievalEvent| {},
            &mut |_: Duration| pauses += 1,
        )
        .unwrap();
        assert_eq!(pauses, 0);
    }

    #[test]
    fn batch_delay_actually_sleeps() {
        let db = MockDatabase::new(
            (0..3)
                .map(|i| toy_seq(&format!("T{i}.1"), 10, "timed"))
                .collect(),
        );
        let query = TaxonQuery::new("1", LengthRange::new(0, 100).unwrap()).unwrap();
        let plan = RetrievalPlan {
            batch_size: 1,
            batch_delay: Duration::from_millis(20),
        };
        let started = std::time::Instant::now();
        retrieve_filtered(&db, &query, &plan).unwrap();
        assert!(started.elapsed() >= Duration::from_millis(40));
        assert_eq!(db.fetch_calls.get(), 3);
    }

    #[test]
    fn batches_are_paged_and_filtered_on_closed_interval() {
        let records = (0..250)
            .map(|i| toy_seq(&format!("ACC{i:03}.1"), 90 + (i % 30), "toy record"))
            .collect::<Vec<_>>();
        let db = MockDatabase::new(records);
        let query = TaxonQuery::new("1", LengthRange::new(100, 110).unwrap()).unwrap();
        let mut seen = vec![];
        let table =
            retrieve_filtered_with_progress(&db, &query, &fast_plan(100), &mut |e: &RetrievalEvent| {
                seen.push(e.clone())
            })
            .unwrap();

        assert_eq!(*db.starts.borrow(), vec![0, 100, 200]);
        assert_eq!(seen[0], RetrievalEvent::Searched { count: 250 });
        let seen = seen
            .into_iter()
            .filter_map(|e| match e {
                RetrievalEvent::Batch(p) => Some(p),
                RetrievalEvent::Searched { .. } => None,
            })
            .collect::<Vec<_>>();
        assert_eq!(seen.len(), 3);
        assert_eq!(seen[2].fetched, 50);
        assert!(seen.iter().all(|p| p.total == 250));
        assert!(table.records().iter().all(|r| (100..=110).contains(&r.length)));
        let expected = (0..250).filter(|i| (100..=110).contains(&(90 + (i % 30)))).count();
        assert_eq!(table.len(), expected);
        assert_eq!(seen.iter().map(|p| p.retained).sum::<usize>(), expected);
    }

    #[test]
    fn boundary_lengths_are_retained_and_neighbours_dropped() {
        let db = MockDatabase::new(vec![
            toy_seq("LOW.1", 9, "below"),
            toy_seq("MIN.1", 10, "at min"),
            toy_seq("MAX.1", 20, "at max"),
            toy_seq("HIGH.1", 21, "above"),
        ]);
        let query = TaxonQuery::new("1", LengthRange::new(10, 20).unwrap()).unwrap();
        let table = retrieve_filtered(&db, &query, &fast_plan(100)).unwrap();
        let accessions = table
            .records()
            .iter()
            .map(|r| r.accession.as_str())
            .collect::<Vec<_>>();
        assert_eq!(accessions, vec!["MIN.1", "MAX.1"]);
    }

    #[test]
    fn failed_batch_returns_partial_table() {
        let mut db = MockDatabase::new(
            (0..30)
                .map(|i| toy_seq(&format!("P{i}.1"), 50, "partial"))
                .collect(),
        );
        db.fail_at = Some(20);
        let query = TaxonQuery::new("1", LengthRange::new(0, 100).unwrap()).unwrap();
        let failure = retrieve_filtered(&db, &query, &fast_plan(10)).unwrap_err();
        assert_eq!(failure.start, Some(20));
        assert_eq!(failure.partial.len(), 20);
        assert!(failure.to_string().contains("connection reset"));
        assert_eq!(db.fetch_calls.get(), 3);
    }

    #[test]
    fn descriptions_are_truncated_to_display_width() {
        let long = "x".repeat(DESCRIPTION_WIDTH + 15);
        let record = SequenceRecord::new("A.1", 1, &long);
        assert_eq!(record.description.chars().count(), DESCRIPTION_WIDTH);
        let unicode = SequenceRecord::new("B.1", 1, &"ü".repeat(70));
        assert_eq!(unicode.description.chars().count(), DESCRIPTION_WIDTH);
    }

    #[test]
    fn genbank_fields_map_to_report_columns() {
        let text = include_str!("../test_files/entrez/efetch.batch.gb");
        let records = parse_genbank_batch(text.as_bytes()).unwrap();
        let first = SequenceRecord::from_genbank(&records[0]);
        assert_eq!(first.accession, "MN908947.3");
        assert_eq!(first.length, 30);
        assert_eq!(
            first.description,
            "Severe acute respiratory syndrome coronavirus 2 isolate Wuha"
        );
        let third = SequenceRecord::from_genbank(&records[2]);
        assert_eq!(third.description, "Test virus fragment");
    }

    #[test]
    fn sorting_is_longest_first_and_top_is_bounded() {
        let mut table: ReportTable = [3, 9, 1, 9, 5]
            .iter()
            .enumerate()
            .map(|(i, len)| SequenceRecord::new(&format!("R{i}"), *len, ""))
            .collect();
        table.sort_by_length_desc();
        let order = table
            .records()
            .iter()
            .map(|r| r.accession.as_str())
            .collect::<Vec<_>>();
        assert_eq!(order, vec!["R1", "R3", "R4", "R0", "R2"]);
        assert_eq!(table.top(2).len(), 2);
        assert_eq!(table.top(50).len(), 5);
    }
}
