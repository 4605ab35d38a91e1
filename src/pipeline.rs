//! Load lexicons, load urls, then fetch, normalize and score each row.
//! Load failures abort the run; fetch failures only skip their row.

use indicatif::{ProgressBar, ProgressStyle};
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::settings::Settings;
use crate::error::{FetchError, LoadError};
use crate::fetcher::PageSource;
use crate::input::{self, UrlRecord};
use crate::lexicon::Lexicons;
use crate::metrics::{self, DocumentMetrics};
use crate::text::{self, Stopwords};

/// One report row.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalysisResult {
    #[serde(rename = "url_ID")]
    pub id: String,
    #[serde(rename = "URL")]
    pub url: String,
    #[serde(flatten)]
    pub metrics: DocumentMetrics,
}

/// Read-only state shared by every row.
#[derive(Debug, Clone)]
pub struct Analyzer {
    lexicons: Lexicons,
    stopwords: Stopwords,
}

impl Analyzer {
    pub fn new(lexicons: Lexicons, stopwords: Stopwords) -> Self {
        Analyzer { lexicons, stopwords }
    }

    /// Lexicons and stopwords from the configured paths.
    pub fn load(settings: &Settings) -> Result<Self, LoadError> {
        let lexicons = Lexicons::load(&settings.positive_path, &settings.negative_path)?;
        let stopwords = match &settings.stopwords_path {
            Some(path) => Stopwords::load(path)?,
            None => Stopwords::english(),
        };
        debug!(stopwords = stopwords.len(), "Stopword list ready");
        Ok(Analyzer::new(lexicons, stopwords))
    }

    pub fn score_html(&self, html: &str) -> DocumentMetrics {
        let tokens = text::normalize(html, &self.stopwords);
        metrics::analyze(&tokens, &self.lexicons)
    }

    pub fn analyze(
        &self,
        source: &dyn PageSource,
        record: &UrlRecord,
    ) -> Result<AnalysisResult, FetchError> {
        let html = source.fetch(&record.url)?;
        let metrics = self.score_html(&html);
        debug!(id = %record.id, words = metrics.word_count, "Scored page");
        Ok(AnalysisResult {
            id: record.id.clone(),
            url: record.url.clone(),
            metrics,
        })
    }

    /// Skips (and logs) rows whose fetch failed.
    fn analyze_or_skip(&self, source: &dyn PageSource, record: &UrlRecord) -> Option<AnalysisResult> {
        match self.analyze(source, record) {
            Ok(result) => Some(result),
            Err(e) => {
                warn!(id = %record.id, url = %record.url, kind = e.kind(), "Skipping: {}", e);
                None
            }
        }
    }
}

/// Both startup loads, lexicons first. Nothing is fetched if either fails.
pub fn load(settings: &Settings) -> Result<(Analyzer, Vec<UrlRecord>), LoadError> {
    let analyzer = Analyzer::load(settings)?;
    let records = input::load_urls(&settings.urls_path)?;
    Ok((analyzer, records))
}

pub struct RunSummary {
    pub results: Vec<AnalysisResult>,
    pub total: usize,
    pub skipped: usize,
}

/// Process every record. Results keep input order whatever `jobs` is.
pub fn run(
    analyzer: &Analyzer,
    source: &dyn PageSource,
    records: &[UrlRecord],
    jobs: usize,
) -> RunSummary {
    let pb = progress_bar(records.len());
    let rows = analyze_all(analyzer, source, records, jobs, &pb);
    pb.finish_and_clear();

    let results: Vec<AnalysisResult> = rows.into_iter().flatten().collect();
    let total = records.len();
    let skipped = total - results.len();
    info!("Analyzed {} urls ({} ok, {} skipped)", total, results.len(), skipped);

    RunSummary {
        results,
        total,
        skipped,
    }
}

fn analyze_sequential(
    analyzer: &Analyzer,
    source: &dyn PageSource,
    records: &[UrlRecord],
    pb: &ProgressBar,
) -> Vec<Option<AnalysisResult>> {
    records
        .iter()
        .map(|r| {
            let row = analyzer.analyze_or_skip(source, r);
            pb.inc(1);
            row
        })
        .collect()
}

#[cfg(feature = "rayon")]
fn analyze_all(
    analyzer: &Analyzer,
    source: &dyn PageSource,
    records: &[UrlRecord],
    jobs: usize,
    pb: &ProgressBar,
) -> Vec<Option<AnalysisResult>> {
    use rayon::prelude::*;

    if jobs <= 1 || records.len() <= 1 {
        return analyze_sequential(analyzer, source, records, pb);
    }

    let pool = match rayon::ThreadPoolBuilder::new().num_threads(jobs).build() {
        Ok(pool) => pool,
        Err(e) => {
            warn!("Falling back to sequential fetches: {}", e);
            return analyze_sequential(analyzer, source, records, pb);
        }
    };

    pool.install(|| {
        records
            .par_iter()
            .map(|r| {
                let row = analyzer.analyze_or_skip(source, r);
                pb.inc(1);
                row
            })
            .collect()
    })
}

#[cfg(not(feature = "rayon"))]
fn analyze_all(
    analyzer: &Analyzer,
    source: &dyn PageSource,
    records: &[UrlRecord],
    jobs: usize,
    pb: &ProgressBar,
) -> Vec<Option<AnalysisResult>> {
    if jobs > 1 {
        warn!("Built without rayon; ignoring jobs = {}", jobs);
    }
    analyze_sequential(analyzer, source, records, pb)
}

fn progress_bar(len: usize) -> ProgressBar {
    if len <= 1 {
        return ProgressBar::hidden();
    }
    let pb = ProgressBar::new(len as u64);
    if let Ok(style) =
        ProgressStyle::default_bar().template("[{elapsed_precise}] {bar:40} {pos}/{len} ({per_sec}, eta {eta})")
    {
        pb.set_style(style.progress_chars("=> "));
    }
    pb
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::path::PathBuf;
    use std::sync::Mutex;

    /// url -> body, or url -> status code for failures. Records each request.
    struct StubSource {
        pages: HashMap<String, Result<String, u16>>,
        seen: Mutex<Vec<String>>,
    }

    impl StubSource {
        fn new(pages: &[(&str, Result<&str, u16>)]) -> Self {
            StubSource {
                pages: pages
                    .iter()
                    .map(|(u, r)| (u.to_string(), r.map(str::to_string)))
                    .collect(),
                seen: Mutex::new(Vec::new()),
            }
        }
    }

    impl PageSource for StubSource {
        fn fetch(&self, url: &str) -> Result<String, FetchError> {
            self.seen.lock().unwrap().push(url.to_string());
            match self.pages.get(url) {
                Some(Ok(body)) if body.is_empty() => Err(FetchError::EmptyBody),
                Some(Ok(body)) => Ok(body.clone()),
                Some(Err(code)) => Err(FetchError::Status(*code)),
                None => Err(FetchError::Status(404)),
            }
        }
    }

    fn settings() -> Settings {
        Settings {
            urls_path: PathBuf::from("tests/fixtures/urls.csv"),
            positive_path: PathBuf::from("tests/fixtures/positive.txt"),
            negative_path: PathBuf::from("tests/fixtures/negative.txt"),
            stopwords_path: None,
            output_path: None,
            jobs: 1,
            user_agent: None,
        }
    }

    fn fixture_page() -> String {
        std::fs::read_to_string("tests/fixtures/page.html").unwrap()
    }

    #[test]
    fn failed_fetch_skipped_later_rows_processed() {
        let page = fixture_page();
        let source = StubSource::new(&[
            ("https://example.com/a", Ok(page.as_str())),
            ("https://example.com/missing", Err(500)),
            ("https://example.com/b", Ok("<p>bad news</p>")),
        ]);
        let (analyzer, records) = load(&settings()).unwrap();
        let summary = run(&analyzer, &source, &records, 1);

        assert_eq!(summary.total, 3);
        assert_eq!(summary.skipped, 1);
        let ids: Vec<&str> = summary.results.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["101", "103"]);
        assert_eq!(source.seen.lock().unwrap().len(), 3);
        assert_eq!(summary.results[1].metrics.negative_count, 1);
    }

    #[test]
    fn empty_body_is_skipped() {
        let source = StubSource::new(&[("https://x.example", Ok(""))]);
        let analyzer = Analyzer::load(&settings()).unwrap();
        let records = vec![UrlRecord {
            id: "1".into(),
            url: "https://x.example".into(),
        }];
        let summary = run(&analyzer, &source, &records, 1);
        assert!(summary.results.is_empty());
        assert_eq!(summary.skipped, 1);
    }

    #[test]
    fn fixture_page_scores() {
        let analyzer = Analyzer::load(&settings()).unwrap();
        let m = analyzer.score_html(&fixture_page());
        assert_eq!(m.word_count, 11);
        assert_eq!(m.positive_count, 3);
        assert_eq!(m.negative_count, 1);
        assert_eq!(m.sentence_count, 1);
        assert_eq!(m.complex_word_count, 4);
        assert!((m.polarity_score - 0.5).abs() < 1e-4);
        assert!((m.subjectivity_score - 4.0 / 11.0).abs() < 1e-4);
        assert!((m.avg_sentence_length - 11.0).abs() < 1e-9);
        assert!((m.fog_index - 0.4 * (11.0 + 4.0 / 11.0)).abs() < 1e-9);
    }

    #[test]
    fn unreadable_keyword_file_aborts_before_fetching() {
        let mut s = settings();
        s.negative_path = PathBuf::from("tests/fixtures/missing_negative.txt");
        let err = load(&s).err().unwrap();
        assert!(matches!(err, LoadError::Lexicon { .. }));
    }

    #[test]
    fn unreadable_sheet_aborts() {
        let mut s = settings();
        s.urls_path = PathBuf::from("tests/fixtures/urls_missing_column.csv");
        assert!(matches!(load(&s), Err(LoadError::MissingColumn { .. })));
    }

    #[test]
    fn custom_stopword_file() {
        let mut s = settings();
        s.stopwords_path = Some(PathBuf::from("tests/fixtures/negative.txt"));
        let analyzer = Analyzer::load(&s).unwrap();
        // "bad" is now a stopword, "the" no longer is
        let m = analyzer.score_html("<p>the bad day</p>");
        assert_eq!(m.negative_count, 0);
        assert_eq!(m.word_count, 2);
    }

    #[cfg(feature = "rayon")]
    #[test]
    fn parallel_keeps_input_order() {
        let pages: Vec<(String, Result<String, u16>)> = (0..20)
            .map(|i| {
                let url = format!("https://p{}.example", i);
                let body = if i % 3 == 0 {
                    Err(503)
                } else {
                    Ok(format!("<p>{}</p>", "great ".repeat(i)))
                };
                (url, body)
            })
            .collect();
        let source = StubSource {
            pages: pages.into_iter().collect(),
            seen: Mutex::new(Vec::new()),
        };
        let records: Vec<UrlRecord> = (0..20)
            .map(|i| UrlRecord {
                id: i.to_string(),
                url: format!("https://p{}.example", i),
            })
            .collect();
        let analyzer = Analyzer::load(&settings()).unwrap();

        let sequential = run(&analyzer, &source, &records, 1);
        let parallel = run(&analyzer, &source, &records, 4);
        assert_eq!(sequential.results, parallel.results);
        let ids: Vec<usize> = parallel.results.iter().map(|r| r.id.parse().unwrap()).collect();
        let mut sorted = ids.clone();
        sorted.sort();
        assert_eq!(ids, sorted);
        assert_eq!(parallel.skipped, 7);
    }
}
