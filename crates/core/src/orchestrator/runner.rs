//! Acquisition orchestrator implementation.
//!
//! Walks language → book → chapter → content type in a fixed order. For each
//! chapter every distinct work gets at most one audio and one text artifact,
//! taken from the best candidate that succeeds. Timing rides on audio.

use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, info, info_span, warn, Instrument};
use uuid::Uuid;

use crate::canon::BookRequest;
use crate::classifier::{ClassifiedMetadata, ExclusionSet};
use crate::content_api::{ContentClient, FetchError};
use crate::fileset_id::FilesetId;
use crate::ledger::{AcquisitionErrorKind, ErrorLedger, FormatError};
use crate::metrics;
use crate::repository::{LanguageMetadata, MetadataRepository};
use crate::store::{ArtifactKind, ContentStore, ExistingArtifact, StoreError, StreamWriteError};

use super::config::OrchestratorConfig;
use super::selection::{audio_candidates, text_candidates};
use super::types::{BookReport, ChapterOutcome, LanguageReport, OrchestratorError};

/// State for the chapter currently being acquired.
struct ChapterRun<'a> {
    language: &'a str,
    book: &'a str,
    chapter: u32,
    metadata: &'a LanguageMetadata,
    ledger: &'a mut ErrorLedger,
    outcome: ChapterOutcome,
}

impl ChapterRun<'_> {
    /// Append a failure to the ledger. Ledger write errors are logged only.
    fn fail(
        &mut self,
        content: ArtifactKind,
        candidate: &ClassifiedMetadata,
        fileset: &FilesetId,
        kind: AcquisitionErrorKind,
        details: impl Into<String>,
    ) {
        let details = details.into();
        warn!(
            language = self.language,
            book = self.book,
            chapter = self.chapter,
            fileset = %fileset,
            content = content.as_str(),
            error_type = kind.as_str(),
            details = %details,
            "Acquisition failed"
        );
        metrics::ACQUISITION_ATTEMPTS
            .with_label_values(&[content.as_str(), "failed"])
            .inc();
        self.outcome.failures += 1;

        let error = FormatError::new(kind)
            .with_fileset(fileset)
            .with_distinct_id(candidate.work_identity())
            .with_format(candidate.fileset.kind.clone())
            .with_details(details);
        if let Err(e) = self.ledger.record(self.book, self.chapter, content, error) {
            warn!(path = %self.ledger.path().display(), error = %e, "Failed to update error ledger");
        }
    }
}

fn success(content: ArtifactKind, result: &str) {
    metrics::ACQUISITION_ATTEMPTS
        .with_label_values(&[content.as_str(), result])
        .inc();
}

/// Map a fetch error to its ledger tag. Rejected credentials abort the run.
fn classify_fetch_error(
    error: FetchError,
) -> Result<(AcquisitionErrorKind, String), OrchestratorError> {
    match error {
        FetchError::NotConfigured(_) => Err(OrchestratorError::Unauthorized(error)),
        e if e.is_transport() => Ok((AcquisitionErrorKind::TransportFailure, e.to_string())),
        e => Ok((AcquisitionErrorKind::ApiError, e.to_string())),
    }
}

/// Drives acquisition of audio, text and timing for one language at a time.
pub struct AcquisitionOrchestrator {
    config: OrchestratorConfig,
    client: Arc<dyn ContentClient>,
    repository: Arc<dyn MetadataRepository>,
    store: ContentStore,
    ledger_dir: PathBuf,
    exclusions: ExclusionSet,
}

impl AcquisitionOrchestrator {
    /// Create an orchestrator. Loads the exclusion set from the repository.
    pub fn new(
        config: OrchestratorConfig,
        client: Arc<dyn ContentClient>,
        repository: Arc<dyn MetadataRepository>,
        store: ContentStore,
        ledger_dir: impl Into<PathBuf>,
    ) -> Result<Self, OrchestratorError> {
        let exclusions = repository.load_exclusions()?;
        debug!(excluded = exclusions.len(), "Loaded exclusion set");
        Ok(Self {
            config,
            client,
            repository,
            store,
            ledger_dir: ledger_dir.into(),
            exclusions,
        })
    }

    pub fn config(&self) -> &OrchestratorConfig {
        &self.config
    }

    /// Acquire content for `books` of one language.
    ///
    /// An empty `books` slice means every book the language's coverage
    /// suggests. Per-unit failures land in the error ledger; only missing
    /// metadata, ledger I/O and rejected credentials fail the call.
    pub async fn acquire_language(
        &self,
        iso: &str,
        books: &[BookRequest],
    ) -> Result<LanguageReport, OrchestratorError> {
        let run_id = Uuid::new_v4();
        let span = info_span!("acquire_language", run_id = %run_id, language = iso);
        self.run_language(run_id, iso, books).instrument(span).await
    }

    async fn run_language(
        &self,
        run_id: Uuid,
        iso: &str,
        books: &[BookRequest],
    ) -> Result<LanguageReport, OrchestratorError> {
        let started_at = Utc::now();
        let metadata = self.repository.load_language(iso)?;
        if metadata.is_empty() {
            return Err(OrchestratorError::LanguageNotFound(iso.to_string()));
        }

        let requests = if books.is_empty() {
            metadata
                .default_books()
                .into_iter()
                .map(BookRequest::whole)
                .collect::<Result<Vec<_>, _>>()?
        } else {
            books.to_vec()
        };

        let mut ledger = ErrorLedger::open(&self.ledger_dir, iso)?;
        info!(
            records = metadata.len(),
            books = requests.len(),
            force = self.config.force,
            "Starting acquisition"
        );

        let mut reports = Vec::with_capacity(requests.len());
        for request in &requests {
            reports.push(self.acquire_book(iso, &metadata, &mut ledger, request).await?);
        }

        let errors = ledger.summary();
        if errors.total() > 0 {
            warn!(
                chapters_with_errors = errors.total_chapters_with_errors,
                audio_errors = errors.audio_errors,
                text_errors = errors.text_errors,
                timing_errors = errors.timing_errors,
                ledger = %ledger.path().display(),
                "Error ledger summary"
            );
        }

        let report = LanguageReport {
            run_id,
            language: iso.to_string(),
            started_at,
            finished_at: Utc::now(),
            books: reports,
            errors,
        };
        info!(
            audio = report.audio_successes(),
            text = report.text_successes(),
            timing = report.timing_successes(),
            failures = report.failures(),
            "Acquisition finished"
        );
        Ok(report)
    }

    async fn acquire_book(
        &self,
        iso: &str,
        metadata: &LanguageMetadata,
        ledger: &mut ErrorLedger,
        request: &BookRequest,
    ) -> Result<BookReport, OrchestratorError> {
        let book = request.book.as_str();
        let audio = audio_candidates(metadata, &self.exclusions, book);
        let text = text_candidates(metadata, &self.exclusions, book);

        let mut report = BookReport {
            book: book.to_string(),
            audio_candidates: audio.len(),
            text_candidates: text.len(),
            chapters: Vec::new(),
        };
        if report.nothing_to_do() {
            info!(book, "No filesets cover this book, nothing to do");
            return Ok(report);
        }
        debug!(
            book,
            audio_candidates = audio.len(),
            text_candidates = text.len(),
            "Acquiring book"
        );

        for &chapter in &request.chapters {
            let mut run = ChapterRun {
                language: iso,
                book,
                chapter,
                metadata,
                ledger: &mut *ledger,
                outcome: ChapterOutcome::new(chapter),
            };

            let mut audio_done: HashSet<String> = HashSet::new();
            for candidate in &audio {
                let work = candidate.work_identity();
                if audio_done.contains(&work) {
                    continue;
                }
                if self.acquire_audio(&mut run, candidate, &work).await? {
                    audio_done.insert(work);
                }
            }

            let mut text_done: HashSet<String> = HashSet::new();
            for candidate in &text {
                let work = candidate.work_identity();
                if text_done.contains(&work) {
                    continue;
                }
                if self.acquire_text(&mut run, candidate, &work).await? {
                    text_done.insert(work);
                }
            }

            report.chapters.push(run.outcome);
        }
        Ok(report)
    }

    /// Returns whether the work now has audio for the chapter.
    async fn acquire_audio(
        &self,
        run: &mut ChapterRun<'_>,
        candidate: &ClassifiedMetadata,
        work: &str,
    ) -> Result<bool, OrchestratorError> {
        if !self.config.force {
            if let Some(existing) = self
                .existing(run, work, ArtifactKind::Audio)
                .await
            {
                debug!(
                    book = run.book,
                    chapter = run.chapter,
                    path = %existing.path.display(),
                    "Audio already present"
                );
                run.outcome.audio_existing += 1;
                success(ArtifactKind::Audio, "existing");
                self.acquire_timing(run, candidate, &existing.fileset, work)
                    .await?;
                return Ok(true);
            }
        }

        let fileset = candidate.id();
        let location = match self
            .client
            .audio_location(fileset, run.book, run.chapter)
            .await
        {
            Ok(Some(location)) => location,
            Ok(None) => {
                run.fail(
                    ArtifactKind::Audio,
                    candidate,
                    fileset,
                    AcquisitionErrorKind::NotAvailable,
                    "no audio location returned",
                );
                return Ok(false);
            }
            Err(e) => {
                let (kind, details) = classify_fetch_error(e)?;
                run.fail(ArtifactKind::Audio, candidate, fileset, kind, details);
                return Ok(false);
            }
        };

        let media = match self.client.download_media(&location).await {
            Ok(media) => media,
            Err(e) => {
                let (kind, details) = classify_fetch_error(e)?;
                run.fail(ArtifactKind::Audio, candidate, fileset, kind, details);
                return Ok(false);
            }
        };

        let path = self.store.layout().artifact_path(
            run.language,
            work,
            run.book,
            run.chapter,
            fileset,
            ArtifactKind::Audio,
        );
        let failure = match self.store.write_stream_atomic(&path, media).await {
            Ok(_) => None,
            Err(StreamWriteError::Source(e)) => Some(classify_fetch_error(e)?),
            Err(StreamWriteError::Store(StoreError::EmptyContent { .. })) => Some((
                AcquisitionErrorKind::NotAvailable,
                "empty media response".to_string(),
            )),
            Err(StreamWriteError::Store(e)) => {
                Some((AcquisitionErrorKind::WriteFailed, e.to_string()))
            }
        };
        if let Some((kind, details)) = failure {
            run.fail(ArtifactKind::Audio, candidate, fileset, kind, details);
            return Ok(false);
        }

        info!(
            book = run.book,
            chapter = run.chapter,
            fileset = %fileset,
            work,
            "Audio downloaded"
        );
        run.outcome.audio_downloaded += 1;
        success(ArtifactKind::Audio, "downloaded");
        self.acquire_timing(run, candidate, fileset, work).await?;
        Ok(true)
    }

    /// Fetch timing for an audio fileset that has it and lacks it on disk.
    async fn acquire_timing(
        &self,
        run: &mut ChapterRun<'_>,
        candidate: &ClassifiedMetadata,
        fileset: &FilesetId,
        work: &str,
    ) -> Result<(), OrchestratorError> {
        if !self.config.fetch_timing || !run.metadata.timing_available(fileset) {
            return Ok(());
        }

        let path = self.store.layout().artifact_path(
            run.language,
            work,
            run.book,
            run.chapter,
            fileset,
            ArtifactKind::Timing,
        );
        if !self.config.force && ContentStore::is_complete(&path).await {
            run.outcome.timing_existing += 1;
            success(ArtifactKind::Timing, "existing");
            return Ok(());
        }

        let timing = match self
            .client
            .chapter_timing(fileset, run.book, run.chapter)
            .await
        {
            Ok(Some(timing)) => timing,
            Ok(None) => {
                run.fail(
                    ArtifactKind::Timing,
                    candidate,
                    fileset,
                    AcquisitionErrorKind::NotAvailable,
                    "no timing data returned",
                );
                return Ok(());
            }
            Err(e) => {
                let (kind, details) = classify_fetch_error(e)?;
                run.fail(ArtifactKind::Timing, candidate, fileset, kind, details);
                return Ok(());
            }
        };

        let written = match serde_json::to_vec_pretty(&timing) {
            Ok(bytes) => self
                .store
                .write_atomic(&path, &bytes)
                .await
                .map_err(|e| e.to_string()),
            Err(e) => Err(e.to_string()),
        };
        match written {
            Ok(_) => {
                debug!(book = run.book, chapter = run.chapter, fileset = %fileset, "Timing saved");
                run.outcome.timing_downloaded += 1;
                success(ArtifactKind::Timing, "downloaded");
            }
            Err(details) => run.fail(
                ArtifactKind::Timing,
                candidate,
                fileset,
                AcquisitionErrorKind::WriteFailed,
                details,
            ),
        }
        Ok(())
    }

    /// Returns whether the work now has text for the chapter.
    async fn acquire_text(
        &self,
        run: &mut ChapterRun<'_>,
        candidate: &ClassifiedMetadata,
        work: &str,
    ) -> Result<bool, OrchestratorError> {
        if !self.config.force {
            if let Some(existing) = self.existing(run, work, ArtifactKind::Text).await {
                debug!(
                    book = run.book,
                    chapter = run.chapter,
                    path = %existing.path.display(),
                    "Text already present"
                );
                run.outcome.text_existing += 1;
                success(ArtifactKind::Text, "existing");
                return Ok(true);
            }
        }

        let fileset = candidate.id();
        let text = match self
            .client
            .chapter_text(fileset, run.book, run.chapter)
            .await
        {
            Ok(Some(text)) if !text.trim().is_empty() => text,
            Ok(_) => {
                run.fail(
                    ArtifactKind::Text,
                    candidate,
                    fileset,
                    AcquisitionErrorKind::NotAvailable,
                    "no verse text returned",
                );
                return Ok(false);
            }
            Err(e) => {
                let (kind, details) = classify_fetch_error(e)?;
                run.fail(ArtifactKind::Text, candidate, fileset, kind, details);
                return Ok(false);
            }
        };

        let path = self.store.layout().artifact_path(
            run.language,
            work,
            run.book,
            run.chapter,
            fileset,
            ArtifactKind::Text,
        );
        if let Err(e) = self.store.write_atomic(&path, text.as_bytes()).await {
            run.fail(
                ArtifactKind::Text,
                candidate,
                fileset,
                AcquisitionErrorKind::WriteFailed,
                e.to_string(),
            );
            return Ok(false);
        }

        info!(
            book = run.book,
            chapter = run.chapter,
            fileset = %fileset,
            work,
            "Text downloaded"
        );
        run.outcome.text_downloaded += 1;
        success(ArtifactKind::Text, "downloaded");
        Ok(true)
    }

    /// Complete artifact of `kind` already stored for the work's chapter.
    async fn existing(
        &self,
        run: &ChapterRun<'_>,
        work: &str,
        kind: ArtifactKind,
    ) -> Option<ExistingArtifact> {
        match self
            .store
            .find_existing(run.language, work, run.book, run.chapter, kind)
            .await
        {
            Ok(found) => found,
            Err(e) => {
                warn!(
                    book = run.book,
                    chapter = run.chapter,
                    work,
                    error = %e,
                    "Could not scan for existing artifacts"
                );
                None
            }
        }
    }
}
