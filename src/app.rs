use std::io::{self, Write};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use crossbeam_channel::Receiver;
use tracing::{info, warn};

use crate::classifier::classify_cleanliness;
use crate::cli::{Action, Config, format_size};
use crate::errors::AppError;
use crate::model::{
    FileType, MatchRecord, OpOutcome, ProgressSnapshot, ScanEvent, ScanSummary, SessionId,
};
use crate::operations::OperationGate;
use crate::scanner::{ChannelSink, ScanEngine};

const EVENT_QUEUE_CAPACITY: usize = 4096;
const PROGRESS_REDRAW_INTERVAL: Duration = Duration::from_millis(250);

pub struct App {
    config: Config,
    engine: Arc<ScanEngine>,
    events: Receiver<ScanEvent>,
    matches: Vec<MatchRecord>,
    progress: ProgressSnapshot,
    last_redraw: Option<Instant>,
}

impl App {
    pub fn new(config: Config) -> Self {
        let (sink, events) = ChannelSink::bounded(EVENT_QUEUE_CAPACITY);
        Self {
            config,
            engine: Arc::new(ScanEngine::new(Arc::new(sink))),
            events,
            matches: Vec::new(),
            progress: ProgressSnapshot::new(0, 0),
            last_redraw: None,
        }
    }

    /// Engine handle for out-of-band control such as a Ctrl-C handler.
    pub fn engine(&self) -> Arc<ScanEngine> {
        Arc::clone(&self.engine)
    }

    pub fn run(&mut self) -> Result<(), AppError> {
        let session = self.engine.start_with(self.config.scan_options.clone())?;
        let summary = self.drain_scan_events(session)?;
        eprintln!();

        self.matches
            .sort_by(|a, b| b.size_bytes.cmp(&a.size_bytes).then(a.path.cmp(&b.path)));
        if self.config.show_advice {
            // Stable, so each tier stays largest first.
            self.matches
                .sort_by_key(|record| classify_cleanliness(&record.path).category.priority());
        }
        self.print_report(&summary)?;

        if self.config.reveal {
            let gate = OperationGate::for_engine(&self.engine);
            for record in &self.matches {
                if let Err(error) = gate.reveal(&record.path) {
                    warn!("{error}");
                }
            }
        }

        self.apply_action()
    }

    fn drain_scan_events(&mut self, session: SessionId) -> Result<ScanSummary, AppError> {
        let events = self.events.clone();
        for event in events.iter() {
            if event.session() != session {
                continue;
            }
            match event {
                ScanEvent::MatchBatch { matches, .. } => {
                    self.matches.extend(matches);
                }
                ScanEvent::Progress { progress, .. } => {
                    self.progress = progress;
                    self.redraw_progress(false);
                }
                ScanEvent::Done { summary, .. } => {
                    self.redraw_progress(true);
                    return Ok(summary);
                }
            }
        }

        Err(AppError::InvalidInput(
            "scan ended without a completion event".to_string(),
        ))
    }

    fn redraw_progress(&mut self, force: bool) {
        let due = self
            .last_redraw
            .is_none_or(|last| last.elapsed() >= PROGRESS_REDRAW_INTERVAL);
        if !force && !due {
            return;
        }
        self.last_redraw = Some(Instant::now());
        eprint!(
            "\rscanned {} files, {} matches ({:.0}%)",
            self.progress.processed,
            self.matches.len(),
            self.progress.percent * 100.0
        );
    }

    fn print_report(&self, summary: &ScanSummary) -> Result<(), AppError> {
        let stdout = io::stdout();
        let mut out = stdout.lock();

        for record in &self.matches {
            let file_type = FileType::from_name(&record.name);
            if self.config.show_advice {
                let advice = classify_cleanliness(&record.path);
                writeln!(
                    out,
                    "{:>10}  {:<8} {:<10} {}  ({})",
                    format_size(record.size_bytes),
                    advice.category,
                    file_type.as_str(),
                    record.path.display(),
                    advice.rationale
                )?;
            } else {
                writeln!(
                    out,
                    "{:>10}  {:<10} {}",
                    format_size(record.size_bytes),
                    file_type.as_str(),
                    record.path.display()
                )?;
            }
        }

        let total: u64 = self.matches.iter().map(|record| record.size_bytes).sum();
        writeln!(
            out,
            "{} matches totalling {} out of {} files scanned{}",
            summary.matches,
            format_size(total),
            summary.processed,
            if summary.cancelled { " (cancelled)" } else { "" }
        )?;
        Ok(())
    }

    fn apply_action(&self) -> Result<(), AppError> {
        if self.config.action == Action::List || self.matches.is_empty() {
            return Ok(());
        }

        let paths: Vec<PathBuf> = self.matches.iter().map(|m| m.path.clone()).collect();
        if !self.config.confirmed {
            println!(
                "dry run: {} files would be affected, pass --yes to proceed",
                paths.len()
            );
            return Ok(());
        }

        let gate = OperationGate::for_engine(&self.engine);
        let outcomes = match &self.config.action {
            Action::List => return Ok(()),
            Action::Delete => gate.delete(&paths)?,
            Action::Trash => gate.trash(&paths)?,
            Action::Move(destination) => gate.move_to(&paths, destination)?,
        };
        report_outcomes(&outcomes);
        Ok(())
    }
}

fn report_outcomes(outcomes: &[OpOutcome]) {
    let succeeded = outcomes.iter().filter(|outcome| outcome.ok).count();
    for outcome in outcomes {
        match (&outcome.error, &outcome.to) {
            (Some(error), _) => println!("failed  {}: {error}", outcome.path.display()),
            (None, Some(to)) => println!("moved   {} -> {}", outcome.path.display(), to.display()),
            (None, None) => println!("done    {}", outcome.path.display()),
        }
    }
    info!("{succeeded}/{} operations succeeded", outcomes.len());
    println!("{succeeded} of {} succeeded", outcomes.len());
}
