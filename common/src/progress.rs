use std::io::IsTerminal;

/// Default delay between text progress updates
pub const DEFAULT_TEXT_DELAY: std::time::Duration = std::time::Duration::from_secs(30);
/// Default refresh interval of the interactive progress bar
pub const DEFAULT_BAR_DELAY: std::time::Duration = std::time::Duration::from_millis(200);

pub const COMPLETED: &str = "Completed";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum ProgressType {
    #[default]
    #[value(alias = "Auto")]
    Auto,
    #[value(alias = "ProgressBar")]
    ProgressBar,
    #[value(alias = "TextUpdates")]
    TextUpdates,
}

#[derive(Debug, Clone, Default)]
pub struct ProgressSettings {
    pub progress_type: ProgressType,
    /// Human readable duration, e.g. "200ms", "10s", "5min"
    pub progress_delay: Option<String>,
}

impl ProgressSettings {
    fn delay(&self, default: std::time::Duration) -> anyhow::Result<std::time::Duration> {
        match &self.progress_delay {
            Some(delay) => Ok(humantime::parse_duration(delay)?),
            None => Ok(default),
        }
    }
}

/// Receives per-chunk updates from the transfer engine
pub trait ProgressSink {
    /// In-progress update, may be rate limited
    fn update(&mut self, done: u64, total: u64, label: &str);
    /// Final update, always shown
    fn finish(&mut self, done: u64, total: u64, label: &str);
}

/// Bytes moved so far and when they were last reported
#[derive(Debug, Clone)]
pub struct TransferProgress {
    pub done: u64,
    pub total: u64,
    started: std::time::Instant,
    last_printed_at: Option<std::time::Instant>,
}

impl TransferProgress {
    pub fn new(started: std::time::Instant) -> Self {
        Self {
            done: 0,
            total: 0,
            started,
            last_printed_at: None,
        }
    }

    pub fn percent(&self) -> f64 {
        if self.total == 0 {
            return 100.0;
        }
        self.done as f64 * 100.0 / self.total as f64
    }

    pub fn rate(&self, now: std::time::Instant) -> u64 {
        let secs = now.saturating_duration_since(self.started).as_secs_f64();
        if secs <= 0.0 {
            return 0;
        }
        (self.done as f64 / secs) as u64
    }

    /// Whether an in-progress line is due at `now`
    fn due(&self, now: std::time::Instant, delay: std::time::Duration) -> bool {
        match self.last_printed_at {
            None => true,
            Some(last) => now.saturating_duration_since(last) >= delay,
        }
    }

    fn format(&self, label: &str, now: std::time::Instant) -> String {
        format!(
            "{}: {} of {} ({:.1}%) average {}/s",
            label,
            bytesize::ByteSize(self.done),
            bytesize::ByteSize(self.total),
            self.percent(),
            bytesize::ByteSize(self.rate(now)),
        )
    }
}

/// Rate-limited progress lines, suitable for logs and non-interactive terminals
pub struct TextProgress<W: std::io::Write> {
    out: W,
    delay: std::time::Duration,
    progress: TransferProgress,
}

impl<W: std::io::Write> TextProgress<W> {
    pub fn new(out: W, delay: std::time::Duration) -> Self {
        Self::starting_at(out, delay, std::time::Instant::now())
    }

    pub fn starting_at(out: W, delay: std::time::Duration, started: std::time::Instant) -> Self {
        Self {
            out,
            delay,
            progress: TransferProgress::new(started),
        }
    }

    pub fn update_at(&mut self, now: std::time::Instant, done: u64, total: u64, label: &str) {
        self.progress.done = done;
        self.progress.total = total;
        if !self.progress.due(now, self.delay) {
            return;
        }
        self.print(now, label);
    }

    pub fn finish_at(&mut self, now: std::time::Instant, done: u64, total: u64, label: &str) {
        self.progress.done = done;
        self.progress.total = total;
        self.print(now, label);
    }

    fn print(&mut self, now: std::time::Instant, label: &str) {
        let line = self.progress.format(label, now);
        if let Err(error) = writeln!(self.out, "{line}") {
            tracing::debug!("failed printing progress: {}", error);
        }
        self.progress.last_printed_at = Some(now);
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: std::io::Write> ProgressSink for TextProgress<W> {
    fn update(&mut self, done: u64, total: u64, label: &str) {
        self.update_at(std::time::Instant::now(), done, total, label);
    }

    fn finish(&mut self, done: u64, total: u64, label: &str) {
        self.finish_at(std::time::Instant::now(), done, total, label);
    }
}

/// Interactive progress bar drawn on stderr
pub struct BarProgress {
    bar: indicatif::ProgressBar,
}

impl BarProgress {
    pub fn new(delay: std::time::Duration) -> anyhow::Result<Self> {
        let bar = indicatif::ProgressBar::with_draw_target(
            None,
            indicatif::ProgressDrawTarget::stderr_with_hz(refresh_rate(delay)),
        );
        bar.set_style(
            indicatif::ProgressStyle::with_template(
                "{msg:>10} [{elapsed_precise}] [{wide_bar}] {binary_bytes}/{binary_total_bytes} ({binary_bytes_per_sec}, {eta})",
            )?
            .progress_chars("=> "),
        );
        Ok(Self { bar })
    }
}

fn refresh_rate(delay: std::time::Duration) -> u8 {
    let millis = delay.as_millis().max(1);
    (1000 / millis).clamp(1, 20) as u8
}

impl ProgressSink for BarProgress {
    fn update(&mut self, done: u64, total: u64, label: &str) {
        if self.bar.length() != Some(total) {
            self.bar.set_length(total);
        }
        self.bar.set_message(label.to_string());
        self.bar.set_position(done);
    }

    fn finish(&mut self, done: u64, total: u64, label: &str) {
        self.bar.set_length(total);
        self.bar.set_position(done);
        self.bar.finish_with_message(label.to_string());
    }
}

/// Discards all updates
pub struct NoProgress;

impl ProgressSink for NoProgress {
    fn update(&mut self, _done: u64, _total: u64, _label: &str) {}
    fn finish(&mut self, _done: u64, _total: u64, _label: &str) {}
}

/// Picks the reporter for `settings`, `None` disables progress output
pub fn reporter(settings: Option<&ProgressSettings>) -> anyhow::Result<Box<dyn ProgressSink>> {
    let Some(settings) = settings else {
        return Ok(Box::new(NoProgress));
    };
    let progress_type = match settings.progress_type {
        ProgressType::Auto => {
            if std::io::stderr().is_terminal() {
                ProgressType::ProgressBar
            } else {
                ProgressType::TextUpdates
            }
        }
        other => other,
    };
    match progress_type {
        ProgressType::ProgressBar => Ok(Box::new(BarProgress::new(
            settings.delay(DEFAULT_BAR_DELAY)?,
        )?)),
        _ => Ok(Box::new(TextProgress::new(
            std::io::stderr(),
            settings.delay(DEFAULT_TEXT_DELAY)?,
        ))),
    }
}
