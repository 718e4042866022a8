use std::io::{self, Write};
use std::time::{Duration, Instant};

struct Split {
    name: String,
    duration: Duration,
}

/**
 * Wall-clock timer used to report render timing as human-readable status
 * strings. The caller decides where the report goes by supplying any
 * `io::Write` sink (stdout, a log buffer, a GUI status pane, ...).
 */
pub struct Stopwatch {
    name: String,
    splits: Vec<Split>,
    start_total: Instant,
    start_split: Instant,
}

impl Stopwatch {
    pub fn new(name: String) -> Stopwatch {
        let now = Instant::now();
        Stopwatch {
            name,
            splits: Vec::new(),
            start_total: now,
            start_split: now,
        }
    }

    pub fn total_elapsed(&self) -> Duration {
        self.start_total.elapsed()
    }

    /// Close out the current split under `name` and start the next one.
    pub fn record_split(&mut self, name: String) -> Duration {
        let duration = self.start_split.elapsed();
        self.start_split = Instant::now();
        self.splits.push(Split { name, duration });
        duration
    }

    pub fn report<W: Write>(&self, writer: &mut W) -> io::Result<()> {
        writeln!(
            writer,
            "{}: total elapsed {:?}",
            self.name,
            self.total_elapsed()
        )?;
        for split in &self.splits {
            writeln!(writer, "  {}: {:?}", split.name, split.duration)?;
        }
        Ok(())
    }
}
