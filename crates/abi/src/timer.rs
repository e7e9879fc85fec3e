//! Section profiling timers.

use std::time::Duration;

use parking_lot::Mutex;

/// Wall-time counters for the named sections of one kernel.
///
/// Mirrors the C-side profiler block the generated code writes into.
/// Counters are process-local measurement state: persistence keeps the
/// name and section list and restores every counter to zero.
#[derive(Debug)]
pub struct Timer {
    name: String,
    sections: Vec<String>,
    seconds: Mutex<Vec<f64>>,
}

impl Timer {
    pub fn new(name: impl Into<String>, sections: Vec<String>) -> Timer {
        let seconds = Mutex::new(vec![0.0; sections.len()]);
        Timer {
            name: name.into(),
            sections,
            seconds,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn sections(&self) -> &[String] {
        &self.sections
    }

    /// Accumulated seconds for one section, if it exists.
    pub fn value(&self, section: &str) -> Option<f64> {
        let i = self.sections.iter().position(|s| s == section)?;
        Some(self.seconds.lock()[i])
    }

    /// Add elapsed time to a section. Unknown sections are ignored; the
    /// section list is fixed at construction.
    pub fn record(&self, section: &str, elapsed: Duration) {
        if let Some(i) = self.sections.iter().position(|s| s == section) {
            self.seconds.lock()[i] += elapsed.as_secs_f64();
        }
    }

    pub fn total(&self) -> f64 {
        self.seconds.lock().iter().sum()
    }

    pub fn reset(&self) {
        for s in self.seconds.lock().iter_mut() {
            *s = 0.0;
        }
    }
}
