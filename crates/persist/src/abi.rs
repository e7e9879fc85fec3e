//! Foreign-ABI object persistence.

use serde::{Deserialize, Serialize};

use mantle_abi::{NativeDescriptor, Timer};

use crate::envelope::{ObjectKind, Persistable};
use crate::error::Result;

impl Persistable for NativeDescriptor {
    const KIND: ObjectKind = ObjectKind::Descriptor;
    // Already a plain serde value; it is its own envelope.
    type Envelope = NativeDescriptor;

    fn capture(&self) -> Result<NativeDescriptor> {
        Ok(self.clone())
    }

    fn restore(envelope: NativeDescriptor) -> Result<NativeDescriptor> {
        Ok(envelope)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimerEnvelope {
    pub name: String,
    pub sections: Vec<String>,
}

impl Persistable for Timer {
    const KIND: ObjectKind = ObjectKind::Timer;
    type Envelope = TimerEnvelope;

    fn capture(&self) -> Result<TimerEnvelope> {
        Ok(TimerEnvelope {
            name: self.name().to_string(),
            sections: self.sections().to_vec(),
        })
    }

    /// Counters are process-local measurement state; a restored timer
    /// starts every section at zero.
    fn restore(envelope: TimerEnvelope) -> Result<Timer> {
        Ok(Timer::new(envelope.name, envelope.sections))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::envelope::{from_bytes, to_bytes};
    use std::time::Duration;

    #[test]
    fn timer_restores_with_zeroed_counters() {
        let timer = Timer::new("timers", vec!["section0".into()]);
        timer.record("section0", Duration::from_millis(500));
        assert_eq!(timer.value("section0"), Some(0.5));

        let restored: Timer = from_bytes(&to_bytes(&timer).unwrap()).unwrap();
        assert_eq!(restored.name(), "timers");
        assert_eq!(restored.sections(), timer.sections());
        assert_eq!(restored.value("section0"), Some(0.0));
    }
}
