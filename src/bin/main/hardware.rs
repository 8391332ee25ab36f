use core::convert::Infallible;

use log::info;
use thermview_core::settings::{ChangeValue, HardwareHook, HardwareSink};

/// Reports sensor control writes instead of driving a control channel.
#[derive(Debug, Default)]
pub(super) struct LogHardware {
    applied: usize,
}

impl LogHardware {
    pub(super) fn applied(&self) -> usize {
        self.applied
    }
}

impl HardwareSink for LogHardware {
    type Error = Infallible;

    fn apply(&mut self, hook: HardwareHook, value: ChangeValue) -> Result<(), Self::Error> {
        self.applied += 1;
        match value {
            ChangeValue::Number(n) => info!("hardware: set hook={:?} value={}", hook, n),
            ChangeValue::Option { index, name } => {
                info!("hardware: set hook={:?} option={} index={}", hook, name, index)
            }
        }
        Ok(())
    }
}
