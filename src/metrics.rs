/// One reading of the host's performance counters, both in percent.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Usage {
    pub cpu: f64,
    pub memory: f64,
}

#[derive(Debug, thiserror::Error)]
pub enum SampleError {
    #[error("performance counter '{counter}' unavailable (status {status:#x})")]
    Unavailable { counter: String, status: u32 },
    #[error("performance counters are not supported on this platform")]
    Unsupported,
}

pub trait MetricSource {
    /// Blocking read of the latest CPU and memory utilisation.
    fn sample(&mut self) -> Result<Usage, SampleError>;
}

pub const CPU_COUNTER: &str = "\\Processor(_Total)\\% Processor Time";
pub const MEMORY_COUNTER: &str = "\\Memory\\% Committed Bytes In Use";

#[cfg(windows)]
pub use self::pdh::PdhSampler;

#[cfg(windows)]
mod pdh {
    use super::{MetricSource, SampleError, Usage, CPU_COUNTER, MEMORY_COUNTER};
    use windows::{
        core::{HSTRING, PCWSTR},
        Win32::System::Performance::{
            PdhAddEnglishCounterW, PdhCloseQuery, PdhCollectQueryData, PdhGetFormattedCounterValue,
            PdhOpenQueryW, PDH_FMT_COUNTERVALUE, PDH_FMT_DOUBLE, PDH_HCOUNTER, PDH_HQUERY,
        },
    };

    struct Counter {
        name: &'static str,
        query: PDH_HQUERY,
        counter: PDH_HCOUNTER,
    }

    impl Counter {
        fn open(name: &'static str) -> Result<Self, SampleError> {
            let unavailable = |status: u32| SampleError::Unavailable {
                counter: name.to_string(),
                status,
            };

            let mut query = PDH_HQUERY::default();
            let status = unsafe { PdhOpenQueryW(PCWSTR::null(), 0, &mut query) };
            if status != 0 {
                return Err(unavailable(status));
            }

            let mut counter = PDH_HCOUNTER::default();
            let path = HSTRING::from(name);
            let status = unsafe { PdhAddEnglishCounterW(query, &path, 0, &mut counter) };
            if status != 0 {
                unsafe { PdhCloseQuery(query) };
                return Err(unavailable(status));
            }

            // Rate counters need a first collection before they can be formatted
            unsafe { PdhCollectQueryData(query) };

            Ok(Self { name, query, counter })
        }

        fn read(&self) -> Result<f64, SampleError> {
            let mut value = PDH_FMT_COUNTERVALUE::default();
            let status = unsafe {
                let collected = PdhCollectQueryData(self.query);
                if collected != 0 {
                    collected
                } else {
                    PdhGetFormattedCounterValue(self.counter, PDH_FMT_DOUBLE, None, &mut value)
                }
            };
            if status != 0 {
                return Err(SampleError::Unavailable {
                    counter: self.name.to_string(),
                    status,
                });
            }
            Ok(unsafe { value.Anonymous.doubleValue }.clamp(0.0, 100.0))
        }
    }

    impl Drop for Counter {
        fn drop(&mut self) {
            unsafe { PdhCloseQuery(self.query) };
        }
    }

    /// Reads the English-named processor and committed-memory counters through PDH.
    pub struct PdhSampler {
        cpu: Counter,
        memory: Counter,
    }

    impl PdhSampler {
        pub fn open() -> Result<Self, SampleError> {
            Ok(Self {
                cpu: Counter::open(CPU_COUNTER)?,
                memory: Counter::open(MEMORY_COUNTER)?,
            })
        }
    }

    impl MetricSource for PdhSampler {
        fn sample(&mut self) -> Result<Usage, SampleError> {
            Ok(Usage {
                cpu: self.cpu.read()?,
                memory: self.memory.read()?,
            })
        }
    }
}
