#[derive(Copy, Clone, Debug)]
pub enum FmhaEnvVar {
    TraceRanges,
    TimeKernel,
}

impl FmhaEnvVar {
    pub fn key(&self) -> &'static str {
        match self {
            FmhaEnvVar::TraceRanges => "FMHA_TRACE_RANGES",
            FmhaEnvVar::TimeKernel => "FMHA_TIME_KERNEL",
        }
    }

    pub fn value(&self) -> String {
        std::env::var(self.key()).unwrap_or_default()
    }

    pub fn is_enabled(&self) -> bool {
        let upper = self.value().to_ascii_uppercase();
        matches!(upper.as_str(), "1" | "YES" | "TRUE")
    }
}
