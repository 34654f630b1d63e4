use std::fmt;
use std::time::Instant;

/// Wall clock timer of a self-consistent loop, printed as the last line of the iteration table.
pub struct Timer {
    time: Instant,
}

impl Timer {
    pub fn start() -> Self {
        Timer { time: Instant::now() }
    }

    /// Seconds since [Timer::start].
    pub fn seconds(&self) -> f64 {
        self.time.elapsed().as_secs_f64()
    }
}

impl fmt::Display for Timer {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{:>68} {:>8.2} s", "elapsed time:", self.seconds())
    }
}
