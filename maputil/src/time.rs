use std::time::Instant;

use crate::MAIN;

pub fn elapsed_seconds(since: Instant) -> f64 {
    let dt = since.elapsed();
    (dt.as_secs() as f64) + (f64::from(dt.subsec_nanos()) * 1e-9)
}

pub fn prettyprint_usize(x: usize) -> String {
    let num = format!("{}", x);
    let mut result = String::new();
    let mut i = num.len();
    for c in num.chars() {
        result.push(c);
        i -= 1;
        if i > 0 && i % 3 == 0 {
            result.push(',');
        }
    }
    result
}

pub fn prettyprint_time(seconds: f64) -> String {
    format!("{:.4}s", seconds)
}

/// Measures one named phase of work. Logs when the phase starts and, on `stop`, how long it took.
pub struct Timer {
    name: String,
    started_at: Instant,
}

impl Timer {
    pub fn new<I: Into<String>>(name: I) -> Timer {
        let name = name.into();
        info!(target: MAIN, "start {}", name);
        Timer {
            name,
            started_at: Instant::now(),
        }
    }

    /// Returns the elapsed seconds.
    pub fn stop(self) -> f64 {
        let elapsed = elapsed_seconds(self.started_at);
        info!(
            target: MAIN,
            "{} finished, Time elapsed: {}",
            self.name,
            prettyprint_time(elapsed)
        );
        elapsed
    }
}

#[cfg(test)]
mod tests {
    #[test]
    fn test_prettyprint_usize() {
        use super::prettyprint_usize;

        assert_eq!("0", prettyprint_usize(0));
        assert_eq!("999", prettyprint_usize(999));
        assert_eq!("1,000", prettyprint_usize(1000));
        assert_eq!("12,345,678", prettyprint_usize(12345678));
    }

    #[test]
    fn test_timer_measures() {
        let timer = super::Timer::new("nothing");
        assert!(timer.stop() >= 0.0);
    }
}
